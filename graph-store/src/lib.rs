//! Graph-backed core of the corpus service: annotation and alignment
//! engine over a property-graph store.
//!
//! [`GraphStore`] is the single entry point recommended for application
//! code. It bundles the entity repositories and annotation-layer handlers
//! over one shared [`GraphClient`] and owns the composite write protocols
//! (edition creation and update, aligned-text creation, span relocation)
//! that must commit atomically.

pub mod annotation;
pub mod client;
pub mod config;
pub mod errors;
pub mod model;
pub mod nomen;
pub mod queries;
pub mod related;
pub mod repo;
pub mod span_adjust;
pub mod validate;

use tracing::info;

pub use client::GraphClient;
pub use config::GraphConfig;
pub use errors::{GraphError, Result};

use annotation::{
    AlignmentLayer, BibliographyLayer, NoteLayer, PaginationLayer, SegmentationLayer,
};
use model::{
    AlignmentInput, BibliographyEntry, ExpressionInput, ManifestationInput, NoteEntry, PageInput,
    RelatedSegments, SegmentInput, TextReplacement,
};
use repo::{ApiKeyRepo, CategoryRepo, ExpressionRepo, ManifestationRepo, PersonRepo, SegmentRepo};
use services::generate_id;

/// Annotation layers created together with an edition.
#[derive(Debug, Clone, Default)]
pub struct EditionLayers {
    pub segmentation: Option<Vec<SegmentInput>>,
    pub pagination: Option<Vec<PageInput>>,
    pub durchen: Option<Vec<NoteEntry>>,
    pub bibliography: Option<Vec<BibliographyEntry>>,
}

/// Input of the aligned-text protocol: a new expression plus its critical
/// edition, segmentation, and optionally an alignment against an existing
/// edition.
#[derive(Debug, Clone)]
pub struct AlignedTextInput {
    pub expression: ExpressionInput,
    pub manifestation: ManifestationInput,
    pub segmentation: Vec<SegmentInput>,
    pub alignment: Option<AlignmentInput>,
    pub bibliography: Option<Vec<BibliographyEntry>>,
}

#[derive(Debug, Clone)]
pub struct AlignedTextIds {
    pub expression_id: String,
    pub manifestation_id: String,
    pub alignment_id: Option<String>,
}

#[derive(Clone)]
pub struct GraphStore {
    pub client: GraphClient,
    pub expressions: ExpressionRepo,
    pub manifestations: ManifestationRepo,
    pub segments: SegmentRepo,
    pub persons: PersonRepo,
    pub categories: CategoryRepo,
    pub api_keys: ApiKeyRepo,
    pub segmentations: SegmentationLayer,
    pub paginations: PaginationLayer,
    pub alignments: AlignmentLayer,
    pub notes: NoteLayer,
    pub bibliography: BibliographyLayer,
}

impl GraphStore {
    pub async fn connect(cfg: &GraphConfig) -> Result<Self> {
        Ok(Self::from_client(GraphClient::connect(cfg).await?))
    }

    pub fn from_client(client: GraphClient) -> Self {
        Self {
            expressions: ExpressionRepo::new(client.clone()),
            manifestations: ManifestationRepo::new(client.clone()),
            segments: SegmentRepo::new(client.clone()),
            persons: PersonRepo::new(client.clone()),
            categories: CategoryRepo::new(client.clone()),
            api_keys: ApiKeyRepo::new(client.clone()),
            segmentations: SegmentationLayer::new(client.clone()),
            paginations: PaginationLayer::new(client.clone()),
            alignments: AlignmentLayer::new(client.clone()),
            notes: NoteLayer::new(client.clone()),
            bibliography: BibliographyLayer::new(client.clone()),
            client,
        }
    }

    /// Creates an edition with its initial annotation layers in one write
    /// transaction. The caller mints `manifestation_id` up front so the
    /// base-text blob can be stored (and rolled back) under it.
    pub async fn create_edition(
        &self,
        expression_id: &str,
        manifestation_id: &str,
        manifestation: &ManifestationInput,
        layers: &EditionLayers,
    ) -> Result<()> {
        self.client
            .execute_write(async |tx| {
                ManifestationRepo::create_in_txn(tx, manifestation, expression_id, manifestation_id)
                    .await?;
                add_layers(tx, manifestation_id, layers).await
            })
            .await
    }

    /// Creates a translation or commentary text with its critical edition,
    /// segmentation, and optional alignment to the source edition, all
    /// atomically. Ids are minted by the caller for blob bookkeeping.
    pub async fn create_aligned_text(
        &self,
        expression_id: &str,
        manifestation_id: &str,
        input: &AlignedTextInput,
    ) -> Result<AlignedTextIds> {
        self.client
            .execute_write(async |tx| {
                ExpressionRepo::create_in_txn(tx, &input.expression, Some(expression_id)).await?;
                ManifestationRepo::create_in_txn(
                    tx,
                    &input.manifestation,
                    expression_id,
                    manifestation_id,
                )
                .await?;
                SegmentationLayer::add_in_txn(
                    tx,
                    manifestation_id,
                    &input.segmentation,
                    model::AnnotationKind::Segmentation,
                )
                .await?;
                let alignment_id = match &input.alignment {
                    Some(alignment) => {
                        Some(AlignmentLayer::add_in_txn(tx, manifestation_id, alignment).await?)
                    }
                    None => None,
                };
                if let Some(entries) = &input.bibliography {
                    BibliographyLayer::add_in_txn(tx, manifestation_id, entries).await?;
                }
                Ok(AlignedTextIds {
                    expression_id: expression_id.to_owned(),
                    manifestation_id: manifestation_id.to_owned(),
                    alignment_id,
                })
            })
            .await
    }

    /// Wholesale edition update: prior annotation subgraphs are deleted,
    /// scalar properties rewritten, and the new layers created, in one
    /// transaction. Returns the ids of the replaced segments.
    pub async fn update_edition(
        &self,
        manifestation_id: &str,
        manifestation: &ManifestationInput,
        layers: &EditionLayers,
    ) -> Result<Vec<String>> {
        self.client
            .execute_write(async |tx| {
                let replaced =
                    ManifestationRepo::update_in_txn(tx, manifestation_id, manifestation).await?;
                add_layers(tx, manifestation_id, layers).await?;
                Ok(replaced)
            })
            .await
    }

    /// Applies the span-relocation rules for a base-text replacement in
    /// one transaction; `exclude_segment_id` is the segment being edited,
    /// whose span is instead rewritten to cover the new text. Returns the
    /// ids of entities deleted because the edit engulfed their span.
    pub async fn relocate_spans(
        &self,
        manifestation_id: &str,
        replacement: TextReplacement,
        exclude_segment_id: Option<&str>,
    ) -> Result<Vec<String>> {
        self.client
            .execute_write(async |tx| {
                let exclude = exclude_segment_id.unwrap_or("");
                let deleted =
                    span_adjust::relocate_in_txn(tx, manifestation_id, &replacement, exclude)
                        .await?;
                if let Some(segment_id) = exclude_segment_id {
                    span_adjust::update_span_end_in_txn(tx, segment_id, replacement.new_length)
                        .await?;
                }
                Ok(deleted)
            })
            .await
    }

    /// Cross-edition related-segments traversal over alignment pairs.
    pub async fn related_segments(
        &self,
        manifestation_id: &str,
        start: i64,
        end: i64,
        transform: bool,
    ) -> Result<Vec<RelatedSegments>> {
        related::related_segments(&self.client, manifestation_id, start, end, transform).await
    }

    /// Mints an id in the store's id space (21 chars, 62-char alphabet).
    pub fn mint_id(&self) -> String {
        generate_id()
    }
}

async fn add_layers(
    tx: &mut neo4rs::Txn,
    manifestation_id: &str,
    layers: &EditionLayers,
) -> Result<()> {
    if let Some(segments) = &layers.segmentation {
        SegmentationLayer::add_in_txn(
            tx,
            manifestation_id,
            segments,
            model::AnnotationKind::Segmentation,
        )
        .await?;
    }
    if let Some(pages) = &layers.pagination {
        PaginationLayer::add_in_txn(tx, manifestation_id, pages).await?;
    }
    if let Some(notes) = &layers.durchen {
        NoteLayer::add_in_txn(tx, manifestation_id, notes, annotation::note::DURCHEN).await?;
    }
    if let Some(entries) = &layers.bibliography {
        BibliographyLayer::add_in_txn(tx, manifestation_id, entries).await?;
    }
    if layers.segmentation.is_some() || layers.pagination.is_some() {
        info!(manifestation = manifestation_id, "initial annotation layers attached");
    }
    Ok(())
}
