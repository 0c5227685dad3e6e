use neo4rs::{Row, Txn, query};
use serde::Deserialize;
use tracing::info;

use crate::annotation::AlignmentLayer;
use crate::client::{GraphClient, txn_required, txn_single};
use crate::errors::{GraphError, Result};
use crate::model::{
    AnnotationKind, AnnotationRef, LocalizedEntry, LocalizedString, ManifestationInput,
    ManifestationRecord, ManifestationType, RelatedInstance, RelatedInstanceMetadata, TextType,
};
use crate::nomen;
use crate::queries::{manifestations, params};
use crate::repo::expression::ExpressionRepo;
use crate::validate;

#[derive(Clone)]
pub struct ManifestationRepo {
    client: GraphClient,
}

#[derive(Deserialize)]
struct ManifestationRow {
    id: String,
    bdrc: Option<String>,
    wiki: Option<String>,
    #[serde(rename = "type")]
    kind: ManifestationType,
    source: Option<String>,
    colophon: Option<String>,
    incipit_title: Vec<LocalizedEntry>,
    alt_incipit_titles: Vec<Vec<LocalizedEntry>>,
    annotations: Vec<AnnotationRef>,
}

#[derive(Deserialize)]
struct RelatedRow {
    manifestation_id: String,
    expression_id: String,
    #[serde(default)]
    alignment_id: Option<String>,
}

impl ManifestationRepo {
    pub fn new(client: GraphClient) -> Self {
        Self { client }
    }

    pub async fn get(&self, manifestation_id: &str) -> Result<ManifestationRecord> {
        let row = self
            .client
            .single(
                query(&manifestations::fetch())
                    .param("manifestation_id", manifestation_id)
                    .param("expression_id", params::null())
                    .param("manifestation_type", params::null()),
            )
            .await?
            .ok_or_else(|| {
                GraphError::not_found(format!("manifestation '{manifestation_id}' not found"))
            })?;
        record_from(row)
    }

    pub async fn get_by_expression(
        &self,
        expression_id: &str,
        kind: Option<ManifestationType>,
    ) -> Result<Vec<ManifestationRecord>> {
        let rows = self
            .client
            .all(
                query(&manifestations::fetch())
                    .param("manifestation_id", params::null())
                    .param("expression_id", expression_id)
                    .param("manifestation_type", params::opt(kind.map(|k| k.as_str()))),
            )
            .await?;
        rows.into_iter().map(record_from).collect()
    }

    /// Creates the manifestation node, its edge to the expression and the
    /// incipit Nomen subgraph, enforcing the diplomatic/critical rules.
    pub async fn create_in_txn(
        tx: &mut Txn,
        input: &ManifestationInput,
        expression_id: &str,
        manifestation_id: &str,
    ) -> Result<()> {
        validate::expression_exists(tx, expression_id).await?;
        match input.kind {
            ManifestationType::Diplomatic if input.bdrc.is_none() => {
                return Err(GraphError::validation(
                    "a diplomatic edition must carry an external registry id",
                ));
            }
            ManifestationType::Critical => {
                if input.bdrc.is_some() {
                    return Err(GraphError::validation(
                        "a critical edition must not carry an external registry id",
                    ));
                }
                validate::critical_manifestation_unique(tx, expression_id).await?;
            }
            _ => {}
        }
        if input.alt_incipit_titles.is_some() && input.incipit_title.is_none() {
            return Err(GraphError::invalid(
                "alt_incipit_titles require an incipit_title",
            ));
        }

        let incipit_nomen_id = match &input.incipit_title {
            Some(title) => {
                Some(nomen::create_in_txn(tx, title, input.alt_incipit_titles.as_deref()).await?)
            }
            None => None,
        };

        let q = query(manifestations::CREATE)
            .param("manifestation_id", manifestation_id)
            .param("expression_id", expression_id)
            .param("bdrc", params::opt(input.bdrc.as_deref()))
            .param("wiki", params::opt(input.wiki.as_deref()))
            .param("type", input.kind.as_str())
            .param("source", params::opt(input.source.as_deref()))
            .param("colophon", params::opt(input.colophon.as_deref()))
            .param("incipit_nomen_id", params::opt(incipit_nomen_id.as_deref()));
        txn_required(tx, q, format!("expression '{expression_id}' not found")).await?;

        info!(%manifestation_id, kind = input.kind.as_str(), "manifestation created");
        Ok(())
    }

    /// Wholesale metadata update: every annotation subgraph is deleted
    /// (alignments on both sides), the incipit Nomen replaced and scalar
    /// properties rewritten. The caller recreates new layers in the same
    /// transaction. Returns the ids of replaced segments.
    pub async fn update_in_txn(
        tx: &mut Txn,
        manifestation_id: &str,
        input: &ManifestationInput,
    ) -> Result<Vec<String>> {
        let gathered = txn_single(
            tx,
            query(manifestations::GATHER_SEGMENT_IDS).param("manifestation_id", manifestation_id),
        )
        .await?
        .ok_or_else(|| {
            GraphError::not_found(format!("manifestation '{manifestation_id}' not found"))
        })?;
        let search_ids: Vec<String> = gathered.get("search_segmentation_ids")?;
        let other_ids: Vec<String> = gathered.get("segmentation_ids")?;
        let mut replaced = search_ids;
        replaced.extend(other_ids);

        tx.run(
            query(manifestations::DELETE_LAYERS_BY_KIND)
                .param("manifestation_id", manifestation_id)
                .param(
                    "kinds",
                    vec![
                        AnnotationKind::Segmentation.as_str(),
                        AnnotationKind::Pagination.as_str(),
                        AnnotationKind::SearchSegmentation.as_str(),
                        AnnotationKind::TableOfContents.as_str(),
                    ],
                ),
        )
        .await?;
        tx.run(query(manifestations::DELETE_NOTES).param("manifestation_id", manifestation_id))
            .await?;
        tx.run(
            query(manifestations::DELETE_BIBLIOGRAPHY).param("manifestation_id", manifestation_id),
        )
        .await?;
        AlignmentLayer::delete_all_in_txn(tx, manifestation_id).await?;

        tx.run(query(manifestations::CLEANUP_INCIPIT).param("manifestation_id", manifestation_id))
            .await?;
        let incipit_nomen_id = match &input.incipit_title {
            Some(title) => {
                Some(nomen::create_in_txn(tx, title, input.alt_incipit_titles.as_deref()).await?)
            }
            None => None,
        };

        let q = query(manifestations::UPDATE_PROPERTIES)
            .param("manifestation_id", manifestation_id)
            .param("bdrc", params::opt(input.bdrc.as_deref()))
            .param("wiki", params::opt(input.wiki.as_deref()))
            .param("colophon", params::opt(input.colophon.as_deref()))
            .param("type", input.kind.as_str())
            .param("source", params::opt(input.source.as_deref()))
            .param("incipit_nomen_id", params::opt(incipit_nomen_id.as_deref()));
        txn_required(tx, q, format!("manifestation '{manifestation_id}' not found")).await?;

        info!(%manifestation_id, replaced = replaced.len(), "manifestation updated");
        Ok(replaced)
    }

    /// Editions related to this one: peers connected through alignment
    /// pairs first, then editions of expressions related at the
    /// translation/commentary level, deduplicated in that order.
    pub async fn get_related(
        &self,
        manifestation_id: &str,
        expressions: &ExpressionRepo,
        kind_filter: Option<TextType>,
    ) -> Result<Vec<RelatedInstance>> {
        let mut rows: Vec<RelatedRow> = Vec::new();
        for row in self
            .client
            .all(
                query(manifestations::FIND_RELATED_VIA_ALIGNMENT)
                    .param("manifestation_id", manifestation_id),
            )
            .await?
        {
            rows.push(row.to::<RelatedRow>()?);
        }
        let mut seen: Vec<String> = rows.iter().map(|r| r.manifestation_id.clone()).collect();
        for row in self
            .client
            .all(
                query(manifestations::FIND_RELATED_VIA_EXPRESSION)
                    .param("manifestation_id", manifestation_id),
            )
            .await?
        {
            let parsed = row.to::<RelatedRow>()?;
            if !seen.contains(&parsed.manifestation_id) {
                seen.push(parsed.manifestation_id.clone());
                rows.push(parsed);
            }
        }

        let mut related = Vec::new();
        for entry in rows {
            let manifestation = self.get(&entry.manifestation_id).await?;
            let expression = expressions.get(&entry.expression_id).await?;
            if let Some(filter) = kind_filter
                && expression.kind != filter
            {
                continue;
            }
            // Registry ids of contributors stay internal here.
            let contributions = expression
                .contributions
                .into_iter()
                .map(|mut c| {
                    c.person_bdrc_id = None;
                    c
                })
                .collect();
            related.push(RelatedInstance {
                instance_id: manifestation.id,
                metadata: RelatedInstanceMetadata {
                    instance_type: manifestation.kind,
                    source: manifestation.source,
                    text_id: expression.id,
                    title: expression.title,
                    alt_titles: expression.alt_titles.unwrap_or_default(),
                    language: expression.language,
                    contributions,
                },
                annotation: entry.alignment_id,
                relationship: expression.kind,
            });
        }
        Ok(related)
    }
}

fn record_from(row: Row) -> Result<ManifestationRecord> {
    let expression_id: String = row.get("expression_id")?;
    let parsed: ManifestationRow = row.get("manifestation")?;
    let alt_incipit_titles: Vec<LocalizedString> = parsed
        .alt_incipit_titles
        .into_iter()
        .filter_map(LocalizedString::from_entries)
        .collect();
    Ok(ManifestationRecord {
        id: parsed.id,
        expression_id,
        bdrc: parsed.bdrc,
        wiki: parsed.wiki,
        kind: parsed.kind,
        source: parsed.source,
        colophon: parsed.colophon,
        incipit_title: LocalizedString::from_entries(parsed.incipit_title),
        alt_incipit_titles: if alt_incipit_titles.is_empty() {
            None
        } else {
            Some(alt_incipit_titles)
        },
        annotations: parsed.annotations,
    })
}
