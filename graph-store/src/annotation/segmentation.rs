//! Plain segmentation layers: a flat list of multi-span segments over a
//! manifestation's base text.

use neo4rs::{Txn, query};
use serde::Deserialize;
use services::generate_id;
use tracing::info;

use crate::client::{GraphClient, txn_required, txn_single};
use crate::errors::{GraphError, Result};
use crate::model::{
    AnnotationKind, SegmentInput, SegmentationRecord, SegmentationSegment, Span,
};
use crate::queries::{params, segmentations};

#[derive(Clone)]
pub struct SegmentationLayer {
    client: GraphClient,
}

#[derive(Deserialize)]
pub(crate) struct SegmentationRow {
    id: String,
    kind: AnnotationKind,
    manifestation_id: String,
    expression_id: String,
    segments: Vec<SegmentEntry>,
}

#[derive(Deserialize)]
struct SegmentEntry {
    id: String,
    reference: Option<String>,
    lines: Vec<Span>,
}

/// Where a layer hangs and what kind it is; used to route updates/deletes.
#[derive(Deserialize)]
pub(crate) struct LayerContext {
    pub manifestation_id: String,
    pub kind: AnnotationKind,
}

impl SegmentationLayer {
    pub fn new(client: GraphClient) -> Self {
        Self { client }
    }

    /// Fetches any segmentation-shaped layer (plain, pagination, search) by
    /// id, with spans ordered by start and segments by minimal span start.
    pub async fn get(&self, segmentation_id: &str) -> Result<SegmentationRecord> {
        let row = self
            .client
            .single(
                query(segmentations::FETCH)
                    .param("segmentation_id", segmentation_id)
                    .param("manifestation_id", params::null())
                    .param("kind", params::null()),
            )
            .await?
            .ok_or_else(|| {
                GraphError::not_found(format!("segmentation '{segmentation_id}' not found"))
            })?;
        Ok(Self::record_from(row.to::<SegmentationRow>()?))
    }

    /// The layer of `kind` attached to a manifestation, when present.
    pub async fn get_by_manifestation(
        &self,
        manifestation_id: &str,
        kind: AnnotationKind,
    ) -> Result<Option<SegmentationRecord>> {
        let row = self
            .client
            .single(
                query(segmentations::FETCH)
                    .param("segmentation_id", params::null())
                    .param("manifestation_id", manifestation_id)
                    .param("kind", kind.as_str()),
            )
            .await?;
        Ok(match row {
            Some(row) => Some(Self::record_from(row.to::<SegmentationRow>()?)),
            None => None,
        })
    }

    pub async fn add(&self, manifestation_id: &str, segments: &[SegmentInput]) -> Result<String> {
        self.add_with_kind(manifestation_id, segments, AnnotationKind::Segmentation)
            .await
    }

    /// As [`Self::add`], for the other segmentation-shaped kinds (the
    /// search layer an external segmenter writes back).
    pub async fn add_with_kind(
        &self,
        manifestation_id: &str,
        segments: &[SegmentInput],
        kind: AnnotationKind,
    ) -> Result<String> {
        self.client
            .execute_write(async |tx| Self::add_in_txn(tx, manifestation_id, segments, kind).await)
            .await
    }

    /// Delete-then-recreate on the same manifestation.
    pub async fn update(&self, segmentation_id: &str, segments: &[SegmentInput]) -> Result<String> {
        self.client
            .execute_write(async |tx| {
                let context = Self::require_context(tx, segmentation_id).await?;
                Self::refuse_alignment_member(tx, segmentation_id).await?;
                Self::delete_in_txn(tx, segmentation_id).await?;
                Self::add_in_txn(tx, &context.manifestation_id, segments, context.kind).await
            })
            .await
    }

    /// Deletes the layer with its segments and spans. A missing id is a
    /// no-op; a layer participating in an alignment is refused, and callers
    /// must delete the alignment instead.
    pub async fn delete(&self, segmentation_id: &str) -> Result<()> {
        self.client
            .execute_write(async |tx| {
                Self::refuse_alignment_member(tx, segmentation_id).await?;
                Self::delete_in_txn(tx, segmentation_id).await
            })
            .await
    }

    /// Creates the layer node, its `SEGMENTATION_OF` edge and all segments
    /// with their spans in one statement.
    pub async fn add_in_txn(
        tx: &mut Txn,
        manifestation_id: &str,
        segments: &[SegmentInput],
        kind: AnnotationKind,
    ) -> Result<String> {
        if segments.is_empty() {
            return Err(GraphError::invalid("segmentation cannot be empty"));
        }
        validate_lines(segments.iter().flat_map(|segment| segment.lines.iter()))?;

        let segmentation_id = generate_id();
        let payload = params::list(segments.iter().map(|segment| {
            params::map([
                ("id", generate_id().into()),
                ("lines", params::lines(&segment.lines)),
            ])
        }));
        let q = query(segmentations::CREATE)
            .param("manifestation_id", manifestation_id)
            .param("segmentation_id", segmentation_id.as_str())
            .param("kind", kind.as_str())
            .param("segments", payload);
        txn_required(tx, q, format!("manifestation '{manifestation_id}' not found")).await?;

        info!(%segmentation_id, kind = kind.as_str(), segments = segments.len(), "segmentation created");
        Ok(segmentation_id)
    }

    /// Unconditional delete used internally (alignment delete, edition
    /// update). The statement is a no-op when nothing matches.
    pub async fn delete_in_txn(tx: &mut Txn, segmentation_id: &str) -> Result<()> {
        tx.run(query(segmentations::DELETE).param("segmentation_id", segmentation_id))
            .await?;
        Ok(())
    }

    pub(crate) async fn require_context(tx: &mut Txn, segmentation_id: &str) -> Result<LayerContext> {
        let row = txn_required(
            tx,
            query(segmentations::MANIFESTATION_OF).param("segmentation_id", segmentation_id),
            format!("segmentation '{segmentation_id}' not found"),
        )
        .await?;
        Ok(row.to::<LayerContext>()?)
    }

    /// Peer layer id when the segmentation is one half of an alignment.
    pub(crate) async fn alignment_peer(tx: &mut Txn, segmentation_id: &str) -> Result<(bool, Option<String>)> {
        let row = txn_single(
            tx,
            query(segmentations::ALIGNMENT_PEER).param("segmentation_id", segmentation_id),
        )
        .await?;
        match row {
            Some(row) => Ok((
                row.get::<bool>("exists")?,
                row.get::<Option<String>>("aligned_segmentation_id")?,
            )),
            None => Ok((false, None)),
        }
    }

    async fn refuse_alignment_member(tx: &mut Txn, segmentation_id: &str) -> Result<()> {
        let (_, peer) = Self::alignment_peer(tx, segmentation_id).await?;
        if peer.is_some() {
            return Err(GraphError::invalid(format!(
                "segmentation '{segmentation_id}' belongs to an alignment; delete the alignment instead"
            )));
        }
        Ok(())
    }

    pub(crate) fn record_from(row: SegmentationRow) -> SegmentationRecord {
        SegmentationRecord {
            id: row.id,
            kind: row.kind,
            manifestation_id: row.manifestation_id,
            expression_id: row.expression_id,
            segments: row
                .segments
                .into_iter()
                .map(|segment| SegmentationSegment {
                    id: segment.id,
                    reference: segment.reference,
                    lines: segment.lines,
                })
                .collect(),
        }
    }
}

pub(crate) fn validate_lines<'a, I>(lines: I) -> Result<()>
where
    I: IntoIterator<Item = &'a Span>,
{
    for line in lines {
        if !line.is_well_formed() {
            return Err(GraphError::invalid(format!(
                "span [{}, {}) is malformed",
                line.start, line.end
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_lines_are_rejected() {
        let bad = [Span { start: 5, end: 2 }];
        assert!(validate_lines(bad.iter()).is_err());
        let negative = [Span { start: -1, end: 2 }];
        assert!(validate_lines(negative.iter()).is_err());
        let good = [Span { start: 0, end: 0 }, Span { start: 2, end: 9 }];
        assert!(validate_lines(good.iter()).is_ok());
    }
}
