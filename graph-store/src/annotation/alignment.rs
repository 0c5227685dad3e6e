//! Alignment layers: two sibling Segmentations on two manifestations plus
//! directed `ALIGNED_TO` edges from source segments to target segments.
//! The edge is stored directed; traversal treats it as symmetric.

use neo4rs::{BoltType, Txn, query};
use serde::Deserialize;
use services::generate_id;
use tracing::info;

use crate::annotation::segmentation::{SegmentationLayer, validate_lines};
use crate::client::{GraphClient, txn_all, txn_required, txn_single};
use crate::errors::{GraphError, Result};
use crate::model::{
    AlignedSegmentRecord, AlignmentInput, AlignmentRecord, SegmentRecord, Span,
};
use crate::queries::{alignments, params, segmentations};
use crate::validate;

#[derive(Clone)]
pub struct AlignmentLayer {
    client: GraphClient,
}

#[derive(Debug, Deserialize)]
struct AlignmentRow {
    segmentation_id: String,
    target_manifestation_id: String,
    #[allow(dead_code)]
    target_expression_id: String,
    segments: Vec<SourceSegmentRow>,
}

#[derive(Debug, Deserialize)]
struct SourceSegmentRow {
    #[allow(dead_code)]
    min_start: i64,
    lines: Vec<Span>,
    aligned_targets: Vec<TargetSegmentRow>,
}

#[derive(Debug, Deserialize)]
struct TargetSegmentRow {
    id: String,
    min_start: i64,
    lines: Vec<Span>,
}

impl AlignmentLayer {
    pub fn new(client: GraphClient) -> Self {
        Self { client }
    }

    /// Fetches the alignment reachable from the source-side layer id.
    pub async fn get(&self, segmentation_id: &str) -> Result<AlignmentRecord> {
        let row = self
            .client
            .single(
                query(alignments::FETCH)
                    .param("segmentation_id", segmentation_id)
                    .param("manifestation_id", params::null()),
            )
            .await?
            .ok_or_else(|| {
                GraphError::not_found(format!("alignment '{segmentation_id}' not found"))
            })?;
        parse_alignment(row.to::<AlignmentRow>()?)
    }

    pub async fn add(&self, source_manifestation_id: &str, input: &AlignmentInput) -> Result<String> {
        self.client
            .execute_write(async |tx| Self::add_in_txn(tx, source_manifestation_id, input).await)
            .await
    }

    /// Delete-both-sides plus re-add; fails when the layer being updated is
    /// not actually paired.
    pub async fn update(&self, segmentation_id: &str, input: &AlignmentInput) -> Result<String> {
        self.client
            .execute_write(async |tx| {
                let context = SegmentationLayer::require_context(tx, segmentation_id).await?;
                let peer_id = Self::require_peer(tx, segmentation_id).await?;
                SegmentationLayer::delete_in_txn(tx, segmentation_id).await?;
                SegmentationLayer::delete_in_txn(tx, &peer_id).await?;
                Self::add_in_txn(tx, &context.manifestation_id, input).await
            })
            .await
    }

    /// Deletes both sides' segments, spans, and cross edges. Unlike the
    /// other annotation kinds this is not idempotent: the peer must exist,
    /// so a missing or unpaired layer is an error.
    pub async fn delete(&self, segmentation_id: &str) -> Result<()> {
        self.client
            .execute_write(async |tx| Self::delete_in_txn(tx, segmentation_id).await)
            .await
    }

    pub async fn delete_in_txn(tx: &mut Txn, segmentation_id: &str) -> Result<()> {
        let peer_id = Self::require_peer(tx, segmentation_id).await?;
        SegmentationLayer::delete_in_txn(tx, segmentation_id).await?;
        SegmentationLayer::delete_in_txn(tx, &peer_id).await?;
        Ok(())
    }

    /// Removes every alignment attached to a manifestation, both sides
    /// each. Used by wholesale edition updates.
    pub async fn delete_all_in_txn(tx: &mut Txn, manifestation_id: &str) -> Result<()> {
        let rows = txn_all(
            tx,
            query(alignments::PAIRS_BY_MANIFESTATION).param("manifestation_id", manifestation_id),
        )
        .await?;
        for row in rows {
            let own: String = row.get("source_id")?;
            let peer: String = row.get("peer_id")?;
            SegmentationLayer::delete_in_txn(tx, &own).await?;
            SegmentationLayer::delete_in_txn(tx, &peer).await?;
        }
        Ok(())
    }

    /// Creates both sibling Segmentations, all their Segments, then every
    /// `ALIGNED_TO` edge in a single `UNWIND`, returning the source-side
    /// layer id.
    pub async fn add_in_txn(
        tx: &mut Txn,
        source_manifestation_id: &str,
        input: &AlignmentInput,
    ) -> Result<String> {
        validate_input(input)?;
        validate::no_alignment_between(tx, source_manifestation_id, &input.target_id).await?;

        let source_segmentation_id = generate_id();
        let target_segmentation_id = generate_id();

        let target_ids: Vec<String> =
            input.target_segments.iter().map(|_| generate_id()).collect();
        let source_ids: Vec<String> =
            input.aligned_segments.iter().map(|_| generate_id()).collect();

        let target_segments = segment_payload(&target_ids, input.target_segments.iter().map(|s| &s.lines));
        let source_segments = segment_payload(&source_ids, input.aligned_segments.iter().map(|s| &s.lines));

        let edges = params::list(input.aligned_segments.iter().enumerate().flat_map(
            |(index, segment)| {
                let source_id = source_ids[index].clone();
                let target_ids = &target_ids;
                segment.alignment_indices.iter().map(move |target_index| {
                    params::map([
                        ("source_id", source_id.as_str().into()),
                        ("target_id", target_ids[*target_index].as_str().into()),
                    ])
                })
            },
        ));

        let q = query(alignments::CREATE)
            .param("manifestation_id", source_manifestation_id)
            .param("target_manifestation_id", input.target_id.as_str())
            .param("source_segmentation_id", source_segmentation_id.as_str())
            .param("target_segmentation_id", target_segmentation_id.as_str())
            .param("target_segments", target_segments)
            .param("source_segments", source_segments)
            .param("alignments", edges);
        txn_required(
            tx,
            q,
            format!(
                "manifestation '{source_manifestation_id}' or '{}' not found",
                input.target_id
            ),
        )
        .await?;

        info!(
            %source_segmentation_id,
            %target_segmentation_id,
            sources = input.aligned_segments.len(),
            targets = input.target_segments.len(),
            "alignment created"
        );
        Ok(source_segmentation_id)
    }

    /// The aligned peer layer; `NotFound` when the layer is missing,
    /// `InvalidRequest` when it exists but is not an alignment.
    async fn require_peer(tx: &mut Txn, segmentation_id: &str) -> Result<String> {
        let row = txn_single(
            tx,
            query(segmentations::ALIGNMENT_PEER).param("segmentation_id", segmentation_id),
        )
        .await?;
        let (exists, peer) = match row {
            Some(row) => (
                row.get::<bool>("exists")?,
                row.get::<Option<String>>("aligned_segmentation_id")?,
            ),
            None => (false, None),
        };
        if !exists {
            return Err(GraphError::not_found(format!(
                "segmentation '{segmentation_id}' not found"
            )));
        }
        peer.ok_or_else(|| {
            GraphError::invalid(format!(
                "segmentation '{segmentation_id}' is not an alignment annotation"
            ))
        })
    }
}

fn validate_input(input: &AlignmentInput) -> Result<()> {
    if input.target_segments.is_empty() || input.aligned_segments.is_empty() {
        return Err(GraphError::invalid(
            "alignment requires target segments and aligned segments",
        ));
    }
    validate_lines(input.target_segments.iter().flat_map(|s| s.lines.iter()))?;
    validate_lines(input.aligned_segments.iter().flat_map(|s| s.lines.iter()))?;
    let target_count = input.target_segments.len();
    for (index, segment) in input.aligned_segments.iter().enumerate() {
        for target_index in &segment.alignment_indices {
            if *target_index >= target_count {
                return Err(GraphError::invalid(format!(
                    "aligned segment {index} references target {target_index}, \
                     but only {target_count} target segments were given"
                )));
            }
        }
    }
    Ok(())
}

fn segment_payload<'a, I>(ids: &[String], lines: I) -> BoltType
where
    I: Iterator<Item = &'a Vec<Span>>,
{
    params::list(ids.iter().zip(lines).map(|(id, spans)| {
        params::map([("id", id.as_str().into()), ("lines", params::lines(spans))])
    }))
}

/// Assembles the wire record: target segments are deduplicated in order of
/// first mention by source segments (sources arrive ordered by their own
/// minimal span start), and each source's `alignment_indices` point into
/// that list.
fn parse_alignment(row: AlignmentRow) -> Result<AlignmentRecord> {
    let mut ordered_min_starts: Vec<i64> = Vec::new();
    let mut target_segments: Vec<SegmentRecord> = Vec::new();
    let mut aligned_segments: Vec<AlignedSegmentRecord> = Vec::new();

    for source in &row.segments {
        let mut indices = Vec::with_capacity(source.aligned_targets.len());
        for target in &source.aligned_targets {
            let position = match ordered_min_starts.iter().position(|s| *s == target.min_start) {
                Some(position) => position,
                None => {
                    ordered_min_starts.push(target.min_start);
                    target_segments.push(SegmentRecord {
                        id: target.id.clone(),
                        lines: target.lines.clone(),
                    });
                    ordered_min_starts.len() - 1
                }
            };
            indices.push(position);
        }
        aligned_segments.push(AlignedSegmentRecord {
            lines: source.lines.clone(),
            alignment_indices: indices,
        });
    }

    if target_segments.is_empty() || aligned_segments.is_empty() {
        return Err(GraphError::not_found(format!(
            "alignment '{}' has no segments",
            row.segmentation_id
        )));
    }

    Ok(AlignmentRecord {
        id: row.segmentation_id,
        target_id: row.target_manifestation_id,
        target_segments,
        aligned_segments,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AlignedSegmentInput, SegmentInput};

    fn span(start: i64, end: i64) -> Span {
        Span { start, end }
    }

    fn target_row(id: &str, start: i64, end: i64) -> TargetSegmentRow {
        TargetSegmentRow { id: id.to_owned(), min_start: start, lines: vec![span(start, end)] }
    }

    #[test]
    fn round_trip_preserves_indices_and_target_order() {
        let row = AlignmentRow {
            segmentation_id: "A1".into(),
            target_manifestation_id: "M2".into(),
            target_expression_id: "E2".into(),
            segments: vec![
                SourceSegmentRow {
                    min_start: 0,
                    lines: vec![span(0, 7)],
                    aligned_targets: vec![target_row("t0", 0, 7)],
                },
                SourceSegmentRow {
                    min_start: 8,
                    lines: vec![span(8, 16)],
                    aligned_targets: vec![target_row("t1", 8, 16)],
                },
                SourceSegmentRow {
                    min_start: 17,
                    lines: vec![span(17, 26)],
                    aligned_targets: vec![target_row("t2", 17, 26)],
                },
            ],
        };
        let record = parse_alignment(row).unwrap();
        assert_eq!(record.target_segments.len(), 3);
        assert_eq!(record.aligned_segments.len(), 3);
        for (index, source) in record.aligned_segments.iter().enumerate() {
            assert_eq!(source.alignment_indices, vec![index]);
        }
    }

    #[test]
    fn shared_targets_are_deduplicated_in_first_mention_order() {
        let row = AlignmentRow {
            segmentation_id: "A1".into(),
            target_manifestation_id: "M2".into(),
            target_expression_id: "E2".into(),
            segments: vec![
                SourceSegmentRow {
                    min_start: 0,
                    lines: vec![span(0, 5)],
                    aligned_targets: vec![target_row("t9", 9, 12), target_row("t0", 0, 5)],
                },
                SourceSegmentRow {
                    min_start: 5,
                    lines: vec![span(5, 9)],
                    aligned_targets: vec![target_row("t9", 9, 12)],
                },
            ],
        };
        let record = parse_alignment(row).unwrap();
        let ids: Vec<_> = record.target_segments.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["t9", "t0"]);
        assert_eq!(record.aligned_segments[0].alignment_indices, vec![0, 1]);
        assert_eq!(record.aligned_segments[1].alignment_indices, vec![0]);
    }

    #[test]
    fn out_of_range_alignment_index_is_rejected() {
        let input = AlignmentInput {
            target_id: "M2".into(),
            target_segments: vec![SegmentInput { lines: vec![span(0, 7)] }],
            aligned_segments: vec![AlignedSegmentInput {
                lines: vec![span(0, 7)],
                alignment_indices: vec![1],
            }],
        };
        assert!(matches!(
            validate_input(&input),
            Err(GraphError::InvalidRequest(_))
        ));
    }

    #[test]
    fn empty_sides_are_rejected() {
        let input = AlignmentInput {
            target_id: "M2".into(),
            target_segments: vec![],
            aligned_segments: vec![],
        };
        assert!(validate_input(&input).is_err());
    }
}
