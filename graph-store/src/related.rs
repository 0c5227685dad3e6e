//! Cross-edition related-segments traversal.
//!
//! Breadth-first walk over manifestations connected by alignment pairs.
//! Starting from a byte span on one edition, each alignment layer attached
//! to the current manifestation is probed for overlapping segments; the
//! peer-side segments give both the output for that edition and the
//! expanded span that keeps the walk going. Expansion is monotone, so the
//! result does not depend on queue order.

use std::collections::{HashSet, VecDeque};

use neo4rs::query;
use serde::Deserialize;
use tracing::debug;

use crate::client::GraphClient;
use crate::errors::Result;
use crate::model::{RelatedSegments, SegmentRecord, Span};
use crate::queries::{alignments, segmentations, segments};

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct AlignmentPairRef {
    pub source_id: String,
    pub peer_id: String,
}

/// Graph probes the walk needs; split out so the bookkeeping is testable
/// against an in-memory graph.
pub(crate) trait AlignmentSource {
    async fn alignment_pairs(&self, manifestation_id: &str) -> Result<Vec<AlignmentPairRef>>;

    /// Peer-side segments reached from segments of `segmentation_id`
    /// overlapping `[start, end)`.
    async fn aligned_peer_segments(
        &self,
        segmentation_id: &str,
        start: i64,
        end: i64,
    ) -> Result<Vec<SegmentRecord>>;

    async fn manifestation_of(&self, segmentation_id: &str) -> Result<Option<String>>;

    /// Plain segmentation-layer segments overlapping `[start, end)`.
    async fn segmentation_segments(
        &self,
        manifestation_id: &str,
        start: i64,
        end: i64,
    ) -> Result<Vec<SegmentRecord>>;
}

/// Related segments in every edition reachable from
/// `(manifestation_id, [start, end))` through chains of alignment pairs.
///
/// With `transform`, peer results are transferred onto each edition's plain
/// segmentation layer; otherwise the alignment-layer segments are returned
/// as-is.
pub async fn related_segments(
    client: &GraphClient,
    manifestation_id: &str,
    start: i64,
    end: i64,
    transform: bool,
) -> Result<Vec<RelatedSegments>> {
    walk(&GraphAlignmentSource { client }, manifestation_id, start, end, transform).await
}

pub(crate) async fn walk<S: AlignmentSource>(
    source: &S,
    manifestation_id: &str,
    start: i64,
    end: i64,
    transform: bool,
) -> Result<Vec<RelatedSegments>> {
    let mut results = Vec::new();
    let mut visited: HashSet<String> = HashSet::new();
    let mut traversed_pairs: HashSet<(String, String)> = HashSet::new();
    let mut queue: VecDeque<(String, i64, i64)> = VecDeque::new();

    queue.push_back((manifestation_id.to_owned(), start, end));
    visited.insert(manifestation_id.to_owned());

    while let Some((current_id, span_start, span_end)) = queue.pop_front() {
        for pair in source.alignment_pairs(&current_id).await? {
            let key = (pair.source_id.clone(), pair.peer_id.clone());
            if traversed_pairs.contains(&key) {
                continue;
            }

            let peer_segments = source
                .aligned_peer_segments(&pair.source_id, span_start, span_end)
                .await?;
            if peer_segments.is_empty() {
                continue;
            }

            let bounds = segment_bounds(&peer_segments);
            let Some(Span { start: expanded_start, end: expanded_end }) = bounds else {
                continue;
            };

            let Some(peer_manifestation) = source.manifestation_of(&pair.peer_id).await? else {
                continue;
            };
            if visited.contains(&peer_manifestation) {
                continue;
            }
            visited.insert(peer_manifestation.clone());

            let emitted = if transform {
                source
                    .segmentation_segments(&peer_manifestation, expanded_start, expanded_end)
                    .await?
            } else {
                peer_segments
            };
            debug!(
                manifestation = %peer_manifestation,
                segments = emitted.len(),
                "related segments found"
            );
            results.push(RelatedSegments {
                manifestation_id: peer_manifestation.clone(),
                segments: emitted,
            });

            traversed_pairs.insert(key);
            traversed_pairs.insert((pair.peer_id.clone(), pair.source_id.clone()));
            queue.push_back((peer_manifestation, expanded_start, expanded_end));
        }
    }

    Ok(results)
}

/// `[min start, max end)` over every span of the given segments.
fn segment_bounds(found: &[SegmentRecord]) -> Option<Span> {
    let start = found.iter().filter_map(SegmentRecord::min_start).min()?;
    let end = found.iter().filter_map(SegmentRecord::max_end).max()?;
    Some(Span { start, end })
}

struct GraphAlignmentSource<'a> {
    client: &'a GraphClient,
}

#[derive(Deserialize)]
struct SegmentRow {
    segment_id: String,
    lines: Vec<Span>,
}

impl GraphAlignmentSource<'_> {
    fn to_records(rows: Vec<neo4rs::Row>) -> Result<Vec<SegmentRecord>> {
        rows.into_iter()
            .map(|row| {
                let parsed: SegmentRow = row.to::<SegmentRow>()?;
                Ok(SegmentRecord { id: parsed.segment_id, lines: parsed.lines })
            })
            .collect()
    }
}

impl AlignmentSource for GraphAlignmentSource<'_> {
    async fn alignment_pairs(&self, manifestation_id: &str) -> Result<Vec<AlignmentPairRef>> {
        let rows = self
            .client
            .all(query(alignments::PAIRS_BY_MANIFESTATION).param("manifestation_id", manifestation_id))
            .await?;
        rows.into_iter()
            .map(|row| Ok(row.to::<AlignmentPairRef>()?))
            .collect()
    }

    async fn aligned_peer_segments(
        &self,
        segmentation_id: &str,
        start: i64,
        end: i64,
    ) -> Result<Vec<SegmentRecord>> {
        let rows = self
            .client
            .all(
                query(alignments::PEER_SEGMENTS_OVERLAPPING)
                    .param("segmentation_id", segmentation_id)
                    .param("span_start", start)
                    .param("span_end", end),
            )
            .await?;
        Self::to_records(rows)
    }

    async fn manifestation_of(&self, segmentation_id: &str) -> Result<Option<String>> {
        let row = self
            .client
            .single(query(segmentations::MANIFESTATION_OF).param("segmentation_id", segmentation_id))
            .await?;
        match row {
            Some(row) => Ok(Some(row.get::<String>("manifestation_id")?)),
            None => Ok(None),
        }
    }

    async fn segmentation_segments(
        &self,
        manifestation_id: &str,
        start: i64,
        end: i64,
    ) -> Result<Vec<SegmentRecord>> {
        let rows = self
            .client
            .all(
                query(segments::OVERLAPPING_SEGMENTATION_SEGMENTS)
                    .param("manifestation_id", manifestation_id)
                    .param("span_start", start)
                    .param("span_end", end),
            )
            .await?;
        Self::to_records(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// In-memory alignment graph: manifestation → alignment pairs, layer →
    /// peer segments, layer → manifestation, manifestation → segmentation
    /// segments.
    #[derive(Default)]
    struct FakeGraph {
        pairs: HashMap<String, Vec<AlignmentPairRef>>,
        peer_segments: HashMap<String, Vec<SegmentRecord>>,
        layer_owner: HashMap<String, String>,
        plain_segments: HashMap<String, Vec<SegmentRecord>>,
    }

    impl AlignmentSource for FakeGraph {
        async fn alignment_pairs(&self, manifestation_id: &str) -> Result<Vec<AlignmentPairRef>> {
            Ok(self.pairs.get(manifestation_id).cloned().unwrap_or_default())
        }

        async fn aligned_peer_segments(
            &self,
            segmentation_id: &str,
            start: i64,
            end: i64,
        ) -> Result<Vec<SegmentRecord>> {
            Ok(self
                .peer_segments
                .get(segmentation_id)
                .map(|segments| {
                    segments
                        .iter()
                        .filter(|seg| {
                            seg.lines.iter().any(|line| line.start < end && line.end > start)
                        })
                        .cloned()
                        .collect()
                })
                .unwrap_or_default())
        }

        async fn manifestation_of(&self, segmentation_id: &str) -> Result<Option<String>> {
            Ok(self.layer_owner.get(segmentation_id).cloned())
        }

        async fn segmentation_segments(
            &self,
            manifestation_id: &str,
            start: i64,
            end: i64,
        ) -> Result<Vec<SegmentRecord>> {
            Ok(self
                .plain_segments
                .get(manifestation_id)
                .map(|segments| {
                    segments
                        .iter()
                        .filter(|seg| {
                            seg.lines.iter().any(|line| line.start < end && line.end > start)
                        })
                        .cloned()
                        .collect()
                })
                .unwrap_or_default())
        }
    }

    fn seg(id: &str, start: i64, end: i64) -> SegmentRecord {
        SegmentRecord { id: id.to_owned(), lines: vec![Span { start, end }] }
    }

    fn pair(source: &str, peer: &str) -> AlignmentPairRef {
        AlignmentPairRef { source_id: source.to_owned(), peer_id: peer.to_owned() }
    }

    /// M1 ↔ M2 aligned segment-for-segment; probing [0, 7) crosses once.
    fn two_editions() -> FakeGraph {
        let mut graph = FakeGraph::default();
        graph.pairs.insert("M1".into(), vec![pair("A1", "A2")]);
        graph.pairs.insert("M2".into(), vec![pair("A2", "A1")]);
        // A1's source side holds M1's coordinates; the probe returns the
        // peer (M2-coordinate) segments.
        graph.peer_segments.insert("A1".into(), vec![seg("t0", 0, 7)]);
        graph.peer_segments.insert("A2".into(), vec![seg("s0", 0, 7)]);
        graph.layer_owner.insert("A1".into(), "M1".into());
        graph.layer_owner.insert("A2".into(), "M2".into());
        graph
            .plain_segments
            .insert("M2".into(), vec![seg("p0", 0, 4), seg("p1", 4, 9), seg("p2", 10, 20)]);
        graph
    }

    #[tokio::test]
    async fn alignment_mode_emits_peer_alignment_segments() {
        let graph = two_editions();
        let related = walk(&graph, "M1", 0, 7, false).await.unwrap();
        assert_eq!(related.len(), 1);
        assert_eq!(related[0].manifestation_id, "M2");
        assert_eq!(related[0].segments[0].id, "t0");
    }

    #[tokio::test]
    async fn transform_mode_transfers_onto_the_segmentation_layer() {
        let graph = two_editions();
        let related = walk(&graph, "M1", 0, 7, true).await.unwrap();
        assert_eq!(related.len(), 1);
        let ids: Vec<_> = related[0].segments.iter().map(|s| s.id.as_str()).collect();
        // Overlapping [0, 7): p0 and p1 but not p2.
        assert_eq!(ids, vec!["p0", "p1"]);
    }

    #[tokio::test]
    async fn walk_does_not_revisit_manifestations() {
        // Triangle M1–M2, M2–M3, M3–M1; each edition must appear once.
        let mut graph = FakeGraph::default();
        graph.pairs.insert("M1".into(), vec![pair("A12", "A21"), pair("A13", "A31")]);
        graph.pairs.insert("M2".into(), vec![pair("A21", "A12"), pair("A23", "A32")]);
        graph.pairs.insert("M3".into(), vec![pair("A31", "A13"), pair("A32", "A23")]);
        for (layer, owner) in [
            ("A12", "M1"), ("A13", "M1"), ("A21", "M2"),
            ("A23", "M2"), ("A31", "M3"), ("A32", "M3"),
        ] {
            graph.layer_owner.insert(layer.into(), owner.into());
        }
        for layer in ["A12", "A13", "A21", "A23", "A31", "A32"] {
            graph.peer_segments.insert(layer.into(), vec![seg(layer, 0, 5)]);
        }

        let related = walk(&graph, "M1", 0, 5, false).await.unwrap();
        let mut ids: Vec<_> = related.iter().map(|r| r.manifestation_id.clone()).collect();
        ids.sort();
        assert_eq!(ids, vec!["M2".to_owned(), "M3".to_owned()]);
    }

    #[tokio::test]
    async fn no_overlap_means_no_crossing() {
        let graph = two_editions();
        let related = walk(&graph, "M1", 100, 110, false).await.unwrap();
        assert!(related.is_empty());
    }

    #[tokio::test]
    async fn expansion_covers_the_union_of_matched_segments() {
        // One source segment overlap expands to the peer segment's full
        // extent before transferring.
        let mut graph = two_editions();
        graph
            .peer_segments
            .insert("A1".into(), vec![seg("t0", 0, 7), seg("t1", 7, 16)]);
        let related = walk(&graph, "M1", 5, 9, true).await.unwrap();
        // Expanded bounds [0, 16) pick up p0, p1 and p2.
        let ids: Vec<_> = related[0].segments.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["p0", "p1", "p2"]);
    }
}
