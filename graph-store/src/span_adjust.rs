//! Span-relocation engine.
//!
//! When bytes `[start, end)` of a manifestation's base text are replaced by
//! `new_length` bytes, every span anchored to that manifestation, except
//! the entity being edited, is rewritten or its owner deleted.

use neo4rs::{Txn, query};
use serde::Deserialize;
use tracing::debug;

use crate::client::txn_all;
use crate::errors::Result;
use crate::model::{Span, TextReplacement};
use crate::queries::spans;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanAdjustment {
    Unchanged,
    Moved(Span),
    /// The edit fully covers the span; the owning entity must go.
    Deleted,
}

/// Relocation rule. The six cases are disjoint and cover every overlap
/// pattern of the replaced range against an existing span.
pub fn adjust(span: Span, replacement: &TextReplacement) -> SpanAdjustment {
    let Span { start, end } = span;
    let (rs, re) = (replacement.start, replacement.end);
    let delta = replacement.delta();

    if rs >= end {
        // 1: edit entirely after the span.
        SpanAdjustment::Unchanged
    } else if re <= start {
        // 2: edit entirely before; the span shifts.
        SpanAdjustment::Moved(Span { start: start + delta, end: end + delta })
    } else if rs <= start && re >= end {
        // 3: edit fully covers the span.
        SpanAdjustment::Deleted
    } else if rs < start && start < re && re < end {
        // 4: edit overlaps the left edge.
        SpanAdjustment::Moved(Span { start: rs + replacement.new_length, end: end + delta })
    } else if start <= rs && re <= end {
        // 5: edit strictly inside the span.
        SpanAdjustment::Moved(Span { start, end: end + delta })
    } else {
        // 6: edit overlaps the right edge; the span is truncated at it.
        SpanAdjustment::Moved(Span { start, end: rs })
    }
}

#[derive(Deserialize)]
struct AffectedRow {
    entity_id: String,
    span_start: i64,
    span_end: i64,
}

/// Applies the rule to every span anchored to the manifestation, except
/// spans of `exclude_entity_id`, inside the caller's write transaction.
///
/// Returns the ids of entities whose spans were engulfed and deleted.
pub async fn relocate_in_txn(
    tx: &mut Txn,
    manifestation_id: &str,
    replacement: &TextReplacement,
    exclude_entity_id: &str,
) -> Result<Vec<String>> {
    let q = query(spans::FIND_AFFECTED)
        .param("manifestation_id", manifestation_id)
        .param("replace_start", replacement.start)
        .param("exclude_entity_id", exclude_entity_id);
    let rows = txn_all(tx, q).await?;

    let mut deleted = Vec::new();
    for row in rows {
        let affected: AffectedRow = row.to::<AffectedRow>()?;
        let span = Span { start: affected.span_start, end: affected.span_end };
        match adjust(span, replacement) {
            SpanAdjustment::Unchanged => {}
            SpanAdjustment::Moved(new_span) => {
                if new_span != span {
                    tx.run(
                        query(spans::UPDATE)
                            .param("entity_id", affected.entity_id.as_str())
                            .param("new_start", new_span.start)
                            .param("new_end", new_span.end),
                    )
                    .await?;
                }
            }
            SpanAdjustment::Deleted => {
                debug!(entity = %affected.entity_id, "span engulfed by edit, deleting owner");
                tx.run(query(spans::DELETE_OWNER).param("entity_id", affected.entity_id.as_str()))
                    .await?;
                deleted.push(affected.entity_id);
            }
        }
    }
    Ok(deleted)
}

/// Rewrites the edited entity's own span so it covers the replacement text.
pub async fn update_span_end_in_txn(tx: &mut Txn, entity_id: &str, new_length: i64) -> Result<()> {
    tx.run(
        query(spans::UPDATE_END)
            .param("entity_id", entity_id)
            .param("new_length", new_length),
    )
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(start: i64, end: i64) -> Span {
        Span { start, end }
    }

    fn replace(start: i64, end: i64, new_length: i64) -> TextReplacement {
        TextReplacement { start, end, new_length }
    }

    #[test]
    fn case_1_edit_entirely_after_leaves_span_alone() {
        assert_eq!(
            adjust(span(2, 5), &replace(5, 9, 1)),
            SpanAdjustment::Unchanged
        );
    }

    #[test]
    fn case_2_edit_entirely_before_shifts_by_delta() {
        // Replacing [0, 3) with 1 byte: delta = -2.
        assert_eq!(
            adjust(span(5, 8), &replace(0, 3, 1)),
            SpanAdjustment::Moved(span(3, 6))
        );
    }

    #[test]
    fn case_3_fully_covered_span_deletes_owner() {
        assert_eq!(adjust(span(5, 7), &replace(3, 10, 1)), SpanAdjustment::Deleted);
        // Exact cover counts too.
        assert_eq!(adjust(span(3, 10), &replace(3, 10, 1)), SpanAdjustment::Deleted);
    }

    #[test]
    fn case_4_left_edge_overlap_moves_start_to_end_of_replacement() {
        // Replace [2, 6) with 3 bytes over span [4, 10): delta = -1.
        assert_eq!(
            adjust(span(4, 10), &replace(2, 6, 3)),
            SpanAdjustment::Moved(span(5, 9))
        );
    }

    #[test]
    fn case_5_edit_strictly_inside_grows_or_shrinks_end() {
        // Replace [4, 6) with 5 bytes inside [2, 10): delta = +3.
        assert_eq!(
            adjust(span(2, 10), &replace(4, 6, 5)),
            SpanAdjustment::Moved(span(2, 13))
        );
    }

    #[test]
    fn case_6_right_edge_overlap_truncates_at_replacement_start() {
        assert_eq!(
            adjust(span(2, 8), &replace(5, 12, 4)),
            SpanAdjustment::Moved(span(2, 5))
        );
    }

    #[test]
    fn engulfed_note_example_from_the_wire() {
        // Replace [3, 10) with 1 byte: the [5, 7) note dies, a [15, 17)
        // note slides to [9, 11).
        let replacement = replace(3, 10, 1);
        assert_eq!(adjust(span(5, 7), &replacement), SpanAdjustment::Deleted);
        assert_eq!(
            adjust(span(15, 17), &replacement),
            SpanAdjustment::Moved(span(9, 11))
        );
    }

    #[test]
    fn cases_cover_all_overlap_patterns() {
        let replacement = replace(10, 20, 10);
        for start in 0..30 {
            for end in start..31 {
                // Every span gets exactly one verdict without panicking.
                let _ = adjust(span(start, end), &replacement);
            }
        }
    }
}
