use neo4rs::query;
use serde::Deserialize;

use crate::client::GraphClient;
use crate::errors::{GraphError, Result};
use crate::model::{SegmentRecord, Span};
use crate::queries::segments;

#[derive(Clone)]
pub struct SegmentRepo {
    client: GraphClient,
}

/// A segment with the manifestation and expression it resolves through.
#[derive(Debug, Clone)]
pub struct SegmentContext {
    pub segment: SegmentRecord,
    pub manifestation_id: String,
    pub expression_id: String,
}

#[derive(Deserialize)]
struct SegmentRow {
    segment_id: String,
    manifestation_id: String,
    expression_id: String,
    lines: Vec<Span>,
}

impl SegmentRepo {
    pub fn new(client: GraphClient) -> Self {
        Self { client }
    }

    pub async fn get(&self, segment_id: &str) -> Result<SegmentContext> {
        let row = self
            .client
            .single(query(segments::FETCH_BY_ID).param("segment_id", segment_id))
            .await?
            .ok_or_else(|| GraphError::not_found(format!("segment '{segment_id}' not found")))?;
        let parsed = row.to::<SegmentRow>()?;
        Ok(SegmentContext {
            segment: SegmentRecord { id: parsed.segment_id, lines: parsed.lines },
            manifestation_id: parsed.manifestation_id,
            expression_id: parsed.expression_id,
        })
    }
}
