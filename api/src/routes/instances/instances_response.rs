use graph_store::model::SegmentRecord;
use serde::Serialize;

#[derive(Serialize)]
pub struct InstanceUpdatedResponse {
    pub message: String,
    pub id: String,
}

#[derive(Serialize)]
pub struct ContentReplacedResponse {
    pub message: String,
    pub id: String,
    /// Entities removed because the edit engulfed their span.
    pub deleted_annotations: Vec<String>,
}

#[derive(Serialize)]
pub struct AlignedTextCreatedResponse {
    pub message: String,
    pub instance_id: String,
    pub text_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alignment_id: Option<String>,
}

/// Related segments of one reachable edition.
#[derive(Serialize)]
pub struct SegmentRelatedEntry {
    pub instance_id: String,
    pub text_id: String,
    pub segments: Vec<SegmentRecord>,
}
