use serde::Serialize;

#[derive(Serialize)]
pub struct AnnotationCreatedResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotation_id: Option<String>,
    /// Durchen and bibliographic annotations mint one node per entry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotation_ids: Option<Vec<String>>,
}

impl AnnotationCreatedResponse {
    pub fn single(message: impl Into<String>, id: String) -> Self {
        Self { message: message.into(), annotation_id: Some(id), annotation_ids: None }
    }

    pub fn many(message: impl Into<String>, ids: Vec<String>) -> Self {
        Self { message: message.into(), annotation_id: None, annotation_ids: Some(ids) }
    }
}
