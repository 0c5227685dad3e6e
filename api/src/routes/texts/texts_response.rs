use serde::Serialize;

#[derive(Serialize)]
pub struct TextCreatedResponse {
    pub message: String,
    pub id: String,
}

#[derive(Serialize)]
pub struct TitleUpdatedResponse {
    pub message: String,
    pub id: String,
}

#[derive(Serialize)]
pub struct InstanceCreatedResponse {
    pub message: String,
    pub id: String,
}
