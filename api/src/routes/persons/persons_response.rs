use serde::Serialize;

#[derive(Serialize)]
pub struct PersonCreatedResponse {
    pub message: String,
    pub id: String,
}
