use serde::Serialize;

#[derive(Serialize)]
pub struct CategoryCreatedResponse {
    pub message: String,
    pub id: String,
}
