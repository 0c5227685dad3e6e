use serde::Serialize;

/// Carries the raw key exactly once, at creation or rotation time.
#[derive(Serialize)]
pub struct ApiKeyCreatedResponse {
    pub id: String,
    pub api_key: String,
}

#[derive(Serialize)]
pub struct ApiKeyRotatedResponse {
    pub id: String,
    pub api_key: String,
}
