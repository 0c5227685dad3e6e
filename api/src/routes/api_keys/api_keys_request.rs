use serde::Deserialize;

#[derive(Deserialize)]
pub struct CreateApiKeyRequest {
    pub name: String,
    pub email: String,
    /// Binds the key to an application tenant when given.
    #[serde(default)]
    pub application_id: Option<String>,
}

impl CreateApiKeyRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() || self.email.trim().is_empty() {
            return Err("name and email are required".into());
        }
        Ok(())
    }
}
