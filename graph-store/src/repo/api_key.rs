//! API-key administration and per-request validation. Raw keys are
//! returned exactly once; the graph only ever stores the SHA-256 hash.

use base64::URL_SAFE_NO_PAD;
use chrono::Utc;
use neo4rs::query;
use rand::RngCore;
use serde::Deserialize;
use services::generate_id;
use sha2::{Digest, Sha256};
use tracing::info;

use crate::client::GraphClient;
use crate::errors::{GraphError, Result};
use crate::model::{ApiKeyRecord, Principal};
use crate::queries::api_keys;

const RAW_KEY_BYTES: usize = 24;

#[derive(Clone)]
pub struct ApiKeyRepo {
    client: GraphClient,
}

#[derive(Deserialize)]
struct ApiKeyRow {
    id: String,
    name: String,
    email: String,
    is_active: bool,
    created_at: String,
    bound_application_id: Option<String>,
}

impl ApiKeyRepo {
    pub fn new(client: GraphClient) -> Self {
        Self { client }
    }

    /// Creates a key, optionally bound to an application tenant.
    ///
    /// Returns `(key_id, raw_key)`; the raw key is not recoverable later.
    pub async fn create(
        &self,
        name: &str,
        email: &str,
        application_id: Option<&str>,
    ) -> Result<(String, String)> {
        let key_id = generate_id();
        let raw_key = generate_raw_key();
        let api_key_hash = hash_key(&raw_key);
        let created_at = Utc::now().to_rfc3339();

        let q = match application_id {
            Some(application_id) => query(api_keys::CREATE_WITH_BINDING)
                .param("application_id", application_id),
            None => query(api_keys::CREATE),
        }
        .param("key_id", key_id.as_str())
        .param("name", name)
        .param("email", email)
        .param("api_key_hash", api_key_hash.as_str())
        .param("created_at", created_at.as_str());

        self.client
            .single(q)
            .await?
            .ok_or_else(|| GraphError::validation("failed to create API key"))?;

        info!(%key_id, bound = application_id.is_some(), "api key created");
        Ok((key_id, raw_key))
    }

    /// Hash lookup of an active key. `None` means invalid or revoked.
    pub async fn validate_key(&self, raw_key: &str) -> Result<Option<Principal>> {
        let row = self
            .client
            .single(query(api_keys::VALIDATE).param("api_key_hash", hash_key(raw_key)))
            .await?;
        Ok(match row {
            Some(row) => Some(Principal {
                key_id: row.get::<String>("id")?,
                application_id: row.get::<Option<String>>("bound_application_id")?,
            }),
            None => None,
        })
    }

    /// Deactivates the key; returns whether it existed.
    pub async fn revoke(&self, key_id: &str) -> Result<bool> {
        let row = self
            .client
            .single(query(api_keys::REVOKE).param("key_id", key_id))
            .await?;
        Ok(row.is_some())
    }

    /// Replaces the hash and reactivates the key; returns the new raw key.
    pub async fn rotate(&self, key_id: &str) -> Result<Option<String>> {
        let raw_key = generate_raw_key();
        let row = self
            .client
            .single(
                query(api_keys::ROTATE)
                    .param("key_id", key_id)
                    .param("api_key_hash", hash_key(&raw_key)),
            )
            .await?;
        Ok(row.map(|_| raw_key))
    }

    /// Key metadata only; hashes and raw keys are never listed.
    pub async fn list(&self) -> Result<Vec<ApiKeyRecord>> {
        let rows = self.client.all(query(api_keys::LIST)).await?;
        rows.into_iter()
            .map(|row| {
                let parsed = row.to::<ApiKeyRow>()?;
                Ok(ApiKeyRecord {
                    id: parsed.id,
                    name: parsed.name,
                    email: parsed.email,
                    is_active: parsed.is_active,
                    created_at: parsed.created_at,
                    bound_application_id: parsed.bound_application_id,
                })
            })
            .collect()
    }
}

/// SHA-256 over the raw key bytes, hex encoded.
pub(crate) fn hash_key(raw_key: &str) -> String {
    hex::encode(Sha256::digest(raw_key.as_bytes()))
}

/// 24 random bytes in canonical URL-safe base64 (32 characters).
pub(crate) fn generate_raw_key() -> String {
    let mut bytes = [0u8; RAW_KEY_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    base64::encode_config(bytes, URL_SAFE_NO_PAD)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_hex_sha256() {
        let hash = hash_key("secret");
        assert_eq!(hash.len(), 64);
        assert!(hash.bytes().all(|b| b.is_ascii_hexdigit()));
        // Stable for the same input.
        assert_eq!(hash, hash_key("secret"));
        assert_ne!(hash, hash_key("other"));
    }

    #[test]
    fn raw_keys_are_32_url_safe_chars() {
        let raw = generate_raw_key();
        assert_eq!(raw.len(), 32);
        assert!(raw.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_'));
        assert_ne!(raw, generate_raw_key());
    }
}
