//! Bibliographic metadata (colophon, incipit, …) attached to a
//! manifestation by span, typed by a `BibliographyType` directory node.

use neo4rs::{Txn, query};
use serde::Deserialize;
use services::generate_id;
use tracing::info;

use crate::annotation::segmentation::validate_lines;
use crate::client::{GraphClient, txn_required};
use crate::errors::{GraphError, Result};
use crate::model::{BibliographyEntry, BibliographyRecord, Span};
use crate::queries::{bibliography, params};
use crate::validate;

#[derive(Clone)]
pub struct BibliographyLayer {
    client: GraphClient,
}

#[derive(Deserialize)]
struct BibliographyRow {
    id: String,
    kind: String,
    span_start: i64,
    span_end: i64,
}

impl BibliographyLayer {
    pub fn new(client: GraphClient) -> Self {
        Self { client }
    }

    pub async fn get(&self, metadata_id: &str) -> Result<BibliographyRecord> {
        let row = self
            .client
            .single(query(bibliography::FETCH_BY_ID).param("metadata_id", metadata_id))
            .await?
            .ok_or_else(|| {
                GraphError::not_found(format!("bibliographic metadata '{metadata_id}' not found"))
            })?;
        let parsed = row.to::<BibliographyRow>()?;
        Ok(BibliographyRecord {
            id: parsed.id,
            kind: parsed.kind,
            span: Span { start: parsed.span_start, end: parsed.span_end },
        })
    }

    pub async fn add(&self, manifestation_id: &str, entries: &[BibliographyEntry]) -> Result<Vec<String>> {
        self.client
            .execute_write(async |tx| Self::add_in_txn(tx, manifestation_id, entries).await)
            .await
    }

    /// Mints one BibliographicMetadata per entry after a batched type
    /// check. Returns the new ids.
    pub async fn add_in_txn(
        tx: &mut Txn,
        manifestation_id: &str,
        entries: &[BibliographyEntry],
    ) -> Result<Vec<String>> {
        if entries.is_empty() {
            return Err(GraphError::invalid("bibliography annotation cannot be empty"));
        }
        validate_lines(entries.iter().map(|entry| &entry.span))?;
        let kinds: Vec<String> = entries.iter().map(|entry| entry.kind.clone()).collect();
        validate::bibliography_types_exist(tx, &kinds).await?;

        let ids: Vec<String> = entries.iter().map(|_| generate_id()).collect();
        let payload = params::list(ids.iter().zip(entries).map(|(id, entry)| {
            params::map([
                ("id", id.as_str().into()),
                ("kind", entry.kind.to_lowercase().into()),
                ("start", entry.span.start.into()),
                ("end", entry.span.end.into()),
            ])
        }));
        let q = query(bibliography::CREATE)
            .param("manifestation_id", manifestation_id)
            .param("entries", payload);
        txn_required(tx, q, format!("manifestation '{manifestation_id}' not found")).await?;

        info!(manifestation = manifestation_id, entries = entries.len(), "bibliographic metadata created");
        Ok(ids)
    }

    /// Idempotent: deleting absent metadata is a no-op.
    pub async fn delete(&self, metadata_id: &str) -> Result<()> {
        self.client
            .execute_write(async |tx| Self::delete_in_txn(tx, metadata_id).await)
            .await
    }

    pub async fn delete_in_txn(tx: &mut Txn, metadata_id: &str) -> Result<()> {
        tx.run(query(bibliography::DELETE).param("metadata_id", metadata_id))
            .await?;
        Ok(())
    }
}
