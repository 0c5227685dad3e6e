//! Marginal notes (durchen) attached to a manifestation by span, typed by
//! a `NoteType` directory node.

use neo4rs::{Txn, query};
use serde::Deserialize;
use services::generate_id;
use tracing::info;

use crate::annotation::segmentation::validate_lines;
use crate::client::{GraphClient, txn_required};
use crate::errors::{GraphError, Result};
use crate::model::{NoteEntry, NoteRecord, Span};
use crate::queries::{notes, params};
use crate::validate;

pub const DURCHEN: &str = "durchen";

#[derive(Clone)]
pub struct NoteLayer {
    client: GraphClient,
}

#[derive(Deserialize)]
struct NoteRow {
    id: String,
    note: String,
    kind: String,
    span_start: i64,
    span_end: i64,
}

impl NoteLayer {
    pub fn new(client: GraphClient) -> Self {
        Self { client }
    }

    pub async fn get(&self, note_id: &str) -> Result<NoteRecord> {
        let row = self
            .client
            .single(query(notes::FETCH_BY_ID).param("note_id", note_id))
            .await?
            .ok_or_else(|| GraphError::not_found(format!("note '{note_id}' not found")))?;
        let parsed = row.to::<NoteRow>()?;
        Ok(NoteRecord {
            id: parsed.id,
            kind: parsed.kind,
            note: parsed.note,
            span: Span { start: parsed.span_start, end: parsed.span_end },
        })
    }

    pub async fn add_durchen(&self, manifestation_id: &str, entries: &[NoteEntry]) -> Result<Vec<String>> {
        self.client
            .execute_write(async |tx| Self::add_in_txn(tx, manifestation_id, entries, DURCHEN).await)
            .await
    }

    /// Mints one Note per entry, anchored by span and typed by the given
    /// `NoteType`. Returns the new note ids.
    pub async fn add_in_txn(
        tx: &mut Txn,
        manifestation_id: &str,
        entries: &[NoteEntry],
        note_type: &str,
    ) -> Result<Vec<String>> {
        if entries.is_empty() {
            return Err(GraphError::invalid("note annotation cannot be empty"));
        }
        validate_lines(entries.iter().map(|entry| &entry.span))?;
        validate::note_type_exists(tx, note_type).await?;

        let ids: Vec<String> = entries.iter().map(|_| generate_id()).collect();
        let payload = params::list(ids.iter().zip(entries).map(|(id, entry)| {
            params::map([
                ("id", id.as_str().into()),
                ("text", entry.note.as_str().into()),
                ("start", entry.span.start.into()),
                ("end", entry.span.end.into()),
            ])
        }));
        let q = query(notes::CREATE)
            .param("manifestation_id", manifestation_id)
            .param("note_type", note_type.to_lowercase())
            .param("notes", payload);
        txn_required(tx, q, format!("manifestation '{manifestation_id}' not found")).await?;

        info!(manifestation = manifestation_id, notes = entries.len(), "notes created");
        Ok(ids)
    }

    /// Idempotent: deleting an absent note is a no-op.
    pub async fn delete(&self, note_id: &str) -> Result<()> {
        self.client
            .execute_write(async |tx| Self::delete_in_txn(tx, note_id).await)
            .await
    }

    pub async fn delete_in_txn(tx: &mut Txn, note_id: &str) -> Result<()> {
        tx.run(query(notes::DELETE).param("note_id", note_id)).await?;
        Ok(())
    }
}
