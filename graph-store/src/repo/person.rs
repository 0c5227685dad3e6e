use neo4rs::{Txn, query};
use serde::Deserialize;
use services::generate_id;
use tracing::info;

use crate::client::{GraphClient, txn_required, txn_single};
use crate::errors::{GraphError, Result};
use crate::model::{LocalizedEntry, LocalizedString, PersonInput, PersonRecord};
use crate::nomen;
use crate::queries::{params, persons};

#[derive(Clone)]
pub struct PersonRepo {
    client: GraphClient,
}

#[derive(Deserialize)]
struct PersonRow {
    id: String,
    bdrc: Option<String>,
    wiki: Option<String>,
    name: Vec<LocalizedEntry>,
    alt_names: Vec<Vec<LocalizedEntry>>,
}

impl PersonRepo {
    pub fn new(client: GraphClient) -> Self {
        Self { client }
    }

    pub async fn get(&self, person_id: &str) -> Result<PersonRecord> {
        let row = self
            .client
            .single(query(&persons::fetch_by_id()).param("id", person_id))
            .await?
            .ok_or_else(|| GraphError::not_found(format!("person '{person_id}' not found")))?;
        Ok(record_from(row.get::<PersonRow>("person")?))
    }

    pub async fn get_all(&self, offset: i64, limit: i64) -> Result<Vec<PersonRecord>> {
        let rows = self
            .client
            .all(
                query(&persons::fetch_all())
                    .param("offset", offset)
                    .param("limit", limit),
            )
            .await?;
        rows.into_iter()
            .map(|row| Ok(record_from(row.get::<PersonRow>("person")?)))
            .collect()
    }

    pub async fn create(&self, input: &PersonInput) -> Result<String> {
        self.client
            .execute_write(async |tx| Self::create_in_txn(tx, input).await)
            .await
    }

    pub async fn create_in_txn(tx: &mut Txn, input: &PersonInput) -> Result<String> {
        if input.name.is_empty() {
            return Err(GraphError::invalid("person name cannot be empty"));
        }
        let person_id = generate_id();
        let nomen_id = nomen::create_in_txn(tx, &input.name, input.alt_names.as_deref()).await?;

        let q = query(persons::CREATE)
            .param("id", person_id.as_str())
            .param("bdrc", params::opt(input.bdrc.as_deref()))
            .param("wiki", params::opt(input.wiki.as_deref()))
            .param("primary_nomen_id", nomen_id.as_str());
        txn_required(tx, q, "failed to create person").await?;

        info!(%person_id, "person created");
        Ok(person_id)
    }

    /// Refuses to delete a person still referenced by contributions.
    pub async fn delete(&self, person_id: &str) -> Result<()> {
        self.client
            .execute_write(async |tx| {
                let row = txn_single(tx, query(persons::HAS_CONTRIBUTIONS).param("id", person_id))
                    .await?
                    .ok_or_else(|| {
                        GraphError::not_found(format!("person '{person_id}' not found"))
                    })?;
                if row.get::<bool>("has_contributions")? {
                    return Err(GraphError::validation(format!(
                        "person '{person_id}' is referenced by contributions"
                    )));
                }
                tx.run(query(persons::DELETE).param("id", person_id)).await?;
                Ok(())
            })
            .await
    }
}

fn record_from(row: PersonRow) -> PersonRecord {
    let alt_names: Vec<LocalizedString> = row
        .alt_names
        .into_iter()
        .filter_map(LocalizedString::from_entries)
        .collect();
    PersonRecord {
        id: row.id,
        bdrc: row.bdrc,
        wiki: row.wiki,
        name: LocalizedString::from_entries(row.name).unwrap_or_default(),
        alt_names: if alt_names.is_empty() { None } else { Some(alt_names) },
    }
}
