//! Category forest, one tree set per Application tenant. Sibling titles
//! are unique case-insensitively per language.

use neo4rs::{Txn, query};
use serde::Deserialize;
use services::generate_id;
use tracing::info;

use crate::client::{GraphClient, txn_required, txn_single};
use crate::errors::{GraphError, Result};
use crate::model::{CategoryItem, LocalizedString, base_code};
use crate::queries::{categories, params};
use crate::validate;

#[derive(Clone)]
pub struct CategoryRepo {
    client: GraphClient,
}

#[derive(Deserialize)]
struct CategoryRow {
    id: String,
    parent: Option<String>,
    title: Option<String>,
    has_child: bool,
}

impl CategoryRepo {
    pub fn new(client: GraphClient) -> Self {
        Self { client }
    }

    /// Siblings at one level of the tenant's forest, titled in `language`;
    /// categories without a localization in that language are omitted.
    pub async fn get_all(
        &self,
        application: &str,
        language: &str,
        parent_id: Option<&str>,
    ) -> Result<Vec<CategoryItem>> {
        let rows = self
            .client
            .all(
                query(categories::FETCH_SIBLINGS)
                    .param("application", application)
                    .param("language", language.to_lowercase())
                    .param("parent_id", params::opt(parent_id)),
            )
            .await?;
        let mut items = Vec::new();
        for row in rows {
            let parsed = row.to::<CategoryRow>()?;
            if let Some(title) = parsed.title {
                items.push(CategoryItem {
                    id: parsed.id,
                    parent: parsed.parent,
                    title,
                    has_child: parsed.has_child,
                });
            }
        }
        Ok(items)
    }

    pub async fn create(
        &self,
        application: &str,
        title: &LocalizedString,
        parent_id: Option<&str>,
    ) -> Result<String> {
        if title.is_empty() {
            return Err(GraphError::invalid("category title cannot be empty"));
        }
        self.client
            .execute_write(async |tx| Self::create_in_txn(tx, application, title, parent_id).await)
            .await
    }

    pub async fn create_in_txn(
        tx: &mut Txn,
        application: &str,
        title: &LocalizedString,
        parent_id: Option<&str>,
    ) -> Result<String> {
        let codes: Vec<String> = title.base_codes().into_iter().collect();
        validate::language_codes_exist(tx, &codes).await?;
        Self::ensure_title_free(tx, application, title, parent_id).await?;

        let category_id = generate_id();
        let localized_texts = params::list(title.0.iter().map(|(tag, text)| {
            params::map([
                ("base_lang_code", base_code(tag).into()),
                ("bcp47_tag", tag.as_str().into()),
                ("text", text.as_str().into()),
            ])
        }));
        let q = query(categories::CREATE)
            .param("category_id", category_id.as_str())
            .param("nomen_id", generate_id())
            .param("application", application)
            .param("localized_texts", localized_texts)
            .param("parent_id", params::opt(parent_id));
        txn_required(tx, q, "failed to create category").await?;

        info!(%category_id, application, "category created");
        Ok(category_id)
    }

    /// Per-parent, per-language, case-insensitive title uniqueness.
    async fn ensure_title_free(
        tx: &mut Txn,
        application: &str,
        title: &LocalizedString,
        parent_id: Option<&str>,
    ) -> Result<()> {
        for (tag, text) in &title.0 {
            let q = query(categories::FIND_EXISTING)
                .param("application", application)
                .param("parent_id", params::opt(parent_id))
                .param("language", base_code(tag))
                .param("title_text", text.as_str());
            if txn_single(tx, q).await?.is_some() {
                return Err(GraphError::validation(format!(
                    "category with title '{text}' in language '{tag}' \
                     already exists for application '{application}'"
                )));
            }
        }
        Ok(())
    }
}
