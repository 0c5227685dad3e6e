use std::collections::HashMap;

use neo4rs::{Row, Txn, query};
use serde::Deserialize;
use services::generate_id;
use tracing::info;

use crate::client::{GraphClient, txn_required, txn_single};
use crate::errors::{GraphError, Result};
use crate::model::{
    ContributionInput, ContributionRecord, ContributorRole, CopyrightStatus, ExpressionInput,
    ExpressionRecord, LicenseType, LocalizedEntry, LocalizedString, TextType, base_code,
};
use crate::nomen;
use crate::queries::{expressions, params, validation};
use crate::validate;

/// Value of the `target` field marking a standalone translation/commentary.
pub const STANDALONE_TARGET: &str = "N/A";

#[derive(Clone)]
pub struct ExpressionRepo {
    client: GraphClient,
}

#[derive(Debug, Clone, Default)]
pub struct ExpressionFilters {
    pub kind: Option<TextType>,
    /// Base language code.
    pub language: Option<String>,
    /// Case-insensitive title substring.
    pub title: Option<String>,
}

#[derive(Deserialize)]
struct ExpressionRow {
    id: String,
    bdrc: Option<String>,
    wiki: Option<String>,
    #[serde(rename = "type")]
    kind: TextType,
    date: Option<String>,
    language: String,
    copyright: Option<CopyrightStatus>,
    license: Option<LicenseType>,
    title: Vec<LocalizedEntry>,
    alt_titles: Vec<Vec<LocalizedEntry>>,
    contributions: Vec<ContributionRow>,
    target: Option<String>,
    category_id: Option<String>,
}

#[derive(Deserialize)]
struct ContributionRow {
    role: ContributorRole,
    person_id: Option<String>,
    person_bdrc_id: Option<String>,
    ai_id: Option<String>,
}

impl ExpressionRepo {
    pub fn new(client: GraphClient) -> Self {
        Self { client }
    }

    pub async fn get(&self, expression_id: &str) -> Result<ExpressionRecord> {
        let row = self
            .client
            .single(query(&expressions::fetch_by_id()).param("id", expression_id))
            .await?
            .ok_or_else(|| {
                GraphError::not_found(format!("expression '{expression_id}' not found"))
            })?;
        record_from(row)
    }

    /// Lookup by external registry id; `None` instead of an error so the
    /// create path can branch on presence.
    pub async fn get_by_bdrc(&self, bdrc_id: &str) -> Result<Option<ExpressionRecord>> {
        let row = self
            .client
            .single(query(&expressions::fetch_by_bdrc()).param("bdrc_id", bdrc_id))
            .await?;
        row.map(record_from).transpose()
    }

    pub async fn get_all(
        &self,
        offset: i64,
        limit: i64,
        filters: &ExpressionFilters,
    ) -> Result<Vec<ExpressionRecord>> {
        if let Some(language) = &filters.language {
            self.language_registered(language).await?;
        }
        let rows = self
            .client
            .all(
                query(&expressions::fetch_all())
                    .param("offset", offset)
                    .param("limit", limit)
                    .param("type", params::opt(filters.kind.map(|kind| kind.as_str())))
                    .param(
                        "language",
                        params::opt(filters.language.as_deref().map(str::to_lowercase)),
                    )
                    .param("title", params::opt(filters.title.as_deref())),
            )
            .await?;
        rows.into_iter().map(record_from).collect()
    }

    pub async fn create(&self, input: &ExpressionInput) -> Result<String> {
        self.client
            .execute_write(async |tx| Self::create_in_txn(tx, input, None).await)
            .await
    }

    /// Full creation path: validations, Work + Nomen subgraph, type
    /// dispatch, category link and contributor edges, all in one
    /// transaction.
    pub async fn create_in_txn(
        tx: &mut Txn,
        input: &ExpressionInput,
        expression_id: Option<&str>,
    ) -> Result<String> {
        let expression_id = expression_id.map(str::to_owned).unwrap_or_else(generate_id);
        let target_id = input.target.as_deref().filter(|t| *t != STANDALONE_TARGET);

        match input.kind {
            TextType::Root if input.target.is_some() => {
                return Err(GraphError::invalid("a root expression cannot have a target"));
            }
            TextType::Translation | TextType::Commentary if input.target.is_none() => {
                return Err(GraphError::invalid(format!(
                    "type '{}' requires a target (use '{STANDALONE_TARGET}' for standalone texts)",
                    input.kind.as_str()
                )));
            }
            _ => {}
        }
        if input.kind == TextType::Commentary && target_id.is_none() {
            return Err(GraphError::NotImplemented("standalone commentary creation"));
        }
        if input.contributions.is_empty() {
            return Err(GraphError::invalid("at least one contribution must be provided"));
        }

        // A translation must land in a different language than its target.
        if input.kind == TextType::Translation
            && let Some(target_id) = target_id
        {
            let target_row =
                txn_single(tx, query(&expressions::fetch_by_id()).param("id", target_id)).await?;
            if let Some(row) = target_row {
                let target = record_from(row)?;
                if target.language == input.language {
                    return Err(GraphError::validation(
                        "translation must have a different language than the target expression",
                    ));
                }
            }
        }

        let work_id = generate_id();
        validate::original_expression_unique(tx, &work_id).await?;
        validate::expression_title_unique(tx, &input.title).await?;

        let mut person_ids = Vec::new();
        let mut person_bdrc_ids = Vec::new();
        for contribution in &input.contributions {
            if let ContributionInput::Person { person_id, person_bdrc_id, .. } = contribution {
                match (person_id, person_bdrc_id) {
                    (Some(id), None) => person_ids.push(id.clone()),
                    (None, Some(bdrc)) => person_bdrc_ids.push(bdrc.clone()),
                    _ => {
                        return Err(GraphError::invalid(
                            "exactly one of person_id or person_bdrc_id must be provided",
                        ));
                    }
                }
            }
        }
        validate::persons_exist(tx, &person_ids).await?;
        validate::persons_exist_by_bdrc(tx, &person_bdrc_ids).await?;

        let language_code = base_code(&input.language);
        validate::language_code_exists(tx, &language_code).await?;
        if let Some(category_id) = &input.category_id {
            validate::category_exists(tx, category_id).await?;
        }

        let title_nomen_id =
            nomen::create_in_txn(tx, &input.title, input.alt_titles.as_deref()).await?;

        let create_query = |text: &str, original: bool| {
            let mut q = query(text)
                .param("expression_id", expression_id.as_str())
                .param("work_id", work_id.as_str())
                .param("bdrc", params::opt(input.bdrc.as_deref()))
                .param("wiki", params::opt(input.wiki.as_deref()))
                .param("type", input.kind.as_str())
                .param("date", params::opt(input.date.as_deref()))
                .param("language_code", language_code.as_str())
                .param("bcp47_tag", input.language.as_str())
                .param("copyright", input.copyright.as_str())
                .param("license", input.license.as_str())
                .param("title_nomen_id", title_nomen_id.as_str());
            if let Some(target_id) = target_id {
                q = q.param("target_id", target_id);
            } else {
                q = q.param("original", original);
            }
            q
        };

        let q = match (input.kind, target_id) {
            (TextType::Root, _) => create_query(expressions::CREATE_STANDALONE, true),
            (TextType::Translation, Some(_)) => create_query(expressions::CREATE_TRANSLATION, false),
            (TextType::Commentary, Some(_)) => create_query(expressions::CREATE_COMMENTARY, false),
            // Standalone translations and translation sources get their own
            // Work without the original flag.
            _ => create_query(expressions::CREATE_STANDALONE, false),
        };
        txn_required(
            tx,
            q,
            "language, license, or target expression not found",
        )
        .await?;

        if let Some(category_id) = &input.category_id {
            txn_required(
                tx,
                query(expressions::LINK_WORK_TO_CATEGORY)
                    .param("expression_id", expression_id.as_str())
                    .param("category_id", category_id.as_str()),
                format!("category '{category_id}' not found"),
            )
            .await?;
        }

        for contribution in &input.contributions {
            match contribution {
                ContributionInput::Person { person_id, person_bdrc_id, role } => {
                    let q = query(expressions::CREATE_CONTRIBUTION)
                        .param("expression_id", expression_id.as_str())
                        .param("person_id", params::opt(person_id.as_deref()))
                        .param("person_bdrc_id", params::opt(person_bdrc_id.as_deref()))
                        .param("role_name", role.as_str());
                    txn_required(
                        tx,
                        q,
                        format!(
                            "person or role not found (person: {:?}, registry id: {:?}, role: {})",
                            person_id,
                            person_bdrc_id,
                            role.as_str()
                        ),
                    )
                    .await?;
                }
                ContributionInput::Ai { ai_id, role } => {
                    let q = query(expressions::CREATE_AI_CONTRIBUTION)
                        .param("expression_id", expression_id.as_str())
                        .param("ai_id", ai_id.as_str())
                        .param("role_name", role.as_str());
                    txn_required(
                        tx,
                        q,
                        format!("role '{}' not found for AI contribution", role.as_str()),
                    )
                    .await?;
                }
            }
        }

        info!(%expression_id, kind = input.kind.as_str(), "expression created");
        Ok(expression_id)
    }

    /// Merges language → text entries into the title Nomen, preserving
    /// untouched languages.
    pub async fn merge_title(&self, expression_id: &str, entries: &LocalizedString) -> Result<()> {
        if entries.is_empty() {
            return Err(GraphError::invalid("title merge requires at least one entry"));
        }
        self.client
            .execute_write(async |tx| {
                nomen::merge_expression_title_in_txn(tx, expression_id, entries).await
            })
            .await
    }

    pub async fn ids_by_manifestations(
        &self,
        manifestation_ids: &[String],
    ) -> Result<HashMap<String, String>> {
        if manifestation_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows = self
            .client
            .all(
                query(expressions::IDS_BY_MANIFESTATION_IDS)
                    .param("manifestation_ids", manifestation_ids.to_vec()),
            )
            .await?;
        let mut out = HashMap::new();
        for row in rows {
            out.insert(
                row.get::<String>("manifestation_id")?,
                row.get::<String>("expression_id")?,
            );
        }
        Ok(out)
    }

    async fn language_registered(&self, language: &str) -> Result<()> {
        let row = self
            .client
            .single(
                query(validation::LANGUAGE_CODES_EXIST)
                    .param("codes_to_check", vec![language.to_lowercase()]),
            )
            .await?
            .ok_or_else(|| GraphError::invalid("no languages found in the directory"))?;
        let missing: Vec<Option<String>> = row.get("missing")?;
        if missing.into_iter().flatten().next().is_some() {
            return Err(GraphError::invalid(format!(
                "language '{language}' is not registered"
            )));
        }
        Ok(())
    }
}

fn record_from(row: Row) -> Result<ExpressionRecord> {
    let parsed: ExpressionRow = row.get("expression")?;
    let alt_titles: Vec<LocalizedString> = parsed
        .alt_titles
        .into_iter()
        .filter_map(LocalizedString::from_entries)
        .collect();
    Ok(ExpressionRecord {
        id: parsed.id,
        bdrc: parsed.bdrc,
        wiki: parsed.wiki,
        kind: parsed.kind,
        contributions: parsed
            .contributions
            .into_iter()
            .map(|c| ContributionRecord {
                person_id: c.person_id,
                person_bdrc_id: c.person_bdrc_id,
                ai_id: c.ai_id,
                role: c.role,
            })
            .collect(),
        date: parsed.date,
        title: LocalizedString::from_entries(parsed.title).unwrap_or_default(),
        alt_titles: if alt_titles.is_empty() { None } else { Some(alt_titles) },
        language: parsed.language,
        target: parsed.target,
        category_id: parsed.category_id,
        copyright: parsed.copyright.unwrap_or(CopyrightStatus::PublicDomain),
        license: parsed.license.unwrap_or(LicenseType::PublicDomainMark),
    })
}
