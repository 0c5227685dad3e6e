//! Pre-commit invariant checks. Every function runs inside the caller's
//! transaction so a violation rolls back any partial writes, and raises
//! `GraphError::Validation` / `InvalidRequest` on failure.

use neo4rs::{Txn, query};

use crate::client::txn_single;
use crate::errors::{GraphError, Result};
use crate::model::{AnnotationKind, LocalizedString};
use crate::queries::{params, validation};

pub async fn language_code_exists(tx: &mut Txn, code: &str) -> Result<()> {
    language_codes_exist(tx, &[code.to_owned()]).await
}

/// Batched existence check over base language codes, listing the missing
/// and the available codes in the error.
pub async fn language_codes_exist(tx: &mut Txn, codes: &[String]) -> Result<()> {
    if codes.is_empty() {
        return Ok(());
    }
    let lowered: Vec<String> = codes.iter().map(|code| code.to_lowercase()).collect();
    let q = query(validation::LANGUAGE_CODES_EXIST)
        .param("codes_to_check", lowered);
    let row = txn_single(tx, q)
        .await?
        .ok_or_else(|| GraphError::invalid("no languages found in the directory"))?;
    let missing: Vec<Option<String>> = row.get("missing")?;
    let missing: Vec<String> = missing.into_iter().flatten().collect();
    if missing.is_empty() {
        return Ok(());
    }
    let available: Vec<String> = row.get("codes")?;
    Err(GraphError::invalid(format!(
        "languages {} are not registered; available languages: {}",
        missing.join(", "),
        available.join(", ")
    )))
}

pub async fn category_exists(tx: &mut Txn, category_id: &str) -> Result<()> {
    let q = query(validation::CATEGORY_EXISTS).param("category_id", category_id);
    let count = count_of(tx, q, "count").await?;
    if count == 0 {
        return Err(GraphError::validation(format!(
            "category '{category_id}' does not exist"
        )));
    }
    Ok(())
}

pub async fn expression_exists(tx: &mut Txn, expression_id: &str) -> Result<()> {
    let q = query(validation::EXPRESSION_EXISTS).param("expression_id", expression_id);
    let count = count_of(tx, q, "count").await?;
    if count == 0 {
        return Err(GraphError::validation(format!(
            "expression '{expression_id}' does not exist"
        )));
    }
    Ok(())
}

pub async fn persons_exist(tx: &mut Txn, person_ids: &[String]) -> Result<()> {
    missing_references(
        tx,
        validation::PERSONS_EXIST,
        "person_ids",
        "person_id",
        person_ids,
        "referenced persons do not exist",
    )
    .await
}

pub async fn persons_exist_by_bdrc(tx: &mut Txn, bdrc_ids: &[String]) -> Result<()> {
    missing_references(
        tx,
        validation::PERSONS_EXIST_BY_BDRC,
        "person_bdrc_ids",
        "bdrc_id",
        bdrc_ids,
        "referenced person registry ids do not exist",
    )
    .await
}

/// At most one Expression per Work carries the original flag.
pub async fn original_expression_unique(tx: &mut Txn, work_id: &str) -> Result<()> {
    let q = query(validation::ORIGINAL_EXPRESSION_COUNT).param("work_id", work_id);
    let count = count_of(tx, q, "existing_count").await?;
    if count > 0 {
        return Err(GraphError::validation(format!(
            "work '{work_id}' already has an original expression"
        )));
    }
    Ok(())
}

/// At most one critical Manifestation per Expression.
pub async fn critical_manifestation_unique(tx: &mut Txn, expression_id: &str) -> Result<()> {
    let q = query(validation::CRITICAL_MANIFESTATION_COUNT).param("expression_id", expression_id);
    let count = count_of(tx, q, "existing_count").await?;
    if count > 0 {
        return Err(GraphError::validation(format!(
            "a critical edition already exists for expression '{expression_id}'"
        )));
    }
    Ok(())
}

/// No prior annotation layer of the given kind on the manifestation.
pub async fn no_annotation_of_kind(
    tx: &mut Txn,
    manifestation_id: &str,
    kind: AnnotationKind,
) -> Result<()> {
    let q = query(validation::ANNOTATION_KIND_COUNT)
        .param("manifestation_id", manifestation_id)
        .param("kind", kind.as_str());
    let count = count_of(tx, q, "count").await?;
    if count > 0 {
        return Err(GraphError::validation(format!(
            "annotation of type '{}' already exists for manifestation '{manifestation_id}'",
            kind.as_str()
        )));
    }
    Ok(())
}

/// No alignment already connecting the two manifestations.
pub async fn no_alignment_between(
    tx: &mut Txn,
    manifestation_id: &str,
    target_manifestation_id: &str,
) -> Result<()> {
    let q = query(validation::ALIGNMENT_BETWEEN_COUNT)
        .param("manifestation_id", manifestation_id)
        .param("target_manifestation_id", target_manifestation_id);
    let count = count_of(tx, q, "count").await?;
    if count > 0 {
        return Err(GraphError::validation(format!(
            "an alignment already exists between manifestations \
             '{manifestation_id}' and '{target_manifestation_id}'"
        )));
    }
    Ok(())
}

/// Title uniqueness across expressions, per language, case-insensitive.
pub async fn expression_title_unique(tx: &mut Txn, title: &LocalizedString) -> Result<()> {
    if title.is_empty() {
        return Ok(());
    }
    let titles = params::list(title.0.iter().map(|(tag, text)| {
        params::map([
            ("lang", crate::model::base_code(tag).into()),
            ("text", text.as_str().into()),
        ])
    }));
    let q = query(validation::EXPRESSION_TITLE_EXISTS).param("titles", titles);
    let rows = crate::client::txn_all(tx, q).await?;
    for row in rows {
        if row.get::<bool>("exists")? {
            return Err(GraphError::validation(
                "an expression with the same title and language already exists",
            ));
        }
    }
    Ok(())
}

pub async fn bibliography_types_exist(tx: &mut Txn, names: &[String]) -> Result<()> {
    if names.is_empty() {
        return Ok(());
    }
    let lowered: Vec<String> = names.iter().map(|name| name.to_lowercase()).collect();
    let q = query(validation::BIBLIOGRAPHY_TYPES_EXIST).param("names_to_check", lowered);
    let row = txn_single(tx, q)
        .await?
        .ok_or_else(|| GraphError::invalid("no bibliography types found in the directory"))?;
    let missing: Vec<Option<String>> = row.get("missing")?;
    let missing: Vec<String> = missing.into_iter().flatten().collect();
    if missing.is_empty() {
        return Ok(());
    }
    Err(GraphError::validation(format!(
        "bibliography types {} are not registered",
        missing.join(", ")
    )))
}

pub async fn note_type_exists(tx: &mut Txn, name: &str) -> Result<()> {
    let q = query(validation::NOTE_TYPE_EXISTS).param("name", name.to_lowercase());
    let count = count_of(tx, q, "count").await?;
    if count == 0 {
        return Err(GraphError::validation(format!(
            "note type '{name}' is not registered"
        )));
    }
    Ok(())
}

async fn count_of(tx: &mut Txn, q: neo4rs::Query, column: &str) -> Result<i64> {
    let row = txn_single(tx, q).await?;
    match row {
        Some(row) => Ok(row.get::<i64>(column)?),
        None => Ok(0),
    }
}

async fn missing_references(
    tx: &mut Txn,
    query_text: &str,
    param_name: &str,
    column: &str,
    ids: &[String],
    message: &str,
) -> Result<()> {
    if ids.is_empty() {
        return Ok(());
    }
    let q = query(query_text).param(param_name, ids.to_vec());
    let rows = crate::client::txn_all(tx, q).await?;
    let mut missing = Vec::new();
    for row in rows {
        if !row.get::<bool>("exists")? {
            missing.push(row.get::<String>(column)?);
        }
    }
    if missing.is_empty() {
        Ok(())
    } else {
        Err(GraphError::validation(format!(
            "{message}: {}",
            missing.join(", ")
        )))
    }
}
