//! Localized-name subgraph builder.
//!
//! A `Nomen` bundles one or more `LocalizedText` children; alternatives hang
//! off the primary via `ALTERNATIVE_OF`. Each localization stores the text
//! on the node, the base language code on the `Language` endpoint and the
//! full BCP-47 tag on the `HAS_LANGUAGE` edge.

use neo4rs::{BoltType, Txn, query};
use services::generate_id;

use crate::client::txn_required;
use crate::errors::Result;
use crate::model::{LocalizedString, base_code};
use crate::queries::{nomens, params};
use crate::validate;

/// Creates the primary Nomen plus one alternative Nomen per entry, after a
/// single batched language check over every base code involved.
///
/// Returns the primary Nomen's id.
pub async fn create_in_txn(
    tx: &mut Txn,
    primary: &LocalizedString,
    alternatives: Option<&[LocalizedString]>,
) -> Result<String> {
    let mut base_codes = primary.base_codes();
    for alternative in alternatives.unwrap_or_default() {
        base_codes.extend(alternative.base_codes());
    }
    validate::language_codes_exist(tx, &base_codes.into_iter().collect::<Vec<_>>()).await?;

    let primary_id = generate_id();
    let q = query(nomens::CREATE)
        .param("nomen_id", primary_id.as_str())
        .param("primary_nomen_id", params::null())
        .param("localized_texts", localized_texts(primary));
    txn_required(tx, q, "failed to create name").await?;

    for alternative in alternatives.unwrap_or_default() {
        let q = query(nomens::CREATE)
            .param("nomen_id", generate_id())
            .param("primary_nomen_id", primary_id.as_str())
            .param("localized_texts", localized_texts(alternative));
        txn_required(tx, q, "failed to create alternative name").await?;
    }

    Ok(primary_id)
}

/// Merges tag → text entries into an expression's title Nomen, preserving
/// untouched languages.
pub async fn merge_expression_title_in_txn(
    tx: &mut Txn,
    expression_id: &str,
    entries: &LocalizedString,
) -> Result<()> {
    let codes: Vec<String> = entries.base_codes().into_iter().collect();
    validate::language_codes_exist(tx, &codes).await?;

    let q = query(nomens::MERGE_EXPRESSION_TITLE)
        .param("expression_id", expression_id)
        .param("localized_texts", localized_texts(entries));
    txn_required(tx, q, format!("expression '{expression_id}' not found")).await?;
    Ok(())
}

fn localized_texts(text: &LocalizedString) -> BoltType {
    params::list(text.0.iter().map(|(tag, value)| {
        params::map([
            ("base_lang_code", base_code(tag).into()),
            ("bcp47_tag", tag.as_str().into()),
            ("text", value.as_str().into()),
        ])
    }))
}
