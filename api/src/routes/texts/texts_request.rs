use graph_store::model::{ExpressionInput, TextType};
use serde::Deserialize;

#[derive(Deserialize)]
pub struct ListTextsParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    #[serde(rename = "type")]
    pub kind: Option<TextType>,
    pub language: Option<String>,
    pub title: Option<String>,
}

#[derive(Deserialize)]
pub struct ListInstancesParams {
    /// `diplomatic`, `critical`, `collated`, or `all` (default).
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// Model-level rules the schema alone cannot express.
pub fn validate_expression(input: &ExpressionInput) -> Result<(), String> {
    if input.title.is_empty() {
        return Err("title must contain at least one language entry".into());
    }
    if input.contributions.is_empty() {
        return Err("at least one contribution must be provided".into());
    }
    match input.kind {
        TextType::Root if input.target.is_some() => {
            Err("when type is 'root', target must be absent".into())
        }
        TextType::Translation | TextType::Commentary if input.target.is_none() => Err(format!(
            "when type is '{}', target must be provided (use 'N/A' for standalone texts)",
            input.kind.as_str()
        )),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graph_store::model::{
        ContributionInput, ContributorRole, CopyrightStatus, LicenseType, LocalizedString,
    };
    use std::collections::BTreeMap;

    fn input(kind: TextType, target: Option<&str>) -> ExpressionInput {
        ExpressionInput {
            bdrc: None,
            wiki: None,
            kind,
            contributions: vec![ContributionInput::Person {
                person_id: Some("P1".into()),
                person_bdrc_id: None,
                role: ContributorRole::Author,
            }],
            date: None,
            title: LocalizedString(BTreeMap::from([("en".into(), "Heart Sutra".into())])),
            alt_titles: None,
            language: "bo".into(),
            target: target.map(str::to_owned),
            category_id: Some("C1".into()),
            copyright: CopyrightStatus::PublicDomain,
            license: LicenseType::Cc0,
        }
    }

    #[test]
    fn root_with_target_is_rejected() {
        assert!(validate_expression(&input(TextType::Root, Some("E2"))).is_err());
        assert!(validate_expression(&input(TextType::Root, None)).is_ok());
    }

    #[test]
    fn translation_requires_a_target() {
        assert!(validate_expression(&input(TextType::Translation, None)).is_err());
        assert!(validate_expression(&input(TextType::Translation, Some("N/A"))).is_ok());
    }

    #[test]
    fn contributions_must_be_present() {
        let mut expression = input(TextType::Root, None);
        expression.contributions.clear();
        assert!(validate_expression(&expression).is_err());
    }
}
