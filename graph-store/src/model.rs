//! Domain model: closed enums, localized strings, spans, and the input /
//! record shapes exchanged with the repositories.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextType {
    Root,
    Translation,
    Commentary,
    TranslationSource,
}

impl TextType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TextType::Root => "root",
            TextType::Translation => "translation",
            TextType::Commentary => "commentary",
            TextType::TranslationSource => "translation_source",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContributorRole {
    Translator,
    Reviser,
    Author,
    Scholar,
}

impl ContributorRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContributorRole::Translator => "translator",
            ContributorRole::Reviser => "reviser",
            ContributorRole::Author => "author",
            ContributorRole::Scholar => "scholar",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ManifestationType {
    Diplomatic,
    Critical,
    Collated,
}

impl ManifestationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ManifestationType::Diplomatic => "diplomatic",
            ManifestationType::Critical => "critical",
            ManifestationType::Collated => "collated",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CopyrightStatus {
    #[default]
    #[serde(rename = "Unknown")]
    Unknown,
    #[serde(rename = "In copyright")]
    InCopyright,
    #[serde(rename = "Public domain")]
    PublicDomain,
}

impl CopyrightStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CopyrightStatus::Unknown => "Unknown",
            CopyrightStatus::InCopyright => "In copyright",
            CopyrightStatus::PublicDomain => "Public domain",
        }
    }
}

/// Creative-Commons-style license identifiers; the names double as
/// `LicenseType` directory-node keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LicenseType {
    #[serde(rename = "CC0")]
    Cc0,
    #[serde(rename = "Public Domain Mark")]
    PublicDomainMark,
    #[serde(rename = "CC BY")]
    CcBy,
    #[serde(rename = "CC BY-SA")]
    CcBySa,
    #[serde(rename = "CC BY-ND")]
    CcByNd,
    #[serde(rename = "CC BY-NC")]
    CcByNc,
    #[serde(rename = "CC BY-NC-SA")]
    CcByNcSa,
    #[serde(rename = "CC BY-NC-ND")]
    CcByNcNd,
    #[serde(rename = "under copyright")]
    UnderCopyright,
    #[default]
    #[serde(rename = "unknown")]
    Unknown,
}

impl LicenseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LicenseType::Cc0 => "CC0",
            LicenseType::PublicDomainMark => "Public Domain Mark",
            LicenseType::CcBy => "CC BY",
            LicenseType::CcBySa => "CC BY-SA",
            LicenseType::CcByNd => "CC BY-ND",
            LicenseType::CcByNc => "CC BY-NC",
            LicenseType::CcByNcSa => "CC BY-NC-SA",
            LicenseType::CcByNcNd => "CC BY-NC-ND",
            LicenseType::UnderCopyright => "under copyright",
            LicenseType::Unknown => "unknown",
        }
    }
}

/// Layer kinds stored on `Segmentation.kind`; the wire uses the same names
/// under `/v2/annotations/{kind}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationKind {
    Segmentation,
    Pagination,
    Alignment,
    Durchen,
    #[serde(rename = "bibliographic")]
    Bibliography,
    TableOfContents,
    SearchSegmentation,
}

impl AnnotationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnnotationKind::Segmentation => "segmentation",
            AnnotationKind::Pagination => "pagination",
            AnnotationKind::Alignment => "alignment",
            AnnotationKind::Durchen => "durchen",
            AnnotationKind::Bibliography => "bibliographic",
            AnnotationKind::TableOfContents => "table_of_contents",
            AnnotationKind::SearchSegmentation => "search_segmentation",
        }
    }
}

/// Mapping of BCP-47 tag → text. Ordered so responses are stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocalizedString(pub BTreeMap<String, String>);

impl LocalizedString {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Lowercased 2-3 char base codes of every tag.
    pub fn base_codes(&self) -> BTreeSet<String> {
        self.0.keys().map(|tag| base_code(tag)).collect()
    }

    /// Merges `other` into `self`, overwriting shared tags and keeping the
    /// rest untouched.
    pub fn merge(&mut self, other: &LocalizedString) {
        for (tag, text) in &other.0 {
            self.0.insert(tag.clone(), text.clone());
        }
    }

    /// Builds from the `{language, text}` entries the graph projections
    /// return; empty input maps to `None`.
    pub fn from_entries(entries: Vec<LocalizedEntry>) -> Option<Self> {
        let map: BTreeMap<_, _> = entries
            .into_iter()
            .map(|entry| (entry.language, entry.text))
            .collect();
        if map.is_empty() { None } else { Some(Self(map)) }
    }
}

/// Lowercased base language code of a BCP-47 tag (`"bo-Latn"` → `"bo"`).
pub fn base_code(tag: &str) -> String {
    tag.split('-').next().unwrap_or(tag).to_lowercase()
}

/// One localized value as projected out of the graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalizedEntry {
    pub language: String,
    pub text: String,
}

/// Half-open byte range `[start, end)` into a manifestation's base text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: i64,
    pub end: i64,
}

impl Span {
    pub fn is_well_formed(&self) -> bool {
        self.start >= 0 && self.start <= self.end
    }
}

/// A text replacement applied to a manifestation's base text: bytes
/// `[start, end)` are replaced by `new_length` bytes.
#[derive(Debug, Clone, Copy)]
pub struct TextReplacement {
    pub start: i64,
    pub end: i64,
    pub new_length: i64,
}

impl TextReplacement {
    pub fn delta(&self) -> i64 {
        self.new_length - (self.end - self.start)
    }
}

// ---- contribution shapes ----

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContributionInput {
    Ai {
        ai_id: String,
        role: ContributorRole,
    },
    Person {
        #[serde(default)]
        person_id: Option<String>,
        #[serde(default)]
        person_bdrc_id: Option<String>,
        role: ContributorRole,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContributionRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub person_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub person_bdrc_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_id: Option<String>,
    pub role: ContributorRole,
}

// ---- expressions ----

#[derive(Debug, Clone, Deserialize)]
pub struct ExpressionInput {
    pub bdrc: Option<String>,
    pub wiki: Option<String>,
    #[serde(rename = "type")]
    pub kind: TextType,
    pub contributions: Vec<ContributionInput>,
    pub date: Option<String>,
    pub title: LocalizedString,
    pub alt_titles: Option<Vec<LocalizedString>>,
    /// Full BCP-47 tag; the base code is validated against the Language
    /// directory.
    pub language: String,
    /// Target expression id for translations/commentaries, `"N/A"` for
    /// standalone ones.
    pub target: Option<String>,
    pub category_id: Option<String>,
    #[serde(default)]
    pub copyright: CopyrightStatus,
    #[serde(default)]
    pub license: LicenseType,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExpressionRecord {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bdrc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wiki: Option<String>,
    #[serde(rename = "type")]
    pub kind: TextType,
    pub contributions: Vec<ContributionRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    pub title: LocalizedString,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt_titles: Option<Vec<LocalizedString>>,
    pub language: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    pub copyright: CopyrightStatus,
    pub license: LicenseType,
}

// ---- manifestations ----

#[derive(Debug, Clone, Deserialize)]
pub struct ManifestationInput {
    pub bdrc: Option<String>,
    pub wiki: Option<String>,
    #[serde(rename = "type")]
    pub kind: ManifestationType,
    pub source: Option<String>,
    pub colophon: Option<String>,
    pub incipit_title: Option<LocalizedString>,
    pub alt_incipit_titles: Option<Vec<LocalizedString>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnotationRef {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: AnnotationKind,
}

#[derive(Debug, Clone, Serialize)]
pub struct ManifestationRecord {
    pub id: String,
    pub expression_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bdrc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wiki: Option<String>,
    #[serde(rename = "type")]
    pub kind: ManifestationType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colophon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub incipit_title: Option<LocalizedString>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt_incipit_titles: Option<Vec<LocalizedString>>,
    pub annotations: Vec<AnnotationRef>,
}

// ---- segments & annotation layers ----

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentInput {
    pub lines: Vec<Span>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageInput {
    /// Page label, e.g. `"1a"`.
    pub reference: String,
    pub lines: Vec<Span>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlignedSegmentInput {
    pub lines: Vec<Span>,
    /// Positions into the sibling `target_segments` list.
    pub alignment_indices: Vec<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AlignmentInput {
    /// Manifestation the target-side segmentation attaches to.
    pub target_id: String,
    pub target_segments: Vec<SegmentInput>,
    pub aligned_segments: Vec<AlignedSegmentInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentRecord {
    pub id: String,
    /// Spans ordered by `start`.
    pub lines: Vec<Span>,
}

impl SegmentRecord {
    pub fn min_start(&self) -> Option<i64> {
        self.lines.iter().map(|line| line.start).min()
    }

    pub fn max_end(&self) -> Option<i64> {
        self.lines.iter().map(|line| line.end).max()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SegmentationRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: AnnotationKind,
    pub manifestation_id: String,
    pub expression_id: String,
    pub segments: Vec<SegmentationSegment>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentationSegment {
    pub id: String,
    /// Page label when the layer is a pagination.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    pub lines: Vec<Span>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AlignedSegmentRecord {
    pub lines: Vec<Span>,
    pub alignment_indices: Vec<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AlignmentRecord {
    pub id: String,
    /// Target-side manifestation.
    pub target_id: String,
    /// Deduplicated target segments in first-mention order.
    pub target_segments: Vec<SegmentRecord>,
    pub aligned_segments: Vec<AlignedSegmentRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoteEntry {
    pub span: Span,
    pub note: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NoteRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub note: String,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BibliographyEntry {
    pub span: Span,
    /// BibliographyType name, e.g. `"colophon"`.
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BibliographyRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub span: Span,
}

// ---- traversal output ----

#[derive(Debug, Clone, Serialize)]
pub struct RelatedSegments {
    pub manifestation_id: String,
    pub segments: Vec<SegmentRecord>,
}

/// One entry of the related-instances listing.
#[derive(Debug, Clone, Serialize)]
pub struct RelatedInstance {
    pub instance_id: String,
    pub metadata: RelatedInstanceMetadata,
    /// Alignment layer id on this side, when the relation came through one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotation: Option<String>,
    pub relationship: TextType,
}

#[derive(Debug, Clone, Serialize)]
pub struct RelatedInstanceMetadata {
    pub instance_type: ManifestationType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub text_id: String,
    pub title: LocalizedString,
    pub alt_titles: Vec<LocalizedString>,
    pub language: String,
    pub contributions: Vec<ContributionRecord>,
}

// ---- persons ----

#[derive(Debug, Clone, Deserialize)]
pub struct PersonInput {
    pub bdrc: Option<String>,
    pub wiki: Option<String>,
    pub name: LocalizedString,
    pub alt_names: Option<Vec<LocalizedString>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PersonRecord {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bdrc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wiki: Option<String>,
    pub name: LocalizedString,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt_names: Option<Vec<LocalizedString>>,
}

// ---- categories ----

#[derive(Debug, Clone, Serialize)]
pub struct CategoryItem {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    pub title: String,
    pub has_child: bool,
}

// ---- authentication ----

#[derive(Debug, Clone, Serialize)]
pub struct ApiKeyRecord {
    pub id: String,
    pub name: String,
    pub email: String,
    pub is_active: bool,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bound_application_id: Option<String>,
}

/// Resolved caller attached to the request context after authentication.
#[derive(Debug, Clone)]
pub struct Principal {
    pub key_id: String,
    /// Tenant the key is bound to, when any.
    pub application_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_overwrites_shared_tags_and_keeps_the_rest() {
        let mut title = LocalizedString(BTreeMap::from([
            ("en".to_owned(), "O".to_owned()),
            ("bo".to_owned(), "Y".to_owned()),
        ]));
        let patch = LocalizedString(BTreeMap::from([("en".to_owned(), "X".to_owned())]));
        title.merge(&patch);
        assert_eq!(title.0.get("en").map(String::as_str), Some("X"));
        assert_eq!(title.0.get("bo").map(String::as_str), Some("Y"));
    }

    #[test]
    fn base_codes_lowercase_and_strip_subtags() {
        let title = LocalizedString(BTreeMap::from([
            ("bo-Latn".to_owned(), "x".to_owned()),
            ("EN".to_owned(), "y".to_owned()),
        ]));
        let codes: Vec<_> = title.base_codes().into_iter().collect();
        assert_eq!(codes, vec!["bo".to_owned(), "en".to_owned()]);
    }

    #[test]
    fn license_serializes_to_directory_names() {
        let json = serde_json::to_string(&LicenseType::CcBySa).unwrap();
        assert_eq!(json, "\"CC BY-SA\"");
        let back: LicenseType = serde_json::from_str("\"Public Domain Mark\"").unwrap();
        assert_eq!(back, LicenseType::PublicDomainMark);
    }

    #[test]
    fn contribution_input_distinguishes_ai_from_person() {
        let ai: ContributionInput =
            serde_json::from_str(r#"{"ai_id": "A1", "role": "translator"}"#).unwrap();
        assert!(matches!(ai, ContributionInput::Ai { .. }));

        let person: ContributionInput =
            serde_json::from_str(r#"{"person_id": "P1", "role": "author"}"#).unwrap();
        assert!(matches!(person, ContributionInput::Person { .. }));
    }

    #[test]
    fn replacement_delta_is_new_minus_replaced() {
        let replacement = TextReplacement { start: 3, end: 10, new_length: 1 };
        assert_eq!(replacement.delta(), -6);
    }
}
