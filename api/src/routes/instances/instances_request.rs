use graph_store::EditionLayers;
use graph_store::model::{
    AlignedSegmentInput, BibliographyEntry, ManifestationInput, ManifestationType, NoteEntry,
    PageInput, SegmentInput,
};
use serde::Deserialize;

#[derive(Deserialize)]
pub struct SegmentationBody {
    pub segments: Vec<SegmentInput>,
}

#[derive(Deserialize)]
pub struct PaginationBody {
    pub volume: PaginationVolume,
}

#[derive(Deserialize)]
pub struct PaginationVolume {
    pub pages: Vec<PageInput>,
}

#[derive(Deserialize)]
pub struct CreateInstanceRequest {
    pub content: String,
    pub metadata: ManifestationInput,
    #[serde(default)]
    pub segmentation: Option<SegmentationBody>,
    #[serde(default)]
    pub pagination: Option<PaginationBody>,
    #[serde(default)]
    pub durchen: Option<Vec<NoteEntry>>,
    #[serde(default)]
    pub bibliography: Option<Vec<BibliographyEntry>>,
}

impl CreateInstanceRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.content.is_empty() {
            return Err("content cannot be empty".into());
        }
        validate_layer_shape(
            self.metadata.kind,
            self.segmentation.is_some(),
            self.pagination.is_some(),
        )
    }

    pub fn layers(&self) -> EditionLayers {
        EditionLayers {
            segmentation: self.segmentation.as_ref().map(|body| body.segments.clone()),
            pagination: self.pagination.as_ref().map(|body| body.volume.pages.clone()),
            durchen: self.durchen.clone(),
            bibliography: self.bibliography.clone(),
        }
    }
}

#[derive(Deserialize)]
pub struct UpdateInstanceRequest {
    #[serde(default)]
    pub content: Option<String>,
    pub metadata: ManifestationInput,
    #[serde(default)]
    pub segmentation: Option<SegmentationBody>,
    #[serde(default)]
    pub pagination: Option<PaginationBody>,
    #[serde(default)]
    pub durchen: Option<Vec<NoteEntry>>,
    #[serde(default)]
    pub bibliography: Option<Vec<BibliographyEntry>>,
}

impl UpdateInstanceRequest {
    pub fn validate(&self) -> Result<(), String> {
        if matches!(&self.content, Some(content) if content.is_empty()) {
            return Err("content cannot be empty".into());
        }
        validate_layer_shape(
            self.metadata.kind,
            self.segmentation.is_some(),
            self.pagination.is_some(),
        )
    }

    pub fn layers(&self) -> EditionLayers {
        EditionLayers {
            segmentation: self.segmentation.as_ref().map(|body| body.segments.clone()),
            pagination: self.pagination.as_ref().map(|body| body.volume.pages.clone()),
            durchen: self.durchen.clone(),
            bibliography: self.bibliography.clone(),
        }
    }
}

/// Critical editions are segmented, diplomatic editions paginated.
fn validate_layer_shape(
    kind: ManifestationType,
    has_segmentation: bool,
    has_pagination: bool,
) -> Result<(), String> {
    match kind {
        ManifestationType::Critical if has_pagination => {
            Err("a critical edition takes a segmentation, not a pagination".into())
        }
        ManifestationType::Diplomatic if has_segmentation => {
            Err("a diplomatic edition takes a pagination, not a segmentation".into())
        }
        _ => Ok(()),
    }
}

#[derive(Deserialize)]
pub struct ContentParams {
    pub span_start: Option<i64>,
    pub span_end: Option<i64>,
}

#[derive(Deserialize)]
pub struct ReplaceContentRequest {
    pub span_start: i64,
    pub span_end: i64,
    pub content: String,
    /// Segment being edited; its span is rewritten to cover the new text
    /// instead of being relocated.
    #[serde(default)]
    pub segment_id: Option<String>,
}

#[derive(Deserialize)]
pub struct RelatedParams {
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Deserialize)]
pub struct SegmentRelatedParams {
    pub segment_id: Option<String>,
    pub span_start: Option<i64>,
    pub span_end: Option<i64>,
    #[serde(default)]
    pub transform: Option<String>,
}

/// New translation or commentary derived from an existing edition.
#[derive(Deserialize)]
pub struct CreateAlignedTextRequest {
    pub language: String,
    pub content: String,
    pub title: String,
    pub source: String,
    #[serde(default)]
    pub alt_titles: Option<Vec<String>>,
    #[serde(default)]
    pub author: Option<CreatorRef>,
    pub segmentation: Vec<SegmentInput>,
    #[serde(default)]
    pub target_segments: Option<Vec<SegmentInput>>,
    #[serde(default)]
    pub aligned_segments: Option<Vec<AlignedSegmentInput>>,
    #[serde(default)]
    pub copyright: graph_store::model::CopyrightStatus,
    #[serde(default)]
    pub license: graph_store::model::LicenseType,
    #[serde(default)]
    pub bdrc: Option<String>,
    #[serde(default)]
    pub wiki: Option<String>,
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub bibliography: Option<Vec<BibliographyEntry>>,
}

/// Exactly one of the three creator references.
#[derive(Deserialize)]
pub struct CreatorRef {
    #[serde(default)]
    pub person_id: Option<String>,
    #[serde(default)]
    pub person_bdrc_id: Option<String>,
    #[serde(default)]
    pub ai_id: Option<String>,
}

impl CreateAlignedTextRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.content.is_empty() || self.title.is_empty() || self.language.is_empty() {
            return Err("language, content, and title are required".into());
        }
        if self.segmentation.is_empty() {
            return Err("segmentation cannot be empty".into());
        }
        if self.target_segments.is_some() != self.aligned_segments.is_some() {
            return Err(
                "target_segments and aligned_segments must be provided together, or neither".into(),
            );
        }
        if self.author.is_none() {
            return Err("author is required".into());
        }
        if let Some(author) = &self.author {
            let given = [&author.person_id, &author.person_bdrc_id, &author.ai_id]
                .iter()
                .filter(|field| field.is_some())
                .count();
            if given != 1 {
                return Err(
                    "exactly one of person_id, person_bdrc_id, or ai_id must be provided".into(),
                );
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn critical_rejects_pagination_and_diplomatic_rejects_segmentation() {
        assert!(validate_layer_shape(ManifestationType::Critical, false, true).is_err());
        assert!(validate_layer_shape(ManifestationType::Critical, true, false).is_ok());
        assert!(validate_layer_shape(ManifestationType::Diplomatic, true, false).is_err());
        assert!(validate_layer_shape(ManifestationType::Diplomatic, false, true).is_ok());
        assert!(validate_layer_shape(ManifestationType::Collated, true, true).is_ok());
    }

    #[test]
    fn aligned_text_requires_both_alignment_sides_or_neither() {
        let request: CreateAlignedTextRequest = serde_json::from_value(serde_json::json!({
            "language": "en",
            "content": "hello",
            "title": "Greeting",
            "source": "src",
            "segmentation": [{"lines": [{"start": 0, "end": 5}]}],
            "target_segments": [{"lines": [{"start": 0, "end": 5}]}],
            "copyright": "Public domain",
            "license": "CC0"
        }))
        .unwrap();
        assert!(request.validate().is_err());
    }

    #[test]
    fn creator_must_name_exactly_one_reference() {
        let request: CreateAlignedTextRequest = serde_json::from_value(serde_json::json!({
            "language": "en",
            "content": "hello",
            "title": "Greeting",
            "source": "src",
            "segmentation": [{"lines": [{"start": 0, "end": 5}]}],
            "author": {"person_id": "P1", "ai_id": "A1"},
            "copyright": "Public domain",
            "license": "CC0"
        }))
        .unwrap();
        assert!(request.validate().is_err());
    }
}
