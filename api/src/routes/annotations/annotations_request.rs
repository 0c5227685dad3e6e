use graph_store::model::{
    AlignedSegmentInput, AnnotationKind, BibliographyEntry, NoteEntry, PageInput, SegmentInput,
};
use serde::Deserialize;

/// One body shape for every annotation kind; the path segment decides the
/// variant and exactly the matching fields must be present.
#[derive(Deserialize)]
pub struct AddAnnotationRequest {
    pub manifestation_id: String,
    #[serde(default)]
    pub segments: Option<Vec<SegmentInput>>,
    #[serde(default)]
    pub pages: Option<Vec<PageInput>>,
    #[serde(default)]
    pub target_manifestation_id: Option<String>,
    #[serde(default)]
    pub target_segments: Option<Vec<SegmentInput>>,
    #[serde(default)]
    pub aligned_segments: Option<Vec<AlignedSegmentInput>>,
    #[serde(default)]
    pub notes: Option<Vec<NoteEntry>>,
    #[serde(default)]
    pub entries: Option<Vec<BibliographyEntry>>,
}

impl AddAnnotationRequest {
    pub fn validate_for(&self, kind: AnnotationKind) -> Result<(), String> {
        let fields = [
            ("segments", self.segments.is_some()),
            ("pages", self.pages.is_some()),
            ("target_segments", self.target_segments.is_some()),
            ("aligned_segments", self.aligned_segments.is_some()),
            ("notes", self.notes.is_some()),
            ("entries", self.entries.is_some()),
        ];
        let expected: &[&str] = match kind {
            AnnotationKind::Segmentation | AnnotationKind::SearchSegmentation => &["segments"],
            AnnotationKind::Pagination => &["pages"],
            AnnotationKind::Alignment => &["target_segments", "aligned_segments"],
            AnnotationKind::Durchen => &["notes"],
            AnnotationKind::Bibliography => &["entries"],
            AnnotationKind::TableOfContents => return Err("unsupported annotation kind".into()),
        };
        for (name, present) in fields {
            let wanted = expected.contains(&name);
            if wanted && !present {
                return Err(format!("'{name}' is required for {} annotations", kind.as_str()));
            }
            if !wanted && present {
                return Err(format!(
                    "'{name}' cannot be provided for {} annotations",
                    kind.as_str()
                ));
            }
        }
        if kind == AnnotationKind::Alignment && self.target_manifestation_id.is_none() {
            return Err("target_manifestation_id is required for alignment annotations".into());
        }
        Ok(())
    }
}

/// Replacement payload for an existing annotation of the same kind.
#[derive(Deserialize)]
pub struct UpdateAnnotationRequest {
    #[serde(default)]
    pub segments: Option<Vec<SegmentInput>>,
    #[serde(default)]
    pub pages: Option<Vec<PageInput>>,
    #[serde(default)]
    pub target_segments: Option<Vec<SegmentInput>>,
    #[serde(default)]
    pub aligned_segments: Option<Vec<AlignedSegmentInput>>,
}

/// The wire names under `/v2/annotations/{kind}`.
pub fn parse_kind(kind: &str) -> Option<AnnotationKind> {
    match kind {
        "segmentation" => Some(AnnotationKind::Segmentation),
        "pagination" => Some(AnnotationKind::Pagination),
        "alignment" => Some(AnnotationKind::Alignment),
        "durchen" => Some(AnnotationKind::Durchen),
        "bibliographic" => Some(AnnotationKind::Bibliography),
        "search_segmentation" => Some(AnnotationKind::SearchSegmentation),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(json: serde_json::Value) -> AddAnnotationRequest {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn segmentation_body_cannot_mix_alignment_fields() {
        let body = request(serde_json::json!({
            "manifestation_id": "M1",
            "segments": [{"lines": [{"start": 0, "end": 5}]}],
            "aligned_segments": [{"lines": [{"start": 0, "end": 5}], "alignment_indices": [0]}]
        }));
        assert!(body.validate_for(AnnotationKind::Segmentation).is_err());
    }

    #[test]
    fn alignment_requires_target_manifestation() {
        let body = request(serde_json::json!({
            "manifestation_id": "M1",
            "target_segments": [{"lines": [{"start": 0, "end": 5}]}],
            "aligned_segments": [{"lines": [{"start": 0, "end": 5}], "alignment_indices": [0]}]
        }));
        assert!(body.validate_for(AnnotationKind::Alignment).is_err());
    }

    #[test]
    fn matching_bodies_pass() {
        let body = request(serde_json::json!({
            "manifestation_id": "M1",
            "pages": [{"reference": "1a", "lines": [{"start": 0, "end": 5}]}]
        }));
        assert!(body.validate_for(AnnotationKind::Pagination).is_ok());

        let body = request(serde_json::json!({
            "manifestation_id": "M1",
            "notes": [{"span": {"start": 0, "end": 5}, "note": "variant"}]
        }));
        assert!(body.validate_for(AnnotationKind::Durchen).is_ok());
    }

    #[test]
    fn kind_names_follow_the_wire_surface() {
        assert_eq!(parse_kind("bibliographic"), Some(AnnotationKind::Bibliography));
        assert_eq!(parse_kind("segmentation"), Some(AnnotationKind::Segmentation));
        assert!(parse_kind("bogus").is_none());
    }
}
