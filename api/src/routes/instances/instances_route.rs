use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use graph_store::AlignedTextInput;
use graph_store::model::{
    AlignmentInput, ContributionInput, ContributorRole, ExpressionInput, LocalizedString,
    ManifestationInput, ManifestationRecord, ManifestationType, RelatedInstance, Span,
    TextReplacement, TextType,
};
use tracing::info;

use crate::core::app_state::AppState;
use crate::error_handler::{AppError, AppResult};
use crate::routes::instances::instances_request::{
    ContentParams, CreateAlignedTextRequest, CreatorRef, RelatedParams, ReplaceContentRequest,
    SegmentRelatedParams, UpdateInstanceRequest,
};
use crate::routes::instances::instances_response::{
    AlignedTextCreatedResponse, ContentReplacedResponse, InstanceUpdatedResponse,
    SegmentRelatedEntry,
};

/// GET /v2/editions/{id}/content: full text, or the byte slice
/// `[span_start, span_end)`.
pub async fn get_content(
    State(state): State<Arc<AppState>>,
    Path(manifestation_id): Path<String>,
    Query(params): Query<ContentParams>,
) -> AppResult<Json<String>> {
    let manifestation = state.store.manifestations.get(&manifestation_id).await?;
    let expression_id = manifestation.expression_id;

    let content = match (params.span_start, params.span_end) {
        (None, None) => state.texts.retrieve(&expression_id, &manifestation_id).await?,
        (Some(start), Some(end)) => {
            state
                .texts
                .retrieve_slice(&expression_id, &manifestation_id, start, end)
                .await?
        }
        _ => {
            return Err(AppError::BadRequest(
                "span_start and span_end must be provided together".into(),
            ));
        }
    };
    Ok(Json(content))
}

/// PUT /v2/editions/{id}/content: replace a byte range of the base text
/// and relocate every span anchored to the edition.
pub async fn put_content(
    State(state): State<Arc<AppState>>,
    Path(manifestation_id): Path<String>,
    payload: Result<Json<ReplaceContentRequest>, JsonRejection>,
) -> AppResult<Json<ContentReplacedResponse>> {
    let Json(request) = payload?;
    if request.span_start < 0 || request.span_start > request.span_end {
        return Err(AppError::BadRequest(format!(
            "invalid replacement span [{}, {})",
            request.span_start, request.span_end
        )));
    }

    let manifestation = state.store.manifestations.get(&manifestation_id).await?;
    let expression_id = manifestation.expression_id;

    let text = state.texts.retrieve(&expression_id, &manifestation_id).await?;
    let (start, end) = (request.span_start as usize, request.span_end as usize);
    if end > text.len() {
        return Err(AppError::BadRequest(format!(
            "replacement span [{start}, {end}) exceeds the base text length {}",
            text.len()
        )));
    }
    let (Some(head), Some(tail)) = (text.get(..start), text.get(end..)) else {
        return Err(AppError::BadRequest(
            "replacement span does not fall on character boundaries".into(),
        ));
    };
    let new_text = format!("{head}{}{tail}", request.content);

    let replacement = TextReplacement {
        start: request.span_start,
        end: request.span_end,
        new_length: request.content.len() as i64,
    };
    let deleted = state
        .store
        .relocate_spans(&manifestation_id, replacement, request.segment_id.as_deref())
        .await?;
    state.texts.store(&expression_id, &manifestation_id, &new_text).await?;

    if let Some(indexer) = &state.indexer {
        indexer.notify_manifestation_changed(&manifestation_id);
    }
    info!(%manifestation_id, deleted = deleted.len(), "base text replaced");

    Ok(Json(ContentReplacedResponse {
        message: "Content updated successfully".into(),
        id: manifestation_id,
        deleted_annotations: deleted,
    }))
}

/// GET /v2/editions/{id}/metadata
pub async fn get_metadata(
    State(state): State<Arc<AppState>>,
    Path(manifestation_id): Path<String>,
) -> AppResult<Json<ManifestationRecord>> {
    Ok(Json(state.store.manifestations.get(&manifestation_id).await?))
}

/// PUT /v2/editions/{id}/metadata: wholesale replacement of metadata and
/// annotation layers; the base text is rewritten when `content` is given.
pub async fn put_metadata(
    State(state): State<Arc<AppState>>,
    Path(manifestation_id): Path<String>,
    payload: Result<Json<UpdateInstanceRequest>, JsonRejection>,
) -> AppResult<Json<InstanceUpdatedResponse>> {
    let Json(request) = payload?;
    request.validate().map_err(AppError::Unprocessable)?;

    let manifestation = state.store.manifestations.get(&manifestation_id).await?;
    let expression_id = manifestation.expression_id;

    let replaced = state
        .store
        .update_edition(&manifestation_id, &request.metadata, &request.layers())
        .await?;

    if let Some(content) = &request.content {
        state.texts.store(&expression_id, &manifestation_id, content).await?;
    }

    if let Some(indexer) = &state.indexer {
        indexer.notify_segments_deleted(replaced);
        indexer.notify_manifestation_changed(&manifestation_id);
    }

    Ok(Json(InstanceUpdatedResponse {
        message: "Manifestation updated successfully".into(),
        id: manifestation_id,
    }))
}

/// GET /v2/editions/{id}/related
pub async fn get_related(
    State(state): State<Arc<AppState>>,
    Path(manifestation_id): Path<String>,
    Query(params): Query<RelatedParams>,
) -> AppResult<Json<Vec<RelatedInstance>>> {
    let filter = match params.kind.as_deref() {
        None => None,
        Some("translation") => Some(TextType::Translation),
        Some("commentary") => Some(TextType::Commentary),
        Some("root") => Some(TextType::Root),
        Some("translation_source") => Some(TextType::TranslationSource),
        Some(other) => {
            return Err(AppError::BadRequest(format!(
                "type must be one of translation, commentary, root, translation_source (got '{other}')"
            )));
        }
    };
    let related = state
        .store
        .manifestations
        .get_related(&manifestation_id, &state.store.expressions, filter)
        .await?;
    Ok(Json(related))
}

/// GET /v2/editions/{id}/segment-related: the alignment BFS, seeded by a
/// segment id or an explicit span (exactly one of the two).
pub async fn get_segment_related(
    State(state): State<Arc<AppState>>,
    Path(manifestation_id): Path<String>,
    Query(params): Query<SegmentRelatedParams>,
) -> AppResult<Json<Vec<SegmentRelatedEntry>>> {
    let transform = params.transform.as_deref() == Some("true");
    let span = resolve_probe_span(&state, &manifestation_id, &params).await?;

    let related = state
        .store
        .related_segments(&manifestation_id, span.start, span.end, transform)
        .await?;

    let mut entries = Vec::with_capacity(related.len());
    for item in related {
        let manifestation = state.store.manifestations.get(&item.manifestation_id).await?;
        entries.push(SegmentRelatedEntry {
            instance_id: manifestation.id,
            text_id: manifestation.expression_id,
            segments: item.segments,
        });
    }
    Ok(Json(entries))
}

/// POST /v2/editions/{id}/translation
pub async fn post_translation(
    State(state): State<Arc<AppState>>,
    Path(manifestation_id): Path<String>,
    payload: Result<Json<CreateAlignedTextRequest>, JsonRejection>,
) -> AppResult<Response> {
    let Json(request) = payload?;
    create_aligned_text(state, manifestation_id, request, TextType::Translation).await
}

/// POST /v2/editions/{id}/commentary
pub async fn post_commentary(
    State(state): State<Arc<AppState>>,
    Path(manifestation_id): Path<String>,
    payload: Result<Json<CreateAlignedTextRequest>, JsonRejection>,
) -> AppResult<Response> {
    let Json(request) = payload?;
    if request.category_id.is_none() {
        return Err(AppError::BadRequest("category_id is required".into()));
    }
    create_aligned_text(state, manifestation_id, request, TextType::Commentary).await
}

async fn resolve_probe_span(
    state: &AppState,
    manifestation_id: &str,
    params: &SegmentRelatedParams,
) -> AppResult<Span> {
    let has_segment = params.segment_id.as_deref().is_some_and(|id| !id.is_empty());
    let has_span = params.span_start.is_some() || params.span_end.is_some();

    if has_segment && has_span {
        return Err(AppError::BadRequest(
            "cannot provide both segment_id and span parameters; use one approach only".into(),
        ));
    }
    if !has_segment && !has_span {
        return Err(AppError::BadRequest(
            "either segment_id or (span_start and span_end) is required".into(),
        ));
    }

    if has_segment {
        let segment_id = params.segment_id.as_deref().unwrap_or_default();
        let context = state.store.segments.get(segment_id).await?;
        if context.manifestation_id != manifestation_id {
            return Err(AppError::BadRequest(format!(
                "segment '{segment_id}' does not belong to manifestation '{manifestation_id}'"
            )));
        }
        let (Some(start), Some(end)) =
            (context.segment.min_start(), context.segment.max_end())
        else {
            return Err(AppError::NotFound(format!(
                "segment '{segment_id}' has no spans"
            )));
        };
        return Ok(Span { start, end });
    }

    let (Some(start), Some(end)) = (params.span_start, params.span_end) else {
        return Err(AppError::BadRequest(
            "both span_start and span_end are required when using span parameters".into(),
        ));
    };
    if start < 0 || start > end {
        return Err(AppError::BadRequest(format!("invalid span [{start}, {end})")));
    }
    Ok(Span { start, end })
}

/// Shared implementation of the translation/commentary protocol: new
/// expression + critical edition + segmentation, optionally aligned to the
/// source edition, with blob rollback when the graph write fails.
async fn create_aligned_text(
    state: Arc<AppState>,
    source_manifestation_id: String,
    request: CreateAlignedTextRequest,
    kind: TextType,
) -> AppResult<Response> {
    request.validate().map_err(AppError::Unprocessable)?;

    let source = state.store.manifestations.get(&source_manifestation_id).await?;
    let target_expression_id = source.expression_id;

    let expression_id = state.store.mint_id();
    let manifestation_id = state.store.mint_id();

    state
        .texts
        .store(&expression_id, &manifestation_id, &request.content)
        .await?;

    let role = if kind == TextType::Translation {
        ContributorRole::Translator
    } else {
        ContributorRole::Author
    };
    let contributions = match &request.author {
        Some(creator) => vec![contribution_from(creator, role)],
        None => Vec::new(),
    };

    let title = LocalizedString(BTreeMap::from([(request.language.clone(), request.title.clone())]));
    let alt_titles = request.alt_titles.as_ref().map(|titles| {
        titles
            .iter()
            .map(|alt| LocalizedString(BTreeMap::from([(request.language.clone(), alt.clone())])))
            .collect()
    });

    let input = AlignedTextInput {
        expression: ExpressionInput {
            bdrc: request.bdrc.clone(),
            wiki: request.wiki.clone(),
            kind,
            contributions,
            date: None,
            title,
            alt_titles,
            language: request.language.clone(),
            target: Some(target_expression_id),
            category_id: request.category_id.clone(),
            copyright: request.copyright,
            license: request.license,
        },
        manifestation: ManifestationInput {
            bdrc: None,
            wiki: None,
            kind: ManifestationType::Critical,
            source: Some(request.source.clone()),
            colophon: None,
            incipit_title: None,
            alt_incipit_titles: None,
        },
        segmentation: request.segmentation.clone(),
        alignment: match (&request.target_segments, &request.aligned_segments) {
            (Some(target_segments), Some(aligned_segments)) => Some(AlignmentInput {
                target_id: source_manifestation_id.clone(),
                target_segments: target_segments.clone(),
                aligned_segments: aligned_segments.clone(),
            }),
            _ => None,
        },
        bibliography: request.bibliography.clone(),
    };

    let created = state
        .store
        .create_aligned_text(&expression_id, &manifestation_id, &input)
        .await;
    let ids = match created {
        Ok(ids) => ids,
        Err(err) => {
            state.texts.rollback(&expression_id, &manifestation_id).await.ok();
            return Err(err.into());
        }
    };

    if let Some(indexer) = &state.indexer {
        indexer.notify_manifestation_changed(&ids.manifestation_id);
    }
    info!(text = %ids.expression_id, instance = %ids.manifestation_id, kind = kind.as_str(), "aligned text created");

    let body = AlignedTextCreatedResponse {
        message: "Text created successfully".into(),
        instance_id: ids.manifestation_id,
        text_id: ids.expression_id,
        alignment_id: ids.alignment_id,
    };
    Ok((StatusCode::CREATED, Json(body)).into_response())
}

fn contribution_from(creator: &CreatorRef, role: ContributorRole) -> ContributionInput {
    match &creator.ai_id {
        Some(ai_id) => ContributionInput::Ai { ai_id: ai_id.clone(), role },
        None => ContributionInput::Person {
            person_id: creator.person_id.clone(),
            person_bdrc_id: creator.person_bdrc_id.clone(),
            role,
        },
    }
}
