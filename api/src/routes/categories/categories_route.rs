use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use graph_store::model::CategoryItem;

use crate::core::app_state::AppState;
use crate::error_handler::{AppError, AppResult};
use crate::middleware_layer::api_key_auth::APPLICATION_HEADER;
use crate::routes::categories::categories_request::{
    CreateCategoryRequest, ListCategoriesParams,
};
use crate::routes::categories::categories_response::CategoryCreatedResponse;

/// GET /v2/categories: one sibling level of the tenant's category forest.
pub async fn list_categories(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(params): Query<ListCategoriesParams>,
) -> AppResult<Json<Vec<CategoryItem>>> {
    let application = require_application(&headers)?;
    let language = params.language.unwrap_or_else(|| "en".to_owned());
    let categories = state
        .store
        .categories
        .get_all(&application, &language, params.parent_id.as_deref())
        .await?;
    Ok(Json(categories))
}

/// POST /v2/categories
pub async fn post_category(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<CreateCategoryRequest>, JsonRejection>,
) -> AppResult<Response> {
    let application = require_application(&headers)?;
    let Json(request) = payload?;
    if request.title.is_empty() {
        return Err(AppError::Unprocessable("title must contain at least one entry".into()));
    }
    let id = state
        .store
        .categories
        .create(&application, &request.title, request.parent.as_deref())
        .await?;
    let body = CategoryCreatedResponse { message: "Category created successfully".into(), id };
    Ok((StatusCode::CREATED, Json(body)).into_response())
}

fn require_application(headers: &HeaderMap) -> AppResult<String> {
    headers
        .get(APPLICATION_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
        .ok_or_else(|| AppError::BadRequest("X-Application header is required".into()))
}
