use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use base_text_store::BaseTextError;
use graph_store::GraphError;
use serde::Serialize;
use thiserror::Error;

use crate::core::app_state::ConfigError;

/// Public application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // --- Boot / config ---
    #[error(transparent)]
    Config(#[from] ConfigError),

    // --- IO / network / server ---
    #[error("failed to bind listener")]
    Bind(#[source] std::io::Error),

    #[error("server error")]
    Server(#[source] std::io::Error),

    #[error("failed to reach the graph store")]
    Startup(#[source] GraphError),

    // --- Request / domain ---
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("{0}")]
    Unprocessable(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0} is not implemented")]
    NotImplemented(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            // startup-only
            AppError::Config(_) | AppError::Bind(_) | AppError::Server(_) | AppError::Startup(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }

            // 4xx
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,

            // 5xx
            AppError::NotImplemented(_) => StatusCode::NOT_IMPLEMENTED,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            AppError::Config(_) => "CONFIG_ERROR",
            AppError::Bind(_) => "BIND_ERROR",
            AppError::Server(_) | AppError::Startup(_) => "SERVER_ERROR",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::Unauthorized(_) => "UNAUTHORIZED",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Unprocessable(_) => "UNPROCESSABLE_ENTITY",
            AppError::NotImplemented(_) => "NOT_IMPLEMENTED",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorBody {
            error: self.error_code(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Handy result alias used across handlers.
pub type AppResult<T> = Result<T, AppError>;

/// Domain error kinds map one-to-one onto statuses.
impl From<GraphError> for AppError {
    fn from(err: GraphError) -> Self {
        match err {
            GraphError::InvalidRequest(message) => AppError::BadRequest(message),
            GraphError::NotFound(message) => AppError::NotFound(message),
            GraphError::Validation(message) => AppError::Unprocessable(message),
            GraphError::NotImplemented(what) => AppError::NotImplemented(what.to_owned()),
            GraphError::Driver(err) => AppError::Internal(err.to_string()),
            GraphError::Decode(err) => AppError::Internal(err.to_string()),
        }
    }
}

impl From<BaseTextError> for AppError {
    fn from(err: BaseTextError) -> Self {
        match err {
            BaseTextError::NotFound(id) => {
                AppError::NotFound(format!("base text for manifestation '{id}' not found"))
            }
            BaseTextError::InvalidSpan { start, end } => {
                AppError::BadRequest(format!("span [{start}, {end}) is out of range"))
            }
            BaseTextError::InvalidKey(key) => AppError::BadRequest(format!("invalid id '{key}'")),
            BaseTextError::Io(err) => AppError::Internal(err.to_string()),
        }
    }
}

/// Shape mismatches against the declared model are 422; an absent or
/// unparseable body is a plain bad request.
impl From<axum::extract::rejection::JsonRejection> for AppError {
    fn from(err: axum::extract::rejection::JsonRejection) -> Self {
        use axum::extract::rejection::JsonRejection;
        match err {
            JsonRejection::JsonDataError(err) => AppError::Unprocessable(err.body_text()),
            other => AppError::BadRequest(other.body_text()),
        }
    }
}

impl From<axum::extract::rejection::QueryRejection> for AppError {
    fn from(err: axum::extract::rejection::QueryRejection) -> Self {
        AppError::BadRequest(err.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_kinds_map_to_the_documented_statuses() {
        let cases = [
            (AppError::from(GraphError::invalid("x")), StatusCode::BAD_REQUEST),
            (AppError::from(GraphError::not_found("x")), StatusCode::NOT_FOUND),
            (AppError::from(GraphError::validation("x")), StatusCode::UNPROCESSABLE_ENTITY),
            (
                AppError::from(GraphError::NotImplemented("standalone commentary creation")),
                StatusCode::NOT_IMPLEMENTED,
            ),
            (AppError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED),
            (AppError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(err.status_code(), status);
        }
    }

    #[test]
    fn blob_errors_keep_not_found_and_range_semantics() {
        let err = AppError::from(BaseTextError::NotFound("M1".into()));
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        let err = AppError::from(BaseTextError::InvalidSpan { start: 9, end: 2 });
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }
}
