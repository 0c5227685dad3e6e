//! API-key authentication layer.
//!
//! Every protected request carries `X-API-Key`; the SHA-256 hash is looked
//! up among active keys. A key bound to an Application additionally pins
//! the `X-Application` header. The resolved principal is attached to the
//! request extensions.

use std::sync::Arc;

use axum::{
    body::Body,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum::extract::State;
use tracing::{debug, warn};

use crate::core::app_state::AppState;
use crate::error_handler::AppError;

pub const API_KEY_HEADER: &str = "X-API-Key";
pub const APPLICATION_HEADER: &str = "X-Application";

pub async fn require_api_key(
    State(state): State<Arc<AppState>>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let Some(raw_key) = header_value(&req, API_KEY_HEADER) else {
        return AppError::Unauthorized("missing X-API-Key header".into()).into_response();
    };

    let principal = match state.store.api_keys.validate_key(&raw_key).await {
        Ok(Some(principal)) => principal,
        Ok(None) => {
            debug!("unknown or inactive api key");
            return AppError::Unauthorized("Invalid API key".into()).into_response();
        }
        Err(err) => {
            warn!("api key lookup failed: {err}");
            return AppError::Internal(err.to_string()).into_response();
        }
    };

    if let Some(bound_application) = &principal.application_id {
        let application = header_value(&req, APPLICATION_HEADER);
        if application.as_deref() != Some(bound_application.as_str()) {
            debug!(bound = %bound_application, "application mismatch for bound key");
            return AppError::Unauthorized("not authorized for this application".into())
                .into_response();
        }
    }

    req.extensions_mut().insert(principal);
    next.run(req).await
}

fn header_value(req: &Request<Body>, name: &str) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
}
