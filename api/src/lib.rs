//! HTTP façade over the corpus engine: dispatch and payload validation
//! only; all domain behaviour lives in `graph-store`.

pub mod core;
pub mod error_handler;
pub mod middleware_layer;
pub mod routes;

use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};
use base_text_store::BaseTextStore;
use graph_store::GraphStore;
use services::SearchIndexer;
use tracing::info;

use crate::core::app_state::{AppConfig, AppState};
use crate::error_handler::AppError;
use crate::middleware_layer::api_key_auth;
use crate::routes::{annotations, api_keys, categories, instances, persons, texts};

/// Reads configuration, connects the stores and serves until shutdown.
pub async fn start() -> Result<(), AppError> {
    let config = AppConfig::from_env()?;

    let store = GraphStore::connect(&config.graph)
        .await
        .map_err(AppError::Startup)?;
    let texts = BaseTextStore::new(&config.base_text_root);
    let indexer = config.indexer_url.clone().map(SearchIndexer::spawn);
    if indexer.is_none() {
        info!("no search indexer configured; background notifications disabled");
    }

    let state = Arc::new(AppState { store, texts, indexer });
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .map_err(AppError::Bind)?;
    info!(addr = %config.bind_addr, "listening");
    axum::serve(listener, app).await.map_err(AppError::Server)?;

    Ok(())
}

/// Full route table. Everything under `/v2` requires an API key, except
/// the key-administration surface itself (assumed to sit behind
/// deployment-level protection).
pub fn router(state: Arc<AppState>) -> Router {
    let protected = Router::new()
        .route(
            "/v2/texts",
            get(texts::texts_route::list_texts).post(texts::texts_route::post_text),
        )
        .route("/v2/texts/{id}", get(texts::texts_route::get_text))
        .route("/v2/texts/{id}/title", put(texts::texts_route::put_title))
        .route(
            "/v2/texts/{id}/instances",
            get(texts::texts_route::list_instances).post(texts::texts_route::post_instance),
        )
        .route(
            "/v2/editions/{id}/content",
            get(instances::instances_route::get_content).put(instances::instances_route::put_content),
        )
        .route(
            "/v2/editions/{id}/metadata",
            get(instances::instances_route::get_metadata)
                .put(instances::instances_route::put_metadata),
        )
        .route("/v2/editions/{id}/related", get(instances::instances_route::get_related))
        .route(
            "/v2/editions/{id}/segment-related",
            get(instances::instances_route::get_segment_related),
        )
        .route(
            "/v2/editions/{id}/translation",
            post(instances::instances_route::post_translation),
        )
        .route(
            "/v2/editions/{id}/commentary",
            post(instances::instances_route::post_commentary),
        )
        .route(
            "/v2/annotations/{kind}",
            post(annotations::annotations_route::post_annotation),
        )
        .route(
            "/v2/annotations/{kind}/{id}",
            get(annotations::annotations_route::get_annotation)
                .put(annotations::annotations_route::put_annotation)
                .delete(annotations::annotations_route::delete_annotation),
        )
        .route(
            "/v2/categories",
            get(categories::categories_route::list_categories)
                .post(categories::categories_route::post_category),
        )
        .route(
            "/v2/persons",
            get(persons::persons_route::list_persons).post(persons::persons_route::post_person),
        )
        .route(
            "/v2/persons/{id}",
            get(persons::persons_route::get_person).delete(persons::persons_route::delete_person),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api_key_auth::require_api_key,
        ));

    let admin = Router::new()
        .route(
            "/v2/api-keys",
            get(api_keys::api_keys_route::list_api_keys).post(api_keys::api_keys_route::post_api_key),
        )
        .route(
            "/v2/api-keys/{id}/revoke",
            post(api_keys::api_keys_route::revoke_api_key),
        )
        .route(
            "/v2/api-keys/{id}/rotate",
            post(api_keys::api_keys_route::rotate_api_key),
        );

    Router::new().merge(protected).merge(admin).with_state(state)
}
