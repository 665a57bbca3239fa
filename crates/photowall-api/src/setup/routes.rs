//! Route configuration and setup

use crate::handlers::{health, photos};
use crate::state::AppState;
use axum::{
    extract::{DefaultBodyLimit, Request},
    http::{HeaderValue, Method},
    routing::{delete, get},
    Router,
};
use photowall_core::urls::MEDIA_PREFIX;
use photowall_core::Config;
use photowall_infra::{get_request_id, request_id_middleware};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Setup all application routes
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router, anyhow::Error> {
    let cors = setup_cors(config)?;

    let mut app = Router::new()
        .route("/health", get(health::health_check))
        .route(
            "/api/photos",
            get(photos::list_photos).post(photos::upload_photo),
        )
        .route("/api/photos/{image_name}", delete(photos::delete_photo))
        .with_state(state);

    if config.serve_media {
        app = app.nest_service(MEDIA_PREFIX, ServeDir::new(&config.photos_dir));
    }

    let trace_layer = TraceLayer::new_for_http().make_span_with(|request: &Request| {
        let request_id = get_request_id(request).unwrap_or_default();
        tracing::info_span!(
            "http_request",
            method = %request.method(),
            uri = %request.uri(),
            request_id = %request_id,
        )
    });

    let app = app
        .layer(RequestBodyLimitLayer::new(config.max_upload_bytes))
        .layer(DefaultBodyLimit::disable())
        .layer(cors)
        .layer(trace_layer)
        .layer(axum::middleware::from_fn(request_id_middleware));

    Ok(app)
}

fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let methods = [Method::GET, Method::POST, Method::DELETE, Method::OPTIONS];

    let cors = if config.cors_origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any)
    } else {
        let origins = config
            .cors_origins
            .iter()
            .map(|o| {
                o.parse::<HeaderValue>()
                    .map_err(|e| anyhow::anyhow!("Invalid CORS origin '{}': {}", o, e))
            })
            .collect::<Result<Vec<_>, _>>()?;
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers(Any)
    };
    Ok(cors)
}
