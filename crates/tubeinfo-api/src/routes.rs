//! API routes.

use axum::middleware;
use axum::routing::get;
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::limit::RequestBodyLimitLayer;

use crate::handlers::{
    get_playlist, get_video, health, method_not_allowed, missing_playlist_id, not_found,
    tool_health,
};
use crate::metrics::metrics_middleware;
use crate::middleware::{
    cors_layer, handle_panic, rate_limit_middleware, redact_server_errors, request_id,
    request_logging, require_api_key, security_headers,
};
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let media_routes = Router::new()
        .route("/video/:video_id", get(get_video).fallback(method_not_allowed))
        .route("/playlist", get(missing_playlist_id).fallback(method_not_allowed))
        .route("/playlist/", get(missing_playlist_id).fallback(method_not_allowed))
        .route("/playlist/:playlist_id", get(get_playlist).fallback(method_not_allowed));

    let health_routes = Router::new().route("/health", get(health).fallback(method_not_allowed));

    let debug_routes = if state.config.diagnostics_enabled {
        Router::new().route("/debug/tool", get(tool_health).fallback(method_not_allowed))
    } else {
        Router::new()
    };

    let metrics_routes = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    Router::new()
        .merge(media_routes)
        .merge(health_routes)
        .merge(debug_routes)
        .merge(metrics_routes)
        .fallback(not_found)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            redact_server_errors,
        ))
        .layer(middleware::from_fn_with_state(state.clone(), require_api_key))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .layer(RequestBodyLimitLayer::new(state.config.max_body_size))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(security_headers))
        .layer(middleware::from_fn(request_id))
        .layer(middleware::from_fn(request_logging))
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}
