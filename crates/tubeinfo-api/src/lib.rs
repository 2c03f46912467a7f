//! Axum HTTP API server.
//!
//! This crate provides:
//! - `/video/:video_id` and `/playlist/:playlist_id` backed by yt-dlp
//! - Shared-secret authentication and per-client rate limiting
//! - CORS, security headers and request logging
//! - Prometheus metrics and an optional tool diagnostics check

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod security;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
