//! API middleware.

use std::any::Any;
use std::collections::{HashMap, VecDeque};
use std::net::{IpAddr, SocketAddr};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::extract::{ConnectInfo, State};
use axum::http::{header, HeaderValue, Method, Request, Response, StatusCode};
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::Json;
use governor::clock::{Clock, DefaultClock, Reference};
use tower_http::cors::{Any as AnyOrigin, CorsLayer};
use tracing::{error, info, warn, Span};
use uuid::Uuid;

use crate::error::{error_response, ApiError, ErrorResponse, RedactedBody, FALLBACK_MESSAGE};
use crate::metrics;
use crate::security::{is_auth_exempt, verify_api_key, API_KEY_HEADER};
use crate::state::AppState;

/// Tracked clients before idle entries are pruned.
const MAX_RATE_LIMITER_ENTRIES: usize = 10_000;

/// Per-client sliding-window request cap.
///
/// Each client keeps the instants of its admitted requests inside the
/// current window, so no span of `window` ever admits more than `max`.
pub struct ClientRateLimiter<C: Clock = DefaultClock> {
    clients: Mutex<HashMap<IpAddr, VecDeque<C::Instant>>>,
    max: usize,
    window: Duration,
    clock: C,
}

impl ClientRateLimiter {
    pub fn new(max: u32, window: Duration) -> Self {
        Self::with_clock(max, window, DefaultClock::default())
    }
}

impl<C: Clock> ClientRateLimiter<C> {
    pub fn with_clock(max: u32, window: Duration, clock: C) -> Self {
        Self {
            clients: Mutex::new(HashMap::new()),
            max: (max as usize).max(1),
            window,
            clock,
        }
    }

    fn age(&self, now: C::Instant, then: C::Instant) -> Duration {
        now.duration_since(then).into()
    }

    /// Admit one request from `ip`, or return how long until a slot frees up.
    pub fn check(&self, ip: IpAddr) -> Result<(), Duration> {
        let now = self.clock.now();
        let mut clients = self.clients.lock().unwrap_or_else(PoisonError::into_inner);

        if clients.len() >= MAX_RATE_LIMITER_ENTRIES && !clients.contains_key(&ip) {
            let before = clients.len();
            clients.retain(|_, hits| {
                hits.back()
                    .is_some_and(|last| self.age(now, *last) < self.window)
            });
            warn!(
                removed = before - clients.len(),
                "Rate limiter reached capacity, pruned idle clients"
            );
        }

        let hits = clients.entry(ip).or_default();
        while let Some(oldest) = hits.front() {
            if self.age(now, *oldest) >= self.window {
                hits.pop_front();
            } else {
                break;
            }
        }

        if hits.len() < self.max {
            hits.push_back(now);
            return Ok(());
        }

        let oldest = hits.front().copied().unwrap_or(now);
        Err(self.window.saturating_sub(self.age(now, oldest)))
    }
}

/// Rate limiting middleware keyed by client IP.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response<Body> {
    if let Some(ip) = extract_client_ip(&request, state.config.trust_proxy_headers) {
        if let Err(wait) = state.rate_limiter.check(ip) {
            warn!(ip = %ip, "Rate limit exceeded");
            metrics::record_rate_limit_hit(&metrics::path_label(&request));

            let secs = wait.as_secs() + u64::from(wait.subsec_nanos() > 0);
            let mut response = ApiError::RateLimited.into_response();
            if let Ok(value) = HeaderValue::from_str(&secs.max(1).to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
            return response;
        }
    }

    next.run(request).await
}

/// Identify the client for rate limiting.
///
/// Forwarded headers are honoured only when `trust_proxy_headers` is set;
/// otherwise the peer address is the key.
pub fn extract_client_ip(request: &Request<Body>, trust_proxy_headers: bool) -> Option<IpAddr> {
    if trust_proxy_headers {
        let forwarded = request
            .headers()
            .get("X-Forwarded-For")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .and_then(|ip| ip.trim().parse().ok());
        if forwarded.is_some() {
            return forwarded;
        }

        let real_ip = request
            .headers()
            .get("X-Real-IP")
            .and_then(|v| v.to_str().ok())
            .and_then(|ip| ip.trim().parse().ok());
        if real_ip.is_some() {
            return real_ip;
        }
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0.ip())
}

/// Swap 5xx error details for a generic message in production.
pub async fn redact_server_errors(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response<Body> {
    let mut response = next.run(request).await;
    if !state.config.is_production() {
        return response;
    }

    match response.extensions_mut().remove::<RedactedBody>() {
        Some(RedactedBody(body)) => (response.status(), Json(body)).into_response(),
        None => response,
    }
}

/// Reject requests without the shared secret.
pub async fn require_api_key(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response<Body> {
    if is_auth_exempt(request.method(), request.uri().path()) {
        return next.run(request).await;
    }

    let provided = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok());

    if !verify_api_key(state.config.api_key.as_deref(), provided) {
        warn!(path = %request.uri().path(), "Rejected request with missing or invalid API key");
        return ApiError::Unauthorized.into_response();
    }

    next.run(request).await
}

/// Create CORS layer.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed_methods = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::OPTIONS,
    ];

    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_methods(allowed_methods)
            .allow_headers(AnyOrigin)
            .allow_origin(AnyOrigin)
            .max_age(Duration::from_secs(600))
    } else {
        // Credentials cannot be combined with wildcard headers.
        let origins: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_methods(allowed_methods)
            .allow_headers([
                header::CONTENT_TYPE,
                header::ACCEPT,
                header::ORIGIN,
                header::HeaderName::from_static(API_KEY_HEADER),
            ])
            .allow_credentials(true)
            .allow_origin(origins)
            .max_age(Duration::from_secs(600))
    }
}

/// Security headers middleware.
pub async fn security_headers(request: Request<Body>, next: Next) -> Response<Body> {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(
        header::STRICT_TRANSPORT_SECURITY,
        HeaderValue::from_static("max-age=31536000; includeSubDomains"),
    );
    headers.insert(header::REFERRER_POLICY, HeaderValue::from_static("no-referrer"));
    headers.insert(
        "X-Permitted-Cross-Domain-Policies",
        HeaderValue::from_static("none"),
    );

    response
}

/// Request ID middleware.
pub async fn request_id(mut request: Request<Body>, next: Next) -> Response<Body> {
    let request_id = request
        .headers()
        .get("X-Request-ID")
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty() && v.len() <= 128)
        .map(|s| s.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    request.extensions_mut().insert(request_id.clone());
    Span::current().record("request_id", &request_id);

    let mut response = next.run(request).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert("X-Request-ID", value);
    }

    response
}

/// Request logging middleware.
pub async fn request_logging(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let response = next.run(request).await;

    if uri.path() != "/health" {
        info!(
            method = %method,
            uri = %uri,
            status = %response.status(),
            duration_ms = %start.elapsed().as_millis(),
            "Request completed"
        );
    }

    response
}

/// Turn a handler panic into the generic 500 body.
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response<Body> {
    let details = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "Unknown panic message".to_string()
    };

    error!(details = %details, "Handler panicked");

    error_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        ErrorResponse::new(FALLBACK_MESSAGE).with_details(details),
    )
}
