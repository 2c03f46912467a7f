//! Prometheus metrics for the API server.

use std::time::{Duration, Instant};

use axum::body::Body;
use axum::extract::MatchedPath;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

use tubeinfo_extract::ErrorKind;

/// Install the Prometheus recorder and return a handle for `/metrics`.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Metric names.
pub mod names {
    pub const HTTP_REQUESTS_TOTAL: &str = "tubeinfo_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "tubeinfo_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "tubeinfo_http_requests_in_flight";

    pub const EXTRACTIONS_TOTAL: &str = "tubeinfo_extractions_total";
    pub const EXTRACTION_DURATION_SECONDS: &str = "tubeinfo_extraction_duration_seconds";
    pub const EXTRACTION_FAILURES_TOTAL: &str = "tubeinfo_extraction_failures_total";

    pub const RATE_LIMIT_HITS_TOTAL: &str = "tubeinfo_rate_limit_hits_total";
}

/// Label for requests that matched no route.
pub const UNMATCHED_PATH: &str = "unmatched";

/// Record an HTTP request. `path` is a route template, never a raw path.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", path.to_string()),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record one extraction, successful or not.
pub fn record_extraction(kind: &'static str, duration: Duration, failure: Option<ErrorKind>) {
    let labels = [("kind", kind)];
    counter!(names::EXTRACTIONS_TOTAL, &labels).increment(1);
    histogram!(names::EXTRACTION_DURATION_SECONDS, &labels).record(duration.as_secs_f64());

    if let Some(failure) = failure {
        let labels = [("kind", kind), ("error", failure.as_str())];
        counter!(names::EXTRACTION_FAILURES_TOTAL, &labels).increment(1);
    }
}

/// Record rate limit hit.
pub fn record_rate_limit_hit(endpoint: &str) {
    let labels = [("endpoint", endpoint.to_string())];
    counter!(names::RATE_LIMIT_HITS_TOTAL, &labels).increment(1);
}

/// Route template of the request, so label cardinality is bounded by the
/// router rather than by clients.
pub fn path_label<B>(request: &Request<B>) -> String {
    request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| UNMATCHED_PATH.to_string())
}

/// Metrics middleware for HTTP requests.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = path_label(&request);
    let start = Instant::now();

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);
    let response = next.run(request).await;
    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);

    record_http_request(
        &method,
        &path,
        response.status().as_u16(),
        start.elapsed().as_secs_f64(),
    );

    response
}
