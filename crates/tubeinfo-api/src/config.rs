//! API configuration.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use tubeinfo_extract::DEFAULT_COOKIES_PATH;

/// API server configuration.
#[derive(Clone)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Shared secret expected in the `x-api-key` header
    pub api_key: Option<String>,
    /// CORS origins
    pub cors_origins: Vec<String>,
    /// Requests allowed per client per window
    pub rate_limit_max: u32,
    /// Rate limit window
    pub rate_limit_window: Duration,
    /// Key rate limits on `X-Forwarded-For` / `X-Real-IP` instead of the peer
    /// address. Only safe behind a proxy that overwrites these headers.
    pub trust_proxy_headers: bool,
    /// Max request body size
    pub max_body_size: usize,
    /// Environment (development/production)
    pub environment: String,
    /// Mount `/debug` routes
    pub diagnostics_enabled: bool,
    /// Mount `/metrics`
    pub metrics_enabled: bool,
    /// Concurrent yt-dlp processes
    pub max_concurrent_extractions: usize,
    /// Base64-encoded cookie jar written at startup
    pub cookies_data: Option<String>,
    /// Where the cookie jar is written
    pub cookies_path: PathBuf,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            api_key: None,
            cors_origins: vec!["*".to_string()],
            rate_limit_max: 100,
            rate_limit_window: Duration::from_secs(15 * 60),
            trust_proxy_headers: false,
            max_body_size: 64 * 1024,
            environment: "development".to_string(),
            diagnostics_enabled: false,
            metrics_enabled: false,
            max_concurrent_extractions: 4,
            cookies_data: None,
            cookies_path: PathBuf::from(DEFAULT_COOKIES_PATH),
        }
    }
}

impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("cors_origins", &self.cors_origins)
            .field("rate_limit_max", &self.rate_limit_max)
            .field("rate_limit_window", &self.rate_limit_window)
            .field("trust_proxy_headers", &self.trust_proxy_headers)
            .field("environment", &self.environment)
            .field("diagnostics_enabled", &self.diagnostics_enabled)
            .field("metrics_enabled", &self.metrics_enabled)
            .field("max_concurrent_extractions", &self.max_concurrent_extractions)
            .field("cookies_data", &self.cookies_data.as_ref().map(|_| "<redacted>"))
            .field("cookies_path", &self.cookies_path)
            .finish()
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

impl ApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create config from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        Self {
            host: get("API_HOST").unwrap_or(defaults.host),
            port: get("PORT")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.port),
            api_key: get("API_KEY"),
            cors_origins: get("FRONTEND_URL")
                .map(|s| {
                    s.split(',')
                        .map(|o| o.trim().to_string())
                        .filter(|o| !o.is_empty())
                        .collect()
                })
                .unwrap_or(defaults.cors_origins),
            rate_limit_max: get("RATE_LIMIT_MAX")
                .and_then(|s| s.parse::<u32>().ok())
                .filter(|n| *n > 0)
                .unwrap_or(defaults.rate_limit_max),
            rate_limit_window: get("RATE_LIMIT_WINDOW_SECS")
                .and_then(|s| s.parse::<u64>().ok())
                .filter(|n| *n > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.rate_limit_window),
            trust_proxy_headers: get("TRUST_PROXY_HEADERS")
                .map(|v| is_truthy(&v))
                .unwrap_or(defaults.trust_proxy_headers),
            max_body_size: get("MAX_BODY_SIZE")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_body_size),
            environment: get("ENVIRONMENT").unwrap_or(defaults.environment),
            diagnostics_enabled: get("DIAGNOSTICS_ENABLED")
                .map(|v| is_truthy(&v))
                .unwrap_or(defaults.diagnostics_enabled),
            metrics_enabled: get("METRICS_ENABLED")
                .map(|v| is_truthy(&v))
                .unwrap_or(defaults.metrics_enabled),
            max_concurrent_extractions: get("MAX_CONCURRENT_EXTRACTIONS")
                .and_then(|s| s.parse::<usize>().ok())
                .filter(|n| *n > 0)
                .unwrap_or(defaults.max_concurrent_extractions),
            cookies_data: get("COOKIES_DATA"),
            cookies_path: get("COOKIES_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.cookies_path),
        }
    }

    /// Check if running in production mode.
    pub fn is_production(&self) -> bool {
        self.environment.to_lowercase() == "production"
    }
}
