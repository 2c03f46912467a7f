//! Application state.

use std::sync::Arc;

use tubeinfo_extract::{ExtractorConfig, MediaExtractor, YtDlpExtractor};

use crate::config::ApiConfig;
use crate::middleware::ClientRateLimiter;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub extractor: Arc<dyn MediaExtractor>,
    pub rate_limiter: Arc<ClientRateLimiter>,
}

impl AppState {
    /// Create state backed by the yt-dlp extractor.
    pub fn new(config: ApiConfig, extractor_config: ExtractorConfig) -> Self {
        let extractor = YtDlpExtractor::new(extractor_config, config.max_concurrent_extractions);
        Self::with_extractor(config, Arc::new(extractor))
    }

    /// Create state around any extractor implementation.
    pub fn with_extractor(config: ApiConfig, extractor: Arc<dyn MediaExtractor>) -> Self {
        let rate_limiter = Arc::new(ClientRateLimiter::new(
            config.rate_limit_max,
            config.rate_limit_window,
        ));
        Self {
            config,
            extractor,
            rate_limiter,
        }
    }
}
