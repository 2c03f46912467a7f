//! Extraction pipeline: invoke yt-dlp once, then normalize its output.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tokio::sync::Semaphore;
use tracing::{info, warn};

use tubeinfo_models::{MediaItemSummary, PlaylistId, PlaylistSummary, VideoId};

use crate::command::{ExtractionMode, YtDlpCommand, YtDlpRunner};
use crate::config::ExtractorConfig;
use crate::diagnostics::{check_tool, spawn_failure_diagnostics, ToolHealth};
use crate::error::{ExtractError, ExtractResult};
use crate::normalize::{normalize_playlist, normalize_video};

/// Unparsed stdout of a successful run.
#[derive(Debug, Clone)]
pub struct RawExtractionOutput {
    pub mode: ExtractionMode,
    pub stdout: Vec<u8>,
}

impl RawExtractionOutput {
    /// Normalize into a single-video summary.
    pub fn into_video(self) -> ExtractResult<MediaItemSummary> {
        normalize_video(&self.stdout, self.mode)
    }

    /// Normalize into a playlist summary.
    pub fn into_playlist(self) -> ExtractResult<PlaylistSummary> {
        normalize_playlist(&self.stdout)
    }
}

/// Source of media metadata for the request handlers.
#[async_trait]
pub trait MediaExtractor: Send + Sync {
    /// Extract and normalize a single video.
    async fn extract_video(&self, id: &VideoId) -> ExtractResult<MediaItemSummary>;

    /// Extract and normalize a flat playlist listing.
    async fn extract_playlist(&self, id: &PlaylistId) -> ExtractResult<PlaylistSummary>;

    /// Report whether the underlying tool is usable.
    async fn tool_health(&self) -> ToolHealth;
}

/// yt-dlp backed extractor.
///
/// Concurrent subprocesses are bounded by a semaphore; each request spawns at
/// most one child and never retries.
pub struct YtDlpExtractor {
    config: Arc<ExtractorConfig>,
    permits: Arc<Semaphore>,
}

impl YtDlpExtractor {
    pub fn new(config: ExtractorConfig, max_concurrent: usize) -> Self {
        Self {
            config: Arc::new(config),
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Run one configured command and return its raw output.
    pub async fn invoke(&self, command: YtDlpCommand) -> ExtractResult<RawExtractionOutput> {
        let mode = command.mode();
        let args = command.configured(&self.config).build_args();
        let runner = YtDlpRunner::new(
            &self.config.binary,
            self.config.timeout_for(mode),
            self.config.max_output_bytes,
        );

        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| ExtractError::internal("extraction semaphore closed"))?;

        let start = Instant::now();
        match runner.run(&args).await {
            Ok(stdout) => {
                info!(
                    mode = mode.as_str(),
                    bytes = stdout.len(),
                    duration_ms = start.elapsed().as_millis() as u64,
                    "yt-dlp completed"
                );
                Ok(RawExtractionOutput { mode, stdout })
            }
            Err(e) => {
                warn!(
                    mode = mode.as_str(),
                    duration_ms = start.elapsed().as_millis() as u64,
                    error = %e.details(),
                    "yt-dlp failed"
                );
                if self.config.diagnose_failures {
                    spawn_failure_diagnostics(self.config.as_ref().clone());
                }
                Err(e)
            }
        }
    }
}

#[async_trait]
impl MediaExtractor for YtDlpExtractor {
    async fn extract_video(&self, id: &VideoId) -> ExtractResult<MediaItemSummary> {
        let command = YtDlpCommand::video(id, self.config.video_mode);
        self.invoke(command).await?.into_video()
    }

    async fn extract_playlist(&self, id: &PlaylistId) -> ExtractResult<PlaylistSummary> {
        let command = YtDlpCommand::playlist(id);
        self.invoke(command).await?.into_playlist()
    }

    async fn tool_health(&self) -> ToolHealth {
        check_tool(&self.config).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::path::PathBuf;

    fn missing_tool_extractor() -> YtDlpExtractor {
        YtDlpExtractor::new(
            ExtractorConfig {
                binary: PathBuf::from("/nonexistent/definitely-not-yt-dlp"),
                ..ExtractorConfig::default()
            },
            2,
        )
    }

    #[tokio::test]
    async fn test_missing_tool_is_extraction_failure() {
        let extractor = missing_tool_extractor();
        let id = VideoId::parse("dQw4w9WgXcQ").unwrap();
        let err = extractor.extract_video(&id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ExtractionFailed);

        let playlist = PlaylistId::parse("PL1234567890").unwrap();
        let err = extractor.extract_playlist(&playlist).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ExtractionFailed);
    }

    #[test]
    fn test_zero_concurrency_still_admits_work() {
        let extractor = YtDlpExtractor::new(ExtractorConfig::default(), 0);
        assert_eq!(extractor.permits.available_permits(), 1);
    }

    #[test]
    fn test_raw_output_normalizes_by_mode() {
        let raw = RawExtractionOutput {
            mode: ExtractionMode::SingleVideoLegacyFormatList,
            stdout: br#"{"formats": [{"ext": "mp4", "url": "u"}]}"#.to_vec(),
        };
        assert_eq!(raw.into_video().unwrap().formats.len(), 1);

        let raw = RawExtractionOutput {
            mode: ExtractionMode::PlaylistFlat,
            stdout: b"{\"id\": \"aaaaaaaaaaa\"}\n".to_vec(),
        };
        assert_eq!(raw.into_playlist().unwrap().total_videos, 1);
    }
}
