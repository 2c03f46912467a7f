//! Tool health check.

use std::time::Duration;

use serde::Serialize;
use tracing::{info, warn};

use crate::command::{check_ytdlp, YtDlpRunner};
use crate::config::ExtractorConfig;

/// Timeout for `yt-dlp --version`.
const VERSION_TIMEOUT: Duration = Duration::from_secs(5);

/// `--version` output is a single short line.
const VERSION_OUTPUT_LIMIT: usize = 1024;

/// Result of probing the extraction tool.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolHealth {
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub cookie_source: String,
}

/// Resolve the configured binary and ask it for its version.
pub async fn check_tool(config: &ExtractorConfig) -> ToolHealth {
    let cookie_source = config.cookie_source.to_string();

    let path = match check_ytdlp(&config.binary) {
        Ok(path) => path,
        Err(e) => {
            return ToolHealth {
                available: false,
                path: None,
                version: None,
                error: Some(e.to_string()),
                cookie_source,
            }
        }
    };

    let runner = YtDlpRunner::new(&path, VERSION_TIMEOUT, VERSION_OUTPUT_LIMIT);
    match runner.run(&["--version".to_string()]).await {
        Ok(stdout) => ToolHealth {
            available: true,
            path: Some(path.display().to_string()),
            version: Some(String::from_utf8_lossy(&stdout).trim().to_string()),
            error: None,
            cookie_source,
        },
        Err(e) => ToolHealth {
            available: false,
            path: Some(path.display().to_string()),
            version: None,
            error: Some(e.details()),
            cookie_source,
        },
    }
}

/// Log tool health after a failed extraction. Never affects the response.
pub fn spawn_failure_diagnostics(config: ExtractorConfig) {
    tokio::spawn(async move {
        let health = check_tool(&config).await;
        if health.available {
            info!(
                version = health.version.as_deref().unwrap_or("unknown"),
                path = health.path.as_deref().unwrap_or("unknown"),
                "yt-dlp diagnostics after failed extraction"
            );
        } else {
            warn!(
                error = health.error.as_deref().unwrap_or("unknown"),
                "yt-dlp unavailable after failed extraction"
            );
        }
    });
}
