//! One-shot cookie provisioning.
//!
//! The cookie jar arrives base64-encoded through configuration and is written
//! to disk once, before the server accepts traffic. Only yt-dlp reads it.

use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::{info, warn};

use crate::error::{ExtractError, ExtractResult};

/// Default location of the provisioned cookie jar.
pub const DEFAULT_COOKIES_PATH: &str = "/tmp/youtube-cookies.txt";

/// Check whether content looks like a Netscape cookie jar.
///
/// Netscape cookies files either start with "# Netscape HTTP Cookie File"
/// or contain tab-separated lines with domain entries.
pub fn is_valid_netscape_cookies(content: &str) -> bool {
    if content.starts_with("# Netscape HTTP Cookie File") || content.starts_with("# HTTP Cookie File") {
        return true;
    }

    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .any(|line| line.split('\t').count() >= 6)
}

/// Decode `encoded` and write it to `path` with owner-only permissions.
pub async fn provision_cookies(encoded: &str, path: impl AsRef<Path>) -> ExtractResult<PathBuf> {
    let path = path.as_ref();

    // Deployment tooling often wraps long base64 values.
    let compact: String = encoded.split_whitespace().collect();
    let decoded = STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| ExtractError::InvalidCredentials(e.to_string()))?;

    if decoded.is_empty() {
        return Err(ExtractError::InvalidCredentials("decoded cookie data is empty".to_string()));
    }

    if !is_valid_netscape_cookies(&String::from_utf8_lossy(&decoded)) {
        warn!("Cookie data does not look like a Netscape cookie file; yt-dlp may ignore it");
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    write_private(path, &decoded).await?;

    info!(path = %path.display(), bytes = decoded.len(), "Cookie file provisioned");
    Ok(path.to_path_buf())
}

/// Write `contents` so no other user can read them at any point.
///
/// New files are created 0600. A file that already exists is narrowed to
/// 0600 through the open handle before any bytes are written.
#[cfg(unix)]
async fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    use tokio::io::AsyncWriteExt;

    let mut file = tokio::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)
        .await?;
    file.set_permissions(std::fs::Permissions::from_mode(0o600))
        .await?;
    file.write_all(contents).await?;
    file.flush().await
}

#[cfg(not(unix))]
async fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    tokio::fs::write(path, contents).await
}
