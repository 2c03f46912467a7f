//! yt-dlp invocation settings.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

use crate::command::ExtractionMode;

/// Default yt-dlp binary, resolved through `PATH`.
pub const DEFAULT_YTDLP_BINARY: &str = "yt-dlp";

/// Default desktop browser user agent passed to yt-dlp.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Default single-video timeout.
pub const DEFAULT_VIDEO_TIMEOUT_SECS: u64 = 30;

/// Default flat-playlist timeout.
pub const DEFAULT_PLAYLIST_TIMEOUT_SECS: u64 = 60;

/// Default cap on captured stdout (10MB).
pub const DEFAULT_MAX_OUTPUT_BYTES: usize = 10 * 1024 * 1024;

/// Where yt-dlp should read cookies from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CookieSource {
    #[default]
    None,
    /// Netscape cookie jar on disk (`--cookies`)
    File(PathBuf),
    /// Cookies pulled from a local browser profile (`--cookies-from-browser`)
    Browser(String),
}

impl FromStr for CookieSource {
    type Err = String;

    /// Parses `none`, `file:<path>` or `browser:<name>`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("none") {
            return Ok(CookieSource::None);
        }
        match s.split_once(':') {
            Some(("file", path)) if !path.trim().is_empty() => {
                Ok(CookieSource::File(PathBuf::from(path.trim())))
            }
            Some(("browser", name)) if !name.trim().is_empty() => {
                Ok(CookieSource::Browser(name.trim().to_string()))
            }
            _ => Err(format!(
                "invalid cookie source '{}', expected none, file:<path> or browser:<name>",
                s
            )),
        }
    }
}

impl fmt::Display for CookieSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CookieSource::None => f.write_str("none"),
            CookieSource::File(_) => f.write_str("file"),
            CookieSource::Browser(name) => write!(f, "browser:{}", name),
        }
    }
}

/// yt-dlp invocation configuration.
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// yt-dlp binary name or absolute path
    pub binary: PathBuf,
    /// Pass `--no-check-certificate`
    pub bypass_certificate_check: bool,
    /// Pass `--geo-bypass`
    pub geo_bypass: bool,
    /// Synthetic browser user agent
    pub user_agent: Option<String>,
    /// Extra request headers (`--add-header`)
    pub headers: Vec<(String, String)>,
    pub cookie_source: CookieSource,
    /// Mode used by the single-video route
    pub video_mode: ExtractionMode,
    pub video_timeout: Duration,
    pub playlist_timeout: Duration,
    /// Cap on captured stdout
    pub max_output_bytes: usize,
    /// Log `yt-dlp --version` in the background after a failed run
    pub diagnose_failures: bool,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            binary: PathBuf::from(DEFAULT_YTDLP_BINARY),
            bypass_certificate_check: true,
            geo_bypass: true,
            user_agent: Some(DEFAULT_USER_AGENT.to_string()),
            headers: default_headers(),
            cookie_source: CookieSource::None,
            video_mode: ExtractionMode::SingleVideoBestFormat,
            video_timeout: Duration::from_secs(DEFAULT_VIDEO_TIMEOUT_SECS),
            playlist_timeout: Duration::from_secs(DEFAULT_PLAYLIST_TIMEOUT_SECS),
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
            diagnose_failures: false,
        }
    }
}

fn default_headers() -> Vec<(String, String)> {
    vec![
        ("Accept-Language".to_string(), "en-US,en;q=0.5".to_string()),
        ("Origin".to_string(), "https://www.youtube.com".to_string()),
        ("Referer".to_string(), "https://www.youtube.com".to_string()),
    ]
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl ExtractorConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create config from an arbitrary key lookup. Invalid values fall back
    /// to defaults with a warning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let flag = |key: &str, default: bool| {
            get(key)
                .and_then(|v| {
                    let parsed = parse_flag(&v);
                    if parsed.is_none() {
                        warn!(key, value = %v, "Ignoring invalid boolean setting");
                    }
                    parsed
                })
                .unwrap_or(default)
        };
        let secs = |key: &str, default: Duration| {
            get(key)
                .and_then(|v| v.trim().parse::<u64>().ok())
                .filter(|s| *s > 0)
                .map(Duration::from_secs)
                .unwrap_or(default)
        };

        let cookie_source = match get("YTDLP_COOKIE_SOURCE") {
            Some(raw) => raw.parse().unwrap_or_else(|e: String| {
                warn!("{}; cookies disabled", e);
                CookieSource::None
            }),
            None => CookieSource::None,
        };

        let video_mode = match get("VIDEO_EXTRACTION_MODE").as_deref().map(str::trim) {
            Some("legacy") => ExtractionMode::SingleVideoLegacyFormatList,
            Some("best") | None => ExtractionMode::SingleVideoBestFormat,
            Some(other) => {
                warn!(mode = other, "Unknown VIDEO_EXTRACTION_MODE, using best");
                ExtractionMode::SingleVideoBestFormat
            }
        };

        Self {
            binary: get("YTDLP_PATH")
                .map(|p| PathBuf::from(p.trim()))
                .unwrap_or(defaults.binary),
            bypass_certificate_check: flag(
                "YTDLP_BYPASS_CERT_CHECK",
                defaults.bypass_certificate_check,
            ),
            geo_bypass: flag("YTDLP_GEO_BYPASS", defaults.geo_bypass),
            user_agent: get("YTDLP_USER_AGENT").or(defaults.user_agent),
            headers: defaults.headers,
            cookie_source,
            video_mode,
            video_timeout: secs("YTDLP_TIMEOUT_SECS", defaults.video_timeout),
            playlist_timeout: secs("YTDLP_PLAYLIST_TIMEOUT_SECS", defaults.playlist_timeout),
            max_output_bytes: get("YTDLP_MAX_OUTPUT_BYTES")
                .and_then(|v| v.trim().parse::<usize>().ok())
                .filter(|n| *n > 0)
                .unwrap_or(defaults.max_output_bytes),
            diagnose_failures: flag("DIAGNOSTICS_ENABLED", defaults.diagnose_failures),
        }
    }

    /// Use a provisioned cookie file unless another source was configured.
    pub fn with_cookie_file_fallback(mut self, path: impl Into<PathBuf>) -> Self {
        if self.cookie_source == CookieSource::None {
            self.cookie_source = CookieSource::File(path.into());
        }
        self
    }

    /// Timeout for the given mode.
    pub fn timeout_for(&self, mode: ExtractionMode) -> Duration {
        match mode {
            ExtractionMode::PlaylistFlat => self.playlist_timeout,
            _ => self.video_timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> ExtractorConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ExtractorConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = config_from(&[]);
        assert_eq!(config.binary, PathBuf::from("yt-dlp"));
        assert!(config.bypass_certificate_check);
        assert_eq!(config.cookie_source, CookieSource::None);
        assert_eq!(config.video_mode, ExtractionMode::SingleVideoBestFormat);
        assert_eq!(config.video_timeout, Duration::from_secs(30));
        assert_eq!(config.playlist_timeout, Duration::from_secs(60));
        assert_eq!(config.max_output_bytes, DEFAULT_MAX_OUTPUT_BYTES);
        assert!(!config.diagnose_failures);
    }

    #[test]
    fn test_reads_overrides() {
        let config = config_from(&[
            ("YTDLP_PATH", "/usr/local/bin/yt-dlp"),
            ("YTDLP_BYPASS_CERT_CHECK", "false"),
            ("YTDLP_COOKIE_SOURCE", "browser:firefox"),
            ("YTDLP_TIMEOUT_SECS", "45"),
            ("YTDLP_MAX_OUTPUT_BYTES", "2048"),
            ("VIDEO_EXTRACTION_MODE", "legacy"),
            ("DIAGNOSTICS_ENABLED", "1"),
        ]);
        assert_eq!(config.binary, PathBuf::from("/usr/local/bin/yt-dlp"));
        assert!(!config.bypass_certificate_check);
        assert_eq!(config.cookie_source, CookieSource::Browser("firefox".to_string()));
        assert_eq!(config.video_timeout, Duration::from_secs(45));
        assert_eq!(config.max_output_bytes, 2048);
        assert_eq!(config.video_mode, ExtractionMode::SingleVideoLegacyFormatList);
        assert!(config.diagnose_failures);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = config_from(&[
            ("YTDLP_BYPASS_CERT_CHECK", "maybe"),
            ("YTDLP_COOKIE_SOURCE", "jar"),
            ("YTDLP_TIMEOUT_SECS", "0"),
            ("YTDLP_PLAYLIST_TIMEOUT_SECS", "soon"),
        ]);
        assert!(config.bypass_certificate_check);
        assert_eq!(config.cookie_source, CookieSource::None);
        assert_eq!(config.video_timeout, Duration::from_secs(30));
        assert_eq!(config.playlist_timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_cookie_source_parsing() {
        assert_eq!("none".parse::<CookieSource>().unwrap(), CookieSource::None);
        assert_eq!(
            "file:/tmp/c.txt".parse::<CookieSource>().unwrap(),
            CookieSource::File(PathBuf::from("/tmp/c.txt"))
        );
        assert_eq!(
            "browser:chrome".parse::<CookieSource>().unwrap(),
            CookieSource::Browser("chrome".to_string())
        );
        assert!("file:".parse::<CookieSource>().is_err());
        assert!("cookies.txt".parse::<CookieSource>().is_err());
    }

    #[test]
    fn test_cookie_file_fallback_respects_explicit_source() {
        let config = ExtractorConfig::default().with_cookie_file_fallback("/tmp/c.txt");
        assert_eq!(config.cookie_source, CookieSource::File(PathBuf::from("/tmp/c.txt")));

        let config = ExtractorConfig {
            cookie_source: CookieSource::Browser("chrome".to_string()),
            ..ExtractorConfig::default()
        }
        .with_cookie_file_fallback("/tmp/c.txt");
        assert_eq!(config.cookie_source, CookieSource::Browser("chrome".to_string()));
    }

    #[test]
    fn test_timeout_for_mode() {
        let config = ExtractorConfig::default();
        assert_eq!(
            config.timeout_for(ExtractionMode::PlaylistFlat),
            Duration::from_secs(60)
        );
        assert_eq!(
            config.timeout_for(ExtractionMode::SingleVideoLegacyFormatList),
            Duration::from_secs(30)
        );
    }
}
