//! yt-dlp command builder and runner.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tracing::{debug, warn};

use tubeinfo_models::urls::{playlist_source_url, video_source_url};
use tubeinfo_models::{PlaylistId, VideoId};

use crate::config::{CookieSource, ExtractorConfig};
use crate::error::{ExtractError, ExtractResult};

/// Maximum stderr kept for diagnostics. The rest is drained and dropped.
const STDERR_CAPTURE_LIMIT: usize = 64 * 1024;

/// Best-format selector: merged mp4 video+m4a audio, falling back to any mp4.
const BEST_FORMAT_SELECTOR: &str = "bestvideo[ext=mp4]+bestaudio[ext=m4a]/best[ext=mp4]/best";

/// What yt-dlp is asked to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtractionMode {
    /// One JSON document with a best-format selection applied
    SingleVideoBestFormat,
    /// One JSON document with the complete format list (`-J`)
    SingleVideoLegacyFormatList,
    /// One JSON document per playlist entry, entries unresolved
    PlaylistFlat,
}

impl ExtractionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionMode::SingleVideoBestFormat => "single_video_best_format",
            ExtractionMode::SingleVideoLegacyFormatList => "single_video_legacy_format_list",
            ExtractionMode::PlaylistFlat => "playlist_flat",
        }
    }

    fn mode_args(&self) -> Vec<String> {
        let args: &[&str] = match self {
            ExtractionMode::SingleVideoBestFormat => &[
                "--format",
                BEST_FORMAT_SELECTOR,
                "--no-playlist",
                "--print-json",
            ],
            ExtractionMode::SingleVideoLegacyFormatList => &["-J", "--no-playlist"],
            ExtractionMode::PlaylistFlat => &["--flat-playlist", "--print-json"],
        };
        args.iter().map(|s| s.to_string()).collect()
    }
}

/// Builder for yt-dlp argument vectors.
///
/// The source URL is always the final argument and is preceded by `--`, so
/// nothing derived from it can be read as an option.
#[derive(Debug, Clone)]
pub struct YtDlpCommand {
    mode: ExtractionMode,
    source_url: String,
    extra_args: Vec<String>,
}

impl YtDlpCommand {
    /// Command for a single video.
    pub fn video(id: &VideoId, mode: ExtractionMode) -> Self {
        Self {
            mode,
            source_url: video_source_url(id),
            extra_args: Vec::new(),
        }
    }

    /// Command for a flat playlist listing.
    pub fn playlist(id: &PlaylistId) -> Self {
        Self {
            mode: ExtractionMode::PlaylistFlat,
            source_url: playlist_source_url(id),
            extra_args: Vec::new(),
        }
    }

    pub fn mode(&self) -> ExtractionMode {
        self.mode
    }

    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    /// Add an extra argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.extra_args.push(arg.into());
        self
    }

    /// Skip TLS certificate verification.
    pub fn no_check_certificate(self) -> Self {
        self.arg("--no-check-certificate")
    }

    /// Pretend to be located where the content is available.
    pub fn geo_bypass(self) -> Self {
        self.arg("--geo-bypass")
    }

    /// Set the HTTP user agent.
    pub fn user_agent(self, user_agent: impl Into<String>) -> Self {
        self.arg("--user-agent").arg(user_agent)
    }

    /// Add an HTTP request header.
    pub fn header(self, name: &str, value: &str) -> Self {
        self.arg("--add-header").arg(format!("{}: {}", name, value))
    }

    /// Read cookies from the given source.
    pub fn cookies(self, source: &CookieSource) -> Self {
        match source {
            CookieSource::None => self,
            CookieSource::File(path) => self.arg("--cookies").arg(path.to_string_lossy()),
            CookieSource::Browser(browser) => self.arg("--cookies-from-browser").arg(browser.as_str()),
        }
    }

    /// Apply every flag the configuration asks for.
    pub fn configured(self, config: &ExtractorConfig) -> Self {
        let mut cmd = self;
        if config.bypass_certificate_check {
            cmd = cmd.no_check_certificate();
        }
        if config.geo_bypass && cmd.mode != ExtractionMode::PlaylistFlat {
            cmd = cmd.geo_bypass();
        }
        if let Some(user_agent) = &config.user_agent {
            cmd = cmd.user_agent(user_agent.as_str());
        }
        for (name, value) in &config.headers {
            cmd = cmd.header(name, value);
        }
        cmd.cookies(&config.cookie_source)
    }

    /// Build the command arguments.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = self.mode.mode_args();
        args.push("--no-warnings".to_string());
        args.extend(self.extra_args.iter().cloned());
        args.push("--".to_string());
        args.push(self.source_url.clone());
        args
    }
}

/// Runs a program with a wall-clock timeout and bounded output capture.
#[derive(Debug, Clone)]
pub struct YtDlpRunner {
    program: PathBuf,
    timeout: Duration,
    max_output_bytes: usize,
}

struct Capture {
    bytes: Vec<u8>,
    overflowed: bool,
}

/// Read up to `limit` bytes, then stop reading. Dropping the pipe afterwards
/// makes the writer fail with a broken pipe instead of blocking.
async fn read_capped<R: AsyncRead + Unpin>(reader: R, limit: usize) -> std::io::Result<Capture> {
    let mut bytes = Vec::new();
    reader.take(limit as u64 + 1).read_to_end(&mut bytes).await?;
    let overflowed = bytes.len() > limit;
    bytes.truncate(limit);
    Ok(Capture { bytes, overflowed })
}

/// Read to EOF, keeping only the first `limit` bytes.
async fn drain_capped<R: AsyncRead + Unpin>(mut reader: R, limit: usize) -> std::io::Result<Vec<u8>> {
    let mut kept = Vec::new();
    let mut chunk = [0u8; 8192];
    loop {
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        let room = limit.saturating_sub(kept.len());
        kept.extend_from_slice(&chunk[..n.min(room)]);
    }
    Ok(kept)
}

impl YtDlpRunner {
    pub fn new(program: impl AsRef<Path>, timeout: Duration, max_output_bytes: usize) -> Self {
        Self {
            program: program.as_ref().to_path_buf(),
            timeout,
            max_output_bytes,
        }
    }

    /// Run the program once and return its stdout.
    ///
    /// The child is killed on timeout, on stdout overflow, and when the
    /// returned future is dropped.
    pub async fn run(&self, args: &[String]) -> ExtractResult<Vec<u8>> {
        debug!("Running: {} {}", self.program.display(), args.join(" "));

        let mut child = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => {
                    ExtractError::ToolNotFound(self.program.display().to_string())
                }
                _ => ExtractError::Spawn(e),
            })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ExtractError::internal("stdout not captured"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| ExtractError::internal("stderr not captured"))?;

        let limit = self.max_output_bytes;
        let waited = tokio::time::timeout(self.timeout, async {
            let (stdout, stderr) = tokio::try_join!(
                read_capped(stdout, limit),
                drain_capped(stderr, STDERR_CAPTURE_LIMIT)
            )?;
            let status = child.wait().await?;
            Ok::<_, std::io::Error>((stdout, stderr, status))
        })
        .await;

        let (stdout, stderr, status) = match waited {
            Ok(result) => result?,
            Err(_) => {
                let secs = self.timeout.as_secs();
                warn!("yt-dlp timed out after {} seconds, killing process", secs);
                let _ = child.kill().await;
                return Err(ExtractError::TimedOut(secs));
            }
        };

        if stdout.overflowed {
            warn!("yt-dlp output exceeded {} bytes", limit);
            return Err(ExtractError::OutputTooLarge(limit));
        }

        if !status.success() {
            let stderr = String::from_utf8_lossy(&stderr).into_owned();
            let message = match status.code() {
                Some(code) => format!("yt-dlp exited with status {}", code),
                None => "yt-dlp was terminated by a signal".to_string(),
            };
            return Err(ExtractError::failed(message, Some(stderr), status.code()));
        }

        if stdout.bytes.iter().all(|b| b.is_ascii_whitespace()) {
            return Err(ExtractError::EmptyOutput);
        }

        Ok(stdout.bytes)
    }
}

/// Check if yt-dlp is available.
pub fn check_ytdlp(binary: impl AsRef<Path>) -> ExtractResult<PathBuf> {
    let binary = binary.as_ref();
    which::which(binary).map_err(|_| ExtractError::ToolNotFound(binary.display().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    fn video_id() -> VideoId {
        VideoId::parse("dQw4w9WgXcQ").unwrap()
    }

    #[test]
    fn test_best_format_command() {
        let args = YtDlpCommand::video(&video_id(), ExtractionMode::SingleVideoBestFormat).build_args();
        assert_eq!(args[0], "--format");
        assert_eq!(args[1], BEST_FORMAT_SELECTOR);
        assert!(args.contains(&"--no-playlist".to_string()));
        assert!(args.contains(&"--print-json".to_string()));
        assert_eq!(args[args.len() - 2], "--");
        assert_eq!(args[args.len() - 1], "https://youtube.com/watch?v=dQw4w9WgXcQ");
    }

    #[test]
    fn test_legacy_command() {
        let args =
            YtDlpCommand::video(&video_id(), ExtractionMode::SingleVideoLegacyFormatList).build_args();
        assert_eq!(&args[..2], &["-J".to_string(), "--no-playlist".to_string()]);
    }

    #[test]
    fn test_playlist_command() {
        let id = PlaylistId::parse("PL1234567890").unwrap();
        let cmd = YtDlpCommand::playlist(&id);
        assert_eq!(cmd.mode(), ExtractionMode::PlaylistFlat);
        let args = cmd.build_args();
        assert!(args.contains(&"--flat-playlist".to_string()));
        assert_eq!(
            args.last().unwrap(),
            "https://www.youtube.com/playlist?list=PL1234567890"
        );
    }

    #[test]
    fn test_configured_flags() {
        let config = ExtractorConfig {
            user_agent: Some("UA/1.0".to_string()),
            headers: vec![("Referer".to_string(), "https://www.youtube.com".to_string())],
            cookie_source: CookieSource::File(PathBuf::from("/tmp/cookies.txt")),
            ..ExtractorConfig::default()
        };
        let args = YtDlpCommand::video(&video_id(), ExtractionMode::SingleVideoBestFormat)
            .configured(&config)
            .build_args();

        assert!(args.contains(&"--no-check-certificate".to_string()));
        assert!(args.contains(&"--geo-bypass".to_string()));
        let ua = args.iter().position(|a| a == "--user-agent").unwrap();
        assert_eq!(args[ua + 1], "UA/1.0");
        let header = args.iter().position(|a| a == "--add-header").unwrap();
        assert_eq!(args[header + 1], "Referer: https://www.youtube.com");
        let cookies = args.iter().position(|a| a == "--cookies").unwrap();
        assert_eq!(args[cookies + 1], "/tmp/cookies.txt");
    }

    #[test]
    fn test_configured_without_optional_flags() {
        let config = ExtractorConfig {
            bypass_certificate_check: false,
            geo_bypass: false,
            user_agent: None,
            headers: vec![],
            cookie_source: CookieSource::Browser("firefox".to_string()),
            ..ExtractorConfig::default()
        };
        let args = YtDlpCommand::video(&video_id(), ExtractionMode::SingleVideoBestFormat)
            .configured(&config)
            .build_args();
        assert!(!args.contains(&"--no-check-certificate".to_string()));
        assert!(!args.contains(&"--user-agent".to_string()));
        let browser = args.iter().position(|a| a == "--cookies-from-browser").unwrap();
        assert_eq!(args[browser + 1], "firefox");
    }

    fn shell(script: &str) -> Vec<String> {
        vec!["-c".to_string(), script.to_string()]
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_runner_returns_stdout() {
        let runner = YtDlpRunner::new("/bin/sh", Duration::from_secs(5), 1024);
        let out = runner.run(&shell(r#"printf '{"title":"x"}'"#)).await.unwrap();
        assert_eq!(out, br#"{"title":"x"}"#);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_runner_captures_stderr_on_failure() {
        let runner = YtDlpRunner::new("/bin/sh", Duration::from_secs(5), 1024);
        let err = runner
            .run(&shell("echo 'ERROR: Video unavailable' >&2; exit 1"))
            .await
            .unwrap_err();
        match err {
            ExtractError::Failed { stderr, exit_code, .. } => {
                assert_eq!(exit_code, Some(1));
                assert!(stderr.unwrap().contains("Video unavailable"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_runner_empty_output() {
        let runner = YtDlpRunner::new("/bin/sh", Duration::from_secs(5), 1024);
        let err = runner.run(&shell("printf '\\n'")).await.unwrap_err();
        assert!(matches!(err, ExtractError::EmptyOutput));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_runner_kills_on_timeout() {
        let runner = YtDlpRunner::new("/bin/sh", Duration::from_secs(1), 1024);
        let start = Instant::now();
        let err = runner.run(&shell("exec sleep 30")).await.unwrap_err();
        assert!(matches!(err, ExtractError::TimedOut(1)));
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_runner_bounds_output() {
        let runner = YtDlpRunner::new("/bin/sh", Duration::from_secs(5), 1024);
        let err = runner
            .run(&shell("head -c 65536 /dev/zero"))
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::OutputTooLarge(1024)));
    }

    #[tokio::test]
    async fn test_runner_missing_binary() {
        let runner = YtDlpRunner::new(
            "/nonexistent/definitely-not-yt-dlp",
            Duration::from_secs(1),
            1024,
        );
        let err = runner.run(&[]).await.unwrap_err();
        assert!(matches!(err, ExtractError::ToolNotFound(_)));
    }

    #[test]
    fn test_check_ytdlp_missing() {
        assert!(check_ytdlp("/nonexistent/definitely-not-yt-dlp").is_err());
    }
}
