//! yt-dlp invocation and output normalization.
//!
//! This crate provides:
//! - An argument-vector builder for yt-dlp (no shell involved)
//! - A subprocess runner with wall-clock timeout and bounded output capture
//! - Normalization of yt-dlp JSON into response models
//! - One-shot cookie provisioning and a tool health check

pub mod command;
pub mod config;
pub mod cookies;
pub mod diagnostics;
pub mod error;
pub mod extractor;
pub mod normalize;

pub use command::{check_ytdlp, ExtractionMode, YtDlpCommand, YtDlpRunner};
pub use config::{CookieSource, ExtractorConfig};
pub use cookies::{provision_cookies, DEFAULT_COOKIES_PATH};
pub use diagnostics::{check_tool, ToolHealth};
pub use error::{ErrorKind, ExtractError, ExtractResult};
pub use extractor::{MediaExtractor, RawExtractionOutput, YtDlpExtractor};
pub use normalize::{normalize_playlist, normalize_video};
