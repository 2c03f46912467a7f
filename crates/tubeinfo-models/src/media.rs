//! Single-video response models.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// Height used for the synthetic fallback rendition when the tool reports none.
pub const FALLBACK_HEIGHT: u32 = 720;

/// Width used for the synthetic fallback rendition when the tool reports none.
pub const FALLBACK_WIDTH: u32 = 1280;

/// Note attached to the synthetic fallback rendition.
pub const FALLBACK_NOTE: &str = "Default";

/// Title used when the tool reports none.
pub const DEFAULT_TITLE: &str = "Untitled";

/// One downloadable variant of a video.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaRendition {
    pub url: String,
    pub ext: String,
    pub height: u32,
    pub width: u32,
    /// Size in bytes (exact or approximate)
    pub filesize: u64,
    /// Human-readable note, e.g. "720p"
    pub note: String,
    pub vcodec: String,
    pub acodec: String,
    /// Total bitrate in KBit/s
    pub bitrate: f64,
    pub fps: f64,
}

impl MediaRendition {
    /// Build the best-effort rendition used when no format survives filtering.
    ///
    /// Zero dimensions are treated as unknown.
    pub fn fallback(url: impl Into<String>, ext: impl Into<String>, height: u32, width: u32) -> Self {
        Self {
            url: url.into(),
            ext: ext.into(),
            height: if height == 0 { FALLBACK_HEIGHT } else { height },
            width: if width == 0 { FALLBACK_WIDTH } else { width },
            note: FALLBACK_NOTE.to_string(),
            ..Self::default()
        }
    }

    /// Ordering used for response lists: tallest first, then highest bitrate.
    pub fn quality_order(a: &Self, b: &Self) -> Ordering {
        b.height
            .cmp(&a.height)
            .then_with(|| b.bitrate.total_cmp(&a.bitrate))
    }
}

/// Normalized response for a single video.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaItemSummary {
    pub title: String,
    pub description: String,
    pub thumbnail: String,
    /// Duration in whole seconds
    pub duration: u64,
    pub formats: Vec<MediaRendition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uploader: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webpage_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extractor: Option<String>,
}
