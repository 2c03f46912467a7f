//! Playlist response models.

use serde::{Deserialize, Serialize};

/// Title used when no playlist entry carries one.
pub const DEFAULT_PLAYLIST_TITLE: &str = "Playlist";

/// Lightweight reference to one playlist entry.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoReference {
    pub id: String,
    pub title: String,
    pub description: String,
    pub thumbnail: String,
    /// Duration in whole seconds
    pub duration: u64,
    /// Canonical watch URL derived from the id
    pub url: String,
}

/// Normalized response for a playlist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistSummary {
    pub title: String,
    pub videos: Vec<VideoReference>,
    pub total_videos: usize,
}

impl PlaylistSummary {
    pub fn new(title: impl Into<String>, videos: Vec<VideoReference>) -> Self {
        Self {
            title: title.into(),
            total_videos: videos.len(),
            videos,
        }
    }
}
