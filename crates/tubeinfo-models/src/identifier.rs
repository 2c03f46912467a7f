//! Validated identifiers for videos and playlists.
//!
//! Identifiers arrive as untrusted path parameters and end up embedded in the
//! source URL handed to yt-dlp, so they can only be constructed through the
//! validating parsers below.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use thiserror::Error;

/// Length of a YouTube video ID.
pub const VIDEO_ID_LEN: usize = 11;

/// Maximum accepted playlist ID length.
pub const MAX_PLAYLIST_ID_LEN: usize = 128;

static VIDEO_ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{11}$").unwrap());

/// Errors produced when parsing an identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    #[error("Invalid video ID")]
    InvalidVideoId,

    #[error("Playlist ID is required")]
    MissingPlaylistId,

    #[error("Invalid playlist ID")]
    InvalidPlaylistId,
}

/// An 11-character YouTube video ID drawn from `[A-Za-z0-9_-]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct VideoId(String);

impl VideoId {
    /// Parse and validate a candidate video ID.
    pub fn parse(raw: &str) -> Result<Self, IdentifierError> {
        if VIDEO_ID_PATTERN.is_match(raw) {
            Ok(Self(raw.to_string()))
        } else {
            Err(IdentifierError::InvalidVideoId)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<&str> for VideoId {
    type Error = IdentifierError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

/// A playlist ID.
///
/// Playlist IDs have no fixed length (`PL...`, `OLAK5uy_...`, `RD...`), so
/// only emptiness, length and the URL-safe character set are checked.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct PlaylistId(String);

impl PlaylistId {
    /// Parse and validate a candidate playlist ID.
    pub fn parse(raw: &str) -> Result<Self, IdentifierError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(IdentifierError::MissingPlaylistId);
        }
        if raw.len() > MAX_PLAYLIST_ID_LEN
            || !raw
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(IdentifierError::InvalidPlaylistId);
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlaylistId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<&str> for PlaylistId {
    type Error = IdentifierError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_id_accepts_valid_ids() {
        assert!(VideoId::parse("dQw4w9WgXcQ").is_ok());
        assert!(VideoId::parse("a-b_c-d_e-f").is_ok());
        assert!(VideoId::parse("___________").is_ok());
        assert!(VideoId::parse("01234567890").is_ok());
    }

    #[test]
    fn test_video_id_rejects_wrong_length() {
        assert_eq!(VideoId::parse("short"), Err(IdentifierError::InvalidVideoId));
        assert_eq!(VideoId::parse(""), Err(IdentifierError::InvalidVideoId));
        assert_eq!(
            VideoId::parse("dQw4w9WgXcQQ"),
            Err(IdentifierError::InvalidVideoId)
        );
        assert_eq!(
            VideoId::parse("dQw4w9WgXc"),
            Err(IdentifierError::InvalidVideoId)
        );
    }

    #[test]
    fn test_video_id_rejects_forbidden_characters() {
        for candidate in [
            "dQw4w9WgXc;",
            "dQw4w9WgXc ",
            "dQw4w9WgXc&",
            "dQw4w9W/XcQ",
            "dQw4w9WgXc\n",
            "dQw4w9WgXcé",
            "$(rm -rf /)",
        ] {
            assert!(
                VideoId::parse(candidate).is_err(),
                "expected {candidate:?} to be rejected"
            );
        }
    }

    #[test]
    fn test_video_id_rejects_multibyte_of_right_char_count() {
        // 11 chars but more than 11 bytes
        assert!(VideoId::parse("ééééééééééé").is_err());
    }

    #[test]
    fn test_video_id_display_round_trips_input() {
        let id = VideoId::parse("dQw4w9WgXcQ").unwrap();
        assert_eq!(id.to_string(), "dQw4w9WgXcQ");
        assert_eq!(id.as_str(), "dQw4w9WgXcQ");
    }

    #[test]
    fn test_playlist_id_validation() {
        assert!(PlaylistId::parse("PLrAXtmErZgOeiKm4sgNOknGvNjby9efdf").is_ok());
        assert!(PlaylistId::parse("OLAK5uy_kL8kqfSx3aRnM").is_ok());
        assert_eq!(
            PlaylistId::parse(""),
            Err(IdentifierError::MissingPlaylistId)
        );
        assert_eq!(
            PlaylistId::parse("   "),
            Err(IdentifierError::MissingPlaylistId)
        );
        assert_eq!(
            PlaylistId::parse("PL123&index=2"),
            Err(IdentifierError::InvalidPlaylistId)
        );
        assert_eq!(
            PlaylistId::parse(&"P".repeat(MAX_PLAYLIST_ID_LEN + 1)),
            Err(IdentifierError::InvalidPlaylistId)
        );
    }

    #[test]
    fn test_identifier_error_messages() {
        assert_eq!(IdentifierError::InvalidVideoId.to_string(), "Invalid video ID");
        assert_eq!(
            IdentifierError::MissingPlaylistId.to_string(),
            "Playlist ID is required"
        );
    }
}
