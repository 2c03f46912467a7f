//! Canonical YouTube URLs.

use std::sync::LazyLock;

use url::Url;

use crate::identifier::{PlaylistId, VideoId};

static SOURCE_WATCH_BASE: LazyLock<Url> =
    LazyLock::new(|| Url::parse("https://youtube.com/watch").unwrap());

static WATCH_BASE: LazyLock<Url> =
    LazyLock::new(|| Url::parse("https://www.youtube.com/watch").unwrap());

static PLAYLIST_BASE: LazyLock<Url> =
    LazyLock::new(|| Url::parse("https://www.youtube.com/playlist").unwrap());

static THUMBNAIL_BASE: LazyLock<Url> =
    LazyLock::new(|| Url::parse("https://i.ytimg.com/vi/").unwrap());

fn with_query(base: &Url, key: &str, value: &str) -> String {
    let mut url = base.clone();
    url.query_pairs_mut().append_pair(key, value);
    url.to_string()
}

/// Source URL handed to yt-dlp for a single video.
pub fn video_source_url(id: &VideoId) -> String {
    with_query(&SOURCE_WATCH_BASE, "v", id.as_str())
}

/// Source URL handed to yt-dlp for a playlist.
pub fn playlist_source_url(id: &PlaylistId) -> String {
    with_query(&PLAYLIST_BASE, "list", id.as_str())
}

/// Public watch URL for a playlist entry.
///
/// Entry IDs come from tool output rather than from a validated identifier,
/// so they are percent-encoded into the query.
pub fn watch_url(video_id: &str) -> String {
    with_query(&WATCH_BASE, "v", video_id)
}

/// Predictable CDN thumbnail for a video.
pub fn default_thumbnail_url(video_id: &str) -> String {
    let mut url = THUMBNAIL_BASE.clone();
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.pop_if_empty().push(video_id).push("hqdefault.jpg");
    }
    url.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_source_url() {
        let id = VideoId::parse("dQw4w9WgXcQ").unwrap();
        assert_eq!(
            video_source_url(&id),
            "https://youtube.com/watch?v=dQw4w9WgXcQ"
        );
    }

    #[test]
    fn test_playlist_source_url() {
        let id = PlaylistId::parse("PLabc_123-x").unwrap();
        assert_eq!(
            playlist_source_url(&id),
            "https://www.youtube.com/playlist?list=PLabc_123-x"
        );
    }

    #[test]
    fn test_watch_url_encodes_untrusted_ids() {
        assert_eq!(
            watch_url("dQw4w9WgXcQ"),
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ"
        );
        assert_eq!(
            watch_url("a&b=c"),
            "https://www.youtube.com/watch?v=a%26b%3Dc"
        );
    }

    #[test]
    fn test_default_thumbnail_url() {
        assert_eq!(
            default_thumbnail_url("dQw4w9WgXcQ"),
            "https://i.ytimg.com/vi/dQw4w9WgXcQ/hqdefault.jpg"
        );
    }
}
