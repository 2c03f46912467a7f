//! Normalization of yt-dlp JSON output into response models.
//!
//! Normalization is pure: the same bytes always produce the same summary.

use serde::Deserialize;

use tubeinfo_models::media::DEFAULT_TITLE;
use tubeinfo_models::playlist::DEFAULT_PLAYLIST_TITLE;
use tubeinfo_models::urls::{default_thumbnail_url, watch_url};
use tubeinfo_models::{MediaItemSummary, MediaRendition, PlaylistSummary, VideoReference};

use crate::command::ExtractionMode;
use crate::error::{ExtractError, ExtractResult};

/// Protocols that point at a manifest rather than a direct file.
const MANIFEST_PROTOCOLS: &[&str] = &["m3u8", "m3u8_native", "http_dash_segments", "f4m", "ism"];

#[derive(Debug, Deserialize)]
struct RawVideo {
    title: Option<String>,
    description: Option<String>,
    thumbnail: Option<String>,
    duration: Option<f64>,
    formats: Option<Vec<RawFormat>>,
    url: Option<String>,
    ext: Option<String>,
    height: Option<f64>,
    width: Option<f64>,
    uploader: Option<String>,
    view_count: Option<f64>,
    webpage_url: Option<String>,
    extractor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawFormat {
    url: Option<String>,
    ext: Option<String>,
    height: Option<f64>,
    width: Option<f64>,
    filesize: Option<f64>,
    filesize_approx: Option<f64>,
    format_note: Option<String>,
    vcodec: Option<String>,
    acodec: Option<String>,
    tbr: Option<f64>,
    fps: Option<f64>,
    protocol: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawThumbnail {
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawPlaylistEntry {
    id: String,
    title: Option<String>,
    description: Option<String>,
    thumbnail: Option<String>,
    thumbnails: Option<Vec<RawThumbnail>>,
    duration: Option<f64>,
    playlist_title: Option<String>,
    playlist: Option<String>,
}

/// Round a JSON number to a non-negative whole value; absent, negative or
/// non-finite values become 0.
fn whole(value: Option<f64>) -> u64 {
    value
        .filter(|v| v.is_finite() && *v > 0.0)
        .map(|v| v.round() as u64)
        .unwrap_or(0)
}

fn pixels(value: Option<f64>) -> u32 {
    u32::try_from(whole(value)).unwrap_or(u32::MAX)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

impl RawFormat {
    fn has_url(&self) -> bool {
        self.url.as_deref().is_some_and(|u| !u.is_empty())
    }

    fn is_mp4(&self) -> bool {
        self.ext.as_deref() == Some("mp4")
    }

    fn is_audio_only(&self) -> bool {
        self.vcodec.as_deref() == Some("none")
    }

    fn is_manifest(&self) -> bool {
        if self
            .protocol
            .as_deref()
            .is_some_and(|p| MANIFEST_PROTOCOLS.contains(&p))
        {
            return true;
        }
        let url = self.url.as_deref().unwrap_or_default();
        let path = url.split('?').next().unwrap_or_default();
        url.contains("/manifest/") || path.ends_with(".m3u8") || path.ends_with(".mpd")
    }

    fn accepted_by(&self, mode: ExtractionMode) -> bool {
        let basic = self.is_mp4() && self.has_url();
        match mode {
            ExtractionMode::SingleVideoBestFormat => basic && !self.is_audio_only() && !self.is_manifest(),
            _ => basic,
        }
    }

    fn into_rendition(self) -> MediaRendition {
        MediaRendition {
            url: self.url.unwrap_or_default(),
            ext: self.ext.unwrap_or_default(),
            height: pixels(self.height),
            width: pixels(self.width),
            filesize: whole(self.filesize.or(self.filesize_approx)),
            note: self.format_note.unwrap_or_default(),
            vcodec: self.vcodec.unwrap_or_default(),
            acodec: self.acodec.unwrap_or_default(),
            bitrate: self.tbr.filter(|v| v.is_finite()).unwrap_or(0.0),
            fps: self.fps.filter(|v| v.is_finite()).unwrap_or(0.0),
        }
    }
}

/// Turn a single-video JSON document into a summary.
pub fn normalize_video(stdout: &[u8], mode: ExtractionMode) -> ExtractResult<MediaItemSummary> {
    let raw: RawVideo = serde_json::from_slice(stdout)?;

    let mut formats: Vec<MediaRendition> = raw
        .formats
        .unwrap_or_default()
        .into_iter()
        .filter(|f| f.accepted_by(mode))
        .map(RawFormat::into_rendition)
        .collect();
    formats.sort_by(MediaRendition::quality_order);

    if formats.is_empty() {
        if let Some(url) = non_empty(raw.url) {
            formats.push(MediaRendition::fallback(
                url,
                non_empty(raw.ext).unwrap_or_else(|| "mp4".to_string()),
                pixels(raw.height),
                pixels(raw.width),
            ));
        }
    }

    if formats.is_empty() {
        return Err(ExtractError::NoFormatsAvailable);
    }

    Ok(MediaItemSummary {
        title: non_empty(raw.title).unwrap_or_else(|| DEFAULT_TITLE.to_string()),
        description: raw.description.unwrap_or_default(),
        thumbnail: raw.thumbnail.unwrap_or_default(),
        duration: whole(raw.duration),
        formats,
        uploader: non_empty(raw.uploader),
        view_count: raw.view_count.map(|v| whole(Some(v))),
        webpage_url: non_empty(raw.webpage_url),
        extractor: non_empty(raw.extractor),
    })
}

impl RawPlaylistEntry {
    fn into_reference(self) -> VideoReference {
        let thumbnail = non_empty(self.thumbnail)
            .or_else(|| {
                self.thumbnails
                    .unwrap_or_default()
                    .into_iter()
                    .rev()
                    .find_map(|t| non_empty(t.url))
            })
            .unwrap_or_else(|| default_thumbnail_url(&self.id));
        VideoReference {
            url: watch_url(&self.id),
            title: non_empty(self.title).unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            description: self.description.unwrap_or_default(),
            thumbnail,
            duration: whole(self.duration),
            id: self.id,
        }
    }
}

/// Turn newline-delimited flat-playlist output into a summary.
///
/// Any malformed line fails the whole listing.
pub fn normalize_playlist(stdout: &[u8]) -> ExtractResult<PlaylistSummary> {
    let text = String::from_utf8_lossy(stdout);

    let mut entries = Vec::new();
    for (index, line) in text.trim_end().lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let entry: RawPlaylistEntry =
            serde_json::from_str(line).map_err(|source| ExtractError::MalformedLine {
                line: index + 1,
                source,
            })?;
        entries.push(entry);
    }

    let title = entries
        .first()
        .and_then(|e| {
            non_empty(e.playlist_title.clone()).or_else(|| non_empty(e.playlist.clone()))
        })
        .unwrap_or_else(|| DEFAULT_PLAYLIST_TITLE.to_string());

    let videos = entries
        .into_iter()
        .map(RawPlaylistEntry::into_reference)
        .collect();

    Ok(PlaylistSummary::new(title, videos))
}
