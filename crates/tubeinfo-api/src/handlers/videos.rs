//! Single-video metadata.

use std::time::Instant;

use axum::extract::rejection::PathRejection;
use axum::extract::{Path, State};
use axum::Json;
use tracing::{info, warn};

use tubeinfo_models::{IdentifierError, MediaItemSummary, VideoId};

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::state::AppState;

/// `GET /video/:video_id`
pub async fn get_video(
    State(state): State<AppState>,
    video_id: Result<Path<String>, PathRejection>,
) -> ApiResult<Json<MediaItemSummary>> {
    // Undecodable segments are invalid identifiers, not framework errors.
    let Path(video_id) = video_id.map_err(|_| IdentifierError::InvalidVideoId)?;
    let video_id = VideoId::parse(&video_id)?;

    let start = Instant::now();
    let result = state.extractor.extract_video(&video_id).await;
    metrics::record_extraction(
        "video",
        start.elapsed(),
        result.as_ref().err().map(|e| e.kind()),
    );

    match result {
        Ok(summary) => {
            info!(
                video_id = %video_id,
                formats = summary.formats.len(),
                "Fetched video info"
            );
            Ok(Json(summary))
        }
        Err(e) => {
            warn!(
                video_id = %video_id,
                kind = e.kind().as_str(),
                error = %e,
                "Failed to fetch video info"
            );
            Err(ApiError::video_extraction(&video_id, e))
        }
    }
}
