//! Flat playlist listing.

use std::time::Instant;

use axum::extract::rejection::PathRejection;
use axum::extract::{Path, State};
use axum::Json;
use tracing::{info, warn};

use tubeinfo_models::{IdentifierError, PlaylistId, PlaylistSummary};

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::state::AppState;

/// `GET /playlist/:playlist_id`
pub async fn get_playlist(
    State(state): State<AppState>,
    playlist_id: Result<Path<String>, PathRejection>,
) -> ApiResult<Json<PlaylistSummary>> {
    let Path(playlist_id) = playlist_id.map_err(|_| IdentifierError::InvalidPlaylistId)?;
    let playlist_id = PlaylistId::parse(&playlist_id)?;

    let start = Instant::now();
    let result = state.extractor.extract_playlist(&playlist_id).await;
    metrics::record_extraction(
        "playlist",
        start.elapsed(),
        result.as_ref().err().map(|e| e.kind()),
    );

    match result {
        Ok(summary) => {
            info!(
                playlist_id = %playlist_id,
                videos = summary.total_videos,
                "Fetched playlist info"
            );
            Ok(Json(summary))
        }
        Err(e) => {
            warn!(
                playlist_id = %playlist_id,
                kind = e.kind().as_str(),
                error = %e,
                "Failed to fetch playlist info"
            );
            Err(ApiError::playlist_extraction(e))
        }
    }
}

/// `GET /playlist` and `GET /playlist/`
pub async fn missing_playlist_id() -> ApiError {
    ApiError::InvalidIdentifier(IdentifierError::MissingPlaylistId)
}
