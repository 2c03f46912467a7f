//! Tool diagnostics, mounted only when `DIAGNOSTICS_ENABLED` is set.

use axum::extract::State;
use axum::Json;

use tubeinfo_extract::ToolHealth;

use crate::state::AppState;

/// Report the resolved binary, its version and the cookie source.
pub async fn tool_health(State(state): State<AppState>) -> Json<ToolHealth> {
    Json(state.extractor.tool_health().await)
}
