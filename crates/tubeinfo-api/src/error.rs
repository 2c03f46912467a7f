//! API error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use tubeinfo_extract::ExtractError;
use tubeinfo_models::{IdentifierError, VideoId};

pub type ApiResult<T> = Result<T, ApiError>;

/// Message returned with 429 responses.
pub const RATE_LIMIT_MESSAGE: &str = "Too many requests, please try again later.";

/// Message returned for unexpected failures, including panics.
pub const FALLBACK_MESSAGE: &str = "Something broke!";

/// Replacement for server-side details in production responses.
pub const REDACTED_DETAILS: &str = "An internal error occurred";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    InvalidIdentifier(#[from] IdentifierError),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("{}", RATE_LIMIT_MESSAGE)]
    RateLimited,

    #[error("Not found")]
    NotFound,

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("{context}: {source}")]
    Extraction {
        context: &'static str,
        video_id: Option<String>,
        #[source]
        source: ExtractError,
    },
}

impl ApiError {
    /// Failure while fetching a single video.
    pub fn video_extraction(id: &VideoId, source: ExtractError) -> Self {
        Self::Extraction {
            context: "Failed to fetch video info",
            video_id: Some(id.to_string()),
            source,
        }
    }

    /// Failure while fetching a playlist.
    pub fn playlist_extraction(source: ExtractError) -> Self {
        Self::Extraction {
            context: "Failed to fetch playlist info",
            video_id: None,
            source,
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidIdentifier(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Extraction { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(rename = "videoId", skip_serializing_if = "Option::is_none")]
    pub video_id: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
            video_id: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Body to serve instead of a 5xx error body when details must stay private.
///
/// Attached as a response extension; `redact_server_errors` swaps it in.
#[derive(Debug, Clone)]
pub struct RedactedBody(pub ErrorResponse);

/// Render an error body, attaching its redacted form to 5xx responses that
/// carry details.
pub fn error_response(status: StatusCode, body: ErrorResponse) -> Response {
    let redacted = (status.is_server_error() && body.details.is_some()).then(|| {
        RedactedBody(ErrorResponse {
            details: Some(REDACTED_DETAILS.to_string()),
            ..body.clone()
        })
    });

    let mut response = (status, Json(body)).into_response();
    if let Some(redacted) = redacted {
        response.extensions_mut().insert(redacted);
    }
    response
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let body = match self {
            ApiError::Extraction {
                context,
                video_id,
                source,
            } => ErrorResponse {
                video_id,
                ..ErrorResponse::new(context).with_details(source.details())
            },
            other => ErrorResponse::new(other.to_string()),
        };

        error_response(status, body)
    }
}
