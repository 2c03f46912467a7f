//! Error types for extraction operations.

use thiserror::Error;

/// Result type for extraction operations.
pub type ExtractResult<T> = Result<T, ExtractError>;

/// Errors that can occur while running yt-dlp or normalizing its output.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("yt-dlp not found: {0}")]
    ToolNotFound(String),

    #[error("Failed to start yt-dlp: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("{message}")]
    Failed {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("yt-dlp timed out after {0} seconds")]
    TimedOut(u64),

    #[error("yt-dlp output exceeded {0} bytes")]
    OutputTooLarge(usize),

    #[error("yt-dlp produced no output")]
    EmptyOutput,

    #[error("Failed to parse yt-dlp output: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Failed to parse yt-dlp output at line {line}: {source}")]
    MalformedLine {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("No downloadable formats available")]
    NoFormatsAvailable,

    #[error("Invalid cookie data: {0}")]
    InvalidCredentials(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Failure classes surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    ExtractionFailed,
    EmptyOutput,
    ParseError,
    NoFormatsAvailable,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::ExtractionFailed => "extraction_failed",
            ErrorKind::EmptyOutput => "empty_output",
            ErrorKind::ParseError => "parse_error",
            ErrorKind::NoFormatsAvailable => "no_formats_available",
            ErrorKind::Internal => "internal",
        }
    }
}

impl ExtractError {
    /// Create a non-zero exit failure.
    pub fn failed(message: impl Into<String>, stderr: Option<String>, exit_code: Option<i32>) -> Self {
        Self::Failed {
            message: message.into(),
            stderr,
            exit_code,
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Classify the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ExtractError::ToolNotFound(_)
            | ExtractError::Spawn(_)
            | ExtractError::Failed { .. }
            | ExtractError::TimedOut(_)
            | ExtractError::OutputTooLarge(_) => ErrorKind::ExtractionFailed,
            ExtractError::EmptyOutput => ErrorKind::EmptyOutput,
            ExtractError::JsonParse(_) | ExtractError::MalformedLine { .. } => ErrorKind::ParseError,
            ExtractError::NoFormatsAvailable => ErrorKind::NoFormatsAvailable,
            ExtractError::InvalidCredentials(_) | ExtractError::Io(_) | ExtractError::Internal(_) => {
                ErrorKind::Internal
            }
        }
    }

    /// Diagnostic detail for operators: captured stderr when present,
    /// otherwise the error message.
    pub fn details(&self) -> String {
        match self {
            ExtractError::Failed {
                message,
                stderr: Some(stderr),
                ..
            } if !stderr.trim().is_empty() => format!("{}: {}", message, stderr.trim()),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        assert_eq!(ExtractError::TimedOut(30).kind(), ErrorKind::ExtractionFailed);
        assert_eq!(ExtractError::OutputTooLarge(10).kind(), ErrorKind::ExtractionFailed);
        assert_eq!(
            ExtractError::failed("boom", None, Some(1)).kind(),
            ErrorKind::ExtractionFailed
        );
        assert_eq!(ExtractError::EmptyOutput.kind(), ErrorKind::EmptyOutput);
        assert_eq!(ExtractError::NoFormatsAvailable.kind(), ErrorKind::NoFormatsAvailable);

        let parse = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert_eq!(ExtractError::from(parse).kind(), ErrorKind::ParseError);
    }

    #[test]
    fn test_details_prefers_stderr() {
        let err = ExtractError::failed(
            "yt-dlp exited with status 1",
            Some("ERROR: Video unavailable\n".to_string()),
            Some(1),
        );
        assert_eq!(err.details(), "yt-dlp exited with status 1: ERROR: Video unavailable");

        let err = ExtractError::failed("yt-dlp exited with status 1", Some("  ".to_string()), Some(1));
        assert_eq!(err.details(), "yt-dlp exited with status 1");

        assert_eq!(
            ExtractError::TimedOut(30).details(),
            "yt-dlp timed out after 30 seconds"
        );
    }
}
