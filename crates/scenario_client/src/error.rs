use reqwest::StatusCode;
use thiserror::Error;

use dialogue_core::GenerationError;

/// Failure of a backend call.
///
/// Not-found responses carry the user-facing message for the resource;
/// every other non-2xx status is reported with the reason phrase.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(&'static str),

    #[error("{context}: {}", .status.canonical_reason().unwrap_or("Unknown Status"))]
    Status {
        context: &'static str,
        status: StatusCode,
    },

    #[error("Generation failed: {0}")]
    Generation(String),

    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{context}: invalid response body: {source}")]
    Decode {
        context: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound(_))
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::NotFound(_) => Some(StatusCode::NOT_FOUND),
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Transport(err) => err.status(),
            _ => None,
        }
    }
}

impl From<GenerationError> for ApiError {
    fn from(err: GenerationError) -> Self {
        ApiError::Generation(err.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_displays_message_only() {
        assert_eq!(
            ApiError::NotFound("Simulation not found").to_string(),
            "Simulation not found"
        );
    }

    #[test]
    fn status_displays_reason_phrase() {
        let err = ApiError::Status {
            context: "Failed to load simulation tree",
            status: StatusCode::INTERNAL_SERVER_ERROR,
        };
        assert_eq!(
            err.to_string(),
            "Failed to load simulation tree: Internal Server Error"
        );
        assert_eq!(err.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(!err.is_not_found());
    }

    #[test]
    fn generation_error_converts() {
        let err: ApiError = GenerationError("model overloaded".to_string()).into();
        assert_eq!(err.to_string(), "Generation failed: model overloaded");
    }
}
