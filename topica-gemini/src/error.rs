use thiserror::Error;
use topica_chat::{AdapterFailure, FailureKind};

/// Error reason Gemini reports (with HTTP 400) for a malformed or revoked key.
const REASON_API_KEY_INVALID: &str = "API_KEY_INVALID";

#[derive(Debug, Error)]
pub enum GeminiError {
    #[error("Gemini API key is not configured")]
    MissingApiKey,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    Api {
        status: u16,
        message: String,
        /// `reason` of the first `ErrorInfo` detail, when present.
        reason: Option<String>,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AdapterFailure for GeminiError {
    fn kind(&self) -> FailureKind {
        match self {
            GeminiError::MissingApiKey => FailureKind::MissingCredential,
            GeminiError::Api { status, reason, .. } => {
                if *status == 401
                    || *status == 403
                    || reason.as_deref() == Some(REASON_API_KEY_INVALID)
                {
                    FailureKind::Unauthorized
                } else {
                    FailureKind::Transport
                }
            }
            GeminiError::Http(e)
                if e.status().is_some_and(|s| s.as_u16() == 401 || s.as_u16() == 403) =>
            {
                FailureKind::Unauthorized
            }
            GeminiError::Http(_) | GeminiError::Json(_) => FailureKind::Transport,
        }
    }
}
