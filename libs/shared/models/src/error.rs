use thiserror::Error;

/// Failure of a single call against the REST backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("Authentication error ({status}): {detail}")]
    Auth { status: u16, detail: String },

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("API error ({status}): {detail}")]
    Server { status: u16, detail: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response body: {0}")]
    Decode(String),

    #[error("Missing credential: {0}")]
    MissingCredential(String),
}

impl ApiError {
    /// Maps a non-success HTTP status to the matching variant.
    pub fn from_status(status: u16, detail: String) -> Self {
        match status {
            401 | 403 => ApiError::Auth { status, detail },
            404 => ApiError::NotFound(detail),
            _ => ApiError::Server { status, detail },
        }
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, ApiError::Auth { .. } | ApiError::MissingCredential(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound(_))
    }
}
