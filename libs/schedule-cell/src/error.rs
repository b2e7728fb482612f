use chrono::NaiveDate;
use thiserror::Error;

use shared_models::error::ApiError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("No time slots are selected for {0}. Please select at least one slot to save, or use Delete to clear the schedule")]
    NothingSelected(NaiveDate),

    #[error("Please select a date first")]
    NoDateSelected,

    #[error("Please wait until the schedule for {0} has finished loading")]
    Busy(NaiveDate),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Server error ({status}): {detail}")]
    Server { status: u16, detail: String },

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl ScheduleError {
    /// The caller should send the user back through sign-in rather than retry.
    pub fn is_auth(&self) -> bool {
        matches!(self, ScheduleError::Auth(_))
    }

    /// Raised locally, before any request was made.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ScheduleError::Validation(_)
                | ScheduleError::NothingSelected(_)
                | ScheduleError::NoDateSelected
                | ScheduleError::Busy(_)
        )
    }
}

impl From<ApiError> for ScheduleError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Auth { status, detail } => {
                ScheduleError::Auth(format!("({}) {}. Please log in again", status, detail))
            }
            ApiError::MissingCredential(msg) => ScheduleError::Auth(msg),
            ApiError::NotFound(detail) => ScheduleError::NotFound(detail),
            ApiError::Server { status, detail } => ScheduleError::Server { status, detail },
            ApiError::Network(msg) => ScheduleError::Network(msg),
            ApiError::Decode(msg) => ScheduleError::Serialization(msg),
        }
    }
}
