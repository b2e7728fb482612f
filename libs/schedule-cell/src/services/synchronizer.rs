use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use shared_models::auth::AccessToken;
use shared_models::error::ApiError;
use shared_utils::token_store::TokenStore;

use crate::error::ScheduleError;
use crate::models::{FetchedDay, ScheduleDeleteResponse, ScheduleSaveRequest, ScheduleSaveResponse};
use crate::services::remote::{format_date, ScheduleApi};
use crate::services::slots::SlotModel;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied { merged: usize },
    /// The model moved on to another date while the fetch was in flight.
    Stale,
}

/// Keeps a [`SlotModel`] in step with the remote schedule.
#[derive(Clone)]
pub struct SlotSynchronizer {
    api: Arc<dyn ScheduleApi>,
    tokens: Arc<dyn TokenStore>,
}

impl SlotSynchronizer {
    pub fn new(api: Arc<dyn ScheduleApi>, tokens: Arc<dyn TokenStore>) -> Self {
        Self { api, tokens }
    }

    pub fn has_credential(&self) -> bool {
        self.tokens.get_token().is_some()
    }

    fn token(&self) -> Result<AccessToken, ScheduleError> {
        self.tokens.get_token().ok_or_else(|| {
            warn!("No access token available, refusing to contact the schedule API");
            ScheduleError::Auth("No token found. Please log in again".to_string())
        })
    }

    /// 401/403 means the stored credential is useless: drop it before reporting.
    fn handle_api_error(&self, err: ApiError) -> ScheduleError {
        if let ApiError::Auth { status, .. } = &err {
            warn!("Schedule API rejected the credential ({}), clearing stored token", status);
            if let Err(e) = self.tokens.clear_token() {
                warn!("Failed to clear stored token: {}", e);
            }
        }
        err.into()
    }

    /// Fetches the persisted start times for `date` without touching any model.
    ///
    /// A missing schedule is an empty day, not an error.
    pub async fn fetch_persisted(&self, date: NaiveDate) -> Result<FetchedDay, ScheduleError> {
        let token = self.token()?;

        match self.api.fetch_day(date, &token).await {
            Ok(slots) => {
                debug!("Fetched {} saved slots for {}", slots.len(), date);
                Ok(FetchedDay {
                    date,
                    times: slots.into_iter().map(|slot| slot.start_time).collect(),
                })
            }
            Err(ApiError::NotFound(_)) => {
                debug!("No schedule found for {}", date);
                Ok(FetchedDay { date, times: Vec::new() })
            }
            Err(e) => Err(self.handle_api_error(e)),
        }
    }

    /// Merges `fetched` only if the model is still showing the same date.
    pub fn apply_fetched(&self, model: &mut SlotModel, fetched: FetchedDay) -> ApplyOutcome {
        if model.date() != Some(fetched.date) {
            warn!(
                "Discarding stale schedule for {} (model now on {:?})",
                fetched.date,
                model.date()
            );
            return ApplyOutcome::Stale;
        }

        let merged = model.merge_persisted(fetched.times);
        ApplyOutcome::Applied { merged }
    }

    /// Resets the model to `date` and merges what the backend has saved.
    ///
    /// On failure the model stays at the unsaved defaults for `date`.
    pub async fn load_for_date(&self, model: &mut SlotModel, date: NaiveDate) -> Result<usize, ScheduleError> {
        model.reset(date);

        let fetched = self.fetch_persisted(date).await?;
        match self.apply_fetched(model, fetched) {
            ApplyOutcome::Applied { merged } => Ok(merged),
            ApplyOutcome::Stale => Ok(0),
        }
    }

    /// Sends the chosen slots as the complete schedule for the model's date.
    pub async fn save(&self, model: &mut SlotModel) -> Result<ScheduleSaveResponse, ScheduleError> {
        let date = model.date().ok_or(ScheduleError::NoDateSelected)?;
        let times: Vec<_> = model.selected_times().collect();

        // An empty save is only meaningful when it removes previously saved slots.
        if times.is_empty() && !model.has_persisted() {
            return Err(ScheduleError::NothingSelected(date));
        }

        let token = self.token()?;
        let request = ScheduleSaveRequest::new(date, times);

        let response = self.api
            .replace_day(&request, &token)
            .await
            .map_err(|e| self.handle_api_error(e))?;

        model.mark_saved();
        info!("Schedule for {} saved with {} slots", format_date(date), request.slots.len());

        Ok(response)
    }

    /// Deletes the whole day on the backend and clears the model.
    ///
    /// Deleting a day the backend has no record of succeeds.
    pub async fn delete_all(&self, model: &mut SlotModel) -> Result<ScheduleDeleteResponse, ScheduleError> {
        let date = model.date().ok_or(ScheduleError::NoDateSelected)?;
        let token = self.token()?;

        let response = match self.api.delete_day(date, &token).await {
            Ok(response) => response,
            Err(ApiError::NotFound(_)) => ScheduleDeleteResponse {
                message: format!("No schedule found for {} to delete.", format_date(date)),
            },
            Err(e) => return Err(self.handle_api_error(e)),
        };

        model.clear();
        info!("Schedule for {} deleted", format_date(date));

        Ok(response)
    }
}
