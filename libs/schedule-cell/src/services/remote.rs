use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Method;
use serde_json::Value;
use tracing::{debug, warn};

use shared_config::AppConfig;
use shared_database::ApiClient;
use shared_models::auth::AccessToken;
use shared_models::error::ApiError;

use crate::models::{RemoteSlot, ScheduleDeleteResponse, ScheduleSaveRequest, ScheduleSaveResponse};

/// The backend that stores a doctor's published slots, one day at a time.
#[async_trait]
pub trait ScheduleApi: Send + Sync {
    async fn fetch_day(&self, date: NaiveDate, token: &AccessToken) -> Result<Vec<RemoteSlot>, ApiError>;

    /// Replaces everything stored for `request.date` with `request.slots`.
    async fn replace_day(
        &self,
        request: &ScheduleSaveRequest,
        token: &AccessToken,
    ) -> Result<ScheduleSaveResponse, ApiError>;

    async fn delete_day(&self, date: NaiveDate, token: &AccessToken) -> Result<ScheduleDeleteResponse, ApiError>;
}

pub struct HttpScheduleApi {
    client: ApiClient,
}

impl HttpScheduleApi {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: ApiClient::new(config),
        }
    }

    pub fn from_client(client: ApiClient) -> Self {
        Self { client }
    }

    /// Unbooked slots a doctor published for `date`, as shown to patients.
    pub async fn doctor_day(&self, doctor_id: i64, date: NaiveDate) -> Result<Vec<RemoteSlot>, ApiError> {
        debug!("Fetching public schedule of doctor {} for {}", doctor_id, date);

        let path = format!("/doctors/{}/schedule?date={}", doctor_id, format_date(date));
        let body: Value = self.client.request(Method::GET, &path, None, None).await?;

        Ok(parse_slots(body, date)?
            .into_iter()
            .filter(|slot| !slot.is_booked)
            .collect())
    }
}

#[async_trait]
impl ScheduleApi for HttpScheduleApi {
    async fn fetch_day(&self, date: NaiveDate, token: &AccessToken) -> Result<Vec<RemoteSlot>, ApiError> {
        debug!("Fetching schedule for {} with token {:?}", date, token);

        let path = format!("/schedule?date={}", format_date(date));
        let body: Value = self.client.request(Method::GET, &path, Some(token), None).await?;

        parse_slots(body, date)
    }

    async fn replace_day(
        &self,
        request: &ScheduleSaveRequest,
        token: &AccessToken,
    ) -> Result<ScheduleSaveResponse, ApiError> {
        debug!("Saving {} slots for {}", request.slots.len(), request.date);

        let body = serde_json::to_value(request).map_err(|e| ApiError::Decode(e.to_string()))?;
        let response: Option<ScheduleSaveResponse> = self.client
            .request(Method::PUT, "/schedule", Some(token), Some(body))
            .await?;

        Ok(response.unwrap_or_else(|| ScheduleSaveResponse {
            message: format!("Schedule for {} saved successfully.", format_date(request.date)),
            slots_added: Some(request.slots.len() as u32),
        }))
    }

    async fn delete_day(&self, date: NaiveDate, token: &AccessToken) -> Result<ScheduleDeleteResponse, ApiError> {
        debug!("Deleting schedule for {}", date);

        let path = format!("/schedule?date={}", format_date(date));
        let response: Option<ScheduleDeleteResponse> = self.client
            .request(Method::DELETE, &path, Some(token), None)
            .await?;

        Ok(response.unwrap_or_else(|| ScheduleDeleteResponse {
            message: format!("Schedule for {} deleted successfully.", format_date(date)),
        }))
    }
}

/// `YYYY-MM-DD` from the calendar fields, no timezone involved.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// `null` (empty body) is an empty day. Any other non-array body, or a single
/// entry without a usable `start_time`, fails the whole response.
fn parse_slots(body: Value, date: NaiveDate) -> Result<Vec<RemoteSlot>, ApiError> {
    let items = match body {
        Value::Null => return Ok(Vec::new()),
        Value::Array(items) => items,
        other => {
            warn!("Schedule response for {} is not an array: {}", date, other);
            return Err(ApiError::Decode(format!("Expected a list of slots for {}", format_date(date))));
        }
    };

    items
        .into_iter()
        .map(|item| {
            serde_json::from_value::<RemoteSlot>(item.clone()).map_err(|e| {
                warn!("Fetched slot for {} has no valid start_time ({}): {}", date, e, item);
                ApiError::Decode(format!("Invalid slot in schedule for {}: {}", format_date(date), e))
            })
        })
        .collect()
}
