use chrono::NaiveDate;
use serde_json::{json, Value};

use shared_config::{AppConfig, DaypartPreset};
use shared_models::auth::AccessToken;

pub const TEST_ACCESS_TOKEN: &str = "test-access-token-for-schedule-api";

pub struct TestConfig {
    pub schedule_api_url: String,
    pub daypart_preset: DaypartPreset,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            schedule_api_url: "http://localhost:8000/appointments".to_string(),
            daypart_preset: DaypartPreset::Standard,
        }
    }
}

impl TestConfig {
    pub fn with_url(url: &str) -> Self {
        Self {
            schedule_api_url: url.to_string(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            schedule_api_url: self.schedule_api_url.clone(),
            token_path: None,
            access_token: Some(TEST_ACCESS_TOKEN.to_string()),
            daypart_preset: self.daypart_preset,
        }
    }
}

pub fn test_token() -> Option<AccessToken> {
    AccessToken::new(TEST_ACCESS_TOKEN)
}

pub struct MockScheduleResponses;

impl MockScheduleResponses {
    /// Body of `GET /schedule`, one entry per `HH:MM` start time.
    pub fn day_schedule_response(date: NaiveDate, start_times: &[&str]) -> Value {
        let slots: Vec<Value> = start_times
            .iter()
            .enumerate()
            .map(|(index, start_time)| json!({
                "id": index + 1,
                "start_time": start_time,
                "date": date.format("%Y-%m-%d").to_string(),
                "is_booked": false
            }))
            .collect();
        Value::Array(slots)
    }

    pub fn save_response(date: NaiveDate, slots_added: usize) -> Value {
        json!({
            "message": format!("Schedule for {} saved successfully.", date.format("%Y-%m-%d")),
            "slots_added": slots_added
        })
    }

    pub fn delete_response(date: NaiveDate, existed: bool) -> Value {
        let message = if existed {
            format!("Schedule for {} deleted successfully.", date.format("%Y-%m-%d"))
        } else {
            format!("No schedule found for {} to delete.", date.format("%Y-%m-%d"))
        };
        json!({ "message": message })
    }

    pub fn error_response(detail: &str) -> Value {
        json!({ "detail": detail })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_creation() {
        let config = TestConfig::default().to_app_config();

        assert_eq!(config.schedule_api_url, "http://localhost:8000/appointments");
        assert_eq!(config.daypart_preset, DaypartPreset::Standard);
        assert!(config.is_configured());
    }

    #[test]
    fn test_day_schedule_response_shape() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let body = MockScheduleResponses::day_schedule_response(date, &["09:00", "10:30"]);

        assert_eq!(body.as_array().map(Vec::len), Some(2));
        assert_eq!(body[1]["start_time"], "10:30");
        assert_eq!(body[0]["date"], "2025-03-10");
    }
}
