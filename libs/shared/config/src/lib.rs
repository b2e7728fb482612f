use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

pub const DEFAULT_SCHEDULE_API_URL: &str = "http://127.0.0.1:8000/appointments";

/// Which day-part boundaries and default slot vocabulary the scheduler uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DaypartPreset {
    /// 05-12 / 12-17 / 17-21 / 21-05, half-hour defaults from 08:00 to 22:30.
    #[default]
    Standard,
    /// 06-12 / 12-17 / 17-22 / 22-06, eight half-hour defaults per day-part.
    Extended,
}

impl FromStr for DaypartPreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" => Ok(DaypartPreset::Standard),
            "extended" => Ok(DaypartPreset::Extended),
            other => Err(format!("Unknown daypart preset: {}", other)),
        }
    }
}

impl fmt::Display for DaypartPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DaypartPreset::Standard => write!(f, "standard"),
            DaypartPreset::Extended => write!(f, "extended"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub schedule_api_url: String,
    pub token_path: Option<PathBuf>,
    pub access_token: Option<String>,
    pub daypart_preset: DaypartPreset,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            schedule_api_url: env::var("SCHEDULE_API_URL")
                .unwrap_or_else(|_| {
                    warn!("SCHEDULE_API_URL not set, using default");
                    DEFAULT_SCHEDULE_API_URL.to_string()
                }),
            token_path: env::var("SCHEDULE_TOKEN_PATH")
                .ok()
                .filter(|path| !path.is_empty())
                .map(PathBuf::from),
            access_token: env::var("SCHEDULE_ACCESS_TOKEN")
                .ok()
                .filter(|token| !token.is_empty()),
            daypart_preset: env::var("SCHEDULE_DAYPART_PRESET")
                .ok()
                .and_then(|value| match value.parse() {
                    Ok(preset) => Some(preset),
                    Err(e) => {
                        warn!("{}, using standard", e);
                        None
                    }
                })
                .unwrap_or_default(),
        };

        if config.token_path.is_none() {
            warn!("SCHEDULE_TOKEN_PATH not set, credentials will not survive a restart");
        }

        if !config.is_configured() {
            warn!("Application not fully configured - schedule API URL is empty");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        let url = self.schedule_api_url.trim();
        !url.is_empty() && (url.starts_with("http://") || url.starts_with("https://"))
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            schedule_api_url: DEFAULT_SCHEDULE_API_URL.to_string(),
            token_path: None,
            access_token: None,
            daypart_preset: DaypartPreset::default(),
        }
    }
}
