use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveTime, Timelike};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ScheduleError;

/// A bookable start time with minute precision.
///
/// The canonical text form is zero-padded 24-hour `HH:MM`, so ordering by value
/// and ordering by that string are the same.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlotTime(NaiveTime);

impl SlotTime {
    pub fn from_hm(hour: u32, minute: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, minute, 0).map(Self)
    }

    /// Converts manual 12-hour input (hour 1-12, minute 0-59) to a slot time.
    pub fn from_12h(hour: u32, minute: u32, meridiem: Meridiem) -> Result<Self, ScheduleError> {
        if !(1..=12).contains(&hour) || minute > 59 {
            return Err(ScheduleError::Validation(format!(
                "Invalid time input: {}:{:02} {}",
                hour, minute, meridiem
            )));
        }

        let hour24 = match (meridiem, hour) {
            (Meridiem::Am, 12) => 0,
            (Meridiem::Am, h) => h,
            (Meridiem::Pm, 12) => 12,
            (Meridiem::Pm, h) => h + 12,
        };

        Self::from_hm(hour24, minute)
            .ok_or_else(|| ScheduleError::Validation(format!("Invalid time input: {}:{:02}", hour, minute)))
    }

    pub fn hour(&self) -> u32 {
        self.0.hour()
    }

    pub fn minute(&self) -> u32 {
        self.0.minute()
    }

    pub fn to_12h(&self) -> (u32, u32, Meridiem) {
        let meridiem = if self.hour() >= 12 { Meridiem::Pm } else { Meridiem::Am };
        let hour = match self.hour() % 12 {
            0 => 12,
            h => h,
        };
        (hour, self.minute(), meridiem)
    }

    /// Display label such as `9:30 AM` or `12:00 PM`.
    pub fn label(&self) -> String {
        let (hour, minute, meridiem) = self.to_12h();
        format!("{}:{:02} {}", hour, minute, meridiem)
    }

    pub fn as_naive_time(&self) -> NaiveTime {
        self.0
    }
}

impl fmt::Display for SlotTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl FromStr for SlotTime {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        // The backend stores HH:MM; tolerate trailing (fractional) seconds.
        NaiveTime::parse_from_str(s, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S%.f"))
            .ok()
            .and_then(|t| Self::from_hm(t.hour(), t.minute()))
            .ok_or_else(|| ScheduleError::Validation(format!("Time must be in HH:MM (24-hour) format: {}", s)))
    }
}

impl Serialize for SlotTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SlotTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Meridiem {
    Am,
    Pm,
}

impl FromStr for Meridiem {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "AM" => Ok(Meridiem::Am),
            "PM" => Ok(Meridiem::Pm),
            other => Err(ScheduleError::Validation(format!("Meridiem must be AM or PM, got '{}'", other))),
        }
    }
}

impl fmt::Display for Meridiem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Meridiem::Am => write!(f, "AM"),
            Meridiem::Pm => write!(f, "PM"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Daypart {
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl Daypart {
    pub const ALL: [Daypart; 4] = [Daypart::Morning, Daypart::Afternoon, Daypart::Evening, Daypart::Night];

    pub fn title(&self) -> &'static str {
        match self {
            Daypart::Morning => "Morning",
            Daypart::Afternoon => "Afternoon",
            Daypart::Evening => "Evening",
            Daypart::Night => "Night",
        }
    }
}

impl fmt::Display for Daypart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Daypart::Morning => write!(f, "morning"),
            Daypart::Afternoon => write!(f, "afternoon"),
            Daypart::Evening => write!(f, "evening"),
            Daypart::Night => write!(f, "night"),
        }
    }
}

/// Per-slot flags inside a day's slot set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SlotState {
    /// The backend had this slot as of the last successful fetch or save.
    pub persisted: bool,
    /// The user wants this slot included on the next save.
    pub chosen: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSlot {
    pub time: SlotTime,
    pub persisted: bool,
    pub chosen: bool,
}

impl TimeSlot {
    pub fn new(time: SlotTime, state: SlotState) -> Self {
        Self {
            time,
            persisted: state.persisted,
            chosen: state.chosen,
        }
    }

    /// Saved on the server but deselected locally.
    pub fn is_pending_removal(&self) -> bool {
        self.persisted && !self.chosen
    }

    /// Chosen locally but not yet saved.
    pub fn is_pending_addition(&self) -> bool {
        !self.persisted && self.chosen
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddSlotOutcome {
    Created,
    /// The slot already existed unchosen and is now chosen.
    NowSelected,
    AlreadySelected,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaypartGroup<T> {
    pub daypart: Daypart,
    pub items: Vec<T>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub is_past: bool,
    pub is_selected: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalendarCell {
    /// Padding before the 1st of the month.
    Blank,
    Day(CalendarDay),
}

impl CalendarCell {
    pub fn day(&self) -> Option<&CalendarDay> {
        match self {
            CalendarCell::Blank => None,
            CalendarCell::Day(day) => Some(day),
        }
    }
}

// Wire types for the /schedule endpoints

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteSlot {
    pub start_time: SlotTime,
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub is_booked: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleSaveSlot {
    pub start_time: SlotTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleSaveRequest {
    pub date: NaiveDate,
    pub slots: Vec<ScheduleSaveSlot>,
}

impl ScheduleSaveRequest {
    pub fn new(date: NaiveDate, times: impl IntoIterator<Item = SlotTime>) -> Self {
        Self {
            date,
            slots: times
                .into_iter()
                .map(|start_time| ScheduleSaveSlot { start_time })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleSaveResponse {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub slots_added: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleDeleteResponse {
    #[serde(default)]
    pub message: String,
}

/// Persisted start times returned for one date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedDay {
    pub date: NaiveDate,
    pub times: Vec<SlotTime>,
}
