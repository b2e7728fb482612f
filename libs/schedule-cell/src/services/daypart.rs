use chrono::{Duration, Timelike};

use shared_config::DaypartPreset;

use crate::error::ScheduleError;
use crate::models::{Daypart, SlotTime};

/// Start hours of each day-part. Night wraps past midnight and ends at `morning_start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DaypartBoundaries {
    morning_start: u32,
    afternoon_start: u32,
    evening_start: u32,
    night_start: u32,
}

impl DaypartBoundaries {
    pub const STANDARD: DaypartBoundaries = DaypartBoundaries {
        morning_start: 5,
        afternoon_start: 12,
        evening_start: 17,
        night_start: 21,
    };

    pub const EXTENDED: DaypartBoundaries = DaypartBoundaries {
        morning_start: 6,
        afternoon_start: 12,
        evening_start: 17,
        night_start: 22,
    };

    pub fn new(
        morning_start: u32,
        afternoon_start: u32,
        evening_start: u32,
        night_start: u32,
    ) -> Result<Self, ScheduleError> {
        if !(morning_start < afternoon_start
            && afternoon_start < evening_start
            && evening_start < night_start
            && night_start < 24)
        {
            return Err(ScheduleError::Validation(format!(
                "Daypart boundaries must be strictly increasing hours below 24: {}/{}/{}/{}",
                morning_start, afternoon_start, evening_start, night_start
            )));
        }

        Ok(Self {
            morning_start,
            afternoon_start,
            evening_start,
            night_start,
        })
    }

    pub fn daypart_for_hour(&self, hour: u32) -> Daypart {
        if hour >= self.morning_start && hour < self.afternoon_start {
            Daypart::Morning
        } else if hour >= self.afternoon_start && hour < self.evening_start {
            Daypart::Afternoon
        } else if hour >= self.evening_start && hour < self.night_start {
            Daypart::Evening
        } else {
            Daypart::Night
        }
    }

    pub fn daypart_for(&self, time: SlotTime) -> Daypart {
        self.daypart_for_hour(time.hour())
    }
}

/// Day-part boundaries plus the default slots offered for every date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaypartScheme {
    pub boundaries: DaypartBoundaries,
    vocabulary: Vec<SlotTime>,
}

impl DaypartScheme {
    pub fn new(boundaries: DaypartBoundaries, mut vocabulary: Vec<SlotTime>) -> Self {
        vocabulary.sort();
        vocabulary.dedup();
        Self { boundaries, vocabulary }
    }

    pub fn from_preset(preset: DaypartPreset) -> Self {
        match preset {
            DaypartPreset::Standard => Self::standard(),
            DaypartPreset::Extended => Self::extended(),
        }
    }

    pub fn standard() -> Self {
        let mut vocabulary = half_hours(8, 8);
        vocabulary.extend(half_hours(12, 10));
        vocabulary.extend(half_hours(17, 8));
        vocabulary.extend(half_hours(21, 4));
        Self::new(DaypartBoundaries::STANDARD, vocabulary)
    }

    pub fn extended() -> Self {
        let mut vocabulary = half_hours(8, 8);
        vocabulary.extend(half_hours(12, 8));
        vocabulary.extend(half_hours(17, 8));
        vocabulary.extend(half_hours(22, 8));
        Self::new(DaypartBoundaries::EXTENDED, vocabulary)
    }

    pub fn vocabulary(&self) -> &[SlotTime] {
        &self.vocabulary
    }

    pub fn daypart_for(&self, time: SlotTime) -> Daypart {
        self.boundaries.daypart_for(time)
    }
}

impl Default for DaypartScheme {
    fn default() -> Self {
        Self::standard()
    }
}

/// `count` consecutive half-hour slots starting at `start_hour:00`, wrapping past midnight.
fn half_hours(start_hour: u32, count: usize) -> Vec<SlotTime> {
    let Some(start) = SlotTime::from_hm(start_hour, 0) else {
        return Vec::new();
    };

    (0..count)
        .filter_map(|step| {
            let time = start.as_naive_time() + Duration::minutes(30 * step as i64);
            SlotTime::from_hm(time.hour(), time.minute())
        })
        .collect()
}
