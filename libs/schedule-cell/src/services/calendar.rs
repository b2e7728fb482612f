use chrono::{Datelike, Months, NaiveDate};
use tracing::debug;

use crate::error::ScheduleError;
use crate::models::{CalendarCell, CalendarDay};

pub const WEEKDAY_LABELS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// Month grid shown to the doctor, plus the single selected day.
#[derive(Debug, Clone)]
pub struct CalendarNavigator {
    first_of_month: NaiveDate,
    today: NaiveDate,
    selected: Option<NaiveDate>,
}

impl CalendarNavigator {
    /// Starts on the month containing `today`.
    pub fn new(today: NaiveDate) -> Self {
        Self {
            first_of_month: today.with_day(1).unwrap_or(today),
            today,
            selected: None,
        }
    }

    /// `month` is zero-based (0 = January).
    pub fn for_month(year: i32, month: u32, today: NaiveDate) -> Result<Self, ScheduleError> {
        let first_of_month = NaiveDate::from_ymd_opt(year, month + 1, 1)
            .ok_or_else(|| ScheduleError::Validation(format!("Invalid calendar month: {}-{}", year, month)))?;

        Ok(Self {
            first_of_month,
            today,
            selected: None,
        })
    }

    pub fn year(&self) -> i32 {
        self.first_of_month.year()
    }

    /// Zero-based month.
    pub fn month(&self) -> u32 {
        self.first_of_month.month0()
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn selected(&self) -> Option<NaiveDate> {
        self.selected
    }

    /// Weekday index of the 1st, 0 = Sunday.
    pub fn leading_blanks(&self) -> u32 {
        self.first_of_month.weekday().num_days_from_sunday()
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        let month = self.first_of_month.month();
        self.first_of_month
            .iter_days()
            .take_while(move |date| date.month() == month)
    }

    pub fn days_in_month(&self) -> u32 {
        self.days().count() as u32
    }

    pub fn grid(&self) -> Vec<CalendarCell> {
        let blanks = self.leading_blanks() as usize;
        let mut cells = Vec::with_capacity(blanks + 31);
        cells.extend(std::iter::repeat(CalendarCell::Blank).take(blanks));
        cells.extend(self.days().map(|date| {
            CalendarCell::Day(CalendarDay {
                date,
                is_past: date < self.today,
                is_selected: self.selected == Some(date),
            })
        }));
        cells
    }

    pub fn is_in_displayed_month(&self, date: NaiveDate) -> bool {
        date.year() == self.first_of_month.year() && date.month() == self.first_of_month.month()
    }

    pub fn is_selectable(&self, date: NaiveDate) -> bool {
        date >= self.today && self.is_in_displayed_month(date)
    }

    /// Selects `date`, replacing any previous selection.
    ///
    /// Returns `false` and leaves the selection untouched when the day is in the
    /// past or outside the displayed month.
    pub fn select(&mut self, date: NaiveDate) -> bool {
        if !self.is_selectable(date) {
            debug!("Ignoring selection of disabled day {}", date);
            return false;
        }
        self.selected = Some(date);
        true
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    pub fn next_month(&mut self) {
        self.shift_months(1);
    }

    pub fn previous_month(&mut self) {
        self.shift_months(-1);
    }

    fn shift_months(&mut self, offset: i32) {
        let months = Months::new(offset.unsigned_abs());
        let shifted = if offset >= 0 {
            self.first_of_month.checked_add_months(months)
        } else {
            self.first_of_month.checked_sub_months(months)
        };

        if let Some(first_of_month) = shifted {
            self.first_of_month = first_of_month;
        }
        self.selected = None;
        debug!("Calendar moved to {}", self.month_title());
    }

    /// Moves "today" forward; a selection that is now in the past is dropped.
    ///
    /// Returns `true` if the selection was dropped.
    pub fn set_today(&mut self, today: NaiveDate) -> bool {
        self.today = today;
        match self.selected {
            Some(selected) if selected < today => {
                self.selected = None;
                true
            }
            _ => false,
        }
    }

    /// e.g. `March 2025`.
    pub fn month_title(&self) -> String {
        self.first_of_month.format("%B %Y").to_string()
    }

    /// e.g. `Monday, March 10, 2025`.
    pub fn date_label(date: NaiveDate) -> String {
        date.format("%A, %B %-d, %Y").to_string()
    }
}
