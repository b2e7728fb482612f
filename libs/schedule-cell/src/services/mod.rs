pub mod calendar;
pub mod daypart;
pub mod remote;
pub mod slots;
pub mod synchronizer;

pub use calendar::{CalendarNavigator, WEEKDAY_LABELS};
pub use daypart::{DaypartBoundaries, DaypartScheme};
pub use remote::{format_date, HttpScheduleApi, ScheduleApi};
pub use slots::{DaySlotSet, SlotModel};
pub use synchronizer::{ApplyOutcome, SlotSynchronizer};
