use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::error::ScheduleError;
use crate::models::{AddSlotOutcome, Daypart, DaypartGroup, SlotState, SlotTime, TimeSlot};
use crate::services::daypart::DaypartScheme;

/// Slots for the one selected date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaySlotSet {
    pub date: NaiveDate,
    slots: BTreeMap<SlotTime, SlotState>,
}

impl DaySlotSet {
    fn seeded(date: NaiveDate, vocabulary: &[SlotTime]) -> Self {
        Self {
            date,
            slots: vocabulary
                .iter()
                .map(|time| (*time, SlotState::default()))
                .collect(),
        }
    }
}

/// The per-day slot state behind the schedule editor.
///
/// Holds at most one [`DaySlotSet`]; selecting another date replaces it wholesale.
#[derive(Debug, Clone)]
pub struct SlotModel {
    scheme: DaypartScheme,
    day: Option<DaySlotSet>,
}

impl SlotModel {
    pub fn new(scheme: DaypartScheme) -> Self {
        Self { scheme, day: None }
    }

    pub fn scheme(&self) -> &DaypartScheme {
        &self.scheme
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.day.as_ref().map(|day| day.date)
    }

    pub fn day(&self) -> Option<&DaySlotSet> {
        self.day.as_ref()
    }

    /// Replaces the slot set with the default vocabulary for `date`, nothing chosen.
    pub fn reset(&mut self, date: NaiveDate) {
        debug!("Resetting slots for {} ({} defaults)", date, self.scheme.vocabulary().len());
        self.day = Some(DaySlotSet::seeded(date, self.scheme.vocabulary()));
    }

    /// Drops the slot set entirely (no date selected).
    pub fn discard(&mut self) {
        self.day = None;
    }

    /// Marks every given time as saved and chosen, adding times outside the vocabulary.
    ///
    /// Returns the number of times merged.
    pub fn merge_persisted<I>(&mut self, times: I) -> usize
    where
        I: IntoIterator<Item = SlotTime>,
    {
        let Some(day) = self.day.as_mut() else {
            warn!("merge_persisted called with no date selected");
            return 0;
        };

        let mut merged = 0;
        for time in times {
            day.slots.insert(time, SlotState { persisted: true, chosen: true });
            merged += 1;
        }
        merged
    }

    /// Flips `chosen` and returns the new value, or `None` if the slot does not exist.
    pub fn toggle(&mut self, time: SlotTime) -> Option<bool> {
        let state = self.day.as_mut()?.slots.get_mut(&time)?;
        state.chosen = !state.chosen;
        Some(state.chosen)
    }

    pub fn add_custom(&mut self, time: SlotTime) -> Result<AddSlotOutcome, ScheduleError> {
        let day = self.day.as_mut().ok_or(ScheduleError::NoDateSelected)?;

        match day.slots.get_mut(&time) {
            None => {
                day.slots.insert(time, SlotState { persisted: false, chosen: true });
                debug!("Added custom slot {} on {}", time, day.date);
                Ok(AddSlotOutcome::Created)
            }
            Some(state) if !state.chosen => {
                state.chosen = true;
                Ok(AddSlotOutcome::NowSelected)
            }
            Some(_) => Ok(AddSlotOutcome::AlreadySelected),
        }
    }

    pub fn slot(&self, time: SlotTime) -> Option<TimeSlot> {
        self.day
            .as_ref()?
            .slots
            .get(&time)
            .map(|state| TimeSlot::new(time, *state))
    }

    /// Every slot of the selected day in ascending time order.
    pub fn slots(&self) -> impl Iterator<Item = TimeSlot> + '_ {
        self.day
            .iter()
            .flat_map(|day| day.slots.iter())
            .map(|(time, state)| TimeSlot::new(*time, *state))
    }

    /// Chosen times in ascending order.
    pub fn selected_times(&self) -> impl Iterator<Item = SlotTime> + '_ {
        self.slots().filter(|slot| slot.chosen).map(|slot| slot.time)
    }

    pub fn has_persisted(&self) -> bool {
        self.slots().any(|slot| slot.persisted)
    }

    /// Chosen times split by day-part; day-parts with nothing chosen are left out.
    pub fn grouped_by_daypart(&self) -> Vec<DaypartGroup<SlotTime>> {
        let mut groups = self.group(self.selected_times(), |time| *time);
        groups.retain(|group| !group.items.is_empty());
        groups
    }

    /// All slots split by day-part, one group per day-part even when empty.
    pub fn slots_by_daypart(&self) -> Vec<DaypartGroup<TimeSlot>> {
        self.group(self.slots(), |slot| slot.time)
    }

    fn group<T, I, F>(&self, items: I, time_of: F) -> Vec<DaypartGroup<T>>
    where
        I: Iterator<Item = T>,
        F: Fn(&T) -> SlotTime,
    {
        let mut groups: Vec<DaypartGroup<T>> = Daypart::ALL
            .iter()
            .map(|daypart| DaypartGroup { daypart: *daypart, items: Vec::new() })
            .collect();

        for item in items {
            let daypart = self.scheme.daypart_for(time_of(&item));
            if let Some(group) = groups.iter_mut().find(|group| group.daypart == daypart) {
                group.items.push(item);
            }
        }
        groups
    }

    /// After a successful save: chosen slots are now saved, everything else is not.
    pub fn mark_saved(&mut self) {
        if let Some(day) = self.day.as_mut() {
            for state in day.slots.values_mut() {
                state.persisted = state.chosen;
            }
        }
    }

    /// After a successful delete: back to the unsaved defaults for the same date.
    pub fn clear(&mut self) {
        if let Some(date) = self.date() {
            self.reset(date);
        }
    }
}

impl Default for SlotModel {
    fn default() -> Self {
        Self::new(DaypartScheme::default())
    }
}
