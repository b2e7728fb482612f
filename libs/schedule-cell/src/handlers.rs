use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, error, info, warn};

use shared_config::AppConfig;
use shared_utils::token_store::TokenStore;

use crate::error::ScheduleError;
use crate::models::{
    AddSlotOutcome, CalendarCell, DaypartGroup, FetchedDay, Meridiem, ScheduleDeleteResponse,
    ScheduleSaveResponse, SlotTime, TimeSlot,
};
use crate::services::{
    calendar::{CalendarNavigator, WEEKDAY_LABELS},
    daypart::DaypartScheme,
    remote::{format_date, HttpScheduleApi, ScheduleApi},
    slots::SlotModel,
    synchronizer::{ApplyOutcome, SlotSynchronizer},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

/// The surface a session draws on. Implementations use interior mutability.
pub trait ScheduleUi: Send + Sync {
    fn render(&self, view: &ScheduleView);

    /// Save/delete/add controls. Disabled while a request is in flight.
    fn set_actions_enabled(&self, enabled: bool);

    fn confirm(&self, message: &str) -> bool;

    fn report(&self, message: &str, severity: Severity);
}

/// Everything needed to draw the calendar and slot editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleView {
    pub month_title: String,
    pub weekday_labels: [&'static str; 7],
    pub cells: Vec<CalendarCell>,
    pub selected_date: Option<NaiveDate>,
    pub selected_date_label: Option<String>,
    pub slot_sections: Vec<DaypartGroup<TimeSlot>>,
    pub selected_summary: Vec<DaypartGroup<SlotTime>>,
    pub actions_enabled: bool,
    pub loading: bool,
}

/// Identifies one day load; only the most recent ticket may apply its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    pub date: NaiveDate,
    generation: u64,
}

impl LoadTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded { date: NaiveDate, persisted: usize },
    /// Past day or outside the displayed month.
    Ignored,
    Stale,
    Failed(ScheduleError),
}

struct ActionsGuard {
    ui: Arc<dyn ScheduleUi>,
}

impl ActionsGuard {
    fn new(ui: Arc<dyn ScheduleUi>) -> Self {
        ui.set_actions_enabled(false);
        Self { ui }
    }
}

impl Drop for ActionsGuard {
    fn drop(&mut self) {
        self.ui.set_actions_enabled(true);
    }
}

// ==============================================================================
// SESSION
// ==============================================================================

/// One doctor's schedule editor: calendar, slot model and the remote sync.
pub struct ScheduleSession {
    navigator: CalendarNavigator,
    model: SlotModel,
    synchronizer: SlotSynchronizer,
    ui: Arc<dyn ScheduleUi>,
    generation: u64,
    loading: bool,
}

impl ScheduleSession {
    pub fn new(
        scheme: DaypartScheme,
        api: Arc<dyn ScheduleApi>,
        tokens: Arc<dyn TokenStore>,
        ui: Arc<dyn ScheduleUi>,
        today: NaiveDate,
    ) -> Self {
        Self {
            navigator: CalendarNavigator::new(today),
            model: SlotModel::new(scheme),
            synchronizer: SlotSynchronizer::new(api, tokens),
            ui,
            generation: 0,
            loading: false,
        }
    }

    /// HTTP-backed session starting on the local current date.
    pub fn from_config(config: &AppConfig, tokens: Arc<dyn TokenStore>, ui: Arc<dyn ScheduleUi>) -> Self {
        let today = chrono::Local::now().date_naive();
        debug!("Starting schedule session for {} against {}", today, config.schedule_api_url);

        Self::new(
            DaypartScheme::from_preset(config.daypart_preset),
            Arc::new(HttpScheduleApi::new(config)),
            tokens,
            ui,
            today,
        )
    }

    pub fn navigator(&self) -> &CalendarNavigator {
        &self.navigator
    }

    pub fn model(&self) -> &SlotModel {
        &self.model
    }

    pub fn synchronizer(&self) -> &SlotSynchronizer {
        &self.synchronizer
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn view(&self) -> ScheduleView {
        let selected_date = self.navigator.selected();

        ScheduleView {
            month_title: self.navigator.month_title(),
            weekday_labels: WEEKDAY_LABELS,
            cells: self.navigator.grid(),
            selected_date,
            selected_date_label: selected_date.map(CalendarNavigator::date_label),
            slot_sections: self.model.slots_by_daypart(),
            selected_summary: self.model.grouped_by_daypart(),
            actions_enabled: selected_date.is_some() && !self.loading,
            loading: self.loading,
        }
    }

    pub fn render(&self) {
        self.ui.render(&self.view());
    }

    // ------------------------------------------------------------------
    // Calendar
    // ------------------------------------------------------------------

    pub fn on_previous_month(&mut self) {
        self.navigator.previous_month();
        self.forget_selection();
        self.render();
    }

    pub fn on_next_month(&mut self) {
        self.navigator.next_month();
        self.forget_selection();
        self.render();
    }

    fn forget_selection(&mut self) {
        self.navigator.clear_selection();
        self.model.discard();
        // Any load still in flight belongs to the old selection.
        self.generation += 1;
        self.loading = false;
        self.ui.set_actions_enabled(false);
    }

    /// First half of a day selection: select, reset to defaults and hand out a ticket.
    ///
    /// Returns `None` when the day cannot be selected.
    pub fn begin_select_day(&mut self, date: NaiveDate) -> Option<LoadTicket> {
        if !self.navigator.select(date) {
            return None;
        }

        self.model.reset(date);
        self.generation += 1;
        self.loading = true;
        self.render();

        Some(LoadTicket {
            date,
            generation: self.generation,
        })
    }

    /// Second half of a day selection. Results for superseded tickets are dropped.
    pub fn complete_load(&mut self, ticket: LoadTicket, result: Result<FetchedDay, ScheduleError>) -> LoadOutcome {
        if ticket.generation != self.generation || self.navigator.selected() != Some(ticket.date) {
            warn!(
                "Ignoring schedule load for {} (generation {}, current {})",
                ticket.date, ticket.generation, self.generation
            );
            return LoadOutcome::Stale;
        }

        self.loading = false;
        let outcome = match result {
            Ok(fetched) => match self.synchronizer.apply_fetched(&mut self.model, fetched) {
                ApplyOutcome::Applied { merged } => {
                    debug!("Loaded {} saved slots for {}", merged, ticket.date);
                    LoadOutcome::Loaded {
                        date: ticket.date,
                        persisted: merged,
                    }
                }
                ApplyOutcome::Stale => LoadOutcome::Stale,
            },
            Err(e) => {
                self.report_error("Failed to load schedule", &e);
                LoadOutcome::Failed(e)
            }
        };

        self.render();
        outcome
    }

    pub async fn on_select_day(&mut self, date: NaiveDate) -> LoadOutcome {
        let Some(ticket) = self.begin_select_day(date) else {
            return LoadOutcome::Ignored;
        };

        let result = {
            let _guard = ActionsGuard::new(self.ui.clone());
            self.synchronizer.fetch_persisted(date).await
        };

        self.complete_load(ticket, result)
    }

    /// Moves "today" forward, dropping a selection that has become a past day.
    pub fn on_day_rollover(&mut self, today: NaiveDate) {
        if self.navigator.set_today(today) {
            info!("Selected day is now in the past, clearing selection");
            self.forget_selection();
            self.ui.report("The selected day has passed. Please choose another date.", Severity::Warning);
        }
        self.render();
    }

    // ------------------------------------------------------------------
    // Slots
    // ------------------------------------------------------------------

    /// Ignored while the selected day is still loading.
    pub fn on_toggle_slot(&mut self, time: SlotTime) -> Option<bool> {
        if self.loading {
            debug!("Ignoring toggle of {} while loading", time);
            return None;
        }

        let chosen = self.model.toggle(time);
        if chosen.is_none() {
            debug!("Toggle of unknown slot {}", time);
        }
        self.render();
        chosen
    }

    /// Adds a manually entered 12-hour time and selects it.
    pub fn on_add_time(&mut self, hour: u32, minute: u32, meridiem: &str) -> Result<AddSlotOutcome, ScheduleError> {
        let result = self.add_time(hour, minute, meridiem);

        match &result {
            Ok((time, outcome)) => {
                let (message, severity) = match outcome {
                    AddSlotOutcome::Created => (format!("Time slot {} added and selected.", time.label()), Severity::Success),
                    AddSlotOutcome::NowSelected => (
                        format!("Time slot {} already existed and has been selected.", time.label()),
                        Severity::Info,
                    ),
                    AddSlotOutcome::AlreadySelected => (
                        format!("Time slot {} already exists and is selected.", time.label()),
                        Severity::Info,
                    ),
                };
                self.ui.report(&message, severity);
            }
            Err(e) => self.report_error("Failed to add time slot", e),
        }

        self.render();
        result.map(|(_, outcome)| outcome)
    }

    fn add_time(&mut self, hour: u32, minute: u32, meridiem: &str) -> Result<(SlotTime, AddSlotOutcome), ScheduleError> {
        let date = self.model.date().ok_or(ScheduleError::NoDateSelected)?;
        self.ensure_idle(date)?;

        let meridiem: Meridiem = meridiem.parse()?;
        let time = SlotTime::from_12h(hour, minute, meridiem)?;
        let outcome = self.model.add_custom(time)?;
        Ok((time, outcome))
    }

    // ------------------------------------------------------------------
    // Remote actions
    // ------------------------------------------------------------------

    pub async fn on_save(&mut self) -> Result<ScheduleSaveResponse, ScheduleError> {
        let Some(date) = self.model.date() else {
            let err = ScheduleError::NoDateSelected;
            self.report_error("Cannot save schedule", &err);
            return Err(err);
        };

        if let Err(err) = self.ensure_idle(date) {
            self.report_error("Cannot save schedule", &err);
            return Err(err);
        }

        let result = {
            let _guard = ActionsGuard::new(self.ui.clone());
            self.synchronizer.save(&mut self.model).await
        };

        match &result {
            Ok(_) => self.ui.report(
                &format!("Schedule for {} saved successfully!", format_date(date)),
                Severity::Success,
            ),
            Err(e) => self.report_error("Failed to save schedule", e),
        }

        self.render();
        result
    }

    /// Deletes every slot of the selected day after the user confirms.
    ///
    /// `Ok(None)` means the user declined.
    pub async fn on_delete(&mut self) -> Result<Option<ScheduleDeleteResponse>, ScheduleError> {
        let Some(date) = self.model.date() else {
            let err = ScheduleError::NoDateSelected;
            self.report_error("Cannot delete schedule", &err);
            return Err(err);
        };

        if let Err(err) = self.ensure_idle(date) {
            self.report_error("Cannot delete schedule", &err);
            return Err(err);
        }

        if !self.synchronizer.has_credential() {
            let err = ScheduleError::Auth("No token found. Please log in again".to_string());
            self.report_error("Cannot delete schedule", &err);
            return Err(err);
        }

        let prompt = format!(
            "Are you sure you want to delete the entire schedule for {}?",
            CalendarNavigator::date_label(date)
        );
        if !self.ui.confirm(&prompt) {
            debug!("Deletion of {} cancelled", date);
            return Ok(None);
        }

        let result = {
            let _guard = ActionsGuard::new(self.ui.clone());
            self.synchronizer.delete_all(&mut self.model).await
        };

        match &result {
            Ok(response) => {
                let message = if response.message.is_empty() {
                    format!("Schedule for {} deleted successfully.", format_date(date))
                } else {
                    response.message.clone()
                };
                self.ui.report(&message, Severity::Success);
            }
            Err(e) => self.report_error("Failed to delete schedule", e),
        }

        self.render();
        result.map(Some)
    }

    /// Edits made before the fetched slots are merged would be saved over them.
    fn ensure_idle(&self, date: NaiveDate) -> Result<(), ScheduleError> {
        if self.loading {
            return Err(ScheduleError::Busy(date));
        }
        Ok(())
    }

    fn report_error(&self, context: &str, err: &ScheduleError) {
        if err.is_validation() {
            warn!("{}: {}", context, err);
        } else {
            error!("{}: {}", context, err);
        }
        self.ui.report(&err.to_string(), Severity::Error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use shared_models::auth::AccessToken;
    use shared_models::error::ApiError;
    use shared_utils::token_store::MemoryTokenStore;

    use crate::models::{RemoteSlot, ScheduleSaveRequest};

    #[derive(Default)]
    struct NullUi {
        views: Mutex<Vec<ScheduleView>>,
    }

    impl ScheduleUi for NullUi {
        fn render(&self, view: &ScheduleView) {
            self.views.lock().unwrap().push(view.clone());
        }
        fn set_actions_enabled(&self, _enabled: bool) {}
        fn confirm(&self, _message: &str) -> bool {
            true
        }
        fn report(&self, _message: &str, _severity: Severity) {}
    }

    struct EmptyApi;

    #[async_trait]
    impl ScheduleApi for EmptyApi {
        async fn fetch_day(&self, _date: NaiveDate, _token: &AccessToken) -> Result<Vec<RemoteSlot>, ApiError> {
            Ok(Vec::new())
        }

        async fn replace_day(
            &self,
            request: &ScheduleSaveRequest,
            _token: &AccessToken,
        ) -> Result<ScheduleSaveResponse, ApiError> {
            Ok(ScheduleSaveResponse {
                message: String::new(),
                slots_added: Some(request.slots.len() as u32),
            })
        }

        async fn delete_day(&self, _date: NaiveDate, _token: &AccessToken) -> Result<ScheduleDeleteResponse, ApiError> {
            Ok(ScheduleDeleteResponse { message: String::new() })
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
    }

    fn session(ui: Arc<NullUi>) -> ScheduleSession {
        let tokens = Arc::new(MemoryTokenStore::with_token(AccessToken::new("token").unwrap()));
        ScheduleSession::new(DaypartScheme::standard(), Arc::new(EmptyApi), tokens, ui, today())
    }

    #[test]
    fn test_initial_view_has_no_selection() {
        let session = session(Arc::new(NullUi::default()));
        let view = session.view();

        assert_eq!(view.month_title, "March 2025");
        assert_eq!(view.weekday_labels[0], "Sun");
        assert_eq!(view.selected_date, None);
        assert!(!view.actions_enabled);
        assert!(view.slot_sections.iter().all(|group| group.items.is_empty()));
    }

    #[test]
    fn test_begin_select_day_shows_defaults_while_loading() {
        let ui = Arc::new(NullUi::default());
        let mut session = session(ui.clone());

        let ticket = session.begin_select_day(today()).unwrap();
        assert_eq!(ticket.date, today());

        let views = ui.views.lock().unwrap();
        let view = views.last().unwrap();
        assert!(view.loading);
        assert!(!view.actions_enabled);
        assert_eq!(view.selected_date_label.as_deref(), Some("Monday, March 10, 2025"));
        assert_eq!(view.slot_sections.iter().map(|g| g.items.len()).sum::<usize>(), 30);
    }

    #[test]
    fn test_newer_ticket_supersedes_older() {
        let mut session = session(Arc::new(NullUi::default()));
        let tomorrow = today().succ_opt().unwrap();

        let first = session.begin_select_day(today()).unwrap();
        let second = session.begin_select_day(tomorrow).unwrap();
        assert!(second.generation() > first.generation());

        let fetched = FetchedDay { date: today(), times: vec!["09:00".parse().unwrap()] };
        assert_eq!(session.complete_load(first, Ok(fetched)), LoadOutcome::Stale);
        assert_eq!(session.model().selected_times().count(), 0);
        assert!(session.is_loading());
    }

    #[test]
    fn test_add_time_requires_selected_date() {
        let mut session = session(Arc::new(NullUi::default()));
        assert_eq!(session.on_add_time(9, 15, "AM"), Err(ScheduleError::NoDateSelected));
    }

    #[tokio::test]
    async fn test_add_time_rejects_bad_input() {
        let mut session = session(Arc::new(NullUi::default()));
        session.on_select_day(today()).await;

        assert!(session.on_add_time(13, 0, "PM").unwrap_err().is_validation());
        assert!(session.on_add_time(9, 60, "AM").unwrap_err().is_validation());
        assert!(session.on_add_time(9, 0, "XM").unwrap_err().is_validation());
        assert_eq!(session.model().slots().count(), 30);
    }

    #[tokio::test]
    async fn test_edits_rejected_while_loading() {
        let mut session = session(Arc::new(NullUi::default()));
        session.begin_select_day(today()).unwrap();

        assert_eq!(session.on_toggle_slot("09:00".parse().unwrap()), None);
        assert_eq!(session.on_add_time(9, 15, "AM"), Err(ScheduleError::Busy(today())));
        assert_eq!(session.on_save().await.unwrap_err(), ScheduleError::Busy(today()));
        assert_eq!(session.on_delete().await.unwrap_err(), ScheduleError::Busy(today()));
        assert_eq!(session.model().selected_times().count(), 0);
    }

    #[tokio::test]
    async fn test_month_navigation_discards_model() {
        let mut session = session(Arc::new(NullUi::default()));
        session.on_select_day(today()).await;
        session.on_toggle_slot("09:00".parse().unwrap());

        session.on_next_month();

        assert_eq!(session.model().date(), None);
        assert_eq!(session.view().month_title, "April 2025");
        assert_eq!(session.view().selected_date, None);
    }

    #[tokio::test]
    async fn test_rollover_past_selection() {
        let mut session = session(Arc::new(NullUi::default()));
        session.on_select_day(today()).await;

        session.on_day_rollover(today().succ_opt().unwrap());

        assert_eq!(session.navigator().selected(), None);
        assert_eq!(session.model().date(), None);
    }
}
