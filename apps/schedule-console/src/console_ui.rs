use std::fmt::Write as _;
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Datelike;

use schedule_cell::{CalendarCell, ScheduleUi, ScheduleView, Severity, TimeSlot};

/// Draws the session on stdout and asks for confirmation on stdin.
#[derive(Debug, Default)]
pub struct ConsoleUi {
    actions_enabled: AtomicBool,
}

impl ConsoleUi {
    pub fn actions_enabled(&self) -> bool {
        self.actions_enabled.load(Ordering::SeqCst)
    }
}

impl ScheduleUi for ConsoleUi {
    fn render(&self, view: &ScheduleView) {
        self.actions_enabled.store(view.actions_enabled, Ordering::SeqCst);
        println!("{}", render_view(view));
    }

    fn set_actions_enabled(&self, enabled: bool) {
        self.actions_enabled.store(enabled, Ordering::SeqCst);
    }

    fn confirm(&self, message: &str) -> bool {
        print!("{} [y/N] ", message);
        if io::stdout().flush().is_err() {
            return false;
        }

        let mut answer = String::new();
        match io::stdin().read_line(&mut answer) {
            Ok(_) => matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
            Err(_) => false,
        }
    }

    fn report(&self, message: &str, severity: Severity) {
        let tag = match severity {
            Severity::Info => "info",
            Severity::Success => "ok",
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        println!("[{}] {}", tag, message);
    }
}

/// `*` saved, `+` to be added, `-` to be removed.
fn slot_marker(slot: &TimeSlot) -> char {
    if slot.is_pending_addition() {
        '+'
    } else if slot.is_pending_removal() {
        '-'
    } else if slot.chosen {
        '*'
    } else {
        ' '
    }
}

pub fn render_view(view: &ScheduleView) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "{:^28}", view.month_title);
    for label in view.weekday_labels {
        let _ = write!(out, "{:>4}", label);
    }
    out.push('\n');

    for (index, cell) in view.cells.iter().enumerate() {
        match cell {
            CalendarCell::Blank => out.push_str("    "),
            CalendarCell::Day(day) if day.is_selected => {
                let _ = write!(out, " [{:>2}", day.date.day());
            }
            CalendarCell::Day(day) if day.is_past => {
                let _ = write!(out, "  {:>2}", ".");
            }
            CalendarCell::Day(day) => {
                let _ = write!(out, "  {:>2}", day.date.day());
            }
        }
        if index % 7 == 6 {
            out.push('\n');
        }
    }
    if view.cells.len() % 7 != 0 {
        out.push('\n');
    }

    let Some(label) = &view.selected_date_label else {
        out.push_str("\nSelect a day to edit its schedule.");
        return out;
    };

    let _ = writeln!(out, "\n{}{}", label, if view.loading { " (loading...)" } else { "" });
    for section in &view.slot_sections {
        if section.items.is_empty() {
            continue;
        }
        let _ = write!(out, "{:<10}", section.daypart.title());
        for slot in &section.items {
            let _ = write!(out, " {}{}", slot_marker(slot), slot.time);
        }
        out.push('\n');
    }

    if view.selected_summary.is_empty() {
        out.push_str("No slots selected.");
    } else {
        out.push_str("Selected:");
        for group in &view.selected_summary {
            let labels: Vec<String> = group.items.iter().map(|time| time.label()).collect();
            let _ = write!(out, "\n  {}: {}", group.daypart.title(), labels.join(", "));
        }
    }

    out
}
