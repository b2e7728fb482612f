use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use dotenv::dotenv;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod console_ui;

use commands::{Command, CommandParser, HELP};
use console_ui::ConsoleUi;

use schedule_cell::{LoadOutcome, ScheduleError, ScheduleSession, ScheduleUi, Severity};
use shared_config::AppConfig;
use shared_models::auth::AccessToken;
use shared_utils::token_store::{FileTokenStore, MemoryTokenStore, TokenStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Loading Env Vars
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    info!("Starting Amae Clinic schedule console");

    // Load configuration
    let config = AppConfig::from_env();
    if !config.is_configured() {
        warn!("Schedule API URL '{}' is not usable, requests will fail", config.schedule_api_url);
    }

    let tokens = token_store(&config)?;
    let ui = Arc::new(ConsoleUi::default());
    let mut session = ScheduleSession::from_config(&config, tokens.clone(), ui.clone());
    let parser = CommandParser::new()?;

    println!("{}", HELP);
    session.render();

    let mut today = Local::now().date_naive();
    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if io::stdin().read_line(&mut line)? == 0 {
            break;
        }
        if line.trim().is_empty() {
            continue;
        }

        let now = Local::now().date_naive();
        if now != today {
            today = now;
            session.on_day_rollover(today);
        }

        match parser.parse(&line) {
            Ok(Command::Quit) => break,
            Ok(command) => run(&mut session, tokens.as_ref(), ui.as_ref(), command).await,
            Err(e) => ui.report(&e.to_string(), Severity::Warning),
        }
    }

    info!("Schedule console stopped");
    Ok(())
}

/// File-backed when `SCHEDULE_TOKEN_PATH` is set, seeded from `SCHEDULE_ACCESS_TOKEN`.
fn token_store(config: &AppConfig) -> Result<Arc<dyn TokenStore>> {
    let store: Arc<dyn TokenStore> = match &config.token_path {
        Some(path) => Arc::new(FileTokenStore::new(path)),
        None => Arc::new(MemoryTokenStore::new()),
    };

    if let Some(token) = config.access_token.clone().and_then(AccessToken::new) {
        store
            .set_token(token)
            .context("Failed to store SCHEDULE_ACCESS_TOKEN")?;
    }

    Ok(store)
}

/// Commands that edit or send the selected day.
fn needs_actions(command: &Command) -> bool {
    matches!(
        command,
        Command::Toggle(_) | Command::Add { .. } | Command::Save | Command::Delete
    )
}

fn login_hint(err: &ScheduleError) -> Option<&'static str> {
    err.is_auth().then_some("Use 'login <token>' to sign in again.")
}

fn hint_login(ui: &ConsoleUi, err: &ScheduleError) {
    if let Some(hint) = login_hint(err) {
        ui.report(hint, Severity::Info);
    }
}

async fn run(session: &mut ScheduleSession, tokens: &dyn TokenStore, ui: &ConsoleUi, command: Command) {
    if needs_actions(&command) && !ui.actions_enabled() {
        let message = if session.is_loading() {
            "Please wait until the selected day has finished loading."
        } else {
            "Select an available day first."
        };
        ui.report(message, Severity::Warning);
        return;
    }

    match command {
        Command::PreviousMonth => session.on_previous_month(),
        Command::NextMonth => session.on_next_month(),
        Command::Select(day) => {
            let navigator = session.navigator();
            match NaiveDate::from_ymd_opt(navigator.year(), navigator.month() + 1, day) {
                Some(date) => {
                    if let LoadOutcome::Failed(err) = session.on_select_day(date).await {
                        hint_login(ui, &err);
                    }
                }
                None => ui.report(&format!("{} is not a day of {}", day, navigator.month_title()), Severity::Warning),
            }
        }
        Command::Toggle(time) => {
            if session.on_toggle_slot(time).is_none() {
                ui.report(&format!("No slot at {} on the selected day", time), Severity::Warning);
            }
        }
        // Outcomes and failures are reported by the session itself.
        Command::Add { hour, minute, meridiem } => {
            if let Err(err) = session.on_add_time(hour, minute, &meridiem) {
                hint_login(ui, &err);
            }
        }
        Command::Save => {
            if let Err(err) = session.on_save().await {
                hint_login(ui, &err);
            }
        }
        Command::Delete => {
            if let Err(err) = session.on_delete().await {
                hint_login(ui, &err);
            }
        }
        Command::Login(raw) => match AccessToken::new(raw) {
            Some(token) => match tokens.set_token(token) {
                Ok(()) => ui.report("Token stored.", Severity::Success),
                Err(e) => ui.report(&format!("Failed to store token: {}", e), Severity::Error),
            },
            None => ui.report("Token must not be empty", Severity::Warning),
        },
        Command::Logout => match tokens.clear_token() {
            Ok(()) => ui.report("Logged out.", Severity::Info),
            Err(e) => ui.report(&format!("Failed to clear token: {}", e), Severity::Error),
        },
        Command::Show => session.render(),
        Command::Help => println!("{}", HELP),
        Command::Quit => {}
    }
}
