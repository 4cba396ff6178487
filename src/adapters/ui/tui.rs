//! Implements InputPort. Inquire-based interactive client.
//!
//! Pick degree → year → batch (choices resolved live from the portal), view the
//! week, and run reminders in the foreground until Ctrl+C.

use crate::adapters::ui::week_view::render_week;
use crate::domain::catalog::{DEGREES, degree_label};
use crate::domain::{DomainError, Profile};
use crate::ports::{InputPort, OptionsPort, ReminderStatePort};
use crate::usecases::{ReminderService, ScheduleReader};
use async_trait::async_trait;
use indicatif::{ProgressBar, ProgressStyle};
use inquire::error::InquireError;
use inquire::ui::{Color, RenderConfig, Styled};
use inquire::{Confirm, Select, Text};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Applies the prompt theme for every inquire prompt that follows.
pub fn apply_theme() {
    let config = RenderConfig::default()
        .with_prompt_prefix(Styled::new("›").with_fg(Color::LightCyan))
        .with_highlighted_option_prefix(Styled::new("▸").with_fg(Color::LightGreen))
        .with_answered_prompt_prefix(Styled::new("✓").with_fg(Color::LightGreen));
    inquire::set_global_render_config(config);
}

fn input_err(e: InquireError) -> DomainError {
    DomainError::Input(e.to_string())
}

/// Esc and Ctrl+C on a prompt mean "back out", not failure.
fn is_cancel(e: &InquireError) -> bool {
    matches!(
        e,
        InquireError::OperationCanceled | InquireError::OperationInterrupted
    )
}

/// Runs `work` behind a spinner.
async fn with_spinner<T>(message: &str, work: impl Future<Output = T>) -> T {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(80));
    let out = work.await;
    spinner.finish_and_clear();
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuAction {
    ViewWeek,
    StartReminders,
    ToggleReminders,
    ClearHistory,
    ChangeCohort,
    Quit,
}

impl MenuAction {
    const ALL: [MenuAction; 6] = [
        MenuAction::ViewWeek,
        MenuAction::StartReminders,
        MenuAction::ToggleReminders,
        MenuAction::ClearHistory,
        MenuAction::ChangeCohort,
        MenuAction::Quit,
    ];
}

impl fmt::Display for MenuAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MenuAction::ViewWeek => "View this week",
            MenuAction::StartReminders => "Start class reminders",
            MenuAction::ToggleReminders => "Turn reminders on/off",
            MenuAction::ClearHistory => "Clear reminder history",
            MenuAction::ChangeCohort => "Change degree / year / batch",
            MenuAction::Quit => "Quit",
        })
    }
}

/// A degree choice shown as its label, carrying the portal value.
struct DegreeChoice {
    value: &'static str,
    label: &'static str,
}

impl fmt::Display for DegreeChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.label, self.value)
    }
}

/// TUI adapter. Inquire prompts.
pub struct TuiInputPort {
    options: Arc<dyn OptionsPort>,
    reader: ScheduleReader,
    reminders: Arc<ReminderService>,
    store: Arc<dyn ReminderStatePort>,
    lead_minutes: u32,
    profile: Mutex<Profile>,
}

impl TuiInputPort {
    pub fn new(
        options: Arc<dyn OptionsPort>,
        reader: ScheduleReader,
        reminders: Arc<ReminderService>,
        store: Arc<dyn ReminderStatePort>,
        lead_minutes: u32,
        profile: Profile,
    ) -> Self {
        Self {
            options,
            reader,
            reminders,
            store,
            lead_minutes,
            profile: Mutex::new(profile),
        }
    }

    /// Picks from portal-provided labels; falls back to free text when the portal has none.
    fn choose_label(what: &str, labels: Vec<String>) -> Result<String, InquireError> {
        if labels.is_empty() {
            println!("Could not load {what} choices from the portal.");
            return Text::new(&format!("Type your {what}:")).prompt();
        }
        Select::new(&format!("Select {what}:"), labels).prompt()
    }

    async fn pick_cohort(&self) -> Result<Profile, InquireError> {
        let current = self.profile.lock().await.clone();

        let choices: Vec<DegreeChoice> = DEGREES
            .iter()
            .map(|&(value, label)| DegreeChoice { value, label })
            .collect();
        let start = choices
            .iter()
            .position(|c| c.value == current.degree)
            .unwrap_or(0);
        let degree = Select::new("Select degree:", choices)
            .with_starting_cursor(start)
            .prompt()?
            .value
            .to_string();

        let years = match with_spinner("Loading years…", self.options.get_years(&degree)).await {
            Ok(years) => years,
            Err(e) => {
                warn!(degree = %degree, error = %e, "years unavailable");
                Vec::new()
            }
        };
        let year = Self::choose_label("year", years)?;

        let batches = match with_spinner(
            "Loading batches…",
            self.options.get_batches(&degree, Some(&year)),
        )
        .await
        {
            Ok(batches) => batches,
            Err(e) => {
                warn!(degree = %degree, year = %year, error = %e, "batches unavailable");
                Vec::new()
            }
        };
        let batch = Self::choose_label("batch", batches)?;

        let full_name = Text::new("Your name (optional):")
            .with_default(current.full_name.as_deref().unwrap_or(""))
            .prompt()?;
        let full_name = Some(full_name.trim().to_string()).filter(|n| !n.is_empty());

        let profile = Profile {
            degree,
            year,
            batch,
            full_name,
        };
        info!(
            degree = %degree_label(&profile.degree),
            year = %profile.year,
            batch = %profile.batch,
            "cohort selected"
        );
        *self.profile.lock().await = profile.clone();
        Ok(profile)
    }

    async fn view_week(&self, profile: &Profile) {
        let fetch = with_spinner("Fetching timetable…", self.reader.read(profile)).await;
        println!("{}", render_week(&fetch));
    }

    async fn start_reminders(&self, profile: &Profile) -> Result<(), DomainError> {
        let scope = profile.scope_key();
        let mut enabled = self.store.is_enabled(&scope).await?;
        if !enabled {
            enabled = Confirm::new("Reminders are off. Turn them on?")
                .with_default(true)
                .prompt()
                .map_err(input_err)?;
            self.store.set_enabled(&scope, enabled).await?;
        }

        let handle = self
            .reminders
            .schedule(profile.clone(), enabled, self.lead_minutes)
            .await;
        if !handle.is_armed() {
            println!("Reminders are off.");
            return Ok(());
        }
        println!(
            "Watching {} upcoming class(es), {} min ahead. Press Ctrl+C to stop.",
            handle.armed_timers(),
            self.lead_minutes
        );
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "ctrl_c listener failed");
        }
        handle.cancel();
        println!("\nReminders stopped.");
        Ok(())
    }

    async fn toggle_reminders(&self, profile: &Profile) -> Result<(), DomainError> {
        let scope = profile.scope_key();
        let enabled = !self.store.is_enabled(&scope).await?;
        self.store.set_enabled(&scope, enabled).await?;
        println!("Reminders are now {}.", if enabled { "on" } else { "off" });
        Ok(())
    }
}

#[async_trait]
impl InputPort for TuiInputPort {
    async fn run(&self) -> Result<(), DomainError> {
        let mut profile = self.profile.lock().await.clone();
        if !profile.is_complete() {
            profile = match self.pick_cohort().await {
                Ok(p) => p,
                Err(e) if is_cancel(&e) => return Ok(()),
                Err(e) => return Err(input_err(e)),
            };
        }

        loop {
            println!(
                "\n{} · {} · {}",
                degree_label(&profile.degree),
                profile.year,
                profile.batch
            );
            let action = match Select::new("What next?", MenuAction::ALL.to_vec()).prompt() {
                Ok(a) => a,
                Err(e) if is_cancel(&e) => return Ok(()),
                Err(e) => return Err(input_err(e)),
            };

            match action {
                MenuAction::ViewWeek => self.view_week(&profile).await,
                MenuAction::StartReminders => self.start_reminders(&profile).await?,
                MenuAction::ToggleReminders => self.toggle_reminders(&profile).await?,
                MenuAction::ClearHistory => {
                    self.store.clear_notified(&profile.scope_key()).await?;
                    println!("Reminder history cleared.");
                }
                MenuAction::ChangeCohort => match self.pick_cohort().await {
                    Ok(p) => profile = p,
                    Err(e) if is_cancel(&e) => {}
                    Err(e) => return Err(input_err(e)),
                },
                MenuAction::Quit => return Ok(()),
            }
        }
    }
}
