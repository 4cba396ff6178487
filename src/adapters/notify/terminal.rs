//! Notification primitive for the CLI: a highlighted line on stdout.

use crate::domain::{DomainError, Notification};
use crate::ports::NotifierPort;
use crossterm::ExecutableCommand;
use crossterm::style::{Attribute, Color, Print, ResetColor, SetAttribute, SetForegroundColor};
use std::io::{Write, stdout};
use tracing::info;

/// Bell character; most terminals turn it into a visual or audible alert.
const BELL: &str = "\x07";

#[derive(Default)]
pub struct TerminalNotifier;

impl TerminalNotifier {
    pub fn new() -> Self {
        Self
    }

    fn render(notification: &Notification) -> std::io::Result<()> {
        let mut out = stdout();
        out.execute(Print(BELL))?;
        out.execute(SetForegroundColor(Color::Cyan))?;
        out.execute(SetAttribute(Attribute::Bold))?;
        out.execute(Print(format!("\r\n🔔 {}\r\n", notification.title)))?;
        out.execute(SetAttribute(Attribute::Reset))?;
        out.execute(ResetColor)?;
        out.execute(Print(format!("   {}\r\n", notification.body)))?;
        out.flush()
    }
}

#[async_trait::async_trait]
impl NotifierPort for TerminalNotifier {
    async fn show(&self, notification: &Notification) -> Result<(), DomainError> {
        info!(
            title = %notification.title,
            tag = notification.tag.as_deref().unwrap_or(""),
            "notification"
        );
        Self::render(notification).map_err(|e| DomainError::Notify(e.to_string()))
    }
}
