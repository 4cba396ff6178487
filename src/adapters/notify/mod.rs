//! Notification adapters. Implement NotifierPort.

pub mod recording;
pub mod terminal;

pub use recording::RecordingNotifier;
pub use terminal::TerminalNotifier;
