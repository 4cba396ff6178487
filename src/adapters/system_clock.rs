//! Implements Clock with the host's local time zone.

use crate::ports::Clock;
use chrono::{Local, NaiveDateTime};

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}
