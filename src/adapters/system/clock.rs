use chrono::{DateTime, Utc};

use crate::ports::clock::Clock;

/// Wall-clock implementation of Clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
