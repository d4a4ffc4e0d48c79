//! Wall-clock source for routing dates and line timestamps.

use chrono::{DateTime, Duration, FixedOffset, Local, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Which calendar a logger uses for dates and timestamps.
///
/// Chosen once when the logger is built; it never changes afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeZoneMode {
    #[default]
    Local,
    Utc,
}

/// Source of "now" for the writer.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<FixedOffset>;
}

/// Reads the system clock in the configured time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock {
    mode: TimeZoneMode,
}

impl SystemClock {
    pub fn new(mode: TimeZoneMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> TimeZoneMode {
        self.mode
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        match self.mode {
            TimeZoneMode::Local => Local::now().fixed_offset(),
            TimeZoneMode::Utc => Utc::now().fixed_offset(),
        }
    }
}

/// Clock that only moves when told to. Useful for replaying events and for
/// exercising date boundaries.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<FixedOffset>>,
}

impl ManualClock {
    pub fn new(now: DateTime<FixedOffset>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: DateTime<FixedOffset>) {
        *self.now.lock() = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<FixedOffset> {
        *self.now.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utc_clock_has_zero_offset() {
        let now = SystemClock::new(TimeZoneMode::Utc).now();
        assert_eq!(now.offset().local_minus_utc(), 0);
    }

    #[test]
    fn test_manual_clock_advances() {
        use chrono::TimeZone;

        let start = FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2024, 1, 15, 23, 59, 59)
            .unwrap();
        let clock = ManualClock::new(start);
        assert_eq!(clock.now(), start);

        clock.advance(Duration::seconds(2));
        assert_eq!(clock.now().date_naive().to_string(), "2024-01-16");
    }

    #[test]
    fn test_default_mode_is_local() {
        assert_eq!(SystemClock::default().mode(), TimeZoneMode::Local);
    }
}
