//! Time source for date keys and timestamps.

use chrono::{Duration, Local, NaiveDate, NaiveDateTime};
use std::sync::{Arc, Mutex};

/// Date key format for field days.
pub const DATE_KEY_FORMAT: &str = "%Y-%m-%d";

/// Source of "now" for the engine.
pub trait Clock: Send {
    /// Local wall-clock time.
    fn now(&self) -> NaiveDateTime;

    /// Epoch milliseconds for record timestamps.
    fn now_ms(&self) -> i64 {
        self.now().and_utc().timestamp_millis()
    }

    fn today(&self) -> NaiveDate {
        self.now().date()
    }
}

/// Wall clock in the host's local time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }

    fn now_ms(&self) -> i64 {
        Local::now().timestamp_millis()
    }
}

/// Settable clock; clones share the same instant.
#[derive(Debug, Clone)]
pub struct FixedClock {
    instant: Arc<Mutex<NaiveDateTime>>,
}

impl FixedClock {
    pub fn new(instant: NaiveDateTime) -> Self {
        Self {
            instant: Arc::new(Mutex::new(instant)),
        }
    }

    /// Clock at 09:00 on `date`.
    pub fn at_date(date: NaiveDate) -> Self {
        Self::new(date.and_hms_opt(9, 0, 0).unwrap_or_default())
    }

    pub fn set(&self, instant: NaiveDateTime) {
        if let Ok(mut guard) = self.instant.lock() {
            *guard = instant;
        }
    }

    pub fn advance_days(&self, days: i64) {
        self.advance(Duration::days(days));
    }

    pub fn advance_minutes(&self, minutes: i64) {
        self.advance(Duration::minutes(minutes));
    }

    fn advance(&self, by: Duration) {
        if let Ok(mut guard) = self.instant.lock() {
            *guard += by;
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.instant
            .lock()
            .map(|guard| *guard)
            .unwrap_or_default()
    }
}

pub fn date_key(date: NaiveDate) -> String {
    date.format(DATE_KEY_FORMAT).to_string()
}

pub fn parse_date_key(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_KEY_FORMAT).ok()
}
