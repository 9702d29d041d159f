//! Time sources for entry timestamps and rotation decisions.

use std::sync::{Arc, Mutex};

use once_cell::sync::Lazy;
use time::{Duration, OffsetDateTime, UtcOffset};

// Resolved once: `time` refuses to read the local offset once other threads
// may be running, so later lookups would silently degrade to UTC anyway.
static LOCAL_OFFSET: Lazy<UtcOffset> =
    Lazy::new(|| UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC));

/// Source of "now" for a logger.
pub trait Clock: Send + Sync + 'static {
    /// Current time. Calendar decisions use this value's own offset.
    fn now(&self) -> OffsetDateTime;
}

/// Wall clock in the local offset (UTC when the offset cannot be determined).
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    offset: UtcOffset,
}

impl SystemClock {
    /// Clock reporting local time.
    ///
    /// The local offset is read once per process. After a daylight saving
    /// change, calendar boundaries stay an hour off until the process restarts.
    pub fn local() -> Self {
        Self {
            offset: *LOCAL_OFFSET,
        }
    }

    /// Clock reporting time in a fixed offset.
    pub fn with_offset(offset: UtcOffset) -> Self {
        Self { offset }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::local()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc().to_offset(self.offset)
    }
}

/// A clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<OffsetDateTime>>,
}

impl ManualClock {
    pub fn new(start: OffsetDateTime) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    pub fn set(&self, now: OffsetDateTime) {
        *self.lock() = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.lock();
        *now += by;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, OffsetDateTime> {
        // The guarded value is a plain timestamp; a poisoned lock still holds a valid one.
        self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> OffsetDateTime {
        *self.lock()
    }
}
