use chrono::{DateTime, Duration, FixedOffset, Local, NaiveDate, Utc};
use std::sync::{Mutex, PoisonError};

/// Maps instants onto the calendar days of a time zone.
///
/// Each instant is placed using the offset in force at that instant, so a
/// completion recorded before a daylight saving change keeps its own day.
pub trait Calendar {
    fn local_day(&self, instant: DateTime<Utc>) -> NaiveDate;
}

impl Calendar for Local {
    fn local_day(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(self).date_naive()
    }
}

impl Calendar for FixedOffset {
    fn local_day(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(self).date_naive()
    }
}

impl Calendar for Utc {
    fn local_day(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.date_naive()
    }
}

/// Source of "now" for services, together with the calendar that decides
/// where days begin for streak tracking.
pub trait Clock: Calendar + Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    fn today(&self) -> NaiveDate {
        self.local_day(self.now())
    }
}

/// Wall clock in the machine's local time zone
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Calendar for SystemClock {
    fn local_day(&self, instant: DateTime<Utc>) -> NaiveDate {
        Local.local_day(instant)
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually driven clock
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
    zone: Box<dyn Calendar + Send + Sync>,
}

impl FixedClock {
    /// Clock stopped at `now`, with days following `now`'s fixed offset
    pub fn new(now: DateTime<FixedOffset>) -> Self {
        let offset = *now.offset();
        Self::with_calendar(now.with_timezone(&Utc), offset)
    }

    /// Clock stopped at `now`, with days following `zone`
    pub fn with_calendar<Z>(now: DateTime<Utc>, zone: Z) -> Self
    where
        Z: Calendar + Send + Sync + 'static,
    {
        Self {
            now: Mutex::new(now),
            zone: Box::new(zone),
        }
    }

    pub fn set<Tz: chrono::TimeZone>(&self, now: DateTime<Tz>) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = now.with_timezone(&Utc);
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now = *now + by;
    }
}

impl Calendar for FixedClock {
    fn local_day(&self, instant: DateTime<Utc>) -> NaiveDate {
        self.zone.local_day(instant)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
