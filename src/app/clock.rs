use std::sync::Mutex;

use chrono::{DateTime, Local, NaiveDate, NaiveTime, Utc};

/// Source of "today" for query windows and the minute tick, and of the
/// instants recorded in refresh metadata.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }

    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock pinned to a given day; `set` moves it. `now` is midnight UTC of
/// that day.
#[derive(Debug)]
pub struct FixedClock {
    today: Mutex<NaiveDate>,
}

impl FixedClock {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            today: Mutex::new(today),
        }
    }

    pub fn set(&self, today: NaiveDate) {
        let mut guard = self
            .today
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        *guard = today;
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        *self
            .today
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn now(&self) -> DateTime<Utc> {
        self.today().and_time(NaiveTime::MIN).and_utc()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_moves_only_when_set() {
        let start = NaiveDate::from_ymd_opt(2024, 6, 1).expect("valid date");
        let clock = FixedClock::new(start);
        assert_eq!(clock.today(), start);

        let next = start.succ_opt().expect("next day");
        clock.set(next);
        assert_eq!(clock.today(), next);
        assert_eq!(clock.now().date_naive(), next);
        assert_eq!(clock.now().timestamp() % 86_400, 0);
    }
}
