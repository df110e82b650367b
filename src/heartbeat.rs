// src/heartbeat.rs
//! Once-a-day greeting gate. Pure: the caller passes local wall-clock time.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

#[derive(Debug, Clone)]
pub struct HeartbeatScheduler {
    last_greeted_day: NaiveDate,
    greeted_today: bool,
}

impl HeartbeatScheduler {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            last_greeted_day: today,
            greeted_today: false,
        }
    }

    /// Returns true at most once per calendar day, on the first check at or after `at`.
    pub fn is_due(&mut self, now: NaiveDateTime, at: NaiveTime) -> bool {
        let today = now.date();
        if today > self.last_greeted_day {
            self.last_greeted_day = today;
            self.greeted_today = false;
        }

        if !self.greeted_today && now.time() >= at {
            self.greeted_today = true;
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(day: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, day)
            .and_then(|d| d.and_hms_opt(h, m, 0))
            .unwrap()
    }

    #[test]
    fn due_once_per_day_after_threshold() {
        let nine = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
        let mut hb = HeartbeatScheduler::new(at(10, 0, 0).date());

        assert!(!hb.is_due(at(10, 8, 59), nine));
        assert!(hb.is_due(at(10, 9, 1), nine));
        assert!(!hb.is_due(at(10, 9, 30), nine));
        assert!(hb.is_due(at(11, 9, 1), nine));
    }

    #[test]
    fn threshold_is_inclusive() {
        let nine = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
        let mut hb = HeartbeatScheduler::new(at(10, 0, 0).date());
        assert!(hb.is_due(at(10, 9, 0), nine));
    }

    #[test]
    fn missed_day_is_not_made_up() {
        let nine = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
        let mut hb = HeartbeatScheduler::new(at(10, 0, 0).date());
        assert!(hb.is_due(at(10, 10, 0), nine));
        // next check two days later, before the threshold
        assert!(!hb.is_due(at(12, 8, 0), nine));
        assert!(hb.is_due(at(12, 9, 0), nine));
    }
}
