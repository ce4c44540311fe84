use std::fmt::{self, Debug};

use chrono::{DateTime, Duration, NaiveTime, Timelike as _, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::LedgerError;

/// A scheduling position: a date truncated to midnight plus a wall-clock
/// `HH:MM` string. Conflict checks are exact equality on both fields.
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Slot {
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    date: DateTime<Utc>,
    time: String,
}

impl Slot {
    pub fn new(date: DateTime<Utc>, time: &str) -> Result<Slot, LedgerError> {
        if NaiveTime::parse_from_str(time, "%H:%M").is_err() {
            return Err(LedgerError::InvalidInput(format!(
                "invalid time:{}",
                time
            )));
        }
        let date = date
            .with_time(NaiveTime::MIN)
            .single()
            .ok_or_else(|| LedgerError::InvalidInput(format!("invalid date:{}", date)))?;
        Ok(Slot { date, time: time.to_owned() })
    }

    pub fn date(&self) -> DateTime<Utc> {
        self.date
    }

    pub fn time(&self) -> &str {
        &self.time
    }

    pub fn start_at(&self) -> DateTime<Utc> {
        // The time string is validated on construction.
        let time = NaiveTime::parse_from_str(&self.time, "%H:%M").unwrap_or(NaiveTime::MIN);
        self.date + Duration::minutes(time.hour() as i64 * 60 + time.minute() as i64)
    }

    pub fn end_at(&self, duration_min: u32) -> DateTime<Utc> {
        self.start_at() + Duration::minutes(duration_min as i64)
    }

    pub fn is_past(&self, now: DateTime<Utc>) -> bool {
        self.start_at() < now
    }
}

impl Debug for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} {}]", self.date.format("%d.%m.%Y"), self.time)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone as _;

    use super::*;

    fn date(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).single().unwrap()
    }

    #[test]
    fn test_rejects_malformed_time() {
        assert!(Slot::new(date(2025, 1, 10), "25:00").is_err());
        assert!(Slot::new(date(2025, 1, 10), "18:60").is_err());
        assert!(Slot::new(date(2025, 1, 10), "6 pm").is_err());
        assert!(Slot::new(date(2025, 1, 10), "18:00").is_ok());
    }

    #[test]
    fn test_date_truncated_to_midnight() {
        let with_time = Utc
            .with_ymd_and_hms(2025, 1, 10, 9, 30, 0)
            .single()
            .unwrap();
        let slot = Slot::new(with_time, "18:00").unwrap();
        assert_eq!(slot.date(), date(2025, 1, 10));
    }

    #[test]
    fn test_same_slot_is_equal() {
        let a = Slot::new(date(2025, 1, 10), "10:00").unwrap();
        let b = Slot::new(
            Utc.with_ymd_and_hms(2025, 1, 10, 23, 0, 0).single().unwrap(),
            "10:00",
        )
        .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_different_time_is_not_equal() {
        let a = Slot::new(date(2025, 1, 10), "10:00").unwrap();
        let b = Slot::new(date(2025, 1, 10), "10:30").unwrap();
        let c = Slot::new(date(2025, 1, 11), "10:00").unwrap();
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_start_and_end() {
        let slot = Slot::new(date(2025, 1, 10), "18:00").unwrap();
        assert_eq!(
            slot.start_at(),
            Utc.with_ymd_and_hms(2025, 1, 10, 18, 0, 0).single().unwrap()
        );
        assert_eq!(
            slot.end_at(60),
            Utc.with_ymd_and_hms(2025, 1, 10, 19, 0, 0).single().unwrap()
        );
    }

    #[test]
    fn test_is_past() {
        let slot = Slot::new(date(2025, 1, 10), "18:00").unwrap();
        let before = Utc.with_ymd_and_hms(2025, 1, 10, 17, 59, 0).single().unwrap();
        let after = Utc.with_ymd_and_hms(2025, 1, 10, 18, 1, 0).single().unwrap();
        assert!(!slot.is_past(before));
        assert!(slot.is_past(after));
    }
}
