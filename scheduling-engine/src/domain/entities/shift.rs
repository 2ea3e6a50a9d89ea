use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Labeled time window within a day with a per-role staffing requirement.
///
/// `ends_at <= starts_at` means the shift crosses midnight.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Shift {
    pub id: i64,
    pub name: String,
    pub starts_at: NaiveTime,
    pub ends_at: NaiveTime,
    /// role name -> required head count
    #[serde(default)]
    pub required_staffing: BTreeMap<String, u32>,
}

impl Shift {
    /// Shift length in minutes, wrapping midnight when `ends_at <= starts_at`.
    pub fn duration_minutes(&self) -> i64 {
        let start = self.starts_at.num_seconds_from_midnight() as i64 / 60;
        let end = self.ends_at.num_seconds_from_midnight() as i64 / 60;
        if end > start {
            end - start
        } else {
            24 * 60 - start + end
        }
    }

    /// Shift length in tenths of an hour, truncated. Keeps solver
    /// coefficients integral.
    pub fn duration_tenth_hours(&self) -> i64 {
        self.duration_minutes() * 10 / 60
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shift(start: (u32, u32), end: (u32, u32)) -> Shift {
        Shift {
            id: 1,
            name: "Poranna".to_string(),
            starts_at: NaiveTime::from_hms_opt(start.0, start.1, 0).unwrap(),
            ends_at: NaiveTime::from_hms_opt(end.0, end.1, 0).unwrap(),
            required_staffing: BTreeMap::new(),
        }
    }

    #[test]
    fn test_duration_day_shift() {
        assert_eq!(shift((8, 0), (16, 0)).duration_minutes(), 8 * 60);
        assert_eq!(shift((8, 0), (16, 0)).duration_tenth_hours(), 80);
    }

    #[test]
    fn test_duration_crosses_midnight() {
        assert_eq!(shift((22, 0), (6, 0)).duration_minutes(), 8 * 60);
        // end == start counts as a full day
        assert_eq!(shift((8, 0), (8, 0)).duration_minutes(), 24 * 60);
    }

    #[test]
    fn test_duration_tenths_truncate() {
        assert_eq!(shift((8, 5), (16, 0)).duration_tenth_hours(), 79);
    }
}
