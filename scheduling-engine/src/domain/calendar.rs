use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Weekday};
use shared::DayType;

/// Number of days in the given month, or `None` for an invalid year/month.
pub fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((next - first).num_days() as u32)
}

/// Inclusive `(first, last)` day of the month.
pub fn month_span(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let last = NaiveDate::from_ymd_opt(year, month, days_in_month(year, month)?)?;
    Some((first, last))
}

/// Zero-padded `YYYY-MM` month key.
pub fn month_key(year: i32, month: u32) -> String {
    format!("{year:04}-{month:02}")
}

/// Parse a `YYYY-MM` month key back into `(year, month)`.
pub fn parse_month_key(key: &str) -> Option<(i32, u32)> {
    let (year, month) = key.split_once('-')?;
    let year: i32 = year.parse().ok()?;
    let month: u32 = month.parse().ok()?;
    month_span(year, month)?;
    Some((year, month))
}

/// Classify a date for staffing-template lookup.
pub fn day_type_for(date: NaiveDate, is_holiday: bool) -> DayType {
    if is_holiday {
        DayType::Holiday
    } else if matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
        DayType::Weekend
    } else {
        DayType::Weekday
    }
}

/// Rest between a shift ending at `end` on one day and a shift starting at
/// `start` on the following day, in minutes. Normalised to distinct calendar
/// days: `24h + start - end`.
pub fn overnight_rest_minutes(end: NaiveTime, start: NaiveTime) -> i64 {
    Duration::days(1).num_minutes() + minutes_from_midnight(start) - minutes_from_midnight(end)
}

fn minutes_from_midnight(t: NaiveTime) -> i64 {
    use chrono::Timelike;
    t.num_seconds_from_midnight() as i64 / 60
}
