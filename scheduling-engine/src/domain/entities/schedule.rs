use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use shared::ScheduleStatus;

/// Planned output for one `YYYY-MM` month.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MonthlySchedule {
    pub id: i64,
    pub month_key: String,
    pub status: ScheduleStatus,
    pub created_at: DateTime<Utc>,
}

/// One (employee, date, shift) assignment belonging to a monthly schedule.
///
/// Stores ids only; employee/shift structures are resolved through the
/// arenas at the call site. The `(schedule_id, employee_id, date, shift_id)`
/// tuple is unique within a schedule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScheduleEntry {
    pub id: i64,
    pub schedule_id: i64,
    pub employee_id: i64,
    pub shift_id: i64,
    pub date: NaiveDate,
}
