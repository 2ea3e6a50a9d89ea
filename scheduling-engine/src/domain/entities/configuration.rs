use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use shared::{DayType, EmploymentFraction, RuleSeverity};

/// Configurable, severity-graded labor law rule. The parameter bag schema
/// is determined by `code` and interpreted only by the configuration loader.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LaborLawRule {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub category: String,
    pub severity: RuleSeverity,
    pub parameters: Option<Value>,
    pub description: Option<String>,
    pub active_from: Option<NaiveDate>,
    pub active_to: Option<NaiveDate>,
}

impl LaborLawRule {
    /// Active window intersects `[from, to]`; open bounds are open-ended.
    pub fn is_active(&self, from: NaiveDate, to: NaiveDate) -> bool {
        self.active_from.map_or(true, |start| start <= to)
            && self.active_to.map_or(true, |end| end >= from)
    }
}

/// Per-day-type, per-shift, per-role staffing target.
/// Invariant: `min_staff <= target_staff <= max_staff` (when max is set).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StaffingTemplate {
    pub id: i64,
    pub day_type: DayType,
    pub shift_id: i64,
    pub role_id: i64,
    pub min_staff: u32,
    pub target_staff: u32,
    pub max_staff: Option<u32>,
    pub effective_from: Option<NaiveDate>,
    pub effective_to: Option<NaiveDate>,
}

impl StaffingTemplate {
    pub fn is_effective(&self, date: NaiveDate) -> bool {
        self.effective_from.map_or(true, |start| start <= date)
            && self.effective_to.map_or(true, |end| end >= date)
    }
}

/// Named bundle of solver weights and overrides.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeneratorParameters {
    pub id: i64,
    pub scenario: String,
    pub weights: Map<String, Value>,
    pub max_consecutive_nights: Option<i32>,
    pub min_rest_hours_override: Option<i32>,
    pub last_updated_by: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Hard hour caps for one employment fraction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HourLimit {
    pub id: i64,
    pub employment_fraction: EmploymentFraction,
    pub max_daily_hours: Option<i32>,
    pub max_weekly_hours: Option<i32>,
    pub max_monthly_hours: Option<i32>,
    pub max_quarterly_hours: Option<i32>,
}
