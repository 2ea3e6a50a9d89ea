use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use shared::EmploymentFraction;

/// Job function gating eligibility and expressing staffing requirements.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Role {
    pub id: i64,
    pub name: String,
    pub min_staff: Option<u32>,
    pub max_staff: Option<u32>,
}

/// Employee entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Employee {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub role_id: Option<i64>,
    pub employment_fraction: EmploymentFraction,
    /// Individual monthly hour cap; limits fall back to the per-fraction
    /// `HourLimit` and finally the configured default.
    pub monthly_hour_limit: Option<i32>,
    /// Opaque preference bag, interpreted only by the configuration loader.
    pub preferences: Option<Map<String, Value>>,
    pub hired_on: Option<NaiveDate>,
}

impl Employee {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}
