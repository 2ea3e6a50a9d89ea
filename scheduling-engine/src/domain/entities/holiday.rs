use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Calendar holiday. `store_closed` bans all assignments on the date.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Holiday {
    pub id: i64,
    pub date: NaiveDate,
    pub name: String,
    pub coverage_overrides: Option<Value>,
    #[serde(default)]
    pub store_closed: bool,
}
