use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Contiguous date range during which an employee is unavailable.
///
/// Kinds are open strings ("urlop", "choroba", ...). Overlapping absences of
/// the same kind are allowed; overlapping absences of different kinds are
/// rejected at the store boundary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Absence {
    pub id: i64,
    pub employee_id: i64,
    pub kind: String,
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl Absence {
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.to
    }

    pub fn overlaps(&self, other: &Absence) -> bool {
        self.from <= other.to && other.from <= self.to
    }

    /// True when the two absences violate the mixed-kind overlap invariant.
    pub fn conflicts_with(&self, other: &Absence) -> bool {
        self.employee_id == other.employee_id && self.kind != other.kind && self.overlaps(other)
    }
}
