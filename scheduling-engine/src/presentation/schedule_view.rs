//! Serialisable views of schedules and their surroundings.
//!
//! Field names keep the legacy JSON contract (`miesiac_rok`, `pracownik`,
//! `zmiana_id`, ...); entry ids are resolved to names through the arenas.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::Serialize;
use shared::ScheduleStatus;
use std::collections::HashMap;

use crate::domain::entities::{
    Absence, Employee, MonthlySchedule, Role, ScheduleEntry, Shift,
};

#[derive(Debug, Serialize)]
pub struct EmployeeView {
    #[serde(rename = "imie")]
    pub first_name: Option<String>,
    #[serde(rename = "nazwisko")]
    pub last_name: Option<String>,
    #[serde(rename = "rola")]
    pub role: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EntryView {
    pub id: i64,
    #[serde(rename = "data")]
    pub date: NaiveDate,
    #[serde(rename = "pracownik_id")]
    pub employee_id: i64,
    #[serde(rename = "pracownik")]
    pub employee: EmployeeView,
    #[serde(rename = "zmiana_id")]
    pub shift_id: i64,
    #[serde(rename = "zmiana")]
    pub shift_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ShiftView {
    pub id: i64,
    #[serde(rename = "nazwa_zmiany")]
    pub name: String,
    #[serde(rename = "godzina_rozpoczecia")]
    pub starts_at: NaiveTime,
    #[serde(rename = "godzina_zakonczenia")]
    pub ends_at: NaiveTime,
}

impl From<&Shift> for ShiftView {
    fn from(shift: &Shift) -> Self {
        Self {
            id: shift.id,
            name: shift.name.clone(),
            starts_at: shift.starts_at,
            ends_at: shift.ends_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AbsenceView {
    pub id: i64,
    #[serde(rename = "pracownik_id")]
    pub employee_id: i64,
    #[serde(rename = "typ_nieobecnosci")]
    pub kind: String,
    #[serde(rename = "data_od")]
    pub from: NaiveDate,
    #[serde(rename = "data_do")]
    pub to: NaiveDate,
}

impl From<&Absence> for AbsenceView {
    fn from(absence: &Absence) -> Self {
        Self {
            id: absence.id,
            employee_id: absence.employee_id,
            kind: absence.kind.clone(),
            from: absence.from,
            to: absence.to,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ScheduleView {
    pub id: i64,
    #[serde(rename = "miesiac_rok")]
    pub month_key: String,
    pub status: ScheduleStatus,
    #[serde(rename = "data_utworzenia")]
    pub created_at: DateTime<Utc>,
    pub entries: Vec<EntryView>,
}

impl ScheduleView {
    pub fn assemble(
        schedule: &MonthlySchedule,
        entries: &[ScheduleEntry],
        employees: &[Employee],
        roles: &[Role],
        shifts: &[Shift],
    ) -> Self {
        let employees_by_id: HashMap<i64, &Employee> =
            employees.iter().map(|e| (e.id, e)).collect();
        let roles_by_id: HashMap<i64, &Role> = roles.iter().map(|r| (r.id, r)).collect();
        let shifts_by_id: HashMap<i64, &Shift> = shifts.iter().map(|s| (s.id, s)).collect();

        let entry_views = entries
            .iter()
            .map(|entry| {
                let employee = employees_by_id.get(&entry.employee_id);
                let role = employee
                    .and_then(|e| e.role_id)
                    .and_then(|id| roles_by_id.get(&id));
                EntryView {
                    id: entry.id,
                    date: entry.date,
                    employee_id: entry.employee_id,
                    employee: EmployeeView {
                        first_name: employee.map(|e| e.first_name.clone()),
                        last_name: employee.map(|e| e.last_name.clone()),
                        role: role.map(|r| r.name.clone()),
                    },
                    shift_id: entry.shift_id,
                    shift_name: shifts_by_id.get(&entry.shift_id).map(|s| s.name.clone()),
                }
            })
            .collect();

        Self {
            id: schedule.id,
            month_key: schedule.month_key.clone(),
            status: schedule.status,
            created_at: schedule.created_at,
            entries: entry_views,
        }
    }
}
