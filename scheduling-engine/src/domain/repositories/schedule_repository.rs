use async_trait::async_trait;
use chrono::NaiveDate;
use shared::DomainResult;

use crate::domain::entities::{MonthlySchedule, ScheduleEntry};

/// A schedule entry about to be persisted; the store assigns the id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewScheduleEntry {
    pub schedule_id: i64,
    pub employee_id: i64,
    pub shift_id: i64,
    pub date: NaiveDate,
}

/// Storage for monthly schedules and their entries.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ScheduleRepository: Send + Sync {
    async fn find_by_month(&self, month_key: &str) -> DomainResult<Option<MonthlySchedule>>;

    async fn find_by_id(&self, id: i64) -> DomainResult<Option<MonthlySchedule>>;

    /// Create a draft schedule for the month key.
    async fn create(&self, month_key: &str) -> DomainResult<MonthlySchedule>;

    async fn delete_entries(&self, schedule_id: i64) -> DomainResult<()>;

    /// Insert entries in batch. Rejects duplicates of the
    /// `(schedule_id, employee_id, date, shift_id)` tuple.
    async fn insert_entries(
        &self,
        entries: Vec<NewScheduleEntry>,
    ) -> DomainResult<Vec<ScheduleEntry>>;

    /// Entries of a schedule ordered by `(date, shift_id, employee_id)`.
    async fn entries_for_schedule(&self, schedule_id: i64) -> DomainResult<Vec<ScheduleEntry>>;
}
