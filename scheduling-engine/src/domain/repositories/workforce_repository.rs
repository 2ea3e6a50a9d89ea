use async_trait::async_trait;
use shared::DomainResult;

use crate::domain::entities::{Absence, Employee, HourLimit, Role, Shift};

/// Read side of the employee/role/shift/absence directory.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WorkforceRepository: Send + Sync {
    async fn list_roles(&self) -> DomainResult<Vec<Role>>;

    /// All employees ordered by id.
    async fn list_employees(&self) -> DomainResult<Vec<Employee>>;

    async fn find_employee(&self, id: i64) -> DomainResult<Option<Employee>>;

    /// All shifts ordered by id.
    async fn list_shifts(&self) -> DomainResult<Vec<Shift>>;

    async fn find_shift(&self, id: i64) -> DomainResult<Option<Shift>>;

    async fn list_absences(&self) -> DomainResult<Vec<Absence>>;

    async fn list_hour_limits(&self) -> DomainResult<Vec<HourLimit>>;
}
