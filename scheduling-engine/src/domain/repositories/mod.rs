pub mod config_repository;
pub mod schedule_repository;
pub mod workforce_repository;

use async_trait::async_trait;
use shared::DomainResult;

pub use config_repository::ConfigRepository;
pub use schedule_repository::{NewScheduleEntry, ScheduleRepository};
pub use workforce_repository::WorkforceRepository;

#[cfg(test)]
pub use config_repository::MockConfigRepository;
#[cfg(test)]
pub use schedule_repository::MockScheduleRepository;
#[cfg(test)]
pub use workforce_repository::MockWorkforceRepository;

/// One transactional session. All reads and writes of a generation or
/// validation request go through a single unit of work; the façade commits
/// on success and rolls back on error. Generators never open sessions
/// themselves.
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    fn workforce(&self) -> &dyn WorkforceRepository;
    fn config(&self) -> &dyn ConfigRepository;
    fn schedules(&self) -> &dyn ScheduleRepository;

    async fn commit(self: Box<Self>) -> DomainResult<()>;
    async fn rollback(self: Box<Self>) -> DomainResult<()>;
}

/// Opens units of work over the underlying store.
pub trait SessionFactory: Send + Sync {
    fn begin(&self) -> Box<dyn UnitOfWork>;
}
