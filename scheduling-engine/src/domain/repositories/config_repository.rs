use async_trait::async_trait;
use shared::DomainResult;

use crate::domain::entities::{GeneratorParameters, Holiday, LaborLawRule, StaffingTemplate};

/// Storage for the durable configuration surface. Date-window filtering and
/// parameter interpretation live in the configuration loader, not here.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConfigRepository: Send + Sync {
    async fn list_rules(&self) -> DomainResult<Vec<LaborLawRule>>;

    async fn list_holidays(&self) -> DomainResult<Vec<Holiday>>;

    async fn list_staffing_templates(&self) -> DomainResult<Vec<StaffingTemplate>>;

    async fn list_generator_parameters(&self) -> DomainResult<Vec<GeneratorParameters>>;

    /// Insert or update by calendar date (the natural key).
    async fn upsert_holiday(&self, holiday: Holiday) -> DomainResult<Holiday>;

    /// Insert or update by `(day_type, shift_id, role_id)`.
    async fn upsert_staffing_template(
        &self,
        template: StaffingTemplate,
    ) -> DomainResult<StaffingTemplate>;

    /// Insert or update by scenario tag.
    async fn upsert_generator_parameters(
        &self,
        params: GeneratorParameters,
    ) -> DomainResult<GeneratorParameters>;
}
