//! Generation façade: dispatches to a registered generator, measures the
//! run, attaches diagnostics and commits or rolls back the unit of work.

use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};
use shared::{GeneratorKind, IssueLevel};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use crate::domain::calendar::month_span;
use crate::domain::repositories::SessionFactory;
use crate::domain::services::generator::{
    GenerationContext, GenerationError, GenerationOutcome, ScheduleGenerator,
};
use crate::domain::services::validation::ValidationIssue;
use crate::domain::services::{CpSatGenerator, HeuristicGenerator};
use crate::infrastructure::config::Settings;
use crate::presentation::{AbsenceView, ScheduleView, ShiftView};
use crate::solver::CancelToken;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerationRequest {
    pub month: Option<u32>,
    pub year: Option<i32>,
    pub generator_type: Option<String>,
    pub scenario_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Diagnostics {
    pub generator_type: GeneratorKind,
    pub scenario_type: Option<String>,
    pub runtime_ms: u64,
    pub entry_count: usize,
    pub issue_count: usize,
    pub blocking_issues: usize,
    pub warning_issues: usize,
}

/// Full generation payload: the legacy schedule serialisation plus issues,
/// the shift/absence surroundings and run diagnostics.
#[derive(Debug, Serialize)]
pub struct GenerationReport {
    #[serde(flatten)]
    pub schedule: ScheduleView,
    pub issues: Vec<ValidationIssue>,
    pub shifts: Vec<ShiftView>,
    pub absences: Vec<AbsenceView>,
    pub diagnostics: Diagnostics,
}

pub struct GenerationFacade {
    store: Arc<dyn SessionFactory>,
    settings: Settings,
    generators: HashMap<GeneratorKind, Arc<dyn ScheduleGenerator>>,
}

impl GenerationFacade {
    pub fn new(store: Arc<dyn SessionFactory>, settings: Settings) -> Self {
        let mut generators: HashMap<GeneratorKind, Arc<dyn ScheduleGenerator>> = HashMap::new();
        generators.insert(GeneratorKind::Heuristic, Arc::new(HeuristicGenerator));
        generators.insert(GeneratorKind::Ortools, Arc::new(CpSatGenerator));
        Self {
            store,
            settings,
            generators,
        }
    }

    pub async fn generate(
        &self,
        request: GenerationRequest,
    ) -> Result<GenerationReport, GenerationError> {
        self.generate_with_cancel(request, CancelToken::new()).await
    }

    pub async fn generate_with_cancel(
        &self,
        request: GenerationRequest,
        cancel: CancelToken,
    ) -> Result<GenerationReport, GenerationError> {
        let kind = parse_generator_kind(request.generator_type.as_deref())?;
        let generator = self
            .generators
            .get(&kind)
            .ok_or(GenerationError::UnknownGeneratorKind)?
            .clone();

        let today = Utc::now().date_naive();
        let month = request.month.unwrap_or_else(|| today.month());
        let year = request.year.unwrap_or_else(|| today.year());
        month_span(year, month).ok_or(GenerationError::InvalidPeriod)?;
        let scenario = request
            .scenario_type
            .clone()
            .unwrap_or_else(|| crate::domain::services::configuration::DEFAULT_SCENARIO.to_string());

        tracing::info!(%kind, year, month, %scenario, "generation requested");

        let uow = self.store.begin();
        let started = Instant::now();
        let outcome = {
            let ctx = GenerationContext {
                uow: uow.as_ref(),
                year,
                month,
                scenario: scenario.clone(),
                solver_budget: self.settings.solver_budget(),
                default_monthly_hours: self.settings.limits.default_monthly_hours,
                cancel,
            };
            generator.generate(&ctx).await
        };
        let runtime_ms = started.elapsed().as_millis() as u64;

        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(error) => {
                tracing::warn!(%error, "generation failed, rolling back");
                uow.rollback().await?;
                return Err(error);
            }
        };

        let report = self
            .assemble_report(uow.as_ref(), &outcome, kind, &scenario, runtime_ms)
            .await?;
        uow.commit().await?;
        Ok(report)
    }

    async fn assemble_report(
        &self,
        uow: &dyn crate::domain::repositories::UnitOfWork,
        outcome: &GenerationOutcome,
        kind: GeneratorKind,
        scenario: &str,
        runtime_ms: u64,
    ) -> Result<GenerationReport, GenerationError> {
        let workforce = uow.workforce();
        let employees = workforce.list_employees().await?;
        let roles = workforce.list_roles().await?;
        let shifts = workforce.list_shifts().await?;
        let absences = workforce.list_absences().await?;

        let blocking_issues = outcome
            .issues
            .iter()
            .filter(|issue| issue.level == IssueLevel::Error)
            .count();
        let warning_issues = outcome
            .issues
            .iter()
            .filter(|issue| issue.level == IssueLevel::Warning)
            .count();

        Ok(GenerationReport {
            schedule: ScheduleView::assemble(
                &outcome.schedule,
                &outcome.entries,
                &employees,
                &roles,
                &shifts,
            ),
            issues: outcome.issues.clone(),
            shifts: shifts.iter().map(ShiftView::from).collect(),
            absences: absences.iter().map(AbsenceView::from).collect(),
            diagnostics: Diagnostics {
                generator_type: kind,
                scenario_type: (kind == GeneratorKind::Ortools).then(|| scenario.to_string()),
                runtime_ms,
                entry_count: outcome.entries.len(),
                issue_count: outcome.issues.len(),
                blocking_issues,
                warning_issues,
            },
        })
    }
}

fn parse_generator_kind(raw: Option<&str>) -> Result<GeneratorKind, GenerationError> {
    match raw.unwrap_or("heuristic") {
        "heuristic" => Ok(GeneratorKind::Heuristic),
        "ortools" => Ok(GeneratorKind::Ortools),
        _ => Err(GenerationError::UnknownGeneratorKind),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::InMemoryStore;

    fn facade() -> GenerationFacade {
        GenerationFacade::new(Arc::new(InMemoryStore::new()), Settings::default())
    }

    #[tokio::test]
    async fn test_rejects_unknown_generator_type() {
        let request = GenerationRequest {
            generator_type: Some("genetic".to_string()),
            ..Default::default()
        };
        let result = facade().generate(request).await;
        assert!(matches!(
            result,
            Err(GenerationError::UnknownGeneratorKind)
        ));
    }

    #[tokio::test]
    async fn test_rejects_invalid_month() {
        let request = GenerationRequest {
            month: Some(13),
            year: Some(2024),
            ..Default::default()
        };
        let result = facade().generate(request).await;
        assert!(matches!(result, Err(GenerationError::InvalidPeriod)));
    }

    #[tokio::test]
    async fn test_empty_store_is_missing_input() {
        let request = GenerationRequest {
            month: Some(1),
            year: Some(2024),
            ..Default::default()
        };
        let result = facade().generate(request).await;
        assert!(matches!(result, Err(GenerationError::MissingInput)));
    }
}
