//! Validation service: checks persisted schedules or ad-hoc entry sets and
//! wraps the findings into a summary payload.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use shared::{DomainError, DomainResult, IssueLevel};
use std::sync::Arc;

use crate::domain::calendar::{month_span, parse_month_key};
use crate::domain::entities::ScheduleEntry;
use crate::domain::repositories::{SessionFactory, UnitOfWork};
use crate::domain::services::configuration::ConfigurationLoader;
use crate::domain::services::validation::{
    validate_schedule, validate_schedule_with_rules, ValidationContext, ValidationIssue,
};

pub const VALIDATION_TYPE_RULES: &str = "rules-based";
pub const VALIDATION_TYPE_BASIC: &str = "basic";

#[derive(Debug, Serialize)]
pub struct ValidationSummary {
    pub total_issues: usize,
    pub blocking_issues: usize,
    pub warnings: usize,
    pub passed: bool,
}

impl ValidationSummary {
    fn from_issues(issues: &[ValidationIssue]) -> Self {
        let blocking = issues
            .iter()
            .filter(|issue| issue.level == IssueLevel::Error)
            .count();
        let warnings = issues
            .iter()
            .filter(|issue| issue.level == IssueLevel::Warning)
            .count();
        Self {
            total_issues: issues.len(),
            blocking_issues: blocking,
            warnings,
            passed: blocking == 0,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ValidationReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule_id: Option<i64>,
    pub validation_summary: ValidationSummary,
    pub issues: Vec<ValidationIssue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// One entry of an ad-hoc validation request, in the legacy payload shape.
#[derive(Debug, Clone, Deserialize)]
pub struct EntryPayload {
    #[serde(rename = "pracownik_id")]
    pub employee_id: i64,
    #[serde(rename = "zmiana_id")]
    pub shift_id: i64,
    #[serde(rename = "data")]
    pub date: NaiveDate,
}

pub struct ValidationService {
    store: Arc<dyn SessionFactory>,
}

impl ValidationService {
    pub fn new(store: Arc<dyn SessionFactory>) -> Self {
        Self { store }
    }

    /// Validate a persisted schedule. Runs under a read-only unit of work.
    pub async fn validate_schedule_by_id(
        &self,
        schedule_id: i64,
        use_rules: bool,
    ) -> DomainResult<ValidationReport> {
        let uow = self.store.begin();
        let result = self.validate_persisted(uow.as_ref(), schedule_id, use_rules).await;
        uow.rollback().await?;
        result
    }

    async fn validate_persisted(
        &self,
        uow: &dyn UnitOfWork,
        schedule_id: i64,
        use_rules: bool,
    ) -> DomainResult<ValidationReport> {
        let schedule = uow
            .schedules()
            .find_by_id(schedule_id)
            .await?
            .ok_or_else(|| DomainError::NotFound("Grafik nie istnieje".to_string()))?;
        let entries = uow.schedules().entries_for_schedule(schedule_id).await?;

        if entries.is_empty() {
            return Ok(ValidationReport {
                schedule_id: Some(schedule_id),
                validation_summary: ValidationSummary::from_issues(&[]),
                issues: Vec::new(),
                validation_type: None,
                entry_count: None,
                message: Some("Brak wpisów do walidacji".to_string()),
            });
        }

        let span = parse_month_key(&schedule.month_key)
            .and_then(|(year, month)| month_span(year, month));
        let issues = self
            .run_checks(uow, &entries, span, use_rules && span.is_some())
            .await?;

        Ok(ValidationReport {
            schedule_id: Some(schedule_id),
            validation_summary: ValidationSummary::from_issues(&issues),
            issues,
            validation_type: Some(validation_type(use_rules && span.is_some()).to_string()),
            entry_count: None,
            message: None,
        })
    }

    /// Validate an in-memory entry set without persisting anything.
    pub async fn validate_entries(
        &self,
        payload: Vec<EntryPayload>,
        year: i32,
        month: u32,
        use_rules: bool,
    ) -> DomainResult<ValidationReport> {
        if payload.is_empty() {
            return Err(DomainError::InvalidInput(
                "Brak wpisów do walidacji".to_string(),
            ));
        }
        let span = month_span(year, month).ok_or_else(|| {
            DomainError::InvalidInput("Nieprawidłowe year lub month".to_string())
        })?;

        let uow = self.store.begin();
        let result = self
            .validate_transient(uow.as_ref(), payload, span, use_rules)
            .await;
        uow.rollback().await?;
        result
    }

    async fn validate_transient(
        &self,
        uow: &dyn UnitOfWork,
        payload: Vec<EntryPayload>,
        span: (NaiveDate, NaiveDate),
        use_rules: bool,
    ) -> DomainResult<ValidationReport> {
        let workforce = uow.workforce();
        let mut entries = Vec::with_capacity(payload.len());
        for (position, item) in payload.into_iter().enumerate() {
            let employee = workforce.find_employee(item.employee_id).await?;
            let shift = workforce.find_shift(item.shift_id).await?;
            if employee.is_none() || shift.is_none() {
                return Err(DomainError::InvalidInput(
                    "Nieprawidłowy pracownik_id lub zmiana_id w wpisie".to_string(),
                ));
            }
            entries.push(ScheduleEntry {
                id: position as i64 + 1,
                schedule_id: 0,
                employee_id: item.employee_id,
                shift_id: item.shift_id,
                date: item.date,
            });
        }

        let entry_count = entries.len();
        let issues = self.run_checks(uow, &entries, Some(span), use_rules).await?;

        Ok(ValidationReport {
            schedule_id: None,
            validation_summary: ValidationSummary::from_issues(&issues),
            issues,
            validation_type: Some(validation_type(use_rules).to_string()),
            entry_count: Some(entry_count),
            message: None,
        })
    }

    async fn run_checks(
        &self,
        uow: &dyn UnitOfWork,
        entries: &[ScheduleEntry],
        span: Option<(NaiveDate, NaiveDate)>,
        use_rules: bool,
    ) -> DomainResult<Vec<ValidationIssue>> {
        let workforce = uow.workforce();
        let employees = workforce.list_employees().await?;
        let roles = workforce.list_roles().await?;
        let shifts = workforce.list_shifts().await?;
        let hour_limits = workforce.list_hour_limits().await?;

        let loader = ConfigurationLoader::new(uow);
        let holidays = match span {
            Some((from, to)) => loader.holidays(from, to).await?,
            None => Vec::new(),
        };

        let ctx = ValidationContext::new(&employees, &roles, &shifts, &holidays)
            .with_hour_limits(&hour_limits);

        if use_rules {
            let (from, to) = span.unwrap_or_else(|| {
                let fallback = entries.first().map(|entry| entry.date).unwrap_or_default();
                (fallback, fallback)
            });
            let rules = loader.active_rules(from, to, None, None).await?;
            Ok(validate_schedule_with_rules(&rules, entries, &ctx))
        } else {
            Ok(validate_schedule(entries, &ctx))
        }
    }
}

fn validation_type(use_rules: bool) -> &'static str {
    if use_rules {
        VALIDATION_TYPE_RULES
    } else {
        VALIDATION_TYPE_BASIC
    }
}
