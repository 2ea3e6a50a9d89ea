use async_trait::async_trait;
use chrono::NaiveDate;
use shared::DomainError;
use std::time::Duration;
use thiserror::Error;

use crate::domain::entities::{MonthlySchedule, ScheduleEntry};
use crate::domain::repositories::UnitOfWork;
use crate::domain::services::validation::ValidationIssue;
use crate::solver::{CancelToken, SolveStatus};

/// Expected, caller-recoverable generation failure. Message texts are part
/// of the external contract and stay in Polish.
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("Brak danych wejściowych do wygenerowania grafiku")]
    MissingInput,

    #[error("Brak przypisanych ról do pracowników")]
    NoRoleAssignments,

    #[error("Brak pracowników dla roli {role}")]
    NoEmployeesForRole { role: String },

    #[error("Niewystarczająca liczba pracowników dla roli {role}")]
    InsufficientEmployees { role: String },

    #[error("Wszyscy pracownicy w roli {role} są niedostępni {date}")]
    RoleUnavailable { role: String, date: NaiveDate },

    #[error(
        "Solver nie znalazł rozwiązania (status: {status}). \
         Pracownicy: {employees}, Zmiany: {shifts}, Zmienne: {variables}. \
         Sprawdź ograniczenia i wymagania obsadowe."
    )]
    SolverFailed {
        status: SolveStatus,
        employees: usize,
        shifts: usize,
        variables: usize,
    },

    #[error("Parametry 'month' i 'year' muszą wskazywać poprawny miesiąc")]
    InvalidPeriod,

    #[error("Parametr 'generator_type' musi być 'heuristic' lub 'ortools'")]
    UnknownGeneratorKind,

    #[error(transparent)]
    Storage(#[from] DomainError),
}

/// Everything a generator needs for one run. The unit of work is owned by
/// the façade; generators never open sessions themselves.
pub struct GenerationContext<'a> {
    pub uow: &'a dyn UnitOfWork,
    pub year: i32,
    pub month: u32,
    pub scenario: String,
    pub solver_budget: Duration,
    pub default_monthly_hours: i32,
    pub cancel: CancelToken,
}

/// Result of a successful generation run.
#[derive(Debug)]
pub struct GenerationOutcome {
    pub schedule: MonthlySchedule,
    pub entries: Vec<ScheduleEntry>,
    pub issues: Vec<ValidationIssue>,
}

/// Capability shared by the heuristic and CP-SAT generators; the façade
/// dispatches on `GeneratorKind`.
#[async_trait]
pub trait ScheduleGenerator: Send + Sync {
    async fn generate(
        &self,
        ctx: &GenerationContext<'_>,
    ) -> Result<GenerationOutcome, GenerationError>;
}
