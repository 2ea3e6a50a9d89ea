use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of a labor law rule. HARD rules block publication, SOFT rules
/// only warn.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleSeverity {
    Hard,
    Soft,
}

impl RuleSeverity {
    pub fn issue_level(self) -> IssueLevel {
        match self {
            RuleSeverity::Hard => IssueLevel::Error,
            RuleSeverity::Soft => IssueLevel::Warning,
        }
    }
}

/// Level of a validation finding.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum IssueLevel {
    Error,
    Warning,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleStatus {
    Draft,
    Published,
}

impl fmt::Display for ScheduleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScheduleStatus::Draft => write!(f, "draft"),
            ScheduleStatus::Published => write!(f, "published"),
        }
    }
}

/// Day classification used by staffing templates.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DayType {
    Weekday,
    Weekend,
    Holiday,
}

/// Employment fraction tag carried by every employee.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EmploymentFraction {
    FullTime,
    ThreeQuarterTime,
    HalfTime,
    QuarterTime,
}

/// Which generator the façade should run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum GeneratorKind {
    Heuristic,
    Ortools,
}

impl fmt::Display for GeneratorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeneratorKind::Heuristic => write!(f, "heuristic"),
            GeneratorKind::Ortools => write!(f, "ortools"),
        }
    }
}
