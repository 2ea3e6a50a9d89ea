//! Post-hoc schedule validation.
//!
//! Two modes: `validate_schedule` with hard-coded thresholds (generator
//! self-checks and the light legacy path) and `validate_schedule_with_rules`
//! driven by active labor law rules. Issue messages are part of the
//! external contract and stay in Polish.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use shared::{EmploymentFraction, IssueLevel};
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::domain::entities::{Employee, Holiday, HourLimit, LaborLawRule, Role, Shift};
use crate::domain::entities::ScheduleEntry;
use crate::domain::services::configuration::{rule_int_param, RuleCode};

const BASIC_MIN_REST_HOURS: i64 = 11;
const BASIC_MAX_CONSECUTIVE_DAYS: i64 = 6;
const BASIC_MONTHLY_HOURS_LIMIT: i64 = 40;
const DEFAULT_MONTHLY_HOURS_LIMIT: i64 = 160;

/// Structured validation finding. `level == Error` blocks publication.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValidationIssue {
    pub level: IssueLevel,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule_code: Option<String>,
}

/// Arenas the validator resolves entry ids through.
#[derive(Debug, Default)]
pub struct ValidationContext {
    employees: HashMap<i64, Employee>,
    roles: HashMap<i64, Role>,
    shifts: HashMap<i64, Shift>,
    holidays: Vec<Holiday>,
    hour_limits: HashMap<EmploymentFraction, HourLimit>,
}

impl ValidationContext {
    pub fn new(
        employees: &[Employee],
        roles: &[Role],
        shifts: &[Shift],
        holidays: &[Holiday],
    ) -> Self {
        Self {
            employees: employees.iter().map(|e| (e.id, e.clone())).collect(),
            roles: roles.iter().map(|r| (r.id, r.clone())).collect(),
            shifts: shifts.iter().map(|s| (s.id, s.clone())).collect(),
            holidays: holidays.to_vec(),
            hour_limits: HashMap::new(),
        }
    }

    pub fn with_hour_limits(mut self, limits: &[HourLimit]) -> Self {
        self.hour_limits = limits
            .iter()
            .map(|limit| (limit.employment_fraction, limit.clone()))
            .collect();
        self
    }

    fn shift(&self, id: i64) -> Option<&Shift> {
        self.shifts.get(&id)
    }

    fn role_name(&self, employee_id: i64) -> Option<&str> {
        let employee = self.employees.get(&employee_id)?;
        let role_id = employee.role_id?;
        self.roles.get(&role_id).map(|role| role.name.as_str())
    }

    /// Monthly cap for one employee: own limit, then the per-fraction hour
    /// limit, then the supplied default.
    fn monthly_limit(&self, employee_id: i64, default: i64) -> i64 {
        let Some(employee) = self.employees.get(&employee_id) else {
            return default;
        };
        if let Some(limit) = employee.monthly_hour_limit {
            return limit as i64;
        }
        self.hour_limits
            .get(&employee.employment_fraction)
            .and_then(|limit| limit.max_monthly_hours)
            .map(|hours| hours as i64)
            .unwrap_or(default)
    }
}

fn entries_per_employee<'a>(
    entries: &'a [ScheduleEntry],
) -> BTreeMap<i64, Vec<&'a ScheduleEntry>> {
    let mut grouped: BTreeMap<i64, Vec<&ScheduleEntry>> = BTreeMap::new();
    for entry in entries {
        grouped.entry(entry.employee_id).or_default().push(entry);
    }
    for group in grouped.values_mut() {
        group.sort_by_key(|entry| entry.date);
    }
    grouped
}

fn daily_rest_issues(
    entries: &[ScheduleEntry],
    ctx: &ValidationContext,
    min_hours: i64,
    level: IssueLevel,
    rule_code: Option<&str>,
) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    for (employee_id, emp_entries) in entries_per_employee(entries) {
        for pair in emp_entries.windows(2) {
            let (prev, current) = (pair[0], pair[1]);
            let (Some(prev_shift), Some(current_shift)) =
                (ctx.shift(prev.shift_id), ctx.shift(current.shift_id))
            else {
                continue;
            };
            let rest = current.date.and_time(current_shift.starts_at)
                - prev.date.and_time(prev_shift.ends_at);
            if rest < chrono::Duration::hours(min_hours) {
                issues.push(ValidationIssue {
                    level,
                    message: format!(
                        "Pracownik ID {employee_id} ma mniej niż {min_hours} godzin odpoczynku \
                         między zmianami {} i {}",
                        prev.date, current.date
                    ),
                    rule_code: rule_code.map(String::from),
                });
            }
        }
    }
    issues
}

fn weekly_rest_issues(
    entries: &[ScheduleEntry],
    max_consecutive: i64,
    level: IssueLevel,
    rule_code: Option<&str>,
) -> Vec<ValidationIssue> {
    let max_consecutive = max_consecutive.max(1) as usize;
    let mut issues = Vec::new();
    for (employee_id, emp_entries) in entries_per_employee(entries) {
        let mut work_days: Vec<NaiveDate> = emp_entries.iter().map(|entry| entry.date).collect();
        work_days.dedup();
        if work_days.len() <= max_consecutive {
            continue;
        }
        for window in work_days.windows(max_consecutive + 1) {
            let consecutive = window
                .windows(2)
                .all(|days| (days[1] - days[0]).num_days() == 1);
            if consecutive {
                issues.push(ValidationIssue {
                    level,
                    message: format!(
                        "Pracownik ID {employee_id} pracuje {} dni z rzędu, zaczynając od {}",
                        max_consecutive + 1,
                        window[0]
                    ),
                    rule_code: rule_code.map(String::from),
                });
            }
        }
    }
    issues
}

fn working_hours_issues(
    entries: &[ScheduleEntry],
    ctx: &ValidationContext,
    level: IssueLevel,
    rule_code: Option<&str>,
    limit_for: impl Fn(i64) -> i64,
) -> Vec<ValidationIssue> {
    let mut totals: BTreeMap<i64, f64> = BTreeMap::new();
    for entry in entries {
        let Some(shift) = ctx.shift(entry.shift_id) else {
            continue;
        };
        *totals.entry(entry.employee_id).or_default() += shift.duration_minutes() as f64 / 60.0;
    }

    let mut issues = Vec::new();
    for (employee_id, total_hours) in totals {
        let limit = limit_for(employee_id);
        if total_hours > limit as f64 {
            issues.push(ValidationIssue {
                level,
                message: format!(
                    "Pracownik ID {employee_id} przekroczył limit godzin pracy \
                     ({total_hours:.2}/{limit})"
                ),
                rule_code: rule_code.map(String::from),
            });
        }
    }
    issues
}

fn holiday_issues(
    entries: &[ScheduleEntry],
    ctx: &ValidationContext,
    level: IssueLevel,
    rule_code: Option<&str>,
    skip_store_closed: bool,
) -> Vec<ValidationIssue> {
    let holiday_dates: HashSet<NaiveDate> = ctx
        .holidays
        .iter()
        .filter(|holiday| !(skip_store_closed && holiday.store_closed))
        .map(|holiday| holiday.date)
        .collect();

    entries
        .iter()
        .filter(|entry| holiday_dates.contains(&entry.date))
        .map(|entry| ValidationIssue {
            level,
            message: format!(
                "Pracownik ID {} jest przypisany do pracy w święto ({})",
                entry.employee_id, entry.date
            ),
            rule_code: rule_code.map(String::from),
        })
        .collect()
}

/// Coverage shortfalls are always blocking errors, in both modes. Only
/// `(date, shift)` pairs that have at least one entry are inspected.
fn coverage_issues(entries: &[ScheduleEntry], ctx: &ValidationContext) -> Vec<ValidationIssue> {
    let mut per_day: BTreeMap<NaiveDate, BTreeMap<i64, Vec<&ScheduleEntry>>> = BTreeMap::new();
    for entry in entries {
        per_day
            .entry(entry.date)
            .or_default()
            .entry(entry.shift_id)
            .or_default()
            .push(entry);
    }

    let mut issues = Vec::new();
    for (day, per_shift) in per_day {
        for (shift_id, shift_entries) in per_shift {
            let Some(shift) = ctx.shift(shift_id) else {
                continue;
            };
            if shift.required_staffing.is_empty() {
                continue;
            }

            let mut per_role: BTreeMap<&str, u32> = BTreeMap::new();
            for entry in &shift_entries {
                if let Some(role_name) = ctx.role_name(entry.employee_id) {
                    *per_role.entry(role_name).or_default() += 1;
                }
            }

            for (role_name, &required) in &shift.required_staffing {
                let actual = per_role.get(role_name.as_str()).copied().unwrap_or(0);
                if actual < required {
                    issues.push(ValidationIssue {
                        level: IssueLevel::Error,
                        message: format!(
                            "{day} zmiana {shift_id}: brakuje {} pracowników w roli {role_name}",
                            required - actual
                        ),
                        rule_code: None,
                    });
                }
            }
        }
    }
    issues
}

/// Basic mode: fixed thresholds, no rule codes.
pub fn validate_schedule(
    entries: &[ScheduleEntry],
    ctx: &ValidationContext,
) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    issues.extend(daily_rest_issues(
        entries,
        ctx,
        BASIC_MIN_REST_HOURS,
        IssueLevel::Warning,
        None,
    ));
    issues.extend(weekly_rest_issues(
        entries,
        BASIC_MAX_CONSECUTIVE_DAYS,
        IssueLevel::Warning,
        None,
    ));
    issues.extend(working_hours_issues(
        entries,
        ctx,
        IssueLevel::Warning,
        None,
        |_| BASIC_MONTHLY_HOURS_LIMIT,
    ));
    issues.extend(holiday_issues(entries, ctx, IssueLevel::Error, None, false));
    issues.extend(coverage_issues(entries, ctx));
    issues
}

type RuleCheck = fn(&LaborLawRule, &[ScheduleEntry], &ValidationContext) -> Vec<ValidationIssue>;

fn check_daily_rest_rule(
    rule: &LaborLawRule,
    entries: &[ScheduleEntry],
    ctx: &ValidationContext,
) -> Vec<ValidationIssue> {
    let min_hours = rule_int_param(rule, "min_hours", BASIC_MIN_REST_HOURS);
    daily_rest_issues(
        entries,
        ctx,
        min_hours,
        rule.severity.issue_level(),
        Some(&rule.code),
    )
}

fn check_weekly_rest_rule(
    rule: &LaborLawRule,
    entries: &[ScheduleEntry],
    _ctx: &ValidationContext,
) -> Vec<ValidationIssue> {
    let max_consecutive = rule_int_param(rule, "max_consecutive_days", BASIC_MAX_CONSECUTIVE_DAYS);
    weekly_rest_issues(
        entries,
        max_consecutive,
        rule.severity.issue_level(),
        Some(&rule.code),
    )
}

fn check_hours_limit_rule(
    rule: &LaborLawRule,
    entries: &[ScheduleEntry],
    ctx: &ValidationContext,
) -> Vec<ValidationIssue> {
    // `limit_godzin_miesieczny` carries `default_limit`; the seed variant
    // `HOURS_WEEKLY_MAX` carries `max_hours`.
    let fallback = rule_int_param(rule, "max_hours", DEFAULT_MONTHLY_HOURS_LIMIT);
    let default_limit = rule_int_param(rule, "default_limit", fallback);
    working_hours_issues(
        entries,
        ctx,
        rule.severity.issue_level(),
        Some(&rule.code),
        |employee_id| ctx.monthly_limit(employee_id, default_limit),
    )
}

fn check_holiday_work_rule(
    rule: &LaborLawRule,
    entries: &[ScheduleEntry],
    ctx: &ValidationContext,
) -> Vec<ValidationIssue> {
    holiday_issues(
        entries,
        ctx,
        rule.severity.issue_level(),
        Some(&rule.code),
        true,
    )
}

/// Check registry: data-driven dispatch in the required emission order.
const RULE_REGISTRY: [(RuleCode, RuleCheck); 4] = [
    (RuleCode::DailyRest, check_daily_rest_rule),
    (RuleCode::WeeklyRest, check_weekly_rest_rule),
    (RuleCode::HoursLimit, check_hours_limit_rule),
    (RuleCode::HolidayWork, check_holiday_work_rule),
];

/// Rules-based mode: thresholds and severities come from the active rules.
/// A check whose rule is absent does not run; coverage always runs.
pub fn validate_schedule_with_rules(
    rules: &[LaborLawRule],
    entries: &[ScheduleEntry],
    ctx: &ValidationContext,
) -> Vec<ValidationIssue> {
    let mut by_code: HashMap<RuleCode, &LaborLawRule> = HashMap::new();
    for rule in rules {
        if let Some(code) = RuleCode::parse(&rule.code) {
            by_code.entry(code).or_insert(rule);
        }
    }

    let mut issues = Vec::new();
    for (code, check) in RULE_REGISTRY {
        if let Some(rule) = by_code.get(&code) {
            issues.extend(check(rule, entries, ctx));
        }
    }
    issues.extend(coverage_issues(entries, ctx));
    issues
}
