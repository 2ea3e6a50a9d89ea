//! Round-robin heuristic schedule generator.
//!
//! Deterministic single-pass filler: rotates each role's employee queue
//! over every `(day, shift, role)` requirement, skipping absent employees.
//! Fast fallback and regression baseline; it does not enforce rest or hour
//! caps and ignores store-closed holidays. Its output is checked by the
//! validation engine in basic mode.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use crate::domain::calendar::{month_key, month_span};
use crate::domain::entities::{Absence, Employee, MonthlySchedule, Role};
use crate::domain::repositories::NewScheduleEntry;
use crate::domain::services::configuration::ConfigurationLoader;
use crate::domain::services::generator::{
    GenerationContext, GenerationError, GenerationOutcome, ScheduleGenerator,
};
use crate::domain::services::validation::{validate_schedule, ValidationContext};

pub struct HeuristicGenerator;

#[async_trait]
impl ScheduleGenerator for HeuristicGenerator {
    async fn generate(
        &self,
        ctx: &GenerationContext<'_>,
    ) -> Result<GenerationOutcome, GenerationError> {
        generate_monthly_schedule(ctx).await
    }
}

/// Expand absences into a per-date set of absent employee ids, clipped to
/// the month.
pub(crate) fn build_absence_map(
    absences: &[Absence],
    month_start: NaiveDate,
    month_end: NaiveDate,
) -> HashMap<NaiveDate, HashSet<i64>> {
    let mut map: HashMap<NaiveDate, HashSet<i64>> = HashMap::new();
    for absence in absences {
        let start = absence.from.max(month_start);
        let end = absence.to.min(month_end);
        let mut current = start;
        while current <= end {
            map.entry(current).or_default().insert(absence.employee_id);
            match current.succ_opt() {
                Some(next) => current = next,
                None => break,
            }
        }
    }
    map
}

/// FIFO queue of employee ids per role name, in employee id order.
fn group_employees_by_role(
    employees: &[Employee],
    roles: &[Role],
) -> BTreeMap<String, VecDeque<i64>> {
    let role_names: HashMap<i64, &str> = roles
        .iter()
        .map(|role| (role.id, role.name.as_str()))
        .collect();

    let mut grouped: BTreeMap<String, VecDeque<i64>> = BTreeMap::new();
    for employee in employees {
        let Some(role_name) = employee.role_id.and_then(|id| role_names.get(&id)) else {
            continue;
        };
        grouped
            .entry(role_name.to_string())
            .or_default()
            .push_back(employee.id);
    }
    grouped
}

/// Find the month's schedule, clearing its entries, or create a fresh draft.
pub(crate) async fn prepare_schedule(
    ctx: &GenerationContext<'_>,
) -> Result<MonthlySchedule, GenerationError> {
    let repo = ctx.uow.schedules();
    let key = month_key(ctx.year, ctx.month);
    match repo.find_by_month(&key).await? {
        Some(schedule) => {
            repo.delete_entries(schedule.id).await?;
            Ok(schedule)
        }
        None => Ok(repo.create(&key).await?),
    }
}

async fn generate_monthly_schedule(
    ctx: &GenerationContext<'_>,
) -> Result<GenerationOutcome, GenerationError> {
    let (month_start, month_end) =
        month_span(ctx.year, ctx.month).ok_or(GenerationError::InvalidPeriod)?;

    let workforce = ctx.uow.workforce();
    let employees = workforce.list_employees().await?;
    let shifts = workforce.list_shifts().await?;
    let roles = workforce.list_roles().await?;
    let absences = workforce.list_absences().await?;
    let loader = ConfigurationLoader::new(ctx.uow);
    let holidays = loader.holidays(month_start, month_end).await?;

    if employees.is_empty() || shifts.is_empty() {
        return Err(GenerationError::MissingInput);
    }

    let mut grouped = group_employees_by_role(&employees, &roles);
    if grouped.is_empty() {
        return Err(GenerationError::NoRoleAssignments);
    }

    let absence_map = build_absence_map(&absences, month_start, month_end);
    let schedule = prepare_schedule(ctx).await?;

    tracing::info!(
        month = %schedule.month_key,
        employees = employees.len(),
        shifts = shifts.len(),
        "running heuristic generator"
    );

    let mut new_entries: Vec<NewScheduleEntry> = Vec::new();
    let empty_absences = HashSet::new();

    let mut current_date = month_start;
    while current_date <= month_end {
        let absent_today = absence_map.get(&current_date).unwrap_or(&empty_absences);

        for shift in &shifts {
            if shift.required_staffing.is_empty() {
                continue;
            }

            // One employee may not fill two slots of the same (day, shift).
            let mut taken_today: HashSet<i64> = HashSet::new();

            for (role_name, &required_count) in &shift.required_staffing {
                let queue = grouped
                    .get_mut(role_name)
                    .ok_or_else(|| GenerationError::NoEmployeesForRole {
                        role: role_name.clone(),
                    })?;

                for _ in 0..required_count {
                    if queue.is_empty() {
                        return Err(GenerationError::InsufficientEmployees {
                            role: role_name.clone(),
                        });
                    }

                    let mut assigned = false;
                    for _ in 0..queue.len() {
                        let Some(employee_id) = queue.pop_front() else {
                            break;
                        };
                        if absent_today.contains(&employee_id)
                            || taken_today.contains(&employee_id)
                        {
                            queue.push_back(employee_id);
                            continue;
                        }

                        new_entries.push(NewScheduleEntry {
                            schedule_id: schedule.id,
                            employee_id,
                            shift_id: shift.id,
                            date: current_date,
                        });
                        taken_today.insert(employee_id);
                        queue.push_back(employee_id);
                        assigned = true;
                        break;
                    }

                    if !assigned {
                        return Err(GenerationError::RoleUnavailable {
                            role: role_name.clone(),
                            date: current_date,
                        });
                    }
                }
            }
        }

        let Some(next) = current_date.succ_opt() else {
            break;
        };
        current_date = next;
    }

    let entries = ctx.uow.schedules().insert_entries(new_entries).await?;

    let validation_ctx = ValidationContext::new(&employees, &roles, &shifts, &holidays);
    let issues = validate_schedule(&entries, &validation_ctx);

    tracing::info!(
        month = %schedule.month_key,
        entries = entries.len(),
        issues = issues.len(),
        "heuristic generation finished"
    );

    Ok(GenerationOutcome {
        schedule,
        entries,
        issues,
    })
}
