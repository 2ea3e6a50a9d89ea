//! Constraint-programming schedule generator.
//!
//! Builds a CP-SAT model with one boolean per (employee, day, shift)
//! candidate assignment and solves it under the labor constraints:
//! closed days, exact per-role coverage, daily rest, at most six worked
//! days per seven-day window and the monthly hour cap, minimizing a
//! fairness objective. Round-robin solution hints steer the search toward
//! balanced schedules.

use async_trait::async_trait;
use chrono::NaiveDate;
use shared::DomainError;
use std::collections::{BTreeMap, HashMap};

use crate::domain::calendar::{days_in_month, month_span, overnight_rest_minutes};
use crate::domain::entities::{Employee, Holiday, HourLimit, Role, Shift};
use crate::domain::repositories::NewScheduleEntry;
use crate::domain::services::configuration::{
    fairness_weight, rule_int_param, ConfigurationLoader, RuleCode,
};
use crate::domain::services::generator::{
    GenerationContext, GenerationError, GenerationOutcome, ScheduleGenerator,
};
use crate::domain::services::heuristic::{build_absence_map, prepare_schedule};
use crate::domain::services::validation::{validate_schedule, ValidationContext};
use crate::solver::{CpModelBuilder, CpSolver, IntVar, LinearExpr, SolverParameters};

const DEFAULT_MIN_REST_HOURS: i64 = 11;

pub struct CpSatGenerator;

#[async_trait]
impl ScheduleGenerator for CpSatGenerator {
    async fn generate(
        &self,
        ctx: &GenerationContext<'_>,
    ) -> Result<GenerationOutcome, GenerationError> {
        let (month_start, month_end) =
            month_span(ctx.year, ctx.month).ok_or(GenerationError::InvalidPeriod)?;
        let last_day = days_in_month(ctx.year, ctx.month).ok_or(GenerationError::InvalidPeriod)?;

        let workforce = ctx.uow.workforce();
        let employees = workforce.list_employees().await?;
        let shifts = workforce.list_shifts().await?;
        let roles = workforce.list_roles().await?;
        let absences = workforce.list_absences().await?;
        let hour_limits = workforce.list_hour_limits().await?;

        let loader = ConfigurationLoader::new(ctx.uow);
        let holidays = loader.holidays(month_start, month_end).await?;
        let rules = loader.active_rules(month_start, month_end, None, None).await?;
        let params = loader.generator_params(&ctx.scenario).await?;

        if employees.is_empty() || shifts.is_empty() {
            return Err(GenerationError::MissingInput);
        }

        let min_rest_hours = params
            .as_ref()
            .and_then(|p| p.min_rest_hours_override)
            .map(|hours| hours as i64)
            .unwrap_or_else(|| {
                rules
                    .iter()
                    .find(|rule| RuleCode::parse(&rule.code) == Some(RuleCode::DailyRest))
                    .map(|rule| rule_int_param(rule, "min_hours", DEFAULT_MIN_REST_HOURS))
                    .unwrap_or(DEFAULT_MIN_REST_HOURS)
            });

        let mut builder = ScheduleModelBuilder {
            year: ctx.year,
            month: ctx.month,
            last_day,
            employees: &employees,
            shifts: &shifts,
            roles: &roles,
            holidays: &holidays,
            hour_limits: &hour_limits,
            absence_map: build_absence_map(&absences, month_start, month_end),
            min_rest_hours,
            fairness_weight: fairness_weight(params.as_ref()),
            default_monthly_hours: ctx.default_monthly_hours as i64,
            model: CpModelBuilder::new(),
            assignments: Vec::new(),
            index: HashMap::new(),
            total_required: 0,
        };
        builder.build()?;

        let ScheduleModelBuilder {
            model, assignments, ..
        } = builder;
        let variable_count = assignments.len();

        tracing::info!(
            month = %format!("{:04}-{:02}", ctx.year, ctx.month),
            scenario = %ctx.scenario,
            employees = employees.len(),
            shifts = shifts.len(),
            variables = variable_count,
            "solving schedule model"
        );

        let solver = CpSolver {
            parameters: SolverParameters {
                max_time: ctx.solver_budget,
            },
        };
        let cancel = ctx.cancel.clone();
        let result = tokio::task::spawn_blocking(move || solver.solve(&model, &cancel))
            .await
            .map_err(|err| GenerationError::Storage(DomainError::InternalError(err.to_string())))?;

        if !result.status.is_feasible() {
            return Err(GenerationError::SolverFailed {
                status: result.status,
                employees: employees.len(),
                shifts: shifts.len(),
                variables: variable_count,
            });
        }

        tracing::info!(
            status = %result.status,
            objective = ?result.objective_value,
            "solver finished"
        );

        let schedule = prepare_schedule(ctx).await?;
        let new_entries: Vec<NewScheduleEntry> = assignments
            .iter()
            .filter(|assignment| result.bool_value(assignment.var))
            .map(|assignment| NewScheduleEntry {
                schedule_id: schedule.id,
                employee_id: assignment.employee_id,
                shift_id: assignment.shift_id,
                date: assignment.date,
            })
            .collect();
        let entries = ctx.uow.schedules().insert_entries(new_entries).await?;

        let validation_ctx = ValidationContext::new(&employees, &roles, &shifts, &holidays);
        let issues = validate_schedule(&entries, &validation_ctx);

        Ok(GenerationOutcome {
            schedule,
            entries,
            issues,
        })
    }
}

struct AssignmentVar {
    employee_id: i64,
    date: NaiveDate,
    shift_id: i64,
    var: IntVar,
}

struct ScheduleModelBuilder<'a> {
    year: i32,
    month: u32,
    last_day: u32,
    employees: &'a [Employee],
    shifts: &'a [Shift],
    roles: &'a [Role],
    holidays: &'a [Holiday],
    hour_limits: &'a [HourLimit],
    absence_map: HashMap<NaiveDate, std::collections::HashSet<i64>>,
    min_rest_hours: i64,
    fairness_weight: i64,
    default_monthly_hours: i64,
    model: CpModelBuilder,
    /// Candidate variables in creation order (employee-major).
    assignments: Vec<AssignmentVar>,
    index: HashMap<(i64, u32, i64), IntVar>,
    /// Sum of all coverage requirements that got a constraint.
    total_required: i64,
}

impl ScheduleModelBuilder<'_> {
    fn build(&mut self) -> Result<(), GenerationError> {
        self.create_variables()?;
        self.add_closed_day_constraints();
        self.add_coverage_constraints();
        self.add_daily_rest_constraints();
        self.add_weekly_rest_constraints();
        self.add_monthly_hours_constraints();
        self.add_objective();
        Ok(())
    }

    fn date_of(&self, day: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, day)
    }

    fn var_for(&self, employee_id: i64, day: u32, shift_id: i64) -> Option<IntVar> {
        self.index.get(&(employee_id, day, shift_id)).copied()
    }

    /// Employee ids per role name, in employee id order.
    fn employees_by_role(&self) -> BTreeMap<String, Vec<i64>> {
        let role_names: HashMap<i64, &str> = self
            .roles
            .iter()
            .map(|role| (role.id, role.name.as_str()))
            .collect();
        let mut grouped: BTreeMap<String, Vec<i64>> = BTreeMap::new();
        for employee in self.employees {
            if let Some(name) = employee.role_id.and_then(|id| role_names.get(&id)) {
                grouped.entry(name.to_string()).or_default().push(employee.id);
            }
        }
        grouped
    }

    fn closed_dates(&self) -> std::collections::HashSet<NaiveDate> {
        self.holidays
            .iter()
            .filter(|holiday| holiday.store_closed)
            .map(|holiday| holiday.date)
            .collect()
    }

    /// One boolean per (employee, day, shift); absent employees get no
    /// variable at all.
    fn create_variables(&mut self) -> Result<(), GenerationError> {
        for employee in self.employees {
            for day in 1..=self.last_day {
                let date = self.date_of(day).ok_or(GenerationError::InvalidPeriod)?;
                if self
                    .absence_map
                    .get(&date)
                    .is_some_and(|absent| absent.contains(&employee.id))
                {
                    continue;
                }
                for shift in self.shifts {
                    let var = self.model.new_bool_var();
                    // Unless a coverage hint claims the slot below, steer
                    // the search away from surplus assignments.
                    self.model.add_hint(var, 0);
                    self.assignments.push(AssignmentVar {
                        employee_id: employee.id,
                        date,
                        shift_id: shift.id,
                        var,
                    });
                    self.index.insert((employee.id, day, shift.id), var);
                }
            }
        }
        Ok(())
    }

    fn add_closed_day_constraints(&mut self) {
        let closed = self.closed_dates();
        if closed.is_empty() {
            return;
        }
        for assignment in &self.assignments {
            if closed.contains(&assignment.date) {
                self.model.add_eq(LinearExpr::from(assignment.var), 0);
            }
        }
    }

    /// Exact per-role coverage on every open day, plus round-robin hints
    /// rotating each role's employees across slots.
    fn add_coverage_constraints(&mut self) {
        let closed = self.closed_dates();
        let by_role = self.employees_by_role();
        let mut rotation: HashMap<String, usize> = HashMap::new();

        for day in 1..=self.last_day {
            let Some(date) = self.date_of(day) else {
                continue;
            };
            if closed.contains(&date) {
                continue;
            }

            for shift in self.shifts {
                for (role_name, &required) in &shift.required_staffing {
                    let Some(role_employees) = by_role.get(role_name.as_str()) else {
                        continue;
                    };
                    let candidates: Vec<(i64, IntVar)> = role_employees
                        .iter()
                        .filter_map(|&employee_id| {
                            self.var_for(employee_id, day, shift.id)
                                .map(|var| (employee_id, var))
                        })
                        .collect();
                    if candidates.is_empty() {
                        continue;
                    }

                    let sum = LinearExpr::sum(candidates.iter().map(|(_, var)| *var));
                    self.model.add_eq(sum, required as i64);
                    self.total_required += required as i64;

                    let start = rotation.entry(role_name.clone()).or_insert(0);
                    for offset in 0..(required as usize).min(candidates.len()) {
                        let (_, var) = candidates[(*start + offset) % candidates.len()];
                        self.model.add_hint(var, 1);
                    }
                    *start = (*start + required as usize) % candidates.len();
                }
            }
        }
    }

    /// Forbid adjacent-day shift pairs whose overnight rest is too short.
    fn add_daily_rest_constraints(&mut self) {
        let min_rest_minutes = self.min_rest_hours * 60;
        let mut short_pairs: Vec<(i64, i64)> = Vec::new();
        for first in self.shifts {
            for second in self.shifts {
                if overnight_rest_minutes(first.ends_at, second.starts_at) < min_rest_minutes {
                    short_pairs.push((first.id, second.id));
                }
            }
        }
        if short_pairs.is_empty() {
            return;
        }

        for employee in self.employees {
            for day in 1..self.last_day {
                for &(first_shift, second_shift) in &short_pairs {
                    let (Some(first), Some(second)) = (
                        self.var_for(employee.id, day, first_shift),
                        self.var_for(employee.id, day + 1, second_shift),
                    ) else {
                        continue;
                    };
                    self.model.add_le(LinearExpr::sum([first, second]), 1);
                }
            }
        }
    }

    /// At most six worked days in every seven-day window. `works[e,d]` is
    /// the max over the day's assignment variables and is shared between
    /// overlapping windows.
    fn add_weekly_rest_constraints(&mut self) {
        for employee in self.employees {
            let mut works_by_day: HashMap<u32, IntVar> = HashMap::new();
            for day in 1..=self.last_day {
                let day_vars: Vec<IntVar> = self
                    .shifts
                    .iter()
                    .filter_map(|shift| self.var_for(employee.id, day, shift.id))
                    .collect();
                if day_vars.is_empty() {
                    continue;
                }
                let works = self.model.new_bool_var();
                self.model.add_max_equality(works, &day_vars);
                works_by_day.insert(day, works);
            }

            if self.last_day < 7 {
                continue;
            }
            for start in 1..=self.last_day - 6 {
                let window: Vec<IntVar> = (start..start + 7)
                    .filter_map(|day| works_by_day.get(&day).copied())
                    .collect();
                if !window.is_empty() {
                    self.model.add_le(LinearExpr::sum(window), 6);
                }
            }
        }
    }

    /// Monthly hour cap per employee, in tenths of hours.
    fn add_monthly_hours_constraints(&mut self) {
        let fraction_limits: HashMap<_, _> = self
            .hour_limits
            .iter()
            .filter_map(|limit| {
                limit
                    .max_monthly_hours
                    .map(|hours| (limit.employment_fraction, hours as i64))
            })
            .collect();
        let durations: HashMap<i64, i64> = self
            .shifts
            .iter()
            .map(|shift| (shift.id, shift.duration_tenth_hours()))
            .collect();

        for employee in self.employees {
            let limit = employee
                .monthly_hour_limit
                .map(|hours| hours as i64)
                .or_else(|| fraction_limits.get(&employee.employment_fraction).copied())
                .unwrap_or(self.default_monthly_hours);

            let mut total = LinearExpr::new();
            for assignment in &self.assignments {
                if assignment.employee_id == employee.id {
                    let tenths = durations.get(&assignment.shift_id).copied().unwrap_or(0);
                    total.push(assignment.var, tenths);
                }
            }
            if !total.is_empty() {
                self.model.add_le(total, limit * 10);
            }
        }
    }

    /// Fairness: minimize the deviation of each employee's assignment count
    /// from the slot-count average.
    fn add_objective(&mut self) {
        let mut slots_per_employee: BTreeMap<i64, Vec<IntVar>> = BTreeMap::new();
        for assignment in &self.assignments {
            slots_per_employee
                .entry(assignment.employee_id)
                .or_default()
                .push(assignment.var);
        }
        if slots_per_employee.is_empty() {
            return;
        }

        let total_slots: i64 = slots_per_employee
            .values()
            .map(|vars| vars.len() as i64)
            .sum();
        let staffed = slots_per_employee.len() as i64;
        let avg = total_slots / staffed / staffed;

        let mut objective = LinearExpr::new();
        let mut count_vars = Vec::new();
        let mut deviation_vars = Vec::new();
        for (_, vars) in slots_per_employee {
            let slot_count = vars.len() as i64;
            let count = self.model.new_int_var(0, slot_count);
            let mut link = LinearExpr::from(count);
            for var in vars {
                link.push(var, -1);
            }
            self.model.add_eq(link, 0);
            count_vars.push(count);

            let deviation = self.model.new_int_var(0, slot_count.max(avg));
            self.model
                .add_abs_equality(deviation, LinearExpr::from(count).offset(-avg));
            deviation_vars.push(deviation);
            objective.push(deviation, self.fairness_weight);
        }

        // Implied aggregates the bounds propagation cannot derive on its
        // own: assignments can only exceed the summed coverage
        // requirements, and the total deviation is at least the amount by
        // which that total overshoots `staffed * avg`. Both sharpen the
        // branch-and-bound refutation.
        if self.total_required > 0 {
            self.model
                .add_ge(LinearExpr::sum(count_vars), self.total_required);
            let overshoot = self.total_required - staffed * avg;
            if overshoot > 0 {
                self.model
                    .add_ge(LinearExpr::sum(deviation_vars), overshoot);
            }
        }

        self.model.minimize(objective);
    }
}
