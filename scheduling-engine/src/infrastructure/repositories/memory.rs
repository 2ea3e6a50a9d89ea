//! In-memory realisation of the persistence boundary.
//!
//! One `InMemoryStore` holds the committed dataset. Each unit of work
//! clones it, mutates the working copy, and publishes it back on commit;
//! rollback simply drops the copy. Concurrent units of work for the same
//! month race and the last committer wins, which matches the human-driven
//! cadence of the workflow.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime, Utc};
use parking_lot::RwLock;
use shared::{DomainError, DomainResult, ScheduleStatus};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use crate::domain::entities::{
    Absence, Employee, GeneratorParameters, Holiday, HourLimit, LaborLawRule, MonthlySchedule,
    Role, ScheduleEntry, Shift, StaffingTemplate,
};
use crate::domain::repositories::{
    ConfigRepository, NewScheduleEntry, ScheduleRepository, SessionFactory, UnitOfWork,
    WorkforceRepository,
};

#[derive(Debug, Clone, Default)]
struct StoreData {
    roles: BTreeMap<i64, Role>,
    employees: BTreeMap<i64, Employee>,
    shifts: BTreeMap<i64, Shift>,
    absences: BTreeMap<i64, Absence>,
    holidays: BTreeMap<i64, Holiday>,
    rules: BTreeMap<i64, LaborLawRule>,
    templates: BTreeMap<i64, StaffingTemplate>,
    generator_parameters: BTreeMap<i64, GeneratorParameters>,
    hour_limits: BTreeMap<i64, HourLimit>,
    schedules: BTreeMap<i64, MonthlySchedule>,
    entries: BTreeMap<i64, ScheduleEntry>,
    next_id: i64,
}

impl StoreData {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn insert_absence(&mut self, mut absence: Absence) -> DomainResult<Absence> {
        if absence.from > absence.to {
            return Err(DomainError::InvalidInput(
                "absence range end precedes its start".to_string(),
            ));
        }
        if let Some(existing) = self
            .absences
            .values()
            .find(|existing| existing.conflicts_with(&absence))
        {
            return Err(DomainError::InvalidInput(format!(
                "absence overlaps an existing '{}' absence",
                existing.kind
            )));
        }
        absence.id = self.next_id();
        self.absences.insert(absence.id, absence.clone());
        Ok(absence)
    }

    fn insert_entries(
        &mut self,
        new_entries: Vec<NewScheduleEntry>,
    ) -> DomainResult<Vec<ScheduleEntry>> {
        let mut seen: HashSet<(i64, i64, NaiveDate, i64)> = self
            .entries
            .values()
            .map(|entry| (entry.schedule_id, entry.employee_id, entry.date, entry.shift_id))
            .collect();

        let mut inserted = Vec::with_capacity(new_entries.len());
        for new_entry in new_entries {
            let key = (
                new_entry.schedule_id,
                new_entry.employee_id,
                new_entry.date,
                new_entry.shift_id,
            );
            if !seen.insert(key) {
                return Err(DomainError::InvalidInput(format!(
                    "duplicate schedule entry for employee {} on {}",
                    new_entry.employee_id, new_entry.date
                )));
            }
            let entry = ScheduleEntry {
                id: self.next_id(),
                schedule_id: new_entry.schedule_id,
                employee_id: new_entry.employee_id,
                shift_id: new_entry.shift_id,
                date: new_entry.date,
            };
            self.entries.insert(entry.id, entry.clone());
            inserted.push(entry);
        }
        Ok(inserted)
    }
}

/// Shared in-memory store. Cheap to clone; clones share the dataset.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    data: Arc<RwLock<StoreData>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // Seed helpers write directly to the committed dataset, standing in
    // for the out-of-scope CRUD boundary.

    pub fn seed_role(&self, name: &str) -> Role {
        let mut data = self.data.write();
        let role = Role {
            id: data.next_id(),
            name: name.to_string(),
            min_staff: None,
            max_staff: None,
        };
        data.roles.insert(role.id, role.clone());
        role
    }

    pub fn seed_employee(&self, first_name: &str, last_name: &str, role_id: Option<i64>) -> Employee {
        self.insert_employee(Employee {
            id: 0,
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            role_id,
            employment_fraction: shared::EmploymentFraction::FullTime,
            monthly_hour_limit: None,
            preferences: None,
            hired_on: None,
        })
    }

    pub fn insert_employee(&self, mut employee: Employee) -> Employee {
        let mut data = self.data.write();
        employee.id = data.next_id();
        data.employees.insert(employee.id, employee.clone());
        employee
    }

    pub fn seed_shift(
        &self,
        name: &str,
        starts_at: NaiveTime,
        ends_at: NaiveTime,
        required_staffing: BTreeMap<String, u32>,
    ) -> Shift {
        let mut data = self.data.write();
        let shift = Shift {
            id: data.next_id(),
            name: name.to_string(),
            starts_at,
            ends_at,
            required_staffing,
        };
        data.shifts.insert(shift.id, shift.clone());
        shift
    }

    pub fn seed_absence(
        &self,
        employee_id: i64,
        kind: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> DomainResult<Absence> {
        self.data.write().insert_absence(Absence {
            id: 0,
            employee_id,
            kind: kind.to_string(),
            from,
            to,
        })
    }

    pub fn seed_holiday(&self, date: NaiveDate, name: &str, store_closed: bool) -> Holiday {
        let mut data = self.data.write();
        let holiday = Holiday {
            id: data.next_id(),
            date,
            name: name.to_string(),
            coverage_overrides: None,
            store_closed,
        };
        data.holidays.insert(holiday.id, holiday.clone());
        holiday
    }

    pub fn seed_rule(&self, mut rule: LaborLawRule) -> LaborLawRule {
        let mut data = self.data.write();
        rule.id = data.next_id();
        data.rules.insert(rule.id, rule.clone());
        rule
    }

    pub fn seed_generator_parameters(&self, mut params: GeneratorParameters) -> GeneratorParameters {
        let mut data = self.data.write();
        params.id = data.next_id();
        data.generator_parameters.insert(params.id, params.clone());
        params
    }

    pub fn seed_hour_limit(&self, mut limit: HourLimit) -> HourLimit {
        let mut data = self.data.write();
        limit.id = data.next_id();
        data.hour_limits.insert(limit.id, limit.clone());
        limit
    }

    // Committed-state readers used by tests and the demo binary.

    pub fn schedule_by_month(&self, month_key: &str) -> Option<MonthlySchedule> {
        self.data
            .read()
            .schedules
            .values()
            .find(|schedule| schedule.month_key == month_key)
            .cloned()
    }

    pub fn entries_of(&self, schedule_id: i64) -> Vec<ScheduleEntry> {
        let data = self.data.read();
        let mut entries: Vec<ScheduleEntry> = data
            .entries
            .values()
            .filter(|entry| entry.schedule_id == schedule_id)
            .cloned()
            .collect();
        entries.sort_by_key(|entry| (entry.date, entry.shift_id, entry.employee_id));
        entries
    }
}

impl SessionFactory for InMemoryStore {
    fn begin(&self) -> Box<dyn UnitOfWork> {
        Box::new(InMemoryUnitOfWork {
            working: RwLock::new(self.data.read().clone()),
            shared: Arc::clone(&self.data),
        })
    }
}

/// Snapshot-transaction over the store: reads and writes hit the working
/// copy only until `commit` publishes it.
pub struct InMemoryUnitOfWork {
    working: RwLock<StoreData>,
    shared: Arc<RwLock<StoreData>>,
}

#[async_trait]
impl UnitOfWork for InMemoryUnitOfWork {
    fn workforce(&self) -> &dyn WorkforceRepository {
        self
    }

    fn config(&self) -> &dyn ConfigRepository {
        self
    }

    fn schedules(&self) -> &dyn ScheduleRepository {
        self
    }

    async fn commit(self: Box<Self>) -> DomainResult<()> {
        let this = *self;
        *this.shared.write() = this.working.into_inner();
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> DomainResult<()> {
        Ok(())
    }
}

#[async_trait]
impl WorkforceRepository for InMemoryUnitOfWork {
    async fn list_roles(&self) -> DomainResult<Vec<Role>> {
        Ok(self.working.read().roles.values().cloned().collect())
    }

    async fn list_employees(&self) -> DomainResult<Vec<Employee>> {
        Ok(self.working.read().employees.values().cloned().collect())
    }

    async fn find_employee(&self, id: i64) -> DomainResult<Option<Employee>> {
        Ok(self.working.read().employees.get(&id).cloned())
    }

    async fn list_shifts(&self) -> DomainResult<Vec<Shift>> {
        Ok(self.working.read().shifts.values().cloned().collect())
    }

    async fn find_shift(&self, id: i64) -> DomainResult<Option<Shift>> {
        Ok(self.working.read().shifts.get(&id).cloned())
    }

    async fn list_absences(&self) -> DomainResult<Vec<Absence>> {
        Ok(self.working.read().absences.values().cloned().collect())
    }

    async fn list_hour_limits(&self) -> DomainResult<Vec<HourLimit>> {
        Ok(self.working.read().hour_limits.values().cloned().collect())
    }
}

#[async_trait]
impl ConfigRepository for InMemoryUnitOfWork {
    async fn list_rules(&self) -> DomainResult<Vec<LaborLawRule>> {
        Ok(self.working.read().rules.values().cloned().collect())
    }

    async fn list_holidays(&self) -> DomainResult<Vec<Holiday>> {
        Ok(self.working.read().holidays.values().cloned().collect())
    }

    async fn list_staffing_templates(&self) -> DomainResult<Vec<StaffingTemplate>> {
        Ok(self.working.read().templates.values().cloned().collect())
    }

    async fn list_generator_parameters(&self) -> DomainResult<Vec<GeneratorParameters>> {
        Ok(self
            .working
            .read()
            .generator_parameters
            .values()
            .cloned()
            .collect())
    }

    async fn upsert_holiday(&self, holiday: Holiday) -> DomainResult<Holiday> {
        let mut data = self.working.write();
        if let Some(existing) = data
            .holidays
            .values_mut()
            .find(|existing| existing.date == holiday.date)
        {
            existing.name = holiday.name;
            existing.coverage_overrides = holiday.coverage_overrides;
            existing.store_closed = holiday.store_closed;
            return Ok(existing.clone());
        }
        let mut holiday = holiday;
        holiday.id = data.next_id();
        data.holidays.insert(holiday.id, holiday.clone());
        Ok(holiday)
    }

    async fn upsert_staffing_template(
        &self,
        template: StaffingTemplate,
    ) -> DomainResult<StaffingTemplate> {
        let mut data = self.working.write();
        if let Some(existing) = data.templates.values_mut().find(|existing| {
            existing.day_type == template.day_type
                && existing.shift_id == template.shift_id
                && existing.role_id == template.role_id
        }) {
            existing.min_staff = template.min_staff;
            existing.target_staff = template.target_staff;
            existing.max_staff = template.max_staff;
            existing.effective_from = template.effective_from;
            existing.effective_to = template.effective_to;
            return Ok(existing.clone());
        }
        let mut template = template;
        template.id = data.next_id();
        data.templates.insert(template.id, template.clone());
        Ok(template)
    }

    async fn upsert_generator_parameters(
        &self,
        params: GeneratorParameters,
    ) -> DomainResult<GeneratorParameters> {
        let mut data = self.working.write();
        if let Some(existing) = data
            .generator_parameters
            .values_mut()
            .find(|existing| existing.scenario == params.scenario)
        {
            existing.weights = params.weights;
            existing.max_consecutive_nights = params.max_consecutive_nights;
            existing.min_rest_hours_override = params.min_rest_hours_override;
            existing.last_updated_by = params.last_updated_by;
            existing.updated_at = params.updated_at;
            return Ok(existing.clone());
        }
        let mut params = params;
        params.id = data.next_id();
        data.generator_parameters.insert(params.id, params.clone());
        Ok(params)
    }
}

#[async_trait]
impl ScheduleRepository for InMemoryUnitOfWork {
    async fn find_by_month(&self, month_key: &str) -> DomainResult<Option<MonthlySchedule>> {
        Ok(self
            .working
            .read()
            .schedules
            .values()
            .find(|schedule| schedule.month_key == month_key)
            .cloned())
    }

    async fn find_by_id(&self, id: i64) -> DomainResult<Option<MonthlySchedule>> {
        Ok(self.working.read().schedules.get(&id).cloned())
    }

    async fn create(&self, month_key: &str) -> DomainResult<MonthlySchedule> {
        let mut data = self.working.write();
        if data
            .schedules
            .values()
            .any(|schedule| schedule.month_key == month_key)
        {
            return Err(DomainError::StorageError(format!(
                "schedule for {month_key} already exists"
            )));
        }
        let schedule = MonthlySchedule {
            id: data.next_id(),
            month_key: month_key.to_string(),
            status: ScheduleStatus::Draft,
            created_at: Utc::now(),
        };
        data.schedules.insert(schedule.id, schedule.clone());
        Ok(schedule)
    }

    async fn delete_entries(&self, schedule_id: i64) -> DomainResult<()> {
        self.working
            .write()
            .entries
            .retain(|_, entry| entry.schedule_id != schedule_id);
        Ok(())
    }

    async fn insert_entries(
        &self,
        entries: Vec<NewScheduleEntry>,
    ) -> DomainResult<Vec<ScheduleEntry>> {
        self.working.write().insert_entries(entries)
    }

    async fn entries_for_schedule(&self, schedule_id: i64) -> DomainResult<Vec<ScheduleEntry>> {
        let data = self.working.read();
        let mut entries: Vec<ScheduleEntry> = data
            .entries
            .values()
            .filter(|entry| entry.schedule_id == schedule_id)
            .cloned()
            .collect();
        entries.sort_by_key(|entry| (entry.date, entry.shift_id, entry.employee_id));
        Ok(entries)
    }
}
