//! Centralized access to the durable configuration surface: labor law
//! rules, holidays, staffing templates, generator parameters, hour limits
//! and employee preferences.
//!
//! The loader is the only component that interprets rule parameter bags and
//! weight maps; generators and the validator go through the helpers below.

use chrono::{NaiveDate, Utc};
use serde_json::{Map, Value};
use shared::{DayType, DomainError, DomainResult, EmploymentFraction, RuleSeverity};
use std::collections::HashMap;

use crate::domain::entities::{
    GeneratorParameters, Holiday, HourLimit, LaborLawRule, StaffingTemplate,
};
use crate::domain::repositories::{ConfigRepository, UnitOfWork, WorkforceRepository};

pub const DEFAULT_SCENARIO: &str = "DEFAULT";

/// Canonical identity of a labor law rule. Stored codes are matched
/// case-insensitively against the legacy Polish aliases and the seed
/// constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleCode {
    DailyRest,
    WeeklyRest,
    HoursLimit,
    HolidayWork,
}

impl RuleCode {
    pub fn parse(code: &str) -> Option<Self> {
        match code.to_ascii_lowercase().as_str() {
            "rest_daily" | "odpoczynek_dobowy" => Some(RuleCode::DailyRest),
            "rest_weekly" | "odpoczynek_tygodniowy" => Some(RuleCode::WeeklyRest),
            "hours_weekly_max" | "limit_godzin_miesieczny" => Some(RuleCode::HoursLimit),
            "praca_w_swieto" | "holiday_work" => Some(RuleCode::HolidayWork),
            _ => None,
        }
    }
}

/// Integer parameter from a rule's bag, falling back when the key is
/// missing or the bag is absent.
pub fn rule_int_param(rule: &LaborLawRule, key: &str, default: i64) -> i64 {
    rule.parameters
        .as_ref()
        .and_then(|params| params.get(key))
        .and_then(Value::as_i64)
        .unwrap_or(default)
}

/// Fairness weight from a scenario's weight map (default 10).
pub fn fairness_weight(params: Option<&GeneratorParameters>) -> i64 {
    params
        .and_then(|p| p.weights.get("fairness"))
        .and_then(Value::as_i64)
        .unwrap_or(10)
}

pub struct ConfigurationLoader<'a> {
    config: &'a dyn ConfigRepository,
    workforce: &'a dyn WorkforceRepository,
}

impl<'a> ConfigurationLoader<'a> {
    pub fn new(uow: &'a dyn UnitOfWork) -> Self {
        Self {
            config: uow.config(),
            workforce: uow.workforce(),
        }
    }

    pub fn from_parts(
        config: &'a dyn ConfigRepository,
        workforce: &'a dyn WorkforceRepository,
    ) -> Self {
        Self { config, workforce }
    }

    /// Rules whose active window intersects `[from, to]`; open bounds are
    /// open-ended. Optional category/severity filters.
    pub async fn active_rules(
        &self,
        from: NaiveDate,
        to: NaiveDate,
        category: Option<&str>,
        severity: Option<RuleSeverity>,
    ) -> DomainResult<Vec<LaborLawRule>> {
        let mut rules = self.config.list_rules().await?;
        rules.retain(|rule| {
            rule.is_active(from, to)
                && category.map_or(true, |c| rule.category == c)
                && severity.map_or(true, |s| rule.severity == s)
        });
        Ok(rules)
    }

    /// Rule lookup by code, canonicalised case-insensitively; unknown codes
    /// fall back to an exact match.
    pub async fn rule_by_code(&self, code: &str) -> DomainResult<Option<LaborLawRule>> {
        let rules = self.config.list_rules().await?;
        let found = match RuleCode::parse(code) {
            Some(canonical) => rules
                .into_iter()
                .find(|rule| RuleCode::parse(&rule.code) == Some(canonical)),
            None => rules.into_iter().find(|rule| rule.code == code),
        };
        Ok(found)
    }

    /// Holidays within `[from, to]`, ordered by date.
    pub async fn holidays(&self, from: NaiveDate, to: NaiveDate) -> DomainResult<Vec<Holiday>> {
        let mut holidays = self.config.list_holidays().await?;
        holidays.retain(|holiday| holiday.date >= from && holiday.date <= to);
        holidays.sort_by_key(|holiday| holiday.date);
        Ok(holidays)
    }

    pub async fn holiday_on(&self, date: NaiveDate) -> DomainResult<Option<Holiday>> {
        let holidays = self.config.list_holidays().await?;
        Ok(holidays.into_iter().find(|holiday| holiday.date == date))
    }

    pub async fn staffing_templates(
        &self,
        day_type: Option<DayType>,
        shift_id: Option<i64>,
        role_id: Option<i64>,
        effective: Option<NaiveDate>,
    ) -> DomainResult<Vec<StaffingTemplate>> {
        let mut templates = self.config.list_staffing_templates().await?;
        templates.retain(|template| {
            day_type.map_or(true, |d| template.day_type == d)
                && shift_id.map_or(true, |id| template.shift_id == id)
                && role_id.map_or(true, |id| template.role_id == id)
                && effective.map_or(true, |date| template.is_effective(date))
        });
        Ok(templates)
    }

    /// Parameters for a scenario, falling back to `DEFAULT` when the
    /// requested scenario has no record.
    pub async fn generator_params(
        &self,
        scenario: &str,
    ) -> DomainResult<Option<GeneratorParameters>> {
        let params = self.config.list_generator_parameters().await?;
        let exact = params.iter().find(|p| p.scenario == scenario).cloned();
        if exact.is_some() || scenario == DEFAULT_SCENARIO {
            return Ok(exact);
        }
        Ok(params
            .into_iter()
            .find(|p| p.scenario == DEFAULT_SCENARIO))
    }

    pub async fn employee_preferences(
        &self,
        employee_id: i64,
    ) -> DomainResult<Map<String, Value>> {
        let employee = self.workforce.find_employee(employee_id).await?;
        Ok(employee
            .and_then(|e| e.preferences)
            .unwrap_or_default())
    }

    pub async fn all_preferences(&self) -> DomainResult<HashMap<i64, Map<String, Value>>> {
        let employees = self.workforce.list_employees().await?;
        Ok(employees
            .into_iter()
            .filter_map(|e| e.preferences.map(|prefs| (e.id, prefs)))
            .collect())
    }

    /// Hard hour caps for one employment fraction, if configured.
    pub async fn hour_limit_for(
        &self,
        fraction: EmploymentFraction,
    ) -> DomainResult<Option<HourLimit>> {
        let limits = self.workforce.list_hour_limits().await?;
        Ok(limits
            .into_iter()
            .find(|limit| limit.employment_fraction == fraction))
    }

    /// Create or update a holiday keyed by its calendar date.
    pub async fn upsert_holiday(
        &self,
        date: NaiveDate,
        name: &str,
        coverage_overrides: Option<Value>,
        store_closed: bool,
    ) -> DomainResult<Holiday> {
        self.config
            .upsert_holiday(Holiday {
                id: 0,
                date,
                name: name.to_string(),
                coverage_overrides,
                store_closed,
            })
            .await
    }

    /// Create or update a staffing template keyed by
    /// `(day_type, shift_id, role_id)`. Enforces the bounds relation.
    #[allow(clippy::too_many_arguments)]
    pub async fn upsert_staffing_template(
        &self,
        day_type: DayType,
        shift_id: i64,
        role_id: i64,
        min_staff: u32,
        target_staff: u32,
        max_staff: Option<u32>,
        effective_from: Option<NaiveDate>,
        effective_to: Option<NaiveDate>,
    ) -> DomainResult<StaffingTemplate> {
        if min_staff > target_staff || max_staff.is_some_and(|max| target_staff > max) {
            return Err(DomainError::InvalidInput(
                "wymagane min_staff <= target_staff <= max_staff".to_string(),
            ));
        }
        self.config
            .upsert_staffing_template(StaffingTemplate {
                id: 0,
                day_type,
                shift_id,
                role_id,
                min_staff,
                target_staff,
                max_staff,
                effective_from,
                effective_to,
            })
            .await
    }

    /// Create or update generator parameters keyed by scenario tag.
    pub async fn upsert_generator_parameters(
        &self,
        scenario: &str,
        weights: Map<String, Value>,
        max_consecutive_nights: Option<i32>,
        min_rest_hours_override: Option<i32>,
        last_updated_by: Option<String>,
    ) -> DomainResult<GeneratorParameters> {
        self.config
            .upsert_generator_parameters(GeneratorParameters {
                id: 0,
                scenario: scenario.to_string(),
                weights,
                max_consecutive_nights,
                min_rest_hours_override,
                last_updated_by,
                updated_at: Utc::now(),
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repositories::{MockConfigRepository, MockWorkforceRepository};

    fn rule(code: &str, severity: RuleSeverity) -> LaborLawRule {
        LaborLawRule {
            id: 1,
            code: code.to_string(),
            name: code.to_string(),
            category: "REST".to_string(),
            severity,
            parameters: Some(serde_json::json!({ "min_hours": 10 })),
            description: None,
            active_from: None,
            active_to: None,
        }
    }

    fn params(scenario: &str) -> GeneratorParameters {
        GeneratorParameters {
            id: 1,
            scenario: scenario.to_string(),
            weights: Map::new(),
            max_consecutive_nights: None,
            min_rest_hours_override: None,
            last_updated_by: None,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_rule_code_aliases() {
        assert_eq!(RuleCode::parse("REST_DAILY"), Some(RuleCode::DailyRest));
        assert_eq!(
            RuleCode::parse("odpoczynek_dobowy"),
            Some(RuleCode::DailyRest)
        );
        assert_eq!(
            RuleCode::parse("Limit_Godzin_Miesieczny"),
            Some(RuleCode::HoursLimit)
        );
        assert_eq!(RuleCode::parse("praca_w_swieto"), Some(RuleCode::HolidayWork));
        assert_eq!(RuleCode::parse("nonsense"), None);
    }

    #[test]
    fn test_rule_int_param_defaults() {
        let r = rule("REST_DAILY", RuleSeverity::Soft);
        assert_eq!(rule_int_param(&r, "min_hours", 11), 10);
        assert_eq!(rule_int_param(&r, "missing", 11), 11);
    }

    #[tokio::test]
    async fn test_rule_by_code_is_case_insensitive() {
        let mut config = MockConfigRepository::new();
        config
            .expect_list_rules()
            .returning(|| Ok(vec![rule("REST_DAILY", RuleSeverity::Hard)]));
        let workforce = MockWorkforceRepository::new();
        let loader = ConfigurationLoader::from_parts(&config, &workforce);

        let found = loader.rule_by_code("odpoczynek_dobowy").await.unwrap();
        assert_eq!(found.map(|r| r.code), Some("REST_DAILY".to_string()));
    }

    #[tokio::test]
    async fn test_generator_params_fallback_to_default() {
        let mut config = MockConfigRepository::new();
        config
            .expect_list_generator_parameters()
            .returning(|| Ok(vec![params("DEFAULT")]));
        let workforce = MockWorkforceRepository::new();
        let loader = ConfigurationLoader::from_parts(&config, &workforce);

        let found = loader.generator_params("NIGHT_FOCUS").await.unwrap();
        assert_eq!(found.map(|p| p.scenario), Some("DEFAULT".to_string()));
    }

    #[tokio::test]
    async fn test_generator_params_missing_entirely() {
        let mut config = MockConfigRepository::new();
        config
            .expect_list_generator_parameters()
            .returning(|| Ok(Vec::new()));
        let workforce = MockWorkforceRepository::new();
        let loader = ConfigurationLoader::from_parts(&config, &workforce);

        assert!(loader.generator_params("PEAK_SEASON").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_holidays_are_windowed_and_ordered() {
        let mut config = MockConfigRepository::new();
        config.expect_list_holidays().returning(|| {
            let holiday = |id, day, name: &str| Holiday {
                id,
                date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
                name: name.to_string(),
                coverage_overrides: None,
                store_closed: false,
            };
            Ok(vec![
                holiday(1, 6, "Trzech Króli"),
                holiday(2, 1, "Nowy Rok"),
            ])
        });
        let workforce = MockWorkforceRepository::new();
        let loader = ConfigurationLoader::from_parts(&config, &workforce);

        let jan1 = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let jan5 = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        let jan31 = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();

        let all = loader.holidays(jan1, jan31).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].name, "Nowy Rok");

        let clipped = loader.holidays(jan1, jan5).await.unwrap();
        assert_eq!(clipped.len(), 1);

        assert!(loader.holiday_on(jan1).await.unwrap().is_some());
        assert!(loader.holiday_on(jan5).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_staffing_template_filters() {
        let mut config = MockConfigRepository::new();
        config.expect_list_staffing_templates().returning(|| {
            Ok(vec![
                StaffingTemplate {
                    id: 1,
                    day_type: DayType::Weekday,
                    shift_id: 1,
                    role_id: 1,
                    min_staff: 1,
                    target_staff: 2,
                    max_staff: Some(3),
                    effective_from: None,
                    effective_to: NaiveDate::from_ymd_opt(2024, 6, 30),
                },
                StaffingTemplate {
                    id: 2,
                    day_type: DayType::Weekend,
                    shift_id: 1,
                    role_id: 1,
                    min_staff: 1,
                    target_staff: 1,
                    max_staff: None,
                    effective_from: None,
                    effective_to: None,
                },
            ])
        });
        let workforce = MockWorkforceRepository::new();
        let loader = ConfigurationLoader::from_parts(&config, &workforce);

        let weekday = loader
            .staffing_templates(Some(DayType::Weekday), None, None, None)
            .await
            .unwrap();
        assert_eq!(weekday.len(), 1);
        assert_eq!(weekday[0].id, 1);

        // The weekday template expired mid-year.
        let effective = loader
            .staffing_templates(None, Some(1), None, NaiveDate::from_ymd_opt(2024, 7, 1))
            .await
            .unwrap();
        assert_eq!(effective.len(), 1);
        assert_eq!(effective[0].id, 2);
    }

    #[tokio::test]
    async fn test_employee_preferences_default_to_empty() {
        let config = MockConfigRepository::new();
        let mut workforce = MockWorkforceRepository::new();
        workforce.expect_find_employee().returning(|id| {
            Ok(Some(crate::domain::entities::Employee {
                id,
                first_name: "Anna".to_string(),
                last_name: "Test".to_string(),
                role_id: None,
                employment_fraction: EmploymentFraction::FullTime,
                monthly_hour_limit: None,
                preferences: None,
                hired_on: None,
            }))
        });
        let loader = ConfigurationLoader::from_parts(&config, &workforce);

        assert!(loader.employee_preferences(1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_hour_limit_lookup_by_fraction() {
        let config = MockConfigRepository::new();
        let mut workforce = MockWorkforceRepository::new();
        workforce.expect_list_hour_limits().returning(|| {
            Ok(vec![crate::domain::entities::HourLimit {
                id: 1,
                employment_fraction: EmploymentFraction::HalfTime,
                max_daily_hours: None,
                max_weekly_hours: None,
                max_monthly_hours: Some(80),
                max_quarterly_hours: None,
            }])
        });
        let loader = ConfigurationLoader::from_parts(&config, &workforce);

        let limit = loader
            .hour_limit_for(EmploymentFraction::HalfTime)
            .await
            .unwrap();
        assert_eq!(limit.and_then(|l| l.max_monthly_hours), Some(80));
        let missing = loader
            .hour_limit_for(EmploymentFraction::FullTime)
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_upsert_template_rejects_inverted_bounds() {
        let config = MockConfigRepository::new();
        let workforce = MockWorkforceRepository::new();
        let loader = ConfigurationLoader::from_parts(&config, &workforce);

        let result = loader
            .upsert_staffing_template(DayType::Weekday, 1, 1, 3, 2, None, None, None)
            .await;
        assert!(matches!(result, Err(DomainError::InvalidInput(_))));
    }
}
