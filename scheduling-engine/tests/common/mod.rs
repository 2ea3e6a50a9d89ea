#![allow(dead_code)]

use chrono::{NaiveDate, NaiveTime};
use serde_json::Value;
use shared::RuleSeverity;
use std::collections::BTreeMap;
use std::sync::Arc;

use scheduling_engine::application::GenerationFacade;
use scheduling_engine::domain::entities::{LaborLawRule, Shift};
use scheduling_engine::infrastructure::config::{LimitSettings, Settings, SolverSettings};
use scheduling_engine::InMemoryStore;

pub fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
}

pub fn time(hour: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, 0, 0).unwrap()
}

pub fn staffing(required: &[(&str, u32)]) -> BTreeMap<String, u32> {
    required
        .iter()
        .map(|(role, count)| (role.to_string(), *count))
        .collect()
}

/// Settings with a short solver budget so a wedged model fails the test
/// run instead of stalling it.
pub fn test_settings() -> Settings {
    Settings {
        solver: SolverSettings {
            max_time_seconds: 10,
        },
        limits: LimitSettings {
            default_monthly_hours: 160,
        },
    }
}

pub fn facade(store: &InMemoryStore) -> GenerationFacade {
    GenerationFacade::new(Arc::new(store.clone()), test_settings())
}

/// One `Kasjer` role, `count` cashiers and a morning shift requiring
/// `required` of them. The staple scenario of the original test suite.
pub fn seed_cashier_setup(store: &InMemoryStore, count: usize, required: u32) -> Shift {
    let role = store.seed_role("Kasjer");
    let names = ["Anna", "Jan", "Maria", "Piotr", "Ewa"];
    for index in 0..count {
        let name = names[index % names.len()];
        store.seed_employee(name, "Test", Some(role.id));
    }
    store.seed_shift(
        "Poranna",
        time(8),
        time(16),
        staffing(&[("Kasjer", required)]),
    )
}

pub fn seed_rule(
    store: &InMemoryStore,
    code: &str,
    severity: RuleSeverity,
    parameters: Value,
) -> LaborLawRule {
    store.seed_rule(LaborLawRule {
        id: 0,
        code: code.to_string(),
        name: code.to_string(),
        category: "REST".to_string(),
        severity,
        parameters: Some(parameters),
        description: None,
        active_from: None,
        active_to: None,
    })
}
