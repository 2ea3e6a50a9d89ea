mod common;

use serde_json::json;
use shared::{DomainError, IssueLevel, RuleSeverity};
use std::sync::Arc;

use common::{date, seed_rule, staffing, time};
use scheduling_engine::application::{EntryPayload, ValidationService};
use scheduling_engine::domain::repositories::{NewScheduleEntry, SessionFactory};
use scheduling_engine::InMemoryStore;

fn service(store: &InMemoryStore) -> ValidationService {
    ValidationService::new(Arc::new(store.clone()))
}

/// Persist a schedule with one entry per given (day, employee, shift).
async fn persist_schedule(store: &InMemoryStore, entries: &[(u32, i64, i64)]) -> i64 {
    let uow = store.begin();
    let schedule = uow.schedules().create("2024-01").await.unwrap();
    let new_entries = entries
        .iter()
        .map(|&(day, employee_id, shift_id)| NewScheduleEntry {
            schedule_id: schedule.id,
            employee_id,
            shift_id,
            date: date(day),
        })
        .collect();
    uow.schedules().insert_entries(new_entries).await.unwrap();
    uow.commit().await.unwrap();
    schedule.id
}

#[tokio::test]
async fn test_coverage_shortfall_is_blocking() {
    let store = InMemoryStore::new();
    let role = store.seed_role("Kasjer");
    let employee = store.seed_employee("Anna", "Test", Some(role.id));
    let shift = store.seed_shift("Poranna", time(8), time(16), staffing(&[("Kasjer", 2)]));

    let schedule_id = persist_schedule(&store, &[(1, employee.id, shift.id)]).await;

    // Both modes flag the shortfall as a blocking error.
    for use_rules in [false, true] {
        let report = service(&store)
            .validate_schedule_by_id(schedule_id, use_rules)
            .await
            .unwrap();
        assert_eq!(report.validation_summary.total_issues, 1);
        assert_eq!(report.validation_summary.blocking_issues, 1);
        assert!(!report.validation_summary.passed);
        assert!(report.issues[0].message.contains("brakuje 1"));
    }

    let basic = service(&store)
        .validate_schedule_by_id(schedule_id, false)
        .await
        .unwrap();
    assert_eq!(basic.validation_type.as_deref(), Some("basic"));
    let rules = service(&store)
        .validate_schedule_by_id(schedule_id, true)
        .await
        .unwrap();
    assert_eq!(rules.validation_type.as_deref(), Some("rules-based"));
}

#[tokio::test]
async fn test_daily_rest_severity_follows_rule() {
    let store = InMemoryStore::new();
    let role = store.seed_role("Kasjer");
    let employee = store.seed_employee("Anna", "Test", Some(role.id));
    let late = store.seed_shift("Wieczorna", time(14), time(22), staffing(&[]));
    let early = store.seed_shift("Poranna", time(6), time(14), staffing(&[]));
    seed_rule(
        &store,
        "REST_DAILY",
        RuleSeverity::Hard,
        json!({ "min_hours": 11 }),
    );

    let payload = vec![
        EntryPayload {
            employee_id: employee.id,
            shift_id: late.id,
            date: date(1),
        },
        EntryPayload {
            employee_id: employee.id,
            shift_id: early.id,
            date: date(2),
        },
    ];

    let report = service(&store)
        .validate_entries(payload.clone(), 2024, 1, true)
        .await
        .unwrap();
    assert_eq!(report.entry_count, Some(2));
    assert_eq!(report.validation_summary.blocking_issues, 1);
    assert_eq!(report.issues[0].rule_code.as_deref(), Some("REST_DAILY"));
    assert!(report.issues[0].message.contains("11 godzin odpoczynku"));

    // Without the rule loaded, basic mode reports the same gap as a warning.
    let report = service(&store)
        .validate_entries(payload, 2024, 1, false)
        .await
        .unwrap();
    assert_eq!(report.validation_summary.blocking_issues, 0);
    assert_eq!(report.validation_summary.warnings, 1);
    assert_eq!(report.issues[0].level, IssueLevel::Warning);
}

#[tokio::test]
async fn test_weekly_rest_rule_reports_consecutive_run() {
    let store = InMemoryStore::new();
    let role = store.seed_role("Kasjer");
    let employee = store.seed_employee("Anna", "Test", Some(role.id));
    let shift = store.seed_shift("Poranna", time(8), time(16), staffing(&[]));
    seed_rule(
        &store,
        "odpoczynek_tygodniowy",
        RuleSeverity::Soft,
        json!({ "max_consecutive_days": 6 }),
    );

    let entries: Vec<(u32, i64, i64)> = (1..=7).map(|day| (day, employee.id, shift.id)).collect();
    let schedule_id = persist_schedule(&store, &entries).await;

    let report = service(&store)
        .validate_schedule_by_id(schedule_id, true)
        .await
        .unwrap();
    assert_eq!(report.validation_summary.warnings, 1);
    assert!(report.issues[0].message.contains("7 dni z rzędu"));
    assert_eq!(
        report.issues[0].rule_code.as_deref(),
        Some("odpoczynek_tygodniowy")
    );
}

#[tokio::test]
async fn test_holiday_rule_skips_store_closed_dates() {
    let store = InMemoryStore::new();
    let role = store.seed_role("Kasjer");
    let employee = store.seed_employee("Anna", "Test", Some(role.id));
    let shift = store.seed_shift("Poranna", time(8), time(16), staffing(&[]));
    store.seed_holiday(date(1), "Nowy Rok", true);
    store.seed_holiday(date(6), "Trzech Króli", false);
    seed_rule(&store, "praca_w_swieto", RuleSeverity::Soft, json!({}));

    let schedule_id =
        persist_schedule(&store, &[(1, employee.id, shift.id), (6, employee.id, shift.id)]).await;

    let report = service(&store)
        .validate_schedule_by_id(schedule_id, true)
        .await
        .unwrap();
    // Only the open-store holiday entry is flagged, as a warning (SOFT).
    let holiday_issues: Vec<_> = report
        .issues
        .iter()
        .filter(|issue| issue.message.contains("święto"))
        .collect();
    assert_eq!(holiday_issues.len(), 1);
    assert!(holiday_issues[0].message.contains("2024-01-06"));
    assert_eq!(holiday_issues[0].level, IssueLevel::Warning);
}

#[tokio::test]
async fn test_unknown_schedule_is_not_found() {
    let store = InMemoryStore::new();
    let result = service(&store).validate_schedule_by_id(999, true).await;
    assert!(matches!(result, Err(DomainError::NotFound(_))));
}

#[tokio::test]
async fn test_empty_schedule_passes_with_message() {
    let store = InMemoryStore::new();
    let uow = store.begin();
    let schedule = uow.schedules().create("2024-01").await.unwrap();
    uow.commit().await.unwrap();

    let report = service(&store)
        .validate_schedule_by_id(schedule.id, true)
        .await
        .unwrap();
    assert!(report.validation_summary.passed);
    assert_eq!(report.validation_summary.total_issues, 0);
    assert_eq!(report.message.as_deref(), Some("Brak wpisów do walidacji"));
}

#[tokio::test]
async fn test_validate_entries_rejects_unknown_references() {
    let store = InMemoryStore::new();
    let payload = vec![EntryPayload {
        employee_id: 123,
        shift_id: 456,
        date: date(1),
    }];
    let result = service(&store).validate_entries(payload, 2024, 1, true).await;
    assert!(matches!(result, Err(DomainError::InvalidInput(_))));

    let result = service(&store).validate_entries(Vec::new(), 2024, 1, true).await;
    assert!(matches!(result, Err(DomainError::InvalidInput(_))));
}

#[tokio::test]
async fn test_validation_is_repeatable() {
    let store = InMemoryStore::new();
    let role = store.seed_role("Kasjer");
    let employee = store.seed_employee("Anna", "Test", Some(role.id));
    let shift = store.seed_shift("Poranna", time(8), time(16), staffing(&[("Kasjer", 2)]));
    seed_rule(
        &store,
        "limit_godzin_miesieczny",
        RuleSeverity::Soft,
        json!({ "default_limit": 40 }),
    );

    let entries: Vec<(u32, i64, i64)> = (1..=9).map(|day| (day, employee.id, shift.id)).collect();
    let schedule_id = persist_schedule(&store, &entries).await;

    let first = service(&store)
        .validate_schedule_by_id(schedule_id, true)
        .await
        .unwrap();
    let second = service(&store)
        .validate_schedule_by_id(schedule_id, true)
        .await
        .unwrap();
    assert_eq!(first.issues, second.issues);
    assert_eq!(
        first.validation_summary.total_issues,
        second.validation_summary.total_issues
    );
}
