use anyhow::Result;
use chrono::{NaiveDate, NaiveTime};
use serde_json::json;
use shared::RuleSeverity;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use scheduling_engine::application::{GenerationFacade, GenerationRequest};
use scheduling_engine::domain::entities::{GeneratorParameters, LaborLawRule};
use scheduling_engine::infrastructure::config::Settings;
use scheduling_engine::InMemoryStore;

/// Seed a small demo workforce and run both generators for one month.
#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "scheduling_engine=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting scheduling engine demo...");

    let settings = Settings::new()?;
    tracing::info!("Configuration loaded: {:?}", settings);

    let store = InMemoryStore::new();
    seed_demo_data(&store)?;

    let facade = GenerationFacade::new(Arc::new(store), settings);

    for generator_type in ["heuristic", "ortools"] {
        let request = GenerationRequest {
            month: Some(1),
            year: Some(2024),
            generator_type: Some(generator_type.to_string()),
            scenario_type: None,
        };
        match facade.generate(request).await {
            Ok(report) => {
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
            Err(error) => {
                tracing::error!(%error, generator_type, "generation failed");
            }
        }
    }

    Ok(())
}

fn seed_demo_data(store: &InMemoryStore) -> Result<()> {
    let kasjer = store.seed_role("Kasjer");
    let kierownik = store.seed_role("Kierownik");

    store.seed_employee("Anna", "Kowalska", Some(kasjer.id));
    store.seed_employee("Jan", "Nowak", Some(kasjer.id));
    let maria = store.seed_employee("Maria", "Wiśniewska", Some(kasjer.id));
    store.seed_employee("Piotr", "Zieliński", Some(kierownik.id));
    store.seed_employee("Ewa", "Lewandowska", Some(kierownik.id));

    let time = |h| NaiveTime::from_hms_opt(h, 0, 0).expect("valid hour");
    store.seed_shift(
        "Poranna",
        time(6),
        time(14),
        BTreeMap::from([("Kasjer".to_string(), 1), ("Kierownik".to_string(), 1)]),
    );
    store.seed_shift(
        "Popołudniowa",
        time(14),
        time(22),
        BTreeMap::from([("Kasjer".to_string(), 1)]),
    );

    let date = |d| NaiveDate::from_ymd_opt(2024, 1, d).expect("valid day");
    store.seed_absence(maria.id, "urlop", date(8), date(12))?;
    store.seed_holiday(date(1), "Nowy Rok", true);
    store.seed_holiday(date(6), "Trzech Króli", false);

    let rule = |code: &str, category: &str, severity, parameters| LaborLawRule {
        id: 0,
        code: code.to_string(),
        name: code.to_string(),
        category: category.to_string(),
        severity,
        parameters: Some(parameters),
        description: None,
        active_from: None,
        active_to: None,
    };
    store.seed_rule(rule(
        "REST_DAILY",
        "REST",
        RuleSeverity::Hard,
        json!({ "min_hours": 11 }),
    ));
    store.seed_rule(rule(
        "REST_WEEKLY",
        "REST",
        RuleSeverity::Soft,
        json!({ "max_consecutive_days": 6 }),
    ));
    store.seed_rule(rule(
        "limit_godzin_miesieczny",
        "HOURS_LIMIT",
        RuleSeverity::Soft,
        json!({ "default_limit": 160 }),
    ));
    store.seed_rule(rule(
        "praca_w_swieto",
        "HOLIDAY",
        RuleSeverity::Hard,
        json!({}),
    ));

    store.seed_generator_parameters(GeneratorParameters {
        id: 0,
        scenario: "DEFAULT".to_string(),
        weights: serde_json::Map::from_iter([("fairness".to_string(), json!(10))]),
        max_consecutive_nights: None,
        min_rest_hours_override: None,
        last_updated_by: None,
        updated_at: chrono::Utc::now(),
    });

    Ok(())
}
