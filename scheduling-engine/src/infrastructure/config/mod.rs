use config::{Config, ConfigError, File};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub solver: SolverSettings,
    pub limits: LimitSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SolverSettings {
    /// Wall-clock budget for one CP-SAT solve, in seconds.
    pub max_time_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LimitSettings {
    /// Monthly hour cap applied when neither the employee nor their
    /// employment fraction carries one.
    pub default_monthly_hours: i32,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let environment = std::env::var("RUN_ENV").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            .set_default("solver.max_time_seconds", 60_u64)?
            .set_default("limits.default_monthly_hours", 160_i64)?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;

        config.try_deserialize()
    }

    pub fn solver_budget(&self) -> Duration {
        Duration::from_secs(self.solver.max_time_seconds)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            solver: SolverSettings {
                max_time_seconds: 60,
            },
            limits: LimitSettings {
                default_monthly_hours: 160,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_config_files() {
        let settings = Settings::default();
        assert_eq!(settings.solver_budget(), Duration::from_secs(60));
        assert_eq!(settings.limits.default_monthly_hours, 160);
    }
}
