pub mod configuration;
pub mod cp_generator;
pub mod generator;
pub mod heuristic;
pub mod validation;

pub use configuration::ConfigurationLoader;
pub use cp_generator::CpSatGenerator;
pub use generator::{GenerationContext, GenerationError, GenerationOutcome, ScheduleGenerator};
pub use heuristic::HeuristicGenerator;
pub use validation::{
    validate_schedule, validate_schedule_with_rules, ValidationContext, ValidationIssue,
};
