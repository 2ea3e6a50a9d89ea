//! Monthly workforce scheduling engine.
//!
//! Generates employee/day/shift assignments for one month with either a
//! round-robin heuristic or a constraint-programming solver, validates
//! schedules against a configurable labor-law rule catalog, and exposes a
//! single generation façade over a transactional persistence boundary.

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod presentation;
pub mod solver;

pub use application::{GenerationFacade, GenerationRequest, ValidationService};
pub use domain::services::generator::GenerationError;
pub use infrastructure::InMemoryStore;
