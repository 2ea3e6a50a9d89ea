pub mod generation;
pub mod validation;

pub use generation::{Diagnostics, GenerationFacade, GenerationReport, GenerationRequest};
pub use validation::{EntryPayload, ValidationReport, ValidationService, ValidationSummary};
