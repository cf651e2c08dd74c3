//! Error type shared by the modeling layers and the problem formulations.
//!
//! Infeasible or unbounded linear programs are *answers*, reported through
//! [`LpStatus`](crate::lp::LpStatus); this type covers malformed models,
//! engine failures, and I/O around problem instances.

use thiserror::Error;

use crate::validation::ValidationError;

/// Errors raised while building or solving a formulation.
#[derive(Debug, Error)]
pub enum FormulationError {
    /// The model is structurally invalid (bad bounds, undefined names, ...).
    #[error("invalid model: {0}")]
    InvalidModel(String),

    /// The solver engine failed internally.
    #[error("solver error: {0}")]
    Solver(String),

    /// Scheduling input failed validation.
    #[error("invalid scheduling input: {}", join_messages(.0))]
    Validation(Vec<ValidationError>),

    /// Reading a problem instance failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// A problem instance or report could not be (de)serialized.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

fn join_messages(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, FormulationError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::ValidationErrorKind;

    #[test]
    fn test_validation_message_joins_entries() {
        let err = FormulationError::Validation(vec![
            ValidationError::new(ValidationErrorKind::DuplicateId, "Duplicate task ID: T1"),
            ValidationError::new(ValidationErrorKind::EmptyTask, "Task 'T2' has no activities"),
        ]);
        assert_eq!(
            err.to_string(),
            "invalid scheduling input: Duplicate task ID: T1; Task 'T2' has no activities"
        );
    }
}
