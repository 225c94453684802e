//! Synthesizer error types

use thiserror::Error;

/// Errors in reducer configuration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReducerError {
    /// An override names a field the schema does not have
    #[error("Override for unknown field '{0}'")]
    UnknownField(String),

    /// An override rule cannot be applied to the field's type
    #[error("Rule '{rule}' cannot reduce {field_type} field '{field}'")]
    IncompatibleRule {
        /// Field name
        field: String,
        /// Rule name
        rule: String,
        /// Declared field type
        field_type: String,
    },

    /// `concatenate` with a zero length limit
    #[error("Concatenate limit for '{0}' must be greater than zero")]
    InvalidLimit(String),
}
