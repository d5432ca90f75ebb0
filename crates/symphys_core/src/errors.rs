//! Shared error types used across submodules.

use thiserror::Error;

/// Top-level error type for the crate.
///
/// Every failure is raised and propagated to the caller; nothing in the crate
/// recovers from one of these locally.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PhysicsError {
    /// An argument does not have the dimension the callee expects.
    #[error("units mismatch: argument '{param}' to function '{func}' must have dimension {expected}, got {actual}")]
    UnitsMismatch {
        param: String,
        func: String,
        expected: String,
        actual: String,
    },
    /// Two operands of a sum, comparison or min/max have different dimensions.
    #[error("incompatible dimensions: {0}")]
    IncompatibleDimensions(String),
    /// A plain number was passed where a dimensioned value is expected.
    #[error("argument '{param}' to function '{func}' is dimensionless, expected {expected}")]
    NotDimensionless {
        param: String,
        func: String,
        expected: String,
    },
    /// Operands live in different coordinate systems or have the wrong shape.
    #[error("type mismatch: {0}")]
    TypeMismatch(String),
    /// A precondition on an argument's value does not hold.
    #[error("invalid value: {0}")]
    InvalidValue(String),
    /// The requested operation has no implementation for these inputs.
    #[error("not implemented: {0}")]
    NotImplemented(String),
    /// An expression could not be reduced to a number.
    #[error("evaluation failed: {0}")]
    Evaluation(String),
}

impl PhysicsError {
    /// Whether this error signals a dimensional inconsistency.
    pub fn is_units_error(&self) -> bool {
        matches!(
            self,
            PhysicsError::UnitsMismatch { .. } | PhysicsError::IncompatibleDimensions(_)
        )
    }

    /// Whether this error signals a type mismatch (including passing a bare
    /// number where a dimension is required).
    pub fn is_type_error(&self) -> bool {
        matches!(
            self,
            PhysicsError::TypeMismatch(_) | PhysicsError::NotDimensionless { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, PhysicsError>;
