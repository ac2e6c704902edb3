//! # Error Types — Structured Error Hierarchy
//!
//! Defines the error type shared by every crate in the workspace. All errors
//! use `thiserror` for derive-based `Display` and `Error` implementations.
//!
//! ## Design
//!
//! - Categorical violations (an unknown status string, a mapping type that
//!   does not exist) surface as [`GrcError::InvalidArgument`] and carry the
//!   rejected value plus the allowed set.
//! - Numeric range violations never appear here: percentages and scores are
//!   clamped by the value types in [`crate::percentage`].
//! - Workflow errors include the current state and the attempted target.

use thiserror::Error;

/// Top-level error type for the GRC engine.
#[derive(Error, Debug)]
pub enum GrcError {
    /// A categorical value was outside its allowed set.
    #[error("invalid {field} {value:?}. Allowed: {allowed}")]
    InvalidArgument {
        /// Name of the field being assigned.
        field: &'static str,
        /// The rejected value.
        value: String,
        /// Comma-separated list of accepted values.
        allowed: String,
    },

    /// A required value was missing or blank.
    #[error("{field} is required: {reason}")]
    MissingValue {
        /// Name of the field.
        field: &'static str,
        /// Why the value is required.
        reason: String,
    },

    /// Workflow transition rejected.
    #[error("invalid transition from {from} to {to}")]
    InvalidTransition {
        /// Current state name.
        from: String,
        /// Attempted target state name.
        to: String,
    },

    /// A referenced record does not exist.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Record kind (requirement, mapping, tenant, ...).
        kind: &'static str,
        /// Identifier that failed to resolve.
        id: String,
    },

    /// A record with the same key already exists.
    #[error("duplicate {kind}: {id}")]
    Duplicate {
        /// Record kind.
        kind: &'static str,
        /// Conflicting key.
        id: String,
    },

    /// Inserting an edge would close a cycle.
    #[error("{kind} edge from {from} to {to} would create a cycle")]
    Cycle {
        /// Graph kind (requirement tree, mapping graph).
        kind: &'static str,
        /// Edge origin.
        from: String,
        /// Edge destination.
        to: String,
    },

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl GrcError {
    /// Build an [`GrcError::InvalidArgument`] from an allowed-value list.
    pub fn invalid_argument(field: &'static str, value: &str, allowed: &[&str]) -> Self {
        Self::InvalidArgument {
            field,
            value: value.to_string(),
            allowed: allowed.join(", "),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_argument_lists_allowed_values() {
        let err = GrcError::invalid_argument("status", "done", &["not_started", "verified"]);
        assert_eq!(
            err.to_string(),
            "invalid status \"done\". Allowed: not_started, verified"
        );
    }

    #[test]
    fn cycle_error_names_both_ends() {
        let err = GrcError::Cycle {
            kind: "mapping",
            from: "a".into(),
            to: "b".into(),
        };
        assert!(err.to_string().contains("from a to b"));
    }
}
