//! Mutate engine error types.

use crate::expression::ExpressionError;
use crate::mutate::GroupLabel;
use thiserror::Error;

/// Errors that abort a mutate call.
#[derive(Error, Debug)]
pub enum MutateError {
    #[error(
        "Problem while computing `{expression}` ({group}): result must be size 1 or {expected}, not {actual}"
    )]
    SizeIncompatible {
        expression: String,
        group: GroupLabel,
        expected: usize,
        actual: usize,
    },

    #[error(
        "Problem while computing `{expression}`: can't combine {left_group} <{left_type}> and {right_group} <{right_type}>"
    )]
    TypeIncompatible {
        expression: String,
        left_type: String,
        left_group: GroupLabel,
        right_type: String,
        right_group: GroupLabel,
    },

    #[error(
        "Problem while computing `{expression}`: results must be all NULL or all non-NULL across groups"
    )]
    MixedNull { expression: String },

    #[error("Problem while computing `{expression}` ({group}): result must be a vector, not {type_name}")]
    NotAVector {
        expression: String,
        group: GroupLabel,
        type_name: String,
    },

    #[error("Problem while computing `{expression}` ({group}): {source}")]
    Evaluator {
        expression: String,
        group: GroupLabel,
        #[source]
        source: ExpressionError,
    },

    #[error("Column '{0}' does not exist")]
    UnknownColumn(String),
}

impl MutateError {
    /// Display text of the expression that failed, if the error has one
    pub fn expression(&self) -> Option<&str> {
        match self {
            MutateError::SizeIncompatible { expression, .. }
            | MutateError::TypeIncompatible { expression, .. }
            | MutateError::MixedNull { expression }
            | MutateError::NotAVector { expression, .. }
            | MutateError::Evaluator { expression, .. } => Some(expression),
            MutateError::UnknownColumn(_) => None,
        }
    }

    /// Group the failure is attributed to; `None` for call-wide errors
    pub fn group(&self) -> Option<&GroupLabel> {
        match self {
            MutateError::SizeIncompatible { group, .. }
            | MutateError::NotAVector { group, .. }
            | MutateError::Evaluator { group, .. } => Some(group),
            _ => None,
        }
    }
}

/// Result type for mutate operations.
pub type MutateResult<T> = Result<T, MutateError>;
