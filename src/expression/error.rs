//! Error types for expression evaluation.

use crate::access::DataType;
use std::fmt;

/// Errors that can occur during expression evaluation
#[derive(Debug, Clone, PartialEq)]
pub enum ExpressionError {
    /// Type mismatch in operation
    TypeMismatch {
        expected: DataType,
        actual: DataType,
        context: String,
    },

    /// Invalid operand types for operator
    InvalidOperandTypes {
        operator: String,
        left_type: Option<DataType>,
        right_type: Option<DataType>,
    },

    /// Column name not visible to the expression
    UnknownColumn { name: String },

    /// Operands of an elementwise operation can't be recycled to one length
    LengthMismatch {
        operator: String,
        left: usize,
        right: usize,
    },

    /// Division by zero
    DivisionByZero,

    /// NULL value in non-nullable context
    UnexpectedNull { context: String },

    /// Value that is not a vector where one is required
    NotAVector { context: String, type_name: String },

    /// Invalid function name
    UnknownFunction { name: String },

    /// Wrong number of function arguments
    FunctionArgumentCount {
        function: String,
        expected: usize,
        actual: usize,
    },

    /// Generic evaluation error
    EvaluationError { message: String },
}

impl fmt::Display for ExpressionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpressionError::TypeMismatch {
                expected,
                actual,
                context,
            } => {
                write!(
                    f,
                    "Type mismatch in {}: expected {}, got {}",
                    context, expected, actual
                )
            }

            ExpressionError::InvalidOperandTypes {
                operator,
                left_type,
                right_type,
            } => {
                write!(
                    f,
                    "Invalid operand types for operator {}: left={:?}, right={:?}",
                    operator, left_type, right_type
                )
            }

            ExpressionError::UnknownColumn { name } => {
                write!(f, "Column '{}' not found", name)
            }

            ExpressionError::LengthMismatch {
                operator,
                left,
                right,
            } => {
                write!(
                    f,
                    "Operands of {} have incompatible lengths {} and {}",
                    operator, left, right
                )
            }

            ExpressionError::DivisionByZero => write!(f, "Division by zero"),

            ExpressionError::UnexpectedNull { context } => {
                write!(f, "Unexpected NULL value in {}", context)
            }

            ExpressionError::NotAVector { context, type_name } => {
                write!(f, "Expected a vector in {}, got {}", context, type_name)
            }

            ExpressionError::UnknownFunction { name } => {
                write!(f, "Unknown function: {}", name)
            }

            ExpressionError::FunctionArgumentCount {
                function,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "Function {} expects {} arguments, got {}",
                    function, expected, actual
                )
            }

            ExpressionError::EvaluationError { message } => {
                write!(f, "Expression evaluation error: {}", message)
            }
        }
    }
}

impl std::error::Error for ExpressionError {}

/// Result type for expression operations
pub type ExpressionResult<T> = Result<T, ExpressionError>;
