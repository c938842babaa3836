//! Operator definitions for expressions.

use crate::access::DataType;
use serde::{Deserialize, Serialize};

/// Binary operators supported in expressions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOperator {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,

    // Comparison
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,

    // Logical
    And,
    Or,

    // String
    Concat,
}

fn is_numeric(data_type: DataType) -> bool {
    matches!(data_type, DataType::Int32 | DataType::Float64)
}

impl BinaryOperator {
    /// Get the output type of this operator given input types
    pub fn output_type(&self, left: DataType, right: DataType) -> Option<DataType> {
        match self {
            BinaryOperator::Add | BinaryOperator::Sub | BinaryOperator::Mul => {
                match (left, right) {
                    (DataType::Int32, DataType::Int32) => Some(DataType::Int32),
                    (l, r) if is_numeric(l) && is_numeric(r) => Some(DataType::Float64),
                    _ => None,
                }
            }

            // Division always produces floats
            BinaryOperator::Div => {
                if is_numeric(left) && is_numeric(right) {
                    Some(DataType::Float64)
                } else {
                    None
                }
            }

            // Comparison operators always return boolean
            BinaryOperator::Eq
            | BinaryOperator::Ne
            | BinaryOperator::Lt
            | BinaryOperator::Le
            | BinaryOperator::Gt
            | BinaryOperator::Ge => {
                if self.types_compatible_for_comparison(left, right) {
                    Some(DataType::Boolean)
                } else {
                    None
                }
            }

            BinaryOperator::And | BinaryOperator::Or => match (left, right) {
                (DataType::Boolean, DataType::Boolean) => Some(DataType::Boolean),
                _ => None,
            },

            BinaryOperator::Concat => match (left, right) {
                (DataType::Varchar, DataType::Varchar) => Some(DataType::Varchar),
                _ => None,
            },
        }
    }

    /// Check if two types are compatible for comparison
    fn types_compatible_for_comparison(&self, left: DataType, right: DataType) -> bool {
        if left == DataType::List || right == DataType::List {
            return false;
        }
        left == right || (is_numeric(left) && is_numeric(right))
    }

    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOperator::Eq
                | BinaryOperator::Ne
                | BinaryOperator::Lt
                | BinaryOperator::Le
                | BinaryOperator::Gt
                | BinaryOperator::Ge
        )
    }

    /// Get the display string for this operator
    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Sub => "-",
            BinaryOperator::Mul => "*",
            BinaryOperator::Div => "/",
            BinaryOperator::Eq => "==",
            BinaryOperator::Ne => "!=",
            BinaryOperator::Lt => "<",
            BinaryOperator::Le => "<=",
            BinaryOperator::Gt => ">",
            BinaryOperator::Ge => ">=",
            BinaryOperator::And => "&",
            BinaryOperator::Or => "|",
            BinaryOperator::Concat => "||",
        }
    }

    /// Binding strength, used to parenthesize nested operations when
    /// printing
    pub fn precedence(&self) -> u8 {
        match self {
            BinaryOperator::Or => 1,
            BinaryOperator::And => 2,
            BinaryOperator::Eq
            | BinaryOperator::Ne
            | BinaryOperator::Lt
            | BinaryOperator::Le
            | BinaryOperator::Gt
            | BinaryOperator::Ge => 3,
            BinaryOperator::Concat => 4,
            BinaryOperator::Add | BinaryOperator::Sub => 5,
            BinaryOperator::Mul | BinaryOperator::Div => 6,
        }
    }
}

/// Unary operators supported in expressions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnaryOperator {
    // Logical
    Not,

    // NULL checks
    IsNull,
    IsNotNull,

    // Arithmetic
    Plus,
    Minus,
}

impl UnaryOperator {
    /// Get the output type of this operator given input type
    pub fn output_type(&self, operand: DataType) -> Option<DataType> {
        match self {
            UnaryOperator::Not => match operand {
                DataType::Boolean => Some(DataType::Boolean),
                _ => None,
            },

            // NULL checks always return boolean regardless of input type
            UnaryOperator::IsNull | UnaryOperator::IsNotNull => Some(DataType::Boolean),

            UnaryOperator::Plus | UnaryOperator::Minus => {
                if is_numeric(operand) {
                    Some(operand)
                } else {
                    None
                }
            }
        }
    }

    /// Get the display string for this operator
    pub fn as_str(&self) -> &'static str {
        match self {
            UnaryOperator::Not => "!",
            UnaryOperator::IsNull => "is_null",
            UnaryOperator::IsNotNull => "is_not_null",
            UnaryOperator::Plus => "+",
            UnaryOperator::Minus => "-",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arithmetic_output_types() {
        assert_eq!(
            BinaryOperator::Add.output_type(DataType::Int32, DataType::Int32),
            Some(DataType::Int32)
        );
        assert_eq!(
            BinaryOperator::Mul.output_type(DataType::Int32, DataType::Float64),
            Some(DataType::Float64)
        );
        assert_eq!(
            BinaryOperator::Div.output_type(DataType::Int32, DataType::Int32),
            Some(DataType::Float64)
        );
        assert_eq!(
            BinaryOperator::Sub.output_type(DataType::Varchar, DataType::Int32),
            None
        );
    }

    #[test]
    fn test_comparison_output_types() {
        assert_eq!(
            BinaryOperator::Lt.output_type(DataType::Int32, DataType::Float64),
            Some(DataType::Boolean)
        );
        assert_eq!(
            BinaryOperator::Eq.output_type(DataType::Varchar, DataType::Varchar),
            Some(DataType::Boolean)
        );
        assert_eq!(
            BinaryOperator::Eq.output_type(DataType::Varchar, DataType::Int32),
            None
        );
        assert_eq!(
            BinaryOperator::Eq.output_type(DataType::List, DataType::List),
            None
        );
    }

    #[test]
    fn test_unary_output_types() {
        assert_eq!(
            UnaryOperator::Not.output_type(DataType::Boolean),
            Some(DataType::Boolean)
        );
        assert_eq!(
            UnaryOperator::IsNull.output_type(DataType::List),
            Some(DataType::Boolean)
        );
        assert_eq!(
            UnaryOperator::Minus.output_type(DataType::Float64),
            Some(DataType::Float64)
        );
        assert_eq!(UnaryOperator::Minus.output_type(DataType::Varchar), None);
    }

    #[test]
    fn test_precedence() {
        assert!(BinaryOperator::Mul.precedence() > BinaryOperator::Add.precedence());
        assert!(BinaryOperator::Add.precedence() > BinaryOperator::Lt.precedence());
        assert!(BinaryOperator::And.precedence() > BinaryOperator::Or.precedence());
    }
}
