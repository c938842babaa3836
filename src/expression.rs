//! Built-in expression language for computing columns.
//!
//! This module provides:
//! - Expression AST representation, deserializable from plan documents
//! - Vectorized evaluation against one group's bindings
//! - Built-in aggregate, window and elementwise functions

pub mod error;
pub mod eval;
pub mod expr;
pub mod function;
pub mod operator;

pub use error::{ExpressionError, ExpressionResult};
pub use eval::ExpressionEvaluator;
pub use expr::{ColumnRef, Expression, FrameField, Literal};
pub use function::AggregateFunction;
pub use operator::{BinaryOperator, UnaryOperator};
