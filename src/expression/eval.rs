//! Expression evaluation implementation.
//!
//! Expressions are evaluated one group at a time and produce whole vectors.
//! Elementwise operators recycle size-1 operands; any other length mismatch
//! is an error.

use crate::access::{Column, DataType, Datum, Table, Value};
use crate::expression::function;
use crate::expression::{
    BinaryOperator, ColumnRef, Expression, ExpressionError, ExpressionResult, FrameField,
    UnaryOperator,
};
use crate::mutate::{GroupContext, GroupExpression};
use std::cmp::Ordering;

/// Evaluator for expressions against one group's bindings
pub struct ExpressionEvaluator<'a, 'c> {
    ctx: &'a GroupContext<'c>,
}

/// Length two operands recycle to, if they are compatible
pub(crate) fn recycled_len(operator: &str, left: usize, right: usize) -> ExpressionResult<usize> {
    match (left, right) {
        (l, r) if l == r => Ok(l),
        (1, r) => Ok(r),
        (l, 1) => Ok(l),
        (l, r) => Err(ExpressionError::LengthMismatch {
            operator: operator.to_string(),
            left: l,
            right: r,
        }),
    }
}

/// Value of `column` at row `i` after recycling
pub(crate) fn recycled_value(column: &Column, i: usize) -> &Value {
    if column.len() == 1 {
        &column.values()[0]
    } else {
        &column.values()[i]
    }
}

impl<'a, 'c> ExpressionEvaluator<'a, 'c> {
    /// Create a new evaluator over one group's context
    pub fn new(ctx: &'a GroupContext<'c>) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &GroupContext<'c> {
        self.ctx
    }

    /// Evaluate an expression and return the result
    pub fn evaluate(&self, expr: &Expression) -> ExpressionResult<Datum> {
        match expr {
            Expression::Literal(lit) => Ok(match Column::scalar(lit.value.clone()) {
                Some(column) => Datum::Vector(column),
                None => Datum::Null,
            }),
            Expression::Frame(fields) => self.evaluate_frame(fields).map(Datum::Frame),
            _ => self.evaluate_vector(expr).map(Datum::Vector),
        }
    }

    /// Evaluate an expression that must produce a vector
    pub fn evaluate_vector(&self, expr: &Expression) -> ExpressionResult<Column> {
        match expr {
            Expression::Literal(lit) => {
                Column::scalar(lit.value.clone()).ok_or_else(|| ExpressionError::UnexpectedNull {
                    context: "operand".to_string(),
                })
            }

            Expression::Column(col) => self.evaluate_column_ref(col),

            Expression::BinaryOp { op, left, right } => {
                let left_val = self.evaluate_vector(left)?;
                let right_val = self.evaluate_vector(right)?;
                self.evaluate_binary_op(*op, left_val, right_val)
            }

            Expression::UnaryOp { op, operand } => {
                let operand_val = self.evaluate_vector(operand)?;
                self.evaluate_unary_op(*op, operand_val)
            }

            Expression::FunctionCall { name, args } => function::call(self, name, args),

            Expression::Frame(_) => Err(ExpressionError::NotAVector {
                context: "operand".to_string(),
                type_name: "frame".to_string(),
            }),
        }
    }

    /// Evaluate a column reference
    fn evaluate_column_ref(&self, col: &ColumnRef) -> ExpressionResult<Column> {
        self.ctx
            .column(&col.name)
            .ok_or_else(|| ExpressionError::UnknownColumn {
                name: col.name.clone(),
            })
    }

    fn evaluate_frame(&self, fields: &[FrameField]) -> ExpressionResult<Table> {
        let mut columns = Vec::with_capacity(fields.len());
        let mut len = 1;
        for field in fields {
            let column = self.evaluate_vector(&field.expr)?;
            len = if columns.is_empty() {
                column.len()
            } else {
                recycled_len("frame", len, column.len())?
            };
            columns.push((field.name.clone(), column));
        }

        let columns = columns
            .into_iter()
            .map(|(name, column)| (name, column.recycle(len)))
            .collect();
        Table::new(columns).map_err(|e| ExpressionError::EvaluationError {
            message: e.to_string(),
        })
    }

    /// Evaluate a binary operation elementwise
    fn evaluate_binary_op(
        &self,
        op: BinaryOperator,
        left: Column,
        right: Column,
    ) -> ExpressionResult<Column> {
        let len = recycled_len(op.as_str(), left.len(), right.len())?;
        let output_type = op
            .output_type(left.data_type(), right.data_type())
            .ok_or_else(|| ExpressionError::InvalidOperandTypes {
                operator: op.as_str().to_string(),
                left_type: Some(left.data_type()),
                right_type: Some(right.data_type()),
            })?;

        let mut values = Vec::with_capacity(len);
        for i in 0..len {
            let value = self.apply_binary_op(
                op,
                recycled_value(&left, i),
                recycled_value(&right, i),
            )?;
            values.push(value);
        }
        Ok(Column::from_parts(output_type, values))
    }

    /// Apply a binary operator to one pair of values
    fn apply_binary_op(
        &self,
        op: BinaryOperator,
        left: &Value,
        right: &Value,
    ) -> ExpressionResult<Value> {
        // Handle NULL propagation for most operators
        if left.is_null() || right.is_null() {
            return Ok(match op {
                // NULL AND false = false, NULL AND true = NULL
                BinaryOperator::And => match (left, right) {
                    (Value::Boolean(false), _) | (_, Value::Boolean(false)) => {
                        Value::Boolean(false)
                    }
                    _ => Value::Null,
                },
                // NULL OR true = true, NULL OR false = NULL
                BinaryOperator::Or => match (left, right) {
                    (Value::Boolean(true), _) | (_, Value::Boolean(true)) => Value::Boolean(true),
                    _ => Value::Null,
                },
                // For arithmetic and comparisons, NULL propagates
                _ => Value::Null,
            });
        }

        let invalid = || ExpressionError::InvalidOperandTypes {
            operator: op.as_str().to_string(),
            left_type: left.data_type(),
            right_type: right.data_type(),
        };

        match op {
            BinaryOperator::Add | BinaryOperator::Sub | BinaryOperator::Mul => {
                match (left, right) {
                    (Value::Int32(a), Value::Int32(b)) => Ok(Value::Int32(match op {
                        BinaryOperator::Add => a.wrapping_add(*b),
                        BinaryOperator::Sub => a.wrapping_sub(*b),
                        _ => a.wrapping_mul(*b),
                    })),
                    _ => {
                        let (a, b) = left
                            .as_f64()
                            .zip(right.as_f64())
                            .ok_or_else(invalid)?;
                        Ok(Value::Float64(match op {
                            BinaryOperator::Add => a + b,
                            BinaryOperator::Sub => a - b,
                            _ => a * b,
                        }))
                    }
                }
            }

            BinaryOperator::Div => {
                let (a, b) = left
                    .as_f64()
                    .zip(right.as_f64())
                    .ok_or_else(invalid)?;
                if b == 0.0 {
                    Err(ExpressionError::DivisionByZero)
                } else {
                    Ok(Value::Float64(a / b))
                }
            }

            // Comparison operators
            BinaryOperator::Eq => self.compare_values(op, left, right, |cmp| cmp.is_eq()),
            BinaryOperator::Ne => self.compare_values(op, left, right, |cmp| cmp.is_ne()),
            BinaryOperator::Lt => self.compare_values(op, left, right, |cmp| cmp.is_lt()),
            BinaryOperator::Le => self.compare_values(op, left, right, |cmp| cmp.is_le()),
            BinaryOperator::Gt => self.compare_values(op, left, right, |cmp| cmp.is_gt()),
            BinaryOperator::Ge => self.compare_values(op, left, right, |cmp| cmp.is_ge()),

            // Logical operators
            BinaryOperator::And => match (left, right) {
                (Value::Boolean(a), Value::Boolean(b)) => Ok(Value::Boolean(*a && *b)),
                _ => Err(invalid()),
            },

            BinaryOperator::Or => match (left, right) {
                (Value::Boolean(a), Value::Boolean(b)) => Ok(Value::Boolean(*a || *b)),
                _ => Err(invalid()),
            },

            // String operators
            BinaryOperator::Concat => match (left, right) {
                (Value::String(a), Value::String(b)) => Ok(Value::String(format!("{}{}", a, b))),
                _ => Err(invalid()),
            },
        }
    }

    /// Compare two non-NULL values
    fn compare_values<F>(
        &self,
        op: BinaryOperator,
        left: &Value,
        right: &Value,
        predicate: F,
    ) -> ExpressionResult<Value>
    where
        F: Fn(Ordering) -> bool,
    {
        let ordering = match (left, right) {
            (Value::Boolean(a), Value::Boolean(b)) => Some(a.cmp(b)),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (Value::Int32(a), Value::Int32(b)) => Some(a.cmp(b)),
            _ => match (left.as_f64(), right.as_f64()) {
                (Some(a), Some(b)) => a.partial_cmp(&b),
                _ => {
                    return Err(ExpressionError::InvalidOperandTypes {
                        operator: op.as_str().to_string(),
                        left_type: left.data_type(),
                        right_type: right.data_type(),
                    })
                }
            },
        };

        // NaN compares as unknown
        Ok(ordering
            .map(|cmp| Value::Boolean(predicate(cmp)))
            .unwrap_or(Value::Null))
    }

    /// Evaluate a unary operation elementwise
    fn evaluate_unary_op(&self, op: UnaryOperator, operand: Column) -> ExpressionResult<Column> {
        let output_type = op.output_type(operand.data_type()).ok_or_else(|| {
            ExpressionError::InvalidOperandTypes {
                operator: op.as_str().to_string(),
                left_type: Some(operand.data_type()),
                right_type: None,
            }
        })?;

        let values = operand
            .into_values()
            .into_iter()
            .map(|value| self.apply_unary_op(op, value))
            .collect::<ExpressionResult<Vec<_>>>()?;
        Ok(Column::from_parts(output_type, values))
    }

    fn apply_unary_op(&self, op: UnaryOperator, operand: Value) -> ExpressionResult<Value> {
        match op {
            UnaryOperator::IsNull => Ok(Value::Boolean(operand.is_null())),

            UnaryOperator::IsNotNull => Ok(Value::Boolean(!operand.is_null())),

            UnaryOperator::Not => match operand {
                Value::Null => Ok(Value::Null),
                Value::Boolean(b) => Ok(Value::Boolean(!b)),
                _ => Err(ExpressionError::InvalidOperandTypes {
                    operator: op.as_str().to_string(),
                    left_type: operand.data_type(),
                    right_type: None,
                }),
            },

            UnaryOperator::Plus => match operand {
                Value::Null | Value::Int32(_) | Value::Float64(_) => Ok(operand),
                _ => Err(ExpressionError::InvalidOperandTypes {
                    operator: op.as_str().to_string(),
                    left_type: operand.data_type(),
                    right_type: None,
                }),
            },

            UnaryOperator::Minus => match operand {
                Value::Null => Ok(Value::Null),
                Value::Int32(n) => Ok(Value::Int32(n.wrapping_neg())),
                Value::Float64(x) => Ok(Value::Float64(-x)),
                _ => Err(ExpressionError::InvalidOperandTypes {
                    operator: op.as_str().to_string(),
                    left_type: operand.data_type(),
                    right_type: None,
                }),
            },
        }
    }
}

impl GroupExpression for Expression {
    fn label(&self) -> String {
        self.to_string()
    }

    fn column_name(&self) -> Option<&str> {
        match self {
            Expression::Column(col) => Some(&col.name),
            _ => None,
        }
    }

    fn evaluate(&self, ctx: &GroupContext<'_>) -> ExpressionResult<Datum> {
        ExpressionEvaluator::new(ctx).evaluate(self)
    }
}

/// Column type of a value list, if the values agree on one
pub(crate) fn common_data_type(
    operator: &str,
    columns: &[&Column],
) -> ExpressionResult<Option<DataType>> {
    let mut common: Option<DataType> = None;
    for column in columns {
        common = match common {
            None => Some(column.data_type()),
            Some(current) => Some(current.common_type(column.data_type()).ok_or_else(|| {
                ExpressionError::InvalidOperandTypes {
                    operator: operator.to_string(),
                    left_type: Some(current),
                    right_type: Some(column.data_type()),
                }
            })?),
        };
    }
    Ok(common)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::mutate::{ChunkCache, Diagnostics, RowPartition};
    use anyhow::Result;

    /// Evaluate `expr` for every group of `table`
    pub(crate) fn eval_groups(table: &Table, expr: &Expression) -> Vec<ExpressionResult<Datum>> {
        let partition = RowPartition::from_table(table).expect("valid partition");
        let cache = ChunkCache::new(table, &partition);
        let diagnostics = Diagnostics::new();
        partition
            .groups()
            .iter()
            .enumerate()
            .map(|(i, group)| {
                let ctx = GroupContext::new(&cache, group, i, &diagnostics);
                ExpressionEvaluator::new(&ctx).evaluate(expr)
            })
            .collect()
    }

    pub(crate) fn eval_one(table: &Table, expr: &Expression) -> ExpressionResult<Datum> {
        eval_groups(table, expr).remove(0)
    }

    fn table() -> Result<Table> {
        Table::new(vec![
            ("x".to_string(), Column::int32([1, 3])),
            ("y".to_string(), Column::int32([2, 4])),
            ("f".to_string(), Column::float64([0.5, 1.5])),
            ("s".to_string(), Column::varchar(["a", "b"])),
            (
                "b".to_string(),
                Column::new(DataType::Boolean, vec![Value::Boolean(true), Value::Null])?,
            ),
        ])
    }

    fn x() -> Expression {
        Expression::column("x")
    }

    fn lit(n: i32) -> Expression {
        Expression::literal(Value::Int32(n))
    }

    #[test]
    fn test_arithmetic_is_elementwise() -> Result<()> {
        let table = table()?;
        let result = eval_one(&table, &Expression::add_expr(x(), Expression::column("y")))?;
        assert_eq!(result, Datum::from(Column::int32([3, 7])));

        let result = eval_one(&table, &Expression::mul_expr(x(), Expression::column("f")))?;
        assert_eq!(result, Datum::from(Column::float64([0.5, 4.5])));

        let result = eval_one(&table, &Expression::div_expr(x(), lit(2)))?;
        assert_eq!(result, Datum::from(Column::float64([0.5, 1.5])));
        Ok(())
    }

    #[test]
    fn test_division_by_zero() -> Result<()> {
        let table = table()?;
        let result = eval_one(&table, &Expression::div_expr(x(), lit(0)));
        assert_eq!(result, Err(ExpressionError::DivisionByZero));
        Ok(())
    }

    #[test]
    fn test_literals() -> Result<()> {
        let table = table()?;
        assert_eq!(eval_one(&table, &lit(5))?, Datum::from(Column::int32([5])));
        assert_eq!(eval_one(&table, &Expression::null())?, Datum::Null);

        let result = eval_one(&table, &Expression::add_expr(x(), Expression::null()));
        assert!(matches!(
            result,
            Err(ExpressionError::UnexpectedNull { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_unknown_column() -> Result<()> {
        let table = table()?;
        let result = eval_one(&table, &Expression::column("w"));
        assert_eq!(
            result,
            Err(ExpressionError::UnknownColumn {
                name: "w".to_string()
            })
        );
        Ok(())
    }

    #[test]
    fn test_invalid_operand_types() -> Result<()> {
        let table = table()?;
        let result = eval_one(&table, &Expression::add_expr(x(), Expression::column("s")));
        assert_eq!(
            result,
            Err(ExpressionError::InvalidOperandTypes {
                operator: "+".to_string(),
                left_type: Some(DataType::Int32),
                right_type: Some(DataType::Varchar),
            })
        );
        Ok(())
    }

    #[test]
    fn test_comparisons_and_logic() -> Result<()> {
        let table = table()?;
        let result = eval_one(&table, &Expression::gt(x(), Expression::column("f")))?;
        assert_eq!(result, Datum::from(Column::boolean([true, true])));

        let result = eval_one(
            &table,
            &Expression::and(
                Expression::column("b"),
                Expression::literal(Value::Boolean(false)),
            ),
        )?;
        assert_eq!(result, Datum::from(Column::boolean([false, false])));

        let result = eval_one(&table, &Expression::not_expr(Expression::column("b")))?;
        assert_eq!(
            result,
            Datum::from(Column::new(
                DataType::Boolean,
                vec![Value::Boolean(false), Value::Null]
            )?)
        );

        let result = eval_one(&table, &Expression::is_null(Expression::column("b")))?;
        assert_eq!(result, Datum::from(Column::boolean([false, true])));
        Ok(())
    }

    #[test]
    fn test_length_mismatch() -> Result<()> {
        let table = table()?;
        let three = Expression::call("c", vec![lit(1), lit(2), lit(3)]);
        let result = eval_one(&table, &Expression::add_expr(x(), three));
        assert_eq!(
            result,
            Err(ExpressionError::LengthMismatch {
                operator: "+".to_string(),
                left: 2,
                right: 3,
            })
        );
        Ok(())
    }

    #[test]
    fn test_frame() -> Result<()> {
        let table = table()?;
        let expr = Expression::frame(vec![("a", x()), ("k", lit(0))]);
        match eval_one(&table, &expr)? {
            Datum::Frame(frame) => {
                assert_eq!(frame.column_names(), &["a", "k"]);
                assert_eq!(frame.column("k"), Some(&Column::int32([0, 0])));
            }
            other => panic!("unexpected result: {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn test_group_expression_impl() {
        let expr = Expression::column("x");
        assert_eq!(expr.column_name(), Some("x"));
        assert_eq!(expr.label(), "x");

        let expr = Expression::add_expr(x(), lit(1));
        assert_eq!(expr.column_name(), None);
        assert_eq!(expr.label(), "x + 1");
    }
}
