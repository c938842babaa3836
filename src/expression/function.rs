//! Built-in functions callable from expressions.
//!
//! Aggregates (`mean`, `sum`, `min`, `max`, `first`, `last`, `length`)
//! reduce a group to one value and ignore NULLs the way SQL aggregates do;
//! an aggregate with nothing to reduce yields NULL. Their results are
//! memoized per group while one expression is being evaluated, so
//! `x - mean(x) + mean(x)` computes the mean once.
//!
//! Window functions (`row_number`, `cumsum`, `lag`, `lead`) and elementwise
//! functions (`sqrt`, `abs`, `if_else`) return one value per row.

use crate::access::{Column, DataType, Value};
use crate::expression::eval::{common_data_type, recycled_len, recycled_value};
use crate::expression::{Expression, ExpressionError, ExpressionEvaluator, ExpressionResult};
use std::cmp::Ordering;

/// Functions that reduce a group to a single value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateFunction {
    /// Arithmetic mean of the non-NULL values
    Mean,
    /// Sum of the non-NULL values
    Sum,
    /// Smallest non-NULL value
    Min,
    /// Largest non-NULL value
    Max,
    /// First value, NULL or not
    First,
    /// Last value, NULL or not
    Last,
    /// Number of values, NULLs included
    Length,
}

impl AggregateFunction {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "mean" => Some(AggregateFunction::Mean),
            "sum" => Some(AggregateFunction::Sum),
            "min" => Some(AggregateFunction::Min),
            "max" => Some(AggregateFunction::Max),
            "first" => Some(AggregateFunction::First),
            "last" => Some(AggregateFunction::Last),
            "length" => Some(AggregateFunction::Length),
            _ => None,
        }
    }

    /// Returns the name of the aggregate function
    pub fn name(&self) -> &'static str {
        match self {
            AggregateFunction::Mean => "mean",
            AggregateFunction::Sum => "sum",
            AggregateFunction::Min => "min",
            AggregateFunction::Max => "max",
            AggregateFunction::First => "first",
            AggregateFunction::Last => "last",
            AggregateFunction::Length => "length",
        }
    }

    /// Returns the output data type for this aggregate given the input type
    pub fn output_type(&self, input_type: DataType) -> Option<DataType> {
        match self {
            AggregateFunction::Mean => is_numeric(input_type).then_some(DataType::Float64),
            AggregateFunction::Sum => is_numeric(input_type).then_some(input_type),
            AggregateFunction::Min | AggregateFunction::Max => {
                (input_type != DataType::List).then_some(input_type)
            }
            AggregateFunction::First | AggregateFunction::Last => Some(input_type),
            AggregateFunction::Length => Some(DataType::Int32),
        }
    }

    /// Reduce `column` to a size-1 column
    pub fn apply(&self, column: &Column) -> ExpressionResult<Column> {
        let output_type = self.output_type(column.data_type()).ok_or_else(|| {
            ExpressionError::InvalidOperandTypes {
                operator: self.name().to_string(),
                left_type: Some(column.data_type()),
                right_type: None,
            }
        })?;

        let value = match self {
            AggregateFunction::First => column.values().first().cloned().unwrap_or(Value::Null),
            AggregateFunction::Last => column.values().last().cloned().unwrap_or(Value::Null),
            AggregateFunction::Length => Value::Int32(to_i32(column.len())?),
            _ => {
                let mut state = AggregateState::new();
                for value in column.values() {
                    state.update(value, *self)?;
                }
                state.finalize(*self)?
            }
        };
        Ok(Column::from_parts(output_type, vec![value]))
    }
}

/// Running state of one aggregate over the non-NULL values seen so far
struct AggregateState {
    /// Count of non-NULL values
    count: usize,
    /// Integer sum; must fit an `i32` once all values are in
    int_sum: Option<i64>,
    /// Float sum, used as soon as a float is seen
    float_sum: Option<f64>,
    min: Option<Value>,
    max: Option<Value>,
}

impl AggregateState {
    fn new() -> Self {
        Self {
            count: 0,
            int_sum: None,
            float_sum: None,
            min: None,
            max: None,
        }
    }

    /// Update the state with a new value
    fn update(&mut self, value: &Value, function: AggregateFunction) -> ExpressionResult<()> {
        if value.is_null() {
            return Ok(());
        }
        self.count += 1;

        match function {
            AggregateFunction::Sum | AggregateFunction::Mean => match value {
                Value::Int32(n) => {
                    let sum = self.int_sum.unwrap_or(0);
                    self.int_sum = Some(sum.checked_add(i64::from(*n)).ok_or_else(|| {
                        ExpressionError::EvaluationError {
                            message: format!("integer overflow in {}()", function.name()),
                        }
                    })?);
                }
                Value::Float64(x) => self.float_sum = Some(self.float_sum.unwrap_or(0.0) + x),
                _ => {}
            },
            AggregateFunction::Min => {
                if self
                    .min
                    .as_ref()
                    .map_or(true, |current| value.total_cmp(current) == Ordering::Less)
                {
                    self.min = Some(value.clone());
                }
            }
            AggregateFunction::Max => {
                if self
                    .max
                    .as_ref()
                    .map_or(true, |current| value.total_cmp(current) == Ordering::Greater)
                {
                    self.max = Some(value.clone());
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Get the final result of the aggregate
    fn finalize(self, function: AggregateFunction) -> ExpressionResult<Value> {
        if self.count == 0 {
            return Ok(Value::Null);
        }
        Ok(match function {
            AggregateFunction::Sum => match (self.int_sum, self.float_sum) {
                (Some(n), None) => Value::Int32(i32::try_from(n).map_err(|_| {
                    ExpressionError::EvaluationError {
                        message: "integer overflow in sum()".to_string(),
                    }
                })?),
                (n, x) => Value::Float64(n.unwrap_or(0) as f64 + x.unwrap_or(0.0)),
            },
            AggregateFunction::Mean => {
                let total = self.int_sum.unwrap_or(0) as f64 + self.float_sum.unwrap_or(0.0);
                Value::Float64(total / self.count as f64)
            }
            AggregateFunction::Min => self.min.unwrap_or(Value::Null),
            AggregateFunction::Max => self.max.unwrap_or(Value::Null),
            _ => Value::Null,
        })
    }
}

fn is_numeric(data_type: DataType) -> bool {
    matches!(data_type, DataType::Int32 | DataType::Float64)
}

fn to_i32(n: usize) -> ExpressionResult<i32> {
    i32::try_from(n).map_err(|_| ExpressionError::EvaluationError {
        message: format!("{} does not fit in an integer", n),
    })
}

fn expect_args(name: &str, args: &[Expression], expected: usize) -> ExpressionResult<()> {
    if args.len() != expected {
        return Err(ExpressionError::FunctionArgumentCount {
            function: name.to_string(),
            expected,
            actual: args.len(),
        });
    }
    Ok(())
}

fn expect_numeric(name: &str, column: &Column) -> ExpressionResult<()> {
    if !is_numeric(column.data_type()) {
        return Err(ExpressionError::InvalidOperandTypes {
            operator: name.to_string(),
            left_type: Some(column.data_type()),
            right_type: None,
        });
    }
    Ok(())
}

/// Call the built-in `name` with `args`
pub(crate) fn call(
    eval: &ExpressionEvaluator<'_, '_>,
    name: &str,
    args: &[Expression],
) -> ExpressionResult<Column> {
    let ctx = eval.context();

    if let Some(function) = AggregateFunction::from_name(name) {
        expect_args(name, args, 1)?;
        let key = format!("{}({})", name, args[0]);
        return ctx.memoize(&key, || {
            let column = eval.evaluate_vector(&args[0])?;
            function.apply(&column)
        });
    }

    match name {
        "n" => {
            expect_args(name, args, 0)?;
            Ok(Column::int32([to_i32(ctx.group_size())?]))
        }

        "row_number" => {
            expect_args(name, args, 0)?;
            let n = to_i32(ctx.group_size())?;
            Ok(Column::int32(1..=n))
        }

        "group_id" => {
            expect_args(name, args, 0)?;
            Ok(Column::int32([to_i32(ctx.group_index() + 1)?]))
        }

        "cumsum" => {
            expect_args(name, args, 1)?;
            let column = eval.evaluate_vector(&args[0])?;
            cumsum(&column)
        }

        "lag" | "lead" => {
            if args.is_empty() || args.len() > 2 {
                return Err(ExpressionError::FunctionArgumentCount {
                    function: name.to_string(),
                    expected: 2,
                    actual: args.len(),
                });
            }
            let column = eval.evaluate_vector(&args[0])?;
            let offset = match args.get(1) {
                Some(arg) => shift_offset(name, &eval.evaluate_vector(arg)?)?,
                None => 1,
            };
            Ok(shift(&column, offset, name == "lead"))
        }

        "c" => {
            if args.is_empty() {
                return Err(ExpressionError::FunctionArgumentCount {
                    function: name.to_string(),
                    expected: 1,
                    actual: 0,
                });
            }
            let parts = args
                .iter()
                .map(|arg| eval.evaluate_vector(arg))
                .collect::<ExpressionResult<Vec<_>>>()?;
            let refs: Vec<&Column> = parts.iter().collect();
            let data_type = common_data_type(name, &refs)?.unwrap_or(DataType::List);
            let mut values = Vec::new();
            for part in parts {
                if let Some(part) = part.cast(data_type) {
                    values.extend(part.into_values());
                }
            }
            Ok(Column::from_parts(data_type, values))
        }

        "list" => {
            expect_args(name, args, 1)?;
            let column = eval.evaluate_vector(&args[0])?;
            Ok(Column::list([column.into_values()]))
        }

        "sqrt" => {
            expect_args(name, args, 1)?;
            let column = eval.evaluate_vector(&args[0])?;
            expect_numeric(name, &column)?;
            let mut negative = false;
            let values = column
                .values()
                .iter()
                .map(|value| match value.as_f64() {
                    Some(x) if x < 0.0 => {
                        negative = true;
                        Value::Null
                    }
                    Some(x) => Value::Float64(x.sqrt()),
                    None => Value::Null,
                })
                .collect();
            if negative {
                ctx.warn("sqrt() of a negative value produced NULL");
            }
            Ok(Column::from_parts(DataType::Float64, values))
        }

        "abs" => {
            expect_args(name, args, 1)?;
            let column = eval.evaluate_vector(&args[0])?;
            expect_numeric(name, &column)?;
            let data_type = column.data_type();
            let values = column
                .into_values()
                .into_iter()
                .map(|value| match value {
                    Value::Int32(n) => Value::Int32(n.wrapping_abs()),
                    Value::Float64(x) => Value::Float64(x.abs()),
                    other => other,
                })
                .collect();
            Ok(Column::from_parts(data_type, values))
        }

        "if_else" => {
            expect_args(name, args, 3)?;
            let condition = eval.evaluate_vector(&args[0])?;
            let yes = eval.evaluate_vector(&args[1])?;
            let no = eval.evaluate_vector(&args[2])?;
            if_else(&condition, &yes, &no)
        }

        _ => Err(ExpressionError::UnknownFunction {
            name: name.to_string(),
        }),
    }
}

fn cumsum(column: &Column) -> ExpressionResult<Column> {
    expect_numeric("cumsum", column)?;
    let data_type = column.data_type();
    let mut values = Vec::with_capacity(column.len());
    let mut int_total: Option<i32> = Some(0);
    let mut float_total: Option<f64> = Some(0.0);

    // Everything after the first NULL is NULL
    for value in column.values() {
        let next = match value {
            Value::Int32(n) => {
                int_total = match int_total {
                    Some(total) => Some(total.checked_add(*n).ok_or_else(|| {
                        ExpressionError::EvaluationError {
                            message: "integer overflow in cumsum()".to_string(),
                        }
                    })?),
                    None => None,
                };
                int_total.map(Value::Int32)
            }
            Value::Float64(x) => {
                float_total = float_total.map(|total| total + x);
                float_total.map(Value::Float64)
            }
            _ => {
                int_total = None;
                float_total = None;
                None
            }
        };
        values.push(next.unwrap_or(Value::Null));
    }
    Ok(Column::from_parts(data_type, values))
}

fn shift_offset(name: &str, offset: &Column) -> ExpressionResult<usize> {
    match offset.values() {
        [Value::Int32(n)] if *n >= 0 => Ok(*n as usize),
        _ => Err(ExpressionError::EvaluationError {
            message: format!("{}() offset must be a non-negative integer scalar", name),
        }),
    }
}

fn shift(column: &Column, offset: usize, forward: bool) -> Column {
    let len = column.len();
    let values = (0..len)
        .map(|i| {
            let source = if forward {
                i.checked_add(offset).filter(|&j| j < len)
            } else {
                i.checked_sub(offset)
            };
            source
                .map(|j| column.values()[j].clone())
                .unwrap_or(Value::Null)
        })
        .collect();
    Column::from_parts(column.data_type(), values)
}

fn if_else(condition: &Column, yes: &Column, no: &Column) -> ExpressionResult<Column> {
    if condition.data_type() != DataType::Boolean {
        return Err(ExpressionError::TypeMismatch {
            expected: DataType::Boolean,
            actual: condition.data_type(),
            context: "if_else condition".to_string(),
        });
    }
    let data_type = common_data_type("if_else", &[yes, no])?.unwrap_or(DataType::List);
    let len = recycled_len("if_else", condition.len(), yes.len())?;
    let len = recycled_len("if_else", len, no.len())?;

    let values = (0..len)
        .map(|i| {
            let chosen = match recycled_value(condition, i) {
                Value::Boolean(true) => recycled_value(yes, i),
                Value::Boolean(false) => recycled_value(no, i),
                _ => return Value::Null,
            };
            chosen.clone().cast_to(data_type).unwrap_or(Value::Null)
        })
        .collect();
    Ok(Column::from_parts(data_type, values))
}
