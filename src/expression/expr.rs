//! Expression AST definitions.

use crate::access::Value;
use crate::expression::operator::{BinaryOperator, UnaryOperator};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Column reference in an expression
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnRef {
    pub name: String,
}

impl ColumnRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Literal value in an expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Literal {
    pub value: Value,
}

impl Literal {
    pub fn new(value: Value) -> Self {
        Self { value }
    }

    pub fn null() -> Self {
        Self { value: Value::Null }
    }

    pub fn bool(val: bool) -> Self {
        Self {
            value: Value::Boolean(val),
        }
    }

    pub fn int32(val: i32) -> Self {
        Self {
            value: Value::Int32(val),
        }
    }

    pub fn float64(val: f64) -> Self {
        Self {
            value: Value::Float64(val),
        }
    }

    pub fn string(val: impl Into<String>) -> Self {
        Self {
            value: Value::String(val.into()),
        }
    }
}

/// One named column of a `frame(...)` expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameField {
    pub name: String,
    pub expr: Expression,
}

/// Expression tree node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expression {
    /// Literal constant value; `NULL` evaluates to no result at all
    Literal(Literal),

    /// Column reference by name
    Column(ColumnRef),

    /// Elementwise binary operation
    BinaryOp {
        op: BinaryOperator,
        left: Box<Expression>,
        right: Box<Expression>,
    },

    /// Elementwise unary operation
    UnaryOp {
        op: UnaryOperator,
        operand: Box<Expression>,
    },

    /// Call of a built-in function
    FunctionCall { name: String, args: Vec<Expression> },

    /// Multi-column composite
    Frame(Vec<FrameField>),
}

impl Expression {
    /// Create a literal expression
    pub fn literal(value: Value) -> Self {
        Expression::Literal(Literal::new(value))
    }

    /// The NULL literal
    pub fn null() -> Self {
        Expression::Literal(Literal::null())
    }

    /// Create a column reference expression
    pub fn column(name: impl Into<String>) -> Self {
        Expression::Column(ColumnRef::new(name))
    }

    /// Create a binary operation expression
    pub fn binary_op(op: BinaryOperator, left: Expression, right: Expression) -> Self {
        Expression::BinaryOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Create a unary operation expression
    pub fn unary_op(op: UnaryOperator, operand: Expression) -> Self {
        Expression::UnaryOp {
            op,
            operand: Box::new(operand),
        }
    }

    /// Create a function call expression
    pub fn call(name: impl Into<String>, args: Vec<Expression>) -> Self {
        Expression::FunctionCall {
            name: name.into(),
            args,
        }
    }

    /// Create a multi-column composite expression
    pub fn frame<S: Into<String>>(fields: Vec<(S, Expression)>) -> Self {
        Expression::Frame(
            fields
                .into_iter()
                .map(|(name, expr)| FrameField {
                    name: name.into(),
                    expr,
                })
                .collect(),
        )
    }

    /// Create an addition expression
    pub fn add_expr(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Add, left, right)
    }

    /// Create a subtraction expression
    pub fn sub_expr(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Sub, left, right)
    }

    /// Create a multiplication expression
    pub fn mul_expr(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Mul, left, right)
    }

    /// Create a division expression
    pub fn div_expr(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Div, left, right)
    }

    /// Create an equality expression
    pub fn eq(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Eq, left, right)
    }

    /// Create a greater-than expression
    pub fn gt(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Gt, left, right)
    }

    /// Create an AND expression
    pub fn and(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::And, left, right)
    }

    /// Create a NOT expression
    pub fn not_expr(operand: Expression) -> Self {
        Self::unary_op(UnaryOperator::Not, operand)
    }

    /// Create an IS NULL expression
    pub fn is_null(operand: Expression) -> Self {
        Self::unary_op(UnaryOperator::IsNull, operand)
    }

    fn fmt_operand(&self, f: &mut fmt::Formatter<'_>, parent: u8, strict: bool) -> fmt::Result {
        match self {
            Expression::BinaryOp { op, .. }
                if op.precedence() < parent || (strict && op.precedence() == parent) =>
            {
                write!(f, "({})", self)
            }
            _ => write!(f, "{}", self),
        }
    }
}

fn write_list<'e, I>(f: &mut fmt::Formatter<'_>, items: I) -> fmt::Result
where
    I: IntoIterator<Item = (Option<&'e str>, &'e Expression)>,
{
    for (i, (name, expr)) in items.into_iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        match name {
            Some(name) => write!(f, "{} = {}", name, expr)?,
            None => write!(f, "{}", expr)?,
        }
    }
    Ok(())
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Literal(lit) => write!(f, "{}", lit.value),
            Expression::Column(col) => write!(f, "{}", col.name),
            Expression::BinaryOp { op, left, right } => {
                left.fmt_operand(f, op.precedence(), false)?;
                write!(f, " {} ", op.as_str())?;
                right.fmt_operand(f, op.precedence(), true)
            }
            Expression::UnaryOp { op, operand } => match op {
                UnaryOperator::IsNull | UnaryOperator::IsNotNull => {
                    write!(f, "{}({})", op.as_str(), operand)
                }
                _ => {
                    write!(f, "{}", op.as_str())?;
                    operand.fmt_operand(f, u8::MAX, false)
                }
            },
            Expression::FunctionCall { name, args } => {
                write!(f, "{}(", name)?;
                write_list(f, args.iter().map(|a| (None, a)))?;
                write!(f, ")")
            }
            Expression::Frame(fields) => {
                write!(f, "frame(")?;
                write_list(
                    f,
                    fields.iter().map(|fd| (Some(fd.name.as_str()), &fd.expr)),
                )?;
                write!(f, ")")
            }
        }
    }
}
