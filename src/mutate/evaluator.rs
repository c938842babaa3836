//! Boundary between the engine and whatever evaluates expressions.
//!
//! The engine never inspects expression syntax. It only needs a display
//! label, to know whether the expression is a bare column reference, and a
//! way to evaluate it against one group's bindings.

use crate::access::Datum;
use crate::expression::ExpressionResult;
use crate::mutate::{ChunkCache, Diagnostics, GroupContext, MutateError, MutateWarning};
use log::{trace, warn};
use std::fmt;

/// An expression the engine can evaluate group by group
pub trait GroupExpression {
    /// Textual form, used to name unnamed results and in diagnostics
    fn label(&self) -> String;

    /// Column name when the expression is nothing but a reference to it
    fn column_name(&self) -> Option<&str> {
        None
    }

    /// Evaluate against the bindings of one group
    fn evaluate(&self, ctx: &GroupContext<'_>) -> ExpressionResult<Datum>;
}

/// Expression backed by a closure
pub struct FnExpression<F> {
    label: String,
    f: F,
}

impl<F> FnExpression<F>
where
    F: Fn(&GroupContext<'_>) -> ExpressionResult<Datum>,
{
    pub fn new(label: impl Into<String>, f: F) -> Self {
        Self {
            label: label.into(),
            f,
        }
    }
}

impl<F> GroupExpression for FnExpression<F>
where
    F: Fn(&GroupContext<'_>) -> ExpressionResult<Datum>,
{
    fn label(&self) -> String {
        self.label.clone()
    }

    fn evaluate(&self, ctx: &GroupContext<'_>) -> ExpressionResult<Datum> {
        (self.f)(ctx)
    }
}

/// One `(name?, expression)` pair of a mutate call
pub struct NamedExpression {
    name: Option<String>,
    expr: Box<dyn GroupExpression>,
}

impl NamedExpression {
    pub fn named(name: impl Into<String>, expr: impl GroupExpression + 'static) -> Self {
        let name = name.into();
        Self {
            name: if name.is_empty() { None } else { Some(name) },
            expr: Box::new(expr),
        }
    }

    pub fn unnamed(expr: impl GroupExpression + 'static) -> Self {
        Self {
            name: None,
            expr: Box::new(expr),
        }
    }

    /// Explicit name, if one was given
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn expr(&self) -> &dyn GroupExpression {
        self.expr.as_ref()
    }

    /// Name of the produced column: explicit, else the expression's label
    pub fn output_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| self.expr.label())
    }
}

impl fmt::Display for NamedExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{} = {}", name, self.expr.label()),
            None => write!(f, "{}", self.expr.label()),
        }
    }
}

impl fmt::Debug for NamedExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamedExpression")
            .field("name", &self.name)
            .field("expr", &self.expr.label())
            .finish()
    }
}

/// Evaluate `expr` for every group, in partition order.
///
/// Warnings raised by the evaluator are re-attributed to the expression and
/// group, logged, and appended to `warnings`. The first failing group aborts
/// the evaluation.
pub fn evaluate_all_groups(
    display: &str,
    expr: &dyn GroupExpression,
    cache: &ChunkCache<'_>,
    warnings: &mut Vec<MutateWarning>,
) -> Result<Vec<Datum>, MutateError> {
    let partition = cache.partition();
    let mut chunks = Vec::with_capacity(partition.n_groups());

    for (index, group) in partition.groups().iter().enumerate() {
        let diagnostics = Diagnostics::new();
        let ctx = GroupContext::new(cache, group, index, &diagnostics);
        let result = expr.evaluate(&ctx);

        for message in diagnostics.drain() {
            let warning = MutateWarning {
                expression: display.to_string(),
                group: group.label().clone(),
                message,
            };
            warn!("{}", warning);
            warnings.push(warning);
        }

        let datum = result.map_err(|source| MutateError::Evaluator {
            expression: display.to_string(),
            group: group.label().clone(),
            source,
        })?;
        trace!(
            "`{}` for {}: {} of size {:?}",
            display,
            group.label(),
            datum.type_name(),
            datum.size()
        );
        chunks.push(datum);
    }

    Ok(chunks)
}
