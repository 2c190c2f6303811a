use bgdata::{DataResult, encoding::Encoding, value::Value};
use strum::{EnumIter, IntoEnumIterator};

use super::value::{ValueExpression, ValueList};
use crate::{env::Environment, error::BgResult};

/// Comparison between two values.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, EnumIter)]
pub enum ComparisonOp {
    /// Raw byte equality.
    Eq,
    EqNum,
    /// Equality of the decoded text.
    EqStr,
    GtNum,
    LtNum,
    GtEqNum,
    LtEqNum,
}

impl ComparisonOp {
    /// Creates a [`ComparisonOp`] from its string representation.
    pub fn from_str(s: &str) -> Option<Self> {
        ComparisonOp::iter().find(|op| op.to_str() == s)
    }

    /// Returns the string representation of the [`ComparisonOp`].
    pub fn to_str(&self) -> &'static str {
        match self {
            ComparisonOp::Eq => "eq",
            ComparisonOp::EqNum => "eqnum",
            ComparisonOp::EqStr => "eqstr",
            ComparisonOp::GtNum => "gtnum",
            ComparisonOp::LtNum => "ltnum",
            ComparisonOp::GtEqNum => "gteqnum",
            ComparisonOp::LtEqNum => "lteqnum",
        }
    }

    /// Returns true if `left op right` holds.
    pub fn holds(&self, left: &Value, right: &Value) -> DataResult<bool> {
        Ok(match self {
            ComparisonOp::Eq => left.len() == right.len() && left.bytes()? == right.bytes()?,
            ComparisonOp::EqNum => left.as_numeric()? == right.as_numeric()?,
            ComparisonOp::EqStr => left.as_text()? == right.as_text()?,
            ComparisonOp::GtNum => left.as_numeric()? > right.as_numeric()?,
            ComparisonOp::LtNum => left.as_numeric()? < right.as_numeric()?,
            ComparisonOp::GtEqNum => left.as_numeric()? >= right.as_numeric()?,
            ComparisonOp::LtEqNum => left.as_numeric()? <= right.as_numeric()?,
        })
    }
}

/// Boolean expression used by predicates and guards.
#[derive(Debug, Clone)]
pub enum LogicalExpression {
    True,
    Not(Box<LogicalExpression>),
    And(Box<LogicalExpression>, Box<LogicalExpression>),
    Or(Box<LogicalExpression>, Box<LogicalExpression>),
    /// `left op right`, an omitted side standing for the current value.
    ///
    /// Holds only when both sides evaluate to non-empty lists of equal length
    /// whose elements are all present and pairwise satisfy `op`.
    Compare {
        op: ComparisonOp,
        left: Option<Box<ValueExpression>>,
        right: Option<Box<ValueExpression>>,
    },
}

impl LogicalExpression {
    pub fn eval(&self, env: &Environment, encoding: Encoding) -> BgResult<bool> {
        match self {
            LogicalExpression::True => Ok(true),
            LogicalExpression::Not(operand) => Ok(!operand.eval(env, encoding)?),
            LogicalExpression::And(left, right) => {
                Ok(left.eval(env, encoding)? && right.eval(env, encoding)?)
            }
            LogicalExpression::Or(left, right) => {
                Ok(left.eval(env, encoding)? || right.eval(env, encoding)?)
            }
            LogicalExpression::Compare { op, left, right } => {
                let left = side(left.as_deref(), env, encoding)?;
                let right = side(right.as_deref(), env, encoding)?;
                Ok(compare(*op, &left, &right)?)
            }
        }
    }
}

fn side(
    expression: Option<&ValueExpression>,
    env: &Environment,
    encoding: Encoding,
) -> BgResult<ValueList> {
    expression
        .unwrap_or(&ValueExpression::Current)
        .eval(env, encoding)
}

fn compare(op: ComparisonOp, left: &ValueList, right: &ValueList) -> DataResult<bool> {
    if left.is_empty() || left.len() != right.len() {
        return Ok(false);
    }
    for pair in left.iter().zip(right.iter()) {
        let (Some(l), Some(r)) = pair else {
            return Ok(false);
        };
        if !op.holds(l, r)? {
            return Ok(false);
        }
    }
    Ok(true)
}
