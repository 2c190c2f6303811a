use bgdata::{DataResult, encoding::Encoding, value::Value};
use num_bigint::BigInt;
use smallvec::{SmallVec, smallvec};
use strum::{EnumIter, IntoEnumIterator};

use super::{digest::DigestAlgorithm, ops};
use crate::{env::Environment, error::BgResult};

/// Result of a value expression. `None` slots carry "no result".
pub type ValueList = SmallVec<[Option<Value>; 2]>;

/// Which values a name reference sees.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum RefScope {
    /// The most recent visible value, looked up from the innermost open scope outward.
    Visible,
    /// Every value with that name anywhere in the graph, oldest first.
    All,
}

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, EnumIter)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    /// Truncating division.
    Div,
    FloorDiv,
    /// Floored modulo. A modulus `<= 0` gives no result.
    Mod,
    And,
    Or,
    ShiftLeft,
    ShiftRight,
}

impl BinaryOp {
    /// Creates a [`BinaryOp`] from its string representation.
    pub fn from_str(s: &str) -> Option<Self> {
        BinaryOp::iter().find(|op| op.to_str() == s)
    }

    /// Returns the string representation of the [`BinaryOp`].
    pub fn to_str(&self) -> &'static str {
        match self {
            BinaryOp::Add => "add",
            BinaryOp::Sub => "sub",
            BinaryOp::Mul => "mul",
            BinaryOp::Div => "div",
            BinaryOp::FloorDiv => "floordiv",
            BinaryOp::Mod => "mod",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
            BinaryOp::ShiftLeft => "shl",
            BinaryOp::ShiftRight => "shr",
        }
    }
}

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, EnumIter)]
pub enum UnaryOp {
    Neg,
    Not,
}

impl UnaryOp {
    pub fn from_str(s: &str) -> Option<Self> {
        UnaryOp::iter().find(|op| op.to_str() == s)
    }

    pub fn to_str(&self) -> &'static str {
        match self {
            UnaryOp::Neg => "neg",
            UnaryOp::Not => "not",
        }
    }
}

/// Expression producing a list of values.
///
/// Binary operators work element by element; the shorter operand is padded
/// with "no result", and any slot where an operand has no result has no
/// result itself.
#[derive(Debug, Clone)]
pub enum ValueExpression {
    Const(Value),
    /// Most recently produced value, the one a predicate validates.
    Current,
    CurrentOffset,
    /// Counter of the enclosing repetition, `0` being the innermost.
    CurrentIteration(usize),
    Ref { name: String, scope: RefScope },
    First(Box<ValueExpression>),
    Last(Box<ValueExpression>),
    /// Elements of `values` at each position listed by `indices`.
    Nth {
        values: Box<ValueExpression>,
        indices: Box<ValueExpression>,
    },
    /// Number of elements, as a single value.
    Count(Box<ValueExpression>),
    /// Byte length of each element.
    Len(Box<ValueExpression>),
    /// Source offset of each element; literals have none.
    Offset(Box<ValueExpression>),
    Reverse(Box<ValueExpression>),
    /// Byte concatenation of each pair of elements.
    Cat(Box<ValueExpression>, Box<ValueExpression>),
    /// Left element when present, otherwise the right one.
    Elvis(Box<ValueExpression>, Box<ValueExpression>),
    Unary {
        op: UnaryOp,
        operand: Box<ValueExpression>,
    },
    Binary {
        op: BinaryOp,
        left: Box<ValueExpression>,
        right: Box<ValueExpression>,
    },
    Digest {
        algorithm: DigestAlgorithm,
        operand: Box<ValueExpression>,
    },
}

impl ValueExpression {
    pub fn eval(&self, env: &Environment, encoding: Encoding) -> BgResult<ValueList> {
        let numeric = |n: BigInt| Value::from_numeric(&n, encoding);

        Ok(match self {
            ValueExpression::Const(value) => smallvec![Some(value.clone())],
            ValueExpression::Current => env
                .graph()
                .current()
                .map(|current| Some(current.value().clone()))
                .into_iter()
                .collect(),
            ValueExpression::CurrentOffset => smallvec![Some(numeric(env.offset().into()))],
            ValueExpression::CurrentIteration(level) => env
                .current_iteration(*level)
                .map(|count| Some(numeric(count.into())))
                .into_iter()
                .collect(),
            ValueExpression::Ref {
                name,
                scope: RefScope::Visible,
            } => env
                .graph()
                .get(name)
                .map(|found| Some(found.value().clone()))
                .into_iter()
                .collect(),
            ValueExpression::Ref {
                name,
                scope: RefScope::All,
            } => env
                .graph()
                .get_all(name)
                .iter()
                .map(|found| Some(found.value().clone()))
                .collect(),
            ValueExpression::First(operand) => {
                operand.eval(env, encoding)?.into_iter().take(1).collect()
            }
            ValueExpression::Last(operand) => {
                operand.eval(env, encoding)?.into_iter().last().into_iter().collect()
            }
            ValueExpression::Nth { values, indices } => {
                let values = values.eval(env, encoding)?;
                let mut picked = ValueList::new();
                for index in indices.eval(env, encoding)? {
                    let index = match index {
                        Some(index) => index.as_usize()?,
                        None => None,
                    };
                    picked.push(index.and_then(|index| values.get(index).cloned().flatten()));
                }
                picked
            }
            ValueExpression::Count(operand) => {
                let count = operand.eval(env, encoding)?.len();
                smallvec![Some(numeric(count.into()))]
            }
            ValueExpression::Len(operand) => operand
                .eval(env, encoding)?
                .iter()
                .map(|value| value.as_ref().map(|v| numeric(v.len().into())))
                .collect(),
            ValueExpression::Offset(operand) => operand
                .eval(env, encoding)?
                .iter()
                .map(|value| {
                    let offset = value.as_ref()?.source_offset()?;
                    Some(numeric(offset.into()))
                })
                .collect(),
            ValueExpression::Reverse(operand) => {
                let mut values = operand.eval(env, encoding)?;
                values.reverse();
                values
            }
            ValueExpression::Cat(left, right) => pairwise(
                &left.eval(env, encoding)?,
                &right.eval(env, encoding)?,
                |l, r| {
                    let (Some(l), Some(r)) = (l, r) else {
                        return Ok(None);
                    };
                    let bytes = [l.bytes()?, r.bytes()?].concat();
                    Ok(Some(Value::from_bytes(bytes, l.encoding())))
                },
            )?,
            ValueExpression::Elvis(left, right) => pairwise(
                &left.eval(env, encoding)?,
                &right.eval(env, encoding)?,
                |l, r| Ok(l.or(r).cloned()),
            )?,
            ValueExpression::Unary { op, operand } => operand
                .eval(env, encoding)?
                .iter()
                .map(|value| match value {
                    Some(value) => ops::unary(*op, value, encoding),
                    None => Ok(None),
                })
                .collect::<DataResult<ValueList>>()?,
            ValueExpression::Binary { op, left, right } => pairwise(
                &left.eval(env, encoding)?,
                &right.eval(env, encoding)?,
                |l, r| match (l, r) {
                    (Some(l), Some(r)) => ops::binary(*op, l, r, encoding),
                    _ => Ok(None),
                },
            )?,
            ValueExpression::Digest { algorithm, operand } => {
                let mut digests = ValueList::new();
                for value in operand.eval(env, encoding)? {
                    digests.push(match value {
                        Some(value) => Some(algorithm.digest(&value, encoding)?),
                        None => None,
                    });
                }
                digests
            }
        })
    }

    /// Evaluate to exactly one present value.
    pub fn eval_single(&self, env: &Environment, encoding: Encoding) -> BgResult<Option<Value>> {
        let mut values = self.eval(env, encoding)?;
        Ok(match values.len() {
            1 => values.pop().flatten(),
            _ => None,
        })
    }
}

fn pairwise(
    left: &ValueList,
    right: &ValueList,
    op: impl Fn(Option<&Value>, Option<&Value>) -> DataResult<Option<Value>>,
) -> DataResult<ValueList> {
    let len = left.len().max(right.len());
    (0..len)
        .map(|index| {
            op(
                left.get(index).and_then(Option::as_ref),
                right.get(index).and_then(Option::as_ref),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use bgdata::source::InMemorySource;

    use super::*;
    use crate::{
        graph::{ParseItem, ParseValue},
        shorthand::*,
    };

    fn env() -> Environment {
        Environment::new(Arc::new(InMemorySource::new(vec![1u8, 2, 3, 4])))
    }

    fn numbers(values: &ValueList) -> Vec<Option<BigInt>> {
        values
            .iter()
            .map(|v| v.as_ref().map(|v| v.as_numeric().unwrap()))
            .collect()
    }

    fn some(n: i64) -> Option<BigInt> {
        Some(BigInt::from(n))
    }

    fn env_with(bytes: &[u8]) -> Environment {
        let token = def("x", con(1));
        bytes.iter().enumerate().fold(env(), |env, (offset, byte)| {
            env.add(ParseItem::Value(ParseValue::new(
                "x",
                Value::from_bytes(vec![*byte], Encoding::default()),
                offset as u64,
                Arc::clone(&token),
            )))
        })
    }

    #[test]
    fn shorter_operand_is_padded() {
        let env = env_with(&[1, 2, 3]);
        let out = add(all_refs("x"), con(10)).eval(&env, Encoding::default()).unwrap();
        assert_eq!(numbers(&out), vec![some(11), None, None]);

        let out = elvis(con(7), all_refs("x")).eval(&env, Encoding::default()).unwrap();
        assert_eq!(numbers(&out), vec![some(7), some(2), some(3)]);

        let out = reverse(all_refs("x")).eval(&env, Encoding::default()).unwrap();
        assert_eq!(numbers(&out), vec![some(3), some(2), some(1)]);

        let out = nth(all_refs("x"), cat(con(0), con(2))).eval(&env, Encoding::default());
        assert_eq!(numbers(&out.unwrap()), vec![some(3)]);

        let out = name_ref("x").eval(&env, Encoding::default()).unwrap();
        assert_eq!(numbers(&out), vec![some(3)]);
        let out = count(all_refs("x")).eval(&env, Encoding::default()).unwrap();
        assert_eq!(numbers(&out), vec![some(3)]);
        let out = last(all_refs("x")).eval(&env, Encoding::default()).unwrap();
        assert_eq!(numbers(&out), vec![some(3)]);
        // Values built from literal bytes have no source offset.
        let out = offset(first(all_refs("x"))).eval(&env, Encoding::default()).unwrap();
        assert_eq!(numbers(&out), vec![None]);
    }

    #[test]
    fn missing_slots_propagate() {
        let nothing = nth(con(7), con(3));
        let out = add(nothing.clone(), con(1)).eval(&env(), Encoding::default()).unwrap();
        assert_eq!(numbers(&out), vec![None]);

        let out = elvis(nothing, con(9)).eval(&env(), Encoding::default()).unwrap();
        assert_eq!(numbers(&out), vec![some(9)]);
    }

    #[test]
    fn list_helpers() {
        let out = count(name_ref("missing")).eval(&env(), Encoding::default()).unwrap();
        assert_eq!(numbers(&out), vec![some(0)]);

        let out = len(con_str("abc")).eval(&env(), Encoding::default()).unwrap();
        assert_eq!(numbers(&out), vec![some(3)]);

        let out = offset(con(1)).eval(&env(), Encoding::default()).unwrap();
        assert_eq!(numbers(&out), vec![None]);

        let out = current_offset().eval(&env().seek(3), Encoding::default()).unwrap();
        assert_eq!(numbers(&out), vec![some(3)]);

        assert!(current().eval(&env(), Encoding::default()).unwrap().is_empty());
        assert!(current_iteration(0).eval(&env(), Encoding::default()).unwrap().is_empty());
    }

    #[test]
    fn single_value() {
        let e = env();
        assert!(con(1).eval_single(&e, Encoding::default()).unwrap().is_some());
        assert!(name_ref("nope").eval_single(&e, Encoding::default()).unwrap().is_none());
        assert!(div(con(1), con(0)).eval_single(&e, Encoding::default()).unwrap().is_none());
    }

    #[test]
    fn op_names() {
        for op in BinaryOp::iter() {
            assert_eq!(BinaryOp::from_str(op.to_str()), Some(op));
        }
        assert_eq!(UnaryOp::from_str("neg"), Some(UnaryOp::Neg));
    }
}
