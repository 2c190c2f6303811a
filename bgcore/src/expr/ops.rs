//! Element operators. `None` means "no result" for that slot.
use bgdata::{
    DataResult,
    encoding::{Encoding, Sign},
    value::Value,
};
use bit_set::BitSet;
use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{Signed, ToPrimitive, Zero};

use super::value::{BinaryOp, UnaryOp};

/// Widest result a left shift may produce, in bits. Larger shifts have no
/// result.
pub const MAX_SHIFT_BITS: usize = 1 << 20;

/// Negative results are tagged signed so they read back as negative.
fn numeric(n: BigInt, encoding: Encoding) -> Option<Value> {
    let encoding = if n.is_negative() {
        encoding.with_sign(Sign::Signed)
    } else {
        encoding
    };
    Some(Value::from_numeric(&n, encoding))
}

pub(crate) fn binary(
    op: BinaryOp,
    left: &Value,
    right: &Value,
    encoding: Encoding,
) -> DataResult<Option<Value>> {
    let out = match op {
        BinaryOp::Add => numeric(left.as_numeric()? + right.as_numeric()?, encoding),
        BinaryOp::Sub => numeric(left.as_numeric()? - right.as_numeric()?, encoding),
        BinaryOp::Mul => numeric(left.as_numeric()? * right.as_numeric()?, encoding),
        BinaryOp::Div => {
            let divisor = right.as_numeric()?;
            if divisor.is_zero() {
                return Ok(None);
            }
            numeric(left.as_numeric()? / divisor, encoding)
        }
        BinaryOp::FloorDiv => {
            let divisor = right.as_numeric()?;
            if divisor.is_zero() {
                return Ok(None);
            }
            numeric(left.as_numeric()?.div_floor(&divisor), encoding)
        }
        BinaryOp::Mod => {
            let modulus = right.as_numeric()?;
            if !modulus.is_positive() {
                return Ok(None);
            }
            numeric(left.as_numeric()?.mod_floor(&modulus), encoding)
        }
        BinaryOp::And => {
            let mut bits = left.as_bits()?;
            bits.intersect_with(&right.as_bits()?);
            Some(Value::from_bits(&bits, left.len().max(right.len()), encoding))
        }
        BinaryOp::Or => {
            let mut bits = left.as_bits()?;
            bits.union_with(&right.as_bits()?);
            Some(Value::from_bits(&bits, left.len().max(right.len()), encoding))
        }
        BinaryOp::ShiftLeft => {
            let Some(amount) = shift_amount(right)? else {
                return Ok(None);
            };
            let bits = left.as_bits()?;
            let fits = bits.iter().max().is_none_or(|highest| {
                highest
                    .checked_add(amount)
                    .is_some_and(|top| top < MAX_SHIFT_BITS)
            });
            if !fits {
                return Ok(None);
            }
            let shifted: BitSet = bits.iter().map(|bit| bit + amount).collect();
            Some(Value::from_bits(&shifted, 1, encoding))
        }
        BinaryOp::ShiftRight => {
            let Some(amount) = shift_amount(right)? else {
                return Ok(None);
            };
            let bits: BitSet = left
                .as_bits()?
                .iter()
                .filter_map(|bit| bit.checked_sub(amount))
                .collect();
            Some(Value::from_bits(&bits, 1, encoding))
        }
    };
    Ok(out)
}

pub(crate) fn unary(
    op: UnaryOp,
    operand: &Value,
    encoding: Encoding,
) -> DataResult<Option<Value>> {
    let out = match op {
        UnaryOp::Neg => numeric(-operand.as_numeric()?, encoding),
        UnaryOp::Not => {
            let set = operand.as_bits()?;
            let flipped: BitSet = (0..operand.len() * 8)
                .filter(|bit| !set.contains(*bit))
                .collect();
            Some(Value::from_bits(&flipped, operand.len(), encoding))
        }
    };
    Ok(out)
}

/// Non-negative amounts that fit a `usize`; anything else has no result.
fn shift_amount(value: &Value) -> DataResult<Option<usize>> {
    let amount = value.as_numeric()?;
    if amount.is_negative() {
        return Ok(None);
    }
    Ok(amount.to_usize())
}
