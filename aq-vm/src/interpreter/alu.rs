//! Arithmetic/logic kernels.
//!
//! Every binary operation computes a working type, the highest-ranked tag
//! among destination and sources, performs the operation at that type's
//! width, and stores the result into the destination with the usual store
//! coercion. Dispatching once on the working type keeps each kernel
//! monomorphic.

use aq_asm::{CmpOp, FaultReason, TypeTag, Word};

use super::memory::{Scalar, TaggedMemory};
use crate::error::SimpleResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Operator selector for the binary arithmetic kernel.
pub(crate) enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Shl,
    Shr,
    Sar,
    And,
    Or,
    Xor,
}

impl BinaryOp {
    /// Whether the operator is defined for floating working types.
    const fn admits_floats(self) -> bool {
        matches!(self, Self::Add | Self::Sub | Self::Mul | Self::Div)
    }
}

/// The working type of an operation: the highest-ranked tag among its
/// operands and destination.
pub(crate) fn working_type(tags: &[TypeTag]) -> SimpleResult<TypeTag> {
    let mut tags = tags.iter().copied();
    let first = tags.next().ok_or(FaultReason::InvalidType)?;
    tags.try_fold(first, |best, tag| {
        best.promoted(tag).ok_or(FaultReason::InvalidType)
    })
}

// The shift count is masked to the working type's bit width; both right
// shifts are arithmetic, matching the observed ISA behavior.
macro_rules! int_binary {
    ($ty:ty, $op:expr, $lhs:expr, $rhs:expr) => {{
        #[allow(clippy::cast_possible_truncation)]
        let lhs = $lhs as $ty;
        #[allow(clippy::cast_possible_truncation)]
        let rhs = $rhs as $ty;
        let value = match $op {
            BinaryOp::Add => lhs.wrapping_add(rhs),
            BinaryOp::Sub => lhs.wrapping_sub(rhs),
            BinaryOp::Mul => lhs.wrapping_mul(rhs),
            BinaryOp::Div => {
                if rhs == 0 {
                    return Err(FaultReason::DivisionByZero);
                }
                lhs.wrapping_div(rhs)
            }
            BinaryOp::Rem => {
                if rhs == 0 {
                    return Err(FaultReason::DivisionByZero);
                }
                lhs.wrapping_rem(rhs)
            }
            #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
            BinaryOp::Shl => lhs.wrapping_shl(rhs as u32),
            #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
            BinaryOp::Shr | BinaryOp::Sar => lhs.wrapping_shr(rhs as u32),
            BinaryOp::And => lhs & rhs,
            BinaryOp::Or => lhs | rhs,
            BinaryOp::Xor => lhs ^ rhs,
        };
        i64::from(value)
    }};
}

macro_rules! float_binary {
    ($ty:ty, $op:expr, $lhs:expr, $rhs:expr) => {{
        #[allow(clippy::cast_possible_truncation)]
        let lhs = $lhs as $ty;
        #[allow(clippy::cast_possible_truncation)]
        let rhs = $rhs as $ty;
        match $op {
            BinaryOp::Add => lhs + rhs,
            BinaryOp::Sub => lhs - rhs,
            BinaryOp::Mul => lhs * rhs,
            BinaryOp::Div => lhs / rhs,
            _ => return Err(FaultReason::InvalidType),
        }
    }};
}

/// Executes `r = a <op> b` in the working type.
pub(crate) fn binary(
    memory: &mut TaggedMemory,
    op: BinaryOp,
    r: Word,
    a: Word,
    b: Word,
) -> SimpleResult<()> {
    let ty = working_type(&[memory.type_of(r)?, memory.type_of(a)?, memory.type_of(b)?])?;
    if ty.is_float() && !op.admits_floats() {
        return Err(FaultReason::InvalidType);
    }
    let value = match ty {
        TypeTag::Float => {
            let lhs = memory.read_scalar(a)?.to_double();
            let rhs = memory.read_scalar(b)?.to_double();
            Scalar::Float(float_binary!(f32, op, lhs, rhs))
        }
        TypeTag::Double => {
            let lhs = memory.read_scalar(a)?.to_double();
            let rhs = memory.read_scalar(b)?.to_double();
            Scalar::Double(float_binary!(f64, op, lhs, rhs))
        }
        _ => {
            let lhs = memory.read_scalar(a)?.to_long();
            let rhs = memory.read_scalar(b)?.to_long();
            Scalar::Long(match ty {
                TypeTag::Byte => int_binary!(i8, op, lhs, rhs),
                TypeTag::Int => int_binary!(i32, op, lhs, rhs),
                _ => int_binary!(i64, op, lhs, rhs),
            })
        }
    };
    memory.write_scalar(r, value)
}

/// Executes `r = -a` in the working type.
pub(crate) fn negate(memory: &mut TaggedMemory, r: Word, a: Word) -> SimpleResult<()> {
    let ty = working_type(&[memory.type_of(r)?, memory.type_of(a)?])?;
    let value = match ty {
        TypeTag::Float => {
            #[allow(clippy::cast_possible_truncation)]
            let v = memory.read_scalar(a)?.to_double() as f32;
            Scalar::Float(-v)
        }
        TypeTag::Double => Scalar::Double(-memory.read_scalar(a)?.to_double()),
        _ => {
            let v = memory.read_scalar(a)?.to_long();
            #[allow(clippy::cast_possible_truncation)]
            let value = match ty {
                TypeTag::Byte => i64::from((v as i8).wrapping_neg()),
                TypeTag::Int => i64::from((v as i32).wrapping_neg()),
                _ => v.wrapping_neg(),
            };
            Scalar::Long(value)
        }
    };
    memory.write_scalar(r, value)
}

/// Executes `r = a <op> b` where `op` is the byte-valued comparison
/// selector held at `sel`.
pub(crate) fn compare(
    memory: &mut TaggedMemory,
    r: Word,
    sel: Word,
    a: Word,
    b: Word,
) -> SimpleResult<()> {
    let raw = memory.read_scalar(sel)?.to_long();
    let op = CmpOp::try_from(
        u8::try_from(raw).map_err(|_| FaultReason::InvalidComparison)?,
    )?;
    let ty = working_type(&[memory.type_of(r)?, memory.type_of(a)?, memory.type_of(b)?])?;
    let truth = match ty {
        TypeTag::Float => {
            #[allow(clippy::cast_possible_truncation)]
            let lhs = memory.read_scalar(a)?.to_double() as f32;
            #[allow(clippy::cast_possible_truncation)]
            let rhs = memory.read_scalar(b)?.to_double() as f32;
            op.holds(lhs, rhs)
        }
        TypeTag::Double => op.holds(
            memory.read_scalar(a)?.to_double(),
            memory.read_scalar(b)?.to_double(),
        ),
        // Promotion to a wider integer type preserves ordering, so the
        // sign-extended values compare directly.
        _ => op.holds(
            memory.read_scalar(a)?.to_long(),
            memory.read_scalar(b)?.to_long(),
        ),
    };
    memory.write_scalar(r, Scalar::Long(i64::from(truth)))
}
