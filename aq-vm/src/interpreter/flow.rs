//! Control flow primitives.

use aq_asm::FaultReason;

use crate::error::SimpleResult;

/// Resolves a relative branch.
///
/// `base` is the byte offset right after the branching instruction's opcode
/// byte; `offset` is the signed displacement read from memory. A target
/// exactly at `code_len` is a normal halt, anything outside `0..=code_len`
/// is fatal.
pub(crate) fn branch_target(
    base: usize,
    offset: i64,
    code_len: usize,
) -> SimpleResult<usize> {
    let delta = isize::try_from(offset).map_err(|_| FaultReason::MemoryOverflow)?;
    let target = base
        .checked_add_signed(delta)
        .ok_or(FaultReason::MemoryOverflow)?;
    if target > code_len {
        return Err(FaultReason::MemoryOverflow);
    }
    Ok(target)
}
