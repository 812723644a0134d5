//! Runtime interpreter error implementation.

use aq_asm::{FaultReason, Word};

/// Interpreter runtime error variants.
///
/// Every variant is fatal: the VM has no recovery path and guest code
/// cannot observe a fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InterpreterError {
    /// Execution faulted on the instruction at `pc`.
    #[display(fmt = "execution fault at pc {pc}: {reason}")]
    Fault {
        /// What went wrong.
        reason: FaultReason,
        /// Byte offset of the faulting instruction in the code segment.
        pc: Word,
    },
}

impl InterpreterError {
    /// The fault reason carried by this error.
    pub const fn fault_reason(&self) -> FaultReason {
        match self {
            Self::Fault { reason, .. } => *reason,
        }
    }

    /// Byte offset of the faulting instruction.
    pub const fn pc(&self) -> Word {
        match self {
            Self::Fault { pc, .. } => *pc,
        }
    }
}

impl std::error::Error for InterpreterError {}

/// Image decoding error variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ImageError {
    /// The buffer does not start with the `"AQBC"` magic.
    #[display(fmt = "bad image magic")]
    BadMagic,
    /// The buffer ends before the declared segments do.
    #[display(fmt = "image truncated: {_0} bytes missing")]
    UnexpectedEof(usize),
}

impl std::error::Error for ImageError {}

/// Result of an operation that can only fault.
pub type SimpleResult<T> = Result<T, FaultReason>;
