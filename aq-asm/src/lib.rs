//! Atomic types of the AQ instruction set.
//!
//! This crate holds everything shared between producers and consumers of AQ
//! bytecode: the opcode enumeration, the runtime type tags carried by memory
//! slots, the fault reasons surfaced by the interpreter, and the ULEB-255
//! variable-length operand codec. The [`op`] module provides one constructor
//! function per opcode for assembling code segments byte by byte.

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![deny(unused_must_use)]

pub mod encoding;
mod fault;
pub mod op;
mod opcode;
mod tag;

pub use fault::FaultReason;
pub use opcode::{CmpOp, Opcode};
pub use tag::TypeTag;

/// Machine word of the AQ VM.
pub type Word = u64;

/// Length of a machine word, in bytes.
pub const WORD_SIZE: usize = core::mem::size_of::<Word>();
