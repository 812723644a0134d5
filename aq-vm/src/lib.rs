//! AQ virtual machine implementation.
//!
//! The VM consumes a bytecode [`image`](crate::image::Image) — a typed data
//! segment plus an instruction segment — and a registry of host functions,
//! and executes the instruction stream against a single flat, dynamically
//! typed memory. Producing the image (compiler, file I/O) and the host
//! function set beyond [`host::builtins`] are the embedder's concern.

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![deny(unused_must_use)]

pub mod call;
pub mod consts;
pub mod error;
pub mod host;
pub mod image;
pub mod interpreter;
pub mod state;

#[doc(no_inline)]
pub use aq_asm;

pub mod prelude {
    //! Required types for embedding the VM.

    #[doc(no_inline)]
    pub use aq_asm::{op, CmpOp, FaultReason, Opcode, TypeTag, Word};

    pub use crate::{
        call::{CallDescriptor, HostCall},
        error::{ImageError, InterpreterError, SimpleResult},
        host::{HostHandler, NameTable},
        image::{Image, ImageBuilder},
        interpreter::{Heap, Interpreter, Scalar, TaggedMemory},
        state::{ExecuteState, ProgramState},
    };
}
