//! [`Interpreter`] implementation.

use core::fmt;

use crate::error::ImageError;
use crate::host::{HostHandler, NameTable};
use crate::image::Image;

mod alu;
mod executors;
mod flow;
mod heap;
mod memory;

pub use heap::Heap;
pub use memory::{Scalar, TaggedMemory};

/// AQ bytecode interpreter.
///
/// Owns the tagged memory, the code segment, the guest heap and the host
/// name table for one execution context. The VM is strictly
/// single-threaded; embedding several instances in one process means each
/// owns its own state.
pub struct Interpreter {
    memory: TaggedMemory,
    heap: Heap,
    code: Vec<u8>,
    pc: usize,
    hosts: NameTable,
}

impl Interpreter {
    /// Creates an interpreter over a parsed image with an empty host
    /// registry.
    pub fn new(image: Image) -> Self {
        let (memory, code) = image.into_parts();
        let heap = Heap::new(memory.size());
        Self {
            memory,
            heap,
            code,
            pc: 0,
            hosts: NameTable::new(),
        }
    }

    /// Parses `bytes` as an image and creates an interpreter over it.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ImageError> {
        Ok(Self::new(Image::parse(bytes)?))
    }

    /// Registers a host function. Call before [`Self::run`]; the name
    /// table is fixed during execution.
    pub fn register(&mut self, name: impl Into<Vec<u8>>, handler: HostHandler) {
        let name = name.into();
        tracing::debug!(name = %String::from_utf8_lossy(&name), "register host function");
        self.hosts.register(name, handler);
    }

    /// The current state of the VM memory.
    pub const fn memory(&self) -> &TaggedMemory {
        &self.memory
    }

    /// Mutable access to the VM memory.
    pub fn memory_mut(&mut self) -> &mut TaggedMemory {
        &mut self.memory
    }

    /// The guest heap.
    pub const fn heap(&self) -> &Heap {
        &self.heap
    }

    /// The code segment.
    pub fn code(&self) -> &[u8] {
        &self.code
    }

    /// Current program counter, a byte offset into the code segment.
    pub const fn pc(&self) -> usize {
        self.pc
    }
}

impl fmt::Debug for Interpreter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interpreter")
            .field("pc", &self.pc)
            .field("memory_size", &self.memory.size())
            .field("code_len", &self.code.len())
            .field("heap_blocks", &self.heap.len())
            .field("hosts", &self.hosts)
            .finish()
    }
}

impl From<Image> for Interpreter {
    fn from(image: Image) -> Self {
        Self::new(image)
    }
}
