//! Host call supporting structures.

use aq_asm::encoding::Operands;
use aq_asm::{FaultReason, Word};

use crate::error::SimpleResult;
use crate::interpreter::TaggedMemory;

#[derive(Debug, Default, Clone, PartialEq, Eq, Hash)]
/// Slot-index descriptor handed to host functions.
///
/// Names either an argument vector or a single return slot by their byte
/// offsets into the data segment. The handler reads and writes the slots
/// through the tagged memory it is given alongside.
pub struct CallDescriptor {
    slots: Vec<Word>,
}

impl CallDescriptor {
    /// Create a descriptor over the given slot indices.
    pub fn new(slots: Vec<Word>) -> Self {
        Self { slots }
    }

    /// Descriptor naming a single slot.
    pub fn single(slot: Word) -> Self {
        Self { slots: vec![slot] }
    }

    /// Number of named slots.
    pub fn size(&self) -> usize {
        self.slots.len()
    }

    /// The named slots.
    pub fn slots(&self) -> &[Word] {
        &self.slots
    }

    /// The `i`-th named slot.
    pub fn get(&self, i: usize) -> Option<Word> {
        self.slots.get(i).copied()
    }

    /// Expose the internal slot vector.
    pub fn into_inner(self) -> Vec<Word> {
        self.slots
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Decoded `INVOKE` frame.
pub struct HostCall {
    func: Word,
    ret: Word,
    args: CallDescriptor,
}

impl HostCall {
    /// Decodes a call frame from the operand stream.
    ///
    /// The argument operand count is the `long`-valued contents of memory
    /// at the count slot at decode time, which is what couples the
    /// instruction stream to data state for this one instruction.
    pub fn decode(ops: &mut Operands<'_>, memory: &TaggedMemory) -> SimpleResult<Self> {
        let [func, ret, count_slot] = ops.operands()?;
        let count = memory.read_scalar(count_slot)?.to_long();
        let count = usize::try_from(count).map_err(|_| FaultReason::MalformedCallFrame)?;
        let mut args = Vec::with_capacity(count.min(1024));
        for _ in 0..count {
            args.push(ops.operand()?);
        }
        Ok(Self {
            func,
            ret,
            args: CallDescriptor::new(args),
        })
    }

    /// Slot holding the pointer to the callee's name.
    pub const fn func(&self) -> Word {
        self.func
    }

    /// Slot receiving the callee's result.
    pub const fn ret(&self) -> Word {
        self.ret
    }

    /// Argument slots.
    pub const fn args(&self) -> &CallDescriptor {
        &self.args
    }
}
