//! Host function registry.
//!
//! Guest code reaches the embedder through `INVOKE`: the instruction names
//! a host function by a NUL-terminated string in the data segment, and the
//! name table maps it to a registered handler. Registration happens before
//! execution starts; the table is never mutated while the VM runs.

use core::fmt;

use aq_asm::Word;

use crate::call::CallDescriptor;
use crate::consts::NAME_TABLE_BUCKETS;
use crate::error::SimpleResult;
use crate::interpreter::TaggedMemory;

/// Host function signature.
///
/// The handler reads its arguments and writes its result through the
/// tagged memory it borrows for the duration of the call; `args` names the
/// argument slots and `ret` the single return slot.
pub type HostHandler =
    Box<dyn FnMut(&mut TaggedMemory, &CallDescriptor, &CallDescriptor) -> SimpleResult<()>>;

/// Fixed-bucket name table mapping guest-visible names to host handlers.
///
/// djb2 over the raw name bytes, modulo the bucket count. Chains prepend on
/// registration, so re-registering a name shadows the older handler.
pub struct NameTable {
    buckets: Vec<Vec<(Vec<u8>, HostHandler)>>,
}

fn djb2(bytes: &[u8]) -> u64 {
    bytes
        .iter()
        .fold(5381u64, |hash, &b| hash.wrapping_mul(33).wrapping_add(u64::from(b)))
}

impl NameTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        let mut buckets = Vec::with_capacity(NAME_TABLE_BUCKETS);
        buckets.resize_with(NAME_TABLE_BUCKETS, Vec::new);
        Self { buckets }
    }

    fn bucket_of(name: &[u8]) -> usize {
        #[allow(clippy::cast_possible_truncation)] // bucket count is tiny
        let bucket = (djb2(name) % NAME_TABLE_BUCKETS as u64) as usize;
        bucket
    }

    /// Registers `handler` under `name`, shadowing any previous entry.
    pub fn register(&mut self, name: impl Into<Vec<u8>>, handler: HostHandler) {
        let name = name.into();
        let bucket = &mut self.buckets[Self::bucket_of(&name)];
        bucket.insert(0, (name, handler));
    }

    /// Looks up the handler registered under `name`.
    pub fn lookup_mut(&mut self, name: &[u8]) -> Option<&mut HostHandler> {
        self.buckets[Self::bucket_of(name)]
            .iter_mut()
            .find(|(entry, _)| entry == name)
            .map(|(_, handler)| handler)
    }

    /// Whether a handler is registered under `name`.
    pub fn contains(&self, name: &[u8]) -> bool {
        self.buckets[Self::bucket_of(name)]
            .iter()
            .any(|(entry, _)| entry == name)
    }

    /// Number of registered entries across all buckets.
    pub fn len(&self) -> usize {
        self.buckets.iter().map(Vec::len).sum()
    }

    /// Whether no handler is registered.
    pub fn is_empty(&self) -> bool {
        self.buckets.iter().all(Vec::is_empty)
    }
}

impl Default for NameTable {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for NameTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NameTable")
            .field("entries", &self.len())
            .finish()
    }
}

pub mod builtins {
    //! Built-in host functions registered by the stock embedding.

    use std::io::{self, Write};

    use aq_asm::FaultReason;

    use super::*;
    use crate::interpreter::Scalar;

    /// `print(format, ...) -> int`: C-style formatted write to standard
    /// output. Returns the number of bytes written into its return slot.
    pub fn print() -> HostHandler {
        print_to(io::stdout())
    }

    /// [`print`] with the output redirected, for embedders and tests.
    pub fn print_to<W: Write + 'static>(mut out: W) -> HostHandler {
        Box::new(move |memory, args, ret| {
            let written = format_into(&mut out, memory, args)?;
            if let Some(slot) = ret.get(0) {
                #[allow(clippy::cast_possible_wrap)]
                memory.write_scalar(slot, Scalar::Long(written as i64))?;
            }
            Ok(())
        })
    }

    /// Walks the format string held at the address in the first argument
    /// slot, consuming one further argument slot per conversion.
    ///
    /// Supports `%%`, `%c`, `%d`, `%ld`, `%u`, `%f`, `%g`, `%s` and `%p`;
    /// any other sequence is copied through verbatim.
    fn format_into(
        out: &mut dyn Write,
        memory: &TaggedMemory,
        args: &CallDescriptor,
    ) -> SimpleResult<usize> {
        let format_addr = memory
            .read_scalar(args.get(0).ok_or(FaultReason::MalformedCallFrame)?)?
            .to_word();
        let format = memory.read_cstr(format_addr)?.to_vec();

        let mut rendered = Vec::with_capacity(format.len());
        let mut next_arg = 1usize;
        let arg = |next_arg: &mut usize| -> SimpleResult<Word> {
            let slot = args.get(*next_arg).ok_or(FaultReason::MalformedCallFrame)?;
            *next_arg += 1;
            Ok(slot)
        };

        let mut bytes = format.iter().copied().peekable();
        while let Some(b) = bytes.next() {
            if b != b'%' {
                rendered.push(b);
                continue;
            }
            let Some(conv) = bytes.next() else {
                rendered.push(b'%');
                break;
            };
            match conv {
                b'%' => rendered.push(b'%'),
                b'c' => {
                    let v = memory.read_scalar(arg(&mut next_arg)?)?.to_long();
                    #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
                    rendered.push(v as u8);
                }
                b'd' => {
                    let v = memory.read_scalar(arg(&mut next_arg)?)?.to_long();
                    rendered.extend_from_slice(v.to_string().as_bytes());
                }
                b'l' if bytes.peek() == Some(&b'd') => {
                    bytes.next();
                    let v = memory.read_scalar(arg(&mut next_arg)?)?.to_long();
                    rendered.extend_from_slice(v.to_string().as_bytes());
                }
                b'u' => {
                    let v = memory.read_scalar(arg(&mut next_arg)?)?.to_word();
                    rendered.extend_from_slice(v.to_string().as_bytes());
                }
                b'f' => {
                    let v = memory.read_scalar(arg(&mut next_arg)?)?.to_double();
                    rendered.extend_from_slice(format!("{v:.6}").as_bytes());
                }
                b'g' => {
                    let v = memory.read_scalar(arg(&mut next_arg)?)?.to_double();
                    rendered.extend_from_slice(format!("{v}").as_bytes());
                }
                b's' => {
                    let addr = memory.read_scalar(arg(&mut next_arg)?)?.to_word();
                    rendered.extend_from_slice(memory.read_cstr(addr)?);
                }
                b'p' => {
                    let v = memory.read_scalar(arg(&mut next_arg)?)?.to_word();
                    rendered.extend_from_slice(format!("{v:#x}").as_bytes());
                }
                other => {
                    rendered.push(b'%');
                    rendered.push(other);
                }
            }
        }

        out.write_all(&rendered)
            .and_then(|()| out.flush())
            .map_err(|_| FaultReason::HostFailure)?;
        Ok(rendered.len())
    }
}
