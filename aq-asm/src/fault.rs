use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::EnumIter)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
#[non_exhaustive]
/// Fault reason representation for the interpreter.
///
/// Every fault is fatal: guest code has no way to observe or recover from
/// one, and the interpreter surfaces it to the embedder as an abnormal
/// termination.
pub enum FaultReason {
    /// The byte can't be mapped to any known `FaultReason`.
    UnknownFaultReason = 0x00,
    /// The fetched byte is not a known opcode.
    UnknownOpcode = 0x01,
    /// Integer division or remainder with a zero divisor.
    DivisionByZero = 0x02,
    /// `INVOKE` named a function absent from the host name table.
    UnresolvedName = 0x03,
    /// An operand ran past the end of the code segment.
    TruncatedCode = 0x04,
    /// A slot access fell outside the data segment or a heap block.
    MemoryOverflow = 0x05,
    /// `NEW` could not satisfy the requested allocation.
    OutOfMemory = 0x06,
    /// An operation was applied to a slot whose tag doesn't support it.
    InvalidType = 0x07,
    /// The `CMP` operator selector is not a known comparison.
    InvalidComparison = 0x08,
    /// `FREE` of an address that doesn't name a live heap block.
    InvalidFree = 0x09,
    /// An `INVOKE` frame declared a nonsensical argument count.
    MalformedCallFrame = 0x0a,
    /// A host function failed to complete.
    HostFailure = 0x0b,
}

impl fmt::Display for FaultReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

impl std::error::Error for FaultReason {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        None
    }
}

impl From<u8> for FaultReason {
    /// Converts the `u8` into a `FaultReason`.
    fn from(b: u8) -> Self {
        use FaultReason::*;
        match b {
            0x01 => UnknownOpcode,
            0x02 => DivisionByZero,
            0x03 => UnresolvedName,
            0x04 => TruncatedCode,
            0x05 => MemoryOverflow,
            0x06 => OutOfMemory,
            0x07 => InvalidType,
            0x08 => InvalidComparison,
            0x09 => InvalidFree,
            0x0a => MalformedCallFrame,
            0x0b => HostFailure,
            _ => UnknownFaultReason,
        }
    }
}
