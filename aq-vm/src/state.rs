//! Runtime state representation for the VM.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// Resulting state of a single instruction dispatch.
pub enum ExecuteState {
    /// The VM should proceed to the next instruction.
    Proceed,
    /// A control-flow instruction moved the program counter to the given
    /// byte offset.
    Jump(usize),
    /// `RETURN` was executed; the current context terminates.
    Return,
}

impl ExecuteState {
    /// Return true if the VM execution should continue.
    pub const fn should_continue(&self) -> bool {
        !matches!(self, Self::Return)
    }
}

impl Default for ExecuteState {
    fn default() -> Self {
        Self::Proceed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
/// Resulting state of a program execution.
pub enum ProgramState {
    /// `RETURN` terminated the execution context.
    Return,
    /// The program counter ran past the end of the code segment.
    EndOfCode,
}
