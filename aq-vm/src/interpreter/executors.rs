//! Instruction fetch, decode and dispatch.

use aq_asm::encoding::Operands;
use aq_asm::{FaultReason, Opcode, Word};

use super::alu::{self, BinaryOp};
use super::flow;
use super::memory::{Scalar, TaggedMemory};
use super::Interpreter;
use crate::call::{CallDescriptor, HostCall};
use crate::error::{InterpreterError, SimpleResult};
use crate::state::{ExecuteState, ProgramState};

impl Interpreter {
    /// Executes the loaded code segment from the current program counter
    /// until `RETURN` or the end of the segment.
    pub fn run(&mut self) -> Result<ProgramState, InterpreterError> {
        while self.pc < self.code.len() {
            let pc = self.pc;
            match self.instruction() {
                Ok(ExecuteState::Proceed) => {}
                Ok(ExecuteState::Jump(target)) => self.pc = target,
                Ok(ExecuteState::Return) => return Ok(ProgramState::Return),
                Err(reason) => {
                    return Err(InterpreterError::Fault {
                        reason,
                        pc: pc as Word,
                    })
                }
            }
        }
        Ok(ProgramState::EndOfCode)
    }

    /// Executes the single instruction at the current program counter.
    fn instruction(&mut self) -> SimpleResult<ExecuteState> {
        let opcode = Opcode::try_from(self.code[self.pc])?;
        // Relative branches and operand decoding both start right after
        // the opcode byte.
        let base = self.pc + 1;

        tracing::trace!(pc = self.pc, ?opcode, "dispatch");

        let Self {
            code,
            memory,
            heap,
            hosts,
            ..
        } = self;
        let mut ops = Operands::new(code, base);

        let state = match opcode {
            Opcode::NOP => ExecuteState::Proceed,

            Opcode::LOAD => {
                let [src, dst] = ops.operands()?;
                memory.copy_slot(src, dst)?;
                ExecuteState::Proceed
            }

            Opcode::STORE => {
                let [ptr, src] = ops.operands()?;
                let addr = memory.read_scalar(ptr)?.to_word();
                let width = memory.type_of(src)?.width();
                let bytes = memory.read_raw(src, width)?.to_vec();
                if addr < memory.size() as Word {
                    memory.write_raw(addr, &bytes)?;
                } else {
                    heap.resolve_mut(addr, width)?.copy_from_slice(&bytes);
                }
                ExecuteState::Proceed
            }

            Opcode::NEW => {
                let [dst, size_slot] = ops.operands()?;
                let size = memory.read_scalar(size_slot)?.to_long();
                let size = Word::try_from(size).map_err(|_| FaultReason::OutOfMemory)?;
                let addr = heap.alloc(size)?;
                memory.write_scalar(dst, Scalar::Reference(addr))?;
                ExecuteState::Proceed
            }

            Opcode::FREE => {
                let [ptr] = ops.operands()?;
                let addr = memory.read_scalar(ptr)?.to_word();
                heap.free(addr)?;
                ExecuteState::Proceed
            }

            Opcode::PTR => {
                let [index, dst] = ops.operands()?;
                let addr = memory.ptr_to(index)?;
                memory.write_scalar(dst, Scalar::Reference(addr))?;
                ExecuteState::Proceed
            }

            Opcode::ADD => Self::binary(memory, BinaryOp::Add, &mut ops)?,
            Opcode::SUB => Self::binary(memory, BinaryOp::Sub, &mut ops)?,
            Opcode::MUL => Self::binary(memory, BinaryOp::Mul, &mut ops)?,
            Opcode::DIV => Self::binary(memory, BinaryOp::Div, &mut ops)?,
            Opcode::REM => Self::binary(memory, BinaryOp::Rem, &mut ops)?,

            Opcode::NEG => {
                let [r, a] = ops.operands()?;
                alu::negate(memory, r, a)?;
                ExecuteState::Proceed
            }

            Opcode::SHL => Self::binary(memory, BinaryOp::Shl, &mut ops)?,
            Opcode::SHR => Self::binary(memory, BinaryOp::Shr, &mut ops)?,
            Opcode::SAR => Self::binary(memory, BinaryOp::Sar, &mut ops)?,

            Opcode::IF => {
                let [cond, true_off, false_off] = ops.operands()?;
                let taken = memory.read_raw(cond, 1)?[0] != 0;
                let off_slot = if taken { true_off } else { false_off };
                let offset = memory.read_scalar(off_slot)?.to_long();
                ExecuteState::Jump(flow::branch_target(base, offset, code.len())?)
            }

            Opcode::AND => Self::binary(memory, BinaryOp::And, &mut ops)?,
            Opcode::OR => Self::binary(memory, BinaryOp::Or, &mut ops)?,
            Opcode::XOR => Self::binary(memory, BinaryOp::Xor, &mut ops)?,

            Opcode::CMP => {
                let [r, sel, a, b] = ops.operands()?;
                alu::compare(memory, r, sel, a, b)?;
                ExecuteState::Proceed
            }

            Opcode::INVOKE => {
                let call = HostCall::decode(&mut ops, memory)?;
                let name_addr = memory.read_scalar(call.func())?.to_word();
                let name = memory.read_cstr(name_addr)?.to_vec();
                let ret = CallDescriptor::single(call.ret());
                let handler = hosts
                    .lookup_mut(&name)
                    .ok_or(FaultReason::UnresolvedName)?;
                handler(memory, call.args(), &ret)?;
                ExecuteState::Proceed
            }

            Opcode::RETURN => ExecuteState::Return,

            Opcode::GOTO => {
                let [off_slot] = ops.operands()?;
                let offset = memory.read_scalar(off_slot)?.to_long();
                ExecuteState::Jump(flow::branch_target(base, offset, code.len())?)
            }

            // Reserved opcodes fall through.
            Opcode::THROW | Opcode::WIDE => ExecuteState::Proceed,
        };

        let next = ops.pos();
        if let ExecuteState::Proceed = state {
            self.pc = next;
        }
        Ok(state)
    }

    fn binary(
        memory: &mut TaggedMemory,
        op: BinaryOp,
        ops: &mut Operands<'_>,
    ) -> SimpleResult<ExecuteState> {
        let [r, a, b] = ops.operands()?;
        alu::binary(memory, op, r, a, b)?;
        Ok(ExecuteState::Proceed)
    }
}
