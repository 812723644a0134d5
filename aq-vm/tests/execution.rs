use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use aq_vm::host;
use aq_vm::prelude::*;

#[derive(Clone, Default)]
struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl SharedBuf {
    fn contents(&self) -> Vec<u8> {
        self.0.lock().unwrap().clone()
    }
}

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn run(builder: &ImageBuilder) -> Interpreter {
    let mut vm = Interpreter::new(builder.finish());
    vm.run().expect("program completes");
    vm
}

#[test]
fn nop_only_program_halts_without_side_effects() {
    let mut builder = ImageBuilder::new();
    builder.int(7);
    builder.instr(op::nop());

    let mut vm = Interpreter::new(builder.finish());
    let before = vm.memory().as_slice().to_vec();
    assert_eq!(vm.run(), Ok(ProgramState::EndOfCode));
    assert_eq!(vm.memory().as_slice(), &before[..]);
    assert_eq!(vm.pc(), 1);
}

#[test]
fn add_two_ints() {
    let mut builder = ImageBuilder::new();
    let a = builder.int(3);
    let b = builder.int(4);
    let r = builder.int(0);
    builder.instr(op::add(r, a, b));

    // The assembled form is the literal stream from the wire format docs.
    assert_eq!(builder.finish().code(), &[0x06, 0x08, 0x00, 0x04][..]);

    let vm = run(&builder);
    assert_eq!(vm.memory().read_scalar(r), Ok(Scalar::Int(7)));
}

#[test]
fn mixed_double_int_add_truncates_into_the_int_destination() {
    let mut builder = ImageBuilder::new();
    let a = builder.double(2.5);
    let b = builder.int(1);
    builder.align_word();
    let r = builder.int(0);
    builder.instr(op::add(r, a, b));

    assert_eq!(builder.finish().code(), &[0x06, 0x10, 0x00, 0x08][..]);

    let vm = run(&builder);
    assert_eq!(vm.memory().read_scalar(r), Ok(Scalar::Int(3)));
}

#[test]
fn cmp_less_than_sets_the_result_byte() {
    let mut builder = ImageBuilder::new();
    let a = builder.int(5);
    let b = builder.int(9);
    let sel = builder.byte(CmpOp::Lt as i8);
    let r = builder.byte(0);
    builder.instr(op::cmp(r, sel, a, b));

    assert_eq!(builder.finish().code(), &[0x13, 0x09, 0x08, 0x00, 0x04][..]);

    let vm = run(&builder);
    assert_eq!(vm.memory().read_scalar(r), Ok(Scalar::Byte(1)));
}

#[test]
fn goto_skips_over_the_intervening_nop() {
    let mut builder = ImageBuilder::new();
    let off = builder.long(2);
    builder
        .instr(op::goto(off))
        .instr(op::nop())
        .instr(op::return_());

    // goto, operand, nop, return: the +2 branch from after the opcode
    // byte lands exactly on the return.
    assert_eq!(builder.finish().code(), &[0x16, 0x00, 0x00, 0x15][..]);

    let mut vm = Interpreter::new(builder.finish());
    assert_eq!(vm.run(), Ok(ProgramState::Return));
    assert_eq!(vm.pc(), 3);
}

#[test]
fn invoke_print_writes_and_returns_the_byte_count() {
    let mut builder = ImageBuilder::new();
    let text = builder.cstr("guest says %d\n");
    let name = builder.cstr("print");
    builder.align_word();
    let func = builder.reference(name);
    let fmt_ptr = builder.reference(text);
    let argc = builder.long(2);
    let arg = builder.int(42);
    let ret = builder.int(0);
    builder
        .instr(op::invoke(func, ret, argc, &[fmt_ptr, arg]))
        .instr(op::return_());

    let out = SharedBuf::default();
    let mut vm = Interpreter::new(builder.finish());
    vm.register("print", host::builtins::print_to(out.clone()));
    assert_eq!(vm.run(), Ok(ProgramState::Return));

    assert_eq!(out.contents(), b"guest says 42\n");
    assert_eq!(vm.memory().read_scalar(ret), Ok(Scalar::Int(14)));
}

#[test]
fn invoke_of_an_unregistered_name_is_fatal() {
    let mut builder = ImageBuilder::new();
    let name = builder.cstr("missing");
    let func = builder.reference(name);
    let argc = builder.long(0);
    let ret = builder.int(0);
    builder.instr(op::invoke(func, ret, argc, &[]));

    let mut vm = Interpreter::new(builder.finish());
    let err = vm.run().unwrap_err();
    assert_eq!(err.fault_reason(), FaultReason::UnresolvedName);
    assert_eq!(err.pc(), 0);
}

#[test]
fn custom_host_functions_see_arguments_and_the_return_slot() {
    let mut builder = ImageBuilder::new();
    let name = builder.cstr("sum");
    let func = builder.reference(name);
    let argc = builder.long(2);
    let x = builder.long(30);
    let y = builder.long(12);
    let ret = builder.long(0);
    builder
        .instr(op::invoke(func, ret, argc, &[x, y]))
        .instr(op::return_());

    let mut vm = Interpreter::new(builder.finish());
    vm.register(
        "sum",
        Box::new(|memory: &mut TaggedMemory, args: &CallDescriptor, ret: &CallDescriptor| {
            let mut total = 0i64;
            for &slot in args.slots() {
                total += memory.read_scalar(slot)?.to_long();
            }
            memory.write_scalar(ret.get(0).unwrap(), Scalar::Long(total))
        }),
    );
    assert_eq!(vm.run(), Ok(ProgramState::Return));
    assert_eq!(vm.memory().read_scalar(ret), Ok(Scalar::Long(42)));
}

#[test]
fn if_branches_on_the_condition_byte() {
    // r receives 1 on the fall-through (false) path and 2 on the taken
    // path. All operands are single-byte, so the program is
    //   0: if c, t, f      (4 bytes)
    //   4: load one, r     (3 bytes)
    //   7: return
    //   8: load two, r
    //  11: return
    // and relative to the operand base at 1 the false branch is +3, the
    // true branch +7.
    let program = |cond: i8| {
        let mut builder = ImageBuilder::new();
        let c = builder.byte(cond);
        let one = builder.int(1);
        let two = builder.int(2);
        let r = builder.int(0);
        let t = builder.long(7);
        let f = builder.long(3);
        builder
            .instr(op::if_(c, t, f))
            .instr(op::load(one, r))
            .instr(op::return_())
            .instr(op::load(two, r))
            .instr(op::return_());
        (builder, r)
    };

    let (builder, r) = program(0);
    let mut vm = Interpreter::new(builder.finish());
    assert_eq!(vm.run(), Ok(ProgramState::Return));
    assert_eq!(vm.memory().read_scalar(r), Ok(Scalar::Int(1)));

    let (builder, r) = program(1);
    let mut vm = Interpreter::new(builder.finish());
    assert_eq!(vm.run(), Ok(ProgramState::Return));
    assert_eq!(vm.memory().read_scalar(r), Ok(Scalar::Int(2)));
}

#[test]
fn new_store_load_free_round_trip() {
    let mut builder = ImageBuilder::new();
    let size = builder.long(8);
    let value = builder.long(0x0102_0304_0506_0708);
    let ptr = builder.reference(0);
    builder
        .instr(op::new(ptr, size))
        .instr(op::store(ptr, value))
        .instr(op::free(ptr))
        .instr(op::return_());

    let mut vm = Interpreter::new(builder.finish());
    assert_eq!(vm.run(), Ok(ProgramState::Return));
    // The guest released everything it allocated.
    assert!(vm.heap().is_empty());
    let addr = vm.memory().read_scalar(ptr).unwrap().to_word();
    assert!(addr >= vm.memory().size() as u64);
}

#[test]
fn store_through_a_pointer_into_the_data_segment() {
    let mut builder = ImageBuilder::new();
    let src = builder.int(77);
    let dst = builder.int(0);
    let ptr = builder.reference(0);
    builder
        .instr(op::ptr(dst, ptr))
        .instr(op::store(ptr, src))
        .instr(op::return_());

    let mut vm = Interpreter::new(builder.finish());
    assert_eq!(vm.run(), Ok(ProgramState::Return));
    assert_eq!(vm.memory().read_scalar(dst), Ok(Scalar::Int(77)));
}

#[test]
fn unknown_opcode_is_fatal() {
    let mut builder = ImageBuilder::new();
    builder.instr(op::nop()).instr(vec![0x42]);

    let mut vm = Interpreter::new(builder.finish());
    let err = vm.run().unwrap_err();
    assert_eq!(err.fault_reason(), FaultReason::UnknownOpcode);
    assert_eq!(err.pc(), 1);
}

#[test]
fn operand_running_off_the_segment_is_fatal() {
    let mut builder = ImageBuilder::new();
    builder.int(0);
    builder.instr(vec![Opcode::GOTO as u8, 0xff, 0xff]);

    let mut vm = Interpreter::new(builder.finish());
    let err = vm.run().unwrap_err();
    assert_eq!(err.fault_reason(), FaultReason::TruncatedCode);
}

#[test]
fn division_by_zero_is_fatal() {
    let mut builder = ImageBuilder::new();
    let a = builder.int(9);
    let b = builder.int(0);
    let r = builder.int(0);
    builder.instr(op::div(r, a, b));

    let mut vm = Interpreter::new(builder.finish());
    assert_eq!(
        vm.run().unwrap_err().fault_reason(),
        FaultReason::DivisionByZero
    );
}

#[test]
fn reserved_opcodes_are_no_ops() {
    let mut builder = ImageBuilder::new();
    let a = builder.int(1);
    let b = builder.int(2);
    let r = builder.int(0);
    builder
        .instr(op::throw())
        .instr(op::wide())
        .instr(op::add(r, a, b));

    let vm = run(&builder);
    assert_eq!(vm.memory().read_scalar(r), Ok(Scalar::Int(3)));
}

#[test]
fn image_bytes_execute_after_a_parse_round_trip() {
    let mut builder = ImageBuilder::new();
    let a = builder.int(20);
    let b = builder.int(22);
    let r = builder.int(0);
    builder.instr(op::add(r, a, b)).instr(op::return_());

    let bytes = builder.build();
    let mut vm = Interpreter::from_bytes(&bytes).unwrap();
    assert_eq!(vm.run(), Ok(ProgramState::Return));
    assert_eq!(vm.memory().read_scalar(r), Ok(Scalar::Int(42)));
}
