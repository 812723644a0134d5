//! AQ bytecode runner.
//!
//! Usage: `aq <bytecode-file>`. Exit codes: `0` on normal termination,
//! `-1` for a missing argument, `-2` for a file that can't be opened or
//! parsed, `-3` for a buffer that isn't an AQ image at all.

use std::process::exit;

use aq_vm::error::ImageError;
use aq_vm::host;
use aq_vm::prelude::*;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let Some(path) = std::env::args().nth(1) else {
        eprintln!("usage: aq <bytecode-file>");
        exit(-1);
    };

    let bytes = match std::fs::read(&path) {
        Ok(bytes) => bytes,
        Err(err) => {
            eprintln!("aq: {path}: {err}");
            exit(-2);
        }
    };

    let mut vm = match Interpreter::from_bytes(&bytes) {
        Ok(vm) => vm,
        Err(err @ ImageError::BadMagic) => {
            eprintln!("aq: {path}: {err}");
            exit(-3);
        }
        Err(err) => {
            eprintln!("aq: {path}: {err}");
            exit(-2);
        }
    };

    vm.register("print", host::builtins::print());

    match vm.run() {
        Ok(_) => {}
        Err(err) => {
            eprintln!("aq: {err}");
            exit(1);
        }
    }
}
