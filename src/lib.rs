//! Execution core of a RISC-V (RV64) user-mode process emulator
//!
//! A [`Process`] is built from an ELF64 executable by [`load_process`]. The
//! caller then repeatedly [`fetch`]es the word at the program counter,
//! [`decode`]s it into an [`Opcode`] and [`execute`]s it, or simply calls
//! [`Process::step`].
//!
//! ```no_run
//! use rvcore::{decode, execute, fetch, free_process, load_process};
//!
//! let mut process = load_process("prog.elf")?;
//! let (word, size) = fetch(&process)?;
//! let opcode = decode(word)?;
//! execute(opcode, &mut process, word)?;
//! process.pc += size;
//! free_process(process);
//! # Ok::<(), rvcore::Error>(())
//! ```
#![deny(unsafe_op_in_unsafe_fn)]

pub mod error;
pub mod frontend;
pub mod runtime;

use std::path::Path;

pub use error::{Error, InsnError, LoadError, LoadErrorKind, MemError, Result};
pub use frontend::{decode, disasm, fetch, Opcode};
pub use runtime::{
    execute, LoadOptions, Permissions, Process, RegisterFile, StackSize, Width,
};

/// Build a ready-to-run process from the executable at `path`
pub fn load_process(path: impl AsRef<Path>) -> Result<Process, LoadError> {
    Process::load(path, &LoadOptions::default())
}

/// Same as [`load_process`] with explicit loader options
pub fn load_process_with(
    path: impl AsRef<Path>,
    opts: &LoadOptions,
) -> Result<Process, LoadError> {
    Process::load(path, opts)
}

/// Release every resource owned by `process`
pub fn free_process(process: Process) {
    process.free();
}

/// Load `width` from guest memory through the permission checks
pub fn read_memory(process: &Process, addr: u64, width: Width) -> Result<u64, MemError> {
    process.read_memory(addr, width)
}

/// Store the low `width` bits of `value` to guest memory
pub fn write_memory(
    process: &mut Process,
    addr: u64,
    width: Width,
    value: u64,
) -> Result<(), MemError> {
    process.write_memory(addr, width, value)
}
