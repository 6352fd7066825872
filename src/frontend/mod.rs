//! Frontend: ELF parsing, instruction fetch and decode

pub mod decode;
pub mod elf;
pub mod instruction;

pub use decode::{decode, disasm, DecodeEntry, Opcode, DECODE_TABLE};
pub use instruction::{RType, INSN_SIZE};

use crate::error::MemError;
use crate::runtime::memory::Permissions;
use crate::runtime::process::Process;

/// Fetch the instruction word at the process's PC
///
/// The covering segment must be both readable and executable. Returns the
/// word together with its size in bytes.
pub fn fetch(process: &Process) -> Result<(u32, u64), MemError> {
    let pc = process.pc;
    let seg = process.memory().checked_segment(
        pc,
        INSN_SIZE,
        Permissions::READ | Permissions::EXEC,
    )?;
    let offset = (pc - seg.start()) as usize;
    let mut buf = [0u8; INSN_SIZE as usize];
    buf.copy_from_slice(&seg.bytes()[offset..offset + INSN_SIZE as usize]);
    Ok((u32::from_le_bytes(buf), INSN_SIZE))
}
