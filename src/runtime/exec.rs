//! Semantics of the RV64I register-register operations
//!
//! Every handler re-checks `funct7` against its operation so that a word
//! routed to the wrong handler fails before any register is written.

use log::debug;

use crate::error::InsnError;
use crate::frontend::{Opcode, RType};
use crate::runtime::process::Process;

/// Shift amounts use the low 6 bits of rs2 (XLEN = 64)
const SHAMT_MASK: u64 = 0x3f;

/// Compute `rs1 op rs2` on 64-bit registers
pub fn alu(opcode: Opcode, a: u64, b: u64) -> u64 {
    match opcode {
        Opcode::Add => a.wrapping_add(b),
        Opcode::Sub => a.wrapping_sub(b),
        Opcode::Slt => ((a as i64) < (b as i64)) as u64,
        Opcode::Sltu => (a < b) as u64,
        Opcode::And => a & b,
        Opcode::Or => a | b,
        Opcode::Xor => a ^ b,
        Opcode::Sll => a << (b & SHAMT_MASK),
        Opcode::Srl => a >> (b & SHAMT_MASK),
        Opcode::Sra => ((a as i64) >> (b & SHAMT_MASK)) as u64,
    }
}

/// Execute `word` as `opcode` against `process`
pub fn execute(opcode: Opcode, process: &mut Process, word: u32) -> Result<(), InsnError> {
    let RType {
        rd,
        rs1,
        rs2,
        funct7,
        ..
    } = RType::parse(word);
    if funct7 != opcode.required_funct7() {
        return Err(InsnError::UnsupportedVariant {
            word,
            opcode,
            funct7,
        });
    }

    let a = process.regs.read(rs1);
    let b = process.regs.read(rs2);
    let value = alu(opcode, a, b);
    process.regs.write(rd, value);
    debug!(
        "{}: x{rd} = x{rs1} (0x{a:x}), x{rs2} (0x{b:x}) -> 0x{value:x}",
        opcode.mnemonic()
    );
    Ok(())
}
