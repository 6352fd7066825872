//! Field extraction for 32-bit instruction words

use crate::runtime::regs::RegIndex;

/// Width in bytes of every instruction in the supported subset
pub const INSN_SIZE: u64 = 4;

/// Major opcode of register-register integer operations
pub const OPCODE_OP: u32 = 0b011_0011;

#[inline]
fn bits(word: u32, hi: u8, lo: u8) -> u32 {
    (word >> lo) & ((1u32 << (hi - lo + 1)) - 1)
}

/// Decoded fields of an R-type instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RType {
    pub rd: RegIndex,
    pub rs1: RegIndex,
    pub rs2: RegIndex,
    pub funct3: u8,
    pub funct7: u8,
}

impl RType {
    pub fn parse(word: u32) -> Self {
        Self {
            rd: bits(word, 11, 7) as RegIndex,
            funct3: bits(word, 14, 12) as u8,
            rs1: bits(word, 19, 15) as RegIndex,
            rs2: bits(word, 24, 20) as RegIndex,
            funct7: bits(word, 31, 25) as u8,
        }
    }

    /// Assemble an R-type word from its fields
    pub fn encode(self) -> u32 {
        ((self.funct7 as u32 & 0x7f) << 25)
            | ((self.rs2 as u32 & 0x1f) << 20)
            | ((self.rs1 as u32 & 0x1f) << 15)
            | ((self.funct3 as u32 & 0x7) << 12)
            | ((self.rd as u32 & 0x1f) << 7)
            | OPCODE_OP
    }
}
