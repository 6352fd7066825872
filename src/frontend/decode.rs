//! Static decode table for the supported RV64I register-register operations
//!
//! Each entry pairs a mask with the pattern the masked word must equal. The
//! table is scanned in order and the first match wins.

use crate::error::InsnError;
use crate::frontend::instruction::RType;

/// Supported operations, one per semantic handler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    Add,
    Sub,
    Sll,
    Slt,
    Sltu,
    Xor,
    Srl,
    Sra,
    Or,
    And,
}

impl Opcode {
    /// The `funct7` value this operation is encoded with
    pub fn required_funct7(self) -> u8 {
        match self {
            Opcode::Sub | Opcode::Sra => 0x20,
            _ => 0x00,
        }
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Add => "add",
            Opcode::Sub => "sub",
            Opcode::Sll => "sll",
            Opcode::Slt => "slt",
            Opcode::Sltu => "sltu",
            Opcode::Xor => "xor",
            Opcode::Srl => "srl",
            Opcode::Sra => "sra",
            Opcode::Or => "or",
            Opcode::And => "and",
        }
    }
}

/// One row of the decode table
#[derive(Debug, Clone, Copy)]
pub struct DecodeEntry {
    pub mask: u32,
    pub pattern: u32,
    pub opcode: Opcode,
}

impl DecodeEntry {
    const fn new(mask: u32, pattern: u32, opcode: Opcode) -> Self {
        Self {
            mask,
            pattern,
            opcode,
        }
    }

    #[inline]
    pub fn matches(&self, word: u32) -> bool {
        word & self.mask == self.pattern
    }
}

/// funct7 | funct3 | opcode
const MASK_R: u32 = 0xfe00_707f;

pub static DECODE_TABLE: [DecodeEntry; 10] = [
    DecodeEntry::new(MASK_R, 0x0000_0033, Opcode::Add),
    DecodeEntry::new(MASK_R, 0x4000_0033, Opcode::Sub),
    DecodeEntry::new(MASK_R, 0x0000_1033, Opcode::Sll),
    DecodeEntry::new(MASK_R, 0x0000_2033, Opcode::Slt),
    DecodeEntry::new(MASK_R, 0x0000_3033, Opcode::Sltu),
    DecodeEntry::new(MASK_R, 0x0000_4033, Opcode::Xor),
    DecodeEntry::new(MASK_R, 0x0000_5033, Opcode::Srl),
    DecodeEntry::new(MASK_R, 0x4000_5033, Opcode::Sra),
    DecodeEntry::new(MASK_R, 0x0000_6033, Opcode::Or),
    DecodeEntry::new(MASK_R, 0x0000_7033, Opcode::And),
];

/// Map an instruction word to the operation that executes it
pub fn decode(word: u32) -> Result<Opcode, InsnError> {
    DECODE_TABLE
        .iter()
        .find(|entry| entry.matches(word))
        .map(|entry| entry.opcode)
        .ok_or(InsnError::Unsupported { word })
}

/// Render a word as assembly, or as `.word` if it is not supported
pub fn disasm(word: u32) -> String {
    match decode(word) {
        Ok(op) => {
            let RType { rd, rs1, rs2, .. } = RType::parse(word);
            format!("{} x{rd}, x{rs1}, x{rs2}", op.mnemonic())
        }
        Err(_) => format!(".word 0x{word:08x}"),
    }
}
