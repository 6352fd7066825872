//! RISC-V integer register file
//!
//! `x0` is hard-wired to zero: reads always yield 0 and writes are dropped.
//! The rule lives here so handlers never special-case it.

/// RISC-V register index (0-31 for integer registers)
pub type RegIndex = u8;

/// Number of integer registers
pub const REG_COUNT: usize = 32;

/// The 32 general-purpose 64-bit registers of one hart
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegisterFile {
    x: [u64; REG_COUNT],
}

impl RegisterFile {
    /// Create a register file with every register cleared
    pub fn new() -> Self {
        Self::default()
    }

    /// Read register `reg`
    ///
    /// # Panics
    /// If `reg` is not below 32.
    #[inline]
    pub fn read(&self, reg: RegIndex) -> u64 {
        if reg == abi::ZERO {
            0
        } else {
            self.x[reg as usize]
        }
    }

    /// Write register `reg`; writes to `x0` are discarded
    ///
    /// # Panics
    /// If `reg` is not below 32.
    #[inline]
    pub fn write(&mut self, reg: RegIndex, value: u64) {
        if reg != abi::ZERO {
            self.x[reg as usize] = value;
        }
    }

    /// Clear every register
    pub fn reset(&mut self) {
        self.x = [0; REG_COUNT];
    }

    /// Snapshot of all registers as architecturally visible (`x0` reads 0)
    pub fn snapshot(&self) -> [u64; REG_COUNT] {
        let mut out = self.x;
        out[abi::ZERO as usize] = 0;
        out
    }
}

/// Special register names for the RISC-V ABI
#[allow(dead_code)]
pub mod abi {
    use super::RegIndex;

    pub const ZERO: RegIndex = 0; // Hard-wired zero
    pub const RA: RegIndex = 1; // Return address
    pub const SP: RegIndex = 2; // Stack pointer
    pub const GP: RegIndex = 3; // Global pointer
    pub const TP: RegIndex = 4; // Thread pointer

    pub const T0: RegIndex = 5;
    pub const T1: RegIndex = 6;
    pub const T2: RegIndex = 7;

    pub const S0_FP: RegIndex = 8;
    pub const S1: RegIndex = 9;

    // Function arguments / return values
    pub const A0: RegIndex = 10;
    pub const A1: RegIndex = 11;
    pub const A2: RegIndex = 12;
    pub const A3: RegIndex = 13;
    pub const A4: RegIndex = 14;
    pub const A5: RegIndex = 15;
    pub const A6: RegIndex = 16;
    pub const A7: RegIndex = 17;

    pub const S2: RegIndex = 18;
    pub const S11: RegIndex = 27;

    pub const T3: RegIndex = 28;
    pub const T6: RegIndex = 31;

    const NAMES: [&str; 32] = [
        "zero", "ra", "sp", "gp", "tp", "t0", "t1", "t2", "s0", "s1", "a0", "a1", "a2", "a3",
        "a4", "a5", "a6", "a7", "s2", "s3", "s4", "s5", "s6", "s7", "s8", "s9", "s10", "s11",
        "t3", "t4", "t5", "t6",
    ];

    /// ABI name of a register, e.g. `sp` for x2
    pub fn name(reg: RegIndex) -> &'static str {
        NAMES.get(reg as usize).copied().unwrap_or("unknown")
    }
}
