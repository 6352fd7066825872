//! The unit of emulation: registers, program counter and address space

use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;

use log::debug;

use crate::error::{Error, LoadError, LoadErrorKind, MemError};
use crate::frontend::{self, decode::disasm};
use crate::runtime::exec;
use crate::runtime::loader::{self, LoadOptions};
use crate::runtime::memory::{AddressSpace, Width};
use crate::runtime::regs::RegisterFile;

/// A single emulated RV64 process
///
/// Exclusively owned by its caller; no internal locking.
#[derive(Debug, Default)]
pub struct Process {
    pub regs: RegisterFile,
    pub pc: u64,
    mem: AddressSpace,
}

impl Process {
    /// An empty process: cleared registers, PC 0, no segments
    pub fn new() -> Self {
        Self::default()
    }

    /// Load an ELF64 RISC-V executable from `path`
    pub fn load(path: impl AsRef<Path>, opts: &LoadOptions) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let mut file = File::open(path).map_err(|e| LoadError::new(path, LoadErrorKind::Open(e)))?;
        Self::from_reader(&mut file, path, opts)
    }

    /// Load an image from any seekable byte source; `path` labels errors
    pub fn from_reader<R: Read + Seek>(
        reader: &mut R,
        path: impl AsRef<Path>,
        opts: &LoadOptions,
    ) -> Result<Self, LoadError> {
        let path = path.as_ref();
        loader::load_image(reader, path, opts).map_err(|kind| LoadError::new(path, kind))
    }

    pub fn memory(&self) -> &AddressSpace {
        &self.mem
    }

    pub fn memory_mut(&mut self) -> &mut AddressSpace {
        &mut self.mem
    }

    /// Permission-checked load from guest memory
    pub fn read_memory(&self, addr: u64, width: Width) -> Result<u64, MemError> {
        self.mem.load(addr, width)
    }

    /// Permission-checked store to guest memory
    pub fn write_memory(&mut self, addr: u64, width: Width, value: u64) -> Result<(), MemError> {
        self.mem.store(addr, width, value)
    }

    /// Fetch, decode and execute one instruction, then advance the PC
    ///
    /// On failure the PC is left pointing at the offending instruction.
    pub fn step(&mut self) -> Result<(), Error> {
        let (word, size) = frontend::fetch(self)?;
        let opcode = frontend::decode(word)?;
        debug!("0x{:x}: {}", self.pc, disasm(word));
        exec::execute(opcode, self, word)?;
        self.pc = self.pc.wrapping_add(size);
        Ok(())
    }

    /// Release the address space and the process
    pub fn free(mut self) {
        debug!("freeing process with {} segment(s)", self.mem.len());
        self.mem.destroy();
    }
}
