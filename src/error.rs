//! Error types for every layer of the emulator core
//!
//! Each layer reports its own failure kinds; [`Error`] unifies them for callers
//! that drive the whole fetch/decode/execute sequence.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::frontend::Opcode;
use crate::runtime::memory::Permissions;

/// Failures raised by the address space (segment management and sized access)
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MemError {
    /// No single segment fully covers `[addr, addr+len)`
    #[error("unmapped access of {len} byte(s) at 0x{addr:x}")]
    Unmapped { addr: u64, len: u64 },

    /// The covering segment lacks at least one required permission bit
    #[error("permission denied at 0x{addr:x}: requires {required:?}")]
    PermissionDenied { addr: u64, required: Permissions },

    /// Empty permission set, or one carrying undefined bits
    #[error("invalid segment permissions 0x{0:x}")]
    InvalidPermissions(u8),

    /// Requested range intersects an existing segment (or leaves the address space)
    #[error("segment [0x{start:x}, +0x{len:x}) overlaps an existing mapping")]
    Overlap { start: u64, len: u64 },

    /// Backing storage for a segment could not be allocated
    #[error("cannot allocate {len} byte(s) of segment storage")]
    OutOfMemory { len: u64 },
}

/// Failures raised while decoding or executing an instruction word
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InsnError {
    #[error("unsupported instruction 0x{word:08x}")]
    Unsupported { word: u32 },

    #[error("unsupported variant of {opcode:?}: funct7=0x{funct7:02x} in 0x{word:08x}")]
    UnsupportedVariant { word: u32, opcode: Opcode, funct7: u8 },
}

/// What went wrong while building a process image
#[derive(Debug, Error)]
pub enum LoadErrorKind {
    #[error("cannot open file: {0}")]
    Open(#[source] io::Error),

    #[error("cannot read ELF header: {0}")]
    Truncated(#[source] io::Error),

    #[error("can't find ELF magic numbers")]
    BadMagic,

    #[error("not a 64-bit ELF file (class {0})")]
    BadClass(u8),

    #[error("cannot emulate non-little-endian code (data encoding {0})")]
    BadEndianness(u8),

    #[error("invalid ELF identification version {0}")]
    BadIdentVersion(u8),

    #[error("cannot emulate files that don't follow the System V ABI (OS/ABI {0})")]
    BadOsAbi(u8),

    #[error("file is not an executable (type {0})")]
    BadType(u16),

    #[error("file is not for RISC-V (machine {0})")]
    BadMachine(u16),

    #[error("invalid ELF file version {0}")]
    BadFileVersion(u32),

    #[error("failed to allocate segment: {0}")]
    SegmentAlloc(#[source] MemError),

    #[error("memory is too small for segment (file size 0x{file_size:x} > memory size 0x{mem_size:x})")]
    SegmentMemoryTooSmall { file_size: u64, mem_size: u64 },

    #[error("cannot offset into file: {0}")]
    SegmentSeek(#[source] io::Error),

    #[error("cannot read segment contents: {0}")]
    SegmentRead(#[source] io::Error),

    #[error("cannot query stack size limit: {0}")]
    StackLimit(#[source] io::Error),

    #[error("cannot place a stack of 0x{size:x} byte(s)")]
    StackAlloc { size: u64 },
}

/// A failed process load, tagged with the offending file
#[derive(Debug, Error)]
#[error("{}: {kind}", .path.display())]
pub struct LoadError {
    pub path: PathBuf,
    #[source]
    pub kind: LoadErrorKind,
}

impl LoadError {
    pub fn new(path: impl Into<PathBuf>, kind: LoadErrorKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }
}

/// Any failure the core can report
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Mem(#[from] MemError),

    #[error(transparent)]
    Insn(#[from] InsnError),

    #[error(transparent)]
    Load(#[from] LoadError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_error_names_path() {
        let err = LoadError::new("/tmp/prog.elf", LoadErrorKind::BadMachine(62));
        let msg = err.to_string();
        assert!(msg.starts_with("/tmp/prog.elf: "));
        assert!(msg.contains("RISC-V"));
    }

    #[test]
    fn test_error_from_layers() {
        let err: Error = MemError::Unmapped { addr: 0x10, len: 4 }.into();
        assert!(matches!(err, Error::Mem(MemError::Unmapped { addr: 0x10, len: 4 })));

        let err: Error = InsnError::Unsupported { word: 0 }.into();
        assert_eq!(err.to_string(), "unsupported instruction 0x00000000");
    }
}
