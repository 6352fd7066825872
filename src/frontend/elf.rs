//! ELF64 file and program headers
//!
//! Headers are read as raw little-endian records through `bytemuck` and
//! converted to host order before use.

use std::io::{Read, Seek, SeekFrom};

use bytemuck::{Pod, Zeroable};

use crate::error::LoadErrorKind;

pub const ELF_MAGIC: [u8; 4] = [0x7f, b'E', b'L', b'F'];

pub const EI_CLASS: usize = 4;
pub const EI_DATA: usize = 5;
pub const EI_VERSION: usize = 6;
pub const EI_OSABI: usize = 7;

pub const ELFCLASS64: u8 = 2;
pub const ELFDATA2LSB: u8 = 1;
pub const EV_CURRENT: u8 = 1;
pub const ELFOSABI_SYSV: u8 = 0;

pub const ET_EXEC: u16 = 2;
pub const EM_RISCV: u16 = 243;

pub const PT_LOAD: u32 = 1;

/// ELF64 file header
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, Pod, Zeroable)]
pub struct Elf64Header {
    pub ident: [u8; 16],
    pub e_type: u16,
    pub machine: u16,
    pub version: u32,
    pub entry: u64,
    pub phoff: u64,
    pub shoff: u64,
    pub flags: u32,
    pub ehsize: u16,
    pub phentsize: u16,
    pub phnum: u16,
    pub shentsize: u16,
    pub shnum: u16,
    pub shstrndx: u16,
}

/// ELF64 program header
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, Pod, Zeroable)]
pub struct Elf64ProgramHeader {
    pub p_type: u32,
    pub flags: u32,
    pub offset: u64,
    pub vaddr: u64,
    pub paddr: u64,
    pub filesz: u64,
    pub memsz: u64,
    pub align: u64,
}

impl Elf64Header {
    pub const SIZE: usize = core::mem::size_of::<Self>();

    /// Read the file header from the start of `reader`
    pub fn read_from<R: Read + Seek>(reader: &mut R) -> Result<Self, LoadErrorKind> {
        let mut buf = [0u8; Self::SIZE];
        reader
            .seek(SeekFrom::Start(0))
            .and_then(|_| reader.read_exact(&mut buf))
            .map_err(LoadErrorKind::Truncated)?;
        Ok(bytemuck::pod_read_unaligned::<Self>(&buf).into_native())
    }

    fn into_native(mut self) -> Self {
        self.e_type = u16::from_le(self.e_type);
        self.machine = u16::from_le(self.machine);
        self.version = u32::from_le(self.version);
        self.entry = u64::from_le(self.entry);
        self.phoff = u64::from_le(self.phoff);
        self.shoff = u64::from_le(self.shoff);
        self.flags = u32::from_le(self.flags);
        self.ehsize = u16::from_le(self.ehsize);
        self.phentsize = u16::from_le(self.phentsize);
        self.phnum = u16::from_le(self.phnum);
        self.shentsize = u16::from_le(self.shentsize);
        self.shnum = u16::from_le(self.shnum);
        self.shstrndx = u16::from_le(self.shstrndx);
        self
    }

    /// Check that this is a little-endian System V RV64 executable
    ///
    /// Checks run in a fixed order and the first failure is reported.
    pub fn validate(&self) -> Result<(), LoadErrorKind> {
        if self.ident[..4] != ELF_MAGIC {
            return Err(LoadErrorKind::BadMagic);
        }
        if self.ident[EI_CLASS] != ELFCLASS64 {
            return Err(LoadErrorKind::BadClass(self.ident[EI_CLASS]));
        }
        if self.ident[EI_DATA] != ELFDATA2LSB {
            return Err(LoadErrorKind::BadEndianness(self.ident[EI_DATA]));
        }
        if self.ident[EI_VERSION] != EV_CURRENT {
            return Err(LoadErrorKind::BadIdentVersion(self.ident[EI_VERSION]));
        }
        if self.ident[EI_OSABI] != ELFOSABI_SYSV {
            return Err(LoadErrorKind::BadOsAbi(self.ident[EI_OSABI]));
        }
        if self.e_type != ET_EXEC {
            return Err(LoadErrorKind::BadType(self.e_type));
        }
        if self.machine != EM_RISCV {
            return Err(LoadErrorKind::BadMachine(self.machine));
        }
        if self.version != EV_CURRENT as u32 {
            return Err(LoadErrorKind::BadFileVersion(self.version));
        }
        Ok(())
    }

    /// Read program header `index`, seeking to its slot in the header table
    pub fn program_header<R: Read + Seek>(
        &self,
        reader: &mut R,
        index: u16,
    ) -> Result<Elf64ProgramHeader, LoadErrorKind> {
        let pos = (index as u64)
            .checked_mul(self.phentsize as u64)
            .and_then(|off| off.checked_add(self.phoff))
            .ok_or_else(|| {
                LoadErrorKind::SegmentSeek(std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "program header offset overflows",
                ))
            })?;
        reader
            .seek(SeekFrom::Start(pos))
            .map_err(LoadErrorKind::SegmentSeek)?;

        let mut buf = [0u8; Elf64ProgramHeader::SIZE];
        reader
            .read_exact(&mut buf)
            .map_err(LoadErrorKind::SegmentRead)?;
        Ok(bytemuck::pod_read_unaligned::<Elf64ProgramHeader>(&buf).into_native())
    }
}

impl Elf64ProgramHeader {
    pub const SIZE: usize = core::mem::size_of::<Self>();

    fn into_native(mut self) -> Self {
        self.p_type = u32::from_le(self.p_type);
        self.flags = u32::from_le(self.flags);
        self.offset = u64::from_le(self.offset);
        self.vaddr = u64::from_le(self.vaddr);
        self.paddr = u64::from_le(self.paddr);
        self.filesz = u64::from_le(self.filesz);
        self.memsz = u64::from_le(self.memsz);
        self.align = u64::from_le(self.align);
        self
    }

    pub fn is_load(&self) -> bool {
        self.p_type == PT_LOAD
    }
}
