//! Minimal ELF64 image writer for integration tests

use std::io::Write;

use bytemuck::bytes_of;
use rvcore::frontend::elf::*;
use tempfile::NamedTempFile;

pub const ENTRY: u64 = 0x1_0000;

pub struct SegmentDef {
    pub vaddr: u64,
    pub flags: u32,
    pub data: Vec<u8>,
    pub memsz: u64,
}

impl SegmentDef {
    pub fn text(words: &[u32]) -> Self {
        let data: Vec<u8> = words.iter().flat_map(|w| w.to_le_bytes()).collect();
        let memsz = data.len() as u64;
        Self {
            vaddr: ENTRY,
            flags: 0x5,
            data,
            memsz,
        }
    }
}

pub fn header(phnum: u16) -> Elf64Header {
    let mut ident = [0u8; 16];
    ident[..4].copy_from_slice(&ELF_MAGIC);
    ident[EI_CLASS] = ELFCLASS64;
    ident[EI_DATA] = ELFDATA2LSB;
    ident[EI_VERSION] = EV_CURRENT;
    Elf64Header {
        ident,
        e_type: ET_EXEC,
        machine: EM_RISCV,
        version: 1,
        entry: ENTRY,
        phoff: Elf64Header::SIZE as u64,
        ehsize: Elf64Header::SIZE as u16,
        phentsize: Elf64ProgramHeader::SIZE as u16,
        phnum,
        ..Default::default()
    }
}

pub fn image(header: Elf64Header, loads: &[SegmentDef]) -> Vec<u8> {
    let mut out = bytes_of(&header).to_vec();
    let mut offset = header.phoff + loads.len() as u64 * Elf64ProgramHeader::SIZE as u64;
    for load in loads {
        let phdr = Elf64ProgramHeader {
            p_type: PT_LOAD,
            flags: load.flags,
            offset,
            vaddr: load.vaddr,
            paddr: load.vaddr,
            filesz: load.data.len() as u64,
            memsz: load.memsz,
            align: 0x1000,
        };
        out.extend_from_slice(bytes_of(&phdr));
        offset += load.data.len() as u64;
    }
    for load in loads {
        out.extend_from_slice(&load.data);
    }
    out
}

pub fn write_temp(bytes: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp file");
    file.write_all(bytes).expect("write image");
    file.flush().expect("flush image");
    file
}
