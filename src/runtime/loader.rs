//! Process image construction from an ELF64 executable
//!
//! Maps every PT_LOAD program header into its own segment, copies the file
//! image into it (the BSS tail stays zero), then places a read/write stack at
//! a random base and points `sp` at its top.

use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

use log::{debug, info, trace};

use crate::error::{LoadErrorKind, MemError};
use crate::frontend::elf::{Elf64Header, Elf64ProgramHeader};
use crate::runtime::memory::{AddressSpace, Permissions};
use crate::runtime::process::Process;
use crate::runtime::regs::abi;

/// Stack size used when the host limit is unbounded
pub const DEFAULT_STACK_SIZE: u64 = 2 * 1024 * 1024;

/// Random stack candidates tried before giving up
pub const DEFAULT_STACK_ATTEMPTS: u32 = 64;

const STACK_ALIGN: u64 = 0x1000;

/// Where the stack size comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackSize {
    /// The host's `RLIMIT_STACK` soft limit
    Host,
    /// A fixed number of bytes
    Fixed(u64),
}

/// Tunables for image construction
#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub stack_size: StackSize,
    pub default_stack_size: u64,
    /// Pin the stack base instead of picking one at random
    pub stack_base: Option<u64>,
    pub stack_attempts: u32,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            stack_size: StackSize::Host,
            default_stack_size: DEFAULT_STACK_SIZE,
            stack_base: None,
            stack_attempts: DEFAULT_STACK_ATTEMPTS,
        }
    }
}

impl LoadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stack_size(mut self, size: u64) -> Self {
        self.stack_size = StackSize::Fixed(size);
        self
    }

    pub fn with_stack_base(mut self, base: u64) -> Self {
        self.stack_base = Some(base);
        self
    }

    pub fn with_stack_attempts(mut self, attempts: u32) -> Self {
        self.stack_attempts = attempts;
        self
    }

    /// Resolve the stack size to allocate
    pub fn resolve_stack_size(&self) -> Result<u64, LoadErrorKind> {
        match self.stack_size {
            StackSize::Fixed(size) => Ok(size),
            StackSize::Host => Ok(host_stack_limit()
                .map_err(LoadErrorKind::StackLimit)?
                .unwrap_or(self.default_stack_size)),
        }
    }
}

/// The host's soft stack limit, or `None` when unbounded
#[cfg(unix)]
pub fn host_stack_limit() -> io::Result<Option<u64>> {
    let mut rlim = libc::rlimit {
        rlim_cur: 0,
        rlim_max: 0,
    };
    // SAFETY: `rlim` is a valid, writable rlimit for the duration of the call
    let ret = unsafe { libc::getrlimit(libc::RLIMIT_STACK, &mut rlim) };
    if ret != 0 {
        return Err(io::Error::last_os_error());
    }
    if rlim.rlim_cur == libc::RLIM_INFINITY {
        Ok(None)
    } else {
        Ok(Some(rlim.rlim_cur as u64))
    }
}

#[cfg(not(unix))]
pub fn host_stack_limit() -> io::Result<Option<u64>> {
    Ok(None)
}

/// Build a process from an ELF image
///
/// Any failure drops everything mapped so far.
pub(crate) fn load_image<R: Read + Seek>(
    reader: &mut R,
    path: &Path,
    opts: &LoadOptions,
) -> Result<Process, LoadErrorKind> {
    let header = Elf64Header::read_from(reader)?;
    header.validate()?;

    let mut process = Process::new();
    for index in 0..header.phnum {
        let phdr = header.program_header(reader, index)?;
        if !phdr.is_load() {
            continue;
        }
        map_segment(reader, process.memory_mut(), &phdr)?;
    }
    process.pc = header.entry;

    let size = opts.resolve_stack_size()?;
    let base = place_stack(process.memory_mut(), size, opts)?;
    process.regs.reset();
    process.regs.write(abi::SP, base + size);

    info!(
        "loaded {}: entry 0x{:x}, {} segment(s), sp 0x{:x}",
        path.display(),
        process.pc,
        process.memory().len(),
        base + size
    );
    Ok(process)
}

/// Map one PT_LOAD header and copy its file image in
fn map_segment<R: Read + Seek>(
    reader: &mut R,
    mem: &mut AddressSpace,
    phdr: &Elf64ProgramHeader,
) -> Result<(), LoadErrorKind> {
    if phdr.filesz > phdr.memsz {
        return Err(LoadErrorKind::SegmentMemoryTooSmall {
            file_size: phdr.filesz,
            mem_size: phdr.memsz,
        });
    }

    let perms = Permissions::from_elf_flags(phdr.flags);
    let id = mem
        .add_segment(phdr.vaddr, phdr.memsz, perms)
        .map_err(LoadErrorKind::SegmentAlloc)?;
    debug!(
        "mapped PT_LOAD [0x{:x}, +0x{:x}) {:?}, 0x{:x} byte(s) from offset 0x{:x}",
        phdr.vaddr, phdr.memsz, perms, phdr.filesz, phdr.offset
    );

    reader
        .seek(SeekFrom::Start(phdr.offset))
        .map_err(LoadErrorKind::SegmentSeek)?;
    let seg = mem
        .segment_mut(id)
        .ok_or(LoadErrorKind::SegmentAlloc(MemError::OutOfMemory { len: phdr.memsz }))?;
    // filesz <= memsz, and memsz already fit in a buffer
    let filesz = phdr.filesz as usize;
    reader
        .read_exact(&mut seg.bytes_mut()[..filesz])
        .map_err(LoadErrorKind::SegmentRead)?;
    Ok(())
}

/// Map a read/write stack of `size` bytes and return its base
fn place_stack(
    mem: &mut AddressSpace,
    size: u64,
    opts: &LoadOptions,
) -> Result<u64, LoadErrorKind> {
    let perms = Permissions::READ | Permissions::WRITE;

    if let Some(base) = opts.stack_base {
        if base.checked_add(size).is_none() {
            return Err(LoadErrorKind::StackAlloc { size });
        }
        mem.add_segment(base, size, perms)
            .map_err(|_| LoadErrorKind::StackAlloc { size })?;
        debug!("stack pinned at [0x{base:x}, +0x{size:x})");
        return Ok(base);
    }

    for _ in 0..opts.stack_attempts {
        let candidate =
            getrandom::u64().map_err(|_| LoadErrorKind::StackAlloc { size })? & !(STACK_ALIGN - 1);
        // the stack pointer starts at base + size and must stay representable
        if candidate.checked_add(size).is_none() {
            trace!("stack candidate 0x{candidate:x} wraps the address space");
            continue;
        }
        match mem.add_segment(candidate, size, perms) {
            Ok(_) => {
                debug!("stack placed at [0x{candidate:x}, +0x{size:x})");
                return Ok(candidate);
            }
            Err(err) => trace!("stack candidate 0x{candidate:x} rejected: {err}"),
        }
    }
    Err(LoadErrorKind::StackAlloc { size })
}
