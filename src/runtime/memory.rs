//! Segmented, permission-checked guest address space
//!
//! The address space is a small set of disjoint regions (code, data, stack)
//! rather than a page table. Each segment covers the half-open interval
//! `[start, start+len)` and owns a zero-filled buffer of exactly `len` bytes.
//! An access is served only if one segment covers it entirely; accesses that
//! straddle a boundary are unmapped.

use bitflags::bitflags;

use crate::error::MemError;

bitflags! {
    /// Access rights of a segment
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Permissions: u8 {
        const READ = 0x1;
        const WRITE = 0x2;
        const EXEC = 0x4;
    }
}

/// ELF program header flag bits
const PF_X: u32 = 0x1;
const PF_W: u32 = 0x2;
const PF_R: u32 = 0x4;

impl Permissions {
    /// Translate ELF `p_flags` into segment permissions
    pub fn from_elf_flags(p_flags: u32) -> Self {
        let mut perms = Permissions::empty();
        if p_flags & PF_R != 0 {
            perms |= Permissions::READ;
        }
        if p_flags & PF_W != 0 {
            perms |= Permissions::WRITE;
        }
        if p_flags & PF_X != 0 {
            perms |= Permissions::EXEC;
        }
        perms
    }

    /// At least one bit set and no bit outside R/W/X
    pub fn is_valid(self) -> bool {
        !self.is_empty() && Permissions::all().contains(self)
    }
}

/// Width of a single load or store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Width {
    Byte,
    Half,
    Word,
    Double,
}

impl Width {
    pub const ALL: [Width; 4] = [Width::Byte, Width::Half, Width::Word, Width::Double];

    /// Map a width in bits (8, 16, 32 or 64) to a `Width`
    pub fn from_bits(bits: u32) -> Option<Self> {
        match bits {
            8 => Some(Width::Byte),
            16 => Some(Width::Half),
            32 => Some(Width::Word),
            64 => Some(Width::Double),
            _ => None,
        }
    }

    pub fn bits(self) -> u32 {
        self.bytes() as u32 * 8
    }

    pub fn bytes(self) -> usize {
        match self {
            Width::Byte => 1,
            Width::Half => 2,
            Width::Word => 4,
            Width::Double => 8,
        }
    }

    /// Largest value representable in this width
    pub fn max_value(self) -> u64 {
        match self {
            Width::Double => u64::MAX,
            w => (1u64 << w.bits()) - 1,
        }
    }
}

/// Stable handle to a segment inside one [`AddressSpace`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SegmentId(u64);

/// A contiguous, permission-tagged region with its own backing storage
#[derive(Debug, Clone)]
pub struct Segment {
    id: SegmentId,
    start: u64,
    perms: Permissions,
    data: Vec<u8>,
}

impl Segment {
    pub fn id(&self) -> SegmentId {
        self.id
    }

    pub fn start(&self) -> u64 {
        self.start
    }

    pub fn len(&self) -> u64 {
        self.data.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// One past the last byte; may equal 2^64 for a segment at the very top
    pub fn end(&self) -> u128 {
        self.start as u128 + self.data.len() as u128
    }

    pub fn permissions(&self) -> Permissions {
        self.perms
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Whether `[addr, addr+len)` lies entirely inside this segment
    pub fn contains(&self, addr: u64, len: u64) -> bool {
        let end = addr as u128 + len as u128;
        addr >= self.start && end <= self.end()
    }

    /// Whether `[start, start+len)` intersects this segment
    fn overlaps(&self, start: u64, len: u64) -> bool {
        let end = start as u128 + len as u128;
        (start as u128) < self.end() && (self.start as u128) < end
    }

    fn offset(&self, addr: u64) -> usize {
        (addr - self.start) as usize
    }
}

/// The collection of a process's segments
#[derive(Debug, Default)]
pub struct AddressSpace {
    segments: Vec<Segment>,
    next_id: u64,
}

impl AddressSpace {
    /// Create an empty address space
    pub fn new() -> Self {
        Self::default()
    }

    /// Map a new zero-filled segment
    ///
    /// Fails without side effects on invalid permissions, on any overlap with
    /// an existing segment, on ranges that run past the top of the address
    /// space, and when the backing buffer cannot be allocated.
    pub fn add_segment(
        &mut self,
        start: u64,
        len: u64,
        perms: Permissions,
    ) -> Result<SegmentId, MemError> {
        if !perms.is_valid() {
            return Err(MemError::InvalidPermissions(perms.bits()));
        }
        if start as u128 + len as u128 > 1u128 << 64 {
            return Err(MemError::Overlap { start, len });
        }
        if self.segments.iter().any(|seg| seg.overlaps(start, len)) {
            return Err(MemError::Overlap { start, len });
        }

        let size = usize::try_from(len).map_err(|_| MemError::OutOfMemory { len })?;
        let mut data = Vec::new();
        data.try_reserve_exact(size)
            .map_err(|_| MemError::OutOfMemory { len })?;
        data.resize(size, 0);

        let id = SegmentId(self.next_id);
        self.next_id += 1;
        self.segments.push(Segment {
            id,
            start,
            perms,
            data,
        });
        Ok(id)
    }

    /// Unmap a segment, returning it if it was present
    pub fn remove_segment(&mut self, id: SegmentId) -> Option<Segment> {
        let index = self.segments.iter().position(|seg| seg.id == id)?;
        Some(self.segments.remove(index))
    }

    pub fn segment(&self, id: SegmentId) -> Option<&Segment> {
        self.segments.iter().find(|seg| seg.id == id)
    }

    pub fn segment_mut(&mut self, id: SegmentId) -> Option<&mut Segment> {
        self.segments.iter_mut().find(|seg| seg.id == id)
    }

    /// Segments in the order they were mapped
    pub fn segments(&self) -> impl Iterator<Item = &Segment> {
        self.segments.iter()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// The segment fully containing `[addr, addr+len)`, if any
    pub fn find_containing(&self, addr: u64, len: u64) -> Option<&Segment> {
        self.segments.iter().find(|seg| seg.contains(addr, len))
    }

    fn find_containing_mut(&mut self, addr: u64, len: u64) -> Option<&mut Segment> {
        self.segments.iter_mut().find(|seg| seg.contains(addr, len))
    }

    /// Resolve `[addr, addr+len)` and check that the covering segment has `required`
    pub fn checked_segment(
        &self,
        addr: u64,
        len: u64,
        required: Permissions,
    ) -> Result<&Segment, MemError> {
        let seg = self
            .find_containing(addr, len)
            .ok_or(MemError::Unmapped { addr, len })?;
        if !seg.perms.contains(required) {
            return Err(MemError::PermissionDenied { addr, required });
        }
        Ok(seg)
    }

    /// Little-endian load of `width` bytes, zero-extended to 64 bits
    pub fn load(&self, addr: u64, width: Width) -> Result<u64, MemError> {
        let len = width.bytes();
        let seg = self.checked_segment(addr, len as u64, Permissions::READ)?;
        let offset = seg.offset(addr);
        let mut buf = [0u8; 8];
        buf[..len].copy_from_slice(&seg.data[offset..offset + len]);
        Ok(u64::from_le_bytes(buf))
    }

    /// Little-endian store of the low `width` bytes of `value`
    pub fn store(&mut self, addr: u64, width: Width, value: u64) -> Result<(), MemError> {
        let len = width.bytes();
        let seg = self
            .find_containing_mut(addr, len as u64)
            .ok_or(MemError::Unmapped {
                addr,
                len: len as u64,
            })?;
        if !seg.perms.contains(Permissions::WRITE) {
            return Err(MemError::PermissionDenied {
                addr,
                required: Permissions::WRITE,
            });
        }
        let offset = seg.offset(addr);
        seg.data[offset..offset + len].copy_from_slice(&value.to_le_bytes()[..len]);
        Ok(())
    }

    /// Release every segment
    pub fn destroy(&mut self) {
        self.segments.clear();
        self.segments.shrink_to_fit();
    }
}
