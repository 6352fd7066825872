#![no_main]

use libfuzzer_sys::fuzz_target;
use rvcore::runtime::AddressSpace;
use rvcore::{MemError, Permissions, Width};

/// Interprets the input as a sequence of map/load/store operations and checks
/// that a failed access never changes memory.
fuzz_target!(|data: &[u8]| {
    let mut mem = AddressSpace::new();
    for op in data.chunks_exact(12) {
        let addr = u64::from(u16::from_le_bytes([op[1], op[2]]));
        let len = u64::from(op[3]);
        let width = Width::ALL[(op[4] & 3) as usize];
        let value = u64::from_le_bytes([op[4], op[5], op[6], op[7], op[8], op[9], op[10], op[11]]);
        match op[0] % 3 {
            0 => {
                let perms = Permissions::from_bits_retain(op[4] & 0x0f);
                let _ = mem.add_segment(addr, len, perms);
            }
            1 => {
                let _ = mem.load(addr, width);
            }
            _ => {
                let len = width.bytes() as u64;
                let before = mem.find_containing(addr, len).map(|s| s.bytes().to_vec());
                match mem.store(addr, width, value) {
                    Ok(()) => {
                        if let Ok(read) = mem.load(addr, width) {
                            assert_eq!(read, value & width.max_value());
                        }
                    }
                    Err(MemError::PermissionDenied { .. }) | Err(MemError::Unmapped { .. }) => {
                        let after = mem.find_containing(addr, len).map(|s| s.bytes().to_vec());
                        assert_eq!(before, after);
                    }
                    Err(other) => panic!("store returned {other:?}"),
                }
            }
        }
    }
});
