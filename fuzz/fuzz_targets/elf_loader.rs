#![no_main]

use std::io::Cursor;

use libfuzzer_sys::fuzz_target;
use rvcore::{LoadOptions, Process};

/// Feeds arbitrary bytes to the image loader. Malformed files must be
/// rejected with an error, never a panic.
fuzz_target!(|data: &[u8]| {
    let opts = LoadOptions::new().with_stack_size(0x1000);
    let mut cursor = Cursor::new(data);
    if let Ok(process) = Process::from_reader(&mut cursor, "fuzz.elf", &opts) {
        // segments must stay disjoint
        let segs: Vec<_> = process.memory().segments().collect();
        for (i, a) in segs.iter().enumerate() {
            for b in &segs[i + 1..] {
                assert!(a.end() <= b.start() as u128 || b.end() <= a.start() as u128);
            }
        }
        process.free();
    }
});
