#![no_main]

use libfuzzer_sys::fuzz_target;
use rvcore::frontend::RType;
use rvcore::runtime::abi;
use rvcore::{decode, execute, InsnError, Process};

/// Decodes a stream of words and runs every supported one against random
/// register contents. Decode must never panic, a decoded word must always
/// execute, and x0 must read zero afterwards.
fuzz_target!(|data: &[u8]| {
    if data.len() < 4 {
        return;
    }

    let mut process = Process::new();
    for (i, chunk) in data.chunks_exact(8).take(31).enumerate() {
        let mut value = [0u8; 8];
        value.copy_from_slice(chunk);
        process.regs.write(i as u8 + 1, u64::from_le_bytes(value));
    }

    for chunk in data.chunks_exact(4) {
        let word = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        match decode(word) {
            Ok(opcode) => {
                let before = process.regs.clone();
                execute(opcode, &mut process, word).expect("decoded word must execute");
                let rd = RType::parse(word).rd;
                for reg in 0..32u8 {
                    if reg != rd {
                        assert_eq!(before.read(reg), process.regs.read(reg));
                    }
                }
            }
            Err(InsnError::Unsupported { word: w }) => assert_eq!(w, word),
            Err(other) => panic!("decode returned {other:?}"),
        }
        assert_eq!(process.regs.read(abi::ZERO), 0);
    }
});
