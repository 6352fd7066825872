mod common;

use common::{header, image, write_temp, SegmentDef, ENTRY};
use rvcore::runtime::abi;
use rvcore::{
    decode, execute, fetch, free_process, load_process, load_process_with, read_memory,
    write_memory, Error, InsnError, LoadErrorKind, LoadOptions, MemError, Opcode, Permissions,
    Width,
};

const ADD_A0_A1_A2: u32 = 0x00C5_8533;
const SUB_A0_A1_A2: u32 = 0x40C5_8533;

#[test]
fn test_load_fetch_decode_execute() {
    let file = write_temp(&image(header(1), &[SegmentDef::text(&[ADD_A0_A1_A2, SUB_A0_A1_A2])]));
    let mut process = load_process(file.path()).unwrap();
    assert_eq!(process.pc, ENTRY);

    process.regs.write(abi::A1, 5);
    process.regs.write(abi::A2, 7);

    let (word, size) = fetch(&process).unwrap();
    assert_eq!((word, size), (ADD_A0_A1_A2, 4));
    let opcode = decode(word).unwrap();
    assert_eq!(opcode, Opcode::Add);
    execute(opcode, &mut process, word).unwrap();
    assert_eq!(process.regs.read(abi::A0), 12);

    process.pc += size;
    process.step().unwrap();
    assert_eq!(process.regs.read(abi::A0), 0xFFFF_FFFF_FFFF_FFFE);

    // ran off the end of the text segment
    assert!(matches!(
        process.step(),
        Err(Error::Mem(MemError::Unmapped { .. }))
    ));
    free_process(process);
}

#[test]
fn test_add_handler_rejects_sub_word() {
    let file = write_temp(&image(header(1), &[SegmentDef::text(&[SUB_A0_A1_A2])]));
    let mut process = load_process(file.path()).unwrap();
    process.regs.write(abi::A1, 5);
    process.regs.write(abi::A2, 7);
    let (word, _) = fetch(&process).unwrap();
    assert_eq!(
        execute(Opcode::Add, &mut process, word),
        Err(InsnError::UnsupportedVariant {
            word,
            opcode: Opcode::Add,
            funct7: 0x20
        })
    );
    assert_eq!(process.regs.read(abi::A0), 0);
}

#[test]
fn test_initial_state() {
    let file = write_temp(&image(header(1), &[SegmentDef::text(&[ADD_A0_A1_A2])]));
    let opts = LoadOptions::new().with_stack_size(0x8000);
    let process = load_process_with(file.path(), &opts).unwrap();

    let sp = process.regs.read(abi::SP);
    for reg in 0..32u8 {
        if reg != abi::SP {
            assert_eq!(process.regs.read(reg), 0, "x{reg}");
        }
    }
    // the stack ends exactly at sp and is read/write
    let stack = process.memory().find_containing(sp - 0x8000, 0x8000).unwrap();
    assert_eq!(stack.permissions(), Permissions::READ | Permissions::WRITE);
    assert_eq!(read_memory(&process, sp - 8, Width::Double).unwrap(), 0);
    assert!(read_memory(&process, sp, Width::Byte).is_err());
}

#[test]
fn test_stack_is_usable() {
    let file = write_temp(&image(header(1), &[SegmentDef::text(&[ADD_A0_A1_A2])]));
    let mut process = load_process_with(file.path(), &LoadOptions::new().with_stack_size(0x1000)).unwrap();
    let sp = process.regs.read(abi::SP);
    write_memory(&mut process, sp - 4, Width::Word, 0xcafe_f00d).unwrap();
    assert_eq!(read_memory(&process, sp - 4, Width::Word).unwrap(), 0xcafe_f00d);
    assert_eq!(read_memory(&process, sp - 4, Width::Half).unwrap(), 0xf00d);
}

#[test]
fn test_bss_tail_is_zero() {
    let data = SegmentDef {
        vaddr: 0x4_0000,
        flags: 0x6,
        data: vec![0xff; 8],
        memsz: 0x1000,
    };
    let file = write_temp(&image(header(2), &[SegmentDef::text(&[ADD_A0_A1_A2]), data]));
    let process = load_process(file.path()).unwrap();
    assert_eq!(read_memory(&process, 0x4_0000, Width::Double).unwrap(), u64::MAX);
    assert_eq!(read_memory(&process, 0x4_0008, Width::Double).unwrap(), 0);
    assert_eq!(read_memory(&process, 0x4_0ff8, Width::Double).unwrap(), 0);
}

#[test]
fn test_read_only_text_rejects_store() {
    let file = write_temp(&image(header(1), &[SegmentDef::text(&[ADD_A0_A1_A2])]));
    let mut process = load_process(file.path()).unwrap();
    assert_eq!(
        write_memory(&mut process, ENTRY, Width::Word, 0),
        Err(MemError::PermissionDenied {
            addr: ENTRY,
            required: Permissions::WRITE
        })
    );
    assert_eq!(read_memory(&process, ENTRY, Width::Word).unwrap(), ADD_A0_A1_A2 as u64);
}

#[test]
fn test_fetch_from_data_segment_denied() {
    let mut text = SegmentDef::text(&[ADD_A0_A1_A2]);
    text.flags = 0x6;
    let file = write_temp(&image(header(1), &[text]));
    let process = load_process(file.path()).unwrap();
    assert!(matches!(
        fetch(&process),
        Err(MemError::PermissionDenied { addr: ENTRY, .. })
    ));
}

#[test]
fn test_wrong_machine_reports_path() {
    let mut hdr = header(1);
    hdr.machine = 0x3e;
    let file = write_temp(&image(hdr, &[SegmentDef::text(&[ADD_A0_A1_A2])]));
    let err = load_process(file.path()).unwrap_err();
    assert_eq!(err.path, file.path());
    assert!(matches!(err.kind, LoadErrorKind::BadMachine(0x3e)));
    assert!(err.to_string().contains(&file.path().display().to_string()));
}

#[test]
fn test_bad_magic() {
    let mut hdr = header(0);
    hdr.ident[1] = b'X';
    let file = write_temp(&image(hdr, &[]));
    let err = load_process(file.path()).unwrap_err();
    assert!(matches!(err.kind, LoadErrorKind::BadMagic));
}

#[test]
fn test_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_process(dir.path().join("nope.elf")).unwrap_err();
    assert!(matches!(err.kind, LoadErrorKind::Open(_)));
}

#[test]
fn test_empty_file() {
    let file = write_temp(&[]);
    let err = load_process(file.path()).unwrap_err();
    assert!(matches!(err.kind, LoadErrorKind::Truncated(_)));
}

#[test]
fn test_segment_memory_too_small() {
    let mut text = SegmentDef::text(&[ADD_A0_A1_A2, ADD_A0_A1_A2]);
    text.memsz = 4;
    let file = write_temp(&image(header(1), &[text]));
    let err = load_process(file.path()).unwrap_err();
    assert!(matches!(
        err.kind,
        LoadErrorKind::SegmentMemoryTooSmall {
            file_size: 8,
            mem_size: 4
        }
    ));
}
