use std::rc::Rc;
use tandem::bus::{ApuPorts, SpcIo, SpcMemory, map_spc_bus};
use tandem::error::EmuError;
use tandem::proc::{Processor, Spc};
use tandem::value::{Byte, Word};

//===========================================================================//

fn make_test_spc(pc: u16, code: &[u8]) -> Spc {
    let mut memory = SpcMemory::new("test");
    memory.create_ram(Word(0), 0x1_0000, Byte(0)).unwrap();
    memory.finalize();
    let mut spc = Spc::new(memory, Rc::new(SpcIo::default()));
    for (offset, &byte) in code.iter().enumerate() {
        spc.write_byte(u32::from(pc) + offset as u32, byte).unwrap();
    }
    spc.set_pc(u32::from(pc));
    spc
}

fn peek(spc: &Spc, address: u16) -> u8 {
    spc.memory().inspect(Word(address)).unwrap().0
}

fn register(spc: &Spc, name: &str) -> u32 {
    spc.get_register(name).unwrap()
}

fn test_opcode(spc: &mut Spc, assembly: &str, cycles: u32, pc_after: u32) {
    let (_, disassembly) = spc.disassemble(spc.pc()).unwrap();
    assert_eq!(disassembly, assembly);
    assert_eq!(spc.step().unwrap(), cycles);
    assert_eq!(spc.pc(), pc_after);
}

//===========================================================================//

#[test]
fn op_mov_a_immediate() {
    let mut spc = make_test_spc(0x0200, &[0xe8, 0x42]);
    test_opcode(&mut spc, "MOV A, #$42", 2, 0x0202);
    assert_eq!(register(&spc, "A"), 0x42);
    assert_eq!(register(&spc, "P"), 0x00);

    let mut spc = make_test_spc(0x0200, &[0xe8, 0x80]);
    test_opcode(&mut spc, "MOV A, #$80", 2, 0x0202);
    assert_eq!(register(&spc, "P"), 0x80); // N
}

#[test]
fn op_bne_costs_two_more_when_taken() {
    for (offset, target) in [(0x00, 0x0202), (0xff, 0x0201)] {
        let assembly = format!("BNE ${target:04x}");

        let mut spc = make_test_spc(0x0200, &[0xd0, offset]);
        spc.set_register_debug('P', 0x02).unwrap(); // Z
        test_opcode(&mut spc, &assembly, 2, 0x0202);

        let mut spc = make_test_spc(0x0200, &[0xd0, offset]);
        test_opcode(&mut spc, &assembly, 4, target);
    }
}

#[test]
fn op_cbne() {
    let mut spc = make_test_spc(0x0200, &[0x2e, 0x10, 0x05]);
    spc.write_byte(0x0010, 0x01).unwrap();
    test_opcode(&mut spc, "CBNE $10, $0208", 7, 0x0208);

    let mut spc = make_test_spc(0x0200, &[0x2e, 0x10, 0x05]);
    spc.write_byte(0x0010, 0x01).unwrap();
    spc.set_register_debug('A', 0x01).unwrap();
    test_opcode(&mut spc, "CBNE $10, $0208", 5, 0x0203);
}

#[test]
fn op_dbnz_y() {
    let mut spc = make_test_spc(0x0200, &[0xfe, 0x02]);
    spc.set_register_debug('Y', 0x02).unwrap();
    test_opcode(&mut spc, "DBNZ Y, $0204", 6, 0x0204);
    assert_eq!(register(&spc, "Y"), 0x01);

    let mut spc = make_test_spc(0x0200, &[0xfe, 0x02]);
    spc.set_register_debug('Y', 0x01).unwrap();
    test_opcode(&mut spc, "DBNZ Y, $0204", 4, 0x0202);
    assert_eq!(register(&spc, "Y"), 0x00);
    assert_eq!(register(&spc, "P"), 0x00); // flags untouched
}

#[test]
fn op_mov_direct_to_direct() {
    let mut spc = make_test_spc(0x0200, &[0xfa, 0x10, 0x20]);
    spc.write_byte(0x0010, 0x99).unwrap();
    test_opcode(&mut spc, "MOV $20, $10", 5, 0x0203);
    assert_eq!(peek(&spc, 0x0020), 0x99);
    assert_eq!(register(&spc, "P"), 0x00);
}

#[test]
fn direct_page_follows_p_flag() {
    let mut spc = make_test_spc(0x0200, &[0x40, 0xe4, 0x10]);
    spc.write_byte(0x0010, 0x11).unwrap();
    spc.write_byte(0x0110, 0x22).unwrap();
    test_opcode(&mut spc, "SETP", 2, 0x0201);
    test_opcode(&mut spc, "MOV A, $10", 3, 0x0203);
    assert_eq!(register(&spc, "A"), 0x22);
}

#[test]
fn op_movw_ya_direct() {
    let mut spc = make_test_spc(0x0200, &[0xba, 0x20]);
    spc.write_byte(0x0020, 0x34).unwrap();
    spc.write_byte(0x0021, 0x12).unwrap();
    test_opcode(&mut spc, "MOVW YA, $20", 5, 0x0202);
    assert_eq!(register(&spc, "A"), 0x34);
    assert_eq!(register(&spc, "Y"), 0x12);
}

#[test]
fn op_mul() {
    let mut spc = make_test_spc(0x0200, &[0xcf]);
    spc.set_register_debug('Y', 0x12).unwrap();
    spc.set_register_debug('A', 0x34).unwrap();
    test_opcode(&mut spc, "MUL YA", 9, 0x0201);
    assert_eq!(register(&spc, "Y"), 0x03);
    assert_eq!(register(&spc, "A"), 0xa8);
    assert_eq!(register(&spc, "P"), 0x00);
}

#[test]
fn op_div() {
    let mut spc = make_test_spc(0x0200, &[0x9e]);
    spc.set_register_debug('Y', 0x01).unwrap();
    spc.set_register_debug('A', 0x23).unwrap();
    spc.set_register_debug('X', 0x10).unwrap();
    test_opcode(&mut spc, "DIV YA, X", 12, 0x0201);
    assert_eq!(register(&spc, "A"), 0x12); // quotient
    assert_eq!(register(&spc, "Y"), 0x03); // remainder
    assert_eq!(register(&spc, "P"), 0x08); // H
}

#[test]
fn op_div_by_zero() {
    let mut spc = make_test_spc(0x0200, &[0x9e]);
    spc.set_register_debug('Y', 0x01).unwrap();
    spc.set_register_debug('A', 0x23).unwrap();
    test_opcode(&mut spc, "DIV YA, X", 12, 0x0201);
    assert_eq!(register(&spc, "A"), 0xfe);
    assert_eq!(register(&spc, "Y"), 0x23);
    assert_eq!(register(&spc, "P"), 0xc8); // N, V, H
}

#[test]
fn op_call_ret() {
    let mut spc = make_test_spc(0x0200, &[0x3f, 0x00, 0x03]);
    spc.write_byte(0x0300, 0x6f).unwrap();
    spc.set_register_debug('S', 0xef).unwrap();
    test_opcode(&mut spc, "CALL !$0300", 8, 0x0300);
    assert_eq!(register(&spc, "S"), 0xed);
    assert_eq!(peek(&spc, 0x01ef), 0x02); // return addr hi
    assert_eq!(peek(&spc, 0x01ee), 0x03); // return addr lo
    test_opcode(&mut spc, "RET", 5, 0x0203);
    assert_eq!(register(&spc, "S"), 0xef);
}

#[test]
fn sleep_halts() {
    let mut spc = make_test_spc(0x0200, &[0xef]);
    assert!(matches!(
        spc.step(),
        Err(EmuError::Halt { mnemonic: "SLEEP", opcode: 0xef })
    ));
}

#[test]
fn boot_rom_announces_itself() {
    let io = Rc::new(SpcIo::default());
    let ports = Rc::new(ApuPorts::default());
    let mut memory = SpcMemory::new("SPC");
    map_spc_bus(&mut memory, &io, &ports).unwrap();
    memory.finalize();
    let mut spc = Spc::new(memory, io);
    spc.reset().unwrap();
    assert_eq!(spc.pc(), 0xffc0);
    assert_eq!(spc.disassemble(0xffc0).unwrap(), (2, "MOV X, #$ef".into()));
    for _ in 0..1000 {
        spc.step().unwrap();
    }
    assert_eq!(ports.cpu_read(0), 0xaa);
    assert_eq!(ports.cpu_read(1), 0xbb);
    assert!(matches!(spc.pc(), 0xffcf | 0xffd2));
    assert_eq!(peek(&spc, 0x0001), 0x00);
    assert_eq!(peek(&spc, 0x00ef), 0x00);
}

#[test]
fn debugger_values_must_fit() {
    let mut spc = make_test_spc(0x0200, &[]);
    assert!(matches!(
        spc.set_register_debug('A', 0x1234),
        Err(EmuError::RegisterOverflow { name: 'A', value: 0x1234 })
    ));
    assert_eq!(register(&spc, "A"), 0x00);
    assert!(matches!(
        spc.write_byte(0x1_0002, 0xab),
        Err(EmuError::OutOfBounds(0x1_0002))
    ));
    assert_eq!(peek(&spc, 0x0002), 0x00);
    assert!(matches!(
        spc.set_trap(0x1_ffc0, Box::new(|_, _, _| {})),
        Err(EmuError::OutOfBounds(0x1_ffc0))
    ));
    assert!(matches!(
        spc.remove_trap(0x1_ffc0),
        Err(EmuError::OutOfBounds(0x1_ffc0))
    ));
}

//===========================================================================//
