use tandem::bus::CpuMemory;
use tandem::error::EmuError;
use tandem::proc::{Cpu, Processor};
use tandem::value::{Byte, Long};

//===========================================================================//

fn make_test_cpu(pc: u32, code: &[u8]) -> Cpu {
    let mut memory = CpuMemory::new("test");
    memory.create_ram(Long::new(0), 0x1_0000, Byte(0)).unwrap();
    memory.finalize();
    let mut cpu = Cpu::new(memory);
    for (offset, &byte) in code.iter().enumerate() {
        cpu.write_byte(pc + offset as u32, byte).unwrap();
    }
    cpu.set_pc(pc);
    cpu
}

fn peek(cpu: &Cpu, address: u32) -> u8 {
    cpu.memory().inspect(Long::new(address)).unwrap().0
}

fn register(cpu: &Cpu, name: &str) -> u32 {
    cpu.get_register(name).unwrap()
}

fn test_opcode(
    cpu: &mut Cpu,
    assembly: &str,
    cycles: u32,
    pc_after: u32,
) {
    let (_, disassembly) = cpu.disassemble(cpu.pc()).unwrap();
    assert_eq!(disassembly, assembly);
    assert_eq!(cpu.step().unwrap(), cycles);
    assert_eq!(cpu.pc(), pc_after);
}

//===========================================================================//

#[test]
fn op_nop() {
    let mut cpu = make_test_cpu(0x8000, &[0xea]);
    test_opcode(&mut cpu, "NOP", 2, 0x8001);
}

#[test]
fn fetch_counts_applications() {
    let mut cpu = make_test_cpu(0x8000, &[0xa9, 0x12]);
    cpu.disassemble(0x8000).unwrap();
    assert_eq!(cpu.application_count(0x8000), 0);
    cpu.step().unwrap();
    assert_eq!(cpu.application_count(0x8000), 1);
    assert_eq!(cpu.application_count(0x8001), 1);
    assert_eq!(cpu.application_count(0x8002), 0);
}

#[test]
fn op_lda_immediate_8() {
    let mut cpu = make_test_cpu(0x8000, &[0xa9, 0x80]);
    test_opcode(&mut cpu, "LDA #$80", 2, 0x8002);
    assert_eq!(register(&cpu, "A"), 0x80);
    assert_eq!(register(&cpu, "P"), 0xb4); // N, M, X, I
}

#[test]
fn op_lda_immediate_16() {
    let code = [0x18, 0xfb, 0xc2, 0x20, 0xa9, 0x34, 0x12];
    let mut cpu = make_test_cpu(0x8000, &code);
    test_opcode(&mut cpu, "CLC", 2, 0x8001);
    test_opcode(&mut cpu, "XCE", 2, 0x8002);
    assert!(!cpu.state().emulation());
    assert_eq!(register(&cpu, "P"), 0x35); // M, X, I, C
    test_opcode(&mut cpu, "REP #$20", 3, 0x8004);
    test_opcode(&mut cpu, "LDA #$1234", 3, 0x8007);
    assert_eq!(register(&cpu, "A"), 0x1234);
}

#[test]
fn op_lda_direct_page() {
    let mut cpu = make_test_cpu(0x8000, &[0xa5, 0x10]);
    cpu.write_byte(0x10, 0x55).unwrap();
    cpu.write_byte(0x11, 0x66).unwrap();
    test_opcode(&mut cpu, "LDA $10", 3, 0x8002);
    assert_eq!(register(&cpu, "A"), 0x55);

    cpu.set_pc(0x8000);
    cpu.set_register_debug('D', 0x0001).unwrap();
    test_opcode(&mut cpu, "LDA $10", 4, 0x8002);
    assert_eq!(register(&cpu, "A"), 0x66);
}

#[test]
fn op_adc_decimal() {
    let mut cpu = make_test_cpu(0x8000, &[0xf8, 0x69, 0x27]);
    cpu.set_register_debug('A', 0x15).unwrap();
    test_opcode(&mut cpu, "SED", 2, 0x8001);
    test_opcode(&mut cpu, "ADC #$27", 2, 0x8003);
    assert_eq!(register(&cpu, "A"), 0x42);
    assert_eq!(register(&cpu, "P") & 0x01, 0);
}

#[test]
fn op_bne() {
    // Taken across a page in emulation mode.
    let mut cpu = make_test_cpu(0x80f0, &[0xd0, 0x20]);
    test_opcode(&mut cpu, "BNE $8112", 4, 0x8112);

    // Not taken.
    let mut cpu = make_test_cpu(0x80f0, &[0xd0, 0x20]);
    cpu.set_register_debug('P', 0x36).unwrap();
    test_opcode(&mut cpu, "BNE $8112", 2, 0x80f2);

    // Taken within the page.
    let mut cpu = make_test_cpu(0x8000, &[0xd0, 0x02]);
    test_opcode(&mut cpu, "BNE $8004", 3, 0x8004);
}

#[test]
fn op_bra_backwards() {
    let mut cpu = make_test_cpu(0x8000, &[0x80, 0xfe]);
    test_opcode(&mut cpu, "BRA $8000", 3, 0x8000);
}

#[test]
fn op_brk_emulation() {
    let mut cpu = make_test_cpu(0x8000, &[0x00, 0xb2]);
    cpu.write_byte(0xfffe, 0x34).unwrap();
    cpu.write_byte(0xffff, 0x12).unwrap();
    test_opcode(&mut cpu, "BRK #$b2", 7, 0x1234);
    assert_eq!(register(&cpu, "S"), 0x01fc);
    assert_eq!(peek(&cpu, 0x01ff), 0x80); // return addr hi
    assert_eq!(peek(&cpu, 0x01fe), 0x02); // return addr lo
    assert_eq!(peek(&cpu, 0x01fd), 0x34); // saved P register, B set
}

#[test]
fn op_jsl_rtl() {
    let mut cpu = make_test_cpu(0x8000, &[0x22, 0x00, 0x90, 0x00]);
    cpu.write_byte(0x9000, 0x6b).unwrap();
    test_opcode(&mut cpu, "JSL $009000", 8, 0x9000);
    assert_eq!(register(&cpu, "S"), 0x01fc);
    assert_eq!(peek(&cpu, 0x01ff), 0x00); // program bank
    assert_eq!(peek(&cpu, 0x01fe), 0x80);
    assert_eq!(peek(&cpu, 0x01fd), 0x03);
    test_opcode(&mut cpu, "RTL", 6, 0x8004);
    assert_eq!(register(&cpu, "S"), 0x01ff);
}

#[test]
fn op_xba() {
    let mut cpu = make_test_cpu(0x8000, &[0xeb]);
    cpu.set_register_debug('A', 0x1234).unwrap();
    test_opcode(&mut cpu, "XBA", 3, 0x8001);
    assert_eq!(register(&cpu, "A"), 0x3412);
    assert_eq!(register(&cpu, "P"), 0x34);
}

#[test]
fn op_mvn_repeats_until_done() {
    let mut cpu = make_test_cpu(0x8000, &[0x54, 0x00, 0x00]);
    for (offset, byte) in [0x11, 0x22, 0x33].into_iter().enumerate() {
        cpu.write_byte(0x1000 + offset as u32, byte).unwrap();
    }
    cpu.set_register_debug('E', 0).unwrap();
    cpu.set_register_debug('P', 0x00).unwrap();
    cpu.set_register_debug('A', 0x0002).unwrap();
    cpu.set_register_debug('X', 0x1000).unwrap();
    cpu.set_register_debug('Y', 0x2000).unwrap();
    test_opcode(&mut cpu, "MVN #$00, #$00", 7, 0x8000);
    test_opcode(&mut cpu, "MVN #$00, #$00", 7, 0x8000);
    test_opcode(&mut cpu, "MVN #$00, #$00", 7, 0x8003);
    assert_eq!(register(&cpu, "A"), 0xffff);
    assert_eq!(register(&cpu, "X"), 0x1003);
    assert_eq!(register(&cpu, "Y"), 0x2003);
    assert_eq!(peek(&cpu, 0x2000), 0x11);
    assert_eq!(peek(&cpu, 0x2001), 0x22);
    assert_eq!(peek(&cpu, 0x2002), 0x33);
}

#[test]
fn wai_parks_until_nmi() {
    let mut cpu = make_test_cpu(0x8000, &[0xcb]);
    cpu.write_byte(0xfffa, 0x00).unwrap();
    cpu.write_byte(0xfffb, 0x90).unwrap();
    test_opcode(&mut cpu, "WAI", 3, 0x8001);
    assert!(cpu.state().waiting);
    assert_eq!(cpu.step().unwrap(), 1);
    assert_eq!(cpu.pc(), 0x8001);
    assert_eq!(cpu.nmi().unwrap(), 7);
    assert!(!cpu.state().waiting);
    assert_eq!(cpu.pc(), 0x9000);
    assert_eq!(peek(&cpu, 0x01ff), 0x80);
    assert_eq!(peek(&cpu, 0x01fe), 0x01);
    assert_eq!(peek(&cpu, 0x01fd), 0x24); // saved P register, B clear
}

#[test]
fn stp_halts() {
    let mut cpu = make_test_cpu(0x8000, &[0xdb]);
    assert!(matches!(
        cpu.step(),
        Err(EmuError::Halt { mnemonic: "STP", opcode: 0xdb })
    ));
}

#[test]
fn wdm_is_not_implemented() {
    let mut cpu = make_test_cpu(0x8000, &[0x42, 0x00]);
    assert!(matches!(cpu.step(), Err(EmuError::NotImplemented(_))));
}

#[test]
fn unknown_register() {
    let mut cpu = make_test_cpu(0x8000, &[]);
    assert!(matches!(
        cpu.set_register_debug('Q', 0),
        Err(EmuError::UnknownRegister('Q'))
    ));
}

#[test]
fn debugger_values_must_fit() {
    let mut cpu = make_test_cpu(0x8000, &[]);
    cpu.set_register_debug('A', 0xffff).unwrap();
    assert_eq!(register(&cpu, "A"), 0xffff);
    assert!(matches!(
        cpu.set_register_debug('A', 0x1_0000),
        Err(EmuError::RegisterOverflow { name: 'A', value: 0x1_0000 })
    ));
    assert!(matches!(
        cpu.set_register_debug('b', 0x100),
        Err(EmuError::RegisterOverflow { name: 'B', value: 0x100 })
    ));
    assert!(matches!(
        cpu.set_register_debug('E', 2),
        Err(EmuError::RegisterOverflow { name: 'E', value: 2 })
    ));
    assert_eq!(register(&cpu, "E"), 1);
    assert!(matches!(
        cpu.write_byte(0x100_0000, 0x12),
        Err(EmuError::OutOfBounds(0x100_0000))
    ));
    assert_eq!(peek(&cpu, 0x0000), 0x00);
    assert!(matches!(
        cpu.set_trap(0x100_8000, Box::new(|_, _, _| {})),
        Err(EmuError::OutOfBounds(0x100_8000))
    ));
    assert_eq!(cpu.application_count(0x100_8000), 0);
}

//===========================================================================//
