use std::cell::RefCell;
use std::rc::Rc;
use tandem::bus::{
    ApuPorts, CpuIo, CpuMemory, Register, RegisterKind, map_cpu_bus,
    map_ppu_latches,
};
use tandem::dma::{DmaChannel, DmaEngine};
use tandem::proc::{Cpu, Processor};
use tandem::value::{Byte, Long, Word};

//===========================================================================//

const MDMAEN: u32 = 0x420b;

/// Builds a full CPU bus whose OAMDATA register (`$2104`) records every
/// byte written to it, and whose RDVRAML register (`$2139`) reads back
/// `$A0`, `$A1`, and so on.  `$1000-$1003` holds `$11 $22 $33 $44`.
fn make_bus() -> (CpuMemory, Rc<RefCell<Vec<u8>>>) {
    let written = Rc::new(RefCell::new(Vec::new()));
    let mut memory = CpuMemory::new("test");
    let io = Rc::new(CpuIo::default());
    let ports = Rc::new(ApuPorts::default());
    map_cpu_bus(&mut memory, &io, &ports).unwrap();
    let sink = written.clone();
    memory
        .create_register(
            Long::new(0x2104),
            Register::new("OAMDATA", RegisterKind::Write, Byte::ZERO)
                .on_write(move |_, new| sink.borrow_mut().push(new.0)),
        )
        .unwrap();
    let mut next = 0xa0;
    memory
        .create_register(
            Long::new(0x2139),
            Register::new("RDVRAML", RegisterKind::Read, Byte::ZERO).on_read(
                move |_| {
                    next += 1;
                    Byte(next - 1)
                },
            ),
        )
        .unwrap();
    map_ppu_latches(&mut memory).unwrap();
    memory.finalize();
    for (offset, byte) in [0x11, 0x22, 0x33, 0x44].into_iter().enumerate() {
        memory.write(Long::new(0x1000 + offset as u32), Byte(byte)).unwrap();
    }
    (memory, written)
}

/// Stores `channel` as channel 0 and enables it.
fn arm(memory: &mut CpuMemory, channel: DmaChannel) {
    channel.store(memory, 0).unwrap();
    memory.write(Long::new(MDMAEN), Byte(0x01)).unwrap();
}

fn run_to_completion(memory: &mut CpuMemory) -> usize {
    let mut engine = DmaEngine::default();
    let mut units = 0;
    while engine.is_pending(memory) {
        engine.step(memory).unwrap();
        units += 1;
    }
    units
}

fn oam_channel(control: u8, address: u32, size: u16) -> DmaChannel {
    DmaChannel {
        control: Byte(control),
        register: Byte(0x04),
        address: Long::new(address),
        size: Word(size),
        ..DmaChannel::default()
    }
}

//===========================================================================//

#[test]
fn byte_mode_runs_to_completion() {
    let (mut memory, written) = make_bus();
    arm(&mut memory, oam_channel(0x00, 0x1000, 4));
    assert_eq!(run_to_completion(&mut memory), 4);
    assert_eq!(*written.borrow(), vec![0x11, 0x22, 0x33, 0x44]);
    let channel = DmaChannel::load(&memory, 0).unwrap();
    assert_eq!(channel.size, Word(0));
    assert_eq!(channel.address, Long::new(0x1004));
    assert_eq!(memory.inspect(Long::new(MDMAEN)).unwrap(), Byte(0x00));
}

#[test]
fn register_to_memory() {
    let (mut memory, written) = make_bus();
    arm(
        &mut memory,
        DmaChannel {
            control: Byte(0x80),
            register: Byte(0x39),
            address: Long::new(0x1800),
            size: Word(3),
            ..DmaChannel::default()
        },
    );
    assert_eq!(run_to_completion(&mut memory), 3);
    assert!(written.borrow().is_empty());
    for (offset, byte) in [0xa0, 0xa1, 0xa2].into_iter().enumerate() {
        let address = Long::new(0x1800 + offset as u32);
        assert_eq!(memory.inspect(address).unwrap(), Byte(byte));
    }
    let channel = DmaChannel::load(&memory, 0).unwrap();
    assert_eq!(channel.address, Long::new(0x1803));
}

#[test]
fn fixed_source_address() {
    let (mut memory, written) = make_bus();
    arm(&mut memory, oam_channel(0x08, 0x1000, 3));
    run_to_completion(&mut memory);
    assert_eq!(*written.borrow(), vec![0x11, 0x11, 0x11]);
    let channel = DmaChannel::load(&memory, 0).unwrap();
    assert_eq!(channel.address, Long::new(0x1000));
}

#[test]
fn decrementing_source_address() {
    let (mut memory, written) = make_bus();
    arm(&mut memory, oam_channel(0x10, 0x1003, 4));
    run_to_completion(&mut memory);
    assert_eq!(*written.borrow(), vec![0x44, 0x33, 0x22, 0x11]);
    let channel = DmaChannel::load(&memory, 0).unwrap();
    assert_eq!(channel.address, Long::new(0x0fff));
}

#[test]
fn size_zero_means_64k() {
    let (mut memory, _) = make_bus();
    arm(&mut memory, oam_channel(0x01, 0x1000, 0));
    let mut engine = DmaEngine::default();
    // Engine start, channel start, and a two-byte unit.
    assert_eq!(engine.step(&mut memory).unwrap(), 6);
    let channel = DmaChannel::load(&memory, 0).unwrap();
    assert_eq!(channel.size, Word(0xfffe));
    assert!(engine.is_pending(&memory));
    assert_eq!(memory.inspect(Long::new(MDMAEN)).unwrap(), Byte(0x01));
}

#[test]
fn idle_engine_takes_no_cycles() {
    let (mut memory, written) = make_bus();
    let mut engine = DmaEngine::default();
    assert!(!engine.is_pending(&memory));
    assert_eq!(engine.step(&mut memory).unwrap(), 0);
    assert!(written.borrow().is_empty());
}

#[test]
fn transfer_preempts_cpu_fetch() {
    let (mut memory, written) = make_bus();
    oam_channel(0x00, 0x1000, 4).store(&mut memory, 0).unwrap();
    let mut cpu = Cpu::new(memory);
    // LDA #$01; STA $420B; NOP
    let code = [0xa9, 0x01, 0x8d, 0x0b, 0x42, 0xea];
    for (offset, &byte) in code.iter().enumerate() {
        cpu.write_byte(0x0200 + offset as u32, byte).unwrap();
    }
    cpu.set_pc(0x0200);
    cpu.step().unwrap();
    cpu.step().unwrap();
    assert_eq!(cpu.pc(), 0x0205);
    assert!(cpu.dma_pending());

    // Engine start, channel start, and the first byte.
    assert_eq!(cpu.step().unwrap(), 5);
    for _ in 0..3 {
        assert_eq!(cpu.step().unwrap(), 1);
    }
    assert_eq!(cpu.pc(), 0x0205);
    assert!(!cpu.dma_pending());
    assert_eq!(*written.borrow(), vec![0x11, 0x22, 0x33, 0x44]);

    assert_eq!(cpu.step().unwrap(), 2);
    assert_eq!(cpu.pc(), 0x0206);
}

//===========================================================================//
