use super::{ApuPorts, CpuMemory, Register, RegisterKind};
use crate::error::Result;
use crate::value::{Byte, Long, Word, divide};
use log::debug;
use std::cell::Cell;
use std::rc::Rc;

//===========================================================================//

const WRAM_START: u32 = 0x7e_0000;
const WRAM_SIZE: u32 = 0x2_0000;
const LOW_RAM_SIZE: u32 = 0x2000;
const SRAM_START: u32 = 0x70_0000;
const SRAM_SIZE: u32 = 0x8000;
const LOROM_BANK_SIZE: usize = 0x8000;
const LOROM_BANKS: usize = 0x7e;

const NMITIMEN_ENABLE_NMI: u8 = 0b1000_0000;
const RDNMI_VERSION: u8 = 0x02;
const RDNMI_FLAG: u8 = 0b1000_0000;
const TIMEUP_FLAG: u8 = 0b1000_0000;
const HVBJOY_VBLANK: u8 = 0b1000_0000;
const HVBJOY_HBLANK: u8 = 0b0100_0000;

const PPU_WRITE_REGS: [&str; 0x34] = [
    "INIDISP", "OBSEL", "OAMADDL", "OAMADDH", "OAMDATA", "BGMODE", "MOSAIC",
    "BG1SC", "BG2SC", "BG3SC", "BG4SC", "BG12NBA", "BG34NBA", "BG1HOFS",
    "BG1VOFS", "BG2HOFS", "BG2VOFS", "BG3HOFS", "BG3VOFS", "BG4HOFS",
    "BG4VOFS", "VMAIN", "VMADDL", "VMADDH", "VMDATAL", "VMDATAH", "M7SEL",
    "M7A", "M7B", "M7C", "M7D", "M7X", "M7Y", "CGADD", "CGDATA", "W12SEL",
    "W34SEL", "WOBJSEL", "WH0", "WH1", "WH2", "WH3", "WBGLOG", "WOBJLOG",
    "TM", "TS", "TMW", "TSW", "CGWSEL", "CGADSUB", "COLDATA", "SETINI",
];

const PPU_READ_REGS: [&str; 0x0c] = [
    "MPYL", "MPYM", "MPYH", "SLHV", "RDOAM", "RDVRAML", "RDVRAMH", "RDCGRAM",
    "OPHCT", "OPVCT", "STAT77", "STAT78",
];

const DMA_CHANNEL_REG_COUNT: u32 = 0x0c;

//===========================================================================//

/// State shared between the main CPU's I/O registers and the code that
/// drives frame timing.
#[derive(Debug, Default)]
pub struct CpuIo {
    nmi_enabled: Cell<bool>,
    nmi_flag: Cell<bool>,
    irq_flag: Cell<bool>,
    vblank: Cell<bool>,
    hblank: Cell<bool>,
    multiplicand: Cell<u8>,
    dividend: Cell<u16>,
    quotient: Cell<u16>,
    remainder: Cell<u16>,
}

impl CpuIo {
    /// Returns true if NMITIMEN enables the vblank NMI.
    pub fn nmi_enabled(&self) -> bool {
        self.nmi_enabled.get()
    }

    /// Latches the vblank NMI flag read back through RDNMI.
    pub fn set_nmi_flag(&self, flag: bool) {
        self.nmi_flag.set(flag);
    }

    /// Latches the timer IRQ flag read back through TIMEUP.
    pub fn set_irq_flag(&self, flag: bool) {
        self.irq_flag.set(flag);
    }

    /// Sets whether the video output is in vertical blank.
    pub fn set_vblank(&self, vblank: bool) {
        self.vblank.set(vblank);
    }

    /// Returns true if the video output is in vertical blank.
    pub fn vblank(&self) -> bool {
        self.vblank.get()
    }

    /// Sets whether the video output is in horizontal blank.
    pub fn set_hblank(&self, hblank: bool) {
        self.hblank.set(hblank);
    }
}

//===========================================================================//

fn simple(name: &'static str, kind: RegisterKind) -> Register {
    Register::new(name, kind, Byte::ZERO)
}

fn bank_address(bank: u32, offset: u32) -> Long {
    Long::new((bank << 16) | offset)
}

/// Maps work RAM, the CPU and DMA registers, and the APU ports onto a fresh
/// main-CPU bus.  The cartridge and the video registers are mapped
/// separately; see [map_lorom] and [map_ppu_latches].
pub fn map_cpu_bus(
    memory: &mut CpuMemory,
    io: &Rc<CpuIo>,
    ports: &Rc<ApuPorts>,
) -> Result<()> {
    memory.create_ram(Long::new(WRAM_START), WRAM_SIZE, Byte::ZERO)?;
    for bank in (0x00..0x40).chain(0x80..0xc0) {
        memory.create_mirror_range(
            bank_address(bank, 0),
            LOW_RAM_SIZE,
            Long::new(WRAM_START),
        )?;
    }
    memory.create_ram(Long::new(SRAM_START), SRAM_SIZE, Byte::ZERO)?;
    map_apu_ports(memory, ports)?;
    map_cpu_registers(memory, io)?;
    map_dma_registers(memory)?;
    for bank in (0x01..0x40).chain(0x80..0xc0) {
        for page in [0x21, 0x40, 0x42, 0x43] {
            memory.create_mirror_range(
                bank_address(bank, page << 8),
                0x100,
                bank_address(0, page << 8),
            )?;
        }
    }
    Ok(())
}

fn map_apu_ports(memory: &mut CpuMemory, ports: &Rc<ApuPorts>) -> Result<()> {
    const NAMES: [&str; 4] = ["APUIO0", "APUIO1", "APUIO2", "APUIO3"];
    for (port, name) in NAMES.into_iter().enumerate() {
        let (reader, writer) = (ports.clone(), ports.clone());
        let register = simple(name, RegisterKind::ReadWrite)
            .on_read(move |_| Byte(reader.cpu_read(port)))
            .on_write(move |_, new| writer.cpu_write(port, new.0));
        memory.create_register(Long::new(0x2140 + port as u32), register)?;
    }
    for addr in 0x2144..0x2180 {
        memory.create_mirror(Long::new(addr), Long::new(0x2140 | (addr & 3)))?;
    }
    for (offset, name) in ["WMDATA", "WMADDL", "WMADDM", "WMADDH"]
        .into_iter()
        .enumerate()
    {
        memory.create_register(
            Long::new(0x2180 + offset as u32),
            simple(name, RegisterKind::ReadWrite),
        )?;
    }
    Ok(())
}

fn map_cpu_registers(memory: &mut CpuMemory, io: &Rc<CpuIo>) -> Result<()> {
    let at = |addr: u32| Long::new(addr);
    for (addr, name) in [(0x4016, "JOYSER0"), (0x4017, "JOYSER1")] {
        let register = simple(name, RegisterKind::ReadWrite);
        memory.create_register(at(addr), register)?;
    }

    let state = io.clone();
    memory.create_register(
        at(0x4200),
        simple("NMITIMEN", RegisterKind::Write).on_write(move |_, new| {
            state.nmi_enabled.set(new.0 & NMITIMEN_ENABLE_NMI != 0);
        }),
    )?;
    memory.create_register(at(0x4201), simple("WRIO", RegisterKind::Write))?;

    let state = io.clone();
    memory.create_register(
        at(0x4202),
        simple("WRMPYA", RegisterKind::Write)
            .on_write(move |_, new| state.multiplicand.set(new.0)),
    )?;
    let state = io.clone();
    memory.create_register(
        at(0x4203),
        simple("WRMPYB", RegisterKind::Write).on_write(move |_, new| {
            let product =
                u16::from(state.multiplicand.get()) * u16::from(new.0);
            state.remainder.set(product);
        }),
    )?;
    let state = io.clone();
    memory.create_register(
        at(0x4204),
        simple("WRDIVL", RegisterKind::Write).on_write(move |_, new| {
            let dividend = Word(state.dividend.get()).with_low(new);
            state.dividend.set(dividend.0);
        }),
    )?;
    let state = io.clone();
    memory.create_register(
        at(0x4205),
        simple("WRDIVH", RegisterKind::Write).on_write(move |_, new| {
            let dividend = Word(state.dividend.get()).with_high(new);
            state.dividend.set(dividend.0);
        }),
    )?;
    let state = io.clone();
    memory.create_register(
        at(0x4206),
        simple("WRDIVB", RegisterKind::Write).on_write(move |_, new| {
            let (quotient, remainder) =
                divide(Word(state.dividend.get()), new);
            state.quotient.set(quotient.0);
            state.remainder.set(remainder.0);
        }),
    )?;
    for (addr, name) in [
        (0x4207, "HTIMEL"),
        (0x4208, "HTIMEH"),
        (0x4209, "VTIMEL"),
        (0x420a, "VTIMEH"),
        (0x420d, "MEMSEL"),
    ] {
        memory.create_register(at(addr), simple(name, RegisterKind::Write))?;
    }
    // The DMA engines read these back, so they are plain storage.
    memory.create_read_write(at(0x420b), Byte::ZERO)?;
    memory.create_read_write(at(0x420c), Byte::ZERO)?;

    let state = io.clone();
    memory.create_register(
        at(0x4210),
        simple("RDNMI", RegisterKind::Read).on_read(move |_| {
            let flag =
                if state.nmi_flag.replace(false) { RDNMI_FLAG } else { 0 };
            Byte(flag | RDNMI_VERSION)
        }),
    )?;
    let state = io.clone();
    memory.create_register(
        at(0x4211),
        simple("TIMEUP", RegisterKind::Read).on_read(move |_| {
            Byte(if state.irq_flag.replace(false) { TIMEUP_FLAG } else { 0 })
        }),
    )?;
    let state = io.clone();
    memory.create_register(
        at(0x4212),
        simple("HVBJOY", RegisterKind::Read).on_read(move |_| {
            let mut value = 0;
            if state.vblank.get() {
                value |= HVBJOY_VBLANK;
            }
            if state.hblank.get() {
                value |= HVBJOY_HBLANK;
            }
            Byte(value)
        }),
    )?;
    memory.create_register(at(0x4213), simple("RDIO", RegisterKind::Read))?;

    type Getter = fn(&CpuIo) -> Byte;
    let results: [(u32, &'static str, Getter); 4] = [
        (0x4214, "RDDIVL", |io| Word(io.quotient.get()).low()),
        (0x4215, "RDDIVH", |io| Word(io.quotient.get()).high()),
        (0x4216, "RDMPYL", |io| Word(io.remainder.get()).low()),
        (0x4217, "RDMPYH", |io| Word(io.remainder.get()).high()),
    ];
    for (addr, name, getter) in results {
        let state = io.clone();
        memory.create_register(
            at(addr),
            simple(name, RegisterKind::Read).on_read(move |_| getter(&state)),
        )?;
    }
    for (offset, name) in [
        "JOY1L", "JOY1H", "JOY2L", "JOY2H", "JOY3L", "JOY3H", "JOY4L", "JOY4H",
    ]
    .into_iter()
    .enumerate()
    {
        memory.create_register(
            at(0x4218 + offset as u32),
            simple(name, RegisterKind::Read),
        )?;
    }
    Ok(())
}

fn map_dma_registers(memory: &mut CpuMemory) -> Result<()> {
    for channel in 0..8u32 {
        for offset in 0..DMA_CHANNEL_REG_COUNT {
            let addr = 0x4300 | (channel << 4) | offset;
            memory.create_read_write(Long::new(addr), Byte(0xff))?;
        }
        let addr = 0x4300 | (channel << 4) | 0x0f;
        memory.create_mirror(Long::new(addr), Long::new(addr - 4))?;
    }
    Ok(())
}

/// Maps plain latches onto every video register at `$2100-$213F` that a
/// collaborator has not already bound.  Registers the video hardware only
/// accepts writes for are write-only.
pub fn map_ppu_latches(memory: &mut CpuMemory) -> Result<()> {
    let write_regs = PPU_WRITE_REGS.iter().map(|&n| (n, RegisterKind::Write));
    let read_regs = PPU_READ_REGS.iter().map(|&n| (n, RegisterKind::Read));
    for (offset, (name, kind)) in write_regs.chain(read_regs).enumerate() {
        let addr = Long::new(0x2100 + offset as u32);
        if !memory.is_configured(addr) {
            memory.create_register(addr, simple(name, kind))?;
        }
    }
    Ok(())
}

/// Maps a LoROM cartridge image: 32k of the image per bank at
/// `$8000-$FFFF` in banks `$00-$7D`, mirrored in banks `$80-$FF`.  Banks
/// past the end of the image mirror the image again.
pub fn map_lorom(memory: &mut CpuMemory, rom: &[u8]) -> Result<()> {
    let num_banks = rom.len().div_ceil(LOROM_BANK_SIZE).min(LOROM_BANKS);
    debug!("mapping {} bytes of LoROM in {num_banks} banks", rom.len());
    let chunks = rom.chunks(LOROM_BANK_SIZE).take(num_banks);
    for (bank, chunk) in chunks.enumerate() {
        memory.create_rom(bank_address(bank as u32, 0x8000), chunk)?;
    }
    if num_banks == 0 {
        return Ok(());
    }
    for bank in num_banks..LOROM_BANKS {
        let source = (bank % num_banks) as u32;
        memory.create_mirror_range(
            bank_address(bank as u32, 0x8000),
            0x8000,
            bank_address(source, 0x8000),
        )?;
    }
    for bank in 0x80..0x100 {
        let source = ((bank - 0x80) % num_banks) as u32;
        memory.create_mirror_range(
            bank_address(bank as u32, 0x8000),
            0x8000,
            bank_address(source, 0x8000),
        )?;
    }
    Ok(())
}

//===========================================================================//

#[cfg(test)]
mod tests {
    use super::{CpuIo, map_cpu_bus, map_lorom, map_ppu_latches};
    use crate::bus::{ApuPorts, CpuMemory, Wrap};
    use crate::error::EmuError;
    use crate::value::{Byte, Long, Word};
    use std::rc::Rc;

    fn make_bus(rom: &[u8]) -> (CpuMemory, Rc<CpuIo>, Rc<ApuPorts>) {
        let io = Rc::new(CpuIo::default());
        let ports = Rc::new(ApuPorts::default());
        let mut memory = CpuMemory::new("test");
        map_cpu_bus(&mut memory, &io, &ports).unwrap();
        map_ppu_latches(&mut memory).unwrap();
        map_lorom(&mut memory, rom).unwrap();
        memory.finalize();
        (memory, io, ports)
    }

    #[test]
    fn low_ram_mirrors_wram() {
        let (mut memory, _, _) = make_bus(&[]);
        memory.write(Long::new(0x00_1234), Byte(0x56)).unwrap();
        assert_eq!(memory.read(Long::new(0x7e_1234)).unwrap(), Byte(0x56));
        assert_eq!(memory.read(Long::new(0x80_1234)).unwrap(), Byte(0x56));
        assert_eq!(memory.read(Long::new(0x3f_1234)).unwrap(), Byte(0x56));
    }

    #[test]
    fn lorom_mapping() {
        let mut rom = vec![0u8; 0x10000];
        rom[0x0000] = 0x11;
        rom[0x8000] = 0x22;
        let (mut memory, _, _) = make_bus(&rom);
        assert_eq!(memory.read(Long::new(0x00_8000)).unwrap(), Byte(0x11));
        assert_eq!(memory.read(Long::new(0x01_8000)).unwrap(), Byte(0x22));
        assert_eq!(memory.read(Long::new(0x02_8000)).unwrap(), Byte(0x11));
        assert_eq!(memory.read(Long::new(0x81_8000)).unwrap(), Byte(0x22));
        assert!(matches!(
            memory.write(Long::new(0x00_8000), Byte(0)),
            Err(EmuError::NotWritable(_))
        ));
    }

    #[test]
    fn math_registers() {
        let (mut memory, _, _) = make_bus(&[]);
        memory.write(Long::new(0x4202), Byte(12)).unwrap();
        memory.write(Long::new(0x4203), Byte(11)).unwrap();
        let word = |memory: &mut CpuMemory, addr| {
            memory.read_word(Long::new(addr), Wrap::Bank).unwrap()
        };
        assert_eq!(word(&mut memory, 0x4216), Word(132));
        memory
            .write_word(Long::new(0x4204), Word(0x1234), Wrap::Bank)
            .unwrap();
        memory.write(Long::new(0x4206), Byte(0)).unwrap();
        assert_eq!(word(&mut memory, 0x4214), Word(0xffff));
        assert_eq!(word(&mut memory, 0x4216), Word(0x1234));
        memory.write(Long::new(0x4206), Byte(0x10)).unwrap();
        assert_eq!(word(&mut memory, 0x4214), Word(0x0123));
        assert_eq!(word(&mut memory, 0x4216), Word(0x0004));
    }

    #[test]
    fn rdnmi_clears_on_read() {
        let (mut memory, io, _) = make_bus(&[]);
        memory.write(Long::new(0x4200), Byte(0x80)).unwrap();
        assert!(io.nmi_enabled());
        io.set_nmi_flag(true);
        assert_eq!(memory.read(Long::new(0x4210)).unwrap(), Byte(0x82));
        assert_eq!(memory.read(Long::new(0x4210)).unwrap(), Byte(0x02));
        assert!(matches!(
            memory.write(Long::new(0x4210), Byte(0)),
            Err(EmuError::NotWritable(_))
        ));
    }

    #[test]
    fn apu_ports() {
        let (mut memory, _, ports) = make_bus(&[]);
        memory.write(Long::new(0x2141), Byte(0xcc)).unwrap();
        assert_eq!(ports.spc_read(1), 0xcc);
        ports.spc_write(2, 0xaa);
        assert_eq!(memory.read(Long::new(0x2142)).unwrap(), Byte(0xaa));
        assert_eq!(memory.read(Long::new(0x2146)).unwrap(), Byte(0xaa));
        assert_eq!(memory.read(Long::new(0x80_2142)).unwrap(), Byte(0xaa));
    }

    #[test]
    fn ppu_write_registers_are_write_only() {
        let (mut memory, _, _) = make_bus(&[]);
        memory.write(Long::new(0x2100), Byte(0x8f)).unwrap();
        assert!(matches!(
            memory.read(Long::new(0x2100)),
            Err(EmuError::NotReadable(_))
        ));
        assert_eq!(memory.read(Long::new(0x213f)).unwrap(), Byte(0));
    }
}

//===========================================================================//
