use super::{ApuPorts, Register, RegisterKind, SpcMemory};
use crate::error::Result;
use crate::value::{Byte, Word};
use log::debug;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

//===========================================================================//

const SSMP_BOOT_ROM: [u8; 64] = [
    0xCD, 0xEF, 0xBD, 0xE8, 0x00, 0xC6, 0x1D, 0xD0, 0xFC, 0x8F, 0xAA, 0xF4,
    0x8F, 0xBB, 0xF5, 0x78, 0xCC, 0xF4, 0xD0, 0xFB, 0x2F, 0x19, 0xEB, 0xF4,
    0xD0, 0xFC, 0x7E, 0xF4, 0xD0, 0x0B, 0xE4, 0xF5, 0xCB, 0xF4, 0xD7, 0x00,
    0xFC, 0xD0, 0xF3, 0xAB, 0x01, 0x10, 0xEF, 0x7E, 0xF4, 0x10, 0xEB, 0xBA,
    0xF6, 0xDA, 0x00, 0xBA, 0xF4, 0xC4, 0xF4, 0xDD, 0x5D, 0xD0, 0xDB, 0x1F,
    0x00, 0x00, 0xC0, 0xFF,
];

const BOOT_ROM_START: u16 = 0xffc0;
const RAM_FILL: Byte = Byte(0x55);

const CONTROL_FLAG_ENABLE_BOOT_ROM: u8 = 0b1000_0000;
const CONTROL_FLAG_CLEAR_CPUI23: u8 = 0b0010_0000;
const CONTROL_FLAG_CLEAR_CPUI01: u8 = 0b0001_0000;
const CONTROL_TIMER_MASK: u8 = 0b0000_0111;

const INITIAL_CONTROL_FLAGS: u8 = CONTROL_FLAG_ENABLE_BOOT_ROM
    | CONTROL_FLAG_CLEAR_CPUI23
    | CONTROL_FLAG_CLEAR_CPUI01;

const DSP_REGISTER_COUNT: usize = 0x80;

/// Coprocessor cycles per tick of timers 0 and 1 (8 kHz).
const SLOW_TIMER_PERIOD: u32 = 128;
/// Coprocessor cycles per tick of timer 2 (64 kHz).
const FAST_TIMER_PERIOD: u32 = 16;

//===========================================================================//

#[derive(Debug)]
struct Timer {
    period: u32,
    target: Cell<u8>,
    stage: Cell<u32>,
    internal: Cell<u16>,
    counter: Cell<u8>,
}

impl Timer {
    fn new(period: u32) -> Timer {
        Timer {
            period,
            target: Cell::new(0),
            stage: Cell::new(0),
            internal: Cell::new(0),
            counter: Cell::new(0),
        }
    }

    fn restart(&self) {
        self.internal.set(0);
        self.counter.set(0);
    }

    fn advance(&self, cycles: u32, enabled: bool) {
        let mut stage = self.stage.get() + cycles;
        while stage >= self.period {
            stage -= self.period;
            if !enabled {
                continue;
            }
            // A target of zero divides by 256.
            let target = match self.target.get() {
                0 => 0x100,
                target => u16::from(target),
            };
            let internal = self.internal.get() + 1;
            if internal >= target {
                self.internal.set(0);
                self.counter.set((self.counter.get() + 1) & 0x0f);
            } else {
                self.internal.set(internal);
            }
        }
        self.stage.set(stage);
    }
}

//===========================================================================//

/// State behind the coprocessor's I/O registers at $00F0-$00FF: the
/// control byte, the three timers, and the DSP register file.
#[derive(Debug)]
pub struct SpcIo {
    control: Cell<u8>,
    dsp_address: Cell<u8>,
    dsp: RefCell<[u8; DSP_REGISTER_COUNT]>,
    timers: [Timer; 3],
}

impl Default for SpcIo {
    fn default() -> SpcIo {
        SpcIo {
            control: Cell::new(INITIAL_CONTROL_FLAGS),
            dsp_address: Cell::new(0),
            dsp: RefCell::new([0; DSP_REGISTER_COUNT]),
            timers: [
                Timer::new(SLOW_TIMER_PERIOD),
                Timer::new(SLOW_TIMER_PERIOD),
                Timer::new(FAST_TIMER_PERIOD),
            ],
        }
    }
}

impl SpcIo {
    /// Returns true if the boot ROM is overlaid on $FFC0-$FFFF.
    pub fn boot_rom_enabled(&self) -> bool {
        (self.control.get() & CONTROL_FLAG_ENABLE_BOOT_ROM) != 0
    }

    /// Returns the value of one DSP register.
    pub fn dsp_register(&self, index: u8) -> u8 {
        self.dsp.borrow()[usize::from(index) % DSP_REGISTER_COUNT]
    }

    /// Returns the current 4-bit output of the given timer without clearing
    /// it.
    pub fn timer_output(&self, timer: usize) -> u8 {
        self.timers[timer % 3].counter.get()
    }

    fn take_timer_output(&self, timer: usize) -> u8 {
        self.timers[timer % 3].counter.replace(0)
    }

    /// Advances the timers by the given number of coprocessor cycles.
    pub fn tick(&self, cycles: u32) {
        let control = self.control.get();
        for (index, timer) in self.timers.iter().enumerate() {
            timer.advance(cycles, control & (1 << index) != 0);
        }
    }

    /// Restores power-on register state.
    pub fn reset(&self) {
        self.control.set(INITIAL_CONTROL_FLAGS);
        self.dsp_address.set(0);
        *self.dsp.borrow_mut() = [0; DSP_REGISTER_COUNT];
        for timer in self.timers.iter() {
            timer.target.set(0);
            timer.stage.set(0);
            timer.restart();
        }
    }

    fn write_control(&self, ports: &ApuPorts, value: u8) {
        let old = self.control.replace(value);
        let started = value & !old & CONTROL_TIMER_MASK;
        for (index, timer) in self.timers.iter().enumerate() {
            if started & (1 << index) != 0 {
                timer.restart();
            }
        }
        if value & CONTROL_FLAG_CLEAR_CPUI01 != 0 {
            ports.clear_spc_inputs(0..2);
        }
        if value & CONTROL_FLAG_CLEAR_CPUI23 != 0 {
            ports.clear_spc_inputs(2..4);
        }
        if (old ^ value) & CONTROL_FLAG_ENABLE_BOOT_ROM != 0 {
            debug!(
                "S-SMP boot ROM {}",
                if self.boot_rom_enabled() { "enabled" } else { "disabled" }
            );
        }
    }

    fn overlay(&self, offset: usize, latch: Byte) -> Byte {
        if self.boot_rom_enabled() {
            Byte(SSMP_BOOT_ROM[offset])
        } else {
            latch
        }
    }
}

//===========================================================================//

/// Maps RAM, the I/O registers, and the boot ROM overlay onto a fresh
/// coprocessor bus.
pub fn map_spc_bus(
    memory: &mut SpcMemory,
    io: &Rc<SpcIo>,
    ports: &Rc<ApuPorts>,
) -> Result<()> {
    memory.create_ram(Word(0x0000), 0x00f0, RAM_FILL)?;
    map_io_registers(memory, io, ports)?;
    let ram_len = u32::from(BOOT_ROM_START) - 0x0100;
    memory.create_ram(Word(0x0100), ram_len, RAM_FILL)?;
    for offset in 0..SSMP_BOOT_ROM.len() {
        let (reader, peeker) = (io.clone(), io.clone());
        let register = Register::new("IPL", RegisterKind::ReadWrite, RAM_FILL)
            .on_read(move |latch| reader.overlay(offset, latch))
            .on_peek(move |latch| peeker.overlay(offset, latch));
        memory.create_register(
            Word(BOOT_ROM_START + offset as u16),
            register,
        )?;
    }
    Ok(())
}

fn simple(name: &'static str, kind: RegisterKind) -> Register {
    Register::new(name, kind, Byte::ZERO)
}

fn map_io_registers(
    memory: &mut SpcMemory,
    io: &Rc<SpcIo>,
    ports: &Rc<ApuPorts>,
) -> Result<()> {
    memory
        .create_register(Word(0x00f0), simple("TEST", RegisterKind::Write))?;

    let (state, inboxes) = (io.clone(), ports.clone());
    let control = Register::new(
        "CONTROL",
        RegisterKind::Write,
        Byte(INITIAL_CONTROL_FLAGS),
    )
    .on_write(move |_, new| state.write_control(&inboxes, new.0));
    memory.create_register(Word(0x00f1), control)?;

    let state = io.clone();
    memory.create_register(
        Word(0x00f2),
        simple("DSPADDR", RegisterKind::ReadWrite)
            .on_write(move |_, new| state.dsp_address.set(new.0)),
    )?;

    let (reader, writer) = (io.clone(), io.clone());
    memory.create_register(
        Word(0x00f3),
        simple("DSPDATA", RegisterKind::ReadWrite)
            .on_read(move |_| {
                Byte(reader.dsp_register(reader.dsp_address.get()))
            })
            .on_write(move |_, new| {
                // Addresses $80-$FF are read-only mirrors.
                let address = usize::from(writer.dsp_address.get());
                if address < DSP_REGISTER_COUNT {
                    writer.dsp.borrow_mut()[address] = new.0;
                }
            }),
    )?;

    const PORT_NAMES: [&str; 4] = ["CPUIO0", "CPUIO1", "CPUIO2", "CPUIO3"];
    for (port, name) in PORT_NAMES.into_iter().enumerate() {
        let (reader, writer) = (ports.clone(), ports.clone());
        let register = simple(name, RegisterKind::ReadWrite)
            .on_read(move |_| Byte(reader.spc_read(port)))
            .on_write(move |_, new| writer.spc_write(port, new.0));
        memory.create_register(Word(0x00f4 + port as u16), register)?;
    }

    memory.create_read_write(Word(0x00f8), Byte::ZERO)?;
    memory.create_read_write(Word(0x00f9), Byte::ZERO)?;

    const TARGET_NAMES: [&str; 3] = ["T0TARGET", "T1TARGET", "T2TARGET"];
    const OUTPUT_NAMES: [&str; 3] = ["T0OUT", "T1OUT", "T2OUT"];
    for index in 0..3 {
        let state = io.clone();
        memory.create_register(
            Word(0x00fa + index as u16),
            simple(TARGET_NAMES[index], RegisterKind::Write).on_write(
                move |_, new| state.timers[index].target.set(new.0),
            ),
        )?;
        let (reader, peeker) = (io.clone(), io.clone());
        let output = simple(OUTPUT_NAMES[index], RegisterKind::Read)
            .on_read(move |_| Byte(reader.take_timer_output(index)))
            .on_peek(move |_| Byte(peeker.timer_output(index)));
        memory.create_register(Word(0x00fd + index as u16), output)?;
    }
    Ok(())
}

//===========================================================================//

#[cfg(test)]
mod tests {
    use super::{SSMP_BOOT_ROM, SpcIo, map_spc_bus};
    use crate::bus::{ApuPorts, SpcMemory, Wrap};
    use crate::error::EmuError;
    use crate::value::{Byte, Word};
    use std::rc::Rc;

    fn make_bus() -> (SpcMemory, Rc<SpcIo>, Rc<ApuPorts>) {
        let io = Rc::new(SpcIo::default());
        let ports = Rc::new(ApuPorts::default());
        let mut memory = SpcMemory::new("test");
        map_spc_bus(&mut memory, &io, &ports).unwrap();
        memory.finalize();
        (memory, io, ports)
    }

    #[test]
    fn ram_starts_filled() {
        let (mut memory, _, _) = make_bus();
        assert_eq!(memory.read(Word(0x0000)).unwrap(), Byte(0x55));
        assert_eq!(memory.read(Word(0x1234)).unwrap(), Byte(0x55));
        assert_eq!(memory.read(Word(0xffbf)).unwrap(), Byte(0x55));
    }

    #[test]
    fn boot_rom_overlay() {
        let (mut memory, _, _) = make_bus();
        assert_eq!(memory.apply(Word(0xffc0)).unwrap(), Byte(0xcd));
        assert_eq!(memory.inspect(Word(0xffc1)).unwrap(), Byte(0xef));
        memory.write(Word(0xffc0), Byte(0x12)).unwrap();
        assert_eq!(memory.read(Word(0xffc0)).unwrap(), Byte(0xcd));
        memory.write(Word(0x00f1), Byte(0x00)).unwrap();
        assert_eq!(memory.read(Word(0xffc0)).unwrap(), Byte(0x12));
        assert_eq!(memory.inspect(Word(0xffc1)).unwrap(), Byte(0x55));
        let vector = memory.read_word(Word(0xfffe), Wrap::Full).unwrap();
        assert_eq!(vector, Word(0x5555));
        assert_eq!(SSMP_BOOT_ROM[0x3e], 0xc0);
    }

    #[test]
    fn control_clears_ports() {
        let (mut memory, _, ports) = make_bus();
        for port in 0..4 {
            ports.cpu_write(port, 0x10 + port as u8);
        }
        assert_eq!(memory.read(Word(0x00f5)).unwrap(), Byte(0x11));
        memory.write(Word(0x00f1), Byte(0x10)).unwrap();
        assert_eq!(memory.read(Word(0x00f5)).unwrap(), Byte(0x00));
        assert_eq!(memory.read(Word(0x00f6)).unwrap(), Byte(0x12));
        memory.write(Word(0x00f7), Byte(0x99)).unwrap();
        assert_eq!(ports.cpu_read(3), 0x99);
    }

    #[test]
    fn dsp_register_file() {
        let (mut memory, io, _) = make_bus();
        memory.write(Word(0x00f2), Byte(0x4c)).unwrap();
        memory.write(Word(0x00f3), Byte(0x01)).unwrap();
        assert_eq!(io.dsp_register(0x4c), 0x01);
        memory.write(Word(0x00f2), Byte(0xcc)).unwrap();
        memory.write(Word(0x00f3), Byte(0x02)).unwrap();
        assert_eq!(memory.read(Word(0x00f3)).unwrap(), Byte(0x01));
    }

    #[test]
    fn timers_count_and_clear_on_read() {
        let (mut memory, io, _) = make_bus();
        memory.write(Word(0x00fc), Byte(4)).unwrap();
        memory.write(Word(0x00f1), Byte(0x04)).unwrap();
        io.tick(16 * 9);
        assert_eq!(memory.inspect(Word(0x00ff)).unwrap(), Byte(2));
        assert_eq!(memory.read(Word(0x00ff)).unwrap(), Byte(2));
        assert_eq!(memory.read(Word(0x00ff)).unwrap(), Byte(0));
        assert!(matches!(
            memory.write(Word(0x00fd), Byte(0)),
            Err(EmuError::NotWritable(_))
        ));
        io.tick(128 * 4);
        assert_eq!(io.timer_output(0), 0);
    }
}

//===========================================================================//
