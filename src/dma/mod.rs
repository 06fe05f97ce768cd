//! The main CPU's DMA controller.  Eight channels, described entirely by
//! registers on the CPU bus, move bytes between the bus and the video and
//! audio registers at `$2100-$21FF`.  A general-purpose transfer stalls the
//! CPU until it completes; HDMA transfers happen once per scanline.

mod hdma;

pub use hdma::HdmaEngine;

use crate::bus::CpuMemory;
use crate::error::{EmuError, Result};
use crate::value::{Byte, Long, Word};
use log::{debug, trace};

//===========================================================================//

pub(crate) const MDMAEN: u32 = 0x420b;
pub(crate) const HDMAEN: u32 = 0x420c;

const REG_DMAP: u32 = 0x0;
const REG_BBAD: u32 = 0x1;
const REG_A1TL: u32 = 0x2;
const REG_A1TH: u32 = 0x3;
const REG_A1B: u32 = 0x4;
const REG_DASL: u32 = 0x5;
const REG_DASH: u32 = 0x6;
const REG_DASB: u32 = 0x7;
const REG_A2AL: u32 = 0x8;
const REG_A2AH: u32 = 0x9;
const REG_NLTR: u32 = 0xa;

const CONTROL_DIRECTION: u8 = 0b1000_0000;
const CONTROL_INDIRECT: u8 = 0b0100_0000;
const CONTROL_DECREMENT: u8 = 0b0001_0000;
const CONTROL_FIXED: u8 = 0b0000_1000;
const CONTROL_MODE: u8 = 0b0000_0111;

/// The number of DMA channels.
pub const NUM_CHANNELS: usize = 8;

const ENGINE_START_CYCLES: u32 = 3;
const CHANNEL_START_CYCLES: u32 = 1;

//===========================================================================//

fn channel_register(channel: usize, offset: u32) -> Long {
    Long::new(0x4300 | ((channel as u32) << 4) | offset)
}

/// Iterates over the channel numbers whose bits are set in `mask`, lowest
/// first.
pub(crate) fn channels(mask: u8) -> impl Iterator<Item = usize> {
    (0..NUM_CHANNELS).filter(move |&channel| mask & (1 << channel) != 0)
}

/// Reads an enable register without side effects, treating a bus that
/// lacks it as having every channel disabled.
pub(crate) fn enable_mask(memory: &CpuMemory, register: u32) -> u8 {
    memory.inspect(Long::new(register)).map_or(0, |byte| byte.0)
}

pub(crate) fn set_enable_bit(
    memory: &mut CpuMemory,
    register: u32,
    channel: usize,
    enabled: bool,
) -> Result<()> {
    let address = Long::new(register);
    let mask = memory.inspect(address)?;
    let bit = Byte(1 << channel);
    let mask = if enabled { mask | bit } else { mask & !bit };
    memory.write(address, mask)
}

//===========================================================================//

/// A snapshot of one channel's registers at `$43n0-$43nA`.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct DmaChannel {
    /// DMAP: direction, HDMA indirection, address step, and transfer mode.
    pub control: Byte,
    /// BBAD: the low byte of the `$21xx` register the channel talks to.
    pub register: Byte,
    /// A1B:A1T: the bus address (for HDMA, the start of the table).
    pub address: Long,
    /// DAS: the remaining byte count (for HDMA, the indirect address).
    pub size: Word,
    /// DASB: the bank of HDMA indirect addresses.
    pub indirect_bank: Byte,
    /// A2A: the current HDMA table address within the table's bank.
    pub table: Word,
    /// NLTR: the HDMA line counter, with the repeat flag in bit 7.
    pub line_counter: Byte,
}

impl DmaChannel {
    /// Reads channel `index`'s registers without side effects.
    pub fn load(memory: &CpuMemory, index: usize) -> Result<DmaChannel> {
        let reg = |offset| memory.inspect(channel_register(index, offset));
        Ok(DmaChannel {
            control: reg(REG_DMAP)?,
            register: reg(REG_BBAD)?,
            address: Long::from_parts(
                Word::new(reg(REG_A1TL)?, reg(REG_A1TH)?),
                reg(REG_A1B)?,
            ),
            size: Word::new(reg(REG_DASL)?, reg(REG_DASH)?),
            indirect_bank: reg(REG_DASB)?,
            table: Word::new(reg(REG_A2AL)?, reg(REG_A2AH)?),
            line_counter: reg(REG_NLTR)?,
        })
    }

    /// Writes this snapshot back to channel `index`'s registers.
    pub fn store(&self, memory: &mut CpuMemory, index: usize) -> Result<()> {
        let writes = [
            (REG_DMAP, self.control),
            (REG_BBAD, self.register),
            (REG_A1TL, self.address.word().low()),
            (REG_A1TH, self.address.word().high()),
            (REG_A1B, self.address.bank()),
            (REG_DASL, self.size.low()),
            (REG_DASH, self.size.high()),
            (REG_DASB, self.indirect_bank),
            (REG_A2AL, self.table.low()),
            (REG_A2AH, self.table.high()),
            (REG_NLTR, self.line_counter),
        ];
        for (offset, value) in writes {
            memory.write(channel_register(index, offset), value)?;
        }
        Ok(())
    }

    /// Returns the transfer mode, which picks the register pattern.
    pub fn mode(&self) -> u8 {
        self.control.0 & CONTROL_MODE
    }

    /// Returns true if bytes flow from the `$21xx` registers to the bus.
    pub fn from_register(&self) -> bool {
        self.control.0 & CONTROL_DIRECTION != 0
    }

    /// Returns true if HDMA reads its data through indirect addresses.
    pub fn indirect(&self) -> bool {
        self.control.0 & CONTROL_INDIRECT != 0
    }

    /// Returns the bus address of the `$21xx` register at `offset` in the
    /// channel's register pattern.
    pub fn register_address(&self, offset: u8) -> Long {
        Long::new(0x2100 | u32::from(self.register.0.wrapping_add(offset)))
    }

    /// Returns the HDMA indirect address.
    pub fn indirect_address(&self) -> Long {
        Long::from_parts(self.size, self.indirect_bank)
    }

    fn step_address(&mut self) {
        let control = self.control.0;
        if control & CONTROL_FIXED == 0 {
            let word = self.address.word();
            let word = if control & CONTROL_DECREMENT != 0 {
                word.wrapping_sub(1)
            } else {
                word.wrapping_add(1)
            };
            self.address = self.address.with_word(word);
        }
    }
}

//===========================================================================//

/// The general-purpose DMA engine.  Channels armed in MDMAEN (`$420B`) run
/// one at a time, lowest-numbered first, each to completion.
#[derive(Debug, Default)]
pub struct DmaEngine {
    running: bool,
    current: Option<usize>,
}

impl DmaEngine {
    /// Returns true if any channel is armed.
    pub fn is_pending(&self, memory: &CpuMemory) -> bool {
        enable_mask(memory, MDMAEN) != 0
    }

    /// Moves one unit (one or two bytes) for the lowest-numbered armed
    /// channel, returning the CPU cycles it took.  A channel whose byte
    /// count runs out is disarmed.
    pub fn step(&mut self, memory: &mut CpuMemory) -> Result<u32> {
        let Some(index) = channels(enable_mask(memory, MDMAEN)).next() else {
            self.running = false;
            self.current = None;
            return Ok(0);
        };
        let mut cycles = 0;
        if !self.running {
            self.running = true;
            cycles += ENGINE_START_CYCLES;
        }
        let mut channel = DmaChannel::load(memory, index)?;
        if self.current != Some(index) {
            self.current = Some(index);
            cycles += CHANNEL_START_CYCLES;
            let bytes = match channel.size.0 {
                0 => 0x10000,
                size => u32::from(size),
            };
            debug!(
                "DMA channel {index} started: ${} {} $21{:02X}, {bytes} bytes",
                channel.address,
                if channel.from_register() { "<-" } else { "->" },
                channel.register.0,
            );
        }
        // A size of zero means 65536 bytes, so anything but one leaves room
        // for a two-byte unit.
        let count: u8 = match channel.mode() {
            0 => 1,
            1 if channel.size != Word(1) => 2,
            1 => 1,
            mode => {
                return Err(EmuError::not_implemented(format!(
                    "DMA transfer mode {mode}"
                )));
            }
        };
        for offset in 0..count {
            let register = channel.register_address(offset);
            let (source, destination) = if channel.from_register() {
                (register, channel.address)
            } else {
                (channel.address, register)
            };
            let byte = memory.read(source)?;
            memory.write(destination, byte)?;
            trace!("DMA channel {index}: ${source} -> ${destination}: {byte}");
            channel.step_address();
        }
        channel.size = channel.size.wrapping_sub(u16::from(count));
        cycles += u32::from(count);
        channel.store(memory, index)?;
        if channel.size == Word(0) {
            set_enable_bit(memory, MDMAEN, index, false)?;
            debug!("DMA channel {index} finished");
            self.current = None;
            if enable_mask(memory, MDMAEN) == 0 {
                self.running = false;
            }
        }
        Ok(cycles)
    }
}

//===========================================================================//

#[cfg(test)]
mod tests {
    use super::{DmaChannel, DmaEngine, MDMAEN, channels};
    use crate::bus::{CpuMemory, Register, RegisterKind};
    use crate::value::{Byte, Long, Word};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn make_bus(written: &Rc<RefCell<Vec<u8>>>) -> CpuMemory {
        let mut memory = CpuMemory::new("test");
        memory.create_ram(Long::new(0x0000), 0x2000, Byte::ZERO).unwrap();
        let sink = written.clone();
        memory
            .create_register(
                Long::new(0x2118),
                Register::new("VMDATAL", RegisterKind::Write, Byte::ZERO)
                    .on_write(move |_, new| sink.borrow_mut().push(new.0)),
            )
            .unwrap();
        let sink = written.clone();
        memory
            .create_register(
                Long::new(0x2119),
                Register::new("VMDATAH", RegisterKind::Write, Byte::ZERO)
                    .on_write(move |_, new| sink.borrow_mut().push(!new.0)),
            )
            .unwrap();
        memory.create_ram(Long::new(0x4200), 0x200, Byte::ZERO).unwrap();
        memory.finalize();
        memory
    }

    #[test]
    fn channel_iteration() {
        assert_eq!(channels(0b1010_0001).collect::<Vec<_>>(), vec![0, 5, 7]);
    }

    #[test]
    fn word_mode_alternates_registers() {
        let written = Rc::new(RefCell::new(Vec::new()));
        let mut memory = make_bus(&written);
        for (offset, byte) in [0x11, 0x22, 0x33].into_iter().enumerate() {
            let address = Long::new(0x100 + offset as u32);
            memory.write(address, Byte(byte)).unwrap();
        }
        let channel = DmaChannel {
            control: Byte(0x01),
            register: Byte(0x18),
            address: Long::new(0x100),
            size: Word(3),
            ..DmaChannel::default()
        };
        channel.store(&mut memory, 2).unwrap();
        memory.write(Long::new(MDMAEN), Byte(0x04)).unwrap();
        let mut engine = DmaEngine::default();
        // Engine start, channel start, and two bytes.
        assert_eq!(engine.step(&mut memory).unwrap(), 6);
        // The last byte goes to the first register of the pattern.
        assert_eq!(engine.step(&mut memory).unwrap(), 1);
        assert!(!engine.is_pending(&memory));
        assert_eq!(*written.borrow(), vec![0x11, !0x22, 0x33]);
        let channel = DmaChannel::load(&memory, 2).unwrap();
        assert_eq!(channel.address, Long::new(0x103));
        assert_eq!(channel.size, Word(0));
    }

    #[test]
    fn unsupported_mode_is_not_implemented() {
        let written = Rc::new(RefCell::new(Vec::new()));
        let mut memory = make_bus(&written);
        let channel = DmaChannel {
            control: Byte(0x04),
            register: Byte(0x18),
            size: Word(4),
            ..DmaChannel::default()
        };
        channel.store(&mut memory, 0).unwrap();
        memory.write(Long::new(MDMAEN), Byte(0x01)).unwrap();
        let mut engine = DmaEngine::default();
        assert!(matches!(
            engine.step(&mut memory),
            Err(crate::error::EmuError::NotImplemented(_))
        ));
    }
}

//===========================================================================//
