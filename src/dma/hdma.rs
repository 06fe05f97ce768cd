use super::{
    DmaChannel, HDMAEN, MDMAEN, NUM_CHANNELS, channels, enable_mask,
    set_enable_bit,
};
use crate::bus::CpuMemory;
use crate::error::{EmuError, Result};
use crate::value::{Byte, Long, Word};
use log::{debug, trace};

//===========================================================================//

const LINE_OVERHEAD_CYCLES: u32 = 2;
const CHANNEL_CYCLES: u32 = 1;
const INDIRECT_LOAD_CYCLES: u32 = 2;
const LINE_COUNT_MASK: u8 = 0x7f;
const LINE_REPEAT: u8 = 0x80;

//===========================================================================//

/// The scanline DMA engine.  Channels armed in HDMAEN (`$420C`) walk a
/// table of line counts and data, writing one unit to their register on
/// each scanline that calls for it.
#[derive(Debug, Default)]
pub struct HdmaEngine {
    do_transfer: [bool; NUM_CHANNELS],
    finished: u8,
}

impl HdmaEngine {
    /// Returns true if the channel has reached the end of its table for
    /// this frame.
    pub fn is_finished(&self, channel: usize) -> bool {
        self.finished & (1 << channel) != 0
    }

    /// Starts every armed channel at the top of its table, returning the
    /// CPU cycles it took.
    pub fn init(&mut self, memory: &mut CpuMemory) -> Result<u32> {
        let enabled = enable_mask(memory, HDMAEN);
        self.finished = 0;
        if enabled == 0 {
            return Ok(0);
        }
        let mut cycles = LINE_OVERHEAD_CYCLES;
        for index in channels(enabled) {
            cycles += CHANNEL_CYCLES;
            set_enable_bit(memory, MDMAEN, index, false)?;
            let mut channel = load_channel(memory, index)?;
            channel.table = channel.address.word();
            cycles += self.next_entry(memory, &mut channel, index)?;
            channel.store(memory, index)?;
            debug!(
                "HDMA channel {index} started: table ${} -> $21{:02X}",
                channel.address, channel.register.0
            );
        }
        Ok(cycles)
    }

    /// Runs every armed channel for one scanline, returning the CPU cycles
    /// it took.
    pub fn run_line(&mut self, memory: &mut CpuMemory) -> Result<u32> {
        let enabled = enable_mask(memory, HDMAEN) & !self.finished;
        if enabled == 0 {
            return Ok(0);
        }
        let mut cycles = LINE_OVERHEAD_CYCLES;
        for index in channels(enabled) {
            cycles += CHANNEL_CYCLES;
            set_enable_bit(memory, MDMAEN, index, false)?;
            let mut channel = load_channel(memory, index)?;
            if self.do_transfer[index] {
                cycles += transfer_unit(memory, &mut channel, index)?;
            }
            channel.line_counter =
                Byte(channel.line_counter.0.wrapping_sub(1));
            self.do_transfer[index] =
                channel.line_counter.0 & LINE_REPEAT != 0;
            if channel.line_counter.0 & LINE_COUNT_MASK == 0 {
                cycles += self.next_entry(memory, &mut channel, index)?;
            }
            channel.store(memory, index)?;
        }
        Ok(cycles)
    }

    /// Reads the next line count (and indirect address) from the table and
    /// rearms the channel.  A line count of zero ends the channel's table.
    fn next_entry(
        &mut self,
        memory: &mut CpuMemory,
        channel: &mut DmaChannel,
        index: usize,
    ) -> Result<u32> {
        channel.line_counter = next_table_byte(memory, channel)?;
        self.do_transfer[index] = true;
        if channel.line_counter.0 == 0 {
            self.finished |= 1 << index;
            debug!("HDMA channel {index} finished");
            return Ok(0);
        }
        if !channel.indirect() {
            return Ok(0);
        }
        let low = next_table_byte(memory, channel)?;
        let high = next_table_byte(memory, channel)?;
        channel.size = Word::new(low, high);
        Ok(INDIRECT_LOAD_CYCLES)
    }
}

//===========================================================================//

fn load_channel(memory: &CpuMemory, index: usize) -> Result<DmaChannel> {
    let channel = DmaChannel::load(memory, index)?;
    if channel.from_register() {
        return Err(EmuError::not_implemented(
            "HDMA from the video registers to memory",
        ));
    }
    Ok(channel)
}

fn next_table_byte(
    memory: &mut CpuMemory,
    channel: &mut DmaChannel,
) -> Result<Byte> {
    let address = Long::from_parts(channel.table, channel.address.bank());
    channel.table = channel.table.wrapping_add(1);
    memory.read(address)
}

fn next_data_byte(
    memory: &mut CpuMemory,
    channel: &mut DmaChannel,
) -> Result<Byte> {
    if channel.indirect() {
        let address = channel.indirect_address();
        channel.size = channel.size.wrapping_add(1);
        memory.read(address)
    } else {
        next_table_byte(memory, channel)
    }
}

/// Writes one unit of the channel's register pattern, returning the number
/// of bytes moved.
fn transfer_unit(
    memory: &mut CpuMemory,
    channel: &mut DmaChannel,
    index: usize,
) -> Result<u32> {
    let pattern: &[u8] = match channel.mode() {
        0 => &[0],
        1 => &[0, 1],
        2 => &[0, 0],
        3 => &[0, 0, 1, 1],
        mode => {
            return Err(EmuError::not_implemented(format!(
                "HDMA transfer mode {mode}"
            )));
        }
    };
    for &offset in pattern {
        let byte = next_data_byte(memory, channel)?;
        let register = channel.register_address(offset);
        memory.write(register, byte)?;
        trace!("HDMA channel {index}: ${register} = {byte}");
    }
    Ok(pattern.len() as u32)
}

//===========================================================================//

#[cfg(test)]
mod tests {
    use super::HdmaEngine;
    use crate::bus::{CpuMemory, Register, RegisterKind};
    use crate::dma::{DmaChannel, HDMAEN, MDMAEN};
    use crate::value::{Byte, Long};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn make_bus(table: &[u8]) -> (CpuMemory, Rc<RefCell<Vec<u8>>>) {
        let written = Rc::new(RefCell::new(Vec::new()));
        let mut memory = CpuMemory::new("test");
        memory.create_ram(Long::new(0x0000), 0x2000, Byte::ZERO).unwrap();
        let sink = written.clone();
        memory
            .create_register(
                Long::new(0x2132),
                Register::new("COLDATA", RegisterKind::Write, Byte::ZERO)
                    .on_write(move |_, new| sink.borrow_mut().push(new.0)),
            )
            .unwrap();
        memory.create_ram(Long::new(0x4200), 0x200, Byte::ZERO).unwrap();
        memory.finalize();
        for (offset, &byte) in table.iter().enumerate() {
            memory
                .write(Long::new(0x0400 + offset as u32), Byte(byte))
                .unwrap();
        }
        let channel = DmaChannel {
            register: Byte(0x32),
            address: Long::new(0x0400),
            ..DmaChannel::default()
        };
        channel.store(&mut memory, 0).unwrap();
        memory.write(Long::new(HDMAEN), Byte(0x01)).unwrap();
        (memory, written)
    }

    #[test]
    fn repeat_transfers_every_line() {
        let (mut memory, written) =
            make_bus(&[0x83, 0x10, 0x20, 0x30, 0x01, 0x40, 0x00]);
        let mut engine = HdmaEngine::default();
        engine.init(&mut memory).unwrap();
        for _ in 0..4 {
            engine.run_line(&mut memory).unwrap();
        }
        assert_eq!(*written.borrow(), vec![0x10, 0x20, 0x30, 0x40]);
        assert!(engine.is_finished(0));
        engine.run_line(&mut memory).unwrap();
        assert_eq!(written.borrow().len(), 4);
    }

    #[test]
    fn plain_entry_holds_for_its_line_count() {
        let (mut memory, written) = make_bus(&[0x03, 0x10, 0x01, 0x20, 0x00]);
        let mut engine = HdmaEngine::default();
        engine.init(&mut memory).unwrap();
        for _ in 0..3 {
            engine.run_line(&mut memory).unwrap();
        }
        assert_eq!(*written.borrow(), vec![0x10]);
        // The fourth line starts the next entry.
        engine.run_line(&mut memory).unwrap();
        assert_eq!(*written.borrow(), vec![0x10, 0x20]);
    }

    #[test]
    fn hdma_disarms_general_dma() {
        let (mut memory, _) = make_bus(&[0x01, 0x10, 0x00]);
        memory.write(Long::new(MDMAEN), Byte(0x03)).unwrap();
        let mut engine = HdmaEngine::default();
        // Overhead, one channel, no indirect load.
        assert_eq!(engine.init(&mut memory).unwrap(), 3);
        assert_eq!(memory.read(Long::new(MDMAEN)).unwrap(), Byte(0x02));
        // Overhead, one channel, one byte.
        assert_eq!(engine.run_line(&mut memory).unwrap(), 4);
    }

    #[test]
    fn indirect_table() {
        let (mut memory, written) = make_bus(&[0x82, 0x00, 0x05, 0x00]);
        memory.write(Long::new(0x0500), Byte(0xaa)).unwrap();
        memory.write(Long::new(0x0501), Byte(0xbb)).unwrap();
        let mut channel = DmaChannel::load(&memory, 0).unwrap();
        channel.control = Byte(0x40);
        channel.store(&mut memory, 0).unwrap();
        let mut engine = HdmaEngine::default();
        assert_eq!(engine.init(&mut memory).unwrap(), 5);
        engine.run_line(&mut memory).unwrap();
        engine.run_line(&mut memory).unwrap();
        assert_eq!(*written.borrow(), vec![0xaa, 0xbb]);
        assert!(engine.is_finished(0));
    }
}

//===========================================================================//
