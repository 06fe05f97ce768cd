//! The WDC 65C816, the main CPU.

mod modes;
mod ops;
mod state;
mod table;

pub use modes::{CpuMode, OperandLocation};
pub use state::CpuState;

use self::state::{PROC_FLAG_D, PROC_FLAG_I, PROC_FLAG_X, REG_X, REG_Y};
use super::{Conditions, Core, Instruction, OpcodeTable, OperandBytes};
use super::{Processor, register_value};
use crate::bus::{CpuMemory, Trap, Wrap};
use crate::dma::{DmaEngine, HdmaEngine};
use crate::error::{EmuError, Result};
use crate::value::{Byte, Long, Word};
use log::{Level, debug, log_enabled, trace};

//===========================================================================//

pub(crate) const VECTOR_COP_NATIVE: u16 = 0xffe4;
pub(crate) const VECTOR_BRK_NATIVE: u16 = 0xffe6;
pub(crate) const VECTOR_NMI_NATIVE: u16 = 0xffea;
pub(crate) const VECTOR_COP_EMULATION: u16 = 0xfff4;
pub(crate) const VECTOR_NMI_EMULATION: u16 = 0xfffa;
pub(crate) const VECTOR_RESET: u16 = 0xfffc;
pub(crate) const VECTOR_BRK_EMULATION: u16 = 0xfffe;

const REGISTER_NAMES: &[&str] = &["A", "X", "Y", "S", "D", "B", "K", "P", "E"];

//===========================================================================//

/// The part of the CPU that instructions execute against: the register
/// file and the bus.
pub struct CpuCore {
    /// The register file.
    pub state: CpuState,
    /// The CPU's 24-bit bus.
    pub memory: CpuMemory,
    conditions: Conditions,
}

impl CpuCore {
    /// Creates a core in the power-on state over the given bus.
    pub fn new(memory: CpuMemory) -> CpuCore {
        CpuCore {
            state: CpuState::default(),
            memory,
            conditions: Conditions::default(),
        }
    }

    /// Reads an operand, one or two bytes wide.
    pub(crate) fn read_operand(
        &mut self,
        location: OperandLocation,
        wide: bool,
    ) -> Result<Word> {
        match location {
            OperandLocation::Accumulator if wide => Ok(self.state.reg_a),
            OperandLocation::Accumulator => {
                Ok(Word::from_byte(self.state.reg_a.low()))
            }
            OperandLocation::Immediate(value) => Ok(value),
            OperandLocation::Memory { address, wrap } if wide => {
                self.memory.read_word(address, wrap)
            }
            OperandLocation::Memory { address, .. } => {
                Ok(Word::from_byte(self.memory.read(address)?))
            }
            other => Err(EmuError::not_implemented(format!(
                "reading an operand from {other:?}"
            ))),
        }
    }

    /// Writes an operand, one or two bytes wide.
    pub(crate) fn write_operand(
        &mut self,
        location: OperandLocation,
        value: Word,
        wide: bool,
    ) -> Result<()> {
        match location {
            OperandLocation::Accumulator if wide => {
                self.state.reg_a = value;
                Ok(())
            }
            OperandLocation::Accumulator => {
                self.state.reg_a = self.state.reg_a.with_low(value.low());
                Ok(())
            }
            OperandLocation::Memory { address, wrap } if wide => {
                self.memory.write_word(address, value, wrap)
            }
            OperandLocation::Memory { address, .. } => {
                self.memory.write(address, value.low())
            }
            other => Err(EmuError::not_implemented(format!(
                "writing an operand to {other:?}"
            ))),
        }
    }

    fn stack_address(&self) -> Long {
        Long::from_parts(self.state.reg_s, Byte::ZERO)
    }

    pub(crate) fn push_byte(&mut self, value: Byte) -> Result<()> {
        self.memory.write(self.stack_address(), value)?;
        self.state.reg_s = self.state.reg_s.wrapping_sub(1);
        self.state.force_registers();
        Ok(())
    }

    pub(crate) fn pull_byte(&mut self) -> Result<Byte> {
        self.state.reg_s = self.state.reg_s.wrapping_add(1);
        self.state.force_registers();
        self.memory.read(self.stack_address())
    }

    pub(crate) fn push_word(&mut self, value: Word) -> Result<()> {
        self.push_byte(value.high())?;
        self.push_byte(value.low())
    }

    pub(crate) fn pull_word(&mut self) -> Result<Word> {
        let low = self.pull_byte()?;
        let high = self.pull_byte()?;
        Ok(Word::new(low, high))
    }

    /// Enters an interrupt handler: pushes the return state and jumps
    /// through the native or emulation vector.  `software` is set for BRK
    /// and COP, which set the break bit of the status byte pushed in
    /// emulation mode.
    pub(crate) fn interrupt(
        &mut self,
        native: u16,
        emulation: u16,
        software: bool,
    ) -> Result<()> {
        let emulated = self.state.emulation();
        if !emulated {
            self.push_byte(self.state.pbr)?;
        }
        self.push_word(self.state.pc)?;
        let mut status = self.state.reg_p();
        if emulated {
            status = if software {
                status | Byte(PROC_FLAG_X)
            } else {
                status & !Byte(PROC_FLAG_X)
            };
        }
        self.push_byte(status)?;
        self.state.set_flag(PROC_FLAG_I, true);
        self.state.set_flag(PROC_FLAG_D, false);
        self.state.pbr = Byte::ZERO;
        let vector = if emulated { emulation } else { native };
        self.state.pc = self
            .memory
            .read_word(Long::new(u32::from(vector)), Wrap::Bank)?;
        Ok(())
    }
}

impl Core for CpuCore {
    type Location = OperandLocation;

    fn begin_instruction(&mut self) {
        self.conditions = Conditions {
            wide_accumulator: self.state.wide_accumulator(),
            wide_index: self.state.wide_index(),
            native: !self.state.emulation(),
            direct_page_unaligned: self.state.reg_d.low() != Byte::ZERO,
            ..Conditions::default()
        };
    }

    fn conditions(&self) -> &Conditions {
        &self.conditions
    }

    fn conditions_mut(&mut self) -> &mut Conditions {
        &mut self.conditions
    }

    fn fetch_operand(&mut self, len: u8) -> Result<OperandBytes> {
        let mut bytes = [0u8; 3];
        let len = usize::from(len).min(bytes.len());
        for byte in bytes.iter_mut().take(len) {
            *byte = self.memory.apply(self.state.pc_long())?.0;
            self.state.pc = self.state.pc.wrapping_add(1);
        }
        Ok(OperandBytes::new(&bytes[..len]))
    }

    fn peek_operand(&self, address: u32, len: u8) -> Result<OperandBytes> {
        let mut bytes = [0u8; 3];
        let len = usize::from(len).min(bytes.len());
        let mut address = Long::new(address);
        for byte in bytes.iter_mut().take(len) {
            address = CpuMemory::next_address(address, Wrap::Bank);
            *byte = self.memory.inspect(address)?.0;
        }
        Ok(OperandBytes::new(&bytes[..len]))
    }
}

//===========================================================================//

struct CpuTables {
    base: OpcodeTable<CpuCore>,
    wide_accumulator: OpcodeTable<CpuCore>,
    wide_index: OpcodeTable<CpuCore>,
}

impl CpuTables {
    fn new() -> CpuTables {
        CpuTables {
            base: table::base_table(),
            wide_accumulator: table::wide_accumulator_table(),
            wide_index: table::wide_index_table(),
        }
    }

    /// Picks the entry for `opcode` under the current register widths,
    /// falling back to the base table when no override applies.
    fn get(
        &self,
        state: &CpuState,
        opcode: u8,
    ) -> Result<&dyn Instruction<CpuCore>> {
        let wide_accumulator = state
            .wide_accumulator()
            .then(|| self.wide_accumulator.get(opcode))
            .flatten();
        let wide_index = || {
            state.wide_index().then(|| self.wide_index.get(opcode)).flatten()
        };
        wide_accumulator
            .or_else(wide_index)
            .or_else(|| self.base.get(opcode))
            .ok_or_else(|| {
                EmuError::not_implemented(format!("opcode ${opcode:02X}"))
            })
    }
}

//===========================================================================//

/// A simulated 65C816 together with its DMA engines.
pub struct Cpu {
    core: CpuCore,
    tables: CpuTables,
    dma: DmaEngine,
    hdma: HdmaEngine,
}

impl Cpu {
    /// Creates a CPU in the power-on state over the given bus.  Call
    /// [Processor::reset] to load the reset vector.
    pub fn new(memory: CpuMemory) -> Cpu {
        Cpu {
            core: CpuCore::new(memory),
            tables: CpuTables::new(),
            dma: DmaEngine::default(),
            hdma: HdmaEngine::default(),
        }
    }

    /// Returns the register file.
    pub fn state(&self) -> &CpuState {
        &self.core.state
    }

    /// Returns the register file for modification.
    pub fn state_mut(&mut self) -> &mut CpuState {
        &mut self.core.state
    }

    /// Returns the CPU's bus.
    pub fn memory(&self) -> &CpuMemory {
        &self.core.memory
    }

    /// Returns the CPU's bus for modification.
    pub fn memory_mut(&mut self) -> &mut CpuMemory {
        &mut self.core.memory
    }

    /// Returns the instruction that `opcode` currently decodes to, given
    /// the register widths.
    pub fn instruction(
        &self,
        opcode: u8,
    ) -> Result<&dyn Instruction<CpuCore>> {
        self.tables.get(&self.core.state, opcode)
    }

    /// Returns the opcode listing for one of the three tables: the base
    /// table, or the 16-bit accumulator or 16-bit index overrides.
    pub fn opcode_listing(&self) -> Vec<String> {
        let tables = [
            &self.tables.base,
            &self.tables.wide_accumulator,
            &self.tables.wide_index,
        ];
        tables
            .into_iter()
            .flat_map(OpcodeTable::iter)
            .map(|instruction| instruction.opcode_to_string())
            .collect()
    }

    /// Returns true if a general-purpose DMA transfer will preempt the next
    /// step.
    pub fn dma_pending(&self) -> bool {
        self.dma.is_pending(&self.core.memory)
    }

    /// Delivers a non-maskable interrupt, returning the cycles it took.
    pub fn nmi(&mut self) -> Result<u32> {
        let native = !self.core.state.emulation();
        debug!("NMI at ${}", self.core.state.pc_long());
        self.core.state.waiting = false;
        self.core.interrupt(VECTOR_NMI_NATIVE, VECTOR_NMI_EMULATION, false)?;
        Ok(if native { 8 } else { 7 })
    }

    /// Starts the HDMA channels for a new frame, returning the cycles the
    /// CPU is stalled for.
    pub fn hdma_init(&mut self) -> Result<u32> {
        self.hdma.init(&mut self.core.memory)
    }

    /// Runs the HDMA channels for one scanline, returning the cycles the
    /// CPU is stalled for.
    pub fn hdma_line(&mut self) -> Result<u32> {
        self.hdma.run_line(&mut self.core.memory)
    }
}

impl Processor for Cpu {
    fn description(&self) -> String {
        "WDC 65C816".to_string()
    }

    fn disassemble(&self, addr: u32) -> Result<(usize, String)> {
        let address = Long::new(addr);
        let opcode = self.core.memory.inspect(address)?.0;
        let instruction = self.instruction(opcode)?;
        let text = instruction.disassemble(&self.core, address.value());
        Ok((usize::from(instruction.size()), text))
    }

    fn pc(&self) -> u32 {
        self.core.state.pc_long().value()
    }

    fn set_pc(&mut self, addr: u32) {
        let address = Long::new(addr);
        self.core.state.pbr = address.bank();
        self.core.state.pc = address.word();
    }

    fn register_names(&self) -> &'static [&'static str] {
        REGISTER_NAMES
    }

    fn get_register(&self, name: &str) -> Option<u32> {
        let state = &self.core.state;
        let value = match name {
            "A" => u32::from(state.reg_a.0),
            "X" => u32::from(state.reg_x.0),
            "Y" => u32::from(state.reg_y.0),
            "S" => u32::from(state.reg_s.0),
            "D" => u32::from(state.reg_d.0),
            "B" => u32::from(state.dbr.0),
            "K" => u32::from(state.pbr.0),
            "P" => u32::from(state.reg_p().0),
            "E" => u32::from(state.emulation()),
            _ => return None,
        };
        Some(value)
    }

    fn set_register_debug(&mut self, name: char, value: u32) -> Result<()> {
        let name = name.to_ascii_uppercase();
        let state = &mut self.core.state;
        let word = || register_value(name, value).map(Word);
        let byte = || register_value(name, value).map(Byte);
        match name {
            'A' => state.reg_a = word()?,
            'X' => state.set_register(REG_X, word()?),
            'Y' => state.set_register(REG_Y, word()?),
            'S' => {
                state.reg_s = word()?;
                state.force_registers();
            }
            'D' => state.reg_d = word()?,
            'B' => state.dbr = byte()?,
            'K' => state.pbr = byte()?,
            'P' => state.set_reg_p(byte()?),
            'E' => match value {
                0 | 1 => state.set_emulation(value != 0),
                _ => return Err(EmuError::RegisterOverflow { name, value }),
            },
            _ => return Err(EmuError::UnknownRegister(name)),
        }
        Ok(())
    }

    fn write_byte(&mut self, addr: u32, value: u8) -> Result<()> {
        self.core.memory.write(CpuMemory::address(addr)?, Byte(value))
    }

    fn set_trap(&mut self, addr: u32, trap: Trap) -> Result<()> {
        self.core.memory.set_trap(CpuMemory::address(addr)?, trap)
    }

    fn remove_trap(&mut self, addr: u32) -> Result<()> {
        self.core.memory.remove_trap(CpuMemory::address(addr)?)
    }

    fn application_count(&self, addr: u32) -> u64 {
        CpuMemory::address(addr)
            .map_or(0, |addr| self.core.memory.application_count(addr))
    }

    fn step(&mut self) -> Result<u32> {
        if self.dma.is_pending(&self.core.memory) {
            return self.dma.step(&mut self.core.memory);
        }
        if self.core.state.waiting {
            return Ok(1);
        }
        let address = self.core.state.pc_long();
        let opcode = self.core.memory.apply(address)?.0;
        self.core.state.pc = self.core.state.pc.wrapping_add(1);
        let instruction = self.tables.get(&self.core.state, opcode)?;
        if log_enabled!(Level::Trace) {
            let text = instruction.disassemble(&self.core, address.value());
            trace!("${address}: {text}");
        }
        instruction.execute(&mut self.core)
    }

    fn reset(&mut self) -> Result<()> {
        self.core.memory.reset_all();
        self.core.state = CpuState::default();
        self.dma = DmaEngine::default();
        self.hdma = HdmaEngine::default();
        let vector = Long::new(u32::from(VECTOR_RESET));
        self.core.state.pc = self.core.memory.read_word(vector, Wrap::Bank)?;
        debug!("CPU reset to ${}", self.core.state.pc_long());
        Ok(())
    }
}

//===========================================================================//


//===========================================================================//
