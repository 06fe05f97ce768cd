//! The Sony SPC700, the sound coprocessor.

mod modes;
mod ops;
mod state;
mod table;

pub use modes::{SpcArg, SpcMode, SpcOperand, SpcOperands, SpcRegister};
pub use state::SpcState;

use self::state::PSW_FLAG_C;
use super::{Conditions, Core, Instruction, OpcodeTable, OperandBytes};
use super::{Processor, register_value};
use crate::bus::{SpcIo, SpcMemory, Trap, Wrap};
use crate::error::{EmuError, Result};
use crate::value::{Byte, Word};
use log::{Level, debug, log_enabled, trace};
use std::rc::Rc;

//===========================================================================//

const VECTOR_RESET: u16 = 0xfffe;

const REGISTER_NAMES: &[&str] = &["A", "X", "Y", "S", "P"];

//===========================================================================//

/// The part of the SPC700 that instructions execute against: the register
/// file and the bus.
pub struct SpcCore {
    /// The register file.
    pub state: SpcState,
    /// The coprocessor's 16-bit bus.
    pub memory: SpcMemory,
    conditions: Conditions,
}

impl SpcCore {
    /// Creates a core in the power-on state over the given bus.
    pub fn new(memory: SpcMemory) -> SpcCore {
        SpcCore {
            state: SpcState::default(),
            memory,
            conditions: Conditions::default(),
        }
    }

    pub(crate) fn read(&mut self, operand: SpcOperand) -> Result<Byte> {
        match operand {
            SpcOperand::Register(SpcRegister::A) => Ok(self.state.a),
            SpcOperand::Register(SpcRegister::X) => Ok(self.state.x),
            SpcOperand::Register(SpcRegister::Y) => Ok(self.state.y),
            SpcOperand::Register(SpcRegister::Sp) => Ok(self.state.sp),
            SpcOperand::Register(SpcRegister::Psw) => Ok(self.state.psw),
            SpcOperand::Immediate(value) => Ok(value),
            SpcOperand::Memory(address) => self.memory.read(address),
            other => Err(EmuError::not_implemented(format!(
                "reading a byte from {other:?}"
            ))),
        }
    }

    pub(crate) fn write(
        &mut self,
        operand: SpcOperand,
        value: Byte,
    ) -> Result<()> {
        let register = match operand {
            SpcOperand::Register(SpcRegister::A) => &mut self.state.a,
            SpcOperand::Register(SpcRegister::X) => &mut self.state.x,
            SpcOperand::Register(SpcRegister::Y) => &mut self.state.y,
            SpcOperand::Register(SpcRegister::Sp) => &mut self.state.sp,
            SpcOperand::Register(SpcRegister::Psw) => &mut self.state.psw,
            SpcOperand::Memory(address) => {
                return self.memory.write(address, value);
            }
            other => {
                return Err(EmuError::not_implemented(format!(
                    "writing a byte to {other:?}"
                )));
            }
        };
        *register = value;
        Ok(())
    }

    /// Reads YA, or a word in the direct page.
    pub(crate) fn read_word(&mut self, operand: SpcOperand) -> Result<Word> {
        match operand {
            SpcOperand::Register(SpcRegister::Ya) => Ok(self.state.ya()),
            SpcOperand::Memory(address) => {
                self.memory.read_word(address, Wrap::Page)
            }
            other => Err(EmuError::not_implemented(format!(
                "reading a word from {other:?}"
            ))),
        }
    }

    pub(crate) fn write_word(
        &mut self,
        operand: SpcOperand,
        value: Word,
    ) -> Result<()> {
        match operand {
            SpcOperand::Register(SpcRegister::Ya) => {
                self.state.set_ya(value);
                Ok(())
            }
            SpcOperand::Memory(address) => {
                self.memory.write_word(address, value, Wrap::Page)
            }
            other => Err(EmuError::not_implemented(format!(
                "writing a word to {other:?}"
            ))),
        }
    }

    pub(crate) fn read_bit(&mut self, operand: SpcOperand) -> Result<bool> {
        match operand {
            SpcOperand::Carry => Ok(self.state.get_flag(PSW_FLAG_C)),
            SpcOperand::Bit { address, bit } => {
                Ok(self.memory.read(address)?.0 & (1 << bit) != 0)
            }
            SpcOperand::NegatedBit { address, bit } => {
                Ok(self.memory.read(address)?.0 & (1 << bit) == 0)
            }
            other => Err(EmuError::not_implemented(format!(
                "reading a bit from {other:?}"
            ))),
        }
    }

    pub(crate) fn write_bit(
        &mut self,
        operand: SpcOperand,
        value: bool,
    ) -> Result<()> {
        match operand {
            SpcOperand::Carry => {
                self.state.set_flag(PSW_FLAG_C, value);
                Ok(())
            }
            SpcOperand::Bit { address, bit } => {
                let byte = self.memory.read(address)?;
                let mask = Byte(1 << bit);
                let byte = if value { byte | mask } else { byte & !mask };
                self.memory.write(address, byte)
            }
            other => Err(EmuError::not_implemented(format!(
                "writing a bit to {other:?}"
            ))),
        }
    }

    pub(crate) fn push_byte(&mut self, value: Byte) -> Result<()> {
        self.memory.write(self.state.stack_address(), value)?;
        self.state.sp = self.state.sp.wrapping_sub(1);
        Ok(())
    }

    pub(crate) fn pull_byte(&mut self) -> Result<Byte> {
        self.state.sp = self.state.sp.wrapping_add(1);
        self.memory.read(self.state.stack_address())
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

    pub(crate) fn read_vector(&mut self, vector: u16) -> Result<Word> {
        self.memory.read_word(Word(vector), Wrap::Full)
    }
}

impl Core for SpcCore {
    type Location = SpcOperands;

    fn begin_instruction(&mut self) {
        self.conditions = Conditions::default();
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
            *byte = self.memory.apply(self.state.pc)?.0;
            self.state.pc = self.state.pc.wrapping_add(1);
        }
        Ok(OperandBytes::new(&bytes[..len]))
    }

    fn peek_operand(&self, address: u32, len: u8) -> Result<OperandBytes> {
        let mut bytes = [0u8; 3];
        let len = usize::from(len).min(bytes.len());
        let mut address = Word(address as u16);
        for byte in bytes.iter_mut().take(len) {
            address = SpcMemory::next_address(address, Wrap::Full);
            *byte = self.memory.inspect(address)?.0;
        }
        Ok(OperandBytes::new(&bytes[..len]))
    }
}

//===========================================================================//

fn unknown_opcode(opcode: u8) -> EmuError {
    EmuError::not_implemented(format!("SPC700 opcode ${opcode:02X}"))
}

/// A simulated SPC700 together with the timers and ports behind its I/O
/// registers.
pub struct Spc {
    core: SpcCore,
    table: OpcodeTable<SpcCore>,
    io: Rc<SpcIo>,
}

impl Spc {
    /// Creates a coprocessor in the power-on state over the given bus,
    /// whose I/O registers are backed by `io`.  Call [Processor::reset] to
    /// load the reset vector.
    pub fn new(memory: SpcMemory, io: Rc<SpcIo>) -> Spc {
        Spc { core: SpcCore::new(memory), table: table::opcode_table(), io }
    }

    /// Returns the register file.
    pub fn state(&self) -> &SpcState {
        &self.core.state
    }

    /// Returns the register file for modification.
    pub fn state_mut(&mut self) -> &mut SpcState {
        &mut self.core.state
    }

    /// Returns the coprocessor's bus.
    pub fn memory(&self) -> &SpcMemory {
        &self.core.memory
    }

    /// Returns the coprocessor's bus for modification.
    pub fn memory_mut(&mut self) -> &mut SpcMemory {
        &mut self.core.memory
    }

    /// Returns the instruction for `opcode`.
    pub fn instruction(
        &self,
        opcode: u8,
    ) -> Result<&dyn Instruction<SpcCore>> {
        self.table.get(opcode).ok_or_else(|| unknown_opcode(opcode))
    }

    /// Returns the opcode listing, one entry per opcode.
    pub fn opcode_listing(&self) -> Vec<String> {
        self.table
            .iter()
            .map(|instruction| instruction.opcode_to_string())
            .collect()
    }
}

impl Processor for Spc {
    fn description(&self) -> String {
        "Sony SPC700".to_string()
    }

    fn disassemble(&self, addr: u32) -> Result<(usize, String)> {
        let opcode = self.core.memory.inspect(Word(addr as u16))?.0;
        let instruction = self.instruction(opcode)?;
        let text = instruction.disassemble(&self.core, addr & 0xffff);
        Ok((usize::from(instruction.size()), text))
    }

    fn pc(&self) -> u32 {
        u32::from(self.core.state.pc.0)
    }

    fn set_pc(&mut self, addr: u32) {
        self.core.state.pc = Word(addr as u16);
    }

    fn register_names(&self) -> &'static [&'static str] {
        REGISTER_NAMES
    }

    fn get_register(&self, name: &str) -> Option<u32> {
        let state = &self.core.state;
        let value = match name {
            "A" => state.a,
            "X" => state.x,
            "Y" => state.y,
            "S" => state.sp,
            "P" => state.psw,
            _ => return None,
        };
        Some(u32::from(value.0))
    }

    fn set_register_debug(&mut self, name: char, value: u32) -> Result<()> {
        let name = name.to_ascii_uppercase();
        let state = &mut self.core.state;
        let register = match name {
            'A' => &mut state.a,
            'X' => &mut state.x,
            'Y' => &mut state.y,
            'S' => &mut state.sp,
            'P' => &mut state.psw,
            _ => return Err(EmuError::UnknownRegister(name)),
        };
        *register = Byte(register_value(name, value)?);
        Ok(())
    }

    fn write_byte(&mut self, addr: u32, value: u8) -> Result<()> {
        self.core.memory.write(SpcMemory::address(addr)?, Byte(value))
    }

    fn set_trap(&mut self, addr: u32, trap: Trap) -> Result<()> {
        self.core.memory.set_trap(SpcMemory::address(addr)?, trap)
    }

    fn remove_trap(&mut self, addr: u32) -> Result<()> {
        self.core.memory.remove_trap(SpcMemory::address(addr)?)
    }

    fn application_count(&self, addr: u32) -> u64 {
        SpcMemory::address(addr)
            .map_or(0, |addr| self.core.memory.application_count(addr))
    }

    fn step(&mut self) -> Result<u32> {
        let address = self.core.state.pc;
        let opcode = self.core.memory.apply(address)?.0;
        self.core.state.pc = address.wrapping_add(1);
        let instruction =
            self.table.get(opcode).ok_or_else(|| unknown_opcode(opcode))?;
        if log_enabled!(Level::Trace) {
            let text = instruction.disassemble(&self.core, address.0.into());
            trace!("SPC ${address}: {text}");
        }
        let cycles = instruction.execute(&mut self.core)?;
        self.io.tick(cycles);
        Ok(cycles)
    }

    fn reset(&mut self) -> Result<()> {
        self.io.reset();
        self.core.memory.reset_all();
        self.core.state = SpcState::default();
        self.core.state.pc = self.core.read_vector(VECTOR_RESET)?;
        debug!("SPC700 reset to ${}", self.core.state.pc);
        Ok(())
    }
}

//===========================================================================//


//===========================================================================//
