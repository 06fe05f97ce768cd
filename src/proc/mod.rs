//! Facilities for simulating a processor.

mod cycles;
mod instruction;
pub mod spc700;
pub mod w65c816;

pub use cycles::{
    Conditions, CycleRemark, Layer, combine_remarks, total_cycles,
};
pub use instruction::{
    AddressingMode, Core, Instruction, Opcode, OpcodeTable, OperandBytes,
    Operator,
};
pub use spc700::Spc;
pub use w65c816::Cpu;

use crate::bus::Trap;
use crate::error::{EmuError, Result};

//===========================================================================//

/// A simulated processor, as seen by the scheduler and the debugger.
pub trait Processor {
    /// Returns a human-readable description of this simulated processor.
    fn description(&self) -> String;

    /// Disassembles the instruction starting at the given address, returning
    /// the length of the instruction in bytes, and a human-readable string
    /// with the assembly code for that instruction.  Reading the bytes has
    /// no side effects.
    fn disassemble(&self, addr: u32) -> Result<(usize, String)>;

    /// Returns the current address of the program counter.
    fn pc(&self) -> u32;

    /// Sets the current address of the program counter.
    fn set_pc(&mut self, addr: u32);

    /// Returns the names of this processor's registers, each of which is a
    /// single letter accepted by [Processor::set_register_debug].
    fn register_names(&self) -> &'static [&'static str];

    /// Returns the current value of the named register.
    fn get_register(&self, name: &str) -> Option<u32>;

    /// Overwrites a register from the debugger.
    fn set_register_debug(&mut self, name: char, value: u32) -> Result<()>;

    /// Returns a list of the this processor's register names and current
    /// values.
    fn registers(&self) -> Vec<(&'static str, u32)> {
        self.register_names()
            .iter()
            .filter_map(|&name| Some((name, self.get_register(name)?)))
            .collect()
    }

    /// Writes a byte to this processor's bus from the debugger.
    fn write_byte(&mut self, addr: u32, value: u8) -> Result<()>;

    /// Attaches a trap to the cell at `addr` on this processor's bus.
    fn set_trap(&mut self, addr: u32, trap: Trap) -> Result<()>;

    /// Detaches the trap from the cell at `addr`.
    fn remove_trap(&mut self, addr: u32) -> Result<()>;

    /// Returns how many times the cell at `addr` has been applied.
    fn application_count(&self, addr: u32) -> u64;

    /// Advances this processor by one instruction, returning the number of
    /// processor cycles it took.
    fn step(&mut self) -> Result<u32>;

    /// Soft-resets the processor and its bus, then loads the reset vector.
    fn reset(&mut self) -> Result<()>;
}

/// Narrows a debugger-supplied value to the width of register `name`.
pub(crate) fn register_value<T: TryFrom<u32>>(
    name: char,
    value: u32,
) -> Result<T> {
    T::try_from(value).map_err(|_| EmuError::RegisterOverflow { name, value })
}

//===========================================================================//
