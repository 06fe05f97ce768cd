//! Error types surfaced by the emulation core.

use std::io;
use thiserror::Error;

//===========================================================================//

/// A failure that aborts the current emulation step.
#[derive(Debug, Error)]
pub enum EmuError {
    /// The cell at the given address cannot be read.
    #[error("address ${0:06X} is not readable")]
    NotReadable(u32),
    /// The cell at the given address cannot be written.
    #[error("address ${0:06X} is not writable")]
    NotWritable(u32),
    /// The cell at the given address cannot be executed from.
    #[error("address ${0:06X} cannot be fetched as an instruction")]
    NotApplicable(u32),
    /// The address was never mapped to anything.
    #[error("address ${0:06X} is not mapped")]
    Invalid(u32),
    /// The address lies outside of the bus's address space.
    #[error("address ${0:06X} is out of bounds")]
    OutOfBounds(u32),
    /// The cell at the given address was already configured.
    #[error("address ${0:06X} is already configured")]
    AlreadyConfigured(u32),
    /// A trap is already attached to the cell at the given address.
    #[error("address ${0:06X} already has a trap")]
    TrapAlreadySet(u32),
    /// No trap is attached to the cell at the given address.
    #[error("address ${0:06X} has no trap")]
    NoTrap(u32),
    /// A debugger named a register the processor does not have.
    #[error("unknown register '{0}'")]
    UnknownRegister(char),
    /// A debugger tried to store a value wider than the register.
    #[error("${value:X} does not fit in register '{name}'")]
    RegisterOverflow {
        /// The name of the register.
        name: char,
        /// The rejected value.
        value: u32,
    },
    /// Emulation reached behavior that has not been implemented.
    #[error("not implemented: {0}")]
    NotImplemented(String),
    /// The processor executed an instruction that stops it until reset.
    #[error("{mnemonic} (opcode ${opcode:02X}) halted the processor")]
    Halt {
        /// The mnemonic of the halting instruction.
        mnemonic: &'static str,
        /// The opcode of the halting instruction.
        opcode: u8,
    },
    /// A debugger script could not be parsed or executed.
    #[error("line {line}: {message}")]
    Script {
        /// The one-based line number of the failing command.
        line: usize,
        /// A description of the failure.
        message: String,
    },
    /// Reading an input file failed.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl EmuError {
    /// Returns true if this error is an access error, i.e. a mismatch
    /// between an access and the kind of the cell it targeted.
    pub fn is_access_error(&self) -> bool {
        matches!(
            self,
            EmuError::NotReadable(_)
                | EmuError::NotWritable(_)
                | EmuError::NotApplicable(_)
                | EmuError::Invalid(_)
                | EmuError::OutOfBounds(_)
                | EmuError::AlreadyConfigured(_)
                | EmuError::TrapAlreadySet(_)
                | EmuError::NoTrap(_)
        )
    }

    pub(crate) fn not_implemented(what: impl Into<String>) -> EmuError {
        EmuError::NotImplemented(what.into())
    }
}

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, EmuError>;

//===========================================================================//

#[cfg(test)]
mod tests {
    use super::EmuError;

    #[test]
    fn messages() {
        assert_eq!(
            EmuError::NotWritable(0x00_8000).to_string(),
            "address $008000 is not writable"
        );
        assert_eq!(
            EmuError::Halt { mnemonic: "STP", opcode: 0xdb }.to_string(),
            "STP (opcode $DB) halted the processor"
        );
    }

    #[test]
    fn access_errors() {
        assert!(EmuError::NotReadable(0).is_access_error());
        assert!(EmuError::TrapAlreadySet(0).is_access_error());
        assert!(!EmuError::not_implemented("WDM").is_access_error());
    }
}

//===========================================================================//
