use crate::value::Byte;
use std::fmt;

//===========================================================================//

/// The kinds of access that can be made to a memory cell.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Access {
    /// A data read by a processor or DMA.
    Read,
    /// A data write by a processor or DMA.
    Write,
    /// An instruction fetch (opcode or operand byte).
    Apply,
}

/// Which accesses a hardware register supports.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum RegisterKind {
    /// The register can only be read.
    Read,
    /// The register can only be written.
    Write,
    /// The register can be read and written.
    ReadWrite,
}

impl RegisterKind {
    fn readable(self) -> bool {
        self != RegisterKind::Write
    }

    fn writable(self) -> bool {
        self != RegisterKind::Read
    }
}

/// Callback invoked when a register is read.  It receives the latched value
/// and returns the value seen by the reader.
pub type ReadHook = Box<dyn FnMut(Byte) -> Byte>;

/// Callback invoked when a register is written, with the prior and new
/// latched values.
pub type WriteHook = Box<dyn FnMut(Byte, Byte)>;

/// Side-effect free view of a register, used by debugger inspection.
pub type PeekHook = Box<dyn Fn(Byte) -> Byte>;

//===========================================================================//

/// A callback-driven hardware register.
pub struct Register {
    name: &'static str,
    kind: RegisterKind,
    initial: Byte,
    latch: Byte,
    on_read: Option<ReadHook>,
    on_write: Option<WriteHook>,
    on_peek: Option<PeekHook>,
}

impl Register {
    /// Creates a register whose latch starts out (and resets to) `initial`.
    pub fn new(
        name: &'static str,
        kind: RegisterKind,
        initial: Byte,
    ) -> Register {
        Register {
            name,
            kind,
            initial,
            latch: initial,
            on_read: None,
            on_write: None,
            on_peek: None,
        }
    }

    /// Attaches a read callback.
    pub fn on_read(
        mut self,
        hook: impl FnMut(Byte) -> Byte + 'static,
    ) -> Register {
        self.on_read = Some(Box::new(hook));
        self
    }

    /// Attaches a write callback.
    pub fn on_write(
        mut self,
        hook: impl FnMut(Byte, Byte) + 'static,
    ) -> Register {
        self.on_write = Some(Box::new(hook));
        self
    }

    /// Attaches a callback that computes what inspection sees.  Without
    /// one, inspection returns the latch.
    pub fn on_peek(
        mut self,
        hook: impl Fn(Byte) -> Byte + 'static,
    ) -> Register {
        self.on_peek = Some(Box::new(hook));
        self
    }

    /// Returns the register's name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns which accesses the register supports.
    pub fn kind(&self) -> RegisterKind {
        self.kind
    }

    fn read(&mut self) -> Byte {
        match self.on_read.as_mut() {
            Some(hook) => hook(self.latch),
            None => self.latch,
        }
    }

    fn peek(&self) -> Byte {
        match self.on_peek.as_ref() {
            Some(hook) => hook(self.latch),
            None => self.latch,
        }
    }

    fn write(&mut self, value: Byte) {
        let old = self.latch;
        self.latch = value;
        if let Some(hook) = self.on_write.as_mut() {
            hook(old, value);
        }
    }
}

impl fmt::Debug for Register {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Register")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("latch", &self.latch)
            .finish()
    }
}

//===========================================================================//

/// What a memory cell is configured to be.
#[derive(Debug, Default)]
pub enum CellKind {
    /// Not yet configured; becomes [CellKind::Invalid] when the bus is
    /// finalized.
    #[default]
    Unconfigured,
    /// Nothing is mapped here.
    Invalid,
    /// Read-only storage, such as cartridge ROM.
    ReadOnly(Byte),
    /// Read-write storage.
    ReadWrite(Byte),
    /// Write-only storage.
    WriteOnly(Byte),
    /// A callback-driven hardware register.
    Register(Box<Register>),
    /// An alias of the cell at the given (root) address.
    Mirror(u32),
}

impl CellKind {
    /// Returns a short name for this kind of cell.
    pub fn name(&self) -> &'static str {
        match self {
            CellKind::Unconfigured => "unconfigured",
            CellKind::Invalid => "invalid",
            CellKind::ReadOnly(_) => "read-only",
            CellKind::ReadWrite(_) => "read-write",
            CellKind::WriteOnly(_) => "write-only",
            CellKind::Register(_) => "register",
            CellKind::Mirror(_) => "mirror",
        }
    }
}

//===========================================================================//

/// Why an access to a cell was refused.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Refusal {
    Unmapped,
    Forbidden,
}

/// One addressable byte on a bus.
#[derive(Debug, Default)]
pub struct MemoryCell {
    pub(crate) kind: CellKind,
    pub(crate) application_count: u64,
}

impl MemoryCell {
    pub(crate) fn new(kind: CellKind) -> MemoryCell {
        MemoryCell { kind, application_count: 0 }
    }

    /// Returns what this cell is configured to be.
    pub fn kind(&self) -> &CellKind {
        &self.kind
    }

    /// Returns how many times this cell has been fetched as part of an
    /// instruction.
    pub fn application_count(&self) -> u64 {
        self.application_count
    }

    pub(crate) fn read(&mut self) -> Result<Byte, Refusal> {
        match &mut self.kind {
            CellKind::ReadOnly(value) | CellKind::ReadWrite(value) => {
                Ok(*value)
            }
            CellKind::Register(reg) if reg.kind.readable() => Ok(reg.read()),
            CellKind::Unconfigured | CellKind::Invalid => {
                Err(Refusal::Unmapped)
            }
            _ => Err(Refusal::Forbidden),
        }
    }

    pub(crate) fn write(&mut self, byte: Byte) -> Result<(), Refusal> {
        match &mut self.kind {
            CellKind::ReadWrite(value) | CellKind::WriteOnly(value) => {
                *value = byte;
                Ok(())
            }
            CellKind::Register(reg) if reg.kind.writable() => {
                reg.write(byte);
                Ok(())
            }
            CellKind::Unconfigured | CellKind::Invalid => {
                Err(Refusal::Unmapped)
            }
            _ => Err(Refusal::Forbidden),
        }
    }

    pub(crate) fn apply(&mut self) -> Result<Byte, Refusal> {
        let byte = self.read()?;
        self.application_count += 1;
        Ok(byte)
    }

    /// Returns the stored value without invoking any callbacks.
    pub(crate) fn inspect(&self) -> Result<Byte, Refusal> {
        match &self.kind {
            CellKind::ReadOnly(value) | CellKind::ReadWrite(value) => {
                Ok(*value)
            }
            CellKind::Register(reg) if reg.kind.readable() => Ok(reg.peek()),
            CellKind::Unconfigured | CellKind::Invalid => {
                Err(Refusal::Unmapped)
            }
            _ => Err(Refusal::Forbidden),
        }
    }

    /// Clears the application count and any register latch, keeping the
    /// cell's kind and callbacks.
    pub(crate) fn reset(&mut self) {
        self.application_count = 0;
        if let CellKind::Register(reg) = &mut self.kind {
            reg.latch = reg.initial;
        }
    }
}

//===========================================================================//


//===========================================================================//
