//! Facilities for representing an address space as a bus of individually
//! configured memory cells.

use crate::error::{EmuError, Result};
use crate::value::{Byte, Long, Word};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;

mod cell;
mod ports;
mod rom;
mod snes;
mod ssmp;

pub use cell::{
    Access, CellKind, MemoryCell, PeekHook, ReadHook, Register, RegisterKind,
    WriteHook,
};
pub use ports::ApuPorts;
pub use rom::RomImage;
pub use snes::{CpuIo, map_cpu_bus, map_lorom, map_ppu_latches};
pub use ssmp::{SpcIo, map_spc_bus};

//===========================================================================//

const PAGE_BITS: u32 = 8;
const PAGE_SIZE: usize = 1 << PAGE_BITS;
const PAGE_MASK: u32 = (1 << PAGE_BITS) - 1;

//===========================================================================//

/// An address type that can index a bus.
pub trait Address: Copy + fmt::Debug {
    /// The number of address lines on the bus.
    const SPACE_BITS: u32;

    /// Returns the address as a bus index.
    fn index(self) -> u32;

    /// Builds an address from a bus index, discarding bits beyond the
    /// address width.
    fn from_index(index: u32) -> Self;
}

impl Address for Word {
    const SPACE_BITS: u32 = 16;

    fn index(self) -> u32 {
        u32::from(self.0)
    }

    fn from_index(index: u32) -> Word {
        Word(index as u16)
    }
}

impl Address for Long {
    const SPACE_BITS: u32 = 24;

    fn index(self) -> u32 {
        self.value()
    }

    fn from_index(index: u32) -> Long {
        Long::new(index)
    }
}

//===========================================================================//

/// Where a multi-byte access rolls over to once it reaches the end of a
/// region.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Wrap {
    /// Stay within the current 256-byte page.
    Page,
    /// Stay within the current 64k bank.
    Bank,
    /// Wrap only at the end of the address space.
    Full,
}

impl Wrap {
    fn mask(self, space_mask: u32) -> u32 {
        match self {
            Wrap::Page => 0xff,
            Wrap::Bank => 0xffff,
            Wrap::Full => space_mask,
        }
    }
}

//===========================================================================//

/// Callback attached to a cell for breakpoint support.  It receives the
/// kind of access, the byte transferred, and the cell's application count.
pub type Trap = Box<dyn FnMut(Access, Byte, u64)>;

enum Page {
    Absent,
    Cells(Box<[MemoryCell]>),
    Mirror(u32),
}

/// A bus of memory cells covering a whole address space.
pub struct Memory<A: Address> {
    name: &'static str,
    pages: Vec<Page>,
    traps: HashMap<u32, Trap>,
    finalized: bool,
    phantom: PhantomData<A>,
}

/// The main CPU's 24-bit bus.
pub type CpuMemory = Memory<Long>;

/// The coprocessor's 16-bit bus.
pub type SpcMemory = Memory<Word>;

impl<A: Address> Memory<A> {
    /// Creates a bus on which no address has been configured yet.
    pub fn new(name: &'static str) -> Memory<A> {
        let num_pages = 1usize << (A::SPACE_BITS - PAGE_BITS);
        Memory {
            name,
            pages: (0..num_pages).map(|_| Page::Absent).collect(),
            traps: HashMap::new(),
            finalized: false,
            phantom: PhantomData,
        }
    }

    /// Returns a human-readable description of this bus.
    pub fn description(&self) -> String {
        let bits = A::SPACE_BITS;
        format!("{} ({bits}-bit address space)", self.name)
    }

    fn space_mask() -> u32 {
        (1u32 << A::SPACE_BITS) - 1
    }

    /// Converts a raw index (e.g. one typed into the debugger) into an
    /// address on this bus, refusing indices past the end of the address
    /// space rather than discarding their high bits.
    pub fn address(index: u32) -> Result<A> {
        if index > Self::space_mask() {
            Err(EmuError::OutOfBounds(index))
        } else {
            Ok(A::from_index(index))
        }
    }

    //-----------------------------------------------------------------------//
    // Configuration

    /// Configures a read-only cell holding `value`.
    pub fn create_read_only(&mut self, address: A, value: Byte) -> Result<()> {
        self.configure(address.index(), CellKind::ReadOnly(value))
    }

    /// Configures a read-write cell holding `value`.
    pub fn create_read_write(
        &mut self,
        address: A,
        value: Byte,
    ) -> Result<()> {
        self.configure(address.index(), CellKind::ReadWrite(value))
    }

    /// Configures a write-only cell holding `value`.
    pub fn create_write_only(
        &mut self,
        address: A,
        value: Byte,
    ) -> Result<()> {
        self.configure(address.index(), CellKind::WriteOnly(value))
    }

    /// Binds a hardware register to the given address.
    pub fn create_register(
        &mut self,
        address: A,
        register: Register,
    ) -> Result<()> {
        self.configure(address.index(), CellKind::Register(Box::new(register)))
    }

    /// Makes the cell at `address` an alias of the cell at `target`.
    pub fn create_mirror(&mut self, address: A, target: A) -> Result<()> {
        let index = address.index();
        let root = self.root(target.index());
        if root == index {
            return Err(EmuError::Invalid(index));
        }
        self.configure(index, CellKind::Mirror(root))
    }

    /// Configures `len` read-write cells starting at `start`, all holding
    /// `fill`.
    pub fn create_ram(
        &mut self,
        start: A,
        len: u32,
        fill: Byte,
    ) -> Result<()> {
        for offset in 0..len {
            let index = start.index() + offset;
            self.configure(index, CellKind::ReadWrite(fill))?;
        }
        Ok(())
    }

    /// Configures one read-only cell per byte of `data`, starting at
    /// `start`.
    pub fn create_rom(&mut self, start: A, data: &[u8]) -> Result<()> {
        for (offset, &byte) in data.iter().enumerate() {
            let index = start.index() + offset as u32;
            self.configure(index, CellKind::ReadOnly(Byte(byte)))?;
        }
        Ok(())
    }

    /// Makes `len` cells starting at `start` aliases of the same number of
    /// cells starting at `target`.  Whole, page-aligned, not yet configured
    /// pages are aliased as a unit.
    pub fn create_mirror_range(
        &mut self,
        start: A,
        len: u32,
        target: A,
    ) -> Result<()> {
        let (start, target) = (start.index(), target.index());
        let mut offset = 0;
        while offset < len {
            let index = start.saturating_add(offset);
            let target_index = target.saturating_add(offset);
            if target_index > Self::space_mask() {
                return Err(EmuError::OutOfBounds(target_index));
            }
            let whole_page = index & PAGE_MASK == 0
                && target_index & PAGE_MASK == 0
                && len - offset >= PAGE_SIZE as u32;
            if whole_page && self.mirror_page(index, target_index)? {
                offset += PAGE_SIZE as u32;
                continue;
            }
            let root = self.root(target_index);
            if root == index {
                return Err(EmuError::Invalid(index));
            }
            self.configure(index, CellKind::Mirror(root))?;
            offset += 1;
        }
        Ok(())
    }

    fn mirror_page(&mut self, index: u32, target: u32) -> Result<bool> {
        self.check_configurable(index)?;
        let page = (index >> PAGE_BITS) as usize;
        if !matches!(self.pages[page], Page::Absent) {
            return Ok(false);
        }
        let mut target_page = target >> PAGE_BITS;
        if let Page::Mirror(root) = self.pages[target_page as usize] {
            target_page = root;
        }
        if target_page as usize == page {
            return Err(EmuError::Invalid(index));
        }
        self.pages[page] = Page::Mirror(target_page);
        Ok(true)
    }

    fn check_configurable(&self, index: u32) -> Result<()> {
        if index > Self::space_mask() {
            Err(EmuError::OutOfBounds(index))
        } else if self.finalized {
            Err(EmuError::AlreadyConfigured(index))
        } else {
            Ok(())
        }
    }

    fn configure(&mut self, index: u32, kind: CellKind) -> Result<()> {
        self.check_configurable(index)?;
        let page = &mut self.pages[(index >> PAGE_BITS) as usize];
        if let Page::Absent = page {
            *page = Page::Cells(
                (0..PAGE_SIZE)
                    .map(|_| MemoryCell::new(CellKind::Unconfigured))
                    .collect(),
            );
        }
        match page {
            Page::Cells(cells) => {
                let cell = &mut cells[(index & PAGE_MASK) as usize];
                if let CellKind::Unconfigured = cell.kind {
                    cell.kind = kind;
                    Ok(())
                } else {
                    Err(EmuError::AlreadyConfigured(index))
                }
            }
            _ => Err(EmuError::AlreadyConfigured(index)),
        }
    }

    /// Returns true if the given address has been explicitly configured.
    pub fn is_configured(&self, address: A) -> bool {
        let index = address.index();
        match &self.pages[(index >> PAGE_BITS) as usize] {
            Page::Absent => false,
            Page::Mirror(_) => true,
            Page::Cells(cells) => !matches!(
                cells[(index & PAGE_MASK) as usize].kind,
                CellKind::Unconfigured | CellKind::Invalid
            ),
        }
    }

    /// Completes configuration.  Every address that was never configured
    /// becomes invalid, and no further configuration is allowed.
    pub fn finalize(&mut self) {
        for page in self.pages.iter_mut() {
            if let Page::Cells(cells) = page {
                for cell in cells.iter_mut() {
                    if let CellKind::Unconfigured = cell.kind {
                        cell.kind = CellKind::Invalid;
                    }
                }
            }
        }
        self.finalized = true;
    }

    /// Returns true once [Memory::finalize] has been called.
    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    //-----------------------------------------------------------------------//
    // Lookup

    fn root(&self, index: u32) -> u32 {
        let index = match self.pages[(index >> PAGE_BITS) as usize] {
            Page::Mirror(target) => {
                (target << PAGE_BITS) | (index & PAGE_MASK)
            }
            _ => index,
        };
        match self.cell(index).map(|cell| &cell.kind) {
            Some(&CellKind::Mirror(target)) => target,
            _ => index,
        }
    }

    fn cell(&self, index: u32) -> Option<&MemoryCell> {
        match &self.pages[(index >> PAGE_BITS) as usize] {
            Page::Cells(cells) => Some(&cells[(index & PAGE_MASK) as usize]),
            _ => None,
        }
    }

    fn cell_mut(&mut self, index: u32) -> Option<&mut MemoryCell> {
        match &mut self.pages[(index >> PAGE_BITS) as usize] {
            Page::Cells(cells) => {
                Some(&mut cells[(index & PAGE_MASK) as usize])
            }
            _ => None,
        }
    }

    /// Returns the kind of the cell that ultimately backs `address`.
    pub fn kind_name(&self, address: A) -> &'static str {
        match self.cell(self.root(address.index())) {
            Some(cell) => cell.kind.name(),
            None if self.finalized => "invalid",
            None => "unconfigured",
        }
    }

    /// Computes the address following `address` for a multi-byte access:
    /// only the bits selected by `wrap` roll over.
    pub fn next_address(address: A, wrap: Wrap) -> A {
        let index = address.index();
        let mask = wrap.mask(Self::space_mask());
        A::from_index((index & !mask) | (index.wrapping_add(1) & mask))
    }

    //-----------------------------------------------------------------------//
    // Access

    fn access(
        &mut self,
        index: u32,
        access: Access,
        data: Byte,
    ) -> Result<Byte> {
        let root = self.root(index);
        let cell = self.cell_mut(root).ok_or(EmuError::Invalid(index))?;
        let result = match access {
            Access::Read => cell.read(),
            Access::Write => cell.write(data).map(|()| data),
            Access::Apply => cell.apply(),
        };
        let value = result.map_err(|refusal| match refusal {
            cell::Refusal::Unmapped => EmuError::Invalid(index),
            cell::Refusal::Forbidden => match access {
                Access::Read => EmuError::NotReadable(index),
                Access::Write => EmuError::NotWritable(index),
                Access::Apply => EmuError::NotApplicable(index),
            },
        })?;
        let count = cell.application_count;
        if let Some(trap) = self.traps.get_mut(&root) {
            trap(access, value, count);
        }
        Ok(value)
    }

    /// Reads a byte, performing any side effects its cell declares.
    pub fn read(&mut self, address: A) -> Result<Byte> {
        self.access(address.index(), Access::Read, Byte::ZERO)
    }

    /// Reads a little-endian word.
    pub fn read_word(&mut self, address: A, wrap: Wrap) -> Result<Word> {
        let low = self.read(address)?;
        let high = self.read(Self::next_address(address, wrap))?;
        Ok(Word::new(low, high))
    }

    /// Reads a little-endian 24-bit value.
    pub fn read_long(&mut self, address: A, wrap: Wrap) -> Result<Long> {
        let word = self.read_word(address, wrap)?;
        let second = Self::next_address(address, wrap);
        let bank = self.read(Self::next_address(second, wrap))?;
        Ok(Long::from_parts(word, bank))
    }

    /// Writes a byte.  Fails if the cell is not writable.
    pub fn write(&mut self, address: A, value: Byte) -> Result<()> {
        self.access(address.index(), Access::Write, value).map(|_| ())
    }

    /// Writes a little-endian word.
    pub fn write_word(
        &mut self,
        address: A,
        value: Word,
        wrap: Wrap,
    ) -> Result<()> {
        self.write(address, value.low())?;
        self.write(Self::next_address(address, wrap), value.high())
    }

    /// Fetches a byte as part of an instruction, incrementing the cell's
    /// application count.
    pub fn apply(&mut self, address: A) -> Result<Byte> {
        self.access(address.index(), Access::Apply, Byte::ZERO)
    }

    /// Returns a byte without triggering callbacks, traps, or counts.
    pub fn inspect(&self, address: A) -> Result<Byte> {
        let index = address.index();
        let cell =
            self.cell(self.root(index)).ok_or(EmuError::Invalid(index))?;
        cell.inspect().map_err(|refusal| match refusal {
            cell::Refusal::Unmapped => EmuError::Invalid(index),
            cell::Refusal::Forbidden => EmuError::NotReadable(index),
        })
    }

    /// Returns a little-endian word without side effects.
    pub fn inspect_word(&self, address: A, wrap: Wrap) -> Result<Word> {
        let low = self.inspect(address)?;
        let high = self.inspect(Self::next_address(address, wrap))?;
        Ok(Word::new(low, high))
    }

    /// Returns the number of times the cell backing `address` was applied.
    pub fn application_count(&self, address: A) -> u64 {
        self.cell(self.root(address.index()))
            .map_or(0, MemoryCell::application_count)
    }

    /// Soft-resets the cell backing `address`.
    pub fn reset(&mut self, address: A) {
        let root = self.root(address.index());
        if let Some(cell) = self.cell_mut(root) {
            cell.reset();
        }
    }

    /// Soft-resets every cell on the bus.
    pub fn reset_all(&mut self) {
        for page in self.pages.iter_mut() {
            if let Page::Cells(cells) = page {
                cells.iter_mut().for_each(MemoryCell::reset);
            }
        }
    }

    //-----------------------------------------------------------------------//
    // Traps

    /// Attaches a trap to the cell backing `address`.  Fails if a trap is
    /// already attached.
    pub fn set_trap(&mut self, address: A, trap: Trap) -> Result<()> {
        let root = self.root(address.index());
        if self.traps.contains_key(&root) {
            return Err(EmuError::TrapAlreadySet(address.index()));
        }
        self.traps.insert(root, trap);
        Ok(())
    }

    /// Detaches the trap from the cell backing `address`.
    pub fn remove_trap(&mut self, address: A) -> Result<()> {
        let root = self.root(address.index());
        match self.traps.remove(&root) {
            Some(_) => Ok(()),
            None => Err(EmuError::NoTrap(address.index())),
        }
    }
}

//===========================================================================//

#[cfg(test)]
mod tests {
    use super::{Access, Memory, Register, RegisterKind, SpcMemory, Wrap};
    use crate::error::EmuError;
    use crate::value::{Byte, Long, Word};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn ram_bus() -> SpcMemory {
        let mut memory = SpcMemory::new("test");
        memory.create_ram(Word(0x0000), 0x200, Byte(0)).unwrap();
        memory.finalize();
        memory
    }

    #[test]
    fn create_twice_fails() {
        let mut memory = SpcMemory::new("test");
        memory.create_read_write(Word(0x10), Byte(0)).unwrap();
        assert!(matches!(
            memory.create_read_only(Word(0x10), Byte(0)),
            Err(EmuError::AlreadyConfigured(0x10))
        ));
        memory.finalize();
        assert!(matches!(
            memory.create_read_only(Word(0x20), Byte(0)),
            Err(EmuError::AlreadyConfigured(0x20))
        ));
    }

    #[test]
    fn unconfigured_becomes_invalid() {
        let mut memory = ram_bus();
        assert_eq!(memory.kind_name(Word(0x0300)), "invalid");
        assert!(matches!(
            memory.read(Word(0x0300)),
            Err(EmuError::Invalid(_))
        ));
        assert!(matches!(
            memory.write(Word(0x8000), Byte(1)),
            Err(EmuError::Invalid(0x8000))
        ));
    }

    #[test]
    fn read_only_and_write_only() {
        let mut memory = SpcMemory::new("test");
        for addr in 0..0x10 {
            memory.create_read_only(Word(addr), Byte(addr as u8)).unwrap();
            memory.create_write_only(Word(0x10 + addr), Byte(0)).unwrap();
        }
        memory.finalize();
        for addr in 0..0x10 {
            let err = memory.write(Word(addr), Byte(0xff)).unwrap_err();
            assert!(err.is_access_error());
            assert!(matches!(err, EmuError::NotWritable(_)));
            let err = memory.read(Word(0x10 + addr)).unwrap_err();
            assert!(matches!(err, EmuError::NotReadable(_)));
            assert_eq!(memory.read(Word(addr)).unwrap(), Byte(addr as u8));
            memory.write(Word(0x10 + addr), Byte(0xff)).unwrap();
        }
    }

    #[test]
    fn apply_counts_only_fetches() {
        let mut memory = ram_bus();
        memory.write(Word(0x40), Byte(0xea)).unwrap();
        assert_eq!(memory.apply(Word(0x40)).unwrap(), Byte(0xea));
        memory.read(Word(0x40)).unwrap();
        memory.write(Word(0x40), Byte(0x00)).unwrap();
        memory.inspect(Word(0x40)).unwrap();
        assert_eq!(memory.application_count(Word(0x40)), 1);
        memory.apply(Word(0x40)).unwrap();
        assert_eq!(memory.application_count(Word(0x40)), 2);
        memory.reset(Word(0x40));
        assert_eq!(memory.application_count(Word(0x40)), 0);
        assert_eq!(memory.read(Word(0x40)).unwrap(), Byte(0x00));
    }

    #[test]
    fn page_wrap() {
        let mut memory = ram_bus();
        memory.write(Word(0x00ff), Byte(0x34)).unwrap();
        memory.write(Word(0x0000), Byte(0x12)).unwrap();
        memory.write(Word(0x0100), Byte(0x56)).unwrap();
        let mut word = |wrap| memory.read_word(Word(0x00ff), wrap).unwrap();
        assert_eq!(word(Wrap::Page), Word(0x1234));
        assert_eq!(word(Wrap::Bank), Word(0x5634));
    }

    #[test]
    fn next_address() {
        let next = |addr: u32, wrap| {
            Memory::<Long>::next_address(Long::new(addr), wrap).value()
        };
        assert_eq!(next(0x12_ffff, Wrap::Page), 0x12_ff00);
        assert_eq!(next(0x12_ffff, Wrap::Bank), 0x12_0000);
        assert_eq!(next(0x12_ffff, Wrap::Full), 0x13_0000);
        assert_eq!(next(0xff_ffff, Wrap::Full), 0);
    }

    #[test]
    fn mirrors_share_storage() {
        let mut memory = Memory::<Long>::new("test");
        memory.create_ram(Long::new(0x7e_0000), 0x2000, Byte(0)).unwrap();
        memory
            .create_mirror_range(
                Long::new(0x00_0000),
                0x2000,
                Long::new(0x7e_0000),
            )
            .unwrap();
        memory
            .create_mirror(Long::new(0x00_2000), Long::new(0x00_0010))
            .unwrap();
        memory.finalize();
        memory.write(Long::new(0x00_0010), Byte(0x99)).unwrap();
        assert_eq!(memory.read(Long::new(0x7e_0010)).unwrap(), Byte(0x99));
        assert_eq!(memory.read(Long::new(0x00_2000)).unwrap(), Byte(0x99));
        memory.apply(Long::new(0x00_0010)).unwrap();
        assert_eq!(memory.application_count(Long::new(0x7e_0010)), 1);
        assert_eq!(memory.kind_name(Long::new(0x00_2000)), "read-write");
    }

    #[test]
    fn mirror_target_past_end_of_space() {
        let mut memory = Memory::<Long>::new("test");
        memory.create_ram(Long::new(0xff_ff00), 0x100, Byte(0)).unwrap();
        assert!(matches!(
            memory.create_mirror_range(
                Long::new(0x00_0000),
                0x10,
                Long::new(0xff_fff8),
            ),
            Err(EmuError::OutOfBounds(0x100_0000))
        ));

        let mut memory = SpcMemory::new("test");
        memory.create_ram(Word(0xff00), 0x100, Byte(0)).unwrap();
        assert!(matches!(
            memory.create_mirror_range(Word(0x0000), 0x200, Word(0xff00)),
            Err(EmuError::OutOfBounds(0x1_0000))
        ));
    }

    #[test]
    fn traps() {
        let mut memory = ram_bus();
        let log = Rc::new(RefCell::new(Vec::new()));
        let log_clone = log.clone();
        memory
            .set_trap(
                Word(0x20),
                Box::new(move |access, value, count| {
                    log_clone.borrow_mut().push((access, value, count))
                }),
            )
            .unwrap();
        assert!(matches!(
            memory.set_trap(Word(0x20), Box::new(|_, _, _| {})),
            Err(EmuError::TrapAlreadySet(0x20))
        ));
        memory.write(Word(0x20), Byte(5)).unwrap();
        memory.apply(Word(0x20)).unwrap();
        memory.read(Word(0x20)).unwrap();
        memory.inspect(Word(0x20)).unwrap();
        assert_eq!(
            *log.borrow(),
            vec![
                (Access::Write, Byte(5), 0),
                (Access::Apply, Byte(5), 1),
                (Access::Read, Byte(5), 1),
            ]
        );
        memory.remove_trap(Word(0x20)).unwrap();
        assert!(matches!(
            memory.remove_trap(Word(0x20)),
            Err(EmuError::NoTrap(_))
        ));
    }

    #[test]
    fn register_callbacks_run_once_per_access() {
        let mut memory = SpcMemory::new("test");
        let reads = Rc::new(RefCell::new(0));
        let writes = Rc::new(RefCell::new(Vec::new()));
        let (reads_clone, writes_clone) = (reads.clone(), writes.clone());
        let reg = Register::new("REG", RegisterKind::ReadWrite, Byte(0))
            .on_read(move |latch| {
                *reads_clone.borrow_mut() += 1;
                latch
            })
            .on_write(move |old, new| {
                writes_clone.borrow_mut().push((old, new))
            });
        memory.create_register(Word(0xf4), reg).unwrap();
        memory.finalize();
        memory.write(Word(0xf4), Byte(0x12)).unwrap();
        memory.write(Word(0xf4), Byte(0x34)).unwrap();
        assert_eq!(memory.read(Word(0xf4)).unwrap(), Byte(0x34));
        assert_eq!(memory.inspect(Word(0xf4)).unwrap(), Byte(0x34));
        assert_eq!(*reads.borrow(), 1);
        assert_eq!(
            *writes.borrow(),
            vec![(Byte(0x00), Byte(0x12)), (Byte(0x12), Byte(0x34))]
        );
    }
}

//===========================================================================//
