use super::CpuCore;
use crate::bus::Wrap;
use crate::error::Result;
use crate::proc::{AddressingMode, Core, CycleRemark, OperandBytes};
use crate::value::{Byte, Long, Word};
use std::borrow::Cow;

//===========================================================================//

/// Where a 65C816 operand lives once its addressing mode is resolved.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum OperandLocation {
    /// The instruction has no operand.
    Implied,
    /// The operand is the accumulator.
    Accumulator,
    /// The operand is the value embedded in the instruction.
    Immediate(Word),
    /// The operand lives on the bus.  For jumps and branches this is the
    /// target itself.  `wrap` says how a 16-bit access rolls over.
    Memory {
        /// The address of the operand's low byte.
        address: Long,
        /// How the high byte's address is derived.
        wrap: Wrap,
    },
    /// The bank pair of a block move.
    Banks {
        /// The bank bytes are copied from.
        source: Byte,
        /// The bank bytes are copied to.
        destination: Byte,
    },
}

fn memory(address: Long, wrap: Wrap) -> OperandLocation {
    OperandLocation::Memory { address, wrap }
}

//===========================================================================//

/// The operand shapes of the 65C816.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CpuMode {
    /// No operand.
    Implied,
    /// The accumulator, for read-modify-write instructions.
    Accumulator,
    /// A one-byte immediate.
    Immediate8,
    /// A two-byte immediate.
    Immediate16,
    /// `addr` in the data bank.
    Absolute,
    /// `addr` in the program bank, for jumps.
    AbsoluteProgram,
    /// `addr,X`; `cross` charges the index/page-cross cycle.
    AbsoluteX {
        /// Whether the index/page-cross remark applies.
        cross: bool,
    },
    /// `addr,Y`; `cross` charges the index/page-cross cycle.
    AbsoluteY {
        /// Whether the index/page-cross remark applies.
        cross: bool,
    },
    /// `long`.
    AbsoluteLong,
    /// `long,X`.
    AbsoluteLongX,
    /// `(addr)`, for jumps.
    AbsoluteIndirect,
    /// `[addr]`, for long jumps.
    AbsoluteIndirectLong,
    /// `(addr,X)`, for jumps.
    AbsoluteIndexedIndirect,
    /// `dp`.
    Direct,
    /// `dp,X`.
    DirectX,
    /// `dp,Y`.
    DirectY,
    /// `(dp)`.
    DirectIndirect,
    /// `[dp]`.
    DirectIndirectLong,
    /// `(dp,X)`.
    DirectIndexedIndirect,
    /// `(dp),Y`; `cross` charges the index/page-cross cycle.
    DirectIndirectIndexed {
        /// Whether the index/page-cross remark applies.
        cross: bool,
    },
    /// `[dp],Y`.
    DirectIndirectLongIndexed,
    /// `(dp)` as pushed by PEI: the pointer's own location.
    DirectPointer,
    /// `sr,S`.
    StackRelative,
    /// `(sr,S),Y`.
    StackRelativeIndirectIndexed,
    /// An 8-bit branch displacement.
    Relative8,
    /// A 16-bit branch displacement.
    Relative16,
    /// The two banks of a block move.
    BlockMove,
}

//===========================================================================//

fn direct_address(core: &CpuCore, dp: u8, index: Word) -> Long {
    let d = core.state.reg_d;
    // In emulation mode with a page-aligned direct page, indexing wraps
    // within that page.
    let offset = if core.state.emulation() && d.low() == Byte(0) {
        d.0 | (u16::from(dp).wrapping_add(index.0) & 0x00ff)
    } else {
        d.0.wrapping_add(u16::from(dp)).wrapping_add(index.0)
    };
    Long::new(u32::from(offset))
}

fn indexed(core: &mut CpuCore, base: Long, index: Word) -> Long {
    let address = base.wrapping_add(u32::from(index.0));
    core.conditions_mut().index_page_crossed =
        (base.value() >> 8) != (address.value() >> 8);
    address
}

fn relative(core: &mut CpuCore, displacement: u16) -> OperandLocation {
    let next = core.state.pc;
    let target = next.wrapping_add(displacement);
    core.conditions_mut().branch_page_crossed = next.high() != target.high();
    memory(Long::from_parts(target, core.state.pbr), Wrap::Bank)
}

fn branch_target(next: u32, displacement: u16) -> String {
    let target = (next as u16).wrapping_add(displacement);
    format!("${target:04x}")
}

//===========================================================================//

impl AddressingMode<CpuCore> for CpuMode {
    fn operand_size(&self) -> u8 {
        match self {
            CpuMode::Implied | CpuMode::Accumulator => 0,
            CpuMode::Immediate8
            | CpuMode::Direct
            | CpuMode::DirectX
            | CpuMode::DirectY
            | CpuMode::DirectIndirect
            | CpuMode::DirectIndirectLong
            | CpuMode::DirectIndexedIndirect
            | CpuMode::DirectIndirectIndexed { .. }
            | CpuMode::DirectIndirectLongIndexed
            | CpuMode::DirectPointer
            | CpuMode::StackRelative
            | CpuMode::StackRelativeIndirectIndexed
            | CpuMode::Relative8 => 1,
            CpuMode::Immediate16
            | CpuMode::Absolute
            | CpuMode::AbsoluteProgram
            | CpuMode::AbsoluteX { .. }
            | CpuMode::AbsoluteY { .. }
            | CpuMode::AbsoluteIndirect
            | CpuMode::AbsoluteIndirectLong
            | CpuMode::AbsoluteIndexedIndirect
            | CpuMode::Relative16
            | CpuMode::BlockMove => 2,
            CpuMode::AbsoluteLong | CpuMode::AbsoluteLongX => 3,
        }
    }

    fn syntax(&self) -> Cow<'static, str> {
        let syntax = match self {
            CpuMode::Implied => "",
            CpuMode::Accumulator => "A",
            CpuMode::Immediate8 | CpuMode::Immediate16 => "#const",
            CpuMode::Absolute | CpuMode::AbsoluteProgram => "addr",
            CpuMode::AbsoluteX { .. } => "addr,X",
            CpuMode::AbsoluteY { .. } => "addr,Y",
            CpuMode::AbsoluteLong => "long",
            CpuMode::AbsoluteLongX => "long,X",
            CpuMode::AbsoluteIndirect => "(addr)",
            CpuMode::AbsoluteIndirectLong => "[addr]",
            CpuMode::AbsoluteIndexedIndirect => "(addr,X)",
            CpuMode::Direct => "dp",
            CpuMode::DirectX => "dp,X",
            CpuMode::DirectY => "dp,Y",
            CpuMode::DirectIndirect | CpuMode::DirectPointer => "(dp)",
            CpuMode::DirectIndirectLong => "[dp]",
            CpuMode::DirectIndexedIndirect => "(dp,X)",
            CpuMode::DirectIndirectIndexed { .. } => "(dp),Y",
            CpuMode::DirectIndirectLongIndexed => "[dp],Y",
            CpuMode::StackRelative => "sr,S",
            CpuMode::StackRelativeIndirectIndexed => "(sr,S),Y",
            CpuMode::Relative8 => "nearlabel",
            CpuMode::Relative16 => "label",
            CpuMode::BlockMove => "srcbk,destbk",
        };
        Cow::Borrowed(syntax)
    }

    fn format(&self, operand: &OperandBytes, next: u32) -> String {
        let byte = operand.byte(0);
        let word = operand.word();
        match self {
            CpuMode::Implied => String::new(),
            CpuMode::Accumulator => "A".to_string(),
            CpuMode::Immediate8 => format!("#${byte:02x}"),
            CpuMode::Immediate16 => format!("#${word:04x}"),
            CpuMode::Absolute | CpuMode::AbsoluteProgram => {
                format!("${word:04x}")
            }
            CpuMode::AbsoluteX { .. } => format!("${word:04x}, X"),
            CpuMode::AbsoluteY { .. } => format!("${word:04x}, Y"),
            CpuMode::AbsoluteLong => format!("${:06x}", operand.long()),
            CpuMode::AbsoluteLongX => format!("${:06x}, X", operand.long()),
            CpuMode::AbsoluteIndirect => format!("(${word:04x})"),
            CpuMode::AbsoluteIndirectLong => format!("[${word:04x}]"),
            CpuMode::AbsoluteIndexedIndirect => format!("(${word:04x}, X)"),
            CpuMode::Direct => format!("${byte:02x}"),
            CpuMode::DirectX => format!("${byte:02x}, X"),
            CpuMode::DirectY => format!("${byte:02x}, Y"),
            CpuMode::DirectIndirect | CpuMode::DirectPointer => {
                format!("(${byte:02x})")
            }
            CpuMode::DirectIndirectLong => format!("[${byte:02x}]"),
            CpuMode::DirectIndexedIndirect => format!("(${byte:02x}, X)"),
            CpuMode::DirectIndirectIndexed { .. } => {
                format!("(${byte:02x}), Y")
            }
            CpuMode::DirectIndirectLongIndexed => format!("[${byte:02x}], Y"),
            CpuMode::StackRelative => format!("${byte:02x}, S"),
            CpuMode::StackRelativeIndirectIndexed => {
                format!("(${byte:02x}, S), Y")
            }
            CpuMode::Relative8 => {
                branch_target(next, i16::from(byte as i8) as u16)
            }
            CpuMode::Relative16 => branch_target(next, word),
            CpuMode::BlockMove => {
                let (dst, src) = (operand.byte(0), operand.byte(1));
                format!("#${src:02x}, #${dst:02x}")
            }
        }
    }

    fn resolve(
        &self,
        core: &mut CpuCore,
        operand: &OperandBytes,
    ) -> Result<OperandLocation> {
        let byte = operand.byte(0);
        let word = Word(operand.word());
        let (dbr, pbr) = (core.state.dbr, core.state.pbr);
        let (x, y) = (core.state.reg_x, core.state.reg_y);
        let location = match *self {
            CpuMode::Implied => OperandLocation::Implied,
            CpuMode::Accumulator => OperandLocation::Accumulator,
            CpuMode::Immediate8 => {
                OperandLocation::Immediate(Word(byte.into()))
            }
            CpuMode::Immediate16 => OperandLocation::Immediate(word),
            CpuMode::Absolute => {
                memory(Long::from_parts(word, dbr), Wrap::Full)
            }
            CpuMode::AbsoluteProgram => {
                memory(Long::from_parts(word, pbr), Wrap::Bank)
            }
            CpuMode::AbsoluteX { .. } => {
                let base = Long::from_parts(word, dbr);
                memory(indexed(core, base, x), Wrap::Full)
            }
            CpuMode::AbsoluteY { .. } => {
                let base = Long::from_parts(word, dbr);
                memory(indexed(core, base, y), Wrap::Full)
            }
            CpuMode::AbsoluteLong => {
                memory(Long::new(operand.long()), Wrap::Full)
            }
            CpuMode::AbsoluteLongX => {
                let base = Long::new(operand.long());
                let address = base.wrapping_add(x.0.into());
                memory(address, Wrap::Full)
            }
            CpuMode::AbsoluteIndirect => {
                let pointer = Long::from_parts(word, Byte(0));
                let target = core.memory.read_word(pointer, Wrap::Bank)?;
                memory(Long::from_parts(target, pbr), Wrap::Bank)
            }
            CpuMode::AbsoluteIndirectLong => {
                let pointer = Long::from_parts(word, Byte(0));
                let target = core.memory.read_long(pointer, Wrap::Bank)?;
                memory(target, Wrap::Bank)
            }
            CpuMode::AbsoluteIndexedIndirect => {
                let pointer = Long::from_parts(word.wrapping_add(x.0), pbr);
                let target = core.memory.read_word(pointer, Wrap::Bank)?;
                memory(Long::from_parts(target, pbr), Wrap::Bank)
            }
            CpuMode::Direct | CpuMode::DirectPointer => {
                memory(direct_address(core, byte, Word(0)), Wrap::Bank)
            }
            CpuMode::DirectX => {
                memory(direct_address(core, byte, x), Wrap::Bank)
            }
            CpuMode::DirectY => {
                memory(direct_address(core, byte, y), Wrap::Bank)
            }
            CpuMode::DirectIndirect => {
                let pointer = direct_address(core, byte, Word(0));
                let target = core.memory.read_word(pointer, Wrap::Bank)?;
                memory(Long::from_parts(target, dbr), Wrap::Full)
            }
            CpuMode::DirectIndirectLong => {
                let pointer = direct_address(core, byte, Word(0));
                let target = core.memory.read_long(pointer, Wrap::Bank)?;
                memory(target, Wrap::Full)
            }
            CpuMode::DirectIndexedIndirect => {
                let pointer = direct_address(core, byte, x);
                let target = core.memory.read_word(pointer, Wrap::Bank)?;
                memory(Long::from_parts(target, dbr), Wrap::Full)
            }
            CpuMode::DirectIndirectIndexed { .. } => {
                let pointer = direct_address(core, byte, Word(0));
                let target = core.memory.read_word(pointer, Wrap::Bank)?;
                let base = Long::from_parts(target, dbr);
                memory(indexed(core, base, y), Wrap::Full)
            }
            CpuMode::DirectIndirectLongIndexed => {
                let pointer = direct_address(core, byte, Word(0));
                let base = core.memory.read_long(pointer, Wrap::Bank)?;
                memory(base.wrapping_add(y.0.into()), Wrap::Full)
            }
            CpuMode::StackRelative => {
                let offset = core.state.reg_s.wrapping_add(byte.into());
                memory(Long::from_parts(offset, Byte(0)), Wrap::Bank)
            }
            CpuMode::StackRelativeIndirectIndexed => {
                let offset = core.state.reg_s.wrapping_add(byte.into());
                let pointer = Long::from_parts(offset, Byte(0));
                let target = core.memory.read_word(pointer, Wrap::Bank)?;
                let base = Long::from_parts(target, dbr);
                memory(base.wrapping_add(y.0.into()), Wrap::Full)
            }
            CpuMode::Relative8 => relative(core, i16::from(byte as i8) as u16),
            CpuMode::Relative16 => relative(core, word.0),
            CpuMode::BlockMove => OperandLocation::Banks {
                source: Byte(operand.byte(1)),
                destination: Byte(byte),
            },
        };
        Ok(location)
    }

    fn remarks(&self) -> &'static [CycleRemark] {
        const DIRECT: &[CycleRemark] = &[CycleRemark::DirectPageUnaligned];
        const DIRECT_CROSS: &[CycleRemark] = &[
            CycleRemark::DirectPageUnaligned,
            CycleRemark::IndexPageCross,
        ];
        match self {
            CpuMode::Accumulator => &[CycleRemark::AccumulatorRmw],
            CpuMode::AbsoluteX { cross: true }
            | CpuMode::AbsoluteY { cross: true } => {
                &[CycleRemark::IndexPageCross]
            }
            CpuMode::DirectIndirectIndexed { cross: true } => DIRECT_CROSS,
            CpuMode::Direct
            | CpuMode::DirectX
            | CpuMode::DirectY
            | CpuMode::DirectIndirect
            | CpuMode::DirectIndirectLong
            | CpuMode::DirectIndexedIndirect
            | CpuMode::DirectIndirectIndexed { cross: false }
            | CpuMode::DirectIndirectLongIndexed
            | CpuMode::DirectPointer => DIRECT,
            _ => &[],
        }
    }
}

//===========================================================================//
