use super::SpcCore;
use crate::bus::Wrap;
use crate::error::Result;
use crate::proc::{AddressingMode, OperandBytes};
use crate::value::{Byte, Word};
use std::borrow::Cow;

//===========================================================================//

const VECTOR_TCALL_0: u16 = 0xffde;

//===========================================================================//

/// A register an SPC700 operand can name.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SpcRegister {
    /// The accumulator.
    A,
    /// The X index register.
    X,
    /// The Y index register.
    Y,
    /// The stack pointer.
    Sp,
    /// The program status word.
    Psw,
    /// The Y:A pair.
    Ya,
}

/// Where one SPC700 operand lives once its addressing mode is resolved.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SpcOperand {
    /// No operand in this position.
    None,
    /// A register.
    Register(SpcRegister),
    /// The carry flag, for the single-bit instructions.
    Carry,
    /// The value embedded in the instruction.
    Immediate(Byte),
    /// A byte (or the low byte of a word) on the bus.
    Memory(Word),
    /// One bit of a byte on the bus.
    Bit {
        /// The byte's address.
        address: Word,
        /// The bit index, 0 to 7.
        bit: u8,
    },
    /// The complement of one bit of a byte on the bus.
    NegatedBit {
        /// The byte's address.
        address: Word,
        /// The bit index, 0 to 7.
        bit: u8,
    },
    /// The destination of a jump, call or branch.
    Target(Word),
}

/// The resolved operands of an SPC700 instruction, destination first.
pub type SpcOperands = (SpcOperand, SpcOperand);

//===========================================================================//

/// The shape of one SPC700 operand.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SpcArg {
    /// No operand.
    None,
    /// `A`.
    A,
    /// `X`.
    X,
    /// `Y`.
    Y,
    /// `SP`.
    Sp,
    /// `PSW`.
    Psw,
    /// `YA`.
    Ya,
    /// `C`.
    Carry,
    /// `#i`.
    Immediate,
    /// `d`.
    Direct,
    /// `d+X`.
    DirectX,
    /// `d+Y`.
    DirectY,
    /// `!a`.
    Absolute,
    /// `!a+X`.
    AbsoluteX,
    /// `!a+Y`.
    AbsoluteY,
    /// `(X)`.
    IndirectX,
    /// `(Y)`.
    IndirectY,
    /// `(X)+`: X is incremented once the address is taken.
    IndirectXIncrement,
    /// `[d+X]`.
    DirectXIndirect,
    /// `[d]+Y`.
    DirectIndirectY,
    /// `d.n`, with the bit index in the opcode.
    DirectBit(u8),
    /// `m.b`: a 13-bit address and a 3-bit bit index.
    MemoryBit,
    /// `/m.b`.
    NegatedMemoryBit,
    /// `r`: an 8-bit branch displacement.
    Relative,
    /// `[!a+X]`, for jumps.
    AbsoluteXIndirect,
    /// `u`: an address in the top page, for PCALL.
    HighPage,
    /// A TCALL vector number, 0 to 15.
    Table(u8),
}

impl SpcArg {
    fn size(self) -> u8 {
        match self {
            SpcArg::Immediate
            | SpcArg::Direct
            | SpcArg::DirectX
            | SpcArg::DirectY
            | SpcArg::DirectXIndirect
            | SpcArg::DirectIndirectY
            | SpcArg::DirectBit(_)
            | SpcArg::Relative
            | SpcArg::HighPage => 1,
            SpcArg::Absolute
            | SpcArg::AbsoluteX
            | SpcArg::AbsoluteY
            | SpcArg::MemoryBit
            | SpcArg::NegatedMemoryBit
            | SpcArg::AbsoluteXIndirect => 2,
            _ => 0,
        }
    }

    fn syntax(self) -> Cow<'static, str> {
        let syntax = match self {
            SpcArg::None => "",
            SpcArg::A => "A",
            SpcArg::X => "X",
            SpcArg::Y => "Y",
            SpcArg::Sp => "SP",
            SpcArg::Psw => "PSW",
            SpcArg::Ya => "YA",
            SpcArg::Carry => "C",
            SpcArg::Immediate => "#i",
            SpcArg::Direct => "d",
            SpcArg::DirectX => "d+X",
            SpcArg::DirectY => "d+Y",
            SpcArg::Absolute => "!a",
            SpcArg::AbsoluteX => "!a+X",
            SpcArg::AbsoluteY => "!a+Y",
            SpcArg::IndirectX => "(X)",
            SpcArg::IndirectY => "(Y)",
            SpcArg::IndirectXIncrement => "(X)+",
            SpcArg::DirectXIndirect => "[d+X]",
            SpcArg::DirectIndirectY => "[d]+Y",
            SpcArg::DirectBit(bit) => return format!("d.{bit}").into(),
            SpcArg::MemoryBit => "m.b",
            SpcArg::NegatedMemoryBit => "/m.b",
            SpcArg::Relative => "r",
            SpcArg::AbsoluteXIndirect => "[!a+X]",
            SpcArg::HighPage => "u",
            SpcArg::Table(index) => return index.to_string().into(),
        };
        Cow::Borrowed(syntax)
    }

    fn format(
        self,
        operand: &OperandBytes,
        offset: usize,
        next: u32,
    ) -> String {
        let byte = operand.byte(offset);
        let word = word_at(operand, offset);
        match self {
            SpcArg::Immediate => format!("#${byte:02x}"),
            SpcArg::Direct | SpcArg::HighPage => format!("${byte:02x}"),
            SpcArg::DirectX => format!("${byte:02x} + X"),
            SpcArg::DirectY => format!("${byte:02x} + Y"),
            SpcArg::Absolute => format!("!${word:04x}"),
            SpcArg::AbsoluteX => format!("!${word:04x} + X"),
            SpcArg::AbsoluteY => format!("!${word:04x} + Y"),
            SpcArg::DirectXIndirect => format!("[${byte:02x} + X]"),
            SpcArg::DirectIndirectY => format!("[${byte:02x}] + Y"),
            SpcArg::DirectBit(bit) => format!("${byte:02x}.{bit}"),
            SpcArg::MemoryBit => {
                format!("${:04x}.{}", word & 0x1fff, word >> 13)
            }
            SpcArg::NegatedMemoryBit => {
                format!("/${:04x}.{}", word & 0x1fff, word >> 13)
            }
            SpcArg::Relative => {
                let target = (next as u16).wrapping_add(byte as i8 as u16);
                format!("${target:04x}")
            }
            SpcArg::AbsoluteXIndirect => format!("[!${word:04x} + X]"),
            other => other.syntax().into_owned(),
        }
    }

    fn resolve(
        self,
        core: &mut SpcCore,
        operand: &OperandBytes,
        offset: usize,
    ) -> Result<SpcOperand> {
        let byte = operand.byte(offset);
        let word = word_at(operand, offset);
        let state = &mut core.state;
        let page = state.direct_page();
        let direct = |low: u8| Word(page | u16::from(low));
        let resolved = match self {
            SpcArg::None => SpcOperand::None,
            SpcArg::A => SpcOperand::Register(SpcRegister::A),
            SpcArg::X => SpcOperand::Register(SpcRegister::X),
            SpcArg::Y => SpcOperand::Register(SpcRegister::Y),
            SpcArg::Sp => SpcOperand::Register(SpcRegister::Sp),
            SpcArg::Psw => SpcOperand::Register(SpcRegister::Psw),
            SpcArg::Ya => SpcOperand::Register(SpcRegister::Ya),
            SpcArg::Carry => SpcOperand::Carry,
            SpcArg::Immediate => SpcOperand::Immediate(Byte(byte)),
            SpcArg::Direct => SpcOperand::Memory(direct(byte)),
            SpcArg::DirectX => {
                SpcOperand::Memory(direct(byte.wrapping_add(state.x.0)))
            }
            SpcArg::DirectY => {
                SpcOperand::Memory(direct(byte.wrapping_add(state.y.0)))
            }
            SpcArg::Absolute => SpcOperand::Memory(Word(word)),
            SpcArg::AbsoluteX => {
                SpcOperand::Memory(Word(word).wrapping_add(state.x.0.into()))
            }
            SpcArg::AbsoluteY => {
                SpcOperand::Memory(Word(word).wrapping_add(state.y.0.into()))
            }
            SpcArg::IndirectX => SpcOperand::Memory(direct(state.x.0)),
            SpcArg::IndirectY => SpcOperand::Memory(direct(state.y.0)),
            SpcArg::IndirectXIncrement => {
                let address = direct(state.x.0);
                state.x = state.x.wrapping_add(1);
                SpcOperand::Memory(address)
            }
            SpcArg::DirectXIndirect => {
                let pointer = direct(byte.wrapping_add(state.x.0));
                let address = core.memory.read_word(pointer, Wrap::Page)?;
                SpcOperand::Memory(address)
            }
            SpcArg::DirectIndirectY => {
                let y = state.y.0;
                let base = core.memory.read_word(direct(byte), Wrap::Page)?;
                SpcOperand::Memory(base.wrapping_add(y.into()))
            }
            SpcArg::DirectBit(bit) => {
                SpcOperand::Bit { address: direct(byte), bit }
            }
            SpcArg::MemoryBit => SpcOperand::Bit {
                address: Word(word & 0x1fff),
                bit: (word >> 13) as u8,
            },
            SpcArg::NegatedMemoryBit => SpcOperand::NegatedBit {
                address: Word(word & 0x1fff),
                bit: (word >> 13) as u8,
            },
            SpcArg::Relative => {
                let displacement = byte as i8 as u16;
                SpcOperand::Target(state.pc.wrapping_add(displacement))
            }
            SpcArg::AbsoluteXIndirect => {
                let pointer = Word(word).wrapping_add(state.x.0.into());
                let target = core.memory.read_word(pointer, Wrap::Full)?;
                SpcOperand::Target(target)
            }
            SpcArg::HighPage => {
                SpcOperand::Target(Word(0xff00 | u16::from(byte)))
            }
            SpcArg::Table(index) => {
                let vector = Word(VECTOR_TCALL_0 - 2 * u16::from(index));
                SpcOperand::Target(core.memory.read_word(vector, Wrap::Full)?)
            }
        };
        Ok(resolved)
    }
}

fn word_at(operand: &OperandBytes, offset: usize) -> u16 {
    let high = if offset + 1 < operand.len() {
        operand.byte(offset + 1)
    } else {
        0
    };
    u16::from_le_bytes([operand.byte(offset), high])
}

//===========================================================================//

/// An SPC700 operand shape: a destination and a source.  Instructions with
/// a single operand leave the source empty.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SpcMode {
    dst: SpcArg,
    src: SpcArg,
}

impl SpcMode {
    /// An instruction without operands.
    pub const IMPLIED: SpcMode = SpcMode::unary(SpcArg::None);

    /// A two-operand shape.
    pub const fn new(dst: SpcArg, src: SpcArg) -> SpcMode {
        SpcMode { dst, src }
    }

    /// A one-operand shape.
    pub const fn unary(dst: SpcArg) -> SpcMode {
        SpcMode { dst, src: SpcArg::None }
    }

    /// Returns the offsets of the destination's and source's operand bytes.
    /// The source's bytes come first, except that a branch displacement
    /// always comes last.
    fn offsets(&self) -> (usize, usize) {
        if self.src == SpcArg::Relative {
            (0, usize::from(self.dst.size()))
        } else {
            (usize::from(self.src.size()), 0)
        }
    }
}

impl AddressingMode<SpcCore> for SpcMode {
    fn operand_size(&self) -> u8 {
        self.dst.size() + self.src.size()
    }

    fn syntax(&self) -> Cow<'static, str> {
        match (self.dst, self.src) {
            (SpcArg::Direct, SpcArg::Direct) => Cow::Borrowed("dd, ds"),
            (dst, SpcArg::None) => dst.syntax(),
            (dst, src) => {
                format!("{}, {}", dst.syntax(), src.syntax()).into()
            }
        }
    }

    fn format(&self, operand: &OperandBytes, next: u32) -> String {
        let (dst_offset, src_offset) = self.offsets();
        let dst = self.dst.format(operand, dst_offset, next);
        if self.src == SpcArg::None {
            dst
        } else {
            let src = self.src.format(operand, src_offset, next);
            format!("{dst}, {src}")
        }
    }

    fn resolve(
        &self,
        core: &mut SpcCore,
        operand: &OperandBytes,
    ) -> Result<SpcOperands> {
        let (dst_offset, src_offset) = self.offsets();
        let dst = self.dst.resolve(core, operand, dst_offset)?;
        let src = self.src.resolve(core, operand, src_offset)?;
        Ok((dst, src))
    }
}

//===========================================================================//


//===========================================================================//
