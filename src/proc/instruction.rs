use super::cycles::{Conditions, CycleRemark, combine_remarks, total_cycles};
use crate::error::Result;
use std::borrow::Cow;
use std::marker::PhantomData;

//===========================================================================//

/// The operand bytes that follow an opcode byte.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct OperandBytes {
    bytes: [u8; 3],
    len: u8,
}

impl OperandBytes {
    /// Packs up to three operand bytes.
    pub fn new(bytes: &[u8]) -> OperandBytes {
        let mut operand = OperandBytes::default();
        for (slot, &byte) in operand.bytes.iter_mut().zip(bytes) {
            *slot = byte;
            operand.len += 1;
        }
        operand
    }

    /// Returns the number of operand bytes.
    pub fn len(&self) -> usize {
        usize::from(self.len)
    }

    /// Returns true if the instruction has no operand bytes.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the operand byte at `index`.
    pub fn byte(&self, index: usize) -> u8 {
        self.bytes[index]
    }

    /// Returns the first two operand bytes as a little-endian word.
    pub fn word(&self) -> u16 {
        u16::from_le_bytes([self.bytes[0], self.bytes[1]])
    }

    /// Returns all three operand bytes as a little-endian 24-bit value.
    pub fn long(&self) -> u32 {
        u32::from_le_bytes([self.bytes[0], self.bytes[1], self.bytes[2], 0])
    }
}

//===========================================================================//

/// The processor-facing side of instruction execution: what an addressing
/// mode and an operator are executed against.
pub trait Core {
    /// Where an addressing mode says an operand lives.
    type Location;

    /// Records the conditions that hold before an instruction executes and
    /// clears those recorded by the previous one.
    fn begin_instruction(&mut self);

    /// Returns the conditions recorded for the current instruction.
    fn conditions(&self) -> &Conditions;

    /// Returns the conditions for the current instruction for updating.
    fn conditions_mut(&mut self) -> &mut Conditions;

    /// Fetches `len` operand bytes at the program counter with the apply
    /// access, advancing the program counter past them.
    fn fetch_operand(&mut self, len: u8) -> Result<OperandBytes>;

    /// Returns the `len` operand bytes that follow the opcode at `address`
    /// without side effects.
    fn peek_operand(&self, address: u32, len: u8) -> Result<OperandBytes>;
}

/// An operand shape: how many bytes follow the opcode, and how they turn
/// into an operand location.
pub trait AddressingMode<C: Core> {
    /// Returns the number of operand bytes.
    fn operand_size(&self) -> u8;

    /// Returns the operand syntax in the opcode listing, e.g. `dp,X`.
    fn syntax(&self) -> Cow<'static, str>;

    /// Formats the operand for disassembly.  `next` is the address of the
    /// following instruction.
    fn format(&self, operand: &OperandBytes, next: u32) -> String;

    /// Resolves fetched operand bytes to a location, recording any
    /// conditions the mode's cycle remarks depend on.
    fn resolve(
        &self,
        core: &mut C,
        operand: &OperandBytes,
    ) -> Result<C::Location>;

    /// Returns the cycle remarks that belong to this mode.
    fn remarks(&self) -> &'static [CycleRemark] {
        &[]
    }
}

/// The semantic effect of an instruction.
pub trait Operator<C: Core> {
    /// The instruction's mnemonic.
    const MNEMONIC: &'static str;

    /// The cycle remarks that belong to this operator.
    const REMARKS: &'static [CycleRemark] = &[];

    /// Applies the operator to a resolved operand location.
    fn invoke(core: &mut C, location: C::Location) -> Result<()>;
}

//===========================================================================//

/// One entry of an opcode table.
pub trait Instruction<C> {
    /// Returns the opcode byte.
    fn opcode(&self) -> u8;

    /// Returns the instruction length in bytes, including the opcode.
    fn size(&self) -> u8;

    /// Returns the base cycle count.
    fn base_cycles(&self) -> u8;

    /// Returns the opcode listing entry, e.g. `A5: LDA dp`.
    fn opcode_to_string(&self) -> String;

    /// Disassembles the instruction whose opcode byte is at `address`.
    fn disassemble(&self, core: &C, address: u32) -> String;

    /// Executes the instruction, whose opcode byte has already been
    /// fetched, and returns the number of cycles it took.
    fn execute(&self, core: &mut C) -> Result<u32>;

    /// Returns the cycle remarks that apply to this instruction.
    fn remarks(&self) -> Vec<CycleRemark>;
}

/// An instruction built by pairing an addressing mode with an operator.
pub struct Opcode<M, O> {
    code: u8,
    cycles: u8,
    mode: M,
    remarks: Vec<CycleRemark>,
    operator: PhantomData<O>,
}

impl<M, O> Opcode<M, O> {
    /// Creates an opcode with the given opcode byte, base cycle count, and
    /// addressing mode.
    pub fn new<C>(code: u8, cycles: u8, mode: M) -> Opcode<M, O>
    where
        C: Core,
        M: AddressingMode<C>,
        O: Operator<C>,
    {
        let remarks = combine_remarks(mode.remarks(), O::REMARKS);
        Opcode { code, cycles, mode, remarks, operator: PhantomData }
    }
}

impl<C, M, O> Instruction<C> for Opcode<M, O>
where
    C: Core,
    M: AddressingMode<C>,
    O: Operator<C>,
{
    fn opcode(&self) -> u8 {
        self.code
    }

    fn size(&self) -> u8 {
        1 + self.mode.operand_size()
    }

    fn base_cycles(&self) -> u8 {
        self.cycles
    }

    fn opcode_to_string(&self) -> String {
        let syntax = self.mode.syntax();
        if syntax.is_empty() {
            format!("{:02X}: {}", self.code, O::MNEMONIC)
        } else {
            format!("{:02X}: {} {}", self.code, O::MNEMONIC, syntax)
        }
    }

    fn disassemble(&self, core: &C, address: u32) -> String {
        let size = self.mode.operand_size();
        let next = address.wrapping_add(u32::from(self.size()));
        match core.peek_operand(address, size) {
            Ok(operand) => {
                let text = self.mode.format(&operand, next);
                if text.is_empty() {
                    O::MNEMONIC.to_string()
                } else {
                    format!("{} {}", O::MNEMONIC, text)
                }
            }
            Err(_) => format!("{} ???", O::MNEMONIC),
        }
    }

    fn execute(&self, core: &mut C) -> Result<u32> {
        core.begin_instruction();
        let operand = core.fetch_operand(self.mode.operand_size())?;
        let location = self.mode.resolve(core, &operand)?;
        O::invoke(core, location)?;
        Ok(total_cycles(self.cycles, &self.remarks, core.conditions()))
    }

    fn remarks(&self) -> Vec<CycleRemark> {
        self.remarks.clone()
    }
}

//===========================================================================//

/// A 256-slot table mapping opcode bytes to the instructions that
/// implement them.  Partial tables hold width-specific overrides.
pub struct OpcodeTable<C> {
    slots: Vec<Option<Box<dyn Instruction<C>>>>,
}

impl<C> Default for OpcodeTable<C> {
    fn default() -> OpcodeTable<C> {
        OpcodeTable { slots: (0..0x100).map(|_| None).collect() }
    }
}

impl<C> OpcodeTable<C> {
    /// Builds a table from a list of instructions, each of which lands in
    /// the slot named by its own opcode byte.
    pub fn from_instructions(
        instructions: Vec<Box<dyn Instruction<C>>>,
    ) -> OpcodeTable<C> {
        let mut table = OpcodeTable::default();
        for instruction in instructions {
            let slot = usize::from(instruction.opcode());
            debug_assert!(
                table.slots[slot].is_none(),
                "opcode {slot:02X} listed twice"
            );
            table.slots[slot] = Some(instruction);
        }
        table
    }

    /// Returns the instruction for `opcode`, if this table has one.
    pub fn get(&self, opcode: u8) -> Option<&dyn Instruction<C>> {
        self.slots[usize::from(opcode)].as_deref()
    }

    /// Returns the number of occupied slots.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Returns true if no slot is occupied.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterates over the occupied slots in opcode order.
    pub fn iter(&self) -> impl Iterator<Item = &dyn Instruction<C>> + '_ {
        self.slots.iter().filter_map(|slot| slot.as_deref())
    }
}

//===========================================================================//

#[cfg(test)]
mod tests {
    use super::OperandBytes;

    #[test]
    fn operand_bytes() {
        let operand = OperandBytes::new(&[0x34, 0x12, 0x7e]);
        assert_eq!(operand.len(), 3);
        assert_eq!(operand.byte(2), 0x7e);
        assert_eq!(operand.word(), 0x1234);
        assert_eq!(operand.long(), 0x7e_1234);
        assert!(OperandBytes::new(&[]).is_empty());
    }
}

//===========================================================================//
