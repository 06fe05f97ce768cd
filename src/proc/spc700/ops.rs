//! The SPC700's operators.  Each one receives its destination and source
//! operands already resolved; most accept any operand shape the opcode
//! table pairs them with.

use super::SpcCore;
use super::modes::{SpcOperand, SpcOperands, SpcRegister};
use super::state::{
    PSW_FLAG_B, PSW_FLAG_C, PSW_FLAG_H, PSW_FLAG_I, PSW_FLAG_N, PSW_FLAG_P,
    PSW_FLAG_V, PSW_FLAG_Z,
};
use crate::error::{EmuError, Result};
use crate::proc::{Core, CycleRemark, Operator};
use crate::value::{Byte, Sum, Word, binary_add, binary_subtract};
use log::warn;

//===========================================================================//

const VECTOR_BREAK: u16 = 0xffde;

const BRANCH: &[CycleRemark] = &[CycleRemark::BranchTakenTwice];

fn target(operand: SpcOperand) -> Result<Word> {
    match operand {
        SpcOperand::Memory(address) | SpcOperand::Target(address) => {
            Ok(address)
        }
        other => Err(EmuError::not_implemented(format!(
            "control transfer through {other:?}"
        ))),
    }
}

fn branch(core: &mut SpcCore, operand: SpcOperand, taken: bool) -> Result<()> {
    let destination = target(operand)?;
    if taken {
        core.state.pc = destination;
        core.conditions_mut().branch_taken = true;
    }
    Ok(())
}

fn is_register(operand: SpcOperand) -> bool {
    matches!(
        operand,
        SpcOperand::Register(SpcRegister::A | SpcRegister::X | SpcRegister::Y)
    )
}

fn set_arithmetic_flags<T>(core: &mut SpcCore, sum: &Sum<T>) {
    core.state.set_flag(PSW_FLAG_V, sum.overflow);
    core.state.set_flag(PSW_FLAG_H, sum.half_carry);
    core.state.set_flag(PSW_FLAG_C, sum.carry);
}

//===========================================================================//
// Arithmetic and logic

/// MOV, in all its forms.  Loading a register updates N and Z, except for
/// `MOV SP, X`; storing to memory leaves the flags alone.
pub struct Mov;

impl Operator<SpcCore> for Mov {
    const MNEMONIC: &'static str = "MOV";

    fn invoke(core: &mut SpcCore, (dst, src): SpcOperands) -> Result<()> {
        let value = core.read(src)?;
        core.write(dst, value)?;
        if is_register(dst) {
            core.state.update_nz(value);
        }
        Ok(())
    }
}

/// ADC: add with carry.
pub struct Adc;

impl Operator<SpcCore> for Adc {
    const MNEMONIC: &'static str = "ADC";

    fn invoke(core: &mut SpcCore, (dst, src): SpcOperands) -> Result<()> {
        let b = core.read(src)?;
        let a = core.read(dst)?;
        let sum = binary_add(a, b, core.state.get_flag(PSW_FLAG_C));
        set_arithmetic_flags(core, &sum);
        core.state.update_nz(sum.value);
        core.write(dst, sum.value)
    }
}

/// SBC: subtract with borrow.
pub struct Sbc;

impl Operator<SpcCore> for Sbc {
    const MNEMONIC: &'static str = "SBC";

    fn invoke(core: &mut SpcCore, (dst, src): SpcOperands) -> Result<()> {
        let b = core.read(src)?;
        let a = core.read(dst)?;
        let sum = binary_subtract(a, b, core.state.get_flag(PSW_FLAG_C));
        set_arithmetic_flags(core, &sum);
        core.state.update_nz(sum.value);
        core.write(dst, sum.value)
    }
}

/// CMP: compare without storing.
pub struct Cmp;

impl Operator<SpcCore> for Cmp {
    const MNEMONIC: &'static str = "CMP";

    fn invoke(core: &mut SpcCore, (dst, src): SpcOperands) -> Result<()> {
        let b = core.read(src)?;
        let a = core.read(dst)?;
        let sum = binary_subtract(a, b, true);
        core.state.set_flag(PSW_FLAG_C, sum.carry);
        core.state.update_nz(sum.value);
        Ok(())
    }
}

fn logic(
    core: &mut SpcCore,
    (dst, src): SpcOperands,
    op: fn(Byte, Byte) -> Byte,
) -> Result<()> {
    let b = core.read(src)?;
    let a = core.read(dst)?;
    let value = op(a, b);
    core.state.update_nz(value);
    core.write(dst, value)
}

/// AND.
pub struct And;

impl Operator<SpcCore> for And {
    const MNEMONIC: &'static str = "AND";

    fn invoke(core: &mut SpcCore, operands: SpcOperands) -> Result<()> {
        logic(core, operands, |a, b| a & b)
    }
}

/// OR.
pub struct Or;

impl Operator<SpcCore> for Or {
    const MNEMONIC: &'static str = "OR";

    fn invoke(core: &mut SpcCore, operands: SpcOperands) -> Result<()> {
        logic(core, operands, |a, b| a | b)
    }
}

/// EOR: exclusive or.
pub struct Eor;

impl Operator<SpcCore> for Eor {
    const MNEMONIC: &'static str = "EOR";

    fn invoke(core: &mut SpcCore, operands: SpcOperands) -> Result<()> {
        logic(core, operands, |a, b| a ^ b)
    }
}

//===========================================================================//
// Read-modify-write

fn read_modify_write(
    core: &mut SpcCore,
    operand: SpcOperand,
    op: impl FnOnce(u8, bool) -> (u8, Option<bool>),
) -> Result<()> {
    let value = core.read(operand)?;
    let (result, carry) = op(value.0, core.state.get_flag(PSW_FLAG_C));
    if let Some(carry) = carry {
        core.state.set_flag(PSW_FLAG_C, carry);
    }
    core.state.update_nz(Byte(result));
    core.write(operand, Byte(result))
}

/// ASL: arithmetic shift left.
pub struct Asl;

impl Operator<SpcCore> for Asl {
    const MNEMONIC: &'static str = "ASL";

    fn invoke(core: &mut SpcCore, (dst, _): SpcOperands) -> Result<()> {
        read_modify_write(core, dst, |value, _| {
            (value << 1, Some(value & 0x80 != 0))
        })
    }
}

/// LSR: logical shift right.
pub struct Lsr;

impl Operator<SpcCore> for Lsr {
    const MNEMONIC: &'static str = "LSR";

    fn invoke(core: &mut SpcCore, (dst, _): SpcOperands) -> Result<()> {
        read_modify_write(core, dst, |value, _| {
            (value >> 1, Some(value & 0x01 != 0))
        })
    }
}

/// ROL: rotate left through carry.
pub struct Rol;

impl Operator<SpcCore> for Rol {
    const MNEMONIC: &'static str = "ROL";

    fn invoke(core: &mut SpcCore, (dst, _): SpcOperands) -> Result<()> {
        read_modify_write(core, dst, |value, carry| {
            ((value << 1) | u8::from(carry), Some(value & 0x80 != 0))
        })
    }
}

/// ROR: rotate right through carry.
pub struct Ror;

impl Operator<SpcCore> for Ror {
    const MNEMONIC: &'static str = "ROR";

    fn invoke(core: &mut SpcCore, (dst, _): SpcOperands) -> Result<()> {
        read_modify_write(core, dst, |value, carry| {
            ((value >> 1) | (u8::from(carry) << 7), Some(value & 0x01 != 0))
        })
    }
}

/// INC.
pub struct Inc;

impl Operator<SpcCore> for Inc {
    const MNEMONIC: &'static str = "INC";

    fn invoke(core: &mut SpcCore, (dst, _): SpcOperands) -> Result<()> {
        read_modify_write(core, dst, |value, _| (value.wrapping_add(1), None))
    }
}

/// DEC.
pub struct Dec;

impl Operator<SpcCore> for Dec {
    const MNEMONIC: &'static str = "DEC";

    fn invoke(core: &mut SpcCore, (dst, _): SpcOperands) -> Result<()> {
        read_modify_write(core, dst, |value, _| (value.wrapping_sub(1), None))
    }
}

/// XCN: exchange the accumulator's nibbles.
pub struct Xcn;

impl Operator<SpcCore> for Xcn {
    const MNEMONIC: &'static str = "XCN";

    fn invoke(core: &mut SpcCore, (dst, _): SpcOperands) -> Result<()> {
        read_modify_write(core, dst, |value, _| (value.rotate_left(4), None))
    }
}

/// DAA: decimal-adjust the accumulator after an addition.
pub struct Daa;

impl Operator<SpcCore> for Daa {
    const MNEMONIC: &'static str = "DAA";

    fn invoke(core: &mut SpcCore, _: SpcOperands) -> Result<()> {
        let state = &mut core.state;
        let mut a = state.a.0;
        if state.get_flag(PSW_FLAG_C) || a > 0x99 {
            a = a.wrapping_add(0x60);
            state.set_flag(PSW_FLAG_C, true);
        }
        if state.get_flag(PSW_FLAG_H) || (a & 0x0f) > 0x09 {
            a = a.wrapping_add(0x06);
        }
        state.a = Byte(a);
        state.update_nz(state.a);
        Ok(())
    }
}

/// DAS: decimal-adjust the accumulator after a subtraction.
pub struct Das;

impl Operator<SpcCore> for Das {
    const MNEMONIC: &'static str = "DAS";

    fn invoke(core: &mut SpcCore, _: SpcOperands) -> Result<()> {
        let state = &mut core.state;
        let mut a = state.a.0;
        if !state.get_flag(PSW_FLAG_C) || a > 0x99 {
            a = a.wrapping_sub(0x60);
            state.set_flag(PSW_FLAG_C, false);
        }
        if !state.get_flag(PSW_FLAG_H) || (a & 0x0f) > 0x09 {
            a = a.wrapping_sub(0x06);
        }
        state.a = Byte(a);
        state.update_nz(state.a);
        Ok(())
    }
}

//===========================================================================//
// 16-bit operations

/// MOVW: move a word between YA and the direct page.  Only loading YA
/// updates the flags.
pub struct Movw;

impl Operator<SpcCore> for Movw {
    const MNEMONIC: &'static str = "MOVW";

    fn invoke(core: &mut SpcCore, (dst, src): SpcOperands) -> Result<()> {
        let value = core.read_word(src)?;
        core.write_word(dst, value)?;
        if dst == SpcOperand::Register(SpcRegister::Ya) {
            core.state.update_nz_word(value);
        }
        Ok(())
    }
}

fn step_word(
    core: &mut SpcCore,
    operand: SpcOperand,
    delta: i16,
) -> Result<()> {
    let value = core.read_word(operand)?.offset(delta);
    core.state.update_nz_word(value);
    core.write_word(operand, value)
}

/// INCW: increment a direct-page word.
pub struct Incw;

impl Operator<SpcCore> for Incw {
    const MNEMONIC: &'static str = "INCW";

    fn invoke(core: &mut SpcCore, (dst, _): SpcOperands) -> Result<()> {
        step_word(core, dst, 1)
    }
}

/// DECW: decrement a direct-page word.
pub struct Decw;

impl Operator<SpcCore> for Decw {
    const MNEMONIC: &'static str = "DECW";

    fn invoke(core: &mut SpcCore, (dst, _): SpcOperands) -> Result<()> {
        step_word(core, dst, -1)
    }
}

/// ADDW: add a direct-page word to YA, ignoring the incoming carry.
pub struct Addw;

impl Operator<SpcCore> for Addw {
    const MNEMONIC: &'static str = "ADDW";

    fn invoke(core: &mut SpcCore, (dst, src): SpcOperands) -> Result<()> {
        let b = core.read_word(src)?;
        let a = core.read_word(dst)?;
        let sum = binary_add(a, b, false);
        set_arithmetic_flags(core, &sum);
        core.state.update_nz_word(sum.value);
        core.write_word(dst, sum.value)
    }
}

/// SUBW: subtract a direct-page word from YA, ignoring the incoming carry.
pub struct Subw;

impl Operator<SpcCore> for Subw {
    const MNEMONIC: &'static str = "SUBW";

    fn invoke(core: &mut SpcCore, (dst, src): SpcOperands) -> Result<()> {
        let b = core.read_word(src)?;
        let a = core.read_word(dst)?;
        let sum = binary_subtract(a, b, true);
        set_arithmetic_flags(core, &sum);
        core.state.update_nz_word(sum.value);
        core.write_word(dst, sum.value)
    }
}

/// CMPW: compare YA with a direct-page word.
pub struct Cmpw;

impl Operator<SpcCore> for Cmpw {
    const MNEMONIC: &'static str = "CMPW";

    fn invoke(core: &mut SpcCore, (dst, src): SpcOperands) -> Result<()> {
        let b = core.read_word(src)?;
        let a = core.read_word(dst)?;
        let sum = binary_subtract(a, b, true);
        core.state.set_flag(PSW_FLAG_C, sum.carry);
        core.state.update_nz_word(sum.value);
        Ok(())
    }
}

/// MUL: YA = Y * A.  N and Z follow Y.
pub struct Mul;

impl Operator<SpcCore> for Mul {
    const MNEMONIC: &'static str = "MUL";

    fn invoke(core: &mut SpcCore, _: SpcOperands) -> Result<()> {
        let state = &mut core.state;
        let product = u16::from(state.y.0) * u16::from(state.a.0);
        state.set_ya(Word(product));
        state.update_nz(state.y);
        Ok(())
    }
}

/// DIV: A = YA / X, Y = YA % X.  A quotient too large for nine bits, or a
/// zero divisor, produces the same garbage the hardware's shift-subtract
/// divider does.  N and Z follow A.
pub struct Div;

impl Operator<SpcCore> for Div {
    const MNEMONIC: &'static str = "DIV";

    fn invoke(core: &mut SpcCore, _: SpcOperands) -> Result<()> {
        let state = &mut core.state;
        let ya = u32::from(state.ya().0);
        let x = u32::from(state.x.0);
        let y = u32::from(state.y.0);
        state.set_flag(PSW_FLAG_H, (y & 0x0f) >= (x & 0x0f));
        state.set_flag(PSW_FLAG_V, y >= x);
        let (quotient, remainder) = if y < (x << 1) {
            (ya / x, ya % x)
        } else {
            let excess = ya - (x << 9);
            (255 - excess / (256 - x), x + excess % (256 - x))
        };
        state.a = Byte(quotient as u8);
        state.y = Byte(remainder as u8);
        state.update_nz(state.a);
        Ok(())
    }
}

//===========================================================================//
// Single bits

/// SET1 and CLR1: set or clear one bit of a direct-page byte.
pub struct SetBit<const VALUE: bool>;

impl<const VALUE: bool> Operator<SpcCore> for SetBit<VALUE> {
    const MNEMONIC: &'static str = if VALUE { "SET1" } else { "CLR1" };

    fn invoke(core: &mut SpcCore, (dst, _): SpcOperands) -> Result<()> {
        core.write_bit(dst, VALUE)
    }
}

/// TSET1 and TCLR1: test the accumulator's bits against memory, then set
/// or clear them there.
pub struct TestBits<const SET: bool>;

impl<const SET: bool> Operator<SpcCore> for TestBits<SET> {
    const MNEMONIC: &'static str = if SET { "TSET1" } else { "TCLR1" };

    fn invoke(core: &mut SpcCore, (dst, _): SpcOperands) -> Result<()> {
        let value = core.read(dst)?;
        let a = core.state.a;
        core.state.update_nz(a.wrapping_sub(value.0));
        core.write(dst, if SET { value | a } else { value & !a })
    }
}

/// AND1: C &= bit.
pub struct And1;

impl Operator<SpcCore> for And1 {
    const MNEMONIC: &'static str = "AND1";

    fn invoke(core: &mut SpcCore, (dst, src): SpcOperands) -> Result<()> {
        let bit = core.read_bit(src)?;
        let carry = core.read_bit(dst)?;
        core.write_bit(dst, carry && bit)
    }
}

/// OR1: C |= bit.
pub struct Or1;

impl Operator<SpcCore> for Or1 {
    const MNEMONIC: &'static str = "OR1";

    fn invoke(core: &mut SpcCore, (dst, src): SpcOperands) -> Result<()> {
        let bit = core.read_bit(src)?;
        let carry = core.read_bit(dst)?;
        core.write_bit(dst, carry || bit)
    }
}

/// EOR1: C ^= bit.
pub struct Eor1;

impl Operator<SpcCore> for Eor1 {
    const MNEMONIC: &'static str = "EOR1";

    fn invoke(core: &mut SpcCore, (dst, src): SpcOperands) -> Result<()> {
        let bit = core.read_bit(src)?;
        let carry = core.read_bit(dst)?;
        core.write_bit(dst, carry != bit)
    }
}

/// NOT1: complement one bit in memory.
pub struct Not1;

impl Operator<SpcCore> for Not1 {
    const MNEMONIC: &'static str = "NOT1";

    fn invoke(core: &mut SpcCore, (dst, _): SpcOperands) -> Result<()> {
        let bit = core.read_bit(dst)?;
        core.write_bit(dst, !bit)
    }
}

/// MOV1: copy one bit between memory and the carry flag.
pub struct Mov1;

impl Operator<SpcCore> for Mov1 {
    const MNEMONIC: &'static str = "MOV1";

    fn invoke(core: &mut SpcCore, (dst, src): SpcOperands) -> Result<()> {
        let bit = core.read_bit(src)?;
        core.write_bit(dst, bit)
    }
}

//===========================================================================//
// Branches

/// The flag-testing branches.
pub struct Branch<const FLAG: u8, const SET: bool>;

impl<const FLAG: u8, const SET: bool> Operator<SpcCore>
    for Branch<FLAG, SET>
{
    const MNEMONIC: &'static str = match (FLAG, SET) {
        (PSW_FLAG_N, false) => "BPL",
        (PSW_FLAG_N, true) => "BMI",
        (PSW_FLAG_V, false) => "BVC",
        (PSW_FLAG_V, true) => "BVS",
        (PSW_FLAG_C, false) => "BCC",
        (PSW_FLAG_C, true) => "BCS",
        (PSW_FLAG_Z, false) => "BNE",
        _ => "BEQ",
    };
    const REMARKS: &'static [CycleRemark] = BRANCH;

    fn invoke(core: &mut SpcCore, (dst, _): SpcOperands) -> Result<()> {
        let taken = core.state.get_flag(FLAG) == SET;
        branch(core, dst, taken)
    }
}

/// BRA: branch always.
pub struct Bra;

impl Operator<SpcCore> for Bra {
    const MNEMONIC: &'static str = "BRA";
    const REMARKS: &'static [CycleRemark] = BRANCH;

    fn invoke(core: &mut SpcCore, (dst, _): SpcOperands) -> Result<()> {
        branch(core, dst, true)
    }
}

/// BBS and BBC: branch on one bit of a direct-page byte.
pub struct BranchBit<const SET: bool>;

impl<const SET: bool> Operator<SpcCore> for BranchBit<SET> {
    const MNEMONIC: &'static str = if SET { "BBS" } else { "BBC" };
    const REMARKS: &'static [CycleRemark] = BRANCH;

    fn invoke(core: &mut SpcCore, (dst, src): SpcOperands) -> Result<()> {
        let taken = core.read_bit(dst)? == SET;
        branch(core, src, taken)
    }
}

/// CBNE: compare memory with the accumulator and branch if not equal.
pub struct Cbne;

impl Operator<SpcCore> for Cbne {
    const MNEMONIC: &'static str = "CBNE";
    const REMARKS: &'static [CycleRemark] = BRANCH;

    fn invoke(core: &mut SpcCore, (dst, src): SpcOperands) -> Result<()> {
        let value = core.read(dst)?;
        let taken = value != core.state.a;
        branch(core, src, taken)
    }
}

/// DBNZ: decrement and branch if not zero.  The flags are unaffected.
pub struct Dbnz;

impl Operator<SpcCore> for Dbnz {
    const MNEMONIC: &'static str = "DBNZ";
    const REMARKS: &'static [CycleRemark] = BRANCH;

    fn invoke(core: &mut SpcCore, (dst, src): SpcOperands) -> Result<()> {
        let value = core.read(dst)?.wrapping_sub(1);
        core.write(dst, value)?;
        branch(core, src, value != Byte::ZERO)
    }
}

//===========================================================================//
// Jumps and calls

/// JMP.
pub struct Jmp;

impl Operator<SpcCore> for Jmp {
    const MNEMONIC: &'static str = "JMP";

    fn invoke(core: &mut SpcCore, (dst, _): SpcOperands) -> Result<()> {
        core.state.pc = target(dst)?;
        Ok(())
    }
}

fn call(core: &mut SpcCore, operand: SpcOperand) -> Result<()> {
    let destination = target(operand)?;
    core.push_word(core.state.pc)?;
    core.state.pc = destination;
    Ok(())
}

/// CALL: call a subroutine anywhere.
pub struct Call;

impl Operator<SpcCore> for Call {
    const MNEMONIC: &'static str = "CALL";

    fn invoke(core: &mut SpcCore, (dst, _): SpcOperands) -> Result<()> {
        call(core, dst)
    }
}

/// PCALL: call a subroutine in the top page.
pub struct Pcall;

impl Operator<SpcCore> for Pcall {
    const MNEMONIC: &'static str = "PCALL";

    fn invoke(core: &mut SpcCore, (dst, _): SpcOperands) -> Result<()> {
        call(core, dst)
    }
}

/// TCALL: call through one of the sixteen vectors below $FFE0.
pub struct Tcall;

impl Operator<SpcCore> for Tcall {
    const MNEMONIC: &'static str = "TCALL";

    fn invoke(core: &mut SpcCore, (dst, _): SpcOperands) -> Result<()> {
        call(core, dst)
    }
}

/// BRK: software interrupt through $FFDE.
pub struct Brk;

impl Operator<SpcCore> for Brk {
    const MNEMONIC: &'static str = "BRK";

    fn invoke(core: &mut SpcCore, _: SpcOperands) -> Result<()> {
        core.push_word(core.state.pc)?;
        core.push_byte(core.state.psw)?;
        core.state.set_flag(PSW_FLAG_B, true);
        core.state.set_flag(PSW_FLAG_I, false);
        core.state.pc = core.read_vector(VECTOR_BREAK)?;
        Ok(())
    }
}

/// RET: return from a subroutine.
pub struct Ret;

impl Operator<SpcCore> for Ret {
    const MNEMONIC: &'static str = "RET";

    fn invoke(core: &mut SpcCore, _: SpcOperands) -> Result<()> {
        core.state.pc = core.pull_word()?;
        Ok(())
    }
}

/// RET1: return from an interrupt, restoring the status word.
pub struct Ret1;

impl Operator<SpcCore> for Ret1 {
    const MNEMONIC: &'static str = "RET1";

    fn invoke(core: &mut SpcCore, _: SpcOperands) -> Result<()> {
        core.state.psw = core.pull_byte()?;
        core.state.pc = core.pull_word()?;
        Ok(())
    }
}

//===========================================================================//
// Stack

/// PUSH.
pub struct Push;

impl Operator<SpcCore> for Push {
    const MNEMONIC: &'static str = "PUSH";

    fn invoke(core: &mut SpcCore, (dst, _): SpcOperands) -> Result<()> {
        let value = core.read(dst)?;
        core.push_byte(value)
    }
}

/// POP.  The flags change only when PSW itself is popped.
pub struct Pop;

impl Operator<SpcCore> for Pop {
    const MNEMONIC: &'static str = "POP";

    fn invoke(core: &mut SpcCore, (dst, _): SpcOperands) -> Result<()> {
        let value = core.pull_byte()?;
        core.write(dst, value)
    }
}

//===========================================================================//
// Status

/// CLRC, SETC, CLRP, SETP, DI and EI.
pub struct SetFlag<const FLAG: u8, const VALUE: bool>;

impl<const FLAG: u8, const VALUE: bool> Operator<SpcCore>
    for SetFlag<FLAG, VALUE>
{
    const MNEMONIC: &'static str = match (FLAG, VALUE) {
        (PSW_FLAG_C, false) => "CLRC",
        (PSW_FLAG_C, true) => "SETC",
        (PSW_FLAG_P, false) => "CLRP",
        (PSW_FLAG_P, true) => "SETP",
        (_, false) => "DI",
        (_, true) => "EI",
    };

    fn invoke(core: &mut SpcCore, _: SpcOperands) -> Result<()> {
        core.state.set_flag(FLAG, VALUE);
        Ok(())
    }
}

/// NOTC: complement the carry flag.
pub struct Notc;

impl Operator<SpcCore> for Notc {
    const MNEMONIC: &'static str = "NOTC";

    fn invoke(core: &mut SpcCore, _: SpcOperands) -> Result<()> {
        let carry = core.state.get_flag(PSW_FLAG_C);
        core.state.set_flag(PSW_FLAG_C, !carry);
        Ok(())
    }
}

/// CLRV: clear the overflow and half-carry flags.
pub struct Clrv;

impl Operator<SpcCore> for Clrv {
    const MNEMONIC: &'static str = "CLRV";

    fn invoke(core: &mut SpcCore, _: SpcOperands) -> Result<()> {
        core.state.set_flag(PSW_FLAG_V, false);
        core.state.set_flag(PSW_FLAG_H, false);
        Ok(())
    }
}

/// NOP.
pub struct Nop;

impl Operator<SpcCore> for Nop {
    const MNEMONIC: &'static str = "NOP";

    fn invoke(_: &mut SpcCore, _: SpcOperands) -> Result<()> {
        Ok(())
    }
}

/// SLEEP and STOP: halt until reset.
pub struct Halt<const OPCODE: u8>;

impl<const OPCODE: u8> Operator<SpcCore> for Halt<OPCODE> {
    const MNEMONIC: &'static str =
        if OPCODE == 0xef { "SLEEP" } else { "STOP" };

    fn invoke(core: &mut SpcCore, _: SpcOperands) -> Result<()> {
        let mnemonic = <Self as Operator<SpcCore>>::MNEMONIC;
        warn!("{mnemonic} at ${}", core.state.pc);
        Err(EmuError::Halt { mnemonic, opcode: OPCODE })
    }
}

//===========================================================================//

#[cfg(test)]
mod tests {
    use super::{Branch, BranchBit, Halt, SetFlag};
    use crate::proc::Operator;
    use crate::proc::spc700::SpcCore;
    use crate::proc::spc700::state::{PSW_FLAG_C, PSW_FLAG_I, PSW_FLAG_Z};

    fn mnemonic<O: Operator<SpcCore>>() -> &'static str {
        O::MNEMONIC
    }

    #[test]
    fn mnemonics() {
        assert_eq!(mnemonic::<Branch<PSW_FLAG_Z, false>>(), "BNE");
        assert_eq!(mnemonic::<Branch<PSW_FLAG_C, true>>(), "BCS");
        assert_eq!(mnemonic::<BranchBit<false>>(), "BBC");
        assert_eq!(mnemonic::<SetFlag<PSW_FLAG_I, true>>(), "EI");
        assert_eq!(mnemonic::<SetFlag<PSW_FLAG_C, false>>(), "CLRC");
        assert_eq!(mnemonic::<Halt<0xef>>(), "SLEEP");
        assert_eq!(mnemonic::<Halt<0xff>>(), "STOP");
    }
}

//===========================================================================//
