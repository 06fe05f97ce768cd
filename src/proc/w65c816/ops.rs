//! The 65C816's operators.  Most are generic over the register or flag
//! they act on, so that one type covers a family of mnemonics.

use super::modes::OperandLocation;
use super::state::{
    CpuState, PROC_FLAG_C, PROC_FLAG_D, PROC_FLAG_N, PROC_FLAG_V,
    PROC_FLAG_Z, REG_A, REG_D, REG_DBR, REG_P, REG_PBR, REG_S, REG_X, REG_Y,
    REG_Z,
};
use super::{
    CpuCore, VECTOR_BRK_EMULATION, VECTOR_BRK_NATIVE, VECTOR_COP_EMULATION,
    VECTOR_COP_NATIVE,
};
use crate::error::{EmuError, Result};
use crate::proc::{Core, CycleRemark, Operator};
use crate::value::{
    Long, Word, binary_add, binary_subtract, decimal_add,
    decimal_subtract,
};
use log::warn;

//===========================================================================//

const WIDE_A: &[CycleRemark] = &[CycleRemark::WideAccumulator];
const WIDE_A_RMW: &[CycleRemark] = &[CycleRemark::WideAccumulatorRmw];
const WIDE_X: &[CycleRemark] = &[CycleRemark::WideIndex];
const NATIVE: &[CycleRemark] = &[CycleRemark::NativeMode];

const fn width_remarks(reg: u8) -> &'static [CycleRemark] {
    match reg {
        REG_A | REG_Z => WIDE_A,
        REG_X | REG_Y => WIDE_X,
        _ => &[],
    }
}

fn mask(wide: bool) -> u16 {
    if wide { 0xffff } else { 0x00ff }
}

fn top_bit(wide: bool) -> u16 {
    if wide { 0x8000 } else { 0x0080 }
}

fn target(location: OperandLocation) -> Result<Long> {
    match location {
        OperandLocation::Memory { address, .. } => Ok(address),
        other => Err(EmuError::not_implemented(format!(
            "control transfer through {other:?}"
        ))),
    }
}

//===========================================================================//
// Arithmetic and logic

fn add_with_carry(
    core: &mut CpuCore,
    location: OperandLocation,
    subtract: bool,
) -> Result<()> {
    let wide = core.state.wide_accumulator();
    let value = core.read_operand(location, wide)?;
    let carry = core.state.get_flag(PROC_FLAG_C);
    let a = core.state.reg_a;
    let (result, carry, overflow) = if core.state.get_flag(PROC_FLAG_D) {
        if wide {
            let mnemonic = if subtract { "SBC" } else { "ADC" };
            return Err(EmuError::not_implemented(format!(
                "16-bit decimal {mnemonic}"
            )));
        }
        let sum = if subtract {
            decimal_subtract(a.low(), value.low(), carry)
        } else {
            decimal_add(a.low(), value.low(), carry)
        };
        (Word::from_byte(sum.value), sum.carry, sum.overflow)
    } else if wide {
        let sum = if subtract {
            binary_subtract(a, value, carry)
        } else {
            binary_add(a, value, carry)
        };
        (sum.value, sum.carry, sum.overflow)
    } else {
        let sum = if subtract {
            binary_subtract(a.low(), value.low(), carry)
        } else {
            binary_add(a.low(), value.low(), carry)
        };
        (Word::from_byte(sum.value), sum.carry, sum.overflow)
    };
    core.state.set_register(REG_A, result);
    core.state.set_flag(PROC_FLAG_C, carry);
    core.state.set_flag(PROC_FLAG_V, overflow);
    core.state.update_nz_flags(result, wide);
    Ok(())
}

/// ADC: add with carry.
pub struct Adc;

impl Operator<CpuCore> for Adc {
    const MNEMONIC: &'static str = "ADC";
    const REMARKS: &'static [CycleRemark] = WIDE_A;

    fn invoke(core: &mut CpuCore, location: OperandLocation) -> Result<()> {
        add_with_carry(core, location, false)
    }
}

/// SBC: subtract with borrow.
pub struct Sbc;

impl Operator<CpuCore> for Sbc {
    const MNEMONIC: &'static str = "SBC";
    const REMARKS: &'static [CycleRemark] = WIDE_A;

    fn invoke(core: &mut CpuCore, location: OperandLocation) -> Result<()> {
        add_with_carry(core, location, true)
    }
}

fn logic(
    core: &mut CpuCore,
    location: OperandLocation,
    op: fn(u16, u16) -> u16,
) -> Result<()> {
    let wide = core.state.wide_accumulator();
    let value = core.read_operand(location, wide)?;
    let result = Word(op(core.state.reg_a.0, value.0));
    core.state.set_register(REG_A, result);
    core.state.update_nz_flags(result, wide);
    Ok(())
}

/// AND: bitwise and into the accumulator.
pub struct And;

impl Operator<CpuCore> for And {
    const MNEMONIC: &'static str = "AND";
    const REMARKS: &'static [CycleRemark] = WIDE_A;

    fn invoke(core: &mut CpuCore, location: OperandLocation) -> Result<()> {
        logic(core, location, |a, b| a & b)
    }
}

/// ORA: bitwise or into the accumulator.
pub struct Ora;

impl Operator<CpuCore> for Ora {
    const MNEMONIC: &'static str = "ORA";
    const REMARKS: &'static [CycleRemark] = WIDE_A;

    fn invoke(core: &mut CpuCore, location: OperandLocation) -> Result<()> {
        logic(core, location, |a, b| a | b)
    }
}

/// EOR: bitwise exclusive or into the accumulator.
pub struct Eor;

impl Operator<CpuCore> for Eor {
    const MNEMONIC: &'static str = "EOR";
    const REMARKS: &'static [CycleRemark] = WIDE_A;

    fn invoke(core: &mut CpuCore, location: OperandLocation) -> Result<()> {
        logic(core, location, |a, b| a ^ b)
    }
}

/// BIT: test accumulator bits against memory.
pub struct Bit;

impl Operator<CpuCore> for Bit {
    const MNEMONIC: &'static str = "BIT";
    const REMARKS: &'static [CycleRemark] = WIDE_A;

    fn invoke(core: &mut CpuCore, location: OperandLocation) -> Result<()> {
        let wide = core.state.wide_accumulator();
        let value = core.read_operand(location, wide)?;
        let result = core.state.reg_a.0 & value.0 & mask(wide);
        core.state.set_flag(PROC_FLAG_Z, result == 0);
        // The immediate form only affects Z.
        if !matches!(location, OperandLocation::Immediate(_)) {
            let top = top_bit(wide);
            core.state.set_flag(PROC_FLAG_N, value.0 & top != 0);
            core.state.set_flag(PROC_FLAG_V, value.0 & (top >> 1) != 0);
        }
        Ok(())
    }
}

/// CMP, CPX and CPY: compare a register with memory.
pub struct Compare<const R: u8>;

impl<const R: u8> Operator<CpuCore> for Compare<R> {
    const MNEMONIC: &'static str = match R {
        REG_A => "CMP",
        REG_X => "CPX",
        _ => "CPY",
    };
    const REMARKS: &'static [CycleRemark] = width_remarks(R);

    fn invoke(core: &mut CpuCore, location: OperandLocation) -> Result<()> {
        let wide = core.state.is_wide(R);
        let value = core.read_operand(location, wide)?;
        let reg = core.state.register(R);
        let (result, carry) = if wide {
            let diff = binary_subtract(reg, value, true);
            (diff.value, diff.carry)
        } else {
            let diff = binary_subtract(reg.low(), value.low(), true);
            (Word::from_byte(diff.value), diff.carry)
        };
        core.state.set_flag(PROC_FLAG_C, carry);
        core.state.update_nz_flags(result, wide);
        Ok(())
    }
}

//===========================================================================//
// Read-modify-write

fn read_modify_write(
    core: &mut CpuCore,
    location: OperandLocation,
    update_nz: bool,
    op: impl FnOnce(&mut CpuState, u16, bool) -> u16,
) -> Result<()> {
    let wide = core.state.wide_accumulator();
    let value = core.read_operand(location, wide)?;
    let result = Word(op(&mut core.state, value.0, wide) & mask(wide));
    core.write_operand(location, result, wide)?;
    if update_nz {
        core.state.update_nz_flags(result, wide);
    }
    Ok(())
}

/// ASL: arithmetic shift left.
pub struct Asl;

impl Operator<CpuCore> for Asl {
    const MNEMONIC: &'static str = "ASL";
    const REMARKS: &'static [CycleRemark] = WIDE_A_RMW;

    fn invoke(core: &mut CpuCore, location: OperandLocation) -> Result<()> {
        read_modify_write(core, location, true, |state, value, wide| {
            state.set_flag(PROC_FLAG_C, value & top_bit(wide) != 0);
            value << 1
        })
    }
}

/// LSR: logical shift right.
pub struct Lsr;

impl Operator<CpuCore> for Lsr {
    const MNEMONIC: &'static str = "LSR";
    const REMARKS: &'static [CycleRemark] = WIDE_A_RMW;

    fn invoke(core: &mut CpuCore, location: OperandLocation) -> Result<()> {
        read_modify_write(core, location, true, |state, value, _| {
            state.set_flag(PROC_FLAG_C, value & 1 != 0);
            value >> 1
        })
    }
}

/// ROL: rotate left through carry.
pub struct Rol;

impl Operator<CpuCore> for Rol {
    const MNEMONIC: &'static str = "ROL";
    const REMARKS: &'static [CycleRemark] = WIDE_A_RMW;

    fn invoke(core: &mut CpuCore, location: OperandLocation) -> Result<()> {
        read_modify_write(core, location, true, |state, value, wide| {
            let carry_in = u16::from(state.get_flag(PROC_FLAG_C));
            state.set_flag(PROC_FLAG_C, value & top_bit(wide) != 0);
            (value << 1) | carry_in
        })
    }
}

/// ROR: rotate right through carry.
pub struct Ror;

impl Operator<CpuCore> for Ror {
    const MNEMONIC: &'static str = "ROR";
    const REMARKS: &'static [CycleRemark] = WIDE_A_RMW;

    fn invoke(core: &mut CpuCore, location: OperandLocation) -> Result<()> {
        read_modify_write(core, location, true, |state, value, wide| {
            let carry_in = state.get_flag(PROC_FLAG_C);
            state.set_flag(PROC_FLAG_C, value & 1 != 0);
            let top = if carry_in { top_bit(wide) } else { 0 };
            (value >> 1) | top
        })
    }
}

/// INC: increment the accumulator or memory.
pub struct Inc;

impl Operator<CpuCore> for Inc {
    const MNEMONIC: &'static str = "INC";
    const REMARKS: &'static [CycleRemark] = WIDE_A_RMW;

    fn invoke(core: &mut CpuCore, location: OperandLocation) -> Result<()> {
        read_modify_write(core, location, true, |_, value, _| {
            value.wrapping_add(1)
        })
    }
}

/// DEC: decrement the accumulator or memory.
pub struct Dec;

impl Operator<CpuCore> for Dec {
    const MNEMONIC: &'static str = "DEC";
    const REMARKS: &'static [CycleRemark] = WIDE_A_RMW;

    fn invoke(core: &mut CpuCore, location: OperandLocation) -> Result<()> {
        read_modify_write(core, location, true, |_, value, _| {
            value.wrapping_sub(1)
        })
    }
}

/// TSB: test and set bits.
pub struct Tsb;

impl Operator<CpuCore> for Tsb {
    const MNEMONIC: &'static str = "TSB";
    const REMARKS: &'static [CycleRemark] = WIDE_A_RMW;

    fn invoke(core: &mut CpuCore, location: OperandLocation) -> Result<()> {
        read_modify_write(core, location, false, |state, value, wide| {
            let a = state.reg_a.0 & mask(wide);
            state.set_flag(PROC_FLAG_Z, a & value == 0);
            value | a
        })
    }
}

/// TRB: test and reset bits.
pub struct Trb;

impl Operator<CpuCore> for Trb {
    const MNEMONIC: &'static str = "TRB";
    const REMARKS: &'static [CycleRemark] = WIDE_A_RMW;

    fn invoke(core: &mut CpuCore, location: OperandLocation) -> Result<()> {
        read_modify_write(core, location, false, |state, value, wide| {
            let a = state.reg_a.0 & mask(wide);
            state.set_flag(PROC_FLAG_Z, a & value == 0);
            value & !a
        })
    }
}

/// INX and INY.
pub struct IncIndex<const R: u8>;

impl<const R: u8> Operator<CpuCore> for IncIndex<R> {
    const MNEMONIC: &'static str = if R == REG_X { "INX" } else { "INY" };

    fn invoke(core: &mut CpuCore, _: OperandLocation) -> Result<()> {
        step_index(&mut core.state, R, 1);
        Ok(())
    }
}

/// DEX and DEY.
pub struct DecIndex<const R: u8>;

impl<const R: u8> Operator<CpuCore> for DecIndex<R> {
    const MNEMONIC: &'static str = if R == REG_X { "DEX" } else { "DEY" };

    fn invoke(core: &mut CpuCore, _: OperandLocation) -> Result<()> {
        step_index(&mut core.state, R, 0xffff);
        Ok(())
    }
}

fn step_index(state: &mut CpuState, reg: u8, delta: u16) {
    let wide = state.is_wide(reg);
    let value = Word(state.register(reg).0.wrapping_add(delta) & mask(wide));
    state.set_register(reg, value);
    state.update_nz_flags(value, wide);
}

//===========================================================================//
// Loads, stores and transfers

/// LDA, LDX and LDY.
pub struct Load<const R: u8>;

impl<const R: u8> Operator<CpuCore> for Load<R> {
    const MNEMONIC: &'static str = match R {
        REG_A => "LDA",
        REG_X => "LDX",
        _ => "LDY",
    };
    const REMARKS: &'static [CycleRemark] = width_remarks(R);

    fn invoke(core: &mut CpuCore, location: OperandLocation) -> Result<()> {
        let wide = core.state.is_wide(R);
        let value = core.read_operand(location, wide)?;
        core.state.set_register(R, value);
        core.state.update_nz_flags(value, wide);
        Ok(())
    }
}

/// STA, STX, STY and STZ.
pub struct Store<const R: u8>;

impl<const R: u8> Operator<CpuCore> for Store<R> {
    const MNEMONIC: &'static str = match R {
        REG_A => "STA",
        REG_X => "STX",
        REG_Y => "STY",
        _ => "STZ",
    };
    const REMARKS: &'static [CycleRemark] = width_remarks(R);

    fn invoke(core: &mut CpuCore, location: OperandLocation) -> Result<()> {
        let wide = core.state.is_wide(R);
        let value = core.state.register(R);
        core.write_operand(location, value, wide)
    }
}

/// Register-to-register transfers (TAX, TCD, TXS, ...).
pub struct Transfer<const FROM: u8, const TO: u8>;

impl<const FROM: u8, const TO: u8> Operator<CpuCore> for Transfer<FROM, TO> {
    const MNEMONIC: &'static str = match (FROM, TO) {
        (REG_A, REG_X) => "TAX",
        (REG_A, REG_Y) => "TAY",
        (REG_X, REG_A) => "TXA",
        (REG_Y, REG_A) => "TYA",
        (REG_X, REG_Y) => "TXY",
        (REG_Y, REG_X) => "TYX",
        (REG_S, REG_X) => "TSX",
        (REG_X, REG_S) => "TXS",
        (REG_A, REG_D) => "TCD",
        (REG_D, REG_A) => "TDC",
        (REG_A, REG_S) => "TCS",
        _ => "TSC",
    };

    fn invoke(core: &mut CpuCore, _: OperandLocation) -> Result<()> {
        let state = &mut core.state;
        // Transfers into D and S, and out of them into C, always move all
        // sixteen bits.
        let wide = match (FROM, TO) {
            (REG_D | REG_S, REG_A) | (_, REG_D) | (_, REG_S) => true,
            (_, REG_A) => state.wide_accumulator(),
            _ => state.wide_index(),
        };
        let value = state.register(FROM);
        match TO {
            REG_A if wide => state.reg_a = value,
            _ => state.set_register(TO, value),
        }
        if TO != REG_S {
            let result = state.register(TO);
            state.update_nz_flags(result, wide);
        }
        Ok(())
    }
}

/// XBA: exchange the accumulator's two bytes.
pub struct Xba;

impl Operator<CpuCore> for Xba {
    const MNEMONIC: &'static str = "XBA";

    fn invoke(core: &mut CpuCore, _: OperandLocation) -> Result<()> {
        let a = core.state.reg_a;
        core.state.reg_a = Word::new(a.high(), a.low());
        core.state.update_nz_flags(core.state.reg_a, false);
        Ok(())
    }
}

//===========================================================================//
// Stack

/// PHA, PHX, PHY, PHB, PHD, PHK and PHP.
pub struct Push<const R: u8>;

impl<const R: u8> Operator<CpuCore> for Push<R> {
    const MNEMONIC: &'static str = match R {
        REG_A => "PHA",
        REG_X => "PHX",
        REG_Y => "PHY",
        REG_DBR => "PHB",
        REG_D => "PHD",
        REG_PBR => "PHK",
        _ => "PHP",
    };
    const REMARKS: &'static [CycleRemark] = width_remarks(R);

    fn invoke(core: &mut CpuCore, _: OperandLocation) -> Result<()> {
        let value = core.state.register(R);
        if core.state.is_wide(R) {
            core.push_word(value)
        } else {
            core.push_byte(value.low())
        }
    }
}

/// PLA, PLX, PLY, PLB, PLD and PLP.
pub struct Pull<const R: u8>;

impl<const R: u8> Operator<CpuCore> for Pull<R> {
    const MNEMONIC: &'static str = match R {
        REG_A => "PLA",
        REG_X => "PLX",
        REG_Y => "PLY",
        REG_DBR => "PLB",
        REG_D => "PLD",
        _ => "PLP",
    };
    const REMARKS: &'static [CycleRemark] = width_remarks(R);

    fn invoke(core: &mut CpuCore, _: OperandLocation) -> Result<()> {
        let wide = core.state.is_wide(R);
        let value = if wide {
            core.pull_word()?
        } else {
            Word::from_byte(core.pull_byte()?)
        };
        if R == REG_P {
            core.state.set_reg_p(value.low());
        } else {
            core.state.set_register(R, value);
            core.state.update_nz_flags(value, wide);
        }
        Ok(())
    }
}

/// PEA: push an immediate word.
pub struct Pea;

impl Operator<CpuCore> for Pea {
    const MNEMONIC: &'static str = "PEA";

    fn invoke(core: &mut CpuCore, location: OperandLocation) -> Result<()> {
        let value = core.read_operand(location, true)?;
        core.push_word(value)
    }
}

/// PEI: push a word read from the direct page.
pub struct Pei;

impl Operator<CpuCore> for Pei {
    const MNEMONIC: &'static str = "PEI";

    fn invoke(core: &mut CpuCore, location: OperandLocation) -> Result<()> {
        let value = core.read_operand(location, true)?;
        core.push_word(value)
    }
}

/// PER: push a program-counter-relative address.
pub struct Per;

impl Operator<CpuCore> for Per {
    const MNEMONIC: &'static str = "PER";

    fn invoke(core: &mut CpuCore, location: OperandLocation) -> Result<()> {
        let address = target(location)?;
        core.push_word(address.word())
    }
}

//===========================================================================//
// Control flow

/// The conditional branches.
pub struct Branch<const FLAG: u8, const SET: bool>;

impl<const FLAG: u8, const SET: bool> Operator<CpuCore> for Branch<FLAG, SET> {
    const MNEMONIC: &'static str = match (FLAG, SET) {
        (PROC_FLAG_N, false) => "BPL",
        (PROC_FLAG_N, true) => "BMI",
        (PROC_FLAG_V, false) => "BVC",
        (PROC_FLAG_V, true) => "BVS",
        (PROC_FLAG_C, false) => "BCC",
        (PROC_FLAG_C, true) => "BCS",
        (PROC_FLAG_Z, false) => "BNE",
        _ => "BEQ",
    };
    const REMARKS: &'static [CycleRemark] = &[
        CycleRemark::BranchTaken,
        CycleRemark::BranchPageCrossEmulation,
    ];

    fn invoke(core: &mut CpuCore, location: OperandLocation) -> Result<()> {
        if core.state.get_flag(FLAG) == SET {
            core.state.pc = target(location)?.word();
            core.conditions_mut().branch_taken = true;
        }
        Ok(())
    }
}

/// BRA: branch always.
pub struct Bra;

impl Operator<CpuCore> for Bra {
    const MNEMONIC: &'static str = "BRA";
    const REMARKS: &'static [CycleRemark] =
        &[CycleRemark::BranchPageCrossEmulation];

    fn invoke(core: &mut CpuCore, location: OperandLocation) -> Result<()> {
        core.state.pc = target(location)?.word();
        core.conditions_mut().branch_taken = true;
        Ok(())
    }
}

/// BRL: branch always, long displacement.
pub struct Brl;

impl Operator<CpuCore> for Brl {
    const MNEMONIC: &'static str = "BRL";

    fn invoke(core: &mut CpuCore, location: OperandLocation) -> Result<()> {
        core.state.pc = target(location)?.word();
        Ok(())
    }
}

/// JMP within the program bank.
pub struct Jmp;

impl Operator<CpuCore> for Jmp {
    const MNEMONIC: &'static str = "JMP";

    fn invoke(core: &mut CpuCore, location: OperandLocation) -> Result<()> {
        core.state.pc = target(location)?.word();
        Ok(())
    }
}

/// JML: jump to a 24-bit address.
pub struct Jml;

impl Operator<CpuCore> for Jml {
    const MNEMONIC: &'static str = "JML";

    fn invoke(core: &mut CpuCore, location: OperandLocation) -> Result<()> {
        let address = target(location)?;
        core.state.pbr = address.bank();
        core.state.pc = address.word();
        Ok(())
    }
}

/// JSR: call a subroutine in the program bank.
pub struct Jsr;

impl Operator<CpuCore> for Jsr {
    const MNEMONIC: &'static str = "JSR";

    fn invoke(core: &mut CpuCore, location: OperandLocation) -> Result<()> {
        let address = target(location)?;
        core.push_word(core.state.pc.wrapping_sub(1))?;
        core.state.pc = address.word();
        Ok(())
    }
}

/// JSL: call a subroutine anywhere.
pub struct Jsl;

impl Operator<CpuCore> for Jsl {
    const MNEMONIC: &'static str = "JSL";

    fn invoke(core: &mut CpuCore, location: OperandLocation) -> Result<()> {
        let address = target(location)?;
        core.push_byte(core.state.pbr)?;
        core.push_word(core.state.pc.wrapping_sub(1))?;
        core.state.pbr = address.bank();
        core.state.pc = address.word();
        Ok(())
    }
}

/// RTS: return from a JSR.
pub struct Rts;

impl Operator<CpuCore> for Rts {
    const MNEMONIC: &'static str = "RTS";

    fn invoke(core: &mut CpuCore, _: OperandLocation) -> Result<()> {
        core.state.pc = core.pull_word()?.wrapping_add(1);
        Ok(())
    }
}

/// RTL: return from a JSL.
pub struct Rtl;

impl Operator<CpuCore> for Rtl {
    const MNEMONIC: &'static str = "RTL";

    fn invoke(core: &mut CpuCore, _: OperandLocation) -> Result<()> {
        core.state.pc = core.pull_word()?.wrapping_add(1);
        core.state.pbr = core.pull_byte()?;
        Ok(())
    }
}

/// RTI: return from an interrupt.
pub struct Rti;

impl Operator<CpuCore> for Rti {
    const MNEMONIC: &'static str = "RTI";
    const REMARKS: &'static [CycleRemark] = NATIVE;

    fn invoke(core: &mut CpuCore, _: OperandLocation) -> Result<()> {
        let p = core.pull_byte()?;
        core.state.set_reg_p(p);
        core.state.pc = core.pull_word()?;
        if !core.state.emulation() {
            core.state.pbr = core.pull_byte()?;
        }
        Ok(())
    }
}

/// BRK: software break.
pub struct Brk;

impl Operator<CpuCore> for Brk {
    const MNEMONIC: &'static str = "BRK";
    const REMARKS: &'static [CycleRemark] = NATIVE;

    fn invoke(core: &mut CpuCore, _: OperandLocation) -> Result<()> {
        core.interrupt(VECTOR_BRK_NATIVE, VECTOR_BRK_EMULATION, true)
    }
}

/// COP: coprocessor interrupt.
pub struct Cop;

impl Operator<CpuCore> for Cop {
    const MNEMONIC: &'static str = "COP";
    const REMARKS: &'static [CycleRemark] = NATIVE;

    fn invoke(core: &mut CpuCore, _: OperandLocation) -> Result<()> {
        core.interrupt(VECTOR_COP_NATIVE, VECTOR_COP_EMULATION, true)
    }
}

//===========================================================================//
// Status and mode

/// CLC, SEC, CLI, SEI, CLD, SED and CLV.
pub struct SetFlag<const FLAG: u8, const VALUE: bool>;

impl<const FLAG: u8, const VALUE: bool> Operator<CpuCore>
    for SetFlag<FLAG, VALUE>
{
    const MNEMONIC: &'static str = match (FLAG, VALUE) {
        (PROC_FLAG_C, false) => "CLC",
        (PROC_FLAG_C, true) => "SEC",
        (PROC_FLAG_D, false) => "CLD",
        (PROC_FLAG_D, true) => "SED",
        (PROC_FLAG_V, _) => "CLV",
        (_, false) => "CLI",
        (_, true) => "SEI",
    };

    fn invoke(core: &mut CpuCore, _: OperandLocation) -> Result<()> {
        core.state.set_flag(FLAG, VALUE);
        Ok(())
    }
}

/// REP: clear the status bits given by the operand.
pub struct Rep;

impl Operator<CpuCore> for Rep {
    const MNEMONIC: &'static str = "REP";

    fn invoke(core: &mut CpuCore, location: OperandLocation) -> Result<()> {
        let bits = core.read_operand(location, false)?.low();
        let p = core.state.reg_p();
        core.state.set_reg_p(p & !bits);
        Ok(())
    }
}

/// SEP: set the status bits given by the operand.
pub struct Sep;

impl Operator<CpuCore> for Sep {
    const MNEMONIC: &'static str = "SEP";

    fn invoke(core: &mut CpuCore, location: OperandLocation) -> Result<()> {
        let bits = core.read_operand(location, false)?.low();
        let p = core.state.reg_p();
        core.state.set_reg_p(p | bits);
        Ok(())
    }
}

/// XCE: exchange the carry and emulation flags.
pub struct Xce;

impl Operator<CpuCore> for Xce {
    const MNEMONIC: &'static str = "XCE";

    fn invoke(core: &mut CpuCore, _: OperandLocation) -> Result<()> {
        let carry = core.state.get_flag(PROC_FLAG_C);
        let emulation = core.state.emulation();
        core.state.set_flag(PROC_FLAG_C, emulation);
        core.state.set_emulation(carry);
        Ok(())
    }
}

/// NOP.
pub struct Nop;

impl Operator<CpuCore> for Nop {
    const MNEMONIC: &'static str = "NOP";

    fn invoke(_: &mut CpuCore, _: OperandLocation) -> Result<()> {
        Ok(())
    }
}

/// WDM: reserved for future expansion.
pub struct Wdm;

impl Operator<CpuCore> for Wdm {
    const MNEMONIC: &'static str = "WDM";

    fn invoke(_: &mut CpuCore, _: OperandLocation) -> Result<()> {
        Err(EmuError::not_implemented("WDM"))
    }
}

/// WAI: wait for an interrupt.
pub struct Wai;

impl Operator<CpuCore> for Wai {
    const MNEMONIC: &'static str = "WAI";

    fn invoke(core: &mut CpuCore, _: OperandLocation) -> Result<()> {
        warn!("WAI at ${}", core.state.pc_long());
        core.state.waiting = true;
        Ok(())
    }
}

/// STP: stop the clock until reset.
pub struct Stp;

impl Operator<CpuCore> for Stp {
    const MNEMONIC: &'static str = "STP";

    fn invoke(core: &mut CpuCore, _: OperandLocation) -> Result<()> {
        warn!("STP at ${}", core.state.pc_long());
        Err(EmuError::Halt { mnemonic: "STP", opcode: 0xdb })
    }
}

//===========================================================================//
// Block moves

/// MVN and MVP: move one byte, then repeat the instruction until the
/// accumulator underflows.
pub struct MoveBlock<const DECREMENT: bool>;

impl<const DECREMENT: bool> Operator<CpuCore> for MoveBlock<DECREMENT> {
    const MNEMONIC: &'static str = if DECREMENT { "MVP" } else { "MVN" };

    fn invoke(core: &mut CpuCore, location: OperandLocation) -> Result<()> {
        let OperandLocation::Banks { source, destination } = location else {
            return Err(EmuError::not_implemented(format!(
                "block move through {location:?}"
            )));
        };
        let (x, y) = (core.state.reg_x, core.state.reg_y);
        let byte = core.memory.read(Long::from_parts(x, source))?;
        core.memory.write(Long::from_parts(y, destination), byte)?;
        core.state.dbr = destination;
        let delta = if DECREMENT { 0xffff } else { 1 };
        core.state.set_register(REG_X, x.wrapping_add(delta));
        core.state.set_register(REG_Y, y.wrapping_add(delta));
        core.state.reg_a = core.state.reg_a.wrapping_sub(1);
        if core.state.reg_a != Word(0xffff) {
            core.state.pc = core.state.pc.wrapping_sub(3);
        }
        Ok(())
    }
}

//===========================================================================//


//===========================================================================//
