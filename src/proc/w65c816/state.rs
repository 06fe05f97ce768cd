use crate::value::{Byte, Long, Value, Word};

//===========================================================================//

pub(crate) const PROC_FLAG_N: u8 = 0b1000_0000;
pub(crate) const PROC_FLAG_V: u8 = 0b0100_0000;
pub(crate) const PROC_FLAG_M: u8 = 0b0010_0000;
pub(crate) const PROC_FLAG_X: u8 = 0b0001_0000;
pub(crate) const PROC_FLAG_D: u8 = 0b0000_1000;
pub(crate) const PROC_FLAG_I: u8 = 0b0000_0100;
pub(crate) const PROC_FLAG_Z: u8 = 0b0000_0010;
pub(crate) const PROC_FLAG_C: u8 = 0b0000_0001;

// Register selectors for operators that are generic over a register.
pub(crate) const REG_A: u8 = 0;
pub(crate) const REG_X: u8 = 1;
pub(crate) const REG_Y: u8 = 2;
pub(crate) const REG_S: u8 = 3;
pub(crate) const REG_D: u8 = 4;
pub(crate) const REG_Z: u8 = 5;
pub(crate) const REG_DBR: u8 = 6;
pub(crate) const REG_PBR: u8 = 7;
pub(crate) const REG_P: u8 = 8;

//===========================================================================//

/// The register file of a 65C816.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CpuState {
    /// Accumulator (both halves, regardless of width).
    pub reg_a: Word,
    /// X index register.
    pub reg_x: Word,
    /// Y index register.
    pub reg_y: Word,
    /// Stack pointer.
    pub reg_s: Word,
    /// Direct page register.
    pub reg_d: Word,
    /// Data bank register.
    pub dbr: Byte,
    /// Program bank register.
    pub pbr: Byte,
    /// Program counter within the program bank.
    pub pc: Word,
    reg_p: Byte,
    emulation: bool,
    /// Set by WAI until the next interrupt.
    pub waiting: bool,
}

impl Default for CpuState {
    fn default() -> CpuState {
        // At power-on D, DBR and PBR are zero, emulation mode is enabled,
        // and the M, X and I flags are set.
        CpuState {
            reg_a: Word(0),
            reg_x: Word(0),
            reg_y: Word(0),
            reg_s: Word(0x01ff),
            reg_d: Word(0),
            dbr: Byte(0),
            pbr: Byte(0),
            pc: Word(0),
            reg_p: Byte(PROC_FLAG_M | PROC_FLAG_X | PROC_FLAG_I),
            emulation: true,
            waiting: false,
        }
    }
}

impl CpuState {
    /// Returns the processor status register.
    pub fn reg_p(&self) -> Byte {
        self.reg_p
    }

    /// Returns true in emulation mode.
    pub fn emulation(&self) -> bool {
        self.emulation
    }

    /// Returns the full 24-bit program counter.
    pub fn pc_long(&self) -> Long {
        Long::from_parts(self.pc, self.pbr)
    }

    /// Returns true if the given status flag is set.
    pub fn get_flag(&self, flag: u8) -> bool {
        (self.reg_p.0 & flag) != 0
    }

    /// Sets or clears a status flag.
    pub fn set_flag(&mut self, flag: u8, value: bool) {
        if value {
            self.reg_p.0 |= flag;
        } else {
            self.reg_p.0 &= !flag;
        }
        if flag & (PROC_FLAG_M | PROC_FLAG_X) != 0 {
            self.force_registers();
        }
    }

    /// Replaces the status register.
    pub fn set_reg_p(&mut self, value: Byte) {
        self.reg_p = value;
        self.force_registers();
    }

    /// Enters or leaves emulation mode.
    pub fn set_emulation(&mut self, emulation: bool) {
        self.emulation = emulation;
        self.force_registers();
    }

    /// Returns true if the accumulator is 16 bits wide.
    pub fn wide_accumulator(&self) -> bool {
        !self.get_flag(PROC_FLAG_M)
    }

    /// Returns true if the index registers are 16 bits wide.
    pub fn wide_index(&self) -> bool {
        !self.get_flag(PROC_FLAG_X)
    }

    /// Returns true if the given register is currently 16 bits wide.
    pub(crate) fn is_wide(&self, reg: u8) -> bool {
        match reg {
            REG_A | REG_Z => self.wide_accumulator(),
            REG_X | REG_Y => self.wide_index(),
            REG_S | REG_D => true,
            _ => false,
        }
    }

    /// Returns the value of a register selected by one of the `REG_*`
    /// selectors.
    pub(crate) fn register(&self, reg: u8) -> Word {
        match reg {
            REG_A => self.reg_a,
            REG_X => self.reg_x,
            REG_Y => self.reg_y,
            REG_S => self.reg_s,
            REG_D => self.reg_d,
            REG_DBR => Word::from_byte(self.dbr),
            REG_PBR => Word::from_byte(self.pbr),
            REG_P => Word::from_byte(self.reg_p),
            _ => Word(0),
        }
    }

    /// Stores into a register, honoring its current width: a narrow
    /// accumulator keeps its high byte, and narrow index registers are
    /// zero-extended.
    pub(crate) fn set_register(&mut self, reg: u8, value: Word) {
        let wide = self.is_wide(reg);
        match reg {
            REG_A if wide => self.reg_a = value,
            REG_A => self.reg_a = self.reg_a.with_low(value.low()),
            REG_X => self.reg_x = value,
            REG_Y => self.reg_y = value,
            REG_S => self.reg_s = value,
            REG_D => self.reg_d = value,
            REG_DBR => self.dbr = value.low(),
            REG_PBR => self.pbr = value.low(),
            REG_P => self.reg_p = value.low(),
            _ => {}
        }
        self.force_registers();
    }

    /// Sets N and Z from an 8- or 16-bit result.
    pub(crate) fn update_nz_flags(&mut self, value: Word, wide: bool) {
        if wide {
            self.set_flag(PROC_FLAG_N, value.is_negative());
            self.set_flag(PROC_FLAG_Z, value.is_zero());
        } else {
            self.set_flag(PROC_FLAG_N, value.low().is_negative());
            self.set_flag(PROC_FLAG_Z, value.low().is_zero());
        }
    }

    /// Applies the constraints the width and mode flags put on registers.
    pub(crate) fn force_registers(&mut self) {
        // In emulation mode the stack lives in page 1 and both width flags
        // read as 1.
        if self.emulation {
            self.reg_s = Word(0x0100 | (self.reg_s.0 & 0x00ff));
            self.reg_p.0 |= PROC_FLAG_M | PROC_FLAG_X;
        }
        // Narrow index registers lose their high bytes; the accumulator's
        // high byte survives a narrow M flag.
        if self.get_flag(PROC_FLAG_X) {
            self.reg_x.0 &= 0x00ff;
            self.reg_y.0 &= 0x00ff;
        }
    }
}

//===========================================================================//

#[cfg(test)]
mod tests {
    use super::{CpuState, PROC_FLAG_C, PROC_FLAG_X, REG_A, REG_X};
    use crate::value::{Byte, Word};

    #[test]
    fn power_on_state() {
        let state = CpuState::default();
        assert!(state.emulation());
        assert_eq!(state.reg_s, Word(0x01ff));
        assert!(!state.wide_accumulator());
        assert!(!state.wide_index());
    }

    #[test]
    fn narrow_index_drops_high_byte() {
        let mut state = CpuState::default();
        state.set_emulation(false);
        state.set_flag(PROC_FLAG_X, false);
        state.set_register(REG_X, Word(0x1234));
        assert_eq!(state.reg_x, Word(0x1234));
        state.set_flag(PROC_FLAG_X, true);
        assert_eq!(state.reg_x, Word(0x0034));
    }

    #[test]
    fn narrow_accumulator_keeps_high_byte() {
        let mut state = CpuState::default();
        state.reg_a = Word(0xabcd);
        state.set_register(REG_A, Word(0x0012));
        assert_eq!(state.reg_a, Word(0xab12));
    }

    #[test]
    fn emulation_forces_flags_and_stack() {
        let mut state = CpuState::default();
        state.set_emulation(false);
        state.set_reg_p(Byte(PROC_FLAG_C));
        state.reg_s = Word(0x1fff);
        state.set_emulation(true);
        assert_eq!(state.reg_s, Word(0x01ff));
        assert_eq!(state.reg_p(), Byte(0x31));
    }
}

//===========================================================================//
