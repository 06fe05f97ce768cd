use crate::value::{Byte, Word};

//===========================================================================//

pub(crate) const PSW_FLAG_N: u8 = 0b1000_0000;
pub(crate) const PSW_FLAG_V: u8 = 0b0100_0000;
pub(crate) const PSW_FLAG_P: u8 = 0b0010_0000;
pub(crate) const PSW_FLAG_B: u8 = 0b0001_0000;
pub(crate) const PSW_FLAG_H: u8 = 0b0000_1000;
pub(crate) const PSW_FLAG_I: u8 = 0b0000_0100;
pub(crate) const PSW_FLAG_Z: u8 = 0b0000_0010;
pub(crate) const PSW_FLAG_C: u8 = 0b0000_0001;

const STACK_PAGE: u16 = 0x0100;

//===========================================================================//

/// The register file of an SPC700.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SpcState {
    /// Accumulator.
    pub a: Byte,
    /// X index register.
    pub x: Byte,
    /// Y index register.
    pub y: Byte,
    /// Stack pointer, within page 1.
    pub sp: Byte,
    /// Program status word.
    pub psw: Byte,
    /// Program counter.
    pub pc: Word,
}

impl SpcState {
    /// Returns the value of one status flag.
    pub fn get_flag(&self, flag: u8) -> bool {
        (self.psw.0 & flag) != 0
    }

    /// Sets or clears one status flag.
    pub fn set_flag(&mut self, flag: u8, value: bool) {
        if value {
            self.psw.0 |= flag;
        } else {
            self.psw.0 &= !flag;
        }
    }

    /// Returns the Y:A register pair used by the 16-bit instructions.
    pub fn ya(&self) -> Word {
        Word::new(self.a, self.y)
    }

    /// Sets the Y:A register pair.
    pub fn set_ya(&mut self, value: Word) {
        self.a = value.low();
        self.y = value.high();
    }

    /// Returns the address of the current direct page, selected by the P
    /// flag.
    pub fn direct_page(&self) -> u16 {
        if self.get_flag(PSW_FLAG_P) { 0x0100 } else { 0x0000 }
    }

    /// Returns the address the stack pointer refers to.
    pub fn stack_address(&self) -> Word {
        Word(STACK_PAGE | u16::from(self.sp.0))
    }

    pub(crate) fn update_nz(&mut self, value: Byte) {
        self.set_flag(PSW_FLAG_N, value.0 & 0x80 != 0);
        self.set_flag(PSW_FLAG_Z, value.0 == 0);
    }

    pub(crate) fn update_nz_word(&mut self, value: Word) {
        self.set_flag(PSW_FLAG_N, value.0 & 0x8000 != 0);
        self.set_flag(PSW_FLAG_Z, value.0 == 0);
    }
}

//===========================================================================//

#[cfg(test)]
mod tests {
    use super::{PSW_FLAG_N, PSW_FLAG_P, PSW_FLAG_Z, SpcState};
    use crate::value::{Byte, Word};

    #[test]
    fn ya_pair() {
        let mut state = SpcState::default();
        state.set_ya(Word(0x1234));
        assert_eq!(state.a, Byte(0x34));
        assert_eq!(state.y, Byte(0x12));
        assert_eq!(state.ya(), Word(0x1234));
    }

    #[test]
    fn direct_page_follows_p() {
        let mut state = SpcState::default();
        assert_eq!(state.direct_page(), 0x0000);
        state.set_flag(PSW_FLAG_P, true);
        assert_eq!(state.direct_page(), 0x0100);
    }

    #[test]
    fn nz_flags() {
        let mut state = SpcState::default();
        state.update_nz(Byte(0x80));
        assert!(state.get_flag(PSW_FLAG_N));
        assert!(!state.get_flag(PSW_FLAG_Z));
        state.update_nz_word(Word(0x0000));
        assert!(!state.get_flag(PSW_FLAG_N));
        assert!(state.get_flag(PSW_FLAG_Z));
    }
}

//===========================================================================//
