//! Fixed-width wrapping integer types shared by both processors.

use std::fmt;
use std::ops;

//===========================================================================//

/// Behavior common to [Byte], [Word], and [Long].
pub trait Value: Copy + Eq + fmt::Debug {
    /// The width of this type in bits.
    const BITS: u32;

    /// Returns the value as an unsigned integer.
    fn to_u32(self) -> u32;

    /// Builds a value from the low `BITS` bits of `value`, discarding the
    /// rest.
    fn wrap(value: u32) -> Self;

    /// Returns a mask with the low `BITS` bits set.
    fn mask() -> u32 {
        ((1u64 << Self::BITS) - 1) as u32
    }

    /// Returns true if the top bit of the value is set.
    fn is_negative(self) -> bool {
        self.bit(Self::BITS - 1)
    }

    /// Returns true if the value is zero.
    fn is_zero(self) -> bool {
        self.to_u32() == 0
    }

    /// Returns the bit at the given index (zero is the least significant).
    fn bit(self, index: u32) -> bool {
        (self.to_u32() >> index) & 1 != 0
    }

    /// Returns a copy of the value with the given bit set or cleared.
    fn with_bit(self, index: u32, set: bool) -> Self {
        let bit = 1u32 << index;
        let value = self.to_u32();
        Self::wrap(if set { value | bit } else { value & !bit })
    }
}

//===========================================================================//

/// An 8-bit value.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Byte(pub u8);

impl Byte {
    /// The value zero.
    pub const ZERO: Byte = Byte(0);

    /// Returns the low four bits.
    pub fn low_nibble(self) -> u8 {
        self.0 & 0x0f
    }

    /// Returns the high four bits, shifted down.
    pub fn high_nibble(self) -> u8 {
        self.0 >> 4
    }

    /// Adds `rhs`, wrapping at the 8-bit boundary.
    pub fn wrapping_add(self, rhs: u8) -> Byte {
        Byte(self.0.wrapping_add(rhs))
    }

    /// Subtracts `rhs`, wrapping at the 8-bit boundary.
    pub fn wrapping_sub(self, rhs: u8) -> Byte {
        Byte(self.0.wrapping_sub(rhs))
    }
}

impl Value for Byte {
    const BITS: u32 = 8;

    fn to_u32(self) -> u32 {
        u32::from(self.0)
    }

    fn wrap(value: u32) -> Byte {
        Byte(value as u8)
    }
}

impl From<u8> for Byte {
    fn from(value: u8) -> Byte {
        Byte(value)
    }
}

impl From<Byte> for u8 {
    fn from(value: Byte) -> u8 {
        value.0
    }
}

impl fmt::Display for Byte {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:02X}", self.0)
    }
}

//===========================================================================//

/// A 16-bit value.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Word(pub u16);

impl Word {
    /// The value zero.
    pub const ZERO: Word = Word(0);

    /// Composes a word from its low and high bytes.
    pub fn new(low: Byte, high: Byte) -> Word {
        Word((u16::from(high.0) << 8) | u16::from(low.0))
    }

    /// Zero-extends a byte into a word.
    pub fn from_byte(low: Byte) -> Word {
        Word(u16::from(low.0))
    }

    /// Returns the low byte.
    pub fn low(self) -> Byte {
        Byte(self.0 as u8)
    }

    /// Returns the high byte.
    pub fn high(self) -> Byte {
        Byte((self.0 >> 8) as u8)
    }

    /// Returns a copy with the low byte replaced.
    pub fn with_low(self, low: Byte) -> Word {
        Word::new(low, self.high())
    }

    /// Returns a copy with the high byte replaced.
    pub fn with_high(self, high: Byte) -> Word {
        Word::new(self.low(), high)
    }

    /// Adds `rhs`, wrapping at the 16-bit boundary.
    pub fn wrapping_add(self, rhs: u16) -> Word {
        Word(self.0.wrapping_add(rhs))
    }

    /// Subtracts `rhs`, wrapping at the 16-bit boundary.
    pub fn wrapping_sub(self, rhs: u16) -> Word {
        Word(self.0.wrapping_sub(rhs))
    }

    /// Adds a signed offset, wrapping at the 16-bit boundary.
    pub fn offset(self, delta: i16) -> Word {
        Word(self.0.wrapping_add_signed(delta))
    }
}

impl Value for Word {
    const BITS: u32 = 16;

    fn to_u32(self) -> u32 {
        u32::from(self.0)
    }

    fn wrap(value: u32) -> Word {
        Word(value as u16)
    }
}

impl From<u16> for Word {
    fn from(value: u16) -> Word {
        Word(value)
    }
}

impl From<Word> for u16 {
    fn from(value: Word) -> u16 {
        value.0
    }
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:04X}", self.0)
    }
}

//===========================================================================//

/// A 24-bit value, made of a 16-bit word and an 8-bit bank.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Long(u32);

impl Long {
    /// The value zero.
    pub const ZERO: Long = Long(0);

    /// Builds a long from the low 24 bits of `value`.
    pub const fn new(value: u32) -> Long {
        Long(value & 0x00ff_ffff)
    }

    /// Composes a long from a word and a bank byte.
    pub fn from_parts(word: Word, bank: Byte) -> Long {
        Long((u32::from(bank.0) << 16) | u32::from(word.0))
    }

    /// Returns the 24-bit value.
    pub fn value(self) -> u32 {
        self.0
    }

    /// Returns the low 16 bits.
    pub fn word(self) -> Word {
        Word(self.0 as u16)
    }

    /// Returns the bank (the high 8 bits).
    pub fn bank(self) -> Byte {
        Byte((self.0 >> 16) as u8)
    }

    /// Returns a copy with the low 16 bits replaced, keeping the bank.
    pub fn with_word(self, word: Word) -> Long {
        Long::from_parts(word, self.bank())
    }

    /// Adds `rhs`, wrapping at the 24-bit boundary.
    pub fn wrapping_add(self, rhs: u32) -> Long {
        Long::new(self.0.wrapping_add(rhs))
    }
}

impl Value for Long {
    const BITS: u32 = 24;

    fn to_u32(self) -> u32 {
        self.0
    }

    fn wrap(value: u32) -> Long {
        Long::new(value)
    }
}

impl fmt::Display for Long {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:06X}", self.0)
    }
}

//===========================================================================//

macro_rules! impl_bit_ops {
    ($type:ident) => {
        impl ops::Not for $type {
            type Output = $type;
            fn not(self) -> $type {
                <$type as Value>::wrap(!self.to_u32())
            }
        }

        impl ops::BitAnd for $type {
            type Output = $type;
            fn bitand(self, rhs: $type) -> $type {
                <$type as Value>::wrap(self.to_u32() & rhs.to_u32())
            }
        }

        impl ops::BitOr for $type {
            type Output = $type;
            fn bitor(self, rhs: $type) -> $type {
                <$type as Value>::wrap(self.to_u32() | rhs.to_u32())
            }
        }

        impl ops::BitXor for $type {
            type Output = $type;
            fn bitxor(self, rhs: $type) -> $type {
                <$type as Value>::wrap(self.to_u32() ^ rhs.to_u32())
            }
        }
    };
}

impl_bit_ops!(Byte);
impl_bit_ops!(Word);
impl_bit_ops!(Long);

//===========================================================================//

/// The result of an arithmetic operation, along with the flags it produced.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Sum<T> {
    /// The wrapped result.
    pub value: T,
    /// Carry out of the top bit (for subtraction: no borrow occurred).
    pub carry: bool,
    /// Signed overflow.
    pub overflow: bool,
    /// Carry out of the low nibble of the top byte.
    pub half_carry: bool,
}

/// Adds `a`, `b` and the carry bit at the width of `T`.
pub fn binary_add<T: Value>(a: T, b: T, carry: bool) -> Sum<T> {
    let (x, y) = (a.to_u32(), b.to_u32());
    let sum = x + y + u32::from(carry);
    let value = T::wrap(sum);
    let half_bit = 1u32 << (T::BITS - 4);
    Sum {
        value,
        carry: (sum >> T::BITS) & 1 != 0,
        overflow: a.is_negative() == b.is_negative()
            && b.is_negative() != value.is_negative(),
        half_carry: (x ^ y ^ sum) & half_bit != 0,
    }
}

/// Subtracts `b` from `a` with the carry acting as an inverted borrow.
pub fn binary_subtract<T: Value>(a: T, b: T, carry: bool) -> Sum<T> {
    binary_add(a, T::wrap(!b.to_u32()), carry)
}

/// Adds two packed-BCD bytes and the carry bit.
pub fn decimal_add(a: Byte, b: Byte, carry: bool) -> Sum<Byte> {
    let mut low = i32::from(a.low_nibble())
        + i32::from(b.low_nibble())
        + i32::from(carry);
    if low >= 0x0a {
        low = ((low + 0x06) & 0x0f) + 0x10;
    }
    let high_a = i32::from(a.0 & 0xf0);
    let high_b = i32::from(b.0 & 0xf0);
    let signed = i32::from((a.0 & 0xf0) as i8)
        + i32::from((b.0 & 0xf0) as i8)
        + low;
    let mut sum = high_a + high_b + low;
    if sum >= 0xa0 {
        sum += 0x60;
    }
    Sum {
        value: Byte(sum as u8),
        carry: sum >= 0x100,
        overflow: !(-128..=127).contains(&signed),
        half_carry: low >= 0x10,
    }
}

/// Subtracts two packed-BCD bytes with the carry acting as an inverted
/// borrow.  The flags are those of the equivalent binary subtraction.
pub fn decimal_subtract(a: Byte, b: Byte, carry: bool) -> Sum<Byte> {
    let mut low = i32::from(a.low_nibble()) - i32::from(b.low_nibble())
        + i32::from(carry)
        - 1;
    if low < 0 {
        low = ((low - 0x06) & 0x0f) - 0x10;
    }
    let mut diff = i32::from(a.0 & 0xf0) - i32::from(b.0 & 0xf0) + low;
    if diff < 0 {
        diff -= 0x60;
    }
    let binary = binary_subtract(a, b, carry);
    Sum { value: Byte(diff as u8), ..binary }
}

/// Divides a 16-bit dividend by an 8-bit divisor the way the CPU's math
/// unit does, returning `(quotient, remainder)`.  Dividing by zero yields a
/// quotient of `0xffff` and leaves the dividend as the remainder.
pub fn divide(dividend: Word, divisor: Byte) -> (Word, Word) {
    if divisor.0 == 0 {
        (Word(0xffff), dividend)
    } else {
        let divisor = u16::from(divisor.0);
        (Word(dividend.0 / divisor), Word(dividend.0 % divisor))
    }
}

//===========================================================================//


//===========================================================================//
