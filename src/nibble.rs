use std::fmt;
use std::ops::{Index, IndexMut};

/// A 4-bit unsigned integer (nibble).
///
/// Used for register operands and keypad keys, so indexing a 16-slot array
/// with it can never go out of bounds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[allow(non_camel_case_types)]
pub struct u4(u8);

impl u4 {
    /// Creates a new `u4` from a `u8`.
    ///
    /// Panics if the value is greater than 0x0F.
    pub const fn new(value: u8) -> Self {
        assert!(value <= 0x0F, "u4 value must be in range 0x0-0xF");
        Self(value)
    }

    /// Creates a `u4` from the low nibble of `value`, discarding the high bits.
    pub const fn low(value: u8) -> Self {
        Self(value & 0x0F)
    }
}

impl From<u4> for usize {
    fn from(v: u4) -> usize {
        v.0 as usize
    }
}

impl From<u4> for u8 {
    fn from(v: u4) -> u8 {
        v.0
    }
}

impl fmt::Display for u4 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:X}", self.0)
    }
}

impl<T> Index<u4> for [T; 16] {
    type Output = T;

    fn index(&self, index: u4) -> &Self::Output {
        &self[index.0 as usize]
    }
}

impl<T> IndexMut<u4> for [T; 16] {
    fn index_mut(&mut self, index: u4) -> &mut Self::Output {
        &mut self[index.0 as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn low_masks_high_bits() {
        assert_eq!(u4::low(0xAB), u4::new(0xB));
        assert_eq!(u8::from(u4::low(0x0F)), 0xF);
    }

    #[test]
    #[should_panic]
    fn new_panics_on_wide_value() {
        let _ = u4::new(0x10);
    }

    #[test]
    fn indexes_sixteen_slot_arrays() {
        let mut regs = [0u8; 16];
        regs[u4::new(0xF)] = 7;
        assert_eq!(regs[15], 7);
    }

    #[test]
    fn displays_as_hex_digit() {
        assert_eq!(u4::new(0xA).to_string(), "A");
    }
}
