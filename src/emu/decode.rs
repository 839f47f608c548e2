use crate::u4;

/// A raw 16-bit instruction word and its operand fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Instruction(pub u16);

impl Instruction {
    pub fn from_bytes(high: u8, low: u8) -> Self {
        Self(u16::from_be_bytes([high, low]))
    }

    /// The four nibbles, most significant first.
    pub fn nibbles(self) -> (u8, u8, u8, u8) {
        (
            ((self.0 & 0xF000) >> 12) as u8,
            ((self.0 & 0x0F00) >> 8) as u8,
            ((self.0 & 0x00F0) >> 4) as u8,
            (self.0 & 0x000F) as u8,
        )
    }

    pub fn x(self) -> u4 {
        u4::low((self.0 >> 8) as u8)
    }

    pub fn y(self) -> u4 {
        u4::low((self.0 >> 4) as u8)
    }

    pub fn n(self) -> u4 {
        u4::low(self.0 as u8)
    }

    /// Low byte (`kk`).
    pub fn kk(self) -> u8 {
        (self.0 & 0x00FF) as u8
    }

    /// Low 12 bits (`nnn`).
    pub fn addr(self) -> u16 {
        self.0 & 0x0FFF
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_fields() {
        let ins = Instruction::from_bytes(0xD1, 0x2F);
        assert_eq!(ins.nibbles(), (0xD, 0x1, 0x2, 0xF));
        assert_eq!(ins.x(), u4::new(0x1));
        assert_eq!(ins.y(), u4::new(0x2));
        assert_eq!(ins.n(), u4::new(0xF));
        assert_eq!(ins.kk(), 0x2F);
        assert_eq!(ins.addr(), 0x12F);
    }
}
