/// A raw 16-bit instruction word, fetched big-endian from two consecutive
/// memory bytes.
///
/// The nibbles not used for dispatch carry operands:
/// - `[_nnn]` a 12-bit address
/// - `[_x__]` the index of register Vx, or of the range V0..=Vx
/// - `[__y_]` the index of register Vy
/// - `[__kk]` an 8-bit immediate
/// - `[___n]` a 4-bit immediate (sprite height)
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Word(pub u16);

impl Word {
    /// The primary opcode class.
    /// `[c___]`
    pub fn class(self) -> u8 {
        ((self.0 & 0xF000) >> 12) as u8
    }

    /// The Vx register index.
    /// `[_x__]`
    pub fn x(self) -> usize {
        ((self.0 & 0x0F00) >> 8) as usize
    }

    /// The Vy register index.
    /// `[__y_]`
    pub fn y(self) -> usize {
        ((self.0 & 0x00F0) >> 4) as usize
    }

    /// The low nibble, a 4-bit immediate and the secondary dispatch key for
    /// classes 0x0, 0x8, and 0xE.
    /// `[___n]`
    pub fn n(self) -> u8 {
        (self.0 & 0x000F) as u8
    }

    /// The low byte, an 8-bit immediate and the secondary dispatch key for
    /// class 0xF.
    /// `[__kk]`
    pub fn kk(self) -> u8 {
        (self.0 & 0x00FF) as u8
    }

    /// The 12-bit address field.
    /// `[_nnn]`
    pub fn addr(self) -> u16 {
        self.0 & 0x0FFF
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class() {
        assert_eq!(Word(0xABCD).class(), 0xA);
    }

    #[test]
    fn test_x() {
        assert_eq!(Word(0xABCD).x(), 0xB);
    }

    #[test]
    fn test_y() {
        assert_eq!(Word(0xABCD).y(), 0xC);
    }

    #[test]
    fn test_n() {
        assert_eq!(Word(0xABCD).n(), 0xD);
    }

    #[test]
    fn test_kk() {
        assert_eq!(Word(0xABCD).kk(), 0xCD);
    }

    #[test]
    fn test_addr() {
        assert_eq!(Word(0xABCD).addr(), 0xBCD);
    }
}
