use crate::opcode::Word;

/// One tag per instruction in the set, plus an explicit no-op for every
/// reserved encoding.
///
/// The instruction set reuses the top nibble across unrelated families, so
/// decoding is layered: the primary class selects either an instruction
/// directly or a secondary table keyed by the low nibble (classes 0x0, 0x8,
/// 0xE) or the low byte (class 0xF). Unknown encodings decode to `Nop`
/// rather than halting execution.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Op {
    /// 00E0: clear the screen
    Clear,
    /// 00EE: return from a subroutine
    Return,
    /// 1NNN: jump to NNN
    Jump,
    /// 2NNN: push the return address and jump to NNN
    Call,
    /// 3XKK: skip the next instruction if Vx == KK
    SkipEqImm,
    /// 4XKK: skip the next instruction if Vx != KK
    SkipNeImm,
    /// 5XY0: skip the next instruction if Vx == Vy
    SkipEqReg,
    /// 6XKK: Vx = KK
    SetImm,
    /// 7XKK: Vx += KK, no flag
    AddImm,
    /// 8XY0: Vx = Vy
    Mov,
    /// 8XY1: Vx |= Vy
    Or,
    /// 8XY2: Vx &= Vy
    And,
    /// 8XY3: Vx ^= Vy
    Xor,
    /// 8XY4: Vx += Vy; VF = carry
    AddCarry,
    /// 8XY5: Vx -= Vy; VF = borrow flag
    SubBorrow,
    /// 8XY6: shift right one bit; VF = bit shifted out
    ShiftRight,
    /// 8XY7: Vx = Vy - Vx; VF = borrow flag
    SubBorrowRev,
    /// 8XYE: shift left one bit; VF = bit shifted out
    ShiftLeft,
    /// 9XY0: skip the next instruction if Vx != Vy
    SkipNeReg,
    /// ANNN: I = NNN
    SetIndex,
    /// BNNN: jump to NNN + V0
    JumpOffset,
    /// CXKK: Vx = random byte & KK
    Random,
    /// DXYN: draw an 8xN sprite from memory at I to (Vx, Vy); VF = collision
    Draw,
    /// EX9E: skip the next instruction if the key Vx is held
    SkipKeyHeld,
    /// EXA1: skip the next instruction if the key Vx is not held
    SkipKeyNotHeld,
    /// FX07: Vx = delay timer
    GetDelay,
    /// FX0A: wait for a key press and store its index in Vx
    WaitKey,
    /// FX15: delay timer = Vx
    SetDelay,
    /// FX18: sound timer = Vx
    SetSound,
    /// FX1E: I += Vx
    AddIndex,
    /// FX29: I = address of the font glyph for the low nibble of Vx
    GlyphIndex,
    /// FX33: store the decimal digits of Vx at I, I+1, I+2
    StoreBcd,
    /// FX55: store V0..=Vx to memory starting at I
    StoreRegs,
    /// FX65: load V0..=Vx from memory starting at I
    LoadRegs,
    /// any reserved encoding: do nothing
    Nop,
}

impl Op {
    /// Decode an instruction word. Total: every possible word maps to a tag.
    pub fn decode(word: Word) -> Self {
        match word.class() {
            0x0 => Self::decode_system(word),
            0x1 => Op::Jump,
            0x2 => Op::Call,
            0x3 => Op::SkipEqImm,
            0x4 => Op::SkipNeImm,
            0x5 => Op::SkipEqReg,
            0x6 => Op::SetImm,
            0x7 => Op::AddImm,
            0x8 => Self::decode_alu(word),
            0x9 => Op::SkipNeReg,
            0xA => Op::SetIndex,
            0xB => Op::JumpOffset,
            0xC => Op::Random,
            0xD => Op::Draw,
            0xE => Self::decode_key(word),
            _ => Self::decode_misc(word),
        }
    }

    /// Class 0x0, keyed by the low nibble
    fn decode_system(word: Word) -> Self {
        match word.n() {
            0x0 => Op::Clear,
            0xE => Op::Return,
            _ => Op::Nop,
        }
    }

    /// Class 0x8, keyed by the low nibble
    fn decode_alu(word: Word) -> Self {
        match word.n() {
            0x0 => Op::Mov,
            0x1 => Op::Or,
            0x2 => Op::And,
            0x3 => Op::Xor,
            0x4 => Op::AddCarry,
            0x5 => Op::SubBorrow,
            0x6 => Op::ShiftRight,
            0x7 => Op::SubBorrowRev,
            0xE => Op::ShiftLeft,
            _ => Op::Nop,
        }
    }

    /// Class 0xE, keyed by the low nibble
    fn decode_key(word: Word) -> Self {
        match word.n() {
            0xE => Op::SkipKeyHeld,
            0x1 => Op::SkipKeyNotHeld,
            _ => Op::Nop,
        }
    }

    /// Class 0xF, keyed by the low byte
    fn decode_misc(word: Word) -> Self {
        match word.kk() {
            0x07 => Op::GetDelay,
            0x0A => Op::WaitKey,
            0x15 => Op::SetDelay,
            0x18 => Op::SetSound,
            0x1E => Op::AddIndex,
            0x29 => Op::GlyphIndex,
            0x33 => Op::StoreBcd,
            0x55 => Op::StoreRegs,
            0x65 => Op::LoadRegs,
            _ => Op::Nop,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// One encoding of each instruction and the tag it must reach
    const DECODE_MATRIX: [(u16, Op); 34] = [
        (0x00E0, Op::Clear),
        (0x00EE, Op::Return),
        (0x1ABC, Op::Jump),
        (0x2ABC, Op::Call),
        (0x31CD, Op::SkipEqImm),
        (0x41CD, Op::SkipNeImm),
        (0x5120, Op::SkipEqReg),
        (0x61CD, Op::SetImm),
        (0x71CD, Op::AddImm),
        (0x8120, Op::Mov),
        (0x8121, Op::Or),
        (0x8122, Op::And),
        (0x8123, Op::Xor),
        (0x8124, Op::AddCarry),
        (0x8125, Op::SubBorrow),
        (0x8126, Op::ShiftRight),
        (0x8127, Op::SubBorrowRev),
        (0x812E, Op::ShiftLeft),
        (0x9120, Op::SkipNeReg),
        (0xAABC, Op::SetIndex),
        (0xBABC, Op::JumpOffset),
        (0xC1CD, Op::Random),
        (0xD125, Op::Draw),
        (0xE19E, Op::SkipKeyHeld),
        (0xE1A1, Op::SkipKeyNotHeld),
        (0xF107, Op::GetDelay),
        (0xF10A, Op::WaitKey),
        (0xF115, Op::SetDelay),
        (0xF118, Op::SetSound),
        (0xF11E, Op::AddIndex),
        (0xF129, Op::GlyphIndex),
        (0xF133, Op::StoreBcd),
        (0xF155, Op::StoreRegs),
        (0xF165, Op::LoadRegs),
    ];

    #[test]
    fn test_every_instruction_reaches_its_handler() {
        for (encoding, expected) in DECODE_MATRIX {
            assert_eq!(Op::decode(Word(encoding)), expected, "{encoding:04X}");
        }
    }

    /// The full primary x secondary space, including the 256-way class 0xF
    /// table, decodes without panicking; encodings with no registered
    /// handler decode to the explicit no-op.
    #[test]
    fn test_decode_is_total() {
        for encoding in 0x0000..=0xFFFFu16 {
            let _ = Op::decode(Word(encoding));
        }
    }

    #[test]
    fn test_reserved_encodings_are_nops() {
        for encoding in [0x0001, 0x00E1, 0x00FF, 0x8128, 0x812F, 0xE100, 0xE19F, 0xF100, 0xF1FF] {
            assert_eq!(Op::decode(Word(encoding)), Op::Nop, "{encoding:04X}");
        }
    }

    /// Direct-routed classes ignore the low nibble entirely
    #[test]
    fn test_direct_classes_ignore_low_nibble() {
        assert_eq!(Op::decode(Word(0x5121)), Op::SkipEqReg);
        assert_eq!(Op::decode(Word(0x912F)), Op::SkipNeReg);
    }
}
