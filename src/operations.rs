//! The instruction handlers: one pure state transition per instruction.
//!
//! Every handler receives the state as it looks after the fetch, with the
//! program counter already advanced past the instruction. Skips add one more
//! instruction width, control transfers overwrite the counter outright, and
//! the key wait rewinds it so the same word refetches on the next step.
//!
//! Address policy: every address a handler computes is taken modulo the
//! 4096-byte memory before use. Stack policy: pushing past 16 frames or
//! popping an empty stack panics in debug builds; in release builds the
//! pointer wraps and the slot index is taken modulo the stack depth.

use rand::Rng;

use crate::constants::{
    ADDRESS_MASK, DISPLAY_HEIGHT, DISPLAY_WIDTH, FONT_START, GLYPH_SIZE, MEMORY_SIZE, STACK_DEPTH,
};
use crate::opcode::Word;
use crate::quirks::Quirks;
use crate::state::State;

fn mem_index(base: u16, offset: usize) -> usize {
    (base as usize + offset) % MEMORY_SIZE
}

/// 00E0: every pixel off
pub fn clear(state: &State) -> State {
    State {
        frame_buffer: [[false; DISPLAY_WIDTH]; DISPLAY_HEIGHT],
        ..*state
    }
}

/// 00EE: PC = STACK.pop()
pub fn ret(state: &State) -> State {
    debug_assert!(state.sp > 0, "return with an empty call stack");
    let sp = state.sp.wrapping_sub(1);
    State {
        pc: state.stack[sp as usize % STACK_DEPTH],
        sp,
        ..*state
    }
}

/// 1NNN: PC = NNN
pub fn jump(word: Word, state: &State) -> State {
    State {
        pc: word.addr(),
        ..*state
    }
}

/// 2NNN: STACK.push(PC); PC = NNN
pub fn call(word: Word, state: &State) -> State {
    debug_assert!((state.sp as usize) < STACK_DEPTH, "call stack overflow");
    let mut stack = state.stack;
    stack[state.sp as usize % STACK_DEPTH] = state.pc;
    State {
        pc: word.addr(),
        sp: state.sp.wrapping_add(1),
        stack,
        ..*state
    }
}

/// 3XKK: skip if Vx == KK
pub fn skip_eq_imm(word: Word, state: &State) -> State {
    let pc = if state.v[word.x()] == word.kk() {
        state.pc.wrapping_add(0x2)
    } else {
        state.pc
    };
    State { pc, ..*state }
}

/// 4XKK: skip if Vx != KK
pub fn skip_ne_imm(word: Word, state: &State) -> State {
    let pc = if state.v[word.x()] != word.kk() {
        state.pc.wrapping_add(0x2)
    } else {
        state.pc
    };
    State { pc, ..*state }
}

/// 5XY0: skip if Vx == Vy
pub fn skip_eq_reg(word: Word, state: &State) -> State {
    let pc = if state.v[word.x()] == state.v[word.y()] {
        state.pc.wrapping_add(0x2)
    } else {
        state.pc
    };
    State { pc, ..*state }
}

/// 9XY0: skip if Vx != Vy
pub fn skip_ne_reg(word: Word, state: &State) -> State {
    let pc = if state.v[word.x()] != state.v[word.y()] {
        state.pc.wrapping_add(0x2)
    } else {
        state.pc
    };
    State { pc, ..*state }
}

/// 6XKK: Vx = KK
pub fn set_imm(word: Word, state: &State) -> State {
    let mut v = state.v;
    v[word.x()] = word.kk();
    State { v, ..*state }
}

/// 7XKK: Vx += KK, wrapping, no flag
pub fn add_imm(word: Word, state: &State) -> State {
    let mut v = state.v;
    v[word.x()] = v[word.x()].wrapping_add(word.kk());
    State { v, ..*state }
}

/// 8XY0: Vx = Vy
pub fn mov(word: Word, state: &State) -> State {
    let mut v = state.v;
    v[word.x()] = v[word.y()];
    State { v, ..*state }
}

/// 8XY1: Vx |= Vy
pub fn or(word: Word, state: &State) -> State {
    let mut v = state.v;
    v[word.x()] |= v[word.y()];
    State { v, ..*state }
}

/// 8XY2: Vx &= Vy
pub fn and(word: Word, state: &State) -> State {
    let mut v = state.v;
    v[word.x()] &= v[word.y()];
    State { v, ..*state }
}

/// 8XY3: Vx ^= Vy
pub fn xor(word: Word, state: &State) -> State {
    let mut v = state.v;
    v[word.x()] ^= v[word.y()];
    State { v, ..*state }
}

/// 8XY4: Vx += Vy; VF = 1 iff the sum overflows a byte
pub fn add_carry(word: Word, state: &State) -> State {
    let (result, carry) = state.v[word.x()].overflowing_add(state.v[word.y()]);
    let mut v = state.v;
    v[0xF] = carry as u8;
    v[word.x()] = result;
    State { v, ..*state }
}

/// 8XY5: Vx -= Vy; VF = borrow flag
///
/// The flag polarity is the quirk: strict (VF = 1 iff Vx > Vy beforehand)
/// or no-borrow (VF = 1 iff Vx >= Vy). The flag lands before the result, so
/// X = F keeps the result, as in the reference.
pub fn sub_borrow(word: Word, state: &State, quirks: Quirks) -> State {
    let (x, y) = (state.v[word.x()], state.v[word.y()]);
    let mut v = state.v;
    v[0xF] = if quirks.subtract_strict_flag {
        (x > y) as u8
    } else {
        (x >= y) as u8
    };
    v[word.x()] = v[word.x()].wrapping_sub(v[word.y()]);
    State { v, ..*state }
}

/// 8XY7: Vx = Vy - Vx; VF = borrow flag, same polarity quirk as 8XY5
pub fn sub_borrow_rev(word: Word, state: &State, quirks: Quirks) -> State {
    let (x, y) = (state.v[word.x()], state.v[word.y()]);
    let mut v = state.v;
    v[0xF] = if quirks.subtract_strict_flag {
        (y > x) as u8
    } else {
        (y >= x) as u8
    };
    v[word.x()] = v[word.y()].wrapping_sub(v[word.x()]);
    State { v, ..*state }
}

/// 8XY6: shift right one bit into Vx; VF = the bit shifted out
///
/// The source register is the quirk: Vy in the reference convention, Vx in
/// place otherwise.
pub fn shift_right(word: Word, state: &State, quirks: Quirks) -> State {
    let source = if quirks.shift_reads_y {
        word.y()
    } else {
        word.x()
    };
    let mut v = state.v;
    let shifted_out = v[source] & 0x01;
    v[word.x()] = v[source] >> 1;
    v[0xF] = shifted_out;
    State { v, ..*state }
}

/// 8XYE: shift left one bit into Vx; VF = the bit shifted out
pub fn shift_left(word: Word, state: &State, quirks: Quirks) -> State {
    let source = if quirks.shift_reads_y {
        word.y()
    } else {
        word.x()
    };
    let mut v = state.v;
    let shifted_out = (v[source] & 0x80) >> 7;
    v[word.x()] = v[source] << 1;
    v[0xF] = shifted_out;
    State { v, ..*state }
}

/// ANNN: I = NNN
pub fn set_index(word: Word, state: &State) -> State {
    State {
        i: word.addr(),
        ..*state
    }
}

/// BNNN: PC = NNN + V0
pub fn jump_offset(word: Word, state: &State) -> State {
    State {
        pc: (word.addr() + u16::from(state.v[0x0])) & ADDRESS_MASK,
        ..*state
    }
}

/// CXKK: Vx = random byte & KK
pub fn random(word: Word, state: &State, rng: &mut impl Rng) -> State {
    let byte: u8 = rng.gen();
    let mut v = state.v;
    v[word.x()] = byte & word.kk();
    State { v, ..*state }
}

/// DXYN: XOR an 8xN sprite from memory at I onto the screen at (Vx, Vy);
/// VF = 1 iff any pixel flips on -> off
///
/// The start position wraps around the screen; the sprite itself does not.
/// Rows past the bottom edge and columns past the right edge are clipped.
pub fn draw(word: Word, state: &State) -> State {
    let mut v = state.v;
    let mut frame_buffer = state.frame_buffer;

    let x_start = state.v[word.x()] as usize % DISPLAY_WIDTH;
    let y_start = state.v[word.y()] as usize % DISPLAY_HEIGHT;
    v[0xF] = 0x0;

    for row in 0..word.n() as usize {
        let y = y_start + row;
        if y >= DISPLAY_HEIGHT {
            break;
        }
        let sprite_byte = state.memory[mem_index(state.i, row)];
        for col in 0..8 {
            let x = x_start + col;
            if x >= DISPLAY_WIDTH {
                break;
            }
            if sprite_byte & (0x80 >> col) == 0 {
                continue;
            }
            if frame_buffer[y][x] {
                v[0xF] = 0x1;
            }
            frame_buffer[y][x] ^= true;
        }
    }

    State {
        v,
        frame_buffer,
        ..*state
    }
}

/// EX9E: skip if the key named by Vx is held
pub fn skip_key_held(word: Word, state: &State, pressed_keys: &[bool; 16]) -> State {
    let pc = if pressed_keys[state.v[word.x()] as usize % 16] {
        state.pc.wrapping_add(0x2)
    } else {
        state.pc
    };
    State { pc, ..*state }
}

/// EXA1: skip if the key named by Vx is not held
pub fn skip_key_not_held(word: Word, state: &State, pressed_keys: &[bool; 16]) -> State {
    let pc = if !pressed_keys[state.v[word.x()] as usize % 16] {
        state.pc.wrapping_add(0x2)
    } else {
        state.pc
    };
    State { pc, ..*state }
}

/// FX07: Vx = delay timer
pub fn get_delay(word: Word, state: &State) -> State {
    let mut v = state.v;
    v[word.x()] = state.delay_timer;
    State { v, ..*state }
}

/// FX0A: store the lowest held key index in Vx, or rewind and retry
///
/// Scans keys 0..=F in ascending order. With none held the program counter
/// rewinds by one instruction so the same word refetches next step; the
/// busy-wait resolves only through the driver's key updates.
pub fn wait_key(word: Word, state: &State, pressed_keys: &[bool; 16]) -> State {
    match pressed_keys.iter().position(|&held| held) {
        Some(key) => {
            let mut v = state.v;
            v[word.x()] = key as u8;
            State { v, ..*state }
        }
        None => State {
            pc: state.pc.wrapping_sub(0x2),
            ..*state
        },
    }
}

/// FX15: delay timer = Vx
pub fn set_delay(word: Word, state: &State) -> State {
    State {
        delay_timer: state.v[word.x()],
        ..*state
    }
}

/// FX18: sound timer = Vx
pub fn set_sound(word: Word, state: &State) -> State {
    State {
        sound_timer: state.v[word.x()],
        ..*state
    }
}

/// FX1E: I += Vx, wrapping at the address space
pub fn add_index(word: Word, state: &State) -> State {
    State {
        i: state.i.wrapping_add(u16::from(state.v[word.x()])) & ADDRESS_MASK,
        ..*state
    }
}

/// FX29: I = address of the font glyph for the low nibble of Vx
pub fn glyph_index(word: Word, state: &State) -> State {
    State {
        i: FONT_START + GLYPH_SIZE * u16::from(state.v[word.x()] & 0x0F),
        ..*state
    }
}

/// FX33: mem[I..I+3] = the decimal digits of Vx, most significant first
pub fn store_bcd(word: Word, state: &State) -> State {
    let value = state.v[word.x()];
    let mut memory = state.memory;
    memory[mem_index(state.i, 0)] = value / 100;
    memory[mem_index(state.i, 1)] = value / 10 % 10;
    memory[mem_index(state.i, 2)] = value % 10;
    State { memory, ..*state }
}

/// FX55: mem[I..=I+X] = V0..=Vx
pub fn store_regs(word: Word, state: &State, quirks: Quirks) -> State {
    let mut memory = state.memory;
    for offset in 0..=word.x() {
        memory[mem_index(state.i, offset)] = state.v[offset];
    }
    State {
        memory,
        i: transferred_index(word, state, quirks),
        ..*state
    }
}

/// FX65: V0..=Vx = mem[I..=I+X]
pub fn load_regs(word: Word, state: &State, quirks: Quirks) -> State {
    let mut v = state.v;
    for offset in 0..=word.x() {
        v[offset] = state.memory[mem_index(state.i, offset)];
    }
    State {
        v,
        i: transferred_index(word, state, quirks),
        ..*state
    }
}

/// Reserved encoding: state passes through untouched
pub fn nop(state: &State) -> State {
    *state
}

fn transferred_index(word: Word, state: &State, quirks: Quirks) -> u16 {
    if quirks.increment_i_on_transfer {
        state.i.wrapping_add(word.x() as u16 + 1) & ADDRESS_MASK
    } else {
        state.i
    }
}
