use crate::constants::{
    DISPLAY_HEIGHT, DISPLAY_WIDTH, FONT_SET, FONT_START, PROGRAM_START, STACK_DEPTH,
};

/// The monochrome display, indexed as `[row][col]`
pub type FrameBuffer = [[bool; DISPLAY_WIDTH]; DISPLAY_HEIGHT];

/// A snapshot of the machine's internal state
///
/// ## Registers
/// - (v) 16 8-bit registers V0..VF
///     - V0..VE are general purpose
///     - VF doubles as the carry/borrow/collision flag and is clobbered by
///       the instructions that report one
/// - (i) the 16-bit index register, the base address for sprite and
///   memory-block instructions
/// - (pc) the 16-bit program counter, starting at the load offset
/// - (sp) the 8-bit stack pointer, counting pushed frames
///
/// ## Timers
/// - 2 8-bit timers (delay & sound) that count down to zero at 60Hz; the
///   sound timer being nonzero is the "tone on" signal
///
/// ## Memory
/// - 4096 bytes of addressable memory; the font table sits at 0x050 and
///   program images load at 0x200
/// - a 16-deep stack of return addresses
/// - a 64x32 1-bit frame buffer
#[derive(Copy, Clone)]
pub struct State {
    pub v: [u8; 16],
    pub i: u16,
    pub pc: u16,
    pub sp: u8,
    pub delay_timer: u8,
    pub sound_timer: u8,
    pub stack: [u16; STACK_DEPTH],
    pub memory: [u8; 4096],
    pub frame_buffer: FrameBuffer,
}

impl State {
    pub fn new() -> Self {
        let mut memory = [0; 4096];
        let font_start = FONT_START as usize;
        memory[font_start..font_start + FONT_SET.len()].copy_from_slice(&FONT_SET);

        State {
            v: [0; 16],
            i: 0,
            pc: PROGRAM_START,
            sp: 0,
            delay_timer: 0,
            sound_timer: 0,
            stack: [0; STACK_DEPTH],
            memory,
            frame_buffer: [[false; DISPLAY_WIDTH]; DISPLAY_HEIGHT],
        }
    }
}

impl Default for State {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_font_table_at_fixed_region() {
        let state = State::new();
        assert_eq!(state.memory[0x050..0x0A0], FONT_SET);
    }

    #[test]
    fn test_memory_outside_font_zeroed() {
        let state = State::new();
        assert!(state.memory[..0x050].iter().all(|&byte| byte == 0));
        assert!(state.memory[0x0A0..].iter().all(|&byte| byte == 0));
    }

    #[test]
    fn test_pc_starts_at_load_offset() {
        let state = State::new();
        assert_eq!(state.pc, 0x200);
    }

    #[test]
    fn test_frame_buffer_starts_off() {
        let state = State::new();
        assert!(state
            .frame_buffer
            .iter()
            .all(|row| row.iter().all(|&pixel| !pixel)));
    }
}
