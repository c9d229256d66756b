use std::time::{SystemTime, UNIX_EPOCH};

use rand::rngs::StdRng;
use rand::SeedableRng;
use thiserror::Error;

use crate::constants::{ADDRESS_MASK, MAX_PROGRAM_SIZE, MEMORY_SIZE, PROGRAM_START};
use crate::instruction::Op;
use crate::opcode::Word;
use crate::operations;
use crate::quirks::Quirks;
use crate::state::{FrameBuffer, State};

/// The one recoverable error the core reports. Everything else abnormal is
/// absorbed as defined behavior; file access and process exit belong to the
/// embedding driver.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LoadError {
    #[error("program image is {size} bytes; at most {MAX_PROGRAM_SIZE} fit above the load offset")]
    TooLarge { size: usize },
}

/// # Machine
/// The CHIP-8 virtual machine core: state, the fetch/decode/execute cycle,
/// and timer decay.
///
/// Supplies interfaces for:
/// - loading a program image
/// - pressing and releasing keys
/// - advancing the CPU by one instruction
/// - advancing the timers, decoupled from instruction rate
/// - inspecting the frame buffer and timers for presentation
///
/// The core performs no I/O and keeps no clock; the embedding driver calls
/// `step` at whatever instruction rate it wants and `tick_timers` at a
/// steady 60Hz.
pub struct Machine {
    state: State,
    pressed_keys: [bool; 16],
    rng: StdRng,
    quirks: Quirks,
    loaded: bool,
}

impl Machine {
    /// A machine with reference quirks and a time-seeded random source
    pub fn new() -> Self {
        let seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_nanos() as u64)
            .unwrap_or_default();
        Self::with_seed(seed)
    }

    /// A machine whose random sequence is reproducible
    pub fn with_seed(seed: u64) -> Self {
        Machine {
            state: State::new(),
            pressed_keys: [false; 16],
            rng: StdRng::seed_from_u64(seed),
            quirks: Quirks::REFERENCE,
            loaded: false,
        }
    }

    pub fn quirks(&self) -> Quirks {
        self.quirks
    }

    pub fn set_quirks(&mut self, quirks: Quirks) {
        self.quirks = quirks;
    }

    /// Copy a program image into memory at the load offset and mark the
    /// machine ready.
    ///
    /// # Arguments
    /// * `program` the raw image; a bare binary blob with no header
    pub fn load(&mut self, program: &[u8]) -> Result<(), LoadError> {
        if program.len() > MAX_PROGRAM_SIZE {
            return Err(LoadError::TooLarge {
                size: program.len(),
            });
        }
        let start = PROGRAM_START as usize;
        self.state.memory[start..start + program.len()].copy_from_slice(program);
        self.loaded = true;
        Ok(())
    }

    /// Whether a program image has been loaded. The core never gates `step`
    /// on this; refusing to run an empty machine is the embedder's call.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Set the pressed status of a key
    ///
    /// # Arguments
    /// * `key` the key index, 0x0..=0xF
    pub fn key_press(&mut self, key: u8) {
        self.pressed_keys[key as usize % 16] = true;
    }

    /// Unset the pressed status of a key
    ///
    /// # Arguments
    /// * `key` the key index, 0x0..=0xF
    pub fn key_release(&mut self, key: u8) {
        self.pressed_keys[key as usize % 16] = false;
    }

    /// Execute one fetch/decode/execute unit.
    ///
    /// The program counter advances past the instruction before dispatch, so
    /// handlers see the post-fetch counter: jumps overwrite it, skips add to
    /// it, and the key wait rewinds it. Timers are untouched here — the
    /// reference decremented them both per cycle and per frame, a double
    /// decrement this core deliberately does not reproduce.
    pub fn step(&mut self) {
        let word = self.fetch();
        self.state.pc = self.state.pc.wrapping_add(0x2);
        self.execute(word);
    }

    /// Decrement each nonzero timer by one. Called by the driver at a steady
    /// 60Hz, independent of the instruction rate.
    pub fn tick_timers(&mut self) {
        if self.state.delay_timer > 0 {
            self.state.delay_timer -= 1;
        }
        if self.state.sound_timer > 0 {
            self.state.sound_timer -= 1;
        }
    }

    /// The 64x32 monochrome display, indexed `[row][col]`
    pub fn frame_buffer(&self) -> &FrameBuffer {
        &self.state.frame_buffer
    }

    pub fn delay_timer(&self) -> u8 {
        self.state.delay_timer
    }

    /// Nonzero means the tone is on
    pub fn sound_timer(&self) -> u8 {
        self.state.sound_timer
    }

    /// The big-endian instruction word at the program counter. Memory is
    /// bytes; two consecutive ones make a word.
    fn fetch(&self) -> Word {
        let pc = (self.state.pc & ADDRESS_MASK) as usize;
        let left = u16::from(self.state.memory[pc]);
        let right = u16::from(self.state.memory[(pc + 1) % MEMORY_SIZE]);
        Word(left << 8 | right)
    }

    /// Route the word to exactly one handler and adopt the state it returns
    fn execute(&mut self, word: Word) {
        let quirks = self.quirks;
        let keys = self.pressed_keys;
        self.state = match Op::decode(word) {
            Op::Clear => operations::clear(&self.state),
            Op::Return => operations::ret(&self.state),
            Op::Jump => operations::jump(word, &self.state),
            Op::Call => operations::call(word, &self.state),
            Op::SkipEqImm => operations::skip_eq_imm(word, &self.state),
            Op::SkipNeImm => operations::skip_ne_imm(word, &self.state),
            Op::SkipEqReg => operations::skip_eq_reg(word, &self.state),
            Op::SkipNeReg => operations::skip_ne_reg(word, &self.state),
            Op::SetImm => operations::set_imm(word, &self.state),
            Op::AddImm => operations::add_imm(word, &self.state),
            Op::Mov => operations::mov(word, &self.state),
            Op::Or => operations::or(word, &self.state),
            Op::And => operations::and(word, &self.state),
            Op::Xor => operations::xor(word, &self.state),
            Op::AddCarry => operations::add_carry(word, &self.state),
            Op::SubBorrow => operations::sub_borrow(word, &self.state, quirks),
            Op::ShiftRight => operations::shift_right(word, &self.state, quirks),
            Op::SubBorrowRev => operations::sub_borrow_rev(word, &self.state, quirks),
            Op::ShiftLeft => operations::shift_left(word, &self.state, quirks),
            Op::SetIndex => operations::set_index(word, &self.state),
            Op::JumpOffset => operations::jump_offset(word, &self.state),
            Op::Random => operations::random(word, &self.state, &mut self.rng),
            Op::Draw => operations::draw(word, &self.state),
            Op::SkipKeyHeld => operations::skip_key_held(word, &self.state, &keys),
            Op::SkipKeyNotHeld => operations::skip_key_not_held(word, &self.state, &keys),
            Op::GetDelay => operations::get_delay(word, &self.state),
            Op::WaitKey => operations::wait_key(word, &self.state, &keys),
            Op::SetDelay => operations::set_delay(word, &self.state),
            Op::SetSound => operations::set_sound(word, &self.state),
            Op::AddIndex => operations::add_index(word, &self.state),
            Op::GlyphIndex => operations::glyph_index(word, &self.state),
            Op::StoreBcd => operations::store_bcd(word, &self.state),
            Op::StoreRegs => operations::store_regs(word, &self.state, quirks),
            Op::LoadRegs => operations::load_regs(word, &self.state, quirks),
            Op::Nop => operations::nop(&self.state),
        };
    }
}

impl Default for Machine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_places_bytes_at_load_offset() {
        let mut machine = Machine::with_seed(0);
        machine.load(&[0xAA, 0xBB, 0xCC]).unwrap();
        assert_eq!(machine.state.memory[0x200..0x203], [0xAA, 0xBB, 0xCC]);
        assert!(machine.is_loaded());
    }

    #[test]
    fn test_load_accepts_the_largest_image() {
        let mut machine = Machine::with_seed(0);
        machine.load(&[0x42; 3584]).unwrap();
        assert_eq!(machine.state.memory[0xFFF], 0x42);
    }

    #[test]
    fn test_load_rejects_an_oversized_image_untouched() {
        let mut machine = Machine::with_seed(0);
        let result = machine.load(&[0x42; 3585]);
        assert_eq!(result, Err(LoadError::TooLarge { size: 3585 }));
        assert!(machine.state.memory[0x200..].iter().all(|&byte| byte == 0));
        assert!(!machine.is_loaded());
    }

    #[test]
    fn test_fetch_is_big_endian() {
        let mut machine = Machine::with_seed(0);
        machine.load(&[0xAA, 0xBB]).unwrap();
        assert_eq!(machine.fetch(), Word(0xAABB));
    }

    #[test]
    fn test_step_advances_past_a_plain_instruction() {
        let mut machine = Machine::with_seed(0);
        machine.load(&[0x00, 0xE0]).unwrap();
        machine.step();
        assert_eq!(machine.state.pc, 0x0202);
    }

    #[test]
    fn test_step_jump_lands_exactly_on_the_target() {
        let mut machine = Machine::with_seed(0);
        machine.load(&[0x13, 0x00]).unwrap();
        machine.step();
        assert_eq!(machine.state.pc, 0x0300);
    }

    #[test]
    fn test_call_then_return_resumes_after_the_call() {
        let mut machine = Machine::with_seed(0);
        // 0x200: call 0x400
        machine.load(&[0x24, 0x00]).unwrap();
        // 0x400: return
        machine.state.memory[0x400..0x402].copy_from_slice(&[0x00, 0xEE]);
        machine.step();
        assert_eq!(machine.state.pc, 0x0400);
        machine.step();
        assert_eq!(machine.state.pc, 0x0202);
    }

    #[test]
    fn test_unknown_opcode_is_a_noop_not_a_halt() {
        let mut machine = Machine::with_seed(0);
        machine.load(&[0xF1, 0xFF, 0x00, 0xE0]).unwrap();
        machine.step();
        assert_eq!(machine.state.pc, 0x0202);
        machine.step();
        assert_eq!(machine.state.pc, 0x0204);
    }

    #[test]
    fn test_wait_key_pins_the_pc_until_a_key_arrives() {
        let mut machine = Machine::with_seed(0);
        machine.load(&[0xF1, 0x0A]).unwrap();
        machine.step();
        machine.step();
        assert_eq!(machine.state.pc, 0x0200);

        machine.key_press(0xE);
        machine.step();
        assert_eq!(machine.state.pc, 0x0202);
        assert_eq!(machine.state.v[0x1], 0xE);
    }

    #[test]
    fn test_key_release_clears_the_key() {
        let mut machine = Machine::with_seed(0);
        machine.key_press(0x3);
        machine.key_release(0x3);
        machine.load(&[0xF1, 0x0A]).unwrap();
        machine.step();
        assert_eq!(machine.state.pc, 0x0200);
    }

    #[test]
    fn test_tick_timers_decrements_toward_zero() {
        let mut machine = Machine::with_seed(0);
        machine.state.delay_timer = 5;
        machine.state.sound_timer = 0;
        machine.tick_timers();
        assert_eq!(machine.delay_timer(), 4);
        // zero stays zero, never wraps
        assert_eq!(machine.sound_timer(), 0);
    }

    /// The reference interpreter decremented timers inside the instruction
    /// cycle on top of the driver's 60Hz tick; here instruction stepping and
    /// timer decay are fully decoupled.
    #[test]
    fn test_step_does_not_touch_the_timers() {
        let mut machine = Machine::with_seed(0);
        machine.load(&[0x00, 0xE0]).unwrap();
        machine.state.delay_timer = 5;
        machine.state.sound_timer = 3;
        machine.step();
        assert_eq!(machine.delay_timer(), 5);
        assert_eq!(machine.sound_timer(), 3);
    }

    #[test]
    fn test_random_stream_is_reproducible_per_seed() {
        let run = |seed| {
            let mut machine = Machine::with_seed(seed);
            machine.load(&[0xC1, 0xFF]).unwrap();
            machine.step();
            machine.state.v[0x1]
        };
        assert_eq!(run(7), run(7));
    }

    #[test]
    fn test_quirks_default_to_the_reference_profile() {
        let machine = Machine::with_seed(0);
        assert_eq!(machine.quirks(), Quirks::REFERENCE);
    }

    #[test]
    fn test_set_quirks_changes_shift_behavior() {
        let mut machine = Machine::with_seed(0);
        machine.set_quirks(Quirks::MODERN);
        // 8126: shift V1 right; modern mode shifts Vx in place
        machine.load(&[0x81, 0x26]).unwrap();
        machine.state.v[0x1] = 0x04;
        machine.state.v[0x2] = 0xFF;
        machine.step();
        assert_eq!(machine.state.v[0x1], 0x02);
    }

    #[test]
    fn test_frame_buffer_is_observable_after_a_draw() {
        let mut machine = Machine::with_seed(0);
        // point I at the glyph for 0, then draw it at (0, 0)
        machine.load(&[0xA0, 0x50, 0xD0, 0x05]).unwrap();
        machine.step();
        machine.step();
        assert!(machine.frame_buffer()[0][0]);
    }
}
