/// Total addressable memory in bytes
pub const MEMORY_SIZE: usize = 4096;

/// Valid addresses are 12 bits; computed addresses wrap at this boundary
pub const ADDRESS_MASK: u16 = 0x0FFF;

/// Where program images are loaded and where the program counter starts
pub const PROGRAM_START: u16 = 0x200;

/// The largest program image that fits between the load offset and the end of memory
pub const MAX_PROGRAM_SIZE: usize = MEMORY_SIZE - PROGRAM_START as usize;

/// Where the builtin font lives in memory
pub const FONT_START: u16 = 0x050;

/// Bytes per font glyph; glyphs are 8x5 bitmaps with the low nibble unused
pub const GLYPH_SIZE: u16 = 5;

/// Return-address slots in the call stack
pub const STACK_DEPTH: usize = 16;

/// Display width in pixels
pub const DISPLAY_WIDTH: usize = 64;

/// Display height in pixels
pub const DISPLAY_HEIGHT: usize = 32;

/// One glyph per hex digit 0..F, 5 bytes each
pub const FONT_SET: [u8; 80] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];
