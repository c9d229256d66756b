//! A CHIP-8 virtual machine core.
//!
//! The crate owns the machine state and instruction semantics and nothing
//! else: the embedding driver loads a program image, pushes key states in,
//! calls [`Machine::step`] at its chosen instruction rate and
//! [`Machine::tick_timers`] at 60Hz, and samples the frame buffer and
//! timers for presentation. Windowing, audio, and file I/O live with the
//! driver.

pub use machine::{LoadError, Machine};
pub use quirks::Quirks;

pub mod constants;
mod instruction;
mod machine;
mod opcode;
mod operations;
mod quirks;
pub mod state;
