//! A CHIP-8 virtual machine.
//!
//! [`emu::Chip8`] holds the machine state and executes one instruction per
//! [`emu::Chip8::cpu_cycle`]. [`emu::Chip8Runner`] drives it in real time on its
//! own thread, exposing the display through [`emu::ScreenHandle`] and the keypad
//! through [`emu::KeypadHandle`].

pub mod emu;
mod nibble;

pub use nibble::u4;
