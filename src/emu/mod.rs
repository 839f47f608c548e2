mod chip8;
mod decode;
mod execute;
mod font;
mod keypad;
mod memory;
mod opcode;
mod registers;
mod runner;
mod screen;
mod stack;
mod timer;
mod types;

pub use chip8::*;
pub use decode::*;
pub use font::*;
pub use keypad::*;
pub use memory::*;
pub use opcode::*;
pub use registers::*;
pub use runner::*;
pub use screen::*;
pub use stack::*;
pub use timer::*;
pub use types::*;
