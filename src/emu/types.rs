use std::path::PathBuf;

/// Outcome of a single CPU cycle that completed without a fatal error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chip8Result {
    /// Continue executing instructions.
    Continue,
    /// The display buffer was modified (CLS or DRW) and should be republished.
    DisplayUpdated,
    /// The machine is blocked on Fx0A; PC has not moved.
    WaitingForKey,
}

/// Error types that can occur during CHIP-8 emulation.
///
/// Every variant except the load errors halts execution.
#[derive(Debug, thiserror::Error)]
pub enum Chip8Error {
    #[error("Program is too large ({size} bytes), max size is {max_size} bytes")]
    ProgramTooLarge { size: usize, max_size: usize },

    #[error("Failed to read program file {}", path.display())]
    ProgramRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Memory access out of bounds at address {address:#06X}")]
    MemoryOutOfBounds { address: u16 },

    #[error("Stack overflow: call at {address:#06X} exceeds the call stack depth")]
    StackOverflow { address: u16 },

    #[error("Stack underflow: return at {address:#06X} with empty call stack")]
    StackUnderflow { address: u16 },

    #[error("Unknown opcode {opcode:#06X} at address {address:#06X}")]
    UnknownOpcode { opcode: u16, address: u16 },
}

pub const DISPLAY_X: usize = 64;
pub const DISPLAY_Y: usize = 32;
/// A type alias for the CHIP-8 display buffer representation
pub type Display<T> = [[T; DISPLAY_X]; DISPLAY_Y];
