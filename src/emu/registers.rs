use std::fmt;

use super::PROGRAM_START_ADDRESS;

/// CPU register file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registers {
    /// General-purpose registers V0-VF (VF is used as a flag register)
    pub v: [u8; 16],
    /// Index register: used for memory operations
    pub i: u16,
    /// Program counter: address of the next instruction to execute
    pub pc: u16,
    /// Delay timer: decrements at 60Hz until it reaches 0
    pub delay_timer: u8,
    /// Sound timer: decrements at 60Hz until it reaches 0
    pub sound_timer: u8,
}

impl Registers {
    pub fn new() -> Self {
        Self {
            v: [0; 16],
            i: 0,
            pc: PROGRAM_START_ADDRESS as u16,
            delay_timer: 0,
            sound_timer: 0,
        }
    }

    pub fn set_flag(&mut self, flag: bool) {
        self.v[0xF] = flag as u8;
    }

    /// One 60Hz tick of both timers.
    pub fn decrement_timers(&mut self) {
        self.delay_timer = self.delay_timer.saturating_sub(1);
        self.sound_timer = self.sound_timer.saturating_sub(1);
    }
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Registers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, value) in self.v.iter().enumerate() {
            write!(f, "V{idx:X}={value:02X} ")?;
        }
        write!(
            f,
            "I={:03X} PC={:03X} DT={:02X} ST={:02X}",
            self.i, self.pc, self.delay_timer, self.sound_timer
        )
    }
}
