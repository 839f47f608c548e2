use super::{Chip8Error, FONT, FONT_END_ADDRESS, FONT_START_ADDRESS};

// The constants are specified by the CHIP-8 specification
pub const MEMORY_SIZE: usize = 4096;
pub const PROGRAM_START_ADDRESS: usize = 0x200;
pub const MAX_PROGRAM_SIZE: usize = MEMORY_SIZE - PROGRAM_START_ADDRESS;

/// 4KB flat byte store. Every access is bounds checked; nothing wraps.
#[derive(Debug)]
pub struct Memory {
    bytes: [u8; MEMORY_SIZE],
}

impl Memory {
    /// Zero-filled memory with the digit font copied into place.
    pub fn new() -> Self {
        let mut bytes = [0; MEMORY_SIZE];
        bytes[FONT_START_ADDRESS..FONT_END_ADDRESS].copy_from_slice(&FONT);
        Self { bytes }
    }

    /// Copies a program to 0x200.
    ///
    /// The size is checked before anything is written, so a rejected program
    /// leaves memory exactly as it was.
    pub fn load_program(&mut self, program: &[u8]) -> Result<(), Chip8Error> {
        if program.len() > MAX_PROGRAM_SIZE {
            return Err(Chip8Error::ProgramTooLarge {
                size: program.len(),
                max_size: MAX_PROGRAM_SIZE,
            });
        }

        let end = PROGRAM_START_ADDRESS + program.len();
        self.bytes[PROGRAM_START_ADDRESS..end].copy_from_slice(program);
        Ok(())
    }

    pub fn read(&self, addr: u16) -> Result<u8, Chip8Error> {
        self.bytes
            .get(addr as usize)
            .copied()
            .ok_or(Chip8Error::MemoryOutOfBounds { address: addr })
    }

    /// Reads the big-endian instruction word at `addr`.
    pub fn read_word(&self, addr: u16) -> Result<u16, Chip8Error> {
        let high = self.read(addr)?;
        let low = self.read(addr.wrapping_add(1))?;
        Ok(u16::from_be_bytes([high, low]))
    }

    /// Borrows `len` bytes starting at `addr`. Fails on the first address past
    /// the end of memory.
    pub fn slice(&self, addr: u16, len: usize) -> Result<&[u8], Chip8Error> {
        let start = addr as usize;
        let end = start + len;
        self.bytes
            .get(start..end)
            .ok_or(Chip8Error::MemoryOutOfBounds {
                address: start.max(MEMORY_SIZE) as u16,
            })
    }

    /// Copies `data` to `addr`. The whole range is checked first, so a
    /// rejected write leaves memory untouched.
    pub fn write_slice(&mut self, addr: u16, data: &[u8]) -> Result<(), Chip8Error> {
        let start = addr as usize;
        let end = start + data.len();
        self.bytes
            .get_mut(start..end)
            .ok_or(Chip8Error::MemoryOutOfBounds {
                address: start.max(MEMORY_SIZE) as u16,
            })?
            .copy_from_slice(data);
        Ok(())
    }

    pub fn as_bytes(&self) -> &[u8; MEMORY_SIZE] {
        &self.bytes
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}
