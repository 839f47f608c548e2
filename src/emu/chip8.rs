use std::fs::File;
use std::io::Read;
use std::path::Path;

use rand::{SeedableRng, rngs::StdRng};

use super::{
    CallStack, Chip8Error, Chip8Result, Instruction, Keypad, KeypadHandle, MAX_PROGRAM_SIZE,
    Memory, Opcode, Registers, Screen,
};

/// CHIP-8 virtual machine state
#[derive(Debug)]
pub struct Chip8 {
    /// 4KB memory array
    pub(crate) memory: Memory,
    /// V0-VF, I, PC and both timers
    pub(crate) registers: Registers,
    /// Call stack for subroutine returns
    pub(crate) stack: CallStack,
    /// Display buffer: 64x32 monochrome pixels
    pub(crate) screen: Screen,
    /// Keypad state and press notifications
    pub(crate) keypad: Keypad,

    /// Source for Cxnn
    pub(crate) rng: StdRng,
    /// Set while an Fx0A is blocked waiting for a press
    pub(crate) waiting_for_key: bool,
}

impl Chip8 {
    /// A machine whose random source is seeded from the OS.
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_os_rng())
    }

    /// A machine with a deterministic random source, for reproducible runs.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Chip8 {
            memory: Memory::new(),
            registers: Registers::new(),
            stack: CallStack::new(),
            screen: Screen::new(),
            keypad: Keypad::new(),
            rng,
            waiting_for_key: false,
        }
    }

    /// Loads a program into memory at 0x200.
    pub fn load(&mut self, program: &[u8]) -> Result<(), Chip8Error> {
        self.memory.load_program(program)?;
        log::info!("Loaded {} byte program", program.len());
        Ok(())
    }

    /// Executes a single CPU cycle (fetch, decode, execute).
    ///
    /// On a fatal error PC is left on the faulting instruction.
    pub fn cpu_cycle(&mut self) -> Result<Chip8Result, Chip8Error> {
        let address = self.registers.pc;
        let instruction = self.fetch()?;
        let opcode = Opcode::decode(instruction);

        if log::log_enabled!(log::Level::Trace) && !self.waiting_for_key {
            log::trace!(
                "{:03X}: {:04X} {:<16} | {}",
                self.registers.pc,
                instruction.0,
                opcode.to_string(),
                self.registers
            );
        }

        self.execute(opcode).inspect_err(|_| self.registers.pc = address)
    }

    /// Updates the delay and sound timers. Should be called at 60Hz.
    pub fn timers_cycle(&mut self) {
        self.registers.decrement_timers();
    }

    /// Returns true if the sound timer is greater than zero, indicating a beep should be played.
    pub fn should_beep(&self) -> bool {
        self.registers.sound_timer > 0
    }

    /// True while an Fx0A is suspended waiting for a key.
    pub fn is_waiting_for_key(&self) -> bool {
        self.waiting_for_key
    }

    /// A handle through which an input source can drive the keypad.
    pub fn keypad_handle(&self) -> KeypadHandle {
        self.keypad.handle()
    }

    pub fn keypad_mut(&mut self) -> &mut Keypad {
        &mut self.keypad
    }

    pub fn registers(&self) -> &Registers {
        &self.registers
    }

    pub fn registers_mut(&mut self) -> &mut Registers {
        &mut self.registers
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn stack(&self) -> &CallStack {
        &self.stack
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    /// Fetches the instruction word at PC.
    fn fetch(&self) -> Result<Instruction, Chip8Error> {
        self.memory.read_word(self.registers.pc).map(Instruction)
    }
}

impl Default for Chip8 {
    fn default() -> Self {
        Self::new()
    }
}

/// Reads a program image from disk.
///
/// Files larger than the program area are rejected from their metadata,
/// before any of the contents are read.
pub fn load_program_file(path: impl AsRef<Path>) -> Result<Vec<u8>, Chip8Error> {
    let path = path.as_ref();
    let read_err = |source| Chip8Error::ProgramRead {
        path: path.to_path_buf(),
        source,
    };

    let mut file = File::open(path).map_err(read_err)?;
    let size = file.metadata().map_err(read_err)?.len() as usize;
    if size > MAX_PROGRAM_SIZE {
        return Err(Chip8Error::ProgramTooLarge {
            size,
            max_size: MAX_PROGRAM_SIZE,
        });
    }

    let mut program = Vec::with_capacity(size);
    file.read_to_end(&mut program).map_err(read_err)?;
    Ok(program)
}
