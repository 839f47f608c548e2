use super::{
    Chip8, Chip8Error, Chip8Result, FONT_GLYPH_SIZE, FONT_START_ADDRESS, Opcode, OpcodeALU,
};
use crate::u4;
use rand::Rng;

impl Chip8 {
    pub(crate) fn execute(&mut self, opcode: Opcode) -> Result<Chip8Result, Chip8Error> {
        // Address of the instruction being executed.
        let address = self.registers.pc;
        self.registers.pc = address.wrapping_add(2);

        match opcode {
            Opcode::ClearDisplay => {
                self.screen.clear();
                return Ok(Chip8Result::DisplayUpdated);
            }
            Opcode::Jump { nnn } => {
                self.registers.pc = nnn;
            }
            Opcode::JumpWithOffset { nnn } => {
                self.registers.pc = nnn.wrapping_add(self.registers.v[0].into());
            }
            Opcode::Call { nnn } => {
                // The call site itself goes on the stack; RET steps past it.
                self.stack
                    .push(address)
                    .ok_or(Chip8Error::StackOverflow { address })?;
                self.registers.pc = nnn;
            }
            Opcode::Return => {
                let call_site = self
                    .stack
                    .pop()
                    .ok_or(Chip8Error::StackUnderflow { address })?;
                self.registers.pc = call_site.wrapping_add(2);
            }
            Opcode::SkipRegEqualImm { x, nn } => {
                self.skip_if(self.registers.v[x] == nn);
            }
            Opcode::SkipRegNotEqualImm { x, nn } => {
                self.skip_if(self.registers.v[x] != nn);
            }
            Opcode::SkipRegEqualReg { x, y } => {
                self.skip_if(self.registers.v[x] == self.registers.v[y]);
            }
            Opcode::SkipRegNotEqualReg { x, y } => {
                self.skip_if(self.registers.v[x] != self.registers.v[y]);
            }
            Opcode::SetRegImm { x, nn } => {
                self.registers.v[x] = nn;
            }
            Opcode::AddRegImm { x, nn } => {
                self.registers.v[x] = self.registers.v[x].wrapping_add(nn);
            }
            Opcode::ALU { x, y, op } => {
                self.execute_alu(x, y, op);
            }
            Opcode::Random { x, nn } => {
                let rand_byte: u8 = self.rng.random();
                self.registers.v[x] = rand_byte & nn;
            }
            Opcode::SetIndexImm { nnn } => {
                self.registers.i = nnn;
            }
            Opcode::AddIndexReg { x } => {
                self.registers.i = self.registers.i.wrapping_add(self.registers.v[x].into());
            }
            Opcode::Draw { x, y, n } => {
                return self.execute_draw(x, y, n);
            }
            Opcode::SkipIfPressed { x } => {
                let key = u4::low(self.registers.v[x]);
                self.skip_if(self.keypad.is_pressed(key));
            }
            Opcode::SkipIfNotPressed { x } => {
                let key = u4::low(self.registers.v[x]);
                self.skip_if(!self.keypad.is_pressed(key));
            }
            Opcode::WaitForKey { x } => {
                return Ok(self.execute_wait_for_key(x, address));
            }
            Opcode::ReadDelayTimer { x } => {
                self.registers.v[x] = self.registers.delay_timer;
            }
            Opcode::SetDelayTimer { x } => {
                self.registers.delay_timer = self.registers.v[x];
            }
            Opcode::SetSoundTimer { x } => {
                self.registers.sound_timer = self.registers.v[x];
            }
            Opcode::FontChar { x } => {
                let digit = self.registers.v[x] as u16;
                self.registers.i = FONT_START_ADDRESS as u16 + digit * FONT_GLYPH_SIZE as u16;
            }
            Opcode::BCD { x } => {
                let value = self.registers.v[x];
                let digits = [value / 100, (value / 10) % 10, value % 10];
                self.memory.write_slice(self.registers.i, &digits)?;
            }
            Opcode::StoreRegs { x } => {
                let count = usize::from(x) + 1;
                self.memory
                    .write_slice(self.registers.i, &self.registers.v[..count])?;
            }
            Opcode::LoadRegs { x } => {
                let count = usize::from(x) + 1;
                let bytes = self.memory.slice(self.registers.i, count)?;
                self.registers.v[..count].copy_from_slice(bytes);
            }
            Opcode::Unknown(opcode) => {
                return Err(Chip8Error::UnknownOpcode { opcode, address });
            }
        };

        Ok(Chip8Result::Continue)
    }

    fn skip_if(&mut self, condition: bool) {
        if condition {
            self.registers.pc = self.registers.pc.wrapping_add(2);
        }
    }

    // The flag is always written before Vx, so with x == F the result wins.
    fn execute_alu(&mut self, x: u4, y: u4, op: OpcodeALU) {
        let vx = self.registers.v[x];
        let vy = self.registers.v[y];

        let (result, flag) = match op {
            OpcodeALU::Set => (vy, None),
            OpcodeALU::Or => (vx | vy, None),
            OpcodeALU::And => (vx & vy, None),
            OpcodeALU::Xor => (vx ^ vy, None),
            OpcodeALU::Add => {
                let sum = vx as u16 + vy as u16;
                (sum as u8, Some(sum > 0xFF))
            }
            OpcodeALU::Sub => (vx.wrapping_sub(vy), Some(vx >= vy)),
            OpcodeALU::SubReverse => (vy.wrapping_sub(vx), Some(vx < vy)),
            OpcodeALU::ShiftRight => (vx >> 1, Some(vx & 0x01 != 0)),
            OpcodeALU::ShiftLeft => (vx << 1, Some(vx & 0x80 != 0)),
        };

        if let Some(flag) = flag {
            self.registers.set_flag(flag);
        }
        self.registers.v[x] = result;
    }

    fn execute_draw(&mut self, x: u4, y: u4, n: u4) -> Result<Chip8Result, Chip8Error> {
        let x_pos = self.registers.v[x];
        let y_pos = self.registers.v[y];

        let rows = self.memory.slice(self.registers.i, usize::from(n))?;
        let any_erased = self.screen.draw_sprite(x_pos, y_pos, rows);
        self.registers.set_flag(any_erased);

        Ok(Chip8Result::DisplayUpdated)
    }

    fn execute_wait_for_key(&mut self, x: u4, address: u16) -> Chip8Result {
        if !self.waiting_for_key {
            // Only presses that happen after the instruction starts count.
            self.keypad.discard_presses();
            self.waiting_for_key = true;
            log::debug!("Waiting for key press at {address:03X}");
        }

        match self.keypad.take_press() {
            Some(key) => {
                self.registers.v[x] = key.into();
                self.waiting_for_key = false;
                log::debug!("Key {key} pressed, resuming");
                Chip8Result::Continue
            }
            None => {
                // Repeat this instruction until a key is pressed
                self.registers.pc = address;
                Chip8Result::WaitingForKey
            }
        }
    }
}
