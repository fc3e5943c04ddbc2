//! Virtual machine.
use std::{
    fmt::{self, Write},
    fs,
    path::Path,
};

use log::{debug, warn};
use rand::prelude::*;

use crate::{
    constants::*,
    cpu::Chip8Cpu,
    devices::{Devices, KeyCode},
    display::{DisplayBuffer, SpriteEdge},
    error::{Chip8Error, Chip8Result, Fault},
    op::{decode, op_word, Op},
};

pub struct Chip8Vm {
    cpu: Chip8Cpu,
    /// Seeded once when the VM is created.
    rng: StdRng,
    /// A program was loaded successfully and the VM may be stepped.
    loaded: bool,
    conf: Chip8Conf,
}

/// Behaviour of `Fx0A` (`LD Vx, K`) when no key is pressed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum KeyWaitMode {
    /// Hold the program counter on the instruction until a key is pressed.
    #[default]
    Block,
    /// Scan the keyboard once and continue whether a key was found or not.
    Scan,
}

/// VM Configuration Parameters.
#[derive(Debug, Default, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Chip8Conf {
    pub key_wait: KeyWaitMode,
    pub sprite_edge: SpriteEdge,
    /// Fixed seed for the `RND` instruction. Seeded from the
    /// operating system when absent.
    pub rng_seed: Option<u64>,
    /// Interrupt the VM on the first instruction fault.
    pub halt_on_fault: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Ok,
    /// Program counter has jumped to a new address.
    ///
    /// This is useful for the caller to avoid being
    /// blocked on infinite or long running loops.
    ///
    /// This is returned when the interpreter encounters:
    ///
    /// - 1nnn (`JP addr`)
    /// - 2nnn (`CALL addr`)
    /// - 00EE (`RET`)
    /// - Bnnn (`JP V0, addr`)
    Jump,
    /// The display buffer was cleared or drawn to.
    Draw,
    /// Wait for a keypress.
    ///
    /// This is triggered by the opcode `Fx0A` (`LD Vx, K`), which stops
    /// execution until a key is pressed, and loads the key value into `Vx`.
    KeyWait,
}

/// Outcome of a single interpreter step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub flow: Flow,
    /// The sound timer expired on this step.
    pub beep: bool,
    /// The instruction faulted and was skipped.
    pub fault: Option<Fault>,
}

/// How the program counter moves once an instruction has executed.
enum Pc {
    /// Advance to the next instruction.
    Next,
    /// Skip over the next instruction.
    Skip,
    /// The instruction set the program counter itself.
    Hold,
}

impl Chip8Vm {
    pub fn new(conf: Chip8Conf) -> Self {
        let rng = match conf.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Chip8Vm {
            cpu: Chip8Cpu::new(),
            rng,
            loaded: false,
            conf,
        }
    }

    /// Load a program into memory at `0x200` and reset the machine.
    ///
    /// On failure the VM is left unloaded and refuses to step.
    pub fn load_bytecode(&mut self, bytecode: &[u8]) -> Chip8Result<()> {
        // Start with clean memory to avoid leaking previous program.
        self.cpu.reset();
        self.loaded = false;

        if bytecode.len() > MAX_PROGRAM_SIZE {
            return Err(Chip8Error::LargeProgram(bytecode.len()));
        }

        self.cpu.ram[MEM_START..MEM_START + bytecode.len()].copy_from_slice(bytecode);
        self.loaded = true;

        debug!("loaded program of {} bytes", bytecode.len());

        Ok(())
    }

    /// Read a ROM file and load it.
    pub fn load_rom(&mut self, filepath: impl AsRef<Path>) -> Chip8Result<()> {
        let filepath = filepath.as_ref();
        debug!("loading rom {}", filepath.display());

        match fs::read(filepath) {
            Ok(bytecode) => self.load_bytecode(&bytecode),
            Err(err) => {
                self.cpu.reset();
                self.loaded = false;
                Err(err.into())
            }
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }
}

/// Host interface
impl Chip8Vm {
    /// Sets the keyboard key input state.
    pub fn set_key(&mut self, key: KeyCode, pressed: bool) {
        self.cpu.keys.set(key, pressed);
    }

    /// Clear the keyboard input state, setting all keys to up.
    pub fn clear_keys(&mut self) {
        self.cpu.keys.clear()
    }

    /// Stop the machine. Subsequent steps return [`Chip8Error::Halted`].
    pub fn interrupt(&mut self) {
        self.cpu.trap = true;
    }

    pub fn is_halted(&self) -> bool {
        self.cpu.trap
    }

    /// Whether the machine is stalled on `Fx0A` waiting for a key.
    pub fn is_key_waiting(&self) -> bool {
        self.cpu.key_wait
    }

    pub fn display(&self) -> &DisplayBuffer {
        &self.cpu.display
    }

    pub fn is_display_dirty(&self) -> bool {
        self.cpu.display.is_dirty()
    }

    /// Hand the display to a renderer, and mark it as consumed.
    pub fn take_display(&mut self) -> &DisplayBuffer {
        self.cpu.display.clear_dirty();
        &self.cpu.display
    }

    pub fn pc(&self) -> usize {
        self.cpu.pc
    }

    pub fn sp(&self) -> usize {
        self.cpu.sp
    }

    /// Value of register `Vx`.
    ///
    /// Only the low nibble of `vx` selects the register, the same
    /// as an opcode operand, so `0x10` reads `V0`.
    pub fn register(&self, vx: u8) -> u8 {
        self.cpu.v(vx)
    }

    /// Address register `I`.
    pub fn index(&self) -> Address {
        self.cpu.address
    }

    pub fn delay_timer(&self) -> u8 {
        self.cpu.timers.delay()
    }

    pub fn sound_timer(&self) -> u8 {
        self.cpu.timers.sound()
    }

    pub fn read_memory(&self, address: usize) -> Option<u8> {
        self.cpu.ram.get(address).copied()
    }

    /// One full host cycle: poll input, step, present the display if it
    /// changed, and sound the buzzer if the timer expired.
    pub fn cycle(&mut self, devices: &mut impl Devices) -> Chip8Result<Step> {
        devices.poll_keys(&mut self.cpu.keys);

        let step = self.step()?;

        if self.cpu.display.is_dirty() {
            devices.draw(&self.cpu.display);
            self.cpu.display.clear_dirty();
        }

        if step.beep {
            devices.beep();
        }

        Ok(step)
    }

    /// Execute up to `step_count` steps, stopping early when the machine halts.
    ///
    /// Returns the number of steps executed.
    pub fn run_steps(&mut self, step_count: usize) -> Chip8Result<usize> {
        for i in 0..step_count {
            if self.cpu.trap {
                return Ok(i);
            }
            self.step()?;
        }

        Ok(step_count)
    }
}

/// Interpreter
impl Chip8Vm {
    /// Fetch, decode and execute one instruction, then count down the timers.
    pub fn step(&mut self) -> Chip8Result<Step> {
        if !self.loaded {
            return Err(Chip8Error::NotLoaded);
        }
        if self.cpu.trap {
            return Err(Chip8Error::Halted);
        }

        let word = op_word(self.cpu.instr());
        let op = decode(word);

        op_trace(self.cpu.pc, word, &op);

        let (flow, pc, fault) = match self.exec(op) {
            Ok((flow, pc)) => (flow, pc, None),
            Err(fault) => {
                warn!("{:04X}: {fault}, executed as no-op", self.cpu.pc);
                (Flow::Ok, Pc::Next, Some(fault))
            }
        };

        // Timers count down after the instruction, before the program
        // counter moves on.
        let beep = self.cpu.timers.tick();

        match pc {
            Pc::Next => self.cpu.pc = (self.cpu.pc + 2) & 0xFFF,
            Pc::Skip => self.cpu.pc = (self.cpu.pc + 4) & 0xFFF,
            Pc::Hold => {}
        }

        if fault.is_some() && self.conf.halt_on_fault {
            self.interrupt();
        }

        Ok(Step { flow, beep, fault })
    }

    fn exec(&mut self, op: Op) -> Result<(Flow, Pc), Fault> {
        let cpu = &mut self.cpu;

        match op {
            // 0nnn (SYS addr)
            //
            // Machine code routines only existed on the original hardware.
            Op::Sys { address } => Err(Fault::Unsupported(address)),
            // 00E0 (CLS)
            Op::ClearScreen => {
                cpu.display.clear();
                Ok((Flow::Draw, Pc::Next))
            }
            // 00EE (RET)
            //
            // The stack holds the address of the CALL instruction,
            // so the regular advance moves past it.
            Op::Return => {
                cpu.pc = cpu.pop()? as usize;
                Ok((Flow::Jump, Pc::Next))
            }
            // 1nnn (JP addr)
            Op::Jump { address } => {
                cpu.pc = address as usize;
                Ok((Flow::Jump, Pc::Hold))
            }
            // 2nnn (CALL addr)
            //
            // Push the address of this instruction, then jump.
            Op::Call { address } => {
                cpu.push(cpu.pc as Address)?;
                cpu.pc = address as usize;
                Ok((Flow::Jump, Pc::Hold))
            }
            // 3xnn (SE Vx, byte)
            Op::Skip_Eq_Byte { vx, nn } => Ok(skip_if(cpu.v(vx) == nn)),
            // 4xnn (SNE Vx, byte)
            Op::Skip_NotEq_Byte { vx, nn } => Ok(skip_if(cpu.v(vx) != nn)),
            // 5xy0 (SE Vx, Vy)
            Op::Skip_Eq { vx, vy } => Ok(skip_if(cpu.v(vx) == cpu.v(vy))),
            // 6xnn (LD Vx, byte)
            Op::Load_Byte { vx, nn } => {
                cpu.set_v(vx, nn);
                Ok((Flow::Ok, Pc::Next))
            }
            // 7xnn (ADD Vx, byte)
            //
            // Carry flag is not set.
            Op::Add_Byte { vx, nn } => {
                cpu.set_v(vx, cpu.v(vx).wrapping_add(nn));
                Ok((Flow::Ok, Pc::Next))
            }
            // 9xy0 (SNE Vx, Vy)
            Op::Skip_NotEq { vx, vy } => Ok(skip_if(cpu.v(vx) != cpu.v(vy))),
            // Annn (LD I, addr)
            Op::Load_Address { address } => {
                cpu.address = address & ADDRESS_MASK;
                Ok((Flow::Ok, Pc::Next))
            }
            // Bnnn (JP V0, addr)
            Op::Jump_V0 { address } => {
                cpu.pc = (cpu.v(0) as usize + address as usize) & ADDRESS_MASK as usize;
                Ok((Flow::Jump, Pc::Hold))
            }
            // Cxnn (RND Vx, byte)
            //
            // Set register VX to the result of bitwise AND between a random number and NN.
            Op::Random { vx, nn } => {
                let value = self.rng.gen::<u8>() & nn;
                self.cpu.set_v(vx, value);
                Ok((Flow::Ok, Pc::Next))
            }
            Op::Draw { vx, vy, n } => self.exec_draw(vx, vy, n),
            Op::Skip_Pressed { vx } => {
                let key = key_code(cpu.v(vx))?;
                Ok(skip_if(cpu.keys.is_pressed(key)))
            }
            Op::Skip_NotPressed { vx } => {
                let key = key_code(cpu.v(vx))?;
                Ok(skip_if(!cpu.keys.is_pressed(key)))
            }
            Op::Unknown(word) => Err(Fault::UnknownOpcode(word)),
            Op::Load_Vx_Vy { .. }
            | Op::Or_Vx_Vy { .. }
            | Op::And_Vx_Vy { .. }
            | Op::Xor_Vx_Vy { .. }
            | Op::Add_Vx_Vy { .. }
            | Op::Sub_Vx_Vy { .. }
            | Op::ShiftRight { .. }
            | Op::SubReverse_Vx_Vy { .. }
            | Op::ShiftLeft { .. } => {
                self.exec_math(op);
                Ok((Flow::Ok, Pc::Next))
            }
            Op::Load_Vx_Delay { .. }
            | Op::Load_Vx_Key { .. }
            | Op::Load_Delay_Vx { .. }
            | Op::Load_Sound_Vx { .. }
            | Op::Add_Address_Vx { .. }
            | Op::Load_Font { .. }
            | Op::Store_Bcd { .. }
            | Op::Store_Registers { .. }
            | Op::Load_Registers { .. } => self.exec_misc(op),
        }
    }

    /// Execute an arithmetic instruction.
    ///
    /// The flag register is written before the result, so
    /// when `Vx` is `VF` the result takes precedence.
    #[inline]
    fn exec_math(&mut self, op: Op) {
        let cpu = &mut self.cpu;

        match op {
            // 8xy0 (LD Vx, Vy)
            Op::Load_Vx_Vy { vx, vy } => cpu.set_v(vx, cpu.v(vy)),
            // 8xy1 (OR Vx, Vy)
            Op::Or_Vx_Vy { vx, vy } => cpu.set_v(vx, cpu.v(vx) | cpu.v(vy)),
            // 8xy2 (AND Vx, Vy)
            Op::And_Vx_Vy { vx, vy } => cpu.set_v(vx, cpu.v(vx) & cpu.v(vy)),
            // 8xy3 (XOR Vx, Vy)
            Op::Xor_Vx_Vy { vx, vy } => cpu.set_v(vx, cpu.v(vx) ^ cpu.v(vy)),
            // 8xy4 (ADD Vx, Vy)
            //
            // If overflow, set VF to 1, else 0.
            Op::Add_Vx_Vy { vx, vy } => {
                let (result, carry) = cpu.v(vx).overflowing_add(cpu.v(vy));
                cpu.set_flag(carry);
                cpu.set_v(vx, result);
            }
            // 8xy5 (SUB Vx, Vy)
            //
            // VF is set to 0 when there is a borrow, set to 1 when there isn't.
            Op::Sub_Vx_Vy { vx, vy } => {
                let (result, borrow) = cpu.v(vx).overflowing_sub(cpu.v(vy));
                cpu.set_flag(!borrow);
                cpu.set_v(vx, result);
            }
            // 8xy6 (SHR Vx)
            Op::ShiftRight { vx } => {
                let x = cpu.v(vx);
                cpu.set_flag(x & 1 == 1);
                cpu.set_v(vx, x >> 1);
            }
            // 8xy7 (SUBN Vx, Vy)
            //
            // Subtracts VX from VY, and stores the result in VX.
            Op::SubReverse_Vx_Vy { vx, vy } => {
                let (result, borrow) = cpu.v(vy).overflowing_sub(cpu.v(vx));
                cpu.set_flag(!borrow);
                cpu.set_v(vx, result);
            }
            // 8xyE (SHL Vx)
            Op::ShiftLeft { vx } => {
                let x = cpu.v(vx);
                cpu.set_flag(x >> 7 == 1);
                cpu.set_v(vx, x << 1);
            }
            _ => unreachable!("not an arithmetic instruction: {op:?}"),
        }
    }

    /// Dxyn (DRW Vx, Vy, nibble)
    ///
    /// Draw sprite to the display buffer, at coordinate as per registers Vx and Vy.
    /// Sprite is encoded as 8 pixels wide, N pixels high, stored in bits located in
    /// memory pointed to by address register I.
    ///
    /// If the drawing operation erases existing pixels in the display buffer, register VF is set to
    /// 1, and set to 0 if no display bits are unset. This is used for collision detection.
    fn exec_draw(&mut self, vx: u8, vy: u8, n: u8) -> Result<(Flow, Pc), Fault> {
        let cpu = &mut self.cpu;
        let (x, y) = (cpu.v(vx) as usize, cpu.v(vy) as usize);

        let mut sprite = [0; 0x10];
        let height = n as usize;
        sprite[..height].copy_from_slice(cpu.mem(cpu.address as usize, height)?);

        let is_erased = cpu
            .display
            .draw_sprite(x, y, &sprite[..height], self.conf.sprite_edge);

        cpu.set_flag(is_erased);
        Ok((Flow::Draw, Pc::Next))
    }

    /// Execute a miscellaneous `Fxnn` instruction.
    fn exec_misc(&mut self, op: Op) -> Result<(Flow, Pc), Fault> {
        let cpu = &mut self.cpu;

        match op {
            // Fx07 (LD Vx, DT)
            Op::Load_Vx_Delay { vx } => cpu.set_v(vx, cpu.timers.delay),
            // Fx0A (LD Vx, K)
            //
            // Wait for a key press, store the value of the key in Vx.
            Op::Load_Vx_Key { vx } => match cpu.keys.last_pressed() {
                Some(key) => {
                    cpu.set_v(vx, key.as_u8());
                    cpu.key_wait = false;
                }
                None if self.conf.key_wait == KeyWaitMode::Block => {
                    // Hold the program counter to stall the machine.
                    cpu.key_wait = true;
                    return Ok((Flow::KeyWait, Pc::Hold));
                }
                None => {}
            },
            // Fx15 (LD DT, Vx)
            Op::Load_Delay_Vx { vx } => cpu.timers.delay = cpu.v(vx),
            // Fx18 (LD ST, Vx)
            Op::Load_Sound_Vx { vx } => cpu.timers.sound = cpu.v(vx),
            // Fx1E (ADD I, Vx)
            //
            // VF is set when the sum leaves the address space.
            Op::Add_Address_Vx { vx } => {
                let sum = cpu.address + cpu.v(vx) as u16;
                cpu.set_flag(sum > ADDRESS_MASK);
                cpu.address = sum & ADDRESS_MASK;
            }
            // Fx29 (LD F, Vx)
            //
            // Set I = location of sprite for digit Vx.
            Op::Load_Font { vx } => {
                cpu.address = FONTSET_START + cpu.v(vx) as u16 * FONTSET_HEIGHT as u16;
            }
            // Fx33 (LD B, Vx)
            //
            // Store the binary-coded decimal representation of Vx
            // in the memory locations I, I+1, and I+2.
            #[rustfmt::skip]
            Op::Store_Bcd { vx } => {
                let x = cpu.v(vx);
                let bcd = cpu.mem_mut(cpu.address as usize, 3)?;
                bcd[0] = x / 100;
                bcd[1] = x / 10  % 10;
                bcd[2] = x       % 10;
            }
            // Fx55 (LD [I], Vx)
            //
            // Store registers V0 through Vx in memory starting at location I.
            Op::Store_Registers { vx } => {
                let count = vx as usize + 1;
                let registers = cpu.registers;
                cpu.mem_mut(cpu.address as usize, count)?
                    .copy_from_slice(&registers[..count]);
                cpu.address = (cpu.address + count as u16) & ADDRESS_MASK;
            }
            // Fx65 (LD Vx, [I])
            //
            // Read registers V0 through Vx from memory starting at location I.
            Op::Load_Registers { vx } => {
                let count = vx as usize + 1;
                let mut values = [0; REGISTER_COUNT];
                values[..count].copy_from_slice(cpu.mem(cpu.address as usize, count)?);
                cpu.registers[..count].copy_from_slice(&values[..count]);
                cpu.address = (cpu.address + count as u16) & ADDRESS_MASK;
            }
            _ => unreachable!("not a miscellaneous instruction: {op:?}"),
        }

        Ok((Flow::Ok, Pc::Next))
    }
}

#[inline(always)]
fn skip_if(condition: bool) -> (Flow, Pc) {
    if condition {
        (Flow::Ok, Pc::Skip)
    } else {
        (Flow::Ok, Pc::Next)
    }
}

#[inline]
fn key_code(value: u8) -> Result<KeyCode, Fault> {
    KeyCode::try_from(value).map_err(|_| Fault::InvalidKey(value))
}

/// Troubleshooting
impl Chip8Vm {
    /// Returns the contents of the memory as a human readable string.
    pub fn dump_ram(&self, count: usize) -> Result<String, fmt::Error> {
        let iter = self
            .cpu
            .ram
            .iter()
            .enumerate()
            .skip(MEM_START)
            .take(count)
            .step_by(2);
        let mut buf = String::new();

        for (i, op) in iter {
            let next = self.cpu.ram.get(i + 1).copied().unwrap_or_default();
            writeln!(buf, "{:04X}: {:02X}{:02X}", i, op, next)?;
        }

        Ok(buf)
    }

    pub fn dump_display(&self) -> Result<String, fmt::Error> {
        let mut buf = String::new();

        for y in 0..DISPLAY_HEIGHT {
            for x in 0..DISPLAY_WIDTH {
                if self.cpu.display.get(x, y) {
                    write!(buf, "#")?;
                } else {
                    write!(buf, ".")?;
                }
            }
            writeln!(buf)?;
        }

        Ok(buf)
    }

    pub fn dump_keys(&self) -> Result<String, fmt::Error> {
        let mut buf = String::new();

        if self.cpu.keys.any() {
            write!(buf, "keys:")?;
            for key in self.cpu.keys.iter_pressed() {
                write!(buf, " {key}")?;
            }
        }

        Ok(buf)
    }

    pub fn dump_registers(&self) -> Result<String, fmt::Error> {
        let mut buf = String::new();

        for (i, v) in self.cpu.registers.iter().enumerate() {
            write!(buf, "v{i:X}={v:02X} ")?;
        }
        write!(
            buf,
            "I={:03X} PC={:03X} SP={} DT={} ST={}",
            self.cpu.address,
            self.cpu.pc,
            self.cpu.sp,
            self.cpu.timers.delay,
            self.cpu.timers.sound
        )?;

        Ok(buf)
    }
}

#[cfg(feature = "op_trace")]
#[inline]
fn op_trace(pc: usize, word: u16, op: &Op) {
    log::trace!("{pc:04X}: {word:04X} {op}");
}

#[cfg(not(feature = "op_trace"))]
#[inline]
fn op_trace(_: usize, _: u16, _: &Op) {}
