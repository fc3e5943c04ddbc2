//! CPU and memory state.
use crate::{
    constants::*,
    devices::Keypad,
    display::DisplayBuffer,
    error::Fault,
    timer::Timers,
};

/// Core state for a chip8 interpreter.
pub struct Chip8Cpu {
    // ------------------------------------------------------------------------
    // Registers
    /// Program counter pointing to the current position in the bytecode.
    pub(crate) pc: usize,
    /// Stack pointer, the number of return addresses on the stack.
    pub(crate) sp: usize,
    /// General purpose registers for temporary values.
    ///
    /// Register 16 (VF) is used for either the carry flag or borrow switch depending on opcode.
    pub(crate) registers: [u8; REGISTER_COUNT],
    /// Pointer register used for temporarily storing an address. Since addresses are 12 bits, only the
    /// lowest (rightmost) bits are used.
    pub(crate) address: Address,
    /// Delay and sound timers.
    pub(crate) timers: Timers,
    /// Keyboard input state.
    pub(crate) keys: Keypad,
    /// Indicates that the machine is waiting for a keypress.
    pub(crate) key_wait: bool,

    // ------------------------------------------------------------------------
    // Memory
    /// Main memory storage space.
    pub(crate) ram: Box<[u8; MEM_SIZE]>,
    /// Stack of return pointers used for jumping when a routine call finishes.
    pub(crate) stack: [Address; STACK_SIZE],
    /// Screen buffer that is drawn to.
    pub(crate) display: DisplayBuffer,

    // ------------------------------------------------------------------------
    // Control
    /// Interrupt for VM loop.
    pub(crate) trap: bool,
}

impl Default for Chip8Cpu {
    fn default() -> Self {
        let mut cpu = Self {
            pc: MEM_START,
            sp: 0,
            registers: [0; REGISTER_COUNT],
            address: 0,
            timers: Timers::new(),
            keys: Keypad::new(),
            key_wait: false,

            ram: Box::new([0; MEM_SIZE]),
            stack: [0; STACK_SIZE],
            display: DisplayBuffer::new(),

            trap: false,
        };

        cpu.load_font();

        cpu
    }
}

impl Chip8Cpu {
    pub fn new() -> Self {
        Default::default()
    }

    /// Return every register, buffer and flag to its power-on state,
    /// with the builtin font in place.
    ///
    /// Keyboard state is owned by the host and survives the reset.
    pub(crate) fn reset(&mut self) {
        let keys = self.keys;
        *self = Self::default();
        self.keys = keys;
    }

    fn load_font(&mut self) {
        let start = FONTSET_START as usize;
        self.ram[start..start + FONTSET_DATA_LENGTH].copy_from_slice(&FONTSET);
    }

    /// Extract the instruction at the current program counter.
    #[inline(always)]
    pub fn instr(&self) -> [u8; 2] {
        [self.ram[self.pc & 0xFFF], self.ram[(self.pc + 1) & 0xFFF]]
    }

    /// Register VX. The index is a nibble taken from the opcode.
    #[inline(always)]
    pub(crate) fn v(&self, vx: u8) -> u8 {
        self.registers[vx as usize & 0xF]
    }

    #[inline(always)]
    pub(crate) fn set_v(&mut self, vx: u8, value: u8) {
        self.registers[vx as usize & 0xF] = value;
    }

    #[inline(always)]
    pub(crate) fn set_flag(&mut self, flag: bool) {
        self.registers[FLAG_REGISTER] = flag as u8;
    }

    /// Push a return address onto the call stack.
    pub(crate) fn push(&mut self, address: Address) -> Result<(), Fault> {
        let slot = self.stack.get_mut(self.sp).ok_or(Fault::StackOverflow)?;
        *slot = address;
        self.sp += 1;
        Ok(())
    }

    /// Pop the most recent return address off the call stack.
    pub(crate) fn pop(&mut self) -> Result<Address, Fault> {
        let sp = self.sp.checked_sub(1).ok_or(Fault::StackUnderflow)?;
        self.sp = sp;
        Ok(self.stack[sp])
    }

    /// Borrow `len` bytes of memory starting at `address`.
    pub(crate) fn mem(&self, address: usize, len: usize) -> Result<&[u8], Fault> {
        self.ram
            .get(address..address + len)
            .ok_or_else(|| Fault::memory(address + len - 1))
    }

    /// Mutably borrow `len` bytes of memory starting at `address`.
    pub(crate) fn mem_mut(&mut self, address: usize, len: usize) -> Result<&mut [u8], Fault> {
        self.ram
            .get_mut(address..address + len)
            .ok_or_else(|| Fault::memory(address + len - 1))
    }
}
