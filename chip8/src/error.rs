//! Result and errors.
use std::fmt::{self, Display, Formatter};

use crate::constants::MAX_PROGRAM_SIZE;

pub type Chip8Result<T> = std::result::Result<T, Chip8Error>;

#[derive(Debug)]
pub enum Chip8Error {
    /// Attempt to load a bytecode program that can't fit in memory.
    LargeProgram(usize),
    /// The VM was stepped before a program was successfully loaded.
    NotLoaded,
    /// The VM was stepped after it was interrupted.
    Halted,
    Io(std::io::Error),
    Fmt(fmt::Error),
}

impl Display for Chip8Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::LargeProgram(size) => write!(
                f,
                "program too large for VM memory: {size} bytes, at most {MAX_PROGRAM_SIZE} allowed"
            ),
            Self::NotLoaded => write!(f, "no program loaded"),
            Self::Halted => write!(f, "machine is halted"),
            Self::Io(err) => write!(f, "{err}"),
            Self::Fmt(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for Chip8Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Fmt(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Chip8Error {
    fn from(err: std::io::Error) -> Self {
        Chip8Error::Io(err)
    }
}

impl From<fmt::Error> for Chip8Error {
    fn from(err: fmt::Error) -> Self {
        Chip8Error::Fmt(err)
    }
}

/// Recoverable fault raised while executing a single instruction.
///
/// The faulting instruction is executed as a no-op and the
/// machine continues with the next instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Instruction word with no defined operation.
    UnknownOpcode(u16),
    /// Defined, but not emulated (`0nnn SYS addr`).
    Unsupported(u16),
    /// `CALL` with all stack slots in use.
    StackOverflow,
    /// `RET` with an empty stack.
    StackUnderflow,
    /// Memory access past the end of RAM.
    MemoryOutOfRange { address: usize },
    /// Key query with a register value outside 0x0-0xF.
    InvalidKey(u8),
}

impl Display for Fault {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownOpcode(word) => write!(f, "unknown opcode {word:04X}"),
            Self::Unsupported(word) => write!(f, "unsupported opcode {word:04X}"),
            Self::StackOverflow => write!(f, "call stack overflow"),
            Self::StackUnderflow => write!(f, "call stack underflow"),
            Self::MemoryOutOfRange { address } => {
                write!(f, "memory access out of range: {address:#05X}")
            }
            Self::InvalidKey(key) => write!(f, "invalid key {key:#04X}"),
        }
    }
}

impl std::error::Error for Fault {}

impl Fault {
    pub(crate) fn memory(address: usize) -> Self {
        Self::MemoryOutOfRange { address }
    }
}
