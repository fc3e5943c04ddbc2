pub mod constants;
mod cpu;
mod devices;
mod disasm;
mod display;
mod error;
mod op;
mod timer;
mod vm;

pub use self::{
    devices::{Devices, InvalidKeyCode, KeyCode, Keypad},
    display::{DisplayBuffer, SpriteEdge},
    error::{Chip8Error, Chip8Result, Fault},
    op::{decode, Op},
};

pub const IMPL_VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod prelude {
    pub use super::{
        devices::{Devices, KeyCode, Keypad},
        disasm::Disassembler,
        display::{DisplayBuffer, SpriteEdge},
        error::{Chip8Error, Chip8Result, Fault},
        vm::{Chip8Conf, Chip8Vm, Flow, KeyWaitMode, Step},
    };
}
