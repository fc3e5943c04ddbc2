//! Instruction decoding.
//!
//! Each instruction is a big-endian 16-bit word. The upper nibble selects the
//! instruction family, and the families `0x0`, `0x8`, `0xE` and `0xF` are
//! further split by their lower nibble (and, for `Fx_5`, the third nibble).
use std::fmt::{self, Formatter};

use crate::constants::Address;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(non_camel_case_types)]
pub enum Op {
    /// 0nnn (SYS addr)
    ///
    /// Jump to a machine code routine. Not emulated.
    Sys { address: Address },
    /// 00E0 (CLS)
    ///
    /// Clear the screen.
    ClearScreen,
    /// 00EE (RET)
    ///
    /// Return from the sub-routine.
    Return,
    /// 1nnn (JP addr)
    ///
    /// Jump to the address in `nnn`.
    Jump { address: Address },
    /// 2nnn (CALL addr)
    ///
    /// Call the sub-routine at address `nnn`.
    Call { address: Address },
    /// 3xnn (SE Vx, byte)
    ///
    /// Skip the next instruction if register `Vx` equals value `nn`
    Skip_Eq_Byte { vx: u8, nn: u8 },
    /// 4xnn (SNE Vx, byte)
    ///
    /// Skip the next instruction if register `Vx` does not equal value `nn`.
    Skip_NotEq_Byte { vx: u8, nn: u8 },
    /// 5xy0 (SE Vx, Vy)
    ///
    /// Skip the next instruction if register `Vx` equals register `Vy`.
    Skip_Eq { vx: u8, vy: u8 },
    /// 6xnn (LD Vx, byte)
    Load_Byte { vx: u8, nn: u8 },
    /// 7xnn (ADD Vx, byte)
    ///
    /// Add byte to the value in register `Vx`, store the result in `Vx`.
    /// The carry flag is untouched.
    Add_Byte { vx: u8, nn: u8 },

    // ------------------------------------------------------------------------
    // Math
    /// 8xy0 (LD Vx, Vy)
    Load_Vx_Vy { vx: u8, vy: u8 },
    /// 8xy1 (OR Vx, Vy)
    Or_Vx_Vy { vx: u8, vy: u8 },
    /// 8xy2 (AND Vx, Vy)
    And_Vx_Vy { vx: u8, vy: u8 },
    /// 8xy3 (XOR Vx, Vy)
    Xor_Vx_Vy { vx: u8, vy: u8 },
    /// 8xy4 (ADD Vx, Vy)
    ///
    /// Overflow is wrapped. If overflowed, set VF to 1, else 0.
    Add_Vx_Vy { vx: u8, vy: u8 },
    /// 8xy5 (SUB Vx, Vy)
    ///
    /// VF is set to 0 when there is a borrow, set to 1 when there isn't.
    Sub_Vx_Vy { vx: u8, vy: u8 },
    /// 8xy6 (SHR Vx)
    ///
    /// VF receives the bit shifted out. VY is unused.
    ShiftRight { vx: u8 },
    /// 8xy7 (SUBN Vx, Vy)
    ///
    /// Subtracts VX from VY, and stores the result in VX.
    SubReverse_Vx_Vy { vx: u8, vy: u8 },
    /// 8xyE (SHL Vx)
    ///
    /// VF receives the bit shifted out. VY is unused.
    ShiftLeft { vx: u8 },
    /// 9xy0 (SNE Vx, Vy)
    Skip_NotEq { vx: u8, vy: u8 },

    /// Annn (LD I, addr)
    Load_Address { address: Address },
    /// Bnnn (JP V0, addr)
    Jump_V0 { address: Address },
    /// Cxnn (RND Vx, byte)
    Random { vx: u8, nn: u8 },
    /// Dxyn (DRW Vx, Vy, nibble)
    Draw { vx: u8, vy: u8, n: u8 },

    // ------------------------------------------------------------------------
    // Keyboard
    /// Ex9E (SKP Vx)
    Skip_Pressed { vx: u8 },
    /// ExA1 (SKNP Vx)
    Skip_NotPressed { vx: u8 },

    // ------------------------------------------------------------------------
    // Miscellaneous
    /// Fx07 (LD Vx, DT)
    Load_Vx_Delay { vx: u8 },
    /// Fx0A (LD Vx, K)
    Load_Vx_Key { vx: u8 },
    /// Fx15 (LD DT, Vx)
    Load_Delay_Vx { vx: u8 },
    /// Fx18 (LD ST, Vx)
    Load_Sound_Vx { vx: u8 },
    /// Fx1E (ADD I, Vx)
    Add_Address_Vx { vx: u8 },
    /// Fx29 (LD F, Vx)
    Load_Font { vx: u8 },
    /// Fx33 (LD B, Vx)
    Store_Bcd { vx: u8 },
    /// Fx55 (LD [I], Vx)
    Store_Registers { vx: u8 },
    /// Fx65 (LD Vx, [I])
    Load_Registers { vx: u8 },

    /// Instruction word that matches none of the above.
    Unknown(u16),
}

/// Combine the two instruction bytes into a word, high byte first.
#[inline(always)]
pub fn op_word(bytes: [u8; 2]) -> u16 {
    u16::from_be_bytes(bytes)
}

/// Decode an instruction word.
pub fn decode(word: u16) -> Op {
    let [a, b] = word.to_be_bytes();
    let op = a >> 4; // 0xF000
    let vx = a & 0xF; // 0x0F00
    let vy = b >> 4; // 0x00F0
    let n = b & 0xF; // 0x000F
    let nn = b; // 0x00FF
    let nnn = word & 0x0FFF; // 0x0FFF

    match op {
        0x0 => decode_sys(word, nnn),
        0x1 => Op::Jump { address: nnn },
        0x2 => Op::Call { address: nnn },
        0x3 => Op::Skip_Eq_Byte { vx, nn },
        0x4 => Op::Skip_NotEq_Byte { vx, nn },
        0x5 if n == 0 => Op::Skip_Eq { vx, vy },
        0x6 => Op::Load_Byte { vx, nn },
        0x7 => Op::Add_Byte { vx, nn },
        0x8 => decode_math(word, vx, vy, n),
        0x9 if n == 0 => Op::Skip_NotEq { vx, vy },
        0xA => Op::Load_Address { address: nnn },
        0xB => Op::Jump_V0 { address: nnn },
        0xC => Op::Random { vx, nn },
        0xD => Op::Draw { vx, vy, n },
        0xE => decode_keys(word, vx, nn),
        0xF => decode_misc(word, vx, vy, n),
        _ => Op::Unknown(word),
    }
}

/// Family `0x0`, identified by the low nibble of `00Ex`.
#[inline]
fn decode_sys(word: u16, nnn: u16) -> Op {
    if nnn & 0xFF0 == 0x0E0 {
        match nnn & 0xF {
            0x0 => Op::ClearScreen,
            0xE => Op::Return,
            _ => Op::Unknown(word),
        }
    } else {
        Op::Sys { address: nnn }
    }
}

/// Family `0x8`, identified by the low nibble.
#[inline]
fn decode_math(word: u16, vx: u8, vy: u8, n: u8) -> Op {
    match n {
        0x0 => Op::Load_Vx_Vy { vx, vy },
        0x1 => Op::Or_Vx_Vy { vx, vy },
        0x2 => Op::And_Vx_Vy { vx, vy },
        0x3 => Op::Xor_Vx_Vy { vx, vy },
        0x4 => Op::Add_Vx_Vy { vx, vy },
        0x5 => Op::Sub_Vx_Vy { vx, vy },
        0x6 => Op::ShiftRight { vx },
        0x7 => Op::SubReverse_Vx_Vy { vx, vy },
        0xE => Op::ShiftLeft { vx },
        _ => Op::Unknown(word),
    }
}

/// Family `0xE`, identified by the low byte.
#[inline]
fn decode_keys(word: u16, vx: u8, nn: u8) -> Op {
    match nn {
        0x9E => Op::Skip_Pressed { vx },
        0xA1 => Op::Skip_NotPressed { vx },
        _ => Op::Unknown(word),
    }
}

/// Family `0xF`, identified by the low nibble, and by the
/// third nibble when the low nibble is `5`.
#[inline]
fn decode_misc(word: u16, vx: u8, vy: u8, n: u8) -> Op {
    match (n, vy) {
        (0x7, 0x0) => Op::Load_Vx_Delay { vx },
        (0xA, 0x0) => Op::Load_Vx_Key { vx },
        (0x5, _) => match vy {
            0x1 => Op::Load_Delay_Vx { vx },
            0x5 => Op::Store_Registers { vx },
            0x6 => Op::Load_Registers { vx },
            _ => Op::Unknown(word),
        },
        (0x8, 0x1) => Op::Load_Sound_Vx { vx },
        (0xE, 0x1) => Op::Add_Address_Vx { vx },
        (0x9, 0x2) => Op::Load_Font { vx },
        (0x3, 0x3) => Op::Store_Bcd { vx },
        _ => Op::Unknown(word),
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match *self {
            Op::Sys { address } => write!(f, "SYS 0x{address:03X}"),
            Op::ClearScreen => write!(f, "CLS"),
            Op::Return => write!(f, "RET"),
            Op::Jump { address } => write!(f, "JP 0x{address:03X}"),
            Op::Call { address } => write!(f, "CALL 0x{address:03X}"),
            Op::Skip_Eq_Byte { vx, nn } => write!(f, "SE v{vx:X}, {nn}"),
            Op::Skip_NotEq_Byte { vx, nn } => write!(f, "SNE v{vx:X}, {nn}"),
            Op::Skip_Eq { vx, vy } => write!(f, "SE v{vx:X}, v{vy:X}"),
            Op::Load_Byte { vx, nn } => write!(f, "LD v{vx:X}, {nn}"),
            Op::Add_Byte { vx, nn } => write!(f, "ADD v{vx:X}, {nn}"),
            // ------
            Op::Load_Vx_Vy { vx, vy } => write!(f, "LD v{vx:X}, v{vy:X}"),
            Op::Or_Vx_Vy { vx, vy } => write!(f, "OR v{vx:X}, v{vy:X}"),
            Op::And_Vx_Vy { vx, vy } => write!(f, "AND v{vx:X}, v{vy:X}"),
            Op::Xor_Vx_Vy { vx, vy } => write!(f, "XOR v{vx:X}, v{vy:X}"),
            Op::Add_Vx_Vy { vx, vy } => write!(f, "ADD v{vx:X}, v{vy:X}"),
            Op::Sub_Vx_Vy { vx, vy } => write!(f, "SUB v{vx:X}, v{vy:X}"),
            Op::ShiftRight { vx } => write!(f, "SHR v{vx:X}"),
            Op::SubReverse_Vx_Vy { vx, vy } => write!(f, "SUBN v{vx:X}, v{vy:X}"),
            Op::ShiftLeft { vx } => write!(f, "SHL v{vx:X}"),
            Op::Skip_NotEq { vx, vy } => write!(f, "SNE v{vx:X}, v{vy:X}"),
            // ------
            Op::Load_Address { address } => write!(f, "LD I, 0x{address:03X}"),
            Op::Jump_V0 { address } => write!(f, "JP v0, 0x{address:03X}"),
            Op::Random { vx, nn } => write!(f, "RND v{vx:X}, {nn}"),
            Op::Draw { vx, vy, n } => write!(f, "DRW v{vx:X}, v{vy:X}, {n}"),
            // ------
            Op::Skip_Pressed { vx } => write!(f, "SKP v{vx:X}"),
            Op::Skip_NotPressed { vx } => write!(f, "SKNP v{vx:X}"),
            // ------
            Op::Load_Vx_Delay { vx } => write!(f, "LD v{vx:X}, DT"),
            Op::Load_Vx_Key { vx } => write!(f, "LD v{vx:X}, K"),
            Op::Load_Delay_Vx { vx } => write!(f, "LD DT, v{vx:X}"),
            Op::Load_Sound_Vx { vx } => write!(f, "LD ST, v{vx:X}"),
            Op::Add_Address_Vx { vx } => write!(f, "ADD I, v{vx:X}"),
            Op::Load_Font { vx } => write!(f, "LD F, v{vx:X}"),
            Op::Store_Bcd { vx } => write!(f, "LD B, v{vx:X}"),
            Op::Store_Registers { vx } => write!(f, "LD [I], v{vx:X}"),
            Op::Load_Registers { vx } => write!(f, "LD v{vx:X}, [I]"),
            Op::Unknown(word) => write!(f, "0x{word:04X}"),
        }
    }
}
