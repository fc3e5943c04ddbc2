//! Disassembler.
use std::fmt::{self, Write as FmtWrite};

use crate::{
    constants::MEM_START,
    op::{decode, op_word},
};

pub struct Disassembler<'a> {
    bytecode: &'a [u8],
}

impl<'a> Disassembler<'a> {
    pub fn new(bytecode: &'a [u8]) -> Self {
        Self { bytecode }
    }

    /// Write the listing of the whole program, one instruction per line.
    ///
    /// A trailing odd byte is printed as raw data.
    pub fn disassemble<W: FmtWrite>(&self, w: &mut W) -> fmt::Result {
        let mut chunks = self.bytecode.chunks_exact(2);

        for (i, chunk) in chunks.by_ref().enumerate() {
            let word = op_word([chunk[0], chunk[1]]);
            let address = MEM_START + i * 2;
            writeln!(w, "0x{address:04X} {word:04X} {}", decode(word))?;
        }

        if let [byte] = chunks.remainder() {
            let address = MEM_START + self.bytecode.len() - 1;
            writeln!(w, "0x{address:04X} {byte:02X}")?;
        }

        Ok(())
    }

    pub fn to_listing(&self) -> Result<String, fmt::Error> {
        let mut buf = String::new();
        self.disassemble(&mut buf)?;
        Ok(buf)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_listing() {
        let listing = Disassembler::new(&[0x00, 0xE0, 0xA2, 0x2A, 0xD0, 0x15, 0x12])
            .to_listing()
            .unwrap();
        let lines: Vec<&str> = listing.lines().collect();
        assert_eq!(
            lines,
            [
                "0x0200 00E0 CLS",
                "0x0202 A22A LD I, 0x22A",
                "0x0204 D015 DRW v0, v1, 5",
                "0x0206 12",
            ]
        );
    }
}
