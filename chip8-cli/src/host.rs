//! Terminal host devices.
use std::io::{self, Write};

use chip8::{constants::*, DisplayBuffer, Devices, KeyCode, Keypad};
use log::{info, trace};

/// Presents the VM through the terminal.
///
/// The display is printed as text, the buzzer is a log record
/// and a terminal bell, and keys are a fixed set held down for
/// the whole run.
pub struct TerminalHost<W> {
    out: W,
    render: bool,
    held_keys: Vec<KeyCode>,
    frames: usize,
    beeps: usize,
}

impl<W: Write> TerminalHost<W> {
    pub fn new(out: W, render: bool, held_keys: Vec<KeyCode>) -> Self {
        Self {
            out,
            render,
            held_keys,
            frames: 0,
            beeps: 0,
        }
    }

    pub fn frames(&self) -> usize {
        self.frames
    }

    pub fn beeps(&self) -> usize {
        self.beeps
    }

    fn write_frame(&mut self, display: &DisplayBuffer) -> io::Result<()> {
        // Move the cursor home and clear, so frames draw over each other.
        write!(self.out, "\x1b[H\x1b[2J")?;
        write_display(&mut self.out, display)?;
        self.out.flush()
    }
}

/// Write the display as rows of `#` and `.`.
pub fn write_display(out: &mut impl Write, display: &DisplayBuffer) -> io::Result<()> {
    let mut line = String::with_capacity(DISPLAY_WIDTH);
    for y in 0..DISPLAY_HEIGHT {
        line.clear();
        line.extend((0..DISPLAY_WIDTH).map(|x| if display.get(x, y) { '#' } else { '.' }));
        writeln!(out, "{line}")?;
    }
    Ok(())
}

impl<W: Write> Devices for TerminalHost<W> {
    fn poll_keys(&mut self, keys: &mut Keypad) {
        keys.clear();
        for key in &self.held_keys {
            keys.set(*key, true);
        }
    }

    fn draw(&mut self, display: &DisplayBuffer) {
        self.frames += 1;
        if !self.render {
            return;
        }
        if let Err(err) = self.write_frame(display) {
            log::error!("failed to draw frame: {err}");
        }
    }

    fn beep(&mut self) {
        self.beeps += 1;
        info!("beep");
        if self.render {
            // Terminal bell
            if let Err(err) = self.out.write_all(b"\x07") {
                log::error!("failed to ring bell: {err}");
            }
        }
        trace!("{} beeps so far", self.beeps);
    }
}

#[cfg(test)]
mod test {
    use chip8::prelude::*;

    use super::*;

    #[test]
    fn test_terminal_host() {
        let mut vm = Chip8Vm::new(Chip8Conf::default());
        #[rustfmt::skip]
        vm.load_bytecode(&[
            0x60, 0x01, // LD v0, 1
            0xF0, 0x18, // LD ST, v0
            0xE3, 0x9E, // SKP v3
            0x00, 0x00, // SYS 0x000
            0xD0, 0x01, // DRW v0, v0, 1
        ])
        .unwrap();

        let mut out = Vec::new();
        let mut host = TerminalHost::new(&mut out, true, vec![KeyCode::Key1]);
        for _ in 0..5 {
            vm.cycle(&mut host).unwrap();
        }
        assert_eq!(host.frames(), 1);
        assert_eq!(host.beeps(), 1);
        // v3 is zero and key 0 is not held, so nothing was skipped.
        assert_eq!(vm.pc(), 0x20A);

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains('\x07'));
        assert!(text.contains(".####..."));
    }

    struct Broken;

    impl Write for Broken {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::ErrorKind::BrokenPipe.into())
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::ErrorKind::BrokenPipe.into())
        }
    }

    #[test]
    fn test_terminal_write_errors_are_logged() {
        let mut host = TerminalHost::new(Broken, true, vec![]);

        host.beep();
        host.draw(&DisplayBuffer::new());

        assert_eq!(host.beeps(), 1);
        assert_eq!(host.frames(), 1);
    }
}
