//! IO device interface
use crate::{constants::*, display::DisplayBuffer};

/// Hooks to provide IO devices to the virtual machine.
///
/// Called by [`Chip8Vm::cycle`](crate::vm::Chip8Vm::cycle) in order:
/// keys are polled, a step is executed, the display is drawn
/// if it changed, and the buzzer is sounded if the timer expired.
pub trait Devices {
    /// Refresh the keyboard state before a step.
    fn poll_keys(&mut self, keys: &mut Keypad);

    /// Blit the display buffer to screen output.
    fn draw(&mut self, display: &DisplayBuffer);

    /// Sound the buzzer.
    fn beep(&mut self);
}

/// Keyboard input state. Pressed is a 1 bit, released is a 0 bit.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Keypad(u16);

impl Keypad {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn set(&mut self, key: KeyCode, pressed: bool) {
        if pressed {
            self.0 |= 1 << key.as_u8();
        } else {
            self.0 &= !(1 << key.as_u8());
        }
    }

    #[inline]
    pub fn is_pressed(&self, key: KeyCode) -> bool {
        self.0 & (1 << key.as_u8()) != 0
    }

    /// Check whether any key is pressed down.
    #[inline(always)]
    pub fn any(&self) -> bool {
        self.0 != 0
    }

    /// The highest numbered key that is pressed down.
    ///
    /// This is the last key found when scanning upwards from `0x0`.
    #[inline]
    pub fn last_pressed(&self) -> Option<KeyCode> {
        if self.any() {
            let id = 15 - self.0.leading_zeros() as u8;
            KeyCode::try_from(id).ok()
        } else {
            None
        }
    }

    /// Clear the keyboard input state, setting all keys to up.
    #[inline(always)]
    pub fn clear(&mut self) {
        self.0 = 0;
    }

    pub fn iter_pressed(&self) -> impl Iterator<Item = KeyCode> + '_ {
        (0..KEY_COUNT)
            .filter_map(|id| KeyCode::try_from(id).ok())
            .filter(|key| self.is_pressed(*key))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "u8"))]
#[repr(u8)]
pub enum KeyCode {
    Key0 = 0,
    Key1,
    Key2,
    Key3,
    Key4,
    Key5,
    Key6,
    Key7,
    Key8,
    Key9,
    KeyA,
    KeyB,
    KeyC,
    KeyD,
    KeyE,
    KeyF = 0xF,
}

impl KeyCode {
    #[inline(always)]
    pub fn as_u8(&self) -> u8 {
        *self as u8
    }
}

impl std::fmt::Display for KeyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let key_id = self.as_u8();
        write!(f, "k{key_id:x}")
    }
}

impl From<KeyCode> for u8 {
    fn from(keycode: KeyCode) -> Self {
        keycode.as_u8()
    }
}

impl TryFrom<u8> for KeyCode {
    type Error = InvalidKeyCode;

    fn try_from(key_id: u8) -> Result<Self, Self::Error> {
        match key_id {
            0 => Ok(Self::Key0),
            1 => Ok(Self::Key1),
            2 => Ok(Self::Key2),
            3 => Ok(Self::Key3),
            4 => Ok(Self::Key4),
            5 => Ok(Self::Key5),
            6 => Ok(Self::Key6),
            7 => Ok(Self::Key7),
            8 => Ok(Self::Key8),
            9 => Ok(Self::Key9),
            10 => Ok(Self::KeyA),
            11 => Ok(Self::KeyB),
            12 => Ok(Self::KeyC),
            13 => Ok(Self::KeyD),
            14 => Ok(Self::KeyE),
            15 => Ok(Self::KeyF),
            _ => Err(InvalidKeyCode(key_id)),
        }
    }
}

#[derive(Debug)]
pub struct InvalidKeyCode(pub u8);

impl std::error::Error for InvalidKeyCode {}

impl std::fmt::Display for InvalidKeyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "keycode must be in range 0 <= keycode < 16, got {}",
            self.0
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_key_state() {
        let mut keys = Keypad::new();

        keys.set(KeyCode::Key0, true);
        assert_eq!(keys.0, 0b00000000_00000001);
        assert!(keys.is_pressed(KeyCode::Key0));
        assert!(!keys.is_pressed(KeyCode::Key1));

        keys.set(KeyCode::Key7, true);
        assert_eq!(keys.0, 0b00000000_10000001);

        keys.set(KeyCode::Key0, false);
        assert_eq!(keys.0, 0b00000000_10000000);
        assert!(!keys.is_pressed(KeyCode::Key0));
        assert!(keys.is_pressed(KeyCode::Key7));

        keys.set(KeyCode::KeyF, true);
        assert_eq!(keys.0, 0b10000000_10000000);
        assert!(keys.is_pressed(KeyCode::KeyF));

        keys.clear();
        assert!(!keys.any());
    }

    #[test]
    fn test_last_pressed() {
        let mut keys = Keypad::new();
        assert_eq!(keys.last_pressed(), None);

        keys.set(KeyCode::Key3, true);
        assert_eq!(keys.last_pressed(), Some(KeyCode::Key3));

        keys.set(KeyCode::KeyA, true);
        assert_eq!(keys.last_pressed(), Some(KeyCode::KeyA));

        keys.set(KeyCode::Key1, true);
        assert_eq!(keys.last_pressed(), Some(KeyCode::KeyA));
        assert_eq!(
            keys.iter_pressed().collect::<Vec<_>>(),
            [KeyCode::Key1, KeyCode::Key3, KeyCode::KeyA]
        );
    }

    #[test]
    fn test_keycode_range() {
        assert_eq!(KeyCode::try_from(0xF).unwrap(), KeyCode::KeyF);
        assert!(KeyCode::try_from(0x10).is_err());
        assert_eq!(KeyCode::KeyB.to_string(), "kb");
    }
}
