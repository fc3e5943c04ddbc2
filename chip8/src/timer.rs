//! Delay and sound countdown timers.

/// Two independent 8-bit counters, counting down once per step.
#[derive(Debug, Default, Clone)]
pub struct Timers {
    /// (DT) Delay timer that counts down to 0.
    pub(crate) delay: u8,
    /// (ST) Sound timer that counts down to 0.
    pub(crate) sound: u8,
}

impl Timers {
    pub fn new() -> Self {
        Default::default()
    }

    #[inline]
    pub fn delay(&self) -> u8 {
        self.delay
    }

    #[inline]
    pub fn sound(&self) -> u8 {
        self.sound
    }

    /// Count both timers down by one.
    ///
    /// Returns `true` when the sound timer was at 1 before the
    /// decrement, meaning the beep fires on this tick.
    #[inline]
    pub fn tick(&mut self) -> bool {
        self.delay = self.delay.saturating_sub(1);

        let beep = self.sound == 1;
        self.sound = self.sound.saturating_sub(1);

        beep
    }
}
