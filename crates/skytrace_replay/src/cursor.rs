//! Playback position.

/// Frame index plus the render-tick throttle.
///
/// With divisor `N`, [`ReplayCursor::throttle`] lets exactly one tick in `N`
/// through.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReplayCursor {
    frame: usize,
    sub_tick: u32,
    running: bool,
}

impl ReplayCursor {
    /// Rewinds to frame 0 and starts.
    pub fn start(&mut self) {
        *self = Self { frame: 0, sub_tick: 0, running: true };
    }

    /// Stops in place; frame index is kept.
    pub fn halt(&mut self) {
        self.running = false;
    }

    /// Next frame to apply.
    #[must_use]
    pub const fn frame(&self) -> usize {
        self.frame
    }

    /// Render ticks since the last frame advance.
    #[must_use]
    pub const fn sub_tick(&self) -> u32 {
        self.sub_tick
    }

    /// Is playback running?
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.running
    }

    /// Counts a render tick. Returns `true` on the tick that should advance
    /// a frame.
    pub fn throttle(&mut self, divisor: u32) -> bool {
        self.sub_tick += 1;
        if self.sub_tick < divisor.max(1) {
            return false;
        }
        self.sub_tick = 0;
        true
    }

    /// Moves to the next frame.
    pub fn advance(&mut self) {
        self.frame += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_throttle_lets_one_in_n_through() {
        for divisor in 1..=6 {
            let mut cursor = ReplayCursor::default();
            cursor.start();
            let passed = (0..divisor * 10).filter(|_| cursor.throttle(divisor)).count();
            assert_eq!(passed, 10, "divisor {divisor}");
        }
    }

    #[test]
    fn test_zero_divisor_behaves_as_one() {
        let mut cursor = ReplayCursor::default();
        assert!(cursor.throttle(0));
        assert!(cursor.throttle(0));
    }

    #[test]
    fn test_start_rewinds() {
        let mut cursor = ReplayCursor::default();
        cursor.start();
        cursor.advance();
        cursor.throttle(3);
        cursor.halt();
        assert_eq!(cursor.frame(), 1);
        assert!(!cursor.is_running());

        cursor.start();
        assert_eq!(cursor, ReplayCursor { frame: 0, sub_tick: 0, running: true });
    }
}
