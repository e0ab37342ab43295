// src/pages/screen_power.rs
//! Backlight idle timeout.

use embassy_time::Instant;

#[derive(Debug, Clone, Copy)]
pub struct ScreenPower {
    idle_ms: u32,
    awake: bool,
    last_input: Instant,
}

impl ScreenPower {
    /// `idle_ms == 0` keeps the screen on forever.
    pub fn new(idle_ms: u32) -> Self {
        Self {
            idle_ms,
            awake: true,
            last_input: Instant::from_ticks(0),
        }
    }

    pub fn is_awake(&self) -> bool {
        self.awake
    }

    /// Restart the idle window without changing the backlight.
    pub fn touch(&mut self, now: Instant) {
        self.last_input = now;
    }

    /// Returns the new backlight level when it has to change.
    pub fn update(&mut self, now: Instant, keep_awake: bool, input: bool) -> Option<bool> {
        if self.idle_ms == 0 {
            return None;
        }

        if keep_awake || input {
            self.last_input = now;
            if !self.awake {
                self.awake = true;
                return Some(true);
            }
            return None;
        }

        let idle = now.saturating_duration_since(self.last_input).as_millis();
        if self.awake && idle > u64::from(self.idle_ms) {
            self.awake = false;
            return Some(false);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(ms: u64) -> Instant {
        Instant::from_millis(ms)
    }

    #[test]
    fn test_sleeps_after_idle_and_wakes_on_input() {
        let mut power = ScreenPower::new(1_000);
        power.touch(at(0));
        assert_eq!(power.update(at(900), false, false), None);
        assert_eq!(power.update(at(1_001), false, false), Some(false));
        assert!(!power.is_awake());
        assert_eq!(power.update(at(2_000), false, false), None);
        assert_eq!(power.update(at(2_100), false, true), Some(true));
        assert!(power.is_awake());
    }

    #[test]
    fn test_keep_awake_holds_the_backlight() {
        let mut power = ScreenPower::new(1_000);
        for ms in (0..5_000).step_by(100) {
            assert_eq!(power.update(at(ms), true, false), None);
        }
        assert!(power.is_awake());
    }

    #[test]
    fn test_zero_timeout_never_sleeps() {
        let mut power = ScreenPower::new(0);
        assert_eq!(power.update(at(10_000_000), false, false), None);
        assert!(power.is_awake());
    }
}
