// src/input/long_press.rs
//! Hold-both-to-exit gesture.
//!
//! The measurement page has no menu, so leaving it takes a gesture that is
//! hard to trigger by accident: press both buttons together, keep them down
//! for three seconds, then let both go within a short window. Anything else
//! drops back to [`LongPressState::Idle`].

use embassy_time::Instant;
use log::debug;

use crate::config::LongPressTiming;
use crate::input::buttons::ButtonLevels;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LongPressState {
    Idle,
    /// One button is down, waiting for the other to join
    FirstDown { since: Instant },
    /// Both are down, waiting for the hold time to pass
    BothDown { since: Instant },
    /// Held long enough, waiting for the first release
    WaitFirstRelease,
    /// One released, waiting for the other
    WaitSecondRelease { since: Instant },
}

#[derive(Debug)]
pub struct LongPressExit {
    timing: LongPressTiming,
    state: LongPressState,
}

impl Default for LongPressExit {
    fn default() -> Self {
        Self::new(LongPressTiming::default())
    }
}

impl LongPressExit {
    pub fn new(timing: LongPressTiming) -> Self {
        Self {
            timing,
            state: LongPressState::Idle,
        }
    }

    pub fn state(&self) -> LongPressState {
        self.state
    }

    pub fn reset(&mut self) {
        self.state = LongPressState::Idle;
    }

    /// Advance the state machine. Returns `true` exactly once, when the
    /// gesture completes.
    pub fn poll(&mut self, levels: ButtonLevels, now: Instant) -> bool {
        let elapsed = |since: Instant| now.saturating_duration_since(since).as_millis();

        let (next, done) = match self.state {
            LongPressState::Idle if levels.any() => (LongPressState::FirstDown { since: now }, false),
            LongPressState::Idle => (LongPressState::Idle, false),

            LongPressState::FirstDown { .. } if levels.both() => {
                (LongPressState::BothDown { since: now }, false)
            }
            LongPressState::FirstDown { since }
                if levels.none() || elapsed(since) > u64::from(self.timing.join_window_ms) =>
            {
                (LongPressState::Idle, false)
            }

            LongPressState::BothDown { .. } if !levels.both() => (LongPressState::Idle, false),
            LongPressState::BothDown { since }
                if elapsed(since) >= u64::from(self.timing.hold_ms) =>
            {
                debug!(" Long press held, waiting for release");
                (LongPressState::WaitFirstRelease, false)
            }

            LongPressState::WaitFirstRelease if !levels.both() => {
                (LongPressState::WaitSecondRelease { since: now }, false)
            }

            LongPressState::WaitSecondRelease { .. } if levels.none() => {
                (LongPressState::Idle, true)
            }
            LongPressState::WaitSecondRelease { since }
                if elapsed(since) > u64::from(self.timing.release_window_ms) =>
            {
                (LongPressState::Idle, false)
            }

            unchanged => (unchanged, false),
        };

        self.state = next;
        done
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const L: ButtonLevels = ButtonLevels::new(true, false);
    const R: ButtonLevels = ButtonLevels::new(false, true);
    const BOTH: ButtonLevels = ButtonLevels::new(true, true);
    const NONE: ButtonLevels = ButtonLevels::RELEASED;

    fn hold(exit: &mut LongPressExit, levels: ButtonLevels, from: u64, to: u64) -> usize {
        (from..to)
            .step_by(10)
            .filter(|t| exit.poll(levels, Instant::from_millis(*t)))
            .count()
    }

    #[test]
    fn test_released_early_does_not_exit() {
        let mut exit = LongPressExit::default();
        let mut fired = hold(&mut exit, BOTH, 0, 2_500);
        fired += hold(&mut exit, NONE, 2_500, 3_000);
        assert_eq!(fired, 0);
        assert_eq!(exit.state(), LongPressState::Idle);
    }

    #[test]
    fn test_full_gesture_exits_once() {
        let mut exit = LongPressExit::default();
        let mut fired = hold(&mut exit, BOTH, 0, 3_200);
        fired += hold(&mut exit, R, 3_200, 3_400);
        fired += hold(&mut exit, NONE, 3_400, 4_000);
        assert_eq!(fired, 1);
        assert_eq!(exit.state(), LongPressState::Idle);
    }

    #[test]
    fn test_slow_join_resets() {
        let mut exit = LongPressExit::default();
        // the last poll at 410 ms is past the join window
        hold(&mut exit, L, 0, 420);
        assert_eq!(exit.state(), LongPressState::Idle);
        hold(&mut exit, BOTH, 420, 4_000);
        assert_eq!(exit.state(), LongPressState::WaitFirstRelease);
    }

    #[test]
    fn test_slow_second_release_resets() {
        let mut exit = LongPressExit::default();
        let mut fired = hold(&mut exit, BOTH, 0, 3_200);
        fired += hold(&mut exit, L, 3_200, 3_700);
        fired += hold(&mut exit, NONE, 3_700, 4_000);
        assert_eq!(fired, 0);
    }
}
