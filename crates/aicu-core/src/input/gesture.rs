// src/input/gesture.rs
//! Tap and confirm recognition for the two-button menus.
//!
//! A short press of one button is a tap: LEFT moves to the previous entry,
//! RIGHT to the next. Holding both buttons is a confirm and selects the
//! current entry. Both-down is checked before any tap is evaluated, so one
//! physical gesture never produces both kinds of event.
//!
//! The recogniser never sleeps. Quiet periods are deadlines compared against
//! the time passed to [`GestureRecognizer::poll`].

use embassy_time::{Duration, Instant};
use log::debug;

use crate::config::GestureTiming;
use crate::input::buttons::ButtonLevels;

/// Navigation intent produced by a completed gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavEvent {
    /// LEFT tap
    Previous,
    /// RIGHT tap
    Next,
    /// Both buttons held and released
    Select,
}

#[derive(Debug)]
pub struct GestureRecognizer {
    timing: GestureTiming,
    /// Press start of each button while a tap is possible
    left_since: Option<Instant>,
    right_since: Option<Instant>,
    /// Start of the current both-down hold
    both_since: Option<Instant>,
    /// Select already fired for the current hold
    confirm_fired: bool,
    /// Time of the last fired event, starts the debounce window
    last_event: Option<Instant>,
    /// Nothing is processed before this deadline
    quiet_until: Option<Instant>,
    /// A confirm ended with one button still down; wait until it is released
    await_release: bool,
}

impl Default for GestureRecognizer {
    fn default() -> Self {
        Self::new(GestureTiming::default())
    }
}

impl GestureRecognizer {
    pub fn new(timing: GestureTiming) -> Self {
        Self {
            timing,
            left_since: None,
            right_since: None,
            both_since: None,
            confirm_fired: false,
            last_event: None,
            quiet_until: None,
            await_release: false,
        }
    }

    /// Forget any half-finished gesture.
    pub fn reset(&mut self) {
        *self = Self::new(self.timing);
    }

    /// Feed the current button levels. Returns at most one event per call.
    pub fn poll(&mut self, levels: ButtonLevels, now: Instant) -> Option<NavEvent> {
        if let Some(until) = self.quiet_until {
            if now < until {
                return None;
            }
            self.quiet_until = None;
        }

        if levels.both() {
            if self.both_since.is_none() {
                debug!(" Both buttons down");
                self.both_since = Some(now);
                self.confirm_fired = false;
            }
            self.left_since = None;
            self.right_since = None;
            return None;
        }

        if let Some(start) = self.both_since.take() {
            return self.finish_confirm(start, levels, now);
        }

        if self.await_release {
            if levels.any() {
                return None;
            }
            self.await_release = false;
        }

        if let Some(last) = self.last_event {
            if elapsed_ms(last, now) < u64::from(self.timing.debounce_ms) {
                return None;
            }
        }

        let left = Self::track_tap(&mut self.left_since, levels.left, now, &self.timing);
        let right = Self::track_tap(&mut self.right_since, levels.right, now, &self.timing);

        let event = if left {
            Some(NavEvent::Previous)
        } else if right {
            Some(NavEvent::Next)
        } else {
            None
        };

        if let Some(event) = event {
            debug!(" Tap: {:?}", event);
            self.last_event = Some(now);
        }
        event
    }

    fn finish_confirm(
        &mut self,
        start: Instant,
        levels: ButtonLevels,
        now: Instant,
    ) -> Option<NavEvent> {
        let held = elapsed_ms(start, now);
        self.left_since = None;
        self.right_since = None;
        self.last_event = Some(now);
        self.quiet_until = Some(now + Duration::from_millis(u64::from(self.timing.settle_ms)));
        self.await_release = levels.any();

        if held >= u64::from(self.timing.confirm_hold_ms) && !self.confirm_fired {
            debug!(" Confirm after {} ms", held);
            self.confirm_fired = true;
            Some(NavEvent::Select)
        } else {
            None
        }
    }

    /// Latch the press start, and on release report whether it was a tap.
    fn track_tap(
        since: &mut Option<Instant>,
        pressed: bool,
        now: Instant,
        timing: &GestureTiming,
    ) -> bool {
        if pressed {
            if since.is_none() {
                *since = Some(now);
            }
            return false;
        }

        match since.take() {
            Some(start) => {
                let held = elapsed_ms(start, now);
                held >= u64::from(timing.min_tap_ms) && held < u64::from(timing.max_tap_ms)
            }
            None => false,
        }
    }
}

fn elapsed_ms(start: Instant, now: Instant) -> u64 {
    now.saturating_duration_since(start).as_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    const L: ButtonLevels = ButtonLevels::new(true, false);
    const R: ButtonLevels = ButtonLevels::new(false, true);
    const BOTH: ButtonLevels = ButtonLevels::new(true, true);
    const NONE: ButtonLevels = ButtonLevels::RELEASED;

    fn at(ms: u64) -> Instant {
        Instant::from_millis(ms)
    }

    /// Poll every 10 ms from `from` (inclusive) to `to` (exclusive) with the
    /// same levels and collect the events.
    fn hold(g: &mut GestureRecognizer, levels: ButtonLevels, from: u64, to: u64) -> Vec<NavEvent> {
        (from..to)
            .step_by(10)
            .filter_map(|t| g.poll(levels, at(t)))
            .collect()
    }

    #[test]
    fn test_right_tap_fires_next_once() {
        let mut g = GestureRecognizer::default();
        let mut events = hold(&mut g, NONE, 0, 1_000);
        events.extend(hold(&mut g, R, 1_000, 1_120));
        events.extend(hold(&mut g, NONE, 1_120, 2_000));
        assert_eq!(events, vec![NavEvent::Next]);
    }

    #[test]
    fn test_left_tap_fires_previous_once() {
        let mut g = GestureRecognizer::default();
        let mut events = hold(&mut g, L, 0, 300);
        events.extend(hold(&mut g, NONE, 300, 1_000));
        assert_eq!(events, vec![NavEvent::Previous]);
    }

    #[test]
    fn test_too_short_and_too_long_presses_are_ignored() {
        let mut g = GestureRecognizer::default();
        assert_eq!(g.poll(R, at(0)), None);
        assert_eq!(g.poll(NONE, at(30)), None);

        let mut events = hold(&mut g, R, 1_000, 1_600);
        events.extend(hold(&mut g, NONE, 1_600, 2_000));
        assert!(events.is_empty());
    }

    #[test]
    fn test_taps_inside_debounce_window_are_ignored() {
        let mut g = GestureRecognizer::default();
        assert_eq!(g.poll(R, at(0)), None);
        assert_eq!(g.poll(NONE, at(100)), Some(NavEvent::Next));
        assert_eq!(g.poll(R, at(120)), None);
        assert_eq!(g.poll(NONE, at(180)), None);
        assert_eq!(g.poll(NONE, at(400)), None);
    }

    #[test]
    fn test_both_held_selects_once_without_taps() {
        let mut g = GestureRecognizer::default();
        let mut events = hold(&mut g, L, 0, 10);
        events.extend(hold(&mut g, BOTH, 10, 400));
        // LEFT lets go first, RIGHT stays down a while longer
        events.extend(hold(&mut g, R, 400, 700));
        events.extend(hold(&mut g, NONE, 700, 1_500));
        assert_eq!(events, vec![NavEvent::Select]);
    }

    #[test]
    fn test_short_both_press_does_not_select() {
        let mut g = GestureRecognizer::default();
        let mut events = hold(&mut g, BOTH, 0, 100);
        events.extend(hold(&mut g, NONE, 100, 800));
        assert!(events.is_empty());
    }

    #[test]
    fn test_taps_resume_after_confirm() {
        let mut g = GestureRecognizer::default();
        let mut events = hold(&mut g, BOTH, 0, 300);
        events.extend(hold(&mut g, NONE, 300, 700));
        events.extend(hold(&mut g, R, 700, 800));
        events.extend(hold(&mut g, NONE, 800, 900));
        assert_eq!(events, vec![NavEvent::Select, NavEvent::Next]);
    }
}
