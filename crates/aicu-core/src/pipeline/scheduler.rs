// src/pipeline/scheduler.rs
//! Fixed-phase tick scheduler on a wrapping microsecond counter.
//!
//! The deadline advances by exactly one period per tick, independent of when
//! the tick was actually observed, so jitter in the UI loop does not make the
//! sampling drift. Comparisons use the signed difference of the wrapped
//! values and keep working across the `u32` rollover (about every 71 minutes).

#[derive(Debug, Clone)]
pub struct FixedPeriodScheduler {
    period_us: u32,
    next_us: Option<u32>,
}

impl FixedPeriodScheduler {
    pub fn new(period_us: u32) -> Self {
        Self {
            period_us,
            next_us: None,
        }
    }

    pub fn period_us(&self) -> u32 {
        self.period_us
    }

    /// Make the next poll due immediately and restart the phase from there.
    pub fn reset(&mut self) {
        self.next_us = None;
    }

    /// Returns `true` if a tick is due at `now_us` and advances the deadline.
    pub fn poll(&mut self, now_us: u32) -> bool {
        let next = *self.next_us.get_or_insert(now_us);
        if (now_us.wrapping_sub(next) as i32) < 0 {
            return false;
        }
        self.next_us = Some(next.wrapping_add(self.period_us));
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_poll_is_due() {
        let mut s = FixedPeriodScheduler::new(100_000);
        assert!(s.poll(5));
        assert!(!s.poll(6));
    }

    #[test]
    fn test_deadline_does_not_drift() {
        let mut s = FixedPeriodScheduler::new(100_000);
        assert!(s.poll(0));
        assert!(!s.poll(99_999));
        // observed late, the following deadline stays on the grid
        assert!(s.poll(100_250));
        assert!(!s.poll(199_999));
        assert!(s.poll(200_000));
    }

    #[test]
    fn test_counter_wrap() {
        let mut s = FixedPeriodScheduler::new(100_000);
        let start = u32::MAX - 50_000;
        assert!(s.poll(start));
        assert!(!s.poll(u32::MAX - 10));
        assert!(!s.poll(49_000));
        assert!(s.poll(49_999));
    }

    #[test]
    fn test_reset_restarts_phase() {
        let mut s = FixedPeriodScheduler::new(100_000);
        assert!(s.poll(0));
        s.reset();
        assert!(s.poll(30_000));
        assert!(!s.poll(100_000));
        assert!(s.poll(130_000));
    }
}
