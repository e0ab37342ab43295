// src/board.rs
//! Platform seam for the page manager.
//!
//! The manager needs exactly three things from the hardware: a monotonic
//! clock, a way to pace the loop, and control over the display backlight.
//! Pacing comes from the [`DelayNs`] supertrait so that firmware boards can
//! forward to `embassy_time::Timer` and the simulator to a thread sleep.

use embassy_time::Instant;
use embedded_hal_async::delay::DelayNs;

/// Clock, delay and backlight provider used by
/// [`PageManager`](crate::pages::page_manager::PageManager).
pub trait Board: DelayNs {
    /// Monotonic time since boot.
    fn now(&self) -> Instant;

    /// Switch the display backlight on or off.
    fn set_backlight(&mut self, on: bool);
}
