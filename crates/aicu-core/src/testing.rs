//! Shared fixtures for the unit tests: a manually advanced clock, a board
//! built on it, a display that discards every pixel and an application
//! state wired to them.

use core::cell::Cell;
use core::convert::Infallible;

use alloc::rc::Rc;

use embassy_time::Instant;
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_hal_async::delay::DelayNs;

use crate::app_state::{AppState, LinkStatus, Uplink};
use crate::board::Board;
use crate::config::{MemoryStore, Settings};
use crate::input::ButtonLevels;
use crate::pages::NavContext;

/// Microsecond clock shared between a test and the board it drives.
#[derive(Clone, Default)]
pub struct SimClock(Rc<Cell<u64>>);

impl SimClock {
    pub fn now(&self) -> Instant {
        Instant::from_micros(self.0.get())
    }

    pub fn advance_ms(&self, ms: u64) {
        self.0.set(self.0.get() + ms * 1_000);
    }
}

/// Board whose delays advance the shared clock instead of blocking.
pub struct SimBoard {
    pub clock: SimClock,
    pub backlight: bool,
    pub slept_ms: u64,
}

impl SimBoard {
    pub fn new(clock: SimClock) -> Self {
        Self {
            clock,
            backlight: true,
            slept_ms: 0,
        }
    }
}

impl DelayNs for SimBoard {
    async fn delay_ns(&mut self, ns: u32) {
        let us = u64::from(ns) / 1_000;
        self.slept_ms += us / 1_000;
        self.clock.0.set(self.clock.0.get() + us);
    }
}

impl Board for SimBoard {
    fn now(&self) -> Instant {
        self.clock.now()
    }

    fn set_backlight(&mut self, on: bool) {
        self.backlight = on;
    }
}

/// 320x240 draw target that drops everything.
#[derive(Default)]
pub struct NullDisplay {
    pub pixels_drawn: usize,
}

impl OriginDimensions for NullDisplay {
    fn size(&self) -> Size {
        Size::new(320, 240)
    }
}

impl DrawTarget for NullDisplay {
    type Color = Rgb565;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        self.pixels_drawn += pixels.into_iter().count();
        Ok(())
    }
}

/// Uplink whose status the test sets directly.
pub struct TestUplink {
    pub status: LinkStatus,
    pub connects: usize,
}

impl TestUplink {
    pub fn online() -> Self {
        Self {
            status: LinkStatus::Online,
            connects: 0,
        }
    }
}

impl Uplink for TestUplink {
    fn connect(&mut self, _settings: &Settings) {
        self.connects += 1;
    }

    fn status(&self) -> LinkStatus {
        self.status
    }
}

pub type TestState<'a> = AppState<'a, NullDisplay, MemoryStore, TestUplink>;

/// Application state on a null display with an online uplink.
pub fn app_state<'a>() -> TestState<'a> {
    AppState::new(
        NullDisplay::default(),
        MemoryStore::default(),
        TestUplink::online(),
        Settings::default(),
    )
}

/// Navigation context at `ms` with the given levels and the screen awake.
pub fn nav(ms: u64, buttons: ButtonLevels) -> NavContext {
    NavContext::new(Instant::from_millis(ms), 0, buttons, true, None)
}
