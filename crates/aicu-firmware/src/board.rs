//! [`Board`] implementation for the ESP32-S3 device.

use aicu_core::board::Board;
use embassy_time::{Delay, Instant};
use embedded_hal_async::delay::DelayNs;
use esp_hal::gpio::{Level, Output};

pub struct EspBoard {
    delay: Delay,
    backlight: Output<'static>,
}

impl EspBoard {
    pub fn new(backlight: Output<'static>) -> Self {
        Self {
            delay: Delay,
            backlight,
        }
    }
}

impl DelayNs for EspBoard {
    async fn delay_ns(&mut self, ns: u32) {
        self.delay.delay_ns(ns).await;
    }
}

impl Board for EspBoard {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn set_backlight(&mut self, on: bool) {
        self.backlight.set_level(Level::from(on));
    }
}
