//! Application-wide state and error types for aicu

mod uplink;

pub use uplink::*;

use core::fmt::{self, Write};

use embassy_sync::channel::Channel;
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use log::{info, warn};
use thiserror_no_std::Error;

use crate::config::{PipelineConfig, Settings, SettingsStore};
use crate::pipeline::batcher::{BatchAccumulator, BatchSender, DeliveryChannel};
use crate::pipeline::delivery::DeliveryTarget;
use crate::sensors::SensorRegistry;

/// Global queue between the sampling loop and the delivery task
pub static DELIVERY_CHANNEL: DeliveryChannel = Channel::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppRunState {
    Uninitialized,
    Menu,
    Measuring,
    /// A restart was requested (language change, factory reset, menu entry)
    RestartPending,
}

/// Main application state container
///
/// Owned by the UI loop and handed to every page callback. Holds the display,
/// the user settings and their store, the network uplink, the sensors and the
/// sample batcher.
pub struct AppState<'a, D, S, U>
where
    D: DrawTarget<Color = Rgb565>,
    S: SettingsStore,
    U: Uplink,
{
    pub display: D,
    pub settings: Settings,
    pub store: S,
    pub uplink: U,
    pub sensors: SensorRegistry,
    pub pipeline: PipelineConfig,
    pub run_state: AppRunState,
    pub batcher: Option<BatchAccumulator<'a>>,
}

impl<'a, D, S, U> AppState<'a, D, S, U>
where
    D: DrawTarget<Color = Rgb565>,
    S: SettingsStore,
    U: Uplink,
{
    pub fn new(display: D, store: S, uplink: U, settings: Settings) -> Self {
        Self {
            display,
            settings,
            store,
            uplink,
            sensors: SensorRegistry::new(),
            pipeline: PipelineConfig::default(),
            run_state: AppRunState::Uninitialized,
            batcher: None,
        }
    }

    /// Initialize the batcher with a sender onto the delivery queue
    pub fn init_batcher(&mut self, sender: BatchSender<'a>) {
        self.batcher = Some(BatchAccumulator::new(sender, self.pipeline.batch_size));
    }

    /// Where batches produced with the current settings are delivered
    pub fn delivery_target(&self) -> DeliveryTarget {
        DeliveryTarget::new(&self.settings.account.flow_id, &self.settings.stream_file_name)
    }

    /// Persist the current settings; failures are logged and otherwise ignored
    pub fn save_settings(&mut self) {
        match self.store.save(&self.settings) {
            Ok(()) => info!("Settings saved"),
            Err(e) => warn!("Failed to save settings: {:?}", e),
        }
    }

    /// Wipe the saved settings and schedule a restart
    pub fn factory_reset(&mut self) {
        if let Err(e) = self.store.clear() {
            warn!("Failed to clear settings: {:?}", e);
        }
        self.settings = Settings::default();
        self.request_restart();
    }

    pub fn request_restart(&mut self) {
        info!("Restart requested");
        self.run_state = AppRunState::RestartPending;
    }

    pub fn restart_requested(&self) -> bool {
        self.run_state == AppRunState::RestartPending
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("WiFi connection failed: {0}")]
    Wifi(heapless::String<64>),
    #[error("Login failed: {0}")]
    Login(heapless::String<64>),
    #[error("Settings storage error: {0}")]
    Storage(heapless::String<64>),
    #[error("Settings codec error: {0}")]
    Settings(heapless::String<64>),
    #[error("Delivery failed: {0}")]
    Delivery(heapless::String<64>),
    #[error("Unknown error")]
    Unknown,
}

/// Render `value` into an error payload, cutting it off at 64 bytes.
pub fn short_message(value: &dyn fmt::Display) -> heapless::String<64> {
    struct Truncating<'a>(&'a mut heapless::String<64>);

    impl Write for Truncating<'_> {
        fn write_str(&mut self, s: &str) -> fmt::Result {
            for c in s.chars() {
                if self.0.push(c).is_err() {
                    break;
                }
            }
            Ok(())
        }
    }

    let mut out = heapless::String::new();
    let _ = write!(Truncating(&mut out), "{}", value);
    out
}
