//! ESP32-S3 firmware-specific modules for aicu-rs
//!
//! This crate contains the hardware-specific code that cannot compile on
//! desktop targets: the board clock and backlight, the flash-backed settings
//! store, Wi-Fi join and backend login, and the HTTPS batch transport.

#![no_std]

extern crate alloc;

pub mod board;
pub mod flash_store;
pub mod http;
pub mod net;

use core::fmt;

use aicu_core::app_state::short_message;
use aicu_core::config::Settings;

/// Render a `Debug`-only driver error into an `AppError` payload.
pub(crate) fn debug_message<E: fmt::Debug>(error: &E) -> heapless::String<64> {
    struct AsDisplay<'e, E>(&'e E);

    impl<E: fmt::Debug> fmt::Display for AsDisplay<'_, E> {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{:?}", self.0)
        }
    }

    short_message(&AsDisplay(error))
}

/// Settings used when nothing has been saved yet, seeded from the build
/// environment (see `build.rs`).
pub fn factory_settings() -> Settings {
    let mut settings = Settings::default();
    settings.internet.ssid = option_env!("AICU_WIFI_SSID").unwrap_or_default().into();
    settings.internet.password = option_env!("AICU_WIFI_PASSWORD").unwrap_or_default().into();
    settings.account.email = option_env!("AICU_ACCOUNT_EMAIL").unwrap_or_default().into();
    settings.account.password = option_env!("AICU_ACCOUNT_PASSWORD").unwrap_or_default().into();
    settings.account.flow_id = option_env!("AICU_FLOW_ID").unwrap_or_default().into();
    settings
}

/// Backend the firmware talks to.
pub const BASE_URL: &str = match option_env!("AICU_BASE_URL") {
    Some(url) => url,
    None => aicu_core::config::DEFAULT_BASE_URL,
};
