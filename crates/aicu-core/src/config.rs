// src/config.rs
//! Compile-time defaults and the persisted user settings.
//!
//! Timing thresholds live in small `Copy` structs with a `Default` so that
//! tests can tighten them without touching the constants. User settings are a
//! serde struct encoded with postcard into a single blob; where that blob is
//! kept is up to the [`SettingsStore`] implementation.

use alloc::string::String;
use alloc::vec::Vec;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::app_state::{AppError, short_message};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Sampling period of the measurement page
pub const MEASURE_PERIOD_MS: u32 = 100;

/// Records per batch handed to the delivery task
pub const POINTS_BATCH_SIZE: usize = 32;

/// Batches that may wait for delivery before new ones are dropped
pub const DELIVERY_QUEUE_CAPACITY: usize = 8;

/// Backlight switches off after this much time without input (0 disables)
pub const SCREEN_IDLE_MS: u32 = 60_000;

/// Input is ignored for this long after a page with `block_input_on_open` opens
pub const INPUT_BLOCK_ON_OPEN_MS: u32 = 300;

/// Sleep between polls while input is blocked
pub const BLOCKED_POLL_SLEEP_MS: u32 = 20;

/// Update throttle applied to pages registered with the default config
pub const DEFAULT_UPDATE_DELAY_MS: u16 = 20;

/// Backend used when nothing else is configured
pub const DEFAULT_BASE_URL: &str = "https://prod-backend.aicuflow.com";

// ---------------------------------------------------------------------------
// Timing
// ---------------------------------------------------------------------------

/// Thresholds of the two-button tap / confirm recogniser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GestureTiming {
    /// Quiet period after a fired tap
    pub debounce_ms: u32,
    /// Shortest press that counts as a tap
    pub min_tap_ms: u32,
    /// Presses this long or longer are ignored
    pub max_tap_ms: u32,
    /// Both buttons must be held this long to confirm
    pub confirm_hold_ms: u32,
    /// All input is ignored this long after a confirm gesture ends
    pub settle_ms: u32,
}

impl Default for GestureTiming {
    fn default() -> Self {
        Self {
            debounce_ms: 200,
            min_tap_ms: 50,
            max_tap_ms: 500,
            confirm_hold_ms: 150,
            settle_ms: 150,
        }
    }
}

/// Thresholds of the hold-both-to-exit gesture on the measurement page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LongPressTiming {
    /// The second button has to join the first within this window
    pub join_window_ms: u32,
    /// Both buttons held at least this long
    pub hold_ms: u32,
    /// The second release has to follow the first within this window
    pub release_window_ms: u32,
}

impl Default for LongPressTiming {
    fn default() -> Self {
        Self {
            join_window_ms: 400,
            hold_ms: 3_000,
            release_window_ms: 400,
        }
    }
}

/// Sampling cadence and batch sizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    pub period_ms: u32,
    pub batch_size: usize,
}

impl PipelineConfig {
    pub fn period_us(&self) -> u32 {
        self.period_ms.saturating_mul(1_000)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            period_ms: MEASURE_PERIOD_MS,
            batch_size: POINTS_BATCH_SIZE,
        }
    }
}

// ---------------------------------------------------------------------------
// Locale
// ---------------------------------------------------------------------------

/// UI language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Locale {
    #[default]
    En,
    De,
}

impl Locale {
    /// Pick the text matching this locale.
    pub fn en_de(self, en: &'static str, de: &'static str) -> &'static str {
        match self {
            Locale::En => en,
            Locale::De => de,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Locale::En => Locale::De,
            Locale::De => Locale::En,
        }
    }
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InternetConfig {
    pub ssid: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AccountConfig {
    pub email: String,
    pub password: String,
    pub flow_id: String,
}

/// Everything the user can change on the device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub device_name: String,
    pub stream_file_name: String,
    pub internet: InternetConfig,
    pub account: AccountConfig,
    pub locale: Locale,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            device_name: String::from("aicu-device"),
            stream_file_name: String::from("measurements"),
            internet: InternetConfig::default(),
            account: AccountConfig::default(),
            locale: Locale::default(),
        }
    }
}

impl Settings {
    pub fn to_bytes(&self) -> Result<Vec<u8>, AppError> {
        postcard::to_allocvec(self).map_err(|e| AppError::Settings(short_message(&e)))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, AppError> {
        postcard::from_bytes(bytes).map_err(|e| AppError::Settings(short_message(&e)))
    }

    pub fn field(&self, field: SettingsField) -> &str {
        match field {
            SettingsField::DeviceName => &self.device_name,
            SettingsField::StreamFileName => &self.stream_file_name,
            SettingsField::WifiSsid => &self.internet.ssid,
            SettingsField::WifiPassword => &self.internet.password,
            SettingsField::AccountEmail => &self.account.email,
            SettingsField::AccountPassword => &self.account.password,
            SettingsField::FlowId => &self.account.flow_id,
        }
    }

    pub fn set_field(&mut self, field: SettingsField, value: String) {
        let slot = match field {
            SettingsField::DeviceName => &mut self.device_name,
            SettingsField::StreamFileName => &mut self.stream_file_name,
            SettingsField::WifiSsid => &mut self.internet.ssid,
            SettingsField::WifiPassword => &mut self.internet.password,
            SettingsField::AccountEmail => &mut self.account.email,
            SettingsField::AccountPassword => &mut self.account.password,
            SettingsField::FlowId => &mut self.account.flow_id,
        };
        *slot = value;
    }
}

/// Text settings editable with the on-screen keyboard.
///
/// The discriminant doubles as the page context passed to the keyboard page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum SettingsField {
    DeviceName = 1,
    StreamFileName = 2,
    WifiSsid = 3,
    WifiPassword = 4,
    AccountEmail = 5,
    AccountPassword = 6,
    FlowId = 7,
}

impl SettingsField {
    pub const ALL: [SettingsField; 7] = [
        SettingsField::DeviceName,
        SettingsField::StreamFileName,
        SettingsField::WifiSsid,
        SettingsField::WifiPassword,
        SettingsField::AccountEmail,
        SettingsField::AccountPassword,
        SettingsField::FlowId,
    ];

    pub fn from_context(context: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.context() == context)
    }

    pub fn context(self) -> u32 {
        self as u32
    }

    /// Keyboard title for this field.
    pub fn title(self, locale: Locale) -> &'static str {
        match self {
            SettingsField::DeviceName => locale.en_de("Device Name", "Geraetename"),
            SettingsField::StreamFileName => locale.en_de("File Name", "Dateiname"),
            SettingsField::WifiSsid => "WiFi SSID",
            SettingsField::WifiPassword => locale.en_de("WiFi Password", "WLAN Passwort"),
            SettingsField::AccountEmail => "Aicuflow Mail",
            SettingsField::AccountPassword => locale.en_de("Aicuflow Password", "Aicuflow Passwort"),
            SettingsField::FlowId => "Flow ID",
        }
    }
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

/// Non-volatile home of the [`Settings`] blob.
pub trait SettingsStore {
    /// `Ok(None)` when nothing has been saved yet.
    fn load(&mut self) -> Result<Option<Settings>, AppError>;

    fn save(&mut self, settings: &Settings) -> Result<(), AppError>;

    /// Forget the saved settings (factory reset).
    fn clear(&mut self) -> Result<(), AppError>;
}

/// Load the saved settings, falling back to `defaults` when there are none or
/// they cannot be decoded.
pub fn load_or_default<S: SettingsStore>(store: &mut S, defaults: Settings) -> Settings {
    match store.load() {
        Ok(Some(settings)) => {
            info!("Loaded settings for {}", settings.device_name);
            settings
        }
        Ok(None) => {
            info!("No saved settings, using defaults");
            defaults
        }
        Err(e) => {
            warn!("Failed to load settings: {:?}", e);
            defaults
        }
    }
}

/// Keeps the encoded blob in RAM. Used by the simulator and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    blob: Option<Vec<u8>>,
    pub saves: usize,
}

impl SettingsStore for MemoryStore {
    fn load(&mut self) -> Result<Option<Settings>, AppError> {
        self.blob.as_deref().map(Settings::from_bytes).transpose()
    }

    fn save(&mut self, settings: &Settings) -> Result<(), AppError> {
        self.blob = Some(settings.to_bytes()?);
        self.saves += 1;
        Ok(())
    }

    fn clear(&mut self) -> Result<(), AppError> {
        self.blob = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_field_contexts() {
        for (i, field) in SettingsField::ALL.iter().enumerate() {
            assert_eq!(field.context(), i as u32 + 1);
            assert_eq!(SettingsField::from_context(i as u32 + 1), Some(*field));
        }
        assert_eq!(SettingsField::from_context(0), None);
        assert_eq!(SettingsField::from_context(8), None);
    }

    #[test]
    fn test_set_field_targets_the_right_setting() {
        let mut settings = Settings::default();
        settings.set_field(SettingsField::FlowId, String::from("flow-42"));
        settings.set_field(SettingsField::WifiSsid, String::from("lab"));

        assert_eq!(settings.account.flow_id, "flow-42");
        assert_eq!(settings.internet.ssid, "lab");
        assert_eq!(settings.field(SettingsField::FlowId), "flow-42");
        assert_eq!(settings.field(SettingsField::DeviceName), "aicu-device");
    }

    #[test]
    fn test_memory_store_persists_settings() {
        let mut store = MemoryStore::default();
        assert_eq!(store.load().unwrap(), None);

        let mut settings = Settings::default();
        settings.locale = Locale::De;
        settings.account.email = String::from("me@example.com");
        store.save(&settings).unwrap();

        assert_eq!(load_or_default(&mut store, Settings::default()), settings);

        store.clear().unwrap();
        assert_eq!(load_or_default(&mut store, Settings::default()), Settings::default());
    }

    #[test]
    fn test_corrupt_blob_falls_back_to_defaults() {
        let mut store = MemoryStore {
            blob: Some(alloc::vec![0xFF, 0xFF, 0xFF]),
            saves: 0,
        };
        assert!(store.load().is_err());
        assert_eq!(load_or_default(&mut store, Settings::default()), Settings::default());
    }

    #[test]
    fn test_locale_text() {
        assert_eq!(Locale::En.en_de("Back", "Zurueck"), "Back");
        assert_eq!(Locale::De.en_de("Back", "Zurueck"), "Zurueck");
        assert_eq!(Locale::En.toggled(), Locale::De);
    }
}
