//! Network connection seam.
//!
//! Joining Wi-Fi and logging in to the backend take seconds, so they never
//! run inside the UI loop. The measurement page only asks for a connection and
//! then polls the status; the platform does the work in its own task.

use crate::config::Settings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStatus {
    /// No connection was requested
    Idle,
    Connecting,
    /// Wi-Fi is up and the backend accepted the login
    Online,
    Failed,
}

pub trait Uplink {
    /// Start connecting with the given credentials. Must not block.
    fn connect(&mut self, settings: &Settings);

    fn status(&self) -> LinkStatus;

    fn is_online(&self) -> bool {
        self.status() == LinkStatus::Online
    }
}

/// Uplink for devices without a radio. Never comes online.
#[derive(Debug, Default)]
pub struct Offline;

impl Uplink for Offline {
    fn connect(&mut self, _settings: &Settings) {}

    fn status(&self) -> LinkStatus {
        LinkStatus::Idle
    }
}
