//! Wi-Fi join, backend login and the [`Uplink`] handed to the UI.
//!
//! The UI side ([`EspUplink`]) only signals a connect request and reads an
//! atomic status. [`connection_task`] does the slow work: it configures the
//! station, waits for DHCP, logs in and stores the session token used by the
//! delivery transport. While online it watches the link and reconnects with
//! the last credentials when the access point goes away.

use alloc::string::String;
use core::cell::RefCell;
use core::sync::atomic::{AtomicU8, Ordering};

use aicu_core::app_state::{AppError, LinkStatus, Uplink, short_message};
use aicu_core::config::Settings;
use embassy_futures::select::{Either, select};
use embassy_net::{Runner, Stack};
use embassy_sync::blocking_mutex::Mutex as BlockingMutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::Mutex;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Instant, Timer};
use esp_radio::wifi::{ClientConfig, ModeConfig, WifiController, WifiDevice};
use log::{debug, error, info, warn};

use crate::debug_message;
use crate::http::BackendClient;

const JOIN_TIMEOUT: Duration = Duration::from_secs(15);
const DHCP_TIMEOUT: Duration = Duration::from_secs(15);
const POLL_INTERVAL: Duration = Duration::from_millis(200);
const LINK_CHECK_INTERVAL: Duration = Duration::from_secs(5);

/// Credentials of the latest connect request
pub static CONNECT_REQUEST: Signal<CriticalSectionRawMutex, Credentials> = Signal::new();

/// Bearer token of the current backend session
pub static SESSION: Mutex<CriticalSectionRawMutex, Option<String>> = Mutex::new(None);

static LINK_STATUS: AtomicU8 = AtomicU8::new(0);

/// Credentials the task last worked with
static LAST_CREDENTIALS: BlockingMutex<CriticalSectionRawMutex, RefCell<Option<Credentials>>> =
    BlockingMutex::new(RefCell::new(None));

fn set_status(status: LinkStatus) {
    let raw = match status {
        LinkStatus::Idle => 0,
        LinkStatus::Connecting => 1,
        LinkStatus::Online => 2,
        LinkStatus::Failed => 3,
    };
    LINK_STATUS.store(raw, Ordering::Release);
}

fn status() -> LinkStatus {
    match LINK_STATUS.load(Ordering::Acquire) {
        1 => LinkStatus::Connecting,
        2 => LinkStatus::Online,
        3 => LinkStatus::Failed,
        _ => LinkStatus::Idle,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub ssid: String,
    pub wifi_password: String,
    pub email: String,
    pub password: String,
}

impl From<&Settings> for Credentials {
    fn from(settings: &Settings) -> Self {
        Self {
            ssid: settings.internet.ssid.clone(),
            wifi_password: settings.internet.password.clone(),
            email: settings.account.email.clone(),
            password: settings.account.password.clone(),
        }
    }
}

/// UI-side handle on the connection task.
#[derive(Debug, Default)]
pub struct EspUplink;

impl Uplink for EspUplink {
    fn connect(&mut self, settings: &Settings) {
        let credentials = Credentials::from(settings);
        // already up with the same account, nothing to do
        let same = LAST_CREDENTIALS.lock(|c| c.borrow().as_ref() == Some(&credentials));
        if same && status() == LinkStatus::Online {
            return;
        }
        set_status(LinkStatus::Connecting);
        CONNECT_REQUEST.signal(credentials);
    }

    fn status(&self) -> LinkStatus {
        status()
    }
}

#[embassy_executor::task]
pub async fn net_runner_task(mut runner: Runner<'static, WifiDevice<'static>>) -> ! {
    runner.run().await
}

#[embassy_executor::task]
pub async fn connection_task(mut wifi: WifiController<'static>, stack: Stack<'static>, mut backend: BackendClient) {
    info!("Connection task started");
    let mut current: Option<Credentials> = None;

    loop {
        let credentials = match select(CONNECT_REQUEST.wait(), Timer::after(LINK_CHECK_INTERVAL)).await {
            Either::First(credentials) => credentials,
            Either::Second(()) => match current.as_ref() {
                Some(credentials) if status() == LinkStatus::Online && !wifi.is_connected().unwrap_or(false) => {
                    warn!("Wi-Fi link lost, reconnecting");
                    set_status(LinkStatus::Connecting);
                    credentials.clone()
                }
                _ => continue,
            },
        };

        *SESSION.lock().await = None;
        match establish(&mut wifi, stack, &mut backend, &credentials).await {
            Ok(token) => {
                *SESSION.lock().await = Some(token);
                set_status(LinkStatus::Online);
                info!("Uplink online");
            }
            Err(e) => {
                error!("Uplink failed: {}", e);
                set_status(LinkStatus::Failed);
            }
        }
        LAST_CREDENTIALS.lock(|c| *c.borrow_mut() = Some(credentials.clone()));
        current = Some(credentials);
    }
}

async fn establish(
    wifi: &mut WifiController<'static>,
    stack: Stack<'static>,
    backend: &mut BackendClient,
    credentials: &Credentials,
) -> Result<String, AppError> {
    join(wifi, credentials).await?;
    wait_for_address(stack).await?;

    if credentials.email.is_empty() {
        return Err(AppError::Login(short_message(&"no account configured")));
    }
    info!("Logging in as {}", credentials.email);
    backend.login(&credentials.email, &credentials.password).await
}

async fn join(wifi: &mut WifiController<'static>, credentials: &Credentials) -> Result<(), AppError> {
    if credentials.ssid.is_empty() {
        return Err(AppError::Wifi(short_message(&"no SSID configured")));
    }

    if wifi.is_connected().unwrap_or(false) {
        // best effort
        if let Err(e) = wifi.disconnect() {
            debug!("Disconnect before rejoin failed: {:?}", e);
        }
    }

    let config = ClientConfig::default()
        .with_ssid(credentials.ssid.clone())
        .with_password(credentials.wifi_password.clone());
    wifi.set_config(&ModeConfig::Client(config))
        .map_err(|e| AppError::Wifi(debug_message(&e)))?;

    if !wifi.is_started().unwrap_or(false) {
        wifi.start().map_err(|e| AppError::Wifi(debug_message(&e)))?;
    }

    info!("Joining {}", credentials.ssid);
    wifi.connect().map_err(|e| AppError::Wifi(debug_message(&e)))?;

    let deadline = Instant::now() + JOIN_TIMEOUT;
    while !wifi.is_connected().unwrap_or(false) {
        if Instant::now() > deadline {
            return Err(AppError::Wifi(short_message(&"join timed out")));
        }
        Timer::after(POLL_INTERVAL).await;
    }
    Ok(())
}

async fn wait_for_address(stack: Stack<'static>) -> Result<(), AppError> {
    let deadline = Instant::now() + DHCP_TIMEOUT;
    while !stack.is_config_up() {
        if Instant::now() > deadline {
            return Err(AppError::Wifi(short_message(&"no DHCP lease")));
        }
        Timer::after(POLL_INTERVAL).await;
    }
    if let Some(config) = stack.config_v4() {
        info!("Got IP {}", config.address);
    }
    Ok(())
}
