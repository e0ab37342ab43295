//! Desktop simulator for the aicu-rs measurement device UI.
//!
//! Runs the real aicu-core page manager against an SDL2 window via
//! `embedded-graphics-simulator`. The two device buttons are mapped to the
//! keyboard, sensors are synthetic and finished batches are logged as JSON
//! instead of being posted.
//!
//! # Key bindings
//!
//! | Key          | Action                   |
//! |--------------|--------------------------|
//! | Left / A     | LEFT button              |
//! | Right / D    | RIGHT button             |
//! | Down / S     | both buttons             |
//! | Q / Escape   | Quit                     |
//!
//! Settings survive a simulated restart but not the process.

use std::time::{Duration, Instant};

use embassy_futures::block_on;
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics_simulator::{
    OutputSettingsBuilder, SimulatorDisplay, SimulatorEvent, Window, sdl2::Keycode,
};
use embedded_hal_async::delay::DelayNs;
use log::{debug, info, warn};

use aicu_core::app_state::{AppState, DELIVERY_CHANNEL, LinkStatus, Uplink};
use aicu_core::board::Board;
use aicu_core::config::{MemoryStore, SCREEN_IDLE_MS, Settings, load_or_default};
use aicu_core::input::ButtonLevels;
use aicu_core::pages::{PageManager, PageWrapper, register_default_pages};
use aicu_core::pipeline::{DeliveryTarget, DeliveryTask, Transport};

// ---------------------------------------------------------------------------
// Display constants
// ---------------------------------------------------------------------------

const DISPLAY_WIDTH_PX: u32 = 320;
const DISPLAY_HEIGHT_PX: u32 = 240;

/// Pixel scale factor for the simulator window.
const WINDOW_SCALE: u32 = 2;

/// Target frame duration (~30 FPS).
const FRAME_DURATION: Duration = Duration::from_millis(33);

/// Pretend connection setup time.
const CONNECT_DELAY: Duration = Duration::from_secs(1);

type SimState = AppState<'static, SimulatorDisplay<Rgb565>, MemoryStore, SimUplink>;

// ---------------------------------------------------------------------------
// Platform stand-ins
// ---------------------------------------------------------------------------

/// Host clock; the backlight is only logged.
struct SimBoard {
    backlight: bool,
}

impl DelayNs for SimBoard {
    async fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(Duration::from_nanos(ns as u64));
    }
}

impl Board for SimBoard {
    fn now(&self) -> embassy_time::Instant {
        embassy_time::Instant::now()
    }

    fn set_backlight(&mut self, on: bool) {
        if on != self.backlight {
            info!("Backlight {}", if on { "on" } else { "off" });
            self.backlight = on;
        }
    }
}

/// Comes online a moment after the first connect request.
#[derive(Default)]
struct SimUplink {
    requested_at: Option<Instant>,
}

impl Uplink for SimUplink {
    fn connect(&mut self, settings: &Settings) {
        info!("Connecting as {:?}", settings.account.email);
        self.requested_at.get_or_insert_with(Instant::now);
    }

    fn status(&self) -> LinkStatus {
        match self.requested_at {
            None => LinkStatus::Idle,
            Some(at) if at.elapsed() < CONNECT_DELAY => LinkStatus::Connecting,
            Some(_) => LinkStatus::Online,
        }
    }
}

/// Logs every batch instead of posting it.
struct LogTransport;

impl Transport for LogTransport {
    type Error = core::convert::Infallible;

    async fn send_batch(&mut self, target: &DeliveryTarget, body: &[u8]) -> Result<(), Self::Error> {
        info!(
            "POST flow={} file={}: {}",
            target.flow_id,
            target.filename,
            String::from_utf8_lossy(body)
        );
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Mock sensors
// ---------------------------------------------------------------------------

fn register_mock_sensors(state: &mut SimState) {
    let start = Instant::now();
    let t = move || start.elapsed().as_secs_f64();

    state
        .sensors
        .register("temperature", Rgb565::CSS_ORANGE, true, true, move || {
            let t = t();
            (23.0 + 3.0 * (t / 12.0).sin() + 0.5 * (t / 3.7).cos()) as f32
        })
        .register("humidity", Rgb565::CSS_DEEP_SKY_BLUE, true, true, move || {
            let t = t();
            (50.0 + 10.0 * (t / 18.0).sin() + 2.0 * (t / 2.3).cos()) as f32
        })
        .register("co2", Rgb565::CSS_LIGHT_GREEN, true, false, move || {
            let t = t();
            (600.0 + 200.0 * (t / 30.0).sin() + 30.0 * (t / 4.1).cos()) as f32
        });
}

/// Build a fresh state and page set, as after a power cycle.
fn boot(
    display: SimulatorDisplay<Rgb565>,
    mut store: MemoryStore,
) -> (SimState, PageManager<PageWrapper, SimBoard>) {
    let settings = load_or_default(&mut store, Settings::default());
    let locale = settings.locale;

    let mut state = AppState::new(display, store, SimUplink::default(), settings);
    state.init_batcher(DELIVERY_CHANNEL.sender());
    register_mock_sensors(&mut state);

    let mut pages = PageManager::new(SimBoard { backlight: true }).with_screen_idle(SCREEN_IDLE_MS);
    register_default_pages(
        &mut pages,
        locale,
        Size::new(DISPLAY_WIDTH_PX, DISPLAY_HEIGHT_PX),
        env!("CARGO_PKG_VERSION"),
    );
    if let Err(e) = pages.begin(&mut state) {
        warn!("Could not open the first page: {}", e);
    }
    (state, pages)
}

// ---------------------------------------------------------------------------
// Buttons
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Keys {
    left: bool,
    right: bool,
    both: bool,
}

impl Keys {
    /// Returns `false` for keys that are not buttons.
    fn set(&mut self, keycode: Keycode, down: bool) -> bool {
        let slot = match keycode {
            Keycode::Left | Keycode::A => &mut self.left,
            Keycode::Right | Keycode::D => &mut self.right,
            Keycode::Down | Keycode::S => &mut self.both,
            _ => return false,
        };
        *slot = down;
        true
    }

    fn levels(&self) -> ButtonLevels {
        ButtonLevels::new(self.left || self.both, self.right || self.both)
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() {
    env_logger::init();
    info!("Starting aicu-rs simulator");
    info!(
        "Display: {}×{} (scale {}×)",
        DISPLAY_WIDTH_PX, DISPLAY_HEIGHT_PX, WINDOW_SCALE
    );
    info!("Keys: Left/A=LEFT  Right/D=RIGHT  Down/S=both  Q=Quit");

    let display = SimulatorDisplay::<Rgb565>::new(Size::new(DISPLAY_WIDTH_PX, DISPLAY_HEIGHT_PX));
    let output_settings = OutputSettingsBuilder::new().scale(WINDOW_SCALE).build();
    let mut window = Window::new("aicu Simulator", &output_settings);

    let (mut state, mut pages) = boot(display, MemoryStore::default());
    let mut delivery = DeliveryTask::new(DELIVERY_CHANNEL.receiver(), LogTransport);
    let mut keys = Keys::default();

    // The SDL window is lazily initialized on the first `update()` call.
    // We must call `update()` once before `events()` or it will panic.
    window.update(&state.display);

    // -----------------------------------------------------------------------
    // Main loop
    // -----------------------------------------------------------------------
    'running: loop {
        let frame_start = Instant::now();

        // --- SDL events ---------------------------------------------------
        for event in window.events() {
            match event {
                SimulatorEvent::Quit => break 'running,
                SimulatorEvent::KeyDown { keycode, repeat, .. } => {
                    if keycode == Keycode::Q || keycode == Keycode::Escape {
                        break 'running;
                    }
                    if !repeat && !keys.set(keycode, true) {
                        debug!("Unbound key {:?}", keycode);
                    }
                }
                SimulatorEvent::KeyUp { keycode, .. } => {
                    keys.set(keycode, false);
                }
                _ => {}
            }
        }

        // --- UI tick and delivery -----------------------------------------
        block_on(pages.update(&mut state, keys.levels()));
        block_on(delivery.drain());

        if state.restart_requested() {
            info!("Simulated restart");
            let AppState { display, store, .. } = state;
            (state, pages) = boot(display, store);
        }

        window.update(&state.display);

        // --- Frame pacing -------------------------------------------------
        let elapsed = frame_start.elapsed();
        if elapsed < FRAME_DURATION {
            std::thread::sleep(FRAME_DURATION - elapsed);
        }
    }

    let stats = delivery.stats();
    info!(
        "Simulator exiting ({} batches delivered, {} failed)",
        stats.delivered, stats.failed
    );
}
