#![no_std]
#![no_main]
#![deny(
    clippy::mem_forget,
    reason = "mem::forget is generally not safe to do with esp_hal types, especially those \
    holding buffers for the duration of a data transfer."
)]
#![deny(clippy::large_stack_frames)]

use aicu_core::app_state::{AppState, DELIVERY_CHANNEL};
use aicu_core::config::{SCREEN_IDLE_MS, load_or_default};
use aicu_core::input::ButtonPair;
use aicu_core::pages::{PageManager, register_default_pages};
use aicu_core::pipeline::DeliveryTask;
use aicu_firmware::board::EspBoard;
use aicu_firmware::flash_store::FlashSettingsStore;
use aicu_firmware::http::{BackendClient, HttpTransport};
use aicu_firmware::net::{EspUplink, connection_task, net_runner_task};
use aicu_firmware::{BASE_URL, factory_settings};
use embassy_executor::Spawner;
use embassy_net::StackResources;
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use esp_hal::clock::CpuClock;
use esp_hal::gpio::{Input, InputConfig, Level, Output, OutputConfig, Pull};
use esp_hal::interrupt::software::SoftwareInterruptControl;
use esp_hal::rng::Rng;
use esp_hal::system::Stack;
use esp_hal::timer::timg::TimerGroup;
use esp_radio::Controller;
use esp_radio::wifi::{WifiController, WifiDevice};
use esp_rtos::embassy::Executor;
use esp_storage::FlashStorage;
use log::{LevelFilter, info};
use static_cell::StaticCell;

use embedded_hal_bus::spi::ExclusiveDevice;
use esp_hal::spi::master::{Config, Spi};
use mipidsi::interface::SpiInterface;
use mipidsi::{Builder as MipidsiBuilder, models::ILI9342CRgb565};

const DISPLAY_WIDTH: u16 = 320;
const DISPLAY_HEIGHT: u16 = 240;
/// Pixel bytes batched per SPI write
const DISPLAY_SPI_BUFFER_LEN: usize = 64;
const APP_CORE_STACK_LEN: usize = 16 * 1024;

#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    rtt_target::rprintln!("PANIC: {}", info);
    loop {}
}

extern crate alloc;

// This creates a default app-descriptor required by the esp-idf bootloader.
// For more information see: <https://docs.espressif.com/projects/esp-idf/en/stable/esp32/api-reference/system/app_image_format.html#application-description>
esp_bootloader_esp_idf::esp_app_desc!();

static RADIO: StaticCell<Controller<'static>> = StaticCell::new();
static STACK_RESOURCES: StaticCell<StackResources<4>> = StaticCell::new();
static APP_CORE_STACK: StaticCell<Stack<APP_CORE_STACK_LEN>> = StaticCell::new();
static APP_CORE_EXECUTOR: StaticCell<Executor> = StaticCell::new();

#[embassy_executor::task]
async fn delivery_task(mut task: DeliveryTask<'static, HttpTransport>) -> ! {
    task.run().await
}

/// Spawns the network and delivery tasks on the app core executor.
fn start_network(spawner: Spawner, wifi: WifiController<'static>, device: WifiDevice<'static>, seed: u64) {
    let (stack, runner) = embassy_net::new(
        device,
        embassy_net::Config::dhcpv4(Default::default()),
        STACK_RESOURCES.init(StackResources::new()),
        seed,
    );

    spawner.spawn(net_runner_task(runner)).ok();
    spawner
        .spawn(connection_task(wifi, stack, BackendClient::new(stack, BASE_URL, seed ^ 0x5EED)))
        .ok();
    spawner
        .spawn(delivery_task(DeliveryTask::new(
            DELIVERY_CHANNEL.receiver(),
            HttpTransport::new(BackendClient::new(stack, BASE_URL, seed.rotate_left(17))),
        )))
        .ok();
}

#[allow(
    clippy::large_stack_frames,
    reason = "it's not unusual to allocate larger buffers etc. in main"
)]
#[esp_rtos::main]
async fn main(_spawner: Spawner) -> ! {
    rtt_target::rtt_init_print!();
    rtt_target::init_logger_with_level(LevelFilter::Info);

    let config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(config);

    esp_alloc::heap_allocator!(#[esp_hal::ram(reclaimed)] size: 73744);
    // TLS buffers and batches live in PSRAM
    esp_alloc::psram_allocator!(&peripherals.PSRAM, esp_hal::psram);

    let timg0 = TimerGroup::new(peripherals.TIMG0);
    let sw_int = SoftwareInterruptControl::new(peripherals.SW_INTERRUPT);
    esp_rtos::start(timg0.timer0);

    info!("Embassy initialized!");

    // Settings
    let mut store = FlashSettingsStore::new(FlashStorage::new(peripherals.FLASH));
    let settings = load_or_default(&mut store, factory_settings());

    // Network
    let rng = Rng::new();
    let seed = (rng.random() as u64) << 32 | rng.random() as u64;

    let radio = RADIO.init(esp_radio::init().expect("Failed to initialize Wi-Fi/BLE controller"));
    let (wifi_controller, interfaces) = esp_radio::wifi::new(radio, peripherals.WIFI, Default::default())
        .expect("Failed to initialize Wi-Fi controller");
    let sta = interfaces.sta;

    // UI on the main core, network and delivery on the app core
    esp_rtos::start_second_core(
        peripherals.CPU_CTRL,
        sw_int.software_interrupt0,
        sw_int.software_interrupt1,
        APP_CORE_STACK.init(Stack::new()),
        move || {
            let executor = APP_CORE_EXECUTOR.init(Executor::new());
            executor.run(|spawner| start_network(spawner, wifi_controller, sta, seed));
        },
    );

    info!("Network started on the app core");

    // ILI9342C panel on SPI2, write-only with a manual CS line
    let spi_bus = Spi::new(peripherals.SPI2, Config::default())
        .expect("Failed to configure SPI2")
        .with_sck(peripherals.GPIO36)
        .with_mosi(peripherals.GPIO37);
    let cs = Output::new(peripherals.GPIO35, Level::High, OutputConfig::default());
    let spi_device = ExclusiveDevice::new_no_delay(spi_bus, cs).expect("Failed to claim display CS");
    let dc = Output::new(peripherals.GPIO34, Level::Low, OutputConfig::default());

    let mut spi_buffer = [0u8; DISPLAY_SPI_BUFFER_LEN];
    let display = MipidsiBuilder::new(ILI9342CRgb565, SpiInterface::new(spi_device, dc, &mut spi_buffer))
        .display_size(DISPLAY_WIDTH, DISPLAY_HEIGHT)
        .init(&mut embassy_time::Delay)
        .expect("Failed to initialize display");

    info!("Display initialized!");

    let backlight = Output::new(peripherals.GPIO38, Level::High, OutputConfig::default());
    let button_config = InputConfig::default().with_pull(Pull::Up);
    let mut buttons = ButtonPair::new(
        Input::new(peripherals.GPIO0, button_config),
        Input::new(peripherals.GPIO14, button_config),
    );

    let locale = settings.locale;
    let mut state = AppState::new(display, store, EspUplink, settings);
    state.init_batcher(DELIVERY_CHANNEL.sender());
    state
        .sensors
        .register("uptime_s", Rgb565::CSS_ORANGE, true, true, || {
            embassy_time::Instant::now().as_millis() as f32 / 1000.0
        })
        .register("heap_free", Rgb565::CSS_LIGHT_GREEN, true, true, || {
            esp_alloc::HEAP.free() as f32
        });

    let screen = Size::new(DISPLAY_WIDTH as u32, DISPLAY_HEIGHT as u32);
    let mut pages = PageManager::new(EspBoard::new(backlight)).with_screen_idle(SCREEN_IDLE_MS);
    register_default_pages(&mut pages, locale, screen, env!("CARGO_PKG_VERSION"));
    pages.begin(&mut state).expect("No default page registered");

    loop {
        pages.update(&mut state, buttons.read()).await;
        if state.restart_requested() {
            info!("Restarting");
            esp_hal::system::software_reset();
        }
        embassy_futures::yield_now().await;
    }
}
