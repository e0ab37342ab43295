// src/pages/measure.rs
//! Measurement page.
//!
//! Samples every enabled sensor on a fixed period, plots the graphed channels
//! and, while the uplink is online, feeds the records into the batcher. The
//! page never waits for the network: batches leave through the delivery queue
//! and the connection itself is driven by the platform's [`Uplink`].
//!
//! Holding both buttons for three seconds and releasing them returns to the
//! previous page.

use core::fmt::{Debug, Write};

use embedded_graphics::mono_font::{MonoTextStyle, ascii::FONT_6X10};
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};
use embedded_graphics::text::{Baseline, Text};
use log::{info, warn};

use crate::app_state::{AppRunState, AppState, LinkStatus, Uplink};
use crate::config::{Locale, SettingsStore};
use crate::input::LongPressExit;
use crate::pages::page::{NavContext, Page};
use crate::pipeline::FixedPeriodScheduler;
use crate::sensors::SensorRegistry;
use crate::ui::menu_view::centered_text;
use crate::ui::{GraphStack, colors, report_draw};

const HEADER_HEIGHT_PX: u32 = 30;
const STATUS_HEIGHT_PX: u32 = 16;
const READING_HEIGHT_PX: i32 = 12;
const INSET_PX: i32 = 10;

pub struct MeasurePage {
    screen: Size,
    scheduler: FixedPeriodScheduler,
    exit: LongPressExit,
    graphs: GraphStack,
    link: LinkStatus,
    dropped: u32,
}

impl MeasurePage {
    pub fn new(screen: Size) -> Self {
        Self {
            screen,
            scheduler: FixedPeriodScheduler::new(0),
            exit: LongPressExit::default(),
            graphs: GraphStack::default(),
            link: LinkStatus::Idle,
            dropped: 0,
        }
    }

    pub fn graphs(&self) -> &GraphStack {
        &self.graphs
    }

    fn draw_frame<D>(&self, display: &mut D, locale: Locale) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        display.clear(colors::BACKGROUND)?;
        Rectangle::new(Point::zero(), Size::new(self.screen.width, HEADER_HEIGHT_PX))
            .into_styled(PrimitiveStyle::with_fill(colors::BAR))
            .draw(display)?;
        centered_text(
            display,
            locale.en_de("Measuring", "Messung"),
            Point::new(self.screen.width as i32 / 2, HEADER_HEIGHT_PX as i32 / 2),
            colors::TEXT,
        )?;
        self.draw_status(display, locale)
    }

    fn draw_status<D>(&self, display: &mut D, locale: Locale) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        let top = HEADER_HEIGHT_PX as i32;
        Rectangle::new(Point::new(0, top), Size::new(self.screen.width, STATUS_HEIGHT_PX))
            .into_styled(PrimitiveStyle::with_fill(colors::BACKGROUND))
            .draw(display)?;

        let (text, color) = match self.link {
            LinkStatus::Idle => (locale.en_de("Offline", "Offline"), colors::PENDING),
            LinkStatus::Connecting => (locale.en_de("Connecting...", "Verbinde..."), colors::PENDING),
            LinkStatus::Online => (locale.en_de("Online, sending data", "Online, sende Daten"), colors::OK),
            LinkStatus::Failed => (locale.en_de("Connection failed", "Verbindung fehlgeschlagen"), colors::ERROR),
        };
        let style = MonoTextStyle::new(&FONT_6X10, color);
        Text::with_baseline(text, Point::new(INSET_PX, top + 3), style, Baseline::Top).draw(display)?;
        Ok(())
    }

    /// Latest value of every enabled channel, between status line and graphs.
    fn draw_readings<D>(&self, display: &mut D, sensors: &SensorRegistry) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        let top = (HEADER_HEIGHT_PX + STATUS_HEIGHT_PX) as i32;
        let bottom = self.graphs.top(self.screen);
        let rows = ((bottom - top) / READING_HEIGHT_PX).max(0) as usize;

        let mut y = top;
        for sensor in sensors.iter().filter(|s| s.enabled).take(rows) {
            Rectangle::new(Point::new(0, y), Size::new(self.screen.width, READING_HEIGHT_PX as u32))
                .into_styled(PrimitiveStyle::with_fill(colors::BACKGROUND))
                .draw(display)?;

            let mut line: heapless::String<48> = heapless::String::new();
            // too long for the buffer only for absurd keys
            let _ = write!(line, "{}: {:.2}", sensor.key, sensor.value());
            let style = MonoTextStyle::new(&FONT_6X10, sensor.color);
            Text::with_baseline(&line, Point::new(INSET_PX, y), style, Baseline::Top).draw(display)?;
            y += READING_HEIGHT_PX;
        }
        Ok(())
    }
}

impl<'a, D, S, U> Page<AppState<'a, D, S, U>> for MeasurePage
where
    D: DrawTarget<Color = Rgb565>,
    D::Error: Debug,
    S: SettingsStore,
    U: Uplink,
{
    fn on_open(&mut self, shared: &mut AppState<'a, D, S, U>, _cx: &mut NavContext) {
        info!("Measurement started");
        shared.run_state = AppRunState::Measuring;
        self.exit.reset();
        self.scheduler = FixedPeriodScheduler::new(shared.pipeline.period_us());

        if shared.sensors.enabled_count() == 0 {
            warn!("No sensors enabled, nothing will be recorded");
        }

        let target = shared.delivery_target();
        let device_id = shared.settings.device_name.clone();
        match shared.batcher.as_mut() {
            Some(batcher) => {
                batcher.retarget(&device_id, target);
                self.dropped = batcher.dropped_batches();
            }
            None => warn!("No batcher configured, records will not be delivered"),
        }

        shared.uplink.connect(&shared.settings);
        self.link = shared.uplink.status();

        self.graphs = GraphStack::layout(self.screen, shared.sensors.graph_channels());
        let locale = shared.settings.locale;
        report_draw("measure", self.draw_frame(&mut shared.display, locale));
    }

    fn on_update(&mut self, shared: &mut AppState<'a, D, S, U>, cx: &mut NavContext) {
        let now = cx.now();
        if self.exit.poll(cx.buttons(), now) {
            info!("Measurement stopped");
            // the partial batch still belongs to this session's target
            if let Some(batcher) = shared.batcher.as_mut() {
                batcher.flush();
            }
            cx.return_to_previous();
            return;
        }

        let link = shared.uplink.status();
        if link != self.link {
            info!("Uplink {:?}", link);
            self.link = link;
            report_draw("status", self.draw_status(&mut shared.display, shared.settings.locale));
        }

        // wraps every ~71 minutes, the scheduler compares wrapped values
        if !self.scheduler.poll(now.as_micros() as u32) {
            return;
        }
        shared.sensors.measure(now.as_millis());

        if cx.screen_awake() {
            report_draw(
                "graphs",
                self.graphs.update(&mut shared.display, shared.sensors.graph_channels()),
            );
            report_draw("readings", self.draw_readings(&mut shared.display, &shared.sensors));
        }

        if link != LinkStatus::Online || shared.sensors.enabled_count() == 0 {
            return;
        }
        let record = shared.sensors.record();
        if let Some(batcher) = shared.batcher.as_mut() {
            batcher.push(record);
            let dropped = batcher.dropped_batches();
            if dropped != self.dropped {
                self.dropped = dropped;
                warn!("{} batches dropped since boot", dropped);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::ButtonLevels;
    use crate::pages::NavRequest;
    use crate::pipeline::DeliveryChannel;
    use crate::testing::{TestState, app_state, nav};
    use embassy_sync::channel::Channel;

    const NONE: ButtonLevels = ButtonLevels::RELEASED;

    fn state(channel: &DeliveryChannel) -> TestState<'_> {
        let mut state = app_state();
        state.pipeline.batch_size = 2;
        state.init_batcher(channel.sender());
        state.settings.device_name = "dev-1".into();
        state.settings.account.flow_id = "flow".into();
        state.settings.stream_file_name = "stream".into();
        state
            .sensors
            .register("temp", Rgb565::RED, true, true, || 21.5_f32)
            .register("hum", Rgb565::BLUE, true, false, || 40.0_f32);
        state
    }

    fn run(page: &mut MeasurePage, state: &mut TestState<'_>, from: u64, to: u64) {
        for ms in (from..to).step_by(10) {
            page.on_update(state, &mut nav(ms, NONE));
        }
    }

    #[test]
    fn test_open_connects_and_lays_out_graphs() {
        let channel = DeliveryChannel::new();
        let mut state = state(&channel);
        let mut page = MeasurePage::new(Size::new(320, 240));
        page.on_open(&mut state, &mut nav(0, NONE));

        assert_eq!(state.uplink.connects, 1);
        assert_eq!(state.run_state, AppRunState::Measuring);
        assert_eq!(page.graphs().len(), 1);
        assert!(page.graphs().graph("temp").is_some());
    }

    #[test]
    fn test_samples_on_period_and_queues_tagged_batches() {
        let channel = DeliveryChannel::new();
        let mut state = state(&channel);
        let mut page = MeasurePage::new(Size::new(320, 240));
        page.on_open(&mut state, &mut nav(0, NONE));

        // ticks at 0 and 100 ms fill one batch, 200 ms starts the next
        run(&mut page, &mut state, 0, 250);
        let batch = channel.try_receive().unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.device_id, "dev-1");
        assert_eq!(batch.target.flow_id, "flow");
        assert_eq!(batch.target.filename, "stream");
        assert_eq!(batch.records[1].timestamp_ms, 100);
        assert!(channel.try_receive().is_err());
        assert_eq!(state.batcher.as_ref().unwrap().len(), 1);
    }

    #[test]
    fn test_offline_records_nothing() {
        let channel = Channel::new();
        let mut state = state(&channel);
        state.uplink.status = LinkStatus::Connecting;
        let mut page = MeasurePage::new(Size::new(320, 240));
        page.on_open(&mut state, &mut nav(0, NONE));

        run(&mut page, &mut state, 0, 1_000);
        assert!(state.batcher.as_ref().unwrap().is_empty());
        assert!(channel.try_receive().is_err());
        // sampling itself keeps going
        assert_eq!(state.sensors.timestamp_ms(), 900);
    }

    #[test]
    fn test_long_press_returns_once() {
        let channel = DeliveryChannel::new();
        let mut state = state(&channel);
        let mut page = MeasurePage::new(Size::new(320, 240));
        page.on_open(&mut state, &mut nav(0, NONE));

        let mut requests = 0;
        let script = [
            (ButtonLevels::new(true, true), 0, 3_200),
            (ButtonLevels::new(false, true), 3_200, 3_400),
            (NONE, 3_400, 4_000),
        ];
        for (levels, from, to) in script {
            for ms in (from..to).step_by(10) {
                let mut cx = nav(ms, levels);
                page.on_update(&mut state, &mut cx);
                if cx.request() == Some(NavRequest::ReturnToPrevious) {
                    requests += 1;
                    // the partial batch left with the exit
                    assert!(state.batcher.as_ref().unwrap().is_empty());
                }
            }
        }
        assert_eq!(requests, 1);
    }
}
