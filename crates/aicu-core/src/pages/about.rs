// src/pages/about.rs
//! Static information page. Any button press closes it.

use core::fmt::Debug;

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::text::Text;
use embedded_graphics::mono_font::{MonoTextStyle, ascii::FONT_6X10};

use crate::app_state::{AppState, Uplink};
use crate::config::SettingsStore;
use crate::pages::page::{NavContext, Page};
use crate::ui::{colors, report_draw};

const LINE_HEIGHT_PX: i32 = 14;

pub struct AboutPage {
    version: &'static str,
}

impl AboutPage {
    pub fn new(version: &'static str) -> Self {
        Self { version }
    }

    fn draw<D>(&self, display: &mut D, device_name: &str, locale: crate::config::Locale) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        display.clear(colors::BACKGROUND)?;
        let style = MonoTextStyle::new(&FONT_6X10, colors::TEXT);
        let lines = [
            "aicu",
            self.version,
            device_name,
            locale.en_de("Sends sensor data to Aicuflow.", "Sendet Sensordaten an Aicuflow."),
            locale.en_de("Press any button to go back.", "Taste druecken fuer zurueck."),
        ];
        let mut y = 2 * LINE_HEIGHT_PX;
        for line in lines {
            Text::new(line, Point::new(10, y), style).draw(display)?;
            y += LINE_HEIGHT_PX;
        }
        Ok(())
    }
}

impl<'a, D, S, U> Page<AppState<'a, D, S, U>> for AboutPage
where
    D: DrawTarget<Color = Rgb565>,
    D::Error: Debug,
    S: SettingsStore,
    U: Uplink,
{
    fn on_open(&mut self, shared: &mut AppState<'a, D, S, U>, _cx: &mut NavContext) {
        let result = self.draw(
            &mut shared.display,
            &shared.settings.device_name,
            shared.settings.locale,
        );
        report_draw("about", result);
    }

    fn on_update(&mut self, _shared: &mut AppState<'a, D, S, U>, cx: &mut NavContext) {
        if cx.buttons().any() {
            cx.return_to_previous();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::ButtonLevels;
    use crate::pages::NavRequest;
    use crate::testing::{app_state, nav};

    #[test]
    fn test_any_button_closes() {
        let mut state = app_state();
        let mut page = AboutPage::new("0.1.0");
        page.on_open(&mut state, &mut nav(0, ButtonLevels::RELEASED));
        assert!(state.display.pixels_drawn > 0);

        let mut idle = nav(10, ButtonLevels::RELEASED);
        page.on_update(&mut state, &mut idle);
        assert_eq!(idle.request(), None);

        let mut pressed = nav(20, ButtonLevels::new(false, true));
        page.on_update(&mut state, &mut pressed);
        assert_eq!(pressed.request(), Some(NavRequest::ReturnToPrevious));
    }
}
