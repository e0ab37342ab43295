// src/pages/keyboard.rs
//! Text entry page for one settings field.
//!
//! The page context selects the [`SettingsField`]. Confirming writes the text
//! back, saves the settings and returns to the page that opened the keyboard.

use core::fmt::Debug;

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use log::{info, warn};

use crate::app_state::{AppState, Uplink};
use crate::config::{INPUT_BLOCK_ON_OPEN_MS, SettingsField, SettingsStore};
use crate::input::{GestureRecognizer, NavEvent};
use crate::pages::page::{NavContext, Page};
use crate::ui::{KeyOutcome, Keyboard, KeyboardView, report_draw};

pub struct KeyboardPage {
    keyboard: Keyboard,
    view: KeyboardView,
    gestures: GestureRecognizer,
    field: Option<SettingsField>,
}

impl KeyboardPage {
    pub fn new(screen: Size) -> Self {
        Self {
            keyboard: Keyboard::new(),
            view: KeyboardView::new(screen),
            gestures: GestureRecognizer::default(),
            field: None,
        }
    }

    pub fn field(&self) -> Option<SettingsField> {
        self.field
    }

    pub fn keyboard(&self) -> &Keyboard {
        &self.keyboard
    }
}

impl<'a, D, S, U> Page<AppState<'a, D, S, U>> for KeyboardPage
where
    D: DrawTarget<Color = Rgb565>,
    D::Error: Debug,
    S: SettingsStore,
    U: Uplink,
{
    fn on_open(&mut self, shared: &mut AppState<'a, D, S, U>, cx: &mut NavContext) {
        self.gestures.reset();
        self.field = SettingsField::from_context(cx.context());
        let Some(field) = self.field else {
            warn!("Keyboard opened without a field (context {})", cx.context());
            cx.return_to_previous();
            return;
        };

        self.keyboard.reset(shared.settings.field(field));
        let title = field.title(shared.settings.locale);
        report_draw("keyboard", self.view.draw(&mut shared.display, &self.keyboard, title));
    }

    fn on_update(&mut self, shared: &mut AppState<'a, D, S, U>, cx: &mut NavContext) {
        let Some(field) = self.field else {
            return;
        };
        let Some(event) = self.gestures.poll(cx.buttons(), cx.now()) else {
            return;
        };

        let previous = self.keyboard.selected();
        let display = &mut shared.display;
        let result = match event {
            NavEvent::Next => {
                self.keyboard.next();
                self.view.update_selection(display, &self.keyboard, previous)
            }
            NavEvent::Previous => {
                self.keyboard.previous();
                self.view.update_selection(display, &self.keyboard, previous)
            }
            NavEvent::Select => match self.keyboard.press() {
                KeyOutcome::Unchanged => Ok(()),
                KeyOutcome::Edited => self.view.update_text(display, &self.keyboard),
                KeyOutcome::ModeChanged => {
                    let title = field.title(shared.settings.locale);
                    self.view.draw(display, &self.keyboard, title)
                }
                KeyOutcome::Confirmed(text) => {
                    info!("{:?} updated", field);
                    shared.settings.set_field(field, text);
                    shared.save_settings();
                    cx.return_to_previous();
                    cx.block_input_for(INPUT_BLOCK_ON_OPEN_MS);
                    Ok(())
                }
            },
        };
        report_draw("keyboard", result);
    }
}
