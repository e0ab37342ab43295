// src/ui/keyboard.rs
//! Two-button on-screen keyboard.
//!
//! Keys sit in a fixed ring: the 26 letters, space, two mode toggles and the
//! DEL / CLR / OK actions. LEFT and RIGHT walk the ring, a confirm gesture
//! presses the selected key. In special mode the letter keys type the
//! punctuation in [`SPECIAL_CHARS`] instead.

use alloc::string::String;

use embedded_graphics::Drawable as EgDrawable;
use embedded_graphics::mono_font::{MonoFont, MonoTextStyle, ascii::FONT_6X10, ascii::FONT_10X20};
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{Line, PrimitiveStyle, Rectangle, RoundedRectangle};
use embedded_graphics::text::{Alignment, Baseline, Text, TextStyleBuilder};

use super::colors;
use super::menu_view::centered_text;

/// Characters typed by the letter keys in special mode, by key index.
pub const SPECIAL_CHARS: &str = "!@#$%^&*()_+-=[]{}|;:,.<>?/~`";

const LETTER_COUNT: usize = 26;

/// Letters, space, two toggles and three actions
pub const KEY_COUNT: usize = LETTER_COUNT + 6;

const KEYS_PER_ROW: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Letter(char),
    Space,
    SpecialToggle,
    UpperToggle,
    Delete,
    Clear,
    Confirm,
}

impl Key {
    pub fn at(index: usize) -> Option<Key> {
        match index {
            0..LETTER_COUNT => Some(Key::Letter(char::from(b'a' + index as u8))),
            26 => Some(Key::Space),
            27 => Some(Key::SpecialToggle),
            28 => Some(Key::UpperToggle),
            29 => Some(Key::Delete),
            30 => Some(Key::Clear),
            31 => Some(Key::Confirm),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyboardMode {
    #[default]
    Lower,
    Upper,
    Special,
}

/// What pressing a key did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyOutcome {
    Unchanged,
    /// The text changed
    Edited,
    ModeChanged,
    /// OK was pressed; carries the final text
    Confirmed(String),
}

#[derive(Debug, Default)]
pub struct Keyboard {
    text: String,
    mode: KeyboardMode,
    selected: usize,
}

impl Keyboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start editing `text` from the first key in lowercase mode.
    pub fn reset(&mut self, text: &str) {
        self.text = String::from(text);
        self.mode = KeyboardMode::Lower;
        self.selected = 0;
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn mode(&self) -> KeyboardMode {
        self.mode
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn next(&mut self) {
        self.selected = (self.selected + 1) % KEY_COUNT;
    }

    pub fn previous(&mut self) {
        self.selected = (self.selected + KEY_COUNT - 1) % KEY_COUNT;
    }

    /// Character the key at `index` types in the current mode.
    pub fn char_at(&self, index: usize) -> Option<char> {
        match Key::at(index)? {
            Key::Letter(c) => match self.mode {
                KeyboardMode::Lower => Some(c),
                KeyboardMode::Upper => Some(c.to_ascii_uppercase()),
                KeyboardMode::Special => SPECIAL_CHARS.chars().nth(index),
            },
            Key::Space => Some(' '),
            _ => None,
        }
    }

    /// Press the selected key.
    pub fn press(&mut self) -> KeyOutcome {
        if let Some(c) = self.char_at(self.selected) {
            self.text.push(c);
            return KeyOutcome::Edited;
        }

        match Key::at(self.selected) {
            Some(Key::SpecialToggle) => {
                self.mode = match self.mode {
                    KeyboardMode::Special => KeyboardMode::Lower,
                    _ => KeyboardMode::Special,
                };
                KeyOutcome::ModeChanged
            }
            Some(Key::UpperToggle) => {
                self.mode = match self.mode {
                    KeyboardMode::Upper => KeyboardMode::Lower,
                    _ => KeyboardMode::Upper,
                };
                KeyOutcome::ModeChanged
            }
            Some(Key::Delete) => match self.text.pop() {
                Some(_) => KeyOutcome::Edited,
                None => KeyOutcome::Unchanged,
            },
            Some(Key::Clear) => {
                self.text.clear();
                KeyOutcome::Edited
            }
            Some(Key::Confirm) => KeyOutcome::Confirmed(self.text.clone()),
            Some(Key::Letter(_)) | Some(Key::Space) | None => KeyOutcome::Unchanged,
        }
    }

    fn is_active_toggle(&self, index: usize) -> bool {
        matches!(
            (Key::at(index), self.mode),
            (Some(Key::SpecialToggle), KeyboardMode::Special) | (Some(Key::UpperToggle), KeyboardMode::Upper)
        )
    }
}

// ---------------------------------------------------------------------------
// View
// ---------------------------------------------------------------------------

/// Key grid geometry, scaled to the panel height.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyboardView {
    size: Size,
    header_height: u32,
    text_height: u32,
    key_width: u32,
    key_height: u32,
    padding: u32,
}

impl KeyboardView {
    pub fn new(size: Size) -> Self {
        let (header_height, text_height, key_height, padding) = match size.height {
            0..=128 => (20, 25, 18, 3),
            129..=160 => (25, 30, 22, 4),
            161..=240 => (30, 35, 28, 5),
            _ => (35, 40, 32, 6),
        };
        let key_width =
            size.width.saturating_sub(padding * (KEYS_PER_ROW as u32 + 1)) / KEYS_PER_ROW as u32;

        let rows = KEY_COUNT.div_ceil(KEYS_PER_ROW) as u32;
        let available = size.height.saturating_sub(header_height + text_height + padding);
        let key_height = if available / (key_height + padding) < rows {
            (available / rows).saturating_sub(padding).max(16)
        } else {
            key_height
        };

        Self {
            size,
            header_height,
            text_height,
            key_width,
            key_height,
            padding,
        }
    }

    /// Screen rectangle of the key at `index`.
    pub fn key_rect(&self, index: usize) -> Rectangle {
        let row = (index / KEYS_PER_ROW) as u32;
        let col = (index % KEYS_PER_ROW) as u32;
        let x = self.padding + col * (self.key_width + self.padding);
        let y = self.header_height + self.text_height + self.padding + row * (self.key_height + self.padding);
        Rectangle::new(
            Point::new(x as i32, y as i32),
            Size::new(self.key_width, self.key_height),
        )
    }

    pub fn draw<D>(&self, display: &mut D, keyboard: &Keyboard, title: &str) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        display.clear(colors::BACKGROUND)?;
        self.draw_header(display, title)?;
        self.draw_text(display, keyboard.text())?;
        for index in 0..KEY_COUNT {
            self.draw_key(display, keyboard, index)?;
        }
        Ok(())
    }

    /// Repaint the previously and the newly selected key.
    pub fn update_selection<D>(&self, display: &mut D, keyboard: &Keyboard, previous: usize) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        self.draw_key(display, keyboard, previous)?;
        self.draw_key(display, keyboard, keyboard.selected())
    }

    pub fn update_text<D>(&self, display: &mut D, keyboard: &Keyboard) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        self.draw_text(display, keyboard.text())
    }

    fn draw_header<D>(&self, display: &mut D, title: &str) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        let width = self.size.width as i32;
        let bottom = self.header_height as i32 - 1;
        centered_text(
            display,
            title,
            Point::new(width / 2, self.header_height as i32 / 2),
            colors::TEXT,
        )?;
        Line::new(Point::new(0, bottom), Point::new(width, bottom))
            .into_styled(PrimitiveStyle::with_stroke(colors::DIVIDER, 1))
            .draw(display)
    }

    fn draw_text<D>(&self, display: &mut D, text: &str) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        let top = self.header_height as i32;
        let width = self.size.width as i32;
        let inset = if self.size.height <= 160 { 10 } else { 20 };
        Rectangle::new(Point::new(0, top), Size::new(self.size.width, self.text_height))
            .into_styled(PrimitiveStyle::with_fill(colors::BACKGROUND))
            .draw(display)?;

        // show the end of long texts, that is where the cursor is
        let fits = ((width - 2 * inset) / FONT_10X20.character_size.width as i32).max(1) as usize;
        let skip = text.chars().count().saturating_sub(fits);
        let tail = match text.char_indices().nth(skip) {
            Some((offset, _)) => &text[offset..],
            None => "",
        };

        centered_text(
            display,
            tail,
            Point::new(width / 2, top + self.text_height as i32 / 2),
            colors::TEXT,
        )?;
        let underline = top + self.text_height as i32 - if self.size.height <= 160 { 4 } else { 8 };
        Line::new(Point::new(inset, underline), Point::new(width - inset, underline))
            .into_styled(PrimitiveStyle::with_stroke(colors::DIVIDER, 1))
            .draw(display)
    }

    fn draw_key<D>(&self, display: &mut D, keyboard: &Keyboard, index: usize) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        let Some(key) = Key::at(index) else {
            return Ok(());
        };
        let rect = self.key_rect(index);
        let radius = if self.size.height <= 160 { 4 } else { 6 };
        let active = keyboard.is_active_toggle(index);
        let (fill, ink) = if active {
            (colors::TEXT, colors::BACKGROUND)
        } else {
            (colors::BACKGROUND, colors::TEXT)
        };

        let shape = RoundedRectangle::with_equal_corners(rect, Size::new(radius, radius));
        shape.into_styled(PrimitiveStyle::with_fill(fill)).draw(display)?;
        if index == keyboard.selected() {
            let stroke = if rect.size.width > 20 && rect.size.height > 20 { 2 } else { 1 };
            shape
                .into_styled(PrimitiveStyle::with_stroke(colors::TEXT, stroke))
                .draw(display)?;
        }

        let mut buf = [0u8; 4];
        let label = match key {
            Key::Letter(_) => match keyboard.char_at(index) {
                Some(c) => &*c.encode_utf8(&mut buf),
                None => "",
            },
            Key::Space => "SPC",
            Key::SpecialToggle => "123",
            Key::UpperToggle => "ABC",
            Key::Delete => "DEL",
            Key::Clear => "CLR",
            Key::Confirm => "OK",
        };
        let font: &MonoFont = if self.key_height >= 28 { &FONT_10X20 } else { &FONT_6X10 };
        let style = TextStyleBuilder::new()
            .alignment(Alignment::Center)
            .baseline(Baseline::Middle)
            .build();
        EgDrawable::draw(
            &Text::with_text_style(label, rect.center(), MonoTextStyle::new(font, ink), style),
            display,
        )
        .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::NullDisplay;

    fn select(keyboard: &mut Keyboard, index: usize) {
        while keyboard.selected() != index {
            keyboard.next();
        }
    }

    #[test]
    fn test_ring_wraps_both_ways() {
        let mut kb = Keyboard::new();
        kb.previous();
        assert_eq!(kb.selected(), KEY_COUNT - 1);
        kb.next();
        assert_eq!(kb.selected(), 0);
    }

    #[test]
    fn test_typing_in_each_mode() {
        let mut kb = Keyboard::new();
        select(&mut kb, 7);
        assert_eq!(kb.press(), KeyOutcome::Edited);

        select(&mut kb, 28);
        assert_eq!(kb.press(), KeyOutcome::ModeChanged);
        select(&mut kb, 8);
        kb.press();

        select(&mut kb, 27);
        kb.press();
        assert_eq!(kb.mode(), KeyboardMode::Special);
        select(&mut kb, 0);
        kb.press();

        select(&mut kb, 26);
        kb.press();

        assert_eq!(kb.text(), "hI! ");
    }

    #[test]
    fn test_delete_clear_confirm() {
        let mut kb = Keyboard::new();
        kb.reset("abc");
        select(&mut kb, 29);
        assert_eq!(kb.press(), KeyOutcome::Edited);
        assert_eq!(kb.text(), "ab");

        select(&mut kb, 31);
        assert_eq!(kb.press(), KeyOutcome::Confirmed(String::from("ab")));

        select(&mut kb, 30);
        kb.press();
        assert_eq!(kb.text(), "");
        select(&mut kb, 29);
        assert_eq!(kb.press(), KeyOutcome::Unchanged);
    }

    #[test]
    fn test_toggles_return_to_lowercase() {
        let mut kb = Keyboard::new();
        select(&mut kb, 28);
        kb.press();
        kb.press();
        assert_eq!(kb.mode(), KeyboardMode::Lower);
    }

    #[test]
    fn test_keys_fit_on_screen() {
        let view = KeyboardView::new(Size::new(320, 240));
        let last = view.key_rect(KEY_COUNT - 1);
        let bottom = last.top_left.y + last.size.height as i32;
        assert!(bottom <= 240);

        let mut kb = Keyboard::new();
        kb.reset("a rather long wifi password that will not fit");
        let mut display = NullDisplay::default();
        view.draw(&mut display, &kb, "WiFi Password").unwrap();
        assert!(display.pixels_drawn > 0);
    }
}
