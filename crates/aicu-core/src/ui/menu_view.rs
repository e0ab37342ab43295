// src/ui/menu_view.rs
//! Renders a [`MenuNode`] as a header, a list of rows and a control hint bar.

use embedded_graphics::Drawable as EgDrawable;
use embedded_graphics::mono_font::{MonoTextStyle, ascii::FONT_10X20};
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{Line, PrimitiveStyle, Rectangle, Triangle};
use embedded_graphics::text::{Alignment, Baseline, Text, TextStyleBuilder};

use super::colors;
use super::menu::{MenuItemKind, MenuNode, Redraw};

const HEADER_HEIGHT_PX: u32 = 30;
const ITEM_HEIGHT_PX: u32 = 40;
const CONTROLS_HEIGHT_PX: u32 = 25;
const LABEL_INSET_PX: i32 = 10;
const CHEVRON_SIZE_PX: i32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuView {
    size: Size,
}

impl MenuView {
    pub fn new(size: Size) -> Self {
        Self { size }
    }

    /// Rows that fit between the header and the control bar.
    pub fn visible_rows(&self) -> usize {
        let list = self
            .size
            .height
            .saturating_sub(HEADER_HEIGHT_PX + CONTROLS_HEIGHT_PX);
        ((list / ITEM_HEIGHT_PX) as usize).max(1)
    }

    /// Paint the whole menu.
    pub fn draw<D, A>(&self, display: &mut D, node: &MenuNode<A>) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        display.clear(colors::BACKGROUND)?;
        self.draw_header(display, node.title())?;
        self.draw_rows(display, node)?;
        self.draw_controls(display)
    }

    /// Apply a redraw plan returned by the menu model.
    pub fn update<D, A>(&self, display: &mut D, node: &MenuNode<A>, redraw: Redraw) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        match redraw {
            Redraw::None => Ok(()),
            Redraw::Full => self.draw(display, node),
            Redraw::Visible => self.draw_rows(display, node),
            Redraw::Rows { unselect, select } => {
                for index in unselect.into_iter().chain(select) {
                    self.draw_item(display, node, index)?;
                }
                Ok(())
            }
        }
    }

    fn draw_rows<D, A>(&self, display: &mut D, node: &MenuNode<A>) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        let rows = self.visible_rows();
        for index in node.visible_range(rows) {
            self.draw_item(display, node, index)?;
        }
        // blank rows below a short list
        let shown = node.visible_range(rows).len() as u32;
        let top = HEADER_HEIGHT_PX + shown * ITEM_HEIGHT_PX;
        let bottom = HEADER_HEIGHT_PX + rows as u32 * ITEM_HEIGHT_PX;
        if bottom > top {
            Rectangle::new(Point::new(0, top as i32), Size::new(self.size.width, bottom - top))
                .into_styled(PrimitiveStyle::with_fill(colors::BACKGROUND))
                .draw(display)?;
        }
        Ok(())
    }

    fn draw_header<D>(&self, display: &mut D, title: &str) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        Rectangle::new(Point::zero(), Size::new(self.size.width, HEADER_HEIGHT_PX))
            .into_styled(PrimitiveStyle::with_fill(colors::BAR))
            .draw(display)?;
        centered_text(
            display,
            title,
            Point::new(self.size.width as i32 / 2, HEADER_HEIGHT_PX as i32 / 2),
            colors::TEXT,
        )
    }

    fn draw_item<D, A>(&self, display: &mut D, node: &MenuNode<A>, index: usize) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        let Some(item) = node.items().get(index) else {
            return Ok(());
        };
        let row = index.saturating_sub(node.scroll()) as i32;
        let y = HEADER_HEIGHT_PX as i32 + row * ITEM_HEIGHT_PX as i32;
        let width = self.size.width as i32;
        let selected = index == node.selected();
        let fill = if selected { colors::SELECTED } else { colors::BACKGROUND };

        Rectangle::new(Point::new(0, y), Size::new(self.size.width, ITEM_HEIGHT_PX))
            .into_styled(PrimitiveStyle::with_fill(fill))
            .draw(display)?;
        Line::new(
            Point::new(0, y + ITEM_HEIGHT_PX as i32 - 1),
            Point::new(width, y + ITEM_HEIGHT_PX as i32 - 1),
        )
        .into_styled(PrimitiveStyle::with_stroke(colors::DIVIDER, 1))
        .draw(display)?;

        let middle = y + ITEM_HEIGHT_PX as i32 / 2;
        let style = MonoTextStyle::new(&FONT_10X20, colors::TEXT);
        let left_middle = TextStyleBuilder::new()
            .alignment(Alignment::Left)
            .baseline(Baseline::Middle)
            .build();
        Text::with_text_style(item.label, Point::new(LABEL_INSET_PX, middle), style, left_middle)
            .draw(display)?;

        match item.kind {
            MenuItemKind::Submenu(_) => chevron(display, Point::new(width - 20, middle), true),
            MenuItemKind::Back => chevron(display, Point::new(width - 20, middle), false),
            MenuItemKind::Action(_) => Ok(()),
        }
    }

    fn draw_controls<D>(&self, display: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        let top = self.size.height.saturating_sub(CONTROLS_HEIGHT_PX) as i32;
        Rectangle::new(Point::new(0, top), Size::new(self.size.width, CONTROLS_HEIGHT_PX))
            .into_styled(PrimitiveStyle::with_fill(colors::BAR))
            .draw(display)?;

        let middle = top + CONTROLS_HEIGHT_PX as i32 / 2;
        let width = self.size.width as i32;
        for (label, x) in [("UP", width / 6), ("OK", width / 2), ("DOWN", width * 5 / 6)] {
            centered_text(display, label, Point::new(x, middle), colors::TEXT)?;
        }
        Ok(())
    }
}

fn chevron<D>(display: &mut D, center: Point, points_right: bool) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb565>,
{
    let s = CHEVRON_SIZE_PX;
    let (back, tip) = if points_right { (-s, s) } else { (s, -s) };
    Triangle::new(
        center + Point::new(back, -s),
        center + Point::new(back, s),
        center + Point::new(tip, 0),
    )
    .into_styled(PrimitiveStyle::with_fill(colors::TEXT))
    .draw(display)
    .map(|_| ())
}

/// Draw `text` centred on `center` in the large font.
pub(crate) fn centered_text<D>(display: &mut D, text: &str, center: Point, color: Rgb565) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb565>,
{
    let style = TextStyleBuilder::new()
        .alignment(Alignment::Center)
        .baseline(Baseline::Middle)
        .build();
    EgDrawable::draw(
        &Text::with_text_style(text, center, MonoTextStyle::new(&FONT_10X20, color), style),
        display,
    )
    .map(|_| ())
}
