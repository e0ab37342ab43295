// src/ui/graph.rs
//! Auto-scaling scrolling line graphs for the measurement page.
//!
//! Each graph keeps one value per horizontal pixel. New values push the
//! oldest out on the left, and the vertical scale follows the min / max of
//! what is currently visible.

use alloc::collections::VecDeque;
use alloc::vec::Vec;

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{Line, PrimitiveStyle, Rectangle};

use super::colors;
use crate::sensors::GraphChannel;

/// Height of one graph strip
pub const GRAPH_BAR_HEIGHT_PX: u32 = 14;

/// Space between stacked strips
pub const GRAPH_BAR_GAP_PX: u32 = 3;

/// Ranges smaller than this are treated as flat
const MIN_RANGE: f32 = 1e-6;

pub struct ScrollingGraph {
    bounds: Rectangle,
    color: Rgb565,
    values: VecDeque<f32>,
}

impl ScrollingGraph {
    pub fn new(bounds: Rectangle, color: Rgb565) -> Self {
        Self {
            bounds,
            color,
            values: VecDeque::with_capacity(bounds.size.width as usize),
        }
    }

    pub fn bounds(&self) -> Rectangle {
        self.bounds
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn push(&mut self, value: f32) {
        if !value.is_finite() {
            return;
        }
        if self.values.len() >= self.bounds.size.width as usize {
            self.values.pop_front();
        }
        self.values.push_back(value);
    }

    /// Smallest and largest visible value.
    pub fn extent(&self) -> Option<(f32, f32)> {
        self.values.iter().fold(None, |acc, &v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
    }

    /// Row inside the strip for `value`, 0 at the top.
    fn row(&self, value: f32, min: f32, range: f32) -> i32 {
        let bottom = self.bounds.size.height.saturating_sub(1) as f32;
        let y = bottom * (1.0 - (value - min) / range);
        y.clamp(0.0, bottom) as i32
    }

    pub fn draw<D>(&self, display: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        self.bounds
            .into_styled(PrimitiveStyle::with_fill(colors::BACKGROUND))
            .draw(display)?;

        let Some((min, max)) = self.extent() else {
            return Ok(());
        };
        let range = (max - min).max(MIN_RANGE);
        let origin = self.bounds.top_left;
        let stroke = PrimitiveStyle::with_stroke(self.color, 1);

        let mut previous = None;
        for (x, &value) in self.values.iter().enumerate() {
            let point = origin + Point::new(x as i32, self.row(value, min, range));
            if let Some(last) = previous {
                Line::new(last, point).into_styled(stroke).draw(display)?;
            }
            previous = Some(point);
        }
        Ok(())
    }
}

/// One strip per plotted channel, stacked up from the bottom edge with the
/// first registered channel on top.
#[derive(Default)]
pub struct GraphStack {
    graphs: Vec<(&'static str, ScrollingGraph)>,
}

impl GraphStack {
    pub fn layout(screen: Size, channels: impl Iterator<Item = GraphChannel>) -> Self {
        let channels: Vec<GraphChannel> = channels.collect();
        let pitch = (GRAPH_BAR_HEIGHT_PX + GRAPH_BAR_GAP_PX) as i32;
        let count = channels.len() as i32;
        let graphs = channels
            .into_iter()
            .enumerate()
            .map(|(i, channel)| {
                let y = screen.height as i32 - (count - i as i32) * pitch;
                let bounds = Rectangle::new(
                    Point::new(0, y),
                    Size::new(screen.width, GRAPH_BAR_HEIGHT_PX),
                );
                (channel.key, ScrollingGraph::new(bounds, channel.color))
            })
            .collect();
        Self { graphs }
    }

    pub fn len(&self) -> usize {
        self.graphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graphs.is_empty()
    }

    /// Top edge of the highest strip, or the screen height without graphs.
    pub fn top(&self, screen: Size) -> i32 {
        self.graphs
            .first()
            .map(|(_, g)| g.bounds().top_left.y)
            .unwrap_or(screen.height as i32)
    }

    pub fn graph(&self, key: &str) -> Option<&ScrollingGraph> {
        self.graphs.iter().find(|(k, _)| *k == key).map(|(_, g)| g)
    }

    /// Append the latest value of each channel and redraw its strip.
    pub fn update<D>(&mut self, display: &mut D, channels: impl Iterator<Item = GraphChannel>) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        for channel in channels {
            if let Some((_, graph)) = self.graphs.iter_mut().find(|(k, _)| *k == channel.key) {
                graph.push(channel.value);
                graph.draw(display)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::NullDisplay;

    fn channel(key: &'static str, value: f32) -> GraphChannel {
        GraphChannel {
            key,
            color: Rgb565::RED,
            value,
        }
    }

    #[test]
    fn test_graph_scrolls_at_width() {
        let mut g = ScrollingGraph::new(Rectangle::new(Point::zero(), Size::new(4, 10)), Rgb565::RED);
        for v in 0..6 {
            g.push(v as f32);
        }
        assert_eq!(g.len(), 4);
        assert_eq!(g.extent(), Some((2.0, 5.0)));
    }

    #[test]
    fn test_rows_span_the_strip() {
        let g = ScrollingGraph::new(Rectangle::new(Point::zero(), Size::new(4, 11)), Rgb565::RED);
        assert_eq!(g.row(0.0, 0.0, 10.0), 10);
        assert_eq!(g.row(10.0, 0.0, 10.0), 0);
        assert_eq!(g.row(5.0, 0.0, 10.0), 5);
        assert_eq!(g.row(-3.0, 0.0, 10.0), 10);
    }

    #[test]
    fn test_stack_grows_from_bottom() {
        let screen = Size::new(320, 240);
        let stack = GraphStack::layout(screen, [channel("a", 0.0), channel("b", 0.0)].into_iter());
        assert_eq!(stack.graph("a").unwrap().bounds().top_left.y, 240 - 34);
        assert_eq!(stack.graph("b").unwrap().bounds().top_left.y, 240 - 17);
        assert_eq!(stack.top(screen), 206);
    }

    #[test]
    fn test_update_feeds_matching_graphs() {
        let screen = Size::new(320, 240);
        let mut stack = GraphStack::layout(screen, [channel("a", 0.0)].into_iter());
        let mut display = NullDisplay::default();
        stack
            .update(&mut display, [channel("a", 1.0), channel("zz", 2.0)].into_iter())
            .unwrap();
        stack.update(&mut display, [channel("a", 3.0)].into_iter()).unwrap();
        assert_eq!(stack.graph("a").unwrap().len(), 2);
        assert!(display.pixels_drawn > 0);
    }
}
