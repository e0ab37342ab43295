//! Colour constants for RGB565 panels.
//!
//! To convert from 8-bit RGB: R>>3, G>>2, B>>3

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;

/// Screen background
pub const BACKGROUND: Rgb565 = Rgb565::BLACK;

/// Header and control bars
pub const BAR: Rgb565 = Rgb565::new(128 >> 3, 128 >> 2, 128 >> 3);

/// Highlight behind the selected menu row
pub const SELECTED: Rgb565 = Rgb565::BLUE;

/// Primary text
pub const TEXT: Rgb565 = Rgb565::WHITE;

/// Row separators and underlines
pub const DIVIDER: Rgb565 = Rgb565::new(64 >> 3, 64 >> 2, 64 >> 3);

/// Success messages
pub const OK: Rgb565 = Rgb565::GREEN;

/// Failure messages
pub const ERROR: Rgb565 = Rgb565::RED;

/// Pending / informational messages
pub const PENDING: Rgb565 = Rgb565::YELLOW;
