// src/ui/mod.rs
//! Drawing and widget models for the 16-bit TFT.
//!
//! Widgets are split into a model that knows nothing about pixels (menu tree,
//! keyboard) and a view that renders the model onto any
//! `DrawTarget<Color = Rgb565>`. Models are tested on the host; views are
//! exercised against a null display.

pub mod colors;
pub mod graph;
pub mod keyboard;
pub mod menu;
pub mod menu_view;

use core::fmt::Debug;

use log::error;

pub use graph::{GraphStack, ScrollingGraph};
pub use keyboard::{KeyOutcome, Keyboard, KeyboardMode, KeyboardView};
pub use menu::{MenuId, MenuItemKind, MenuNode, MenuOutcome, MenuTree, Redraw};
pub use menu_view::MenuView;

/// Log a failed draw call. Rendering errors are never fatal.
pub fn report_draw<E: Debug>(what: &str, result: Result<(), E>) {
    if let Err(e) = result {
        error!("Failed to draw {}: {:?}", what, e);
    }
}
