//! Two-button input handling.
//!
//! The device has a LEFT and a RIGHT button. [`buttons`] samples their levels,
//! [`gesture`] turns level changes into previous / next / select events for
//! menus and the keyboard, and [`long_press`] recognises the deliberate
//! hold-both gesture that leaves the measurement page.

pub mod buttons;
pub mod gesture;
pub mod long_press;

pub use buttons::{ButtonLevels, ButtonPair};
pub use gesture::{GestureRecognizer, NavEvent};
pub use long_press::{LongPressExit, LongPressState};
