// src/pages/page.rs
//! Core page abstraction and type-erased wrapper for the UI page system.
//!
//! This module defines the [`Page`] trait that every screen implements,
//! the [`NavContext`] handed to its callbacks, and [`PageWrapper`], an enum
//! that lets the [`PageManager`](super::page_manager::PageManager) store the
//! concrete page types side by side without `dyn`.
//!
//! # Navigation from inside a page
//!
//! Callbacks get `&mut` access to the shared application state but not to the
//! manager. A page that wants to move elsewhere records the request on its
//! [`NavContext`]; the manager applies it right after the callback returns.

use core::fmt::Debug;

use embassy_time::Instant;
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;

extern crate alloc;
use alloc::boxed::Box;

use crate::app_state::{AppState, Uplink};
use crate::config::SettingsStore;
use crate::input::ButtonLevels;
use crate::ui::MenuId;

use super::{about::AboutPage, keyboard::KeyboardPage, measure::MeasurePage, menu::MenuPage};

// ---------------------------------------------------------------------------
// Navigation context
// ---------------------------------------------------------------------------

/// Navigation requested by a page callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavRequest {
    Open { id: &'static str, context: u32 },
    ReturnToPrevious,
    ReturnToDefault,
}

/// Per-callback view of the navigation state.
#[derive(Debug, Clone)]
pub struct NavContext {
    now: Instant,
    context: u32,
    buttons: ButtonLevels,
    screen_awake: bool,
    previous_menu: Option<MenuId>,
    pub(crate) request: Option<NavRequest>,
    pub(crate) active_menu: Option<MenuId>,
    pub(crate) block_input_ms: Option<u32>,
}

impl NavContext {
    pub fn new(
        now: Instant,
        context: u32,
        buttons: ButtonLevels,
        screen_awake: bool,
        previous_menu: Option<MenuId>,
    ) -> Self {
        Self {
            now,
            context,
            buttons,
            screen_awake,
            previous_menu,
            request: None,
            active_menu: None,
            block_input_ms: None,
        }
    }

    pub fn now(&self) -> Instant {
        self.now
    }

    /// Tag passed to `open_page` for the current page, 0 if none.
    pub fn context(&self) -> u32 {
        self.context
    }

    /// Button levels sampled for this update (released during `on_open`).
    pub fn buttons(&self) -> ButtonLevels {
        self.buttons
    }

    pub fn screen_awake(&self) -> bool {
        self.screen_awake
    }

    /// Menu that was active when the current page was opened.
    pub fn previous_menu(&self) -> Option<MenuId> {
        self.previous_menu
    }

    pub fn open_page(&mut self, id: &'static str, context: u32) {
        self.request = Some(NavRequest::Open { id, context });
    }

    pub fn return_to_previous(&mut self) {
        self.request = Some(NavRequest::ReturnToPrevious);
    }

    pub fn return_to_default(&mut self) {
        self.request = Some(NavRequest::ReturnToDefault);
    }

    pub fn block_input_for(&mut self, ms: u32) {
        self.block_input_ms = Some(ms);
    }

    /// Report which menu node is now active.
    pub fn set_active_menu(&mut self, menu: MenuId) {
        self.active_menu = Some(menu);
    }

    pub fn request(&self) -> Option<NavRequest> {
        self.request
    }
}

// ---------------------------------------------------------------------------
// Page trait
// ---------------------------------------------------------------------------

/// Trait that all navigable pages implement.
///
/// `S` is the shared state the pages operate on. The manager calls:
///
/// 1. **`on_open`** once each time the page becomes current.
/// 2. **`on_update`** once per manager update while it stays current.
pub trait Page<S> {
    /// Called once when this page becomes the current page.
    fn on_open(&mut self, _shared: &mut S, _cx: &mut NavContext) {}

    /// Called every update while this page is current.
    fn on_update(&mut self, shared: &mut S, cx: &mut NavContext);
}

// ---------------------------------------------------------------------------
// Blanket impl: Box<T> where T: Page
// ---------------------------------------------------------------------------

/// Allows a `Box<T>` to be used anywhere a `Page` is expected, forwarding
/// every call through to the inner value.
impl<S, T: Page<S>> Page<S> for Box<T> {
    fn on_open(&mut self, shared: &mut S, cx: &mut NavContext) {
        (**self).on_open(shared, cx)
    }

    fn on_update(&mut self, shared: &mut S, cx: &mut NavContext) {
        (**self).on_update(shared, cx)
    }
}

// ---------------------------------------------------------------------------
// PageWrapper
// ---------------------------------------------------------------------------

/// Enum-based wrapper that stores one of the concrete page types.
///
/// Each variant boxes its page to keep the enum small regardless of the
/// page's own footprint. When adding a new page, add a variant here and the
/// delegation below.
pub enum PageWrapper {
    Menu(Box<MenuPage>),
    Keyboard(Box<KeyboardPage>),
    Measure(Box<MeasurePage>),
    About(Box<AboutPage>),
}

impl<'a, D, S, U> Page<AppState<'a, D, S, U>> for PageWrapper
where
    D: DrawTarget<Color = Rgb565>,
    D::Error: Debug,
    S: SettingsStore,
    U: Uplink,
{
    fn on_open(&mut self, shared: &mut AppState<'a, D, S, U>, cx: &mut NavContext) {
        match self {
            PageWrapper::Menu(page) => page.on_open(shared, cx),
            PageWrapper::Keyboard(page) => page.on_open(shared, cx),
            PageWrapper::Measure(page) => page.on_open(shared, cx),
            PageWrapper::About(page) => page.on_open(shared, cx),
        }
    }

    fn on_update(&mut self, shared: &mut AppState<'a, D, S, U>, cx: &mut NavContext) {
        match self {
            PageWrapper::Menu(page) => page.on_update(shared, cx),
            PageWrapper::Keyboard(page) => page.on_update(shared, cx),
            PageWrapper::Measure(page) => page.on_update(shared, cx),
            PageWrapper::About(page) => page.on_update(shared, cx),
        }
    }
}
