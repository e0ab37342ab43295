// src/pages/mod.rs
//! Page system: the manager, the page trait and the concrete pages.

pub mod about;
pub mod keyboard;
pub mod measure;
pub mod menu;
pub mod page;
pub mod page_manager;
pub mod screen_power;

use alloc::boxed::Box;

use embedded_graphics::prelude::Size;

use crate::board::Board;
use crate::config::Locale;

pub use about::AboutPage;
pub use keyboard::KeyboardPage;
pub use measure::MeasurePage;
pub use menu::{MenuAction, MenuPage, build_menu};
pub use page::{NavContext, NavRequest, Page, PageWrapper};
pub use page_manager::{NavigationError, PageConfig, PageManager};
pub use screen_power::ScreenPower;

pub const MENU_PAGE: &str = "menu";
pub const KEYBOARD_PAGE: &str = "keyboard";
pub const MEASURE_PAGE: &str = "measure";
pub const ABOUT_PAGE: &str = "about";

/// Register the standard pages and make the menu the default.
///
/// The measurement page runs unthrottled and without the input block so the
/// sampling schedule is only limited by the main loop.
pub fn register_default_pages<B: Board>(
    manager: &mut PageManager<PageWrapper, B>,
    locale: Locale,
    screen: Size,
    version: &'static str,
) {
    manager
        .register_page(
            MENU_PAGE,
            PageWrapper::Menu(Box::new(MenuPage::new(locale, screen))),
            PageConfig::default(),
        )
        .register_page(
            KEYBOARD_PAGE,
            PageWrapper::Keyboard(Box::new(KeyboardPage::new(screen))),
            PageConfig::default(),
        )
        .register_page(
            MEASURE_PAGE,
            PageWrapper::Measure(Box::new(MeasurePage::new(screen))),
            PageConfig::default().with_update_delay(0).without_input_block(),
        )
        .register_page(
            ABOUT_PAGE,
            PageWrapper::About(Box::new(AboutPage::new(version))),
            PageConfig::default(),
        )
        .set_default_page(MENU_PAGE);
}
