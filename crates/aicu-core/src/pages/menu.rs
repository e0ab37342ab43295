// src/pages/menu.rs
//! Main menu page.
//!
//! Owns the menu tree and drives it with the tap/confirm recogniser. Leaf
//! items carry a [`MenuAction`] that this page carries out itself.

use core::fmt::Debug;

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use log::{debug, info};

use crate::app_state::{AppRunState, AppState, Uplink};
use crate::config::{Locale, SettingsField, SettingsStore};
use crate::input::{GestureRecognizer, NavEvent};
use crate::pages::page::{NavContext, Page};
use crate::pages::{ABOUT_PAGE, KEYBOARD_PAGE, MEASURE_PAGE};
use crate::ui::{MenuId, MenuOutcome, MenuTree, MenuView, report_draw};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    OpenPage { page: &'static str, context: u32 },
    /// Switch between English and German and restart
    ToggleLanguage,
    FactoryReset,
    Restart,
}

impl MenuAction {
    fn edit(field: SettingsField) -> Self {
        MenuAction::OpenPage {
            page: KEYBOARD_PAGE,
            context: field.context(),
        }
    }
}

/// Build the default menu tree with labels in `locale`.
pub fn build_menu(locale: Locale, visible_rows: usize) -> MenuTree<MenuAction> {
    let t = |en, de| locale.en_de(en, de);
    let back = t("Back", "Zurueck");

    let mut tree = MenuTree::new(t("Main Menu", "Hauptmenue"), visible_rows);
    let root = tree.root();
    let setup = tree.add_menu(t("Setup", "Einstellungen"));
    let wifi = tree.add_menu(t("WiFi Settings", "WLAN"));
    let api = tree.add_menu("Aicuflow API");

    tree.add_action(
        root,
        t("Start", "Start"),
        MenuAction::OpenPage {
            page: MEASURE_PAGE,
            context: 0,
        },
    )
    .add_submenu(root, t("Setup", "Einstellungen"), setup)
    .add_action(
        root,
        t("About", "Info"),
        MenuAction::OpenPage {
            page: ABOUT_PAGE,
            context: 0,
        },
    );

    tree.add_back(setup, back)
        .add_submenu(setup, t("WiFi Settings", "WLAN"), wifi)
        .add_submenu(setup, "Aicuflow API", api)
        .add_action(setup, t("Language: EN", "Sprache: DE"), MenuAction::ToggleLanguage)
        .add_action(setup, t("Factory Reset", "Werksreset"), MenuAction::FactoryReset)
        .add_action(setup, t("Restart", "Neustart"), MenuAction::Restart);

    tree.add_back(wifi, back)
        .add_action(wifi, "SSID", MenuAction::edit(SettingsField::WifiSsid))
        .add_action(wifi, t("Password", "Passwort"), MenuAction::edit(SettingsField::WifiPassword));

    tree.add_back(api, back)
        .add_action(api, "Mail", MenuAction::edit(SettingsField::AccountEmail))
        .add_action(api, t("Password", "Passwort"), MenuAction::edit(SettingsField::AccountPassword))
        .add_action(api, "Flow ID", MenuAction::edit(SettingsField::FlowId))
        .add_action(api, t("Device Name", "Geraetename"), MenuAction::edit(SettingsField::DeviceName))
        .add_action(api, t("File Name", "Dateiname"), MenuAction::edit(SettingsField::StreamFileName));

    tree
}

pub struct MenuPage {
    tree: MenuTree<MenuAction>,
    view: MenuView,
    gestures: GestureRecognizer,
}

impl MenuPage {
    pub fn new(locale: Locale, screen: Size) -> Self {
        let view = MenuView::new(screen);
        Self {
            tree: build_menu(locale, view.visible_rows()),
            view,
            gestures: GestureRecognizer::default(),
        }
    }

    pub fn tree(&self) -> &MenuTree<MenuAction> {
        &self.tree
    }

    fn draw<D>(&self, display: &mut D)
    where
        D: DrawTarget<Color = Rgb565>,
        D::Error: Debug,
    {
        report_draw("menu", self.view.draw(display, self.tree.active_node()));
    }

    fn run<D, S, U>(&mut self, action: MenuAction, shared: &mut AppState<'_, D, S, U>, cx: &mut NavContext)
    where
        D: DrawTarget<Color = Rgb565>,
        S: SettingsStore,
        U: Uplink,
    {
        debug!(" Menu action {:?}", action);
        match action {
            MenuAction::OpenPage { page, context } => cx.open_page(page, context),
            MenuAction::ToggleLanguage => {
                shared.settings.locale = shared.settings.locale.toggled();
                info!("Language set to {:?}", shared.settings.locale);
                shared.save_settings();
                shared.request_restart();
            }
            MenuAction::FactoryReset => shared.factory_reset(),
            MenuAction::Restart => shared.request_restart(),
        }
    }
}

impl<'a, D, S, U> Page<AppState<'a, D, S, U>> for MenuPage
where
    D: DrawTarget<Color = Rgb565>,
    D::Error: Debug,
    S: SettingsStore,
    U: Uplink,
{
    fn on_open(&mut self, shared: &mut AppState<'a, D, S, U>, cx: &mut NavContext) {
        self.gestures.reset();
        self.tree.begin(cx.previous_menu().unwrap_or(MenuId::ROOT));
        cx.set_active_menu(self.tree.active());
        if shared.run_state != AppRunState::RestartPending {
            shared.run_state = AppRunState::Menu;
        }
        self.draw(&mut shared.display);
    }

    fn on_update(&mut self, shared: &mut AppState<'a, D, S, U>, cx: &mut NavContext) {
        let Some(event) = self.gestures.poll(cx.buttons(), cx.now()) else {
            return;
        };

        let redraw = match event {
            NavEvent::Next => self.tree.next(),
            NavEvent::Previous => self.tree.previous(),
            NavEvent::Select => match self.tree.select() {
                MenuOutcome::None => return,
                MenuOutcome::Entered(id) => {
                    cx.set_active_menu(id);
                    self.draw(&mut shared.display);
                    return;
                }
                MenuOutcome::Action(action) => {
                    self.run(action, shared, cx);
                    return;
                }
            },
        };
        report_draw(
            "menu",
            self.view.update(&mut shared.display, self.tree.active_node(), redraw),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::ButtonLevels;
    use crate::pages::NavRequest;
    use crate::testing::{TestState, app_state, nav};
    use crate::ui::MenuItemKind;

    const R: ButtonLevels = ButtonLevels::new(false, true);
    const BOTH: ButtonLevels = ButtonLevels::new(true, true);
    const NONE: ButtonLevels = ButtonLevels::RELEASED;

    fn page() -> MenuPage {
        MenuPage::new(Locale::En, Size::new(320, 240))
    }

    fn tap(page: &mut MenuPage, state: &mut TestState<'_>, at: u64) -> NavContext {
        page.on_update(state, &mut nav(at, R));
        let mut cx = nav(at + 100, NONE);
        page.on_update(state, &mut cx);
        cx
    }

    fn confirm(page: &mut MenuPage, state: &mut TestState<'_>, at: u64) -> NavContext {
        page.on_update(state, &mut nav(at, BOTH));
        let mut cx = nav(at + 200, NONE);
        page.on_update(state, &mut cx);
        cx
    }

    #[test]
    fn test_default_tree_layout() {
        let tree = build_menu(Locale::En, 4);
        let labels: Vec<&str> = tree.active_node().items().iter().map(|i| i.label).collect();
        assert_eq!(labels, ["Start", "Setup", "About"]);

        let MenuItemKind::Submenu(setup) = tree.active_node().items()[1].kind else {
            panic!("Setup is not a submenu");
        };
        let setup = tree.node(setup).unwrap();
        assert_eq!(setup.items().len(), 6);
        assert_eq!(setup.items()[0].kind, MenuItemKind::Back);
    }

    #[test]
    fn test_german_labels() {
        let tree = build_menu(Locale::De, 4);
        assert_eq!(tree.active_node().title(), "Hauptmenue");
    }

    #[test]
    fn test_start_opens_measure_page() {
        let mut state = app_state();
        let mut page = page();
        let mut open = nav(0, NONE);
        page.on_open(&mut state, &mut open);
        assert_eq!(open.active_menu, Some(MenuId::ROOT));
        assert_eq!(state.run_state, AppRunState::Menu);

        let cx = confirm(&mut page, &mut state, 1_000);
        assert_eq!(
            cx.request(),
            Some(NavRequest::Open {
                id: MEASURE_PAGE,
                context: 0
            })
        );
    }

    #[test]
    fn test_entering_submenu_reports_active_menu() {
        let mut state = app_state();
        let mut page = page();
        page.on_open(&mut state, &mut nav(0, NONE));

        tap(&mut page, &mut state, 1_000);
        assert_eq!(page.tree().active_node().selected(), 1);
        let cx = confirm(&mut page, &mut state, 2_000);
        assert_eq!(cx.active_menu, Some(page.tree().active()));
        assert_eq!(page.tree().active_node().title(), "Setup");
    }

    #[test]
    fn test_reopen_restores_previous_menu() {
        let mut state = app_state();
        let mut page = page();
        page.on_open(&mut state, &mut nav(0, NONE));
        tap(&mut page, &mut state, 1_000);
        confirm(&mut page, &mut state, 2_000);
        let setup = page.tree().active();

        let mut cx = NavContext::new(embassy_time::Instant::from_millis(9_000), 0, NONE, true, Some(setup));
        page.on_open(&mut state, &mut cx);
        assert_eq!(page.tree().active(), setup);
    }

    #[test]
    fn test_toggle_language_saves_and_restarts() {
        let mut state = app_state();
        let mut page = page();
        page.on_open(&mut state, &mut nav(0, NONE));
        page.run(MenuAction::ToggleLanguage, &mut state, &mut nav(10, NONE));
        assert_eq!(state.settings.locale, Locale::De);
        assert_eq!(state.store.saves, 1);
        assert!(state.restart_requested());
    }

    #[test]
    fn test_factory_reset_restores_defaults() {
        let mut state = app_state();
        state.settings.internet.ssid = "home".into();
        let mut page = page();
        page.run(MenuAction::FactoryReset, &mut state, &mut nav(0, NONE));
        assert_eq!(state.settings, crate::config::Settings::default());
        assert!(state.restart_requested());
    }
}
