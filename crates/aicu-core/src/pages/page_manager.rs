// src/pages/page_manager.rs
//! Page manager with navigation, input blocking and update throttling.
//!
//! Pages are registered under a static id together with a [`PageConfig`].
//! Exactly one page is current at a time. Opening a page runs its `on_open`
//! once; every [`PageManager::update`] afterwards runs `on_update` once,
//! unless input is blocked or the page's update delay has not elapsed yet.

use embassy_time::{Duration, Instant};
use heapless::Vec;
use log::{debug, error, info, warn};
use thiserror_no_std::Error;

use crate::board::Board;
use crate::config::{BLOCKED_POLL_SLEEP_MS, DEFAULT_UPDATE_DELAY_MS, INPUT_BLOCK_ON_OPEN_MS, SCREEN_IDLE_MS};
use crate::input::ButtonLevels;
use crate::pages::page::{NavContext, NavRequest, Page};
use crate::pages::screen_power::ScreenPower;
use crate::ui::MenuId;

/// Upper bound on registered pages
pub const MAX_PAGES: usize = 8;

/// Requests a page may chain from `on_open` before the manager stops following
const MAX_CHAINED_TRANSITIONS: usize = 4;

/// Per-page behaviour flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageConfig {
    /// Minimum time between two `on_update` calls, 0 for no throttling
    pub update_delay_ms: u16,
    /// Ignore input briefly after the page opens
    pub block_input_on_open: bool,
    /// Hold the backlight on while the page is current
    pub keep_screen_awake: bool,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            update_delay_ms: DEFAULT_UPDATE_DELAY_MS,
            block_input_on_open: true,
            keep_screen_awake: false,
        }
    }
}

impl PageConfig {
    pub fn with_update_delay(mut self, ms: u16) -> Self {
        self.update_delay_ms = ms;
        self
    }

    pub fn without_input_block(mut self) -> Self {
        self.block_input_on_open = false;
        self
    }

    pub fn keep_screen_awake(mut self) -> Self {
        self.keep_screen_awake = true;
        self
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationError {
    #[error("Page is not registered")]
    UnknownPage,
    #[error("No default page set")]
    NoDefaultPage,
}

struct PageEntry<P> {
    id: &'static str,
    config: PageConfig,
    page: P,
}

/// Owns the pages and the board, and routes updates to the current page.
pub struct PageManager<P, B: Board> {
    board: B,
    pages: Vec<PageEntry<P>, MAX_PAGES>,
    default_page: Option<&'static str>,
    current: Option<usize>,
    previous: Option<usize>,
    context: u32,
    active_menu: Option<MenuId>,
    previous_menu: Option<MenuId>,
    blocked_until: Option<Instant>,
    last_update: Instant,
    screen: ScreenPower,
}

impl<P, B: Board> PageManager<P, B> {
    pub fn new(board: B) -> Self {
        Self {
            board,
            pages: Vec::new(),
            default_page: None,
            current: None,
            previous: None,
            context: 0,
            active_menu: None,
            previous_menu: None,
            blocked_until: None,
            last_update: Instant::from_ticks(0),
            screen: ScreenPower::new(SCREEN_IDLE_MS),
        }
    }

    /// Backlight timeout, 0 disables it.
    pub fn with_screen_idle(mut self, idle_ms: u32) -> Self {
        self.screen = ScreenPower::new(idle_ms);
        self
    }

    /// Register a page. A second registration under the same id replaces the first.
    pub fn register_page(&mut self, id: &'static str, page: P, config: PageConfig) -> &mut Self {
        if let Some(entry) = self.pages.iter_mut().find(|e| e.id == id) {
            warn!("Page '{}' registered twice, replacing it", id);
            entry.page = page;
            entry.config = config;
        } else if self.pages.push(PageEntry { id, config, page }).is_err() {
            error!("Page registry full, dropping '{}'", id);
        }
        self
    }

    pub fn set_default_page(&mut self, id: &'static str) -> &mut Self {
        self.default_page = Some(id);
        self
    }

    pub fn board(&self) -> &B {
        &self.board
    }

    pub fn board_mut(&mut self) -> &mut B {
        &mut self.board
    }

    pub fn current_page_id(&self) -> Option<&'static str> {
        self.current.map(|i| self.pages[i].id)
    }

    pub fn previous_page_id(&self) -> Option<&'static str> {
        self.previous.map(|i| self.pages[i].id)
    }

    pub fn is_on_page(&self, id: &str) -> bool {
        self.current_page_id() == Some(id)
    }

    /// Context tag of the current page.
    pub fn context(&self) -> u32 {
        self.context
    }

    pub fn previous_menu(&self) -> Option<MenuId> {
        self.previous_menu
    }

    pub fn screen_awake(&self) -> bool {
        self.screen.is_awake()
    }

    pub fn block_input_for(&mut self, ms: u32) {
        self.blocked_until = Some(self.board.now() + Duration::from_millis(u64::from(ms)));
    }

    pub fn is_input_blocked(&self) -> bool {
        self.blocked_until.is_some_and(|until| self.board.now() < until)
    }

    fn index_of(&self, id: &str) -> Option<usize> {
        self.pages.iter().position(|e| e.id == id)
    }

    fn nav_context(&self, now: Instant, buttons: ButtonLevels) -> NavContext {
        NavContext::new(now, self.context, buttons, self.screen.is_awake(), self.previous_menu)
    }

    /// Show the default page. Input is not blocked for the first page.
    pub fn begin<S>(&mut self, shared: &mut S) -> Result<(), NavigationError>
    where
        P: Page<S>,
    {
        let Some(id) = self.default_page else {
            error!("No default page set");
            return Err(NavigationError::NoDefaultPage);
        };
        let Some(idx) = self.index_of(id) else {
            error!("Default page '{}' is not registered", id);
            return Err(NavigationError::UnknownPage);
        };

        info!("Starting on page '{}'", id);
        let now = self.board.now();
        self.screen.touch(now);
        self.current = Some(idx);
        self.previous = None;
        self.context = 0;

        let mut cx = self.nav_context(now, ButtonLevels::RELEASED);
        self.pages[idx].page.on_open(shared, &mut cx);
        self.last_update = self.board.now();
        self.settle(shared, cx);
        Ok(())
    }

    /// Make `id` current with `context`. Opening the current page again only
    /// stores the new context.
    pub fn open_page<S>(&mut self, shared: &mut S, id: &str, context: u32) -> Result<(), NavigationError>
    where
        P: Page<S>,
    {
        let Some(idx) = self.index_of(id) else {
            warn!("Cannot open unknown page '{}'", id);
            return Err(NavigationError::UnknownPage);
        };
        self.context = context;
        if let Some(cx) = self.enter(shared, idx) {
            self.settle(shared, cx);
        }
        Ok(())
    }

    /// Go back to the page that was current before this one, or to the
    /// default page when there is none.
    pub fn return_to_previous<S>(&mut self, shared: &mut S) -> Result<(), NavigationError>
    where
        P: Page<S>,
    {
        self.follow(shared, NavRequest::ReturnToPrevious)
    }

    pub fn return_to_default<S>(&mut self, shared: &mut S) -> Result<(), NavigationError>
    where
        P: Page<S>,
    {
        self.follow(shared, NavRequest::ReturnToDefault)
    }

    fn follow<S>(&mut self, shared: &mut S, request: NavRequest) -> Result<(), NavigationError>
    where
        P: Page<S>,
    {
        let idx = self.resolve(request)?;
        if let Some(cx) = self.enter(shared, idx) {
            self.settle(shared, cx);
        }
        Ok(())
    }

    fn default_index(&self) -> Option<usize> {
        self.default_page.and_then(|id| self.index_of(id))
    }

    /// Page index for `request`; stores the context the page opens with.
    fn resolve(&mut self, request: NavRequest) -> Result<usize, NavigationError> {
        let (idx, context) = match request {
            NavRequest::Open { id, context } => {
                (self.index_of(id).ok_or(NavigationError::UnknownPage)?, context)
            }
            NavRequest::ReturnToPrevious => {
                let idx = self.previous.or_else(|| self.default_index());
                (idx.ok_or(NavigationError::NoDefaultPage)?, 0)
            }
            NavRequest::ReturnToDefault => (self.default_index().ok_or(NavigationError::NoDefaultPage)?, 0),
        };
        self.context = context;
        Ok(idx)
    }

    /// Switch to page `idx` and run its `on_open`.
    fn enter<S>(&mut self, shared: &mut S, idx: usize) -> Option<NavContext>
    where
        P: Page<S>,
    {
        if self.current == Some(idx) {
            debug!(" Already on page '{}'", self.pages[idx].id);
            return None;
        }
        if let Some(menu) = self.active_menu {
            self.previous_menu = Some(menu);
        }
        self.previous = self.current;
        self.current = Some(idx);
        debug!(" Opening page '{}' (context {})", self.pages[idx].id, self.context);

        let now = self.board.now();
        if self.pages[idx].config.block_input_on_open {
            self.blocked_until = Some(now + Duration::from_millis(u64::from(INPUT_BLOCK_ON_OPEN_MS)));
        }

        let mut cx = self.nav_context(now, ButtonLevels::RELEASED);
        self.pages[idx].page.on_open(shared, &mut cx);
        self.last_update = self.board.now();
        Some(cx)
    }

    /// Apply whatever a callback left on its context.
    fn settle<S>(&mut self, shared: &mut S, mut cx: NavContext)
    where
        P: Page<S>,
    {
        for _ in 0..MAX_CHAINED_TRANSITIONS {
            if let Some(menu) = cx.active_menu {
                self.active_menu = Some(menu);
            }
            let request = cx.request.take();
            let block = cx.block_input_ms.take();

            let next = match request {
                Some(request) => match self.resolve(request) {
                    Ok(idx) => self.enter(shared, idx),
                    Err(e) => {
                        warn!("Navigation request {:?} failed: {}", request, e);
                        None
                    }
                },
                None => None,
            };

            if let Some(ms) = block {
                self.block_input_for(ms);
            }

            match next {
                Some(next) => cx = next,
                None => return,
            }
        }
        warn!("Too many chained page transitions, stopping");
    }

    /// Run one tick of the current page.
    ///
    /// Handles the backlight first, then sleeps briefly while input is
    /// blocked, then throttles to the page's update delay before calling
    /// `on_update`.
    pub async fn update<S>(&mut self, shared: &mut S, buttons: ButtonLevels)
    where
        P: Page<S>,
    {
        let Some(idx) = self.current else {
            return;
        };

        let now = self.board.now();
        let keep_awake = self.pages[idx].config.keep_screen_awake;
        if let Some(on) = self.screen.update(now, keep_awake, buttons.any()) {
            info!("Screen {}", if on { "on" } else { "off" });
            self.board.set_backlight(on);
        }

        if let Some(until) = self.blocked_until {
            if now < until {
                self.board.delay_ms(BLOCKED_POLL_SLEEP_MS).await;
                return;
            }
            self.blocked_until = None;
        }

        let delay_ms = u64::from(self.pages[idx].config.update_delay_ms);
        if delay_ms > 0 {
            let elapsed = now.saturating_duration_since(self.last_update).as_millis();
            if elapsed < delay_ms {
                self.board.delay_ms((delay_ms - elapsed) as u32).await;
            }
            self.last_update = self.board.now();
        }

        let mut cx = self.nav_context(self.board.now(), buttons);
        self.pages[idx].page.on_update(shared, &mut cx);
        self.settle(shared, cx);
    }
}
