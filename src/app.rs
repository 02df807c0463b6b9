use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::fetch::Transport;
use crate::pages::Page;

pub struct App {
    /// Every page, in tab order.  Only `pages[selected]` is ever active.
    pub pages: Vec<Box<dyn Page>>,
    pub selected: usize,
    /// First visible body line.
    pub scroll: u16,
    /// Whether the user has requested to quit.
    pub quit: bool,
    /// Last status message.
    pub status: String,
    /// Text being typed into the current page's form, when composing.
    pub compose: Option<String>,
    transport: Arc<dyn Transport>,
}

impl App {
    pub fn new(pages: Vec<Box<dyn Page>>, transport: Arc<dyn Transport>) -> Self {
        Self {
            pages,
            selected: 0,
            scroll: 0,
            quit: false,
            status: "Starting…".into(),
            compose: None,
            transport,
        }
    }

    /// Activate the first page.
    pub fn start(&mut self) {
        if let Some(page) = self.pages.get_mut(self.selected) {
            page.activate(Arc::clone(&self.transport));
        }
    }

    pub fn current(&self) -> Option<&dyn Page> {
        self.pages.get(self.selected).map(|p| &**p)
    }

    fn current_mut(&mut self) -> Option<&mut Box<dyn Page>> {
        self.pages.get_mut(self.selected)
    }

    // -- pages ---------------------------------------------------------------

    /// Leave the current page and enter page `index`.  The page being left
    /// is deactivated, so a fetch it still has in flight is discarded.
    pub fn select_page(&mut self, index: usize) {
        if index >= self.pages.len() || index == self.selected {
            return;
        }
        self.pages[self.selected].deactivate();
        self.selected = index;
        self.scroll = 0;
        self.compose = None;

        let transport = Arc::clone(&self.transport);
        let page = &mut self.pages[index];
        info!(page = page.slug(), "page entered");
        page.activate(transport);
        self.status = page.title().to_string();
    }

    pub fn next_page(&mut self) {
        if !self.pages.is_empty() {
            self.select_page((self.selected + 1) % self.pages.len());
        }
    }

    pub fn previous_page(&mut self) {
        if !self.pages.is_empty() {
            let len = self.pages.len();
            self.select_page((self.selected + len - 1) % len);
        }
    }

    /// Apply finished background work on the current page.  Returns whether
    /// anything changed.
    pub fn tick(&mut self) -> bool {
        let Some(page) = self.current_mut() else {
            return false;
        };
        let changed = page.poll();
        if let Some(notice) = page.take_notice() {
            self.status = notice;
        }
        changed
    }

    /// Block until the current page settles; used outside the TUI.
    pub fn wait(&mut self, timeout: Duration) -> bool {
        self.current_mut().is_some_and(|page| page.wait(timeout))
    }

    pub fn retry(&mut self) {
        let transport = Arc::clone(&self.transport);
        let Some(page) = self.current_mut() else {
            return;
        };
        if page.retry(transport) {
            let title = page.title().to_string();
            self.status = format!("Reloading {title}");
            self.scroll = 0;
        }
    }

    // -- navigation ----------------------------------------------------------

    /// Move the page cursor, or scroll when the page has none.
    pub fn select_next(&mut self) {
        if !self.current_mut().is_some_and(|p| p.cursor_next()) {
            self.scroll_down();
        }
    }

    pub fn select_previous(&mut self) {
        if !self.current_mut().is_some_and(|p| p.cursor_previous()) {
            self.scroll_up();
        }
    }

    pub fn scroll_down(&mut self) {
        if self.scroll < self.last_line() {
            self.scroll += 1;
        }
    }

    pub fn scroll_up(&mut self) {
        self.scroll = self.scroll.saturating_sub(1);
    }

    pub fn scroll_top(&mut self) {
        self.scroll = 0;
    }

    pub fn scroll_bottom(&mut self) {
        self.scroll = self.last_line();
    }

    /// Index of the last body line; the body is drawn unwrapped.
    fn last_line(&self) -> u16 {
        let lines = self.current().map_or(0, |p| p.lines().len());
        u16::try_from(lines.saturating_sub(1)).unwrap_or(u16::MAX)
    }

    pub fn toggle(&mut self) {
        if let Some(page) = self.current_mut() {
            page.toggle();
        }
    }

    // -- compose -------------------------------------------------------------

    pub fn start_compose(&mut self) {
        if self.current().is_some_and(|p| p.accepts_input()) {
            self.compose = Some(String::new());
        } else {
            self.status = "This page has no form".into();
        }
    }

    pub fn compose_push(&mut self, c: char) {
        if let Some(text) = &mut self.compose {
            text.push(c);
        }
    }

    pub fn compose_pop(&mut self) {
        if let Some(text) = &mut self.compose {
            text.pop();
        }
    }

    pub fn cancel_compose(&mut self) {
        self.compose = None;
    }

    /// Hand the composed text to the page.  A rejected text stays in the
    /// buffer so it can be corrected.
    pub fn submit_compose(&mut self) {
        let Some(text) = self.compose.clone() else {
            return;
        };
        let transport = Arc::clone(&self.transport);
        let Some(page) = self.current_mut() else {
            return;
        };
        match page.submit(transport, text) {
            Ok(()) => {
                self.compose = None;
                self.status = "Submitting…".into();
            }
            Err(message) => self.status = message,
        }
    }
}
