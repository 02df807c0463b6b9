//! Pages: one remote-backed view each.
//!
//! Every page owns a single [`DataView`] and supplies two things: the loader
//! (which resources to fetch and how to reshape them) and a renderer for the
//! populated branch.  Loading, error, empty and retry behaviour come from the
//! shared lifecycle and [`render_state`](crate::render::render_state).
//!
//! ## For contributors: adding a page
//!
//! 1. Create a file in this directory with a model type and a struct holding a
//!    `DataView<Model>`.
//! 2. Implement [`Page`] for it; usually only `title`, `slug`, `view`,
//!    `view_mut` and `lines` are needed.
//! 3. Add `mod` + `pub use` below and construct it in [`build`].

mod committees;
mod department;
mod faculty;
mod faq;
mod navigation;
mod notices;

pub use committees::{CommitteeMember, Committees, CommitteesPage};
pub use department::{Department, DepartmentPage, Lab, Overview};
pub use faculty::{Faculty, FacultyPage, Member};
pub use faq::{Faq, FaqPage};
pub use navigation::{build_tree, MenuItem, MenuNode, NavigationPage};
pub use notices::{Notice, NoticesPage};

use std::sync::Arc;
use std::time::Duration;

use ratatui::text::Line;
use reqwest::Url;

use crate::config::SiteConfig;
use crate::fetch::Transport;
use crate::lifecycle::DataView;

/// The type-erased face of a [`DataView`], so pages with different models
/// can share default [`Page`] methods.
pub trait Lifecycle {
    fn activate(&mut self, transport: Arc<dyn Transport>);
    fn deactivate(&mut self);
    fn retry(&mut self, transport: Arc<dyn Transport>) -> bool;
    fn poll(&mut self) -> bool;
    fn wait(&mut self, timeout: Duration) -> bool;
    fn state_label(&self) -> &'static str;
}

impl<T: Send + 'static> Lifecycle for DataView<T> {
    fn activate(&mut self, transport: Arc<dyn Transport>) {
        DataView::activate(self, transport);
    }

    fn deactivate(&mut self) {
        DataView::deactivate(self);
    }

    fn retry(&mut self, transport: Arc<dyn Transport>) -> bool {
        DataView::retry(self, transport)
    }

    fn poll(&mut self) -> bool {
        DataView::poll(self)
    }

    fn wait(&mut self, timeout: Duration) -> bool {
        DataView::wait(self, timeout)
    }

    fn state_label(&self) -> &'static str {
        self.state().label()
    }
}

/// A screen of the portal.
pub trait Page {
    /// Tab title.
    fn title(&self) -> &str;

    /// Stable identifier used on the command line (`--dump <slug>`).
    fn slug(&self) -> &'static str;

    fn view(&self) -> &dyn Lifecycle;

    fn view_mut(&mut self) -> &mut dyn Lifecycle;

    /// Body lines for the current state.
    fn lines(&self) -> Vec<Line<'static>>;

    fn activate(&mut self, transport: Arc<dyn Transport>) {
        self.view_mut().activate(transport);
    }

    fn deactivate(&mut self) {
        self.view_mut().deactivate();
    }

    fn retry(&mut self, transport: Arc<dyn Transport>) -> bool {
        self.view_mut().retry(transport)
    }

    /// Apply finished background work.  Returns whether anything changed.
    fn poll(&mut self) -> bool {
        self.view_mut().poll()
    }

    fn wait(&mut self, timeout: Duration) -> bool {
        self.view_mut().wait(timeout)
    }

    /// Move an in-page cursor.  Pages without one return `false` and the
    /// app scrolls instead.
    fn cursor_next(&mut self) -> bool {
        false
    }

    fn cursor_previous(&mut self) -> bool {
        false
    }

    /// Expand or collapse the entry under the cursor.
    fn toggle(&mut self) {}

    /// Whether the page accepts free-text submissions (see [`Page::submit`]).
    fn accepts_input(&self) -> bool {
        false
    }

    /// Start submitting `text`.  `Err` is a message for the status bar when
    /// the input is rejected before anything is sent.
    fn submit(&mut self, _transport: Arc<dyn Transport>, _text: String) -> Result<(), String> {
        Err("This page does not accept input".to_string())
    }

    /// A one-off message for the status bar, if the page has one.
    fn take_notice(&mut self) -> Option<String> {
        None
    }
}

/// Construct every page, in tab order.
pub fn build(base: &Url, site: &SiteConfig) -> Vec<Box<dyn Page>> {
    vec![
        Box::new(NoticesPage::new(base.clone(), site)),
        Box::new(DepartmentPage::new(base.clone(), site)),
        Box::new(FacultyPage::new(base.clone(), site)),
        Box::new(CommitteesPage::new()),
        Box::new(FaqPage::new()),
        Box::new(NavigationPage::new()),
    ]
}
