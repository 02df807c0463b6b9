//! Keyboard input handling.
//!
//! Maps terminal key events to [`App`] actions.  While a question is being
//! composed every printable key goes into the buffer instead.
//!
//! ## For contributors
//!
//! To add a new keybinding:
//!
//! 1. Add a method on [`App`] for the action (if one doesn't exist).
//! 2. Add a `KeyCode` match arm in [`handle_key_event`] that calls it.
//! 3. Update the help text in the status bar (`ui::draw_status_bar`).

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};

use crate::app::App;

/// Process a single key event, updating app state accordingly.
///
/// Only reacts to key-press events (ignoring release / repeat) so that each
/// physical keypress triggers exactly one action.
pub fn handle_key_event(app: &mut App, key: KeyEvent) {
    if key.kind != KeyEventKind::Press {
        return;
    }

    if app.compose.is_some() {
        match key.code {
            KeyCode::Enter => app.submit_compose(),
            KeyCode::Esc => app.cancel_compose(),
            KeyCode::Backspace => app.compose_pop(),
            KeyCode::Char(c) => app.compose_push(c),
            _ => {}
        }
        return;
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.quit = true,
        KeyCode::Tab | KeyCode::Right | KeyCode::Char('l') => app.next_page(),
        KeyCode::BackTab | KeyCode::Left | KeyCode::Char('h') => app.previous_page(),
        KeyCode::Down | KeyCode::Char('j') => app.select_next(),
        KeyCode::Up | KeyCode::Char('k') => app.select_previous(),
        KeyCode::PageDown => app.scroll_down(),
        KeyCode::PageUp => app.scroll_up(),
        KeyCode::Home | KeyCode::Char('g') => app.scroll_top(),
        KeyCode::End | KeyCode::Char('G') => app.scroll_bottom(),
        KeyCode::Char('r') => app.retry(),
        KeyCode::Enter | KeyCode::Char(' ') => app.toggle(),
        KeyCode::Char('a') => app.start_compose(),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::fetch::{FetchError, Transport};
    use crate::pages;
    use crate::resource::Resource;
    use crossterm::event::KeyModifiers;
    use reqwest::Url;
    use serde_json::{json, Value};
    use std::sync::Arc;

    struct Empty;

    impl Transport for Empty {
        fn send(&self, _: &Resource) -> Result<Value, FetchError> {
            Ok(json!([]))
        }
    }

    fn app() -> App {
        let base = Url::parse("http://college.test/").unwrap();
        App::new(pages::build(&base, &SiteConfig::default()), Arc::new(Empty))
    }

    fn press(app: &mut App, code: KeyCode) {
        handle_key_event(app, KeyEvent::new(code, KeyModifiers::NONE));
    }

    #[test]
    fn q_quits() {
        let mut app = app();
        press(&mut app, KeyCode::Char('q'));
        assert!(app.quit);
    }

    #[test]
    fn release_events_are_ignored() {
        let mut app = app();
        let mut key = KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE);
        key.kind = KeyEventKind::Release;
        handle_key_event(&mut app, key);
        assert!(!app.quit);
    }

    #[test]
    fn tab_and_backtab_switch_pages() {
        let mut app = app();
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.selected, 1);
        press(&mut app, KeyCode::BackTab);
        assert_eq!(app.selected, 0);
    }

    #[test]
    fn compose_mode_captures_letters() {
        let mut app = app();
        let faq = app.pages.iter().position(|p| p.slug() == "faq").unwrap();
        app.select_page(faq);

        press(&mut app, KeyCode::Char('a'));
        assert_eq!(app.compose.as_deref(), Some(""));

        // 'q' is text here, not quit.
        press(&mut app, KeyCode::Char('q'));
        press(&mut app, KeyCode::Char('x'));
        press(&mut app, KeyCode::Backspace);
        assert!(!app.quit);
        assert_eq!(app.compose.as_deref(), Some("q"));

        press(&mut app, KeyCode::Esc);
        assert!(app.compose.is_none());
        assert!(!app.quit);
    }
}
