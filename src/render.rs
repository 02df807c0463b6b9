//! The four rendering branches every page shares.
//!
//! [`render_state`] is a pure function of a [`ViewState`]: loading shows a
//! placeholder, an error shows the page's message (plus a retry hint when the
//! page offers one), an empty success shows the page's "no records" copy, and
//! only a populated success reaches the page's own item renderer.

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

use crate::lifecycle::{Outcome, ViewState};
use crate::normalize::NO_RECORDS;

/// Per-page wording for the non-populated branches.
#[derive(Debug, Clone, Copy)]
pub struct BranchCopy {
    /// What is being loaded, e.g. "notices".
    pub subject: &'static str,
    /// Shown for an empty success.
    pub empty: &'static str,
    /// Whether the error branch offers `r` to retry.
    pub retry: bool,
}

/// Lines for one view's current state.
pub fn render_state<T>(
    state: &ViewState<T>,
    copy: &BranchCopy,
    populated: impl FnOnce(&T) -> Vec<Line<'static>>,
) -> Vec<Line<'static>> {
    match state {
        ViewState::Idle => Vec::new(),
        ViewState::Loading => vec![Line::from(Span::styled(
            format!("Loading {}…", copy.subject),
            Style::default().fg(Color::DarkGray),
        ))],
        ViewState::Error(message) => {
            let mut lines = vec![Line::from(Span::styled(
                message.clone(),
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            ))];
            if copy.retry {
                lines.push(Line::from(Span::styled(
                    "Press r to retry",
                    Style::default().fg(Color::DarkGray),
                )));
            }
            lines
        }
        ViewState::Success(Outcome::Empty(reason)) => {
            let mut lines = vec![Line::from(Span::styled(
                copy.empty,
                Style::default().fg(Color::Yellow),
            ))];
            if reason != NO_RECORDS && reason != copy.empty {
                lines.push(Line::from(Span::styled(
                    reason.clone(),
                    Style::default().fg(Color::DarkGray),
                )));
            }
            lines
        }
        ViewState::Success(Outcome::Ready(value)) => populated(value),
    }
}

/// A section heading inside a page body.
pub fn heading(text: impl Into<String>) -> Line<'static> {
    Line::from(Span::styled(
        text.into(),
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
    ))
}

/// Flatten styled lines to plain text, one line per row.
pub fn to_plain_text(lines: &[Line]) -> String {
    lines
        .iter()
        .map(|line| line.spans.iter().map(|s| s.content.as_ref()).collect::<String>())
        .collect::<Vec<_>>()
        .join("\n")
}
