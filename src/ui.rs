//! Terminal UI rendering.
//!
//! All drawing logic lives here, separated from application state ([`App`])
//! and input handling ([`crate::input`]).  Page bodies come pre-rendered as
//! lines from [`Page::lines`](crate::pages::Page::lines); this module only
//! lays them out.
//!
//! ## For contributors
//!
//! * The layout is a three-row split: a tab bar, the scrollable page body,
//!   and a one-line status bar at the bottom.
//! * Colours and styles are defined inline, matching the page renderers.
//! * [`ratatui`] is the TUI framework; see its docs for widget details.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs},
    Frame,
};

use crate::app::App;

/// Draw the complete UI for one frame.
pub fn draw(app: &App, frame: &mut Frame) {
    let [tabs_area, body_area, status_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(1),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    draw_tabs(app, frame, tabs_area);
    draw_body(app, frame, body_area);
    draw_status_bar(app, frame, status_area);
}

fn draw_tabs(app: &App, frame: &mut Frame, area: Rect) {
    let titles: Vec<Line> = app
        .pages
        .iter()
        .map(|page| Line::from(page.title().to_string()))
        .collect();

    let tabs = Tabs::new(titles)
        .select(app.selected)
        .style(Style::default().fg(Color::Gray))
        .highlight_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .divider("│");

    frame.render_widget(tabs, area);
}

/// Render the current page's lines, scrolled.
///
/// Lines are not wrapped, so one page line is one terminal row and the
/// scroll offset from [`App::scroll_bottom`] lands on the last line.
fn draw_body(app: &App, frame: &mut Frame, area: Rect) {
    let Some(page) = app.current() else {
        let block = Block::default().title(" campus-portal ").borders(Borders::ALL);
        frame.render_widget(Paragraph::new("No pages configured").block(block), area);
        return;
    };

    let block = Block::default()
        .title(format!(" {} ", page.title()))
        .title_bottom(Line::from(format!(" {} ", page.view().state_label())).right_aligned())
        .borders(Borders::ALL);

    let body = Paragraph::new(page.lines())
        .block(block)
        .scroll((app.scroll, 0));

    frame.render_widget(body, area);
}

/// Render the bottom status bar, or the compose prompt while typing.
fn draw_status_bar(app: &App, frame: &mut Frame, area: Rect) {
    let line = match &app.compose {
        Some(text) => Line::from(vec![
            Span::styled(" Ask: ", Style::default().fg(Color::Cyan)),
            Span::raw(text.as_str()),
            Span::styled("_", Style::default().add_modifier(Modifier::SLOW_BLINK)),
            Span::raw("  Enter: send  Esc: cancel"),
        ]),
        None => Line::from(vec![
            Span::styled(" ", Style::default()),
            Span::styled(app.status.as_str(), Style::default().fg(Color::Yellow)),
            Span::raw("  q: quit  Tab: page  ↑/↓: scroll  r: retry  Enter: open  a: ask"),
        ]),
    };
    frame.render_widget(Paragraph::new(line), area);
}
