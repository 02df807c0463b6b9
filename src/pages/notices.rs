//! Notice board: `GET api/notices.php?type=<kind>&limit=<n>`, newest first.

use std::cmp::Ordering;

use chrono::NaiveDate;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use reqwest::Url;
use serde::Deserialize;

use super::{Lifecycle, Page};
use crate::config::SiteConfig;
use crate::fetch::{fetch, FetchError, Transport};
use crate::lifecycle::{DataView, Outcome};
use crate::normalize::{decode_items_with, lenient, Aliases, Normalized};
use crate::render::{render_state, BranchCopy};
use crate::resource::{resolve_asset, Resource};

/// One entry on a notice board.
///
/// Endpoints disagree on the link key (`link`, `pdf_link`, `file_url`); all
/// three are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Notice {
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub id: Option<String>,

    pub title: String,

    /// `None` when missing or unparseable; such notices sort last.
    #[serde(default, deserialize_with = "lenient::opt_date")]
    pub date: Option<NaiveDate>,

    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub link: Option<String>,
}

const NOTICE_ALIASES: Aliases = &[
    ("title", &["notice_title"]),
    ("date", &["notice_date", "created_at"]),
    ("link", &["pdf_link", "file_url"]),
];

/// Newest first; undated notices after all dated ones.
pub fn newest_first(a: &Notice, b: &Notice) -> Ordering {
    // `None < Some(_)`, so comparing `b` to `a` sinks undated entries.
    b.date.cmp(&a.date)
}

/// Decode notice records, sort them newest first and complete their links.
///
/// Shared with the department page, which shows the same records.
pub(super) fn read_notices(normalized: Normalized, base: &Url) -> Result<Outcome<Vec<Notice>>, FetchError> {
    Outcome::from_normalized(normalized, |items| {
        let mut notices: Vec<Notice> = decode_items_with(items, NOTICE_ALIASES)?;
        // Stable sort: same-day notices keep the server's order.
        notices.sort_by(newest_first);
        for notice in &mut notices {
            notice.link = notice.link.as_deref().and_then(|l| resolve_asset(base, l));
        }
        Ok(notices)
    })
}

pub(super) fn notice_line(notice: &Notice) -> Line<'static> {
    let date = notice
        .date
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "no date".into());

    let mut spans = vec![
        Span::styled(format!("{date:<11}"), Style::default().fg(Color::DarkGray)),
        Span::raw(" "),
        Span::styled(notice.title.clone(), Style::default().fg(Color::White)),
    ];
    if let Some(link) = &notice.link {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(format!("<{link}>"), Style::default().fg(Color::Cyan)));
    }
    Line::from(spans)
}

const COPY: BranchCopy = BranchCopy {
    subject: "notices",
    empty: "No notices have been published yet.",
    retry: true,
};

pub struct NoticesPage {
    title: String,
    view: DataView<Vec<Notice>>,
}

impl NoticesPage {
    pub fn new(base: Url, site: &SiteConfig) -> Self {
        let resource = Resource::get("api/notices.php")
            .param("type", site.notice_kind.as_str())
            .param("limit", site.notice_limit.to_string());

        let view = DataView::new("notices", "Error loading notices", move |transport: &dyn Transport| {
            read_notices(fetch(transport, &resource)?, &base)
        });

        Self {
            title: format!("Notices: {}", site.notice_kind),
            view,
        }
    }

    pub fn state(&self) -> &crate::lifecycle::ViewState<Vec<Notice>> {
        self.view.state()
    }
}

impl Page for NoticesPage {
    fn title(&self) -> &str {
        &self.title
    }

    fn slug(&self) -> &'static str {
        "notices"
    }

    fn view(&self) -> &dyn Lifecycle {
        &self.view
    }

    fn view_mut(&mut self) -> &mut dyn Lifecycle {
        &mut self.view
    }

    fn lines(&self) -> Vec<Line<'static>> {
        render_state(self.view.state(), &COPY, |notices| notices.iter().map(notice_line).collect())
    }
}
