//! Department page: overview, labs and notices fetched in parallel.
//!
//! Unlike the faculty page this uses [`join`]: each section keeps its own
//! result and renders its own branch, so a failing labs endpoint does not
//! hide the overview.  Only when every section fails does the page itself
//! go to its error state.

use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use reqwest::Url;
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use super::notices::{notice_line, read_notices, Notice};
use super::{Lifecycle, Page};
use crate::config::SiteConfig;
use crate::fetch::{join, FetchError, Joined, Transport};
use crate::lifecycle::{DataView, Outcome, ViewState};
use crate::normalize::{decode_with, lenient, normalize, pick, Aliases, Normalized, NO_RECORDS};
use crate::render::{heading, render_state, BranchCopy};
use crate::resource::{resolve_asset, Resource};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Overview {
    pub name: String,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub vision: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub mission: Option<String>,
}

const OVERVIEW_ALIASES: Aliases = &[
    ("name", &["department_name", "dept_name"]),
    ("description", &["about"]),
    ("vision", &["vision_statement"]),
    ("mission", &["mission_statement"]),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lab {
    pub name: String,
    pub description: Option<String>,
    pub image: Option<String>,
}

/// One section per endpoint, each with its own lifecycle outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct Department {
    pub overview: ViewState<Overview>,
    pub labs: ViewState<Vec<Lab>>,
    pub notices: ViewState<Vec<Notice>>,
}

const OVERVIEW: BranchCopy = BranchCopy {
    subject: "department overview",
    empty: "No department profile has been published.",
    retry: false,
};

const LABS: BranchCopy = BranchCopy {
    subject: "labs",
    empty: "No laboratories are listed.",
    retry: false,
};

const NOTICES: BranchCopy = BranchCopy {
    subject: "department notices",
    empty: "No department notices.",
    retry: false,
};

const PAGE: BranchCopy = BranchCopy {
    subject: "department",
    empty: "Nothing to show for this department.",
    retry: true,
};

fn read_overview(raw: Value) -> Result<Outcome<Overview>, FetchError> {
    // Singleton endpoint: `[ {..} ]`, the caller takes index 0.
    let normalized = normalize(raw)?;
    if let Normalized::NoData(reason) = normalized {
        return Ok(Outcome::Empty(reason));
    }
    match normalized.into_first() {
        Some(record) => Ok(Outcome::Ready(decode_with(record, OVERVIEW_ALIASES)?)),
        None => Ok(Outcome::Empty(NO_RECORDS.to_string())),
    }
}

fn read_labs(raw: Value, base: &Url) -> Result<Outcome<Vec<Lab>>, FetchError> {
    Outcome::from_normalized(normalize(raw)?, |items| {
        Ok(items
            .iter()
            .filter_map(|record| {
                Some(Lab {
                    name: pick(record, &["name", "lab_name", "link_name"])?,
                    description: pick(record, &["description", "details"]),
                    image: pick(record, &["image", "lab_image"]).and_then(|i| resolve_asset(base, &i)),
                })
            })
            .collect())
    })
}

/// Turn one joined member into a section state.  The cause of a failure is
/// logged; the section shows `message`.
fn section<T>(
    joined: &mut Joined,
    name: &str,
    message: &str,
    read: impl FnOnce(Value) -> Result<Outcome<T>, FetchError>,
) -> ViewState<T> {
    let result = joined
        .take(name)
        .unwrap_or(Err(FetchError::Aborted))
        .and_then(read);
    match result {
        Ok(outcome) => ViewState::Success(outcome),
        Err(err) => {
            warn!(section = name, kind = %err.kind(), error = %err, "department section failed");
            ViewState::Error(message.to_string())
        }
    }
}

fn read_department(mut joined: Joined, base: &Url) -> Result<Outcome<Department>, FetchError> {
    if !joined.is_empty() && joined.failures() == joined.len() {
        // Every section failed: surface the first cause as the page error.
        return Err(joined.take("overview").and_then(Result::err).unwrap_or(FetchError::Aborted));
    }

    let department = Department {
        overview: section(&mut joined, "overview", "Could not load the department profile.", read_overview),
        labs: section(&mut joined, "labs", "Could not load the labs.", |raw| read_labs(raw, base)),
        notices: section(&mut joined, "notices", "Could not load department notices.", |raw| {
            read_notices(normalize(raw)?, base)
        }),
    };
    Ok(Outcome::Ready(department))
}

fn overview_lines(overview: &Overview) -> Vec<Line<'static>> {
    let mut lines = vec![Line::from(Span::styled(
        overview.name.clone(),
        Style::default().fg(Color::White),
    ))];
    for (label, text) in [
        ("", &overview.description),
        ("Vision: ", &overview.vision),
        ("Mission: ", &overview.mission),
    ] {
        if let Some(text) = text {
            lines.push(Line::from(vec![
                Span::styled(label, Style::default().fg(Color::Gray)),
                Span::raw(text.clone()),
            ]));
        }
    }
    lines
}

fn lab_lines(labs: &[Lab]) -> Vec<Line<'static>> {
    labs.iter()
        .map(|lab| {
            let mut spans = vec![Span::raw(format!("• {}", lab.name))];
            if let Some(description) = &lab.description {
                spans.push(Span::styled(format!(": {description}"), Style::default().fg(Color::Gray)));
            }
            Line::from(spans)
        })
        .collect()
}

pub struct DepartmentPage {
    title: String,
    view: DataView<Department>,
}

impl DepartmentPage {
    pub fn new(base: Url, site: &SiteConfig) -> Self {
        let code = site.department.clone();
        let sections = [
            ("overview", Resource::get("api/departments.php").param("code", code.as_str())),
            (
                "labs",
                Resource::get("api/labs.php")
                    .param("department", code.as_str())
                    .param("is_active", "true"),
            ),
            (
                "notices",
                Resource::get("api/notices.php")
                    .param("department", code.as_str())
                    .param("limit", "10"),
            ),
        ];

        let view = DataView::new("department", "Error loading the department page", move |transport: &dyn Transport| {
            read_department(join(transport, &sections), &base)
        });

        Self {
            title: format!("Department: {}", code.to_uppercase()),
            view,
        }
    }

    pub fn state(&self) -> &ViewState<Department> {
        self.view.state()
    }
}

impl Page for DepartmentPage {
    fn title(&self) -> &str {
        &self.title
    }

    fn slug(&self) -> &'static str {
        "department"
    }

    fn view(&self) -> &dyn Lifecycle {
        &self.view
    }

    fn view_mut(&mut self) -> &mut dyn Lifecycle {
        &mut self.view
    }

    fn lines(&self) -> Vec<Line<'static>> {
        render_state(self.view.state(), &PAGE, |department| {
            let mut lines = vec![heading("Overview")];
            lines.extend(render_state(&department.overview, &OVERVIEW, overview_lines));
            lines.push(Line::default());
            lines.push(heading("Laboratories"));
            lines.extend(render_state(&department.labs, &LABS, |labs| lab_lines(labs)));
            lines.push(Line::default());
            lines.push(heading("Notices"));
            lines.extend(render_state(&department.notices, &NOTICES, |notices| {
                notices.iter().map(notice_line).collect()
            }));
            lines
        })
    }
}
