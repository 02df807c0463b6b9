//! Committee rosters: `GET api/committees.php?grouped=true`.
//!
//! With `grouped=true` the server buckets members by committee and answers
//! with an object of `committee name → [members]`.  Older deployments ignore
//! the flag and send a flat list with a `committee` field on each member; both
//! are folded into the same [`Committees`] map.

use std::collections::BTreeMap;

use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use serde_json::Value;

use super::{Lifecycle, Page};
use crate::fetch::{fetch, FetchError, Transport};
use crate::lifecycle::{DataView, Outcome, ViewState};
use crate::normalize::{pick, Normalized, NO_RECORDS};
use crate::render::{heading, render_state, BranchCopy};
use crate::resource::Resource;

const UNGROUPED: &str = "Other";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitteeMember {
    pub name: String,
    pub role: Option<String>,
}

/// Committee name to members, in committee-name order.
pub type Committees = BTreeMap<String, Vec<CommitteeMember>>;

fn member(record: &Value) -> Option<CommitteeMember> {
    Some(CommitteeMember {
        name: pick(record, &["name", "member_name", "link_name"])?,
        role: pick(record, &["role", "designation", "position"]),
    })
}

fn read_committees(normalized: Normalized) -> Result<Outcome<Committees>, FetchError> {
    let mut committees = Committees::new();

    match normalized {
        Normalized::NoData(reason) => return Ok(Outcome::Empty(reason)),
        Normalized::Single(Value::Object(buckets)) => {
            for (name, members) in buckets {
                let Value::Array(members) = members else {
                    return Err(FetchError::Shape(format!("committee '{name}' is not a list")));
                };
                let members: Vec<_> = members.iter().filter_map(member).collect();
                if !members.is_empty() {
                    committees.insert(display_name(&name), members);
                }
            }
        }
        Normalized::Single(other) => {
            return Err(FetchError::Shape(format!("unexpected committee payload: {other}")));
        }
        Normalized::Items(records) => {
            for record in &records {
                let Some(m) = member(record) else { continue };
                let bucket = pick(record, &["committee", "committee_name"])
                    .map(|c| display_name(&c))
                    .unwrap_or_else(|| UNGROUPED.to_string());
                committees.entry(bucket).or_default().push(m);
            }
        }
    }

    if committees.is_empty() {
        Ok(Outcome::Empty(NO_RECORDS.to_string()))
    } else {
        Ok(Outcome::Ready(committees))
    }
}

/// `"anti_ragging"` → `"Anti Ragging"`.
fn display_name(key: &str) -> String {
    key.split(['_', '-', ' '])
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

fn committee_lines(committees: &Committees) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for (name, members) in committees {
        if !lines.is_empty() {
            lines.push(Line::default());
        }
        lines.push(heading(name.clone()));
        for m in members {
            let mut spans = vec![Span::raw(format!("  {}", m.name))];
            if let Some(role) = &m.role {
                spans.push(Span::styled(format!(" ({role})"), Style::default().fg(Color::Gray)));
            }
            lines.push(Line::from(spans));
        }
    }
    lines
}

const COPY: BranchCopy = BranchCopy {
    subject: "committees",
    empty: "No committees have been constituted yet.",
    retry: false,
};

pub struct CommitteesPage {
    view: DataView<Committees>,
}

impl CommitteesPage {
    pub fn new() -> Self {
        let resource = Resource::get("api/committees.php").param("grouped", "true");
        let view = DataView::new("committees", "Error loading committees", move |transport: &dyn Transport| {
            read_committees(fetch(transport, &resource)?)
        });
        Self { view }
    }

    pub fn state(&self) -> &ViewState<Committees> {
        self.view.state()
    }
}

impl Default for CommitteesPage {
    fn default() -> Self {
        Self::new()
    }
}

impl Page for CommitteesPage {
    fn title(&self) -> &str {
        "Committees"
    }

    fn slug(&self) -> &'static str {
        "committees"
    }

    fn view(&self) -> &dyn Lifecycle {
        &self.view
    }

    fn view_mut(&mut self) -> &mut dyn Lifecycle {
        &mut self.view
    }

    fn lines(&self) -> Vec<Line<'static>> {
        render_state(self.view.state(), &COPY, committee_lines)
    }
}
