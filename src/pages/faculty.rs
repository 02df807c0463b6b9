//! Staff directory for one department.
//!
//! The roster and the head-of-department record are fetched together with
//! [`batch`]: if either request fails the whole page shows its error, even
//! when the other one succeeded.

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use reqwest::Url;
use serde_json::Value;

use super::{Lifecycle, Page};
use crate::config::SiteConfig;
use crate::fetch::{batch, FetchError, Transport};
use crate::lifecycle::{DataView, Outcome, ViewState};
use crate::normalize::{normalize, pick, truthy};
use crate::render::{heading, render_state, BranchCopy};
use crate::resource::{resolve_asset, Resource};

const NAME_KEYS: &[&str] = &["name", "link_name", "faculty_name"];
const IMAGE_KEYS: &[&str] = &["image", "profile_image", "photo"];

/// One staff member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub name: String,
    pub designation: Option<String>,
    pub email: Option<String>,
    /// Absolute URL of the profile picture.
    pub image: Option<String>,
    pub position: Option<i64>,
}

impl Member {
    /// Read an untyped record.  Records without a usable name or marked
    /// inactive are skipped.
    pub fn from_record(record: &Value, base: &Url) -> Option<Self> {
        if record.get("is_active").is_some_and(|flag| !flag.is_null() && !truthy(flag)) {
            return None;
        }
        Some(Self {
            name: pick(record, NAME_KEYS)?,
            designation: pick(record, &["designation", "role"]),
            email: pick(record, &["email"]),
            image: pick(record, IMAGE_KEYS).and_then(|i| resolve_asset(base, &i)),
            position: pick(record, &["position", "sort_order"]).and_then(|p| p.parse().ok()),
        })
    }
}

/// The directory: optional head of department plus everyone else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Faculty {
    pub head: Option<Member>,
    pub members: Vec<Member>,
}

fn read_faculty(roster: Value, head: Value, base: &Url) -> Result<Outcome<Faculty>, FetchError> {
    let roster = normalize(roster)?;
    let reason = roster.no_data_reason().map(String::from);

    let head = normalize(head)?
        .into_first()
        .and_then(|record| Member::from_record(&record, base));

    let mut members: Vec<Member> = roster
        .into_items()
        .iter()
        .filter_map(|record| Member::from_record(record, base))
        .filter(|m| head.as_ref().map_or(true, |h| h.name != m.name))
        .collect();
    // Explicit positions first, in order; the rest keep the server's order.
    members.sort_by_key(|m| (m.position.is_none(), m.position));

    if head.is_none() && members.is_empty() {
        return Ok(Outcome::Empty(
            reason.unwrap_or_else(|| crate::normalize::NO_RECORDS.to_string()),
        ));
    }
    Ok(Outcome::Ready(Faculty { head, members }))
}

fn member_line(member: &Member) -> Line<'static> {
    let mut spans = vec![Span::styled(
        member.name.clone(),
        Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
    )];
    if let Some(designation) = &member.designation {
        spans.push(Span::raw(", "));
        spans.push(Span::styled(designation.clone(), Style::default().fg(Color::Gray)));
    }
    if let Some(email) = &member.email {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(email.clone(), Style::default().fg(Color::Cyan)));
    }
    Line::from(spans)
}

const COPY: BranchCopy = BranchCopy {
    subject: "faculty",
    empty: "No faculty members are listed for this department.",
    retry: true,
};

pub struct FacultyPage {
    view: DataView<Faculty>,
}

impl FacultyPage {
    pub fn new(base: Url, site: &SiteConfig) -> Self {
        let resources = [
            Resource::get("api/faculty.php")
                .param("department", site.department.as_str())
                .param("is_active", "true"),
            Resource::get("api/faculty.php")
                .param("department", site.department.as_str())
                .param("role", "hod"),
        ];

        let view = DataView::new("faculty", "Error loading faculty", move |transport: &dyn Transport| {
            let [roster, head]: [Value; 2] = batch(transport, &resources)?
                .try_into()
                .map_err(|_| FetchError::Shape("batch returned the wrong number of members".into()))?;
            read_faculty(roster, head, &base)
        });

        Self { view }
    }

    pub fn state(&self) -> &ViewState<Faculty> {
        self.view.state()
    }
}

impl Page for FacultyPage {
    fn title(&self) -> &str {
        "Faculty"
    }

    fn slug(&self) -> &'static str {
        "faculty"
    }

    fn view(&self) -> &dyn Lifecycle {
        &self.view
    }

    fn view_mut(&mut self) -> &mut dyn Lifecycle {
        &mut self.view
    }

    fn lines(&self) -> Vec<Line<'static>> {
        render_state(self.view.state(), &COPY, |faculty| {
            let mut lines = Vec::new();
            if let Some(head) = &faculty.head {
                lines.push(heading("Head of Department"));
                lines.push(member_line(head));
                lines.push(Line::default());
            }
            if !faculty.members.is_empty() {
                lines.push(heading(format!("Faculty ({})", faculty.members.len())));
                lines.extend(faculty.members.iter().map(member_line));
            }
            lines
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::to_plain_text;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    fn base() -> Url {
        Url::parse("http://college.test/").unwrap()
    }

    /// Roster and head answers picked by the `role` parameter.
    struct Directory {
        roster: Result<Value, u16>,
        head: Result<Value, u16>,
    }

    impl Transport for Directory {
        fn send(&self, resource: &Resource) -> Result<Value, FetchError> {
            let answer = if resource.params().contains_key("role") {
                &self.head
            } else {
                &self.roster
            };
            answer.clone().map_err(|status| FetchError::Status {
                url: resource.to_string(),
                status,
            })
        }
    }

    fn load(roster: Result<Value, u16>, head: Result<Value, u16>) -> FacultyPage {
        let mut page = FacultyPage::new(base(), &SiteConfig::default());
        page.activate(Arc::new(Directory { roster, head }));
        assert!(page.wait(Duration::from_secs(5)));
        page
    }

    #[test]
    fn aliases_and_relative_images_are_normalized() {
        let member = Member::from_record(
            &json!({"link_name": "Dr. A", "profile_image": "img/a.jpg", "position": "2"}),
            &base(),
        )
        .unwrap();
        assert_eq!(member.name, "Dr. A");
        assert_eq!(member.image.as_deref(), Some("http://college.test/img/a.jpg"));
        assert_eq!(member.position, Some(2));
    }

    #[test]
    fn inactive_or_nameless_records_are_skipped() {
        assert!(Member::from_record(&json!({"name": "B", "is_active": "0"}), &base()).is_none());
        assert!(Member::from_record(&json!({"designation": "Professor"}), &base()).is_none());
        assert!(Member::from_record(&json!({"name": "C", "is_active": null}), &base()).is_some());
    }

    #[test]
    fn roster_is_ordered_by_position_and_excludes_head() {
        let page = load(
            Ok(json!([
                {"name": "Unranked"},
                {"name": "Second", "position": 2},
                {"name": "Head", "position": 0},
                {"name": "First", "position": 1}
            ])),
            Ok(json!([{"name": "Head", "designation": "Professor & HoD"}])),
        );

        let faculty = page.state().payload().unwrap();
        assert_eq!(faculty.head.as_ref().unwrap().name, "Head");
        let names: Vec<_> = faculty.members.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["First", "Second", "Unranked"]);
    }

    #[test]
    fn one_failed_member_fails_the_whole_batch() {
        let page = load(Ok(json!([{"name": "A"}])), Err(500));
        assert_eq!(page.state(), &ViewState::Error("Error loading faculty".into()));
        assert_eq!(to_plain_text(&page.lines()), "Error loading faculty\nPress r to retry");
    }

    #[test]
    fn empty_roster_without_head_is_empty() {
        let page = load(
            Ok(json!({"success": false, "error": "Department not found"})),
            Ok(json!([])),
        );
        assert_eq!(
            page.state(),
            &ViewState::Success(Outcome::Empty("Department not found".into()))
        );
    }

    #[test]
    fn populated_page_lists_head_then_members() {
        let page = load(
            Ok(json!([{"name": "A", "designation": "Assistant Professor"}])),
            Ok(json!({"success": true, "data": {"name": "H", "email": "h@college.test"}})),
        );
        assert_eq!(
            to_plain_text(&page.lines()),
            "Head of Department\nH  h@college.test\n\nFaculty (1)\nA, Assistant Professor"
        );
    }
}
