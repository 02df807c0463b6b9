//! FAQ accordion plus the "ask a question" form.
//!
//! Reading: `GET api/faq.php?table=faqs`.  Writing: `POST
//! api/faq.php?table=user_questions` with `{"question": ".."}`, the only write
//! path the API has.  Submissions run on their own thread and report back
//! through [`Page::take_notice`].

use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;
use std::thread;

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use super::{Lifecycle, Page};
use crate::fetch::{fetch, Transport};
use crate::lifecycle::{DataView, Outcome, ViewState};
use crate::normalize::{acknowledgement, decode_items_with, lenient, Aliases};
use crate::render::{render_state, BranchCopy};
use crate::resource::Resource;

/// Longest question the form accepts, in characters.
pub const MAX_QUESTION_LEN: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Faq {
    pub question: String,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub answer: Option<String>,
    #[serde(default = "active", deserialize_with = "lenient::flag")]
    pub is_active: bool,
}

fn active() -> bool {
    true
}

const FAQ_ALIASES: Aliases = &[("question", &["title"]), ("answer", &["content"])];

const COPY: BranchCopy = BranchCopy {
    subject: "FAQs",
    empty: "No frequently asked questions yet.",
    retry: true,
};

pub struct FaqPage {
    view: DataView<Vec<Faq>>,
    cursor: usize,
    expanded: Option<usize>,
    submission: Option<Receiver<Result<String, String>>>,
    notice: Option<String>,
}

impl FaqPage {
    pub fn new() -> Self {
        let resource = Resource::get("api/faq.php").param("table", "faqs");
        let view = DataView::new("faq", "Error loading FAQs", move |transport: &dyn Transport| {
            Outcome::from_normalized(fetch(transport, &resource)?, |items| {
                let faqs: Vec<Faq> = decode_items_with(items, FAQ_ALIASES)?;
                Ok(faqs.into_iter().filter(|f| f.is_active).collect())
            })
        });

        Self {
            view,
            cursor: 0,
            expanded: None,
            submission: None,
            notice: None,
        }
    }

    pub fn state(&self) -> &ViewState<Vec<Faq>> {
        self.view.state()
    }

    pub fn expanded(&self) -> Option<usize> {
        self.expanded
    }

    pub fn is_submitting(&self) -> bool {
        self.submission.is_some()
    }

    fn len(&self) -> usize {
        self.view.state().payload().map_or(0, Vec::len)
    }

    fn reset_cursor(&mut self) {
        self.cursor = 0;
        self.expanded = None;
    }
}

impl Default for FaqPage {
    fn default() -> Self {
        Self::new()
    }
}

/// Trim and check a question before anything is sent.
pub fn validate_question(text: &str) -> Result<String, String> {
    let question = text.trim();
    if question.is_empty() {
        return Err("Please type a question first".to_string());
    }
    if question.chars().count() > MAX_QUESTION_LEN {
        return Err(format!("Questions are limited to {MAX_QUESTION_LEN} characters"));
    }
    Ok(question.to_string())
}

impl Page for FaqPage {
    fn title(&self) -> &str {
        "FAQ"
    }

    fn slug(&self) -> &'static str {
        "faq"
    }

    fn view(&self) -> &dyn Lifecycle {
        &self.view
    }

    fn view_mut(&mut self) -> &mut dyn Lifecycle {
        &mut self.view
    }

    fn activate(&mut self, transport: Arc<dyn Transport>) {
        self.reset_cursor();
        self.view.activate(transport);
    }

    fn retry(&mut self, transport: Arc<dyn Transport>) -> bool {
        self.reset_cursor();
        self.view.retry(transport)
    }

    fn poll(&mut self) -> bool {
        let mut changed = self.view.poll();

        let finished = match &self.submission {
            Some(rx) => match rx.try_recv() {
                Ok(result) => Some(result),
                Err(TryRecvError::Disconnected) => Some(Err("the submission was interrupted".to_string())),
                Err(TryRecvError::Empty) => None,
            },
            None => None,
        };

        if let Some(result) = finished {
            self.notice = Some(match result {
                Ok(message) => message,
                Err(message) => format!("Question not submitted: {message}"),
            });
            self.submission = None;
            changed = true;
        }
        changed
    }

    fn lines(&self) -> Vec<Line<'static>> {
        render_state(self.view.state(), &COPY, |faqs| {
            let mut lines = Vec::new();
            for (i, faq) in faqs.iter().enumerate() {
                let open = self.expanded == Some(i);
                let marker = if open { "▾" } else { "▸" };
                let mut style = Style::default().fg(Color::White);
                if i == self.cursor {
                    style = style.add_modifier(Modifier::BOLD).bg(Color::DarkGray);
                }
                lines.push(Line::from(Span::styled(format!("{marker} {}", faq.question), style)));

                if open {
                    let answer = faq.answer.as_deref().unwrap_or("No answer has been posted yet.");
                    lines.extend(answer.lines().map(|l| {
                        Line::from(Span::styled(format!("    {l}"), Style::default().fg(Color::Gray)))
                    }));
                }
            }
            lines.push(Line::default());
            lines.push(Line::from(Span::styled(
                "Press a to ask a question",
                Style::default().fg(Color::DarkGray),
            )));
            lines
        })
    }

    fn cursor_next(&mut self) -> bool {
        let len = self.len();
        if len == 0 {
            return false;
        }
        self.cursor = (self.cursor + 1).min(len - 1);
        true
    }

    fn cursor_previous(&mut self) -> bool {
        if self.len() == 0 {
            return false;
        }
        self.cursor = self.cursor.saturating_sub(1);
        true
    }

    /// Accordion: opening one entry closes any other.
    fn toggle(&mut self) {
        if self.len() == 0 {
            return;
        }
        self.expanded = if self.expanded == Some(self.cursor) {
            None
        } else {
            Some(self.cursor)
        };
    }

    fn accepts_input(&self) -> bool {
        true
    }

    fn submit(&mut self, transport: Arc<dyn Transport>, text: String) -> Result<(), String> {
        if self.submission.is_some() {
            return Err("A question is already being submitted".to_string());
        }
        let question = validate_question(&text)?;
        let resource =
            Resource::post("api/faq.php", json!({ "question": question })).param("table", "user_questions");

        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let result = match transport.send(&resource) {
                Ok(raw) => acknowledgement(&raw),
                Err(err) => {
                    warn!(kind = %err.kind(), error = %err, "question submission failed");
                    Err("the server could not be reached".to_string())
                }
            };
            if result.is_ok() {
                info!("question submitted");
            }
            let _ = tx.send(result);
        });

        self.submission = Some(rx);
        Ok(())
    }

    fn take_notice(&mut self) -> Option<String> {
        self.notice.take()
    }
}
