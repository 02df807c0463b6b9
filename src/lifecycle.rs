//! The fetch-state machine shared by every page.
//!
//! A [`DataView`] moves `Idle → Loading → (Success | Error)` once per
//! activation.  The loader runs on a background thread and reports back over
//! the view's own [`mpsc`] channel; the UI thread drains it with
//! [`DataView::poll`] on every tick.
//!
//! Each activation is stamped with a ticket.  A completion is applied only if
//! its ticket is still current and the view is still loading, which gives:
//!
//! * exactly one settlement per activation,
//! * late completions from a deactivated view are dropped,
//! * a re-activation supersedes whatever the previous one was doing.
//!
//! Nothing is cancelled on the wire; the stale result is simply discarded.

use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, error, warn};

use crate::fetch::{FetchError, Transport};
use crate::normalize::{Normalized, NO_RECORDS};

/// A successful fetch: either data to show or an explicit "nothing here".
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Ready(T),
    Empty(String),
}

impl<T> Outcome<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Ready(value) => Outcome::Ready(f(value)),
            Outcome::Empty(reason) => Outcome::Empty(reason),
        }
    }
}

impl<T> Outcome<Vec<T>> {
    /// `Empty(reason)` for an empty list, `Ready` otherwise.
    pub fn from_vec(items: Vec<T>, reason: &str) -> Self {
        if items.is_empty() {
            Outcome::Empty(reason.to_string())
        } else {
            Outcome::Ready(items)
        }
    }

    /// Run `reshape` over the records of a list response.  `NoData` passes
    /// through with the server's reason and `reshape` is not called.
    pub fn from_normalized(
        normalized: Normalized,
        reshape: impl FnOnce(Vec<serde_json::Value>) -> Result<Vec<T>, FetchError>,
    ) -> Result<Self, FetchError> {
        match normalized {
            Normalized::NoData(reason) => Ok(Outcome::Empty(reason)),
            other => Ok(Outcome::from_vec(reshape(other.into_items())?, NO_RECORDS)),
        }
    }
}

/// Lifecycle state of one view.  The payload only exists inside `Success`.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewState<T> {
    Idle,
    Loading,
    Success(Outcome<T>),
    /// Page-authored message; the underlying cause goes to the log.
    Error(String),
}

impl<T> ViewState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, ViewState::Loading)
    }

    pub fn payload(&self) -> Option<&T> {
        match self {
            ViewState::Success(Outcome::Ready(value)) => Some(value),
            _ => None,
        }
    }

    /// Short word for the status bar.
    pub fn label(&self) -> &'static str {
        match self {
            ViewState::Idle => "idle",
            ViewState::Loading => "loading",
            ViewState::Success(Outcome::Ready(_)) => "ready",
            ViewState::Success(Outcome::Empty(_)) => "empty",
            ViewState::Error(_) => "error",
        }
    }
}

type LoaderFn<T> = dyn Fn(&dyn Transport) -> Result<Outcome<T>, FetchError> + Send + Sync;

struct Settlement<T> {
    ticket: u64,
    result: Result<Outcome<T>, FetchError>,
}

/// One remote-backed view: a loader, its state, and its completion channel.
pub struct DataView<T> {
    label: String,
    error_message: String,
    loader: Arc<LoaderFn<T>>,
    state: ViewState<T>,
    ticket: u64,
    tx: Sender<Settlement<T>>,
    rx: Receiver<Settlement<T>>,
}

impl<T: Send + 'static> DataView<T> {
    /// `label` names the view in logs; `error_message` is what the user sees
    /// when the loader fails for any reason.
    pub fn new<F>(label: impl Into<String>, error_message: impl Into<String>, loader: F) -> Self
    where
        F: Fn(&dyn Transport) -> Result<Outcome<T>, FetchError> + Send + Sync + 'static,
    {
        let (tx, rx) = mpsc::channel();
        Self {
            label: label.into(),
            error_message: error_message.into(),
            loader: Arc::new(loader),
            state: ViewState::Idle,
            ticket: 0,
            tx,
            rx,
        }
    }

    pub fn state(&self) -> &ViewState<T> {
        &self.state
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Enter `Loading` and start the loader in the background.
    ///
    /// Returns the ticket of this activation.
    pub fn activate(&mut self, transport: Arc<dyn Transport>) -> u64 {
        self.ticket += 1;
        let ticket = self.ticket;
        self.state = ViewState::Loading;

        let loader = Arc::clone(&self.loader);
        let tx = self.tx.clone();
        debug!(view = %self.label, ticket, "activating");

        let label = self.label.clone();
        thread::spawn(move || {
            // A panicking loader still settles the view.
            let result = panic::catch_unwind(AssertUnwindSafe(|| loader(transport.as_ref())))
                .unwrap_or_else(|_| {
                    error!(view = %label, ticket, "loader panicked");
                    Err(FetchError::Aborted)
                });
            // The receiver lives in the view; if it is gone there is nobody
            // left to tell.
            let _ = tx.send(Settlement { ticket, result });
        });

        ticket
    }

    /// Start over after a failure (or re-fetch a settled view).
    ///
    /// Does nothing and returns `false` while a fetch is already in flight.
    pub fn retry(&mut self, transport: Arc<dyn Transport>) -> bool {
        if self.state.is_loading() {
            return false;
        }
        self.activate(transport);
        true
    }

    /// Return to `Idle`; any in-flight result will be discarded.
    pub fn deactivate(&mut self) {
        self.ticket += 1;
        self.state = ViewState::Idle;
    }

    /// Apply any completions that have arrived.  Returns whether the state
    /// changed.
    pub fn poll(&mut self) -> bool {
        let mut changed = false;
        while let Ok(settlement) = self.rx.try_recv() {
            changed |= self.settle(settlement);
        }
        changed
    }

    /// Block until the current activation settles or `timeout` elapses.
    ///
    /// Returns `true` when the view is no longer loading.
    pub fn wait(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while self.state.is_loading() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.rx.recv_timeout(remaining) {
                Ok(settlement) => {
                    self.settle(settlement);
                }
                Err(_) => return false,
            }
        }
        true
    }

    fn settle(&mut self, settlement: Settlement<T>) -> bool {
        if settlement.ticket != self.ticket || !self.state.is_loading() {
            debug!(
                view = %self.label,
                ticket = settlement.ticket,
                current = self.ticket,
                "discarding stale completion"
            );
            return false;
        }

        self.state = match settlement.result {
            Ok(outcome) => {
                debug!(view = %self.label, ticket = settlement.ticket, "loaded");
                ViewState::Success(outcome)
            }
            Err(err) => {
                warn!(view = %self.label, kind = %err.kind(), error = %err, "fetch failed");
                ViewState::Error(self.error_message.clone())
            }
        };
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::fetch;
    use crate::normalize::decode_items;
    use crate::resource::Resource;
    use serde_json::{json, Value};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    const WAIT: Duration = Duration::from_secs(5);

    /// Hands out scripted responses in order and counts requests.
    struct Scripted {
        responses: Mutex<VecDeque<Result<Value, FetchError>>>,
        calls: Mutex<usize>,
    }

    impl Scripted {
        fn new(responses: Vec<Result<Value, FetchError>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
                calls: Mutex::new(0),
            })
        }

        fn calls(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    impl Transport for Scripted {
        fn send(&self, _resource: &Resource) -> Result<Value, FetchError> {
            *self.calls.lock().unwrap() += 1;
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(FetchError::Aborted))
        }
    }

    /// Blocks every request until the test releases it.
    struct Gated {
        gate: Mutex<Receiver<Value>>,
    }

    impl Transport for Gated {
        fn send(&self, _resource: &Resource) -> Result<Value, FetchError> {
            self.gate.lock().unwrap().recv().map_err(|_| FetchError::Aborted)
        }
    }

    fn server_error() -> FetchError {
        FetchError::Status {
            url: "http://test/api/items.php".into(),
            status: 500,
        }
    }

    fn ids_view() -> DataView<Vec<String>> {
        DataView::new("items", "Error loading items", |transport: &dyn Transport| {
            let normalized = fetch(transport, &Resource::get("api/items.php"))?;
            Outcome::from_normalized(normalized, |items| {
                let records: Vec<Value> = decode_items(items)?;
                Ok(records.iter().map(|r| r["id"].to_string()).collect())
            })
        })
    }

    #[test]
    fn new_view_is_idle() {
        let view = ids_view();
        assert_eq!(view.state(), &ViewState::Idle);
        assert_eq!(view.state().label(), "idle");
    }

    #[test]
    fn activate_enters_loading_synchronously() {
        let mut view = ids_view();
        view.activate(Scripted::new(vec![Ok(json!([]))]));
        assert!(view.state().is_loading());
        assert!(view.wait(WAIT));
    }

    #[test]
    fn panicking_loader_settles_to_error() {
        let mut view: DataView<Vec<u8>> =
            DataView::new("items", "Error loading items", |_: &dyn Transport| {
                let bytes = Vec::<u8>::new();
                Ok(Outcome::Ready(vec![bytes[0]]))
            });
        view.activate(Scripted::new(Vec::new()));

        assert!(view.wait(WAIT));
        assert_eq!(view.state(), &ViewState::Error("Error loading items".into()));
    }

    #[test]
    fn bare_array_settles_to_ready_in_order() {
        let transport = Scripted::new(vec![Ok(json!([{"id": 1}, {"id": 2}, {"id": 3}]))]);
        let mut view = ids_view();
        view.activate(transport.clone());

        assert!(view.wait(WAIT));
        assert_eq!(
            view.state(),
            &ViewState::Success(Outcome::Ready(vec!["1".into(), "2".into(), "3".into()]))
        );
        assert_eq!(transport.calls(), 1, "one request per activation");
    }

    #[test]
    fn failure_envelope_settles_to_empty_with_reason() {
        let mut view = ids_view();
        view.activate(Scripted::new(vec![Ok(json!({"success": false, "error": "no data"}))]));

        assert!(view.wait(WAIT));
        assert_eq!(view.state(), &ViewState::Success(Outcome::Empty("no data".into())));
        assert!(view.state().payload().is_none());
    }

    #[test]
    fn http_error_settles_to_page_message() {
        let mut view = ids_view();
        view.activate(Scripted::new(vec![Err(server_error())]));

        assert!(view.wait(WAIT));
        assert_eq!(view.state(), &ViewState::Error("Error loading items".into()));
    }

    #[test]
    fn retry_after_error_reaches_success() {
        let transport = Scripted::new(vec![Err(server_error()), Ok(json!([{"id": 9}]))]);
        let mut view = ids_view();

        view.activate(transport.clone());
        assert!(view.wait(WAIT));
        assert_eq!(view.state().label(), "error");

        assert!(view.retry(transport.clone()));
        assert!(view.state().is_loading());
        assert!(view.wait(WAIT));
        assert_eq!(view.state(), &ViewState::Success(Outcome::Ready(vec!["9".into()])));
        assert_eq!(transport.calls(), 2);
    }

    #[test]
    fn retry_while_loading_is_ignored() {
        let (release, gate) = mpsc::channel();
        let transport = Arc::new(Gated { gate: Mutex::new(gate) });
        let mut view = ids_view();

        let first = view.activate(transport.clone());
        assert!(!view.retry(transport));
        release.send(json!([{"id": 1}])).unwrap();
        assert!(view.wait(WAIT));
        assert_eq!(view.ticket, first);
    }

    #[test]
    fn each_activation_settles_exactly_once() {
        let mut view = ids_view();
        let ticket = view.activate(Scripted::new(vec![Ok(json!([{"id": 1}]))]));
        assert!(view.wait(WAIT));
        let settled = view.state().clone();

        let duplicate = Settlement {
            ticket,
            result: Err(server_error()),
        };
        assert!(!view.settle(duplicate));
        assert_eq!(view.state(), &settled);
    }

    #[test]
    fn deactivation_discards_late_completion() {
        let (release, gate) = mpsc::channel();
        let transport = Arc::new(Gated { gate: Mutex::new(gate) });
        let mut view = ids_view();

        view.activate(transport);
        view.deactivate();
        release.send(json!([{"id": 1}])).unwrap();

        let late = view.rx.recv_timeout(WAIT).unwrap();
        assert!(!view.settle(late));
        assert_eq!(view.state(), &ViewState::Idle);
    }

    #[test]
    fn reactivation_supersedes_previous_request() {
        let (release, gate) = mpsc::channel();
        let transport = Arc::new(Gated { gate: Mutex::new(gate) });
        let mut view = ids_view();

        view.activate(transport.clone());
        view.deactivate();
        view.activate(transport);

        // The first completion to arrive belongs to whichever request took the
        // gate first; only the current ticket may settle the view.
        release.send(json!([{"id": "old"}])).unwrap();
        release.send(json!([{"id": "new"}])).unwrap();
        assert!(view.wait(WAIT));
        assert!(matches!(view.state(), ViewState::Success(Outcome::Ready(_))));
        assert_eq!(view.ticket, 3);
    }

    #[test]
    fn poll_without_completions_reports_no_change() {
        let mut view = ids_view();
        assert!(!view.poll());
    }

    #[test]
    fn outcome_from_vec_marks_empty_lists() {
        assert_eq!(Outcome::<Vec<u8>>::from_vec(vec![], "none"), Outcome::Empty("none".into()));
        assert_eq!(Outcome::from_vec(vec![1], "none").map(|v| v.len()), Outcome::Ready(1));
    }
}
