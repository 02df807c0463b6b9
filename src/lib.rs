//! campus-portal: a terminal client for a college website's JSON API.
//!
//! ## Architecture overview
//!
//! ```text
//! ┌──────────────┐ Settlement ┌──────────────┐  draw()  ┌──────────┐
//! │ lifecycle.rs │ ─────────► │ app.rs       │ ───────► │  ui.rs   │
//! │  (thread per │ (channel)  │ (pages, tab, │          │ (render) │
//! │  activation) │            │  scroll)     │          └──────────┘
//! └──────────────┘            └──────────────┘
//!        ▲                          ▲
//!        │ Transport::send          │ handle_key_event()
//! ┌──────────────┐            ┌──────────┐
//! │  fetch/      │            │ input.rs │
//! └──────────────┘            └──────────┘
//! ```
//!
//! * **`resource`** — what to request: path, query parameters, method.
//! * **`fetch`** — the `Transport` trait, the reqwest implementation, and the
//!   all-or-nothing / per-member parallel combinators.
//! * **`normalize`** — folds the API's response envelopes into one shape.
//! * **`lifecycle`** — the `Idle → Loading → Success | Error` state machine.
//! * **`render`** — the loading / error / empty / populated branches.
//! * **`pages`** — one module per screen.
//! * **`app`**, **`ui`**, **`input`** — terminal state, drawing and keys.
//! * **`config`**, **`logging`** — startup plumbing.

pub mod app;
pub mod config;
pub mod fetch;
pub mod input;
pub mod lifecycle;
pub mod logging;
pub mod normalize;
pub mod pages;
pub mod render;
pub mod resource;
pub mod ui;
