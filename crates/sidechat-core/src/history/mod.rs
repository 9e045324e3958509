//! Chat history: one capped global log plus user-named projects.
//!
//! # Storage layout
//!
//! - `chatHistory`: JSON array of `ChatEntry`, oldest first, at most
//!   [`GLOBAL_HISTORY_CAP`] long
//! - `projects`: JSON array of `Project`, each owning an unbounded
//!   `chatHistory`

pub mod manager;

pub use manager::{render_context, HistoryStore, CONTEXT_WINDOW, GLOBAL_HISTORY_CAP};
