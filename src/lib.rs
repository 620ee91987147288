//! # Finder
//!
//! Client side of the search box. Owns keystroke handling and the dropdown state, talks to
//! `GET /api/search` on the backend.
//!
//! ## State
//! - `input`: what the user sees in the text box
//! - `suggestions`: last accepted result set, at most 5 items
//! - `loading`: true while a suggestion request is in flight
//! - `show_suggestions`: dropdown visibility
//!
//!
//!
//! ## Flow
//!
//! - Every keystroke reschedules a fetch 300 ms out, cancelling the previous timer
//! - Only the last keystroke in a burst reaches the network
//! - Input under 2 characters clears the suggestions locally, no request
//! - Results open the dropdown
//! - Click outside the search region closes it
//! - Picking a suggestion copies its name into the box and closes the dropdown, no new request
//!
//!
//!
//! ## Out of order responses
//!
//! Each scheduled fetch carries a generation number. Any later keystroke or a selection bumps
//! it, and a response whose generation is no longer current is dropped on arrival. A slow
//! request for `"ab"` can never overwrite the results for `"abc"`.
//!
//! ```no_run
//! use finder::{HttpSuggestionSource, SuggestionBox};
//!
//! # async fn run() -> Result<(), finder::ClientError> {
//! let mut search = SuggestionBox::new(HttpSuggestionSource::new("http://localhost:3000")?);
//!
//! search.on_input("de");
//! search.on_input("des");
//! search.on_input("desk");
//! # Ok(())
//! # }
//! ```
use serde::Deserialize;
use thiserror::Error;

pub mod debounce;
pub mod source;
pub mod suggest;

pub use debounce::{DEFAULT_QUIET_PERIOD, Debouncer};
pub use source::{HttpSuggestionSource, SuggestionSource};
pub use suggest::{MIN_QUERY_CHARS, Snapshot, SuggestionBox};

/// One row from `GET /api/search`.
#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Suggestion {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
}

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Invalid backend url: {0}")]
    InvalidUrl(String),

    #[error("Suggestion request failed: {0}")]
    Request(#[from] reqwest::Error),
}
