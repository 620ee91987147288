//! # Suggestions
//!
//! Predictive search over the row store.
//!
//!
//!
//! ## Flow
//! - `Received`: raw `q` off the query string, possibly missing
//! - `Validated`: trimmed, must be at least 2 characters, otherwise we answer `[]` right away
//!   and never touch the store
//! - `Queried`: substring lookup on a blocking thread, capped at 5 rows
//! - `Responded`: JSON array, 200 even when empty
//!
//! Store faults are logged here and leave as a generic 500. The driver message never reaches the client.
//!
//!
//!
//! ## Frontend
//! The search box debounces keystrokes (300 ms) before calling us, so we see roughly one request
//! per pause in typing rather than one per key.
use std::sync::Arc;

use tokio::task::spawn_blocking;
use tracing::{debug, error};

use crate::{
    database::{Item, ItemStore, StoreError},
    error::AppError,
    utils::long_enough,
};

pub const MIN_QUERY_CHARS: usize = 2;
pub const SUGGESTION_LIMIT: usize = 5;

pub async fn suggest(
    store: Arc<dyn ItemStore>,
    query: Option<&str>,
) -> Result<Vec<Item>, AppError> {
    let Some(text) = long_enough(query, MIN_QUERY_CHARS) else {
        return Ok(Vec::new());
    };

    let text = text.to_string();
    debug!("Searching for {} chars", text.chars().count());

    let mut items = spawn_blocking(move || store.search(&text, SUGGESTION_LIMIT))
        .await
        .map_err(|e| StoreError::Task(e.to_string()))
        .and_then(|result| result)
        .map_err(|e| {
            error!("Search failed: {e}");
            AppError::InternalStore
        })?;

    items.truncate(SUGGESTION_LIMIT);

    Ok(items)
}
