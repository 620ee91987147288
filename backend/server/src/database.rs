//! # SQLite
//!
//! Row store behind the search box.
//!
//! Core purpose is to answer substring lookups for predictive suggestions. Nothing in the
//! server writes to it after the seed step.
//!
//! ## Requirements
//!
//! - Small dataset, a few hundred rows at most
//! - Substring match on name or description
//! - Hard cap on rows per lookup
//! - Raw user input is never spliced into SQL
//!
//! ## Implementation
//!
//! - Single `items` table: id (**integer**, auto), name (**text**), description (**text**, nullable),
//!   category (**text**, nullable)
//! - One connection opened at startup, guarded by a mutex, queried from blocking tasks
//! - `LIKE` with a bound parameter. `%`, `_` and `\` in the input are escaped so they match literally
//! - SQLite's `LIKE` is ASCII case-insensitive, which is the matching policy we want
//! - Seeded with a fixed set only when the table is empty
use std::{path::Path, sync::Mutex};

use rusqlite::{Connection, Row, params};
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::utils::escape_like;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS items (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        description TEXT,
        category TEXT
    );
";

const SEARCH_SQL: &str = r"
    SELECT id, name, description, category
    FROM items
    WHERE name LIKE ?1 ESCAPE '\' OR description LIKE ?1 ESCAPE '\'
    ORDER BY id
    LIMIT ?2
";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("store connection poisoned")]
    Poisoned,

    #[error("search task failed: {0}")]
    Task(String),
}

#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct Item {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
}

impl Item {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
            category: row.get(3)?,
        })
    }
}

/// Read-only access to the searchable rows.
pub trait ItemStore: Send + Sync {
    /// Rows whose name or description contains `text`, at most `limit` of them.
    fn search(&self, text: &str, limit: usize) -> Result<Vec<Item>, StoreError>;
}

pub struct SeedItem<'a> {
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub category: Option<&'a str>,
}

pub const DEFAULT_SEED: &[SeedItem<'static>] = &[
    SeedItem {
        name: "Laptop Pro 14",
        description: Some("Lightweight laptop with a 14 inch display"),
        category: Some("Electronics"),
    },
    SeedItem {
        name: "Wireless Mouse",
        description: Some("Ergonomic mouse with silent clicks"),
        category: Some("Electronics"),
    },
    SeedItem {
        name: "Mechanical Keyboard",
        description: Some("Tenkeyless keyboard with brown switches"),
        category: Some("Electronics"),
    },
    SeedItem {
        name: "USB-C Hub",
        description: Some("Seven port hub with HDMI and card reader"),
        category: Some("Electronics"),
    },
    SeedItem {
        name: "Noise Cancelling Headphones",
        description: Some("Over-ear headphones with 30 hour battery"),
        category: Some("Audio"),
    },
    SeedItem {
        name: "Bluetooth Speaker",
        description: Some("Waterproof speaker for outdoor use"),
        category: Some("Audio"),
    },
    SeedItem {
        name: "Standing Desk",
        description: Some("Height adjustable desk with memory presets"),
        category: Some("Furniture"),
    },
    SeedItem {
        name: "Office Chair",
        description: Some("Mesh back chair with lumbar support"),
        category: Some("Furniture"),
    },
    SeedItem {
        name: "Desk Lamp",
        description: Some("LED lamp with adjustable color temperature"),
        category: Some("Lighting"),
    },
    SeedItem {
        name: "Coffee Grinder",
        description: Some("Burr grinder with 40 grind settings"),
        category: Some("Kitchen"),
    },
    SeedItem {
        name: "French Press",
        description: None,
        category: Some("Kitchen"),
    },
    SeedItem {
        name: "Notebook",
        description: Some("Dotted notebook, 120 pages"),
        category: None,
    },
];

pub struct SqliteItemStore {
    connection: Mutex<Connection>,
}

impl SqliteItemStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        info!("Opening row store at {}", path.display());

        Self::bootstrap(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::bootstrap(Connection::open_in_memory()?)
    }

    fn bootstrap(connection: Connection) -> Result<Self, StoreError> {
        connection.execute_batch(SCHEMA)?;

        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    /// Inserts `items` if the table has no rows yet. Returns how many rows were written.
    pub fn seed_if_empty(&self, items: &[SeedItem<'_>]) -> Result<usize, StoreError> {
        let mut connection = self.connection.lock().map_err(|_| StoreError::Poisoned)?;

        let count: i64 = connection.query_row("SELECT COUNT(*) FROM items", [], |row| row.get(0))?;
        if count > 0 {
            info!("Row store already holds {count} items, skipping seed");
            return Ok(0);
        }

        let transaction = connection.transaction()?;
        {
            let mut insert = transaction.prepare(
                "INSERT INTO items (name, description, category) VALUES (?1, ?2, ?3)",
            )?;

            for item in items {
                insert.execute(params![item.name, item.description, item.category])?;
            }
        }
        transaction.commit()?;

        info!("Seeded row store with {} items", items.len());
        Ok(items.len())
    }
}

impl ItemStore for SqliteItemStore {
    fn search(&self, text: &str, limit: usize) -> Result<Vec<Item>, StoreError> {
        let connection = self.connection.lock().map_err(|_| StoreError::Poisoned)?;
        let pattern = format!("%{}%", escape_like(text));
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        let mut statement = connection.prepare_cached(SEARCH_SQL)?;
        let items = statement
            .query_map(params![pattern, limit], Item::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(items)
    }
}
