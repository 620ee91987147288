//! # Google Sheets
//!
//! Server-side proxy to the Sheets read API.
//!
//! The browser never sees the service account. It asks our backend for a
//! `(spreadsheet, range)` pair and the backend does the rest:
//!
//! 1. Resolve the service account email and private key from server config
//! 2. Sign a short-lived JWT assertion (read-only scope, 1 hour expiry)
//! 3. Trade the assertion for an access token at the token endpoint
//! 4. Read the range with that token and hand the JSON back untouched
//!
//!
//!
//! ## Notes
//! - Nothing is cached. Every proxy request signs and exchanges a fresh assertion,
//!   which costs one extra round trip but keeps all credential state request-local.
//! - No retries. A flaky upstream is surfaced to the caller as is.
//! - The only shared piece is the `reqwest::Client` connection pool.
//!
//!
//!
//! ## Commands
//!
//! Keys stored in a single-line env var usually come with escaped newlines.
//! ```sh
//! export GOOGLE_PRIVATE_KEY="$(jq -r .private_key key.json | awk '{printf "%s\\n", $0}')"
//! ```
use reqwest::StatusCode;
use thiserror::Error;

pub mod credentials;
pub mod remote;

pub use credentials::{
    CredentialMaterial, Scope, ServiceAccountConfig, SignedAssertion, sign_assertion,
};
pub use remote::SheetsClient;

pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
pub const DEFAULT_API_BASE: &str = "https://sheets.googleapis.com/v4";

#[derive(Error, Debug)]
pub enum SheetsError {
    #[error("Google service account credentials are not set")]
    CredentialsUnavailable,

    #[error("Invalid service account key: {0}")]
    InvalidKey(jsonwebtoken::errors::Error),

    #[error("Failed to sign assertion: {0}")]
    Signing(jsonwebtoken::errors::Error),

    #[error("Invalid upstream url: {0}")]
    InvalidUrl(String),

    #[error("{message}")]
    Upstream { status: u16, message: String },

    #[error("Upstream request failed")]
    Transport(#[from] reqwest::Error),
}

impl SheetsError {
    /// Status code to hand back to our own caller.
    pub fn status(&self) -> u16 {
        match self {
            SheetsError::Upstream { status, .. } => *status,
            SheetsError::Transport(e) => e
                .status()
                .map(|status| status.as_u16())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR.as_u16()),
            _ => StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
        }
    }
}
