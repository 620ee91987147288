//! # Sheets Proxy
//!
//! Keeps the service account on the server. The browser names a spreadsheet and a range, we
//! authenticate and forward.
//!
//!
//!
//! ## Flow
//! - `Received`: both path segments present, taken verbatim (no trimming, no range parsing)
//! - `ConfigChecked`: email and key resolved from config, 500 with a configuration error otherwise
//! - `AssertionBuilt`: fresh read-only JWT, never reused
//! - `Fetched`: token exchange plus values read, upstream status and message on failure
//! - `Responded`: upstream JSON untouched on success
//!
//! If the client goes away, axum drops this future and the outbound call goes with it.
use chrono::Utc;
use serde_json::Value;
use sheets::{CredentialMaterial, Scope, sign_assertion};
use tracing::{error, warn};

use crate::{error::AppError, state::AppState};

pub async fn fetch_sheet(
    state: &AppState,
    spreadsheet_id: &str,
    range: &str,
) -> Result<Value, AppError> {
    let material = CredentialMaterial::resolve(&state.config.service_account).map_err(|e| {
        error!("Sheets proxy not configured: {e}");
        AppError::from(e)
    })?;

    let assertion = sign_assertion(
        &material,
        Scope::SpreadsheetsReadOnly,
        state.sheets.token_uri(),
        Utc::now(),
    )
    .map_err(|e| {
        error!("Could not sign assertion: {e}");
        AppError::from(e)
    })?;

    state
        .sheets
        .fetch_range(&assertion, spreadsheet_id, range)
        .await
        .map_err(|e| {
            warn!("Sheets fetch failed ({}): {e:?}", e.status());
            AppError::from(e)
        })
}
