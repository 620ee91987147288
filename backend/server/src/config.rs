use std::{env, fmt::Display, fs::read_to_string, path::PathBuf, str::FromStr, time::Duration};

use anyhow::{Result, anyhow};
use sheets::{DEFAULT_API_BASE, DEFAULT_TOKEN_URI, ServiceAccountConfig};
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_path: PathBuf,
    pub service_account: ServiceAccountConfig,
    pub token_uri: String,
    pub sheets_api_base: String,
    pub upstream_timeout: Duration,
    pub cors_max_age: Duration,
}

impl Config {
    /// Reads the process environment, then `/run/secrets/<NAME>` files.
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok().or_else(|| read_secret(key)))
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let service_account = ServiceAccountConfig {
            client_email: optional(&lookup, "GOOGLE_SERVICE_ACCOUNT_EMAIL"),
            private_key: optional(&lookup, "GOOGLE_PRIVATE_KEY"),
        };

        if service_account.client_email.is_none() || service_account.private_key.is_none() {
            warn!("Google service account not configured, sheets proxy will refuse requests");
        }

        Ok(Self {
            port: try_load(&lookup, "RUST_PORT", "3000")?,
            database_path: try_load::<String>(&lookup, "DATABASE_PATH", "items.db")?.into(),
            service_account,
            token_uri: try_load(&lookup, "GOOGLE_TOKEN_URI", DEFAULT_TOKEN_URI)?,
            sheets_api_base: try_load(&lookup, "SHEETS_API_BASE", DEFAULT_API_BASE)?,
            upstream_timeout: Duration::from_millis(try_load(
                &lookup,
                "UPSTREAM_TIMEOUT_MS",
                "10000",
            )?),
            cors_max_age: Duration::from_secs(try_load(&lookup, "CORS_MAX_AGE_SECS", "3600")?),
        })
    }
}

fn optional(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key).filter(|value| !value.trim().is_empty())
}

fn try_load<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: &str,
) -> Result<T>
where
    T::Err: Display,
{
    lookup(key)
        .unwrap_or_else(|| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e| anyhow!("Invalid {key} value: {e}"))
}

fn read_secret(secret_name: &str) -> Option<String> {
    let path = format!("/run/secrets/{secret_name}");

    read_to_string(&path).map(|s| s.trim().to_string()).ok()
}
