use std::fmt;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde::{Deserialize, Serialize};

use crate::SheetsError;

/// Upper bound Google accepts for a service account assertion.
pub const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// Service account settings as loaded from the environment.
///
/// Either credential may be missing; that only becomes an error once a proxy
/// request asks for [`CredentialMaterial`].
#[derive(Clone, Default)]
pub struct ServiceAccountConfig {
    pub client_email: Option<String>,
    pub private_key: Option<String>,
}

impl fmt::Debug for ServiceAccountConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountConfig")
            .field("client_email", &self.client_email.as_ref().map(|_| "[REDACTED]"))
            .field("private_key", &self.private_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Principal identifier plus signing key, resolved per request.
pub struct CredentialMaterial {
    client_email: String,
    private_key: String,
}

impl CredentialMaterial {
    pub fn resolve(config: &ServiceAccountConfig) -> Result<Self, SheetsError> {
        let client_email = present(config.client_email.as_deref())
            .ok_or(SheetsError::CredentialsUnavailable)?;
        let private_key =
            present(config.private_key.as_deref()).ok_or(SheetsError::CredentialsUnavailable)?;

        Ok(Self {
            client_email: client_email.to_string(),
            private_key: normalize_key(private_key),
        })
    }

}

impl fmt::Debug for CredentialMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialMaterial")
            .field("client_email", &"[REDACTED]")
            .field("private_key", &"[REDACTED]")
            .finish()
    }
}

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

/// Turns literal `\n` sequences from single-line env values into real line breaks.
pub fn normalize_key(raw: &str) -> String {
    raw.trim()
        .trim_matches('"')
        .replace("\\r\\n", "\n")
        .replace("\\n", "\n")
}

/// OAuth scopes this proxy may ask for. Read-only by construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scope {
    SpreadsheetsReadOnly,
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::SpreadsheetsReadOnly => "https://www.googleapis.com/auth/spreadsheets.readonly",
        }
    }
}

#[derive(Serialize, Deserialize)]
struct Claims {
    iss: String,
    scope: String,
    aud: String,
    iat: i64,
    exp: i64,
}

/// Signed JWT proving our identity to the token endpoint.
pub struct SignedAssertion {
    token: String,
}

impl SignedAssertion {
    pub fn as_str(&self) -> &str {
        &self.token
    }
}

impl fmt::Debug for SignedAssertion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignedAssertion")
            .field("token", &"[REDACTED]")
            .finish()
    }
}

/// Signs an RS256 assertion for `scope`, addressed to `audience` (the token URI).
pub fn sign_assertion(
    material: &CredentialMaterial,
    scope: Scope,
    audience: &str,
    issued_at: DateTime<Utc>,
) -> Result<SignedAssertion, SheetsError> {
    let key = EncodingKey::from_rsa_pem(material.private_key.as_bytes())
        .map_err(SheetsError::InvalidKey)?;

    let claims = Claims {
        iss: material.client_email.clone(),
        scope: scope.as_str().to_string(),
        aud: audience.to_string(),
        iat: issued_at.timestamp(),
        exp: (issued_at + Duration::seconds(ASSERTION_LIFETIME_SECS)).timestamp(),
    };

    let token =
        encode(&Header::new(Algorithm::RS256), &claims, &key).map_err(SheetsError::Signing)?;

    Ok(SignedAssertion { token })
}
