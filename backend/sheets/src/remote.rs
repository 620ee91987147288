use std::time::Duration;

use reqwest::{Client, Response, StatusCode, Url};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::{SheetsError, credentials::SignedAssertion};

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

#[derive(Deserialize)]
struct AccessToken {
    access_token: String,
}

/// Read-only client for the Sheets values API.
///
/// Holds no credential state; every call is authenticated by the assertion it is given.
#[derive(Clone, Debug)]
pub struct SheetsClient {
    http: Client,
    token_uri: Url,
    api_base: Url,
}

impl SheetsClient {
    pub fn new(token_uri: &str, api_base: &str, timeout: Duration) -> Result<Self, SheetsError> {
        let token_uri = parse_base(token_uri)?;
        let api_base = parse_base(api_base)?;
        let http = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            token_uri,
            api_base,
        })
    }

    /// Audience the assertion must be addressed to.
    pub fn token_uri(&self) -> &str {
        self.token_uri.as_str()
    }

    /// Reads `range` out of `spreadsheet_id` and returns the upstream JSON as is.
    pub async fn fetch_range(
        &self,
        assertion: &SignedAssertion,
        spreadsheet_id: &str,
        range: &str,
    ) -> Result<Value, SheetsError> {
        let access_token = self.exchange(assertion).await?;
        let url = self.values_url(spreadsheet_id, range)?;

        debug!("Fetching {range} from spreadsheet {spreadsheet_id}");
        let response = self.http.get(url).bearer_auth(access_token).send().await?;

        read_json(response).await
    }

    async fn exchange(&self, assertion: &SignedAssertion) -> Result<String, SheetsError> {
        let response = self
            .http
            .post(self.token_uri.clone())
            .form(&[
                ("grant_type", JWT_BEARER_GRANT),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .await?;

        let body = read_json(response).await?;
        let token: AccessToken =
            serde_json::from_value(body).map_err(|e| SheetsError::Upstream {
                status: StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
                message: format!("Malformed token response: {e}"),
            })?;

        Ok(token.access_token)
    }

    fn values_url(&self, spreadsheet_id: &str, range: &str) -> Result<Url, SheetsError> {
        let mut url = self.api_base.clone();

        url.path_segments_mut()
            .map_err(|_| SheetsError::InvalidUrl(self.api_base.to_string()))?
            .pop_if_empty()
            .extend(["spreadsheets", spreadsheet_id, "values", range]);

        Ok(url)
    }
}

fn parse_base(raw: &str) -> Result<Url, SheetsError> {
    let url = Url::parse(raw).map_err(|e| SheetsError::InvalidUrl(format!("{raw}: {e}")))?;

    if url.cannot_be_a_base() {
        return Err(SheetsError::InvalidUrl(raw.to_string()));
    }

    Ok(url)
}

async fn read_json(response: Response) -> Result<Value, SheetsError> {
    let status = response.status();

    if status.is_success() {
        return Ok(response.json::<Value>().await?);
    }

    let body = response.text().await.unwrap_or_default();
    let message = upstream_message(status, &body);
    warn!("Upstream responded {status}: {message}");

    Err(SheetsError::Upstream {
        status: status.as_u16(),
        message,
    })
}

// Google APIs nest the message under `error`, the token endpoint uses OAuth's flat shape.
fn upstream_message(status: StatusCode, body: &str) -> String {
    let json = serde_json::from_str::<Value>(body).ok();

    json.as_ref()
        .and_then(|json| {
            json.pointer("/error/message")
                .or_else(|| json.get("error_description"))
                .or_else(|| json.get("error"))
                .or_else(|| json.get("message"))
                .and_then(Value::as_str)
        })
        .map(str::to_string)
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Upstream request failed")
                .to_string()
        })
}
