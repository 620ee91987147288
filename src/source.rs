use async_trait::async_trait;
use reqwest::{Client, Url};

use crate::{ClientError, Suggestion};

/// Where suggestions come from. The HTTP backend in production, a stub in tests.
#[async_trait]
pub trait SuggestionSource: Send + Sync {
    async fn suggest(&self, query: &str) -> Result<Vec<Suggestion>, ClientError>;
}

pub struct HttpSuggestionSource {
    http: Client,
    endpoint: Url,
}

impl HttpSuggestionSource {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let endpoint = Url::parse(base_url)
            .and_then(|base| base.join("/api/search"))
            .map_err(|e| ClientError::InvalidUrl(format!("{base_url}: {e}")))?;

        Ok(Self {
            http: Client::new(),
            endpoint,
        })
    }
}

#[async_trait]
impl SuggestionSource for HttpSuggestionSource {
    async fn suggest(&self, query: &str) -> Result<Vec<Suggestion>, ClientError> {
        let suggestions: Vec<Suggestion> = self
            .http
            .get(self.endpoint.clone())
            .query(&[("q", query)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(suggestions)
    }
}
