use reqwest::{Client, StatusCode};
use std::time::Duration;

use crate::types::Proof;

/// Server response to a submitted proof.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Quote(String),
    /// The digest missed the difficulty; solve a new proof.
    PredicateFailed(String),
    Malformed(String),
    /// Already accepted recently; do not resend it.
    Duplicate(String),
    Unexpected { status: u16, body: String },
}

impl FetchOutcome {
    pub fn from_response(status: StatusCode, body: String) -> Self {
        match status {
            StatusCode::OK => FetchOutcome::Quote(body),
            StatusCode::FORBIDDEN => FetchOutcome::PredicateFailed(body),
            StatusCode::BAD_REQUEST => FetchOutcome::Malformed(body),
            StatusCode::TOO_MANY_REQUESTS => FetchOutcome::Duplicate(body),
            other => FetchOutcome::Unexpected {
                status: other.as_u16(),
                body,
            },
        }
    }
}

/// HTTP client for the quote server.
#[derive(Debug, Clone)]
pub struct QuoteClient {
    http: Client,
    base_url: String,
}

impl QuoteClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .timeout(Duration::from_secs(10))
            .user_agent(concat!("powgate/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
        })
    }

    pub fn url_for(&self, proof: &Proof) -> String {
        format!("{}/{}", self.base_url, proof.encode())
    }

    pub async fn fetch(&self, proof: &Proof) -> Result<FetchOutcome, reqwest::Error> {
        let response = self.http.get(self.url_for(proof)).send().await?;
        let status = response.status();
        let body = response.text().await?;
        Ok(FetchOutcome::from_response(status, body))
    }
}
