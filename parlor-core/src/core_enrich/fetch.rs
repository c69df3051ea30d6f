//! URL fetching behind a trait so the pipeline can run against canned
//! responses in tests.

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::EnrichmentConfig;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("response too large: {got} bytes exceeds limit of {limit}")]
    TooLarge { got: usize, limit: usize },

    #[error("client init failed: {0}")]
    Init(String),
}

/// Fetches the raw bytes behind a URL.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// Production fetcher backed by a shared reqwest client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    max_response_bytes: usize,
}

impl HttpFetcher {
    pub fn from_config(config: &EnrichmentConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(config.fetch_timeout)
            .user_agent(concat!("parlor/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|err| FetchError::Init(err.to_string()))?;

        Ok(Self {
            client,
            max_response_bytes: config.max_response_bytes,
        })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| FetchError::Request(err.to_string()))?
            .error_for_status()
            .map_err(|err| FetchError::Request(err.to_string()))?;

        // Declared length check first, then the real length once the body
        // is in hand. Servers are free to lie about the former.
        if let Some(declared) = response.content_length() {
            if declared as usize > self.max_response_bytes {
                return Err(FetchError::TooLarge {
                    got: declared as usize,
                    limit: self.max_response_bytes,
                });
            }
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|err| FetchError::Request(err.to_string()))?;

        if bytes.len() > self.max_response_bytes {
            return Err(FetchError::TooLarge {
                got: bytes.len(),
                limit: self.max_response_bytes,
            });
        }

        Ok(bytes.to_vec())
    }
}

/// In-memory fetcher serving canned responses, keyed by exact URL.
#[derive(Debug, Clone, Default)]
pub struct StaticFetcher {
    responses: HashMap<String, Vec<u8>>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(mut self, url: &str, bytes: impl Into<Vec<u8>>) -> Self {
        self.responses.insert(url.to_string(), bytes.into());
        self
    }
}

#[async_trait]
impl Fetcher for StaticFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        self.responses
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::Request(format!("no canned response for {}", url)))
    }
}
