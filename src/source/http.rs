//! [`ItemSource`] backed by the Hacker News Firebase REST API.
//!
//! Every call runs under the transport policy in [`HttpSourceConfig`]: a
//! per-attempt timeout, exponential backoff retries for transient failures,
//! and a total deadline across all attempts.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use reqwest::{Client as HttpClient, StatusCode, Url};
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use super::config::HttpSourceConfig;
use super::error::{SourceError, SourceResult};
use super::ItemSource;
use crate::model::{ItemId, RawItem};

const BEST_STORIES_PATH: &str = "v0/beststories.json";
const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

enum AttemptError {
    Retryable(SourceError),
    Fatal(SourceError),
}

/// HTTP client for the `beststories` and `item` endpoints.
#[derive(Debug, Clone)]
pub struct HttpItemSource {
    http: HttpClient,
    base_url: Url,
    config: HttpSourceConfig,
}

impl HttpItemSource {
    /// Builds a client for `config.base_url`. Fails if the URL is not absolute http(s).
    pub fn new(config: HttpSourceConfig) -> SourceResult<Self> {
        let base_url = parse_base_url(&config.base_url)?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = HttpClient::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(config.attempt_timeout)
            .build()
            .map_err(|e| SourceError::transport(base_url.as_str(), e))?;

        Ok(Self {
            http,
            base_url,
            config,
        })
    }

    /// Returns the active transport policy.
    pub fn config(&self) -> &HttpSourceConfig {
        &self.config
    }

    /// Returns the normalized API root.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> SourceResult<Url> {
        self.base_url
            .join(path)
            .map_err(|e| SourceError::transport(format!("{}{}", self.base_url, path), e))
    }

    /// GETs `url` as JSON. `Ok(None)` means the upstream answered `null`, or 404
    /// when `missing_is_none` is set. Otherwise a 404 is a final transport error.
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &Url,
        missing_is_none: bool,
        cancel: &CancellationToken,
    ) -> SourceResult<Option<T>> {
        let deadline = self.config.request_timeout;
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(SourceError::Cancelled),
            outcome = tokio::time::timeout(deadline, self.get_json_with_retries(url, missing_is_none)) => {
                outcome.unwrap_or_else(|_| {
                    Err(SourceError::transport(
                        url.as_str(),
                        format!("timed out after {:?}", deadline),
                    ))
                })
            }
        }
    }

    async fn get_json_with_retries<T: DeserializeOwned>(
        &self,
        url: &Url,
        missing_is_none: bool,
    ) -> SourceResult<Option<T>> {
        let mut retries = 0u32;
        loop {
            let err = match self.attempt(url, missing_is_none).await {
                Ok(body) => return Ok(body),
                Err(AttemptError::Fatal(err)) => return Err(err),
                Err(AttemptError::Retryable(err)) => err,
            };

            if retries >= self.config.max_retries {
                return Err(err);
            }
            retries += 1;

            let delay = self.config.backoff_for(retries);
            debug!(
                url = %url,
                retry = retries,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "Retrying request"
            );
            tokio::time::sleep(delay).await;
        }
    }

    async fn attempt<T: DeserializeOwned>(
        &self,
        url: &Url,
        missing_is_none: bool,
    ) -> Result<Option<T>, AttemptError> {
        let resp = self.http.get(url.clone()).send().await.map_err(|e| {
            let err = SourceError::transport(url.as_str(), &e);
            if e.is_builder() {
                AttemptError::Fatal(err)
            } else {
                AttemptError::Retryable(err)
            }
        })?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND && missing_is_none {
            return Ok(None);
        }
        if !status.is_success() {
            let err = SourceError::transport(url.as_str(), format!("unexpected status {status}"));
            return Err(if is_transient(status) {
                AttemptError::Retryable(err)
            } else {
                AttemptError::Fatal(err)
            });
        }

        let body = resp
            .bytes()
            .await
            .map_err(|e| AttemptError::Retryable(SourceError::transport(url.as_str(), e)))?;

        serde_json::from_slice::<Option<T>>(&body).map_err(|e| {
            AttemptError::Fatal(SourceError::transport(
                url.as_str(),
                format!("invalid JSON body: {e}"),
            ))
        })
    }
}

#[async_trait]
impl ItemSource for HttpItemSource {
    #[instrument(level = "debug", skip(self, cancel))]
    async fn list_ids(&self, cancel: &CancellationToken) -> SourceResult<Vec<ItemId>> {
        let url = self.endpoint(BEST_STORIES_PATH)?;
        match self.get_json::<Vec<ItemId>>(&url, false, cancel).await {
            Ok(ids) => Ok(ids.unwrap_or_default()),
            Err(e) => {
                if !e.is_cancelled() {
                    warn!(url = %url, error = %e, "Failed to fetch best story ids");
                }
                Err(e)
            }
        }
    }

    #[instrument(level = "debug", skip(self, cancel))]
    async fn get_detail(&self, id: ItemId, cancel: &CancellationToken) -> SourceResult<RawItem> {
        let url = self.endpoint(&format!("v0/item/{id}.json"))?;
        match self.get_json::<RawItem>(&url, true, cancel).await {
            Ok(Some(mut item)) => {
                if item.id == 0 {
                    item.id = id;
                }
                Ok(item)
            }
            Ok(None) => {
                warn!(id, "Story not found upstream");
                Err(SourceError::NotFound { id })
            }
            Err(e) => {
                if !e.is_cancelled() {
                    warn!(id, url = %url, error = %e, "Failed to fetch story details");
                }
                Err(e)
            }
        }
    }
}

/// 408, 429 and 5xx are worth another attempt; other statuses are final.
fn is_transient(status: StatusCode) -> bool {
    status.is_server_error()
        || status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
}

fn parse_base_url(raw: &str) -> SourceResult<Url> {
    let mut normalized = raw.trim().to_string();
    if !normalized.ends_with('/') {
        normalized.push('/');
    }

    let url = Url::parse(&normalized).map_err(|e| SourceError::transport(raw, e))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(SourceError::transport(
            raw,
            format!("unsupported scheme '{other}'"),
        )),
    }
}
