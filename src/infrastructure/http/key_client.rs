use crate::domain::entities::{KeyPage, NoteworthyEntry, PageRequest, StatsDetails, StatsPeriod};
use crate::domain::errors::{ServiceError, ServiceResult};
use crate::domain::ports::key_service::KeyService;
use crate::infrastructure::http::dto::{DeleteKeysRequest, KeyPageBody};
use crate::infrastructure::http::response::{decode_response, Payload};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, COOKIE};
use reqwest::{Client, RequestBuilder, Url};
use std::time::Duration;
use tracing::{debug, warn};

/// [`KeyService`] over HTTP+JSON
pub struct HttpKeyService {
    http_client: Client,
    base_url: Url,
    timeout: Duration,
}

impl HttpKeyService {
    /// Create a client rooted at `base_url`.
    ///
    /// `auth_token`, when present, is sent as the `auth_token` cookie on every
    /// request, matching the session cookie the service's web login issues.
    pub fn new(base_url: &str, timeout: Duration, auth_token: Option<&str>) -> ServiceResult<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ServiceError::InvalidRequest(format!("Invalid base URL {}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ServiceError::InvalidRequest(format!(
                "Base URL cannot carry a path: {}",
                base_url
            )));
        }

        let mut headers = HeaderMap::new();
        if let Some(token) = auth_token {
            let value = HeaderValue::from_str(&format!("auth_token={}", token))
                .map_err(|_| ServiceError::InvalidRequest("Invalid auth token".to_string()))?;
            headers.insert(COOKIE, value);
        }

        let http_client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| ServiceError::InvalidRequest(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url,
            timeout,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> ServiceResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                ServiceError::InvalidRequest(format!("Base URL cannot carry a path: {}", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn execute(&self, request: RequestBuilder, operation: &str) -> ServiceResult<Payload> {
        let response = request.send().await.map_err(|e| {
            let err = if e.is_timeout() {
                ServiceError::Timeout(self.timeout)
            } else if e.is_connect() {
                ServiceError::Transport(format!("Connection failed: {}", e))
            } else {
                ServiceError::Transport(e.to_string())
            };
            warn!("{} failed: {}", operation, err);
            err
        })?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| {
            warn!("{} failed reading body: {}", operation, e);
            ServiceError::Transport(format!("Failed to read response body: {}", e))
        })?;

        match decode_response(status, &body) {
            Ok(payload) => {
                debug!("{} returned status {}", operation, status);
                Ok(payload)
            }
            Err(err) => {
                warn!("{} returned status {}: {}", operation, status, err);
                Err(err)
            }
        }
    }
}

fn require_key(key: &str) -> ServiceResult<()> {
    if key.trim().is_empty() {
        return Err(ServiceError::InvalidRequest("Key must not be empty".to_string()));
    }
    Ok(())
}

#[async_trait]
impl KeyService for HttpKeyService {
    async fn list_keys(&self, request: &PageRequest) -> ServiceResult<KeyPage> {
        let url = self.endpoint(&["api", "keys"])?;
        let query = [
            ("status", request.kind.as_str().to_string()),
            ("page", request.page.to_string()),
            ("limit", request.limit.to_string()),
            ("search", request.search.clone()),
        ];
        let payload = self
            .execute(self.http_client.get(url).query(&query), "List keys")
            .await?;
        let body: KeyPageBody = payload.json()?;
        Ok(body.into_page(request.kind))
    }

    async fn stats_details(&self, period: StatsPeriod) -> ServiceResult<StatsDetails> {
        let url = self.endpoint(&["api", "stats", "details"])?;
        let payload = self
            .execute(
                self.http_client.get(url).query(&[("period", period.as_str())]),
                "Stats details",
            )
            .await?;
        payload.json()
    }

    async fn attention_keys(
        &self,
        status_code: u16,
        limit: u32,
    ) -> ServiceResult<Vec<NoteworthyEntry>> {
        let url = self.endpoint(&["api", "stats", "attention-keys"])?;
        let query = [
            ("status_code", status_code.to_string()),
            ("limit", limit.to_string()),
        ];
        let payload = self
            .execute(self.http_client.get(url).query(&query), "Attention keys")
            .await?;
        payload.json()
    }

    async fn verify_key(&self, key: &str) -> ServiceResult<()> {
        require_key(key)?;
        let url = self.endpoint(&["gemini", "v1beta", "verify-key", key])?;
        self.execute(self.http_client.post(url), "Verify key")
            .await
            .map(|_| ())
    }

    async fn delete_key(&self, key: &str) -> ServiceResult<()> {
        require_key(key)?;
        let url = self.endpoint(&["api", "config", "keys", key])?;
        self.execute(self.http_client.delete(url), "Delete key")
            .await
            .map(|_| ())
    }

    async fn delete_keys(&self, keys: &[String]) -> ServiceResult<()> {
        let url = self.endpoint(&["api", "config", "keys", "delete-selected"])?;
        self.execute(
            self.http_client.post(url).json(&DeleteKeysRequest { keys }),
            "Delete selected keys",
        )
        .await
        .map(|_| ())
    }
}
