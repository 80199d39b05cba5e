//! Scryfall API client.
//!
//! Scryfall requires:
//! - A User-Agent and an Accept header on every request
//! - Rate limiting: roughly 10 requests per second

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{Client, Response, StatusCode};
use tracing::{debug, warn};

use super::rate_limiter::MinIntervalLimiter;
use super::types::{AutocompleteResponse, BulkCatalogResponse, BulkFeed};
use super::{CardSource, NameMatch, ScryfallError};
use crate::card::ExternalCard;
use crate::config::ScryfallConfig;
use crate::metrics::{EXTERNAL_REQUESTS, EXTERNAL_REQUEST_DURATION};

/// HTTP client for the Scryfall API, with its own rate limiter.
pub struct ScryfallClient {
    client: Client,
    base_url: String,
    limiter: MinIntervalLimiter,
    /// Whole-request deadline for API calls.
    request_timeout: Duration,
    /// Whole-request deadline for bulk downloads; `None` leaves them to the
    /// caller's own deadline.
    download_timeout: Option<Duration>,
}

impl ScryfallClient {
    /// Create a new Scryfall client.
    pub fn new(config: ScryfallConfig) -> Result<Self, ScryfallError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json;q=0.9,*/*;q=0.8"));

        let request_timeout = Duration::from_secs(config.timeout_secs);

        // No client-wide total timeout: it would also cap the bulk body read
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .default_headers(headers)
            .connect_timeout(request_timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            limiter: MinIntervalLimiter::new(Duration::from_millis(config.rate_limit_ms)),
            request_timeout,
            download_timeout: match config.download_timeout_secs {
                0 => None,
                secs => Some(Duration::from_secs(secs)),
            },
        })
    }

    /// API base URL without trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Rate-limited GET, recording request metrics.
    async fn get(
        &self,
        operation: &'static str,
        url: &str,
        query: &[(&str, &str)],
        timeout: Option<Duration>,
    ) -> Result<Response, ScryfallError> {
        self.limiter.acquire().await;

        let mut request = self.client.get(url).query(query);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let started = Instant::now();
        let result = request.send().await;
        EXTERNAL_REQUEST_DURATION
            .with_label_values(&[operation])
            .observe(started.elapsed().as_secs_f64());

        let status = match &result {
            Ok(response) if response.status().is_success() => "success",
            _ => "error",
        };
        EXTERNAL_REQUESTS
            .with_label_values(&[operation, status])
            .inc();

        Ok(result?)
    }

    /// Map a single-card response to a record or an error.
    async fn card_response(response: Response, key: &str) -> Result<ExternalCard, ScryfallError> {
        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            warn!("Scryfall rate limit exceeded");
            return Err(ScryfallError::RateLimitExceeded);
        }
        if status == StatusCode::NOT_FOUND {
            return Err(ScryfallError::NotFound(key.to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ScryfallError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        response.json().await.map_err(|e| {
            ScryfallError::ParseError(format!("Failed to parse card response: {}", e))
        })
    }
}

#[async_trait]
impl CardSource for ScryfallClient {
    async fn list_bulk_feeds(&self) -> Result<Vec<BulkFeed>, ScryfallError> {
        let url = format!("{}/bulk-data", self.base_url);
        debug!("Scryfall bulk catalog: {}", url);

        let response = self
            .get("bulk_catalog", &url, &[], Some(self.request_timeout))
            .await
            .map_err(|e| ScryfallError::CatalogUnavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScryfallError::CatalogUnavailable(format!(
                "catalog endpoint returned HTTP {}",
                status.as_u16()
            )));
        }

        let catalog: BulkCatalogResponse = response.json().await.map_err(|e| {
            ScryfallError::ParseError(format!("Failed to parse bulk catalog: {}", e))
        })?;

        Ok(catalog.data)
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, ScryfallError> {
        debug!("Scryfall bulk download: {}", url);

        let response = self
            .get("bulk_download", url, &[], self.download_timeout)
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScryfallError::DownloadFailed {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        Ok(body.to_vec())
    }

    async fn card_by_id(&self, id: &str) -> Result<ExternalCard, ScryfallError> {
        let url = format!("{}/cards/{}", self.base_url, urlencoding::encode(id));
        debug!("Scryfall get card: id={}", id);

        let response = self
            .get("card_by_id", &url, &[], Some(self.request_timeout))
            .await?;
        Self::card_response(response, id).await
    }

    async fn card_by_name(
        &self,
        name: &str,
        mode: NameMatch,
    ) -> Result<ExternalCard, ScryfallError> {
        let url = format!("{}/cards/named", self.base_url);
        debug!("Scryfall named lookup: name='{}', mode={:?}", name, mode);

        let response = self
            .get(
                "card_by_name",
                &url,
                &[(mode.as_param(), name)],
                Some(self.request_timeout),
            )
            .await?;
        Self::card_response(response, name).await
    }

    async fn autocomplete(&self, prefix: &str) -> Vec<String> {
        let url = format!("{}/cards/autocomplete", self.base_url);

        let response = match self
            .get("autocomplete", &url, &[("q", prefix)], Some(self.request_timeout))
            .await
        {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => {
                debug!("Scryfall autocomplete returned HTTP {}", response.status());
                return Vec::new();
            }
            Err(e) => {
                debug!("Scryfall autocomplete failed: {}", e);
                return Vec::new();
            }
        };

        match response.json::<AutocompleteResponse>().await {
            Ok(completions) => completions.data,
            Err(e) => {
                debug!("Failed to parse autocomplete response: {}", e);
                Vec::new()
            }
        }
    }
}
