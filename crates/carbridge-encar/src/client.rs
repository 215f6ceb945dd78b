//! HTTP client for the Encar read API.
//!
//! Wraps a single `reqwest::Client` configured with timeouts and a
//! stable user agent, classifies non-success statuses into
//! [`EncarError`] variants, and paginates the seller search endpoint
//! with a hard page cap plus a polite inter-request delay.

use std::time::Duration;

use reqwest::{header, StatusCode};
use serde::de::DeserializeOwned;

use crate::error::EncarError;
use crate::rate_limit::retry_with_backoff;
use crate::types::{EncarSearchItem, EncarSearchPage, EncarVehicleDetail};

/// Hard cap on catalog pages per seller. A real seller inventory is a
/// few pages; hitting this means the endpoint stopped terminating.
const MAX_PAGES: u32 = 200;

/// Connection establishment timeout, separate from the overall request
/// timeout.
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Backoff applied to a 429 with no `Retry-After` header.
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// Everything needed to build an [`EncarClient`]. The server and CLI
/// fill this from [`carbridge_core::AppConfig`]; tests fill it by hand
/// with a mock server's URL.
#[derive(Debug, Clone)]
pub struct EncarClientConfig {
    pub api_base: String,
    pub timeout_secs: u64,
    pub user_agent: String,
    pub page_size: u32,
    pub inter_request_delay_ms: u64,
    pub max_retries: u32,
    pub backoff_base_secs: u64,
}

impl EncarClientConfig {
    #[must_use]
    pub fn from_app_config(config: &carbridge_core::AppConfig) -> Self {
        Self {
            api_base: config.encar_api_base.clone(),
            timeout_secs: config.encar_request_timeout_secs,
            user_agent: config.encar_user_agent.clone(),
            page_size: config.encar_page_size,
            inter_request_delay_ms: config.encar_inter_request_delay_ms,
            max_retries: config.encar_max_retries,
            backoff_base_secs: config.encar_retry_backoff_base_secs,
        }
    }
}

pub struct EncarClient {
    client: reqwest::Client,
    api_base: String,
    domain: String,
    page_size: u32,
    inter_request_delay_ms: u64,
    max_retries: u32,
    backoff_base_secs: u64,
}

impl EncarClient {
    /// Builds the client. Fails only if the underlying TLS/connection
    /// stack cannot be initialized.
    pub fn new(config: EncarClientConfig) -> Result<Self, EncarError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .user_agent(&config.user_agent)
            .build()?;

        let api_base = config.api_base.trim_end_matches('/').to_string();
        let domain = host_of(&api_base);

        Ok(Self {
            client,
            api_base,
            domain,
            // A zero page size would never advance the offset.
            page_size: config.page_size.max(1),
            inter_request_delay_ms: config.inter_request_delay_ms,
            max_retries: config.max_retries,
            backoff_base_secs: config.backoff_base_secs,
        })
    }

    /// Fetches one vehicle from the readside detail endpoint.
    pub async fn fetch_vehicle_detail(
        &self,
        listing_id: &str,
    ) -> Result<EncarVehicleDetail, EncarError> {
        let url = self.vehicle_detail_url(listing_id);
        let context = format!("vehicle detail for listing {listing_id}");
        retry_with_backoff(self.max_retries, self.backoff_base_secs, || {
            self.get_json(&url, &context)
        })
        .await
    }

    /// Fetches one page of a seller's inventory.
    pub async fn fetch_seller_page(
        &self,
        seller_id: &str,
        offset: u32,
    ) -> Result<EncarSearchPage, EncarError> {
        let url = self.seller_page_url(seller_id, offset);
        let context = format!("search page for seller {seller_id} at offset {offset}");
        retry_with_backoff(self.max_retries, self.backoff_base_secs, || {
            self.get_json(&url, &context)
        })
        .await
    }

    /// Fetches a seller's entire inventory, page by page.
    ///
    /// Stops on the first short page (fewer items than the page size),
    /// sleeps `inter_request_delay_ms` between pages, and errors with
    /// [`EncarError::PaginationLimit`] after [`MAX_PAGES`] pages.
    pub async fn fetch_all_seller_listings(
        &self,
        seller_id: &str,
    ) -> Result<Vec<EncarSearchItem>, EncarError> {
        let mut items: Vec<EncarSearchItem> = Vec::new();
        let mut offset: u32 = 0;
        let mut pages: u32 = 0;

        loop {
            if pages >= MAX_PAGES {
                return Err(EncarError::PaginationLimit {
                    seller_id: seller_id.to_string(),
                    max_pages: MAX_PAGES,
                });
            }
            if pages > 0 && self.inter_request_delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.inter_request_delay_ms)).await;
            }

            let page = self.fetch_seller_page(seller_id, offset).await?;
            pages += 1;
            let fetched = page.search_results.len();
            items.extend(page.search_results);
            tracing::debug!(
                seller_id,
                offset,
                fetched,
                total = items.len(),
                "fetched seller catalog page"
            );

            if fetched < self.page_size as usize {
                break;
            }
            offset += self.page_size;
        }

        Ok(items)
    }

    fn vehicle_detail_url(&self, listing_id: &str) -> String {
        format!("{}/v1/readside/vehicle/{listing_id}", self.api_base)
    }

    fn seller_page_url(&self, seller_id: &str, offset: u32) -> String {
        format!(
            "{}/search/car/list/premium?sellid={seller_id}&offset={offset}&limit={}",
            self.api_base, self.page_size
        )
    }

    /// One GET, classified: 429 to `RateLimited` (honoring `Retry-After`),
    /// 404 to `NotFound`, other non-2xx to `UnexpectedStatus`, then JSON
    /// decode with `context` naming the payload.
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        context: &str,
    ) -> Result<T, EncarError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(header::RETRY_AFTER)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.parse().ok())
                .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
            return Err(EncarError::RateLimited {
                domain: self.domain.clone(),
                retry_after_secs,
            });
        }
        if status == StatusCode::NOT_FOUND {
            return Err(EncarError::NotFound {
                url: url.to_string(),
            });
        }
        if !status.is_success() {
            return Err(EncarError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|source| EncarError::Deserialize {
            context: context.to_string(),
            source,
        })
    }
}

fn host_of(api_base: &str) -> String {
    let stripped = api_base
        .trim_start_matches("https://")
        .trim_start_matches("http://");
    stripped
        .split('/')
        .next()
        .unwrap_or(stripped)
        .to_string()
}
