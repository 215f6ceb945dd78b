//! The extractor seam between the import pipeline and Encar.
//!
//! [`ListingExtractor`] is the trait the import coordinator works
//! against. [`EncarExtractor`] is the production implementation backed
//! by the read API; [`crate::fixture::FixtureExtractor`] serves
//! deterministic listings for development environments and tests.

use std::sync::Arc;

use carbridge_core::NormalizedListing;

use crate::client::EncarClient;
use crate::error::EncarError;
use crate::normalize::{normalize_detail, normalize_search_item};
use crate::rates::RateProvider;
use crate::urls;

/// Options for a seller-catalog extraction.
#[derive(Debug, Clone, Copy)]
pub struct CatalogOptions {
    /// Skip rows whose advertisement has ended. On by default; dealers
    /// rarely want to import cars that can no longer be bought.
    pub only_active: bool,
}

impl Default for CatalogOptions {
    fn default() -> Self {
        Self { only_active: true }
    }
}

/// Extracts normalized listings from a dealer-supplied URL.
#[async_trait::async_trait]
pub trait ListingExtractor: Send + Sync {
    /// Extracts the one listing behind a detail URL. Returns a vector
    /// so single and catalog extractions feed the same pipeline; a
    /// success always holds exactly one listing.
    async fn parse_single(&self, url: &str) -> Result<Vec<NormalizedListing>, EncarError>;

    /// Extracts every listing in a seller's catalog. Rows that fail
    /// normalization are skipped with a warning, not fatal; a whole
    /// catalog should not be lost to one malformed row.
    async fn parse_seller_catalog(
        &self,
        url: &str,
        options: CatalogOptions,
    ) -> Result<Vec<NormalizedListing>, EncarError>;
}

/// Production extractor backed by the Encar read API.
pub struct EncarExtractor {
    client: EncarClient,
    rates: Arc<RateProvider>,
}

impl EncarExtractor {
    #[must_use]
    pub fn new(client: EncarClient, rates: Arc<RateProvider>) -> Self {
        Self { client, rates }
    }
}

#[async_trait::async_trait]
impl ListingExtractor for EncarExtractor {
    async fn parse_single(&self, url: &str) -> Result<Vec<NormalizedListing>, EncarError> {
        let listing_id = require_listing_id(url)?;

        let rate = self.rates.conversion_rate().await;
        let detail = self.client.fetch_vehicle_detail(&listing_id).await?;
        Ok(vec![normalize_detail(detail, rate)?])
    }

    async fn parse_seller_catalog(
        &self,
        url: &str,
        options: CatalogOptions,
    ) -> Result<Vec<NormalizedListing>, EncarError> {
        let seller_id = require_seller_id(url)?;

        let rate = self.rates.conversion_rate().await;
        let items = self.client.fetch_all_seller_listings(&seller_id).await?;
        let total = items.len();

        let mut listings = Vec::with_capacity(total);
        for item in items {
            if options.only_active && !item.is_active() {
                tracing::debug!(encar_id = item.id, "skipping inactive listing");
                continue;
            }
            let encar_id = item.id;
            match normalize_search_item(item, rate) {
                Ok(listing) => listings.push(listing),
                Err(error) => {
                    tracing::warn!(
                        encar_id,
                        error = %error,
                        "skipping catalog row that failed normalization"
                    );
                }
            }
        }
        tracing::info!(
            seller_id = %seller_id,
            fetched = total,
            extracted = listings.len(),
            "extracted seller catalog"
        );
        Ok(listings)
    }
}

/// Validates a detail URL and pulls out its listing id.
pub(crate) fn require_listing_id(url: &str) -> Result<String, EncarError> {
    if !urls::is_single_listing_url(url) {
        return Err(EncarError::InvalidUrl {
            url: url.to_string(),
            reason: "expected a detail URL like https://fem.encar.com/cars/detail/<id>"
                .to_string(),
        });
    }
    urls::extract_listing_id(url).ok_or_else(|| EncarError::InvalidUrl {
        url: url.to_string(),
        reason: "detail URL carries no listing id".to_string(),
    })
}

/// Validates a catalog URL and pulls out its seller id.
pub(crate) fn require_seller_id(url: &str) -> Result<String, EncarError> {
    if !urls::is_seller_catalog_url(url) {
        return Err(EncarError::InvalidUrl {
            url: url.to_string(),
            reason:
                "expected a catalog URL like https://www.encar.com/dc/dc_carsearchlist.do?method=sellcar&sellid=<id>"
                    .to_string(),
        });
    }
    urls::extract_seller_id(url).ok_or_else(|| EncarError::InvalidUrl {
        url: url.to_string(),
        reason: "catalog URL is missing the sellid parameter".to_string(),
    })
}
