//! Error types for Encar extraction and FX rate lookups.

use thiserror::Error;

/// Errors produced while validating URLs, calling the Encar read API, or
/// normalizing its payloads.
#[derive(Debug, Error)]
pub enum EncarError {
    /// Network-level failure from `reqwest` (DNS, connect, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The response body was not valid JSON for the shape we expected.
    /// `context` names the endpoint or payload being parsed.
    #[error("failed to deserialize {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// The API answered 429. `retry_after_secs` comes from the
    /// `Retry-After` header when present, otherwise a default.
    #[error("rate limited by {domain}, retry after {retry_after_secs}s")]
    RateLimited { domain: String, retry_after_secs: u64 },

    /// The API answered 404 for a listing or seller that does not exist
    /// (or is no longer advertised).
    #[error("listing not found: {url}")]
    NotFound { url: String },

    /// Any non-success status that is not specifically 404 or 429.
    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    /// The URL does not match the accepted Encar detail or seller-catalog
    /// patterns. `reason` says which pattern was expected.
    #[error("invalid Encar URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },

    /// A payload was structurally valid JSON but missing data we cannot
    /// import without (make, model, year, or price).
    #[error("cannot normalize listing {encar_id}: {reason}")]
    Normalization { encar_id: String, reason: String },

    /// Catalog pagination ran past the safety limit without terminating.
    #[error("seller {seller_id} exceeded the pagination limit of {max_pages} pages")]
    PaginationLimit { seller_id: String, max_pages: u32 },

    /// An FX endpoint or configured fallback produced a rate we refuse to
    /// divide by (non-finite, zero, or negative).
    #[error("unusable FX rate: {reason}")]
    InvalidRate { reason: String },
}
