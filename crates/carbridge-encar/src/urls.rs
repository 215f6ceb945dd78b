//! URL contracts for accepted Encar import sources.
//!
//! Two shapes of URL are accepted, matching what dealers paste out of
//! their browser:
//!
//! ```text
//! https://fem.encar.com/cars/detail/38526217            (single listing)
//! https://www.encar.com/dc/dc_carsearchlist.do?method=sellcar&sellid=102938
//!                                                       (seller catalog)
//! ```
//!
//! Both patterns are prefix matches: trailing query parameters and
//! fragments are tolerated, but the scheme, host, and path must match
//! exactly. The catalog pattern requires `method=sellcar` as the first
//! query parameter because that is the only form the Encar site itself
//! generates.

use carbridge_core::ImportMode;
use regex::Regex;

/// Returns true when `url` points at a single Encar listing detail page.
#[must_use]
pub fn is_single_listing_url(url: &str) -> bool {
    let pattern = Regex::new(r"^https?://fem\.encar\.com/cars/detail/\d+")
        .expect("valid single-listing regex");
    pattern.is_match(url)
}

/// Returns true when `url` points at an Encar seller catalog page.
#[must_use]
pub fn is_seller_catalog_url(url: &str) -> bool {
    let pattern = Regex::new(r"^https?://www\.encar\.com/dc/dc_carsearchlist\.do\?method=sellcar")
        .expect("valid seller-catalog regex");
    pattern.is_match(url)
}

/// Returns true when `url` matches the pattern required for `mode`.
#[must_use]
pub fn matches_mode(mode: ImportMode, url: &str) -> bool {
    match mode {
        ImportMode::Single => is_single_listing_url(url),
        ImportMode::Bulk => is_seller_catalog_url(url),
    }
}

/// Extracts the numeric listing id from a detail URL.
///
/// Returns `None` when the URL has no `/cars/detail/<digits>` segment.
#[must_use]
pub fn extract_listing_id(url: &str) -> Option<String> {
    let pattern = Regex::new(r"/cars/detail/(\d+)").expect("valid listing-id regex");
    pattern
        .captures(url)
        .map(|caps| caps[1].to_string())
}

/// Canonical detail-page URL for a listing id. Stored on imported rows
/// so every copy of the same listing links to the same page no matter
/// which URL variant the dealer pasted.
#[must_use]
pub fn detail_url(listing_id: i64) -> String {
    format!("https://fem.encar.com/cars/detail/{listing_id}")
}

/// Extracts the numeric seller id from a catalog URL's `sellid` query
/// parameter.
///
/// Returns `None` when the parameter is absent or non-numeric. The
/// catalog prefix check deliberately does not require `sellid`;
/// extractors check it separately so the error can name the missing
/// parameter.
#[must_use]
pub fn extract_seller_id(url: &str) -> Option<String> {
    let pattern = Regex::new(r"[?&]sellid=(\d+)").expect("valid seller-id regex");
    pattern
        .captures(url)
        .map(|caps| caps[1].to_string())
}
