//! Encar listing extraction: URL contracts, read-API client, payload
//! normalization, and KRW→USD conversion rates.

pub mod client;
pub mod error;
pub mod extract;
pub mod fixture;
pub mod normalize;
pub mod rate_limit;
pub mod rates;
pub mod types;
pub mod urls;

pub use client::{EncarClient, EncarClientConfig};
pub use error::EncarError;
pub use extract::{CatalogOptions, EncarExtractor, ListingExtractor};
pub use fixture::FixtureExtractor;
pub use rates::{convert_krw_to_usd, RateProvider, RateProviderConfig};
pub use types::{EncarSearchItem, EncarSearchPage, EncarVehicleDetail};
