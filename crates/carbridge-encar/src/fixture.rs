//! Deterministic extractor for development and tests.
//!
//! Serves a fixed Hyundai Sonata for any valid detail URL and a fixed
//! two-car catalog (a Kia K5 and a Hyundai Tucson) for any valid seller
//! URL. URL validation is identical to the live extractor, so request
//! handling and persistence can be exercised end to end without
//! touching Encar. Prices still go through the shared [`RateProvider`]
//! so USD amounts reflect the configured rate.

use std::sync::Arc;

use carbridge_core::NormalizedListing;
use rust_decimal::Decimal;

use crate::error::EncarError;
use crate::extract::{require_listing_id, require_seller_id, CatalogOptions, ListingExtractor};
use crate::rates::{convert_krw_to_usd, RateProvider};
use crate::urls;

pub struct FixtureExtractor {
    rates: Arc<RateProvider>,
}

impl FixtureExtractor {
    #[must_use]
    pub fn new(rates: Arc<RateProvider>) -> Self {
        Self { rates }
    }
}

#[async_trait::async_trait]
impl ListingExtractor for FixtureExtractor {
    async fn parse_single(&self, url: &str) -> Result<Vec<NormalizedListing>, EncarError> {
        let listing_id = require_listing_id(url)?;
        let rate = self.rates.conversion_rate().await;
        Ok(vec![sonata(&listing_id, url, rate)])
    }

    async fn parse_seller_catalog(
        &self,
        url: &str,
        _options: CatalogOptions,
    ) -> Result<Vec<NormalizedListing>, EncarError> {
        // Fixture rows are all live, so `only_active` has nothing to do.
        require_seller_id(url)?;
        let rate = self.rates.conversion_rate().await;
        Ok(vec![k5(rate), tucson(rate)])
    }
}

fn sonata(listing_id: &str, url: &str, rate: Decimal) -> NormalizedListing {
    let price_krw = 25_000_000;
    NormalizedListing {
        encar_id: listing_id.to_string(),
        encar_url: url.to_string(),
        make: "Hyundai".to_string(),
        model: "Sonata".to_string(),
        year: 2021,
        price_krw,
        price_usd: convert_krw_to_usd(price_krw, rate),
        mileage: Some(45_000),
        fuel_type: Some("Gasoline".to_string()),
        transmission: Some("Automatic".to_string()),
        displacement: Some(2000),
        engine_type: Some("Gasoline".to_string()),
        drive_type: Some("FWD".to_string()),
        body_type: Some("Sedan".to_string()),
        color_exterior: Some("White".to_string()),
        color_interior: Some("Black".to_string()),
        seating_capacity: Some(5),
        vin: None,
        chassis_number: None,
        title: Some("2021 Hyundai Sonata".to_string()),
        description: Some("Well-maintained vehicle with full service history".to_string()),
        features: vec![
            "Leather seats".to_string(),
            "Navigation".to_string(),
            "Sunroof".to_string(),
        ],
        seller_name: Some("Premium Auto".to_string()),
        seller_phone: None,
        location_city: Some("Seoul".to_string()),
        location_region: Some("Gangnam".to_string()),
        images: vec![
            "https://images.pexels.com/photos/3802510/pexels-photo-3802510.jpeg".to_string(),
            "https://images.pexels.com/photos/3874337/pexels-photo-3874337.jpeg".to_string(),
        ],
    }
}

fn k5(rate: Decimal) -> NormalizedListing {
    let price_krw = 28_000_000;
    NormalizedListing {
        encar_id: "10001".to_string(),
        encar_url: urls::detail_url(10_001),
        make: "Kia".to_string(),
        model: "K5".to_string(),
        year: 2022,
        price_krw,
        price_usd: convert_krw_to_usd(price_krw, rate),
        mileage: Some(30_000),
        fuel_type: Some("Gasoline".to_string()),
        transmission: Some("Automatic".to_string()),
        displacement: None,
        engine_type: None,
        drive_type: None,
        body_type: Some("Sedan".to_string()),
        color_exterior: None,
        color_interior: None,
        seating_capacity: None,
        vin: None,
        chassis_number: None,
        title: Some("2022 Kia K5".to_string()),
        description: None,
        features: Vec::new(),
        seller_name: None,
        seller_phone: None,
        location_city: None,
        location_region: None,
        images: vec![
            "https://images.pexels.com/photos/3802510/pexels-photo-3802510.jpeg".to_string(),
        ],
    }
}

fn tucson(rate: Decimal) -> NormalizedListing {
    let price_krw = 32_000_000;
    NormalizedListing {
        encar_id: "10002".to_string(),
        encar_url: urls::detail_url(10_002),
        make: "Hyundai".to_string(),
        model: "Tucson".to_string(),
        year: 2021,
        price_krw,
        price_usd: convert_krw_to_usd(price_krw, rate),
        mileage: Some(25_000),
        fuel_type: Some("Diesel".to_string()),
        transmission: Some("Automatic".to_string()),
        displacement: None,
        engine_type: None,
        drive_type: None,
        body_type: Some("SUV".to_string()),
        color_exterior: None,
        color_interior: None,
        seating_capacity: None,
        vin: None,
        chassis_number: None,
        title: Some("2021 Hyundai Tucson".to_string()),
        description: None,
        features: Vec::new(),
        seller_name: None,
        seller_phone: None,
        location_city: None,
        location_region: None,
        images: vec![
            "https://images.pexels.com/photos/3874337/pexels-photo-3874337.jpeg".to_string(),
        ],
    }
}
