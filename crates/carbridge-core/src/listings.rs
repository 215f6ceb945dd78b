use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::CoreError;

/// Which kind of import a request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportMode {
    /// One listing detail page, e.g. `https://fem.encar.com/cars/detail/38526217`.
    Single,
    /// A seller's whole catalog page, e.g.
    /// `https://www.encar.com/dc/dc_carsearchlist.do?method=sellcar&sellid=…`.
    Bulk,
}

impl ImportMode {
    /// The wire/DB spelling of this mode (`"single"` / `"bulk"`).
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ImportMode::Single => "single",
            ImportMode::Bulk => "bulk",
        }
    }
}

impl std::fmt::Display for ImportMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ImportMode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "single" => Ok(ImportMode::Single),
            "bulk" => Ok(ImportMode::Bulk),
            other => Err(CoreError::InvalidImportMode(other.to_string())),
        }
    }
}

/// A vehicle listing extracted from Encar, normalized for persistence.
///
/// Transient value: produced by an extractor, consumed by the import run.
/// Everything beyond make/model/year/price is best-effort and may be absent
/// depending on how much the source page exposes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedListing {
    /// Encar's numeric listing ID, stored as a string to avoid precision loss.
    /// Together with the importing dealer it is the deduplication key.
    pub encar_id: String,
    /// Canonical detail-page URL, e.g. `"https://fem.encar.com/cars/detail/38526217"`.
    pub encar_url: String,
    pub make: String,
    pub model: String,
    pub year: i32,
    /// Asking price in Korean won, e.g. `25_000_000`.
    pub price_krw: i64,
    /// Asking price converted to USD at the run's conversion rate,
    /// rounded to two decimal places.
    pub price_usd: Decimal,
    pub mileage: Option<i32>,
    pub fuel_type: Option<String>,
    pub transmission: Option<String>,
    /// Engine displacement in cc.
    pub displacement: Option<i32>,
    pub engine_type: Option<String>,
    pub drive_type: Option<String>,
    pub body_type: Option<String>,
    pub color_exterior: Option<String>,
    pub color_interior: Option<String>,
    pub seating_capacity: Option<i32>,
    pub vin: Option<String>,
    pub chassis_number: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub features: Vec<String>,
    pub seller_name: Option<String>,
    pub seller_phone: Option<String>,
    pub location_city: Option<String>,
    pub location_region: Option<String>,
    /// Image URLs in source display order; index 0 is the main photo.
    pub images: Vec<String>,
}

impl NormalizedListing {
    /// Returns the number of images carried by this listing.
    #[must_use]
    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    /// Returns the listing title, or a `"{year} {make} {model}"` fallback
    /// when the source page had none.
    #[must_use]
    pub fn display_title(&self) -> String {
        self.title
            .clone()
            .unwrap_or_else(|| format!("{} {} {}", self.year, self.make, self.model))
    }
}
