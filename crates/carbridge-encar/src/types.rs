//! Raw deserialization targets for the Encar read API.
//!
//! Two endpoints feed the importer:
//!
//! - `GET {api_base}/v1/readside/vehicle/{id}`: one vehicle with camelCase
//!   keys, nested `category` / `spec` / `advertisement` / `contact`
//!   objects and an ordered `photos` array.
//! - `GET {api_base}/search/car/list/premium?sellid=...&offset=...&limit=...`:
//!   one page of a seller's inventory with PascalCase keys and flat items.
//!
//! Field notes are based on observed responses. Anything the importer can
//! live without is `Option` or defaulted so that one odd listing fails
//! normalization on its own instead of failing the whole page at the
//! serde layer.

use serde::Deserialize;

/// Prefix for photo paths, which the API returns relative (`/carpicture/...`).
pub const PHOTO_CDN_BASE: &str = "https://ci.encar.com";

/// Both endpoints quote prices in units of 10,000 KRW (만원).
pub const KRW_PER_PRICE_UNIT: i64 = 10_000;

/// `advertisement.status` / `AdvertisementStatus` value for a listing that
/// is currently live on the site.
pub const STATUS_ADVERTISE: &str = "ADVERTISE";

/// One vehicle from the readside detail endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncarVehicleDetail {
    /// Numeric listing id; matches the id in the detail-page URL.
    pub vehicle_id: i64,
    #[serde(default)]
    pub category: EncarCategory,
    #[serde(default)]
    pub spec: EncarSpec,
    #[serde(default)]
    pub advertisement: EncarAdvertisement,
    #[serde(default)]
    pub contact: EncarContact,
    /// Photos in display order; the first one is the hero shot.
    #[serde(default)]
    pub photos: Vec<EncarPhoto>,
}

/// Make / model / year block of a detail payload.
///
/// English names are present for mainstream makes; the Korean-only
/// fields are not carried here because the importer never uses them.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncarCategory {
    #[serde(default)]
    pub manufacturer_english_name: Option<String>,
    #[serde(default)]
    pub model_group_english_name: Option<String>,
    #[serde(default)]
    pub grade_english_name: Option<String>,
    /// Model year as a string, e.g. `"2021"`.
    #[serde(default)]
    pub form_year: Option<String>,
    /// First-registration year and month, e.g. `"202103"`.
    #[serde(default)]
    pub year_month: Option<String>,
}

/// Mechanical spec block of a detail payload. Label fields
/// (`fuel_name`, `transmission_name`, ...) carry Korean display strings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncarSpec {
    #[serde(default)]
    pub mileage: Option<i32>,
    #[serde(default)]
    pub transmission_name: Option<String>,
    #[serde(default)]
    pub fuel_name: Option<String>,
    /// Engine displacement in cc.
    #[serde(default)]
    pub displacement: Option<i32>,
    #[serde(default)]
    pub body_name: Option<String>,
    #[serde(default)]
    pub seat_count: Option<i32>,
    #[serde(default)]
    pub color_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncarAdvertisement {
    /// Asking price in units of [`KRW_PER_PRICE_UNIT`].
    #[serde(default)]
    pub price: Option<i64>,
    /// [`STATUS_ADVERTISE`] while the listing is live.
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncarContact {
    #[serde(default)]
    pub dealer_name: Option<String>,
    /// Contact number as dialed, no formatting.
    #[serde(default, rename = "no")]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncarPhoto {
    pub path: String,
    /// Slot code such as `"OUT01"`; not needed for ordering, which the
    /// array position already provides.
    #[serde(default)]
    pub code: Option<String>,
}

impl EncarPhoto {
    /// Absolute URL for this photo.
    #[must_use]
    pub fn full_url(&self) -> String {
        full_photo_url(&self.path)
    }
}

/// Absolute URL for a photo `path` as the API returns it. Paths are
/// usually relative to the CDN; absolute ones pass through untouched.
#[must_use]
pub fn full_photo_url(path: &str) -> String {
    if path.starts_with("http") {
        path.to_string()
    } else {
        format!("{PHOTO_CDN_BASE}{path}")
    }
}

/// One page of the seller search endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EncarSearchPage {
    /// Total matching listings across all pages.
    #[serde(default)]
    pub count: i64,
    #[serde(default)]
    pub search_results: Vec<EncarSearchItem>,
}

/// One listing row from the seller search endpoint. Flat and far less
/// detailed than [`EncarVehicleDetail`]; rows that need full data have
/// to be fetched individually, which the importer deliberately does not
/// do for bulk runs.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EncarSearchItem {
    pub id: i64,
    #[serde(default)]
    pub manufacturer: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    /// Trim/grade suffix, e.g. `"Premium"`.
    #[serde(default)]
    pub badge: Option<String>,
    /// Model year as a string, e.g. `"2022"`.
    #[serde(default)]
    pub form_year: Option<String>,
    /// Asking price in units of [`KRW_PER_PRICE_UNIT`].
    #[serde(default)]
    pub price: Option<i64>,
    #[serde(default)]
    pub mileage: Option<i32>,
    /// Korean fuel label, e.g. `"가솔린"`.
    #[serde(default)]
    pub fuel_type: Option<String>,
    /// Korean transmission label, e.g. `"오토"`.
    #[serde(default)]
    pub transmission: Option<String>,
    /// Relative path of the main photo, if any.
    #[serde(default)]
    pub photo: Option<String>,
    #[serde(default)]
    pub advertisement_status: Option<String>,
}

impl EncarSearchItem {
    /// Whether the listing is still live. Rows without a status are
    /// treated as live; the search endpoint omits the field for some
    /// ordinary listings.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.advertisement_status
            .as_deref()
            .is_none_or(|status| status == STATUS_ADVERTISE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_deserializes_observed_payload() {
        let raw = r#"{
            "vehicleId": 38526217,
            "category": {
                "manufacturerEnglishName": "Hyundai",
                "modelGroupEnglishName": "Sonata",
                "gradeEnglishName": "Premium",
                "formYear": "2021",
                "yearMonth": "202103"
            },
            "spec": {
                "mileage": 45000,
                "transmissionName": "오토",
                "fuelName": "가솔린",
                "displacement": 1999,
                "bodyName": "중형차",
                "seatCount": 5,
                "colorName": "흰색"
            },
            "advertisement": { "price": 2500, "status": "ADVERTISE" },
            "contact": { "dealerName": "프리미엄오토", "no": "01012345678" },
            "photos": [
                { "path": "/carpicture/38526217_001.jpg", "code": "OUT01" },
                { "path": "/carpicture/38526217_002.jpg", "code": "OUT02" }
            ]
        }"#;

        let detail: EncarVehicleDetail = serde_json::from_str(raw).unwrap();
        assert_eq!(detail.vehicle_id, 38_526_217);
        assert_eq!(detail.category.manufacturer_english_name.as_deref(), Some("Hyundai"));
        assert_eq!(detail.spec.mileage, Some(45_000));
        assert_eq!(detail.advertisement.price, Some(2500));
        assert_eq!(detail.contact.phone.as_deref(), Some("01012345678"));
        assert_eq!(detail.photos.len(), 2);
        assert_eq!(
            detail.photos[0].full_url(),
            "https://ci.encar.com/carpicture/38526217_001.jpg"
        );
    }

    #[test]
    fn detail_tolerates_missing_blocks() {
        let detail: EncarVehicleDetail =
            serde_json::from_str(r#"{ "vehicleId": 1 }"#).unwrap();
        assert!(detail.category.manufacturer_english_name.is_none());
        assert!(detail.advertisement.price.is_none());
        assert!(detail.photos.is_empty());
    }

    #[test]
    fn search_page_deserializes_observed_payload() {
        let raw = r#"{
            "Count": 2,
            "SearchResults": [
                {
                    "Id": 10001,
                    "Manufacturer": "Kia",
                    "Model": "K5",
                    "FormYear": "2022",
                    "Price": 2800,
                    "Mileage": 30000,
                    "FuelType": "가솔린",
                    "Transmission": "오토",
                    "Photo": "/carpicture/10001_001.jpg",
                    "AdvertisementStatus": "ADVERTISE"
                },
                { "Id": 10002 }
            ]
        }"#;

        let page: EncarSearchPage = serde_json::from_str(raw).unwrap();
        assert_eq!(page.count, 2);
        assert_eq!(page.search_results.len(), 2);
        assert_eq!(page.search_results[0].manufacturer.as_deref(), Some("Kia"));
        assert!(page.search_results[1].model.is_none());
    }

    #[test]
    fn absolute_photo_paths_pass_through() {
        let photo = EncarPhoto {
            path: "https://images.example.com/a.jpg".to_string(),
            code: None,
        };
        assert_eq!(photo.full_url(), "https://images.example.com/a.jpg");
    }

    #[test]
    fn missing_status_counts_as_active() {
        let item: EncarSearchItem = serde_json::from_str(r#"{ "Id": 5 }"#).unwrap();
        assert!(item.is_active());

        let ended: EncarSearchItem =
            serde_json::from_str(r#"{ "Id": 6, "AdvertisementStatus": "CLOSED" }"#).unwrap();
        assert!(!ended.is_active());
    }
}
