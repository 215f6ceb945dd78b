//! Turns raw Encar read-API payloads into [`NormalizedListing`] rows.
//!
//! Only make, model, year, and price are hard requirements; a listing
//! missing any of those fails with [`EncarError::Normalization`] and the
//! caller decides whether that fails the run (single import) or just
//! skips the row (catalog import). Everything else is best-effort.
//! Korean display labels are mapped onto the English vocabulary the
//! dashboard stores, with unknown labels passed through verbatim.

use carbridge_core::NormalizedListing;
use rust_decimal::Decimal;

use crate::error::EncarError;
use crate::rates::convert_krw_to_usd;
use crate::types::{
    full_photo_url, EncarPhoto, EncarSearchItem, EncarVehicleDetail, KRW_PER_PRICE_UNIT,
};
use crate::urls;

/// Normalizes one vehicle from the detail endpoint.
pub fn normalize_detail(
    detail: EncarVehicleDetail,
    rate: Decimal,
) -> Result<NormalizedListing, EncarError> {
    let encar_id = detail.vehicle_id.to_string();

    let make = require_text(
        detail.category.manufacturer_english_name,
        "make",
        &encar_id,
    )?;
    let model = require_text(detail.category.model_group_english_name, "model", &encar_id)?;
    let year = require_year(
        detail.category.form_year.as_deref(),
        detail.category.year_month.as_deref(),
        &encar_id,
    )?;
    let price_krw = require_price(detail.advertisement.price, &encar_id)?;

    let title = build_title(
        year,
        &make,
        &model,
        detail.category.grade_english_name.as_deref(),
    );
    let images: Vec<String> = detail.photos.iter().map(EncarPhoto::full_url).collect();

    Ok(NormalizedListing {
        encar_url: urls::detail_url(detail.vehicle_id),
        encar_id,
        make,
        model,
        year,
        price_krw,
        price_usd: convert_krw_to_usd(price_krw, rate),
        mileage: detail.spec.mileage,
        fuel_type: detail.spec.fuel_name.as_deref().map(map_fuel_label),
        transmission: detail
            .spec
            .transmission_name
            .as_deref()
            .map(map_transmission_label),
        displacement: detail.spec.displacement,
        engine_type: None,
        drive_type: None,
        body_type: detail.spec.body_name.as_deref().map(map_body_label),
        color_exterior: detail.spec.color_name.as_deref().map(map_color_label),
        color_interior: None,
        seating_capacity: detail.spec.seat_count,
        vin: None,
        chassis_number: None,
        title: Some(title),
        description: None,
        features: Vec::new(),
        seller_name: optional_text(detail.contact.dealer_name),
        seller_phone: optional_text(detail.contact.phone),
        location_city: None,
        location_region: None,
        images,
    })
}

/// Normalizes one row from the seller search endpoint. Search rows are
/// flat, so several detail-only fields stay `None`.
pub fn normalize_search_item(
    item: EncarSearchItem,
    rate: Decimal,
) -> Result<NormalizedListing, EncarError> {
    let encar_id = item.id.to_string();

    let make = require_text(item.manufacturer, "make", &encar_id)?;
    let model = require_text(item.model, "model", &encar_id)?;
    let year = require_year(item.form_year.as_deref(), None, &encar_id)?;
    let price_krw = require_price(item.price, &encar_id)?;

    let title = build_title(year, &make, &model, item.badge.as_deref());
    let images: Vec<String> = item
        .photo
        .as_deref()
        .map(full_photo_url)
        .into_iter()
        .collect();

    Ok(NormalizedListing {
        encar_url: urls::detail_url(item.id),
        encar_id,
        make,
        model,
        year,
        price_krw,
        price_usd: convert_krw_to_usd(price_krw, rate),
        mileage: item.mileage,
        fuel_type: item.fuel_type.as_deref().map(map_fuel_label),
        transmission: item.transmission.as_deref().map(map_transmission_label),
        displacement: None,
        engine_type: None,
        drive_type: None,
        body_type: None,
        color_exterior: None,
        color_interior: None,
        seating_capacity: None,
        vin: None,
        chassis_number: None,
        title: Some(title),
        description: None,
        features: Vec::new(),
        seller_name: None,
        seller_phone: None,
        location_city: None,
        location_region: None,
        images,
    })
}

fn build_title(year: i32, make: &str, model: &str, grade: Option<&str>) -> String {
    match grade.map(str::trim).filter(|grade| !grade.is_empty()) {
        Some(grade) => format!("{year} {make} {model} {grade}"),
        None => format!("{year} {make} {model}"),
    }
}

fn require_text(value: Option<String>, field: &str, encar_id: &str) -> Result<String, EncarError> {
    optional_text(value).ok_or_else(|| EncarError::Normalization {
        encar_id: encar_id.to_string(),
        reason: format!("missing {field}"),
    })
}

fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

/// Model year from `form_year` (`"2021"`), falling back to the first
/// four digits of `year_month` (`"202103"`).
fn require_year(
    form_year: Option<&str>,
    year_month: Option<&str>,
    encar_id: &str,
) -> Result<i32, EncarError> {
    if let Some(year) = form_year.and_then(|year| year.trim().parse::<i32>().ok()) {
        return Ok(year);
    }
    if let Some(year) = year_month
        .and_then(|year_month| year_month.trim().get(..4))
        .and_then(|year| year.parse::<i32>().ok())
    {
        return Ok(year);
    }
    Err(EncarError::Normalization {
        encar_id: encar_id.to_string(),
        reason: "missing model year".to_string(),
    })
}

/// Price in KRW from the API's 10,000-won units. Zero and negative
/// prices (auction placeholders) are rejected.
fn require_price(units: Option<i64>, encar_id: &str) -> Result<i64, EncarError> {
    units
        .filter(|units| *units > 0)
        .map(|units| units.saturating_mul(KRW_PER_PRICE_UNIT))
        .ok_or_else(|| EncarError::Normalization {
            encar_id: encar_id.to_string(),
            reason: "missing or non-positive price".to_string(),
        })
}

// ---------------------------------------------------------------------------
// Display-label mapping
// ---------------------------------------------------------------------------

/// Korean fuel labels mapped onto the dashboard's English vocabulary.
/// Unknown labels pass through verbatim so a label we have not seen yet
/// degrades cosmetically instead of dropping data.
fn map_fuel_label(label: &str) -> String {
    match label.trim() {
        "가솔린" => "Gasoline".to_string(),
        "디젤" => "Diesel".to_string(),
        "하이브리드" | "가솔린+전기" => "Hybrid".to_string(),
        "전기" => "Electric".to_string(),
        other => other.to_string(),
    }
}

fn map_transmission_label(label: &str) -> String {
    match label.trim() {
        "오토" => "Automatic".to_string(),
        "수동" => "Manual".to_string(),
        other => other.to_string(),
    }
}

/// Body classes are coarse on purpose: the dashboard filters on broad
/// segments, not the Korean size ladder.
fn map_body_label(label: &str) -> String {
    match label.trim() {
        "경차" | "소형차" | "준중형차" | "중형차" | "대형차" => "Sedan".to_string(),
        "승합차" => "Van".to_string(),
        "화물차" => "Truck".to_string(),
        "스포츠카" => "Coupe".to_string(),
        other => other.to_string(),
    }
}

fn map_color_label(label: &str) -> String {
    match label.trim() {
        "흰색" => "White".to_string(),
        "검정색" => "Black".to_string(),
        "회색" => "Gray".to_string(),
        "은색" => "Silver".to_string(),
        "파란색" => "Blue".to_string(),
        "빨간색" => "Red".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EncarAdvertisement, EncarCategory, EncarContact, EncarSpec};

    fn sonata_detail() -> EncarVehicleDetail {
        EncarVehicleDetail {
            vehicle_id: 38_526_217,
            category: EncarCategory {
                manufacturer_english_name: Some("Hyundai".to_string()),
                model_group_english_name: Some("Sonata".to_string()),
                grade_english_name: Some("Premium".to_string()),
                form_year: Some("2021".to_string()),
                year_month: Some("202103".to_string()),
            },
            spec: EncarSpec {
                mileage: Some(45_000),
                transmission_name: Some("오토".to_string()),
                fuel_name: Some("가솔린".to_string()),
                displacement: Some(1999),
                body_name: Some("중형차".to_string()),
                seat_count: Some(5),
                color_name: Some("흰색".to_string()),
            },
            advertisement: EncarAdvertisement {
                price: Some(2500),
                status: Some("ADVERTISE".to_string()),
            },
            contact: EncarContact {
                dealer_name: Some("프리미엄오토".to_string()),
                phone: Some("01012345678".to_string()),
            },
            photos: vec![
                EncarPhoto {
                    path: "/carpicture/38526217_001.jpg".to_string(),
                    code: Some("OUT01".to_string()),
                },
                EncarPhoto {
                    path: "/carpicture/38526217_002.jpg".to_string(),
                    code: Some("OUT02".to_string()),
                },
            ],
        }
    }

    fn k5_item() -> EncarSearchItem {
        serde_json::from_str(
            r#"{
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
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn detail_maps_every_field() {
        let listing = normalize_detail(sonata_detail(), Decimal::from(1300)).unwrap();

        assert_eq!(listing.encar_id, "38526217");
        assert_eq!(
            listing.encar_url,
            "https://fem.encar.com/cars/detail/38526217"
        );
        assert_eq!(listing.make, "Hyundai");
        assert_eq!(listing.model, "Sonata");
        assert_eq!(listing.year, 2021);
        assert_eq!(listing.price_krw, 25_000_000);
        assert_eq!(listing.price_usd, Decimal::new(1_923_077, 2));
        assert_eq!(listing.mileage, Some(45_000));
        assert_eq!(listing.fuel_type.as_deref(), Some("Gasoline"));
        assert_eq!(listing.transmission.as_deref(), Some("Automatic"));
        assert_eq!(listing.body_type.as_deref(), Some("Sedan"));
        assert_eq!(listing.color_exterior.as_deref(), Some("White"));
        assert_eq!(listing.seating_capacity, Some(5));
        assert_eq!(listing.title.as_deref(), Some("2021 Hyundai Sonata Premium"));
        assert_eq!(listing.seller_name.as_deref(), Some("프리미엄오토"));
        assert_eq!(
            listing.images,
            vec![
                "https://ci.encar.com/carpicture/38526217_001.jpg",
                "https://ci.encar.com/carpicture/38526217_002.jpg",
            ]
        );
    }

    #[test]
    fn detail_without_make_fails_normalization() {
        let mut detail = sonata_detail();
        detail.category.manufacturer_english_name = None;

        let err = normalize_detail(detail, Decimal::from(1300)).unwrap_err();
        assert!(
            matches!(err, EncarError::Normalization { ref reason, .. } if reason.contains("make")),
            "unexpected error: {err:?}"
        );
    }

    #[test]
    fn detail_year_falls_back_to_year_month() {
        let mut detail = sonata_detail();
        detail.category.form_year = None;

        let listing = normalize_detail(detail, Decimal::from(1300)).unwrap();
        assert_eq!(listing.year, 2021);
    }

    #[test]
    fn detail_rejects_zero_price() {
        let mut detail = sonata_detail();
        detail.advertisement.price = Some(0);

        let err = normalize_detail(detail, Decimal::from(1300)).unwrap_err();
        assert!(matches!(err, EncarError::Normalization { .. }));
    }

    #[test]
    fn detail_title_skips_blank_grade() {
        let mut detail = sonata_detail();
        detail.category.grade_english_name = Some("  ".to_string());

        let listing = normalize_detail(detail, Decimal::from(1300)).unwrap();
        assert_eq!(listing.title.as_deref(), Some("2021 Hyundai Sonata"));
    }

    #[test]
    fn unknown_labels_pass_through() {
        let mut detail = sonata_detail();
        detail.spec.fuel_name = Some("수소".to_string());

        let listing = normalize_detail(detail, Decimal::from(1300)).unwrap();
        assert_eq!(listing.fuel_type.as_deref(), Some("수소"));
    }

    #[test]
    fn search_item_maps_flat_fields() {
        let listing = normalize_search_item(k5_item(), Decimal::from(1300)).unwrap();

        assert_eq!(listing.encar_id, "10001");
        assert_eq!(listing.encar_url, "https://fem.encar.com/cars/detail/10001");
        assert_eq!(listing.make, "Kia");
        assert_eq!(listing.model, "K5");
        assert_eq!(listing.year, 2022);
        assert_eq!(listing.price_krw, 28_000_000);
        assert_eq!(listing.price_usd, Decimal::new(2_153_846, 2));
        assert_eq!(listing.title.as_deref(), Some("2022 Kia K5"));
        assert_eq!(listing.fuel_type.as_deref(), Some("Gasoline"));
        assert_eq!(
            listing.images,
            vec!["https://ci.encar.com/carpicture/10001_001.jpg"]
        );
        assert!(listing.body_type.is_none());
    }

    #[test]
    fn search_item_without_model_fails_normalization() {
        let mut item = k5_item();
        item.model = None;

        let err = normalize_search_item(item, Decimal::from(1300)).unwrap_err();
        assert!(
            matches!(err, EncarError::Normalization { ref encar_id, .. } if encar_id == "10001"),
            "unexpected error: {err:?}"
        );
    }
}
