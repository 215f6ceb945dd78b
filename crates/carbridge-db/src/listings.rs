//! Database operations for `car_listings` and `car_images`.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

use carbridge_core::NormalizedListing;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `car_images` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CarImageRow {
    pub id: i64,
    pub car_id: Uuid,
    pub image_url: String,
    /// 0-based display order; 0 is the main photo.
    pub order_index: i32,
    /// `"main"` for index 0, `"gallery"` otherwise.
    pub image_type: String,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// car_listings operations
// ---------------------------------------------------------------------------

/// Persists one listing together with its images, unless the importing user
/// already holds a row for the same Encar id.
///
/// The listing insert uses `ON CONFLICT (user_id, encar_id) DO NOTHING`, so
/// the existence check and the insert are a single atomic statement; two
/// concurrent imports of the same listing cannot both win. Listing and image
/// rows go through one transaction, so a failed image batch rolls the listing
/// back as well and the candidate stays cleanly retryable.
///
/// Returns the new listing id, or `None` when the `(user_id, encar_id)` pair
/// already exists.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any statement or the commit fails.
pub async fn insert_listing_if_absent(
    pool: &PgPool,
    user_id: Uuid,
    listing: &NormalizedListing,
    publish: bool,
) -> Result<Option<Uuid>, DbError> {
    let id = Uuid::new_v4();
    let mut tx = pool.begin().await?;

    let inserted: Option<Uuid> = sqlx::query_scalar(
        "INSERT INTO car_listings ( \
             id, user_id, encar_id, encar_url, make, model, year, \
             price_krw, price_usd, mileage, fuel_type, transmission, \
             displacement, engine_type, drive_type, body_type, \
             color_exterior, color_interior, seating_capacity, vin, \
             chassis_number, title, description, features, seller_name, \
             seller_phone, location_city, location_region, status, \
             imported_at, published_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, \
                 $14, $15, $16, $17, $18, $19, $20, $21, $22, $23, $24, \
                 $25, $26, $27, $28, \
                 CASE WHEN $29 THEN 'active' ELSE 'draft' END, \
                 NOW(), \
                 CASE WHEN $29 THEN NOW() END) \
         ON CONFLICT (user_id, encar_id) DO NOTHING \
         RETURNING id",
    )
    .bind(id)
    .bind(user_id)
    .bind(&listing.encar_id)
    .bind(&listing.encar_url)
    .bind(&listing.make)
    .bind(&listing.model)
    .bind(listing.year)
    .bind(listing.price_krw)
    .bind(listing.price_usd)
    .bind(listing.mileage)
    .bind(&listing.fuel_type)
    .bind(&listing.transmission)
    .bind(listing.displacement)
    .bind(&listing.engine_type)
    .bind(&listing.drive_type)
    .bind(&listing.body_type)
    .bind(&listing.color_exterior)
    .bind(&listing.color_interior)
    .bind(listing.seating_capacity)
    .bind(&listing.vin)
    .bind(&listing.chassis_number)
    .bind(&listing.title)
    .bind(&listing.description)
    .bind(&listing.features)
    .bind(&listing.seller_name)
    .bind(&listing.seller_phone)
    .bind(&listing.location_city)
    .bind(&listing.location_region)
    .bind(publish)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(car_id) = inserted else {
        tx.rollback().await?;
        return Ok(None);
    };

    for (index, image_url) in listing.images.iter().enumerate() {
        let order_index = i32::try_from(index).unwrap_or(i32::MAX);
        let image_type = if index == 0 { "main" } else { "gallery" };
        sqlx::query(
            "INSERT INTO car_images (car_id, image_url, order_index, image_type) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(car_id)
        .bind(image_url)
        .bind(order_index)
        .bind(image_type)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(Some(car_id))
}

// ---------------------------------------------------------------------------
// car_images operations
// ---------------------------------------------------------------------------

/// Returns a listing's images in display order.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_car_images(pool: &PgPool, car_id: Uuid) -> Result<Vec<CarImageRow>, DbError> {
    let rows = sqlx::query_as::<_, CarImageRow>(
        "SELECT id, car_id, image_url, order_index, image_type, created_at \
         FROM car_images \
         WHERE car_id = $1 \
         ORDER BY order_index",
    )
    .bind(car_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
