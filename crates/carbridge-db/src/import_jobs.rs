//! Database operations for `import_jobs`.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

use carbridge_core::ImportMode;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `import_jobs` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ImportJobRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub import_type: String,
    pub source_url: String,
    pub status: String,
    /// 0 at creation, 100 once terminal.
    pub progress: i32,
    pub total_items: i32,
    pub processed_items: i32,
    pub failed_items: i32,
    /// Ids of the listings created by this run, in import order.
    pub imported_car_ids: Vec<Uuid>,
    /// Per-item error entries (`[{"car_id","error"}]`), NULL when the run was clean.
    pub error_log: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Item counts written when a job is finalized.
#[derive(Debug, Clone, Copy)]
pub struct JobCounts {
    pub total: i32,
    pub processed: i32,
    pub failed: i32,
}

// ---------------------------------------------------------------------------
// import_jobs operations
// ---------------------------------------------------------------------------

/// Creates a new import job in `processing` status.
///
/// Generates a UUID in Rust and binds it as the primary key. Returns the full
/// newly-created row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert or fetch fails.
pub async fn create_import_job(
    pool: &PgPool,
    user_id: Uuid,
    mode: ImportMode,
    source_url: &str,
) -> Result<ImportJobRow, DbError> {
    let id = Uuid::new_v4();

    let row = sqlx::query_as::<_, ImportJobRow>(
        "INSERT INTO import_jobs (id, user_id, import_type, source_url, status) \
         VALUES ($1, $2, $3, $4, 'processing') \
         RETURNING id, user_id, import_type, source_url, status, progress, \
                   total_items, processed_items, failed_items, imported_car_ids, \
                   error_log, created_at, completed_at",
    )
    .bind(id)
    .bind(user_id)
    .bind(mode.as_str())
    .bind(source_url)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Marks a job as `completed`, sets `progress = 100`, the item counts, the
/// imported listing ids, the per-item error log, and `completed_at = NOW()`.
///
/// # Errors
///
/// Returns [`DbError::InvalidJobTransition`] if the job is not in `processing`
/// status (already finalized, or never created), or [`DbError::Sqlx`] if the
/// update fails.
pub async fn complete_import_job(
    pool: &PgPool,
    id: Uuid,
    counts: JobCounts,
    imported_car_ids: &[Uuid],
    error_log: Option<&serde_json::Value>,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE import_jobs \
         SET status = 'completed', progress = 100, total_items = $1, \
             processed_items = $2, failed_items = $3, imported_car_ids = $4, \
             error_log = $5, completed_at = NOW() \
         WHERE id = $6 AND status = 'processing'",
    )
    .bind(counts.total)
    .bind(counts.processed)
    .bind(counts.failed)
    .bind(imported_car_ids)
    .bind(error_log)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidJobTransition {
            id,
            expected_status: "processing",
        });
    }

    Ok(())
}

/// Marks a job as `failed`, sets `progress = 100`, the item counts, the error
/// log, and `completed_at = NOW()`.
///
/// A failed job never imported anything, so `imported_car_ids` keeps its
/// empty default.
///
/// # Errors
///
/// Returns [`DbError::InvalidJobTransition`] if the job is not in `processing`
/// status, or [`DbError::Sqlx`] if the update fails.
pub async fn fail_import_job(
    pool: &PgPool,
    id: Uuid,
    counts: JobCounts,
    error_log: &serde_json::Value,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE import_jobs \
         SET status = 'failed', progress = 100, total_items = $1, \
             processed_items = $2, failed_items = $3, error_log = $4, \
             completed_at = NOW() \
         WHERE id = $5 AND status = 'processing'",
    )
    .bind(counts.total)
    .bind(counts.processed)
    .bind(counts.failed)
    .bind(error_log)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidJobTransition {
            id,
            expected_status: "processing",
        });
    }

    Ok(())
}

/// Fetches a single job by id, scoped to its owning user.
///
/// A job owned by a different user reads the same as an absent one.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no matching row exists, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn get_import_job(
    pool: &PgPool,
    id: Uuid,
    user_id: Uuid,
) -> Result<ImportJobRow, DbError> {
    let row = sqlx::query_as::<_, ImportJobRow>(
        "SELECT id, user_id, import_type, source_url, status, progress, \
                total_items, processed_items, failed_items, imported_car_ids, \
                error_log, created_at, completed_at \
         FROM import_jobs \
         WHERE id = $1 AND user_id = $2",
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)?;

    Ok(row)
}

/// Returns the user's most recent `limit` jobs, ordered by `created_at DESC`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_import_jobs(
    pool: &PgPool,
    user_id: Uuid,
    limit: i64,
) -> Result<Vec<ImportJobRow>, DbError> {
    let rows = sqlx::query_as::<_, ImportJobRow>(
        "SELECT id, user_id, import_type, source_url, status, progress, \
                total_items, processed_items, failed_items, imported_car_ids, \
                error_log, created_at, completed_at \
         FROM import_jobs \
         WHERE user_id = $1 \
         ORDER BY created_at DESC, id DESC \
         LIMIT $2",
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
