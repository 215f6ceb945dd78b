use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use carbridge_db::ImportJobRow;

use crate::middleware::Dealer;

use super::{map_db_error, normalize_limit, ApiFailure, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct JobsQuery {
    pub limit: Option<i64>,
}

/// Wire shape of one import job, mirroring the persisted record.
#[derive(Debug, Serialize)]
pub(super) struct ImportJobItem {
    id: Uuid,
    import_type: String,
    source_url: String,
    status: String,
    progress: i32,
    total_items: i32,
    processed_items: i32,
    failed_items: i32,
    imported_car_ids: Vec<Uuid>,
    error_log: Option<serde_json::Value>,
    created_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl From<ImportJobRow> for ImportJobItem {
    fn from(row: ImportJobRow) -> Self {
        Self {
            id: row.id,
            import_type: row.import_type,
            source_url: row.source_url,
            status: row.status,
            progress: row.progress,
            total_items: row.total_items,
            processed_items: row.processed_items,
            failed_items: row.failed_items,
            imported_car_ids: row.imported_car_ids,
            error_log: row.error_log,
            created_at: row.created_at,
            completed_at: row.completed_at,
        }
    }
}

/// One job by id, scoped to the caller. Another dealer's job reads as absent.
pub(super) async fn get_job(
    State(state): State<AppState>,
    Extension(Dealer(dealer_id)): Extension<Dealer>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<ImportJobItem>, ApiFailure> {
    let row = carbridge_db::get_import_job(&state.pool, job_id, dealer_id)
        .await
        .map_err(|e| map_db_error(&e))?;

    Ok(Json(ImportJobItem::from(row)))
}

/// The caller's most recent jobs, newest first.
pub(super) async fn list_jobs(
    State(state): State<AppState>,
    Extension(Dealer(dealer_id)): Extension<Dealer>,
    Query(query): Query<JobsQuery>,
) -> Result<Json<Vec<ImportJobItem>>, ApiFailure> {
    let rows = carbridge_db::list_import_jobs(&state.pool, dealer_id, normalize_limit(query.limit))
        .await
        .map_err(|e| map_db_error(&e))?;

    Ok(Json(rows.into_iter().map(ImportJobItem::from).collect()))
}
