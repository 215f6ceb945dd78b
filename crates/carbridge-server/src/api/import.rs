use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use carbridge_core::ImportMode;
use carbridge_import::{ImportOptions, ItemError};

use crate::middleware::{Dealer, RequestId};

use super::{ApiFailure, AppState};

/// Body of `POST /api/v1/import`, matching the dashboard's payload.
///
/// Fields are `Option` so absent ones can be reported with the exact wording
/// the dashboard expects instead of a serde rejection.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ImportRequest {
    #[serde(rename = "type")]
    kind: Option<String>,
    url: Option<String>,
    auto_publish: Option<bool>,
    only_active: Option<bool>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ImportResponse {
    success: bool,
    import_job_id: Uuid,
    imported: i32,
    failed: i32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    errors: Vec<ItemError>,
}

/// Runs one import for the calling dealer.
///
/// Success, including partial success with per-item errors, answers 200.
/// Every run-level failure answers 400 with `{success:false,error}`.
pub(super) async fn submit_import(
    State(state): State<AppState>,
    Extension(Dealer(dealer_id)): Extension<Dealer>,
    Extension(req_id): Extension<RequestId>,
    payload: Result<Json<ImportRequest>, JsonRejection>,
) -> Result<Json<ImportResponse>, ApiFailure> {
    let Json(request) =
        payload.map_err(|rejection| ApiFailure::bad_request(rejection.body_text()))?;

    let (Some(kind), Some(url)) = (request.kind, request.url) else {
        return Err(ApiFailure::bad_request("Missing required parameters"));
    };

    let mode: ImportMode = kind
        .parse()
        .map_err(|_| ApiFailure::bad_request(format!("Invalid import type: {kind}")))?;

    let options = ImportOptions {
        auto_publish: request.auto_publish.unwrap_or(false),
        only_active: request.only_active.unwrap_or(true),
    };

    let summary = state
        .importer
        .run_import(dealer_id, mode, &url, options)
        .await
        .map_err(|error| {
            tracing::warn!(
                request_id = %req_id.0,
                dealer_id = %dealer_id,
                error = %error,
                "import request failed"
            );
            ApiFailure::bad_request(error.to_string())
        })?;

    Ok(Json(ImportResponse {
        success: true,
        import_job_id: summary.job_id,
        imported: summary.imported,
        failed: summary.failed,
        errors: summary.errors,
    }))
}
