//! Per-request import orchestration.
//!
//! `run_import` handles the full validate → create job → extract →
//! persist → finalize pipeline for one dealer request. Candidate
//! listings are persisted independently: one bad row records an error
//! on the job and the run moves on. The job row is finalized exactly
//! once, whatever happened in between.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::PgPool;
use uuid::Uuid;

use carbridge_core::{ImportMode, NormalizedListing};
use carbridge_db::{
    complete_import_job, create_import_job, fail_import_job, insert_listing_if_absent, JobCounts,
};
use carbridge_encar::{urls, CatalogOptions, ListingExtractor};

use crate::error::ImportError;

/// Per-item error wording the dashboard matches on; also stored in the
/// job's `error_log`.
pub const DUPLICATE_LISTING_ERROR: &str = "Duplicate listing - already imported";

/// Caller-supplied switches for one run.
#[derive(Debug, Clone, Copy)]
pub struct ImportOptions {
    /// Publish imported listings immediately (`active` + `published_at`)
    /// instead of leaving them in `draft`.
    pub auto_publish: bool,
    /// Catalog imports only: skip listings whose advertisement ended.
    pub only_active: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            auto_publish: false,
            only_active: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ImportConfig {
    /// Time budget for the extraction phase. Persistence is not covered;
    /// once listings are in hand they are cheap to write.
    pub timeout_secs: u64,
}

impl ImportConfig {
    #[must_use]
    pub fn from_app_config(config: &carbridge_core::AppConfig) -> Self {
        Self {
            timeout_secs: config.import_timeout_secs,
        }
    }
}

/// One candidate's failure, keyed by the Encar id it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemError {
    pub car_id: String,
    pub error: String,
}

/// What a finished run looked like. `errors` holds per-candidate
/// failures only; a run-level failure surfaces as `Err(ImportError)`
/// instead.
#[derive(Debug, Clone)]
pub struct ImportSummary {
    pub job_id: Uuid,
    pub imported: i32,
    pub failed: i32,
    pub errors: Vec<ItemError>,
}

pub struct ImportCoordinator {
    pool: PgPool,
    extractor: Arc<dyn ListingExtractor>,
    config: ImportConfig,
}

impl ImportCoordinator {
    #[must_use]
    pub fn new(pool: PgPool, extractor: Arc<dyn ListingExtractor>, config: ImportConfig) -> Self {
        Self {
            pool,
            extractor,
            config,
        }
    }

    /// Runs one import for `dealer_id`.
    ///
    /// Validation happens before the job row is created, so a malformed
    /// request never leaves a job behind. After the job exists, a
    /// run-level failure (extraction error, timeout) finalizes it as
    /// `failed` before the error is returned; per-candidate failures
    /// are collected on the job and the run still completes.
    pub async fn run_import(
        &self,
        dealer_id: Uuid,
        mode: ImportMode,
        url: &str,
        options: ImportOptions,
    ) -> Result<ImportSummary, ImportError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(ImportError::MissingParameters);
        }
        if !urls::matches_mode(mode, url) {
            return Err(ImportError::InvalidUrl {
                url: url.to_string(),
            });
        }

        let job = create_import_job(&self.pool, dealer_id, mode, url).await?;
        tracing::info!(
            job_id = %job.id,
            dealer_id = %dealer_id,
            mode = %mode,
            url,
            "import started"
        );

        let candidates = match self.extract(mode, url, options).await {
            Ok(candidates) => candidates,
            Err(error) => {
                self.record_run_failure(job.id, &error).await;
                return Err(error);
            }
        };

        let mut imported_ids: Vec<Uuid> = Vec::new();
        let mut errors: Vec<ItemError> = Vec::new();
        for listing in &candidates {
            match insert_listing_if_absent(&self.pool, dealer_id, listing, options.auto_publish)
                .await
            {
                Ok(Some(car_id)) => {
                    tracing::debug!(
                        job_id = %job.id,
                        encar_id = %listing.encar_id,
                        car_id = %car_id,
                        "listing imported"
                    );
                    imported_ids.push(car_id);
                }
                Ok(None) => {
                    tracing::debug!(
                        job_id = %job.id,
                        encar_id = %listing.encar_id,
                        "duplicate listing skipped"
                    );
                    errors.push(ItemError {
                        car_id: listing.encar_id.clone(),
                        error: DUPLICATE_LISTING_ERROR.to_string(),
                    });
                }
                Err(error) => {
                    tracing::warn!(
                        job_id = %job.id,
                        encar_id = %listing.encar_id,
                        error = %error,
                        "failed to persist listing"
                    );
                    errors.push(ItemError {
                        car_id: listing.encar_id.clone(),
                        error: error.to_string(),
                    });
                }
            }
        }

        let counts = JobCounts {
            total: clamped(candidates.len()),
            processed: clamped(imported_ids.len()),
            failed: clamped(errors.len()),
        };
        let error_log = error_log_value(&errors);

        // An empty catalog is a successful no-op, not a failure.
        if candidates.is_empty() || !imported_ids.is_empty() {
            complete_import_job(&self.pool, job.id, counts, &imported_ids, error_log.as_ref())
                .await?;
        } else {
            fail_import_job(
                &self.pool,
                job.id,
                counts,
                error_log.as_ref().unwrap_or(&Value::Null),
            )
            .await?;
        }

        tracing::info!(
            job_id = %job.id,
            imported = counts.processed,
            failed = counts.failed,
            "import finished"
        );
        Ok(ImportSummary {
            job_id: job.id,
            imported: counts.processed,
            failed: counts.failed,
            errors,
        })
    }

    /// Extraction for the requested mode, bounded by the configured
    /// time budget.
    async fn extract(
        &self,
        mode: ImportMode,
        url: &str,
        options: ImportOptions,
    ) -> Result<Vec<NormalizedListing>, ImportError> {
        let budget = Duration::from_secs(self.config.timeout_secs);
        let extraction = async {
            match mode {
                ImportMode::Single => self.extractor.parse_single(url).await,
                ImportMode::Bulk => {
                    self.extractor
                        .parse_seller_catalog(
                            url,
                            CatalogOptions {
                                only_active: options.only_active,
                            },
                        )
                        .await
                }
            }
        };

        match tokio::time::timeout(budget, extraction).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(ImportError::Timeout {
                timeout_secs: self.config.timeout_secs,
            }),
        }
    }

    /// Finalizes the job as `failed` after a run-level error. Best
    /// effort: if even that update fails, the original error still has
    /// to reach the caller, so the bookkeeping failure is only logged.
    async fn record_run_failure(&self, job_id: Uuid, error: &ImportError) {
        let log = json!([{ "error": error.to_string() }]);
        let counts = JobCounts {
            total: 0,
            processed: 0,
            failed: 0,
        };
        if let Err(db_error) = fail_import_job(&self.pool, job_id, counts, &log).await {
            tracing::error!(
                job_id = %job_id,
                error = %db_error,
                "failed to record import failure"
            );
        }
    }
}

fn clamped(count: usize) -> i32 {
    i32::try_from(count).unwrap_or(i32::MAX)
}

/// `error_log` JSON for a finished run: an array of
/// `{ "car_id": ..., "error": ... }` objects, or `None` when every
/// candidate made it.
fn error_log_value(errors: &[ItemError]) -> Option<Value> {
    if errors.is_empty() {
        return None;
    }
    Some(Value::Array(
        errors
            .iter()
            .map(|item| json!({ "car_id": item.car_id, "error": item.error }))
            .collect(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_log_is_none_when_clean() {
        assert_eq!(error_log_value(&[]), None);
    }

    #[test]
    fn error_log_keeps_item_order() {
        let errors = vec![
            ItemError {
                car_id: "10001".to_string(),
                error: DUPLICATE_LISTING_ERROR.to_string(),
            },
            ItemError {
                car_id: "10002".to_string(),
                error: "boom".to_string(),
            },
        ];

        let log = error_log_value(&errors).expect("non-empty log");
        let items = log.as_array().expect("array log");
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["car_id"], "10001");
        assert_eq!(items[1]["error"], "boom");
    }

    #[test]
    fn counts_clamp_instead_of_overflowing() {
        assert_eq!(clamped(3), 3);
        assert_eq!(clamped(usize::MAX), i32::MAX);
    }

    #[test]
    fn default_options_keep_drafts_and_active_rows() {
        let options = ImportOptions::default();
        assert!(!options.auto_publish);
        assert!(options.only_active);
    }
}
