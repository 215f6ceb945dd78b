//! Error type for import runs.
//!
//! Display strings double as the client-facing `error` field, so the
//! validation variants carry the exact wording the dashboard matches on.

use carbridge_db::DbError;
use carbridge_encar::EncarError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImportError {
    /// The request was missing the import type or the URL.
    #[error("Missing required parameters")]
    MissingParameters,

    /// The URL does not match the pattern required for the requested
    /// mode. Raised before a job row exists.
    #[error("Invalid Encar listing URL")]
    InvalidUrl { url: String },

    /// Extraction failed as a whole: network, API status, pagination.
    /// Individual bad rows never surface here; catalog extraction skips
    /// them.
    #[error(transparent)]
    Extraction(#[from] EncarError),

    /// Extraction exceeded the configured time budget.
    #[error("import timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// Job bookkeeping failed (creating or finalizing the job row).
    /// Per-listing persistence failures are recorded on the job instead.
    #[error(transparent)]
    Db(#[from] DbError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_use_the_client_facing_wording() {
        assert_eq!(
            ImportError::MissingParameters.to_string(),
            "Missing required parameters"
        );
        assert_eq!(
            ImportError::InvalidUrl {
                url: "https://example.com".to_string(),
            }
            .to_string(),
            "Invalid Encar listing URL"
        );
    }
}
