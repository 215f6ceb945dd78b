//! Import runs: one dealer request in, one finalized import job out.

pub mod coordinator;
pub mod error;

pub use coordinator::{
    ImportConfig, ImportCoordinator, ImportOptions, ImportSummary, ItemError,
    DUPLICATE_LISTING_ERROR,
};
pub use error::ImportError;
