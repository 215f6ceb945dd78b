//! Command handlers for the CLI.
//!
//! Called from `main` after the pool and config are established. Summaries
//! and job tables go to stdout; diagnostics go through `tracing`.

use std::sync::Arc;

use uuid::Uuid;

use carbridge_core::{AppConfig, ImportMode};
use carbridge_encar::{
    EncarClient, EncarClientConfig, EncarExtractor, FixtureExtractor, ListingExtractor,
    RateProvider, RateProviderConfig,
};
use carbridge_import::{ImportConfig, ImportCoordinator, ImportOptions};

pub(crate) struct ImportArgs {
    pub dealer: Uuid,
    pub mode: ImportMode,
    pub url: String,
    pub auto_publish: bool,
    pub include_inactive: bool,
    pub fixtures: bool,
}

fn build_extractor(
    config: &AppConfig,
    fixtures: bool,
) -> anyhow::Result<Arc<dyn ListingExtractor>> {
    let rates = Arc::new(RateProvider::new(RateProviderConfig::from_app_config(
        config,
    ))?);

    if fixtures {
        tracing::info!("serving listings from the built-in demo catalog, not Encar");
        return Ok(Arc::new(FixtureExtractor::new(rates)));
    }

    let client = EncarClient::new(EncarClientConfig::from_app_config(config))?;
    Ok(Arc::new(EncarExtractor::new(client, rates)))
}

/// Run one import and print its summary.
///
/// Per-item failures are part of a successful run and are printed alongside
/// the counts; a batch-level failure (bad URL, extraction error, timeout)
/// propagates and exits non-zero.
pub(crate) async fn run_import(
    pool: &sqlx::PgPool,
    config: &AppConfig,
    args: ImportArgs,
) -> anyhow::Result<()> {
    let extractor = build_extractor(config, args.fixtures)?;
    let importer = ImportCoordinator::new(
        pool.clone(),
        extractor,
        ImportConfig::from_app_config(config),
    );

    let options = ImportOptions {
        auto_publish: args.auto_publish,
        only_active: !args.include_inactive,
    };

    let summary = importer
        .run_import(args.dealer, args.mode, &args.url, options)
        .await?;

    println!(
        "job {}: imported {}, failed {}",
        summary.job_id, summary.imported, summary.failed
    );
    for item in &summary.errors {
        println!("  {}: {}", item.car_id, item.error);
    }

    Ok(())
}

/// Print a dealer's most recent jobs, newest first.
pub(crate) async fn run_jobs(pool: &sqlx::PgPool, dealer: Uuid, limit: i64) -> anyhow::Result<()> {
    let jobs = carbridge_db::list_import_jobs(pool, dealer, limit.clamp(1, 100)).await?;

    if jobs.is_empty() {
        println!("no import jobs for dealer {dealer}");
        return Ok(());
    }

    for job in &jobs {
        println!(
            "{}  {:10}  {:6}  total {:>3}  imported {:>3}  failed {:>3}  {}",
            job.created_at.format("%Y-%m-%d %H:%M:%S"),
            job.status,
            job.import_type,
            job.total_items,
            job.processed_items,
            job.failed_items,
            job.id
        );
    }

    Ok(())
}
