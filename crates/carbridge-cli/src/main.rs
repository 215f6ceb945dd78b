mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use carbridge_core::ImportMode;

#[derive(Debug, Parser)]
#[command(name = "carbridge-cli")]
#[command(about = "Carbridge listing-import command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run one Encar import for a dealer and print the summary
    Import {
        /// Dealer account the listings are imported for
        #[arg(long)]
        dealer: Uuid,

        /// What the URL points at
        #[arg(long, value_enum)]
        mode: ModeArg,

        /// Encar URL to import from
        #[arg(long)]
        url: String,

        /// Publish imported listings immediately instead of leaving drafts
        #[arg(long)]
        auto_publish: bool,

        /// Keep catalog listings whose advertisement is no longer live
        #[arg(long)]
        include_inactive: bool,

        /// Use the built-in demo catalog instead of calling Encar
        #[arg(long)]
        fixtures: bool,
    },
    /// List a dealer's recent import jobs, newest first
    Jobs {
        /// Dealer account whose jobs to list
        #[arg(long)]
        dealer: Uuid,

        /// How many jobs to show
        #[arg(long, default_value_t = 20)]
        limit: i64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ModeArg {
    /// One listing detail page
    Single,
    /// A seller's whole catalog
    Bulk,
}

impl From<ModeArg> for ImportMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Single => ImportMode::Single,
            ModeArg::Bulk => ImportMode::Bulk,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = carbridge_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = carbridge_db::PoolConfig::from_app_config(&config);
    let pool = carbridge_db::connect_pool(&config.database_url, pool_config).await?;
    carbridge_db::run_migrations(&pool).await?;

    match cli.command {
        Commands::Import {
            dealer,
            mode,
            url,
            auto_publish,
            include_inactive,
            fixtures,
        } => {
            commands::run_import(
                &pool,
                &config,
                commands::ImportArgs {
                    dealer,
                    mode: mode.into(),
                    url,
                    auto_publish,
                    include_inactive,
                    fixtures,
                },
            )
            .await
        }
        Commands::Jobs { dealer, limit } => commands::run_jobs(&pool, dealer, limit).await,
    }
}
