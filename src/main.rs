//! Storekeep CLI
//!
//! Connectivity checks for the configured database.

use std::time::Instant;

use clap::{Parser, Subcommand};
use storekeep::{Context, Engine, SqlConfig, SqlStorage, Storage};

// =============================================================================
// TigerStyle Constants
// =============================================================================

/// Application name
pub const APP_NAME: &str = "storekeep";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// CLI
// =============================================================================

/// Storekeep - engine-agnostic persistence facade
#[derive(Parser, Debug)]
#[command(name = APP_NAME)]
#[command(about = "Check and inspect storekeep database connections")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Open the configured database and run a round-trip probe
    Check(CheckArgs),
}

/// Overrides applied on top of STOREKEEP_SQL_* settings.
#[derive(clap::Args, Debug)]
struct CheckArgs {
    /// Database engine (sqlite3 or mysql)
    #[arg(long)]
    engine: Option<String>,

    /// Database file (sqlite3) or name (mysql)
    #[arg(long)]
    database: Option<String>,

    /// Server address, host:port (mysql)
    #[arg(long)]
    host: Option<String>,

    /// Login user (mysql)
    #[arg(long)]
    user: Option<String>,

    /// Log every statement at info level
    #[arg(long)]
    debug: bool,
}

impl CheckArgs {
    fn apply(self, mut cfg: SqlConfig) -> anyhow::Result<SqlConfig> {
        if let Some(engine) = self.engine {
            cfg.engine = engine.parse::<Engine>()?;
        }
        if let Some(database) = self.database {
            cfg.database = database;
        }
        if let Some(host) = self.host {
            cfg.host = host;
        }
        if let Some(user) = self.user {
            cfg.user = user;
        }
        cfg.debug |= self.debug;
        cfg.validate()?;
        Ok(cfg)
    }
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Initialize logging
    let filter = match cli.verbose {
        0 => "info,sqlx=warn",
        1 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .init();

    tracing::info!("{} v{}", APP_NAME, APP_VERSION);

    match cli.command {
        Command::Check(args) => check(args).await,
    }
}

async fn check(args: CheckArgs) -> anyhow::Result<()> {
    let cfg = args.apply(SqlConfig::from_env()?)?;
    tracing::debug!(config = ?cfg, "resolved database configuration");

    let storage = SqlStorage::connect(&cfg).await;
    let client = storage.client();
    let ctx = Context::background().with_timeout(storekeep::constants::POOL_ACQUIRE_TIMEOUT);

    let started = Instant::now();
    let probe = ctx
        .run(async {
            sqlx::query_scalar::<_, i64>("SELECT 1")
                .fetch_one(client.pool())
                .await
                .map_err(storekeep::StorageError::from)
        })
        .await?;
    anyhow::ensure!(probe == 1, "unexpected probe result: {probe}");

    let pool = client.pool();
    tracing::info!(
        engine = %client.engine(),
        database = %cfg.database,
        round_trip_ms = started.elapsed().as_secs_f64() * 1_000.0,
        connections = pool.size(),
        idle = pool.num_idle(),
        "database reachable"
    );
    println!(
        "ok: {} {} ({} connections, {} idle)",
        client.engine(),
        cfg.database,
        pool.size(),
        pool.num_idle()
    );

    client.close().await;
    Ok(())
}
