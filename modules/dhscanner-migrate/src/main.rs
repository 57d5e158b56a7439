//! Idempotent schema bootstrap for the artifact metadata index. Run once
//! before the ingress/worker binaries start, matching the teacher's
//! stand-alone migration-binary pattern.

use anyhow::Result;
use clap::Parser;
use dhscanner_common::Config;
use sqlx::sqlite::SqlitePoolOptions;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(about = "Bootstraps the dhscanner artifact metadata schema")]
struct Args {
    /// Override the SQLite file path (defaults to DHSCANNER_DB_PATH / ./dhscanner.sqlite)
    #[arg(long)]
    db_path: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("dhscanner=info".parse()?))
        .init();

    let args = Args::parse();
    let config = Config::migrate_from_env();
    let db_path = args.db_path.unwrap_or(config.db_path.clone());

    tracing::info!(db_path = %db_path, "bootstrapping dhscanner schema");

    let url = format!("sqlite://{db_path}?mode=rwc");
    let pool = SqlitePoolOptions::new().max_connections(1).connect(&url).await?;
    dhscanner_store::schema::bootstrap(&pool).await?;

    tracing::info!("schema is up to date");
    Ok(())
}
