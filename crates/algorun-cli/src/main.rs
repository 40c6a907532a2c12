//! `algorun`: record algorithm runs from scripts and job wrappers.
//!
//!   algorun --database-url postgres://... start --name fraud-detector --env prod --build 42 --params '{"threshold": 0.8}'
//!   algorun --database-url postgres://... end --run-id 17
//!   algorun --database-url postgres://... show --run-id 17

mod config;

use algorun::{PostgresRunStore, RunId, RunRecord, RunStore, StoredRun};
use anyhow::{Context, Result};
use clap::Parser;
use sqlx::postgres::PgPoolOptions;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::{Cli, Command, DatabaseArgs};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let store = connect(&cli.database).await?;

    match cli.command {
        Command::Start {
            name,
            environment,
            build,
            params,
        } => {
            let mut run = RunRecord::new(name, environment, build, params);
            let run_id = run.begin(&store).await.context("record run start")?;
            info!(%run_id, name = %run.name, env = %run.environment, "run started");
            println!("{run_id}");
        }
        Command::End { run_id } => {
            let run = load(&store, run_id).await?.into_record();
            run.mark_ended(&store).await.context("record run end")?;
            info!(run_id, "run ended");
        }
        Command::Show { run_id } => {
            let stored = load(&store, run_id).await?;
            println!("{}", serde_json::to_string_pretty(&stored)?);
        }
    }
    Ok(())
}

async fn connect(args: &DatabaseArgs) -> Result<PostgresRunStore> {
    let pool = PgPoolOptions::new()
        .max_connections(args.max_connections)
        .acquire_timeout(args.connect_timeout())
        .connect(&args.database_url)
        .await
        .context("connect to run database")?;
    Ok(PostgresRunStore::with_pool(pool).with_schema(args.schema.clone()))
}

async fn load(store: &PostgresRunStore, run_id: i64) -> Result<StoredRun> {
    store
        .load_run(RunId::from(run_id))
        .await
        .context("load run")?
        .with_context(|| format!("no algo run with id {run_id}"))
}
