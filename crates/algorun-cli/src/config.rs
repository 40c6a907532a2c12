//! Command line and environment configuration.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::{Map, Value};

#[derive(Debug, Parser)]
#[command(name = "algorun", author, version, about = "Record algorithm runs", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub database: DatabaseArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Connection settings; the CLI owns the pool, the library only borrows it.
#[derive(Debug, Args)]
pub struct DatabaseArgs {
    /// Postgres connection string
    #[arg(long, env = "ALGORUN_DATABASE_URL", hide_env_values = true)]
    pub database_url: String,

    /// Schema holding the algo_run table
    #[arg(long, env = "ALGORUN_SCHEMA", default_value = "public")]
    pub schema: String,

    #[arg(long, env = "ALGORUN_MAX_CONNECTIONS", default_value_t = 5)]
    pub max_connections: u32,

    #[arg(long, env = "ALGORUN_CONNECT_TIMEOUT_SECS", default_value_t = 5)]
    pub connect_timeout_secs: u64,
}

impl DatabaseArgs {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Record the start of a run and print its id
    Start {
        #[arg(long)]
        name: String,
        #[arg(long = "env")]
        environment: String,
        #[arg(long)]
        build: String,
        /// JSON object of run parameters
        #[arg(long, default_value = "{}", value_parser = parse_params)]
        params: Map<String, Value>,
    },
    /// Stamp the end time of a started run
    End {
        #[arg(long)]
        run_id: i64,
    },
    /// Print a recorded run as JSON
    Show {
        #[arg(long)]
        run_id: i64,
    },
}

pub fn parse_params(raw: &str) -> Result<Map<String, Value>> {
    let value: Value = serde_json::from_str(raw).context("params must be valid JSON")?;
    match value {
        Value::Object(map) => Ok(map),
        other => bail!("params must be a JSON object, got {}", json_kind(&other)),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
