use std::process::ExitCode;

use clap::Parser;
use sql_adapter::prelude::*;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Check that a database descriptor connects and answers")]
struct Args {
    /// Connection descriptor (postgres://, libsql://, https://, sqlite:, file path...)
    #[arg(long, env = "DATABASE_URL")]
    url: String,
    /// Cloud auth token, if not embedded in the URL
    #[arg(long, env = "DATABASE_AUTH_TOKEN", hide_env_values = true)]
    auth_token: Option<String>,
    /// Fail unless the descriptor selects this backend
    #[arg(long, value_enum)]
    expect: Option<BackendKind>,
    /// Count the rows in this table
    #[arg(long)]
    table: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<(), SqlAdapterError> {
    let descriptor = ConnectionDescriptor::parse(&args.url)?;
    tracing::info!(backend = %descriptor.kind(), target = %descriptor, "descriptor classified");
    if let Some(expected) = args.expect
        && expected != descriptor.kind()
    {
        return Err(SqlAdapterError::Config(format!(
            "expected {expected} backend, descriptor selects {}",
            descriptor.kind()
        )));
    }

    let mut builder = AdapterOptions::builder(args.url);
    if let Some(token) = args.auth_token {
        builder = builder.auth_token(token);
    }
    let db = builder.connect().await?;

    let now = db.query("SELECT NOW() AS now", &[]).await?;
    let server_time = now.first().and_then(|row| row.get("now")).cloned();
    tracing::info!(backend = %db.kind(), ?server_time, "liveness query ok");

    if let Some(table) = args.table {
        if !table
            .split('.')
            .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'))
        {
            return Err(SqlAdapterError::Config(format!("invalid table name: {table:?}")));
        }
        let counted = db
            .query(&format!("SELECT COUNT(*) AS n FROM {table}"), &[])
            .await?;
        let n = counted.first().and_then(|row| row.get("n")).and_then(RowValues::as_int).copied();
        tracing::info!(table = %table, rows = ?n, "row count");
    }

    db.close().await
}
