//! Maintenance CLI for the provider catalog.
//!
//! `cache clear` talks to the running server since the cache lives in its
//! process; `stats` reads the database directly.

use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use dotenvy::dotenv;
use tracing::{error, info};

use configs::AppConfig;
use service::errors::ServiceError;
use service::maintenance::{ClearCacheRequest, ClearCacheResponse};
use service::repository::SeaOrmProviderRepository;

#[derive(Parser)]
#[command(name = "catalog-admin")]
#[command(about = "Provider catalog maintenance commands")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Tagged cache maintenance
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// Print catalog statistics
    Stats {
        #[arg(long, value_enum, default_value_t = Format::Table)]
        format: Format,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// Invalidate cache tags on the running server
    Clear {
        /// Tags to invalidate, e.g. providers_tag
        #[arg(long, num_args = 1..)]
        tags: Vec<String>,
        /// Invalidate every tag
        #[arg(long)]
        all: bool,
        /// Base URL of the server; defaults to the configured host and port
        #[arg(long)]
        server: Option<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Table,
    Json,
}

/// Usage errors exit with 2, everything else with 1.
enum Outcome {
    Done,
    Usage(String),
}

fn main() -> ExitCode {
    dotenv().ok();
    common::utils::logging::init_logging_cli();
    let cli = Cli::parse();

    let rt = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            error!(error = %e, "failed to build tokio runtime");
            return ExitCode::FAILURE;
        }
    };

    match rt.block_on(dispatch(cli.command)) {
        Ok(Outcome::Done) => ExitCode::SUCCESS,
        Ok(Outcome::Usage(msg)) => {
            eprintln!("{msg}");
            ExitCode::from(2)
        }
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn dispatch(command: Commands) -> Result<Outcome> {
    match command {
        Commands::Cache { action: CacheAction::Clear { tags, all, server } } => {
            let req = ClearCacheRequest { tags, all };
            if let Err(e) = req.clone().scope() {
                return Ok(Outcome::Usage(usage_message(e)));
            }
            let base = match server {
                Some(url) => url,
                None => {
                    let cfg = AppConfig::load_or_env()?;
                    format!("http://{}:{}", cfg.server.host, cfg.server.port)
                }
            };
            let cleared = clear_cache(&base, &req).await?;
            println!("Cleared cache tags: {}", cleared.cleared.join(", "));
            Ok(Outcome::Done)
        }
        Commands::Stats { format } => {
            let cfg = AppConfig::load_or_env()?;
            let db = models::db::connect_with_config(&cfg.database).await?;
            let repo = SeaOrmProviderRepository { db };
            let stats = service::stats::generate(&repo).await?;
            match format {
                Format::Table => print!("{}", stats.render_table()),
                Format::Json => println!("{}", serde_json::to_string_pretty(&stats)?),
            }
            Ok(Outcome::Done)
        }
    }
}

fn usage_message(e: ServiceError) -> String {
    match e {
        ServiceError::Validation(v) => v.into_iter().map(|f| f.message).collect::<Vec<_>>().join("\n"),
        other => other.to_string(),
    }
}

async fn clear_cache(base: &str, req: &ClearCacheRequest) -> Result<ClearCacheResponse> {
    let url = format!("{}/admin/cache/clear", base.trim_end_matches('/'));
    info!(%url, "requesting cache clear");
    let res = reqwest::Client::new()
        .post(&url)
        .json(req)
        .send()
        .await
        .with_context(|| format!("could not reach {url}"))?;
    let status = res.status();
    if !status.is_success() {
        let body = res.text().await.unwrap_or_default();
        bail!("server answered {status}: {body}");
    }
    Ok(res.json::<ClearCacheResponse>().await?)
}
