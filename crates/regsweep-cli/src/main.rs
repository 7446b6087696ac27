//! regsweep - retention pruner for container registries.

use std::collections::HashMap;
use std::process::ExitCode;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use regsweep_engine::{PruneOptions, Pruner, RunReport};
use regsweep_registry::{RegistryAuth, RegistryClient, RegistryConfig};

/// Prune old image tags from a container registry.
///
/// Walks the registry catalog and, per repository, keeps the most recent
/// tags plus anything younger than the age threshold, then deletes the
/// rest by manifest digest. Run the registry's garbage collector
/// afterwards to reclaim blob storage.
#[derive(Parser)]
#[command(name = "regsweep", version, about)]
struct Cli {
    /// Registry base URL (e.g. https://registry.example.com)
    #[arg(long)]
    registry: String,

    /// Maximum tag age in days; older tags beyond the keep floor are deleted
    #[arg(long, default_value = "30")]
    age: u32,

    /// Number of most recent tags always kept per repository
    #[arg(long, default_value = "10")]
    keep: usize,

    /// Compute and report decisions without deleting anything
    #[arg(long)]
    dry_run: bool,

    /// Maximum concurrent registry connections
    #[arg(long, default_value = "4")]
    concurrency: usize,

    /// Skip TLS certificate verification (self-signed registries)
    #[arg(long)]
    insecure: bool,

    /// Restrict the run to these repositories (repeatable)
    #[arg(long = "repo")]
    repos: Vec<String>,

    /// Repositories to exclude (repeatable)
    #[arg(long = "exclude")]
    excludes: Vec<String>,

    /// Per-repository keep-count override, as REPO=COUNT (repeatable)
    #[arg(long = "keep-for", value_name = "REPO=COUNT")]
    keep_for: Vec<String>,

    /// Per-repository age override, as REPO=DAYS (repeatable)
    #[arg(long = "age-for", value_name = "REPO=DAYS")]
    age_for: Vec<String>,

    /// Username for basic authentication
    #[arg(long, env = "REGSWEEP_USERNAME")]
    username: Option<String>,

    /// Password for basic authentication
    #[arg(long, env = "REGSWEEP_PASSWORD", requires = "username")]
    password: Option<String>,

    /// Request timeout in seconds
    #[arg(long, default_value = "30")]
    timeout: u64,

    /// Output format: text, json
    #[arg(long, default_value = "text")]
    output: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "regsweep=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::from(2)
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    if cli.output != "text" && cli.output != "json" {
        anyhow::bail!("unknown output format '{}'. Use: text or json", cli.output);
    }

    url::Url::parse(&cli.registry)
        .with_context(|| format!("invalid registry URL '{}'", cli.registry))?;

    let mut config =
        RegistryConfig::new(&cli.registry).with_timeout(Duration::from_secs(cli.timeout));
    if cli.insecure {
        config = config.insecure();
    }
    if let Some(username) = &cli.username {
        let password = cli.password.as_deref().unwrap_or_default();
        config = config.with_auth(RegistryAuth::basic(username, password));
    }
    let client = RegistryClient::new(config).context("failed to build registry client")?;

    let options = PruneOptions::new(cli.keep, cli.age)
        .dry_run(cli.dry_run)
        .concurrency(cli.concurrency)
        .only(cli.repos)
        .excludes(cli.excludes)
        .keep_overrides(parse_overrides(&cli.keep_for)?)
        .age_overrides(parse_overrides(&cli.age_for)?);

    let cancel = CancellationToken::new();
    let interrupted = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received, finishing in-flight work");
            interrupted.cancel();
        }
    });

    let report = Pruner::new(client, options).run(cancel).await?;
    print_report(&report, &cli.output)?;

    Ok(ExitCode::from(report.exit_code()))
}

fn print_report(report: &RunReport, output: &str) -> Result<()> {
    if output == "json" {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        println!("{report}");
    }
    Ok(())
}

/// Parses repeated `REPO=VALUE` override flags into a map.
fn parse_overrides<T>(entries: &[String]) -> Result<HashMap<String, T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let mut overrides = HashMap::new();
    for entry in entries {
        let (repository, value) = entry
            .split_once('=')
            .with_context(|| format!("invalid override '{entry}', expected REPO=VALUE"))?;
        let value = value
            .parse()
            .with_context(|| format!("invalid value in override '{entry}'"))?;
        overrides.insert(repository.to_string(), value);
    }
    Ok(overrides)
}
