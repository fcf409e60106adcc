//! Acfetch - conditional GitLab file download
//!
//! Usage:
//!   acfetch 35523853 tests/hidden.py                    # Fetch into ./gitlab_download.txt
//!   acfetch 35523853 tests/hidden.py -o ac_tests.py     # Choose the local name
//!
//! Does nothing, successfully, when the token variable is not set.

use anyhow::Result;
use clap::{Parser, ValueEnum};
use console::style;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use acfetch_core::coordinates::{
    DEFAULT_BRANCH, DEFAULT_HOST, DEFAULT_OUTPUT_NAME, DEFAULT_TOKEN_VAR, DownloadCoordinates,
    TokenKind,
};
use acfetch_core::fetcher::{ConditionalFetcher, FetchOutcome};

#[derive(Parser)]
#[command(name = "acfetch")]
#[command(about = "Download a file from GitLab if an access token is available", long_about = None)]
struct Cli {
    /// GitLab project ID
    project_id: u64,

    /// Path of the file inside the repository
    file_path: String,

    /// Environment variable holding the access token
    #[arg(long, default_value = DEFAULT_TOKEN_VAR)]
    token_var: String,

    /// How the token is sent to GitLab
    #[arg(long, default_value = "private")]
    token_kind: TokenKindArg,

    /// GitLab host
    #[arg(long, default_value = DEFAULT_HOST)]
    host: String,

    /// Branch, tag or commit to read the file from
    #[arg(short, long, default_value = DEFAULT_BRANCH)]
    branch: String,

    /// Local file name, relative to the current directory
    #[arg(short, long, default_value = DEFAULT_OUTPUT_NAME)]
    output: String,

    /// Output format
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,
}

#[derive(Clone, Copy, ValueEnum)]
enum TokenKindArg {
    /// Personal, project or group access token
    Private,
    /// OAuth2 access token
    Oauth,
    /// CI/CD job token
    Job,
}

impl From<TokenKindArg> for TokenKind {
    fn from(arg: TokenKindArg) -> Self {
        match arg {
            TokenKindArg::Private => TokenKind::Private,
            TokenKindArg::Oauth => TokenKind::OAuth,
            TokenKindArg::Job => TokenKind::Job,
        }
    }
}

#[derive(Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    /// Human-readable summary
    #[default]
    Text,
    /// Machine-readable JSON
    Json,
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "acfetch=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let format = cli.format;
    let coords = build_coordinates(cli);
    tracing::debug!(?coords, "Resolved download coordinates");

    let outcome = ConditionalFetcher::new().try_download(&coords)?;
    print_outcome(&outcome, &coords, format)
}

fn build_coordinates(cli: Cli) -> DownloadCoordinates {
    DownloadCoordinates::new(cli.project_id, cli.file_path)
        .with_token_var(cli.token_var)
        .with_token_kind(cli.token_kind.into())
        .with_host(cli.host)
        .with_branch(cli.branch)
        .with_output_name(cli.output)
}

fn print_outcome(
    outcome: &FetchOutcome,
    coords: &DownloadCoordinates,
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let report = match outcome {
                FetchOutcome::Skipped => serde_json::json!({ "performed": false }),
                FetchOutcome::Downloaded(report) => serde_json::json!({
                    "performed": true,
                    "coordinates": coords,
                    "report": report,
                }),
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Text => {
            // Silent when no token was found
            if let FetchOutcome::Downloaded(report) = outcome {
                println!(
                    "{} {} -> {} ({} bytes)",
                    style("Downloaded").green().bold(),
                    coords.file_path(),
                    report.path.display(),
                    report.bytes_written
                );
            }
        }
    }
    Ok(())
}
