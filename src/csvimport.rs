use anyhow::{Context, Result};
use clap::Parser;
use console::{Term, style};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info};

use csv_import::Config;
use csv_import::upload::{
    CSV_CONTENT_TYPE, HttpTransport, PendingFile, UploadCoordinator, UploadReceipt, UploadState,
    format_size, is_csv, signed_target_request_url,
};

#[derive(Parser, Debug)]
#[command(
    name = "csvimport",
    version = env!("CARGO_PKG_VERSION"),
    author = "Tyr Chen <tyr.chen@gmail.com>",
    about = "Import a product CSV through a signed upload URL",
    long_about = "Requests a signed upload URL for the CSV file from the import endpoint, then uploads \
                  the file straight to object storage with a single PUT. Configure via .env file or flags.",
    after_help = "Examples:\n  \
                  csvimport ./products.csv                        # Upload using .env settings\n  \
                  csvimport ./products.csv -u https://api/import  # Override the endpoint\n  \
                  csvimport ./products.csv --dry-run              # Show the request without sending it\n  \
                  csvimport ./products.csv -i                     # Offer retry after a failure\n\n\
                  Configuration (.env):\n  \
                  CSV_IMPORT_URL=https://api.example.com/dev/import\n  \
                  CSV_IMPORT_TOKEN=dXNlcjpwYXNzd29yZA==\n  \
                  CSV_IMPORT_AUTH_SCHEME=basic\n  \
                  CSV_IMPORT_TITLE=Import Products CSV"
)]
struct Cli {
    /// CSV file to import
    file: PathBuf,

    /// Signed URL endpoint (overrides CSV_IMPORT_URL)
    #[arg(long, short = 'u')]
    url: Option<String>,

    /// Credential token (overrides CSV_IMPORT_TOKEN)
    #[arg(long)]
    token: Option<String>,

    /// Authorization scheme: basic or bearer (overrides CSV_IMPORT_AUTH_SCHEME)
    #[arg(long)]
    auth_scheme: Option<String>,

    /// Header shown before the upload (overrides CSV_IMPORT_TITLE)
    #[arg(long)]
    title: Option<String>,

    /// Show what would be requested without sending anything
    #[arg(long)]
    dry_run: bool,

    /// Interactive mode: prompt to retry or discard after a failure
    #[arg(long, short = 'i')]
    interactive: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file early to get LOG_LEVEL
    dotenv::dotenv().ok();

    let log_level = std::env::var("LOG_LEVEL")
        .ok()
        .or_else(|| std::env::var("RUST_LOG").ok())
        .unwrap_or_else(|| "info".to_string());

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .or_else(|_| tracing_subscriber::EnvFilter::try_new(&log_level))
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_level(true)
        .init();

    let cli = Cli::parse();

    info!("CSV Import Tool v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config(&cli)?;

    if !is_csv(&cli.file) {
        anyhow::bail!(
            "{} is not a CSV file (expected a .csv extension)",
            cli.file.display()
        );
    }

    let metadata = tokio::fs::metadata(&cli.file)
        .await
        .with_context(|| format!("File not found: {}", cli.file.display()))?;
    if !metadata.is_file() {
        anyhow::bail!("{} is not a regular file", cli.file.display());
    }

    let file = PendingFile::from_path(&cli.file)
        .context("Failed to get filename (it must be valid UTF-8)")?;
    let name = file.name().to_string();

    let mut state = UploadState::default();
    state.select(file);

    println!("{}", style(&config.title).cyan().bold());
    println!("{}", style("═".repeat(70)).dim());
    println!(
        "📄 {} {}",
        style(&name).bold(),
        style(format!("({})", format_size(metadata.len()))).dim()
    );

    if cli.dry_run {
        println!(
            "{}",
            style("🔍 DRY RUN MODE - No requests will be sent")
                .yellow()
                .bold()
        );
        println!();
        println!(
            "  {} GET {}",
            style("WOULD REQUEST").green().bold(),
            signed_target_request_url(&config.endpoint, &name)
        );
        println!(
            "  {} PUT <signed URL> (Content-Type: {})",
            style("WOULD UPLOAD").green().bold(),
            CSV_CONTENT_TYPE
        );
        return Ok(());
    }

    let coordinator = UploadCoordinator::new(HttpTransport::new()?, config.endpoint.clone());

    loop {
        let pb = spinner(&name)?;
        let result = coordinator
            .upload(&mut state, config.credential.as_ref())
            .await;
        pb.finish_and_clear();

        match result {
            Ok(receipt) => {
                print_receipt(&receipt);
                return Ok(());
            }
            Err(e) => {
                error!("Upload failed for {}: {}", name, e);
                println!("{} {}", style("✗").red(), style(e.user_message()).red());

                if cli.interactive && e.is_retryable() && prompt_retry()? {
                    continue;
                }

                if state.clear().is_some() {
                    println!("{}", style(format!("Discarded {}", name)).dim());
                }
                std::process::exit(1);
            }
        }
    }
}

/// Load config, letting command-line flags take precedence over the environment
fn load_config(cli: &Cli) -> Result<Config> {
    Config::from_lookup(|key| {
        let flag = match key {
            "CSV_IMPORT_URL" => cli.url.clone(),
            "CSV_IMPORT_TOKEN" => cli.token.clone(),
            "CSV_IMPORT_AUTH_SCHEME" => cli.auth_scheme.clone(),
            "CSV_IMPORT_TITLE" => cli.title.clone(),
            // --token replaces any login configured in the environment
            "CSV_IMPORT_USERNAME" | "CSV_IMPORT_PASSWORD" if cli.token.is_some() => return None,
            _ => None,
        };
        flag.or_else(|| std::env::var(key).ok())
    })
}

fn spinner(name: &str) -> Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message(format!("Uploading {}", name));
    pb.enable_steady_tick(Duration::from_millis(100));
    Ok(pb)
}

fn print_receipt(receipt: &UploadReceipt) {
    println!(
        "{} {} ({})",
        style("✓").green(),
        style(&receipt.name).green(),
        style(format_size(receipt.bytes)).dim()
    );
    println!("  {} {}", style("📦").blue(), style(&receipt.location).dim());
}

/// Ask whether to retry with the file still selected
fn prompt_retry() -> Result<bool> {
    let term = Term::stderr();
    if !term.is_term() {
        return Ok(false);
    }

    loop {
        term.write_str(&format!("{} ", style("[r]etry / [d]iscard?").yellow()))?;
        let answer = term.read_char()?;
        term.write_line("")?;

        match answer.to_ascii_lowercase() {
            'r' => return Ok(true),
            'd' => return Ok(false),
            _ => {}
        }
    }
}
