//! `cirrus-dl` command line entry point

use cirrus_dl::{
    AssumeYes, CirrusDownloader, CleanupOutcome, CliProgress, Config, Confirm, DownloadRequest,
    DumpDate, NoopProgress, ProgressReporter, TerminalConfirm,
};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Download a Wikipedia CirrusSearch content dump as one gzip corpus
#[derive(Debug, Parser)]
#[command(name = "cirrus-dl", version, about)]
struct Cli {
    /// Language code (e.g. en, de, simple)
    #[arg(short, long)]
    lang: String,

    /// Directory to write the corpus to
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Dump date as YYYYMMDD (default: latest available)
    #[arg(long)]
    date: Option<String>,

    /// Delete earlier corpus files in the output directory first
    #[arg(short, long)]
    clean: bool,

    /// Do not ask before deleting during --clean
    #[arg(short, long)]
    yes: bool,

    /// Archive root URL
    #[arg(long)]
    base_url: Option<String>,

    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Hide progress bars
    #[arg(short, long)]
    quiet: bool,
}

impl Cli {
    fn load_config(&self) -> cirrus_dl::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_json_file(path)?,
            None => Config::default(),
        };
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if let Some(url) = &self.base_url {
            config.base_url = url.clone();
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("cirrus_dl=info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match run(&cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli) -> cirrus_dl::Result<ExitCode> {
    let config = cli.load_config()?;
    let progress: Arc<dyn ProgressReporter> = if cli.quiet {
        Arc::new(NoopProgress)
    } else {
        Arc::new(CliProgress::new())
    };
    let downloader = CirrusDownloader::new(config)?.with_progress(progress);

    info!(base_url = %downloader.config().base_url, "using dump archive");
    let output_dir = downloader.prepare_output_dir().await?;
    info!(output_dir = ?output_dir, "output directory ready");

    if cli.clean {
        let confirm: &dyn Confirm = if cli.yes { &AssumeYes } else { &TerminalConfirm };
        if downloader.clean_old_dumps(confirm).await? == CleanupOutcome::Cancelled {
            return Ok(ExitCode::FAILURE);
        }
    }

    let request = DownloadRequest {
        language: cli.lang.clone(),
        date: cli.date.clone().map(DumpDate::new),
    };
    let report = downloader.run(&request).await?;

    info!(
        output = ?report.output_path,
        date = %report.date,
        shards = report.shard_count,
        "download complete ({:.1} MB uncompressed)",
        report.uncompressed_bytes as f64 / (1024.0 * 1024.0)
    );
    info!(
        "each line pair in {} is an index action followed by one JSON document",
        report.output_path.display()
    );

    Ok(ExitCode::SUCCESS)
}
