//! End-to-end download of one language edition
//!
//! [`CirrusDownloader`] wires the pieces together: pick the date, name the
//! output, locate the shards, reassemble them.

use crate::cleanup::{self, CleanupOutcome, Confirm};
use crate::client::ArchiveClient;
use crate::config::Config;
use crate::dates::find_latest_date;
use crate::error::{Error, Result};
use crate::progress::{NoopProgress, ProgressReporter};
use crate::reassembly::ShardReassembler;
use crate::shards::ShardLocator;
use crate::types::{DownloadReport, DumpDate, ShardReference, output_filename};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// What to download
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DownloadRequest {
    /// Language code, e.g. `en`, `de`, `simple`
    pub language: String,
    /// Explicit dump date; the latest published date when `None`
    pub date: Option<DumpDate>,
}

impl DownloadRequest {
    /// Request the latest dump of `language`
    pub fn latest(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            date: None,
        }
    }

    /// Request the dump of `language` published on `date`
    pub fn on(language: impl Into<String>, date: DumpDate) -> Self {
        Self {
            language: language.into(),
            date: Some(date),
        }
    }
}

/// Downloads Cirrus dumps into the configured output directory
pub struct CirrusDownloader {
    config: Config,
    client: ArchiveClient,
    progress: Arc<dyn ProgressReporter>,
}

impl CirrusDownloader {
    /// Create a downloader that reports no progress
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be built.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let client = ArchiveClient::new(&config.http)?;
        Ok(Self {
            config,
            client,
            progress: Arc::new(NoopProgress),
        })
    }

    /// Report download and processing progress to `progress`
    pub fn with_progress(mut self, progress: Arc<dyn ProgressReporter>) -> Self {
        self.progress = progress;
        self
    }

    /// The active configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// URL of the directory holding every index of `date`
    pub fn date_url(&self, date: &DumpDate) -> String {
        format!("{}{}/", self.config.normalized_base_url(), date)
    }

    /// Where the corpus of `language` at `date` is written
    pub fn output_path(&self, language: &str, date: &DumpDate) -> PathBuf {
        self.config
            .output_dir
            .join(output_filename(language, date))
    }

    /// Create the output directory tree
    pub async fn prepare_output_dir(&self) -> Result<&Path> {
        tokio::fs::create_dir_all(&self.config.output_dir).await?;
        Ok(&self.config.output_dir)
    }

    /// Delete earlier corpus files from the output directory
    pub async fn clean_old_dumps(&self, confirm: &dyn Confirm) -> Result<CleanupOutcome> {
        cleanup::clean_old_dumps(&self.config.output_dir, confirm).await
    }

    /// The most recent date published at the archive root
    pub async fn latest_date(&self) -> Result<DumpDate> {
        find_latest_date(&self.client, &self.config.normalized_base_url()).await
    }

    /// Shard URLs of `language` at `date`, in concatenation order
    pub async fn discover_shards(
        &self,
        language: &str,
        date: &DumpDate,
    ) -> Result<Vec<ShardReference>> {
        ShardLocator::new(&self.client)
            .with_hint_limits(self.config.hint_limit, self.config.extended_hint_limit)
            .discover(&self.date_url(date), language, date)
            .await
    }

    /// Download `shards` and write the gzip corpus to `output_path`
    pub async fn reassemble(&self, shards: &[ShardReference], output_path: &Path) -> Result<u64> {
        ShardReassembler::new(&self.client, Arc::clone(&self.progress))
            .with_chunk_size(self.config.chunk_size)
            .reassemble(shards, output_path)
            .await
            .map_err(Error::from)
    }

    /// Run the whole pipeline for one request
    ///
    /// # Errors
    /// Any failure is fatal: no date, no shards, a failed download or a
    /// failed stream. After a reassembly failure the output file, if
    /// present, is incomplete.
    pub async fn run(&self, request: &DownloadRequest) -> Result<DownloadReport> {
        self.prepare_output_dir().await?;

        let date = match &request.date {
            Some(date) => {
                info!(date = %date, "using specified date");
                date.clone()
            }
            None => self.latest_date().await?,
        };

        let output_path = self.output_path(&request.language, &date);
        info!(output = ?output_path, "target output");

        let shards = self.discover_shards(&request.language, &date).await?;
        let uncompressed_bytes = self.reassemble(&shards, &output_path).await?;

        Ok(DownloadReport {
            output_path,
            date,
            shard_count: shards.len(),
            uncompressed_bytes,
        })
    }
}
