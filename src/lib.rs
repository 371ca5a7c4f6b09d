//! # cirrus-dl
//!
//! Downloads the CirrusSearch content index of one Wikipedia language edition
//! from the Wikimedia dump archive and reassembles its bzip2 shards into a
//! single gzip-compressed newline-delimited JSON corpus.
//!
//! ## Pipeline
//!
//! 1. **Date selection** - the archive root is listed and the latest
//!    eight-digit date directory is picked, unless a date is given.
//! 2. **Shard location** - the `index_name={lang}wiki_content/` directory of
//!    that date is listed for `.json.bz2` shards. A 404 is retried once with
//!    the directory name percent-encoded.
//! 3. **Reassembly** - shards are downloaded in order into a temporary
//!    directory beside the output, then decoded and folded into one gzip
//!    stream without holding any of them in memory.
//!
//! ## Quick Start
//!
//! ```no_run
//! use cirrus_dl::{CirrusDownloader, Config, DownloadRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config {
//!         output_dir: "wiki_dumps".into(),
//!         ..Default::default()
//!     };
//!
//!     let downloader = CirrusDownloader::new(config)?;
//!     let report = downloader.run(&DownloadRequest::latest("simple")).await?;
//!
//!     println!("wrote {}", report.output_path.display());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Removal of earlier corpus files
pub mod cleanup;
/// HTTP access to the dump archive
pub mod client;
/// Configuration types
pub mod config;
/// Dump date selection
pub mod dates;
/// End-to-end pipeline
pub mod downloader;
/// Error types
pub mod error;
/// Directory listing parsing
pub mod listing;
/// Progress reporting
pub mod progress;
/// Shard download and gzip reassembly
pub mod reassembly;
/// Shard discovery
pub mod shards;
/// Core domain types
pub mod types;

pub use cleanup::{AssumeYes, CleanupOutcome, Confirm, TerminalConfirm};
pub use client::ArchiveClient;
pub use config::{Config, HttpConfig};
pub use downloader::{CirrusDownloader, DownloadRequest};
pub use error::{Error, FetchError, IndexHint, NoShardsFound, ReassemblyError, Result};
pub use progress::{CliProgress, NoopProgress, ProgressReporter};
pub use types::{DownloadReport, DumpDate, ShardReference};
