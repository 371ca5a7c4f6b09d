//! Error types for cirrus-dl
//!
//! This module provides the error hierarchy for the library:
//! - [`Error`], the top-level type returned by the pipeline
//! - [`FetchError`] for HTTP and listing failures
//! - [`NoShardsFound`] carrying the sibling-index diagnostic
//! - [`ReassemblyError`] for download and stream failures during reassembly

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for cirrus-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for cirrus-dl
///
/// Every variant is fatal to the current run. The only automatic recovery in
/// the pipeline is the percent-encoding retry in the shard locator, which is
/// handled before an error ever reaches this type.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "base_url")
        key: Option<String>,
    },

    /// A directory listing or other remote resource could not be fetched
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// No `YYYYMMDD` directory exists at the archive root
    #[error("no date directories found at {url}")]
    NoDatesFound {
        /// The listing that was searched
        url: String,
    },

    /// The index directory exists (or was probed) but holds no shard files
    #[error(transparent)]
    NoShardsFound(#[from] NoShardsFound),

    /// Downloading or folding the shards failed
    #[error(transparent)]
    Reassembly(#[from] ReassemblyError),

    /// Removing an old dump file failed
    #[error("failed to delete {path}: {source}")]
    Cleanup {
        /// The dump file that could not be deleted
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be (de)serialized
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// HTTP and listing errors
///
/// Decoding and parsing failures of a listing are folded into this type; the
/// scraper accepts any text, so in practice only undecodable bodies surface
/// as [`FetchError::Body`].
#[derive(Debug, Error)]
pub enum FetchError {
    /// The HTTP client could not be constructed
    #[error("failed to create HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// A URL could not be parsed or joined
    #[error("invalid URL {url}: {reason}")]
    InvalidUrl {
        /// The offending URL (or URL fragment)
        url: String,
        /// Why it was rejected
        reason: String,
    },

    /// The request never produced a response (DNS, connect, timeout, ...)
    #[error("request to {url} failed: {source}")]
    Request {
        /// The requested URL
        url: String,
        /// The underlying client error
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-success status
    #[error("HTTP {status} for {url}")]
    Status {
        /// The requested URL
        url: String,
        /// The HTTP status code
        status: u16,
    },

    /// The response body could not be read or decoded as text
    #[error("failed to read response body from {url}: {reason}")]
    Body {
        /// The requested URL
        url: String,
        /// Why reading failed
        reason: String,
    },
}

impl FetchError {
    /// Returns true for an HTTP 404 response
    ///
    /// The shard locator uses this to decide whether the percent-encoded
    /// retry applies.
    pub fn is_not_found(&self) -> bool {
        matches!(self, FetchError::Status { status: 404, .. })
    }

    /// The URL the failed request targeted, if any
    pub fn url(&self) -> Option<&str> {
        match self {
            FetchError::Client(_) => None,
            FetchError::InvalidUrl { url, .. }
            | FetchError::Request { url, .. }
            | FetchError::Status { url, .. }
            | FetchError::Body { url, .. } => Some(url),
        }
    }
}

/// No shard files were found for a (language, date) pair
///
/// The display form includes the sibling index names found at the date
/// level, so the message alone tells the user which languages exist.
#[derive(Debug, Error)]
#[error("no .json.bz2 shard files found for language '{language}' at {url}{hint}")]
pub struct NoShardsFound {
    /// The index directory URL that was tried first
    pub url: String,
    /// The requested language code
    pub language: String,
    /// The requested dump date
    pub date: String,
    /// Sibling index names listed as a hint
    pub hint: IndexHint,
}

/// Diagnostic listing of sibling index names attached to [`NoShardsFound`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexHint {
    /// Why the directory was considered empty (e.g., the 404 of the retry)
    pub cause: Option<String>,
    /// All sibling index names, sorted
    pub available: Vec<String>,
    /// How many of `available` to print
    pub limit: usize,
    /// Siblings matching the requested variant (only filled for `simple`)
    pub similar: Option<Vec<String>>,
    /// Date-level URL to check by hand when nothing could be listed
    pub date_url: Option<String>,
}

/// How many similar index names are printed under the note
const SIMILAR_LIMIT: usize = 5;

impl fmt::Display for IndexHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(cause) = &self.cause {
            write!(f, " ({cause})")?;
        }

        if self.available.is_empty() {
            if let Some(date_url) = &self.date_url {
                write!(
                    f,
                    "\n\nCould not automatically list available indexes.\n\
                     Please check manually at: {date_url}\n\
                     Look for directories starting with 'index_name='"
                )?;
            }
            return Ok(());
        }

        write!(f, "\n\nAvailable indexes:")?;
        for name in self.available.iter().take(self.limit) {
            write!(f, "\n  - {name}")?;
        }
        if self.available.len() > self.limit {
            write!(f, "\n  ... and {} more", self.available.len() - self.limit)?;
        }

        match &self.similar {
            Some(similar) if !similar.is_empty() => {
                write!(f, "\n\nNote: found indexes containing 'simple':")?;
                for name in similar.iter().take(SIMILAR_LIMIT) {
                    write!(f, "\n  - {name}")?;
                }
            }
            Some(_) => write!(
                f,
                "\n\nNote: no indexes found containing 'simple'. Available indexes are listed above."
            )?,
            None => {}
        }

        Ok(())
    }
}

/// Shard reassembly errors
///
/// Every variant carries enough position context (which shard, how many
/// uncompressed bytes were already written) to tell how far the job got.
/// The output file of a failed job is left in place and must be treated as
/// incomplete.
#[derive(Debug, Error)]
pub enum ReassemblyError {
    /// The shard set was empty
    #[error("no shards to reassemble")]
    NoShards,

    /// The temporary working directory could not be created
    #[error("failed to create temporary directory {path}: {source}")]
    TempDir {
        /// The temporary directory path
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Downloading a shard failed
    #[error("failed to download shard {index}/{total} ({url}): {source}")]
    Download {
        /// The shard URL
        url: String,
        /// 1-based position of the shard
        index: usize,
        /// Number of shards in the job
        total: usize,
        /// The underlying fetch error
        #[source]
        source: FetchError,
    },

    /// Writing a downloaded shard to the temporary directory failed
    #[error("failed to store shard {index}/{total} at {path}: {source}")]
    Store {
        /// The temporary shard path
        path: PathBuf,
        /// 1-based position of the shard
        index: usize,
        /// Number of shards in the job
        total: usize,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The output file could not be created or finalized
    #[error("failed to write output {path} after {bytes_written} bytes: {source}")]
    Output {
        /// The output path
        path: PathBuf,
        /// Uncompressed bytes written before the failure
        bytes_written: u64,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Decompressing a shard or compressing its content failed
    #[error(
        "failed to process shard {index}/{total} ({path}) after {bytes_written} bytes: {source}"
    )]
    Stream {
        /// The temporary shard path
        path: PathBuf,
        /// 1-based position of the shard
        index: usize,
        /// Number of shards in the job
        total: usize,
        /// Uncompressed bytes written before the failure
        bytes_written: u64,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The blocking stream task panicked or was cancelled
    #[error("stream task aborted: {0}")]
    Aborted(String),
}
