//! Core types for cirrus-dl

use regex::Regex;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use url::Url;

static DUMP_DATE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"^[0-9]{8}$").expect("static date pattern")
});

/// Dump date directory name in `YYYYMMDD` form
///
/// Treated as an opaque sortable token: fixed-width zero-padded digits order
/// the same lexicographically as numerically, so no calendar parsing is done.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DumpDate(String);

impl DumpDate {
    /// Wrap a date string as given, without validation
    ///
    /// Explicit dates from the command line go through here; an unknown date
    /// simply produces a 404 further down the pipeline.
    pub fn new(date: impl Into<String>) -> Self {
        Self(date.into())
    }

    /// Wrap `name` only if it looks like a dump date directory
    pub fn from_directory(name: &str) -> Option<Self> {
        Self::is_dump_date(name).then(|| Self(name.to_string()))
    }

    /// Returns true if `name` is exactly eight ASCII digits
    pub fn is_dump_date(name: &str) -> bool {
        DUMP_DATE.is_match(name)
    }

    /// The date string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DumpDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fully-qualified URL of one compressed shard
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShardReference {
    url: Url,
}

impl ShardReference {
    /// Wrap a shard URL
    pub fn new(url: Url) -> Self {
        Self { url }
    }

    /// The shard URL
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Local name for the downloaded shard
    ///
    /// The last path segment, percent-decoded when the decoded form is still a
    /// single plain file name. Otherwise the raw segment is kept, and `shard`
    /// is the fallback when neither is usable. The result never contains a
    /// path separator, so joining it onto a directory stays inside it.
    pub fn filename(&self) -> String {
        let Some(segment) = self
            .url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
        else {
            return "shard".to_string();
        };

        match urlencoding::decode(segment) {
            Ok(decoded) if is_plain_file_name(&decoded) => decoded.into_owned(),
            _ if is_plain_file_name(segment) => segment.to_string(),
            _ => "shard".to_string(),
        }
    }
}

/// Returns true if `name` is one normal path component with no separator
pub fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && !name.contains(['/', '\\', '\0'])
        && name != "."
        && name != ".."
        && !Path::new(name).is_absolute()
}

impl fmt::Display for ShardReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.url)
    }
}

/// Name of the reassembled corpus for a language and date
///
/// `simple` follows the same template and yields `simplewiki-...`.
pub fn output_filename(language: &str, date: &DumpDate) -> String {
    format!("{language}wiki-{date}-cirrussearch-content.json.gz")
}

/// What one complete run produced
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DownloadReport {
    /// The reassembled corpus
    pub output_path: PathBuf,
    /// The dump date that was downloaded
    pub date: DumpDate,
    /// Number of shards folded into the output
    pub shard_count: usize,
    /// Uncompressed bytes written to the output
    pub uncompressed_bytes: u64,
}
