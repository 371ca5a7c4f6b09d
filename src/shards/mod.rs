//! Shard discovery for one language and date
//!
//! Shards live under `{date_url}index_name={lang}wiki_content/`. Some servers
//! reject the literal `=` in that path, so a 404 triggers exactly one retry
//! with the directory name percent-encoded. When no shard can be found the
//! error lists the sibling index names published for that date.

mod siblings;

pub use siblings::{
    INDEX_MARKER, IndexListing, IndexSource, list_available_indexes, sibling_indexes,
};

use crate::client::ArchiveClient;
use crate::config::Config;
use crate::error::{FetchError, IndexHint, NoShardsFound, Result};
use crate::listing::DirectoryListing;
use crate::types::{DumpDate, ShardReference};
use tracing::{debug, info, warn};
use url::Url;

/// Suffix of a published shard file
pub const SHARD_SUFFIX: &str = ".json.bz2";

/// Variant whose index names are known to drift, earning an extra hint
const SIMPLE_LANGUAGE: &str = "simple";

/// Index directory name for a language
///
/// The language code is inserted verbatim; `simple` needs no special case.
pub fn index_dir_name(language: &str) -> String {
    format!("{INDEX_MARKER}{language}wiki_content")
}

/// Percent-encode each path segment, keeping the `/` separators
pub fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Join a directory name onto `base`, producing a URL ending in `/`
pub fn directory_url(base: &str, dir: &str) -> std::result::Result<Url, FetchError> {
    let invalid = |reason: String| FetchError::InvalidUrl {
        url: format!("{base}{dir}/"),
        reason,
    };

    Url::parse(base)
        .map_err(|e| invalid(e.to_string()))?
        .join(&format!("{dir}/"))
        .map_err(|e| invalid(e.to_string()))
}

/// Shard files of a listing as full URLs, in ascending filename order
///
/// The order is plain string order (`part-1`, `part-10`, `part-2`); it decides
/// the concatenation order of the corpus and must not become numeric.
///
/// Entries that do not resolve to a direct child of `dir_url` (another host,
/// an absolute path, `..` or a nested path) are skipped.
pub fn shard_references(
    dir_url: &Url,
    listing: &DirectoryListing,
) -> std::result::Result<Vec<ShardReference>, FetchError> {
    let mut names: Vec<&str> = listing.files_with_suffix(SHARD_SUFFIX).collect();
    names.sort_unstable();

    let mut shards = Vec::with_capacity(names.len());
    for name in names {
        let url = dir_url.join(name).map_err(|e| FetchError::InvalidUrl {
            url: format!("{dir_url}{name}"),
            reason: e.to_string(),
        })?;
        if !is_direct_child(dir_url, &url) {
            warn!(href = name, dir = %dir_url, "skipping shard entry outside the index directory");
            continue;
        }
        shards.push(ShardReference::new(url));
    }

    Ok(shards)
}

/// Returns true if `url` names a file directly inside the directory `dir_url`
fn is_direct_child(dir_url: &Url, url: &Url) -> bool {
    url.origin() == dir_url.origin()
        && url
            .path()
            .strip_prefix(dir_url.path())
            .is_some_and(|rest| !rest.is_empty() && !rest.contains('/'))
}

/// Locates the shard set of one (language, date) pair
#[derive(Clone, Debug)]
pub struct ShardLocator<'a> {
    client: &'a ArchiveClient,
    hint_limit: usize,
    extended_hint_limit: usize,
}

impl<'a> ShardLocator<'a> {
    /// Create a locator with the default hint sizes (10, and 20 after a 404)
    pub fn new(client: &'a ArchiveClient) -> Self {
        let defaults = Config::default();
        Self {
            client,
            hint_limit: defaults.hint_limit,
            extended_hint_limit: defaults.extended_hint_limit,
        }
    }

    /// Override how many sibling index names the errors list
    pub fn with_hint_limits(mut self, hint_limit: usize, extended_hint_limit: usize) -> Self {
        self.hint_limit = hint_limit;
        self.extended_hint_limit = extended_hint_limit;
        self
    }

    /// Find every shard of `language` under the date directory `date_url`
    ///
    /// # Errors
    /// - [`Error::NoShardsFound`](crate::Error::NoShardsFound) if neither the
    ///   literal nor the percent-encoded directory lists a shard
    /// - [`Error::Fetch`](crate::Error::Fetch) for any failure other than a
    ///   404 on the literal directory
    pub async fn discover(
        &self,
        date_url: &str,
        language: &str,
        date: &DumpDate,
    ) -> Result<Vec<ShardReference>> {
        let subdir = index_dir_name(language);
        let dir_url = directory_url(date_url, &subdir)?;

        info!(url = %dir_url, "discovering shard files");

        match self.client.list_directory(dir_url.as_str()).await {
            Ok(listing) => {
                let shards = shard_references(&dir_url, &listing)?;
                if shards.is_empty() {
                    let available = list_available_indexes(self.client, date_url).await;
                    return Err(NoShardsFound {
                        url: dir_url.to_string(),
                        language: language.to_string(),
                        date: date.to_string(),
                        hint: IndexHint {
                            available: available.names,
                            limit: self.hint_limit,
                            ..Default::default()
                        },
                    }
                    .into());
                }
                info!(count = shards.len(), "found shard files");
                Ok(shards)
            }
            Err(e) if e.is_not_found() => {
                if let Some(shards) = self.discover_encoded(date_url, &subdir).await? {
                    return Ok(shards);
                }
                Err(self.missing_index(date_url, &dir_url, language, date, &e).await.into())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// The single retry with `=` percent-encoded
    ///
    /// Any failure of the retry itself is treated like an empty directory;
    /// the caller then reports the original 404.
    async fn discover_encoded(
        &self,
        date_url: &str,
        subdir: &str,
    ) -> Result<Option<Vec<ShardReference>>> {
        let encoded_url = directory_url(date_url, &encode_path(subdir))?;
        info!(url = %encoded_url, "retrying with URL encoding");

        match self.client.list_directory(encoded_url.as_str()).await {
            Ok(listing) => {
                let shards = shard_references(&encoded_url, &listing)?;
                if shards.is_empty() {
                    debug!(url = %encoded_url, "encoded directory lists no shards");
                    return Ok(None);
                }
                info!(count = shards.len(), "found shard files");
                Ok(Some(shards))
            }
            Err(e) => {
                debug!(url = %encoded_url, error = %e, "encoded retry failed");
                Ok(None)
            }
        }
    }

    async fn missing_index(
        &self,
        date_url: &str,
        dir_url: &Url,
        language: &str,
        date: &DumpDate,
        cause: &FetchError,
    ) -> NoShardsFound {
        info!(url = date_url, "attempting to list available indexes from date directory");
        let available = list_available_indexes(self.client, date_url).await;

        let similar = (language == SIMPLE_LANGUAGE).then(|| {
            available
                .names
                .iter()
                .filter(|name| name.to_lowercase().contains(SIMPLE_LANGUAGE))
                .cloned()
                .collect()
        });

        NoShardsFound {
            url: dir_url.to_string(),
            language: language.to_string(),
            date: date.to_string(),
            hint: IndexHint {
                cause: Some(format!(
                    "{cause}; the language may not be available for {date} or the index name format may differ"
                )),
                available: available.names,
                limit: self.extended_hint_limit,
                similar,
                date_url: Some(date_url.to_string()),
            },
        }
    }
}
