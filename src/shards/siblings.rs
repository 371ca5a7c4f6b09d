//! Sibling index discovery for diagnostics
//!
//! When the requested index directory is empty or missing, the date-level
//! listing is scraped for the index names that do exist. Servers render that
//! page inconsistently, so three strategies are tried in order and the first
//! non-empty result wins.

use super::SHARD_SUFFIX;
use crate::client::ArchiveClient;
use crate::listing::{DirectoryListing, parse_listing, scan_hrefs};
use std::collections::BTreeSet;
use tracing::debug;

/// Prefix shared by every index directory at the date level
pub const INDEX_MARKER: &str = "index_name=";

/// Which strategy produced an [`IndexListing`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IndexSource {
    /// Directory entries starting with the marker
    Listing,
    /// File and directory entries containing the marker, suffix stripped
    Normalized,
    /// Raw `href=` search over the page text
    RawScan,
}

/// Sibling index names found at the date level
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IndexListing {
    /// Index names, sorted and deduplicated
    pub names: Vec<String>,
    /// The strategy that found them, `None` when nothing was found
    pub source: Option<IndexSource>,
}

type Strategy = fn(&DirectoryListing, &str) -> Vec<String>;

const STRATEGIES: [(IndexSource, Strategy); 3] = [
    (IndexSource::Listing, from_directories),
    (IndexSource::Normalized, from_all_entries),
    (IndexSource::RawScan, from_raw_html),
];

fn from_directories(listing: &DirectoryListing, _html: &str) -> Vec<String> {
    listing
        .directories_matching(|name| name.starts_with(INDEX_MARKER))
        .map(str::to_string)
        .collect()
}

fn from_all_entries(listing: &DirectoryListing, _html: &str) -> Vec<String> {
    listing
        .files
        .iter()
        .chain(listing.directories.iter())
        .filter(|entry| entry.contains(INDEX_MARKER))
        .map(|entry| entry.replace(SHARD_SUFFIX, ""))
        .filter(|name| name.starts_with(INDEX_MARKER))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn from_raw_html(_listing: &DirectoryListing, html: &str) -> Vec<String> {
    scan_hrefs(html, INDEX_MARKER)
        .into_iter()
        .filter(|name| name.starts_with(INDEX_MARKER))
        .collect()
}

/// Run the strategy chain over one date-level page
pub fn sibling_indexes(listing: &DirectoryListing, html: &str) -> IndexListing {
    STRATEGIES
        .iter()
        .find_map(|(source, strategy)| {
            let mut names = strategy(listing, html);
            if names.is_empty() {
                return None;
            }
            names.sort();
            Some(IndexListing {
                names,
                source: Some(*source),
            })
        })
        .unwrap_or_default()
}

/// List the index directories published for one date
///
/// Best effort: a failed request yields an empty listing, since this only
/// decorates an error that is already being reported.
pub async fn list_available_indexes(client: &ArchiveClient, date_url: &str) -> IndexListing {
    let html = match client.fetch_text(date_url).await {
        Ok(html) => html,
        Err(e) => {
            debug!(url = date_url, error = %e, "could not list available indexes");
            return IndexListing::default();
        }
    };

    let found = sibling_indexes(&parse_listing(&html), &html);
    debug!(
        url = date_url,
        count = found.names.len(),
        source = ?found.source,
        "listed available indexes"
    );
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(html: &str) -> IndexListing {
        sibling_indexes(&parse_listing(html), html)
    }

    #[test]
    fn prefers_directory_entries() {
        let found = run(r#"<a href="../">../</a>
            <a href="index_name=enwiki_content/">en</a>
            <a href="index_name=dewiki_content/">de</a>
            <a href="index_name=frwiki_general.json.bz2">stray file</a>"#);

        assert_eq!(found.source, Some(IndexSource::Listing));
        assert_eq!(
            found.names,
            vec!["index_name=dewiki_content", "index_name=enwiki_content"]
        );
    }

    #[test]
    fn falls_back_to_normalized_entries() {
        let found = run(r#"<a href="index_name=enwiki_content">en</a>
            <a href="index_name=enwiki_content.json.bz2">en again</a>
            <a href="other/index_name=zz">nested</a>
            <a href="readme.txt">readme</a>"#);

        assert_eq!(found.source, Some(IndexSource::Normalized));
        assert_eq!(found.names, vec!["index_name=enwiki_content"]);
    }

    #[test]
    fn falls_back_to_raw_scan() {
        let found = run("<pre>href=index_name=simplewiki_content size=12</pre>");

        assert_eq!(found.source, Some(IndexSource::RawScan));
        assert_eq!(found.names, vec!["index_name=simplewiki_content"]);
    }

    #[test]
    fn nothing_found_is_empty() {
        let found = run(r#"<a href="20240101/">20240101/</a>"#);

        assert_eq!(found, IndexListing::default());
    }
}
