//! HTML directory listing parsing
//!
//! Archive servers publish auto-generated index pages where every entry is an
//! anchor. Entries whose target ends in `/` are directories, everything else
//! is a file. [`parse_listing`] implements that rule over a real HTML parser;
//! [`scan_hrefs`] is a raw text fallback for pages that render entries
//! without the usual tag structure.

use regex::Regex;
use scraper::{Html, Selector};
use std::collections::BTreeSet;

/// Link targets that navigate within the listing instead of naming an entry
const NAVIGATION_TARGETS: [&str; 2] = ["../", "./"];

/// Files and directories found on one listing page
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DirectoryListing {
    /// Leaf entries (link targets without a trailing `/`)
    pub files: BTreeSet<String>,
    /// Container entries, stored without the trailing `/`
    pub directories: BTreeSet<String>,
}

impl DirectoryListing {
    /// Directory names satisfying `predicate`
    pub fn directories_matching<'a>(
        &'a self,
        predicate: impl Fn(&str) -> bool + 'a,
    ) -> impl Iterator<Item = &'a str> + 'a {
        self.directories
            .iter()
            .map(String::as_str)
            .filter(move |name| predicate(name))
    }

    /// File names ending in `suffix`
    pub fn files_with_suffix<'a>(&'a self, suffix: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.files
            .iter()
            .map(String::as_str)
            .filter(move |name| name.ends_with(suffix))
    }
}

/// Partition every anchor target of `html` into files and directories
pub fn parse_listing(html: &str) -> DirectoryListing {
    let document = Html::parse_document(html);
    let mut listing = DirectoryListing::default();

    let selector = match Selector::parse("a[href]") {
        Ok(s) => s,
        Err(_) => return listing,
    };

    for element in document.select(&selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        if href.is_empty() || NAVIGATION_TARGETS.contains(&href) {
            continue;
        }

        match href.strip_suffix('/') {
            Some(dir) => {
                let name = dir.trim_end_matches('/');
                if !name.is_empty() {
                    listing.directories.insert(name.to_string());
                }
            }
            None => {
                listing.files.insert(href.to_string());
            }
        }
    }

    listing
}

/// Raw search for `href=` targets containing `marker`
///
/// Captures up to the first quote, `>`, whitespace or `/` after the marker,
/// so both `href="index_name=x/"` and unquoted `href=index_name=x` yield
/// `index_name=x`. Results are deduplicated and sorted.
pub fn scan_hrefs(html: &str, marker: &str) -> Vec<String> {
    let pattern = format!(
        r#"href=["']?([^"'>\s]*{}[^"'>\s/]+)"#,
        regex::escape(marker)
    );
    let Ok(re) = Regex::new(&pattern) else {
        return Vec::new();
    };

    re.captures_iter(html)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const NGINX_INDEX: &str = r#"<html>
<head><title>Index of /other/cirrus_search_index/</title></head>
<body>
<h1>Index of /other/cirrus_search_index/</h1><hr><pre><a href="../">../</a>
<a href="20240101/">20240101/</a>                                          02-Jan-2024 10:00       -
<a href="20240108/">20240108/</a>                                          09-Jan-2024 10:00       -
<a href="README.txt">README.txt</a>                                        01-Jan-2024 10:00    1234
</pre><hr></body>
</html>"#;

    #[test]
    fn partitions_files_and_directories() {
        let listing = parse_listing(NGINX_INDEX);

        assert_eq!(
            listing.directories.iter().collect::<Vec<_>>(),
            vec!["20240101", "20240108"]
        );
        assert_eq!(listing.files.iter().collect::<Vec<_>>(), vec!["README.txt"]);
    }

    #[test]
    fn skips_navigation_and_empty_targets() {
        let html = r#"<a href="">empty</a><a href="./">here</a><a href="../">up</a>
            <a href="/">root</a><a>no href</a><a href="data/">data</a>"#;

        let listing = parse_listing(html);

        assert!(listing.files.is_empty());
        assert_eq!(listing.directories.iter().collect::<Vec<_>>(), vec!["data"]);
    }

    #[test]
    fn every_entry_lands_in_exactly_one_set() {
        let html = r#"<a href="a/">a</a><a href="b">b</a><a href="c.json.bz2">c</a>
            <a href="d/">d</a><a href="a/">dup</a>"#;

        let listing = parse_listing(html);

        assert_eq!(listing.directories.len(), 2);
        assert_eq!(listing.files.len(), 2);
        assert!(listing.directories.is_disjoint(&listing.files));
        assert!(listing.directories.iter().all(|d| !d.ends_with('/')));
    }

    #[test]
    fn decodes_entities_in_targets() {
        let html = r#"<a href="index_name=enwiki_content/">x</a><a href="a&amp;b.json.bz2">y</a>"#;

        let listing = parse_listing(html);

        assert!(listing.directories.contains("index_name=enwiki_content"));
        assert!(listing.files.contains("a&b.json.bz2"));
    }

    #[test]
    fn suffix_filter_only_keeps_shards() {
        let listing = parse_listing(
            r#"<a href="part-1.json.bz2">1</a><a href="part-1.json.bz2.md5">m</a><a href="x.json">j</a>"#,
        );

        let shards: Vec<_> = listing.files_with_suffix(".json.bz2").collect();

        assert_eq!(shards, vec!["part-1.json.bz2"]);
    }

    #[test]
    fn raw_scan_finds_unterminated_entries() {
        let html = "<tr><td>href=index_name=enwiki_content dir</td></tr>\
                    <tr><td><a href='index_name=dewiki_content/'>de</a></td></tr>\
                    <tr><td><a href=\"index_name=enwiki_content/\">en again</a></td></tr>";

        let found = scan_hrefs(html, "index_name=");

        assert_eq!(found, vec!["index_name=dewiki_content", "index_name=enwiki_content"]);
    }

    #[test]
    fn raw_scan_without_marker_is_empty() {
        assert!(scan_hrefs(NGINX_INDEX, "index_name=").is_empty());
    }
}
