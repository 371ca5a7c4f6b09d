//! A mock dump archive served by wiremock

use super::fixtures::{autoindex, bz2};
use cirrus_dl::{CirrusDownloader, Config};
use std::path::Path;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Archive root path on the mock server
pub const ROOT: &str = "/other/cirrus_search_index/";

/// Mock archive with helpers to publish dates, indexes and shards
pub struct MockArchive {
    /// The underlying server
    pub server: MockServer,
}

impl MockArchive {
    /// Start an empty archive
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Base URL of the archive root
    pub fn base_url(&self) -> String {
        format!("{}{ROOT}", self.server.uri())
    }

    /// Serve an HTML listing at `route`
    pub async fn page(&self, route: &str, entries: &[&str]) {
        Mock::given(method("GET"))
            .and(path(route.to_string()))
            .respond_with(ResponseTemplate::new(200).set_body_string(autoindex(entries)))
            .mount(&self.server)
            .await;
    }

    /// Serve the root listing with these date directories
    pub async fn dates(&self, dates: &[&str]) {
        let entries: Vec<String> = dates.iter().map(|d| format!("{d}/")).collect();
        let refs: Vec<&str> = entries.iter().map(String::as_str).collect();
        self.page(ROOT, &refs).await;
    }

    /// Serve a shard listing under `index_dir` of `date`, one shard per
    /// `(name, content)` pair
    pub async fn index(&self, date: &str, index_dir: &str, shards: &[(&str, &[u8])]) {
        let dir_route = format!("{ROOT}{date}/{index_dir}/");
        let names: Vec<&str> = shards.iter().map(|(name, _)| *name).collect();
        self.page(&dir_route, &names).await;

        for (name, content) in shards {
            Mock::given(method("GET"))
                .and(path(format!("{dir_route}{name}")))
                .respond_with(ResponseTemplate::new(200).set_body_bytes(bz2(content)))
                .mount(&self.server)
                .await;
        }
    }

    /// Downloader pointed at this archive, writing into `output_dir`
    pub fn downloader(&self, output_dir: &Path) -> CirrusDownloader {
        CirrusDownloader::new(Config {
            base_url: self.base_url(),
            output_dir: output_dir.to_path_buf(),
            ..Default::default()
        })
        .expect("valid test config")
    }
}
