//! HTTP access to the dump archive
//!
//! [`ArchiveClient`] wraps a `reqwest::Client` and exposes the three request
//! shapes the pipeline needs: listing pages (GET, decoded as text), content
//! length probes (HEAD) and streamed shard downloads (GET to a file).

use crate::config::HttpConfig;
use crate::error::FetchError;
use crate::listing::{DirectoryListing, parse_listing};
use crate::progress::ProgressReporter;
use reqwest::header::CONTENT_LENGTH;
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tracing::debug;
use url::Url;

/// Error raised while streaming a download to disk
#[derive(Debug)]
pub enum DownloadFailure {
    /// The request or the response body failed
    Fetch(FetchError),
    /// Writing the local file failed
    Io(std::io::Error),
}

/// HTTP client for archive listings and shard files
#[derive(Clone, Debug)]
pub struct ArchiveClient {
    http: reqwest::Client,
    listing_timeout: std::time::Duration,
}

impl ArchiveClient {
    /// Create a new client from the HTTP settings
    ///
    /// # Errors
    /// Returns [`FetchError::Client`] if the TLS backend cannot be initialized
    pub fn new(config: &HttpConfig) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(FetchError::Client)?;

        Ok(Self {
            http,
            listing_timeout: config.listing_timeout,
        })
    }

    /// Fetch a page and decode it as text
    pub async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        debug!(url, "fetching listing");

        let response = self
            .http
            .get(url)
            .timeout(self.listing_timeout)
            .send()
            .await
            .map_err(|e| request_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|e| FetchError::Body {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }

    /// Fetch and parse one directory listing
    ///
    /// # Errors
    /// Returns a [`FetchError`] if the page cannot be retrieved or decoded.
    /// A 404 is reported as [`FetchError::Status`] so callers can tell it apart
    /// via [`FetchError::is_not_found`].
    pub async fn list_directory(&self, url: &str) -> Result<DirectoryListing, FetchError> {
        let html = self.fetch_text(url).await?;
        let listing = parse_listing(&html);
        debug!(
            url,
            files = listing.files.len(),
            directories = listing.directories.len(),
            "parsed listing"
        );
        Ok(listing)
    }

    /// Expected size of a remote file, from a HEAD request
    ///
    /// Only used to size progress bars, so any failure yields `None`.
    pub async fn content_length(&self, url: &Url) -> Option<u64> {
        let response = match self
            .http
            .head(url.clone())
            .timeout(self.listing_timeout)
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => {
                debug!(url = %url, status = response.status().as_u16(), "HEAD rejected");
                return None;
            }
            Err(e) => {
                debug!(url = %url, error = %e, "HEAD failed");
                return None;
            }
        };

        response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse::<u64>().ok())
    }

    /// Stream `url` into a new file at `dest`, reporting bytes as they arrive
    ///
    /// Returns the number of bytes written. A partially written file is left
    /// for the caller to clean up.
    pub async fn download_to_file(
        &self,
        url: &Url,
        dest: &Path,
        progress: &dyn ProgressReporter,
    ) -> Result<u64, DownloadFailure> {
        let total = self.content_length(url).await;
        progress.start(&file_label(dest), total);

        let mut response = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|e| DownloadFailure::Fetch(request_error(url.as_str(), e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadFailure::Fetch(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            }));
        }

        let mut file = tokio::fs::File::create(dest)
            .await
            .map_err(DownloadFailure::Io)?;
        let mut written: u64 = 0;

        while let Some(chunk) = response.chunk().await.map_err(|e| {
            DownloadFailure::Fetch(FetchError::Body {
                url: url.to_string(),
                reason: e.to_string(),
            })
        })? {
            file.write_all(&chunk).await.map_err(DownloadFailure::Io)?;
            written += chunk.len() as u64;
            progress.update(written, total);
        }

        file.flush().await.map_err(DownloadFailure::Io)?;
        progress.finish(&file_label(dest));

        debug!(url = %url, bytes = written, ?dest, "download complete");
        Ok(written)
    }
}

fn request_error(url: &str, source: reqwest::Error) -> FetchError {
    FetchError::Request {
        url: url.to_string(),
        source,
    }
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NoopProgress;
    use tempfile::tempdir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client() -> ArchiveClient {
        ArchiveClient::new(&HttpConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn list_directory_parses_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/dumps/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<a href="../">../</a><a href="20240101/">20240101/</a><a href="notes.txt">n</a>"#,
            ))
            .mount(&server)
            .await;

        let listing = client()
            .list_directory(&format!("{}/dumps/", server.uri()))
            .await
            .unwrap();

        assert!(listing.directories.contains("20240101"));
        assert!(listing.files.contains("notes.txt"));
    }

    #[tokio::test]
    async fn list_directory_reports_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/gone/"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = client()
            .list_directory(&format!("{}/gone/", server.uri()))
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::Status { status: 503, .. }));
        assert!(!err.is_not_found());
    }

    #[tokio::test]
    async fn unmatched_path_is_not_found() {
        let server = MockServer::start().await;

        let err = client()
            .list_directory(&format!("{}/missing/", server.uri()))
            .await
            .unwrap_err();

        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn content_length_comes_from_head() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/shard.json.bz2"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0u8; 4096]))
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/shard.json.bz2", server.uri())).unwrap();

        assert_eq!(client().content_length(&url).await, Some(4096));
    }

    #[tokio::test]
    async fn content_length_is_none_when_head_fails() {
        let server = MockServer::start().await;
        let url = Url::parse(&format!("{}/shard.json.bz2", server.uri())).unwrap();

        assert_eq!(client().content_length(&url).await, None);
    }

    #[tokio::test]
    async fn download_writes_body_to_file() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/shard.json.bz2"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![7u8; 10_000]))
            .mount(&server)
            .await;

        let dir = tempdir().unwrap();
        let dest = dir.path().join("shard.json.bz2");
        let url = Url::parse(&format!("{}/shard.json.bz2", server.uri())).unwrap();

        let written = client()
            .download_to_file(&url, &dest, &NoopProgress)
            .await
            .unwrap();

        assert_eq!(written, 10_000);
        assert_eq!(std::fs::read(&dest).unwrap(), vec![7u8; 10_000]);
    }

    #[tokio::test]
    async fn download_failure_does_not_create_file() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/shard.json.bz2"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let dir = tempdir().unwrap();
        let dest = dir.path().join("shard.json.bz2");
        let url = Url::parse(&format!("{}/shard.json.bz2", server.uri())).unwrap();

        let err = client()
            .download_to_file(&url, &dest, &NoopProgress)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DownloadFailure::Fetch(FetchError::Status { status: 500, .. })
        ));
        assert!(!dest.exists());
    }
}
