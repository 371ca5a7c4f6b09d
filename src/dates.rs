//! Latest dump date selection

use crate::client::ArchiveClient;
use crate::error::{Error, Result};
use crate::listing::DirectoryListing;
use crate::types::DumpDate;
use tracing::info;

/// All `YYYYMMDD` directories of a listing, sorted ascending
pub fn candidate_dates(listing: &DirectoryListing) -> Vec<DumpDate> {
    let mut dates: Vec<DumpDate> = listing
        .directories
        .iter()
        .filter_map(|name| DumpDate::from_directory(name))
        .collect();
    dates.sort();
    dates
}

/// Find the most recent dump date published under `base_url`
///
/// # Errors
/// - [`Error::Fetch`] if the archive root cannot be listed
/// - [`Error::NoDatesFound`] if no directory name is exactly eight digits
pub async fn find_latest_date(client: &ArchiveClient, base_url: &str) -> Result<DumpDate> {
    info!(url = base_url, "checking available dates");

    let listing = client.list_directory(base_url).await?;
    let dates = candidate_dates(&listing);

    let Some(latest) = dates.last().cloned() else {
        return Err(Error::NoDatesFound {
            url: base_url.to_string(),
        });
    };

    info!(count = dates.len(), latest = %latest, "found available dates, using latest");
    Ok(latest)
}
