//! Remote archive access. One detail page per catalog record, keyed by the
//! record's archive id; the resolver fetches a page at most once per record
//! because parsed choices are cached in the catalog.

use std::future::Future;

use anyhow::{bail, Context, Result};

/// Seam for fetching archive detail pages. Production uses
/// [`ArchiveClient`]; tests script responses.
pub trait ArchiveSource: Send + Sync {
    fn fetch_archive(&self, archive_id: i64) -> impl Future<Output = Result<String>> + Send;
}

/// HTTP client for the archive site.
#[derive(Clone)]
pub struct ArchiveClient {
    client: reqwest::Client,
    base_url: String,
}

impl ArchiveClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    fn archive_url(&self, archive_id: i64) -> String {
        format!("{}/archives/{archive_id}", self.base_url.trim_end_matches('/'))
    }
}

impl ArchiveSource for ArchiveClient {
    async fn fetch_archive(&self, archive_id: i64) -> Result<String> {
        let url = self.archive_url(archive_id);
        log::debug!("fetching archive page {url}");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("request to {url} failed"))?;

        if !response.status().is_success() {
            bail!("archive page {url} returned HTTP {}", response.status());
        }

        response
            .text()
            .await
            .with_context(|| format!("reading body of {url} failed"))
    }
}
