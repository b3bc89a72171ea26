//! Port traits implemented by infrastructure crates.
//!
//! The hunt driver and the network walk depend only on these traits; the
//! `ticloud` crate implements them over HTTP and tests implement them with
//! in-memory fakes.

use std::net::IpAddr;

use async_trait::async_trait;
use serde_json::Value;

use crate::{IntelError, SearchPage, Sha256};

/// Paged sample search (Advanced Search API).
#[async_trait]
pub trait SampleSearch: Send + Sync {
    /// Fetches one page of results for `query`.
    ///
    /// `page` is 1-based.
    async fn search(
        &self,
        query: &str,
        page: u32,
        records_per_page: u32,
    ) -> Result<SearchPage, IntelError>;
}

/// Bulk file-analysis lookups.
#[async_trait]
pub trait SampleAnalysis: Send + Sync {
    /// Returns the `rl.entries` array of a bulk file-analysis response for
    /// `hashes`. Entries carry their own `sha1`/`sha256` fields; their order
    /// is not guaranteed to match the request.
    async fn analysis_results(&self, hashes: &[Sha256]) -> Result<Vec<Value>, IntelError>;
}

/// Domain, IP and URL intelligence used by the network walk.
#[async_trait]
pub trait NetworkIntel: Send + Sync {
    /// Domain to IP resolutions (full response body).
    async fn domain_resolutions(&self, domain: &str) -> Result<Value, IntelError>;

    /// URLs observed on an IP address (full response body).
    async fn urls_from_ip(&self, ip: IpAddr) -> Result<Value, IntelError>;

    /// URL threat-intelligence report (full response body).
    async fn url_report(&self, url: &str) -> Result<Value, IntelError>;
}
