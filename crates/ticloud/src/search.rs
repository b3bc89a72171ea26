//! Advanced Search and the `intel` port implementations.

use std::net::IpAddr;

use async_trait::async_trait;
use intel::{HashType, IntelError, NetworkIntel, SampleAnalysis, SampleSearch, SearchPage, Sha256};
use serde_json::Value;
use tracing::instrument;

use crate::endpoints;
use crate::{TiCloudClient, TiCloudError};

/// Largest page the Advanced Search API accepts.
pub const MAX_RECORDS_PER_PAGE: u32 = 10_000;

impl TiCloudClient {
    /// One page of Advanced Search results (full response body).
    #[instrument(skip(self))]
    pub async fn advanced_search(
        &self,
        query: &str,
        page: u32,
        records_per_page: u32,
    ) -> Result<Value, TiCloudError> {
        if query.trim().is_empty() {
            return Err(TiCloudError::InvalidInput("search query must not be empty".into()));
        }
        if page == 0 || !(1..=MAX_RECORDS_PER_PAGE).contains(&records_per_page) {
            return Err(TiCloudError::InvalidInput(format!(
                "page must be at least 1 and records per page between 1 and {MAX_RECORDS_PER_PAGE}"
            )));
        }
        self.post_json(
            endpoints::ADVANCED_SEARCH,
            &endpoints::advanced_search(query, page, records_per_page),
            "search results",
        )
        .await
    }
}

#[async_trait]
impl SampleSearch for TiCloudClient {
    async fn search(
        &self,
        query: &str,
        page: u32,
        records_per_page: u32,
    ) -> Result<SearchPage, IntelError> {
        let body = self.advanced_search(query, page, records_per_page).await?;
        SearchPage::from_response(&body)
    }
}

#[async_trait]
impl SampleAnalysis for TiCloudClient {
    async fn analysis_results(&self, hashes: &[Sha256]) -> Result<Vec<Value>, IntelError> {
        let raw: Vec<&str> = hashes.iter().map(Sha256::as_str).collect();
        Ok(self.file_analysis_bulk(HashType::Sha256, &raw).await?)
    }
}

#[async_trait]
impl NetworkIntel for TiCloudClient {
    async fn domain_resolutions(&self, domain: &str) -> Result<Value, IntelError> {
        Ok(self.domain_to_ip_resolutions(domain).await?)
    }

    async fn urls_from_ip(&self, ip: IpAddr) -> Result<Value, IntelError> {
        Ok(TiCloudClient::urls_from_ip(self, ip).await?)
    }

    async fn url_report(&self, url: &str) -> Result<Value, IntelError> {
        Ok(TiCloudClient::url_report(self, url).await?)
    }
}
