//! Domain, IP and URL threat intelligence.

use std::net::IpAddr;

use serde_json::Value;
use tracing::instrument;

use crate::endpoints;
use crate::{TiCloudClient, TiCloudError};

fn require(value: &str, what: &str) -> Result<(), TiCloudError> {
    if value.trim().is_empty() {
        return Err(TiCloudError::InvalidInput(format!("{what} must not be empty")));
    }
    Ok(())
}

impl TiCloudClient {
    #[instrument(skip(self))]
    pub async fn domain_report(&self, domain: &str) -> Result<Value, TiCloudError> {
        require(domain, "domain")?;
        self.post_json(
            endpoints::DOMAIN_REPORT,
            &endpoints::domain_query(domain),
            &format!("domain {domain}"),
        )
        .await
    }

    #[instrument(skip(self))]
    pub async fn domain_to_ip_resolutions(&self, domain: &str) -> Result<Value, TiCloudError> {
        require(domain, "domain")?;
        self.post_json(
            endpoints::DOMAIN_RESOLUTIONS,
            &endpoints::domain_resolutions_query(domain),
            &format!("domain {domain}"),
        )
        .await
    }

    #[instrument(skip(self))]
    pub async fn urls_from_ip(&self, ip: IpAddr) -> Result<Value, TiCloudError> {
        self.post_json(
            endpoints::IP_URLS,
            &endpoints::ip_urls_query(&ip.to_string()),
            &format!("IP address {ip}"),
        )
        .await
    }

    #[instrument(skip(self))]
    pub async fn url_report(&self, url: &str) -> Result<Value, TiCloudError> {
        require(url, "URL")?;
        self.post_json(
            endpoints::URL_REPORT,
            &endpoints::url_query(url),
            &format!("URL {url}"),
        )
        .await
    }

    /// Files downloaded from a URL.
    #[instrument(skip(self))]
    pub async fn url_downloaded_files(&self, url: &str) -> Result<Value, TiCloudError> {
        require(url, "URL")?;
        self.post_json(
            endpoints::URL_DOWNLOADED_FILES,
            &endpoints::url_downloaded_files_query(url),
            &format!("URL {url}"),
        )
        .await
    }

    /// Submits a URL for analysis.
    #[instrument(skip(self))]
    pub async fn submit_url(&self, url: &str) -> Result<Value, TiCloudError> {
        require(url, "URL")?;
        self.post_json(
            endpoints::URL_ANALYZE,
            &endpoints::url_query(url),
            &format!("URL {url}"),
        )
        .await
    }
}
