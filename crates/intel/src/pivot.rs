//! Network pivot: domain to resolved IP to observed URL to URL report.

use std::net::IpAddr;

use serde::Serialize;
use serde_json::Value;
use tracing::{info, instrument};

use crate::ports::NetworkIntel;
use crate::IntelError;

/// Everything gathered along one walk.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PivotReport {
    pub domain: String,
    pub ip: IpAddr,
    pub url: String,
    pub url_report: Value,
}

/// First `rl.resolutions[].ip` that parses as an address.
pub fn first_resolved_ip(resolutions: &Value) -> Option<IpAddr> {
    resolutions
        .pointer("/rl/resolutions")?
        .as_array()?
        .iter()
        .filter_map(|r| r.get("ip").and_then(Value::as_str))
        .find_map(|ip| ip.parse().ok())
}

/// First non-empty `rl.urls[].url`.
pub fn first_url(ip_urls: &Value) -> Option<String> {
    ip_urls
        .pointer("/rl/urls")?
        .as_array()?
        .iter()
        .filter_map(|u| u.get("url").and_then(Value::as_str))
        .find(|u| !u.is_empty())
        .map(str::to_string)
}

/// Walks from `domain` to a URL report, following the first result at each
/// step.
#[instrument(skip(intel))]
pub async fn pivot<N>(intel: &N, domain: &str) -> Result<PivotReport, IntelError>
where
    N: NetworkIntel + ?Sized,
{
    let resolutions = intel.domain_resolutions(domain).await?;
    let ip = first_resolved_ip(&resolutions).ok_or(IntelError::EmptyResult {
        step: "domain_resolutions",
    })?;
    info!(%ip, "Domain resolved");

    let urls = intel.urls_from_ip(ip).await?;
    let url = first_url(&urls).ok_or(IntelError::EmptyResult {
        step: "urls_from_ip",
    })?;
    info!(%url, "URL observed on address");

    let url_report = intel.url_report(&url).await?;
    Ok(PivotReport {
        domain: domain.to_string(),
        ip,
        url,
        url_report,
    })
}
