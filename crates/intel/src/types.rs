//! Shared value types for the cookbook domain.
//!
//! Unlike the newtype identifiers in [`crate::identifiers`], these types carry
//! meaningful values with invariants (e.g. a first-seen range never ends
//! before it starts) and are the units the hunt driver accumulates.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::dynamic::DynamicAnalysisSummary;
use crate::{IntelError, Md5, Sha1, Sha256, ThreatFamily};

/// Default TitaniumCloud host used when no `url` is configured.
pub const DEFAULT_HOST: &str = "https://data.reversinglabs.com";

/// Page size requested from the Advanced Search API by the hunt driver.
pub const RECORDS_PER_PAGE: u32 = 100;

const SEARCH_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

// ---------------------------------------------------------------------------
// Search query
// ---------------------------------------------------------------------------

/// Inclusive first-seen window for an Advanced Search query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirstSeenRange {
    since: DateTime<Utc>,
    until: DateTime<Utc>,
}

impl FirstSeenRange {
    /// Creates a range, rejecting one whose end precedes its start.
    pub fn new(since: DateTime<Utc>, until: DateTime<Utc>) -> Result<Self, IntelError> {
        if since > until {
            return Err(IntelError::invalid(format!(
                "first-seen range starts after it ends ({} > {})",
                since.format(SEARCH_TIME_FORMAT),
                until.format(SEARCH_TIME_FORMAT)
            )));
        }
        Ok(Self { since, until })
    }

    /// Parses both bounds from user input.
    ///
    /// Accepts RFC 3339 timestamps (`2019-01-03T04:10:00Z`) or bare dates
    /// (`2019-01-03`, interpreted as midnight UTC).
    pub fn parse(since: &str, until: &str) -> Result<Self, IntelError> {
        Self::new(parse_timestamp(since)?, parse_timestamp(until)?)
    }

    pub fn since(&self) -> DateTime<Utc> {
        self.since
    }

    pub fn until(&self) -> DateTime<Utc> {
        self.until
    }
}

fn parse_timestamp(input: &str) -> Result<DateTime<Utc>, IntelError> {
    let input = input.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(input) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| {
            IntelError::invalid(format!(
                "'{input}' is not a date (expected e.g. 2019-01-03T04:10:00Z)"
            ))
        })
}

/// A family hunt query over a first-seen window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub range: FirstSeenRange,
    pub family: ThreatFamily,
}

impl SearchQuery {
    pub fn new(range: FirstSeenRange, family: ThreatFamily) -> Self {
        Self { range, family }
    }

    /// Renders the Advanced Search query string.
    pub fn to_query_string(&self) -> String {
        format!(
            "firstseen:[{} TO {}] threatname:*{}",
            self.range.since.format(SEARCH_TIME_FORMAT),
            self.range.until.format(SEARCH_TIME_FORMAT),
            self.family
        )
    }
}

impl std::fmt::Display for SearchQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_query_string())
    }
}

// ---------------------------------------------------------------------------
// Search results
// ---------------------------------------------------------------------------

/// One page of Advanced Search results (`rl.web_search_api`).
///
/// Every field is optional on the wire; a missing `total_count` is how the
/// API reports an empty result set.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SearchPage {
    #[serde(default)]
    pub total_count: Option<u64>,
    #[serde(default, deserialize_with = "tolerant_entries")]
    pub entries: Vec<SearchEntry>,
    #[serde(default)]
    pub next_page: Option<u32>,
    #[serde(default)]
    pub more_pages: Option<bool>,
}

impl SearchPage {
    /// Decodes a page from a full search response body.
    ///
    /// A body without `rl.web_search_api` decodes to an empty page rather
    /// than an error, matching how the API reports "nothing found".
    pub fn from_response(body: &Value) -> Result<Self, IntelError> {
        match body.get("rl").and_then(|rl| rl.get("web_search_api")) {
            Some(api) => serde_json::from_value(api.clone())
                .map_err(|e| IntelError::Decode(format!("search page: {e}"))),
            None => Ok(Self::default()),
        }
    }

    /// `true` when the page reports no matching samples at all.
    pub fn is_empty_result(&self) -> bool {
        !matches!(self.total_count, Some(n) if n > 0)
    }

    /// The page to request next, or `None` when pagination is finished.
    pub fn following_page(&self) -> Option<u32> {
        match (self.more_pages, self.next_page) {
            (Some(true), Some(next)) => Some(next),
            _ => None,
        }
    }
}

/// Decodes entries one at a time; an entry of the wrong shape is dropped.
fn tolerant_entries<'de, D>(deserializer: D) -> Result<Vec<SearchEntry>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(raw
        .into_iter()
        .filter_map(|entry| match serde_json::from_value(entry) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(error = %e, "Skipping undecodable search entry");
                None
            }
        })
        .collect())
}

/// A single search hit as returned by the API.
///
/// Fields are kept optional so one incomplete entry does not fail the page.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SearchEntry {
    #[serde(default)]
    pub sha1: Option<String>,
    #[serde(default)]
    pub sha256: Option<String>,
    #[serde(default)]
    pub md5: Option<String>,
    #[serde(default)]
    pub firstseen: Option<String>,
    #[serde(default)]
    pub threatname: Option<String>,
    #[serde(default)]
    pub sampletype: Option<String>,
}

impl SearchEntry {
    /// Converts the hit into an output record, or `None` when a required
    /// field is missing or a hash is malformed.
    pub fn into_record(self) -> Option<SampleRecord> {
        let record = (|| {
            Some(SampleRecord {
                first_seen: self.firstseen.clone()?,
                sha1: Sha1::new(self.sha1.as_deref()?)?,
                md5: Md5::new(self.md5.as_deref()?)?,
                threat_name: self.threatname.clone()?,
                file_type: self.sampletype.clone()?,
                sha256: Sha256::new(self.sha256.as_deref()?)?,
                dynamic_analysis: None,
            })
        })();
        if record.is_none() {
            warn!(sha1 = ?self.sha1, "Skipping search entry with missing or malformed fields");
        }
        record
    }
}

/// One sample in the hunt output file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleRecord {
    pub first_seen: String,
    pub sha1: Sha1,
    pub md5: Md5,
    pub threat_name: String,
    pub file_type: String,
    /// Used to request analysis details; not part of the output shape.
    #[serde(skip_serializing)]
    pub sha256: Sha256,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dynamic_analysis: Option<Vec<DynamicAnalysisSummary>>,
}
