//! File intelligence: reputation, AV scanner cross-reference, file analysis,
//! and RHA1 functional similarity.

use std::str::FromStr;

use intel::{HashType, SampleHash, Sha1};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::endpoints::{self, BULK_LIMIT};
use crate::{TiCloudClient, TiCloudError};

/// Largest page the RHA1 endpoint accepts.
pub const MAX_RHA1_PAGE: u32 = 1000;

/// RHA1 hash families, one per executable format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rha1Type {
    Pe01,
    Elf01,
    Macho01,
}

impl Rha1Type {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pe01 => "pe01",
            Self::Elf01 => "elf01",
            Self::Macho01 => "macho01",
        }
    }

    /// Maps a file-analysis `file_subtype` (e.g. `PE32+`, `ELF64 Little`,
    /// `MachO32 Big`) to its RHA1 family.
    pub fn for_subtype(subtype: &str) -> Option<Self> {
        let subtype = subtype.trim();
        if subtype.starts_with("PE") {
            Some(Self::Pe01)
        } else if subtype.starts_with("ELF") {
            Some(Self::Elf01)
        } else if subtype.starts_with("MachO") {
            Some(Self::Macho01)
        } else {
            None
        }
    }
}

impl FromStr for Rha1Type {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pe01" => Ok(Self::Pe01),
            "elf01" => Ok(Self::Elf01),
            "macho01" => Ok(Self::Macho01),
            other => Err(format!("unknown RHA1 type '{other}' (pe01, elf01, macho01)")),
        }
    }
}

/// Sample classification filter for similarity queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Malicious,
    Suspicious,
    Known,
    Unknown,
}

impl Classification {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Malicious => "MALICIOUS",
            Self::Suspicious => "SUSPICIOUS",
            Self::Known => "KNOWN",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl FromStr for Classification {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "MALICIOUS" => Ok(Self::Malicious),
            "SUSPICIOUS" => Ok(Self::Suspicious),
            "KNOWN" => Ok(Self::Known),
            "UNKNOWN" => Ok(Self::Unknown),
            other => Err(format!(
                "unknown classification '{other}' (MALICIOUS, SUSPICIOUS, KNOWN, UNKNOWN)"
            )),
        }
    }
}

/// Options for [`TiCloudClient::similar_hashes`] and
/// [`TiCloudClient::similar_hashes_aggregated`].
#[derive(Debug, Clone)]
pub struct SimilarityOptions {
    pub extended: bool,
    pub classification: Option<Classification>,
    pub results_per_page: u32,
    /// Only used by the aggregated walk.
    pub max_results: usize,
    /// Resolved from the sample's file analysis when `None`.
    pub rha1_type: Option<Rha1Type>,
}

impl Default for SimilarityOptions {
    fn default() -> Self {
        Self {
            extended: true,
            classification: None,
            results_per_page: MAX_RHA1_PAGE,
            max_results: 5000,
            rha1_type: None,
        }
    }
}

impl SimilarityOptions {
    fn validate(&self) -> Result<(), TiCloudError> {
        if !(1..=MAX_RHA1_PAGE).contains(&self.results_per_page) {
            return Err(TiCloudError::InvalidInput(format!(
                "results per page must be between 1 and {MAX_RHA1_PAGE}"
            )));
        }
        if self.max_results == 0 {
            return Err(TiCloudError::InvalidInput(
                "max results must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Extracts `file_subtype` from a single file-analysis response.
pub fn file_subtype(analysis: &Value) -> Option<&str> {
    analysis
        .pointer("/rl/sample/analysis/entries/0/tc_report/info/file/file_subtype")
        .and_then(Value::as_str)
}

impl TiCloudClient {
    /// Malware presence (reputation) for one sample.
    #[instrument(skip(self, hash), fields(hash = %hash))]
    pub async fn file_reputation(&self, hash: &SampleHash) -> Result<Value, TiCloudError> {
        self.get_json(&endpoints::file_reputation(hash), &format!("sample {hash}"))
            .await
    }

    /// AV scanner cross-reference results for one sample.
    #[instrument(skip(self, hash), fields(hash = %hash))]
    pub async fn av_scanners(&self, hash: &SampleHash) -> Result<Value, TiCloudError> {
        self.get_json(&endpoints::av_scanners(hash), &format!("sample {hash}"))
            .await
    }

    /// Full file-analysis record for one sample.
    #[instrument(skip(self, hash), fields(hash = %hash))]
    pub async fn file_analysis(&self, hash: &SampleHash) -> Result<Value, TiCloudError> {
        self.get_json(&endpoints::file_analysis(hash), &format!("sample {hash}"))
            .await
    }

    /// Bulk file analysis; returns the concatenated `rl.entries`.
    ///
    /// All hashes must share one type. Requests are split into chunks of
    /// [`BULK_LIMIT`] and sent one after another.
    #[instrument(skip(self, hashes), fields(count = hashes.len()))]
    pub async fn file_analysis_bulk(
        &self,
        hash_type: HashType,
        hashes: &[&str],
    ) -> Result<Vec<Value>, TiCloudError> {
        let mut entries = Vec::new();
        for chunk in hashes.chunks(BULK_LIMIT) {
            let body = endpoints::bulk_hash_query(hash_type, chunk);
            let response = self
                .post_json(endpoints::FILE_ANALYSIS_BULK, &body, "bulk file analysis")
                .await?;
            if let Some(found) = response.pointer("/rl/entries").and_then(Value::as_array) {
                entries.extend(found.iter().cloned());
            }
        }
        debug!(entries = entries.len(), "Bulk analysis complete");
        Ok(entries)
    }

    /// Resolves the RHA1 family of a sample from its file analysis.
    pub async fn rha1_type_of(&self, sha1: &Sha1) -> Result<Rha1Type, TiCloudError> {
        let analysis = self.file_analysis(&SampleHash::Sha1(sha1.clone())).await?;
        let subtype = file_subtype(&analysis).ok_or_else(|| {
            TiCloudError::InvalidInput(format!("sample {sha1} has no file subtype"))
        })?;
        Rha1Type::for_subtype(subtype).ok_or_else(|| {
            TiCloudError::InvalidInput(format!(
                "file subtype '{subtype}' has no RHA1 functional similarity support"
            ))
        })
    }

    /// One page of functionally similar samples.
    #[instrument(skip(self, sha1, options), fields(sha1 = %sha1))]
    pub async fn similar_hashes(
        &self,
        sha1: &Sha1,
        page_sha1: Option<&Sha1>,
        options: &SimilarityOptions,
    ) -> Result<Value, TiCloudError> {
        options.validate()?;
        let rha1_type = match options.rha1_type {
            Some(t) => t,
            None => self.rha1_type_of(sha1).await?,
        };
        let path = endpoints::rha1_similarity(
            rha1_type.as_str(),
            sha1,
            page_sha1,
            options.results_per_page,
            options.extended,
            options.classification.map(Classification::as_str),
        );
        self.get_json(&path, &format!("sample {sha1}")).await
    }

    /// Walks every page of similar samples, up to `max_results` entries.
    #[instrument(skip(self, sha1, options), fields(sha1 = %sha1))]
    pub async fn similar_hashes_aggregated(
        &self,
        sha1: &Sha1,
        options: &SimilarityOptions,
    ) -> Result<Vec<Value>, TiCloudError> {
        options.validate()?;
        let mut options = options.clone();
        if options.rha1_type.is_none() {
            options.rha1_type = Some(self.rha1_type_of(sha1).await?);
        }

        let mut results = Vec::new();
        let mut next_page: Option<Sha1> = None;
        loop {
            let response = self
                .similar_hashes(sha1, next_page.as_ref(), &options)
                .await?;
            let group = response.pointer("/rl/group_by_rha1");
            let added = match group
                .and_then(|g| g.get("sha1_list"))
                .and_then(Value::as_array)
            {
                Some(list) => {
                    results.extend(list.iter().cloned());
                    list.len()
                }
                None => 0,
            };
            let following = group
                .and_then(|g| g.get("next_page_sha1"))
                .and_then(Value::as_str)
                .and_then(Sha1::new);

            if results.len() > options.max_results || following.is_none() {
                break;
            }
            if added == 0 || following == next_page {
                warn!(added, "Similarity walk did not advance; stopping");
                break;
            }
            next_page = following;
        }

        results.truncate(options.max_results);
        info!(results = results.len(), "Similarity walk complete");
        Ok(results)
    }
}
