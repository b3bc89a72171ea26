//! Threat-family hunt: paged search plus per-page analysis merge.
//!
//! [`hunt`] walks the Advanced Search API page by page for one
//! [`SearchQuery`], turns each hit into a [`SampleRecord`], fetches the
//! file-analysis details for every SHA-256 on the page in one bulk call, and
//! attaches normalized dynamic-analysis summaries to the matching records.
//! Records accumulate in insertion order keyed by SHA-1.

use indexmap::IndexMap;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::dynamic::normalize_dynamic_analysis;
use crate::ports::{SampleAnalysis, SampleSearch};
use crate::{IntelError, SampleRecord, SearchQuery, Sha1, Sha256, RECORDS_PER_PAGE};

/// Outcome of a completed hunt.
#[derive(Debug, Clone, Default)]
pub struct HuntReport {
    records: IndexMap<Sha1, SampleRecord>,
    pages_fetched: u32,
}

impl HuntReport {
    /// Records in the order their SHA-1 was first seen.
    pub fn records(&self) -> impl Iterator<Item = &SampleRecord> {
        self.records.values()
    }

    pub fn into_records(self) -> Vec<SampleRecord> {
        self.records.into_values().collect()
    }

    pub fn get(&self, sha1: &Sha1) -> Option<&SampleRecord> {
        self.records.get(sha1)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of search pages requested, including a final empty one.
    pub fn pages_fetched(&self) -> u32 {
        self.pages_fetched
    }
}

/// Runs a hunt for `query` to completion.
///
/// Pagination stops when a page reports a missing or zero `total_count`,
/// when `more_pages` is false or absent, or when `next_page` is missing.
/// Records gathered before an empty page are kept.
#[instrument(skip(search, analysis, query), fields(query = %query))]
pub async fn hunt<S, A>(
    search: &S,
    analysis: &A,
    query: &SearchQuery,
) -> Result<HuntReport, IntelError>
where
    S: SampleSearch + ?Sized,
    A: SampleAnalysis + ?Sized,
{
    let query_string = query.to_query_string();
    let mut report = HuntReport::default();
    let mut page_number = 1;

    loop {
        let page = search
            .search(&query_string, page_number, RECORDS_PER_PAGE)
            .await?;
        report.pages_fetched += 1;

        if page.is_empty_result() {
            info!(page = page_number, "No files found within range");
            break;
        }
        debug!(
            page = page_number,
            total_count = page.total_count,
            entries = page.entries.len(),
            "Search page received"
        );

        let following = page.following_page();
        let mut page_hashes = Vec::with_capacity(page.entries.len());
        for record in page.entries.into_iter().filter_map(|e| e.into_record()) {
            page_hashes.push(record.sha256.clone());
            report.records.insert(record.sha1.clone(), record);
        }

        merge_page_details(analysis, &page_hashes, &mut report.records).await?;

        match following {
            Some(next) if next > page_number => page_number = next,
            Some(next) => {
                warn!(page = page_number, next, "Search API did not advance; stopping");
                break;
            }
            None => break,
        }
    }

    info!(
        samples = report.len(),
        pages = report.pages_fetched,
        "Hunt finished"
    );
    Ok(report)
}

/// Fetches analysis details for one page of hashes and attaches dynamic
/// analysis to the matching records.
async fn merge_page_details<A>(
    analysis: &A,
    hashes: &[Sha256],
    records: &mut IndexMap<Sha1, SampleRecord>,
) -> Result<(), IntelError>
where
    A: SampleAnalysis + ?Sized,
{
    if hashes.is_empty() {
        info!("Empty hashes list");
        return Ok(());
    }

    let entries = analysis.analysis_results(hashes).await?;
    for entry in &entries {
        let Some(dynamic) = entry.get("dynamic_analysis") else {
            continue;
        };
        match find_record_key(entry, records) {
            Some(key) => {
                if let Some(record) = records.get_mut(&key) {
                    record.dynamic_analysis = Some(normalize_dynamic_analysis(dynamic));
                }
            }
            None => debug!(
                sha1 = entry.get("sha1").and_then(serde_json::Value::as_str),
                "Analysis entry does not match any search record"
            ),
        }
    }
    Ok(())
}

/// Locates the record an analysis entry belongs to, by SHA-1 first and
/// SHA-256 second.
fn find_record_key(entry: &Value, records: &IndexMap<Sha1, SampleRecord>) -> Option<Sha1> {
    if let Some(sha1) = entry.get("sha1").and_then(Value::as_str).and_then(Sha1::new) {
        if records.contains_key(&sha1) {
            return Some(sha1);
        }
    }
    let sha256 = entry
        .get("sha256")
        .and_then(Value::as_str)
        .and_then(Sha256::new)?;
    records
        .values()
        .find(|r| r.sha256 == sha256)
        .map(|r| r.sha1.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FirstSeenRange, SearchPage, ThreatFamily};
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Mutex;

    fn sha1(n: u8) -> String {
        format!("{:040x}", n)
    }

    fn sha256(n: u8) -> String {
        format!("{:064x}", n)
    }

    fn entry(n: u8) -> Value {
        json!({
            "sha1": sha1(n),
            "sha256": sha256(n),
            "md5": format!("{:032x}", n),
            "firstseen": "2019-01-05T10:00:00Z",
            "threatname": "Win32.Trojan.Emotet",
            "sampletype": "PE32/Exe"
        })
    }

    fn page(body: Value) -> SearchPage {
        SearchPage::from_response(&json!({"rl": {"web_search_api": body}})).unwrap()
    }

    struct FakeSearch {
        pages: Vec<SearchPage>,
        requested: Mutex<Vec<u32>>,
    }

    #[async_trait]
    impl SampleSearch for FakeSearch {
        async fn search(&self, query: &str, page: u32, per_page: u32) -> Result<SearchPage, IntelError> {
            assert!(query.starts_with("firstseen:["));
            assert_eq!(per_page, RECORDS_PER_PAGE);
            self.requested.lock().unwrap().push(page);
            Ok(self.pages.get(page as usize - 1).cloned().unwrap_or_default())
        }
    }

    struct FakeAnalysis {
        entries: Vec<Value>,
        calls: Mutex<Vec<usize>>,
    }

    #[async_trait]
    impl SampleAnalysis for FakeAnalysis {
        async fn analysis_results(&self, hashes: &[Sha256]) -> Result<Vec<Value>, IntelError> {
            self.calls.lock().unwrap().push(hashes.len());
            Ok(self
                .entries
                .iter()
                .filter(|e| {
                    let h = e["sha256"].as_str().unwrap_or_default();
                    hashes.iter().any(|x| x.as_str() == h)
                })
                .cloned()
                .collect())
        }
    }

    fn query() -> SearchQuery {
        SearchQuery::new(
            FirstSeenRange::parse("2019-01-01", "2019-02-01").unwrap(),
            ThreatFamily::new("Emotet").unwrap(),
        )
    }

    #[tokio::test]
    async fn walks_pages_and_merges_dynamic_analysis() {
        let search = FakeSearch {
            pages: vec![
                page(json!({"total_count": 3, "entries": [entry(1), entry(2)], "next_page": 2, "more_pages": true})),
                page(json!({"total_count": 3, "entries": [entry(3)], "more_pages": false})),
            ],
            requested: Mutex::new(vec![]),
        };
        let analysis = FakeAnalysis {
            entries: vec![
                json!({
                    "sha1": sha1(2),
                    "sha256": sha256(2),
                    "dynamic_analysis": {"entries": [{
                        "dynamic_analysis_report": {"network": {"tcp": []}, "summary": {"mutexes": ["m2"]}}
                    }]}
                }),
                // Matched by SHA-256 only.
                json!({
                    "sha256": sha256(3),
                    "dynamic_analysis": {"entries": [{
                        "dynamic_analysis_report_joe_sandbox": {"network": {"udp": []}}
                    }]}
                }),
                json!({"sha1": sha1(1), "sha256": sha256(1)}),
            ],
            calls: Mutex::new(vec![]),
        };

        let report = hunt(&search, &analysis, &query()).await.unwrap();

        assert_eq!(*search.requested.lock().unwrap(), vec![1, 2]);
        assert_eq!(*analysis.calls.lock().unwrap(), vec![2, 1]);
        assert_eq!(report.pages_fetched(), 2);

        let out = serde_json::to_value(report.into_records()).unwrap();
        assert_eq!(out[0]["sha1"], json!(sha1(1)));
        assert!(out[0].get("dynamic_analysis").is_none());
        assert_eq!(
            out[1]["dynamic_analysis"],
            json!([{"network": {"tcp": []}, "mutexes": ["m2"]}])
        );
        assert_eq!(
            out[2]["dynamic_analysis"],
            json!([{"network": {"udp": []}, "mutexes": []}])
        );
    }

    #[tokio::test]
    async fn empty_first_page_yields_empty_report() {
        let search = FakeSearch {
            pages: vec![page(json!({"entries": []}))],
            requested: Mutex::new(vec![]),
        };
        let analysis = FakeAnalysis {
            entries: vec![],
            calls: Mutex::new(vec![]),
        };

        let report = hunt(&search, &analysis, &query()).await.unwrap();
        assert!(report.is_empty());
        assert_eq!(report.pages_fetched(), 1);
        assert!(analysis.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn later_empty_page_keeps_earlier_records() {
        let search = FakeSearch {
            pages: vec![
                page(json!({"total_count": 1, "entries": [entry(7)], "next_page": 2, "more_pages": true})),
                page(json!({"total_count": 0})),
            ],
            requested: Mutex::new(vec![]),
        };
        let analysis = FakeAnalysis {
            entries: vec![],
            calls: Mutex::new(vec![]),
        };

        let report = hunt(&search, &analysis, &query()).await.unwrap();
        assert_eq!(report.len(), 1);
        assert!(report.get(&Sha1::new(sha1(7)).unwrap()).is_some());
    }

    #[tokio::test]
    async fn page_without_usable_entries_skips_analysis() {
        let search = FakeSearch {
            pages: vec![page(json!({"total_count": 1, "entries": [{"sha1": sha1(1)}]}))],
            requested: Mutex::new(vec![]),
        };
        let analysis = FakeAnalysis {
            entries: vec![],
            calls: Mutex::new(vec![]),
        };

        let report = hunt(&search, &analysis, &query()).await.unwrap();
        assert!(report.is_empty());
        assert!(analysis.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn duplicate_sha1_is_replaced_in_place_by_later_page() {
        let mut renamed = entry(1);
        renamed["threatname"] = json!("Win32.Trojan.Emotet.B");
        let search = FakeSearch {
            pages: vec![
                page(json!({"total_count": 3, "entries": [entry(1), entry(2)], "next_page": 2, "more_pages": true})),
                page(json!({"total_count": 3, "entries": [renamed], "more_pages": false})),
            ],
            requested: Mutex::new(vec![]),
        };
        let analysis = FakeAnalysis {
            entries: vec![],
            calls: Mutex::new(vec![]),
        };

        let report = hunt(&search, &analysis, &query()).await.unwrap();
        assert_eq!(report.len(), 2);

        let records: Vec<_> = report.records().collect();
        assert_eq!(records[0].sha1.as_str(), sha1(1));
        assert_eq!(records[0].threat_name, "Win32.Trojan.Emotet.B");
        assert_eq!(records[1].sha1.as_str(), sha1(2));
    }

    #[tokio::test]
    async fn wrongly_typed_entry_does_not_abort_the_hunt() {
        let search = FakeSearch {
            pages: vec![
                page(json!({"total_count": 3, "entries": [entry(1)], "next_page": 2, "more_pages": true})),
                page(json!({
                    "total_count": 3,
                    "entries": [{"sha1": sha1(9), "sampletype": 7}, entry(2)],
                    "more_pages": false
                })),
            ],
            requested: Mutex::new(vec![]),
        };
        let analysis = FakeAnalysis {
            entries: vec![],
            calls: Mutex::new(vec![]),
        };

        let report = hunt(&search, &analysis, &query()).await.unwrap();
        assert_eq!(report.len(), 2);
        assert!(report.get(&Sha1::new(sha1(9)).unwrap()).is_none());
        assert_eq!(*analysis.calls.lock().unwrap(), vec![1, 1]);
    }

    #[tokio::test]
    async fn non_advancing_next_page_stops() {
        let search = FakeSearch {
            pages: vec![page(
                json!({"total_count": 5, "entries": [entry(1)], "next_page": 1, "more_pages": true}),
            )],
            requested: Mutex::new(vec![]),
        };
        let analysis = FakeAnalysis {
            entries: vec![],
            calls: Mutex::new(vec![]),
        };

        let report = hunt(&search, &analysis, &query()).await.unwrap();
        assert_eq!(report.pages_fetched(), 1);
        assert_eq!(*search.requested.lock().unwrap(), vec![1]);
    }

    #[tokio::test]
    async fn search_errors_propagate() {
        struct Failing;

        #[async_trait]
        impl SampleSearch for Failing {
            async fn search(&self, _: &str, _: u32, _: u32) -> Result<SearchPage, IntelError> {
                Err(IntelError::RateLimited)
            }
        }

        let analysis = FakeAnalysis {
            entries: vec![],
            calls: Mutex::new(vec![]),
        };
        let err = hunt(&Failing, &analysis, &query()).await.unwrap_err();
        assert!(matches!(err, IntelError::RateLimited));
    }
}
