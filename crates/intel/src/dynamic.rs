//! Dynamic-analysis normalization.
//!
//! The file-analysis API reports sandbox results in one of two shapes per
//! entry: `dynamic_analysis_report` (the vendor's own sandbox) or
//! `dynamic_analysis_report_joe_sandbox`. Both carry a `network` object and a
//! `summary.mutexes` list; this module flattens either shape into a
//! [`DynamicAnalysisSummary`].

use serde::Serialize;
use serde_json::{Map, Value};

/// Report keys in the order they are applied. A later key overwrites an
/// earlier one when an entry carries both shapes.
const REPORT_KEYS: [&str; 2] = [
    "dynamic_analysis_report",
    "dynamic_analysis_report_joe_sandbox",
];

/// Network activity and mutexes extracted from one sandbox run.
///
/// Both fields are absent when the entry carried neither report shape, in
/// which case the summary serializes to `{}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DynamicAnalysisSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mutexes: Option<Value>,
}

impl DynamicAnalysisSummary {
    /// `true` when neither report shape was present.
    pub fn is_empty(&self) -> bool {
        self.network.is_none() && self.mutexes.is_none()
    }

    fn from_entry(entry: &Value) -> Self {
        let mut summary = Self::default();
        for key in REPORT_KEYS {
            if let Some(report) = entry.get(key) {
                summary.network = Some(
                    report
                        .get("network")
                        .cloned()
                        .unwrap_or_else(|| Value::Object(Map::new())),
                );
                summary.mutexes = Some(
                    report
                        .get("summary")
                        .and_then(|s| s.get("mutexes"))
                        .cloned()
                        .unwrap_or_else(|| Value::Array(Vec::new())),
                );
            }
        }
        summary
    }
}

/// Normalizes the `dynamic_analysis` object of a file-analysis entry.
///
/// Produces one summary per element of `entries`, in order. A missing or
/// non-array `entries` yields an empty list.
pub fn normalize_dynamic_analysis(dynamic_analysis: &Value) -> Vec<DynamicAnalysisSummary> {
    dynamic_analysis
        .get("entries")
        .and_then(Value::as_array)
        .map(|entries| entries.iter().map(DynamicAnalysisSummary::from_entry).collect())
        .unwrap_or_default()
}
