//! Domain layer of the TiCloud cookbook.
//!
//! This crate contains the hash identifiers, search and record value types,
//! the dynamic-analysis normalizer, the threat-family hunt driver, the
//! network pivot, and the port traits the `ticloud` crate implements.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate has no I/O dependencies.
//! It defines *what* is needed; infrastructure crates define *how* to supply it.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Hash newtypes (`Md5`, `Sha1`, `Sha256`, `SampleHash`), `ThreatFamily`, `RunId` |
//! | [`types`] | Search query, search page, and output record types |
//! | [`dynamic`] | Two-shape dynamic-analysis normalizer |
//! | [`hunt`] | Paged search driver that merges analysis details per page |
//! | [`pivot`] | Domain to IP to URL walk |
//! | [`ports`] | Traits implemented by infrastructure |
//! | [`errors`] | [`IntelError`] |

pub mod dynamic;
pub mod errors;
pub mod hunt;
pub mod identifiers;
pub mod pivot;
pub mod ports;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use dynamic::{normalize_dynamic_analysis, DynamicAnalysisSummary};
pub use errors::IntelError;
pub use hunt::{hunt, HuntReport};
pub use identifiers::{HashType, Md5, RunId, SampleHash, Sha1, Sha256, ThreatFamily};
pub use pivot::{first_resolved_ip, first_url, pivot, PivotReport};
pub use ports::{NetworkIntel, SampleAnalysis, SampleSearch};
pub use types::{
    FirstSeenRange, SampleRecord, SearchEntry, SearchPage, SearchQuery, DEFAULT_HOST,
    RECORDS_PER_PAGE,
};
