//! TitaniumCloud REST adapter.
//!
//! Implements the [`intel::SampleSearch`], [`intel::SampleAnalysis`] and
//! [`intel::NetworkIntel`] ports over the vendor's HTTP API, and exposes the
//! remaining cookbook endpoints (reputation, AV scanners, RHA1 similarity,
//! URL analysis, sample management) as inherent methods on
//! [`TiCloudClient`].
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** Authentication, request paths and bodies, status-code
//! mapping, and bulk chunking all live here. The [`intel`] crate sees only
//! its port traits and [`intel::IntelError`].
//!
//! ## Endpoint Groups
//!
//! | Module | Endpoints |
//! |--------|-----------|
//! | [`files`] | File reputation, AV scanners, file analysis (single and bulk), RHA1 similarity |
//! | [`network`] | Domain report, domain resolutions, IP URLs, URL report, downloaded files, URL analysis |
//! | [`samples`] | Upload, download, reanalyze, delete |
//! | [`search`] | Advanced Search, port implementations |

pub mod client;
pub mod config;
pub mod endpoints;
pub mod error;
pub mod files;
pub mod network;
pub mod samples;
pub mod search;

pub use client::TiCloudClient;
pub use config::{TiCloudConfig, DEFAULT_TIMEOUT, DEFAULT_USER_AGENT};
pub use error::TiCloudError;
pub use files::{Classification, Rha1Type, SimilarityOptions};
