//! Request paths and JSON bodies for each endpoint.
//!
//! Kept free of I/O so the exact wire shapes can be asserted in tests.

use intel::{HashType, SampleHash, Sha1};
use serde_json::{json, Value};

/// Maximum number of hashes per bulk request.
pub const BULK_LIMIT: usize = 100;

/// Page size sent to the network list endpoints.
pub const NETWORK_LIST_LIMIT: u32 = 1000;

pub const FILE_ANALYSIS_BULK: &str = "/api/databrowser/rldata/bulk_query/json";
pub const ADVANCED_SEARCH: &str = "/api/search/v1/query";
pub const DOMAIN_REPORT: &str = "/api/network-threat-intel/domain/report/v1";
pub const DOMAIN_RESOLUTIONS: &str = "/api/network-threat-intel/domain/resolutions/v1";
pub const IP_URLS: &str = "/api/network-threat-intel/ip/urls/v1";
pub const URL_REPORT: &str = "/api/networking/url/v1/report/query/json";
pub const URL_DOWNLOADED_FILES: &str = "/api/networking/url/v1/downloaded_files/query/json";
pub const URL_ANALYZE: &str = "/api/networking/url/v1/analyze/query/json";
pub const REANALYZE_BULK: &str = "/api/rescan/v1/bulk_query/json";
pub const DELETE_BULK: &str = "/api/delete/sample/v1/bulk_query/json";

pub fn file_reputation(hash: &SampleHash) -> String {
    format!(
        "/api/databrowser/malware_presence/query/{}/{}?extended=true&show_hashes=true&format=json",
        hash.hash_type(),
        hash
    )
}

pub fn av_scanners(hash: &SampleHash) -> String {
    format!("/api/xref/v2/query/{}/{}?format=json", hash.hash_type(), hash)
}

pub fn file_analysis(hash: &SampleHash) -> String {
    format!(
        "/api/databrowser/rldata/query/{}/{}?format=json",
        hash.hash_type(),
        hash
    )
}

pub fn rha1_similarity(
    rha1_type: &str,
    sha1: &Sha1,
    page_sha1: Option<&Sha1>,
    limit: u32,
    extended: bool,
    classification: Option<&str>,
) -> String {
    let mut path = format!("/api/group_by_rha1/v1/query/{rha1_type}/{sha1}");
    if let Some(page) = page_sha1 {
        path.push('/');
        path.push_str(page.as_str());
    }
    path.push_str(&format!("?format=json&limit={limit}&extended={extended}"));
    if let Some(classification) = classification {
        path.push_str(&format!("&classification={classification}"));
    }
    path
}

pub fn upload(sha1: &Sha1) -> String {
    format!("/api/spex/upload/{sha1}")
}

pub fn upload_meta(sha1: &Sha1) -> String {
    format!("/api/spex/upload/{sha1}/meta")
}

pub fn download(hash: &SampleHash) -> String {
    format!("/api/spex/download/v2/query/{}/{}", hash.hash_type(), hash)
}

pub fn reanalyze(hash: &SampleHash) -> String {
    format!("/api/rescan/v1/query/{}/{}", hash.hash_type(), hash)
}

pub fn delete(hash: &SampleHash) -> String {
    format!("/api/delete/sample/v1/query/{}/{}", hash.hash_type(), hash)
}

/// Body shared by the bulk hash endpoints.
pub fn bulk_hash_query(hash_type: HashType, hashes: &[&str]) -> Value {
    json!({"rl": {"query": {"hash_type": hash_type.as_str(), "hashes": hashes}}})
}

pub fn advanced_search(query: &str, page: u32, records_per_page: u32) -> Value {
    json!({
        "query": query,
        "page": page,
        "records_per_page": records_per_page,
        "format": "json"
    })
}

pub fn domain_query(domain: &str) -> Value {
    json!({"rl": {"query": {"domain": domain, "response_format": "json"}}})
}

pub fn domain_resolutions_query(domain: &str) -> Value {
    json!({"rl": {"query": {
        "domain": domain,
        "response_format": "json",
        "limit": NETWORK_LIST_LIMIT
    }}})
}

pub fn ip_urls_query(ip: &str) -> Value {
    json!({"rl": {"query": {
        "ip": ip,
        "response_format": "json",
        "limit": NETWORK_LIST_LIMIT
    }}})
}

pub fn url_query(url: &str) -> Value {
    json!({"rl": {"query": {"url": url, "response_format": "json"}}})
}

pub fn url_downloaded_files_query(url: &str) -> Value {
    json!({"rl": {"query": {
        "url": url,
        "response_format": "json",
        "limit": NETWORK_LIST_LIMIT,
        "extended": true
    }}})
}

/// XML metadata attached to an uploaded sample.
pub fn upload_meta_xml(file_name: &str, domain: &str) -> String {
    format!(
        "<rl><properties><property><name>file_name</name><value>{}</value></property></properties><domain>{}</domain></rl>",
        xml_escape(file_name),
        xml_escape(domain)
    )
}

fn xml_escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}
