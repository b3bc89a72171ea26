//! Newtype domain identifiers.
//!
//! Sample hashes are represented as distinct newtypes wrapping a validated,
//! lowercased hex string. This prevents accidentally passing an [`Md5`] where
//! the vendor endpoint requires a [`Sha1`] even though both are strings under
//! the hood.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Macro for hex-digest newtypes.
// Generates: struct, new() returning Option<Self>, as_str(), Display.
// ---------------------------------------------------------------------------
macro_rules! hex_digest {
    (
        $(#[$attr:meta])*
        $name:ident, $len:expr
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Length of the hex representation.
            pub const HEX_LEN: usize = $len;

            /// Creates a new digest, returning `None` unless the value is exactly
            #[doc = concat!("`", stringify!($len), "` ASCII hex characters.")]
            pub fn new(value: impl AsRef<str>) -> Option<Self> {
                let v = value.as_ref().trim();
                if v.len() == $len && v.bytes().all(|b| b.is_ascii_hexdigit()) {
                    Some(Self(v.to_ascii_lowercase()))
                } else {
                    None
                }
            }

            /// Returns the digest as a lowercase hex string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl TryFrom<String> for $name {
            type Error = String;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(&value).ok_or_else(|| {
                    format!("'{}' is not a valid {}", value, stringify!($name))
                })
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Sample digests
// ---------------------------------------------------------------------------

hex_digest! {
    /// An MD5 sample digest (32 hex characters).
    Md5, 32
}

hex_digest! {
    /// A SHA-1 sample digest (40 hex characters).
    ///
    /// SHA-1 is the primary key for search results and the only hash type the
    /// RHA1 functional-similarity and upload endpoints accept.
    Sha1, 40
}

hex_digest! {
    /// A SHA-256 sample digest (64 hex characters).
    Sha256, 64
}

/// The hash algorithm of a [`SampleHash`], as named in vendor URL paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashType {
    Md5,
    Sha1,
    Sha256,
}

impl HashType {
    /// Detects the hash type from a hex string length.
    pub fn from_len(len: usize) -> Option<Self> {
        match len {
            Md5::HEX_LEN => Some(Self::Md5),
            Sha1::HEX_LEN => Some(Self::Sha1),
            Sha256::HEX_LEN => Some(Self::Sha256),
            _ => None,
        }
    }

    /// Path segment used by the vendor API (`md5`, `sha1`, `sha256`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Md5 => "md5",
            Self::Sha1 => "sha1",
            Self::Sha256 => "sha256",
        }
    }
}

impl std::fmt::Display for HashType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Any sample digest accepted by the hash-keyed endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SampleHash {
    Md5(Md5),
    Sha1(Sha1),
    Sha256(Sha256),
}

impl SampleHash {
    /// Parses a hex digest, detecting its type from the length.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        match HashType::from_len(value.len())? {
            HashType::Md5 => Md5::new(value).map(Self::Md5),
            HashType::Sha1 => Sha1::new(value).map(Self::Sha1),
            HashType::Sha256 => Sha256::new(value).map(Self::Sha256),
        }
    }

    pub fn hash_type(&self) -> HashType {
        match self {
            Self::Md5(_) => HashType::Md5,
            Self::Sha1(_) => HashType::Sha1,
            Self::Sha256(_) => HashType::Sha256,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Md5(h) => h.as_str(),
            Self::Sha1(h) => h.as_str(),
            Self::Sha256(h) => h.as_str(),
        }
    }
}

impl std::fmt::Display for SampleHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SampleHash {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| {
            format!("'{s}' is not an MD5, SHA-1 or SHA-256 hex digest")
        })
    }
}

impl From<Sha1> for SampleHash {
    fn from(value: Sha1) -> Self {
        Self::Sha1(value)
    }
}

impl From<Sha256> for SampleHash {
    fn from(value: Sha256) -> Self {
        Self::Sha256(value)
    }
}

// ---------------------------------------------------------------------------
// Query identifiers
// ---------------------------------------------------------------------------

/// A threat family name as used in the `threatname` search field
/// (e.g. `"Emotet"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ThreatFamily(String);

impl ThreatFamily {
    /// Creates a family name, returning `None` if the value is blank or
    /// contains whitespace (which would split the search term).
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let v = value.into();
        let v = v.trim();
        if v.is_empty() || v.chars().any(char::is_whitespace) {
            None
        } else {
            Some(Self(v.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ThreatFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifies a single CLI invocation.
///
/// Generated fresh for every run and attached to the root span so all
/// requests from one invocation can be correlated in the logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(Uuid);

impl RunId {
    /// Generates a new random run identifier.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying [`Uuid`].
    pub fn as_uuid(self) -> Uuid {
        self.0
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHA1: &str = "21841b32c6165b27dddbd4d6eb3a672defe54271";

    #[test]
    fn digests_are_length_checked_and_lowercased() {
        let upper = SHA1.to_ascii_uppercase();
        let sha1 = Sha1::new(&upper).expect("valid sha1");
        assert_eq!(sha1.as_str(), SHA1);

        assert!(Sha1::new(&SHA1[..39]).is_none());
        assert!(Md5::new("zz".repeat(16)).is_none());
        assert!(Sha256::new("a".repeat(64)).is_some());
    }

    #[test]
    fn sample_hash_detects_type_from_length() {
        assert_eq!(
            SampleHash::parse(SHA1).map(|h| h.hash_type()),
            Some(HashType::Sha1)
        );
        assert_eq!(
            SampleHash::parse(&"b".repeat(32)).map(|h| h.hash_type()),
            Some(HashType::Md5)
        );
        assert_eq!(
            SampleHash::parse(&"c".repeat(64)).map(|h| h.hash_type()),
            Some(HashType::Sha256)
        );
        assert!(SampleHash::parse("deadbeef").is_none());
        assert!("not-a-hash".parse::<SampleHash>().is_err());
    }

    #[test]
    fn digest_deserialization_rejects_bad_values() {
        let ok: Sha1 = serde_json::from_str(&format!("\"{SHA1}\"")).unwrap();
        assert_eq!(ok.as_str(), SHA1);
        assert!(serde_json::from_str::<Sha1>("\"abc\"").is_err());
    }

    #[test]
    fn threat_family_rejects_blank_and_spaced_names() {
        assert!(ThreatFamily::new("").is_none());
        assert!(ThreatFamily::new("  ").is_none());
        assert!(ThreatFamily::new("Agent Tesla").is_none());
        assert_eq!(ThreatFamily::new(" Emotet ").unwrap().as_str(), "Emotet");
    }
}
