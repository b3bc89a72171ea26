//! Top-level error type for the cookbook domain.
//!
//! [`IntelError`] is what the port traits in [`crate::ports`] return, so the
//! hunt driver and the network walk never see transport-specific error
//! types. Infrastructure crates convert their own errors into it.

use thiserror::Error;

/// Errors surfaced by domain operations and the ports they call.
#[derive(Debug, Error)]
pub enum IntelError {
    /// The API answered with a status the caller cannot act on.
    #[error("TitaniumCloud API error (HTTP {status}): {message}")]
    Api {
        /// HTTP status code returned by the API.
        status: u16,
        /// Response body or reason phrase.
        message: String,
    },

    /// Credentials were rejected (HTTP 401) or lack the required entitlement
    /// (HTTP 403).
    #[error("Credentials rejected or not entitled: {message}")]
    Unauthorized {
        /// Which of the two conditions occurred.
        message: String,
    },

    /// The queried object is unknown to the vendor (HTTP 404).
    #[error("Not found: {what}")]
    NotFound {
        /// Description of the missing object (hash, domain, URL).
        what: String,
    },

    /// The account quota was exhausted (HTTP 429). Not retried.
    #[error("Rate limit or quota exceeded")]
    RateLimited,

    /// The request never produced an HTTP response.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The response body was not the JSON shape the operation expects.
    #[error("Unexpected response shape: {0}")]
    Decode(String),

    /// Caller-supplied input failed validation before any request was sent.
    #[error("Invalid input: {message}")]
    InvalidInput {
        /// Description of the validation failure.
        message: String,
    },

    /// A multi-step walk produced nothing to continue from.
    #[error("No result from step '{step}'")]
    EmptyResult {
        /// Name of the step that came back empty.
        step: &'static str,
    },
}

impl IntelError {
    /// Shorthand for [`IntelError::InvalidInput`].
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }
}
