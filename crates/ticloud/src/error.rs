//! Transport-level errors for TitaniumCloud calls.

use intel::IntelError;
use thiserror::Error;

/// Errors produced by [`crate::TiCloudClient`].
#[derive(Debug, Error)]
pub enum TiCloudError {
    #[error("credentials rejected (HTTP 401)")]
    Unauthorized,

    #[error("account is not entitled to this API (HTTP 403)")]
    Forbidden,

    #[error("{what} not found (HTTP 404)")]
    NotFound { what: String },

    #[error("quota or rate limit exceeded (HTTP 429)")]
    RateLimited,

    #[error("unexpected HTTP {code}: {body}")]
    Status { code: u16, body: String },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("cannot decode {what}: {source}")]
    Decode {
        what: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("cannot read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl TiCloudError {
    /// Maps a non-success status code to an error.
    ///
    /// `what` describes the queried object and is used for 404s.
    pub fn from_status(code: u16, body: String, what: &str) -> Self {
        match code {
            401 => Self::Unauthorized,
            403 => Self::Forbidden,
            404 => Self::NotFound {
                what: what.to_string(),
            },
            429 => Self::RateLimited,
            _ => Self::Status { code, body },
        }
    }
}

impl From<TiCloudError> for IntelError {
    fn from(err: TiCloudError) -> Self {
        match err {
            TiCloudError::Unauthorized => IntelError::Unauthorized {
                message: "credentials rejected".to_string(),
            },
            TiCloudError::Forbidden => IntelError::Unauthorized {
                message: "account is not entitled to this API".to_string(),
            },
            TiCloudError::NotFound { what } => IntelError::NotFound { what },
            TiCloudError::RateLimited => IntelError::RateLimited,
            TiCloudError::Status { code, body } => IntelError::Api {
                status: code,
                message: body,
            },
            TiCloudError::Transport(e) => IntelError::Transport(e.to_string()),
            e @ TiCloudError::Decode { .. } => IntelError::Decode(e.to_string()),
            TiCloudError::InvalidInput(message) => IntelError::InvalidInput { message },
            e @ TiCloudError::Io { .. } => IntelError::Transport(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_map_to_variants() {
        assert!(matches!(
            TiCloudError::from_status(401, String::new(), "x"),
            TiCloudError::Unauthorized
        ));
        assert!(matches!(
            TiCloudError::from_status(403, String::new(), "x"),
            TiCloudError::Forbidden
        ));
        assert!(matches!(
            TiCloudError::from_status(404, String::new(), "sample abc"),
            TiCloudError::NotFound { what } if what == "sample abc"
        ));
        assert!(matches!(
            TiCloudError::from_status(429, String::new(), "x"),
            TiCloudError::RateLimited
        ));
        assert!(matches!(
            TiCloudError::from_status(503, "busy".into(), "x"),
            TiCloudError::Status { code: 503, body } if body == "busy"
        ));
    }

    #[test]
    fn converts_into_domain_errors() {
        let e: IntelError = TiCloudError::RateLimited.into();
        assert!(matches!(e, IntelError::RateLimited));

        let e: IntelError = TiCloudError::Forbidden.into();
        assert!(matches!(e, IntelError::Unauthorized { .. }));

        let e: IntelError = TiCloudError::InvalidInput("bad".into()).into();
        assert!(matches!(e, IntelError::InvalidInput { message } if message == "bad"));
    }
}
