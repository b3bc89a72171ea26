//! Connection settings for [`crate::TiCloudClient`].

use std::time::Duration;

use intel::DEFAULT_HOST;

/// User agent sent when the caller does not choose one.
pub const DEFAULT_USER_AGENT: &str = "ReversingLabs SDK cookbook";

/// Per-request timeout applied when the caller does not choose one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Host, credentials, and HTTP client options.
#[derive(Clone)]
pub struct TiCloudConfig {
    pub host: String,
    pub username: String,
    pub password: String,
    pub user_agent: String,
    pub timeout: Duration,
}

impl TiCloudConfig {
    /// Settings for the default host with the given credentials.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            username: username.into(),
            password: password.into(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

// The password never reaches logs through `{:?}`.
impl std::fmt::Debug for TiCloudConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TiCloudConfig")
            .field("host", &self.host)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("user_agent", &self.user_agent)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_redacts_password() {
        let config = TiCloudConfig::new("u/alice", "hunter2-secret");
        let rendered = format!("{config:?}");
        assert!(rendered.contains("u/alice"));
        assert!(!rendered.contains("hunter2-secret"));
    }

    #[test]
    fn builder_overrides_defaults() {
        let config = TiCloudConfig::new("u", "p")
            .with_host("https://ticloud.example")
            .with_timeout(Duration::from_secs(5));
        assert_eq!(config.host, "https://ticloud.example");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.user_agent, DEFAULT_USER_AGENT);
    }
}
