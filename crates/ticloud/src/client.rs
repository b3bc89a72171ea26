//! Authenticated HTTP transport shared by every endpoint group.

use reqwest::{Method, RequestBuilder, Response};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::{TiCloudConfig, TiCloudError};

/// Client for the TitaniumCloud REST API.
///
/// One instance holds a pooled [`reqwest::Client`] and the account
/// credentials; the endpoint methods live in the [`crate::files`],
/// [`crate::network`], [`crate::samples`] and [`crate::search`] modules.
#[derive(Debug, Clone)]
pub struct TiCloudClient {
    http: reqwest::Client,
    host: String,
    config: TiCloudConfig,
}

impl TiCloudClient {
    /// Builds a client, validating the host URL.
    pub fn new(config: TiCloudConfig) -> Result<Self, TiCloudError> {
        let host = config.host.trim().trim_end_matches('/').to_string();
        if !(host.starts_with("https://") || host.starts_with("http://")) {
            return Err(TiCloudError::InvalidInput(format!(
                "host '{host}' must start with https://"
            )));
        }
        if config.username.is_empty() || config.password.is_empty() {
            return Err(TiCloudError::InvalidInput(
                "username and password are required".to_string(),
            ));
        }

        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .build()?;

        Ok(Self { http, host, config })
    }

    /// The normalized host (no trailing slash).
    pub fn host(&self) -> &str {
        &self.host
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}{}", self.host, path))
            .basic_auth(&self.config.username, Some(&self.config.password))
    }

    /// Sends a request and maps non-success statuses to errors.
    #[instrument(skip(self, builder), fields(host = %self.host))]
    pub(crate) async fn send(
        &self,
        builder: RequestBuilder,
        what: &str,
    ) -> Result<Response, TiCloudError> {
        let response = builder.send().await?;
        let status = response.status();
        debug!(status = status.as_u16(), "Response received");
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(TiCloudError::from_status(status.as_u16(), body, what))
    }

    async fn decode(response: Response, what: &str) -> Result<Value, TiCloudError> {
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|source| TiCloudError::Decode {
            what: what.to_string(),
            source,
        })
    }

    pub(crate) async fn get_json(&self, path: &str, what: &str) -> Result<Value, TiCloudError> {
        let response = self.send(self.request(Method::GET, path), what).await?;
        Self::decode(response, what).await
    }

    pub(crate) async fn post_json(
        &self,
        path: &str,
        body: &Value,
        what: &str,
    ) -> Result<Value, TiCloudError> {
        let response = self
            .send(self.request(Method::POST, path).json(body), what)
            .await?;
        Self::decode(response, what).await
    }

    pub(crate) async fn get_text(&self, path: &str, what: &str) -> Result<String, TiCloudError> {
        let response = self.send(self.request(Method::GET, path), what).await?;
        Ok(response.text().await?)
    }

    pub(crate) async fn post_text(
        &self,
        path: &str,
        body: &Value,
        what: &str,
    ) -> Result<String, TiCloudError> {
        let response = self
            .send(self.request(Method::POST, path).json(body), what)
            .await?;
        Ok(response.text().await?)
    }

    pub(crate) async fn delete_text(&self, path: &str, what: &str) -> Result<String, TiCloudError> {
        let response = self.send(self.request(Method::DELETE, path), what).await?;
        Ok(response.text().await?)
    }

    pub(crate) async fn get_bytes(&self, path: &str, what: &str) -> Result<Vec<u8>, TiCloudError> {
        let response = self.send(self.request(Method::GET, path), what).await?;
        Ok(response.bytes().await?.to_vec())
    }

    /// POSTs a raw body and returns the final status code.
    pub(crate) async fn post_raw(
        &self,
        path: &str,
        content_type: &'static str,
        body: Vec<u8>,
        what: &str,
    ) -> Result<u16, TiCloudError> {
        let builder = self
            .request(Method::POST, path)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(body);
        let response = self.send(builder, what).await?;
        Ok(response.status().as_u16())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_is_normalized_and_validated() {
        let client =
            TiCloudClient::new(TiCloudConfig::new("u", "p").with_host("https://ticloud.example/"))
                .unwrap();
        assert_eq!(client.host(), "https://ticloud.example");

        let err = TiCloudClient::new(TiCloudConfig::new("u", "p").with_host("ticloud.example"))
            .unwrap_err();
        assert!(matches!(err, TiCloudError::InvalidInput(_)));
    }

    #[test]
    fn credentials_are_required() {
        let err = TiCloudClient::new(TiCloudConfig::new("", "p")).unwrap_err();
        assert!(matches!(err, TiCloudError::InvalidInput(_)));
    }
}
