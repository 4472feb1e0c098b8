//! Thin wrapper around the imagery provider's HTTP API.
//!
//! A single `reqwest::Client` is built at start-up with the configured
//! timeout; every upstream call in the crate goes through [`ProviderClient`].
//! The API key travels in the `X-Api-Key` header so it never appears in a URL
//! or in logs.

use crate::common::error::{ApiError, classify_response};
use crate::config::Config;
use reqwest::{RequestBuilder, Response, Url};
use serde::{Serialize, de::DeserializeOwned};
use std::time::Duration;
use tracing::{debug, info};

pub const API_KEY_HEADER: &str = "X-Api-Key";

#[derive(Clone)]
pub struct ProviderClient {
    http: reqwest::Client,
    base_url: String,
    origin: Url,
    api_key: String,
}

impl std::fmt::Debug for ProviderClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderClient")
            .field("base_url", &self.base_url)
            .field("api_key", &self.masked_key())
            .finish()
    }
}

impl ProviderClient {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Configuration(format!("could not build HTTP client: {e}")))?;
        let base_url = base_url.trim_end_matches('/').to_string();
        let origin = Url::parse(&base_url)
            .map_err(|e| ApiError::Configuration(format!("invalid provider URL: {e}")))?;
        Ok(Self {
            http,
            base_url,
            origin,
            api_key: api_key.to_string(),
        })
    }

    /// Builds the client from configuration. `None` when no API key is set, in
    /// which case provider-backed endpoints answer 503.
    pub fn from_config(config: &Config) -> Result<Option<Self>, ApiError> {
        let Some(key) = config.provider_api_key.as_deref() else {
            info!("Provider API key not configured, imagery endpoints will report 503");
            return Ok(None);
        };
        let client = Self::new(
            &config.provider_base_url,
            key,
            Duration::from_secs(config.provider_timeout_secs),
        )?;
        info!(
            base_url = %client.base_url,
            api_key = %client.masked_key(),
            timeout_secs = config.provider_timeout_secs,
            "Provider client ready"
        );
        Ok(Some(client))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// First and last four characters of the key, for log lines.
    pub fn masked_key(&self) -> String {
        let chars: Vec<char> = self.api_key.chars().collect();
        if chars.len() <= 8 {
            return "****".to_string();
        }
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}…{tail}")
    }

    pub fn get(&self, path: &str) -> RequestBuilder {
        self.http
            .get(self.url(path))
            .header(API_KEY_HEADER, &self.api_key)
    }

    /// `{base}{prefix}/{segment}/...` with every segment percent-encoded, so
    /// ids containing `/` stay a single path segment.
    pub fn segment_url(&self, prefix: &str, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = Url::parse(&self.url(prefix))
            .map_err(|e| ApiError::Configuration(format!("invalid provider URL: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| ApiError::Configuration("provider URL cannot carry a path".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub fn get_url(&self, url: Url) -> RequestBuilder {
        self.http.get(url).header(API_KEY_HEADER, &self.api_key)
    }

    pub fn post_json<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> RequestBuilder {
        self.http
            .post(self.url(path))
            .header(API_KEY_HEADER, &self.api_key)
            .json(body)
    }

    /// Same scheme, host and port as the provider, with no user info.
    pub fn is_provider_origin(&self, url: &Url) -> bool {
        url.scheme() == self.origin.scheme()
            && url.host_str() == self.origin.host_str()
            && url.port_or_known_default() == self.origin.port_or_known_default()
            && url.username().is_empty()
            && url.password().is_none()
    }

    /// GET on an absolute URL handed out by the provider (job results). The
    /// key is only attached when the URL points back at the provider itself.
    pub fn get_absolute(&self, url: &str) -> RequestBuilder {
        let request = self.http.get(url);
        match Url::parse(url) {
            Ok(parsed) if self.is_provider_origin(&parsed) => {
                request.header(API_KEY_HEADER, &self.api_key)
            }
            _ => request,
        }
    }

    /// Sends a request and hands back the response only when it is 2xx.
    pub async fn send(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        debug!(status = status.as_u16(), "Provider returned non-success status");
        Err(classify_response(status.as_u16(), &body))
    }

    /// Sends a request and decodes a JSON body.
    pub async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, ApiError> {
        let response = self.send(request).await?;
        Ok(response.json::<T>().await?)
    }
}
