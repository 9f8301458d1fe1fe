//! Thin wrapper around the HTTP client used for every remote call.

use http::{StatusCode, header};
use serde::{Serialize, de::DeserializeOwned};

use crate::config::Config;
use crate::error::{AppError, Result};

/// Default connection timeout.
const CONNECT_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(5);

/// Client for the marketplace API.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Clone, Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Creates a client for `config.api_base_url`.
    pub fn new(config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| AppError::Network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.api_base_url.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// `GET path`, optionally with a bearer token.
    pub async fn get(&self, path: &str, token: Option<&str>) -> Result<reqwest::Response> {
        let url = self.url(path);
        tracing::debug!("➡️ GET {}", url);

        let mut request = self.http.get(&url);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        Ok(request.send().await?)
    }

    /// `POST path` with a JSON body.
    pub async fn post_json<B: Serialize>(
        &self,
        path: &str,
        body: &B,
        token: Option<&str>,
    ) -> Result<reqwest::Response> {
        self.send_json(http::Method::POST, path, body, token).await
    }

    /// `PUT path` with a JSON body.
    pub async fn put_json<B: Serialize>(
        &self,
        path: &str,
        body: &B,
        token: Option<&str>,
    ) -> Result<reqwest::Response> {
        self.send_json(http::Method::PUT, path, body, token).await
    }

    async fn send_json<B: Serialize>(
        &self,
        method: http::Method,
        path: &str,
        body: &B,
        token: Option<&str>,
    ) -> Result<reqwest::Response> {
        let url = self.url(path);
        tracing::debug!("➡️ {} {}", method, url);

        let payload = sonic_rs::to_string(body)
            .map_err(|e| AppError::Network(format!("Request serialization failed: {}", e)))?;

        let mut request = self
            .http
            .request(method, &url)
            .header(header::CONTENT_TYPE, "application/json")
            .body(payload);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        Ok(request.send().await?)
    }
}

/// Turns a non-2xx response into an error.
///
/// 401 and 403 mean the credential was refused; everything else is a failed
/// remote call.
pub fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    tracing::debug!("⬅️ {} from {}", status, response.url());
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(AppError::Unauthorized),
        StatusCode::NOT_FOUND => Err(AppError::NotFound),
        _ => Err(AppError::Network(format!("HTTP status {}", status))),
    }
}

/// Reads and decodes a JSON response body.
pub async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let bytes = response.bytes().await?;
    sonic_rs::from_slice(&bytes)
        .map_err(|e| AppError::InvalidResponse(format!("failed to parse response: {}", e)))
}
