/*
[INPUT]:  HTTP configuration (base URL, timeouts, API key)
[OUTPUT]: Single-request transport returning status + decoded JSON
[POS]:    HTTP layer - core client implementation
[UPDATE]: When adding connection options or changing client behavior
*/

use std::fmt;
use std::time::Duration;

use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Client, Url};
use serde_json::Value;
use tracing::debug;

use crate::http::endpoints::HttpMethod;
use crate::http::{Result, WallexError};
use crate::types::ApiResponse;

/// Base URL for the Wallex API
pub const DEFAULT_BASE_URL: &str = "https://api.wallex.ir/";
const JSON_CONTENT_TYPE: &str = "application/json";
const API_KEY_HEADER: &str = "x-api-key";
const BODY_PREVIEW_MAX_BYTES: usize = 256;

/// Query string pairs; `None` values are dropped before sending
pub type QueryParams = Vec<(&'static str, Option<String>)>;

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// Static API key for authenticated requests
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub api_key: String,
}

impl Credentials {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// HTTP transport for the Wallex REST API
#[derive(Debug, Clone)]
pub struct WallexClient {
    http_client: Client,
    base_url: Url,
    credentials: Option<Credentials>,
}

impl WallexClient {
    /// Create a new client with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(ClientConfig::default())
    }

    /// Create a new client with custom configuration
    pub fn with_config(config: ClientConfig) -> Result<Self> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));

        let http_client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .default_headers(default_headers)
            .build()?;

        Ok(Self {
            http_client,
            base_url: normalize_base_url(&config.base_url)?,
            credentials: None,
        })
    }

    /// Attach credentials, consuming the client
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Set credentials for authenticated requests
    pub fn set_credentials(&mut self, credentials: Credentials) {
        self.credentials = Some(credentials);
    }

    /// Get credentials if set
    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    /// Issue one request and decode whatever body comes back.
    ///
    /// Non-2xx statuses are not errors; only network faults and undecodable
    /// bodies are.
    pub async fn request(
        &self,
        method: HttpMethod,
        path: &str,
        query: QueryParams,
        body: Option<Value>,
        authenticated: bool,
    ) -> Result<ApiResponse> {
        let mut builder = self.http_client.request(method.into(), self.url(path)?);

        if authenticated {
            let credentials = self
                .credentials
                .as_ref()
                .ok_or(WallexError::MissingCredentials)?;
            builder = builder.header(API_KEY_HEADER, &credentials.api_key);
        }

        let query: Vec<(&str, String)> = query
            .into_iter()
            .filter_map(|(key, value)| value.map(|value| (key, value)))
            .collect();
        if !query.is_empty() {
            builder = builder.query(&query);
        }

        if let Some(body) = &body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let bytes = response.bytes().await?;
        debug!(
            method = %method,
            path,
            status,
            bytes = bytes.len(),
            "wallex request completed"
        );

        let body = decode_body(status, &bytes)?;
        Ok(ApiResponse::new(status, body))
    }
}

fn normalize_base_url(raw: &str) -> Result<Url> {
    let mut url = Url::parse(raw)?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn decode_body(status: u16, bytes: &[u8]) -> Result<Value> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(bytes).map_err(|err| WallexError::InvalidResponse {
        status,
        message: format!(
            "{err}; body: {}",
            truncate_for_log(&String::from_utf8_lossy(bytes), BODY_PREVIEW_MAX_BYTES)
        ),
    })
}

pub(crate) fn truncate_for_log(value: &str, max_len: usize) -> String {
    if value.len() <= max_len {
        return value.to_string();
    }
    let mut cut = max_len;
    while !value.is_char_boundary(cut) {
        cut -= 1;
    }
    let mut out = String::with_capacity(cut + 3);
    out.push_str(&value[..cut]);
    out.push_str("...");
    out
}
