//! Shared HTTP transport for the remote backend adapters.
//!
//! Wraps a `reqwest::Client` with pre-built headers and a base URL.
//! Adapters hit two kinds of endpoints through it: a streaming POST
//! (`/chat/completions`, `/messages`) and a best-effort stats GET
//! (`/generation`).

use anyhow::Result;
use reqwest::{
    Client, Method, RequestBuilder,
    header::{self, HeaderMap, HeaderName, HeaderValue},
};
use serde::Serialize;
use serde_json::Value;

/// HTTP transport with pre-configured authentication headers.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    headers: HeaderMap,
    base_url: String,
}

impl HttpTransport {
    /// Create a transport with Bearer token authentication.
    pub fn bearer(client: Client, key: &str, base_url: &str) -> Result<Self> {
        let mut headers = json_headers();
        headers.insert(header::AUTHORIZATION, format!("Bearer {key}").parse()?);
        Ok(Self {
            client,
            headers,
            base_url: base_url.trim_end_matches('/').to_owned(),
        })
    }

    /// Create a transport with a custom authentication header.
    ///
    /// Used by backends that don't take Bearer tokens (Anthropic uses
    /// `x-api-key`).
    pub fn custom_header(
        client: Client,
        header_name: &str,
        header_value: &str,
        base_url: &str,
    ) -> Result<Self> {
        let mut headers = json_headers();
        headers.insert(
            header_name.parse::<HeaderName>()?,
            header_value.parse::<HeaderValue>()?,
        );
        Ok(Self {
            client,
            headers,
            base_url: base_url.trim_end_matches('/').to_owned(),
        })
    }

    /// Add a static header to every request on this transport.
    pub fn header(mut self, name: &str, value: &str) -> Result<Self> {
        self.headers
            .insert(name.parse::<HeaderName>()?, value.parse::<HeaderValue>()?);
        Ok(self)
    }

    /// Build a POST with the configured headers and a JSON body.
    pub fn post(&self, path: &str, body: &impl Serialize) -> RequestBuilder {
        self.client
            .request(Method::POST, format!("{}{path}", self.base_url))
            .headers(self.headers.clone())
            .json(body)
    }

    /// GET a JSON document relative to the base URL.
    pub async fn get_json(&self, path_and_query: &str) -> Result<Value> {
        let response = self
            .client
            .request(Method::GET, format!("{}{path_and_query}", self.base_url))
            .headers(self.headers.clone())
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("stats request returned HTTP {status}");
        }
        response.json().await.map_err(Into::into)
    }

    /// The configured base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

fn json_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
    headers
}
