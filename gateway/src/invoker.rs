use crate::auth::AuthContext;
use crate::config::DownstreamConfig;
use crate::errors::{GatewayError, Result};
use crate::normalize::NormalizedPayload;
use http::header::{CONTENT_TYPE, HeaderValue};
use http::{Method, StatusCode};
use serde_json::{Map, Value};
use std::time::Duration;
use url::Url;

/// One downstream call, built once per incoming request.
#[derive(Clone, Debug, PartialEq)]
pub struct ProxyRequest {
    pub method: Method,
    /// Decoded path segments, e.g. `["api", "clusters", "12", "reset"]`
    pub path_segments: Vec<String>,
    pub auth: AuthContext,
    pub body: Option<Map<String, Value>>,
}

impl ProxyRequest {
    /// Fills the `{name}` placeholders of `template` from the payload identifiers.
    pub fn build(
        method: Method,
        template: &str,
        auth: AuthContext,
        payload: NormalizedPayload,
    ) -> Result<Self> {
        let mut path_segments = Vec::new();
        for segment in template.trim_matches('/').split('/') {
            match segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                Some(name) => {
                    let value = payload
                        .identifiers
                        .get(name)
                        .ok_or_else(|| GatewayError::missing_parameters(&[name]))?;
                    path_segments.push(value.clone());
                }
                None => path_segments.push(segment.to_string()),
            }
        }

        Ok(ProxyRequest {
            method,
            path_segments,
            auth,
            body: payload.body,
        })
    }

    pub fn path(&self) -> String {
        format!("/{}", self.path_segments.join("/"))
    }
}

/// Successful (2xx) downstream answer.
#[derive(Clone, Debug, PartialEq)]
pub struct DownstreamResponse {
    pub status: StatusCode,
    pub body: Value,
}

/// Issues calls to the remote clustering service.
///
/// The base URL is parsed once at construction. No retries are attempted.
#[derive(Clone)]
pub struct BackendInvoker {
    client: reqwest::Client,
    base_url: Option<Url>,
}

impl BackendInvoker {
    pub fn new(config: &DownstreamConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(BackendInvoker {
            client,
            base_url: parse_base_url(&config.base_url),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.base_url.is_some()
    }

    /// Fails with `ServerMisconfigured` when no usable base URL is configured.
    pub fn check_configured(&self) -> Result<&Url> {
        self.base_url.as_ref().ok_or(GatewayError::ServerMisconfigured)
    }

    pub fn downstream_url(&self, segments: &[String]) -> Result<Url> {
        let mut url = self.check_configured()?.clone();
        url.path_segments_mut()
            .map_err(|_| GatewayError::ServerMisconfigured)?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub async fn invoke(&self, request: &ProxyRequest) -> Result<DownstreamResponse> {
        let url = self.downstream_url(&request.path_segments)?;
        let downstream = url.to_string();

        let mut builder = self
            .client
            .request(request.method.clone(), url)
            .bearer_auth(request.auth.bearer_token())
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        tracing::debug!(method = %request.method, %downstream, "calling downstream");

        let response = builder.send().await.map_err(|e| {
            tracing::warn!(%downstream, error = %e, "downstream request failed");
            GatewayError::DownstreamUnreachable(e.to_string())
        })?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| GatewayError::DownstreamUnreachable(e.to_string()))?;
        let body = decode_body(&bytes);

        if status.is_success() {
            Ok(DownstreamResponse { status, body })
        } else {
            tracing::warn!(%downstream, %status, "downstream returned an error");
            Err(GatewayError::DownstreamError { status, body })
        }
    }
}

fn parse_base_url(raw: &str) -> Option<Url> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    match Url::parse(raw) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && !url.cannot_be_a_base() => Some(url),
        Ok(url) => {
            tracing::error!(%url, "downstream base URL must be an http(s) URL");
            None
        }
        Err(e) => {
            tracing::error!(base_url = raw, error = %e, "invalid downstream base URL");
            None
        }
    }
}

/// JSON bodies are decoded, anything else is carried as a string.
fn decode_body(bytes: &[u8]) -> Value {
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}
