//! HTTP transport for the platform API (`GET {base}/api/{path}/`).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, RETRY_AFTER};
use serde_json::{json, Map, Value};
use tracing::{debug, instrument, warn};

use crate::domain::ApiEnvelope;
use crate::infrastructure::error::{InfraError, InfraResult};
use crate::infrastructure::traits::ApiTransport;

const TOO_MANY_REQUESTS: u16 = 429;

/// reqwest-backed client mapping every response into an [`ApiEnvelope`].
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration, token: Option<String>) -> InfraResult<Self> {
        let parsed = reqwest::Url::parse(base_url).map_err(|e| InfraError::Http {
            message: format!("invalid base url {base_url}: {e}"),
        })?;
        if parsed.cannot_be_a_base() {
            return Err(InfraError::Http {
                message: format!("base url cannot be used as a base: {base_url}"),
            });
        }

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| InfraError::Http {
                message: format!("build http client: {e}"),
            })?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.is_empty()),
        })
    }

    pub fn endpoint_url(&self, path: &str) -> String {
        endpoint_url(&self.base_url, path)
    }
}

#[async_trait]
impl ApiTransport for ApiClient {
    #[instrument(level = "debug", skip(self, query))]
    async fn get(&self, path: &str, query: &[(String, String)]) -> ApiEnvelope {
        let url = self.endpoint_url(path);
        let mut request = self.http.get(&url).query(query);
        if let Some(token) = &self.token {
            request = request.header(AUTHORIZATION, format!("Token {token}"));
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                warn!("GET {} failed: {}", url, e);
                return ApiEnvelope::failure(Some(Value::String(format!(
                    "request to {url} failed: {e}"
                ))));
            }
        };

        let status = response.status().as_u16();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<f64>().ok());
        let body = match response.text().await {
            Ok(text) => parse_body(&text),
            Err(e) => Err(format!("read response body: {e}")),
        };
        debug!(status, "GET {}", url);

        envelope_from_parts(status, retry_after, body)
    }
}

/// `base` + `/api/` + `path` + `/`, tolerating stray slashes on either side.
pub fn endpoint_url(base: &str, path: &str) -> String {
    format!(
        "{}/api/{}/",
        base.trim_end_matches('/'),
        path.trim_matches('/')
    )
}

fn parse_body(text: &str) -> Result<Value, String> {
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(text).map_err(|e| format!("decode response body: {e}"))
}

/// Build the envelope from status, `Retry-After` header and decoded body.
///
/// Non-2xx bodies contribute their `error` field (or the whole body) as
/// `errors`. A 429 whose body does not already carry a structured rate-limit
/// signal gets one synthesized from the header.
pub fn envelope_from_parts(
    status: u16,
    retry_after_header: Option<f64>,
    body: Result<Value, String>,
) -> ApiEnvelope {
    if (200..300).contains(&status) {
        return match body {
            Ok(data) => ApiEnvelope::success(data),
            Err(message) => ApiEnvelope::failure(Some(Value::String(message))),
        };
    }

    let errors = body.ok().and_then(|value| match value {
        Value::Null => None,
        Value::Object(mut map) => Some(map.remove("error").unwrap_or(Value::Object(map))),
        other => Some(other),
    });

    if status == TOO_MANY_REQUESTS && !is_rate_limit_signal(errors.as_ref()) {
        let mut signal = Map::new();
        if let Some(secs) = retry_after_header {
            signal.insert("retry_after".into(), json!(secs));
        }
        signal.insert("api_name".into(), json!("API"));
        return ApiEnvelope::failure(Some(Value::Object(signal)));
    }

    match errors {
        Some(errors) => ApiEnvelope::failure(Some(errors)),
        None => ApiEnvelope::failure(Some(Value::String(format!("HTTP {status}")))),
    }
}

fn is_rate_limit_signal(errors: Option<&Value>) -> bool {
    matches!(errors, Some(Value::Object(map)) if map.contains_key("retry_after") || map.contains_key("api_name"))
}
