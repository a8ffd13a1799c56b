//! Outcome of a single API attempt.
//!
//! The upstream HTTP layer reports failures as a loosely shaped `errors`
//! field. That shape is classified exactly once, in [`Outcome::from_envelope`],
//! and everything downstream matches on the tagged variant.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Rate-limit signal carried by a failed attempt.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RateLimit {
    /// Server-suggested wait in seconds
    pub retry_after_seconds: Option<f64>,
    /// Name of the throttled upstream (e.g. "IGDB")
    pub source_name: Option<String>,
}

impl RateLimit {
    pub fn new(retry_after_seconds: Option<f64>, source_name: Option<&str>) -> Self {
        Self {
            retry_after_seconds,
            source_name: source_name.map(str::to_string),
        }
    }

    /// Retry-after hint as a duration; negative or non-finite hints count as absent.
    pub fn retry_after(&self) -> Option<Duration> {
        self.retry_after_seconds
            .filter(|s| s.is_finite() && *s >= 0.0)
            .and_then(|s| Duration::try_from_secs_f64(s).ok())
    }

    pub fn source(&self) -> &str {
        self.source_name.as_deref().unwrap_or("API")
    }
}

impl fmt::Display for RateLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.retry_after_seconds {
            Some(secs) => write!(f, "{} rate limit exceeded (retry after {}s)", self.source(), secs),
            None => write!(f, "{} rate limit exceeded", self.source()),
        }
    }
}

/// Result of one attempt against the API.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Success(T),
    RateLimited(RateLimit),
    OtherFailure(String),
}

impl<T> Outcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    pub fn rate_limit(&self) -> Option<&RateLimit> {
        match self {
            Outcome::RateLimited(limit) => Some(limit),
            _ => None,
        }
    }

    /// Payload of a successful attempt.
    pub fn ok(self) -> Option<T> {
        match self {
            Outcome::Success(payload) => Some(payload),
            _ => None,
        }
    }
}

/// Response envelope produced by the HTTP layer: `{success, data?, errors?}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiEnvelope {
    pub success: bool,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub errors: Option<Value>,
}

impl ApiEnvelope {
    pub fn success(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            errors: None,
        }
    }

    pub fn failure(errors: Option<Value>) -> Self {
        Self {
            success: false,
            data: None,
            errors,
        }
    }
}

impl Outcome<Value> {
    /// Classify an envelope.
    ///
    /// An `errors` object holding `retry_after` or `api_name` is a rate limit;
    /// any other failure shape is terminal.
    pub fn from_envelope(envelope: ApiEnvelope) -> Self {
        if envelope.success {
            return Outcome::Success(envelope.data.unwrap_or(Value::Null));
        }

        match envelope.errors {
            Some(Value::Object(errors))
                if errors.contains_key("retry_after") || errors.contains_key("api_name") =>
            {
                Outcome::RateLimited(RateLimit {
                    retry_after_seconds: errors.get("retry_after").and_then(Value::as_f64),
                    source_name: errors
                        .get("api_name")
                        .and_then(Value::as_str)
                        .map(str::to_string),
                })
            }
            Some(errors) => Outcome::OtherFailure(failure_message(&errors)),
            None => Outcome::OtherFailure("request failed".to_string()),
        }
    }
}

fn failure_message(errors: &Value) -> String {
    match errors {
        Value::String(message) => message.clone(),
        Value::Object(map) => ["message", "detail", "error"]
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_str))
            .map(str::to_string)
            .unwrap_or_else(|| errors.to_string()),
        Value::Null => "request failed".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn given_successful_envelope_when_classifying_then_returns_payload() {
        let outcome = Outcome::from_envelope(ApiEnvelope::success(json!([1, 2])));
        assert_eq!(outcome, Outcome::Success(json!([1, 2])));
    }

    #[test]
    fn given_retry_after_object_when_classifying_then_rate_limited() {
        let outcome = Outcome::from_envelope(ApiEnvelope::failure(Some(
            json!({"retry_after": 2, "api_name": "IGDB"}),
        )));
        let limit = outcome.rate_limit().expect("rate limit");
        assert_eq!(limit.retry_after_seconds, Some(2.0));
        assert_eq!(limit.source(), "IGDB");
    }

    #[test]
    fn given_api_name_only_when_classifying_then_rate_limited_without_hint() {
        let outcome =
            Outcome::from_envelope(ApiEnvelope::failure(Some(json!({"api_name": "OpenLibrary"}))));
        let limit = outcome.rate_limit().expect("rate limit");
        assert_eq!(limit.retry_after(), None);
    }

    #[test]
    fn given_string_error_when_classifying_then_other_failure() {
        let outcome = Outcome::from_envelope(ApiEnvelope::failure(Some(json!("Goal not found"))));
        assert_eq!(outcome, Outcome::OtherFailure("Goal not found".into()));
    }

    #[test]
    fn given_missing_errors_when_classifying_then_other_failure() {
        let outcome = Outcome::from_envelope(ApiEnvelope::failure(None));
        assert!(matches!(outcome, Outcome::OtherFailure(_)));
    }

    #[test]
    fn given_negative_retry_after_when_reading_hint_then_absent() {
        let limit = RateLimit::new(Some(-1.0), None);
        assert_eq!(limit.retry_after(), None);
        assert_eq!(limit.source(), "API");
    }
}
