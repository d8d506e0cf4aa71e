//! Shared plumbing for the Gemini REST API.

use std::time::Duration;

use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};

use crate::models::GeminiConfig;

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Build an HTTP client carrying the API key on every request.
pub(crate) fn build_http_client(config: &GeminiConfig) -> Result<Client, String> {
    let api_key = config
        .api_key
        .as_deref()
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| "missing Google API key".to_string())?;

    let mut key = HeaderValue::from_str(api_key).map_err(|e| format!("invalid API key: {e}"))?;
    key.set_sensitive(true);
    let headers = HeaderMap::from_iter([(HeaderName::from_static(API_KEY_HEADER), key)]);

    let mut builder = Client::builder().default_headers(headers);
    if let Some(secs) = config.timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }

    builder.build().map_err(|e| e.to_string())
}

/// Resource name of a model, e.g. `models/text-embedding-004`.
pub(crate) fn model_resource(model: &str) -> String {
    let model = model.trim();
    if model.starts_with("models/") {
        model.to_string()
    } else {
        format!("models/{model}")
    }
}

/// URL of a model method, e.g. `{base}/models/gemini-2.0-flash:generateContent`.
pub(crate) fn method_url(base_url: &str, model: &str, method: &str) -> String {
    format!(
        "{}/{}:{}",
        base_url.trim_end_matches('/'),
        model_resource(model),
        method
    )
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl Content {
    pub fn text(role: Option<&str>, text: impl Into<String>) -> Self {
        Self {
            role: role.map(str::to_string),
            parts: vec![Part {
                text: Some(text.into()),
            }],
        }
    }
}

/// Error body returned by the API on non-2xx responses.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

/// Render a failed response as `status N: message`.
pub(crate) fn describe_failure(status: reqwest::StatusCode, body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => match envelope.error.status {
            Some(kind) => format!(
                "status {}: {} ({})",
                status.as_u16(),
                envelope.error.message,
                kind
            ),
            None => format!("status {}: {}", status.as_u16(), envelope.error.message),
        },
        Err(_) => format!("status {}: {}", status.as_u16(), body.trim()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_resource() {
        assert_eq!(model_resource("text-embedding-004"), "models/text-embedding-004");
        assert_eq!(model_resource("models/embedding-001"), "models/embedding-001");
    }

    #[test]
    fn test_method_url_trims_slash() {
        assert_eq!(
            method_url("https://example.test/v1beta/", "gemini-2.0-flash", "generateContent"),
            "https://example.test/v1beta/models/gemini-2.0-flash:generateContent"
        );
    }

    #[test]
    fn test_build_http_client_requires_key() {
        let config = GeminiConfig::default();
        assert!(build_http_client(&config).is_err());

        let config = GeminiConfig {
            api_key: Some("key".to_string()),
            timeout_secs: Some(30),
            ..Default::default()
        };
        assert!(build_http_client(&config).is_ok());
    }

    #[test]
    fn test_describe_failure() {
        let body = r#"{"error": {"code": 400, "message": "API key not valid", "status": "INVALID_ARGUMENT"}}"#;
        assert_eq!(
            describe_failure(reqwest::StatusCode::BAD_REQUEST, body),
            "status 400: API key not valid (INVALID_ARGUMENT)"
        );
        assert_eq!(
            describe_failure(reqwest::StatusCode::BAD_GATEWAY, "upstream down\n"),
            "status 502: upstream down"
        );
    }
}
