//! HTTP-backed capability handler.
//!
//! Fills `{placeholder}` segments of the endpoint path from the resolved
//! arguments, sends the remaining arguments as query parameters (bodyless
//! methods) or as a JSON body, and parses the response payload as JSON.

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use reqwest::{Client, Method};
use serde_json::{Map as JsonMap, Value};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, warn};

use crate::handler::CapabilityHandler;

/// Connection settings shared by every HTTP handler built from one manifest.
#[derive(Debug, Clone)]
pub struct HttpSettings {
    /// Base URL the endpoint paths are joined onto.
    pub base_url: String,
    /// Static headers sent with every request (for example, authorization).
    pub headers: Vec<(String, String)>,
}

impl HttpSettings {
    /// Settings with a base URL and no extra headers.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            headers: Vec::new(),
        }
    }
}

/// Capability handler that issues one HTTP request per invocation.
pub struct HttpHandler {
    settings: HttpSettings,
    method: String,
    path: String,
    client: Client,
}

impl HttpHandler {
    /// Builds a handler for one endpoint.
    pub fn new(settings: HttpSettings, method: String, path: String) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();
        Self {
            settings,
            method,
            path,
            client,
        }
    }
}

#[async_trait]
impl CapabilityHandler for HttpHandler {
    async fn invoke(&self, arguments: &JsonMap<String, Value>) -> Result<Value> {
        let method = Method::from_str(&self.method).map_err(|error| anyhow!("invalid HTTP method '{}': {}", self.method, error))?;
        let mut remaining = arguments.clone();
        let path = fill_path_placeholders(&self.path, &mut remaining);
        let url = format!("{}{}", self.settings.base_url.trim_end_matches('/'), path);
        debug!(method = %method, url = %url, argument_count = remaining.len(), "http capability invoking");

        let mut request = self.client.request(method.clone(), &url);
        for (name, value) in &self.settings.headers {
            request = request.header(name, value);
        }
        if matches!(method, Method::GET | Method::DELETE | Method::HEAD) {
            let query: Vec<(String, String)> = remaining.iter().map(|(key, value)| (key.clone(), query_value(value))).collect();
            if !query.is_empty() {
                request = request.query(&query);
            }
        } else if !remaining.is_empty() {
            request = request.json(&Value::Object(remaining));
        }

        let response = request.send().await.map_err(|error| anyhow!("network error: {}", error))?;
        let status = response.status();
        let text = response.text().await.unwrap_or_default();

        if !status.is_success() {
            warn!(status = status.as_u16(), url = %url, "http capability returned error status");
            return Err(anyhow!("HTTP {}: {}", status.as_u16(), text));
        }
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|error| anyhow!("response was not valid JSON: {}", error))
    }
}

/// Replaces `{key}` placeholders in a path template with argument values,
/// removing consumed keys from the argument map so they are not sent twice.
fn fill_path_placeholders(template: &str, arguments: &mut JsonMap<String, Value>) -> String {
    let mut path = template.to_string();
    let keys: Vec<String> = arguments.keys().cloned().collect();
    for key in keys {
        let needle = format!("{{{}}}", key);
        if !path.contains(&needle) {
            continue;
        }
        let value = arguments.remove(&key).expect("key taken from the same map");
        path = path.replace(&needle, &encode_path_placeholder_value(&query_value(&value)));
    }
    path
}

fn query_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Percent-encodes a path placeholder value while preserving RFC3986
/// unreserved bytes.
fn encode_path_placeholder_value(value: &str) -> String {
    let mut encoded = String::with_capacity(value.len());
    for byte in value.bytes() {
        if is_unreserved_path_byte(byte) {
            encoded.push(byte as char);
        } else {
            encoded.push('%');
            encoded.push(to_upper_hex((byte >> 4) & 0x0f));
            encoded.push(to_upper_hex(byte & 0x0f));
        }
    }
    encoded
}

fn is_unreserved_path_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'.' | b'_' | b'~')
}

fn to_upper_hex(nibble: u8) -> char {
    char::from_digit(nibble as u32, 16)
        .map(|c| c.to_ascii_uppercase())
        .unwrap_or('0')
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn fills_placeholders_and_consumes_arguments() {
        let mut arguments = JsonMap::new();
        arguments.insert("userId".into(), json!("2"));
        arguments.insert("limit".into(), json!(10));

        let path = fill_path_placeholders("/users/{userId}/files", &mut arguments);

        assert_eq!(path, "/users/2/files");
        assert!(!arguments.contains_key("userId"));
        assert!(arguments.contains_key("limit"));
    }

    #[test]
    fn unmatched_placeholders_are_left_in_place() {
        let mut arguments = JsonMap::new();
        arguments.insert("other".into(), json!("x"));

        let path = fill_path_placeholders("/users/{userId}", &mut arguments);

        assert_eq!(path, "/users/{userId}");
        assert!(arguments.contains_key("other"));
    }

    #[test]
    fn placeholder_values_are_percent_encoded() {
        let mut arguments = JsonMap::new();
        arguments.insert("name".into(), json!("a b/c"));

        let path = fill_path_placeholders("/apps/{name}", &mut arguments);

        assert_eq!(path, "/apps/a%20b%2Fc");
    }

    #[test]
    fn non_string_values_render_as_json() {
        assert_eq!(query_value(&json!(10)), "10");
        assert_eq!(query_value(&json!(true)), "true");
        assert_eq!(query_value(&json!("plain")), "plain");
    }
}
