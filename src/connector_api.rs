//! Remote HTTP API connector.
//!
//! Issues one HTTP request against a remote-api descriptor. The target URL
//! is the descriptor's base `url` concatenated with the caller's endpoint,
//! verbatim; duplicate or missing separators are the caller's problem. The
//! descriptor's `headers` are the base header set for every call; there is
//! no per-call header merge.
//!
//! Failures never retry. A transport fault or a non-2xx status becomes a
//! connector error, and for non-2xx the message carries the remote status
//! line rather than a generic transport phrase. No timeout is enforced at
//! this layer.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;
use serde_json::{Map, Value};

use crate::error::GatewayError;
use crate::registry::{DataSourceDescriptor, SourceKind};

/// Result of a successful (2xx) remote call.
#[derive(Debug)]
pub struct ApiResponse {
    pub status: u16,
    pub headers: Map<String, Value>,
    /// Parsed JSON body when it parses, raw text otherwise.
    pub data: Value,
}

/// Call `endpoint` on the descriptor's base URL.
///
/// `body` is attached only for POST and PUT; for any other method a
/// supplied body is ignored.
pub async fn call_endpoint(
    descriptor: &DataSourceDescriptor,
    endpoint: &str,
    method: &str,
    params: Option<&Map<String, Value>>,
    body: Option<&Value>,
) -> Result<ApiResponse, GatewayError> {
    descriptor.expect_kind(SourceKind::RemoteApi)?;
    let base = descriptor.base_url()?;
    let url = format!("{base}{endpoint}");

    let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())
        .map_err(|_| GatewayError::Connector(format!("unsupported HTTP method: {method}")))?;

    let mut headers = HeaderMap::new();
    for (key, value) in descriptor.headers() {
        let name = HeaderName::try_from(key.as_str())
            .map_err(|_| GatewayError::Connector(format!("invalid header name: {key}")))?;
        let value = HeaderValue::try_from(value.as_str())
            .map_err(|_| GatewayError::Connector(format!("invalid header value for {key}")))?;
        headers.insert(name, value);
    }

    let client = reqwest::Client::new();
    let mut request = client.request(method.clone(), &url).headers(headers);

    if let Some(params) = params {
        let pairs: Vec<(String, String)> = params
            .iter()
            .map(|(key, value)| (key.clone(), scalar_string(value)))
            .collect();
        request = request.query(&pairs);
    }

    if matches!(method, Method::POST | Method::PUT) {
        if let Some(body) = body {
            request = request.json(body);
        }
    }

    let response = request
        .send()
        .await
        .map_err(|e| GatewayError::Connector(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        // Prefer what the remote reported over a generic transport message.
        let reason = status.canonical_reason().unwrap_or("unknown status");
        let body = response.text().await.unwrap_or_default();
        let message = if body.is_empty() {
            format!("{} {}", status.as_u16(), reason)
        } else {
            format!("{} {}: {}", status.as_u16(), reason, body)
        };
        return Err(GatewayError::Connector(message));
    }

    let header_map: Map<String, Value> = response
        .headers()
        .iter()
        .map(|(name, value)| {
            (
                name.to_string(),
                Value::from(String::from_utf8_lossy(value.as_bytes()).to_string()),
            )
        })
        .collect();

    let status_code = status.as_u16();
    let text = response
        .text()
        .await
        .map_err(|e| GatewayError::Connector(e.to_string()))?;
    let data = serde_json::from_str(&text).unwrap_or_else(|_| Value::String(text));

    Ok(ApiResponse {
        status: status_code,
        headers: header_map,
        data,
    })
}

/// Render a JSON scalar as a query-string value. Strings drop their quotes;
/// everything else keeps its JSON rendering.
fn scalar_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_strings_drop_quotes() {
        assert_eq!(scalar_string(&Value::from("x")), "x");
        assert_eq!(scalar_string(&Value::from(30)), "30");
        assert_eq!(scalar_string(&Value::from(true)), "true");
    }
}
