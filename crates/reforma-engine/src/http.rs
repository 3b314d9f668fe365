use std::time::Duration;

use reqwest::blocking::{Client as HttpClient, Response as HttpResponse};
use serde_json::Value;

pub(crate) fn build_http_client(timeout: Duration) -> reqwest::Result<HttpClient> {
    HttpClient::builder().timeout(timeout).build()
}

/// Reads the body as JSON, turning non-success statuses into an error message that
/// carries the status code and a truncated body.
pub(crate) fn response_json_or_error(provider: &str, response: HttpResponse) -> Result<Value, String> {
    let status = response.status();
    let code = status.as_u16();
    let body = response
        .text()
        .map_err(|err| format!("{provider} response body read failed: {err}"))?;
    if !status.is_success() {
        return Err(format!(
            "{provider} request failed ({code}): {}",
            truncate_text(&body, 512)
        ));
    }
    serde_json::from_str(&body)
        .map_err(|err| format!("{provider} returned invalid JSON payload: {err}"))
}

pub(crate) fn error_chain_text(err: &(dyn std::error::Error + 'static)) -> String {
    let mut parts: Vec<String> = Vec::new();
    let mut current = Some(err);
    while let Some(cause) = current {
        let text = cause.to_string();
        let trimmed = text.trim();
        if !trimmed.is_empty() && parts.last().map(String::as_str) != Some(trimmed) {
            parts.push(trimmed.to_string());
        }
        current = cause.source();
    }
    parts.join(" | caused by: ")
}

pub(crate) fn truncate_text(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    value.chars().take(max_chars).collect::<String>() + "…"
}
