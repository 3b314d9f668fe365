use std::time::Duration;

use reforma_contracts::rooms::{RenovationNeed, RoomCategory, RoomVerdict};
use reqwest::blocking::Client as HttpClient;
use reqwest::header::CONTENT_TYPE;
use serde_json::{json, Map, Value};
use tracing::debug;

use crate::config::{normalize_api_base, PipelineConfig};
use crate::error::AnalysisError;
use crate::http::{build_http_client, error_chain_text, response_json_or_error, truncate_text};
use crate::imaging::EncodedImage;

const NEEDS_RENOVATION_KEYS: &[&str] = &["necesita_reforma", "needs_renovation"];
const JUSTIFICATION_KEYS: &[&str] = &["justificación", "justificacion", "justification"];
const ITEMS_KEYS: &[&str] = &["elementos_a_reformar", "items_to_renovate"];
const COST_KEYS: &[&str] = &["estimación_coste", "estimacion_coste", "estimated_cost"];

/// Judges one room photo.
pub trait VisionClassifier {
    fn name(&self) -> &str;
    fn classify(
        &self,
        image: &EncodedImage,
        room: RoomCategory,
    ) -> Result<RoomVerdict, AnalysisError>;
}

/// Vision classifier backed by the OpenAI chat completions endpoint.
pub struct OpenAiVisionClassifier {
    api_base: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    prompt_template: String,
    http: HttpClient,
}

impl OpenAiVisionClassifier {
    pub fn new(
        api_base: &str,
        api_key: impl Into<String>,
        model: impl Into<String>,
        max_tokens: u32,
        prompt_template: impl Into<String>,
        timeout: Duration,
    ) -> reqwest::Result<Self> {
        Ok(Self {
            api_base: normalize_api_base(api_base),
            api_key: api_key.into(),
            model: model.into(),
            max_tokens,
            prompt_template: prompt_template.into(),
            http: build_http_client(timeout)?,
        })
    }

    /// `None` when no vision key is configured.
    pub fn from_config(config: &PipelineConfig) -> Option<reqwest::Result<Self>> {
        if !config.has_vision_credentials() {
            return None;
        }
        let api_key = config.openai_api_key.clone().unwrap_or_default();
        Some(Self::new(
            &config.openai_api_base,
            api_key.trim(),
            config.vision_model.clone(),
            config.max_tokens,
            config.prompt_template.clone(),
            config.http_timeout,
        ))
    }

    fn request_payload(&self, image: &EncodedImage, room: RoomCategory) -> Value {
        json!({
            "model": self.model,
            "messages": [{
                "role": "user",
                "content": [
                    {"type": "text", "text": build_prompt(&self.prompt_template, room)},
                    {
                        "type": "image_url",
                        "image_url": {"url": image.to_data_url(), "detail": "low"},
                    },
                ],
            }],
            "max_tokens": self.max_tokens,
        })
    }
}

impl VisionClassifier for OpenAiVisionClassifier {
    fn name(&self) -> &str {
        "openai"
    }

    fn classify(
        &self,
        image: &EncodedImage,
        room: RoomCategory,
    ) -> Result<RoomVerdict, AnalysisError> {
        let endpoint = format!("{}/chat/completions", self.api_base);
        let response = self
            .http
            .post(&endpoint)
            .bearer_auth(&self.api_key)
            .header(CONTENT_TYPE, "application/json")
            .json(&self.request_payload(image, room))
            .send()
            .map_err(|err| AnalysisError::Fetch {
                url: endpoint.clone(),
                reason: error_chain_text(&err),
            })?;
        let payload =
            response_json_or_error("OpenAI", response).map_err(AnalysisError::Classification)?;
        let reply = extract_chat_reply(&payload).ok_or_else(|| {
            AnalysisError::Classification("model reply contained no text".to_string())
        })?;
        debug!(room = room.source_label(), reply = %truncate_text(&reply, 200), "model reply");
        parse_verdict(extract_reply_json(&reply))
    }
}

pub fn build_prompt(template: &str, room: RoomCategory) -> String {
    template.replace("{room}", room.source_label())
}

fn extract_chat_reply(payload: &Value) -> Option<String> {
    let content = payload
        .get("choices")?
        .as_array()?
        .first()?
        .get("message")?
        .get("content")?;
    let text = match content {
        Value::String(text) => text.clone(),
        Value::Array(parts) => parts
            .iter()
            .filter_map(|part| part.get("text").and_then(Value::as_str))
            .collect::<Vec<&str>>()
            .join("\n"),
        _ => return None,
    };
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Picks the JSON candidate out of a free-text reply: a ```` ```json ```` block if
/// present, else the first fenced block, else the whole reply.
pub fn extract_reply_json(reply: &str) -> &str {
    let text = reply.trim();
    fenced_body(text, "```json")
        .or_else(|| fenced_body(text, "```"))
        .unwrap_or(text)
}

fn fenced_body<'a>(text: &'a str, opener: &str) -> Option<&'a str> {
    let start = text.find(opener)? + opener.len();
    let rest = &text[start..];
    let end = rest.find("```").unwrap_or(rest.len());
    Some(rest[..end].trim())
}

/// Parses the extracted text into a verdict. All four fields must be present; values
/// that are not strings are flattened to text.
pub fn parse_verdict(text: &str) -> Result<RoomVerdict, AnalysisError> {
    let value: Value = serde_json::from_str(text).map_err(|err| {
        AnalysisError::Classification(format!(
            "reply is not valid JSON ({err}): {}",
            truncate_text(text, 120)
        ))
    })?;
    let Some(object) = value.as_object() else {
        return Err(AnalysisError::Classification(
            "reply JSON is not an object".to_string(),
        ));
    };

    let needs = required_field(object, NEEDS_RENOVATION_KEYS)?;
    Ok(RoomVerdict {
        needs_renovation: RenovationNeed::from_answer(&needs),
        justification: required_field(object, JUSTIFICATION_KEYS)?,
        items_to_renovate: required_field(object, ITEMS_KEYS)?,
        estimated_cost: required_field(object, COST_KEYS)?,
    })
}

fn required_field(object: &Map<String, Value>, keys: &[&str]) -> Result<String, AnalysisError> {
    keys.iter()
        .find_map(|key| object.get(*key))
        .map(coerce_text)
        .ok_or_else(|| {
            AnalysisError::Classification(format!("reply is missing \"{}\"", keys[0]))
        })
}

fn coerce_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.trim().to_string(),
        Value::Array(items) => items
            .iter()
            .map(coerce_text)
            .filter(|item| !item.is_empty())
            .collect::<Vec<String>>()
            .join(", "),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
