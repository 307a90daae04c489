//! Wire format helpers for the OpenAI Chat Completions and Images APIs.

use {
    anyhow::{Result, anyhow, bail},
    lingua_sessions::{Exchange, ExchangeContent},
    serde_json::{Value, json},
};

/// Convert an exchange into a Chat Completions message.
///
/// Image entries become a single `image_url` part carrying a PNG data URL
/// and the detail hint.
#[must_use]
pub fn to_openai_message(exchange: &Exchange) -> Value {
    let role = exchange.role.as_str();
    match &exchange.content {
        ExchangeContent::Text(text) => json!({ "role": role, "content": text }),
        ExchangeContent::Image(attachment) => json!({
            "role": role,
            "content": [{
                "type": "image_url",
                "image_url": {
                    "url": attachment.data_url(),
                    "detail": attachment.detail.as_str(),
                }
            }]
        }),
    }
}

#[must_use]
pub fn to_openai_messages(exchanges: &[Exchange]) -> Vec<Value> {
    exchanges.iter().map(to_openai_message).collect()
}

/// Pull `choices[0].message.content` out of a completion response.
pub fn parse_completion_text(payload: &Value) -> Result<String> {
    let choice = payload
        .get("choices")
        .and_then(Value::as_array)
        .and_then(|choices| choices.first())
        .ok_or_else(|| anyhow!("completion response has no choices"))?;

    let reason = || choice["finish_reason"].as_str().unwrap_or("unknown");
    let content = choice["message"]["content"]
        .as_str()
        .ok_or_else(|| anyhow!("completion has no text content (finish_reason: {})", reason()))?;
    if content.trim().is_empty() {
        bail!("completion returned empty text (finish_reason: {})", reason());
    }
    Ok(content.to_string())
}

/// Collect the `url` of every entry in an images response.
pub fn parse_image_urls(payload: &Value) -> Result<Vec<String>> {
    let data = payload
        .get("data")
        .and_then(Value::as_array)
        .ok_or_else(|| anyhow!("images response has no data array"))?;

    Ok(data
        .iter()
        .filter_map(|entry| entry["url"].as_str())
        .map(str::to_string)
        .collect())
}

/// Extract the human-readable message from an API error body, falling back
/// to the raw body.
#[must_use]
pub fn api_error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}
