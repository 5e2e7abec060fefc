//! Chat-completion calls that must come back as JSON conforming to a caller-supplied schema.

use serde_json::Value;

use crate::{Error, Result};

/// Runs one structured completion.
///
/// The result is parsed exactly once. A response that is not a JSON object is an error; it is
/// not retried here, since the same prompt tends to reproduce the same malformed output.
pub async fn complete(
	cfg: &wejk_config::LlmProviderConfig,
	messages: &[Value],
	contract_name: &str,
	schema: &Value,
) -> Result<Value> {
	let client = crate::http_client(cfg.timeout_ms)?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let body = request_body(cfg, messages, contract_name, schema);
	let res = client
		.post(&url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	tracing::debug!(contract = contract_name, model = %cfg.model, "Completion received.");

	parse_completion_json(json)
}

fn request_body(
	cfg: &wejk_config::LlmProviderConfig,
	messages: &[Value],
	contract_name: &str,
	schema: &Value,
) -> Value {
	serde_json::json!({
		"model": cfg.model,
		"temperature": cfg.temperature,
		"max_tokens": cfg.max_tokens,
		"messages": messages,
		"response_format": {
			"type": "json_schema",
			"json_schema": {
				"name": contract_name,
				"strict": true,
				"schema": schema,
			},
		},
	})
}

fn parse_completion_json(json: Value) -> Result<Value> {
	let Some(content) = json
		.get("choices")
		.and_then(|v| v.as_array())
		.and_then(|arr| arr.first())
		.and_then(|choice| choice.get("message"))
		.and_then(|msg| msg.get("content"))
		.and_then(|c| c.as_str())
	else {
		return Err(Error::InvalidResponse {
			message: "Completion response is missing message content.".to_string(),
		});
	};
	let parsed: Value = serde_json::from_str(strip_code_fence(content)).map_err(|_| {
		Error::InvalidResponse { message: "Completion content is not valid JSON.".to_string() }
	})?;

	if !parsed.is_object() {
		return Err(Error::InvalidResponse {
			message: "Completion content must be a JSON object.".to_string(),
		});
	}

	Ok(parsed)
}

// Some OpenAI-compatible servers wrap JSON in a markdown fence even in JSON mode.
fn strip_code_fence(content: &str) -> &str {
	let trimmed = content.trim();
	let Some(inner) = trimmed.strip_prefix("```") else {
		return trimmed;
	};
	let inner = inner.strip_prefix("json").unwrap_or(inner);

	inner.strip_suffix("```").unwrap_or(inner).trim()
}
