use serde_json::Value;

use wejk_config::Config;
use wejk_domain::intent::{ChatTurn, IntentLabel, render_history};

use crate::{CompletionService, Error, Result, contracts::CLASSIFICATION, prompts};

/// Labels one utterance. Runs exactly once per request and never retries.
pub async fn classify(
	completion: &dyn CompletionService,
	cfg: &Config,
	question: &str,
	history: &[ChatTurn],
) -> Result<IntentLabel> {
	let messages = build_messages(cfg, question, history);
	let raw = completion.complete(&cfg.providers.llm, &messages, &CLASSIFICATION).await?;

	parse_label(&raw)
}

fn build_messages(cfg: &Config, question: &str, history: &[ChatTurn]) -> Vec<Value> {
	let system = format!(
		"{}\nClassify the user's latest message into exactly one category.\n{}",
		prompts::persona(&cfg.assistant),
		CLASSIFICATION.format_instructions()
	);
	let user = format!(
		"Conversation so far:\n{}\n\nLatest message:\n{question}",
		render_history(history)
	);

	prompts::messages(system, user)
}

// The label is parsed here rather than through the contract so that an out-of-set label is
// reported as a classification failure, not a generic shape error.
fn parse_label(raw: &Value) -> Result<IntentLabel> {
	let Some(label) = raw.get("label").and_then(Value::as_str) else {
		return Err(Error::MalformedOutput {
			contract: CLASSIFICATION.name.to_string(),
			message: "label is missing or not a string".to_string(),
		});
	};

	label.trim().parse().map_err(|_| Error::InvalidClassification { label: label.to_string() })
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn known_labels_parse() {
		let label = parse_label(&serde_json::json!({ "label": "attack" })).expect("Label.");

		assert_eq!(label, IntentLabel::Attack);
	}

	#[test]
	fn unknown_label_is_not_coerced() {
		let err = parse_label(&serde_json::json!({ "label": "Question!" }))
			.expect_err("Expected a classification error.");

		assert!(matches!(err, Error::InvalidClassification { label } if label == "Question!"));
	}

	#[test]
	fn missing_label_is_malformed_output() {
		let err = parse_label(&serde_json::json!({ "intent": "question" }))
			.expect_err("Expected a malformed output error.");

		assert!(matches!(err, Error::MalformedOutput { .. }));
	}
}
