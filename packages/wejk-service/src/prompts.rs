//! Shared prompt fragments.

use serde_json::Value;
use time::{Date, macros::format_description};

use wejk_config::Assistant;
use wejk_domain::documents::Document;

pub fn persona(cfg: &Assistant) -> String {
	format!(
		"You are {}, an assistant that answers questions about {}.",
		cfg.name, cfg.domain_description
	)
}

/// Fixed facts plus the current date. The completion service has no clock of its own.
pub fn facts_block(cfg: &Assistant, today: Date) -> String {
	let mut out = String::from("Facts you can rely on:\n");

	for fact in &cfg.facts {
		out.push_str("- ");
		out.push_str(fact);
		out.push('\n');
	}

	out.push_str("- Today is ");
	out.push_str(&render_date(today));
	out.push('.');

	out
}

pub fn render_date(date: Date) -> String {
	let format = format_description!("[weekday], [day padding:none] [month repr:long] [year]");

	date.format(&format).unwrap_or_else(|_| date.to_string())
}

pub fn search_history_line(history: &[String]) -> String {
	if history.is_empty() {
		return "Nothing searched yet".to_string();
	}

	format!("Already searched for: {}", history.join(", "))
}

pub fn suggestions_line(suggestions: &[String]) -> String {
	if suggestions.is_empty() {
		return "No suggestions".to_string();
	}

	suggestions.join(", ")
}

pub fn render_documents(docs: &[Document]) -> String {
	if docs.is_empty() {
		return "No documents were found.".to_string();
	}

	docs.iter()
		.enumerate()
		.map(|(idx, doc)| {
			format!(
				"[{}] {}\nURL: {}\nCategory: {}\nDate: {}\n{}",
				idx + 1,
				doc.title,
				doc.url,
				doc.category,
				doc.date,
				doc.text_content
			)
		})
		.collect::<Vec<_>>()
		.join("\n\n")
}

pub fn messages(system: String, user: String) -> Vec<Value> {
	vec![
		serde_json::json!({ "role": "system", "content": system }),
		serde_json::json!({ "role": "user", "content": user }),
	]
}
