use time::Date;

use wejk_config::Config;
use wejk_domain::{
	answer::{AnswerDraft, FollowUp},
	documents::Document,
};

use crate::{CompletionService, Result, contracts::ANSWER, prompts, request_structured};

/// Answers strictly from `evidence`, flagging when the evidence is not enough.
pub async fn generate(
	completion: &dyn CompletionService,
	cfg: &Config,
	question: &str,
	history: &[String],
	follow_up: Option<&FollowUp>,
	evidence: &[Document],
	today: Date,
) -> Result<AnswerDraft> {
	let system = format!(
		"{}\nAnswer only with information found in the documents below. If they are not enough, say what is missing and set needsMoreContext to true. Never invent facts.\n\n{}\n{}",
		prompts::persona(&cfg.assistant),
		prompts::facts_block(&cfg.assistant, today),
		ANSWER.format_instructions()
	);
	let mut user = format!("Question: {question}\n{}", prompts::search_history_line(history));

	if let Some(follow_up) = follow_up {
		user.push_str(&format!(
			"\nPreviously I answered: {}, but was asked for more information.",
			follow_up.previous_answer
		));
	}

	user.push_str("\n\nDocuments:\n");
	user.push_str(&prompts::render_documents(evidence));

	request_structured(completion, &cfg.providers.llm, &ANSWER, &prompts::messages(system, user))
		.await
}
