use time::Date;

use wejk_config::Config;
use wejk_domain::{
	answer::{AnswerDraft, Critique},
	documents::Document,
};

use crate::{CompletionService, Result, contracts::CRITIQUE, prompts, request_structured};

/// Judges `draft` against the evidence itself rather than the generator's own verdict.
pub async fn critique(
	completion: &dyn CompletionService,
	cfg: &Config,
	question: &str,
	draft: &AnswerDraft,
	evidence: &[Document],
	today: Date,
) -> Result<Critique> {
	let system = format!(
		"{}\nYou review answers written by another assistant. Check every claim and the reasoning behind it against the documents. An answer that is vague, partial or unsupported did not answer the question.\n\n{}\n{}",
		prompts::persona(&cfg.assistant),
		prompts::facts_block(&cfg.assistant, today),
		CRITIQUE.format_instructions()
	);
	let user = format!(
		"Question: {question}\nAnswer: {}\nReasoning: {}\n\nDocuments:\n{}",
		draft.answer,
		draft.thinking,
		prompts::render_documents(evidence)
	);
	let critique: Critique = request_structured(
		completion,
		&cfg.providers.llm,
		&CRITIQUE,
		&prompts::messages(system, user),
	)
	.await?;

	Ok(critique.normalized())
}
