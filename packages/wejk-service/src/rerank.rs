use futures::future;
use serde::Deserialize;
use serde_json::Value;

use wejk_config::Config;
use wejk_domain::documents::Document;

use crate::{CompletionService, Result, contracts::RERANK, prompts, request_structured};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Verdict {
	is_document_useful: bool,
}

/// Drops documents judged not useful for `question`, keeping the rest in their original order.
///
/// Each document is judged independently. A judgment that fails keeps its document and does not
/// affect the others; only a failure to build the requests fails the whole step.
pub async fn filter(
	completion: &dyn CompletionService,
	cfg: &Config,
	question: &str,
	docs: Vec<Document>,
) -> Result<Vec<Document>> {
	let requests = docs
		.iter()
		.map(|doc| build_messages(cfg, question, doc))
		.collect::<Result<Vec<_>>>()?;
	let verdicts = future::join_all(requests.iter().map(|messages| {
		request_structured::<Verdict>(completion, &cfg.providers.llm, &RERANK, messages)
	}))
	.await;
	let before = docs.len();
	let kept = docs
		.into_iter()
		.zip(verdicts)
		.filter_map(|(doc, verdict)| match verdict {
			Ok(verdict) => verdict.is_document_useful.then_some(doc),
			Err(err) => {
				tracing::warn!(error = %err, document_id = %doc.id, "Usefulness judgment failed. Keeping document.");

				Some(doc)
			},
		})
		.collect::<Vec<_>>();

	tracing::info!(before, kept = kept.len(), "Filtered evidence.");

	Ok(kept)
}

fn build_messages(cfg: &Config, question: &str, doc: &Document) -> Result<Vec<Value>> {
	let system = format!(
		"{}\nDecide whether the document helps answer the question.\n{}",
		prompts::persona(&cfg.assistant),
		RERANK.format_instructions()
	);
	let user = format!("Question: {question}\nDocument:\n{}", serde_json::to_string(doc)?);

	Ok(prompts::messages(system, user))
}
