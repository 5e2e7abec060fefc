use futures::future;

use wejk_config::Config;
use wejk_domain::{
	answer::FollowUp,
	documents::{self, Document},
};

use crate::{CompletionService, Result, VectorStore, planner};

/// One retrieval pass.
///
/// Without a follow-up the original question is searched as-is. With one, the planner expands
/// it and every planned query is appended to `history` before any search is issued. Searches
/// run concurrently and their results are merged by document identity. A store failure fails
/// the pass.
pub async fn retrieve(
	completion: &dyn CompletionService,
	vector_store: &dyn VectorStore,
	cfg: &Config,
	question: &str,
	history: &mut Vec<String>,
	follow_up: Option<&FollowUp>,
) -> Result<Vec<Document>> {
	let top_k = cfg.assistant.top_k;
	let queries = match follow_up {
		None => vec![question.to_string()],
		Some(follow_up) => planner::plan(completion, cfg, question, history, follow_up).await?,
	};

	history.extend(queries.iter().cloned());

	let batches =
		future::try_join_all(queries.iter().map(|query| vector_store.search(query, top_k))).await?;
	let docs = documents::merge_unique(batches);

	tracing::info!(queries = queries.len(), documents = docs.len(), "Retrieved evidence.");

	Ok(docs)
}
