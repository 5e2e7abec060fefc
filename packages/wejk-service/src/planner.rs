use std::collections::HashSet;

use serde::Deserialize;

use wejk_config::Config;
use wejk_domain::answer::FollowUp;

use crate::{CompletionService, Result, contracts::QUERY_PLAN, prompts, request_structured};

#[derive(Deserialize)]
struct QueryPlan {
	queries: Vec<String>,
}

/// Expands a question into at most `max_planned_queries` retrieval queries.
///
/// The critic's explicit follow-up query goes first. Queries already in `history` are skipped
/// unless nothing else is left, so an iteration never runs without a query.
pub async fn plan(
	completion: &dyn CompletionService,
	cfg: &Config,
	question: &str,
	history: &[String],
	follow_up: &FollowUp,
) -> Result<Vec<String>> {
	let system = format!(
		"{}\nYou write short search queries for a semantic document search over the domain pages. Each query should be a few words and target information the previous answer lacked.\n{}",
		prompts::persona(&cfg.assistant),
		QUERY_PLAN.format_instructions()
	);
	let user = format!(
		"Question: {question}\n{}\nPrevious answer: {}\nImprovement suggestions: {}",
		prompts::search_history_line(history),
		follow_up.previous_answer,
		prompts::suggestions_line(&follow_up.improvement_suggestions)
	);
	let planned: QueryPlan = request_structured(
		completion,
		&cfg.providers.llm,
		&QUERY_PLAN,
		&prompts::messages(system, user),
	)
	.await?;
	let queries = select_queries(
		follow_up.follow_up_query.as_deref(),
		planned.queries,
		history,
		cfg.assistant.max_planned_queries as usize,
	);

	tracing::debug!(planned = queries.len(), "Planned retrieval queries.");

	Ok(if queries.is_empty() { vec![question.to_string()] } else { queries })
}

pub fn select_queries(
	explicit: Option<&str>,
	planned: Vec<String>,
	history: &[String],
	limit: usize,
) -> Vec<String> {
	let candidates = explicit
		.map(str::to_string)
		.into_iter()
		.chain(planned)
		.map(|query| query.trim().to_string())
		.filter(|query| !query.is_empty())
		.collect::<Vec<_>>();
	let searched = history.iter().map(|query| query.to_lowercase()).collect::<HashSet<_>>();
	let fresh = dedupe(candidates.iter().filter(|query| !searched.contains(&query.to_lowercase())));
	let mut out = if fresh.is_empty() { dedupe(candidates.iter()) } else { fresh };

	out.truncate(limit);

	out
}

fn dedupe<'a, I>(queries: I) -> Vec<String>
where
	I: Iterator<Item = &'a String>,
{
	let mut seen = HashSet::new();

	queries.filter(|query| seen.insert(query.to_lowercase())).cloned().collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	fn owned(items: &[&str]) -> Vec<String> {
		items.iter().map(|item| item.to_string()).collect()
	}

	#[test]
	fn explicit_follow_up_query_comes_first() {
		let queries = select_queries(
			Some("dean office hours"),
			owned(&["faculty dean", "dean contact"]),
			&[],
			3,
		);

		assert_eq!(queries, owned(&["dean office hours", "faculty dean", "dean contact"]));
	}

	#[test]
	fn searched_queries_are_skipped_and_limit_applies() {
		let queries = select_queries(
			None,
			owned(&["WEEIA", "weeia meaning", "Weeia Meaning", "faculty name", "extra"]),
			&owned(&["weeia"]),
			2,
		);

		assert_eq!(queries, owned(&["weeia meaning", "faculty name"]));
	}

	#[test]
	fn falls_back_to_repeats_when_everything_was_searched() {
		let queries = select_queries(None, owned(&["WEEIA", " "]), &owned(&["WEEIA"]), 3);

		assert_eq!(queries, owned(&["WEEIA"]));
	}
}
