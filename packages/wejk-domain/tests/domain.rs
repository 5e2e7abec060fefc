use time::{Duration, OffsetDateTime, macros::datetime};

use wejk_domain::{
	answer::{AnswerDraft, Critique, FollowUp},
	documents::{self, Document},
	intent::{self, ChatTurn, IntentLabel},
	loop_control::{self, ContinuationPolicy},
	rate_limit::{self, Admission, RateLimitPolicy, RateLimitRecord},
};

fn doc(id: &str, score: f32, url: &str) -> Document {
	Document {
		id: id.to_string(),
		score,
		title: format!("Title {id}"),
		text_content: format!("Body {id}"),
		category: "aktualnosci".to_string(),
		url: url.to_string(),
		date: "2024-10-24".to_string(),
	}
}

fn draft(needs_more_context: bool) -> AnswerDraft {
	AnswerDraft {
		thinking: "reasoning".to_string(),
		answer: "answer".to_string(),
		needs_more_context,
	}
}

fn critique(did_answer_the_question: bool, confidence: Option<f32>) -> Critique {
	Critique {
		critique: "critique".to_string(),
		did_answer_the_question,
		confidence,
		improvement_suggestions: vec!["look for the dean".to_string()],
		follow_up_query: None,
	}
}

fn policy() -> RateLimitPolicy {
	RateLimitPolicy { window: Duration::hours(1), max_requests: 3 }
}

#[test]
fn intent_labels_round_trip_through_their_names() {
	for label in IntentLabel::ALL {
		assert_eq!(label.as_str().parse::<IntentLabel>(), Ok(label));
	}

	assert!("greeting".parse::<IntentLabel>().is_err());
	assert!(IntentLabel::Question.is_informational());
	assert!(!IntentLabel::Attack.is_informational());
}

#[test]
fn history_renders_speakers_in_order() {
	let rendered =
		intent::render_history(&[ChatTurn::user("Hi"), ChatTurn::assistant("Hello there")]);

	assert_eq!(rendered, "User: Hi\nAssistant: Hello there");
	assert_eq!(intent::render_history(&[]), "No history");
}

#[test]
fn merging_a_result_set_with_itself_is_idempotent() {
	let batch = vec![doc("a", 0.9, "https://x/a"), doc("b", 0.4, "https://x/b")];
	let once = documents::merge_unique(vec![batch.clone()]);
	let twice = documents::merge_unique(vec![batch.clone(), batch]);

	assert_eq!(once, twice);
}

#[test]
fn merging_yields_the_same_identities_in_any_batch_order() {
	let first = vec![doc("a", 0.9, "https://x/a"), doc("b", 0.4, "https://x/b")];
	let second = vec![doc("c", 0.7, "https://x/c"), doc("a", 0.5, "https://x/a")];
	let ids = |docs: &[Document]| {
		let mut ids = docs.iter().map(|doc| doc.id.clone()).collect::<Vec<_>>();

		ids.sort();

		ids
	};
	let forward = documents::merge_unique(vec![first.clone(), second.clone()]);
	let backward = documents::merge_unique(vec![second, first]);

	assert_eq!(ids(&forward), ids(&backward));
	assert_eq!(ids(&forward), vec!["a", "b", "c"]);
}

#[test]
fn duplicate_identity_resolves_to_the_last_write() {
	let mut first = doc("a", 0.9, "https://x/a");
	let mut last = doc("a", 0.2, "https://x/a");

	first.title = "first".to_string();
	last.title = "last".to_string();

	let merged = documents::merge_unique(vec![
		vec![first],
		vec![doc("b", 0.4, "https://x/b")],
		vec![last],
	]);

	assert_eq!(merged.len(), 2);
	assert_eq!(merged[0].title, "last");
	assert_eq!(merged[0].score, 0.2);
	assert_eq!(merged[1].id, "b");
}

#[test]
fn critique_drops_confidence_when_question_was_not_answered() {
	let mut raw = critique(false, Some(95.0));

	raw.improvement_suggestions.push("   ".to_string());
	raw.follow_up_query = Some(" ".to_string());

	let normalized = raw.normalized();

	assert_eq!(normalized.confidence, None);
	assert_eq!(normalized.improvement_suggestions, vec!["look for the dean".to_string()]);
	assert_eq!(normalized.follow_up_query, None);
	assert_eq!(critique(true, Some(80.0)).normalized().confidence, Some(80.0));
}

#[test]
fn follow_up_carries_previous_answer_and_suggestions() {
	let follow_up = FollowUp::from_iteration(&draft(true), &critique(false, None));

	assert_eq!(follow_up.previous_answer, "answer");
	assert_eq!(follow_up.improvement_suggestions, vec!["look for the dean".to_string()]);
}

#[test]
fn require_both_policy_needs_both_signals() {
	let policy = ContinuationPolicy::RequireBoth;

	assert!(loop_control::should_continue(policy, &draft(true), &critique(false, None), 0, 2));
	assert!(!loop_control::should_continue(policy, &draft(false), &critique(false, None), 0, 2));
	assert!(!loop_control::should_continue(
		policy,
		&draft(true),
		&critique(true, Some(10.0)),
		0,
		2
	));
}

#[test]
fn unanswered_question_continues_regardless_of_confidence() {
	for policy in [ContinuationPolicy::RequireBoth, ContinuationPolicy::EitherSignal] {
		for confidence in [None, Some(0.0), Some(99.0)] {
			assert!(loop_control::should_continue(
				policy,
				&draft(true),
				&critique(false, confidence),
				1,
				2
			));
		}
	}

	assert!(loop_control::should_continue(
		ContinuationPolicy::EitherSignal,
		&draft(false),
		&critique(false, Some(99.0)),
		0,
		2
	));
}

#[test]
fn iteration_budget_stops_the_loop() {
	let policy = ContinuationPolicy::EitherSignal;

	assert!(!loop_control::should_continue(policy, &draft(true), &critique(false, None), 2, 2));
	assert!(!loop_control::should_continue(policy, &draft(true), &critique(false, None), 0, 0));
}

#[test]
fn continuation_policy_parses_config_labels() {
	assert_eq!("either_signal".parse(), Ok(ContinuationPolicy::EitherSignal));
	assert_eq!(ContinuationPolicy::RequireBoth.as_str(), "require_both");
	assert!("sometimes".parse::<ContinuationPolicy>().is_err());
}

#[test]
fn exactly_max_admissions_fit_in_one_window() {
	let policy = policy();
	let start = datetime!(2026-10-18 12:00 UTC);
	let mut record: Option<RateLimitRecord> = None;

	for expected in 1..=3 {
		let (admission, next) = rate_limit::evaluate(record.as_ref(), &policy, start);

		assert_eq!(admission, Admission::Allowed { count: expected });

		record = next;
	}

	let (admission, next) =
		rate_limit::evaluate(record.as_ref(), &policy, start + Duration::minutes(10));

	assert_eq!(admission, Admission::Denied { retry_after_minutes: 50 });
	assert!(next.is_none());
}

#[test]
fn counter_resets_after_the_window_elapses() {
	let policy = policy();
	let start = datetime!(2026-10-18 12:00 UTC);
	let exhausted = RateLimitRecord { count: 3, window_reset_at: start + Duration::hours(1) };
	let later = start + Duration::hours(1) + Duration::seconds(1);
	let (admission, next) = rate_limit::evaluate(Some(&exhausted), &policy, later);

	assert_eq!(admission, Admission::Allowed { count: 1 });
	assert_eq!(
		next,
		Some(RateLimitRecord { count: 1, window_reset_at: later + Duration::hours(1) })
	);
}

#[test]
fn denial_rounds_remaining_time_up_to_whole_minutes() {
	let policy = policy();
	let now = OffsetDateTime::UNIX_EPOCH;
	let record = RateLimitRecord { count: 3, window_reset_at: now + Duration::seconds(61) };
	let (admission, _) = rate_limit::evaluate(Some(&record), &policy, now);

	assert_eq!(admission, Admission::Denied { retry_after_minutes: 2 });

	let at_reset = RateLimitRecord { count: 3, window_reset_at: now };
	let (admission, _) = rate_limit::evaluate(Some(&at_reset), &policy, now);

	assert_eq!(admission, Admission::Denied { retry_after_minutes: 1 });
}
