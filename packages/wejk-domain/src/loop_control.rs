use std::str::FromStr;

use crate::answer::{AnswerDraft, Critique};

/// Which signals must report insufficiency before another retrieval pass is attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContinuationPolicy {
	/// The generator asks for more context and the critic says the question went unanswered.
	#[default]
	RequireBoth,
	/// Either of the two signals is enough.
	EitherSignal,
}
impl ContinuationPolicy {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::RequireBoth => "require_both",
			Self::EitherSignal => "either_signal",
		}
	}

	pub fn from_config(cfg: &wejk_config::Assistant) -> Self {
		cfg.continuation_policy.parse().unwrap_or_default()
	}

	pub fn insufficient(self, draft: &AnswerDraft, critique: &Critique) -> bool {
		let unanswered = !critique.did_answer_the_question;

		match self {
			Self::RequireBoth => draft.needs_more_context && unanswered,
			Self::EitherSignal => draft.needs_more_context || unanswered,
		}
	}
}
impl FromStr for ContinuationPolicy {
	type Err = String;

	fn from_str(raw: &str) -> Result<Self, Self::Err> {
		match raw {
			"require_both" => Ok(Self::RequireBoth),
			"either_signal" => Ok(Self::EitherSignal),
			other => Err(format!("Unknown continuation policy {other:?}.")),
		}
	}
}

/// Whether the refine loop runs another iteration after iteration `iteration` (zero-based).
///
/// Confidence never participates: it is undefined for unanswered questions.
pub fn should_continue(
	policy: ContinuationPolicy,
	draft: &AnswerDraft,
	critique: &Critique,
	iteration: u32,
	max_iterations: u32,
) -> bool {
	iteration < max_iterations && policy.insufficient(draft, critique)
}
