use serde::{Deserialize, Serialize};

use crate::{
	documents::{self, Document},
	intent::IntentLabel,
};

/// What the generator produced in one refine iteration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerDraft {
	pub thinking: String,
	pub answer: String,
	pub needs_more_context: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Critique {
	pub critique: String,
	pub did_answer_the_question: bool,
	/// 0-100. Only meaningful when `did_answer_the_question` holds.
	#[serde(default)]
	pub confidence: Option<f32>,
	#[serde(default)]
	pub improvement_suggestions: Vec<String>,
	#[serde(default)]
	pub follow_up_query: Option<String>,
}
impl Critique {
	/// Drops the confidence of an unanswered question and blank suggestions.
	pub fn normalized(mut self) -> Self {
		if !self.did_answer_the_question {
			self.confidence = None;
		}

		self.improvement_suggestions = self
			.improvement_suggestions
			.into_iter()
			.map(|suggestion| suggestion.trim().to_string())
			.filter(|suggestion| !suggestion.is_empty())
			.collect();
		self.follow_up_query = self
			.follow_up_query
			.map(|query| query.trim().to_string())
			.filter(|query| !query.is_empty());

		self
	}
}

/// Carried from one refine iteration into the next.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowUp {
	pub previous_answer: String,
	pub improvement_suggestions: Vec<String>,
	pub follow_up_query: Option<String>,
}
impl FollowUp {
	pub fn from_iteration(draft: &AnswerDraft, critique: &Critique) -> Self {
		Self {
			previous_answer: draft.answer.clone(),
			improvement_suggestions: critique.improvement_suggestions.clone(),
			follow_up_query: critique.follow_up_query.clone(),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuickResponse {
	pub answer: String,
	pub question_type: IntentLabel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantResponse {
	pub answer: String,
	pub thinking: String,
	pub critique: String,
	pub confidence: Option<f32>,
	pub did_answer_the_question: bool,
	pub needs_more_context: bool,
	pub improvement_suggestions: Vec<String>,
	pub urls: Vec<String>,
	pub iterations: u32,
	pub search_history: Vec<String>,
}
impl AssistantResponse {
	pub fn assemble(
		draft: AnswerDraft,
		critique: Critique,
		evidence: &[Document],
		iterations: u32,
		search_history: Vec<String>,
	) -> Self {
		Self {
			answer: draft.answer,
			thinking: draft.thinking,
			critique: critique.critique,
			confidence: critique.confidence,
			did_answer_the_question: critique.did_answer_the_question,
			needs_more_context: draft.needs_more_context,
			improvement_suggestions: critique.improvement_suggestions,
			urls: documents::unique_urls(evidence),
			iterations,
			search_history,
		}
	}

	/// Low-confidence stand-in returned when the refine loop fails.
	pub fn apology(message: &str, iterations: u32, search_history: Vec<String>) -> Self {
		Self {
			answer: message.to_string(),
			thinking: String::new(),
			critique: String::new(),
			confidence: None,
			did_answer_the_question: false,
			needs_more_context: true,
			improvement_suggestions: Vec::new(),
			urls: Vec::new(),
			iterations,
			search_history,
		}
	}
}
