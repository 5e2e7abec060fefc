//! Session driver: admission, classification, then the quick reply and the refine loop running
//! side by side on two independent channels.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use time::{Date, OffsetDateTime};
use tokio::{sync::oneshot, task::JoinHandle};
use uuid::Uuid;

use wejk_config::Config;
use wejk_domain::{
	answer::{AssistantResponse, FollowUp, QuickResponse},
	documents::Document,
	intent::{ChatTurn, IntentLabel},
	loop_control::{self, ContinuationPolicy},
};

use crate::{
	Providers, Result, SessionTrace, SessionTracer, answer, classifier, critique, quick,
	rate_limit::{RateLimiter, Rejection},
	rerank, retriever,
};

#[derive(Debug, Clone, Default, Serialize)]
pub struct AskRequest {
	pub question: String,
	pub history: Vec<ChatTurn>,
	pub identity: Option<String>,
}

#[derive(Debug)]
pub enum AskOutcome {
	/// Refused before any pipeline work.
	Rejected(Rejection),
	Accepted(AskHandles),
}

/// Two independently awaitable results of one session.
///
/// `quick` always settles. `full` settles to `None` for anything that is not a question. Both
/// may be awaited in either order, and dropping one does not stop the session.
///
/// `session` completes once the session trace has been handed to the sink, after both answers
/// were sent. Short-lived callers await it before exiting; dropping it detaches the session.
#[derive(Debug)]
pub struct AskHandles {
	pub session_id: Uuid,
	pub quick: oneshot::Receiver<QuickResponse>,
	pub full: oneshot::Receiver<Option<AssistantResponse>>,
	pub session: JoinHandle<()>,
}

#[derive(Clone)]
pub struct Orchestrator {
	cfg: Arc<Config>,
	providers: Providers,
	limiter: RateLimiter,
	policy: ContinuationPolicy,
}
impl Orchestrator {
	pub fn new(cfg: Config, providers: Providers) -> Self {
		let limiter = RateLimiter::new(&cfg, providers.rate_limits.clone());
		let policy = ContinuationPolicy::from_config(&cfg.assistant);

		Self { cfg: Arc::new(cfg), providers, limiter, policy }
	}

	/// Admits the request and starts its session in the background.
	///
	/// Only admission is awaited here. Everything after it runs on a spawned task that finishes
	/// even when the caller stops listening, so the trace is always emitted.
	pub async fn ask_question(&self, request: AskRequest) -> AskOutcome {
		if let Err(rejection) = self.limiter.admit(request.identity.as_deref()).await {
			return AskOutcome::Rejected(rejection);
		}

		let session_id = Uuid::new_v4();
		let (quick_tx, quick_rx) = oneshot::channel();
		let (full_tx, full_rx) = oneshot::channel();
		let session = Session {
			orchestrator: self.clone(),
			tracer: SessionTracer::new(session_id, &request.question),
			session_id,
			today: OffsetDateTime::now_utc().date(),
			request,
		};

		tracing::info!(%session_id, "Session started.");
		let session = tokio::spawn(session.run(quick_tx, full_tx));

		AskOutcome::Accepted(AskHandles { session_id, quick: quick_rx, full: full_rx, session })
	}

	// Runs after both answers are sent, so it never delays delivery.
	async fn persist(&self, trace: SessionTrace) {
		if let Err(err) = self.providers.traces.persist(&trace).await {
			tracing::warn!(
				error = %err,
				session_id = %trace.session_id,
				"Failed to persist session trace."
			);
		}
	}
}

struct Session {
	orchestrator: Orchestrator,
	tracer: SessionTracer,
	session_id: Uuid,
	today: Date,
	request: AskRequest,
}
impl Session {
	async fn run(
		self,
		quick_tx: oneshot::Sender<QuickResponse>,
		full_tx: oneshot::Sender<Option<AssistantResponse>>,
	) {
		let cfg = &self.orchestrator.cfg;
		let completion = self.orchestrator.providers.completion.as_ref();
		let classified = self
			.tracer
			.step(
				"classify",
				serde_json::json!({
					"question": self.request.question,
					"history": self.request.history,
				}),
				classifier::classify(completion, cfg, &self.request.question, &self.request.history),
			)
			.await;
		let (output, error) = match classified {
			Err(err) => {
				let apology = QuickResponse {
					answer: cfg.assistant.apology_message.clone(),
					question_type: IntentLabel::Casual,
				};
				let _ = quick_tx.send(apology.clone());
				let _ = full_tx.send(None);

				(to_value(&apology), Some(err.to_string()))
			},
			Ok(label) if !label.is_informational() => {
				tracing::info!(session_id = %self.session_id, %label, "Answering without retrieval.");

				let _ = full_tx.send(None);
				let quick = self.quick_reply(label).await;
				let _ = quick_tx.send(quick.clone());

				(to_value(&quick), None)
			},
			Ok(label) => {
				let quick_path = async {
					let quick = self.quick_reply(label).await;
					let _ = quick_tx.send(quick);
				};
				let ((), (response, error)) = tokio::join!(quick_path, self.refine());
				let output = to_value(&response);
				let _ = full_tx.send(Some(response));

				(output, error)
			},
		};

		if let Some(trace) = self.tracer.finish(output, error) {
			self.orchestrator.persist(trace).await;
		}
	}

	async fn quick_reply(&self, label: IntentLabel) -> QuickResponse {
		let cfg = &self.orchestrator.cfg;
		let reply = self
			.tracer
			.step(
				"quick_reply",
				serde_json::json!({ "label": label }),
				quick::respond(
					self.orchestrator.providers.completion.as_ref(),
					cfg,
					label,
					&self.request.question,
					&self.request.history,
					self.today,
				),
			)
			.await;

		reply.unwrap_or_else(|_| QuickResponse {
			answer: cfg.assistant.apology_message.clone(),
			question_type: label,
		})
	}

	/// Runs the refine loop to a terminal response. A failure anywhere in the loop becomes the
	/// apology response, with the error returned alongside for the trace.
	async fn refine(&self) -> (AssistantResponse, Option<String>) {
		let mut state = RefineState::default();

		match self.refine_loop(&mut state).await {
			Ok(response) => (response, None),
			Err(err) => {
				tracing::warn!(
					session_id = %self.session_id,
					iteration = state.iterations,
					error = %err,
					"Refine loop failed."
				);

				let response = AssistantResponse::apology(
					&self.orchestrator.cfg.assistant.apology_message,
					state.iterations,
					state.search_history,
				);

				(response, Some(err.to_string()))
			},
		}
	}

	async fn refine_loop(&self, state: &mut RefineState) -> Result<AssistantResponse> {
		let cfg = &self.orchestrator.cfg;
		let providers = &self.orchestrator.providers;
		let completion = providers.completion.as_ref();
		let question = self.request.question.as_str();
		let max_iterations = cfg.assistant.max_search_iterations;
		let mut follow_up: Option<FollowUp> = None;
		let mut iteration = 0;

		loop {
			let searched_before = state.search_history.len();
			let retrieved = self
				.tracer
				.step(
					"retrieve",
					serde_json::json!({ "iteration": iteration, "followUp": follow_up }),
					retriever::retrieve(
						completion,
						providers.vector_store.as_ref(),
						cfg,
						question,
						&mut state.search_history,
						follow_up.as_ref(),
					),
				)
				.await?;
			let evidence: Vec<Document> = self
				.tracer
				.step(
					"rerank",
					serde_json::json!({ "iteration": iteration, "candidates": retrieved.len() }),
					rerank::filter(completion, cfg, question, retrieved),
				)
				.await?;
			let draft = self
				.tracer
				.step(
					"generate",
					serde_json::json!({
						"iteration": iteration,
						"searchHistory": state.search_history,
						"documents": evidence.len(),
					}),
					answer::generate(
						completion,
						cfg,
						question,
						&state.search_history,
						follow_up.as_ref(),
						&evidence,
						self.today,
					),
				)
				.await?;
			let critique = self
				.tracer
				.step(
					"critique",
					serde_json::json!({ "iteration": iteration, "answer": draft.answer }),
					critique::critique(completion, cfg, question, &draft, &evidence, self.today),
				)
				.await?;

			state.iterations = iteration + 1;

			tracing::info!(
				session_id = %self.session_id,
				iteration,
				queries = state.search_history.len() - searched_before,
				needs_more_context = draft.needs_more_context,
				answered = critique.did_answer_the_question,
				"Refine iteration finished."
			);

			if loop_control::should_continue(
				self.orchestrator.policy,
				&draft,
				&critique,
				iteration,
				max_iterations,
			) {
				follow_up = Some(FollowUp::from_iteration(&draft, &critique));
				iteration += 1;

				continue;
			}

			return Ok(AssistantResponse::assemble(
				draft,
				critique,
				&evidence,
				state.iterations,
				state.search_history.clone(),
			));
		}
	}
}

#[derive(Default)]
struct RefineState {
	iterations: u32,
	search_history: Vec<String>,
}

fn to_value<T>(value: &T) -> Option<Value>
where
	T: Serialize,
{
	serde_json::to_value(value).ok()
}
