//! Per-session execution trace. One tracer handle is created per session and passed explicitly
//! to every step; nothing here is global.

use std::{
	future::Future,
	sync::{Arc, Mutex, MutexGuard},
	time::Instant,
};

use serde::Serialize;
use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceStep {
	pub name: String,
	#[serde(with = "time::serde::rfc3339")]
	pub started_at: OffsetDateTime,
	pub duration_ms: u64,
	pub input: Value,
	pub output: Option<Value>,
	pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionTrace {
	pub session_id: Uuid,
	pub question: String,
	#[serde(with = "time::serde::rfc3339")]
	pub started_at: OffsetDateTime,
	#[serde(with = "time::serde::rfc3339::option")]
	pub ended_at: Option<OffsetDateTime>,
	pub steps: Vec<TraceStep>,
	pub output: Option<Value>,
	pub error: Option<String>,
}
impl SessionTrace {
	pub fn failed(&self) -> bool {
		self.error.is_some()
	}
}

#[derive(Clone)]
pub struct SessionTracer {
	inner: Arc<Mutex<Option<SessionTrace>>>,
}
impl SessionTracer {
	pub fn new(session_id: Uuid, question: &str) -> Self {
		let trace = SessionTrace {
			session_id,
			question: question.to_string(),
			started_at: OffsetDateTime::now_utc(),
			ended_at: None,
			steps: Vec::new(),
			output: None,
			error: None,
		};

		Self { inner: Arc::new(Mutex::new(Some(trace))) }
	}

	/// Runs `fut` as a named step and records its timing, input, and outcome.
	pub async fn step<T, E, F>(&self, name: &str, input: Value, fut: F) -> Result<T, E>
	where
		T: Serialize,
		E: std::fmt::Display,
		F: Future<Output = Result<T, E>>,
	{
		let started_at = OffsetDateTime::now_utc();
		let clock = Instant::now();
		let result = fut.await;
		let duration_ms = clock.elapsed().as_millis() as u64;
		let (output, error) = match &result {
			Ok(value) => (serde_json::to_value(value).ok(), None),
			Err(err) => (None, Some(err.to_string())),
		};

		if let Some(error) = &error {
			tracing::warn!(step = name, duration_ms, error = %error, "Step failed.");
		} else {
			tracing::debug!(step = name, duration_ms, "Step finished.");
		}

		self.record(TraceStep {
			name: name.to_string(),
			started_at,
			duration_ms,
			input,
			output,
			error,
		});

		result
	}

	pub fn record(&self, step: TraceStep) {
		if let Some(trace) = self.lock().as_mut() {
			trace.steps.push(step);
		}
	}

	/// Closes the trace. Only the first call returns it; the session is persisted once.
	pub fn finish(&self, output: Option<Value>, error: Option<String>) -> Option<SessionTrace> {
		let mut trace = self.lock().take()?;

		trace.ended_at = Some(OffsetDateTime::now_utc());
		trace.output = output;
		trace.error = error;

		Some(trace)
	}

	fn lock(&self) -> MutexGuard<'_, Option<SessionTrace>> {
		self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn steps_are_recorded_in_completion_order() {
		let tracer = SessionTracer::new(Uuid::new_v4(), "Co to jest WEEIA?");
		let ok: Result<u32, String> =
			tracer.step("classify", serde_json::json!({ "q": 1 }), async { Ok(7) }).await;
		let failed: Result<u32, String> =
			tracer.step("retrieve", Value::Null, async { Err("store down".to_string()) }).await;

		assert_eq!(ok, Ok(7));
		assert!(failed.is_err());

		let trace = tracer.finish(None, Some("store down".to_string())).expect("First finish.");

		assert_eq!(trace.steps.len(), 2);
		assert_eq!(trace.steps[0].output, Some(serde_json::json!(7)));
		assert_eq!(trace.steps[1].error.as_deref(), Some("store down"));
		assert!(trace.failed());
		assert!(trace.ended_at.is_some());
	}

	#[tokio::test]
	async fn finish_yields_the_trace_once() {
		let tracer = SessionTracer::new(Uuid::new_v4(), "hej");

		assert!(tracer.finish(None, None).is_some());
		assert!(tracer.finish(None, None).is_none());

		let late: Result<(), String> = tracer.step("late", Value::Null, async { Ok(()) }).await;

		assert!(late.is_ok());
	}
}
