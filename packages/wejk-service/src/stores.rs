//! Adapters from the storage and provider crates onto the service traits.

use std::{
	collections::HashMap,
	sync::{Arc, Mutex},
};

use time::OffsetDateTime;
use tokio::sync::Mutex as AsyncMutex;

use wejk_config::EmbeddingProviderConfig;
use wejk_domain::{
	documents::Document,
	rate_limit::{self, Admission, RateLimitPolicy, RateLimitRecord},
};
use wejk_storage::{
	db::Db,
	qdrant::QdrantStore,
	rate_limits,
	traces::{self, SessionTraceRow},
};

use crate::{
	BoxFuture, EmbeddingProvider, Error, RateLimitStore, Result, SessionTrace, TraceSink,
	VectorStore,
};

/// Embeds the query text and searches Qdrant with the vector.
pub struct QdrantVectorStore {
	pub embedding: Arc<dyn EmbeddingProvider>,
	pub embedding_cfg: EmbeddingProviderConfig,
	pub qdrant: QdrantStore,
}
impl QdrantVectorStore {
	pub fn new(
		embedding: Arc<dyn EmbeddingProvider>,
		embedding_cfg: EmbeddingProviderConfig,
		qdrant: QdrantStore,
	) -> Self {
		Self { embedding, embedding_cfg, qdrant }
	}
}
impl VectorStore for QdrantVectorStore {
	fn search<'a>(&'a self, query: &'a str, top_k: u32) -> BoxFuture<'a, Result<Vec<Document>>> {
		Box::pin(async move {
			let texts = [query.to_string()];
			let vector = self
				.embedding
				.embed(&self.embedding_cfg, &texts)
				.await?
				.into_iter()
				.next()
				.ok_or_else(|| Error::Provider {
					message: "Embedding provider returned no vectors.".to_string(),
				})?;

			Ok(self.qdrant.search(vector, top_k).await?)
		})
	}
}

const PRUNE_THRESHOLD: usize = 1_024;

/// Process-local counters for deployments without Postgres. Each identity has its own lock.
///
/// Once more than `prune_threshold` identities are tracked, expired windows that no request is
/// currently using are dropped.
pub struct MemoryRateLimitStore {
	records: Mutex<HashMap<String, Arc<AsyncMutex<Option<RateLimitRecord>>>>>,
	prune_threshold: usize,
}
impl MemoryRateLimitStore {
	pub fn new() -> Self {
		Self::with_prune_threshold(PRUNE_THRESHOLD)
	}

	pub fn with_prune_threshold(prune_threshold: usize) -> Self {
		Self { records: Mutex::new(HashMap::new()), prune_threshold }
	}

	fn slot(
		&self,
		identity: &str,
		now: OffsetDateTime,
	) -> Arc<AsyncMutex<Option<RateLimitRecord>>> {
		let mut records = self.records.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

		if records.len() >= self.prune_threshold && !records.contains_key(identity) {
			let before = records.len();

			// Slots are only cloned under the map lock, so a count of one means no request holds
			// it.
			records.retain(|_, slot| {
				if Arc::strong_count(slot) > 1 {
					return true;
				}

				match slot.try_lock() {
					Ok(record) =>
						(*record).as_ref().is_some_and(|record| record.window_reset_at >= now),
					Err(_) => true,
				}
			});

			tracing::debug!(before, after = records.len(), "Pruned expired rate-limit windows.");
		}

		records.entry(identity.to_string()).or_default().clone()
	}
}
impl Default for MemoryRateLimitStore {
	fn default() -> Self {
		Self::new()
	}
}
impl RateLimitStore for MemoryRateLimitStore {
	fn admit<'a>(
		&'a self,
		identity: &'a str,
		policy: &'a RateLimitPolicy,
		now: OffsetDateTime,
	) -> BoxFuture<'a, Result<Admission>> {
		Box::pin(async move {
			let slot = self.slot(identity, now);
			let mut record = slot.lock().await;
			let (admission, next) = rate_limit::evaluate(record.as_ref(), policy, now);

			if let Some(next) = next {
				*record = Some(next);
			}

			Ok(admission)
		})
	}
}

pub struct PgRateLimitStore {
	pub db: Db,
}
impl PgRateLimitStore {
	pub fn new(db: Db) -> Self {
		Self { db }
	}
}
impl RateLimitStore for PgRateLimitStore {
	fn admit<'a>(
		&'a self,
		identity: &'a str,
		policy: &'a RateLimitPolicy,
		now: OffsetDateTime,
	) -> BoxFuture<'a, Result<Admission>> {
		Box::pin(async move { Ok(rate_limits::admit(&self.db.pool, identity, policy, now).await?) })
	}
}

/// Emits one summary event per session.
pub struct LogTraceSink;
impl TraceSink for LogTraceSink {
	fn persist<'a>(&'a self, trace: &'a SessionTrace) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			let duration_ms = trace
				.ended_at
				.map(|ended_at| (ended_at - trace.started_at).whole_milliseconds())
				.unwrap_or_default();

			tracing::info!(
				session_id = %trace.session_id,
				steps = trace.steps.len(),
				duration_ms,
				failed = trace.failed(),
				error = trace.error.as_deref().unwrap_or(""),
				"Session finished."
			);

			Ok(())
		})
	}
}

/// Writes the whole trace into `session_traces` and logs the summary.
pub struct PgTraceSink {
	pub db: Db,
}
impl PgTraceSink {
	pub fn new(db: Db) -> Self {
		Self { db }
	}
}
impl TraceSink for PgTraceSink {
	fn persist<'a>(&'a self, trace: &'a SessionTrace) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			let payload = serde_json::to_value(trace)
				.map_err(|err| Error::Trace { message: err.to_string() })?;
			let row = SessionTraceRow {
				session_id: trace.session_id,
				question: &trace.question,
				started_at: trace.started_at,
				ended_at: trace.ended_at.unwrap_or(trace.started_at),
				failed: trace.failed(),
				payload,
			};
			let inserted = traces::insert_session_trace(&self.db.pool, row).await?;

			if !inserted {
				tracing::warn!(session_id = %trace.session_id, "Session trace already stored.");
			}

			LogTraceSink.persist(trace).await
		})
	}
}

#[cfg(test)]
mod tests {
	use time::Duration;

	use super::*;

	#[tokio::test]
	async fn memory_store_counts_per_identity() {
		let store = MemoryRateLimitStore::new();
		let policy = RateLimitPolicy { window: Duration::hours(1), max_requests: 2 };
		let now = OffsetDateTime::now_utc();

		for expected in [1, 2] {
			let admission = store.admit("ala", &policy, now).await.expect("Admission.");

			assert_eq!(admission, Admission::Allowed { count: expected });
		}

		let denied = store.admit("ala", &policy, now).await.expect("Admission.");
		let other = store.admit("ola", &policy, now).await.expect("Admission.");

		assert!(!denied.is_allowed());
		assert_eq!(other, Admission::Allowed { count: 1 });
	}

	#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
	async fn concurrent_admissions_for_one_identity_lose_no_updates() {
		let store = Arc::new(MemoryRateLimitStore::new());
		let policy = RateLimitPolicy { window: Duration::hours(1), max_requests: 55 };
		let now = OffsetDateTime::now_utc();
		let tasks = (0..200)
			.map(|_| {
				let store = store.clone();

				tokio::spawn(async move { store.admit("ala", &policy, now).await })
			})
			.collect::<Vec<_>>();
		let mut counts = Vec::new();

		for task in tasks {
			if let Admission::Allowed { count } =
				task.await.expect("Admission task panicked.").expect("Admission.")
			{
				counts.push(count);
			}
		}

		counts.sort_unstable();

		assert_eq!(counts, (1..=55).collect::<Vec<_>>());
	}

	#[tokio::test]
	async fn expired_windows_are_pruned_past_the_threshold() {
		let store = MemoryRateLimitStore::with_prune_threshold(2);
		let policy = RateLimitPolicy { window: Duration::hours(1), max_requests: 5 };
		let now = OffsetDateTime::now_utc();

		store.admit("ala", &policy, now).await.expect("Admission.");
		store.admit("ola", &policy, now).await.expect("Admission.");

		let later = now + Duration::hours(2);
		let admission = store.admit("ela", &policy, later).await.expect("Admission.");
		let tracked = store.records.lock().expect("Lock.").keys().cloned().collect::<Vec<_>>();

		assert_eq!(admission, Admission::Allowed { count: 1 });
		assert_eq!(tracked, vec!["ela".to_string()]);

		let returning = store.admit("ala", &policy, later).await.expect("Admission.");

		assert_eq!(returning, Admission::Allowed { count: 1 });
	}

	#[tokio::test]
	async fn live_windows_survive_pruning() {
		let store = MemoryRateLimitStore::with_prune_threshold(1);
		let policy = RateLimitPolicy { window: Duration::hours(1), max_requests: 5 };
		let now = OffsetDateTime::now_utc();

		store.admit("ala", &policy, now).await.expect("Admission.");
		store.admit("ola", &policy, now + Duration::minutes(5)).await.expect("Admission.");

		let again =
			store.admit("ala", &policy, now + Duration::minutes(10)).await.expect("Admission.");

		assert_eq!(again, Admission::Allowed { count: 2 });
	}
}
