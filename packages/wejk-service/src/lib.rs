pub mod answer;
pub mod classifier;
pub mod contracts;
pub mod critique;
pub mod orchestrator;
pub mod planner;
pub mod prompts;
pub mod quick;
pub mod rate_limit;
pub mod rerank;
pub mod retriever;
pub mod stores;
pub mod tracer;

mod error;

pub use error::{Error, Result};
pub use orchestrator::{AskHandles, AskOutcome, AskRequest, Orchestrator};
pub use rate_limit::{RateLimiter, Rejection, RejectionReason};
pub use stores::{
	LogTraceSink, MemoryRateLimitStore, PgRateLimitStore, PgTraceSink, QdrantVectorStore,
};
pub use tracer::{SessionTrace, SessionTracer, TraceStep};

use std::{future::Future, pin::Pin, sync::Arc};

use serde_json::Value;
use time::OffsetDateTime;

use wejk_config::{EmbeddingProviderConfig, LlmProviderConfig};
use wejk_domain::{
	contract::OutputContract,
	documents::Document,
	rate_limit::{Admission, RateLimitPolicy},
};
use wejk_providers::{completion, embedding};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Structured text generation. The returned value is the raw JSON object; callers decode it
/// against `contract`.
pub trait CompletionService
where
	Self: Send + Sync,
{
	fn complete<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		messages: &'a [Value],
		contract: &'a OutputContract,
	) -> BoxFuture<'a, Result<Value>>;
}

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, Result<Vec<Vec<f32>>>>;
}

/// Top-k similarity search, best match first.
pub trait VectorStore
where
	Self: Send + Sync,
{
	fn search<'a>(&'a self, query: &'a str, top_k: u32) -> BoxFuture<'a, Result<Vec<Document>>>;
}

/// Durable per-identity counters. Implementations serialize the read-modify-write for one
/// identity and leave other identities unblocked.
pub trait RateLimitStore
where
	Self: Send + Sync,
{
	fn admit<'a>(
		&'a self,
		identity: &'a str,
		policy: &'a RateLimitPolicy,
		now: OffsetDateTime,
	) -> BoxFuture<'a, Result<Admission>>;
}

pub trait TraceSink
where
	Self: Send + Sync,
{
	fn persist<'a>(&'a self, trace: &'a SessionTrace) -> BoxFuture<'a, Result<()>>;
}

#[derive(Clone)]
pub struct Providers {
	pub completion: Arc<dyn CompletionService>,
	pub vector_store: Arc<dyn VectorStore>,
	pub rate_limits: Arc<dyn RateLimitStore>,
	pub traces: Arc<dyn TraceSink>,
}
impl Providers {
	pub fn new(
		completion: Arc<dyn CompletionService>,
		vector_store: Arc<dyn VectorStore>,
		rate_limits: Arc<dyn RateLimitStore>,
		traces: Arc<dyn TraceSink>,
	) -> Self {
		Self { completion, vector_store, rate_limits, traces }
	}
}

/// HTTP-backed completion and embedding calls.
pub struct DefaultProviders;
impl CompletionService for DefaultProviders {
	fn complete<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		messages: &'a [Value],
		contract: &'a OutputContract,
	) -> BoxFuture<'a, Result<Value>> {
		Box::pin(async move {
			let schema = contract.json_schema();

			Ok(completion::complete(cfg, messages, contract.name, &schema).await?)
		})
	}
}

impl EmbeddingProvider for DefaultProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, Result<Vec<Vec<f32>>>> {
		Box::pin(async move { Ok(embedding::embed(cfg, texts).await?) })
	}
}

/// Runs one completion and decodes it against `contract`.
///
/// Malformed output is a hard failure of the call and is never retried here.
pub(crate) async fn request_structured<T>(
	completion: &dyn CompletionService,
	cfg: &LlmProviderConfig,
	contract: &OutputContract,
	messages: &[Value],
) -> Result<T>
where
	T: serde::de::DeserializeOwned,
{
	let raw = completion.complete(cfg, messages, contract).await?;

	Ok(contract.decode(raw)?)
}
