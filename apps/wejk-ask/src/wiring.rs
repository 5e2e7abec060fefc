use std::sync::Arc;

use wejk_config::Config;
use wejk_service::{
	DefaultProviders, LogTraceSink, MemoryRateLimitStore, Orchestrator, PgRateLimitStore,
	PgTraceSink, Providers, QdrantVectorStore, RateLimitStore, TraceSink,
};
use wejk_storage::{db::Db, qdrant::QdrantStore};

/// Connects the real adapters. Without Postgres, rate limits stay in memory and traces are only
/// logged.
pub async fn orchestrator(config: Config) -> color_eyre::Result<Orchestrator> {
	let (rate_limits, traces): (Arc<dyn RateLimitStore>, Arc<dyn TraceSink>) =
		match &config.storage.postgres {
			Some(postgres) => {
				let db = Db::connect(postgres).await?;

				db.ensure_schema().await?;

				(Arc::new(PgRateLimitStore::new(db.clone())), Arc::new(PgTraceSink::new(db)))
			},
			None => {
				tracing::warn!("No Postgres configured. Rate limits are kept in process memory.");

				(Arc::new(MemoryRateLimitStore::new()), Arc::new(LogTraceSink))
			},
		};
	let qdrant = QdrantStore::new(&config.storage.qdrant)?;
	let vector_store = QdrantVectorStore::new(
		Arc::new(DefaultProviders),
		config.providers.embedding.clone(),
		qdrant,
	);
	let providers =
		Providers::new(Arc::new(DefaultProviders), Arc::new(vector_store), rate_limits, traces);

	Ok(Orchestrator::new(config, providers))
}
