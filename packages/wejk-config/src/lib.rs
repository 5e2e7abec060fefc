mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Assistant, Config, EmbeddingProviderConfig, LlmProviderConfig, Postgres, Providers, Qdrant,
	RateLimit, Service, Storage,
};

use std::{fs, path::Path};

pub const CONTINUATION_POLICIES: [&str; 2] = ["require_both", "either_signal"];

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.storage.qdrant.collection.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.qdrant.collection must be non-empty.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions == 0 {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions != cfg.storage.qdrant.vector_dim {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must match storage.qdrant.vector_dim."
				.to_string(),
		});
	}
	if !cfg.providers.llm.temperature.is_finite() || cfg.providers.llm.temperature < 0.0 {
		return Err(Error::Validation {
			message: "providers.llm.temperature must be a finite number, zero or greater."
				.to_string(),
		});
	}

	for (label, key) in
		[("embedding", &cfg.providers.embedding.api_key), ("llm", &cfg.providers.llm.api_key)]
	{
		if key.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("Provider {label} api_key must be non-empty."),
			});
		}
	}

	if let Some(postgres) = cfg.storage.postgres.as_ref()
		&& postgres.pool_max_conns == 0
	{
		return Err(Error::Validation {
			message: "storage.postgres.pool_max_conns must be greater than zero.".to_string(),
		});
	}

	let assistant = &cfg.assistant;

	if assistant.name.trim().is_empty() {
		return Err(Error::Validation { message: "assistant.name must be non-empty.".to_string() });
	}
	if assistant.max_search_iterations > 5 {
		return Err(Error::Validation {
			message: "assistant.max_search_iterations must be in the range 0-5.".to_string(),
		});
	}
	if assistant.top_k == 0 {
		return Err(Error::Validation {
			message: "assistant.top_k must be greater than zero.".to_string(),
		});
	}
	if !(1..=3).contains(&assistant.max_planned_queries) {
		return Err(Error::Validation {
			message: "assistant.max_planned_queries must be in the range 1-3.".to_string(),
		});
	}
	if !CONTINUATION_POLICIES.contains(&assistant.continuation_policy.as_str()) {
		return Err(Error::Validation {
			message: "assistant.continuation_policy must be one of require_both or either_signal."
				.to_string(),
		});
	}
	if !assistant.rate_limited_message.contains("{minutes}") {
		return Err(Error::Validation {
			message: "assistant.rate_limited_message must contain a {minutes} placeholder."
				.to_string(),
		});
	}
	if cfg.rate_limit.window_seconds == 0 {
		return Err(Error::Validation {
			message: "rate_limit.window_seconds must be greater than zero.".to_string(),
		});
	}
	if cfg.rate_limit.max_requests == 0 {
		return Err(Error::Validation {
			message: "rate_limit.max_requests must be greater than zero.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	if cfg.storage.qdrant.vector_name.as_deref().map(|name| name.trim().is_empty()).unwrap_or(false)
	{
		cfg.storage.qdrant.vector_name = None;
	}

	cfg.assistant.facts.retain(|fact| !fact.trim().is_empty());
}
