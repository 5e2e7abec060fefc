use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	pub assistant: Assistant,
	#[serde(default)]
	pub rate_limit: RateLimit,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Service {
	pub log_level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Storage {
	/// Optional. Without it, rate-limit records live in process memory and session traces are
	/// only logged.
	pub postgres: Option<Postgres>,
	pub qdrant: Qdrant,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Qdrant {
	pub url: String,
	pub collection: String,
	pub vector_dim: u32,
	/// Named dense vector to query. Unset for collections with a single unnamed vector.
	pub vector_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
	pub llm: LlmProviderConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub temperature: f32,
	#[serde(default = "default_max_tokens")]
	pub max_tokens: u32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Assistant {
	pub name: String,
	pub domain_description: String,
	#[serde(default)]
	pub facts: Vec<String>,
	#[serde(default = "default_max_search_iterations")]
	pub max_search_iterations: u32,
	#[serde(default = "default_top_k")]
	pub top_k: u32,
	#[serde(default = "default_max_planned_queries")]
	pub max_planned_queries: u32,
	/// One of `require_both` or `either_signal`.
	#[serde(default = "default_continuation_policy")]
	pub continuation_policy: String,
	#[serde(default = "default_apology_message")]
	pub apology_message: String,
	#[serde(default = "default_missing_identity_message")]
	pub missing_identity_message: String,
	/// Must contain a `{minutes}` placeholder.
	#[serde(default = "default_rate_limited_message")]
	pub rate_limited_message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimit {
	pub window_seconds: u64,
	pub max_requests: u32,
}
impl Default for RateLimit {
	fn default() -> Self {
		Self { window_seconds: 3_600, max_requests: 55 }
	}
}

fn default_max_tokens() -> u32 {
	4_000
}

fn default_max_search_iterations() -> u32 {
	2
}

fn default_top_k() -> u32 {
	3
}

fn default_max_planned_queries() -> u32 {
	3
}

fn default_continuation_policy() -> String {
	"require_both".to_string()
}

fn default_apology_message() -> String {
	"Sorry, something went wrong while processing your question.".to_string()
}

fn default_missing_identity_message() -> String {
	"Sorry, I could not identify you, so I cannot answer right now.".to_string()
}

fn default_rate_limited_message() -> String {
	"You have asked a lot of questions recently. Please try again in {minutes} minutes."
		.to_string()
}
