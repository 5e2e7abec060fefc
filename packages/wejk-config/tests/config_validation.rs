use std::{
	env, fs,
	path::PathBuf,
	sync::atomic::{AtomicU64, Ordering},
	time::{SystemTime, UNIX_EPOCH},
};

use toml::Value;

use wejk_config::{Config, Error};

const SAMPLE_CONFIG_TEMPLATE_TOML: &str = include_str!("fixtures/sample_config.template.toml");

fn sample_value() -> Value {
	toml::from_str(SAMPLE_CONFIG_TEMPLATE_TOML).expect("Failed to parse template config.")
}

fn sample_toml_with(section: &str, key: &str, value: Value) -> String {
	let mut root = sample_value();
	let table = root
		.as_table_mut()
		.expect("Template config must be a table.")
		.get_mut(section)
		.and_then(Value::as_table_mut)
		.unwrap_or_else(|| panic!("Template config must include [{section}]."));

	table.insert(key.to_string(), value);

	toml::to_string(&root).expect("Failed to render template config.")
}

fn write_temp_config(payload: String) -> PathBuf {
	static COUNTER: AtomicU64 = AtomicU64::new(0);

	let nanos = SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.expect("System time must be valid.")
		.as_nanos();
	let ordinal = COUNTER.fetch_add(1, Ordering::SeqCst);
	let pid = std::process::id();
	let mut path = env::temp_dir();

	path.push(format!("wejk_config_test_{nanos}_{pid}_{ordinal}.toml"));

	fs::write(&path, payload).expect("Failed to write test config.");

	path
}

fn load_payload(payload: String) -> wejk_config::Result<Config> {
	let path = write_temp_config(payload);
	let result = wejk_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	result
}

fn base_config() -> Config {
	toml::from_str(SAMPLE_CONFIG_TEMPLATE_TOML).expect("Failed to parse test config.")
}

#[test]
fn template_loads_and_normalizes_blank_vector_name() {
	let cfg = load_payload(SAMPLE_CONFIG_TEMPLATE_TOML.to_string())
		.expect("Expected template config to be valid.");

	assert_eq!(cfg.storage.qdrant.vector_name, None);
	assert_eq!(cfg.assistant.max_search_iterations, 2);
	assert_eq!(cfg.assistant.facts.len(), 3);
}

#[test]
fn rate_limit_defaults_apply_when_section_is_missing() {
	let mut root = sample_value();

	root.as_table_mut().expect("Template config must be a table.").remove("rate_limit");

	let payload = toml::to_string(&root).expect("Failed to render template config.");
	let cfg = load_payload(payload).expect("Expected config without rate_limit to be valid.");

	assert_eq!(cfg.rate_limit.window_seconds, 3_600);
	assert_eq!(cfg.rate_limit.max_requests, 55);
}

#[test]
fn postgres_section_is_optional() {
	let mut root = sample_value();
	let storage = root
		.as_table_mut()
		.and_then(|table| table.get_mut("storage"))
		.and_then(Value::as_table_mut)
		.expect("Template config must include [storage].");

	storage.remove("postgres");

	let payload = toml::to_string(&root).expect("Failed to render template config.");
	let cfg = load_payload(payload).expect("Expected config without postgres to be valid.");

	assert!(cfg.storage.postgres.is_none());
}

#[test]
fn max_search_iterations_is_bounded() {
	let payload = sample_toml_with("assistant", "max_search_iterations", Value::Integer(9));
	let err = load_payload(payload).expect_err("Expected iteration bound validation error.");

	assert!(
		err.to_string().contains("assistant.max_search_iterations must be in the range 0-5."),
		"Unexpected error: {err}"
	);
}

#[test]
fn planned_queries_must_be_between_one_and_three() {
	let payload = sample_toml_with("assistant", "max_planned_queries", Value::Integer(4));
	let err = load_payload(payload).expect_err("Expected planned query validation error.");

	assert!(
		err.to_string().contains("assistant.max_planned_queries must be in the range 1-3."),
		"Unexpected error: {err}"
	);
}

#[test]
fn continuation_policy_must_be_known() {
	let payload = sample_toml_with(
		"assistant",
		"continuation_policy",
		Value::String("confidence_below_70".to_string()),
	);
	let err = load_payload(payload).expect_err("Expected continuation policy validation error.");

	assert!(matches!(err, Error::Validation { .. }), "Unexpected error: {err}");
}

#[test]
fn rate_limited_message_requires_minutes_placeholder() {
	let payload = sample_toml_with(
		"assistant",
		"rate_limited_message",
		Value::String("Slow down.".to_string()),
	);
	let err = load_payload(payload).expect_err("Expected message validation error.");

	assert!(err.to_string().contains("{minutes}"), "Unexpected error: {err}");
}

#[test]
fn embedding_dimensions_must_match_vector_dim() {
	let mut cfg = base_config();

	cfg.storage.qdrant.vector_dim = 3_072;

	let err = wejk_config::validate(&cfg).expect_err("Expected dimension mismatch error.");

	assert!(
		err.to_string()
			.contains("providers.embedding.dimensions must match storage.qdrant.vector_dim."),
		"Unexpected error: {err}"
	);
}

#[test]
fn provider_api_keys_must_be_non_empty() {
	let mut cfg = base_config();

	cfg.providers.llm.api_key = "  ".to_string();

	let err = wejk_config::validate(&cfg).expect_err("Expected api key validation error.");

	assert_eq!(err.to_string(), "Provider llm api_key must be non-empty.");
}

#[test]
fn rate_limit_values_must_be_positive() {
	let mut cfg = base_config();

	cfg.rate_limit.max_requests = 0;

	let err = wejk_config::validate(&cfg).expect_err("Expected rate limit validation error.");

	assert!(
		err.to_string().contains("rate_limit.max_requests must be greater than zero."),
		"Unexpected error: {err}"
	);
}

#[test]
fn missing_file_reports_read_error() {
	let mut path = env::temp_dir();

	path.push("wejk_config_test_missing_file.toml");

	let err = wejk_config::load(&path).expect_err("Expected read error.");

	assert!(matches!(err, Error::ReadConfig { .. }), "Unexpected error: {err}");
}

#[test]
fn wejk_example_toml_is_valid() {
	let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));

	path.push("../../wejk.example.toml");

	wejk_config::load(&path).expect("Expected wejk.example.toml to be a valid config.");
}
