use std::{
	env, fs,
	path::PathBuf,
	sync::atomic::{AtomicU64, Ordering},
	time::{SystemTime, UNIX_EPOCH},
};

use rust_decimal::Decimal;
use toml::Value;

use tally_config::Config;

const SAMPLE_CONFIG_TEMPLATE_TOML: &str = include_str!("fixtures/sample_config.template.toml");

fn sample_toml_with(section: &str, key: &str, value: Value) -> String {
	let mut root: Value =
		toml::from_str(SAMPLE_CONFIG_TEMPLATE_TOML).expect("Failed to parse template config.");
	let mut table = root.as_table_mut().expect("Template config must be a table.");

	for part in section.split('.') {
		table = table
			.get_mut(part)
			.and_then(Value::as_table_mut)
			.unwrap_or_else(|| panic!("Template config must include [{section}]."));
	}

	table.insert(key.to_string(), value);

	toml::to_string(&root).expect("Failed to render template config.")
}

fn sample_toml_without(section: &str) -> String {
	let mut root: Value =
		toml::from_str(SAMPLE_CONFIG_TEMPLATE_TOML).expect("Failed to parse template config.");

	root.as_table_mut().expect("Template config must be a table.").remove(section);

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

	path.push(format!("tally_config_test_{nanos}_{pid}_{ordinal}.toml"));

	fs::write(&path, payload).expect("Failed to write test config.");

	path
}

fn load_payload(payload: String) -> tally_config::Result<Config> {
	let path = write_temp_config(payload);
	let result = tally_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	result
}

fn base_config() -> Config {
	toml::from_str(SAMPLE_CONFIG_TEMPLATE_TOML).expect("Failed to parse test config.")
}

#[test]
fn sample_config_loads() {
	let cfg = load_payload(SAMPLE_CONFIG_TEMPLATE_TOML.to_string())
		.expect("Expected sample config to load.");

	assert_eq!(cfg.retrieval.top_k, 10);
	assert_eq!(cfg.providers.retry.max_attempts, 3);
	assert_eq!(cfg.audit.total_tolerance, Decimal::new(100, 2));
	assert_eq!(
		cfg.resolver.reference_date.as_deref().and_then(tally_config::parse_reference_date),
		Some(time::macros::date!(2023 - 12 - 31))
	);
}

#[test]
fn optional_sections_fall_back_to_defaults() {
	let payload = sample_toml_without("retrieval");
	let cfg = load_payload(payload).expect("Expected config without [retrieval] to load.");

	assert_eq!(cfg.retrieval.top_k, 10);
	assert_eq!(cfg.retrieval.aggregation_top_k, 200);
	assert!(cfg.retrieval.widen_on_empty);
}

#[test]
fn blank_reference_date_is_normalized_away() {
	let payload = sample_toml_with("resolver", "reference_date", Value::String("  ".to_string()));
	let cfg = load_payload(payload).expect("Expected blank reference_date to load.");

	assert!(cfg.resolver.reference_date.is_none());
}

#[test]
fn reference_date_must_parse() {
	let payload =
		sample_toml_with("resolver", "reference_date", Value::String("12/31/2023".to_string()));
	let err = load_payload(payload).expect_err("Expected reference_date validation error.");

	assert!(
		err.to_string().contains("resolver.reference_date must be a YYYY-MM-DD date."),
		"Unexpected error: {err}"
	);
}

#[test]
fn embedding_dimensions_must_match_vector_dim() {
	let payload = sample_toml_with("providers.embedding", "dimensions", Value::Integer(768));
	let err = load_payload(payload).expect_err("Expected dimension validation error.");

	assert!(
		err.to_string()
			.contains("providers.embedding.dimensions must match storage.qdrant.vector_dim."),
		"Unexpected error: {err}"
	);
}

#[test]
fn merchant_threshold_must_be_in_range() {
	let mut cfg = base_config();

	cfg.resolver.merchant_threshold = 0.0;

	let err = tally_config::validate(&cfg).expect_err("Expected threshold validation error.");

	assert!(
		err.to_string().contains("resolver.merchant_threshold must be in the range (0.0, 1.0]."),
		"Unexpected error: {err}"
	);

	cfg.resolver.merchant_threshold = 1.0;

	assert!(tally_config::validate(&cfg).is_ok());
}

#[test]
fn aggregation_top_k_cannot_be_smaller_than_top_k() {
	let mut cfg = base_config();

	cfg.retrieval.top_k = 50;
	cfg.retrieval.aggregation_top_k = 20;

	let err = tally_config::validate(&cfg).expect_err("Expected top_k validation error.");

	assert!(
		err.to_string().contains("retrieval.aggregation_top_k must be at least retrieval.top_k."),
		"Unexpected error: {err}"
	);
}

#[test]
fn retry_backoff_bounds_are_ordered() {
	let mut cfg = base_config();

	cfg.providers.retry.base_backoff_ms = 5_000;

	let err = tally_config::validate(&cfg).expect_err("Expected backoff validation error.");

	assert!(
		err.to_string().contains("providers.retry.base_backoff_ms must be less than or equal to"),
		"Unexpected error: {err}"
	);
}

#[test]
fn api_keys_must_be_present() {
	let payload = sample_toml_with("providers.llm", "api_key", Value::String(" ".to_string()));
	let err = load_payload(payload).expect_err("Expected api_key validation error.");

	assert!(
		err.to_string().contains("Provider llm api_key must be non-empty."),
		"Unexpected error: {err}"
	);
}

#[test]
fn negative_tolerance_is_rejected() {
	let mut cfg = base_config();

	cfg.audit.total_tolerance = Decimal::new(-1, 2);

	let err = tally_config::validate(&cfg).expect_err("Expected tolerance validation error.");

	assert!(
		err.to_string().contains("audit.total_tolerance must be zero or greater."),
		"Unexpected error: {err}"
	);
}
