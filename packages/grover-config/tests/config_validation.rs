use std::{
	env, fs,
	path::PathBuf,
	sync::atomic::{AtomicU64, Ordering},
	time::{SystemTime, UNIX_EPOCH},
};

use toml::Value;

const SAMPLE_CONFIG_TEMPLATE_TOML: &str = include_str!("fixtures/sample_config.template.toml");

fn sample_toml() -> String {
	SAMPLE_CONFIG_TEMPLATE_TOML.to_string()
}

fn sample_toml_with(path: &[&str], value: Value) -> String {
	let mut root: Value =
		toml::from_str(SAMPLE_CONFIG_TEMPLATE_TOML).expect("Failed to parse template config.");
	let (last, tables) = path.split_last().expect("Override path must be non-empty.");
	let mut table = root.as_table_mut().expect("Template config must be a table.");

	for key in tables {
		table = table
			.get_mut(*key)
			.and_then(Value::as_table_mut)
			.unwrap_or_else(|| panic!("Template config must include [{key}]."));
	}

	table.insert((*last).to_string(), value);

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

	path.push(format!("grover_config_test_{nanos}_{pid}_{ordinal}.toml"));

	fs::write(&path, payload).expect("Failed to write test config.");

	path
}

fn load_payload(payload: String) -> grover_config::Result<grover_config::Config> {
	let path = write_temp_config(payload);
	let result = grover_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	result
}

fn expect_validation_message(payload: String, needle: &str) {
	let err = load_payload(payload).expect_err("Expected validation error.");
	let message = err.to_string();

	assert!(message.contains(needle), "Unexpected error message: {message}");
}

#[test]
fn template_config_loads() {
	let cfg = load_payload(sample_toml()).expect("Expected template config to load.");

	assert_eq!(cfg.search.default_top_k, 5);
	assert_eq!(cfg.search.similarity_threshold, 0.7);
	assert_eq!(cfg.quantum.max_qubits, 10);
	assert_eq!(cfg.quantum.max_candidates(), 1_024);
}

#[test]
fn partial_config_fills_defaults() {
	let payload = "[providers.embedding]\napi_key = \"test-key\"\n".to_string();
	let cfg = load_payload(payload).expect("Expected partial config to load.");

	assert_eq!(cfg.service.http_bind, "127.0.0.1:8080");
	assert_eq!(cfg.storage.qdrant.collection, "pdf_documents");
	assert_eq!(cfg.quantum.boost_factor, 2.0);
	assert_eq!(cfg.quantum.iteration_cap, 10);
	assert_eq!(cfg.quantum.shots, 1_024);
	assert!(cfg.quantum.enabled);
}

#[test]
fn api_base_trailing_slash_is_normalized() {
	let payload = sample_toml_with(
		&["providers", "embedding", "api_base"],
		Value::String("http://127.0.0.1:8081/".to_string()),
	);
	let cfg = load_payload(payload).expect("Expected config to load.");

	assert_eq!(cfg.providers.embedding.api_base, "http://127.0.0.1:8081");
}

#[test]
fn embedding_dimensions_must_match_vector_dim() {
	let payload = sample_toml_with(&["providers", "embedding", "dimensions"], Value::Integer(768));

	expect_validation_message(
		payload,
		"providers.embedding.dimensions must match storage.qdrant.vector_dim.",
	);
}

#[test]
fn api_key_must_be_non_empty() {
	let payload =
		sample_toml_with(&["providers", "embedding", "api_key"], Value::String("  ".to_string()));

	expect_validation_message(payload, "providers.embedding.api_key must be non-empty.");
}

#[test]
fn similarity_threshold_must_be_in_range() {
	let payload = sample_toml_with(&["search", "similarity_threshold"], Value::Float(1.5));

	expect_validation_message(payload, "search.similarity_threshold must be in the range 0.0-1.0.");
}

#[test]
fn similarity_threshold_must_be_finite() {
	let payload = sample_toml_with(&["search", "similarity_threshold"], Value::Float(f64::NAN));

	expect_validation_message(payload, "search.similarity_threshold must be a finite number.");
}

#[test]
fn boost_factor_must_be_non_negative() {
	let payload = sample_toml_with(&["quantum", "boost_factor"], Value::Float(-0.5));

	expect_validation_message(payload, "quantum.boost_factor must be zero or greater.");
}

#[test]
fn max_qubits_must_be_in_range() {
	for out_of_range in [0_i64, 31] {
		let payload = sample_toml_with(&["quantum", "max_qubits"], Value::Integer(out_of_range));

		expect_validation_message(payload, "quantum.max_qubits must be in the range 1-30.");
	}
}

#[test]
fn iteration_cap_must_be_positive() {
	let payload = sample_toml_with(&["quantum", "iteration_cap"], Value::Integer(0));

	expect_validation_message(payload, "quantum.iteration_cap must be greater than zero.");
}

#[test]
fn max_top_k_must_cover_default_top_k() {
	let payload = sample_toml_with(&["search", "max_top_k"], Value::Integer(3));

	expect_validation_message(payload, "search.max_top_k must be search.default_top_k or greater.");
}

#[test]
fn missing_config_file_is_reported() {
	let mut path = env::temp_dir();

	path.push("grover_config_test_missing.toml");

	let err = grover_config::load(&path).expect_err("Expected read error.");

	assert!(matches!(err, grover_config::Error::ReadConfig { .. }));
}
