use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	pub search: Search,
	pub quantum: Quantum,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
}
impl Default for Service {
	fn default() -> Self {
		Self { http_bind: "127.0.0.1:8080".to_string(), log_level: "info".to_string() }
	}
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Storage {
	pub qdrant: Qdrant,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Qdrant {
	pub url: String,
	pub collection: String,
	pub vector_dim: u32,
}
impl Default for Qdrant {
	fn default() -> Self {
		Self {
			url: "http://127.0.0.1:6334".to_string(),
			collection: "pdf_documents".to_string(),
			vector_dim: 384,
		}
	}
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	pub timeout_ms: u64,
	pub default_headers: Map<String, Value>,
}
impl Default for EmbeddingProviderConfig {
	fn default() -> Self {
		Self {
			provider_id: "local".to_string(),
			api_base: "http://127.0.0.1:8081".to_string(),
			api_key: String::new(),
			path: "/v1/embeddings".to_string(),
			model: "sentence-transformers/all-MiniLM-L6-v2".to_string(),
			dimensions: 384,
			timeout_ms: 30_000,
			default_headers: Map::new(),
		}
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Search {
	pub default_top_k: u32,
	pub max_top_k: u32,
	pub similarity_threshold: f32,
	pub max_query_chars: u32,
}
impl Default for Search {
	fn default() -> Self {
		Self { default_top_k: 5, max_top_k: 20, similarity_threshold: 0.7, max_query_chars: 1_000 }
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Quantum {
	pub enabled: bool,
	pub boost_factor: f32,
	pub max_qubits: u32,
	pub iteration_cap: u32,
	/// Reported in statistics only; scoring never samples.
	pub shots: u32,
}
impl Default for Quantum {
	fn default() -> Self {
		Self { enabled: true, boost_factor: 2.0, max_qubits: 10, iteration_cap: 10, shots: 1_024 }
	}
}
impl Quantum {
	/// Largest candidate set the boost path will accept, `2^max_qubits`.
	pub fn max_candidates(&self) -> usize {
		1_usize << self.max_qubits
	}
}
