//! Test doubles and fixtures for exercising the retrieval pipeline without
//! external backends.

use std::{collections::HashMap, env, sync::RwLock};

use color_eyre::eyre::eyre;
use serde_json::{Value, json};
use time::OffsetDateTime;
use uuid::Uuid;

use grover_config::{Config, EmbeddingProviderConfig};
use grover_service::{BoxFuture, EmbeddingProvider, VectorIndex, chunk_id};
use grover_storage::models::{ChunkRecord, ScoredChunkRecord};

pub fn env_qdrant_url() -> Option<String> {
	env::var("GROVER_QDRANT_URL").ok()
}

/// Default config shrunk to a test-sized embedding dimension.
pub fn test_config(vector_dim: u32) -> Config {
	let mut cfg = Config::default();

	cfg.storage.qdrant.vector_dim = vector_dim;
	cfg.providers.embedding.dimensions = vector_dim;
	cfg.providers.embedding.api_key = "test-key".to_string();

	cfg
}

pub fn chunk(document_id: &str, chunk_index: u32, text: &str, vector: Vec<f32>) -> ChunkRecord {
	chunk_with_metadata(document_id, chunk_index, text, vector, json!({}))
}

pub fn chunk_with_metadata(
	document_id: &str,
	chunk_index: u32,
	text: &str,
	vector: Vec<f32>,
	metadata: Value,
) -> ChunkRecord {
	ChunkRecord {
		id: chunk_id(document_id, chunk_index),
		document_id: document_id.to_string(),
		chunk_index,
		text: text.to_string(),
		metadata,
		vector,
		indexed_at: OffsetDateTime::now_utc(),
	}
}

/// Embedding double that returns pre-registered vectors by exact text.
/// Unregistered texts embed to the zero vector.
pub struct StaticEmbedding {
	vectors: HashMap<String, Vec<f32>>,
	dimensions: usize,
}
impl StaticEmbedding {
	pub fn new(dimensions: usize) -> Self {
		Self { vectors: HashMap::new(), dimensions }
	}

	pub fn with_vector(mut self, text: &str, vector: Vec<f32>) -> Self {
		self.vectors.insert(text.to_string(), vector);

		self
	}
}
impl EmbeddingProvider for StaticEmbedding {
	fn embed<'a>(
		&'a self,
		_cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>> {
		Box::pin(async move {
			Ok(texts
				.iter()
				.map(|text| {
					self.vectors.get(text).cloned().unwrap_or_else(|| vec![0.0; self.dimensions])
				})
				.collect())
		})
	}
}

/// Embedding double whose every call fails.
pub struct FailingEmbedding;
impl EmbeddingProvider for FailingEmbedding {
	fn embed<'a>(
		&'a self,
		_cfg: &'a EmbeddingProviderConfig,
		_texts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>> {
		Box::pin(async move { Err(eyre!("Embedding backend offline.")) })
	}
}

/// Vector index backed by a plain vec, kept in insertion order so scroll
/// order and rank tie-breaks stay deterministic across runs.
#[derive(Default)]
pub struct InMemoryIndex {
	records: RwLock<Vec<ChunkRecord>>,
}
impl InMemoryIndex {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_records(records: Vec<ChunkRecord>) -> Self {
		Self { records: RwLock::new(records) }
	}

	/// Snapshot of the stored records, in insertion order.
	pub fn records(&self) -> Vec<ChunkRecord> {
		self.records.read().unwrap_or_else(|err| err.into_inner()).clone()
	}
}
impl VectorIndex for InMemoryIndex {
	fn count<'a>(&'a self) -> BoxFuture<'a, color_eyre::Result<u64>> {
		Box::pin(async move {
			Ok(self.records.read().unwrap_or_else(|err| err.into_inner()).len() as u64)
		})
	}

	fn count_document<'a>(
		&'a self,
		document_id: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<u64>> {
		Box::pin(async move {
			let records = self.records.read().unwrap_or_else(|err| err.into_inner());

			Ok(records.iter().filter(|record| record.document_id == document_id).count() as u64)
		})
	}

	fn search<'a>(
		&'a self,
		vector: Vec<f32>,
		limit: u64,
		filter: Option<&'a HashMap<String, String>>,
	) -> BoxFuture<'a, color_eyre::Result<Vec<ScoredChunkRecord>>> {
		Box::pin(async move {
			let records = self.records.read().unwrap_or_else(|err| err.into_inner());
			let mut hits = records
				.iter()
				.filter(|record| keyword_filter_matches(&record.metadata, filter))
				.map(|record| ScoredChunkRecord {
					record: record.clone(),
					score: grover_domain::cosine_similarity(&vector, &record.vector)
						.map_or(0.0, |score| score),
				})
				.collect::<Vec<_>>();

			hits.sort_by(|a, b| grover_domain::cmp_f32_desc(a.score, b.score));
			hits.truncate(limit as usize);

			Ok(hits)
		})
	}

	fn fetch<'a>(&'a self, id: Uuid) -> BoxFuture<'a, color_eyre::Result<Option<ChunkRecord>>> {
		Box::pin(async move {
			let records = self.records.read().unwrap_or_else(|err| err.into_inner());

			Ok(records.iter().find(|record| record.id == id).cloned())
		})
	}

	fn fetch_all<'a>(&'a self) -> BoxFuture<'a, color_eyre::Result<Vec<ChunkRecord>>> {
		Box::pin(async move { Ok(self.records()) })
	}

	fn upsert<'a>(&'a self, records: Vec<ChunkRecord>) -> BoxFuture<'a, color_eyre::Result<()>> {
		Box::pin(async move {
			let mut stored = self.records.write().unwrap_or_else(|err| err.into_inner());

			for record in records {
				match stored.iter_mut().find(|existing| existing.id == record.id) {
					Some(existing) => *existing = record,
					None => stored.push(record),
				}
			}

			Ok(())
		})
	}

	fn delete_by_document<'a>(
		&'a self,
		document_id: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<()>> {
		Box::pin(async move {
			let mut stored = self.records.write().unwrap_or_else(|err| err.into_inner());

			stored.retain(|record| record.document_id != document_id);

			Ok(())
		})
	}
}

/// Index wrapper that injects failures per operation while delegating the
/// rest to an in-memory index.
#[derive(Default)]
pub struct FaultyIndex {
	pub inner: InMemoryIndex,
	pub fail_count: bool,
	pub fail_search: bool,
	pub fail_fetch_all: bool,
}
impl VectorIndex for FaultyIndex {
	fn count<'a>(&'a self) -> BoxFuture<'a, color_eyre::Result<u64>> {
		if self.fail_count {
			return Box::pin(async { Err(eyre!("Injected index failure.")) });
		}

		self.inner.count()
	}

	fn count_document<'a>(
		&'a self,
		document_id: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<u64>> {
		self.inner.count_document(document_id)
	}

	fn search<'a>(
		&'a self,
		vector: Vec<f32>,
		limit: u64,
		filter: Option<&'a HashMap<String, String>>,
	) -> BoxFuture<'a, color_eyre::Result<Vec<ScoredChunkRecord>>> {
		if self.fail_search {
			return Box::pin(async { Err(eyre!("Injected index failure.")) });
		}

		self.inner.search(vector, limit, filter)
	}

	fn fetch<'a>(&'a self, id: Uuid) -> BoxFuture<'a, color_eyre::Result<Option<ChunkRecord>>> {
		self.inner.fetch(id)
	}

	fn fetch_all<'a>(&'a self) -> BoxFuture<'a, color_eyre::Result<Vec<ChunkRecord>>> {
		if self.fail_fetch_all {
			return Box::pin(async { Err(eyre!("Injected index failure.")) });
		}

		self.inner.fetch_all()
	}

	fn upsert<'a>(&'a self, records: Vec<ChunkRecord>) -> BoxFuture<'a, color_eyre::Result<()>> {
		self.inner.upsert(records)
	}

	fn delete_by_document<'a>(
		&'a self,
		document_id: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<()>> {
		self.inner.delete_by_document(document_id)
	}
}

fn keyword_filter_matches(metadata: &Value, filter: Option<&HashMap<String, String>>) -> bool {
	let Some(filter) = filter else {
		return true;
	};

	filter
		.iter()
		.all(|(key, expected)| metadata.get(key).and_then(Value::as_str) == Some(expected.as_str()))
}
