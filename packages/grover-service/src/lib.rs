pub mod delete;
pub mod index;
pub mod search;
pub mod similar;
pub mod stats;

mod error;

use std::{collections::HashMap, future::Future, pin::Pin, sync::Arc};

use qdrant_client::qdrant::{Condition, Filter};
use uuid::Uuid;

pub use delete::DeleteDocumentResponse;
pub use error::{Error, Result};
use grover_config::{Config, EmbeddingProviderConfig};
use grover_providers::embedding;
use grover_storage::{
	models::{ChunkRecord, ScoredChunkRecord},
	qdrant::QdrantStore,
};
pub use index::{IndexChunk, IndexDocumentRequest, IndexDocumentResponse, chunk_id};
pub use search::{SearchHit, SearchMetadata, SearchRequest, SearchResponse};
pub use similar::{SimilarDocumentsResponse, SimilarHit};
pub use stats::{
	CapabilityStats, EmbeddingStats, QuantumStats, SearchStatsResponse, VectorStoreStats,
};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>>;
}

/// Seam over the chunk collection. The default implementation talks to
/// Qdrant; tests swap in an in-memory index.
pub trait VectorIndex
where
	Self: Send + Sync,
{
	fn count<'a>(&'a self) -> BoxFuture<'a, color_eyre::Result<u64>>;

	fn count_document<'a>(
		&'a self,
		document_id: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<u64>>;

	/// Nearest-neighbor search; `filter` entries must match the stored
	/// metadata fields exactly.
	fn search<'a>(
		&'a self,
		vector: Vec<f32>,
		limit: u64,
		filter: Option<&'a HashMap<String, String>>,
	) -> BoxFuture<'a, color_eyre::Result<Vec<ScoredChunkRecord>>>;

	fn fetch<'a>(&'a self, id: Uuid) -> BoxFuture<'a, color_eyre::Result<Option<ChunkRecord>>>;

	fn fetch_all<'a>(&'a self) -> BoxFuture<'a, color_eyre::Result<Vec<ChunkRecord>>>;

	fn upsert<'a>(&'a self, records: Vec<ChunkRecord>) -> BoxFuture<'a, color_eyre::Result<()>>;

	fn delete_by_document<'a>(
		&'a self,
		document_id: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<()>>;
}

#[derive(Clone)]
pub struct Providers {
	pub embedding: Arc<dyn EmbeddingProvider>,
}

pub struct GroverService {
	pub cfg: Config,
	pub index: Arc<dyn VectorIndex>,
	pub providers: Providers,
}

struct DefaultProviders;

struct DefaultVectorIndex {
	store: QdrantStore,
}

impl EmbeddingProvider for DefaultProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>> {
		Box::pin(embedding::embed(cfg, texts))
	}
}

impl VectorIndex for DefaultVectorIndex {
	fn count<'a>(&'a self) -> BoxFuture<'a, color_eyre::Result<u64>> {
		Box::pin(async move { Ok(self.store.count().await?) })
	}

	fn count_document<'a>(
		&'a self,
		document_id: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<u64>> {
		Box::pin(async move { Ok(self.store.count_document(document_id).await?) })
	}

	fn search<'a>(
		&'a self,
		vector: Vec<f32>,
		limit: u64,
		filter: Option<&'a HashMap<String, String>>,
	) -> BoxFuture<'a, color_eyre::Result<Vec<ScoredChunkRecord>>> {
		Box::pin(async move {
			let filter = filter.and_then(metadata_filter);

			Ok(self.store.search(vector, limit, filter).await?)
		})
	}

	fn fetch<'a>(&'a self, id: Uuid) -> BoxFuture<'a, color_eyre::Result<Option<ChunkRecord>>> {
		Box::pin(async move { Ok(self.store.fetch(id).await?) })
	}

	fn fetch_all<'a>(&'a self) -> BoxFuture<'a, color_eyre::Result<Vec<ChunkRecord>>> {
		Box::pin(async move { Ok(self.store.fetch_all().await?) })
	}

	fn upsert<'a>(&'a self, records: Vec<ChunkRecord>) -> BoxFuture<'a, color_eyre::Result<()>> {
		Box::pin(async move { Ok(self.store.upsert(&records).await?) })
	}

	fn delete_by_document<'a>(
		&'a self,
		document_id: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<()>> {
		Box::pin(async move { Ok(self.store.delete_by_document(document_id).await?) })
	}
}

impl Providers {
	pub fn new(embedding: Arc<dyn EmbeddingProvider>) -> Self {
		Self { embedding }
	}
}

impl Default for Providers {
	fn default() -> Self {
		Self { embedding: Arc::new(DefaultProviders) }
	}
}

impl GroverService {
	pub fn new(cfg: Config, store: QdrantStore) -> Self {
		Self { cfg, index: Arc::new(DefaultVectorIndex { store }), providers: Providers::default() }
	}

	pub fn with_providers(cfg: Config, index: Arc<dyn VectorIndex>, providers: Providers) -> Self {
		Self { cfg, index, providers }
	}
}

/// Store-side filter for the classical path; every entry becomes an exact
/// keyword match on the nested metadata field.
fn metadata_filter(filter: &HashMap<String, String>) -> Option<Filter> {
	if filter.is_empty() {
		return None;
	}

	let conditions = filter
		.iter()
		.map(|(key, value)| Condition::matches(format!("metadata.{key}"), value.clone()))
		.collect::<Vec<_>>();

	Some(Filter::must(conditions))
}
