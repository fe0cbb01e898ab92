use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

use grover_storage::models::ChunkRecord;

use crate::{Error, GroverService, Result};

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct IndexDocumentRequest {
	pub document_id: String,
	pub chunks: Vec<IndexChunk>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct IndexChunk {
	pub text: String,
	#[serde(default)]
	pub metadata: Value,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct IndexDocumentResponse {
	pub document_id: String,
	pub chunks_indexed: usize,
	pub total_chunks: u64,
}

impl GroverService {
	/// Embeds the chunks of one document and upserts them into the index.
	/// Chunk ids are deterministic, so re-indexing a document replaces its
	/// previous points.
	pub async fn index_document(
		&self,
		req: IndexDocumentRequest,
	) -> Result<IndexDocumentResponse> {
		let document_id = req.document_id.trim();

		if document_id.is_empty() {
			return Err(Error::InvalidRequest {
				message: "document_id must be non-empty.".to_string(),
			});
		}
		if req.chunks.is_empty() {
			return Err(Error::InvalidRequest { message: "chunks must be non-empty.".to_string() });
		}
		if req.chunks.iter().any(|chunk| chunk.text.trim().is_empty()) {
			return Err(Error::InvalidRequest {
				message: "Every chunk must carry non-empty text.".to_string(),
			});
		}

		let texts = req.chunks.iter().map(|chunk| chunk.text.clone()).collect::<Vec<_>>();
		let embeddings =
			self.providers.embedding.embed(&self.cfg.providers.embedding, &texts).await?;

		if embeddings.len() != req.chunks.len() {
			return Err(Error::Provider {
				message: "Embedding provider returned mismatched vector count.".to_string(),
			});
		}

		let expected_dim = self.cfg.storage.qdrant.vector_dim as usize;
		let indexed_at = OffsetDateTime::now_utc();
		let chunks_indexed = req.chunks.len();
		let mut records = Vec::with_capacity(chunks_indexed);

		for (index, (chunk, vector)) in req.chunks.into_iter().zip(embeddings).enumerate() {
			if vector.len() != expected_dim {
				return Err(Error::Provider {
					message: "Embedding vector dimension mismatch.".to_string(),
				});
			}

			let chunk_index = index as u32;

			records.push(ChunkRecord {
				id: chunk_id(document_id, chunk_index),
				document_id: document_id.to_string(),
				chunk_index,
				text: chunk.text,
				metadata: chunk.metadata,
				vector,
				indexed_at,
			});
		}

		self.index
			.upsert(records)
			.await
			.map_err(|err| Error::Qdrant { message: err.to_string() })?;

		let total_chunks = self
			.index
			.count()
			.await
			.map_err(|err| Error::Qdrant { message: err.to_string() })?;

		Ok(IndexDocumentResponse {
			document_id: document_id.to_string(),
			chunks_indexed,
			total_chunks,
		})
	}
}

/// Stable point id for a document chunk, derived from the document id and
/// the chunk's position.
pub fn chunk_id(document_id: &str, chunk_index: u32) -> Uuid {
	Uuid::new_v5(&Uuid::NAMESPACE_OID, format!("{document_id}:{chunk_index}").as_bytes())
}
