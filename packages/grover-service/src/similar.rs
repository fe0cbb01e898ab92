use uuid::Uuid;

use grover_storage::models::ScoredChunkRecord;

use crate::{Error, GroverService, Result};

/// Hard ceiling for similar-chunk lookups, independent of the configured
/// search limits.
const MAX_SIMILAR_RESULTS: i64 = 10;

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SimilarHit {
	pub id: Uuid,
	pub document_id: String,
	pub chunk_index: u32,
	pub text: String,
	pub metadata: serde_json::Value,
	pub score: f32,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SimilarDocumentsResponse {
	pub reference_id: Uuid,
	pub results_count: usize,
	pub results: Vec<SimilarHit>,
}

impl GroverService {
	/// Ranks the chunks closest to a stored one, using its embedding as the
	/// query. The reference chunk itself is excluded from the results.
	pub async fn similar_documents(
		&self,
		reference_id: &str,
		top_k: Option<i64>,
	) -> Result<SimilarDocumentsResponse> {
		let requested_k = top_k.unwrap_or(i64::from(self.cfg.search.default_top_k));

		if requested_k > MAX_SIMILAR_RESULTS {
			return Err(Error::InvalidRequest {
				message: format!("top_k must be at most {MAX_SIMILAR_RESULTS}."),
			});
		}

		// Chunk ids are UUIDs, so anything unparseable cannot exist.
		let Ok(id) = Uuid::parse_str(reference_id.trim()) else {
			return Err(not_found(reference_id));
		};
		let Some(reference) = self
			.index
			.fetch(id)
			.await
			.map_err(|err| Error::Qdrant { message: err.to_string() })?
		else {
			return Err(not_found(reference_id));
		};
		let top_k = usize::try_from(requested_k).unwrap_or(0);

		if top_k == 0 {
			return Ok(SimilarDocumentsResponse {
				reference_id: id,
				results_count: 0,
				results: Vec::new(),
			});
		}

		let hits = self
			.index
			.search(reference.vector.clone(), (top_k + 1) as u64, None)
			.await
			.map_err(|err| Error::Qdrant { message: err.to_string() })?;
		let results = hits
			.into_iter()
			.filter(|hit| hit.record.id != id)
			.take(top_k)
			.map(similar_hit)
			.collect::<Vec<_>>();

		Ok(SimilarDocumentsResponse { reference_id: id, results_count: results.len(), results })
	}
}

fn not_found(reference_id: &str) -> Error {
	Error::NotFound { message: format!("Chunk '{reference_id}' was not found.") }
}

fn similar_hit(hit: ScoredChunkRecord) -> SimilarHit {
	SimilarHit {
		id: hit.record.id,
		document_id: hit.record.document_id,
		chunk_index: hit.record.chunk_index,
		text: hit.record.text,
		metadata: hit.record.metadata,
		score: hit.score.max(0.0),
	}
}
