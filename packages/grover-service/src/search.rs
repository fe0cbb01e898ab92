use std::{collections::HashMap, time::Instant};

use serde_json::Value;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use grover_domain::{BoostPolicy, BoostedCandidate, Candidate, ScoredCandidate};
use grover_storage::models::ChunkRecord;

use crate::{Error, GroverService, Result};

/// `search_method` label for a query the booster actually amplified.
pub const METHOD_BOOSTED: &str = "quantum_enhanced";
/// `search_method` label for plain similarity ranking.
pub const METHOD_CLASSICAL: &str = "classical";
/// `search_method` label when no search ran at all.
pub const METHOD_NONE: &str = "none";

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SearchRequest {
	pub query: String,
	pub top_k: Option<i64>,
	pub similarity_threshold: Option<f32>,
	pub use_quantum: Option<bool>,
	pub filter_metadata: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SearchHit {
	pub id: uuid::Uuid,
	pub document_id: String,
	pub chunk_index: u32,
	pub text: String,
	pub metadata: Value,
	pub classical_score: f32,
	pub boosted_score: f32,
	/// 1-based position in the final ranking.
	pub rank: u32,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SearchMetadata {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub message: Option<String>,
	/// Indexed chunk count across the whole collection.
	pub total_documents: u64,
	pub similarity_threshold: f32,
	pub quantum_enabled: bool,
	pub embedding_model: String,
	pub search_timestamp: String,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SearchResponse {
	pub query: String,
	pub search_method: String,
	pub results_count: usize,
	pub processing_time_ms: f64,
	pub results: Vec<SearchHit>,
	pub metadata: SearchMetadata,
}

impl GroverService {
	pub async fn search(&self, req: SearchRequest) -> Result<SearchResponse> {
		let started = Instant::now();
		let query = req.query.trim();

		if query.is_empty() {
			return Err(Error::InvalidRequest { message: "query must be non-empty.".to_string() });
		}
		if query.chars().count() > self.cfg.search.max_query_chars as usize {
			return Err(Error::InvalidRequest {
				message: format!(
					"query must be at most {} characters.",
					self.cfg.search.max_query_chars
				),
			});
		}

		let requested_k = req.top_k.unwrap_or(i64::from(self.cfg.search.default_top_k));

		if requested_k > i64::from(self.cfg.search.max_top_k) {
			return Err(Error::InvalidRequest {
				message: format!("top_k must be at most {}.", self.cfg.search.max_top_k),
			});
		}

		let threshold = req.similarity_threshold.unwrap_or(self.cfg.search.similarity_threshold);

		if !threshold.is_finite() || !(0.0..=1.0).contains(&threshold) {
			return Err(Error::InvalidRequest {
				message: "similarity_threshold must be in the range 0.0-1.0.".to_string(),
			});
		}

		let total = self
			.index
			.count()
			.await
			.map_err(|err| Error::Qdrant { message: err.to_string() })?;

		if total == 0 {
			return Ok(SearchResponse {
				query: query.to_string(),
				search_method: METHOD_NONE.to_string(),
				results_count: 0,
				processing_time_ms: elapsed_ms(started),
				results: Vec::new(),
				metadata: self.search_metadata(
					Some("No documents indexed yet. Upload documents first.".to_string()),
					0,
					threshold,
					false,
				),
			});
		}

		// A non-positive top_k deliberately requests nothing; skip the
		// embedding call entirely.
		let top_k = usize::try_from(requested_k).unwrap_or(0);

		if top_k == 0 {
			return Ok(SearchResponse {
				query: query.to_string(),
				search_method: METHOD_NONE.to_string(),
				results_count: 0,
				processing_time_ms: elapsed_ms(started),
				results: Vec::new(),
				metadata: self.search_metadata(None, total, threshold, false),
			});
		}

		let query_vector = self.embed_query(query).await?;
		let filter = req.filter_metadata.as_ref().filter(|map| !map.is_empty());
		let boost_requested = req.use_quantum.unwrap_or(true) && self.cfg.quantum.enabled;
		let use_boost = boost_requested && total as usize <= self.cfg.quantum.max_candidates();
		let (results, method) = if use_boost {
			match self.boosted_hits(&query_vector, filter, threshold, top_k).await {
				Ok((hits, applied)) => {
					let method = if applied { METHOD_BOOSTED } else { METHOD_CLASSICAL };

					(hits, method)
				},
				Err(err) => {
					tracing::warn!(
						error = %err,
						"Boosted search failed; falling back to classical ranking."
					);

					(self.classical_hits(&query_vector, filter, top_k).await?, METHOD_CLASSICAL)
				},
			}
		} else {
			(self.classical_hits(&query_vector, filter, top_k).await?, METHOD_CLASSICAL)
		};

		Ok(SearchResponse {
			query: query.to_string(),
			search_method: method.to_string(),
			results_count: results.len(),
			processing_time_ms: elapsed_ms(started),
			results,
			metadata: self.search_metadata(None, total, threshold, use_boost),
		})
	}

	/// Loads every chunk, filters in process, then runs the amplitude-boost
	/// ranking over the survivors. Returns the hits and whether the boost
	/// actually amplified anything.
	async fn boosted_hits(
		&self,
		query_vector: &[f32],
		filter: Option<&HashMap<String, String>>,
		threshold: f32,
		top_k: usize,
	) -> Result<(Vec<SearchHit>, bool)> {
		let records = self
			.index
			.fetch_all()
			.await
			.map_err(|err| Error::Qdrant { message: err.to_string() })?;
		let records = match filter {
			Some(filter) => records
				.into_iter()
				.filter(|record| metadata_matches(&record.metadata, filter))
				.collect(),
			None => records,
		};
		let candidates = records
			.iter()
			.map(|record| Candidate { id: record.id.to_string(), vector: record.vector.clone() })
			.collect::<Vec<_>>();
		let policy = BoostPolicy {
			similarity_threshold: threshold,
			boost_factor: self.cfg.quantum.boost_factor,
			max_candidates: self.cfg.quantum.max_candidates(),
			iteration_cap: self.cfg.quantum.iteration_cap,
		};
		let ranking = grover_domain::rank(query_vector, candidates, &policy, top_k, true);
		let by_id = records
			.iter()
			.map(|record| (record.id.to_string(), record))
			.collect::<HashMap<_, _>>();

		Ok((hits_from_items(&ranking.items, &by_id), ranking.outcome.applied()))
	}

	/// Store-side nearest-neighbor search with exact-match filtering, then
	/// the shared dedup-and-truncate assembly.
	async fn classical_hits(
		&self,
		query_vector: &[f32],
		filter: Option<&HashMap<String, String>>,
		top_k: usize,
	) -> Result<Vec<SearchHit>> {
		let scored = self
			.index
			.search(query_vector.to_vec(), top_k as u64, filter)
			.await
			.map_err(|err| Error::Qdrant { message: err.to_string() })?;
		let candidates = scored
			.iter()
			.enumerate()
			.map(|(position, hit)| ScoredCandidate {
				candidate: Candidate {
					id: hit.record.id.to_string(),
					vector: hit.record.vector.clone(),
				},
				retrieval_rank: position as u32 + 1,
				classical_score: hit.score.max(0.0),
			})
			.collect::<Vec<_>>();
		let items = grover_domain::assemble(grover_domain::passthrough(candidates), top_k);
		let by_id = scored
			.iter()
			.map(|hit| (hit.record.id.to_string(), &hit.record))
			.collect::<HashMap<_, _>>();

		Ok(hits_from_items(&items, &by_id))
	}

	pub(crate) async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
		let texts = [text.to_string()];
		let embeddings =
			self.providers.embedding.embed(&self.cfg.providers.embedding, &texts).await?;
		let Some(vector) = embeddings.into_iter().next() else {
			return Err(Error::Provider {
				message: "Embedding provider returned no vectors.".to_string(),
			});
		};

		if vector.len() != self.cfg.storage.qdrant.vector_dim as usize {
			return Err(Error::Provider {
				message: "Embedding vector dimension mismatch.".to_string(),
			});
		}

		Ok(vector)
	}

	fn search_metadata(
		&self,
		message: Option<String>,
		total_documents: u64,
		similarity_threshold: f32,
		quantum_enabled: bool,
	) -> SearchMetadata {
		SearchMetadata {
			message,
			total_documents,
			similarity_threshold,
			quantum_enabled,
			embedding_model: self.cfg.providers.embedding.model.clone(),
			search_timestamp: OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_default(),
		}
	}
}

fn hits_from_items(
	items: &[BoostedCandidate],
	by_id: &HashMap<String, &ChunkRecord>,
) -> Vec<SearchHit> {
	let mut hits = Vec::with_capacity(items.len());

	for item in items {
		let Some(record) = by_id.get(item.candidate.id.as_str()) else {
			tracing::warn!(id = %item.candidate.id, "Ranked candidate lost its source record.");

			continue;
		};

		hits.push(SearchHit {
			id: record.id,
			document_id: record.document_id.clone(),
			chunk_index: record.chunk_index,
			text: record.text.clone(),
			metadata: record.metadata.clone(),
			classical_score: item.classical_score,
			boosted_score: item.boosted_score,
			rank: hits.len() as u32 + 1,
		});
	}

	hits
}

/// In-process filter for the boosted path; an entry matches when the
/// stringified metadata field equals it case-insensitively. Missing keys
/// compare as the empty string.
fn metadata_matches(metadata: &Value, filter: &HashMap<String, String>) -> bool {
	filter.iter().all(|(key, expected)| {
		let actual = match metadata.get(key) {
			Some(Value::String(text)) => text.clone(),
			Some(value) => value.to_string(),
			None => String::new(),
		};

		actual.to_lowercase() == expected.to_lowercase()
	})
}

fn elapsed_ms(started: Instant) -> f64 {
	let ms = started.elapsed().as_secs_f64() * 1_000.0;

	(ms * 100.0).round() / 100.0
}
