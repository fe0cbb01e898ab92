use crate::{Error, GroverService, Result};

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SearchStatsResponse {
	pub vector_store: VectorStoreStats,
	pub quantum: QuantumStats,
	pub embedding: EmbeddingStats,
	pub capabilities: CapabilityStats,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct VectorStoreStats {
	pub collection: String,
	pub total_chunks: u64,
	pub vector_dim: u32,
	pub has_data: bool,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct QuantumStats {
	pub algorithm: String,
	pub enabled: bool,
	pub boost_factor: f32,
	pub max_qubits: u32,
	pub iteration_cap: u32,
	/// Display-only; the deterministic booster never samples.
	pub shots: u32,
	pub max_candidates: usize,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct EmbeddingStats {
	pub provider: String,
	pub model: String,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CapabilityStats {
	pub classical_search: bool,
	pub boosted_search: bool,
	pub metadata_filtering: bool,
	pub max_boosted_candidates: usize,
	pub max_results_per_query: u32,
}

impl GroverService {
	pub async fn search_stats(&self) -> Result<SearchStatsResponse> {
		let total_chunks = self
			.index
			.count()
			.await
			.map_err(|err| Error::Qdrant { message: err.to_string() })?;

		Ok(SearchStatsResponse {
			vector_store: VectorStoreStats {
				collection: self.cfg.storage.qdrant.collection.clone(),
				total_chunks,
				vector_dim: self.cfg.storage.qdrant.vector_dim,
				has_data: total_chunks > 0,
			},
			quantum: QuantumStats {
				algorithm: "amplitude_amplification".to_string(),
				enabled: self.cfg.quantum.enabled,
				boost_factor: self.cfg.quantum.boost_factor,
				max_qubits: self.cfg.quantum.max_qubits,
				iteration_cap: self.cfg.quantum.iteration_cap,
				shots: self.cfg.quantum.shots,
				max_candidates: self.cfg.quantum.max_candidates(),
			},
			embedding: EmbeddingStats {
				provider: self.cfg.providers.embedding.provider_id.clone(),
				model: self.cfg.providers.embedding.model.clone(),
			},
			capabilities: CapabilityStats {
				classical_search: true,
				boosted_search: self.cfg.quantum.enabled,
				metadata_filtering: true,
				max_boosted_candidates: self.cfg.quantum.max_candidates(),
				max_results_per_query: self.cfg.search.max_top_k,
			},
		})
	}
}
