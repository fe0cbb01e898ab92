use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

/// One indexed chunk as stored in the vector collection.
#[derive(Clone, Debug)]
pub struct ChunkRecord {
	pub id: Uuid,
	pub document_id: String,
	pub chunk_index: u32,
	pub text: String,
	pub metadata: Value,
	pub vector: Vec<f32>,
	pub indexed_at: OffsetDateTime,
}

#[derive(Clone, Debug)]
pub struct ScoredChunkRecord {
	pub record: ChunkRecord,
	pub score: f32,
}
