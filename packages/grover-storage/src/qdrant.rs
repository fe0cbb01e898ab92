use std::collections::HashMap;

use qdrant_client::{
	client::Payload,
	qdrant::{
		Condition, CountPointsBuilder, CreateCollectionBuilder, DeletePointsBuilder, Distance,
		Filter, GetPointsBuilder, PointId, PointStruct, Query, QueryPointsBuilder, RetrievedPoint,
		ScoredPoint, ScrollPointsBuilder, UpsertPointsBuilder, Value, VectorParamsBuilder,
		VectorsOutput, point_id::PointIdOptions, value::Kind, vectors_output::VectorsOptions,
	},
};
use serde_json::Value as JsonValue;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use uuid::Uuid;

use crate::{
	Error, Result,
	models::{ChunkRecord, ScoredChunkRecord},
};

const SCROLL_PAGE_SIZE: u32 = 256;

pub struct QdrantStore {
	pub client: qdrant_client::Qdrant,
	pub collection: String,
	pub vector_dim: u32,
}
impl QdrantStore {
	pub fn new(cfg: &grover_config::Qdrant) -> Result<Self> {
		let client = qdrant_client::Qdrant::from_url(&cfg.url).build()?;

		Ok(Self { client, collection: cfg.collection.clone(), vector_dim: cfg.vector_dim })
	}

	/// Creates the collection with a single cosine-distance dense vector when
	/// it does not exist yet.
	pub async fn ensure_collection(&self) -> Result<()> {
		if self.client.collection_exists(self.collection.clone()).await? {
			return Ok(());
		}

		let create = CreateCollectionBuilder::new(self.collection.clone()).vectors_config(
			VectorParamsBuilder::new(u64::from(self.vector_dim), Distance::Cosine),
		);

		self.client.create_collection(create).await?;

		Ok(())
	}

	pub async fn count(&self) -> Result<u64> {
		let count = CountPointsBuilder::new(self.collection.clone()).exact(true);
		let response = self.client.count(count).await?;

		Ok(response.result.map(|result| result.count).unwrap_or(0))
	}

	pub async fn count_document(&self, document_id: &str) -> Result<u64> {
		let filter = Filter::must([Condition::matches("document_id", document_id.to_string())]);
		let count = CountPointsBuilder::new(self.collection.clone()).filter(filter).exact(true);
		let response = self.client.count(count).await?;

		Ok(response.result.map(|result| result.count).unwrap_or(0))
	}

	pub async fn search(
		&self,
		vector: Vec<f32>,
		limit: u64,
		filter: Option<Filter>,
	) -> Result<Vec<ScoredChunkRecord>> {
		let mut query = QueryPointsBuilder::new(self.collection.clone())
			.query(Query::new_nearest(vector))
			.with_payload(true)
			.with_vectors(true)
			.limit(limit);

		if let Some(filter) = filter {
			query = query.filter(filter);
		}

		let response = self.client.query(query).await?;
		let mut records = Vec::with_capacity(response.result.len());

		for point in response.result {
			let score = point.score;
			let Some(record) = scored_point_to_record(point) else {
				tracing::warn!(
					collection = %self.collection,
					"Skipped search hit with malformed payload."
				);

				continue;
			};

			records.push(ScoredChunkRecord { record, score });
		}

		Ok(records)
	}

	/// Scrolls the whole collection, vectors included.
	pub async fn fetch_all(&self) -> Result<Vec<ChunkRecord>> {
		let mut records = Vec::new();
		let mut offset: Option<PointId> = None;

		loop {
			let mut scroll = ScrollPointsBuilder::new(self.collection.clone())
				.limit(SCROLL_PAGE_SIZE)
				.with_payload(true)
				.with_vectors(true);

			if let Some(offset) = offset.take() {
				scroll = scroll.offset(offset);
			}

			let response = self.client.scroll(scroll).await?;

			for point in response.result {
				let Some(record) = retrieved_point_to_record(point) else {
					tracing::warn!(
						collection = %self.collection,
						"Skipped chunk point with malformed payload."
					);

					continue;
				};

				records.push(record);
			}

			match response.next_page_offset {
				Some(next) => offset = Some(next),
				None => break,
			}
		}

		Ok(records)
	}

	pub async fn fetch(&self, id: Uuid) -> Result<Option<ChunkRecord>> {
		let ids = vec![PointId::from(id.to_string())];
		let get = GetPointsBuilder::new(self.collection.clone(), ids)
			.with_payload(true)
			.with_vectors(true);
		let response = self.client.get_points(get).await?;

		Ok(response.result.into_iter().find_map(retrieved_point_to_record))
	}

	pub async fn upsert(&self, records: &[ChunkRecord]) -> Result<()> {
		let mut points = Vec::with_capacity(records.len());

		for record in records {
			validate_vector_dim(&record.vector, self.vector_dim)?;

			let mut payload_map = HashMap::new();

			payload_map
				.insert("document_id".to_string(), Value::from(record.document_id.clone()));
			payload_map
				.insert("chunk_index".to_string(), Value::from(i64::from(record.chunk_index)));
			payload_map.insert("text".to_string(), Value::from(record.text.clone()));
			payload_map.insert("metadata".to_string(), Value::from(record.metadata.clone()));
			payload_map
				.insert("indexed_at".to_string(), Value::from(format_timestamp(record.indexed_at)?));

			let payload = Payload::from(payload_map);
			let point = PointStruct::new(record.id.to_string(), record.vector.clone(), payload);

			points.push(point);
		}

		let upsert = UpsertPointsBuilder::new(self.collection.clone(), points).wait(true);

		self.client.upsert_points(upsert).await?;

		Ok(())
	}

	/// Removes every chunk whose payload `document_id` matches. Deleting an
	/// unknown document is not an error.
	pub async fn delete_by_document(&self, document_id: &str) -> Result<()> {
		let filter = Filter::must([Condition::matches("document_id", document_id.to_string())]);
		let delete = DeletePointsBuilder::new(self.collection.clone()).points(filter).wait(true);

		match self.client.delete_points(delete).await {
			Ok(_) => Ok(()),
			Err(err) if is_not_found_error(&err) => {
				tracing::info!(document_id = %document_id, "Points missing during delete.");

				Ok(())
			},
			Err(err) => Err(err.into()),
		}
	}
}

fn scored_point_to_record(point: ScoredPoint) -> Option<ChunkRecord> {
	record_from_parts(point.id, point.payload, point.vectors)
}

fn retrieved_point_to_record(point: RetrievedPoint) -> Option<ChunkRecord> {
	record_from_parts(point.id, point.payload, point.vectors)
}

fn record_from_parts(
	id: Option<PointId>,
	payload: HashMap<String, Value>,
	vectors: Option<VectorsOutput>,
) -> Option<ChunkRecord> {
	let id = id.as_ref().and_then(point_id_to_uuid)?;
	let document_id = payload_string(&payload, "document_id")?;
	let chunk_index = payload_u32(&payload, "chunk_index")?;
	let text = payload_string(&payload, "text")?;
	let metadata = payload.get("metadata").cloned().map(value_to_json).unwrap_or(JsonValue::Null);
	let indexed_at =
		payload_rfc3339(&payload, "indexed_at").unwrap_or(OffsetDateTime::UNIX_EPOCH);
	let vector = output_vector(vectors)?;

	Some(ChunkRecord { id, document_id, chunk_index, text, metadata, vector, indexed_at })
}

fn point_id_to_uuid(point_id: &PointId) -> Option<Uuid> {
	match &point_id.point_id_options {
		Some(PointIdOptions::Uuid(id)) => Uuid::parse_str(id).ok(),
		_ => None,
	}
}

fn payload_string(payload: &HashMap<String, Value>, key: &str) -> Option<String> {
	let value = payload.get(key)?;

	match &value.kind {
		Some(Kind::StringValue(text)) => Some(text.to_string()),
		_ => None,
	}
}

fn payload_u32(payload: &HashMap<String, Value>, key: &str) -> Option<u32> {
	let value = payload.get(key)?;

	match &value.kind {
		Some(Kind::IntegerValue(value)) => u32::try_from(*value).ok(),
		_ => None,
	}
}

fn payload_rfc3339(payload: &HashMap<String, Value>, key: &str) -> Option<OffsetDateTime> {
	let text = payload_string(payload, key)?;

	OffsetDateTime::parse(text.as_str(), &Rfc3339).ok()
}

fn value_to_json(value: Value) -> JsonValue {
	match value.kind {
		Some(Kind::NullValue(_)) | None => JsonValue::Null,
		Some(Kind::BoolValue(value)) => JsonValue::Bool(value),
		Some(Kind::IntegerValue(value)) => JsonValue::from(value),
		Some(Kind::DoubleValue(value)) =>
			serde_json::Number::from_f64(value).map(JsonValue::Number).unwrap_or(JsonValue::Null),
		Some(Kind::StringValue(value)) => JsonValue::String(value),
		Some(Kind::ListValue(list)) =>
			JsonValue::Array(list.values.into_iter().map(value_to_json).collect()),
		Some(Kind::StructValue(fields)) => JsonValue::Object(
			fields.fields.into_iter().map(|(key, value)| (key, value_to_json(value))).collect(),
		),
	}
}

fn output_vector(vectors: Option<VectorsOutput>) -> Option<Vec<f32>> {
	let output = match vectors?.vectors_options? {
		VectorsOptions::Vector(vector) => vector,
		VectorsOptions::Vectors(named) => named.vectors.into_values().next()?,
	};

	if output.data.is_empty() { None } else { Some(output.data) }
}

fn format_timestamp(ts: OffsetDateTime) -> Result<String> {
	ts.format(&Rfc3339)
		.map_err(|_| Error::InvalidArgument("Failed to format timestamp.".to_string()))
}

fn validate_vector_dim(vec: &[f32], expected_dim: u32) -> Result<()> {
	if vec.len() != expected_dim as usize {
		return Err(Error::InvalidArgument(format!(
			"Embedding dimension {} does not match configured vector_dim {expected_dim}.",
			vec.len()
		)));
	}

	Ok(())
}

fn is_not_found_error(err: &qdrant_client::QdrantError) -> bool {
	let message = err.to_string().to_lowercase();
	let point_not_found =
		(message.contains("not found") || message.contains("404")) && message.contains("point");
	let no_point_found = message.contains("no point") && message.contains("found");

	point_not_found || no_point_found
}
