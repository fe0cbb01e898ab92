use crate::{Error, GroverService, Result};

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct DeleteDocumentResponse {
	pub document_id: String,
	pub deleted_chunks: u64,
	pub remaining_chunks: u64,
}

impl GroverService {
	pub async fn delete_document(&self, document_id: &str) -> Result<DeleteDocumentResponse> {
		let document_id = document_id.trim();

		if document_id.is_empty() {
			return Err(Error::InvalidRequest {
				message: "document_id must be non-empty.".to_string(),
			});
		}

		let deleted_chunks = self
			.index
			.count_document(document_id)
			.await
			.map_err(|err| Error::Qdrant { message: err.to_string() })?;

		if deleted_chunks == 0 {
			return Err(Error::NotFound {
				message: format!("Document '{document_id}' has no indexed chunks."),
			});
		}

		self.index
			.delete_by_document(document_id)
			.await
			.map_err(|err| Error::Qdrant { message: err.to_string() })?;

		let remaining_chunks = self
			.index
			.count()
			.await
			.map_err(|err| Error::Qdrant { message: err.to_string() })?;

		tracing::info!(document_id = %document_id, deleted_chunks, "Deleted document chunks.");

		Ok(DeleteDocumentResponse {
			document_id: document_id.to_string(),
			deleted_chunks,
			remaining_chunks,
		})
	}
}
