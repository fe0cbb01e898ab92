use axum::{
	Json, Router,
	extract::{Path, Query, State},
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::{delete, get, post},
};
use serde::{Deserialize, Serialize};

use grover_service::{
	DeleteDocumentResponse, IndexDocumentRequest, IndexDocumentResponse, SearchRequest,
	SearchResponse, SearchStatsResponse, SimilarDocumentsResponse,
};

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/query", post(query))
		.route("/documents", post(index_document))
		.route("/documents/{document_id}", delete(delete_document))
		.route("/similar_documents/{chunk_id}", get(similar_documents))
		.route("/search_stats", get(search_stats))
		.with_state(state)
}

async fn health() -> Json<serde_json::Value> {
	Json(serde_json::json!({ "status": "ok" }))
}

async fn query(
	State(state): State<AppState>,
	Json(payload): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, ApiError> {
	let response = state.service.search(payload).await?;

	Ok(Json(response))
}

async fn index_document(
	State(state): State<AppState>,
	Json(payload): Json<IndexDocumentRequest>,
) -> Result<Json<IndexDocumentResponse>, ApiError> {
	let response = state.service.index_document(payload).await?;

	Ok(Json(response))
}

async fn delete_document(
	State(state): State<AppState>,
	Path(document_id): Path<String>,
) -> Result<Json<DeleteDocumentResponse>, ApiError> {
	let response = state.service.delete_document(&document_id).await?;

	Ok(Json(response))
}

#[derive(Debug, Deserialize)]
struct SimilarParams {
	top_k: Option<i64>,
}

async fn similar_documents(
	State(state): State<AppState>,
	Path(chunk_id): Path<String>,
	Query(params): Query<SimilarParams>,
) -> Result<Json<SimilarDocumentsResponse>, ApiError> {
	let response = state.service.similar_documents(&chunk_id, params.top_k).await?;

	Ok(Json(response))
}

async fn search_stats(
	State(state): State<AppState>,
) -> Result<Json<SearchStatsResponse>, ApiError> {
	let response = state.service.search_stats().await?;

	Ok(Json(response))
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error: ErrorDetail,
}

#[derive(Debug, Serialize)]
struct ErrorDetail {
	code: String,
	message: String,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	code: &'static str,
	message: String,
}

impl From<grover_service::Error> for ApiError {
	fn from(err: grover_service::Error) -> Self {
		use grover_service::Error;

		let (status, code, message) = match err {
			Error::InvalidRequest { message } =>
				(StatusCode::BAD_REQUEST, "invalid_request", message),
			Error::NotFound { message } => (StatusCode::NOT_FOUND, "not_found", message),
			Error::Provider { message } => (StatusCode::BAD_GATEWAY, "provider_error", message),
			Error::Qdrant { message } =>
				(StatusCode::INTERNAL_SERVER_ERROR, "index_error", message),
		};

		Self { status, code, message }
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body = ErrorBody {
			error: ErrorDetail { code: self.code.to_string(), message: self.message },
		};

		(self.status, Json(body)).into_response()
	}
}
