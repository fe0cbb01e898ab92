use std::{collections::HashMap, sync::Arc};

use serde_json::json;

use grover_service::{
	Error, GroverService, IndexChunk, IndexDocumentRequest, Providers, SearchRequest, VectorIndex,
	chunk_id,
};
use grover_testkit::{
	FailingEmbedding, FaultyIndex, InMemoryIndex, StaticEmbedding, chunk, chunk_with_metadata,
	test_config,
};

const QUERY: &str = "what is the quarterly revenue";

/// Unit vector whose cosine similarity against the query embedding
/// `[1, 0]` equals `score`.
fn unit_vector(score: f32) -> Vec<f32> {
	vec![score, (1.0 - score * score).max(0.0).sqrt()]
}

fn query_embedding() -> StaticEmbedding {
	StaticEmbedding::new(2).with_vector(QUERY, vec![1.0, 0.0])
}

fn seeded_index() -> InMemoryIndex {
	InMemoryIndex::with_records(vec![
		chunk("alpha", 0, "alpha intro", unit_vector(0.9)),
		chunk("alpha", 1, "alpha detail", unit_vector(0.75)),
		chunk("beta", 0, "beta intro", unit_vector(0.6)),
		chunk("beta", 1, "beta detail", unit_vector(0.4)),
		chunk("gamma", 0, "gamma intro", unit_vector(0.2)),
	])
}

fn service(index: Arc<dyn VectorIndex>) -> GroverService {
	GroverService::with_providers(test_config(2), index, Providers::new(Arc::new(query_embedding())))
}

fn search_request(query: &str) -> SearchRequest {
	SearchRequest {
		query: query.to_string(),
		top_k: None,
		similarity_threshold: None,
		use_quantum: None,
		filter_metadata: None,
	}
}

fn close(a: f32, b: f32) -> bool {
	(a - b).abs() < 1e-6
}

#[tokio::test]
async fn empty_store_answers_without_touching_the_embedder() {
	let service = GroverService::with_providers(
		test_config(2),
		Arc::new(InMemoryIndex::new()),
		Providers::new(Arc::new(FailingEmbedding)),
	);
	let response = service.search(search_request(QUERY)).await.expect("Search must succeed.");

	assert_eq!(response.search_method, "none");
	assert_eq!(response.results_count, 0);
	assert!(response.results.is_empty());
	assert_eq!(response.metadata.total_documents, 0);
	assert!(response.metadata.message.is_some());
	assert!(!response.metadata.quantum_enabled);
}

#[tokio::test]
async fn boosted_search_amplifies_marked_chunks() {
	let service = service(Arc::new(seeded_index()));
	let response = service.search(search_request(QUERY)).await.expect("Search must succeed.");

	assert_eq!(response.search_method, "quantum_enhanced");
	assert_eq!(response.results_count, 5);
	assert!(response.metadata.quantum_enabled);

	// Two chunks clear the 0.7 threshold; the boost saturates both at 1.0
	// and the retrieval order breaks the tie.
	assert_eq!(response.results[0].id, chunk_id("alpha", 0));
	assert_eq!(response.results[1].id, chunk_id("alpha", 1));
	assert!(close(response.results[0].classical_score, 0.9));
	assert!(close(response.results[1].classical_score, 0.75));
	assert_eq!(response.results[0].boosted_score, 1.0);
	assert_eq!(response.results[1].boosted_score, 1.0);

	for (position, hit) in response.results.iter().enumerate() {
		assert_eq!(hit.rank, position as u32 + 1);
	}
	for hit in &response.results[2..] {
		assert_eq!(hit.boosted_score, hit.classical_score);
	}
	for pair in response.results.windows(2) {
		assert!(pair[0].boosted_score >= pair[1].boosted_score);
	}
}

#[tokio::test]
async fn blank_and_oversized_queries_are_rejected() {
	let service = service(Arc::new(seeded_index()));

	for query in ["", "   "] {
		let result = service.search(search_request(query)).await;

		assert!(matches!(result, Err(Error::InvalidRequest { .. })));
	}

	let result = service.search(search_request(&"x".repeat(1_001))).await;
	let Err(Error::InvalidRequest { message }) = result else {
		panic!("Expected an invalid-request error.");
	};

	assert!(message.contains("at most 1000 characters"));
}

#[tokio::test]
async fn top_k_above_the_cap_is_rejected() {
	let service = service(Arc::new(seeded_index()));
	let mut req = search_request(QUERY);

	req.top_k = Some(21);

	let Err(Error::InvalidRequest { message }) = service.search(req).await else {
		panic!("Expected an invalid-request error.");
	};

	assert_eq!(message, "top_k must be at most 20.");
}

#[tokio::test]
async fn non_positive_top_k_short_circuits_without_embedding() {
	let service = GroverService::with_providers(
		test_config(2),
		Arc::new(seeded_index()),
		Providers::new(Arc::new(FailingEmbedding)),
	);

	for top_k in [0, -3] {
		let mut req = search_request(QUERY);

		req.top_k = Some(top_k);

		let response = service.search(req).await.expect("Search must succeed.");

		assert_eq!(response.search_method, "none");
		assert!(response.results.is_empty());
		assert_eq!(response.metadata.total_documents, 5);
	}
}

#[tokio::test]
async fn out_of_range_thresholds_are_rejected() {
	let service = service(Arc::new(seeded_index()));

	for threshold in [-0.1, 1.5, f32::NAN] {
		let mut req = search_request(QUERY);

		req.similarity_threshold = Some(threshold);

		let result = service.search(req).await;

		assert!(matches!(result, Err(Error::InvalidRequest { .. })));
	}
}

#[tokio::test]
async fn disabling_quantum_searches_the_store_directly() {
	let index =
		FaultyIndex { inner: seeded_index(), fail_fetch_all: true, ..Default::default() };
	let service = service(Arc::new(index));
	let mut req = search_request(QUERY);

	req.use_quantum = Some(false);

	let response = service.search(req).await.expect("Search must succeed.");

	assert_eq!(response.search_method, "classical");
	assert!(!response.metadata.quantum_enabled);
	assert_eq!(response.results_count, 5);

	for hit in &response.results {
		assert_eq!(hit.boosted_score, hit.classical_score);
	}
}

#[tokio::test]
async fn oversized_collections_use_the_classical_path() {
	let mut cfg = test_config(2);

	// Candidate ceiling of 2^1 = 2, well under the five stored chunks.
	cfg.quantum.max_qubits = 1;

	let index =
		FaultyIndex { inner: seeded_index(), fail_fetch_all: true, ..Default::default() };
	let service =
		GroverService::with_providers(cfg, Arc::new(index), Providers::new(Arc::new(query_embedding())));
	let response = service.search(search_request(QUERY)).await.expect("Search must succeed.");

	assert_eq!(response.search_method, "classical");
	assert!(!response.metadata.quantum_enabled);
}

#[tokio::test]
async fn boosted_path_failure_falls_back_to_classical() {
	let index =
		FaultyIndex { inner: seeded_index(), fail_fetch_all: true, ..Default::default() };
	let service = service(Arc::new(index));
	let response = service.search(search_request(QUERY)).await.expect("Search must succeed.");

	assert_eq!(response.search_method, "classical");
	assert_eq!(response.results_count, 5);

	for hit in &response.results {
		assert_eq!(hit.boosted_score, hit.classical_score);
	}
}

#[tokio::test]
async fn store_failures_surface_as_qdrant_errors() {
	let count_broken =
		FaultyIndex { inner: seeded_index(), fail_count: true, ..Default::default() };
	let result = service(Arc::new(count_broken)).search(search_request(QUERY)).await;

	assert!(matches!(result, Err(Error::Qdrant { .. })));

	// When both the scroll and the fallback search fail, the error wins.
	let fully_broken = FaultyIndex {
		inner: seeded_index(),
		fail_fetch_all: true,
		fail_search: true,
		..Default::default()
	};
	let result = service(Arc::new(fully_broken)).search(search_request(QUERY)).await;

	assert!(matches!(result, Err(Error::Qdrant { .. })));
}

#[tokio::test]
async fn embedding_failure_surfaces_as_provider_error() {
	let service = GroverService::with_providers(
		test_config(2),
		Arc::new(seeded_index()),
		Providers::new(Arc::new(FailingEmbedding)),
	);
	let result = service.search(search_request(QUERY)).await;

	assert!(matches!(result, Err(Error::Provider { .. })));
}

#[tokio::test]
async fn no_marked_chunks_keeps_the_classical_label() {
	let index = InMemoryIndex::with_records(vec![
		chunk("alpha", 0, "alpha intro", unit_vector(0.6)),
		chunk("beta", 0, "beta intro", unit_vector(0.4)),
	]);
	let service = service(Arc::new(index));
	let response = service.search(search_request(QUERY)).await.expect("Search must succeed.");

	assert_eq!(response.search_method, "classical");
	assert_eq!(response.results_count, 2);

	for hit in &response.results {
		assert_eq!(hit.boosted_score, hit.classical_score);
	}
}

#[tokio::test]
async fn boosted_filter_matches_metadata_case_insensitively() {
	let index = InMemoryIndex::with_records(vec![
		chunk_with_metadata(
			"alpha",
			0,
			"alpha intro",
			unit_vector(0.9),
			json!({ "source": "Alpha.PDF" }),
		),
		chunk_with_metadata(
			"beta",
			0,
			"beta intro",
			unit_vector(0.8),
			json!({ "source": "beta.pdf" }),
		),
	]);
	let service = service(Arc::new(index));
	let mut req = search_request(QUERY);

	req.filter_metadata =
		Some(HashMap::from([("source".to_string(), "alpha.pdf".to_string())]));

	let response = service.search(req).await.expect("Search must succeed.");

	assert_eq!(response.search_method, "quantum_enhanced");
	assert_eq!(response.results_count, 1);
	assert_eq!(response.results[0].id, chunk_id("alpha", 0));
}

#[tokio::test]
async fn classical_filter_requires_an_exact_match() {
	let index = InMemoryIndex::with_records(vec![
		chunk_with_metadata(
			"alpha",
			0,
			"alpha intro",
			unit_vector(0.9),
			json!({ "source": "Alpha.PDF" }),
		),
		chunk_with_metadata(
			"beta",
			0,
			"beta intro",
			unit_vector(0.8),
			json!({ "source": "alpha.pdf" }),
		),
	]);
	let service = service(Arc::new(index));
	let mut req = search_request(QUERY);

	req.use_quantum = Some(false);
	req.filter_metadata =
		Some(HashMap::from([("source".to_string(), "alpha.pdf".to_string())]));

	let response = service.search(req).await.expect("Search must succeed.");

	assert_eq!(response.results_count, 1);
	assert_eq!(response.results[0].id, chunk_id("beta", 0));
}

#[tokio::test]
async fn filter_that_matches_nothing_returns_empty_success() {
	let service = service(Arc::new(seeded_index()));
	let mut req = search_request(QUERY);

	req.filter_metadata =
		Some(HashMap::from([("source".to_string(), "missing.pdf".to_string())]));

	let response = service.search(req).await.expect("Search must succeed.");

	assert_eq!(response.search_method, "classical");
	assert_eq!(response.results_count, 0);
}

#[tokio::test]
async fn indexing_builds_deterministic_chunk_ids() {
	let index = Arc::new(InMemoryIndex::new());
	let embedding = StaticEmbedding::new(2)
		.with_vector("First chunk.", vec![1.0, 0.0])
		.with_vector("Second chunk.", vec![0.0, 1.0]);
	let service = GroverService::with_providers(
		test_config(2),
		index.clone(),
		Providers::new(Arc::new(embedding)),
	);
	let response = service
		.index_document(IndexDocumentRequest {
			document_id: "doc-1".to_string(),
			chunks: vec![
				IndexChunk { text: "First chunk.".to_string(), metadata: json!({ "page": 1 }) },
				IndexChunk { text: "Second chunk.".to_string(), metadata: json!({ "page": 2 }) },
			],
		})
		.await
		.expect("Indexing must succeed.");

	assert_eq!(response.document_id, "doc-1");
	assert_eq!(response.chunks_indexed, 2);
	assert_eq!(response.total_chunks, 2);

	let records = index.records();

	assert_eq!(records.len(), 2);
	assert_eq!(records[0].id, chunk_id("doc-1", 0));
	assert_eq!(records[1].id, chunk_id("doc-1", 1));
	assert_eq!(records[0].document_id, "doc-1");
	assert_eq!(records[0].chunk_index, 0);
	assert_eq!(records[1].chunk_index, 1);
	assert_eq!(records[0].metadata, json!({ "page": 1 }));
	assert_eq!(records[0].vector, vec![1.0, 0.0]);
}

#[tokio::test]
async fn reindexing_a_document_replaces_its_chunks() {
	let index = Arc::new(InMemoryIndex::new());
	let embedding = StaticEmbedding::new(2)
		.with_vector("Old text.", vec![1.0, 0.0])
		.with_vector("New text.", vec![0.0, 1.0]);
	let service = GroverService::with_providers(
		test_config(2),
		index.clone(),
		Providers::new(Arc::new(embedding)),
	);

	for text in ["Old text.", "New text."] {
		service
			.index_document(IndexDocumentRequest {
				document_id: "doc-1".to_string(),
				chunks: vec![IndexChunk { text: text.to_string(), metadata: json!({}) }],
			})
			.await
			.expect("Indexing must succeed.");
	}

	let records = index.records();

	assert_eq!(records.len(), 1);
	assert_eq!(records[0].text, "New text.");
	assert_eq!(records[0].vector, vec![0.0, 1.0]);
}

#[tokio::test]
async fn indexing_rejects_empty_inputs() {
	let service = service(Arc::new(InMemoryIndex::new()));
	let empty_id = IndexDocumentRequest {
		document_id: "  ".to_string(),
		chunks: vec![IndexChunk { text: "Text.".to_string(), metadata: json!({}) }],
	};
	let no_chunks = IndexDocumentRequest { document_id: "doc-1".to_string(), chunks: vec![] };
	let blank_chunk = IndexDocumentRequest {
		document_id: "doc-1".to_string(),
		chunks: vec![IndexChunk { text: "   ".to_string(), metadata: json!({}) }],
	};

	for req in [empty_id, no_chunks, blank_chunk] {
		let result = service.index_document(req).await;

		assert!(matches!(result, Err(Error::InvalidRequest { .. })));
	}
}

#[tokio::test]
async fn mismatched_embedding_dimensions_are_a_provider_error() {
	let index = Arc::new(InMemoryIndex::new());
	let embedding = StaticEmbedding::new(3).with_vector("Text.", vec![1.0, 0.0, 0.0]);
	let service = GroverService::with_providers(
		test_config(2),
		index,
		Providers::new(Arc::new(embedding)),
	);
	let result = service
		.index_document(IndexDocumentRequest {
			document_id: "doc-1".to_string(),
			chunks: vec![IndexChunk { text: "Text.".to_string(), metadata: json!({}) }],
		})
		.await;
	let Err(Error::Provider { message }) = result else {
		panic!("Expected a provider error.");
	};

	assert!(message.contains("dimension mismatch"));
}

#[tokio::test]
async fn deleting_a_document_reports_the_remaining_chunks() {
	let index = Arc::new(seeded_index());
	let service = GroverService::with_providers(
		test_config(2),
		index.clone(),
		Providers::new(Arc::new(query_embedding())),
	);
	let response = service.delete_document("alpha").await.expect("Delete must succeed.");

	assert_eq!(response.document_id, "alpha");
	assert_eq!(response.deleted_chunks, 2);
	assert_eq!(response.remaining_chunks, 3);
	assert!(index.records().iter().all(|record| record.document_id != "alpha"));
}

#[tokio::test]
async fn deleting_an_unknown_document_is_not_found() {
	let service = service(Arc::new(seeded_index()));

	assert!(matches!(service.delete_document("missing").await, Err(Error::NotFound { .. })));
	assert!(matches!(service.delete_document("  ").await, Err(Error::InvalidRequest { .. })));
}

#[tokio::test]
async fn similar_chunks_exclude_the_reference() {
	let service = service(Arc::new(seeded_index()));
	let reference = chunk_id("alpha", 0);
	let response = service
		.similar_documents(&reference.to_string(), Some(3))
		.await
		.expect("Lookup must succeed.");

	assert_eq!(response.reference_id, reference);
	assert_eq!(response.results_count, 3);
	assert!(response.results.iter().all(|hit| hit.id != reference));

	for pair in response.results.windows(2) {
		assert!(pair[0].score >= pair[1].score);
	}
}

#[tokio::test]
async fn similar_lookup_rejects_bad_ids_and_oversized_top_k() {
	let service = service(Arc::new(seeded_index()));
	let unknown = uuid::Uuid::new_v4();

	assert!(matches!(
		service.similar_documents(&unknown.to_string(), None).await,
		Err(Error::NotFound { .. })
	));
	assert!(matches!(
		service.similar_documents("not-a-uuid", None).await,
		Err(Error::NotFound { .. })
	));

	let reference = chunk_id("alpha", 0);
	let result = service.similar_documents(&reference.to_string(), Some(11)).await;
	let Err(Error::InvalidRequest { message }) = result else {
		panic!("Expected an invalid-request error.");
	};

	assert_eq!(message, "top_k must be at most 10.");
}

#[tokio::test]
async fn stats_reflect_store_and_config() {
	let service = service(Arc::new(seeded_index()));
	let stats = service.search_stats().await.expect("Stats must succeed.");

	assert_eq!(stats.vector_store.total_chunks, 5);
	assert!(stats.vector_store.has_data);
	assert_eq!(stats.vector_store.vector_dim, 2);
	assert_eq!(stats.quantum.algorithm, "amplitude_amplification");
	assert_eq!(stats.quantum.max_candidates, 1_024);
	assert_eq!(stats.quantum.shots, 1_024);
	assert_eq!(stats.capabilities.max_results_per_query, 20);
	assert!(stats.capabilities.boosted_search);
}
