use crate::{Candidate, ScoredCandidate};

/// Cosine similarity clamped to [-1, 1], or `None` when the vectors are
/// empty, their dimensions disagree, or either norm is (near) zero.
pub fn cosine_similarity(lhs: &[f32], rhs: &[f32]) -> Option<f32> {
	if lhs.is_empty() || lhs.len() != rhs.len() {
		return None;
	}

	let mut dot = 0.0_f32;
	let mut lhs_norm = 0.0_f32;
	let mut rhs_norm = 0.0_f32;

	for (l, r) in lhs.iter().zip(rhs.iter()) {
		dot += l * r;
		lhs_norm += l * l;
		rhs_norm += r * r;
	}

	if lhs_norm <= f32::EPSILON || rhs_norm <= f32::EPSILON {
		return None;
	}

	Some((dot / (lhs_norm.sqrt() * rhs_norm.sqrt())).clamp(-1.0, 1.0))
}

/// Scores every candidate against the query, preserving input order and
/// assigning 1-based retrieval ranks.
///
/// A candidate whose vector cannot be compared scores 0.0; one bad vector
/// never fails the batch. Negative similarities are floored to 0.0 so every
/// classical score lands in [0, 1].
pub fn score_candidates(query: &[f32], candidates: Vec<Candidate>) -> Vec<ScoredCandidate> {
	candidates
		.into_iter()
		.enumerate()
		.map(|(position, candidate)| {
			let classical_score =
				cosine_similarity(query, &candidate.vector).map_or(0.0, |sim| sim.max(0.0));

			ScoredCandidate { candidate, retrieval_rank: position as u32 + 1, classical_score }
		})
		.collect()
}
