//! Pure ranking core: cosine scoring, amplitude boosting, and result
//! assembly. No I/O happens here; every function is deterministic in its
//! inputs.

mod amplify;
mod assemble;
mod score;

pub use amplify::{BoostOutcome, BoostPolicy, amplify, passthrough};
pub use assemble::{assemble, cmp_f32_desc};
pub use score::{cosine_similarity, score_candidates};

use serde::{Deserialize, Serialize};

/// One retrieved chunk with its stored embedding.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Candidate {
	pub id: String,
	pub vector: Vec<f32>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ScoredCandidate {
	pub candidate: Candidate,
	/// 1-based position in the vector-store result order; the deterministic
	/// tie-breaker further down the pipeline.
	pub retrieval_rank: u32,
	pub classical_score: f32,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct BoostedCandidate {
	pub candidate: Candidate,
	pub retrieval_rank: u32,
	pub classical_score: f32,
	pub boosted_score: f32,
}

/// Final ordered results plus what the booster actually did.
#[derive(Clone, Debug)]
pub struct Ranking {
	pub items: Vec<BoostedCandidate>,
	pub outcome: BoostOutcome,
}

/// Runs the full pipeline: score, boost (or pass through), assemble.
pub fn rank(
	query: &[f32],
	candidates: Vec<Candidate>,
	policy: &BoostPolicy,
	top_k: usize,
	boost_enabled: bool,
) -> Ranking {
	let scored = score_candidates(query, candidates);
	let (boosted, outcome) = if boost_enabled {
		amplify(scored, policy)
	} else {
		(passthrough(scored), BoostOutcome::Disabled)
	};
	let items = assemble(boosted, top_k);

	Ranking { items, outcome }
}
