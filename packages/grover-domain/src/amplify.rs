use std::f64::consts::FRAC_PI_4;

use crate::{BoostedCandidate, ScoredCandidate};

/// Amplification parameters, fixed for the lifetime of one search.
#[derive(Clone, Copy, Debug)]
pub struct BoostPolicy {
	/// Classical score at or above this is marked for boosting (inclusive).
	pub similarity_threshold: f32,
	pub boost_factor: f32,
	/// Largest candidate set the booster will touch; larger sets pass
	/// through untouched.
	pub max_candidates: usize,
	pub iteration_cap: u32,
}

/// What the booster actually did with a candidate set.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BoostOutcome {
	/// The boost formula ran for `iterations` rounds over `marked`
	/// candidates.
	Amplified { iterations: u32, marked: usize },
	/// The candidate set exceeded `max_candidates`; scores passed through.
	TooManyCandidates,
	/// Nothing cleared the similarity threshold; scores passed through.
	NoMarkedCandidates,
	/// The caller asked for the classical path.
	Disabled,
}
impl BoostOutcome {
	pub fn applied(&self) -> bool {
		matches!(self, Self::Amplified { .. })
	}
}

/// Re-scores candidates whose classical score clears the threshold.
///
/// With `M` marked out of `N` candidates, `r = floor(pi/4 * sqrt(N / M))`
/// rounds (clamped to `[1, iteration_cap]`) yield the gain
/// `sin^2((2r + 1) * asin(sqrt(M / N)))`, clamped to [0, 1]. A marked
/// candidate's boosted score is `classical * (1 + boost_factor * gain)`
/// clamped to [0, 1]; unmarked candidates keep their classical score
/// untouched. The all-marked corner needs no special case: `asin(1) = pi/2`,
/// one round, gain `sin^2(3pi/2) = 1`.
pub fn amplify(
	scored: Vec<ScoredCandidate>,
	policy: &BoostPolicy,
) -> (Vec<BoostedCandidate>, BoostOutcome) {
	let total = scored.len();

	if total == 0 {
		return (Vec::new(), BoostOutcome::NoMarkedCandidates);
	}
	if total > policy.max_candidates {
		return (passthrough(scored), BoostOutcome::TooManyCandidates);
	}

	let marked =
		scored.iter().filter(|item| item.classical_score >= policy.similarity_threshold).count();

	if marked == 0 {
		return (passthrough(scored), BoostOutcome::NoMarkedCandidates);
	}

	let iterations = optimal_iterations(total, marked, policy.iteration_cap);
	let gain = amplification_gain(total, marked, iterations);
	let boosted = scored
		.into_iter()
		.map(|item| {
			let boosted_score = if item.classical_score >= policy.similarity_threshold {
				boost_score(item.classical_score, policy.boost_factor, gain)
			} else {
				item.classical_score
			};

			BoostedCandidate {
				candidate: item.candidate,
				retrieval_rank: item.retrieval_rank,
				classical_score: item.classical_score,
				boosted_score,
			}
		})
		.collect();

	(boosted, BoostOutcome::Amplified { iterations, marked })
}

/// Copies every classical score through unchanged.
pub fn passthrough(scored: Vec<ScoredCandidate>) -> Vec<BoostedCandidate> {
	scored
		.into_iter()
		.map(|item| BoostedCandidate {
			candidate: item.candidate,
			retrieval_rank: item.retrieval_rank,
			classical_score: item.classical_score,
			boosted_score: item.classical_score,
		})
		.collect()
}

fn optimal_iterations(total: usize, marked: usize, cap: u32) -> u32 {
	let ratio = total as f64 / marked as f64;
	let ideal = (FRAC_PI_4 * ratio.sqrt()).floor();

	(ideal as u32).clamp(1, cap)
}

fn amplification_gain(total: usize, marked: usize, iterations: u32) -> f64 {
	let theta = (marked as f64 / total as f64).sqrt().asin();
	let rotated = f64::from(2 * iterations + 1) * theta;

	rotated.sin().powi(2).clamp(0.0, 1.0)
}

fn boost_score(classical: f32, boost_factor: f32, gain: f64) -> f32 {
	let boosted = f64::from(classical) * (1.0 + f64::from(boost_factor) * gain);

	boosted.clamp(0.0, 1.0) as f32
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::Candidate;

	fn scored(id: &str, rank: u32, classical_score: f32) -> ScoredCandidate {
		ScoredCandidate {
			candidate: Candidate { id: id.to_string(), vector: Vec::new() },
			retrieval_rank: rank,
			classical_score,
		}
	}

	fn test_policy(similarity_threshold: f32, boost_factor: f32) -> BoostPolicy {
		BoostPolicy { similarity_threshold, boost_factor, max_candidates: 1_024, iteration_cap: 10 }
	}

	#[test]
	fn iterations_floor_and_clamp() {
		assert_eq!(optimal_iterations(1_024, 1, 10), 10);
		assert_eq!(optimal_iterations(100, 4, 10), 3);
		assert_eq!(optimal_iterations(4, 4, 10), 1);
		assert_eq!(optimal_iterations(1_024, 1, 5), 5);
	}

	#[test]
	fn full_marked_gain_is_one() {
		let gain = amplification_gain(8, 8, 1);

		assert!((gain - 1.0).abs() < 1e-9);
	}

	#[test]
	fn gain_stays_in_unit_interval() {
		for marked in 1..=64_usize {
			for iterations in 1..=10 {
				let gain = amplification_gain(64, marked, iterations);

				assert!((0.0..=1.0).contains(&gain), "gain {gain} out of range");
			}
		}
	}

	#[test]
	fn boosted_score_clamps_at_one() {
		assert_eq!(boost_score(0.9, 2.0, 1.0), 1.0);
	}

	#[test]
	fn empty_input_yields_empty_output() {
		let (boosted, outcome) = amplify(Vec::new(), &test_policy(0.7, 2.0));

		assert!(boosted.is_empty());
		assert_eq!(outcome, BoostOutcome::NoMarkedCandidates);
	}

	#[test]
	fn oversized_set_passes_through() {
		let policy = BoostPolicy {
			similarity_threshold: 0.1,
			boost_factor: 2.0,
			max_candidates: 2,
			iteration_cap: 10,
		};
		let input = vec![scored("a", 1, 0.9), scored("b", 2, 0.8), scored("c", 3, 0.7)];
		let (boosted, outcome) = amplify(input, &policy);

		assert_eq!(outcome, BoostOutcome::TooManyCandidates);

		for item in &boosted {
			assert_eq!(item.boosted_score, item.classical_score);
		}
	}

	#[test]
	fn threshold_is_inclusive() {
		let input = vec![scored("at", 1, 0.7), scored("below", 2, 0.699)];
		let (boosted, outcome) = amplify(input, &test_policy(0.7, 2.0));

		assert_eq!(outcome, BoostOutcome::Amplified { iterations: 1, marked: 1 });
		assert!(boosted[0].boosted_score > boosted[0].classical_score);
		assert_eq!(boosted[1].boosted_score, boosted[1].classical_score);
	}

	#[test]
	fn no_marked_candidates_pass_through() {
		let input = vec![scored("a", 1, 0.2), scored("b", 2, 0.5)];
		let (boosted, outcome) = amplify(input, &test_policy(0.7, 2.0));

		assert_eq!(outcome, BoostOutcome::NoMarkedCandidates);
		assert_eq!(boosted[0].boosted_score, 0.2);
		assert_eq!(boosted[1].boosted_score, 0.5);
	}

	#[test]
	fn unmarked_candidates_are_untouched() {
		let input = vec![scored("hit", 1, 0.8), scored("miss", 2, 0.3)];
		let (boosted, _) = amplify(input, &test_policy(0.7, 2.0));

		assert_eq!(boosted[1].classical_score, 0.3);
		assert_eq!(boosted[1].boosted_score, 0.3);
	}

	#[test]
	fn zero_boost_factor_keeps_scores() {
		let input = vec![scored("a", 1, 0.8)];
		let (boosted, outcome) = amplify(input, &test_policy(0.7, 0.0));

		assert!(outcome.applied());
		assert_eq!(boosted[0].boosted_score, boosted[0].classical_score);
	}
}
