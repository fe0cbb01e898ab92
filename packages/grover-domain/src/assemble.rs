use std::{cmp::Ordering, collections::HashMap};

use crate::BoostedCandidate;

/// Deduplicates by candidate id, orders, and truncates to `top_k`.
///
/// A duplicated id keeps the occurrence with the higher boosted score; equal
/// scores keep the earlier retrieval rank. The final order is boosted score
/// descending, ties broken by ascending retrieval rank and then id, so the
/// same input always yields the same output order.
pub fn assemble(boosted: Vec<BoostedCandidate>, top_k: usize) -> Vec<BoostedCandidate> {
	if top_k == 0 {
		return Vec::new();
	}

	let mut best: HashMap<String, BoostedCandidate> = HashMap::with_capacity(boosted.len());

	for item in boosted {
		match best.get_mut(&item.candidate.id) {
			Some(kept) => {
				let higher_score = item.boosted_score > kept.boosted_score;
				let earlier_at_same_score = item.boosted_score == kept.boosted_score
					&& item.retrieval_rank < kept.retrieval_rank;

				if higher_score || earlier_at_same_score {
					*kept = item;
				}
			},
			None => {
				best.insert(item.candidate.id.clone(), item);
			},
		}
	}

	let mut items: Vec<BoostedCandidate> = best.into_values().collect();

	items.sort_by(|lhs, rhs| {
		cmp_f32_desc(lhs.boosted_score, rhs.boosted_score)
			.then_with(|| lhs.retrieval_rank.cmp(&rhs.retrieval_rank))
			.then_with(|| lhs.candidate.id.cmp(&rhs.candidate.id))
	});
	items.truncate(top_k);

	items
}

/// Descending comparator for scores; NaN sorts last.
pub fn cmp_f32_desc(a: f32, b: f32) -> Ordering {
	match (a.is_nan(), b.is_nan()) {
		(true, true) => Ordering::Equal,
		(true, false) => Ordering::Greater,
		(false, true) => Ordering::Less,
		(false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
	}
}
