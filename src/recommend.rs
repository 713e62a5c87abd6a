use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::dataset::Restaurant;

/// Weights of the three signals blended by the hybrid ranking. They are not
/// required to sum to one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HybridWeights {
    pub user_cf: f64,
    pub item_cf: f64,
    pub popularity: f64,
}

impl Default for HybridWeights {
    fn default() -> Self {
        HybridWeights {
            user_cf: 0.4,
            item_cf: 0.4,
            popularity: 0.2,
        }
    }
}

/// Score attached to a recommendation, named after the component that
/// produced it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Score {
    /// Neighbor-weighted rating estimate from one of the two predictors.
    PredictedRating(f64),
    /// Weighted blend of the hybrid signals.
    HybridScore(f64),
    /// Item-item cosine similarity from the "restaurants like this" lookup.
    SimilarityScore(f64),
    /// The restaurant's own aggregate rating.
    AverageRating(f64),
}

impl Score {
    pub fn value(&self) -> f64 {
        match *self {
            Score::PredictedRating(value)
            | Score::HybridScore(value)
            | Score::SimilarityScore(value)
            | Score::AverageRating(value) => value,
        }
    }
}

/// One entry of a ranked result list.
#[derive(Debug, Clone, PartialEq)]
pub struct Recommendation {
    pub restaurant: Restaurant,
    pub score: Score,
}

/// Ranking candidate. Results are ordered by score descending, review count
/// descending, id ascending; the same order for every ranking method.
#[derive(Debug, PartialEq)]
pub(crate) struct RankedRestaurant {
    pub restaurant_id: u32,
    pub score: f64,
    pub num_reviews: u32,
}

/// Ordering for our bounded heap, reversed so that the heap keeps the best
/// candidates and exposes the worst one at the top. Note that we must use a
/// handwritten implementation here as there is no total order on floating
/// point numbers.
fn cmp_reverse(a: &RankedRestaurant, b: &RankedRestaurant) -> Ordering {
    b.score
        .partial_cmp(&a.score)
        .unwrap_or(Ordering::Equal)
        .then_with(|| b.num_reviews.cmp(&a.num_reviews))
        .then_with(|| a.restaurant_id.cmp(&b.restaurant_id))
}

impl Eq for RankedRestaurant {}

impl Ord for RankedRestaurant {
    fn cmp(&self, other: &Self) -> Ordering {
        cmp_reverse(self, other)
    }
}

impl PartialOrd for RankedRestaurant {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(cmp_reverse(self, other))
    }
}

/// Retains the best `k` of the candidates and returns them best first.
pub(crate) fn top_k(
    candidates: impl Iterator<Item = RankedRestaurant>,
    k: usize,
) -> Vec<RankedRestaurant> {
    let mut heap = BinaryHeap::with_capacity(k);

    for candidate in candidates {
        if heap.len() < k {
            heap.push(candidate);
        } else if let Some(mut top) = heap.peek_mut() {
            if candidate < *top {
                *top = candidate;
            }
        }
    }

    heap.into_sorted_vec()
}
