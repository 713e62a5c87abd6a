//! Restaurant recommendations from historical rating data: user-based and
//! item-based collaborative filtering over cosine similarities, a popularity
//! ranking, and a weighted hybrid of the three, all computed from one
//! immutable dataset snapshot.

use std::cmp::Ordering;
use std::time::Instant;

use fnv::FnvHashMap;

pub mod dataset;
pub mod io;
pub mod matrix;
pub mod recommend;
pub mod similarity;
pub mod stats;
pub mod utils;

mod usage_tests;

use crate::dataset::{Dataset, RestaurantFilter};
use crate::matrix::{MatrixTooLarge, RatingMatrix};
use crate::recommend::{top_k, HybridWeights, RankedRestaurant, Recommendation, Score};
use crate::similarity::SimilarityMatrix;

/// Default neighborhood size of the user-based predictor.
pub const DEFAULT_NEIGHBORS: usize = 5;

/// Default number of recommendations.
pub const DEFAULT_RECOMMENDATIONS: usize = 10;

/// The recommendation engine. Building it derives the dense rating matrix
/// and the two similarity matrices from the snapshot; afterwards every
/// method is a read-only computation over that state, so repeated calls
/// with the same arguments return the same results.
pub struct Recommender<'a> {
    data: &'a Dataset,
    ratings: RatingMatrix,
    user_similarity: SimilarityMatrix,
    restaurant_similarity: SimilarityMatrix,
}

impl<'a> Recommender<'a> {
    /// Builds the engine from a snapshot. `num_threads` sizes the worker
    /// pool for the two pairwise similarity passes; the ranking methods
    /// themselves are single-threaded.
    pub fn new(data: &'a Dataset, num_threads: usize) -> Result<Recommender<'a>, MatrixTooLarge> {
        let start = Instant::now();

        let ratings = RatingMatrix::from_dataset(data)?;

        let user_similarity = similarity::pairwise_cosine(ratings.rows(), num_threads);
        let columns = ratings.column_vectors();
        let restaurant_similarity = similarity::pairwise_cosine(&columns, num_threads);

        println!(
            "{} ratings from {} users over {} restaurants, {}ms to derive the similarity matrices",
            ratings.num_ratings(),
            ratings.num_users(),
            ratings.num_restaurants(),
            utils::to_millis(start.elapsed())
        );

        Ok(Recommender {
            data,
            ratings,
            user_similarity,
            restaurant_similarity,
        })
    }

    pub fn dataset(&self) -> &Dataset {
        self.data
    }

    pub fn ratings(&self) -> &RatingMatrix {
        &self.ratings
    }

    pub fn user_similarity(&self) -> &SimilarityMatrix {
        &self.user_similarity
    }

    pub fn restaurant_similarity(&self) -> &SimilarityMatrix {
        &self.restaurant_similarity
    }

    /// Restaurants ranked by their aggregate rating, review count breaking
    /// ties, optionally restricted by an attribute filter. An empty
    /// candidate set yields an empty list.
    pub fn top_rated(&self, n: usize, filter: &RestaurantFilter) -> Vec<Recommendation> {
        let candidates =
            self.data
                .filter_restaurants(filter)
                .into_iter()
                .map(|restaurant| RankedRestaurant {
                    restaurant_id: restaurant.id,
                    score: restaurant.avg_rating,
                    num_reviews: restaurant.num_reviews,
                });

        self.attach(top_k(candidates, n), Score::AverageRating)
    }

    /// User-based collaborative filtering. Estimates a rating for every
    /// restaurant the target user has not rated, from the ratings of the
    /// `k_neighbors` most similar other users, and returns the best `n`.
    /// An unknown user, or a user for whom no candidate attracts any
    /// neighbor weight, falls back to the unfiltered popularity ranking.
    pub fn recommend_user_based(
        &self,
        user_id: u32,
        k_neighbors: usize,
        n: usize,
    ) -> Vec<Recommendation> {
        let user_position = match self.ratings.user_position(user_id) {
            Some(position) => position,
            None => return self.top_rated(n, &RestaurantFilter::default()),
        };

        let neighbors = self.nearest_users(user_position, k_neighbors);
        let target_row = self.ratings.row(user_position);

        let mut predictions: Vec<RankedRestaurant> = Vec::new();

        for restaurant_position in 0..self.ratings.num_restaurants() {
            if target_row[restaurant_position] > 0.0 {
                continue;
            }

            let mut weighted_sum = 0.0;
            let mut weight_total = 0.0;

            for &(neighbor_position, similarity) in neighbors.iter() {
                let rating = self.ratings.value(neighbor_position, restaurant_position);

                if rating > 0.0 {
                    weighted_sum += similarity * rating;
                    weight_total += similarity;
                }
            }

            if weight_total > 0.0 {
                predictions.push(self.ranked(restaurant_position, weighted_sum / weight_total));
            }
        }

        if predictions.is_empty() {
            return self.top_rated(n, &RestaurantFilter::default());
        }

        self.attach(top_k(predictions.into_iter(), n), Score::PredictedRating)
    }

    /// Item-based collaborative filtering. For every restaurant the target
    /// user has not rated, averages the user's own ratings weighted by
    /// item-item similarity; only positive similarities contribute. Fallback
    /// behavior matches the user-based predictor.
    pub fn recommend_item_based(&self, user_id: u32, n: usize) -> Vec<Recommendation> {
        let user_position = match self.ratings.user_position(user_id) {
            Some(position) => position,
            None => return self.top_rated(n, &RestaurantFilter::default()),
        };

        let target_row = self.ratings.row(user_position);

        let rated: Vec<(usize, f64)> = target_row
            .iter()
            .enumerate()
            .filter(|&(_, &rating)| rating > 0.0)
            .map(|(position, &rating)| (position, rating))
            .collect();

        if rated.is_empty() {
            return self.top_rated(n, &RestaurantFilter::default());
        }

        let mut predictions: Vec<RankedRestaurant> = Vec::new();

        for restaurant_position in 0..self.ratings.num_restaurants() {
            if target_row[restaurant_position] > 0.0 {
                continue;
            }

            let similarities = self.restaurant_similarity.row(restaurant_position);

            let mut weighted_sum = 0.0;
            let mut weight_total = 0.0;

            for &(rated_position, rating) in rated.iter() {
                let similarity = similarities[rated_position];

                if similarity > 0.0 {
                    weighted_sum += similarity * rating;
                    weight_total += similarity;
                }
            }

            if weight_total > 0.0 {
                predictions.push(self.ranked(restaurant_position, weighted_sum / weight_total));
            }
        }

        if predictions.is_empty() {
            return self.top_rated(n, &RestaurantFilter::default());
        }

        self.attach(top_k(predictions.into_iter(), n), Score::PredictedRating)
    }

    /// Blends user-based, item-based and popularity scores into one ranking.
    /// Each source contributes an oversized candidate list of `2 * n`
    /// entries; per restaurant, the weighted source scores are summed, and
    /// a source that does not mention a restaurant contributes nothing.
    pub fn recommend_hybrid(
        &self,
        user_id: u32,
        n: usize,
        weights: &HybridWeights,
    ) -> Vec<Recommendation> {
        let pool_size = n * 2;

        let sources = [
            (
                self.recommend_user_based(user_id, DEFAULT_NEIGHBORS, pool_size),
                weights.user_cf,
            ),
            (self.recommend_item_based(user_id, pool_size), weights.item_cf),
            (
                self.top_rated(pool_size, &RestaurantFilter::default()),
                weights.popularity,
            ),
        ];

        let mut blended: FnvHashMap<u32, f64> = FnvHashMap::default();

        for (recommendations, weight) in sources.iter() {
            for recommendation in recommendations {
                *blended.entry(recommendation.restaurant.id).or_insert(0.0) +=
                    weight * recommendation.score.value();
            }
        }

        let candidates = blended.into_iter().filter_map(|(restaurant_id, score)| {
            self.data.restaurant(restaurant_id).map(|restaurant| RankedRestaurant {
                restaurant_id,
                score,
                num_reviews: restaurant.num_reviews,
            })
        });

        self.attach(top_k(candidates, n), Score::HybridScore)
    }

    /// The `n` restaurants most similar to the given one by item-item
    /// cosine similarity. The queried restaurant itself is never part of
    /// the result. An unknown id yields an empty list, not the popularity
    /// fallback; there is no user to recommend for here.
    pub fn similar_restaurants(&self, restaurant_id: u32, n: usize) -> Vec<Recommendation> {
        let position = match self.ratings.restaurant_position(restaurant_id) {
            Some(position) => position,
            None => return Vec::new(),
        };

        let similarities = self.restaurant_similarity.row(position);

        let candidates = similarities
            .iter()
            .enumerate()
            .filter(|&(other, &similarity)| other != position && similarity > 0.0)
            .map(|(other, &similarity)| self.ranked(other, similarity));

        self.attach(top_k(candidates, n), Score::SimilarityScore)
    }

    /// The `k` users most similar to the given row, most similar first,
    /// ties broken by ascending position. The target row itself is
    /// excluded.
    fn nearest_users(&self, user_position: usize, k: usize) -> Vec<(usize, f64)> {
        let similarities = self.user_similarity.row(user_position);

        let mut neighbors: Vec<(usize, f64)> = similarities
            .iter()
            .enumerate()
            .filter(|&(position, _)| position != user_position)
            .map(|(position, &similarity)| (position, similarity))
            .collect();

        neighbors.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        neighbors.truncate(k);

        neighbors
    }

    fn ranked(&self, restaurant_position: usize, score: f64) -> RankedRestaurant {
        let restaurant_id = self.ratings.restaurant_id_at(restaurant_position);

        let num_reviews = self
            .data
            .restaurant(restaurant_id)
            .map(|restaurant| restaurant.num_reviews)
            .unwrap_or(0);

        RankedRestaurant {
            restaurant_id,
            score,
            num_reviews,
        }
    }

    fn attach(&self, ranked: Vec<RankedRestaurant>, make_score: fn(f64) -> Score) -> Vec<Recommendation> {
        ranked
            .into_iter()
            .filter_map(|candidate| {
                self.data.restaurant(candidate.restaurant_id).map(|restaurant| Recommendation {
                    restaurant: restaurant.clone(),
                    score: make_score(candidate.score),
                })
            })
            .collect()
    }
}
