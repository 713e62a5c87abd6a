/**
 * TableReco
 * Copyright (C) 2025 TableReco contributors
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this program. If not, see <http://www.gnu.org/licenses/>.
 */

#[cfg(test)]
mod tests {

    use crate::dataset::{
        Dataset, PriceTier, RatingEvent, RatingValue, Restaurant, RestaurantFilter, User,
    };
    use crate::recommend::{HybridWeights, Score};
    use crate::{Recommender, DEFAULT_NEIGHBORS};

    fn restaurant(
        id: u32,
        name: &str,
        cuisine: &str,
        avg_rating: f64,
        num_reviews: u32,
    ) -> Restaurant {
        Restaurant {
            id,
            name: name.to_string(),
            cuisine: cuisine.to_string(),
            location: "Downtown".to_string(),
            price: PriceTier::Moderate,
            avg_rating,
            num_reviews,
        }
    }

    fn user(id: u32, username: &str) -> User {
        User {
            id,
            username: username.to_string(),
            join_date: "2022-06-01".to_string(),
            dietary: None,
            allergies: Vec::new(),
            alcohol: None,
            friends: Vec::new(),
        }
    }

    fn stars(user_id: u32, restaurant_id: u32, value: f64) -> RatingEvent {
        RatingEvent {
            user_id,
            restaurant_id,
            visit_date: "2023-05-01".to_string(),
            rating: RatingValue::Stars(value),
            comment: None,
        }
    }

    /* Three restaurants and four diners. Ana and ben agree on the first
       restaurant, ben and cleo both like the third one, and dora has never
       rated anything. Small enough to verify every prediction by hand. */
    fn sample_dataset() -> Dataset {
        Dataset::new(
            vec![
                restaurant(1, "The Golden Spoon", "Italian", 4.5, 120),
                restaurant(2, "Sakura Garden", "Japanese", 4.5, 80),
                restaurant(3, "Casa del Mar", "Mexican", 4.2, 150),
            ],
            vec![user(1, "ana"), user(2, "ben"), user(3, "cleo"), user(4, "dora")],
            vec![
                stars(1, 1, 5.0),
                stars(1, 2, 3.0),
                stars(2, 1, 4.0),
                stars(2, 3, 5.0),
                stars(3, 2, 2.0),
                stars(3, 3, 4.0),
            ],
        )
    }

    fn ids(recommendations: &[crate::recommend::Recommendation]) -> Vec<u32> {
        recommendations
            .iter()
            .map(|recommendation| recommendation.restaurant.id)
            .collect()
    }

    #[test]
    fn programmatic_usage() {

        /* Our input data comprises of restaurant and diner records plus the
           historical rating events between them. In a deployment these come
           out of the three record files, here we build them directly. */
        let data = sample_dataset();

        /* Building the engine derives the dense rating matrix and the two
           cosine similarity matrices once; all ranking methods afterwards
           are cheap lookups over this state. */
        let engine = Recommender::new(&data, 2).unwrap();

        /* The popularity ranking works without any personalization. */
        let top = engine.top_rated(3, &RestaurantFilter::default());

        println!("Highest rated restaurants:");
        for recommendation in top.iter() {
            println!(
                "\t{} ({:.1} stars, {} reviews)",
                recommendation.restaurant.name,
                recommendation.restaurant.avg_rating,
                recommendation.restaurant.num_reviews,
            );
        }

        /* For a known diner we can blend the collaborative filtering
           predictors with popularity into a personalized ranking. */
        let personalized = engine.recommend_hybrid(1, 3, &HybridWeights::default());

        println!("Recommended for ana:");
        for recommendation in personalized.iter() {
            println!(
                "\t{} (score {:.2})",
                recommendation.restaurant.name,
                recommendation.score.value(),
            );
        }

        assert_eq!(top.len(), 3);
        assert_eq!(personalized.len(), 3);
        /* Ana has rated the first two restaurants already, so the strongest
           recommendation for her is the one she has not been to. */
        assert_eq!(personalized[0].restaurant.id, 3);
    }

    #[test]
    fn user_based_scores_only_unrated_restaurants() {
        let data = sample_dataset();
        let engine = Recommender::new(&data, 2).unwrap();

        let recommendations = engine.recommend_user_based(1, 2, 10);

        // Ana rated restaurants 1 and 2, leaving only restaurant 3.
        assert_eq!(ids(&recommendations), vec![3]);

        match recommendations[0].score {
            Score::PredictedRating(value) => {
                // sim(ana, ben) = 20 / sqrt(34 * 41), sim(ana, cleo) = 6 / sqrt(34 * 20);
                // prediction = (sim_ben * 5 + sim_cleo * 4) / (sim_ben + sim_cleo)
                assert!((value - 4.6995).abs() < 0.001);
                assert!(value > 0.0 && value <= 5.0);
            }
            ref other => panic!("unexpected score {:?}", other),
        }
    }

    #[test]
    fn item_based_scores_only_unrated_restaurants() {
        let data = sample_dataset();
        let engine = Recommender::new(&data, 2).unwrap();

        let recommendations = engine.recommend_item_based(1, 10);

        assert_eq!(ids(&recommendations), vec![3]);

        match recommendations[0].score {
            Score::PredictedRating(value) => {
                // sim(r3, r1) = 20 / 41, sim(r3, r2) = 8 / sqrt(41 * 13);
                // prediction = (sim_r1 * 5 + sim_r2 * 3) / (sim_r1 + sim_r2)
                assert!((value - 4.1693).abs() < 0.001);
                assert!(value > 0.0 && value <= 5.0);
            }
            ref other => panic!("unexpected score {:?}", other),
        }
    }

    #[test]
    fn unknown_users_fall_back_to_the_popularity_ranking() {
        let data = sample_dataset();
        let engine = Recommender::new(&data, 2).unwrap();

        let fallback = engine.top_rated(3, &RestaurantFilter::default());

        assert_eq!(engine.recommend_user_based(99, 2, 3), fallback);
        assert_eq!(engine.recommend_item_based(99, 3), fallback);

        // The hybrid blend of three popularity fallbacks with weights
        // summing to one reproduces the popularity order.
        let hybrid = engine.recommend_hybrid(99, 3, &HybridWeights::default());
        assert_eq!(ids(&hybrid), ids(&fallback));
    }

    #[test]
    fn diners_without_history_degrade_to_the_popularity_ranking() {
        let data = sample_dataset();
        let engine = Recommender::new(&data, 2).unwrap();

        let fallback = engine.top_rated(3, &RestaurantFilter::default());

        // Dora is a known diner, but her rating vector is all zeros, so no
        // neighbor weight ever accumulates.
        assert_eq!(engine.recommend_user_based(4, 2, 3), fallback);
        assert_eq!(engine.recommend_item_based(4, 3), fallback);
        assert_eq!(
            ids(&engine.recommend_hybrid(4, 3, &HybridWeights::default())),
            ids(&fallback)
        );
    }

    #[test]
    fn popularity_breaks_rating_ties_by_review_count() {
        let data = sample_dataset();
        let engine = Recommender::new(&data, 2).unwrap();

        let top = engine.top_rated(3, &RestaurantFilter::default());

        // Restaurants 1 and 2 are both rated 4.5, but 1 has more reviews.
        assert_eq!(ids(&top), vec![1, 2, 3]);
    }

    #[test]
    fn demanding_filters_can_empty_the_ranking() {
        let data = sample_dataset();
        let engine = Recommender::new(&data, 2).unwrap();

        let demanding = RestaurantFilter {
            min_reviews: 1000,
            ..RestaurantFilter::default()
        };

        assert!(engine.top_rated(10, &demanding).is_empty());
    }

    #[test]
    fn hybrid_scores_are_the_weighted_sum_of_the_sources() {
        let data = sample_dataset();
        let engine = Recommender::new(&data, 2).unwrap();

        let weights = HybridWeights::default();
        let n = 3;

        let hybrid = engine.recommend_hybrid(1, n, &weights);
        assert_eq!(ids(&hybrid), vec![3, 1, 2]);

        // Recompute the blend from the three sources the hybrid consumes.
        let user_based = engine.recommend_user_based(1, DEFAULT_NEIGHBORS, n * 2);
        let item_based = engine.recommend_item_based(1, n * 2);
        let popular = engine.top_rated(n * 2, &RestaurantFilter::default());

        let source_score = |recommendations: &[crate::recommend::Recommendation], id: u32| {
            recommendations
                .iter()
                .find(|recommendation| recommendation.restaurant.id == id)
                .map(|recommendation| recommendation.score.value())
                .unwrap_or(0.0)
        };

        for recommendation in hybrid.iter() {
            let id = recommendation.restaurant.id;
            let expected = weights.user_cf * source_score(&user_based, id)
                + weights.item_cf * source_score(&item_based, id)
                + weights.popularity * source_score(&popular, id);

            match recommendation.score {
                Score::HybridScore(value) => assert!((value - expected).abs() < 0.000_000_1),
                ref other => panic!("unexpected score {:?}", other),
            }
        }
    }

    #[test]
    fn similar_restaurants_exclude_the_queried_one() {
        let data = sample_dataset();
        let engine = Recommender::new(&data, 2).unwrap();

        let similar = engine.similar_restaurants(1, 5);

        // Restaurant 2 shares ana's ratings with 1, restaurant 3 only ben's.
        assert_eq!(ids(&similar), vec![2, 3]);

        for recommendation in similar.iter() {
            assert_ne!(recommendation.restaurant.id, 1);
            match recommendation.score {
                Score::SimilarityScore(value) => assert!(value > 0.0 && value <= 1.0),
                ref other => panic!("unexpected score {:?}", other),
            }
        }
    }

    #[test]
    fn unknown_restaurants_have_no_similars() {
        let data = sample_dataset();
        let engine = Recommender::new(&data, 2).unwrap();

        assert!(engine.similar_restaurants(99, 5).is_empty());
    }

    #[test]
    fn repeated_queries_return_identical_results() {
        let data = sample_dataset();
        let engine = Recommender::new(&data, 2).unwrap();

        assert_eq!(
            engine.recommend_hybrid(1, 3, &HybridWeights::default()),
            engine.recommend_hybrid(1, 3, &HybridWeights::default())
        );
        assert_eq!(
            engine.recommend_user_based(3, 2, 5),
            engine.recommend_user_based(3, 2, 5)
        );
        assert_eq!(engine.similar_restaurants(2, 5), engine.similar_restaurants(2, 5));
    }

    #[test]
    fn similarity_matrices_are_symmetric_and_bounded() {
        let data = sample_dataset();
        let engine = Recommender::new(&data, 2).unwrap();

        let users = engine.user_similarity();
        for a in 0..users.dim() {
            for b in 0..users.dim() {
                let value = users.at(a, b);
                assert_eq!(value, users.at(b, a));
                assert!(value >= 0.0 && value <= 1.0);
            }
        }

        // Dora's all-zero rating vector keeps even her self-similarity at 0.
        assert_eq!(users.at(3, 3), 0.0);
        assert_eq!(users.at(0, 0), 1.0);

        let restaurants = engine.restaurant_similarity();
        for a in 0..restaurants.dim() {
            assert_eq!(restaurants.at(a, a), 1.0);
        }
    }
}
