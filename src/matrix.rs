use std::error::Error;
use std::fmt;

use fnv::FnvHashMap;

use crate::dataset::Dataset;

/// Upper bound on the number of cells (users x restaurants) of the dense
/// rating matrix. The same budget caps the two square similarity matrices
/// derived from it, so the largest axis alone must stay within it.
/// Datasets beyond this are rejected before any allocation happens.
pub const MAX_RATING_MATRIX_CELLS: usize = 50_000_000;

/// Returned when a dataset would exceed [`MAX_RATING_MATRIX_CELLS`].
#[derive(Debug, Clone, PartialEq)]
pub struct MatrixTooLarge {
    pub num_users: usize,
    pub num_restaurants: usize,
}

impl fmt::Display for MatrixTooLarge {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(
            formatter,
            "Dense matrices for {} users and {} restaurants would exceed the limit of {} cells",
            self.num_users, self.num_restaurants, MAX_RATING_MATRIX_CELLS
        )
    }
}

impl Error for MatrixTooLarge {}

/// Dense user-restaurant rating matrix. Rows are users and columns are
/// restaurants, both ordered by ascending id. A cell value of 0.0 means
/// "not rated"; effective scores are always at least 1.
#[derive(Debug)]
pub struct RatingMatrix {
    user_ids: Vec<u32>,
    restaurant_ids: Vec<u32>,
    user_positions: FnvHashMap<u32, usize>,
    restaurant_positions: FnvHashMap<u32, usize>,
    rows: Vec<Vec<f64>>,
    num_ratings: usize,
}

impl RatingMatrix {
    /// Builds the matrix from the snapshot's rating events. Every user and
    /// restaurant known to the snapshot gets a row or column, whether or not
    /// it occurs in an event. Events referencing unknown ids or carrying no
    /// effective score are dropped. When a user rated the same restaurant
    /// more than once, the cell holds the mean of the effective scores.
    pub fn from_dataset(data: &Dataset) -> Result<RatingMatrix, MatrixTooLarge> {
        let mut user_ids: Vec<u32> = data.users().iter().map(|user| user.id).collect();
        user_ids.sort_unstable();
        user_ids.dedup();

        let mut restaurant_ids: Vec<u32> =
            data.restaurants().iter().map(|restaurant| restaurant.id).collect();
        restaurant_ids.sort_unstable();
        restaurant_ids.dedup();

        // The largest axis bounds all three dense matrices derived from a
        // snapshot: the rating matrix has at most largest^2 cells, and the
        // two similarity matrices are square over one axis each.
        let largest_axis = user_ids.len().max(restaurant_ids.len());

        match largest_axis.checked_mul(largest_axis) {
            Some(num_cells) if num_cells <= MAX_RATING_MATRIX_CELLS => {}
            _ => {
                return Err(MatrixTooLarge {
                    num_users: user_ids.len(),
                    num_restaurants: restaurant_ids.len(),
                })
            }
        }

        let user_positions: FnvHashMap<u32, usize> = user_ids
            .iter()
            .enumerate()
            .map(|(position, &id)| (id, position))
            .collect();

        let restaurant_positions: FnvHashMap<u32, usize> = restaurant_ids
            .iter()
            .enumerate()
            .map(|(position, &id)| (id, position))
            .collect();

        // Sparse pass first, so that duplicate events can be averaged before
        // the dense rows are filled.
        let mut cells: FnvHashMap<(usize, usize), (f64, u32)> = FnvHashMap::default();

        for event in data.events() {
            let score = match event.rating.score() {
                Some(score) => score,
                None => continue,
            };
            let user = match user_positions.get(&event.user_id) {
                Some(&position) => position,
                None => continue,
            };
            let restaurant = match restaurant_positions.get(&event.restaurant_id) {
                Some(&position) => position,
                None => continue,
            };

            let cell = cells.entry((user, restaurant)).or_insert((0.0, 0));
            cell.0 += score;
            cell.1 += 1;
        }

        let num_ratings = cells.len();

        let mut rows = vec![vec![0.0; restaurant_ids.len()]; user_ids.len()];
        for ((user, restaurant), (sum, count)) in cells {
            rows[user][restaurant] = sum / f64::from(count);
        }

        Ok(RatingMatrix {
            user_ids,
            restaurant_ids,
            user_positions,
            restaurant_positions,
            rows,
            num_ratings,
        })
    }

    pub fn num_users(&self) -> usize {
        self.user_ids.len()
    }

    pub fn num_restaurants(&self) -> usize {
        self.restaurant_ids.len()
    }

    /// Number of cells holding a rating.
    pub fn num_ratings(&self) -> usize {
        self.num_ratings
    }

    pub fn user_ids(&self) -> &[u32] {
        &self.user_ids
    }

    pub fn restaurant_ids(&self) -> &[u32] {
        &self.restaurant_ids
    }

    pub fn user_position(&self, user_id: u32) -> Option<usize> {
        self.user_positions.get(&user_id).cloned()
    }

    pub fn restaurant_position(&self, restaurant_id: u32) -> Option<usize> {
        self.restaurant_positions.get(&restaurant_id).cloned()
    }

    pub fn user_id_at(&self, position: usize) -> u32 {
        self.user_ids[position]
    }

    pub fn restaurant_id_at(&self, position: usize) -> u32 {
        self.restaurant_ids[position]
    }

    pub fn value(&self, user_position: usize, restaurant_position: usize) -> f64 {
        self.rows[user_position][restaurant_position]
    }

    /// All user rating vectors, one row per user.
    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn row(&self, user_position: usize) -> &[f64] {
        &self.rows[user_position]
    }

    /// Per-restaurant rating vectors, the transposed matrix materialized for
    /// the column-wise similarity pass.
    pub fn column_vectors(&self) -> Vec<Vec<f64>> {
        let mut columns = vec![vec![0.0; self.user_ids.len()]; self.restaurant_ids.len()];

        for (user_position, row) in self.rows.iter().enumerate() {
            for (restaurant_position, &value) in row.iter().enumerate() {
                columns[restaurant_position][user_position] = value;
            }
        }

        columns
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::dataset::{PriceTier, RatingEvent, RatingValue, Restaurant, User};

    fn restaurant(id: u32) -> Restaurant {
        Restaurant {
            id,
            name: format!("restaurant-{}", id),
            cuisine: "Thai".to_string(),
            location: "Downtown".to_string(),
            price: PriceTier::Moderate,
            avg_rating: 4.0,
            num_reviews: 10,
        }
    }

    fn user(id: u32) -> User {
        User {
            id,
            username: format!("user-{}", id),
            join_date: "2023-01-01".to_string(),
            dietary: None,
            allergies: Vec::new(),
            alcohol: None,
            friends: Vec::new(),
        }
    }

    fn event(user_id: u32, restaurant_id: u32, rating: RatingValue) -> RatingEvent {
        RatingEvent {
            user_id,
            restaurant_id,
            visit_date: "2023-05-01".to_string(),
            rating,
            comment: None,
        }
    }

    #[test]
    fn every_known_id_gets_a_row_and_column() {
        let data = Dataset::new(
            vec![restaurant(1), restaurant(2)],
            vec![user(1), user(2), user(3)],
            vec![event(1, 1, RatingValue::Stars(4.0))],
        );

        let matrix = RatingMatrix::from_dataset(&data).unwrap();

        assert_eq!(matrix.num_users(), 3);
        assert_eq!(matrix.num_restaurants(), 2);
        assert_eq!(matrix.num_ratings(), 1);

        // User 3 never rated anything but still owns a row.
        let position = matrix.user_position(3).unwrap();
        assert!(matrix.row(position).iter().all(|&value| value == 0.0));

        let rated = matrix.user_position(1).unwrap();
        let column = matrix.restaurant_position(1).unwrap();
        assert_eq!(matrix.value(rated, column), 4.0);
    }

    #[test]
    fn positions_follow_ascending_ids() {
        let data = Dataset::new(
            vec![restaurant(30), restaurant(10), restaurant(20)],
            vec![user(5), user(2)],
            Vec::new(),
        );

        let matrix = RatingMatrix::from_dataset(&data).unwrap();

        assert_eq!(matrix.restaurant_ids(), &[10, 20, 30]);
        assert_eq!(matrix.user_ids(), &[2, 5]);
        assert_eq!(matrix.restaurant_position(10), Some(0));
        assert_eq!(matrix.restaurant_id_at(2), 30);
        assert_eq!(matrix.user_id_at(0), 2);
    }

    #[test]
    fn duplicate_events_collapse_into_their_mean() {
        let data = Dataset::new(
            vec![restaurant(1)],
            vec![user(1)],
            vec![
                event(1, 1, RatingValue::Stars(4.0)),
                event(1, 1, RatingValue::Liked),
            ],
        );

        let matrix = RatingMatrix::from_dataset(&data).unwrap();

        // (4.0 + 5.0) / 2
        assert_eq!(matrix.value(0, 0), 4.5);
        assert_eq!(matrix.num_ratings(), 1);
    }

    #[test]
    fn unknown_ids_and_unrated_events_are_dropped() {
        let data = Dataset::new(
            vec![restaurant(1)],
            vec![user(1)],
            vec![
                event(1, 1, RatingValue::Unrated),
                event(99, 1, RatingValue::Stars(5.0)),
                event(1, 99, RatingValue::Stars(5.0)),
                event(1, 1, RatingValue::Disliked),
            ],
        );

        let matrix = RatingMatrix::from_dataset(&data).unwrap();

        assert_eq!(matrix.num_ratings(), 1);
        assert_eq!(matrix.value(0, 0), 1.0);
    }

    #[test]
    fn categorical_outcomes_map_onto_the_star_scale() {
        let data = Dataset::new(
            vec![restaurant(1), restaurant(2), restaurant(3)],
            vec![user(1)],
            vec![
                event(1, 1, RatingValue::Liked),
                event(1, 2, RatingValue::Meh),
                event(1, 3, RatingValue::Disliked),
            ],
        );

        let matrix = RatingMatrix::from_dataset(&data).unwrap();

        assert_eq!(matrix.row(0), &[5.0, 3.0, 1.0]);
    }

    #[test]
    fn oversized_datasets_are_rejected() {
        let users = (1..=10_000).map(user).collect();
        let restaurants = (1..=5_001).map(restaurant).collect();

        let data = Dataset::new(restaurants, users, Vec::new());

        let failure = RatingMatrix::from_dataset(&data).unwrap_err();
        assert_eq!(failure.num_users, 10_000);
        assert_eq!(failure.num_restaurants, 5_001);
    }

    #[test]
    fn skewed_datasets_are_rejected_before_the_similarity_passes() {
        // 8_000 users over 2 restaurants stay far below the cell budget as
        // a product, but the user similarity matrix alone would need 64
        // million cells.
        let users = (1..=8_000).map(user).collect();
        let restaurants = (1..=2).map(restaurant).collect();

        let data = Dataset::new(restaurants, users, Vec::new());

        let failure = RatingMatrix::from_dataset(&data).unwrap_err();
        assert_eq!(failure.num_users, 8_000);
        assert_eq!(failure.num_restaurants, 2);
    }
}
