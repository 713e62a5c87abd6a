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

use std::sync::Mutex;

use scoped_pool::Pool;

/// Square, symmetric matrix of pairwise cosine similarities.
pub struct SimilarityMatrix {
    rows: Vec<Vec<f64>>,
}

impl SimilarityMatrix {
    pub fn dim(&self) -> usize {
        self.rows.len()
    }

    pub fn at(&self, a: usize, b: usize) -> f64 {
        self.rows[a][b]
    }

    pub fn row(&self, index: usize) -> &[f64] {
        &self.rows[index]
    }
}

/// Computes the cosine similarity between all pairs of the given vectors,
/// fanning the rows out over a pool of `num_threads` workers.
///
/// A vector with norm zero has similarity 0.0 to everything, including
/// itself; every other diagonal entry is exactly 1.0. Each row is computed
/// from the shared input alone, so the result does not depend on the number
/// of workers.
pub fn pairwise_cosine(vectors: &[Vec<f64>], num_threads: usize) -> SimilarityMatrix {
    let norms: Vec<f64> = vectors
        .iter()
        .map(|vector| dot(vector, vector).sqrt())
        .collect();

    let row_slots: Vec<Mutex<Vec<f64>>> =
        (0..vectors.len()).map(|_| Mutex::new(Vec::new())).collect();

    let pool = Pool::new(num_threads.max(1));

    pool.scoped(|scope| {
        for (index, slot) in row_slots.iter().enumerate() {
            let norms = &norms;

            scope.execute(move || {
                *slot.lock().unwrap() = similarity_row(index, vectors, norms);
            });
        }
    });

    let rows = row_slots
        .into_iter()
        .map(|slot| slot.into_inner().unwrap())
        .collect();

    SimilarityMatrix { rows }
}

fn similarity_row(index: usize, vectors: &[Vec<f64>], norms: &[f64]) -> Vec<f64> {
    let mut row = vec![0.0; vectors.len()];

    if norms[index] == 0.0 {
        return row;
    }

    for (other, norm) in norms.iter().enumerate() {
        if other == index {
            row[other] = 1.0;
        } else if *norm > 0.0 {
            let similarity = dot(&vectors[index], &vectors[other]) / (norms[index] * norm);
            row[other] = similarity.min(1.0); // Round off error
        }
    }

    row
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn identical_vectors() {
        let vectors = vec![vec![1.0, 2.0, 3.0], vec![1.0, 2.0, 3.0]];

        let similarities = pairwise_cosine(&vectors, 2);

        assert_eq!(similarities.at(0, 0), 1.0);
        assert_eq!(similarities.at(1, 1), 1.0);
        assert!((similarities.at(0, 1) - 1.0).abs() < 0.000_000_1);
    }

    #[test]
    fn orthogonal_vectors() {
        let vectors = vec![vec![1.0, 0.0], vec![0.0, 1.0]];

        let similarities = pairwise_cosine(&vectors, 2);

        assert_eq!(similarities.at(0, 1), 0.0);
        assert_eq!(similarities.at(1, 0), 0.0);
    }

    #[test]
    fn known_similarity() {
        let vectors = vec![vec![1.0, 0.0], vec![1.0, 1.0]];

        let similarities = pairwise_cosine(&vectors, 2);

        let expected = 1.0 / 2.0_f64.sqrt();
        assert!((similarities.at(0, 1) - expected).abs() < 0.000_000_1);
    }

    #[test]
    fn zero_vector_is_similar_to_nothing() {
        let vectors = vec![vec![0.0, 0.0], vec![1.0, 1.0]];

        let similarities = pairwise_cosine(&vectors, 2);

        assert_eq!(similarities.at(0, 0), 0.0);
        assert_eq!(similarities.at(0, 1), 0.0);
        assert_eq!(similarities.at(1, 0), 0.0);
        assert_eq!(similarities.at(1, 1), 1.0);
    }

    #[test]
    fn symmetric_and_bounded() {
        let vectors = vec![
            vec![5.0, 3.0, 0.0, 1.0],
            vec![4.0, 0.0, 2.0, 1.0],
            vec![0.0, 0.0, 0.0, 0.0],
            vec![1.0, 1.0, 1.0, 1.0],
        ];

        let similarities = pairwise_cosine(&vectors, 3);

        for a in 0..similarities.dim() {
            for b in 0..similarities.dim() {
                let value = similarities.at(a, b);
                assert_eq!(value, similarities.at(b, a));
                assert!(value >= 0.0 && value <= 1.0);
            }
        }
    }

    #[test]
    fn independent_of_the_number_of_workers() {
        let vectors = vec![
            vec![5.0, 3.0, 0.0],
            vec![4.0, 0.0, 2.0],
            vec![0.0, 1.0, 5.0],
        ];

        let sequential = pairwise_cosine(&vectors, 1);
        let parallel = pairwise_cosine(&vectors, 4);

        for a in 0..sequential.dim() {
            assert_eq!(sequential.row(a), parallel.row(a));
        }
    }
}
