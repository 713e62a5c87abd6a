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

use std::fs::File;
use std::io;
use std::io::prelude::*;
use std::io::stdout;
use std::path::Path;

use serde::{Deserialize, Deserializer};
use serde_derive::Serialize;
use serde_json::json;

use crate::dataset::{Dataset, RatingEvent, Restaurant, User};
use crate::recommend::{Recommendation, Score};

pub const RESTAURANTS_FILE: &str = "restaurants.csv";
pub const USERS_FILE: &str = "users.csv";
pub const HISTORY_FILE: &str = "user_history.csv";

/// Opens a comma-separated record file. All three input files carry a header
/// line.
pub fn csv_reader(path: &Path) -> Result<csv::Reader<File>, csv::Error> {
    csv::ReaderBuilder::new().has_headers(true).from_path(path)
}

/// Reads restaurant records. Restaurants are reference data, so a malformed
/// record is a hard error rather than a silently dropped line.
pub fn restaurants_from_reader<R>(
    reader: &mut csv::Reader<R>,
) -> Result<Vec<Restaurant>, csv::Error>
where
    R: io::Read,
{
    reader.deserialize().collect()
}

/// Reads diner records, same strictness as the restaurant records.
pub fn users_from_reader<R>(reader: &mut csv::Reader<R>) -> Result<Vec<User>, csv::Error>
where
    R: io::Read,
{
    reader.deserialize().collect()
}

/// Reads the rating history. History lines are plentiful and noisy, lines
/// that fail to parse are dropped instead of failing the whole load.
pub fn events_from_reader<R>(reader: &mut csv::Reader<R>) -> Vec<RatingEvent>
where
    R: io::Read,
{
    reader.deserialize().filter_map(Result::ok).collect()
}

/// Loads `restaurants.csv`, `users.csv` and `user_history.csv` from a
/// directory into one snapshot.
pub fn load_dataset(data_dir: &Path) -> Result<Dataset, csv::Error> {
    let restaurants =
        restaurants_from_reader(&mut csv_reader(&data_dir.join(RESTAURANTS_FILE))?)?;
    let users = users_from_reader(&mut csv_reader(&data_dir.join(USERS_FILE))?)?;
    let events = events_from_reader(&mut csv_reader(&data_dir.join(HISTORY_FILE))?);

    Ok(Dataset::new(restaurants, users, events))
}

/// Deserializes an optional text field, mapping the empty string to `None`.
pub(crate) fn optional_field<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    let trimmed = raw.trim();

    if trimmed.is_empty() {
        Ok(None)
    } else {
        Ok(Some(trimmed.to_string()))
    }
}

/// Deserializes a `;`-separated list field such as `peanuts;shellfish`.
pub(crate) fn name_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;

    Ok(raw
        .split(';')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect())
}

/// Deserializes a `;`-separated list of numeric ids, dropping entries that
/// do not parse.
pub(crate) fn id_list<'de, D>(deserializer: D) -> Result<Vec<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;

    Ok(raw
        .split(';')
        .filter_map(|part| part.trim().parse().ok())
        .collect())
}

/// Struct used for JSON serialization of ranked results. Field names will be
/// used in JSON. Exactly one of the optional score fields is set, matching
/// the method that produced the list; popularity rankings carry their score
/// in `avg_rating` itself.
#[derive(Serialize)]
struct RecommendationRow<'a> {
    restaurant_id: u32,
    name: &'a str,
    cuisine: &'a str,
    location: &'a str,
    price_range: &'a str,
    avg_rating: f64,
    num_reviews: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    predicted_rating: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    hybrid_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    similarity_score: Option<f64>,
}

impl<'a> RecommendationRow<'a> {
    fn from(recommendation: &'a Recommendation) -> Self {
        let restaurant = &recommendation.restaurant;

        let mut row = RecommendationRow {
            restaurant_id: restaurant.id,
            name: &restaurant.name,
            cuisine: &restaurant.cuisine,
            location: &restaurant.location,
            price_range: restaurant.price.symbol(),
            avg_rating: restaurant.avg_rating,
            num_reviews: restaurant.num_reviews,
            predicted_rating: None,
            hybrid_score: None,
            similarity_score: None,
        };

        match recommendation.score {
            Score::PredictedRating(value) => row.predicted_rating = Some(value),
            Score::HybridScore(value) => row.hybrid_score = Some(value),
            Score::SimilarityScore(value) => row.similarity_score = Some(value),
            Score::AverageRating(_) => {}
        }

        row
    }
}

/// Outputs ranked results as one JSON object per line. If an `output_path`
/// is supplied, we write to a file at the specified path, otherwise, we
/// output to stdout.
pub fn write_recommendations(
    recommendations: &[Recommendation],
    output_path: Option<String>,
) -> io::Result<()> {
    let out: Box<dyn Write> = match output_path {
        Some(path) => Box::new(File::create(&Path::new(&path))?),
        _ => Box::new(stdout()),
    };

    write_recommendations_to(recommendations, out)
}

fn write_recommendations_to<W>(recommendations: &[Recommendation], mut out: W) -> io::Result<()>
where
    W: Write,
{
    for recommendation in recommendations {
        let row_as_json = json!(RecommendationRow::from(recommendation));
        writeln!(out, "{}", row_as_json)?;
    }

    Ok(())
}
