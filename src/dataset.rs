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

use fnv::FnvHashMap;
use serde_derive::Deserialize;

/// Lowest numeric rating a visit can carry.
pub const MIN_STARS: f64 = 1.0;
/// Highest numeric rating a visit can carry.
pub const MAX_STARS: f64 = 5.0;

/// Price tier of a restaurant, written as dollar signs in the record files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub enum PriceTier {
    #[serde(rename = "$")]
    Budget,
    #[serde(rename = "$$")]
    Moderate,
    #[serde(rename = "$$$")]
    Upscale,
    #[serde(rename = "$$$$")]
    Luxury,
}

impl PriceTier {
    pub fn symbol(&self) -> &'static str {
        match *self {
            PriceTier::Budget => "$",
            PriceTier::Moderate => "$$",
            PriceTier::Upscale => "$$$",
            PriceTier::Luxury => "$$$$",
        }
    }

    pub fn from_symbol(symbol: &str) -> Option<PriceTier> {
        match symbol.trim() {
            "$" => Some(PriceTier::Budget),
            "$$" => Some(PriceTier::Moderate),
            "$$$" => Some(PriceTier::Upscale),
            "$$$$" => Some(PriceTier::Luxury),
            _ => None,
        }
    }
}

/// One restaurant record. `avg_rating` and `num_reviews` are aggregates
/// maintained by whoever produced the record files, the engine only reads
/// them.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Restaurant {
    #[serde(rename = "restaurant_id")]
    pub id: u32,
    pub name: String,
    pub cuisine: String,
    pub location: String,
    #[serde(rename = "price_range")]
    pub price: PriceTier,
    pub avg_rating: f64,
    pub num_reviews: u32,
}

/// One diner record. The profile fields beyond the id are descriptive only,
/// none of the ranking methods look at them.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct User {
    #[serde(rename = "user_id")]
    pub id: u32,
    pub username: String,
    pub join_date: String,
    #[serde(default, deserialize_with = "crate::io::optional_field")]
    pub dietary: Option<String>,
    #[serde(default, deserialize_with = "crate::io::name_list")]
    pub allergies: Vec<String>,
    #[serde(default, deserialize_with = "crate::io::optional_field")]
    pub alcohol: Option<String>,
    #[serde(default, deserialize_with = "crate::io::id_list")]
    pub friends: Vec<u32>,
}

/// A single visit from the rating history.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RatingEvent {
    pub user_id: u32,
    pub restaurant_id: u32,
    pub visit_date: String,
    pub rating: RatingValue,
    #[serde(default)]
    pub comment: Option<String>,
}

/// Rating of a single visit. History files mix numeric stars with categorical
/// outcomes, and some lines carry no usable signal at all.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(from = "String")]
pub enum RatingValue {
    /// Numeric rating between [`MIN_STARS`] and [`MAX_STARS`].
    Stars(f64),
    /// "yes", the diner would go again.
    Liked,
    /// "meh", an indifferent visit.
    Meh,
    /// "no", the diner would not return.
    Disliked,
    /// "None", an empty value, or anything unparseable.
    Unrated,
}

impl From<String> for RatingValue {
    fn from(raw: String) -> Self {
        RatingValue::parse(&raw)
    }
}

impl RatingValue {
    fn parse(raw: &str) -> RatingValue {
        match raw.trim().to_lowercase().as_str() {
            "yes" => RatingValue::Liked,
            "meh" => RatingValue::Meh,
            "no" => RatingValue::Disliked,
            "" | "none" => RatingValue::Unrated,
            token => match token.parse::<f64>() {
                Ok(stars) if stars >= MIN_STARS && stars <= MAX_STARS => RatingValue::Stars(stars),
                _ => RatingValue::Unrated,
            },
        }
    }

    /// Effective score on the star scale. Categorical outcomes map to the
    /// extremes and the middle of the scale, `Unrated` to `None` so that it
    /// never enters the rating matrix.
    pub fn score(&self) -> Option<f64> {
        match *self {
            RatingValue::Stars(stars) => Some(stars),
            RatingValue::Liked => Some(5.0),
            RatingValue::Meh => Some(3.0),
            RatingValue::Disliked => Some(1.0),
            RatingValue::Unrated => None,
        }
    }
}

/// Attribute filter for the popularity ranking. The default filter matches
/// every restaurant.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RestaurantFilter {
    pub cuisine: Option<String>,
    pub location: Option<String>,
    pub price: Option<PriceTier>,
    pub min_reviews: u32,
    pub min_avg_rating: f64,
}

impl RestaurantFilter {
    pub fn matches(&self, restaurant: &Restaurant) -> bool {
        if let Some(ref cuisine) = self.cuisine {
            if restaurant.cuisine != *cuisine {
                return false;
            }
        }
        if let Some(ref location) = self.location {
            if restaurant.location != *location {
                return false;
            }
        }
        if let Some(price) = self.price {
            if restaurant.price != price {
                return false;
            }
        }

        restaurant.num_reviews >= self.min_reviews && restaurant.avg_rating >= self.min_avg_rating
    }
}

/// Immutable snapshot of the three record sets. Everything the engine
/// computes is derived from one snapshot; updating the data means loading a
/// new snapshot and building a new engine.
#[derive(Debug, Clone)]
pub struct Dataset {
    restaurants: Vec<Restaurant>,
    users: Vec<User>,
    events: Vec<RatingEvent>,
    restaurants_by_id: FnvHashMap<u32, usize>,
    users_by_id: FnvHashMap<u32, usize>,
}

impl Dataset {
    pub fn new(restaurants: Vec<Restaurant>, users: Vec<User>, events: Vec<RatingEvent>) -> Self {
        let restaurants_by_id = restaurants
            .iter()
            .enumerate()
            .map(|(index, restaurant)| (restaurant.id, index))
            .collect();

        let users_by_id = users
            .iter()
            .enumerate()
            .map(|(index, user)| (user.id, index))
            .collect();

        Dataset {
            restaurants,
            users,
            events,
            restaurants_by_id,
            users_by_id,
        }
    }

    pub fn restaurants(&self) -> &[Restaurant] {
        &self.restaurants
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn events(&self) -> &[RatingEvent] {
        &self.events
    }

    pub fn restaurant(&self, restaurant_id: u32) -> Option<&Restaurant> {
        self.restaurants_by_id
            .get(&restaurant_id)
            .map(|&index| &self.restaurants[index])
    }

    pub fn user(&self, user_id: u32) -> Option<&User> {
        self.users_by_id.get(&user_id).map(|&index| &self.users[index])
    }

    pub fn filter_restaurants(&self, filter: &RestaurantFilter) -> Vec<&Restaurant> {
        self.restaurants
            .iter()
            .filter(|restaurant| filter.matches(restaurant))
            .collect()
    }

    /// All rating events left by the given user, in record order.
    pub fn history_for_user(&self, user_id: u32) -> Vec<&RatingEvent> {
        self.events
            .iter()
            .filter(|event| event.user_id == user_id)
            .collect()
    }

    /// All rating events recorded for the given restaurant, in record order.
    pub fn ratings_for_restaurant(&self, restaurant_id: u32) -> Vec<&RatingEvent> {
        self.events
            .iter()
            .filter(|event| event.restaurant_id == restaurant_id)
            .collect()
    }

    /// Distinct cuisines, sorted.
    pub fn cuisines(&self) -> Vec<String> {
        let mut cuisines: Vec<String> = self
            .restaurants
            .iter()
            .map(|restaurant| restaurant.cuisine.clone())
            .collect();
        cuisines.sort();
        cuisines.dedup();
        cuisines
    }

    /// Distinct locations, sorted.
    pub fn locations(&self) -> Vec<String> {
        let mut locations: Vec<String> = self
            .restaurants
            .iter()
            .map(|restaurant| restaurant.location.clone())
            .collect();
        locations.sort();
        locations.dedup();
        locations
    }
}
