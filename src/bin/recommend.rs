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

use std::env;
use std::error::Error;
use std::path::Path;
use std::process;

use getopts::Options;

use tablereco::dataset::{PriceTier, RestaurantFilter};
use tablereco::io;
use tablereco::recommend::HybridWeights;
use tablereco::stats::DatasetStats;
use tablereco::{Recommender, DEFAULT_NEIGHBORS, DEFAULT_RECOMMENDATIONS};

const DEFAULT_MIN_REVIEWS: u32 = 5;

struct Args {
    data_dir: String,
    method: String,
    user: Option<u32>,
    restaurant: Option<u32>,
    n: usize,
    k_neighbors: usize,
    num_threads: usize,
    filter: RestaurantFilter,
    output_path: Option<String>,
}

fn main() {

    let raw_args: Vec<String> = env::args().collect();
    let program = raw_args[0].clone();

    let mut opts = Options::new();
    opts.optopt("d", "data-dir", "Directory holding restaurants.csv, users.csv and \
        user_history.csv (required).", "PATH");
    opts.optopt("m", "method", "Ranking method: top, user, item, hybrid or similar \
        (optional, defaults to top).", "NAME");
    opts.optopt("u", "user", "Id of the diner to recommend for, required by the user, item \
        and hybrid methods.", "ID");
    opts.optopt("r", "restaurant", "Id of the restaurant to find similar restaurants for, \
        required by the similar method.", "ID");
    opts.optopt("n", "num-recommendations", "Number of results to compute (optional, \
        defaults to 10).", "NUMBER");
    opts.optopt("k", "neighbors", "Neighborhood size of the user method (optional, \
        defaults to 5).", "NUMBER");
    opts.optopt("c", "cuisine", "Only rank restaurants of this cuisine (top method only).", "NAME");
    opts.optopt("l", "location", "Only rank restaurants in this location (top method \
        only).", "NAME");
    opts.optopt("p", "price", "Only rank restaurants of this price tier: $, $$, $$$ or \
        $$$$ (top method only).", "TIER");
    opts.optopt("", "min-reviews", "Minimum review count of ranked restaurants (top method \
        only, defaults to 5).", "NUMBER");
    opts.optopt("", "min-rating", "Minimum aggregate rating of ranked restaurants (top \
        method only, defaults to 0).", "NUMBER");
    opts.optopt("t", "threads", "Worker pool size of the similarity computation (optional, \
        defaults to the number of CPUs).", "NUMBER");
    opts.optopt("o", "outputfile", "Output file name (optional, output will be written to \
        stdout by default).", "PATH");
    opts.optflag("h", "help", "Print this help menu");

    let matches = match opts.parse(&raw_args[1..]) {
        Ok(matches) => matches,
        Err(failure) => {
            let hint = failure.to_string();
            return print_usage_and_exit(&program, opts, Some(&hint))
        },
    };

    if matches.opt_present("h") {
        return print_usage_and_exit(&program, opts, None);
    }

    if !matches.opt_present("d") {
        return print_usage_and_exit(
            &program,
            opts,
            Some("Please specify a data directory via --data-dir."),
        );
    }

    let n: usize = match matches.opt_get_default("n", DEFAULT_RECOMMENDATIONS) {
        Ok(n) => n,
        Err(failure) => {
            let hint = format!("Problem with option 'n': {}", failure);
            return print_usage_and_exit(&program, opts, Some(&hint))
        },
    };

    let k_neighbors: usize = match matches.opt_get_default("k", DEFAULT_NEIGHBORS) {
        Ok(k_neighbors) => k_neighbors,
        Err(failure) => {
            let hint = format!("Problem with option 'k': {}", failure);
            return print_usage_and_exit(&program, opts, Some(&hint))
        },
    };

    let num_threads: usize = match matches.opt_get_default("t", num_cpus::get()) {
        Ok(num_threads) => num_threads,
        Err(failure) => {
            let hint = format!("Problem with option 't': {}", failure);
            return print_usage_and_exit(&program, opts, Some(&hint))
        },
    };

    let min_reviews: u32 = match matches.opt_get_default("min-reviews", DEFAULT_MIN_REVIEWS) {
        Ok(min_reviews) => min_reviews,
        Err(failure) => {
            let hint = format!("Problem with option 'min-reviews': {}", failure);
            return print_usage_and_exit(&program, opts, Some(&hint))
        },
    };

    let min_avg_rating: f64 = match matches.opt_get_default("min-rating", 0.0) {
        Ok(min_avg_rating) => min_avg_rating,
        Err(failure) => {
            let hint = format!("Problem with option 'min-rating': {}", failure);
            return print_usage_and_exit(&program, opts, Some(&hint))
        },
    };

    let user: Option<u32> = match matches.opt_get("u") {
        Ok(user) => user,
        Err(failure) => {
            let hint = format!("Problem with option 'u': {}", failure);
            return print_usage_and_exit(&program, opts, Some(&hint))
        },
    };

    let restaurant: Option<u32> = match matches.opt_get("r") {
        Ok(restaurant) => restaurant,
        Err(failure) => {
            let hint = format!("Problem with option 'r': {}", failure);
            return print_usage_and_exit(&program, opts, Some(&hint))
        },
    };

    let price = match matches.opt_str("p") {
        None => None,
        Some(symbol) => match PriceTier::from_symbol(&symbol) {
            Some(tier) => Some(tier),
            None => {
                return print_usage_and_exit(
                    &program,
                    opts,
                    Some("Unknown price tier, expected one of $, $$, $$$ or $$$$."),
                )
            },
        },
    };

    let args = Args {
        data_dir: matches.opt_str("d").unwrap(),
        method: matches.opt_str("m").unwrap_or_else(|| "top".to_string()),
        user,
        restaurant,
        n,
        k_neighbors,
        num_threads,
        filter: RestaurantFilter {
            cuisine: matches.opt_str("c"),
            location: matches.opt_str("l"),
            price,
            min_reviews,
            min_avg_rating,
        },
        output_path: matches.opt_str("o"),
    };

    if let Err(failure) = recommend(args) {
        eprintln!("{}", failure);
        process::exit(1);
    }
}

fn print_usage_and_exit(
    program: &str,
    opts: Options,
    hint: Option<&str>
) {

    if let Some(hint) = hint {
        eprintln!("\n{}\n", hint);
    }

    let brief = format!("Usage: {} [options]", program);
    eprint!("{}", opts.usage(&brief));
}

fn recommend(args: Args) -> Result<(), Box<dyn Error>> {

    let data_dir = Path::new(&args.data_dir);

    println!("Loading restaurant, diner and rating records from {}", data_dir.display());

    let data = io::load_dataset(data_dir)?;
    let stats = DatasetStats::from(&data);

    println!(
        "Found {} rating events from {} diners over {} restaurants ({} cuisines, {:.2} average rating).",
        stats.num_rating_events,
        stats.num_users,
        stats.num_restaurants,
        stats.num_cuisines,
        stats.overall_avg_rating,
    );

    let engine = Recommender::new(&data, args.num_threads)?;

    let recommendations = match args.method.as_str() {
        "top" => engine.top_rated(args.n, &args.filter),
        "user" => engine.recommend_user_based(require_user(args.user)?, args.k_neighbors, args.n),
        "item" => engine.recommend_item_based(require_user(args.user)?, args.n),
        "hybrid" => engine.recommend_hybrid(
            require_user(args.user)?,
            args.n,
            &HybridWeights::default(),
        ),
        "similar" => {
            let restaurant_id = args
                .restaurant
                .ok_or("The similar method needs a restaurant id via --restaurant.")?;
            engine.similar_restaurants(restaurant_id, args.n)
        },
        other => {
            return Err(
                format!("Unknown method '{}', expected top, user, item, hybrid or similar.", other)
                    .into(),
            )
        },
    };

    if let Some(ref path) = args.output_path {
        println!("Writing {} recommendations to {}", recommendations.len(), path);
    }

    io::write_recommendations(&recommendations, args.output_path)?;

    Ok(())
}

fn require_user(user: Option<u32>) -> Result<u32, Box<dyn Error>> {
    user.ok_or_else(|| "This method needs a diner id via --user.".into())
}
