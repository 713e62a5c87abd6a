use std::env;
use std::error::Error;
use std::fs;
use std::path::Path;
use std::process;

use getopts::Options;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use tablereco::io::{HISTORY_FILE, RESTAURANTS_FILE, USERS_FILE};

const FIRST_NAMES: [&str; 8] = [
    "Golden", "Rustic", "Jade", "Copper", "Blue", "Velvet", "Wild", "Silver",
];
const SECOND_NAMES: [&str; 8] = [
    "Spoon", "Garden", "Table", "Kettle", "Lantern", "Olive", "Harvest", "Anchor",
];
const CUISINES: [&str; 8] = [
    "Italian", "Japanese", "Mexican", "Indian", "Thai", "French", "American", "Ethiopian",
];
const LOCATIONS: [&str; 6] = [
    "Downtown", "Midtown", "Harbor", "Old Town", "Riverside", "University District",
];
const PRICES: [&str; 4] = ["$", "$$", "$$$", "$$$$"];
const DIETARY: [&str; 6] = ["", "vegetarian", "vegan", "gluten-free", "halal", "kosher"];
const ALLERGIES: [&str; 5] = ["peanuts", "shellfish", "dairy", "soy", "gluten"];
const ALCOHOL: [&str; 3] = ["", "yes", "no"];
const USERNAMES: [&str; 20] = [
    "aria", "ben", "cleo", "dev", "elif", "finn", "gia", "hana", "ivan", "june", "kai", "lena",
    "milo", "nina", "omar", "pia", "quinn", "rosa", "sam", "tess",
];

fn main() {

    let raw_args: Vec<String> = env::args().collect();
    let program = raw_args[0].clone();

    let mut opts = Options::new();
    opts.optopt("o", "output-dir", "Directory to write restaurants.csv, users.csv and \
        user_history.csv to (optional, defaults to 'data').", "PATH");
    opts.optopt("r", "restaurants", "Number of restaurants to generate (optional, defaults \
        to 20).", "NUMBER");
    opts.optopt("u", "users", "Number of diners to generate (optional, defaults to 40).", "NUMBER");
    opts.optopt("e", "events", "Number of rating events to generate (optional, defaults \
        to 400).", "NUMBER");
    opts.optopt("s", "seed", "Seed of the random generator, the same seed reproduces the \
        same files (optional, defaults to 42).", "NUMBER");
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

    let output_dir = matches.opt_str("o").unwrap_or_else(|| "data".to_string());

    let num_restaurants: usize = match matches.opt_get_default("r", 20) {
        Ok(num_restaurants) => num_restaurants,
        Err(failure) => {
            let hint = format!("Problem with option 'r': {}", failure);
            return print_usage_and_exit(&program, opts, Some(&hint))
        },
    };

    let num_users: usize = match matches.opt_get_default("u", 40) {
        Ok(num_users) => num_users,
        Err(failure) => {
            let hint = format!("Problem with option 'u': {}", failure);
            return print_usage_and_exit(&program, opts, Some(&hint))
        },
    };

    let num_events: usize = match matches.opt_get_default("e", 400) {
        Ok(num_events) => num_events,
        Err(failure) => {
            let hint = format!("Problem with option 'e': {}", failure);
            return print_usage_and_exit(&program, opts, Some(&hint))
        },
    };

    let seed: u64 = match matches.opt_get_default("s", 42) {
        Ok(seed) => seed,
        Err(failure) => {
            let hint = format!("Problem with option 's': {}", failure);
            return print_usage_and_exit(&program, opts, Some(&hint))
        },
    };

    if let Err(failure) = generate(&output_dir, num_restaurants, num_users, num_events, seed) {
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

fn generate(
    output_dir: &str,
    num_restaurants: usize,
    num_users: usize,
    num_events: usize,
    seed: u64,
) -> Result<(), Box<dyn Error>> {

    // Rejected before anything is written; the history events are drawn
    // from the id ranges 1..=num_users and 1..=num_restaurants.
    if num_restaurants == 0 || num_users == 0 {
        return Err(
            "At least one restaurant and one diner are needed to generate a dataset.".into(),
        );
    }

    let output_dir = Path::new(output_dir);
    fs::create_dir_all(output_dir)?;

    let mut rng = StdRng::seed_from_u64(seed);

    write_restaurants(&mut rng, &output_dir.join(RESTAURANTS_FILE), num_restaurants)?;
    write_users(&mut rng, &output_dir.join(USERS_FILE), num_users)?;
    write_history(
        &mut rng,
        &output_dir.join(HISTORY_FILE),
        num_users,
        num_restaurants,
        num_events,
    )?;

    println!(
        "Wrote {} restaurants, {} diners and {} rating events to {}",
        num_restaurants,
        num_users,
        num_events,
        output_dir.display(),
    );

    Ok(())
}

fn restaurant_name(index: usize) -> String {
    let first = FIRST_NAMES[index % FIRST_NAMES.len()];
    let second = SECOND_NAMES[(index / FIRST_NAMES.len()) % SECOND_NAMES.len()];

    if index < FIRST_NAMES.len() * SECOND_NAMES.len() {
        format!("The {} {}", first, second)
    } else {
        format!("The {} {} {}", first, second, index)
    }
}

fn write_restaurants(
    rng: &mut StdRng,
    path: &Path,
    num_restaurants: usize,
) -> Result<(), Box<dyn Error>> {

    let mut writer = csv::Writer::from_path(path)?;

    writer.write_record(&[
        "restaurant_id", "name", "cuisine", "location", "price_range", "avg_rating", "num_reviews",
    ])?;

    for index in 0..num_restaurants {
        let avg_rating = (rng.gen_range(2.5..5.0) * 10.0_f64).round() / 10.0;

        writer.write_record(&[
            (index + 1).to_string(),
            restaurant_name(index),
            CUISINES.choose(rng).unwrap().to_string(),
            LOCATIONS.choose(rng).unwrap().to_string(),
            PRICES.choose(rng).unwrap().to_string(),
            format!("{:.1}", avg_rating),
            rng.gen_range(5..500).to_string(),
        ])?;
    }

    writer.flush()?;

    Ok(())
}

fn write_users(rng: &mut StdRng, path: &Path, num_users: usize) -> Result<(), Box<dyn Error>> {

    let mut writer = csv::Writer::from_path(path)?;

    writer.write_record(&[
        "user_id", "username", "join_date", "dietary", "allergies", "alcohol", "friends",
    ])?;

    for index in 0..num_users {
        let id = index + 1;
        let username = format!("{}{}", USERNAMES[index % USERNAMES.len()], id);
        let join_year = rng.gen_range(2021..=2022);
        let join_date = random_date(rng, join_year);

        let num_allergies = rng.gen_range(0..=2);
        let allergies: Vec<&str> = ALLERGIES
            .choose_multiple(rng, num_allergies)
            .cloned()
            .collect();

        let friend_candidates: Vec<usize> =
            (1..=num_users).filter(|&other| other != id).collect();
        let num_friends = rng.gen_range(0..=3);
        let friends: Vec<String> = friend_candidates
            .choose_multiple(rng, num_friends)
            .map(|friend| friend.to_string())
            .collect();

        writer.write_record(&[
            id.to_string(),
            username,
            join_date,
            DIETARY.choose(rng).unwrap().to_string(),
            allergies.join(";"),
            ALCOHOL.choose(rng).unwrap().to_string(),
            friends.join(";"),
        ])?;
    }

    writer.flush()?;

    Ok(())
}

fn write_history(
    rng: &mut StdRng,
    path: &Path,
    num_users: usize,
    num_restaurants: usize,
    num_events: usize,
) -> Result<(), Box<dyn Error>> {

    let mut writer = csv::Writer::from_path(path)?;

    writer.write_record(&["user_id", "restaurant_id", "visit_date", "rating"])?;

    for _ in 0..num_events {
        writer.write_record(&[
            rng.gen_range(1..=num_users).to_string(),
            rng.gen_range(1..=num_restaurants).to_string(),
            random_date(rng, 2023),
            rating_value(rng),
        ])?;
    }

    writer.flush()?;

    Ok(())
}

/// Half of the events carry numeric stars, the other half the categorical
/// outcome tokens in roughly the proportions seen in real history files,
/// including lines without any usable signal.
fn rating_value(rng: &mut StdRng) -> String {
    let roll = rng.gen_range(0..100);

    if roll < 50 {
        rng.gen_range(1..=5).to_string()
    } else if roll < 65 {
        "yes".to_string()
    } else if roll < 80 {
        "no".to_string()
    } else if roll < 95 {
        "None".to_string()
    } else {
        "meh".to_string()
    }
}

fn random_date(rng: &mut StdRng, year: u32) -> String {
    format!(
        "{}-{:02}-{:02}",
        year,
        rng.gen_range(1..=12),
        rng.gen_range(1..=28)
    )
}
