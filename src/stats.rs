use crate::dataset::Dataset;

/// Summary numbers of a loaded dataset, shown by the command line tool
/// before any ranking runs.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetStats {
    pub num_restaurants: usize,
    pub num_users: usize,
    pub num_rating_events: usize,
    pub num_cuisines: usize,
    pub overall_avg_rating: f64,
}

impl DatasetStats {
    pub fn from(data: &Dataset) -> Self {
        let mut sum = 0.0;
        let mut count = 0_u32;

        for event in data.events() {
            if let Some(score) = event.rating.score() {
                sum += score;
                count += 1;
            }
        }

        let overall_avg_rating = if count == 0 { 0.0 } else { sum / f64::from(count) };

        DatasetStats {
            num_restaurants: data.restaurants().len(),
            num_users: data.users().len(),
            num_rating_events: data.events().len(),
            num_cuisines: data.cuisines().len(),
            overall_avg_rating,
        }
    }
}
