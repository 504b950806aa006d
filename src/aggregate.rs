//! Aggregation engine
//!
//! Summary structures derived from the canonical dataset. Everything here is
//! pure: the same dataset always yields the same output, and an empty dataset
//! yields empty output.
//!
//! # Rankings
//!
//! Two filters share the "top N" label and must not be confused:
//!
//! | Mode | Candidates for year `y` | Used by |
//! |------|-------------------------|---------|
//! | [`RankMode::Cumulative`] | `aired_year <= y` | top-rated race |
//! | [`RankMode::PerYear`] | `aired_year == y` | popularity vs rating scatter |
//!
//! Both sort by score descending with a stable sort, so equal scores keep
//! dataset (input) order.

use crate::dataset::{AnimeRecord, Dataset};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RankMode {
    Cumulative,
    PerYear,
}

impl RankMode {
    fn admits(self, record: &AnimeRecord, year: i32) -> bool {
        match self {
            RankMode::Cumulative => record.aired_year <= year,
            RankMode::PerYear => record.aired_year == year,
        }
    }
}

/// Records eligible for a ranking at `year`, in dataset order.
pub fn candidates(dataset: &Dataset, year: i32, mode: RankMode) -> Vec<&AnimeRecord> {
    dataset.records().iter().filter(|r| mode.admits(r, year)).collect()
}

/// Top `n` records at `year` by score.
pub fn ranking(dataset: &Dataset, year: i32, n: usize, mode: RankMode) -> Vec<&AnimeRecord> {
    top_by_score(candidates(dataset, year, mode), n)
}

/// Top `n` records tagged with `genre` by score.
pub fn genre_ranking<'a>(dataset: &'a Dataset, genre: &str, n: usize) -> Vec<&'a AnimeRecord> {
    let pool = dataset.records().iter().filter(|r| r.has_genre(genre)).collect();
    top_by_score(pool, n)
}

fn top_by_score(mut pool: Vec<&AnimeRecord>, n: usize) -> Vec<&AnimeRecord> {
    // sort_by is stable: ties stay in dataset order
    pool.sort_by(|a, b| b.score.total_cmp(&a.score));
    pool.truncate(n);
    pool
}

/// Average rating of one genre tag.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenreAverage {
    pub genre: String,
    pub total_score: f64,
    pub count: usize,
    pub average_score: f64,
}

/// Per-genre averages, highest average first.
///
/// A record counts once toward every genre it carries, so the sum of counts is
/// at least the number of records with any genre. Genres with equal averages
/// keep the order in which they first appear in the dataset.
pub fn genre_averages(dataset: &Dataset) -> Vec<GenreAverage> {
    let mut order: Vec<&str> = Vec::new();
    let mut totals: HashMap<&str, (f64, usize)> = HashMap::new();

    for record in dataset.records() {
        for genre in &record.genres {
            let entry = totals.entry(genre.as_str()).or_insert_with(|| {
                order.push(genre.as_str());
                (0.0, 0)
            });
            entry.0 += record.score;
            entry.1 += 1;
        }
    }

    let mut averages: Vec<GenreAverage> = order
        .into_iter()
        .map(|genre| {
            let (total_score, count) = totals[genre];
            GenreAverage {
                genre: genre.to_string(),
                total_score,
                count,
                average_score: total_score / count as f64,
            }
        })
        .collect();
    averages.sort_by(|a, b| b.average_score.total_cmp(&a.average_score));
    averages
}

/// Popularity totals for one aired year.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearlyPopularity {
    pub year: i32,
    pub total_popularity: u64,
    pub count: usize,
    pub average_popularity: f64,
}

/// One entry per distinct aired year, ascending.
pub fn yearly_popularity(dataset: &Dataset) -> Vec<YearlyPopularity> {
    let mut years: BTreeMap<i32, (u64, usize)> = BTreeMap::new();
    for record in dataset.records() {
        let entry = years.entry(record.aired_year).or_default();
        entry.0 = entry.0.saturating_add(record.popularity);
        entry.1 += 1;
    }

    years
        .into_iter()
        .map(|(year, (total_popularity, count))| YearlyPopularity {
            year,
            total_popularity,
            count,
            average_popularity: total_popularity as f64 / count as f64,
        })
        .collect()
}

/// Every genre tag in the dataset, sorted lexicographically.
pub fn genre_tags(dataset: &Dataset) -> Vec<String> {
    let tags: BTreeSet<&String> = dataset.records().iter().flat_map(|r| &r.genres).collect();
    tags.into_iter().cloned().collect()
}

/// Aggregates computed once at load and shared by every scene.
#[derive(Debug, Clone, Default)]
pub struct Aggregates {
    pub genre_averages: Vec<GenreAverage>,
    pub yearly_popularity: Vec<YearlyPopularity>,
    pub genre_tags: Vec<String>,
}

impl Aggregates {
    pub fn compute(dataset: &Dataset) -> Self {
        let aggregates = Self {
            genre_averages: genre_averages(dataset),
            yearly_popularity: yearly_popularity(dataset),
            genre_tags: genre_tags(dataset),
        };
        tracing::debug!(
            genres = aggregates.genre_tags.len(),
            years = aggregates.yearly_popularity.len(),
            "computed aggregates"
        );
        aggregates
    }

    pub fn genre(&self, genre: &str) -> Option<&GenreAverage> {
        self.genre_averages.iter().find(|g| g.genre == genre)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{record, sample};

    fn names(records: &[&AnimeRecord]) -> Vec<String> {
        records.iter().map(|r| r.name.clone()).collect()
    }

    // ==========================================================================
    // RANKINGS
    // ==========================================================================
    //
    // A(9, 2000), B(7, 2000), C(8, 2001). The race uses cumulative candidates,
    // the scatter uses per-year candidates.
    // ==========================================================================

    #[test]
    fn test_cumulative_ranking_example() {
        let dataset = sample();
        assert_eq!(names(&ranking(&dataset, 2000, 10, RankMode::Cumulative)), vec!["A", "B"]);
        assert_eq!(names(&ranking(&dataset, 2001, 10, RankMode::Cumulative)), vec!["A", "C", "B"]);
    }

    #[test]
    fn test_per_year_ranking_excludes_earlier_years() {
        let dataset = sample();
        assert_eq!(names(&ranking(&dataset, 2001, 10, RankMode::PerYear)), vec!["C"]);
        assert_eq!(names(&ranking(&dataset, 2000, 10, RankMode::PerYear)), vec!["A", "B"]);
    }

    #[test]
    fn test_ranking_truncates_and_sorts() {
        let records = (0..25)
            .map(|i| record(&format!("r{i}"), 1.0 + (i % 9) as f64, 10, 2000, &[]))
            .collect();
        let dataset = Dataset::new(records);
        let top = ranking(&dataset, 2000, 10, RankMode::Cumulative);
        assert_eq!(top.len(), 10);
        assert!(top.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn test_ranking_ties_keep_input_order() {
        let dataset = Dataset::new(vec![
            record("first", 8.0, 1, 2000, &[]),
            record("top", 9.0, 1, 2000, &[]),
            record("second", 8.0, 1, 2000, &[]),
            record("third", 8.0, 1, 2000, &[]),
        ]);
        let top = ranking(&dataset, 2000, 3, RankMode::Cumulative);
        assert_eq!(names(&top), vec!["top", "first", "second"]);
    }

    #[test]
    fn test_ranking_is_idempotent() {
        let dataset = sample();
        let first = ranking(&dataset, 2001, 10, RankMode::Cumulative);
        let second = ranking(&dataset, 2001, 10, RankMode::Cumulative);
        assert_eq!(first, second);
    }

    #[test]
    fn test_cumulative_pool_grows_with_year() {
        let dataset = Dataset::new(vec![
            record("a", 5.0, 1, 1990, &[]),
            record("b", 6.0, 1, 1995, &[]),
            record("c", 7.0, 1, 1992, &[]),
            record("d", 8.0, 1, 2001, &[]),
        ]);
        for year in 1989..2002 {
            let pool: Vec<usize> = candidates(&dataset, year, RankMode::Cumulative).iter().map(|r| r.id).collect();
            let next: Vec<usize> =
                candidates(&dataset, year + 1, RankMode::Cumulative).iter().map(|r| r.id).collect();
            assert!(pool.iter().all(|id| next.contains(id)), "pool shrank at {year}");
        }
    }

    #[test]
    fn test_ranking_before_first_year_is_empty() {
        assert!(ranking(&sample(), 1999, 10, RankMode::Cumulative).is_empty());
    }

    #[test]
    fn test_genre_ranking_filters_by_tag() {
        let dataset = sample();
        assert_eq!(names(&genre_ranking(&dataset, "Drama", 10)), vec!["C", "B"]);
        assert!(genre_ranking(&dataset, "Horror", 10).is_empty());
    }

    // ==========================================================================
    // GENRE AVERAGES
    // ==========================================================================

    #[test]
    fn test_genre_averages_example() {
        let averages = genre_averages(&sample());
        assert_eq!(averages.len(), 2);
        assert_eq!(averages[0].genre, "Action");
        assert_eq!(averages[0].average_score, 8.0);
        assert_eq!(averages[0].count, 2);
        assert_eq!(averages[1].genre, "Drama");
        assert_eq!(averages[1].average_score, 7.5);
    }

    #[test]
    fn test_multi_genre_record_counts_in_each_genre() {
        let with = Dataset::new(vec![
            record("x", 6.0, 1, 2000, &["Action"]),
            record("both", 9.0, 1, 2000, &["Action", "Comedy"]),
            record("y", 5.0, 1, 2000, &["Comedy"]),
        ]);
        let without = Dataset::new(vec![
            record("x", 6.0, 1, 2000, &["Action"]),
            record("y", 5.0, 1, 2000, &["Comedy"]),
        ]);
        let count = |d: &Dataset, g: &str| {
            genre_averages(d).into_iter().find(|a| a.genre == g).map(|a| a.count).unwrap()
        };
        assert_eq!(count(&with, "Action") - count(&without, "Action"), 1);
        assert_eq!(count(&with, "Comedy") - count(&without, "Comedy"), 1);
    }

    #[test]
    fn test_genre_count_sum_at_least_dataset_size() {
        let dataset = sample();
        let total: usize = genre_averages(&dataset).iter().map(|g| g.count).sum();
        assert!(total >= dataset.len());
        assert_eq!(total, 4);

        let single = Dataset::new(vec![
            record("a", 6.0, 1, 2000, &["Action"]),
            record("b", 7.0, 1, 2000, &["Drama"]),
        ]);
        let total: usize = genre_averages(&single).iter().map(|g| g.count).sum();
        assert_eq!(total, single.len());
    }

    #[test]
    fn test_genre_average_ties_keep_first_appearance() {
        let dataset = Dataset::new(vec![
            record("a", 7.0, 1, 2000, &["Sports"]),
            record("b", 7.0, 1, 2000, &["Mecha"]),
        ]);
        let genres: Vec<String> = genre_averages(&dataset).into_iter().map(|g| g.genre).collect();
        assert_eq!(genres, vec!["Sports", "Mecha"]);
    }

    // ==========================================================================
    // YEARLY POPULARITY
    // ==========================================================================

    #[test]
    fn test_yearly_popularity_totals_and_averages() {
        let series = yearly_popularity(&sample());
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].year, 2000);
        assert_eq!(series[0].total_popularity, 150);
        assert_eq!(series[0].count, 2);
        assert_eq!(series[0].average_popularity, 75.0);
        assert_eq!(series[1].year, 2001);
        assert_eq!(series[1].total_popularity, 200);
    }

    #[test]
    fn test_yearly_popularity_saturates_instead_of_overflowing() {
        let dataset = Dataset::new(vec![
            record("Huge A", 8.0, u64::MAX, 2001, &["Action"]),
            record("Huge B", 7.0, u64::MAX, 2001, &["Drama"]),
        ]);
        let series = yearly_popularity(&dataset);
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].total_popularity, u64::MAX);
        assert_eq!(series[0].count, 2);
        assert!(series[0].average_popularity.is_finite());
    }

    #[test]
    fn test_yearly_series_matches_year_index() {
        let dataset = sample();
        let years: Vec<i32> = yearly_popularity(&dataset).iter().map(|y| y.year).collect();
        assert_eq!(years, dataset.years());
    }

    // ==========================================================================
    // EMPTY DATASET
    // ==========================================================================

    #[test]
    fn test_everything_empty_on_empty_dataset() {
        let dataset = Dataset::default();
        assert!(ranking(&dataset, 2000, 10, RankMode::Cumulative).is_empty());
        assert!(genre_averages(&dataset).is_empty());
        assert!(yearly_popularity(&dataset).is_empty());
        assert!(genre_tags(&dataset).is_empty());
        let aggregates = Aggregates::compute(&dataset);
        assert!(aggregates.genre_averages.is_empty());
    }

    #[test]
    fn test_genre_tags_sorted() {
        assert_eq!(genre_tags(&sample()), vec!["Action", "Drama"]);
    }
}
