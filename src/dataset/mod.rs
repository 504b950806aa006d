//! Canonical anime dataset
//!
//! Raw CSV rows go through [`normalize`] exactly once per ingestion. What comes
//! out is a [`Dataset`]: typed, filtered records plus the ascending index of
//! aired years. Nothing mutates it afterwards; scenes share it read-only.
//!
//! ```text
//! CSV file ──load──▶ Vec<RawRecord> ──normalize──▶ Dataset { records, years }
//! ```

pub mod load;
pub mod normalize;

pub use load::{load, read_csv, read_csv_with, read_from};
pub use normalize::{normalize, parse_year, NormalizeStats, Rejection};

use serde::Serialize;
use std::collections::{BTreeSet, HashMap};

/// A source row as ingested: column name to raw string value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRecord {
    fields: HashMap<String, String>,
}

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, column: &str, value: &str) -> Self {
        self.insert(column, value);
        self
    }

    pub fn insert(&mut self, column: &str, value: &str) {
        self.fields.insert(column.to_string(), value.to_string());
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields.get(column).map(String::as_str)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RawRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

/// One cleaned anime entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnimeRecord {
    /// Position in the canonical dataset, which preserves input order
    pub id: usize,
    pub name: String,
    /// Rating in (0, 10]
    pub score: f64,
    /// Number of users who rated the title
    pub popularity: u64,
    pub aired_year: i32,
    pub genres: BTreeSet<String>,
}

impl AnimeRecord {
    pub fn has_genre(&self, genre: &str) -> bool {
        self.genres.contains(genre)
    }
}

/// The canonical dataset and its year index.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    records: Vec<AnimeRecord>,
    years: Vec<i32>,
}

impl Dataset {
    /// Build a dataset from already-normalized records. Ids are reassigned to
    /// match record order.
    pub fn new(mut records: Vec<AnimeRecord>) -> Self {
        for (i, record) in records.iter_mut().enumerate() {
            record.id = i;
        }
        let years: BTreeSet<i32> = records.iter().map(|r| r.aired_year).collect();
        Self {
            records,
            years: years.into_iter().collect(),
        }
    }

    pub fn records(&self) -> &[AnimeRecord] {
        &self.records
    }

    /// Distinct aired years, ascending.
    pub fn years(&self) -> &[i32] {
        &self.years
    }

    pub fn get(&self, id: usize) -> Option<&AnimeRecord> {
        self.records.get(id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
pub(crate) fn record(name: &str, score: f64, popularity: u64, year: i32, genres: &[&str]) -> AnimeRecord {
    AnimeRecord {
        id: 0,
        name: name.to_string(),
        score,
        popularity,
        aired_year: year,
        genres: genres.iter().map(|g| g.to_string()).collect(),
    }
}

/// The three-record dataset used throughout the tests:
/// A(9, 100, 2000, Action), B(7, 50, 2000, Action+Drama), C(8, 200, 2001, Drama).
#[cfg(test)]
pub(crate) fn sample() -> Dataset {
    Dataset::new(vec![
        record("A", 9.0, 100, 2000, &["Action"]),
        record("B", 7.0, 50, 2000, &["Action", "Drama"]),
        record("C", 8.0, 200, 2001, &["Drama"]),
    ])
}
