//! Record normalization
//!
//! Each raw row either becomes an [`AnimeRecord`] or is dropped. The steps run
//! in a fixed order and each one is a filter or a derivation, never both:
//!
//! 1. drop rows without a usable `aired_from` date
//! 2. derive the aired year, drop rows whose year is not a real year
//! 3. coerce score and popularity to numbers (absent or invalid becomes 0)
//! 4. keep rows inside the year window with a positive score and popularity
//! 5. split the genre field into trimmed tags
//!
//! Nothing is repaired beyond the zero default of step 3.

use super::{AnimeRecord, Dataset, RawRecord};
use crate::config::Config;
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::collections::BTreeSet;

/// Largest rater count a row may claim.
const MAX_RATERS: f64 = u32::MAX as f64;

/// Why a row was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    MissingDate,
    InvalidYear,
    OutsideWindow,
    Unrated,
    Invalid,
}

/// Counters for one normalization run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NormalizeStats {
    pub seen: usize,
    pub kept: usize,
    pub missing_date: usize,
    pub invalid_year: usize,
    pub outside_window: usize,
    pub unrated: usize,
    pub invalid: usize,
}

impl NormalizeStats {
    pub fn rejected(&self) -> usize {
        self.seen - self.kept
    }

    fn count(&mut self, rejection: Rejection) {
        match rejection {
            Rejection::MissingDate => self.missing_date += 1,
            Rejection::InvalidYear => self.invalid_year += 1,
            Rejection::OutsideWindow => self.outside_window += 1,
            Rejection::Unrated => self.unrated += 1,
            Rejection::Invalid => self.invalid += 1,
        }
    }
}

/// Normalize a batch of raw rows into the canonical dataset, preserving order.
#[tracing::instrument(skip_all)]
pub fn normalize<I>(raw: I, config: &Config) -> (Dataset, NormalizeStats)
where
    I: IntoIterator<Item = RawRecord>,
{
    let mut stats = NormalizeStats::default();
    let mut records = Vec::new();

    for row in raw {
        stats.seen += 1;
        match normalize_record(&row, config) {
            Ok(record) => records.push(record),
            Err(rejection) => stats.count(rejection),
        }
    }
    stats.kept = records.len();

    let dataset = Dataset::new(records);
    tracing::debug!(
        seen = stats.seen,
        kept = stats.kept,
        missing_date = stats.missing_date,
        invalid_year = stats.invalid_year,
        outside_window = stats.outside_window,
        unrated = stats.unrated,
        years = dataset.years().len(),
        "normalized dataset"
    );
    (dataset, stats)
}

fn normalize_record(row: &RawRecord, config: &Config) -> Result<AnimeRecord, Rejection> {
    let columns = &config.columns;

    let aired = row
        .get(&columns.aired_from)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(Rejection::MissingDate)?;

    let aired_year = parse_year(aired).ok_or(Rejection::InvalidYear)?;

    let score = coerce_number(row.get(&columns.score));
    let raters = coerce_number(row.get(&columns.popularity));
    let popularity = raters as u64;

    if !config.contains_year(aired_year) {
        return Err(Rejection::OutsideWindow);
    }
    if score <= 0.0 || popularity == 0 {
        return Err(Rejection::Unrated);
    }
    let name = row.get(&columns.name).map(str::trim).unwrap_or_default();
    if score > 10.0 || raters > MAX_RATERS || name.is_empty() {
        return Err(Rejection::Invalid);
    }

    Ok(AnimeRecord {
        id: 0,
        name: name.to_string(),
        score,
        popularity,
        aired_year,
        genres: parse_genres(row.get(&columns.genres), &config.genre_delimiter),
    })
}

/// Extract the calendar year from an aired date.
///
/// Accepts the shapes found in anime listings: RFC 3339 timestamps, ISO dates
/// with or without a time, `Apr 5, 2009`, `2009-04` and a bare `2009`.
pub fn parse_year(value: &str) -> Option<i32> {
    let value = value.trim();

    let year = if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        dt.year()
    } else if let Ok(dt) = DateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%:z") {
        dt.year()
    } else if let Some(dt) = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
    {
        dt.year()
    } else if let Some(d) = ["%Y-%m-%d", "%b %d, %Y", "%B %d, %Y", "%Y/%m/%d"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
    {
        d.year()
    } else {
        year_prefix(value)?
    };

    (1..=9999).contains(&year).then_some(year)
}

/// `2009` or `2009-04`.
fn year_prefix(value: &str) -> Option<i32> {
    let (year, rest) = value.split_at_checked(4)?;
    if !year.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let month_ok = match rest.strip_prefix('-') {
        None => rest.is_empty(),
        Some(month) => matches!(month.parse::<u32>(), Ok(1..=12)) && month.len() == 2,
    };
    if month_ok { year.parse().ok() } else { None }
}

fn coerce_number(value: Option<&str>) -> f64 {
    value
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

fn parse_genres(value: Option<&str>, delimiter: &str) -> BTreeSet<String> {
    value
        .map(|v| {
            v.split(delimiter)
                .map(str::trim)
                .filter(|tag| !tag.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}
