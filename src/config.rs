//! Presentation configuration
//!
//! Every field has a default, so an empty JSON object (or no file at all) is a
//! valid configuration. CLI flags override whatever the file provides.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Names of the source columns the normalizer reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Columns {
    #[serde(default = "default_name_column")]
    pub name: String,
    #[serde(default = "default_score_column")]
    pub score: String,
    #[serde(default = "default_popularity_column")]
    pub popularity: String,
    #[serde(default = "default_aired_column")]
    pub aired_from: String,
    #[serde(default = "default_genres_column")]
    pub genres: String,
}

impl Default for Columns {
    fn default() -> Self {
        Self {
            name: default_name_column(),
            score: default_score_column(),
            popularity: default_popularity_column(),
            aired_from: default_aired_column(),
            genres: default_genres_column(),
        }
    }
}

impl Columns {
    pub fn required(&self) -> [&str; 5] {
        [&self.name, &self.score, &self.popularity, &self.aired_from, &self.genres]
    }
}

fn default_name_column() -> String { "name".to_string() }
fn default_score_column() -> String { "score".to_string() }
fn default_popularity_column() -> String { "scored_by".to_string() }
fn default_aired_column() -> String { "aired_from".to_string() }
fn default_genres_column() -> String { "genres".to_string() }

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// First aired year kept by the normalizer (inclusive)
    #[serde(default = "default_from_year")]
    pub from_year: i32,
    /// Last aired year kept by the normalizer (inclusive)
    #[serde(default = "default_to_year")]
    pub to_year: i32,
    /// Size of every top-N ranking
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    /// Delay between two steps of the top-rated race
    #[serde(default = "default_step_delay_ms")]
    pub step_delay_ms: u64,
    /// How long a scene caption stays in the message banner
    #[serde(default = "default_message_ms")]
    pub message_ms: u64,
    #[serde(default = "default_genre_delimiter")]
    pub genre_delimiter: String,
    #[serde(default)]
    pub columns: Columns,
    #[serde(default = "default_width")]
    pub width: f64,
    #[serde(default = "default_height")]
    pub height: f64,
}

fn default_from_year() -> i32 { 1985 }
fn default_to_year() -> i32 { 2025 }
fn default_top_n() -> usize { 10 }
fn default_step_delay_ms() -> u64 { 1500 }
fn default_message_ms() -> u64 { 4000 }
fn default_genre_delimiter() -> String { ",".to_string() }
fn default_width() -> f64 { 1200.0 }
fn default_height() -> f64 { 700.0 }

impl Default for Config {
    fn default() -> Self {
        Self {
            from_year: default_from_year(),
            to_year: default_to_year(),
            top_n: default_top_n(),
            step_delay_ms: default_step_delay_ms(),
            message_ms: default_message_ms(),
            genre_delimiter: default_genre_delimiter(),
            columns: Columns::default(),
            width: default_width(),
            height: default_height(),
        }
    }
}

impl Config {
    /// Load a config file. Missing fields fall back to their defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.from_year > self.to_year {
            return Err(ConfigError::Invalid(format!(
                "year window {}..={} is empty",
                self.from_year, self.to_year
            )));
        }
        if self.top_n == 0 {
            return Err(ConfigError::Invalid("top_n must be at least 1".to_string()));
        }
        if self.genre_delimiter.trim().is_empty() {
            return Err(ConfigError::Invalid("genre_delimiter must not be blank".to_string()));
        }
        if !(self.width > 0.0 && self.height > 0.0) {
            return Err(ConfigError::Invalid("viewport must have a positive size".to_string()));
        }
        Ok(())
    }

    pub fn contains_year(&self, year: i32) -> bool {
        (self.from_year..=self.to_year).contains(&year)
    }

    pub fn step_delay(&self) -> Duration {
        Duration::from_millis(self.step_delay_ms)
    }

    pub fn message_duration(&self) -> Duration {
        Duration::from_millis(self.message_ms)
    }
}
