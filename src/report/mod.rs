//! Presentation exports
//!
//! A [`Presentation`] is every scene's view models, pre-built for one viewport:
//! all race frames, the other scenes, and the genre explorer for every genre.
//! It can be written as:
//!
//! - **HTML**: a self-contained D3 page that plays the scenes with the same
//!   navigation and animation rules as the interactive server
//! - **JSON**: the raw view models, for other renderers
//!
//! The terminal output used by `anistory scene` lives in [`text`].
//!
//! # Usage
//!
//! ```ignore
//! use anistory::report;
//!
//! let presentation = report::Presentation::build(&dataset, &stats, &config, "anime.csv");
//! report::generate("story.html", &presentation)?;  // HTML
//! report::generate("story.json", &presentation)?;  // JSON
//! ```

pub mod html;
pub mod text;

use crate::aggregate::{self, Aggregates, RankMode};
use crate::config::Config;
use crate::dataset::{Dataset, NormalizeStats};
use crate::error::ReportError;
use crate::scene::{self, SceneContext, SceneKind, ViewModel, Viewport};
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

pub type Result<T> = std::result::Result<T, ReportError>;

/// Generate a report in the format matching the file extension
pub fn generate<P: AsRef<Path>>(path: P, presentation: &Presentation) -> Result<()> {
    let path = path.as_ref();
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    let mut file = std::io::BufWriter::new(std::fs::File::create(path)?);

    match ext.as_str() {
        "json" => write_json(&mut file, presentation)?,
        _ => html::write(&mut file, presentation)?,
    }
    file.flush()?;
    Ok(())
}

pub fn write_json<W: Write>(writer: &mut W, presentation: &Presentation) -> Result<()> {
    serde_json::to_writer_pretty(&mut *writer, presentation)?;
    writeln!(writer)?;
    Ok(())
}

/// Headline numbers about a loaded dataset
#[derive(Debug, Clone, Default, Serialize)]
pub struct Summary {
    pub rows: usize,
    pub records: usize,
    pub rejected: usize,
    pub first_year: Option<i32>,
    pub last_year: Option<i32>,
    pub genres: usize,
    pub top_title: Option<String>,
    pub top_score: Option<f64>,
}

impl Summary {
    pub fn from_dataset(dataset: &Dataset, stats: &NormalizeStats) -> Self {
        let best = dataset
            .years()
            .last()
            .and_then(|&year| aggregate::ranking(dataset, year, 1, RankMode::Cumulative).first().copied());

        Self {
            rows: stats.seen,
            records: dataset.len(),
            rejected: stats.rejected(),
            first_year: dataset.years().first().copied(),
            last_year: dataset.years().last().copied(),
            genres: aggregate::genre_tags(dataset).len(),
            top_title: best.map(|r| r.name.clone()),
            top_score: best.map(|r| r.score),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SceneReport {
    pub scene: SceneKind,
    pub index: usize,
    pub name: String,
    pub caption: String,
    /// One view model per frame; a single entry for static scenes
    pub frames: Vec<ViewModel>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Presentation {
    pub generated: String,
    pub source: String,
    pub summary: Summary,
    pub step_delay_ms: u64,
    pub message_ms: u64,
    pub scenes: Vec<SceneReport>,
    pub genres: Vec<String>,
    /// Explorer view for every genre, keyed by genre
    pub explorer: BTreeMap<String, ViewModel>,
}

impl Presentation {
    pub fn build(dataset: &Dataset, stats: &NormalizeStats, config: &Config, source: &str) -> Self {
        let aggregates = Aggregates::compute(dataset);
        let viewport = Viewport::new(config.width, config.height);
        let default_genre = aggregates.genre_tags.first().map(String::as_str);

        let base = SceneContext {
            dataset,
            aggregates: &aggregates,
            config,
            viewport,
            selected_genre: default_genre,
        };

        let scenes = SceneKind::ALL
            .into_iter()
            .map(|kind| {
                let frames = (0..scene::frame_count(kind, dataset).max(1))
                    .map(|frame| scene::build_frame(kind, &base, frame))
                    .collect();
                SceneReport {
                    scene: kind,
                    index: kind.index(),
                    name: kind.to_string(),
                    caption: kind.caption().to_string(),
                    frames,
                }
            })
            .collect();

        let explorer = aggregates
            .genre_tags
            .iter()
            .map(|genre| {
                let ctx = SceneContext {
                    selected_genre: Some(genre.as_str()),
                    ..base
                };
                (genre.clone(), scene::build(SceneKind::GenreExplorer, &ctx))
            })
            .collect();

        Self {
            generated: chrono::Local::now().to_rfc3339(),
            source: source.to_string(),
            summary: Summary::from_dataset(dataset, stats),
            step_delay_ms: config.step_delay_ms,
            message_ms: config.message_ms,
            scenes,
            genres: aggregates.genre_tags.clone(),
            explorer,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::sample;

    fn stats(seen: usize, kept: usize) -> NormalizeStats {
        NormalizeStats {
            seen,
            kept,
            ..NormalizeStats::default()
        }
    }

    // ==========================================================================
    // SUMMARY
    // ==========================================================================

    #[test]
    fn test_summary_from_sample() {
        let summary = Summary::from_dataset(&sample(), &stats(5, 3));
        assert_eq!(summary.rows, 5);
        assert_eq!(summary.records, 3);
        assert_eq!(summary.rejected, 2);
        assert_eq!(summary.first_year, Some(2000));
        assert_eq!(summary.last_year, Some(2001));
        assert_eq!(summary.genres, 2);
        assert_eq!(summary.top_title.as_deref(), Some("A"));
    }

    #[test]
    fn test_summary_empty() {
        let summary = Summary::from_dataset(&Dataset::default(), &NormalizeStats::default());
        assert_eq!(summary.records, 0);
        assert_eq!(summary.first_year, None);
        assert_eq!(summary.top_title, None);
    }

    // ==========================================================================
    // PRESENTATION
    // ==========================================================================

    #[test]
    fn test_presentation_has_every_scene_in_order() {
        let presentation = Presentation::build(&sample(), &stats(3, 3), &Config::default(), "sample.csv");
        let kinds: Vec<SceneKind> = presentation.scenes.iter().map(|s| s.scene).collect();
        assert_eq!(kinds, SceneKind::ALL.to_vec());
        assert_eq!(presentation.scenes[0].frames.len(), 2);
        assert_eq!(presentation.scenes[1].frames.len(), 1);
    }

    #[test]
    fn test_presentation_explorer_per_genre() {
        let presentation = Presentation::build(&sample(), &stats(3, 3), &Config::default(), "sample.csv");
        assert_eq!(presentation.genres, vec!["Action", "Drama"]);
        assert_eq!(presentation.explorer["Drama"].title, "Top Rated Anime in Genre: Drama");
        assert_eq!(presentation.scenes[4].frames[0].title, "Top Rated Anime in Genre: Action");
    }

    #[test]
    fn test_empty_presentation_still_has_a_frame_per_scene() {
        let presentation = Presentation::build(&Dataset::default(), &stats(0, 0), &Config::default(), "empty.csv");
        assert!(presentation.scenes.iter().all(|s| s.frames.len() == 1));
        assert!(presentation.explorer.is_empty());
    }

    #[test]
    fn test_generate_picks_format_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let presentation = Presentation::build(&sample(), &stats(3, 3), &Config::default(), "sample.csv");

        let json_path = dir.path().join("story.json");
        generate(&json_path, &presentation).unwrap();
        let json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
        assert_eq!(json["scenes"].as_array().unwrap().len(), 5);
        assert_eq!(json["summary"]["records"], 3);

        let html_path = dir.path().join("story.html");
        generate(&html_path, &presentation).unwrap();
        let html = std::fs::read_to_string(&html_path).unwrap();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("Top Rated Anime (2001)"));
    }
}
