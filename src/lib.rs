//! Anistory - a guided tour through anime ratings data
//!
//! Anistory turns an anime ratings table (name, score, rater count, air date,
//! genres) into a sequence of chart scenes: a year-by-year race of the top
//! rated titles, rating against popularity, popularity over time, average
//! score per genre, and a genre explorer.
//!
//! # Pipeline
//!
//! 1. **Ingestion** ([`dataset`]): reads the CSV once and normalizes every row
//!    into a canonical [`AnimeRecord`], dropping rows without a usable date,
//!    a rating, or an air year inside the configured window.
//!
//! 2. **Aggregation** ([`aggregate`]): pure functions over the dataset:
//!    cumulative and per-year top-N rankings, genre averages, and yearly
//!    popularity totals.
//!
//! 3. **Scenes** ([`scene`]): one builder per scene turns the dataset and
//!    aggregates into a [`ViewModel`] with pixel geometry for the viewport.
//!
//! 4. **Presenter** ([`presenter`]): the state machine that owns navigation,
//!    the race animation timer, and teardown between scenes.
//!
//! # Quick Start
//!
//! ```no_run
//! use anistory::{Config, Presenter, Recording, Viewport};
//! use std::time::Instant;
//!
//! let config = Config::default();
//! let (dataset, stats) = anistory::dataset::load("anime.csv", &config).unwrap();
//! println!("kept {} of {} rows", stats.kept, stats.seen);
//!
//! let viewport = Viewport::new(config.width, config.height);
//! let mut presenter = Presenter::new(config, viewport, Recording::new(), Recording::new());
//! presenter.load(dataset, Instant::now());
//! presenter.advance(Instant::now());
//!
//! if let Some(view) = presenter.current_view() {
//!     println!("{}: {} items", view.title, view.items.len());
//! }
//! ```
//!
//! # Modules
//!
//! - [`dataset`]: CSV ingestion and normalization
//! - [`aggregate`]: rankings and per-genre / per-year aggregates
//! - [`scene`]: scene catalogue, scales and view-model builders
//! - [`presenter`]: scene state machine and step timer
//! - [`report`]: HTML, JSON and terminal output
//! - [`serve`]: interactive HTTP presentation

pub mod aggregate;
pub mod config;
pub mod dataset;
pub mod error;
pub mod presenter;
pub mod report;
pub mod scene;
pub mod serve;

pub use aggregate::{Aggregates, RankMode};
pub use config::Config;
pub use dataset::{AnimeRecord, Dataset, NormalizeStats};
pub use error::{ConfigError, IngestError, ReportError};
pub use presenter::{Chrome, Presenter, Recording, Renderer};
pub use scene::{SceneKind, ViewModel, Viewport};
