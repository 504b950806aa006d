//! Scenes and their view builders
//!
//! The presentation is a fixed, circular sequence of five scenes:
//!
//! | # | Scene | Chart | Data |
//! |---|-------|-------|------|
//! | 0 | [`SceneKind::TopRatedRace`] | bars, animated per year | cumulative top N |
//! | 1 | [`SceneKind::PopularityVsRating`] | log-x scatter | per-year top N, all years |
//! | 2 | [`SceneKind::PopularityOverTime`] | two lines, two y axes | yearly popularity |
//! | 3 | [`SceneKind::GenreAverages`] | bars | genre averages |
//! | 4 | [`SceneKind::GenreExplorer`] | bars + selector | top N in one genre |
//!
//! Builders are pure: a [`SceneContext`] in, a [`ViewModel`] out. Drawing,
//! timing and UI controls belong to the presenter and the renderers.

mod builders;
pub mod scale;
pub mod view;

pub use view::{
    Axis, AxisSide, ChartKind, Frame, Item, Position, Rect, ScaleKind, Shape, Tooltip, ViewModel, Viewport,
};

use crate::aggregate::Aggregates;
use crate::config::Config;
use crate::dataset::Dataset;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SceneKind {
    TopRatedRace,
    PopularityVsRating,
    PopularityOverTime,
    GenreAverages,
    GenreExplorer,
}

impl SceneKind {
    pub const ALL: [SceneKind; 5] = [
        SceneKind::TopRatedRace,
        SceneKind::PopularityVsRating,
        SceneKind::PopularityOverTime,
        SceneKind::GenreAverages,
        SceneKind::GenreExplorer,
    ];

    pub const COUNT: usize = Self::ALL.len();

    pub fn index(self) -> usize {
        self as usize
    }

    /// Scene at `index`, wrapping around the sequence.
    pub fn from_index(index: usize) -> Self {
        Self::ALL[index % Self::COUNT]
    }

    pub fn next(self) -> Self {
        Self::from_index(self.index() + 1)
    }

    pub fn previous(self) -> Self {
        Self::from_index(self.index() + Self::COUNT - 1)
    }

    /// Whether the scene steps through the year index on a timer.
    pub fn is_animated(self) -> bool {
        matches!(self, SceneKind::TopRatedRace)
    }

    pub fn has_genre_selector(self) -> bool {
        matches!(self, SceneKind::GenreExplorer)
    }

    /// Narration shown in the message banner when the scene is entered.
    pub fn caption(self) -> &'static str {
        match self {
            SceneKind::TopRatedRace => {
                "The highest rated anime so far, year by year. Watch classics hold their ground as new titles arrive."
            }
            SceneKind::PopularityVsRating => {
                "Each dot is one of the best rated titles of its year. Popularity and rating rise together, loosely."
            }
            SceneKind::PopularityOverTime => {
                "How many people rate anime from each year: the total audience and the audience per title."
            }
            SceneKind::GenreAverages => "Average rating per genre. A title counts toward every genre it belongs to.",
            SceneKind::GenreExplorer => "Pick a genre to see its ten highest rated titles.",
        }
    }
}

impl std::fmt::Display for SceneKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SceneKind::TopRatedRace => "Top rated over time",
            SceneKind::PopularityVsRating => "Popularity vs rating",
            SceneKind::PopularityOverTime => "Popularity over time",
            SceneKind::GenreAverages => "Average rating by genre",
            SceneKind::GenreExplorer => "Genre explorer",
        };
        write!(f, "{}", name)
    }
}

/// Everything a builder may read.
#[derive(Debug, Clone, Copy)]
pub struct SceneContext<'a> {
    pub dataset: &'a Dataset,
    pub aggregates: &'a Aggregates,
    pub config: &'a Config,
    pub viewport: Viewport,
    pub selected_genre: Option<&'a str>,
}

/// View model of a scene on entry (the first frame for animated scenes).
pub fn build(scene: SceneKind, ctx: &SceneContext<'_>) -> ViewModel {
    build_frame(scene, ctx, 0)
}

/// View model for one frame. Scenes without animation have a single frame and
/// ignore `frame`.
pub fn build_frame(scene: SceneKind, ctx: &SceneContext<'_>, frame: usize) -> ViewModel {
    match scene {
        SceneKind::TopRatedRace => builders::top_rated_race(ctx, frame),
        SceneKind::PopularityVsRating => builders::popularity_vs_rating(ctx),
        SceneKind::PopularityOverTime => builders::popularity_over_time(ctx),
        SceneKind::GenreAverages => builders::genre_averages(ctx),
        SceneKind::GenreExplorer => builders::genre_explorer(ctx),
    }
}

/// Number of frames a scene plays through.
pub fn frame_count(scene: SceneKind, dataset: &Dataset) -> usize {
    if scene.is_animated() {
        dataset.years().len()
    } else {
        1
    }
}

/// `1234567` → `1,234,567`
pub fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
