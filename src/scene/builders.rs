//! One builder per scene

use super::scale::{BandScale, LinearScale, LogScale, PowScale};
use super::{
    group_thousands, Axis, AxisSide, ChartKind, Frame, Item, Position, ScaleKind, SceneContext, SceneKind, Shape,
    Tooltip, ViewModel,
};
use crate::aggregate::{self, RankMode};
use crate::dataset::AnimeRecord;

const BAR_COLOR: &str = "#2f51a3";
const AVERAGE_COLOR: &str = "#e07b39";
const POINT_RADIUS: f64 = 5.0;
const LINE_POINT_RADIUS: f64 = 4.0;
const SCORE_EXPONENT: f64 = 3.0;

/// Cumulative top N for the `frame`-th year of the year index.
pub(super) fn top_rated_race(ctx: &SceneContext<'_>, frame: usize) -> ViewModel {
    let years = ctx.dataset.years();
    let Some(&year) = years.get(frame) else {
        return ViewModel::empty(
            SceneKind::TopRatedRace,
            ChartKind::HorizontalBars,
            "Top Rated Anime".to_string(),
            ctx.viewport,
        );
    };

    let top = aggregate::ranking(ctx.dataset, year, ctx.config.top_n, RankMode::Cumulative);
    let mut view = score_bars(SceneKind::TopRatedRace, format!("Top Rated Anime ({year})"), ctx, &top, 0.1);
    view.frame = Some(Frame {
        index: frame,
        total: years.len(),
        year,
    });
    view
}

/// Per-year top N of every year, as one point cloud.
pub(super) fn popularity_vs_rating(ctx: &SceneContext<'_>) -> ViewModel {
    let n = ctx.config.top_n;
    let mut view = ViewModel::empty(
        SceneKind::PopularityVsRating,
        ChartKind::Scatter,
        format!("Rating vs Popularity of Top {n} Anime Per Year"),
        ctx.viewport,
    );

    let points: Vec<&AnimeRecord> = ctx
        .dataset
        .years()
        .iter()
        .flat_map(|&year| aggregate::ranking(ctx.dataset, year, n, RankMode::PerYear))
        .collect();
    if points.is_empty() {
        return view;
    }

    let min_pop = points.iter().map(|r| r.popularity).min().unwrap_or(1) as f64;
    let max_pop = points.iter().map(|r| r.popularity).max().unwrap_or(1) as f64;
    let min_score = points.iter().map(|r| r.score).fold(f64::INFINITY, f64::min);
    let x_domain = (log_floor(min_pop), max_pop);
    let y_domain = (min_score - 0.5, 10.0);

    let plot = view.plot;
    let x = LogScale::new(x_domain, (0.0, plot.width));
    let y = LinearScale::new(y_domain, (plot.height, 0.0));

    view.axes = vec![
        Axis {
            side: AxisSide::Bottom,
            scale: ScaleKind::Log,
            domain: x_domain,
            range: (0.0, plot.width),
            label: "Popularity (Number of Users)".to_string(),
            integer: false,
        },
        Axis {
            side: AxisSide::Left,
            scale: ScaleKind::Linear,
            domain: y_domain,
            range: (plot.height, 0.0),
            label: "Rating (Score)".to_string(),
            integer: false,
        },
    ];

    view.items = points
        .iter()
        .map(|r| Item {
            id: record_id(r),
            position: Position::Point {
                x: r.popularity as f64,
                y: r.score,
            },
            magnitude: r.score,
            label: r.name.clone(),
            value_label: format!("{:.2}", r.score),
            series: None,
            color: BAR_COLOR.to_string(),
            shape: Shape::Circle {
                cx: x.map(r.popularity as f64),
                cy: y.map(r.score),
                r: POINT_RADIUS,
            },
            tooltip: Some(Tooltip {
                title: format!("{} ({})", r.name, r.aired_year),
                lines: vec![
                    format!("Rating: {}", r.score),
                    format!("Popularity: {}", group_thousands(r.popularity)),
                ],
            }),
        })
        .collect();
    view
}

/// Total and average popularity per year on independent y scales.
pub(super) fn popularity_over_time(ctx: &SceneContext<'_>) -> ViewModel {
    let series = &ctx.aggregates.yearly_popularity;
    let mut view = ViewModel::empty(
        SceneKind::PopularityOverTime,
        ChartKind::DualLine,
        "Anime Popularity Over Time".to_string(),
        ctx.viewport,
    );
    let (Some(first), Some(last)) = (series.first(), series.last()) else {
        return view;
    };

    let x_domain = (first.year as f64, last.year as f64);
    let max_total = series.iter().map(|p| p.total_popularity).max().unwrap_or(0) as f64;
    let max_average = series.iter().map(|p| p.average_popularity).fold(0.0, f64::max);

    let plot = view.plot;
    let x = LinearScale::new(x_domain, (0.0, plot.width));
    let y_total = LinearScale::new((0.0, max_total), (plot.height, 0.0));
    let y_average = LinearScale::new((0.0, max_average), (plot.height, 0.0));

    view.axes = vec![
        Axis {
            side: AxisSide::Bottom,
            scale: ScaleKind::Linear,
            domain: x_domain,
            range: (0.0, plot.width),
            label: "Year Aired".to_string(),
            integer: true,
        },
        Axis {
            side: AxisSide::Left,
            scale: ScaleKind::Linear,
            domain: (0.0, max_total),
            range: (plot.height, 0.0),
            label: "Total Raters".to_string(),
            integer: false,
        },
        Axis {
            side: AxisSide::Right,
            scale: ScaleKind::Linear,
            domain: (0.0, max_average),
            range: (plot.height, 0.0),
            label: "Average Raters per Title".to_string(),
            integer: false,
        },
    ];

    let tooltip = |p: &aggregate::YearlyPopularity| Tooltip {
        title: p.year.to_string(),
        lines: vec![
            format!("Total popularity: {}", group_thousands(p.total_popularity)),
            format!("Average popularity: {}", group_thousands(p.average_popularity.round() as u64)),
            format!("Titles: {}", p.count),
        ],
    };

    let totals = series.iter().map(|p| Item {
        id: format!("total-{}", p.year),
        position: Position::Point {
            x: p.year as f64,
            y: p.total_popularity as f64,
        },
        magnitude: p.total_popularity as f64,
        label: p.year.to_string(),
        value_label: group_thousands(p.total_popularity),
        series: Some("total".to_string()),
        color: BAR_COLOR.to_string(),
        shape: Shape::Circle {
            cx: x.map(p.year as f64),
            cy: y_total.map(p.total_popularity as f64),
            r: LINE_POINT_RADIUS,
        },
        tooltip: Some(tooltip(p)),
    });
    let averages = series.iter().map(|p| Item {
        id: format!("average-{}", p.year),
        position: Position::Point {
            x: p.year as f64,
            y: p.average_popularity,
        },
        magnitude: p.average_popularity,
        label: p.year.to_string(),
        value_label: group_thousands(p.average_popularity.round() as u64),
        series: Some("average".to_string()),
        color: AVERAGE_COLOR.to_string(),
        shape: Shape::Circle {
            cx: x.map(p.year as f64),
            cy: y_average.map(p.average_popularity),
            r: LINE_POINT_RADIUS,
        },
        tooltip: Some(tooltip(p)),
    });
    view.items = totals.chain(averages).collect();
    view
}

/// One bar per genre, in the engine's descending order.
pub(super) fn genre_averages(ctx: &SceneContext<'_>) -> ViewModel {
    let averages = &ctx.aggregates.genre_averages;
    let mut view = ViewModel::empty(
        SceneKind::GenreAverages,
        ChartKind::HorizontalBars,
        "Average Rating by Genre".to_string(),
        ctx.viewport,
    );
    if averages.is_empty() {
        return view;
    }

    let plot = view.plot;
    let max = averages.iter().map(|g| g.average_score).fold(0.0, f64::max);
    let x = LinearScale::new((0.0, max), (0.0, plot.width));
    let keys = averages.iter().map(|g| g.genre.clone()).collect();
    let y = BandScale::new(keys, (0.0, plot.height), 0.1);

    view.items = averages
        .iter()
        .map(|g| Item {
            id: format!("genre-{}", g.genre),
            position: Position::Category { key: g.genre.clone() },
            magnitude: g.average_score,
            label: g.genre.clone(),
            value_label: format!("{:.2}", g.average_score),
            series: None,
            color: BAR_COLOR.to_string(),
            shape: Shape::Bar {
                x: 0.0,
                y: y.position(&g.genre).unwrap_or_default(),
                width: x.map(g.average_score),
                height: y.bandwidth(),
            },
            tooltip: Some(Tooltip {
                title: g.genre.clone(),
                lines: vec![
                    format!("Average Score: {:.2}", g.average_score),
                    format!("Number of Animes: {}", group_thousands(g.count as u64)),
                ],
            }),
        })
        .collect();
    view
}

/// Top N of the selected genre.
pub(super) fn genre_explorer(ctx: &SceneContext<'_>) -> ViewModel {
    let Some(genre) = ctx.selected_genre else {
        return ViewModel::empty(
            SceneKind::GenreExplorer,
            ChartKind::HorizontalBars,
            "Top Rated Anime by Genre".to_string(),
            ctx.viewport,
        );
    };
    let top = aggregate::genre_ranking(ctx.dataset, genre, ctx.config.top_n);
    score_bars(SceneKind::GenreExplorer, format!("Top Rated Anime in Genre: {genre}"), ctx, &top, 0.2)
}

/// Horizontal score bars on a cubic scale, one band per record.
fn score_bars(scene: SceneKind, title: String, ctx: &SceneContext<'_>, top: &[&AnimeRecord], padding: f64) -> ViewModel {
    let mut view = ViewModel::empty(scene, ChartKind::HorizontalBars, title, ctx.viewport);
    if top.is_empty() {
        return view;
    }

    let plot = view.plot;
    let max = top.iter().map(|r| r.score).fold(0.0, f64::max);
    let x = PowScale::new(SCORE_EXPONENT, (0.0, max), (0.0, plot.width));
    let y = BandScale::new(top.iter().map(|r| record_id(r)).collect(), (0.0, plot.height), padding);

    view.items = top
        .iter()
        .map(|r| {
            let id = record_id(r);
            Item {
                position: Position::Category { key: r.name.clone() },
                magnitude: r.score,
                label: r.name.clone(),
                value_label: format!("{:.2}", r.score),
                series: None,
                color: BAR_COLOR.to_string(),
                shape: Shape::Bar {
                    x: 0.0,
                    y: y.position(&id).unwrap_or_default(),
                    width: x.map(r.score),
                    height: y.bandwidth(),
                },
                tooltip: Some(Tooltip {
                    title: r.name.clone(),
                    lines: vec![
                        format!("Score: {}", r.score),
                        format!("Year: {}", r.aired_year),
                        format!("Popularity: {}", group_thousands(r.popularity)),
                    ],
                }),
                id,
            }
        })
        .collect();
    view
}

fn record_id(record: &AnimeRecord) -> String {
    format!("anime-{}", record.id)
}

/// Lower bound of the popularity axis: a little below the smallest value but
/// never at or below zero, where a log scale is undefined.
fn log_floor(min: f64) -> f64 {
    let padded = min - 100.0;
    if padded > 0.0 {
        padded
    } else {
        (min / 2.0).max(f64::MIN_POSITIVE)
    }
}

#[cfg(test)]
mod tests {
    use super::super::{build, build_frame, Viewport};
    use super::*;
    use crate::aggregate::Aggregates;
    use crate::config::Config;
    use crate::dataset::{record, sample, Dataset};

    fn ctx<'a>(
        dataset: &'a Dataset,
        aggregates: &'a Aggregates,
        config: &'a Config,
        genre: Option<&'a str>,
    ) -> SceneContext<'a> {
        SceneContext {
            dataset,
            aggregates,
            config,
            viewport: Viewport::new(1200.0, 700.0),
            selected_genre: genre,
        }
    }

    fn labels(view: &ViewModel) -> Vec<&str> {
        view.items.iter().map(|i| i.label.as_str()).collect()
    }

    // ==========================================================================
    // TOP RATED RACE
    // ==========================================================================

    #[test]
    fn test_race_frames_follow_year_index() {
        let dataset = sample();
        let aggregates = Aggregates::compute(&dataset);
        let config = Config::default();
        let c = ctx(&dataset, &aggregates, &config, None);

        let first = build(SceneKind::TopRatedRace, &c);
        assert_eq!(first.title, "Top Rated Anime (2000)");
        assert_eq!(labels(&first), vec!["A", "B"]);
        assert_eq!(first.frame, Some(Frame { index: 0, total: 2, year: 2000 }));

        let second = build_frame(SceneKind::TopRatedRace, &c, 1);
        assert_eq!(labels(&second), vec!["A", "C", "B"]);
        assert_eq!(second.items[0].value_label, "9.00");
    }

    #[test]
    fn test_race_bars_stack_top_to_bottom_and_scale_by_score() {
        let dataset = sample();
        let aggregates = Aggregates::compute(&dataset);
        let config = Config::default();
        let view = build_frame(SceneKind::TopRatedRace, &ctx(&dataset, &aggregates, &config, None), 1);

        let bars: Vec<(f64, f64)> = view
            .items
            .iter()
            .map(|i| match i.shape {
                Shape::Bar { y, width, .. } => (y, width),
                Shape::Circle { .. } => panic!("race draws bars"),
            })
            .collect();
        assert!(bars.windows(2).all(|w| w[0].0 < w[1].0));
        assert!((bars[0].1 - view.plot.width).abs() < 1e-9);
        assert!(bars.windows(2).all(|w| w[0].1 > w[1].1));
    }

    #[test]
    fn test_race_item_ids_stable_across_frames() {
        let dataset = sample();
        let aggregates = Aggregates::compute(&dataset);
        let config = Config::default();
        let c = ctx(&dataset, &aggregates, &config, None);
        let a0 = build_frame(SceneKind::TopRatedRace, &c, 0).items[0].id.clone();
        let a1 = build_frame(SceneKind::TopRatedRace, &c, 1).items[0].id.clone();
        assert_eq!(a0, a1);
    }

    #[test]
    fn test_race_respects_top_n() {
        let records = (0..30).map(|i| record(&format!("t{i}"), 5.0 + (i as f64) / 10.0, 10, 2000, &[])).collect();
        let dataset = Dataset::new(records);
        let aggregates = Aggregates::compute(&dataset);
        let config = Config::default();
        let view = build(SceneKind::TopRatedRace, &ctx(&dataset, &aggregates, &config, None));
        assert_eq!(view.items.len(), 10);
        assert_eq!(view.items[0].label, "t29");
    }

    // ==========================================================================
    // SCATTER
    // ==========================================================================

    #[test]
    fn test_scatter_uses_per_year_top_n() {
        let mut records = Vec::new();
        for i in 0..12 {
            records.push(record(&format!("old{i}"), 9.0, 1000 + i, 2000, &[]));
        }
        records.push(record("new", 6.0, 500, 2001, &[]));
        let dataset = Dataset::new(records);
        let aggregates = Aggregates::compute(&dataset);
        let config = Config::default();
        let view = build(SceneKind::PopularityVsRating, &ctx(&dataset, &aggregates, &config, None));

        // 10 from 2000 plus the lone 2001 title, which a cumulative filter would push out
        assert_eq!(view.items.len(), 11);
        assert!(labels(&view).contains(&"new"));
    }

    #[test]
    fn test_scatter_log_domain_positive() {
        let dataset = Dataset::new(vec![record("tiny", 7.0, 3, 2000, &[]), record("big", 8.0, 90000, 2000, &[])]);
        let aggregates = Aggregates::compute(&dataset);
        let config = Config::default();
        let view = build(SceneKind::PopularityVsRating, &ctx(&dataset, &aggregates, &config, None));

        let x_axis = &view.axes[0];
        assert_eq!(x_axis.scale, ScaleKind::Log);
        assert!(x_axis.domain.0 > 0.0);
        assert!(x_axis.domain.0 < 3.0);
        for item in &view.items {
            if let Shape::Circle { cx, cy, .. } = item.shape {
                assert!(cx.is_finite() && cy.is_finite());
                assert!(cx >= 0.0 && cx <= view.plot.width + 1e-9);
            }
        }
    }

    #[test]
    fn test_scatter_tooltip_payload() {
        let dataset = sample();
        let aggregates = Aggregates::compute(&dataset);
        let config = Config::default();
        let view = build(SceneKind::PopularityVsRating, &ctx(&dataset, &aggregates, &config, None));
        let tooltip = view.items[0].tooltip.as_ref().unwrap();
        assert_eq!(tooltip.title, "A (2000)");
        assert_eq!(tooltip.lines, vec!["Rating: 9", "Popularity: 100"]);
    }

    // ==========================================================================
    // POPULARITY OVER TIME
    // ==========================================================================

    #[test]
    fn test_dual_line_has_two_series_and_three_axes() {
        let dataset = sample();
        let aggregates = Aggregates::compute(&dataset);
        let config = Config::default();
        let view = build(SceneKind::PopularityOverTime, &ctx(&dataset, &aggregates, &config, None));

        assert_eq!(view.axes.len(), 3);
        let totals = view.items.iter().filter(|i| i.series.as_deref() == Some("total")).count();
        let averages = view.items.iter().filter(|i| i.series.as_deref() == Some("average")).count();
        assert_eq!((totals, averages), (2, 2));

        // each series peaks at the top of its own axis
        let top_total = view.item("total-2001").unwrap();
        let top_average = view.item("average-2001").unwrap();
        for item in [top_total, top_average] {
            if let Shape::Circle { cy, .. } = item.shape {
                assert!(cy.abs() < 1e-9);
            }
        }
    }

    // ==========================================================================
    // GENRE SCENES
    // ==========================================================================

    #[test]
    fn test_genre_average_bars_in_engine_order() {
        let dataset = sample();
        let aggregates = Aggregates::compute(&dataset);
        let config = Config::default();
        let view = build(SceneKind::GenreAverages, &ctx(&dataset, &aggregates, &config, None));
        assert_eq!(labels(&view), vec!["Action", "Drama"]);
        assert_eq!(view.items[1].value_label, "7.50");
        assert_eq!(view.items[0].tooltip.as_ref().unwrap().lines[1], "Number of Animes: 2");
    }

    #[test]
    fn test_genre_explorer_filters_selection() {
        let dataset = sample();
        let aggregates = Aggregates::compute(&dataset);
        let config = Config::default();
        let view = build(SceneKind::GenreExplorer, &ctx(&dataset, &aggregates, &config, Some("Drama")));
        assert_eq!(view.title, "Top Rated Anime in Genre: Drama");
        assert_eq!(labels(&view), vec!["C", "B"]);
    }

    #[test]
    fn test_genre_explorer_is_deterministic() {
        let dataset = sample();
        let aggregates = Aggregates::compute(&dataset);
        let config = Config::default();
        let c = ctx(&dataset, &aggregates, &config, Some("Action"));
        assert_eq!(build(SceneKind::GenreExplorer, &c), build(SceneKind::GenreExplorer, &c));
    }

    #[test]
    fn test_unknown_genre_is_empty_not_error() {
        let dataset = sample();
        let aggregates = Aggregates::compute(&dataset);
        let config = Config::default();
        let view = build(SceneKind::GenreExplorer, &ctx(&dataset, &aggregates, &config, Some("Isekai")));
        assert!(view.is_empty());
    }

    // ==========================================================================
    // EMPTY DATASET
    // ==========================================================================

    #[test]
    fn test_every_scene_builds_on_empty_dataset() {
        let dataset = Dataset::default();
        let aggregates = Aggregates::compute(&dataset);
        let config = Config::default();
        let c = ctx(&dataset, &aggregates, &config, None);
        for scene in SceneKind::ALL {
            let view = build(scene, &c);
            assert_eq!(view.scene, scene);
            assert!(view.is_empty(), "{scene} should be empty");
        }
    }

    #[test]
    fn test_log_floor_stays_positive() {
        assert_eq!(log_floor(1000.0), 900.0);
        assert_eq!(log_floor(50.0), 25.0);
        assert!(log_floor(1.0) > 0.0);
    }
}
