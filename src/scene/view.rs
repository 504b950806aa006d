//! Renderer-agnostic view models
//!
//! A [`ViewModel`] is everything a renderer needs to draw one scene (or one
//! frame of the race): a title, axis descriptors, and items with both their
//! semantic position and pixel geometry inside the plot area.

use super::SceneKind;
use serde::{Deserialize, Serialize};

/// Drawable size of the canvas in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width: width.max(1.0),
            height: height.max(1.0),
        }
    }

    /// Plot area after margins: 10% top and bottom, 5% right, 25% left
    /// (long titles sit in the left margin).
    pub fn plot(&self) -> Rect {
        let left = self.width * 0.25;
        let right = self.width * 0.05;
        let top = self.height * 0.1;
        let bottom = self.height * 0.1;
        Rect {
            x: left,
            y: top,
            width: (self.width - left - right).max(0.0),
            height: (self.height - top - bottom).max(0.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    HorizontalBars,
    Scatter,
    DualLine,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisSide {
    Bottom,
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScaleKind {
    Linear,
    Log,
    Pow { exponent: f64 },
}

/// Enough to redraw an axis: side, scale type, domain and pixel range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Axis {
    pub side: AxisSide,
    pub scale: ScaleKind,
    pub domain: (f64, f64),
    pub range: (f64, f64),
    pub label: String,
    /// Axis values are years, render without grouping
    pub integer: bool,
}

/// Where an item sits in data space.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Position {
    Category { key: String },
    Point { x: f64, y: f64 },
}

/// Pixel geometry relative to the plot origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Shape {
    Bar { x: f64, y: f64, width: f64, height: f64 },
    Circle { cx: f64, cy: f64, r: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tooltip {
    pub title: String,
    pub lines: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Item {
    /// Stable across frames, so renderers can animate an item between frames
    pub id: String,
    pub position: Position,
    pub magnitude: f64,
    pub label: String,
    pub value_label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub series: Option<String>,
    pub color: String,
    pub shape: Shape,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tooltip: Option<Tooltip>,
}

/// Which step of an animated scene a view model shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Frame {
    pub index: usize,
    pub total: usize,
    pub year: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewModel {
    pub scene: SceneKind,
    pub title: String,
    pub chart: ChartKind,
    pub viewport: Viewport,
    pub plot: Rect,
    pub axes: Vec<Axis>,
    pub items: Vec<Item>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame: Option<Frame>,
}

impl ViewModel {
    pub fn empty(scene: SceneKind, chart: ChartKind, title: String, viewport: Viewport) -> Self {
        Self {
            scene,
            title,
            chart,
            viewport,
            plot: viewport.plot(),
            axes: Vec::new(),
            items: Vec::new(),
            frame: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn item(&self, id: &str) -> Option<&Item> {
        self.items.iter().find(|i| i.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plot_margins() {
        let plot = Viewport::new(1200.0, 700.0).plot();
        assert!((plot.x - 300.0).abs() < 1e-9);
        assert!((plot.y - 70.0).abs() < 1e-9);
        assert!((plot.width - 840.0).abs() < 1e-9);
        assert!((plot.height - 560.0).abs() < 1e-9);
    }

    #[test]
    fn test_viewport_never_collapses() {
        let viewport = Viewport::new(0.0, -20.0);
        assert_eq!(viewport.width, 1.0);
        assert_eq!(viewport.height, 1.0);
        assert!(viewport.plot().width >= 0.0);
    }

    #[test]
    fn test_view_model_serializes_tagged_shapes() {
        let mut view = ViewModel::empty(
            SceneKind::GenreAverages,
            ChartKind::HorizontalBars,
            "t".to_string(),
            Viewport::new(100.0, 100.0),
        );
        view.items.push(Item {
            id: "genre-Action".to_string(),
            position: Position::Category { key: "Action".to_string() },
            magnitude: 8.0,
            label: "Action".to_string(),
            value_label: "8.00".to_string(),
            series: None,
            color: "#2f51a3".to_string(),
            shape: Shape::Bar { x: 0.0, y: 1.0, width: 2.0, height: 3.0 },
            tooltip: None,
        });
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["scene"], "genre_averages");
        assert_eq!(json["items"][0]["shape"]["type"], "bar");
        assert_eq!(json["items"][0]["position"]["key"], "Action");
        assert!(json.get("frame").is_none());
    }
}
