//! Collaborators the presenter drives
//!
//! [`Renderer`] is the chart canvas, [`Chrome`] the UI around it (genre
//! selector, message banner). [`Recording`] implements both in memory and
//! keeps an event log, which is what tests and headless hosts use.

use crate::scene::{SceneKind, ViewModel};
use std::time::Duration;

pub trait Renderer {
    /// Remove every element tagged with `scene`.
    fn clear(&mut self, scene: SceneKind);

    fn draw(&mut self, view: &ViewModel);
}

pub trait Chrome {
    fn show_genre_selector(&mut self, genres: &[String], selected: &str);

    fn hide_genre_selector(&mut self);

    fn show_message(&mut self, text: &str, duration: Duration);
}

#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceEvent {
    Clear(SceneKind),
    Draw { scene: SceneKind, title: String, items: usize },
    ShowSelector { selected: String },
    HideSelector,
    Message(String),
}

/// In-memory canvas and chrome.
#[derive(Debug, Default)]
pub struct Recording {
    pub events: Vec<SurfaceEvent>,
    /// What is on the canvas right now
    pub canvas: Option<ViewModel>,
    pub selector: Option<(Vec<String>, String)>,
    pub message: Option<(String, Duration)>,
    /// Draws that landed on a canvas still holding another scene
    pub overlaps: usize,
}

impl Recording {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn draws(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, SurfaceEvent::Draw { .. }))
            .count()
    }

    pub fn titles(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|e| match e {
                SurfaceEvent::Draw { title, .. } => Some(title.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl Renderer for Recording {
    fn clear(&mut self, scene: SceneKind) {
        self.events.push(SurfaceEvent::Clear(scene));
        if self.canvas.as_ref().is_some_and(|v| v.scene == scene) {
            self.canvas = None;
        }
    }

    fn draw(&mut self, view: &ViewModel) {
        if self.canvas.as_ref().is_some_and(|v| v.scene != view.scene) {
            self.overlaps += 1;
        }
        self.events.push(SurfaceEvent::Draw {
            scene: view.scene,
            title: view.title.clone(),
            items: view.items.len(),
        });
        self.canvas = Some(view.clone());
    }
}

impl Chrome for Recording {
    fn show_genre_selector(&mut self, genres: &[String], selected: &str) {
        self.events.push(SurfaceEvent::ShowSelector { selected: selected.to_string() });
        self.selector = Some((genres.to_vec(), selected.to_string()));
    }

    fn hide_genre_selector(&mut self) {
        if self.selector.take().is_some() {
            self.events.push(SurfaceEvent::HideSelector);
        }
    }

    fn show_message(&mut self, text: &str, duration: Duration) {
        self.events.push(SurfaceEvent::Message(text.to_string()));
        self.message = Some((text.to_string(), duration));
    }
}
