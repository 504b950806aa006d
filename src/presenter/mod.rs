//! Scene state machine
//!
//! The [`Presenter`] owns the navigation state, the step timer of the
//! animated scene, and the two collaborators it draws through. Every trigger
//! (initial load, next, previous, resize, genre selection) funnels into one
//! `activate` path, which always tears down before it builds:
//!
//! 1. cancel the pending animation step
//! 2. clear the previous scene's elements from the canvas
//! 3. hide controls the new scene does not use
//! 4. build and draw the new scene, then schedule its first step
//!
//! The host owns the clock. It calls [`Presenter::poll`] from its event loop
//! (or [`Presenter::on_timer`] when it runs real timers); nothing here blocks
//! or spawns.
//!
//! ```text
//!            load ok                 advance / retreat / resize / select
//! Loading ──────────▶ Ready(scene i) ─────────────────────────────────┐
//!    │                      ▲                                        │
//!    │ load failed          └────────────── activate ◀───────────────┘
//!    ▼
//!  Failed
//! ```

mod surface;
mod timer;

pub use surface::{Chrome, Recording, Renderer, SurfaceEvent};
pub use timer::{StepTimer, TimerToken};

use crate::aggregate::Aggregates;
use crate::config::Config;
use crate::dataset::Dataset;
use crate::scene::{self, SceneContext, SceneKind, Tooltip, ViewModel, Viewport};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

/// Current scene and the sticky genre selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationState {
    pub current: SceneKind,
    /// Set the first time the genre explorer is entered, never reset
    pub selected_genre: Option<String>,
}

impl Default for NavigationState {
    fn default() -> Self {
        Self {
            current: SceneKind::TopRatedRace,
            selected_genre: None,
        }
    }
}

/// A tooltip and the pointer position it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HoverTip<'a> {
    pub x: f64,
    pub y: f64,
    pub tooltip: &'a Tooltip,
}

/// Why a scene is being (re)built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Load,
    Navigate,
    Resize,
    Select,
}

#[derive(Debug)]
struct ActiveScene {
    scene: SceneKind,
    view: ViewModel,
    frame: usize,
    frames: usize,
}

#[derive(Debug)]
struct Ready {
    dataset: Arc<Dataset>,
    aggregates: Arc<Aggregates>,
    nav: NavigationState,
    active: Option<ActiveScene>,
}

#[derive(Debug)]
enum Session {
    Loading,
    Failed(String),
    Ready(Ready),
}

pub struct Presenter<R: Renderer, C: Chrome> {
    config: Config,
    viewport: Viewport,
    session: Session,
    timer: StepTimer,
    renderer: R,
    chrome: C,
}

impl<R: Renderer, C: Chrome> Presenter<R, C> {
    /// A presenter waiting for its dataset. Until [`load`](Self::load) runs,
    /// every handler is a no-op.
    pub fn new(config: Config, viewport: Viewport, renderer: R, chrome: C) -> Self {
        Self {
            config,
            viewport,
            session: Session::Loading,
            timer: StepTimer::new(),
            renderer,
            chrome,
        }
    }

    /// Install the canonical dataset and enter the first scene.
    pub fn load(&mut self, dataset: Dataset, now: Instant) {
        let aggregates = Aggregates::compute(&dataset);
        self.load_shared(Arc::new(dataset), Arc::new(aggregates), now);
    }

    /// Like [`load`](Self::load) with aggregates computed elsewhere.
    pub fn load_shared(&mut self, dataset: Arc<Dataset>, aggregates: Arc<Aggregates>, now: Instant) {
        if !matches!(self.session, Session::Loading) {
            tracing::warn!("dataset already loaded, ignoring");
            return;
        }
        tracing::debug!(records = dataset.len(), years = dataset.years().len(), "dataset loaded");
        self.session = Session::Ready(Ready {
            dataset,
            aggregates,
            nav: NavigationState::default(),
            active: None,
        });
        self.activate(SceneKind::TopRatedRace, Trigger::Load, now);
    }

    /// Ingestion failed. No scene will ever be activated. Only a presenter
    /// still waiting for its dataset can fail.
    pub fn fail(&mut self, reason: impl Into<String>) {
        if !matches!(self.session, Session::Loading) {
            tracing::warn!("presentation already settled, ignoring failure");
            return;
        }
        let reason = reason.into();
        tracing::warn!(%reason, "presentation unavailable");
        self.chrome.show_message(&reason, self.config.message_duration());
        self.session = Session::Failed(reason);
    }

    pub fn advance(&mut self, now: Instant) -> bool {
        self.navigate(|s| s.next(), now)
    }

    pub fn retreat(&mut self, now: Instant) -> bool {
        self.navigate(|s| s.previous(), now)
    }

    fn navigate(&mut self, step: impl FnOnce(SceneKind) -> SceneKind, now: Instant) -> bool {
        let Some(current) = self.navigation().map(|n| n.current) else {
            tracing::debug!("navigation before load ignored");
            return false;
        };
        self.activate(step(current), Trigger::Navigate, now);
        true
    }

    /// Rebuild the current scene for a new viewport. Before load this only
    /// records the viewport, which the first scene then uses.
    pub fn resize(&mut self, viewport: Viewport, now: Instant) -> bool {
        self.viewport = viewport;
        let Some(current) = self.navigation().map(|n| n.current) else {
            return false;
        };
        self.activate(current, Trigger::Resize, now);
        true
    }

    /// Change the genre selection. The explorer is rebuilt if it is showing;
    /// otherwise the selection waits for the next visit.
    pub fn select_genre(&mut self, genre: &str, now: Instant) -> bool {
        let Session::Ready(ready) = &mut self.session else {
            return false;
        };
        ready.nav.selected_genre = Some(genre.to_string());
        let current = ready.nav.current;
        if current.has_genre_selector() {
            self.activate(current, Trigger::Select, now);
        }
        true
    }

    /// Run the pending animation step if it is due.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.timer.take_due(now) {
            Some(token) => self.on_timer(token, now),
            None => false,
        }
    }

    /// Advance the animated scene by one frame. Stale tokens (from a scene
    /// that has been left or rebuilt) are ignored.
    pub fn on_timer(&mut self, token: TimerToken, now: Instant) -> bool {
        if !self.timer.consume(token) {
            tracing::trace!(?token, "stale animation step ignored");
            return false;
        }
        let Session::Ready(ready) = &mut self.session else {
            return false;
        };
        let Some(active) = ready.active.as_mut() else {
            return false;
        };
        let next = active.frame + 1;
        if !active.scene.is_animated() || next >= active.frames {
            return false;
        }

        let ctx = SceneContext {
            dataset: &ready.dataset,
            aggregates: &ready.aggregates,
            config: &self.config,
            viewport: self.viewport,
            selected_genre: ready.nav.selected_genre.as_deref(),
        };
        let view = scene::build_frame(active.scene, &ctx, next);
        tracing::trace!(scene = %active.scene, frame = next, "animation step");
        self.renderer.draw(&view);
        active.view = view;
        active.frame = next;

        if next + 1 < active.frames {
            self.timer.schedule(now, self.config.step_delay());
        }
        true
    }

    fn activate(&mut self, scene: SceneKind, trigger: Trigger, now: Instant) {
        let Self {
            config,
            viewport,
            session,
            timer,
            renderer,
            chrome,
        } = self;
        let Session::Ready(ready) = session else {
            return;
        };

        timer.cancel();
        if let Some(previous) = ready.active.take() {
            renderer.clear(previous.scene);
        }
        if !scene.has_genre_selector() {
            chrome.hide_genre_selector();
        }

        ready.nav.current = scene;
        if scene.has_genre_selector() && ready.nav.selected_genre.is_none() {
            ready.nav.selected_genre = ready.aggregates.genre_tags.first().cloned();
        }

        let ctx = SceneContext {
            dataset: &ready.dataset,
            aggregates: &ready.aggregates,
            config,
            viewport: *viewport,
            selected_genre: ready.nav.selected_genre.as_deref(),
        };
        let view = scene::build(scene, &ctx);
        let frames = scene::frame_count(scene, &ready.dataset);
        tracing::debug!(%scene, ?trigger, items = view.items.len(), frames, "scene activated");

        renderer.draw(&view);
        if let (true, Some(selected)) = (scene.has_genre_selector(), ready.nav.selected_genre.as_deref()) {
            chrome.show_genre_selector(&ready.aggregates.genre_tags, selected);
        }
        if matches!(trigger, Trigger::Load | Trigger::Navigate) {
            chrome.show_message(scene.caption(), config.message_duration());
        }
        if scene.is_animated() && frames > 1 {
            timer.schedule(now, config.step_delay());
        }

        ready.active = Some(ActiveScene {
            scene,
            view,
            frame: 0,
            frames,
        });
    }

    /// Tooltip for a hovered item of the active scene, anchored at the
    /// pointer position `(x, y)` reported by the renderer.
    pub fn hover(&self, x: f64, y: f64, item_id: &str) -> Option<HoverTip<'_>> {
        let tooltip = self.current_view()?.item(item_id)?.tooltip.as_ref()?;
        Some(HoverTip { x, y, tooltip })
    }

    pub fn navigation(&self) -> Option<&NavigationState> {
        match &self.session {
            Session::Ready(ready) => Some(&ready.nav),
            _ => None,
        }
    }

    pub fn current_view(&self) -> Option<&ViewModel> {
        match &self.session {
            Session::Ready(ready) => ready.active.as_ref().map(|a| &a.view),
            _ => None,
        }
    }

    pub fn genre_tags(&self) -> &[String] {
        match &self.session {
            Session::Ready(ready) => &ready.aggregates.genre_tags,
            _ => &[],
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.session, Session::Ready(_))
    }

    pub fn failure(&self) -> Option<&str> {
        match &self.session {
            Session::Failed(reason) => Some(reason),
            _ => None,
        }
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn animation_pending(&self) -> bool {
        self.timer.is_pending()
    }

    pub fn next_step_due(&self) -> Option<Instant> {
        self.timer.next_due()
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn chrome(&self) -> &C {
        &self.chrome
    }

    /// Hosts that keep their own clock on the chrome reach it through here.
    pub fn chrome_mut(&mut self) -> &mut C {
        &mut self.chrome
    }
}
