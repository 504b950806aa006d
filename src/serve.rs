//! HTTP server for the interactive presentation
//!
//! `anistory serve anime.csv` → loads the CSV, opens the browser, and drives
//! a [`Presenter`] from the request loop. The page polls `/api/frame` and
//! redraws whenever the frame sequence number moves.

use crate::config::Config;
use crate::dataset;
use crate::presenter::{Chrome, HoverTip, Presenter, Renderer};
use crate::report::html::CHARTS_JS;
use crate::scene::{SceneKind, ViewModel, Viewport};
use serde::{Deserialize, Serialize};
use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tiny_http::{Header, Method, Request, Response, Server};

// Embed the UI directly in the binary
const UI_HTML: &str = include_str!("serve_ui.html");

/// How often the request loop wakes up to run due animation steps
const TICK: Duration = Duration::from_millis(50);

#[derive(Serialize)]
struct ApiResponse<T> {
    ok: bool,
    data: Option<T>,
    error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    fn success(data: T) -> Self {
        Self { ok: true, data: Some(data), error: None }
    }

    fn failure(error: impl Into<String>) -> Self {
        Self { ok: false, data: None, error: Some(error.into()) }
    }
}

/// Canvas state shipped to the browser.
#[derive(Debug, Default)]
pub struct FrameCanvas {
    seq: u64,
    view: Option<ViewModel>,
}

impl Renderer for FrameCanvas {
    fn clear(&mut self, scene: SceneKind) {
        if self.view.as_ref().is_some_and(|v| v.scene == scene) {
            self.view = None;
            self.seq += 1;
        }
    }

    fn draw(&mut self, view: &ViewModel) {
        self.view = Some(view.clone());
        self.seq += 1;
    }
}

/// Selector and message banner state shipped to the browser.
#[derive(Debug, Default)]
pub struct BrowserChrome {
    selector: Option<(Vec<String>, String)>,
    message: Option<Banner>,
}

/// A message and how long it stays up. `until` is unset until the host
/// stamps it with its clock.
#[derive(Debug)]
struct Banner {
    text: String,
    duration: Duration,
    until: Option<Instant>,
}

impl BrowserChrome {
    /// Start the expiry of a freshly shown message at `now`.
    pub fn stamp(&mut self, now: Instant) {
        if let Some(banner) = self.message.as_mut() {
            if banner.until.is_none() {
                banner.until = Some(now + banner.duration);
            }
        }
    }

    fn message_at(&self, now: Instant) -> Option<&str> {
        self.message
            .as_ref()
            .filter(|b| b.until.map_or(true, |until| until > now))
            .map(|b| b.text.as_str())
    }
}

impl Chrome for BrowserChrome {
    fn show_genre_selector(&mut self, genres: &[String], selected: &str) {
        self.selector = Some((genres.to_vec(), selected.to_string()));
    }

    fn hide_genre_selector(&mut self) {
        self.selector = None;
    }

    fn show_message(&mut self, text: &str, duration: Duration) {
        self.message = Some(Banner {
            text: text.to_string(),
            duration,
            until: None,
        });
    }
}

type ServePresenter = Presenter<FrameCanvas, BrowserChrome>;

#[derive(Serialize)]
struct Selector<'a> {
    genres: &'a [String],
    selected: &'a str,
}

#[derive(Serialize)]
struct FrameState<'a> {
    seq: u64,
    ready: bool,
    failure: Option<&'a str>,
    scene_index: Option<usize>,
    scene_count: usize,
    view: Option<&'a ViewModel>,
    selector: Option<Selector<'a>>,
    message: Option<&'a str>,
    animating: bool,
}

impl<'a> FrameState<'a> {
    fn of(presenter: &'a ServePresenter, now: Instant) -> Self {
        let canvas = presenter.renderer();
        let chrome = presenter.chrome();
        Self {
            seq: canvas.seq,
            ready: presenter.is_ready(),
            failure: presenter.failure(),
            scene_index: presenter.navigation().map(|n| n.current.index()),
            scene_count: SceneKind::COUNT,
            view: canvas.view.as_ref(),
            selector: chrome.selector.as_ref().map(|(genres, selected)| Selector {
                genres,
                selected,
            }),
            message: chrome.message_at(now),
            animating: presenter.animation_pending(),
        }
    }
}

#[derive(Deserialize, Debug)]
struct GenreParams {
    name: String,
}

#[derive(Deserialize, Debug)]
struct ResizeParams {
    width: f64,
    height: f64,
}

#[derive(Deserialize, Debug)]
struct HoverParams {
    item: String,
    #[serde(default)]
    x: f64,
    #[serde(default)]
    y: f64,
}

#[derive(Debug, PartialEq)]
struct Reply {
    status: u16,
    content_type: &'static str,
    body: String,
}

impl Reply {
    fn html(body: String) -> Self {
        Self { status: 200, content_type: "text/html; charset=utf-8", body }
    }

    fn json<T: Serialize>(status: u16, value: &T) -> io::Result<Self> {
        Ok(Self {
            status,
            content_type: "application/json",
            body: serde_json::to_string(value)?,
        })
    }

    fn not_found() -> Self {
        Self { status: 404, content_type: "text/plain", body: "Not found".to_string() }
    }
}

/// Start server, open browser, serve the presentation
pub fn start(port: u16, csv: PathBuf, config: Config) -> io::Result<()> {
    let addr = format!("127.0.0.1:{}", port);
    let server = Server::http(&addr).map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;

    let url = format!("http://localhost:{}", port);
    let source = csv.canonicalize().unwrap_or_else(|_| csv.clone()).display().to_string();

    eprintln!("\n\x1b[1;35m📺 Anistory\x1b[0m");
    eprintln!("   {}", url);
    eprintln!("   Presenting: {}\n", source);

    let viewport = Viewport::new(config.width, config.height);
    let mut presenter = Presenter::new(config.clone(), viewport, FrameCanvas::default(), BrowserChrome::default());

    let now = Instant::now();
    match dataset::load(&csv, &config) {
        Ok((dataset, stats)) => {
            tracing::info!(kept = stats.kept, rejected = stats.rejected(), "dataset ready");
            presenter.load(dataset, now);
        }
        Err(e) => {
            eprintln!("\x1b[31mCould not load {}: {}\x1b[0m", source, e);
            presenter.fail(format!("Could not load {}: {}", source, e));
        }
    }
    presenter.chrome_mut().stamp(now);

    // Open browser
    let _ = open::that(&url);

    loop {
        match server.recv_timeout(TICK) {
            Ok(Some(request)) => {
                if let Err(e) = handle_request(request, &mut presenter, &source) {
                    tracing::warn!(error = %e, "request failed");
                }
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "accept failed"),
        }
        presenter.poll(Instant::now());
    }
}

fn handle_request(request: Request, presenter: &mut ServePresenter, source: &str) -> io::Result<()> {
    let url = request.url().to_string();
    let method = request.method().clone();
    tracing::trace!(%method, %url, "request");

    let reply = route(presenter, &method, &url, source, Instant::now())?;

    let mut response = Response::from_string(reply.body).with_status_code(reply.status);
    if let Ok(header) = Header::from_bytes(&b"Content-Type"[..], reply.content_type.as_bytes()) {
        response.add_header(header);
    }
    request.respond(response)
}

fn route(presenter: &mut ServePresenter, method: &Method, url: &str, source: &str, now: Instant) -> io::Result<Reply> {
    let (path, query) = url.split_once('?').unwrap_or((url, ""));
    let reply = dispatch(presenter, method, path, query, source, now);
    presenter.chrome_mut().stamp(now);
    reply
}

fn dispatch(
    presenter: &mut ServePresenter,
    method: &Method,
    path: &str,
    query: &str,
    source: &str,
    now: Instant,
) -> io::Result<Reply> {

    match (method, path) {
        (&Method::Get, "/") => {
            let html = UI_HTML
                .replace("{{SOURCE}}", &crate::report::html::escape_html(source))
                .replace("{{CHARTS}}", CHARTS_JS);
            Ok(Reply::html(html))
        }

        (&Method::Get, "/api/frame") => Reply::json(200, &ApiResponse::success(FrameState::of(presenter, now))),

        (&Method::Get, "/api/next") | (&Method::Post, "/api/next") => {
            presenter.advance(now);
            Reply::json(200, &ApiResponse::success(FrameState::of(presenter, now)))
        }

        (&Method::Get, "/api/prev") | (&Method::Post, "/api/prev") => {
            presenter.retreat(now);
            Reply::json(200, &ApiResponse::success(FrameState::of(presenter, now)))
        }

        (&Method::Get, "/api/genre") | (&Method::Post, "/api/genre") => {
            match serde_urlencoded::from_str::<GenreParams>(query) {
                Ok(params) => {
                    presenter.select_genre(&params.name, now);
                    Reply::json(200, &ApiResponse::success(FrameState::of(presenter, now)))
                }
                Err(e) => Reply::json(400, &ApiResponse::<()>::failure(e.to_string())),
            }
        }

        (&Method::Get, "/api/resize") | (&Method::Post, "/api/resize") => {
            match serde_urlencoded::from_str::<ResizeParams>(query) {
                Ok(params) => {
                    presenter.resize(Viewport::new(params.width, params.height), now);
                    Reply::json(200, &ApiResponse::success(FrameState::of(presenter, now)))
                }
                Err(e) => Reply::json(400, &ApiResponse::<()>::failure(e.to_string())),
            }
        }

        (&Method::Get, "/api/hover") => match serde_urlencoded::from_str::<HoverParams>(query) {
            Ok(params) => {
                let tip: Option<HoverTip<'_>> = presenter.hover(params.x, params.y, &params.item);
                Reply::json(200, &ApiResponse::success(tip))
            }
            Err(e) => Reply::json(400, &ApiResponse::<()>::failure(e.to_string())),
        },

        _ => Ok(Reply::not_found()),
    }
}
