use anistory::aggregate::{self, Aggregates, RankMode};
use anistory::dataset::{self, Dataset, NormalizeStats};
use anistory::report::{self, Presentation};
use anistory::scene::{self, SceneContext, SceneKind, Viewport};
use anistory::{Config, ConfigError, IngestError};
use chrono::Local;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "anistory")]
#[command(author, version, about = "Tell the story of anime ratings, one chart at a time")]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Anime CSV to present (optional in GUI mode)
    path: Option<PathBuf>,

    /// Launch GUI file picker (auto-enabled when double-clicked)
    #[arg(long)]
    gui: bool,

    /// Output report file (.html, .json)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Directory for auto-generated reports
    #[arg(long, default_value = "anistory-reports")]
    report_dir: PathBuf,

    /// Don't auto-generate HTML report
    #[arg(long)]
    no_report: bool,

    /// Don't prompt to open report
    #[arg(long)]
    no_open: bool,

    /// Show debug logging and rejection details
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only show summary
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(flatten)]
    settings: Settings,
}

/// Config file plus per-field overrides
#[derive(clap::Args, Debug)]
struct Settings {
    /// JSON config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// First aired year to keep
    #[arg(long, global = true)]
    from_year: Option<i32>,

    /// Last aired year to keep
    #[arg(long, global = true)]
    to_year: Option<i32>,

    /// Size of every top-N ranking
    #[arg(long, global = true)]
    top: Option<usize>,

    /// Delay between race frames in milliseconds
    #[arg(long, global = true)]
    step_ms: Option<u64>,

    /// Chart width in pixels
    #[arg(long, global = true)]
    width: Option<f64>,

    /// Chart height in pixels
    #[arg(long, global = true)]
    height: Option<f64>,
}

impl Settings {
    fn resolve(&self) -> Result<Config, ConfigError> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path)?,
            None => Config::default(),
        };
        if let Some(year) = self.from_year {
            config.from_year = year;
        }
        if let Some(year) = self.to_year {
            config.to_year = year;
        }
        if let Some(n) = self.top {
            config.top_n = n;
        }
        if let Some(ms) = self.step_ms {
            config.step_delay_ms = ms;
        }
        if let Some(width) = self.width {
            config.width = width;
        }
        if let Some(height) = self.height {
            config.height = height;
        }
        config.validate()?;
        Ok(config)
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the interactive presentation in the browser
    Serve {
        /// Anime CSV to present
        path: PathBuf,

        /// Port to listen on
        #[arg(short, long, default_value = "3001")]
        port: u16,
    },

    /// Render a single scene to the terminal
    Scene {
        /// Anime CSV to present
        path: PathBuf,

        /// Scene number (1-5)
        #[arg(short, long, default_value = "1", value_parser = clap::value_parser!(u8).range(1..=5))]
        scene: u8,

        /// Genre for the genre explorer (default: first genre)
        #[arg(short, long)]
        genre: Option<String>,

        /// Race frame (default: last year)
        #[arg(short, long)]
        frame: Option<usize>,

        /// Print the view model as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);

    let config = match args.settings.resolve() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("\x1b[31mError:\x1b[0m {}", e);
            std::process::exit(1);
        }
    };

    // Handle subcommands first
    if let Some(cmd) = args.command {
        match cmd {
            Command::Serve { path, port } => {
                if let Err(e) = anistory::serve::start(port, path, config) {
                    eprintln!("Server error: {}", e);
                    std::process::exit(1);
                }
            }
            Command::Scene { path, scene, genre, frame, json } => {
                let (dataset, _) = load_or_exit(&path, &config, true);
                let kind = SceneKind::from_index(usize::from(scene) - 1);
                if let Err(e) = print_scene(&dataset, &config, kind, genre.as_deref(), frame, json) {
                    eprintln!("\x1b[31mError:\x1b[0m {}", e);
                    std::process::exit(1);
                }
            }
        }
        return;
    }

    // With GUI feature: launch GUI if --gui flag OR no path provided
    #[cfg(feature = "gui")]
    let use_gui = args.gui || args.path.is_none();

    #[cfg(not(feature = "gui"))]
    let use_gui = false;

    #[cfg(feature = "gui")]
    let path = match (use_gui, args.path.clone()) {
        (false, Some(p)) => p,
        _ => match pick_path_gui() {
            Some(p) => p,
            None => {
                eprintln!("No CSV file selected.");
                std::process::exit(0);
            }
        },
    };

    #[cfg(not(feature = "gui"))]
    let path = if let Some(p) = args.path.clone() {
        p
    } else {
        eprintln!("Usage: anistory <CSV>");
        eprintln!("Run 'anistory --help' for more options.");
        eprintln!("Note: GUI mode not available in this build.");
        std::process::exit(1);
    };

    if !args.quiet {
        eprintln!("\x1b[1mAnistory - Anime Ratings Story\x1b[0m");
        eprintln!("{}", "─".repeat(70));
    }

    let (dataset, stats) = load_or_exit(&path, &config, args.quiet);

    if !args.quiet {
        print_summary(&dataset, &stats, &config, args.verbose);
    }

    // Determine report path
    let report_path = if let Some(ref output) = args.output {
        Some(output.clone())
    } else if !args.no_report {
        std::fs::create_dir_all(&args.report_dir).ok();
        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let filename = format!("anistory_{}.html", timestamp);
        Some(args.report_dir.join(filename))
    } else {
        None
    };

    if let Some(ref output_path) = report_path {
        let presentation = Presentation::build(&dataset, &stats, &config, &path.display().to_string());
        if let Err(e) = report::generate(output_path, &presentation) {
            eprintln!("Failed to write report: {}", e);
            std::process::exit(1);
        }
        if !args.quiet {
            eprintln!("\n\x1b[32mReport saved: {}\x1b[0m", output_path.display());
        }

        if !args.no_open {
            if use_gui {
                // In GUI mode, auto-open the report (no prompt)
                let _ = open::that(output_path);
            } else if !args.quiet {
                eprint!("\nOpen report in browser? [Y/n] ");
                io::stderr().flush().ok();

                let mut input = String::new();
                if io::stdin().read_line(&mut input).is_ok() {
                    let input = input.trim().to_lowercase();
                    if input.is_empty() || input == "y" || input == "yes" {
                        if let Err(e) = open::that(output_path) {
                            eprintln!("Failed to open report: {}", e);
                        }
                    }
                }
            }
        }
    }

    if !args.quiet {
        eprintln!("\n\x1b[90mDone.\x1b[0m");
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// Read and normalize the CSV behind a spinner. Ingestion errors are fatal.
fn load_or_exit(path: &Path, config: &Config, quiet: bool) -> (Dataset, NormalizeStats) {
    match load_with_progress(path, config, quiet) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("\x1b[31mError:\x1b[0m could not load {}: {}", path.display(), e);
            std::process::exit(1);
        }
    }
}

fn load_with_progress(path: &Path, config: &Config, quiet: bool) -> Result<(Dataset, NormalizeStats), IngestError> {
    let pb = if quiet {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.green} {msg}") {
            pb.set_style(style);
        }
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    };
    pb.set_message(format!("Reading {}", path.display()));

    let raw = dataset::read_csv_with(path, &config.columns, |rows| {
        if rows % 1000 == 0 {
            pb.set_message(format!("Reading {} ({} rows)", path.display(), rows));
        }
    });
    let raw = match raw {
        Ok(raw) => raw,
        Err(e) => {
            pb.finish_and_clear();
            return Err(e);
        }
    };

    pb.set_message(format!("Normalizing {} rows", raw.len()));
    let loaded = dataset::normalize(raw, config);
    pb.finish_and_clear();
    Ok(loaded)
}

fn print_summary(dataset: &Dataset, stats: &NormalizeStats, config: &Config, verbose: bool) {
    let summary = report::Summary::from_dataset(dataset, stats);

    eprintln!("\x1b[1mSummary:\x1b[0m");
    eprintln!("  \x1b[32m✓ Kept:\x1b[0m       {}", summary.records);
    eprintln!("  \x1b[33m✗ Rejected:\x1b[0m   {}", summary.rejected);
    if verbose && summary.rejected > 0 {
        eprintln!("      missing date:   {}", stats.missing_date);
        eprintln!("      invalid year:   {}", stats.invalid_year);
        eprintln!("      outside window: {}", stats.outside_window);
        eprintln!("      unrated:        {}", stats.unrated);
        eprintln!("      invalid:        {}", stats.invalid);
    }
    match (summary.first_year, summary.last_year) {
        (Some(first), Some(last)) => eprintln!("  Years:        {} - {}", first, last),
        _ => eprintln!(
            "  \x1b[33mNo anime aired between {} and {}\x1b[0m",
            config.from_year, config.to_year
        ),
    }
    eprintln!("  Genres:       {}", summary.genres);

    if let Some(&last) = dataset.years().last() {
        eprintln!("\n\x1b[1mTop {} through {}:\x1b[0m", config.top_n, last);
        for (rank, record) in aggregate::ranking(dataset, last, config.top_n, RankMode::Cumulative)
            .iter()
            .enumerate()
        {
            eprintln!("  {:>2}. {:<50} {:.2}  ({})", rank + 1, record.name, record.score, record.aired_year);
        }
    }
}

fn print_scene(
    dataset: &Dataset,
    config: &Config,
    kind: SceneKind,
    genre: Option<&str>,
    frame: Option<usize>,
    json: bool,
) -> io::Result<()> {
    let aggregates = Aggregates::compute(dataset);
    let selected = genre.or_else(|| aggregates.genre_tags.first().map(String::as_str));
    let ctx = SceneContext {
        dataset,
        aggregates: &aggregates,
        config,
        viewport: Viewport::new(config.width, config.height),
        selected_genre: selected,
    };

    let frames = scene::frame_count(kind, dataset);
    let frame = frame.unwrap_or(frames.saturating_sub(1)).min(frames.saturating_sub(1));
    let view = scene::build_frame(kind, &ctx, frame);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if json {
        serde_json::to_writer_pretty(&mut out, &view)?;
        writeln!(out)?;
    } else {
        writeln!(out, "\x1b[90m{}. {}\x1b[0m", kind.index() + 1, kind.caption())?;
        report::text::write(&mut out, &view)?;
    }
    Ok(())
}

#[cfg(feature = "gui")]
fn pick_path_gui() -> Option<PathBuf> {
    rfd::FileDialog::new()
        .set_title("Select anime CSV to present")
        .add_filter("CSV files", &["csv"])
        .pick_file()
}
