//! Terminal rendering of a single view model

use crate::scene::{ChartKind, Shape, ViewModel};
use std::io::{self, Write};

const BAR_WIDTH: usize = 40;

pub fn write<W: Write>(writer: &mut W, view: &ViewModel) -> io::Result<()> {
    writeln!(writer, "{}", view.title)?;
    writeln!(writer, "{}", "=".repeat(view.title.chars().count().max(10)))?;

    if view.is_empty() {
        writeln!(writer, "(nothing to show)")?;
        return Ok(());
    }

    match view.chart {
        ChartKind::HorizontalBars => write_bars(writer, view)?,
        ChartKind::Scatter | ChartKind::DualLine => write_table(writer, view)?,
    }

    if let Some(frame) = view.frame {
        writeln!(writer)?;
        writeln!(writer, "Year {} ({} of {})", frame.year, frame.index + 1, frame.total)?;
    }
    Ok(())
}

fn write_bars<W: Write>(writer: &mut W, view: &ViewModel) -> io::Result<()> {
    let label_width = view.items.iter().map(|i| i.label.chars().count()).max().unwrap_or(0).min(40);
    let full = view.plot.width.max(1.0);

    for item in &view.items {
        let width = match item.shape {
            Shape::Bar { width, .. } => width,
            Shape::Circle { .. } => 0.0,
        };
        let cells = ((width / full) * BAR_WIDTH as f64).round().clamp(0.0, BAR_WIDTH as f64) as usize;
        writeln!(
            writer,
            "{:>label_width$} │{:<BAR_WIDTH$} {}",
            truncate(&item.label, label_width),
            "█".repeat(cells),
            item.value_label,
        )?;
    }
    Ok(())
}

fn write_table<W: Write>(writer: &mut W, view: &ViewModel) -> io::Result<()> {
    let label_width = view.items.iter().map(|i| i.label.chars().count()).max().unwrap_or(0).min(40);
    for item in &view.items {
        let series = item.series.as_deref().unwrap_or("");
        writeln!(
            writer,
            "{:<label_width$}  {:<8} {}",
            truncate(&item.label, label_width),
            series,
            item.value_label,
        )?;
    }
    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}
