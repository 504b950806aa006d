//! HTML report generation with D3.js visualizations

use crate::report::{Presentation, Result};
use std::io::Write;

const PAGE: &str = include_str!("page.html");
pub(crate) const CHARTS_JS: &str = include_str!("charts.js");

pub fn write<W: Write>(writer: &mut W, presentation: &Presentation) -> Result<()> {
    let data = embed_json(&serde_json::to_string(presentation)?);

    let summary = &presentation.summary;
    let subtitle = match (summary.first_year, summary.last_year) {
        (Some(first), Some(last)) => format!("{} anime, {first} to {last}", summary.records),
        _ => "No anime in the selected window".to_string(),
    };

    let page = PAGE
        .replace("{{TITLE}}", &escape_html(&first_title(presentation)))
        .replace("{{SUBTITLE}}", &escape_html(&subtitle))
        .replace("{{GENERATED}}", &escape_html(&presentation.generated))
        .replace("{{SOURCE}}", &escape_html(&presentation.source))
        .replace("{{CHARTS}}", CHARTS_JS)
        .replace("{{DATA}}", &data);

    writer.write_all(page.as_bytes())?;
    Ok(())
}

fn first_title(presentation: &Presentation) -> String {
    presentation
        .scenes
        .first()
        .and_then(|s| s.frames.last())
        .map(|v| v.title.clone())
        .unwrap_or_else(|| "Anistory".to_string())
}

/// JSON is inlined into a `<script>` element, so no `</` may survive.
pub(crate) fn embed_json(json: &str) -> String {
    json.replace("</", "<\\/")
}

pub(crate) fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
