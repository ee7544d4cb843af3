//! Confusion heatmaps as standalone SVG documents.

use std::fmt::Write as _;
use std::io::Write;
use std::path::Path;

use tracing::info;

use crate::metrics::MatrixView;
use crate::types::ClassifyResult;
use crate::writer;

const CELL: u32 = 44;
const MARGIN_LEFT: u32 = 56;
const MARGIN_TOP: u32 = 16;
const MARGIN_BOTTOM: u32 = 52;
const MARGIN_RIGHT: u32 = 16;

// Endpoints of the blue color ramp.
const LOW: (f64, f64, f64) = (247.0, 251.0, 255.0);
const HIGH: (f64, f64, f64) = (8.0, 48.0, 107.0);

/// Axis caption of a concept.
pub fn concept_caption(key: &str) -> &str {
    match key {
        "weight_t" => "Weighting",
        "contrast_time" => "Contrast Timing",
        "is_contrast_agent" => "Contrast Presence",
        "aquisition_echo" => "Technique",
        "plane_type" => "Plane",
        other => other,
    }
}

/// Tick label: the first three characters, upper-cased.
pub fn short_tick(label: &str) -> String {
    label.chars().take(3).collect::<String>().to_uppercase()
}

/// Heatmap appearance.
#[derive(Debug, Clone)]
pub struct HeatmapStyle {
    /// Caption under the x axis.
    pub caption: String,
    /// Caption of the y axis.
    pub y_caption: String,
    /// Maps a class label to its tick text.
    pub shorten: fn(&str) -> String,
}

impl Default for HeatmapStyle {
    fn default() -> Self {
        Self {
            caption: String::new(),
            y_caption: "Gold".to_string(),
            shorten: short_tick,
        }
    }
}

impl HeatmapStyle {
    /// Style with the caption of a concept.
    pub fn for_concept(key: &str) -> Self {
        Self {
            caption: concept_caption(key).to_string(),
            ..Self::default()
        }
    }
}

/// Renders a matrix view as SVG. An empty view renders a "NO DATA" figure.
pub fn render_svg(view: &MatrixView, style: &HeatmapStyle) -> String {
    if view.is_empty() {
        return no_data();
    }

    let n = view.classes.len() as u32;
    let width = MARGIN_LEFT + n * CELL + MARGIN_RIGHT;
    let height = MARGIN_TOP + n * CELL + MARGIN_BOTTOM;
    let scale = if view.normalized { 1.0 } else { view.max().max(f64::EPSILON) };

    let mut svg = String::new();
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" font-family="sans-serif" font-size="11">"#,
        w = width,
        h = height
    );
    let _ = writeln!(svg, r#"<rect width="{}" height="{}" fill="white"/>"#, width, height);

    for (row, values) in view.values.iter().enumerate() {
        for (col, value) in values.iter().enumerate() {
            let intensity = (value / scale).clamp(0.0, 1.0);
            let x = MARGIN_LEFT + col as u32 * CELL;
            let y = MARGIN_TOP + row as u32 * CELL;
            let text_fill = if intensity > 0.5 { "white" } else { "black" };
            let text = if view.normalized {
                format!("{:.2}", value)
            } else {
                format!("{:.0}", value)
            };
            let _ = writeln!(
                svg,
                r#"<rect x="{}" y="{}" width="{}" height="{}" fill="{}"/>"#,
                x,
                y,
                CELL,
                CELL,
                color(intensity)
            );
            let _ = writeln!(
                svg,
                r#"<text x="{}" y="{}" text-anchor="middle" dominant-baseline="central" fill="{}">{}</text>"#,
                x + CELL / 2,
                y + CELL / 2,
                text_fill,
                text
            );
        }
    }

    for (i, class) in view.classes.iter().enumerate() {
        let tick = escape(&(style.shorten)(class));
        let offset = i as u32 * CELL + CELL / 2;
        let _ = writeln!(
            svg,
            r#"<text x="{}" y="{}" text-anchor="end" dominant-baseline="central">{}</text>"#,
            MARGIN_LEFT - 6,
            MARGIN_TOP + offset,
            tick
        );
        let _ = writeln!(
            svg,
            r#"<text x="{}" y="{}" text-anchor="middle">{}</text>"#,
            MARGIN_LEFT + offset,
            MARGIN_TOP + n * CELL + 16,
            tick
        );
    }

    let _ = writeln!(
        svg,
        r#"<text x="{}" y="{}" text-anchor="middle" font-size="12">{}</text>"#,
        MARGIN_LEFT + n * CELL / 2,
        height - 10,
        escape(&style.caption)
    );
    let _ = writeln!(
        svg,
        r#"<text x="12" y="{y}" text-anchor="middle" font-size="12" transform="rotate(-90 12 {y})">{}</text>"#,
        escape(&style.y_caption),
        y = MARGIN_TOP + n * CELL / 2
    );
    svg.push_str("</svg>\n");
    svg
}

/// Renders and writes a heatmap.
pub fn write_heatmap<P: AsRef<Path>>(path: P, view: &MatrixView, style: &HeatmapStyle) -> ClassifyResult<()> {
    let path = path.as_ref();
    let mut file = writer::create(path)?;
    file.write_all(render_svg(view, style).as_bytes())?;
    file.flush()?;
    info!(path = %path.display(), classes = view.classes.len(), "heatmap written");
    Ok(())
}

fn no_data() -> String {
    concat!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="160" height="80" viewBox="0 0 160 80" font-family="sans-serif">"#,
        "\n",
        r#"<rect width="160" height="80" fill="white"/>"#,
        "\n",
        r#"<text x="80" y="40" text-anchor="middle" dominant-baseline="central" font-size="14">NO DATA</text>"#,
        "\n</svg>\n"
    )
    .to_string()
}

fn color(intensity: f64) -> String {
    let mix = |low: f64, high: f64| (low + (high - low) * intensity).round() as u8;
    format!(
        "#{:02x}{:02x}{:02x}",
        mix(LOW.0, HIGH.0),
        mix(LOW.1, HIGH.1),
        mix(LOW.2, HIGH.2)
    )
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
