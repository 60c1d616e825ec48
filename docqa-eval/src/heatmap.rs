//! Heatmap rendering of a [`ScoreReport`].
//!
//! Rows are questions, columns are metrics. Cells are coloured on a linear
//! scale from salmon (0.0) to spring green (1.0) and annotated with the score
//! to two decimals. SVG output carries labels; PNG output is the bare grid.

use std::path::Path;

use image::{ImageError, ImageFormat, Rgb, RgbImage};
use tracing::{error, info};

use crate::error::{EvalError, Result};
use crate::report::ScoreReport;

/// Colour of a 0.0 score.
pub const LOW_COLOR: [u8; 3] = [250, 128, 114];
/// Colour of a 1.0 score.
pub const HIGH_COLOR: [u8; 3] = [0, 255, 127];
/// Cell edge length used by [`Heatmap::save`] for PNG output.
pub const DEFAULT_CELL_PX: u32 = 48;

const CELL_WIDTH: usize = 170;
const CELL_HEIGHT: usize = 36;
const HEADER_HEIGHT: usize = 40;
const LABEL_PADDING: usize = 12;
const CHAR_WIDTH: usize = 7;
const MAX_LABEL_CHARS: usize = 60;
const GRID: Rgb<u8> = Rgb([255, 255, 255]);

/// A labelled grid of scores ready for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct Heatmap {
    row_labels: Vec<String>,
    column_labels: Vec<String>,
    values: Vec<Vec<Option<f32>>>,
}

impl Heatmap {
    /// Lay out a report: one row per question, one column per metric.
    pub fn from_report(report: &ScoreReport) -> Self {
        Self {
            row_labels: report.rows().iter().map(|row| row.question.clone()).collect(),
            column_labels: report.metrics().iter().map(|m| m.name().to_string()).collect(),
            values: report
                .rows()
                .iter()
                .map(|row| report.metrics().iter().map(|m| row.score(*m)).collect())
                .collect(),
        }
    }

    /// Number of rows and columns.
    pub fn shape(&self) -> (usize, usize) {
        (self.row_labels.len(), self.column_labels.len())
    }

    /// Render as a standalone SVG document.
    pub fn to_svg(&self) -> String {
        let label_width = self
            .row_labels
            .iter()
            .map(|l| l.chars().count().min(MAX_LABEL_CHARS))
            .max()
            .unwrap_or(0)
            * CHAR_WIDTH
            + 2 * LABEL_PADDING;
        let width = label_width + self.column_labels.len() * CELL_WIDTH;
        let height = HEADER_HEIGHT + self.row_labels.len() * CELL_HEIGHT;

        let mut lines = Vec::new();
        lines.push(format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}" font-family="sans-serif" font-size="13">"#
        ));
        lines.push(format!(r#"<rect width="{width}" height="{height}" fill="white"/>"#));

        for (c, label) in self.column_labels.iter().enumerate() {
            let x = label_width + c * CELL_WIDTH + CELL_WIDTH / 2;
            lines.push(format!(
                r#"<text x="{x}" y="{}" text-anchor="middle">{}</text>"#,
                HEADER_HEIGHT - 14,
                escape(label)
            ));
        }

        for (r, (label, row)) in self.row_labels.iter().zip(&self.values).enumerate() {
            let y = HEADER_HEIGHT + r * CELL_HEIGHT;
            lines.push(format!(
                r#"<text x="{}" y="{}" text-anchor="end" dominant-baseline="middle">{}</text>"#,
                label_width - LABEL_PADDING,
                y + CELL_HEIGHT / 2,
                escape(&shorten(label))
            ));
            for (c, value) in row.iter().enumerate() {
                let x = label_width + c * CELL_WIDTH;
                let [red, green, blue] = value.map_or([230, 230, 230], color_for);
                lines.push(format!(
                    r#"<rect x="{x}" y="{y}" width="{CELL_WIDTH}" height="{CELL_HEIGHT}" fill="rgb({red},{green},{blue})" stroke="white" stroke-width="1"/>"#
                ));
                let annotation = value.map_or_else(|| "-".to_string(), |v| format!("{v:.2}"));
                lines.push(format!(
                    r#"<text x="{}" y="{}" text-anchor="middle" dominant-baseline="middle">{annotation}</text>"#,
                    x + CELL_WIDTH / 2,
                    y + CELL_HEIGHT / 2
                ));
            }
        }

        lines.push("</svg>\n".to_string());
        lines.join("\n")
    }

    /// Rasterize the grid to a PNG with square cells of `cell_px` pixels.
    ///
    /// The PNG is the bare colour grid: no question labels, no metric
    /// headers and no score annotations. Use [`Heatmap::to_svg`] (or
    /// [`Heatmap::save`] with a `.svg` path) for a labelled, annotated chart.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError::RenderError`] for an empty grid, a zero cell
    /// size, or an encoding failure, and [`EvalError::IoError`] if the file
    /// cannot be written.
    pub fn save_png(&self, path: impl AsRef<Path>, cell_px: u32) -> Result<()> {
        let path = path.as_ref();
        let (rows, columns) = self.shape();
        if rows == 0 || columns == 0 {
            return Err(EvalError::RenderError("heatmap has no cells".to_string()));
        }
        if cell_px < 2 {
            return Err(EvalError::RenderError(format!("cell size {cell_px}px is too small")));
        }

        let width = u32::try_from(columns)
            .ok()
            .and_then(|c| c.checked_mul(cell_px))
            .ok_or_else(|| EvalError::RenderError("heatmap is too wide".to_string()))?;
        let height = u32::try_from(rows)
            .ok()
            .and_then(|r| r.checked_mul(cell_px))
            .ok_or_else(|| EvalError::RenderError("heatmap is too tall".to_string()))?;

        let mut image = RgbImage::from_pixel(width, height, GRID);
        for (r, row) in self.values.iter().enumerate() {
            for (c, value) in row.iter().enumerate() {
                let fill = Rgb(value.map_or([230, 230, 230], color_for));
                let x0 = c as u32 * cell_px;
                let y0 = r as u32 * cell_px;
                // one-pixel grid line on the right and bottom edge of each cell
                for y in y0..y0 + cell_px - 1 {
                    for x in x0..x0 + cell_px - 1 {
                        image.put_pixel(x, y, fill);
                    }
                }
            }
        }

        image.save_with_format(path, ImageFormat::Png).map_err(|e| {
            error!(path = %path.display(), error = %e, "failed to write heatmap");
            match e {
                ImageError::IoError(source) => EvalError::io(path, source),
                other => EvalError::RenderError(other.to_string()),
            }
        })?;
        info!(path = %path.display(), rows, columns, "wrote heatmap png");
        Ok(())
    }

    /// Write the heatmap, choosing the format by file extension.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError::RenderError`] for extensions other than `.svg`
    /// and `.png`.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let extension = path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("svg") => {
                std::fs::write(path, self.to_svg()).map_err(|e| EvalError::io(path, e))?;
                info!(path = %path.display(), "wrote heatmap svg");
                Ok(())
            }
            Some("png") => self.save_png(path, DEFAULT_CELL_PX),
            _ => Err(EvalError::RenderError(format!(
                "unsupported heatmap format for {} (expected .svg or .png)",
                path.display()
            ))),
        }
    }
}

/// Linear interpolation from [`LOW_COLOR`] to [`HIGH_COLOR`]; input is clamped to `[0, 1]`.
pub fn color_for(value: f32) -> [u8; 3] {
    let t = if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) };
    let mut rgb = [0u8; 3];
    for (i, channel) in rgb.iter_mut().enumerate() {
        let low = f32::from(LOW_COLOR[i]);
        let high = f32::from(HIGH_COLOR[i]);
        *channel = (low + (high - low) * t).round() as u8;
    }
    rgb
}

fn shorten(label: &str) -> String {
    if label.chars().count() <= MAX_LABEL_CHARS {
        return label.to_string();
    }
    let mut short: String = label.chars().take(MAX_LABEL_CHARS - 3).collect();
    short.push_str("...");
    short
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::Metric;
    use crate::report::ScoreRow;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn report() -> ScoreReport {
        let mut report = ScoreReport::new(Metric::ALL.to_vec());
        report.push(ScoreRow {
            question: "Is <this> & that?".into(),
            scores: Metric::ALL.iter().map(|m| (*m, 0.25)).collect::<BTreeMap<_, _>>(),
        });
        report
    }

    #[test]
    fn color_scale_endpoints() {
        assert_eq!(color_for(0.0), LOW_COLOR);
        assert_eq!(color_for(1.0), HIGH_COLOR);
        assert_eq!(color_for(-3.0), LOW_COLOR);
        assert_eq!(color_for(0.5), [125, 192, 121]);
    }

    #[test]
    fn svg_has_labels_and_annotations() {
        let svg = Heatmap::from_report(&report()).to_svg();
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("Is &lt;this&gt; &amp; that?"));
        assert!(svg.contains(">context_entity_recall</text>"));
        assert_eq!(svg.matches(">0.25</text>").count(), 6);
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn png_has_one_cell_per_score() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("scores.png");
        Heatmap::from_report(&report()).save_png(&path, 10).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
        // IHDR width and height
        assert_eq!(u32::from_be_bytes([bytes[16], bytes[17], bytes[18], bytes[19]]), 60);
        assert_eq!(u32::from_be_bytes([bytes[20], bytes[21], bytes[22], bytes[23]]), 10);
    }

    #[test]
    fn save_picks_format_by_extension() {
        let dir = TempDir::new().unwrap();
        let heatmap = Heatmap::from_report(&report());

        heatmap.save(dir.path().join("scores.svg")).unwrap();
        assert!(std::fs::read_to_string(dir.path().join("scores.svg")).unwrap().contains("<svg"));

        let err = heatmap.save(dir.path().join("scores.jpg")).unwrap_err();
        assert!(matches!(err, EvalError::RenderError(_)));
    }

    #[test]
    fn empty_report_cannot_be_rasterized() {
        let dir = TempDir::new().unwrap();
        let heatmap = Heatmap::from_report(&ScoreReport::new(Metric::ALL.to_vec()));
        assert_eq!(heatmap.shape(), (0, 6));
        assert!(matches!(
            heatmap.save_png(dir.path().join("empty.png"), 10),
            Err(EvalError::RenderError(_))
        ));
    }
}
