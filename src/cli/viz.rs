//! Terminal rendering of histograms and wafer maps
//!
//! Both renderers return plain strings so callers can print or snapshot them.
//! Color is applied with `console` styles and disappears when the terminal
//! does not support it.

use console::Style;

use crate::cli::helpers::format_opt;
use crate::core::histogram::Histogram;
use crate::core::wafer::{bin_label, WaferProjection};

/// Widest bar drawn for the fullest bucket
pub const BAR_MAX_WIDTH: usize = 50;

/// Largest wafer grid side, in dies, drawn as characters
pub const MAX_GRID_SIDE: u64 = 256;

/// Render a histogram as horizontal bars
///
/// With `show_limits`, buckets whose center is outside the limits are drawn
/// hollow, the buckets holding a limit are marked, and the axis range widens
/// to enclose the limits.
///
/// ```text
///       0.9500 │████████████ 12
///       1.0500 │██████████████████████████ 26 ◄LSL
/// ```
pub fn render_histogram(hist: &Histogram, lo: Option<f64>, hi: Option<f64>, show_limits: bool) -> String {
    let mut lines = Vec::new();
    let peak = hist.peak().max(1);
    let (lo, hi) = if show_limits { (lo, hi) } else { (None, None) };

    let bucket_of = |limit: f64| -> Option<usize> {
        if limit < hist.min_val || limit > hist.max_val {
            return None;
        }
        let index = ((limit - hist.min_val) / hist.bucket_width).floor() as usize;
        Some(index.min(hist.bins.len().saturating_sub(1)))
    };
    let lo_bucket = lo.and_then(bucket_of);
    let hi_bucket = hi.and_then(bucket_of);

    // Limits outside the data get their own row before or after the bars
    let mut before = Vec::new();
    let mut after = Vec::new();
    for (label, limit) in [("LSL", lo), ("USL", hi)] {
        let Some(limit) = limit else { continue };
        let row = format!("{:>12.4} ┊ ◄{}", limit, label);
        if limit < hist.min_val {
            before.push(row);
        } else if limit > hist.max_val {
            after.push(row);
        }
    }

    if show_limits {
        let (low, high) = hist.domain(lo, hi);
        lines.push(format!(
            "  range {} .. {}   LSL {}   USL {}",
            format_opt(Some(low), 4),
            format_opt(Some(high), 4),
            format_opt(lo, 4),
            format_opt(hi, 4)
        ));
    }
    lines.extend(before);

    let pass = Style::new().green();
    let fail = Style::new().red().dim();

    for (i, bin) in hist.bins.iter().enumerate() {
        let width = (bin.count as f64 / peak as f64 * BAR_MAX_WIDTH as f64).round() as usize;
        let in_spec = crate::entities::within_limits(bin.center, lo, hi);
        let bar = if in_spec {
            pass.apply_to("█".repeat(width)).to_string()
        } else {
            fail.apply_to("░".repeat(width)).to_string()
        };

        let marker = match (lo_bucket == Some(i), hi_bucket == Some(i)) {
            (true, true) => " ◄LSL/USL",
            (true, false) => " ◄LSL",
            (false, true) => " ◄USL",
            (false, false) => "",
        };

        lines.push(format!(
            "{:>12.4} │{} {}{}",
            hist.bucket_start(i),
            bar,
            bin.count,
            marker
        ));
    }

    lines.extend(after);
    lines.join("\n")
}

/// Render a wafer projection as a character grid with a bin legend
///
/// Each die takes two columns; edge dies use a lighter shade. Rows are drawn
/// from the highest Y coordinate down. Grids wider or taller than
/// [`MAX_GRID_SIDE`] are not drawn; only the legend is.
pub fn render_wafer(projection: &WaferProjection) -> String {
    let mut lines = Vec::new();
    if projection.cols > MAX_GRID_SIDE || projection.rows > MAX_GRID_SIDE {
        lines.push(format!(
            "  {} x {} grid is too large to draw (limit {} per side)",
            projection.cols, projection.rows, MAX_GRID_SIDE
        ));
    } else {
        draw_grid(projection, &mut lines);
    }

    lines.push(String::new());
    for (bin, count) in &projection.bin_counts {
        let color = projection.bin_colors.get(bin).map(|c| c.ansi).unwrap_or(7);
        lines.push(format!(
            "  {} HBin {:<4} {:>7}  {}",
            Style::new().color256(color).apply_to("██"),
            bin,
            count,
            bin_label(*bin)
        ));
    }

    lines.join("\n")
}

fn draw_grid(projection: &WaferProjection, lines: &mut Vec<String>) {
    let cols = projection.cols as usize;
    let rows = projection.rows as usize;
    let mut grid: Vec<Vec<Option<usize>>> = vec![vec![None; cols]; rows];
    for (i, cell) in projection.cells.iter().enumerate() {
        grid[cell.row as usize][cell.col as usize] = Some(i);
    }

    let border = "─".repeat(cols * 2);
    lines.push(format!("┌{}┐", border));
    for row in grid.iter().rev() {
        let mut line = String::from("│");
        for slot in row {
            match slot {
                Some(i) => {
                    let cell = &projection.cells[*i];
                    let glyph = if cell.edge { "▓▓" } else { "██" };
                    line.push_str(&Style::new().color256(cell.color.ansi).apply_to(glyph).to_string());
                }
                None => line.push_str("  "),
            }
        }
        line.push('│');
        lines.push(line);
    }
    lines.push(format!("└{}┘", border));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::histogram::build_histogram;
    use crate::core::wafer::{project_wafer, GridLayout};
    use crate::entities::{Die, WaferData};

    fn plain(s: &str) -> String {
        console::strip_ansi_codes(s).into_owned()
    }

    #[test]
    fn test_histogram_rows_and_markers() {
        let values: Vec<Option<f64>> = [0.0, 1.0, 2.0, 3.0].iter().copied().map(Some).collect();
        let hist = build_histogram(values).unwrap();
        let out = plain(&render_histogram(&hist, Some(0.5), Some(2.0), true));
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("LSL 0.5000"));
        assert!(lines[1].ends_with("2 ◄LSL"));
        assert!(lines[2].ends_with("2 ◄USL"));
    }

    #[test]
    fn test_histogram_without_limits() {
        let values: Vec<Option<f64>> = [1.0, 1.0, 1.0].iter().copied().map(Some).collect();
        let hist = build_histogram(values).unwrap();
        let out = plain(&render_histogram(&hist, Some(0.0), Some(5.0), false));
        assert_eq!(out.lines().count(), 1);
        assert!(!out.contains('◄'));
        assert!(out.contains(&"█".repeat(BAR_MAX_WIDTH)));
    }

    #[test]
    fn test_histogram_limit_outside_data() {
        let values: Vec<Option<f64>> = [1.0, 2.0].iter().copied().map(Some).collect();
        let hist = build_histogram(values).unwrap();
        let out = plain(&render_histogram(&hist, Some(-4.0), Some(9.0), true));
        assert!(out.contains("-4.0000 ┊ ◄LSL"));
        assert!(out.contains("9.0000 ┊ ◄USL"));
        assert!(out.contains("range -4.0000 .. 9.0000"));
    }

    #[test]
    fn test_wafer_grid_shape() {
        let dies = vec![
            Die { x_coord: 0, y_coord: 0, hard_bin: 1, soft_bin: 1, site_num: 1 },
            Die { x_coord: 2, y_coord: 1, hard_bin: 5, soft_bin: 5, site_num: 1 },
        ];
        let wafer = WaferData {
            wafer_id: "W1".to_string(),
            total_dies: 2,
            dies,
        };
        let projection = project_wafer(&wafer, &GridLayout::default()).unwrap();
        let out = plain(&render_wafer(&projection));
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "┌──────┐");
        // y = 1 is drawn first
        assert_eq!(lines[1], "│    ▓▓│");
        assert_eq!(lines[2], "│▓▓    │");
        assert_eq!(lines[3], "└──────┘");
        assert!(out.contains("HBin 1"));
        assert!(out.contains("HBin 5"));
    }

    #[test]
    fn test_oversized_wafer_draws_legend_only() {
        let dies = vec![
            Die { x_coord: i32::MIN, y_coord: 0, hard_bin: 1, soft_bin: 1, site_num: 1 },
            Die { x_coord: i32::MAX, y_coord: 3, hard_bin: 2, soft_bin: 2, site_num: 1 },
        ];
        let wafer = WaferData {
            wafer_id: "W2".to_string(),
            total_dies: 2,
            dies,
        };
        let projection = project_wafer(&wafer, &GridLayout::default()).unwrap();
        let out = plain(&render_wafer(&projection));
        assert!(out.starts_with("  4294967296 x 4 grid is too large to draw"));
        assert!(!out.contains('┌'));
        assert!(out.contains("HBin 2"));
    }
}
