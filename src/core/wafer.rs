//! Wafer die grid projection
//!
//! Normalizes die coordinates into a bounded grid, assigns bin colors and
//! derives yield summaries. Edge dies are those on the bounding rectangle of
//! the tested coordinates, an approximation of the physical wafer edge.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::entities::{Die, WaferData, PASS_BIN};

/// Padding around the die grid inside the view
pub const FRAME_PADDING: u32 = 20;

/// Number of failing bins reported individually
pub const TOP_FAIL_BINS: usize = 5;

/// A display color with its nearest 256-color terminal code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BinColor {
    pub hex: &'static str,
    pub ansi: u8,
}

/// Color of the pass bin
pub const PASS_COLOR: BinColor = BinColor {
    hex: "#4de38e",
    ansi: 78,
};

/// Fail palette, cycled by sorted position among all distinct bins
pub const FAIL_PALETTE: [BinColor; 7] = [
    BinColor { hex: "#ff5d67", ansi: 203 },
    BinColor { hex: "#ff7a45", ansi: 209 },
    BinColor { hex: "#f7b955", ansi: 215 },
    BinColor { hex: "#9c82ff", ansi: 141 },
    BinColor { hex: "#5cb3ff", ansi: 75 },
    BinColor { hex: "#33d0b2", ansi: 43 },
    BinColor { hex: "#ff8db2", ansi: 211 },
];

/// Canvas sizing for the projection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridLayout {
    /// Total extent available to the larger grid dimension
    pub canvas_budget: u32,
    pub cell_min: u32,
    pub cell_max: u32,
}

impl Default for GridLayout {
    fn default() -> Self {
        Self {
            canvas_budget: 420,
            cell_min: 5,
            cell_max: 14,
        }
    }
}

impl GridLayout {
    /// Cell edge length for a grid whose larger dimension is `max_dim`
    pub fn cell_size(&self, max_dim: u64) -> u32 {
        // Never larger than the budget, so it fits back into u32
        let raw = (u64::from(self.canvas_budget) / max_dim.max(1)) as u32;
        raw.clamp(self.cell_min, self.cell_max.max(self.cell_min))
    }
}

/// Human-readable meaning of common hard bins
pub fn bin_label(bin: u32) -> &'static str {
    match bin {
        1 => "Pass / Good Die",
        2 => "Fail (Open)",
        3 => "Fail (Short)",
        4 => "Fail (Functional)",
        6 => "Fail (Parametric)",
        8 => "Edge / Ndef",
        _ => "Fail (Other)",
    }
}

/// Map each distinct bin to a color
///
/// Bins are sorted ascending and indexed by position in that list, bin 1
/// included. Bin 1 always gets [`PASS_COLOR`] but still occupies its slot, so
/// bins {1, 3} color bin 3 with `FAIL_PALETTE[1]`. Input order never matters.
pub fn assign_bin_colors<I>(bins: I) -> BTreeMap<u32, BinColor>
where
    I: IntoIterator<Item = u32>,
{
    let mut distinct: Vec<u32> = bins.into_iter().collect();
    distinct.sort_unstable();
    distinct.dedup();

    distinct
        .into_iter()
        .enumerate()
        .map(|(position, bin)| {
            let color = if bin == PASS_BIN {
                PASS_COLOR
            } else {
                FAIL_PALETTE[position % FAIL_PALETTE.len()]
            };
            (bin, color)
        })
        .collect()
}

/// Bounding rectangle of the tested coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GridBounds {
    pub min_x: i32,
    pub max_x: i32,
    pub min_y: i32,
    pub max_y: i32,
}

impl GridBounds {
    pub fn of(dies: &[Die]) -> Option<Self> {
        let first = dies.first()?;
        let mut bounds = GridBounds {
            min_x: first.x_coord,
            max_x: first.x_coord,
            min_y: first.y_coord,
            max_y: first.y_coord,
        };
        for die in &dies[1..] {
            bounds.min_x = bounds.min_x.min(die.x_coord);
            bounds.max_x = bounds.max_x.max(die.x_coord);
            bounds.min_y = bounds.min_y.min(die.y_coord);
            bounds.max_y = bounds.max_y.max(die.y_coord);
        }
        Some(bounds)
    }

    /// Columns spanned; computed in i64 so the full i32 range fits
    pub fn cols(&self) -> u64 {
        span(self.min_x, self.max_x)
    }

    pub fn rows(&self) -> u64 {
        span(self.min_y, self.max_y)
    }

    /// Zero-based (col, row) of a coordinate inside the rectangle
    pub fn offset(&self, x: i32, y: i32) -> (u64, u64) {
        (span(self.min_x, x) - 1, span(self.min_y, y) - 1)
    }

    /// Whether a coordinate lies on the rectangle's perimeter
    pub fn is_edge(&self, x: i32, y: i32) -> bool {
        x == self.min_x || x == self.max_x || y == self.min_y || y == self.max_y
    }
}

fn span(min: i32, max: i32) -> u64 {
    (i64::from(max) - i64::from(min)).unsigned_abs() + 1
}

/// One die placed on the grid
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridCell {
    pub x: i32,
    pub y: i32,
    pub col: u64,
    pub row: u64,
    pub hard_bin: u32,
    pub soft_bin: u32,
    pub color: BinColor,
    pub edge: bool,
}

impl GridCell {
    pub fn tooltip(&self) -> String {
        format!(
            "X:{} Y:{} | HBin:{} SBin:{}",
            self.x, self.y, self.hard_bin, self.soft_bin
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailBin {
    pub bin: u32,
    pub count: u64,
    pub color: BinColor,
    pub label: &'static str,
}

/// Grid geometry plus yield summary of one wafer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WaferProjection {
    pub wafer_id: String,
    pub total_dies: u64,
    pub bounds: GridBounds,
    pub cols: u64,
    pub rows: u64,
    pub cell_size: u32,
    pub view_width: u64,
    pub view_height: u64,
    /// Radius of the wafer outline drawn around the grid
    pub radius: f64,
    pub cells: Vec<GridCell>,
    pub bin_counts: BTreeMap<u32, u64>,
    pub bin_colors: BTreeMap<u32, BinColor>,
    pub pass_dies: u64,
    pub failed_dies: u64,
    pub edge_dies: u64,
    /// Percentage of `total_dies` in the pass bin
    pub yield_rate: f64,
    pub top_fail_bins: Vec<FailBin>,
    /// Dies in non-pass bins beyond the top five
    pub other_bin_total: u64,
}

impl WaferProjection {
    pub fn active_bins(&self) -> usize {
        self.bin_counts.len()
    }
}

/// Project a wafer onto a grid; `None` when there are no dies
pub fn project_wafer(wafer: &WaferData, layout: &GridLayout) -> Option<WaferProjection> {
    let bounds = GridBounds::of(&wafer.dies)?;
    let cols = bounds.cols();
    let rows = bounds.rows();
    let cell_size = layout.cell_size(cols.max(rows));

    let mut bin_counts: BTreeMap<u32, u64> = BTreeMap::new();
    for die in &wafer.dies {
        *bin_counts.entry(die.hard_bin).or_default() += 1;
    }
    let bin_colors = assign_bin_colors(bin_counts.keys().copied());

    let cells: Vec<GridCell> = wafer
        .dies
        .iter()
        .map(|die| {
            let (col, row) = bounds.offset(die.x_coord, die.y_coord);
            GridCell {
                x: die.x_coord,
                y: die.y_coord,
                col,
                row,
                hard_bin: die.hard_bin,
                soft_bin: die.soft_bin,
                color: bin_colors.get(&die.hard_bin).copied().unwrap_or(PASS_COLOR),
                edge: bounds.is_edge(die.x_coord, die.y_coord),
            }
        })
        .collect();

    let pass_dies = bin_counts.get(&PASS_BIN).copied().unwrap_or(0);
    let failed_dies = wafer.total_dies.saturating_sub(pass_dies);
    let edge_dies = cells.iter().filter(|c| c.edge).count() as u64;
    let yield_rate = if wafer.total_dies > 0 {
        pass_dies as f64 / wafer.total_dies as f64 * 100.0
    } else {
        0.0
    };

    let mut fail_bins: Vec<(u32, u64)> = bin_counts
        .iter()
        .filter(|(&bin, _)| bin != PASS_BIN)
        .map(|(&bin, &count)| (bin, count))
        .collect();
    fail_bins.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

    let top_fail_bins = fail_bins
        .iter()
        .take(TOP_FAIL_BINS)
        .map(|&(bin, count)| FailBin {
            bin,
            count,
            color: bin_colors[&bin],
            label: bin_label(bin),
        })
        .collect();
    let other_bin_total = fail_bins.iter().skip(TOP_FAIL_BINS).map(|(_, c)| c).sum();

    let map_width = cols.saturating_mul(u64::from(cell_size));
    let map_height = rows.saturating_mul(u64::from(cell_size));
    let padding = u64::from(FRAME_PADDING) * 2;

    Some(WaferProjection {
        wafer_id: wafer.wafer_id.clone(),
        total_dies: wafer.total_dies,
        bounds,
        cols,
        rows,
        cell_size,
        view_width: map_width.saturating_add(padding),
        view_height: map_height.saturating_add(padding),
        radius: map_width.min(map_height) as f64 / 2.0 + cell_size as f64 * 0.35,
        cells,
        bin_counts,
        bin_colors,
        pass_dies,
        failed_dies,
        edge_dies,
        yield_rate,
        top_fail_bins,
        other_bin_total,
    })
}
