// Zone outlines traced from a labelled grid.
//
// Two neighbouring cells with different zone keys share an edge; that edge is
// a boundary segment. Segments sit on bin edges, not centers.

use crate::grid::DifferentialGrid;

/// Spacing assumed for a single-cell axis.
const FALLBACK_BIN_FT: f64 = 2.0;

/// A straight boundary piece on the floor plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundarySegment {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl BoundarySegment {
    pub fn is_vertical(&self) -> bool {
        self.x0 == self.x1
    }
}

fn median(values: &mut [f64]) -> f64 {
    values.sort_by(f64::total_cmp);
    let n = values.len();
    if n % 2 == 1 {
        values[n / 2]
    } else {
        (values[n / 2 - 1] + values[n / 2]) / 2.0
    }
}

/// Median gap between neighbouring centers; a single-cell axis assumes 2 ft.
pub fn median_spacing(centers: &[f64]) -> f64 {
    if centers.len() > 1 {
        let mut gaps: Vec<f64> = centers.windows(2).map(|w| w[1] - w[0]).collect();
        median(&mut gaps)
    } else {
        FALLBACK_BIN_FT
    }
}

/// Cell edges for a sorted axis of cell centers.
///
/// Interior edges are midpoints between neighbours; the outer two are pushed
/// out by half the median spacing.
pub fn bin_edges(centers: &[f64]) -> Vec<f64> {
    let (first, last) = match (centers.first(), centers.last()) {
        (Some(first), Some(last)) => (*first, *last),
        _ => return Vec::new(),
    };

    let half = median_spacing(centers) / 2.0;

    let mut edges = Vec::with_capacity(centers.len() + 1);
    edges.push(first - half);
    edges.extend(centers.windows(2).map(|w| (w[0] + w[1]) / 2.0));
    edges.push(last + half);
    edges
}

/// Every edge between differently-labelled neighbours.
///
/// Vertical segments come first, row by row, then horizontal segments.
pub fn extract_boundaries(grid: &DifferentialGrid) -> Vec<BoundarySegment> {
    let x_edges = bin_edges(grid.x_centers());
    let y_edges = bin_edges(grid.y_centers());
    let (rows, cols) = (grid.rows(), grid.cols());
    let cells = grid.cells();
    let key = |row: usize, col: usize| cells[row * cols + col].key;

    let mut segments = Vec::new();

    for row in 0..rows {
        for col in 1..cols {
            if key(row, col - 1) != key(row, col) {
                let x = x_edges[col];
                segments.push(BoundarySegment {
                    x0: x,
                    y0: y_edges[row],
                    x1: x,
                    y1: y_edges[row + 1],
                });
            }
        }
    }

    for row in 1..rows {
        for col in 0..cols {
            if key(row - 1, col) != key(row, col) {
                let y = y_edges[row];
                segments.push(BoundarySegment {
                    x0: x_edges[col],
                    y0: y,
                    x1: x_edges[col + 1],
                    y1: y,
                });
            }
        }
    }

    segments
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
