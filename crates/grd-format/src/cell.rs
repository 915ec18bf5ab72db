//! Cell addressing for an affine, north-up grid.

use serde::{Deserialize, Serialize};

/// Affine placement of a raster: extent, resolution and dimensions.
///
/// Row 0 is the northern edge; `y` increases upward.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridGeometry {
    pub cols: usize,
    pub rows: usize,
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
    pub xres: f64,
    pub yres: f64,
}

impl GridGeometry {
    /// Total number of cells.
    pub fn len(&self) -> usize {
        self.cols * self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.cols == 0 || self.rows == 0
    }

    /// Check if a point lies inside the extent (edges included).
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.xmin && x <= self.xmax && y >= self.ymin && y <= self.ymax
    }

    /// Flat row-major index of the cell containing `(x, y)`.
    ///
    /// Returns `None` when the point is outside the extent. Column and row
    /// are computed first and then clamped into the grid, so a point on the
    /// eastern or northern edge maps to the last column or the first row.
    pub fn cell_index(&self, x: f64, y: f64) -> Option<usize> {
        if !self.contains(x, y) || self.is_empty() {
            return None;
        }

        let col = ((x - self.xmin) / self.xres).floor() as i64;
        let row = self.rows as i64 - 1 - ((y - self.ymin) / self.yres).floor() as i64;

        let col = col.clamp(0, self.cols as i64 - 1) as usize;
        let row = row.clamp(0, self.rows as i64 - 1) as usize;

        Some(row * self.cols + col)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geometry_3x3() -> GridGeometry {
        GridGeometry {
            cols: 3,
            rows: 3,
            xmin: 0.0,
            ymin: 0.0,
            xmax: 3.0,
            ymax: 3.0,
            xres: 1.0,
            yres: 1.0,
        }
    }

    #[test]
    fn test_row_zero_is_north() {
        let g = geometry_3x3();
        // south-west cell is the first cell of the last row
        assert_eq!(g.cell_index(0.5, 0.5), Some(6));
        // north-west cell is index 0
        assert_eq!(g.cell_index(0.5, 2.5), Some(0));
        assert_eq!(g.cell_index(2.5, 2.5), Some(2));
        assert_eq!(g.cell_index(1.5, 1.5), Some(4));
    }

    #[test]
    fn test_edges_are_clamped() {
        let g = geometry_3x3();
        // max edges compute one past the grid and clamp back
        assert_eq!(g.cell_index(3.0, 3.0), Some(2));
        assert_eq!(g.cell_index(3.0, 0.0), Some(8));
        assert_eq!(g.cell_index(0.0, 0.0), Some(6));
    }

    #[test]
    fn test_outside_extent_is_none() {
        let g = geometry_3x3();
        assert_eq!(g.cell_index(-0.01, 1.0), None);
        assert_eq!(g.cell_index(1.0, 3.01), None);
        assert_eq!(g.cell_index(f64::NAN, 1.0), None);
    }

    #[test]
    fn test_every_inside_point_is_in_range() {
        let g = GridGeometry {
            cols: 7,
            rows: 5,
            xmin: 110.0,
            ymin: -44.0,
            xmax: 113.5,
            ymax: -41.5,
            xres: 0.5,
            yres: 0.5,
        };
        let mut x = g.xmin;
        while x <= g.xmax {
            let mut y = g.ymin;
            while y <= g.ymax {
                let idx = g.cell_index(x, y).expect("point inside extent");
                assert!(idx < g.len());
                y += 0.1;
            }
            x += 0.1;
        }
    }

    #[test]
    fn test_zero_resolution_does_not_panic() {
        let mut g = geometry_3x3();
        g.xres = 0.0;
        let idx = g.cell_index(1.0, 1.0).unwrap();
        assert!(idx < g.len());
    }
}
