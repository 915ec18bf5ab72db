//! Common output grid for a set of layers.
//!
//! The output grid covers the union of the extents of all usable layers.
//! Its cell size is taken from the last usable layer's x resolution and used
//! for both axes; outputs produced by earlier releases depend on that choice,
//! so a disagreement between layers is only reported.

use grd_format::{GridGeometry, RasterHandle};
use serde::{Deserialize, Serialize};

use crate::error::{Result, StackError};

/// Extent and dimensions of the aligned output grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutputGeometry {
    pub width: usize,
    pub height: usize,
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
    /// Cell size on both axes.
    pub resolution: f64,
}

/// Position of an output cell. `row` counts upward from `ymin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellCoordinate {
    pub col: usize,
    pub row: usize,
}

impl CellCoordinate {
    pub fn new(col: usize, row: usize) -> Self {
        Self { col, row }
    }
}

/// Compute the output grid for the usable layers among `handles`.
///
/// Layers that are not usable are ignored. Fewer than two usable layers is
/// an error.
pub fn compute_geometry<'a, I>(handles: I) -> Result<OutputGeometry>
where
    I: IntoIterator<Item = &'a RasterHandle>,
{
    let mut found = 0usize;
    let mut xmin = f64::INFINITY;
    let mut ymin = f64::INFINITY;
    let mut xmax = f64::NEG_INFINITY;
    let mut ymax = f64::NEG_INFINITY;
    let mut resolution = f64::NAN;

    for handle in handles.into_iter().filter(|h| h.is_usable()) {
        let g = handle.geometry();
        if found > 0 && g.xres != resolution {
            tracing::warn!(
                layer = %handle.name(),
                resolution = g.xres,
                previous = resolution,
                "Layer resolutions differ, using the last layer's"
            );
        }
        xmin = xmin.min(g.xmin);
        ymin = ymin.min(g.ymin);
        xmax = xmax.max(g.xmax);
        ymax = ymax.max(g.ymax);
        resolution = g.xres;
        found += 1;
    }

    if found < 2 {
        return Err(StackError::InsufficientLayers { found });
    }

    OutputGeometry::from_extent(xmin, ymin, xmax, ymax, resolution)
}

impl OutputGeometry {
    /// Lay out a grid over an extent. Dimensions are rounded up.
    pub fn from_extent(xmin: f64, ymin: f64, xmax: f64, ymax: f64, resolution: f64) -> Result<Self> {
        if !(resolution.is_finite() && resolution > 0.0) {
            return Err(StackError::invalid_geometry(format!(
                "resolution must be positive, got {resolution}"
            )));
        }
        if !(xmax >= xmin && ymax >= ymin) {
            return Err(StackError::invalid_geometry(format!(
                "empty extent ({xmin}, {ymin}) - ({xmax}, {ymax})"
            )));
        }

        let width = ((xmax - xmin) / resolution).ceil() as usize;
        let height = ((ymax - ymin) / resolution).ceil() as usize;

        Ok(Self {
            width,
            height,
            xmin,
            ymin,
            xmax,
            ymax,
            resolution,
        })
    }

    /// Total number of cells.
    pub fn cell_count(&self) -> usize {
        self.width * self.height
    }

    /// Every cell in row-major order, starting at the south-west corner.
    pub fn cell_coordinates(&self) -> Vec<CellCoordinate> {
        let mut cells = Vec::with_capacity(self.cell_count());
        for row in 0..self.height {
            for col in 0..self.width {
                cells.push(CellCoordinate { col, row });
            }
        }
        cells
    }

    /// Centre point of a cell.
    pub fn centre(&self, cell: CellCoordinate) -> (f64, f64) {
        (
            self.xmin + (cell.col as f64 + 0.5) * self.resolution,
            self.ymin + (cell.row as f64 + 0.5) * self.resolution,
        )
    }

    /// Centre points matching [`cell_coordinates`](Self::cell_coordinates).
    pub fn cell_centres(&self) -> Vec<(f64, f64)> {
        self.cell_coordinates()
            .into_iter()
            .map(|c| self.centre(c))
            .collect()
    }

    /// Geometry of a raster covering this grid with row 0 at the north.
    ///
    /// The cell size is recomputed as `(xmax - xmin) / width` on both axes.
    pub fn to_grid_geometry(&self) -> GridGeometry {
        let res = if self.width > 0 {
            (self.xmax - self.xmin) / self.width as f64
        } else {
            self.resolution
        };
        GridGeometry {
            cols: self.width,
            rows: self.height,
            xmin: self.xmin,
            ymin: self.ymin,
            xmax: self.xmax,
            ymax: self.ymax,
            xres: res,
            yres: res,
        }
    }

    /// Flat index of a cell in a north-up raster of this grid.
    pub fn north_up_index(&self, cell: CellCoordinate) -> usize {
        cell.col + (self.height - cell.row - 1) * self.width
    }
}
