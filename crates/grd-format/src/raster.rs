//! Opened raster pairs with a lazily decoded, cached grid.

use std::ffi::OsString;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::cell::GridGeometry;
use crate::decode::{decode_samples, DEFAULT_READ_BLOCK_BYTES};
use crate::error::{GrdError, Result};
use crate::header::RasterHeader;

/// A `.grd`/`.gri` pair on disk.
///
/// The header is parsed on open. [`RasterHandle::grid`] and
/// [`RasterHandle::point_value`] decode the payload on first use and keep it
/// for the lifetime of the handle. [`RasterHandle::values_at`] samples a
/// batch of points from a transient decode unless the grid is already cached.
#[derive(Debug)]
pub struct RasterHandle {
    base: PathBuf,
    header_path: PathBuf,
    data_path: PathBuf,
    header: RasterHeader,
    read_block_bytes: usize,
    grid: OnceLock<Vec<f32>>,
}

impl RasterHandle {
    /// Open the pair at `base` (path without extension).
    ///
    /// Lower-case extensions are tried before upper-case ones.
    pub fn open(base: impl AsRef<Path>) -> Result<Self> {
        let base = base.as_ref();

        let header_path =
            find_sibling(base, "grd", "GRD").ok_or_else(|| GrdError::missing(base, "header"))?;
        let data_path =
            find_sibling(base, "gri", "GRI").ok_or_else(|| GrdError::missing(base, "data"))?;

        let header = RasterHeader::read(&header_path)?;

        tracing::debug!(
            path = %base.display(),
            cols = header.geometry.cols,
            rows = header.geometry.rows,
            data_type = header.data_type.header_name(),
            "Opened grid"
        );

        Ok(Self {
            base: base.to_path_buf(),
            header_path,
            data_path,
            header,
            read_block_bytes: DEFAULT_READ_BLOCK_BYTES,
            grid: OnceLock::new(),
        })
    }

    /// Open the pair at `base`, or `None` when it is absent or unreadable.
    pub fn try_open(base: impl AsRef<Path>) -> Option<Self> {
        match Self::open(base.as_ref()) {
            Ok(handle) => Some(handle),
            Err(GrdError::MissingFilePair { missing, .. }) => {
                tracing::debug!(path = %base.as_ref().display(), missing, "No grid here");
                None
            }
            Err(e) => {
                tracing::warn!(path = %base.as_ref().display(), error = %e, "Cannot open grid");
                None
            }
        }
    }

    /// Set the size of individual payload reads.
    pub fn with_read_block_bytes(mut self, bytes: usize) -> Self {
        self.read_block_bytes = bytes.max(1);
        self
    }

    /// File stem of the pair, used as the layer name.
    pub fn name(&self) -> String {
        self.base
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn base_path(&self) -> &Path {
        &self.base
    }

    pub fn header_path(&self) -> &Path {
        &self.header_path
    }

    pub fn data_path(&self) -> &Path {
        &self.data_path
    }

    pub fn header(&self) -> &RasterHeader {
        &self.header
    }

    pub fn geometry(&self) -> &GridGeometry {
        &self.header.geometry
    }

    /// Declared range is positive and the sample type is readable.
    pub fn is_usable(&self) -> bool {
        self.header.has_positive_range() && self.header.data_type.is_known()
    }

    /// Decode the payload from disk, bypassing the cache.
    pub fn decode(&self) -> Result<Vec<f32>> {
        let file = File::open(&self.data_path).map_err(|e| GrdError::io(&self.data_path, e))?;
        decode_samples(file, &self.header, self.read_block_bytes)
            .map_err(|e| GrdError::io(&self.data_path, e))
    }

    /// The decoded grid, decoding it on first call.
    pub fn grid(&self) -> Result<&[f32]> {
        if let Some(grid) = self.grid.get() {
            return Ok(grid.as_slice());
        }
        let decoded = self.decode()?;
        Ok(self.grid.get_or_init(|| decoded).as_slice())
    }

    /// Whether the decoded grid is held by this handle.
    pub fn is_cached(&self) -> bool {
        self.grid.get().is_some()
    }

    /// Value of the cell containing `(x, y)`; NaN outside the grid.
    pub fn point_value(&self, x: f64, y: f64) -> Result<f32> {
        let grid = self.grid()?;
        Ok(sample(grid, self.geometry(), x, y))
    }

    /// Values at each of `points`, NaN for points outside the grid.
    ///
    /// An uncached payload is decoded for this call only and released before
    /// returning.
    pub fn values_at(&self, points: &[(f64, f64)]) -> Result<Vec<f32>> {
        let geometry = self.geometry();
        let collect = |grid: &[f32]| -> Vec<f32> {
            points.iter().map(|&(x, y)| sample(grid, geometry, x, y)).collect()
        };

        match self.grid.get() {
            Some(grid) => Ok(collect(grid)),
            None => {
                let grid = self.decode()?;
                Ok(collect(&grid))
            }
        }
    }
}

fn sample(grid: &[f32], geometry: &GridGeometry, x: f64, y: f64) -> f32 {
    geometry
        .cell_index(x, y)
        .and_then(|i| grid.get(i).copied())
        .unwrap_or(f32::NAN)
}

/// `<base>.<lower>` if it exists, else `<base>.<upper>` if it exists.
fn find_sibling(base: &Path, lower: &str, upper: &str) -> Option<PathBuf> {
    [lower, upper]
        .into_iter()
        .map(|ext| with_suffix(base, ext))
        .find(|p| p.is_file())
}

/// Append an extension without replacing anything after a dot in the name.
pub(crate) fn with_suffix(base: &Path, ext: &str) -> PathBuf {
    let mut s = OsString::from(base.as_os_str());
    s.push(".");
    s.push(ext);
    PathBuf::from(s)
}
