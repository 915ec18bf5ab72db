//! Assembling the feature matrix handed to the classifier.
//!
//! Building a [`Dataset`] runs these stages in order:
//!
//! 1. lay out the output grid over the usable layers' header extents
//! 2. split the cells into contiguous chunks
//! 3. decode one layer at a time, sample and normalize it at the cell
//!    centres and write it into the chunks; layers that fail are dropped
//! 4. drop cells missing a value in any layer, compacting chunks and cell
//!    coordinates in step, then drop empty chunks
//!
//! At most one decoded layer is held at a time.
//!
//! The result is immutable. Concatenating the chunks in order gives exactly
//! one feature vector per entry of [`Dataset::cell_coordinates`].

use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};

use grd_format::RasterHandle;
use serde::{Deserialize, Serialize};

use crate::aligner::{compute_geometry, CellCoordinate, OutputGeometry};
use crate::error::{Result, StackError};
use crate::log::AnalysisLog;
use crate::normalize::{sample_and_normalize, LayerExtent, NormalizedLayer};

/// File name of the extents side file.
pub const EXTENTS_FILE_NAME: &str = "extents.txt";

/// A contiguous run of cells, `layers` normalized values per cell.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureChunk {
    values: Vec<f32>,
    layers: usize,
}

impl FeatureChunk {
    pub fn new(values: Vec<f32>, layers: usize) -> Self {
        Self { values, layers }
    }

    /// Number of cells in the chunk.
    pub fn cells(&self) -> usize {
        if self.layers == 0 {
            0
        } else {
            self.values.len() / self.layers
        }
    }

    pub fn layers(&self) -> usize {
        self.layers
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Flat values, cell-major.
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Feature vector of the `i`th cell.
    pub fn cell(&self, i: usize) -> &[f32] {
        &self.values[i * self.layers..(i + 1) * self.layers]
    }

    /// Feature vectors in order.
    pub fn iter_cells(&self) -> impl Iterator<Item = &[f32]> {
        self.values.chunks_exact(self.layers.max(1))
    }

    fn has_missing(&self, i: usize) -> bool {
        self.cell(i).iter().any(|v| v.is_nan())
    }
}

/// Name and sampled range of one input layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerStats {
    pub name: String,
    pub extent: LayerExtent,
}

/// Equal-width feature vectors for every cell with a value in all layers.
#[derive(Debug, Clone)]
pub struct Dataset {
    chunks: Vec<FeatureChunk>,
    coordinates: Vec<CellCoordinate>,
    geometry: OutputGeometry,
    layers: Vec<LayerStats>,
}

impl Dataset {
    /// Build a dataset from `handles`, split into `pieces` chunks.
    ///
    /// Layers that are not usable are ignored. The output grid covers the
    /// header extents of the usable layers. Layers are then decoded one at a
    /// time: each is sampled, normalized and written into the chunks, and
    /// its decoded payload is released before the next is read. A layer whose
    /// payload cannot be read is reported through `log` and left out. Fewer
    /// than two remaining layers is [`StackError::InsufficientLayers`].
    pub fn build(handles: &[RasterHandle], pieces: usize, log: &dyn AnalysisLog) -> Result<Self> {
        let usable: Vec<&RasterHandle> = handles.iter().filter(|h| h.is_usable()).collect();

        let geometry = compute_geometry(usable.iter().copied())?;
        log.log(&format!(
            "Output grid {} x {} cells at resolution {} over ({}, {}) - ({}, {})",
            geometry.width,
            geometry.height,
            geometry.resolution,
            geometry.xmin,
            geometry.ymin,
            geometry.xmax,
            geometry.ymax
        ));

        let ranges = chunk_ranges(geometry.cell_count(), pieces);
        let mut chunks = allocate(&ranges, usable.len());
        let mut stats = Vec::with_capacity(usable.len());

        let points = geometry.cell_centres();
        for handle in &usable {
            match sample_and_normalize(handle, &points) {
                Ok(layer) => {
                    fill_column(&mut chunks, &ranges, stats.len(), &layer.values);
                    stats.push(LayerStats {
                        name: layer.name,
                        extent: layer.extent,
                    });
                }
                Err(e) => log.err(&format!("Cannot read layer {}: {e}", handle.name())),
            }
        }
        drop(points);

        if stats.len() < 2 {
            return Err(StackError::InsufficientLayers { found: stats.len() });
        }
        if stats.len() < usable.len() {
            narrow(&mut chunks, stats.len());
        }

        Ok(Self::finish(geometry, chunks, &ranges, stats))
    }

    /// Chunk, fill and compact already sampled layers.
    ///
    /// Every layer must hold one value per output cell.
    pub fn assemble(geometry: OutputGeometry, layers: Vec<NormalizedLayer>, pieces: usize) -> Result<Self> {
        let total = geometry.cell_count();
        if let Some(layer) = layers.iter().find(|l| l.values.len() != total) {
            return Err(StackError::invalid_geometry(format!(
                "layer {} has {} values for {total} cells",
                layer.name,
                layer.values.len()
            )));
        }

        let ranges = chunk_ranges(total, pieces);
        let mut chunks = allocate(&ranges, layers.len());
        for (j, layer) in layers.iter().enumerate() {
            fill_column(&mut chunks, &ranges, j, &layer.values);
        }

        let stats = layers
            .into_iter()
            .map(|l| LayerStats {
                name: l.name,
                extent: l.extent,
            })
            .collect();
        Ok(Self::finish(geometry, chunks, &ranges, stats))
    }

    fn finish(
        geometry: OutputGeometry,
        mut chunks: Vec<FeatureChunk>,
        ranges: &[Range<usize>],
        layers: Vec<LayerStats>,
    ) -> Self {
        let mut coordinates = geometry.cell_coordinates();
        let retained = compact(&mut chunks, &mut coordinates, ranges);

        tracing::info!(
            cells = geometry.cell_count(),
            retained,
            chunks = chunks.len(),
            layers = layers.len(),
            "Assembled dataset"
        );

        Self {
            chunks,
            coordinates,
            geometry,
            layers,
        }
    }

    pub fn chunks(&self) -> &[FeatureChunk] {
        &self.chunks
    }

    /// Coordinates of the retained cells, in chunk order.
    pub fn cell_coordinates(&self) -> &[CellCoordinate] {
        &self.coordinates
    }

    pub fn geometry(&self) -> &OutputGeometry {
        &self.geometry
    }

    pub fn layer_stats(&self) -> &[LayerStats] {
        &self.layers
    }

    pub fn layer_names(&self) -> Vec<String> {
        self.layers.iter().map(|l| l.name.clone()).collect()
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Number of retained cells.
    pub fn cell_count(&self) -> usize {
        self.coordinates.len()
    }

    /// Feature vectors of all retained cells, in order.
    pub fn features(&self) -> impl Iterator<Item = &[f32]> {
        self.chunks.iter().flat_map(|c| c.iter_cells())
    }

    /// Write the extents side file into `dir`.
    pub fn write_extents(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let path = dir.as_ref().join(EXTENTS_FILE_NAME);
        write_extents(&path, &self.geometry)?;
        Ok(path)
    }
}

/// Contiguous cell ranges for `pieces` chunks; the last absorbs the
/// remainder. `pieces == 0` is treated as 1.
pub fn chunk_ranges(total: usize, pieces: usize) -> Vec<Range<usize>> {
    let pieces = pieces.max(1);
    let step = total / pieces;
    (0..pieces)
        .map(|i| {
            let start = i * step;
            let end = if i + 1 == pieces { total } else { start + step };
            start..end
        })
        .collect()
}

/// Zeroed chunks over `ranges` with room for `width` values per cell.
fn allocate(ranges: &[Range<usize>], width: usize) -> Vec<FeatureChunk> {
    ranges
        .iter()
        .map(|r| FeatureChunk::new(vec![0.0; r.len() * width], width))
        .collect()
}

/// Write one value per output cell into column `column` of every chunk.
fn fill_column(chunks: &mut [FeatureChunk], ranges: &[Range<usize>], column: usize, values: &[f32]) {
    for (chunk, range) in chunks.iter_mut().zip(ranges) {
        let width = chunk.layers;
        for (local, &v) in values[range.clone()].iter().enumerate() {
            chunk.values[local * width + column] = v;
        }
    }
}

/// Keep the first `width` columns of every chunk.
fn narrow(chunks: &mut [FeatureChunk], width: usize) {
    for chunk in chunks {
        let old = chunk.layers;
        let cells = chunk.cells();
        for i in 0..cells {
            chunk.values.copy_within(i * old..i * old + width, i * width);
        }
        chunk.values.truncate(cells * width);
        chunk.layers = width;
    }
}

/// Drop cells with a missing value. Feature vectors move forward within
/// their chunk, coordinates move forward under one cursor spanning all
/// chunks. Returns the number of retained cells.
fn compact(
    chunks: &mut Vec<FeatureChunk>,
    coordinates: &mut Vec<CellCoordinate>,
    ranges: &[Range<usize>],
) -> usize {
    let mut cursor = 0usize;

    for (chunk, range) in chunks.iter_mut().zip(ranges) {
        let width = chunk.layers;
        let mut kept = 0usize;
        for (local, cell) in range.clone().enumerate() {
            if chunk.has_missing(local) {
                continue;
            }
            if kept != local {
                chunk
                    .values
                    .copy_within(local * width..(local + 1) * width, kept * width);
            }
            coordinates[cursor] = coordinates[cell];
            cursor += 1;
            kept += 1;
        }
        chunk.values.truncate(kept * width);
    }

    coordinates.truncate(cursor);
    chunks.retain(|c| !c.is_empty());
    cursor
}

/// Write `width`, `height`, `xmin`, `ymin`, `xmax`, `ymax`, one per line
/// with no trailing newline.
///
/// Coordinates use the notation legacy readers of this file expect: plain
/// decimals for magnitudes in `[1e-3, 1e7)`, otherwise `d.dddE±n`.
pub fn write_extents(path: impl AsRef<Path>, geometry: &OutputGeometry) -> Result<()> {
    let path = path.as_ref();
    let text = [
        geometry.width.to_string(),
        geometry.height.to_string(),
        format_coordinate(geometry.xmin),
        format_coordinate(geometry.ymin),
        format_coordinate(geometry.xmax),
        format_coordinate(geometry.ymax),
    ]
    .join("\n");
    fs::write(path, text).map_err(|e| StackError::io(path, e))
}

fn format_coordinate(v: f64) -> String {
    if v.is_nan() {
        return "NaN".to_string();
    }
    if v.is_infinite() {
        return if v > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }

    let abs = v.abs();
    if abs == 0.0 || (1e-3..1e7).contains(&abs) {
        // shortest round-trip digits, always with a fractional part
        let s = format!("{v:?}");
        if s.contains('.') {
            return s;
        }
        return format!("{s}.0");
    }

    let s = format!("{v:e}");
    match s.split_once('e') {
        Some((mantissa, exp)) if mantissa.contains('.') => format!("{mantissa}E{exp}"),
        Some((mantissa, exp)) => format!("{mantissa}.0E{exp}"),
        None => s,
    }
}
