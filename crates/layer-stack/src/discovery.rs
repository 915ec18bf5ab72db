//! Finding candidate layers in an input directory.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use grd_format::{GrdError, RasterHandle, DEFAULT_READ_BLOCK_BYTES};
use walkdir::WalkDir;

use crate::error::{Result, StackError};
use crate::log::AnalysisLog;

/// Layers found in a directory, split by whether they can take part in
/// classification.
#[derive(Debug, Default)]
pub struct LayerCatalog {
    /// Layers whose declared range is positive, sorted by name.
    pub usable: Vec<RasterHandle>,
    /// Layers with no variation (`min >= max`); kept as metadata only.
    pub invariant: Vec<RasterHandle>,
}

impl LayerCatalog {
    pub fn usable_names(&self) -> Vec<String> {
        self.usable.iter().map(RasterHandle::name).collect()
    }

    pub fn invariant_names(&self) -> Vec<String> {
        self.invariant.iter().map(RasterHandle::name).collect()
    }
}

/// Scan `dir` (not recursively) for raster pairs.
pub fn discover_layers(dir: impl AsRef<Path>, log: &dyn AnalysisLog) -> Result<LayerCatalog> {
    discover_layers_with(dir, DEFAULT_READ_BLOCK_BYTES, log)
}

/// Scan `dir` for raster pairs, decoding them later with `read_block_bytes`
/// sized reads.
///
/// Pairs that are incomplete or unreadable are skipped, as are layers whose
/// sample type is unknown; both are reported through `log`.
pub fn discover_layers_with(
    dir: impl AsRef<Path>,
    read_block_bytes: usize,
    log: &dyn AnalysisLog,
) -> Result<LayerCatalog> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Err(StackError::io(
            dir,
            std::io::Error::new(std::io::ErrorKind::NotFound, "input directory not found"),
        ));
    }

    let mut bases = BTreeSet::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log.err(&format!("Cannot read directory entry: {e}"));
                continue;
            }
        };
        if let Some(base) = header_base(entry.path()) {
            bases.insert(base);
        }
    }

    let mut catalog = LayerCatalog::default();
    for base in bases {
        let handle = match RasterHandle::open(&base) {
            Ok(handle) => handle.with_read_block_bytes(read_block_bytes),
            Err(e) => {
                log.err(&format!("Skipping layer: {e}"));
                continue;
            }
        };

        if !handle.header().data_type.is_known() {
            let e = GrdError::UnknownDataType(handle.header().data_type.header_name().to_string());
            log.err(&format!("Skipping layer {}: {e}", handle.name()));
            continue;
        }

        if handle.header().has_positive_range() {
            tracing::debug!(layer = %handle.name(), "Found layer");
            catalog.usable.push(handle);
        } else {
            log.log(&format!(
                "{} is excluded from classification because it has no variation for the selected area",
                handle.name()
            ));
            catalog.invariant.push(handle);
        }
    }

    tracing::info!(
        dir = %dir.display(),
        usable = catalog.usable.len(),
        invariant = catalog.invariant.len(),
        "Discovered layers"
    );

    Ok(catalog)
}

/// Base path of a `.grd`/`.GRD` header file.
fn header_base(path: &Path) -> Option<PathBuf> {
    let ext = path.extension()?.to_str()?;
    if ext == "grd" || ext == "GRD" {
        Some(path.with_extension(""))
    } else {
        None
    }
}
