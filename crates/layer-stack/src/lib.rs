//! Alignment, normalization and partitioning of co-registered raster layers.
//!
//! Turns a directory of `.grd`/`.gri` layers into equal-width feature
//! vectors, split into chunks that classifier threads can read without
//! sharing any mutable state.
//!
//! # Architecture
//!
//! ```text
//! discover_layers(dir)
//!      │
//!      ▼
//! LayerCatalog { usable, invariant }
//!      │
//!      ▼
//! Dataset::build(usable, pieces)
//!      │
//!      ├─► compute_geometry: union extent, last layer's resolution
//!      │
//!      ├─► chunk_ranges over the output cells
//!      │
//!      ├─► per layer: decode, sample_and_normalize at cell centres,
//!      │   write into the chunks, release
//!      │
//!      └─► drop cells with missing values
//!               │
//!               ▼
//!          run_classification(dataset, Classifier, Colourer, Exporters)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use layer_stack::{discover_layers, Dataset, StackConfig, TracingLog};
//!
//! let log = TracingLog;
//! let config = StackConfig::from_env();
//! let catalog = discover_layers("/data/layers", &log)?;
//! let dataset = Dataset::build(&catalog.usable, config.pieces(), &log)?;
//!
//! for chunk in dataset.chunks() {
//!     // hand to a worker
//! }
//! ```

pub mod aligner;
pub mod collaborators;
pub mod config;
pub mod dataset;
pub mod discovery;
pub mod error;
pub mod groups;
pub mod log;
pub mod normalize;

// Re-export commonly used types at crate root
pub use aligner::{compute_geometry, CellCoordinate, OutputGeometry};
pub use collaborators::{
    run_classification, Classification, ClassificationOutput, ClassificationResult, Classifier,
    ClassifyRequest, Colourer, Exporter, GroupGridExporter, Rgb,
};
pub use config::StackConfig;
pub use dataset::{chunk_ranges, write_extents, Dataset, FeatureChunk, LayerStats, EXTENTS_FILE_NAME};
pub use discovery::{discover_layers, discover_layers_with, LayerCatalog};
pub use error::{Result, StackError};
pub use groups::{denormalize_means, group_count, group_grid, group_means, group_range, write_group_grid};
pub use log::{AnalysisLog, FileLog, MemoryLog, TracingLog, LOG_FILE_NAME};
pub use normalize::{normalize_in_place, sample_and_normalize, LayerExtent, NormalizedLayer};
