//! Reader and writer for `.grd`/`.gri` raster file pairs.
//!
//! A raster is stored as two sibling files sharing a base name:
//!
//! - `<name>.grd`: an INI-like text header with `[General]`, `[GeoReference]`
//!   and `[Data]` sections describing extent, resolution, sample type,
//!   byte order, no-data value and units.
//! - `<name>.gri`: the raw samples, `rows * cols` fixed-width values in
//!   row-major order (row 0 is the northern edge), no framing bytes.
//!
//! Upper-case extensions (`.GRD`/`.GRI`) are accepted on read.
//!
//! # Example
//!
//! ```ignore
//! use grd_format::RasterHandle;
//!
//! let raster = RasterHandle::open("/data/layers/rainfall")?;
//! let value = raster.point_value(147.5, -35.2)?;
//! if value.is_nan() {
//!     // no measurement at that location
//! }
//! ```

pub mod cell;
pub mod datatype;
pub mod decode;
pub mod error;
pub mod header;
pub mod raster;
pub mod writer;

pub use cell::GridGeometry;
pub use datatype::{ByteOrder, DataType};
pub use decode::{decode_samples, DEFAULT_READ_BLOCK_BYTES};
pub use error::{GrdError, Result};
pub use header::{HeaderSections, RasterHeader};
pub use raster::RasterHandle;
pub use writer::{GrdWriter, NO_DATA_SENTINEL};
