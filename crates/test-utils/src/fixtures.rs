//! On-disk raster pair fixtures.
//!
//! Fixtures encode headers and payloads by hand rather than through the
//! codec under test, so a bug in the writer cannot hide a bug in the reader.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Create a scratch directory that is removed on drop.
pub fn scratch_dir() -> TempDir {
    tempfile::tempdir().expect("failed to create scratch directory")
}

/// Builder for a `.grd`/`.gri` pair.
///
/// Defaults to a unit-resolution grid covering `0..cols` by `0..rows`,
/// `FLT4BYTES` little-endian samples and a no-data value of `-9999`.
/// A resolution of exactly 1 is reinterpreted by readers from the extent
/// over crossed axes, so keep unit-resolution fixtures square.
#[derive(Debug, Clone)]
pub struct RasterFixture {
    pub name: String,
    pub cols: usize,
    pub rows: usize,
    pub xmin: f64,
    pub ymin: f64,
    pub xres: f64,
    pub yres: f64,
    pub data_type: String,
    pub big_endian: bool,
    pub no_data: Option<f64>,
    pub units: Option<String>,
    pub value_range: Option<(f64, f64)>,
}

impl RasterFixture {
    pub fn new(name: &str, cols: usize, rows: usize) -> Self {
        Self {
            name: name.to_string(),
            cols,
            rows,
            xmin: 0.0,
            ymin: 0.0,
            xres: 1.0,
            yres: 1.0,
            data_type: "FLT4BYTES".to_string(),
            big_endian: false,
            no_data: Some(-9999.0),
            units: None,
            value_range: None,
        }
    }

    /// Place the south-west corner at `(xmin, ymin)`.
    pub fn origin(mut self, xmin: f64, ymin: f64) -> Self {
        self.xmin = xmin;
        self.ymin = ymin;
        self
    }

    pub fn resolution(mut self, xres: f64, yres: f64) -> Self {
        self.xres = xres;
        self.yres = yres;
        self
    }

    pub fn data_type(mut self, data_type: &str) -> Self {
        self.data_type = data_type.to_string();
        self
    }

    pub fn big_endian(mut self) -> Self {
        self.big_endian = true;
        self
    }

    pub fn no_data(mut self, no_data: Option<f64>) -> Self {
        self.no_data = no_data;
        self
    }

    pub fn units(mut self, units: &str) -> Self {
        self.units = Some(units.to_string());
        self
    }

    /// Override the declared `MinValue`/`MaxValue`.
    pub fn value_range(mut self, min: f64, max: f64) -> Self {
        self.value_range = Some((min, max));
        self
    }

    pub fn xmax(&self) -> f64 {
        self.xmin + self.xres * self.cols as f64
    }

    pub fn ymax(&self) -> f64 {
        self.ymin + self.yres * self.rows as f64
    }

    /// Header text declaring `min`/`max` unless a range was set explicitly.
    pub fn header_text(&self, min: f64, max: f64) -> String {
        let (min, max) = self.value_range.unwrap_or((min, max));
        let mut lines = vec![
            "[General]".to_string(),
            format!("Title={}", self.name),
            "[GeoReference]".to_string(),
            "Projection=GEOGRAPHIC".to_string(),
            format!("Columns={}", self.cols),
            format!("Rows={}", self.rows),
            format!("MinX={}", self.xmin),
            format!("MaxX={}", self.xmax()),
            format!("MinY={}", self.ymin),
            format!("MaxY={}", self.ymax()),
            format!("ResolutionX={}", self.xres),
            format!("ResolutionY={}", self.yres),
            "[Data]".to_string(),
            format!("DataType={}", self.data_type),
            format!("ByteOrder={}", if self.big_endian { "MSB" } else { "LSB" }),
            format!("MinValue={min}"),
            format!("MaxValue={max}"),
        ];
        if let Some(no_data) = self.no_data {
            lines.push(format!("NoDataValue={no_data}"));
        }
        if let Some(units) = &self.units {
            lines.push(format!("Units={units}"));
        }
        lines.join("\r\n")
    }

    /// Encode `values` (row-major, row 0 north) and write both files into
    /// `dir`. `None` cells are written as the no-data value. Returns the base
    /// path of the pair.
    pub fn write_values(&self, dir: &Path, values: &[Option<f64>]) -> PathBuf {
        let no_data = self.no_data.unwrap_or(-9999.0);
        let present = values.iter().flatten().copied();
        let min = present.clone().fold(f64::INFINITY, f64::min);
        let max = present.fold(f64::NEG_INFINITY, f64::max);

        let raw: Vec<f64> = values.iter().map(|v| v.unwrap_or(no_data)).collect();
        let payload = encode_samples(&self.data_type, &raw, self.big_endian);
        self.write_raw(dir, &payload, min, max)
    }

    /// Write a payload verbatim alongside a header declaring `min`/`max`.
    pub fn write_raw(&self, dir: &Path, payload: &[u8], min: f64, max: f64) -> PathBuf {
        let base = dir.join(&self.name);
        fs::write(base.with_extension("grd"), self.header_text(min, max))
            .expect("failed to write fixture header");
        fs::write(base.with_extension("gri"), payload).expect("failed to write fixture payload");
        base
    }
}

/// Encode samples with the byte layout named by a header `DataType`.
pub fn encode_samples(data_type: &str, values: &[f64], big_endian: bool) -> Vec<u8> {
    macro_rules! encode {
        ($ty:ty) => {
            values
                .iter()
                .flat_map(|&v| {
                    let v = v as $ty;
                    if big_endian {
                        v.to_be_bytes().to_vec()
                    } else {
                        v.to_le_bytes().to_vec()
                    }
                })
                .collect()
        };
    }

    match data_type.to_uppercase().as_str() {
        "INT1BYTE" => encode!(i8),
        "INT1U" => encode!(u8),
        "INT2BYTES" => encode!(i16),
        "INT4BYTES" => encode!(i32),
        "INT8BYTES" => encode!(i64),
        "FLT4BYTES" => encode!(f32),
        "FLT8BYTES" => encode!(f64),
        other => panic!("fixtures cannot encode data type {other}"),
    }
}
