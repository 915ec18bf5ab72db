//! `.grd` header parsing.
//!
//! The header is an INI-like text file. Keys consumed:
//!
//! - `[GeoReference]`: `Columns`, `Rows`, `MinX`, `MinY`, `MaxX`, `MaxY`,
//!   `ResolutionX`, `ResolutionY`
//! - `[Data]`: `DataType`, `MinValue`, `MaxValue`, `NoDataValue`, `ByteOrder`,
//!   `Units`
//!
//! Everything else (title, projection, datum) is ignored on read.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::cell::GridGeometry;
use crate::datatype::{ByteOrder, DataType};
use crate::error::{GrdError, Result};

/// Key/value pairs grouped by section. Section and key lookups are
/// case-insensitive.
#[derive(Debug, Clone, Default)]
pub struct HeaderSections {
    sections: HashMap<String, HashMap<String, String>>,
}

impl HeaderSections {
    /// Parse header text. Lines outside any section, blank lines and
    /// `;`/`#` comments are skipped; values keep everything after the first `=`.
    pub fn parse(text: &str) -> Self {
        let mut sections: HashMap<String, HashMap<String, String>> = HashMap::new();
        let mut current: Option<String> = None;

        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
                continue;
            }

            if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                let name = name.trim().to_lowercase();
                sections.entry(name.clone()).or_default();
                current = Some(name);
                continue;
            }

            let (Some(section), Some((key, value))) = (current.as_ref(), line.split_once('='))
            else {
                continue;
            };

            sections
                .entry(section.clone())
                .or_default()
                .insert(key.trim().to_lowercase(), value.trim().to_string());
        }

        Self { sections }
    }

    /// Raw value of `key` in `section`.
    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.sections
            .get(&section.to_lowercase())
            .and_then(|s| s.get(&key.to_lowercase()))
            .map(String::as_str)
    }

    pub fn contains(&self, section: &str, key: &str) -> bool {
        self.get(section, key).is_some()
    }

    fn number(&self, path: &Path, section: &str, key: &str) -> Result<f64> {
        let raw = self
            .get(section, key)
            .ok_or_else(|| GrdError::invalid_header(path, format!("missing {section}/{key}")))?;
        raw.parse::<f64>().map_err(|_| {
            GrdError::invalid_header(path, format!("{section}/{key} is not a number: {raw:?}"))
        })
    }

    fn count(&self, path: &Path, section: &str, key: &str) -> Result<usize> {
        let raw = self
            .get(section, key)
            .ok_or_else(|| GrdError::invalid_header(path, format!("missing {section}/{key}")))?;
        raw.parse::<usize>().map_err(|_| {
            GrdError::invalid_header(path, format!("{section}/{key} is not a count: {raw:?}"))
        })
    }

    fn optional_number(&self, section: &str, key: &str) -> Option<f64> {
        self.get(section, key).and_then(|v| v.parse::<f64>().ok())
    }
}

/// Parsed contents of a `.grd` header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RasterHeader {
    pub geometry: GridGeometry,
    pub data_type: DataType,
    /// Sample value meaning "no measurement"; `None` when the header has no
    /// `NoDataValue` key.
    pub no_data: Option<f64>,
    pub byte_order: ByteOrder,
    /// Units with any rescale prefix stripped.
    pub units: Option<String>,
    /// Multiplier applied to every decoded sample.
    pub rescale: f32,
    /// Declared minimum, already multiplied by `rescale`.
    pub min_value: f64,
    /// Declared maximum, already multiplied by `rescale`.
    pub max_value: f64,
}

impl RasterHeader {
    /// Read and parse a header file.
    pub fn read(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| GrdError::io(path, e))?;
        Self::parse(path, &text)
    }

    /// Parse header text. `path` is only used in error messages.
    pub fn parse(path: &Path, text: &str) -> Result<Self> {
        let ini = HeaderSections::parse(text);

        let cols = ini.count(path, "GeoReference", "Columns")?;
        let rows = ini.count(path, "GeoReference", "Rows")?;
        let xmin = ini.number(path, "GeoReference", "MinX")?;
        let ymin = ini.number(path, "GeoReference", "MinY")?;
        let xmax = ini.number(path, "GeoReference", "MaxX")?;
        let ymax = ini.number(path, "GeoReference", "MaxY")?;
        let mut xres = ini.number(path, "GeoReference", "ResolutionX")?;
        let mut yres = ini.number(path, "GeoReference", "ResolutionY")?;

        // Files written with a placeholder resolution of 1 get it derived from
        // the extent. The axes are crossed (x over rows, y over cols); existing
        // outputs depend on this.
        if xres == 1.0 && rows > 0 && cols > 0 {
            xres = (xmax - xmin) / rows as f64;
            yres = (ymax - ymin) / cols as f64;
        }

        let data_type = DataType::from_header(ini.get("Data", "DataType").unwrap_or_default());
        if !data_type.is_known() {
            tracing::warn!(path = %path.display(), data_type = data_type.header_name(), "Unknown grid data type");
        }

        // Min/max are held at single precision.
        let mut min_value = ini.optional_number("Data", "MinValue").unwrap_or(f64::NAN) as f32 as f64;
        let mut max_value = ini.optional_number("Data", "MaxValue").unwrap_or(f64::NAN) as f32 as f64;

        let no_data = if ini.contains("Data", "NoDataValue") {
            Some(ini.optional_number("Data", "NoDataValue").unwrap_or(f64::NAN))
        } else {
            None
        };

        let byte_order = ByteOrder::from_header(ini.get("Data", "ByteOrder"));

        let mut units = ini.get("Data", "Units").map(str::to_string);
        let rescale = units.as_deref().map(rescale_from_units).unwrap_or(1.0);
        if rescale != 1.0 {
            units = units
                .as_deref()
                .and_then(|u| u.split_once(' '))
                .map(|(_, rest)| rest.to_string());
            min_value *= rescale as f64;
            max_value *= rescale as f64;
        }

        Ok(Self {
            geometry: GridGeometry {
                cols,
                rows,
                xmin,
                ymin,
                xmax,
                ymax,
                xres,
                yres,
            },
            data_type,
            no_data,
            byte_order,
            units,
            rescale,
            min_value,
            max_value,
        })
    }

    /// A layer is usable for classification when its declared range is positive.
    pub fn has_positive_range(&self) -> bool {
        self.min_value < self.max_value
    }

    /// Expected payload length in bytes.
    pub fn payload_len(&self) -> usize {
        self.geometry.len() * self.data_type.bytes_per_sample()
    }
}

/// Derive the sample multiplier from a units string.
///
/// `"1/<k> rest"` gives `1/k` and `"x<k> rest"` gives `k`. The factor must be
/// followed by a space; anything unparseable gives 1.
pub fn rescale_from_units(units: &str) -> f32 {
    let Some((prefix, _)) = units.split_once(' ') else {
        return 1.0;
    };

    let factor = if let Some(k) = prefix.strip_prefix("1/") {
        k.parse::<f32>().ok().map(|k| 1.0 / k)
    } else if let Some(k) = prefix.strip_prefix('x') {
        k.parse::<f32>().ok()
    } else {
        None
    };

    match factor {
        Some(f) if f.is_finite() && f != 0.0 => f,
        _ => 1.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "[General]\r\n\
        Title=rainfall\r\n\
        [GeoReference]\r\n\
        Projection=GEOGRAPHIC\r\n\
        Columns=4\r\n\
        Rows=2\r\n\
        MinX=112.00\r\n\
        MaxX=114.00\r\n\
        MinY=-44.00\r\n\
        MaxY=-43.00\r\n\
        ResolutionX=0.5\r\n\
        ResolutionY=0.5\r\n\
        [Data]\r\n\
        DataType=INT2BYTES\r\n\
        ByteOrder=MSB\r\n\
        MinValue=10\r\n\
        MaxValue=250\r\n\
        NoDataValue=-9999\r\n\
        Units=1/10 mm\r\n";

    #[test]
    fn test_parse_full_header() {
        let h = RasterHeader::parse(Path::new("rainfall.grd"), HEADER).unwrap();
        assert_eq!(h.geometry.cols, 4);
        assert_eq!(h.geometry.rows, 2);
        assert_eq!(h.geometry.xmin, 112.0);
        assert_eq!(h.geometry.ymax, -43.0);
        assert_eq!(h.geometry.xres, 0.5);
        assert_eq!(h.data_type, DataType::Short);
        assert_eq!(h.byte_order, ByteOrder::Msb);
        assert_eq!(h.no_data, Some(-9999.0));
        assert_eq!(h.units.as_deref(), Some("mm"));
        assert!((h.rescale - 0.1).abs() < 1e-7);
        assert!((h.min_value - 1.0).abs() < 1e-5);
        assert!((h.max_value - 25.0).abs() < 1e-5);
        assert_eq!(h.payload_len(), 16);
    }

    #[test]
    fn test_sections_are_case_insensitive() {
        let ini = HeaderSections::parse("[data]\nDATATYPE = FLT4BYTES\n");
        assert_eq!(ini.get("Data", "DataType"), Some("FLT4BYTES"));
        assert!(!ini.contains("GeoReference", "Columns"));
    }

    #[test]
    fn test_unit_resolution_is_derived_from_extent() {
        let text = HEADER.replace("ResolutionX=0.5", "ResolutionX=1");
        let h = RasterHeader::parse(Path::new("r.grd"), &text).unwrap();
        // xres over rows, yres over cols
        assert_eq!(h.geometry.xres, 1.0);
        assert_eq!(h.geometry.yres, 0.25);
    }

    #[test]
    fn test_missing_no_data_key() {
        let text = HEADER.replace("NoDataValue=-9999\r\n", "");
        let h = RasterHeader::parse(Path::new("r.grd"), &text).unwrap();
        assert_eq!(h.no_data, None);
    }

    #[test]
    fn test_missing_geometry_is_invalid() {
        let text = HEADER.replace("Columns=4\r\n", "");
        let err = RasterHeader::parse(Path::new("r.grd"), &text).unwrap_err();
        assert!(matches!(err, GrdError::InvalidHeader { .. }));
    }

    #[test]
    fn test_rescale_prefixes() {
        assert!((rescale_from_units("1/100 degrees C") - 0.01).abs() < 1e-9);
        assert_eq!(rescale_from_units("x10 metres"), 10.0);
        assert_eq!(rescale_from_units("metres"), 1.0);
        assert_eq!(rescale_from_units("1/100"), 1.0);
        assert_eq!(rescale_from_units("xyz units"), 1.0);
        assert_eq!(rescale_from_units("1/0 units"), 1.0);
    }

    #[test]
    fn test_constant_layer_has_no_positive_range() {
        let text = HEADER.replace("MaxValue=250", "MaxValue=10");
        let h = RasterHeader::parse(Path::new("r.grd"), &text).unwrap();
        assert!(!h.has_positive_range());
    }
}
