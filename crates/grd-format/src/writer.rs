//! Writing single-precision raster pairs.

use std::path::Path;

use bytes::{BufMut, BytesMut};

use crate::cell::GridGeometry;
use crate::datatype::{ByteOrder, DataType};
use crate::error::{GrdError, Result};
use crate::raster::with_suffix;

/// Value written in place of NaN cells.
pub const NO_DATA_SENTINEL: f64 = -3.4e38;

/// Writes `FLT4BYTES` rasters with a matching header.
#[derive(Debug, Clone, Copy, Default)]
pub struct GrdWriter {
    byte_order: ByteOrder,
}

impl GrdWriter {
    pub fn new(byte_order: ByteOrder) -> Self {
        Self { byte_order }
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    /// Write `values` (row-major, row 0 north) to `<base>.gri` and the header
    /// to `<base>.grd`.
    ///
    /// `MaxX`/`MaxY` in the header are recomputed from `xmin + xres * cols`
    /// and `ymin + yres * rows`; `MinValue`/`MaxValue` are taken over the
    /// non-NaN values (NaN when there are none).
    pub fn write(&self, base: &Path, values: &[f32], geometry: &GridGeometry) -> Result<()> {
        let mut payload = BytesMut::with_capacity(values.len() * 4);
        let sentinel = NO_DATA_SENTINEL as f32;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;

        for &v in values {
            let v = if v.is_nan() {
                sentinel
            } else {
                min = min.min(v as f64);
                max = max.max(v as f64);
                v
            };
            match self.byte_order {
                ByteOrder::Lsb => payload.put_f32_le(v),
                ByteOrder::Msb => payload.put_f32(v),
            }
        }

        if min > max {
            min = f64::NAN;
            max = f64::NAN;
        }

        let data_path = with_suffix(base, "gri");
        std::fs::write(&data_path, &payload).map_err(|e| GrdError::io(&data_path, e))?;

        let header_path = with_suffix(base, "grd");
        let header = self.header_text(base, geometry, min, max);
        std::fs::write(&header_path, header).map_err(|e| GrdError::io(&header_path, e))?;

        tracing::debug!(
            path = %base.display(),
            cells = values.len(),
            min,
            max,
            "Wrote grid"
        );

        Ok(())
    }

    fn header_text(&self, base: &Path, g: &GridGeometry, min: f64, max: f64) -> String {
        let xmax = g.xmin + g.xres * g.cols as f64;
        let ymax = g.ymin + g.yres * g.rows as f64;

        let lines = [
            "[General]".to_string(),
            format!("Title={}", base.display()),
            "[GeoReference]".to_string(),
            "Projection=GEOGRAPHIC".to_string(),
            "Datum=WGS84".to_string(),
            "Mapunits=DEGREES".to_string(),
            format!("Columns={}", g.cols),
            format!("Rows={}", g.rows),
            format!("MinX={:.2}", g.xmin),
            format!("MaxX={:.2}", xmax),
            format!("MinY={:.2}", g.ymin),
            format!("MaxY={:.2}", ymax),
            format!("ResolutionX={:?}", g.xres),
            format!("ResolutionY={:?}", g.yres),
            "[Data]".to_string(),
            format!("DataType={}", DataType::Float.header_name()),
            format!("ByteOrder={}", self.byte_order.header_name()),
            format!("MinValue={:?}", min),
            format!("MaxValue={:?}", max),
            "NoDataValue=-3.4E38".to_string(),
            "Transparent=0".to_string(),
        ];

        lines.join("\r\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::RasterHeader;

    fn geometry() -> GridGeometry {
        GridGeometry {
            cols: 2,
            rows: 2,
            xmin: 150.0,
            ymin: -30.0,
            xmax: 151.0,
            ymax: -29.0,
            xres: 0.5,
            yres: 0.5,
        }
    }

    #[test]
    fn test_header_text_layout() {
        let text = GrdWriter::default().header_text(Path::new("out/aloc"), &geometry(), 1.0, 4.0);
        assert!(text.starts_with("[General]\r\nTitle=out/aloc\r\n[GeoReference]"));
        assert!(text.contains("MinX=150.00\r\nMaxX=151.00\r\nMinY=-30.00\r\nMaxY=-29.00"));
        assert!(text.contains("ResolutionX=0.5"));
        assert!(text.contains("DataType=FLT4BYTES"));
        assert!(text.contains("MinValue=1.0\r\nMaxValue=4.0"));
        assert!(text.ends_with("NoDataValue=-3.4E38\r\nTransparent=0"));
    }

    #[test]
    fn test_written_header_parses_back() {
        let text = GrdWriter::new(ByteOrder::Msb).header_text(Path::new("x"), &geometry(), -2.5, 7.0);
        let header = RasterHeader::parse(Path::new("x.grd"), &text).unwrap();
        assert_eq!(header.geometry, geometry());
        assert_eq!(header.data_type, DataType::Float);
        assert_eq!(header.byte_order, ByteOrder::Msb);
        assert_eq!(header.no_data, Some(NO_DATA_SENTINEL));
        assert_eq!(header.min_value, -2.5);
        assert_eq!(header.max_value, 7.0);
    }
}
