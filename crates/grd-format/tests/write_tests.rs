//! Integration tests: writing single-precision rasters and reading them back.

use std::fs;

use grd_format::{ByteOrder, DataType, GrdWriter, GridGeometry, RasterHandle, NO_DATA_SENTINEL};
use test_utils::{assert_approx_eq, assert_slice_approx_eq, scratch_dir};

fn geometry(cols: usize, rows: usize, res: f64) -> GridGeometry {
    GridGeometry {
        cols,
        rows,
        xmin: 140.0,
        ymin: -35.0,
        xmax: 140.0 + res * cols as f64,
        ymax: -35.0 + res * rows as f64,
        xres: res,
        yres: res,
    }
}

#[test]
fn test_write_then_read_preserves_nan() {
    let dir = scratch_dir();
    let base = dir.path().join("groups");
    let values = vec![1.0, f32::NAN, 3.5, -2.25, 0.0, f32::NAN];

    GrdWriter::default()
        .write(&base, &values, &geometry(3, 2, 0.25))
        .expect("Failed to write");

    let handle = RasterHandle::open(&base).expect("Failed to open written pair");
    assert_eq!(handle.header().data_type, DataType::Float);
    assert_eq!(handle.header().no_data, Some(NO_DATA_SENTINEL));
    assert_eq!(handle.header().min_value, -2.25);
    assert_eq!(handle.header().max_value, 3.5);
    assert_eq!(handle.geometry().cols, 3);
    assert_eq!(handle.geometry().rows, 2);
    assert_slice_approx_eq!(handle.grid().unwrap(), &values, 0.0);
}

#[test]
fn test_big_endian_output() {
    let dir = scratch_dir();
    let base = dir.path().join("be");
    GrdWriter::new(ByteOrder::Msb)
        .write(&base, &[1.0, 2.0], &geometry(2, 1, 0.5))
        .unwrap();

    let payload = fs::read(base.with_extension("gri")).unwrap();
    assert_eq!(&payload[..4], &1.0f32.to_be_bytes());

    let handle = RasterHandle::open(&base).unwrap();
    assert_eq!(handle.header().byte_order, ByteOrder::Msb);
    assert_eq!(handle.grid().unwrap(), &[1.0, 2.0]);
}

#[test]
fn test_header_extents() {
    let dir = scratch_dir();
    let base = dir.path().join("extent");
    GrdWriter::default()
        .write(&base, &[0.0; 6], &geometry(3, 2, 0.2))
        .unwrap();

    let text = fs::read_to_string(base.with_extension("grd")).unwrap();
    assert!(text.contains("\r\n"));
    assert!(text.contains("MinX=140.00"));
    assert!(text.contains("MaxX=140.60"));
    assert!(text.contains("MinY=-35.00"));
    assert!(text.contains("MaxY=-34.60"));

    let handle = RasterHandle::open(&base).unwrap();
    assert_approx_eq!(handle.geometry().xres, 0.2, 1e-12);
}

#[test]
fn test_all_missing_grid() {
    let dir = scratch_dir();
    let base = dir.path().join("empty");
    GrdWriter::default()
        .write(&base, &[f32::NAN; 4], &geometry(2, 2, 0.5))
        .unwrap();

    let handle = RasterHandle::open(&base).unwrap();
    assert!(handle.header().min_value.is_nan());
    assert!(!handle.is_usable());
    assert!(handle.grid().unwrap().iter().all(|v| v.is_nan()));
}
