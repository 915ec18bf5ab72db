//! Integration tests: scanning an input directory for layers.

use std::fs;

use layer_stack::{discover_layers, discover_layers_with, AnalysisLog, Dataset, FileLog, MemoryLog, StackError};
use test_utils::{scratch_dir, RasterFixture};

#[test]
fn test_catalog_splits_usable_and_invariant() {
    let dir = scratch_dir();
    let values = [1.0, 2.0, 3.0, 4.0].map(Some);
    RasterFixture::new("temp", 2, 2).write_values(dir.path(), &values);
    RasterFixture::new("rain", 2, 2).write_values(dir.path(), &values);
    RasterFixture::new("flat", 2, 2).write_values(dir.path(), &[Some(5.0); 4]);
    RasterFixture::new("bits", 2, 2)
        .data_type("BIT1")
        .write_raw(dir.path(), &[0u8], 0.0, 1.0);
    let orphan = RasterFixture::new("orphan", 2, 2).write_values(dir.path(), &values);
    fs::remove_file(orphan.with_extension("gri")).unwrap();
    fs::write(dir.path().join("notes.txt"), "not a layer").unwrap();

    let log = MemoryLog::new();
    let catalog = discover_layers(dir.path(), &log).expect("Failed to scan directory");

    assert_eq!(catalog.usable_names(), vec!["rain".to_string(), "temp".to_string()]);
    assert_eq!(catalog.invariant_names(), vec!["flat".to_string()]);
    assert!(log.contains(
        "flat is excluded from classification because it has no variation for the selected area"
    ));
    assert!(log.contains("ERROR: Skipping layer bits"));
    assert!(log.contains("orphan"));
}

#[test]
fn test_upper_case_pair_is_found_once() {
    let dir = scratch_dir();
    let base = RasterFixture::new("ELEV", 2, 2)
        .write_values(dir.path(), &[1.0, 2.0, 3.0, 4.0].map(Some));
    fs::rename(base.with_extension("grd"), base.with_extension("GRD")).unwrap();
    fs::rename(base.with_extension("gri"), base.with_extension("GRI")).unwrap();

    let catalog = discover_layers_with(dir.path(), 64, &MemoryLog::new()).unwrap();
    assert_eq!(catalog.usable_names(), vec!["ELEV".to_string()]);
}

#[test]
fn test_missing_directory() {
    let dir = scratch_dir();
    let err = discover_layers(dir.path().join("absent"), &MemoryLog::new()).unwrap_err();
    assert!(matches!(err, StackError::Io { .. }));
}

#[test]
fn test_discovered_layers_feed_dataset_with_file_log() {
    let input = scratch_dir();
    let output = scratch_dir();
    RasterFixture::new("a", 2, 2).write_values(input.path(), &[1.0, 2.0, 3.0, 4.0].map(Some));
    RasterFixture::new("b", 2, 2).write_values(input.path(), &[Some(4.0), Some(3.0), None, Some(1.0)]);
    RasterFixture::new("c", 2, 2).write_values(input.path(), &[Some(0.0); 4]);

    let log = FileLog::create(output.path()).unwrap();
    let catalog = discover_layers(input.path(), &log).unwrap();
    let dataset = Dataset::build(&catalog.usable, 2, &log).unwrap();
    log.close();

    assert_eq!(dataset.layer_count(), 2);
    assert_eq!(dataset.cell_count(), 3);

    let text = fs::read_to_string(log.path()).unwrap();
    assert!(text.contains("c is excluded from classification"));
    assert!(text.contains("Output grid 2 x 2 cells"));
}
