//! Preparation pipeline: discover, align, persist.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::info;

use layer_stack::{discover_layers_with, AnalysisLog, Dataset, FileLog, StackConfig};

/// Paths and parameters of a single run.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Recorded in the run log for the classification stage, which runs
    /// outside this service.
    pub groups: usize,
}

/// Counts reported at the end of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub layers: usize,
    pub excluded: usize,
    pub cells: usize,
    pub chunks: usize,
}

pub struct PreparePipeline {
    config: StackConfig,
    options: PipelineOptions,
}

impl PreparePipeline {
    pub fn new(config: StackConfig, options: PipelineOptions) -> Self {
        Self { config, options }
    }

    /// Run the pipeline, writing `aloc.log` into the output directory.
    ///
    /// The run log is closed whether or not the run succeeds.
    pub fn run(&self) -> Result<RunSummary> {
        let log = FileLog::create(&self.options.output_dir).context("cannot open run log")?;
        info!(path = %log.path().display(), "Opened run log");

        let result = self.prepare(&log);
        if let Err(e) = &result {
            log.err(&format!("{e:#}"));
        }
        log.close();
        result
    }

    fn prepare(&self, log: &dyn AnalysisLog) -> Result<RunSummary> {
        log.log(&format!(
            "Preparing {} for {} groups",
            self.options.input_dir.display(),
            self.options.groups
        ));

        let catalog =
            discover_layers_with(&self.options.input_dir, self.config.read_block_bytes, log)
                .context("cannot scan input directory")?;

        let dataset = Dataset::build(&catalog.usable, self.config.pieces(), log)
            .context("cannot build dataset")?;

        if self.config.write_extents_file {
            let path = dataset
                .write_extents(&self.options.output_dir)
                .context("cannot write extents")?;
            info!(path = %path.display(), "Wrote extents");
        }

        for stats in dataset.layer_stats() {
            log.log(&format!(
                "{}: sampled range {} to {}",
                stats.name, stats.extent.min, stats.extent.max
            ));
        }

        let sizes: Vec<String> = dataset
            .chunks()
            .iter()
            .map(|c| c.cells().to_string())
            .collect();
        log.log(&format!(
            "{} cells with values in all {} layers, {} chunks ({})",
            dataset.cell_count(),
            dataset.layer_count(),
            dataset.chunks().len(),
            sizes.join(", ")
        ));

        Ok(RunSummary {
            layers: dataset.layer_count(),
            excluded: catalog.invariant.len(),
            cells: dataset.cell_count(),
            chunks: dataset.chunks().len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use layer_stack::{StackError, EXTENTS_FILE_NAME, LOG_FILE_NAME};
    use test_utils::{create_constant_grid, scratch_dir, to_cells, RasterFixture};

    fn config() -> StackConfig {
        StackConfig {
            threads: 1,
            pieces_per_thread: 2,
            ..Default::default()
        }
    }

    #[test]
    fn test_run_writes_log_and_extents() {
        let input = scratch_dir();
        let output = scratch_dir();
        RasterFixture::new("a", 2, 2)
            .write_values(input.path(), &[1.0, 2.0, 3.0, 4.0].map(Some));
        RasterFixture::new("b", 2, 2)
            .write_values(input.path(), &[4.0, 3.0, 2.0, 1.0].map(Some));
        RasterFixture::new("c", 2, 2)
            .write_values(input.path(), &to_cells(&create_constant_grid(2, 2, 7.0)));

        let pipeline = PreparePipeline::new(
            config(),
            PipelineOptions {
                input_dir: input.path().to_path_buf(),
                output_dir: output.path().to_path_buf(),
                groups: 3,
            },
        );
        let summary = pipeline.run().unwrap();
        assert_eq!(
            summary,
            RunSummary {
                layers: 2,
                excluded: 1,
                cells: 4,
                chunks: 2,
            }
        );

        let extents = std::fs::read_to_string(output.path().join(EXTENTS_FILE_NAME)).unwrap();
        assert_eq!(extents.lines().collect::<Vec<_>>(), vec!["2", "2", "0.0", "0.0", "2.0", "2.0"]);

        let log = std::fs::read_to_string(output.path().join(LOG_FILE_NAME)).unwrap();
        assert_eq!(log.matches("c is excluded from classification").count(), 1);
        assert!(log.contains("4 cells with values in all 2 layers, 2 chunks (2, 2)"));
    }

    #[test]
    fn test_insufficient_layers_fails_run() {
        let input = scratch_dir();
        let output = scratch_dir();
        RasterFixture::new("only", 2, 2)
            .write_values(input.path(), &[1.0, 2.0, 3.0, 4.0].map(Some));

        let pipeline = PreparePipeline::new(
            config(),
            PipelineOptions {
                input_dir: input.path().to_path_buf(),
                output_dir: output.path().to_path_buf(),
                groups: 3,
            },
        );
        let err = pipeline.run().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<StackError>(),
            Some(StackError::InsufficientLayers { found: 1 })
        ));
        assert!(!output.path().join(EXTENTS_FILE_NAME).exists());

        let log = std::fs::read_to_string(output.path().join(LOG_FILE_NAME)).unwrap();
        assert!(log.contains("ERROR: cannot build dataset"));
    }
}
