//! Contracts for the stages that consume a finished dataset.
//!
//! Clustering, colouring and the various exporters live outside this crate.
//! [`run_classification`] wires them together around a [`Dataset`].

use std::path::PathBuf;

use grd_format::GrdWriter;

use crate::dataset::{Dataset, FeatureChunk};
use crate::error::{Result, StackError};
use crate::groups::{denormalize_means, group_count, group_means, group_range, write_group_grid};
use crate::log::AnalysisLog;

/// Input handed to a [`Classifier`].
#[derive(Debug, Clone, Copy)]
pub struct ClassifyRequest<'a> {
    pub chunks: &'a [FeatureChunk],
    /// Number of groups asked for.
    pub groups: usize,
    pub layers: usize,
    pub pieces: usize,
    pub layer_names: &'a [String],
    pub threads: usize,
}

/// Group id per cell (0-based, in dataset cell order) and the number of
/// iterations the classifier ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub groups: Vec<usize>,
    pub iterations: usize,
}

/// Assigns every cell of a dataset to a group.
pub trait Classifier {
    fn classify(&self, request: &ClassifyRequest<'_>, log: &dyn AnalysisLog) -> Result<Classification>;
}

pub type Rgb = [u8; 3];

/// Picks a display colour per group from its normalized layer means.
pub trait Colourer {
    fn colour(&self, means: &[Vec<f32>]) -> Result<Vec<Rgb>>;
}

/// Everything an exporter may read about a finished classification.
#[derive(Debug, Clone, Copy)]
pub struct ClassificationOutput<'a> {
    pub dataset: &'a Dataset,
    pub groups: &'a [usize],
    pub group_count: usize,
    /// Normalized means, `[group][layer]`.
    pub means: &'a [Vec<f32>],
    /// Means in layer units, `[group][layer]`.
    pub layer_means: &'a [Vec<f32>],
    pub colours: &'a [Rgb],
    pub iterations: usize,
}

/// Writes one artefact of a classification.
pub trait Exporter {
    /// Short label used in log messages.
    fn name(&self) -> &str;

    fn export(&self, output: &ClassificationOutput<'_>, log: &dyn AnalysisLog) -> Result<()>;
}

/// Exports the group raster as a `.grd`/`.gri` pair.
#[derive(Debug, Clone)]
pub struct GroupGridExporter {
    base: PathBuf,
    writer: GrdWriter,
}

impl GroupGridExporter {
    pub fn new(base: impl Into<PathBuf>, writer: GrdWriter) -> Self {
        Self {
            base: base.into(),
            writer,
        }
    }
}

impl Exporter for GroupGridExporter {
    fn name(&self) -> &str {
        "group grid"
    }

    fn export(&self, output: &ClassificationOutput<'_>, _log: &dyn AnalysisLog) -> Result<()> {
        write_group_grid(&self.base, output.dataset, output.groups, &self.writer)
    }
}

/// Owned result of [`run_classification`].
#[derive(Debug, Clone)]
pub struct ClassificationResult {
    pub groups: Vec<usize>,
    pub group_count: usize,
    pub means: Vec<Vec<f32>>,
    pub layer_means: Vec<Vec<f32>>,
    pub colours: Vec<Rgb>,
    pub iterations: usize,
}

/// Classify `dataset` into `requested_groups` groups, colour the groups and
/// run every exporter.
///
/// The group count is recomputed from the ids the classifier returned. When
/// every cell lands in the same group the run continues and the log gets an
/// error line. An exporter failure is logged and returned after the remaining exporters
/// have run.
pub fn run_classification(
    dataset: &Dataset,
    requested_groups: usize,
    threads: usize,
    classifier: &dyn Classifier,
    colourer: &dyn Colourer,
    exporters: &[&dyn Exporter],
    log: &dyn AnalysisLog,
) -> Result<ClassificationResult> {
    let layer_names = dataset.layer_names();
    let request = ClassifyRequest {
        chunks: dataset.chunks(),
        groups: requested_groups,
        layers: dataset.layer_count(),
        pieces: dataset.chunks().len(),
        layer_names: &layer_names,
        threads,
    };

    let classification = classifier.classify(&request, log)?;
    if classification.groups.len() != dataset.cell_count() {
        return Err(StackError::classification(format!(
            "classifier returned {} group ids for {} cells",
            classification.groups.len(),
            dataset.cell_count()
        )));
    }

    let count = group_count(&classification.groups);
    if group_range(&classification.groups) == 0 {
        log.err(
            "Classification produced a single group, \
             the area may not have enough variation to classify",
        );
    }
    log.log(&format!(
        "Classified {} cells into {count} groups in {} iterations",
        dataset.cell_count(),
        classification.iterations
    ));

    let means = group_means(dataset, &classification.groups, count)?;
    let extents: Vec<_> = dataset.layer_stats().iter().map(|s| s.extent).collect();
    let layer_means = denormalize_means(&means, &extents);

    let colours = colourer.colour(&means)?;
    if colours.len() != count {
        return Err(StackError::classification(format!(
            "colourer returned {} colours for {count} groups",
            colours.len()
        )));
    }

    let output = ClassificationOutput {
        dataset,
        groups: &classification.groups,
        group_count: count,
        means: &means,
        layer_means: &layer_means,
        colours: &colours,
        iterations: classification.iterations,
    };

    let mut first_error = None;
    for exporter in exporters {
        match exporter.export(&output, log) {
            Ok(()) => tracing::debug!(exporter = exporter.name(), "Export complete"),
            Err(e) => {
                log.err(&format!("{} export failed: {e}", exporter.name()));
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }
    }
    if let Some(e) = first_error {
        return Err(e);
    }

    Ok(ClassificationResult {
        groups: classification.groups,
        group_count: count,
        means,
        layer_means,
        colours,
        iterations: classification.iterations,
    })
}
