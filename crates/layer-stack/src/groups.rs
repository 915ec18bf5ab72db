//! Post-processing of per-cell group ids.

use std::path::Path;

use grd_format::GrdWriter;
use rayon::prelude::*;

use crate::dataset::Dataset;
use crate::error::{Result, StackError};
use crate::normalize::LayerExtent;

/// Number of groups implied by 0-based ids: highest id plus one.
pub fn group_count(groups: &[usize]) -> usize {
    groups.iter().max().map_or(0, |&max| max + 1)
}

/// Spread between the highest and lowest id; 0 when there are none.
pub fn group_range(groups: &[usize]) -> usize {
    match (groups.iter().min(), groups.iter().max()) {
        (Some(min), Some(max)) => max - min,
        _ => 0,
    }
}

/// Mean normalized value of every layer within every group.
///
/// Returns `[group][layer]`; a group without cells has NaN means. Chunks are
/// summed in parallel.
pub fn group_means(dataset: &Dataset, groups: &[usize], count: usize) -> Result<Vec<Vec<f32>>> {
    check_len(dataset, groups)?;
    let layers = dataset.layer_count();

    let mut offsets = Vec::with_capacity(dataset.chunks().len());
    let mut offset = 0usize;
    for chunk in dataset.chunks() {
        offsets.push(offset);
        offset += chunk.cells();
    }

    let zero = || (vec![0.0f64; count * layers], vec![0usize; count * layers]);

    let (sums, counts) = dataset
        .chunks()
        .par_iter()
        .zip(offsets.par_iter())
        .map(|(chunk, &offset)| {
            let (mut sums, mut counts) = zero();
            for (i, cell) in chunk.iter_cells().enumerate() {
                let group = groups[offset + i];
                if group >= count {
                    continue;
                }
                for (j, &v) in cell.iter().enumerate() {
                    if !v.is_nan() {
                        sums[group * layers + j] += v as f64;
                        counts[group * layers + j] += 1;
                    }
                }
            }
            (sums, counts)
        })
        .reduce(zero, |(mut sa, mut ca), (sb, cb)| {
            sa.iter_mut().zip(&sb).for_each(|(a, b)| *a += b);
            ca.iter_mut().zip(&cb).for_each(|(a, b)| *a += b);
            (sa, ca)
        });

    Ok((0..count)
        .map(|g| {
            (0..layers)
                .map(|j| {
                    let n = counts[g * layers + j];
                    if n == 0 {
                        f32::NAN
                    } else {
                        (sums[g * layers + j] / n as f64) as f32
                    }
                })
                .collect()
        })
        .collect())
}

/// Convert normalized group means back to layer units.
pub fn denormalize_means(means: &[Vec<f32>], extents: &[LayerExtent]) -> Vec<Vec<f32>> {
    means
        .iter()
        .map(|group| {
            group
                .iter()
                .zip(extents)
                .map(|(&v, extent)| extent.denormalize(v))
                .collect()
        })
        .collect()
}

/// North-up raster of `group id + 1` over the output grid, NaN where no cell
/// was classified.
pub fn group_grid(dataset: &Dataset, groups: &[usize]) -> Result<Vec<f32>> {
    check_len(dataset, groups)?;
    let geometry = dataset.geometry();
    let mut grid = vec![f32::NAN; geometry.cell_count()];
    for (&cell, &group) in dataset.cell_coordinates().iter().zip(groups) {
        grid[geometry.north_up_index(cell)] = (group + 1) as f32;
    }
    Ok(grid)
}

/// Write the group raster to `<base>.grd`/`<base>.gri`.
pub fn write_group_grid(
    base: &Path,
    dataset: &Dataset,
    groups: &[usize],
    writer: &GrdWriter,
) -> Result<()> {
    let grid = group_grid(dataset, groups)?;
    writer.write(base, &grid, &dataset.geometry().to_grid_geometry())?;
    Ok(())
}

fn check_len(dataset: &Dataset, groups: &[usize]) -> Result<()> {
    if groups.len() != dataset.cell_count() {
        return Err(StackError::classification(format!(
            "{} group ids for {} cells",
            groups.len(),
            dataset.cell_count()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_count_and_range() {
        assert_eq!(group_count(&[0, 3, 1]), 4);
        assert_eq!(group_count(&[]), 0);
        assert_eq!(group_range(&[2, 5, 3]), 3);
        assert_eq!(group_range(&[]), 0);
    }

    #[test]
    fn test_denormalize_means() {
        let means = vec![vec![0.5, 0.0], vec![1.0, f32::NAN]];
        let extents = [
            LayerExtent { min: 0.0, max: 10.0 },
            LayerExtent { min: -1.0, max: 1.0 },
        ];
        let out = denormalize_means(&means, &extents);
        assert_eq!(out[0], vec![5.0, -1.0]);
        assert_eq!(out[1][0], 10.0);
        assert!(out[1][1].is_nan());
    }
}
