//! Sampling layers onto the output grid and scaling them to `[0, 1]`.

use grd_format::RasterHandle;
use serde::{Deserialize, Serialize};

/// Observed range of a layer's sampled values.
///
/// Both bounds are NaN when no value was sampled.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayerExtent {
    pub min: f32,
    pub max: f32,
}

impl LayerExtent {
    /// Range over the non-NaN entries of `values`.
    pub fn of(values: &[f32]) -> Self {
        let mut min = f32::INFINITY;
        let mut max = f32::NEG_INFINITY;
        for &v in values.iter().filter(|v| !v.is_nan()) {
            min = min.min(v);
            max = max.max(v);
        }
        if min > max {
            return Self {
                min: f32::NAN,
                max: f32::NAN,
            };
        }
        Self { min, max }
    }

    /// No positive range to scale by.
    pub fn is_degenerate(&self) -> bool {
        !(self.max > self.min)
    }

    /// Map a normalized value back to layer units.
    pub fn denormalize(&self, value: f32) -> f32 {
        if self.is_degenerate() {
            return self.min;
        }
        self.min + value * (self.max - self.min)
    }
}

/// A layer sampled at every output cell.
#[derive(Debug, Clone)]
pub struct NormalizedLayer {
    pub name: String,
    /// One value per output cell, in `[0, 1]` or NaN.
    pub values: Vec<f32>,
    /// Range of the sampled values before scaling.
    pub extent: LayerExtent,
}

/// Scale `values` into `[0, 1]` using `extent`. NaN stays NaN; when the
/// extent has no positive range every other value becomes 0.
pub fn normalize_in_place(values: &mut [f32], extent: LayerExtent) {
    if extent.is_degenerate() {
        for v in values.iter_mut().filter(|v| !v.is_nan()) {
            *v = 0.0;
        }
        return;
    }

    let range = extent.max - extent.min;
    for v in values.iter_mut() {
        *v = (*v - extent.min) / range;
    }
}

/// Sample `handle` at `points` and normalize the result.
pub fn sample_and_normalize(
    handle: &RasterHandle,
    points: &[(f64, f64)],
) -> grd_format::Result<NormalizedLayer> {
    let mut values = handle.values_at(points)?;
    let extent = LayerExtent::of(&values);
    normalize_in_place(&mut values, extent);

    tracing::debug!(
        layer = %handle.name(),
        min = extent.min,
        max = extent.max,
        "Sampled layer"
    );

    Ok(NormalizedLayer {
        name: handle.name(),
        values,
        extent,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::assert_approx_eq;

    #[test]
    fn test_extent_skips_nan() {
        let extent = LayerExtent::of(&[3.0, f32::NAN, -1.0, 7.0]);
        assert_eq!(extent, LayerExtent { min: -1.0, max: 7.0 });
        assert!(!extent.is_degenerate());
    }

    #[test]
    fn test_extent_of_nothing_is_nan() {
        let extent = LayerExtent::of(&[f32::NAN, f32::NAN]);
        assert!(extent.min.is_nan() && extent.max.is_nan());
        assert!(extent.is_degenerate());
    }

    #[test]
    fn test_normalize_range_and_order() {
        let mut values = vec![10.0, 15.0, f32::NAN, 20.0, 12.5];
        let extent = LayerExtent::of(&values);
        normalize_in_place(&mut values, extent);

        assert_eq!(values[0], 0.0);
        assert_eq!(values[1], 0.5);
        assert!(values[2].is_nan());
        assert_eq!(values[3], 1.0);
        assert_eq!(values[4], 0.25);
    }

    #[test]
    fn test_constant_layer_normalizes_to_zero() {
        let mut values = vec![4.0, f32::NAN, 4.0];
        let extent = LayerExtent::of(&values);
        normalize_in_place(&mut values, extent);
        assert_eq!(values[0], 0.0);
        assert!(values[1].is_nan());
        assert_eq!(values[2], 0.0);
    }

    #[test]
    fn test_denormalize() {
        let extent = LayerExtent { min: 10.0, max: 30.0 };
        assert_approx_eq!(extent.denormalize(0.25), 15.0, 1e-6);
        assert_eq!(LayerExtent { min: 2.0, max: 2.0 }.denormalize(0.7), 2.0);
    }
}
