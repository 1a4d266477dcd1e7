use crate::types::{LidarError, LidarResult};
use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};

/// Histogram binning parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistogramParams {
    pub bins: usize,
    /// Closed value range covered by the bins
    pub range: (f32, f32),
}

impl Default for HistogramParams {
    fn default() -> Self {
        Self {
            bins: 10,
            // Typical 532 nm attenuated backscatter, km^-1 sr^-1
            range: (0.0, 0.009),
        }
    }
}

/// Value distribution of an extracted raster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    /// `bins + 1` bin edges
    pub edges: Vec<f32>,
    pub counts: Vec<usize>,
    /// Finite values outside the range
    pub outside: usize,
    /// Fill (non-finite) cells
    pub missing: usize,
}

impl Histogram {
    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }
}

/// Histogram builder for remapped rasters
pub struct RasterHistogram {
    params: HistogramParams,
}

impl RasterHistogram {
    pub fn new(params: HistogramParams) -> Self {
        Self { params }
    }

    pub fn standard() -> Self {
        Self::new(HistogramParams::default())
    }

    pub fn compute(&self, raster: ArrayView2<'_, f32>) -> LidarResult<Histogram> {
        let bins = self.params.bins;
        let (low, high) = self.params.range;
        if bins == 0 {
            return Err(LidarError::InvalidInput("histogram needs at least one bin".to_string()));
        }
        if !low.is_finite() || !high.is_finite() || low >= high {
            return Err(LidarError::InvalidInput(format!(
                "histogram range {} to {} is empty",
                low, high
            )));
        }

        let width = (high - low) / bins as f32;
        let edges = (0..=bins).map(|i| low + i as f32 * width).collect();
        let mut counts = vec![0usize; bins];
        let mut outside = 0;
        let mut missing = 0;

        for &value in raster.iter() {
            if !value.is_finite() {
                missing += 1;
            } else if value < low || value > high {
                outside += 1;
            } else {
                // The top edge belongs to the last bin
                let bin = (((value - low) / width) as usize).min(bins - 1);
                counts[bin] += 1;
            }
        }

        log::debug!(
            "Histogram: {} binned, {} outside range, {} missing",
            counts.iter().sum::<usize>(),
            outside,
            missing
        );

        Ok(Histogram {
            edges,
            counts,
            outside,
            missing,
        })
    }
}
