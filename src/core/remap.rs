use crate::core::axes::{bracket_level, level_cell, AltitudeOrder, SourceAxes, TargetGrid};
use crate::core::mask::MaskedGrid;
use crate::types::{LidarError, LidarResult, OutputRaster};
use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};

/// Resampling scheme used for each output cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemapMethod {
    /// Linear in time between bracketing profiles, linear in altitude
    /// within each profile
    Bilinear,
    /// Nearest profile in time; altitude cells averaged into the output bins
    /// they overlap, weighted by overlap length
    BinAverage,
}

/// Remapping parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemapParams {
    pub method: RemapMethod,
    /// Written where no valid source sample contributes
    pub fill_value: f32,
    pub altitude_order: AltitudeOrder,
}

impl Default for RemapParams {
    fn default() -> Self {
        Self {
            method: RemapMethod::Bilinear,
            fill_value: f32::NAN,
            altitude_order: AltitudeOrder::TopDown,
        }
    }
}

/// Resamples masked backscatter onto a uniform time/altitude raster
pub struct GridRemapper {
    params: RemapParams,
}

impl GridRemapper {
    /// Create a new remapper
    pub fn new(params: RemapParams) -> Self {
        Self { params }
    }

    /// Bilinear remapper with NaN fill and top-down altitude
    pub fn standard() -> Self {
        Self::new(RemapParams::default())
    }

    pub fn params(&self) -> &RemapParams {
        &self.params
    }

    /// Remap rows `lo..hi` of a product onto a `time_bins x altitude_bins` raster
    ///
    /// # Arguments
    /// * `source` - masked backscatter, one row per profile in `lo..hi`
    /// * `levels` - altitude of each source level, shared by all profiles
    /// * `time_range` - absolute profile indices `(lo, hi)`, half-open
    /// * `altitude_range` - `(bottom, top)` in the units of `levels`
    ///
    /// # Returns
    /// * Dense raster, cells without valid data set to the fill value
    pub fn remap(
        &self,
        source: &MaskedGrid,
        levels: ArrayView1<'_, f32>,
        time_range: (usize, usize),
        altitude_range: (f32, f32),
        time_bins: usize,
        altitude_bins: usize,
    ) -> LidarResult<OutputRaster> {
        self.remap_with(source, levels, time_range, altitude_range, time_bins, altitude_bins, None)
    }

    /// [`remap`](Self::remap) that stops when `cancel` is raised
    ///
    /// The flag is checked once per output time column.
    #[allow(clippy::too_many_arguments)]
    pub fn remap_cancellable(
        &self,
        source: &MaskedGrid,
        levels: ArrayView1<'_, f32>,
        time_range: (usize, usize),
        altitude_range: (f32, f32),
        time_bins: usize,
        altitude_bins: usize,
        cancel: &AtomicBool,
    ) -> LidarResult<OutputRaster> {
        self.remap_with(
            source,
            levels,
            time_range,
            altitude_range,
            time_bins,
            altitude_bins,
            Some(cancel),
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn remap_with(
        &self,
        source: &MaskedGrid,
        levels: ArrayView1<'_, f32>,
        time_range: (usize, usize),
        altitude_range: (f32, f32),
        time_bins: usize,
        altitude_bins: usize,
        cancel: Option<&AtomicBool>,
    ) -> LidarResult<OutputRaster> {
        let (lo, hi) = time_range;
        // Interpolating across time needs at least two profiles
        if hi <= lo + 1 {
            return Err(LidarError::InvalidRange { lo, hi });
        }
        if time_bins == 0 || altitude_bins == 0 {
            return Err(LidarError::InvalidDimensions(format!(
                "output raster {} x {} is empty",
                time_bins, altitude_bins
            )));
        }
        if source.dim() != (hi - lo, levels.len()) {
            return Err(LidarError::ShapeMismatch(format!(
                "source grid is {:?}, expected ({}, {})",
                source.dim(),
                hi - lo,
                levels.len()
            )));
        }

        let axes = SourceAxes::for_index_range(lo, hi, levels)?;
        let target = TargetGrid::new(
            time_range,
            altitude_range,
            time_bins,
            altitude_bins,
            self.params.altitude_order,
        )?;

        self.resample_with(source, &axes, &target, cancel)
    }

    /// Pure resampling of a masked grid from `axes` onto `target`
    pub fn resample(
        &self,
        source: &MaskedGrid,
        axes: &SourceAxes,
        target: &TargetGrid,
    ) -> LidarResult<OutputRaster> {
        self.resample_with(source, axes, target, None)
    }

    fn resample_with(
        &self,
        source: &MaskedGrid,
        axes: &SourceAxes,
        target: &TargetGrid,
        cancel: Option<&AtomicBool>,
    ) -> LidarResult<OutputRaster> {
        if source.dim() != (axes.rows(), axes.levels()) {
            return Err(LidarError::ShapeMismatch(format!(
                "source grid is {:?} but axes describe ({}, {})",
                source.dim(),
                axes.rows(),
                axes.levels()
            )));
        }

        let (time_bins, altitude_bins) = target.shape();
        log::info!(
            "Remapping {} x {} source onto {} x {} raster ({:?})",
            axes.rows(),
            axes.levels(),
            time_bins,
            altitude_bins,
            self.params.method
        );
        log::debug!(
            "Target time {} to {}, altitude {} to {}",
            target.time.start(),
            target.time.end(),
            target.altitude.start(),
            target.altitude.end()
        );

        #[cfg(feature = "parallel")]
        let columns = self.resample_columns_parallel(source, axes, target, cancel);
        #[cfg(not(feature = "parallel"))]
        let columns = self.resample_columns(source, axes, target, cancel);

        let columns = columns.ok_or(LidarError::Cancelled)?;

        let mut raster = Array2::<f32>::zeros((time_bins, altitude_bins));
        for (i, column) in columns.iter().enumerate() {
            raster.row_mut(i).assign(column);
        }

        log::debug!(
            "Remap produced {} filled cells out of {}",
            raster.iter().filter(|v| v.is_finite()).count(),
            raster.len()
        );

        Ok(raster)
    }

    #[cfg(not(feature = "parallel"))]
    fn resample_columns(
        &self,
        source: &MaskedGrid,
        axes: &SourceAxes,
        target: &TargetGrid,
        cancel: Option<&AtomicBool>,
    ) -> Option<Vec<Array1<f32>>> {
        (0..target.time.bins())
            .map(|i| self.resample_column(i, source, axes, target, cancel))
            .collect()
    }

    /// Parallel column resampling using Rayon
    #[cfg(feature = "parallel")]
    fn resample_columns_parallel(
        &self,
        source: &MaskedGrid,
        axes: &SourceAxes,
        target: &TargetGrid,
        cancel: Option<&AtomicBool>,
    ) -> Option<Vec<Array1<f32>>> {
        use rayon::prelude::*;

        (0..target.time.bins())
            .into_par_iter()
            .map(|i| self.resample_column(i, source, axes, target, cancel))
            .collect()
    }

    /// One output time column; `None` once cancellation is requested
    fn resample_column(
        &self,
        i: usize,
        source: &MaskedGrid,
        axes: &SourceAxes,
        target: &TargetGrid,
        cancel: Option<&AtomicBool>,
    ) -> Option<Array1<f32>> {
        if cancel.map_or(false, |flag| flag.load(Ordering::Relaxed)) {
            return None;
        }

        let x = target.time.coordinate(i);
        let column = match self.params.method {
            RemapMethod::Bilinear => self.bilinear_column(x, source, axes, target),
            RemapMethod::BinAverage => self.bin_average_column(x, source, axes, target),
        };
        Some(column)
    }

    fn bilinear_column(
        &self,
        x: f32,
        source: &MaskedGrid,
        axes: &SourceAxes,
        target: &TargetGrid,
    ) -> Array1<f32> {
        let (k0, k1, wx) = axes.bracket_time(x);
        let profiles = [(k0, 1.0 - wx), (k1, wx)];

        // Time bins sit on profile indices; altitude is sampled mid-bin
        Array1::from_iter((0..target.altitude.bins()).map(|j| {
            let z = target.altitude.center(j);
            let mut sum = 0.0f32;
            let mut weight = 0.0f32;

            for &(k, wk) in &profiles {
                if wk <= 0.0 {
                    continue;
                }
                let Some((m0, m1, wz)) = bracket_level(axes.profile(k), z) else {
                    continue;
                };
                for (m, wm) in [(m0, 1.0 - wz), (m1, wz)] {
                    if wm <= 0.0 {
                        continue;
                    }
                    // Masked samples drop out; the remaining weights are renormalized
                    if let Some(value) = source.get(k, m) {
                        sum += wk * wm * value;
                        weight += wk * wm;
                    }
                }
            }

            if weight > 0.0 {
                sum / weight
            } else {
                self.params.fill_value
            }
        }))
    }

    fn bin_average_column(
        &self,
        x: f32,
        source: &MaskedGrid,
        axes: &SourceAxes,
        target: &TargetGrid,
    ) -> Array1<f32> {
        let k = axes.nearest_time(x);
        let profile = axes.profile(k);
        let axis = &target.altitude;
        let bins = axis.bins();
        let (axis_min, axis_max) = axis.bounds();

        let mut sums = vec![0.0f32; bins];
        let mut weights = vec![0.0f32; bins];

        for m in 0..profile.len() {
            let Some(value) = source.get(k, m) else {
                continue;
            };

            let (cell_lo, cell_hi) = level_cell(profile, m);
            let lo = cell_lo.max(axis_min);
            let hi = cell_hi.min(axis_max);
            if hi <= lo {
                continue;
            }

            let a = axis.fractional_index(lo);
            let b = axis.fractional_index(hi);
            let f0 = a.min(b).max(0.0);
            let f1 = a.max(b).min(bins as f32);
            if f1 <= f0 {
                continue;
            }

            let first = f0.floor() as usize;
            let last = (f1.ceil() as usize).min(bins);
            for j in first..last {
                let overlap = f1.min((j + 1) as f32) - f0.max(j as f32);
                if overlap > 0.0 {
                    sums[j] += overlap * value;
                    weights[j] += overlap;
                }
            }
        }

        sums.iter()
            .zip(&weights)
            .map(|(&sum, &weight)| {
                if weight > 0.0 {
                    sum / weight
                } else {
                    self.params.fill_value
                }
            })
            .collect()
    }
}

/// Remap with the standard parameters
pub fn remap(
    source: &MaskedGrid,
    levels: ArrayView1<'_, f32>,
    time_range: (usize, usize),
    altitude_range: (f32, f32),
    time_bins: usize,
    altitude_bins: usize,
) -> LidarResult<OutputRaster> {
    GridRemapper::standard().remap(
        source,
        levels,
        time_range,
        altitude_range,
        time_bins,
        altitude_bins,
    )
}
