use crate::core::mask::MaskedGrid;
use crate::core::remap::{GridRemapper, RemapParams};
use crate::core::search::{is_non_decreasing, BoundedSearch, Tolerance};
use crate::io::product::ProfileSource;
use crate::io::time::{convert_series, CalipsoTimeConverter, PlotTimeConverter};
use crate::types::{
    Extent, LidarError, LidarResult, RegionBounds, SelectionRegion, Subplot,
    DEFAULT_ALTITUDE_BINS, SENTINEL, TIME_TOLERANCE_DAYS,
};
use serde::{Deserialize, Serialize};
use std::ops::Range;
use std::sync::atomic::AtomicBool;

/// Parameters for extracting a region subplot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionParams {
    /// Altitude bins in the output raster
    pub altitude_bins: usize,
    /// Accept a profile this close (plot-time days) to a region bound
    pub time_tolerance: f64,
    /// Product fill value marking missing backscatter
    pub sentinel: f32,
    pub remap: RemapParams,
}

impl Default for ExtractionParams {
    fn default() -> Self {
        Self {
            altitude_bins: DEFAULT_ALTITUDE_BINS,
            time_tolerance: TIME_TOLERANCE_DAYS,
            sentinel: SENTINEL,
            remap: RemapParams::default(),
        }
    }
}

/// Extracts the backscatter bounded by a selection region
///
/// Region time bounds are resolved to profile indices with an interpolation
/// search, then the profiles in between are remapped onto a raster with one
/// time bin per profile and a fixed number of altitude bins.
pub struct SubplotExtractor<C = CalipsoTimeConverter> {
    params: ExtractionParams,
    converter: C,
}

impl SubplotExtractor<CalipsoTimeConverter> {
    /// Extractor for CALIPSO products with the canonical parameters
    pub fn standard() -> Self {
        Self::new(ExtractionParams::default(), CalipsoTimeConverter)
    }
}

impl<C: PlotTimeConverter> SubplotExtractor<C> {
    pub fn new(params: ExtractionParams, converter: C) -> Self {
        Self { params, converter }
    }

    pub fn params(&self) -> &ExtractionParams {
        &self.params
    }

    /// Profile indices `(lo, hi)` covering the region's time bounds
    ///
    /// Fails with `DegenerateSelection` when the bounds resolve to one or two
    /// adjacent profiles.
    pub fn resolve_profile_range(
        &self,
        plot_times: &[f64],
        bounds: &RegionBounds,
    ) -> LidarResult<(usize, usize)> {
        if !is_non_decreasing(plot_times) {
            log::warn!("Profile times are not monotonic; resolved bounds may be inexact");
        }

        let search = BoundedSearch::new(Tolerance::within(self.params.time_tolerance)?);
        let first = search.search(plot_times, bounds.min_time)?;
        let second = search.search(plot_times, bounds.max_time)?;
        let (lo, hi) = (first.min(second), first.max(second));

        if hi - lo <= 1 {
            log::error!("Shape too small to extract data (profiles {}..{})", lo, hi);
            return Err(LidarError::DegenerateSelection { lo, hi });
        }

        log::debug!("Region bounds resolved to profiles {}..{}", lo, hi);
        Ok((lo, hi))
    }

    /// Extract the subplot for `region`
    ///
    /// # Arguments
    /// * `source` - product to read profiles from
    /// * `region` - shape drawn on the plot, in plot-time and altitude
    /// * `window` - profiles currently shown on the plot; the search runs
    ///   over this window only
    pub fn extract<S: ProfileSource + ?Sized>(
        &self,
        source: &S,
        region: &SelectionRegion,
        window: Range<usize>,
    ) -> LidarResult<Subplot> {
        self.extract_with(source, region, window, None)
    }

    /// [`extract`](Self::extract) whose remapping stops when `cancel` is raised
    pub fn extract_cancellable<S: ProfileSource + ?Sized>(
        &self,
        source: &S,
        region: &SelectionRegion,
        window: Range<usize>,
        cancel: &AtomicBool,
    ) -> LidarResult<Subplot> {
        self.extract_with(source, region, window, Some(cancel))
    }

    fn extract_with<S: ProfileSource + ?Sized>(
        &self,
        source: &S,
        region: &SelectionRegion,
        window: Range<usize>,
        cancel: Option<&AtomicBool>,
    ) -> LidarResult<Subplot> {
        log::info!("Reading shape data for '{}'", region.tag);

        let bounds = region.bounds()?;
        let raw_times = source.profile_times(window.clone())?;
        let plot_times = convert_series(&self.converter, &raw_times)?;

        log::info!("Applying search algorithm to determine shape bounds");
        let (lo, hi) = self
            .resolve_profile_range(&plot_times, &bounds)
            .map_err(|err| match err {
                LidarError::DegenerateSelection { lo, hi } => LidarError::DegenerateSelection {
                    lo: window.start + lo,
                    hi: window.start + hi,
                },
                other => other,
            })?;
        let profiles = (window.start + lo, window.start + hi);

        log::info!("Setting bounds for new subplot: profiles {}..{}", profiles.0, profiles.1);
        let levels = source.altitudes()?;
        let data = source.backscatter(profiles.0..profiles.1)?;
        let grid = MaskedGrid::from_sentinel(data, self.params.sentinel);

        let remapper = GridRemapper::new(self.params.remap.clone());
        let altitude_range = (bounds.min_altitude, bounds.max_altitude);
        let raster = match cancel {
            Some(flag) => remapper.remap_cancellable(
                &grid,
                levels.view(),
                profiles,
                altitude_range,
                hi - lo,
                self.params.altitude_bins,
                flag,
            )?,
            None => remapper.remap(
                &grid,
                levels.view(),
                profiles,
                altitude_range,
                hi - lo,
                self.params.altitude_bins,
            )?,
        };

        let extent = Extent {
            start_time: plot_times[lo],
            end_time: plot_times[hi - 1],
            min_altitude: bounds.min_altitude,
            max_altitude: bounds.max_altitude,
        };

        log::info!(
            "Extracted {} x {} raster for '{}'",
            raster.nrows(),
            raster.ncols(),
            region.tag
        );

        Ok(Subplot {
            tag: region.tag.clone(),
            raster,
            extent,
            profile_range: profiles,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> SubplotExtractor<fn(f64) -> LidarResult<f64>> {
        fn identity(raw: f64) -> LidarResult<f64> {
            Ok(raw)
        }
        let converter: fn(f64) -> LidarResult<f64> = identity;
        SubplotExtractor::new(ExtractionParams::default(), converter)
    }

    fn bounds(min_time: f64, max_time: f64) -> RegionBounds {
        RegionBounds {
            min_time,
            max_time,
            min_altitude: 0.0,
            max_altitude: 10.0,
        }
    }

    #[test]
    fn test_resolve_profile_range() {
        let times: Vec<f64> = (0..100).map(|i| i as f64).collect();
        let range = extractor().resolve_profile_range(&times, &bounds(10.2, 39.7)).unwrap();
        assert_eq!(range, (10, 40));
    }

    #[test]
    fn test_reversed_bounds_are_ordered() {
        let times: Vec<f64> = (0..100).map(|i| i as f64).collect();
        let range = extractor().resolve_profile_range(&times, &bounds(70.0, 20.0)).unwrap();
        assert_eq!(range, (20, 70));
    }

    #[test]
    fn test_adjacent_profiles_are_degenerate() {
        let times: Vec<f64> = (0..100).map(|i| i as f64).collect();
        let result = extractor().resolve_profile_range(&times, &bounds(50.0, 51.0));
        assert!(matches!(result, Err(LidarError::DegenerateSelection { lo: 50, hi: 51 })));

        let result = extractor().resolve_profile_range(&times, &bounds(42.1, 42.3));
        assert!(matches!(result, Err(LidarError::DegenerateSelection { lo: 42, hi: 42 })));
    }

    #[test]
    fn test_invalid_tolerance_surfaces() {
        let params = ExtractionParams {
            time_tolerance: -1.0,
            ..ExtractionParams::default()
        };
        let extractor = SubplotExtractor::new(params, CalipsoTimeConverter);
        let result = extractor.resolve_profile_range(&[0.0, 1.0, 2.0], &bounds(0.0, 2.0));
        assert!(matches!(result, Err(LidarError::InvalidInput(_))));
    }
}
