use chrono::{DateTime, Utc};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Single-precision backscatter intensity, the product's native precision
pub type Backscatter = f32;

/// 2D backscatter array (time x altitude level)
pub type BackscatterGrid = Array2<Backscatter>;

/// Altitude of each range bin in km, shared by every profile
pub type AltitudeLevels = Array1<f32>;

/// Resampled image (output time bin x output altitude bin)
pub type OutputRaster = Array2<f32>;

/// Fill value written by the product for missing or invalid samples
pub const SENTINEL: Backscatter = -9999.0;

/// Canonical number of altitude bins in an extracted subplot
pub const DEFAULT_ALTITUDE_BINS: usize = 500;

/// Default tolerance, in plot-time days, when matching region bounds to profiles.
/// Smaller than the profile spacing so that a match is always the nearest profile.
pub const TIME_TOLERANCE_DAYS: f64 = 1e-6;

/// Corner coordinate of a selection region: (plot time, altitude km)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegionVertex {
    pub time: f64,
    pub altitude: f32,
}

/// Min/max of a selection region along both axes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegionBounds {
    pub min_time: f64,
    pub max_time: f64,
    pub min_altitude: f32,
    pub max_altitude: f32,
}

/// Closed shape drawn on the backscatter plot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionRegion {
    pub tag: String,
    pub vertices: Vec<RegionVertex>,
}

impl SelectionRegion {
    pub fn new(tag: impl Into<String>, vertices: Vec<RegionVertex>) -> Self {
        Self {
            tag: tag.into(),
            vertices,
        }
    }

    /// Build a region from (time, altitude) pairs
    pub fn from_coordinates(tag: impl Into<String>, coords: &[(f64, f32)]) -> Self {
        let vertices = coords
            .iter()
            .map(|&(time, altitude)| RegionVertex { time, altitude })
            .collect();
        Self::new(tag, vertices)
    }

    /// Bounding box over all vertices
    pub fn bounds(&self) -> LidarResult<RegionBounds> {
        if self.vertices.is_empty() {
            return Err(LidarError::InvalidInput(format!(
                "selection region '{}' has no vertices",
                self.tag
            )));
        }

        let mut bounds = RegionBounds {
            min_time: f64::INFINITY,
            max_time: f64::NEG_INFINITY,
            min_altitude: f32::INFINITY,
            max_altitude: f32::NEG_INFINITY,
        };

        for vertex in &self.vertices {
            bounds.min_time = bounds.min_time.min(vertex.time);
            bounds.max_time = bounds.max_time.max(vertex.time);
            bounds.min_altitude = bounds.min_altitude.min(vertex.altitude);
            bounds.max_altitude = bounds.max_altitude.max(vertex.altitude);
        }

        if !bounds.min_time.is_finite() || !bounds.min_altitude.is_finite() {
            return Err(LidarError::InvalidInput(format!(
                "selection region '{}' has non-finite coordinates",
                self.tag
            )));
        }

        Ok(bounds)
    }
}

/// Real-world placement of a raster: plot-time range and altitude range
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub start_time: f64,
    pub end_time: f64,
    pub min_altitude: f32,
    pub max_altitude: f32,
}

impl Extent {
    pub fn start_datetime(&self) -> LidarResult<DateTime<Utc>> {
        crate::io::time::plot_time_to_datetime(self.start_time)
    }

    pub fn end_datetime(&self) -> LidarResult<DateTime<Utc>> {
        crate::io::time::plot_time_to_datetime(self.end_time)
    }
}

/// Extraction result handed to the renderer
#[derive(Debug, Clone)]
pub struct Subplot {
    pub tag: String,
    pub raster: OutputRaster,
    pub extent: Extent,
    /// Resolved profile range, absolute within the product (half-open)
    pub profile_range: (usize, usize),
}

/// Error types for region extraction and remapping
#[derive(Debug, thiserror::Error)]
pub enum LidarError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Selection too small to extract data: profiles {lo}..{hi}")]
    DegenerateSelection { lo: usize, hi: usize },

    #[error("Invalid index range: {lo}..{hi}")]
    InvalidRange { lo: usize, hi: usize },

    #[error("Invalid altitude range: {bottom} to {top} km")]
    InvalidAltitudeRange { bottom: f32, top: f32 },

    #[error("Invalid dimensions: {0}")]
    InvalidDimensions(String),

    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("Invalid time value: {0}")]
    InvalidTime(String),

    #[error("Remapping cancelled")]
    Cancelled,

    #[error("Data source error: {0}")]
    DataSource(String),
}

impl LidarError {
    /// True when the user-drawn region was too small, which callers report
    /// as a message instead of a failure
    pub fn is_degenerate_selection(&self) -> bool {
        matches!(self, LidarError::DegenerateSelection { .. })
    }
}

/// Result type for extraction operations
pub type LidarResult<T> = Result<T, LidarError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_bounds() {
        let region = SelectionRegion::from_coordinates(
            "cloud",
            &[(100.5, 2.0), (100.7, 2.0), (100.7, 8.5), (100.5, 8.5)],
        );
        let bounds = region.bounds().unwrap();

        assert_eq!(bounds.min_time, 100.5);
        assert_eq!(bounds.max_time, 100.7);
        assert_eq!(bounds.min_altitude, 2.0);
        assert_eq!(bounds.max_altitude, 8.5);
    }

    #[test]
    fn test_empty_region_rejected() {
        let region = SelectionRegion::new("empty", Vec::new());
        assert!(matches!(region.bounds(), Err(LidarError::InvalidInput(_))));
    }

    #[test]
    fn test_degenerate_selection_helper() {
        let err = LidarError::DegenerateSelection { lo: 50, hi: 51 };
        assert!(err.is_degenerate_selection());
        assert!(!LidarError::InvalidRange { lo: 50, hi: 51 }.is_degenerate_selection());
    }
}
