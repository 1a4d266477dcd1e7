//! Coordinate axes for the source and target grids
//!
//! Building axes is the first phase of remapping; the second phase
//! (`remap::GridRemapper::resample`) only reads them.

use crate::types::{LidarError, LidarResult};
use ndarray::{Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};

/// Evenly spaced half-open axis: coordinate `i` is `start + i * (end - start) / count`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UniformAxis {
    start: f32,
    end: f32,
    count: usize,
}

impl UniformAxis {
    /// The axis may run in either direction, but must not be empty or flat
    pub fn new(start: f32, end: f32, count: usize) -> LidarResult<Self> {
        if count == 0 {
            return Err(LidarError::InvalidDimensions(
                "uniform axis needs at least one bin".to_string(),
            ));
        }
        if !start.is_finite() || !end.is_finite() || start == end {
            return Err(LidarError::InvalidInput(format!(
                "uniform axis bounds {} to {} are not a usable interval",
                start, end
            )));
        }
        Ok(Self { start, end, count })
    }

    pub fn start(&self) -> f32 {
        self.start
    }

    pub fn end(&self) -> f32 {
        self.end
    }

    /// Number of bins
    pub fn bins(&self) -> usize {
        self.count
    }

    /// Signed distance between consecutive coordinates
    pub fn step(&self) -> f32 {
        (self.end - self.start) / self.count as f32
    }

    /// Leading edge of bin `index`
    pub fn coordinate(&self, index: usize) -> f32 {
        self.start + index as f32 * self.step()
    }

    /// Midpoint of bin `index`
    pub fn center(&self, index: usize) -> f32 {
        self.start + (index as f32 + 0.5) * self.step()
    }

    /// Continuous bin position of `value` (bin `i` spans `[i, i + 1)`)
    pub fn fractional_index(&self, value: f32) -> f32 {
        (value - self.start) / self.step()
    }

    /// (min, max) of the interval regardless of direction
    pub fn bounds(&self) -> (f32, f32) {
        (self.start.min(self.end), self.start.max(self.end))
    }
}

/// Direction of the altitude axis in the output raster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AltitudeOrder {
    /// First bin at the top of the range, as image rows are drawn
    TopDown,
    /// First bin at the bottom of the range
    BottomUp,
}

impl Default for AltitudeOrder {
    fn default() -> Self {
        AltitudeOrder::TopDown
    }
}

/// Coordinates of every source sample
///
/// `time[k]` is the time-index coordinate of row `k`; `altitude[[k, m]]` is
/// the altitude of level `m` in that row. Each row carries its own profile so
/// the remapper never assumes one uniform altitude grid.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceAxes {
    time: Vec<f32>,
    altitude: Array2<f32>,
}

impl SourceAxes {
    pub fn new(time: Vec<f32>, altitude: Array2<f32>) -> LidarResult<Self> {
        if time.is_empty() {
            return Err(LidarError::InvalidDimensions(
                "source time axis is empty".to_string(),
            ));
        }
        if altitude.nrows() != time.len() {
            return Err(LidarError::ShapeMismatch(format!(
                "{} time coordinates but {} altitude profiles",
                time.len(),
                altitude.nrows()
            )));
        }
        if altitude.ncols() == 0 {
            return Err(LidarError::InvalidDimensions(
                "source altitude axis has no levels".to_string(),
            ));
        }
        if time.windows(2).any(|pair| !(pair[1] > pair[0])) {
            return Err(LidarError::InvalidInput(
                "source time coordinates must be strictly increasing".to_string(),
            ));
        }
        Ok(Self { time, altitude })
    }

    /// Repeat one shared altitude profile for every time coordinate
    pub fn broadcast(time: Vec<f32>, levels: ArrayView1<'_, f32>) -> LidarResult<Self> {
        let altitude = levels
            .insert_axis(Axis(0))
            .broadcast((time.len(), levels.len()))
            .map(|view| view.to_owned())
            .ok_or_else(|| {
                LidarError::ShapeMismatch("cannot broadcast altitude levels".to_string())
            })?;
        Self::new(time, altitude)
    }

    /// Rows `lo..hi` of a product, all sharing `levels`
    pub fn for_index_range(lo: usize, hi: usize, levels: ArrayView1<'_, f32>) -> LidarResult<Self> {
        if hi <= lo {
            return Err(LidarError::InvalidRange { lo, hi });
        }
        let time = (lo..hi).map(|k| k as f32).collect();
        Self::broadcast(time, levels)
    }

    pub fn time(&self) -> &[f32] {
        &self.time
    }

    pub fn rows(&self) -> usize {
        self.time.len()
    }

    pub fn levels(&self) -> usize {
        self.altitude.ncols()
    }

    pub fn profile(&self, row: usize) -> ArrayView1<'_, f32> {
        self.altitude.row(row)
    }

    /// Rows bracketing time coordinate `x` and the weight of the second row.
    ///
    /// Coordinates outside the axis clamp to the edge row.
    pub fn bracket_time(&self, x: f32) -> (usize, usize, f32) {
        let n = self.time.len();
        let last = n - 1;
        if !x.is_finite() || x <= self.time[0] {
            return (0, 0, 0.0);
        }
        if x >= self.time[last] {
            return (last, last, 0.0);
        }

        let upper = self.time.partition_point(|&t| t <= x).clamp(1, last);
        let lower = upper - 1;
        let weight = (x - self.time[lower]) / (self.time[upper] - self.time[lower]);
        (lower, upper, weight.clamp(0.0, 1.0))
    }

    /// Row whose time coordinate is closest to `x`
    pub fn nearest_time(&self, x: f32) -> usize {
        let (lower, upper, weight) = self.bracket_time(x);
        if weight > 0.5 {
            upper
        } else {
            lower
        }
    }
}

/// Levels of a monotonic profile bracketing `z`, with the weight of the second.
///
/// Works for ascending and descending profiles. `None` when `z` lies outside
/// the profile.
pub fn bracket_level(levels: ArrayView1<'_, f32>, z: f32) -> Option<(usize, usize, f32)> {
    let n = levels.len();
    if n == 0 || !z.is_finite() {
        return None;
    }
    if n == 1 {
        return if levels[0] == z { Some((0, 0, 0.0)) } else { None };
    }

    let ascending = levels[n - 1] >= levels[0];
    let (bottom, top) = if ascending {
        (levels[0], levels[n - 1])
    } else {
        (levels[n - 1], levels[0])
    };
    if z < bottom || z > top {
        return None;
    }

    // Invariant: z lies between levels[a] and levels[b]
    let (mut a, mut b) = (0usize, n - 1);
    while b - a > 1 {
        let mid = a + (b - a) / 2;
        let past = if ascending { levels[mid] > z } else { levels[mid] < z };
        if past {
            b = mid;
        } else {
            a = mid;
        }
    }

    let span = levels[b] - levels[a];
    let weight = if span == 0.0 {
        0.0
    } else {
        ((z - levels[a]) / span).clamp(0.0, 1.0)
    };
    Some((a, b, weight))
}

/// Altitude interval represented by level `m`: halfway to each neighbor,
/// mirrored at the ends of the profile. Returned as (min, max).
pub fn level_cell(levels: ArrayView1<'_, f32>, m: usize) -> (f32, f32) {
    let n = levels.len();
    let z = levels[m];
    if n < 2 {
        return (z, z);
    }

    let before = if m > 0 {
        0.5 * (levels[m - 1] - z)
    } else {
        -0.5 * (levels[1] - z)
    };
    let after = if m + 1 < n {
        0.5 * (levels[m + 1] - z)
    } else {
        -0.5 * (levels[m - 1] - z)
    };

    let (a, b) = (z + before, z + after);
    (a.min(b), a.max(b))
}

/// Output grid: time-index axis and altitude axis
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetGrid {
    pub time: UniformAxis,
    pub altitude: UniformAxis,
}

impl TargetGrid {
    /// Uniform grid over `lo..hi` and `[bottom, top]`
    pub fn new(
        time_range: (usize, usize),
        altitude_range: (f32, f32),
        time_bins: usize,
        altitude_bins: usize,
        order: AltitudeOrder,
    ) -> LidarResult<Self> {
        let (lo, hi) = time_range;
        if hi <= lo {
            return Err(LidarError::InvalidRange { lo, hi });
        }
        let (bottom, top) = altitude_range;
        if !bottom.is_finite() || !top.is_finite() || bottom >= top {
            return Err(LidarError::InvalidAltitudeRange { bottom, top });
        }

        let time = UniformAxis::new(lo as f32, hi as f32, time_bins)?;
        let altitude = match order {
            AltitudeOrder::TopDown => UniformAxis::new(top, bottom, altitude_bins)?,
            AltitudeOrder::BottomUp => UniformAxis::new(bottom, top, altitude_bins)?,
        };
        Ok(Self { time, altitude })
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.time.bins(), self.altitude.bins())
    }
}
