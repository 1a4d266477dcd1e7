use crate::types::{AltitudeLevels, BackscatterGrid, LidarError, LidarResult};
use ndarray::s;
use std::ops::Range;

/// Read access to the profile datasets of a LIDAR product
///
/// Implementations wrap whatever decodes the product file and report decode
/// failures as [`LidarError::DataSource`]. Ranges are half-open profile
/// indices.
pub trait ProfileSource {
    /// Number of profiles (time steps) in the product
    fn profile_count(&self) -> usize;

    /// Raw external timestamps of the profiles in `range`
    fn profile_times(&self, range: Range<usize>) -> LidarResult<Vec<f64>>;

    /// Altitude of every range bin, shared by all profiles
    fn altitudes(&self) -> LidarResult<AltitudeLevels>;

    /// Backscatter rows `range`, one row per profile
    fn backscatter(&self, range: Range<usize>) -> LidarResult<BackscatterGrid>;
}

/// Product whose datasets are already decoded into memory
#[derive(Debug, Clone)]
pub struct InMemoryProduct {
    utc_times: Vec<f64>,
    altitudes: AltitudeLevels,
    backscatter: BackscatterGrid,
}

impl InMemoryProduct {
    pub fn new(
        utc_times: Vec<f64>,
        altitudes: AltitudeLevels,
        backscatter: BackscatterGrid,
    ) -> LidarResult<Self> {
        let (profiles, levels) = backscatter.dim();
        if profiles != utc_times.len() {
            return Err(LidarError::ShapeMismatch(format!(
                "{} profile times but {} backscatter profiles",
                utc_times.len(),
                profiles
            )));
        }
        if levels != altitudes.len() {
            return Err(LidarError::ShapeMismatch(format!(
                "{} altitude levels but backscatter has {} levels",
                altitudes.len(),
                levels
            )));
        }

        log::debug!("In-memory product: {} profiles x {} levels", profiles, levels);

        Ok(Self {
            utc_times,
            altitudes,
            backscatter,
        })
    }

    fn check_range(&self, range: &Range<usize>) -> LidarResult<()> {
        if range.start >= range.end || range.end > self.utc_times.len() {
            return Err(LidarError::InvalidRange {
                lo: range.start,
                hi: range.end,
            });
        }
        Ok(())
    }
}

impl ProfileSource for InMemoryProduct {
    fn profile_count(&self) -> usize {
        self.utc_times.len()
    }

    fn profile_times(&self, range: Range<usize>) -> LidarResult<Vec<f64>> {
        self.check_range(&range)?;
        Ok(self.utc_times[range].to_vec())
    }

    fn altitudes(&self) -> LidarResult<AltitudeLevels> {
        Ok(self.altitudes.clone())
    }

    fn backscatter(&self, range: Range<usize>) -> LidarResult<BackscatterGrid> {
        self.check_range(&range)?;
        Ok(self.backscatter.slice(s![range, ..]).to_owned())
    }
}
