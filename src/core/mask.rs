use crate::types::{Backscatter, LidarError, LidarResult};
use ndarray::{Array2, ArrayView2};

/// Backscatter values paired with an explicit validity mask
///
/// The mask is decided once, when the grid is built, so no later stage
/// compares against the sentinel again.
#[derive(Debug, Clone, PartialEq)]
pub struct MaskedGrid {
    data: Array2<Backscatter>,
    valid: Array2<bool>,
}

impl MaskedGrid {
    /// Mask every cell equal to `sentinel` or not finite
    pub fn from_sentinel(data: Array2<Backscatter>, sentinel: Backscatter) -> Self {
        let valid = data.mapv(|value| value.is_finite() && value != sentinel);
        let grid = Self { data, valid };
        log::debug!(
            "Masked {} of {} cells (sentinel {})",
            grid.valid.len() - grid.valid_count(),
            grid.valid.len(),
            sentinel
        );
        grid
    }

    /// Pair values with a mask computed elsewhere
    pub fn from_parts(data: Array2<Backscatter>, valid: Array2<bool>) -> LidarResult<Self> {
        if data.dim() != valid.dim() {
            return Err(LidarError::ShapeMismatch(format!(
                "data is {:?} but mask is {:?}",
                data.dim(),
                valid.dim()
            )));
        }
        Ok(Self { data, valid })
    }

    pub fn dim(&self) -> (usize, usize) {
        self.data.dim()
    }

    pub fn data(&self) -> ArrayView2<'_, Backscatter> {
        self.data.view()
    }

    pub fn mask(&self) -> ArrayView2<'_, bool> {
        self.valid.view()
    }

    /// Value at (time, level), `None` when masked or out of bounds
    pub fn get(&self, time: usize, level: usize) -> Option<Backscatter> {
        match self.valid.get((time, level)) {
            Some(true) => self.data.get((time, level)).copied(),
            _ => None,
        }
    }

    pub fn valid_count(&self) -> usize {
        self.valid.iter().filter(|&&ok| ok).count()
    }
}
