//! Interpolation search over monotonic time series
//!
//! The probe position is estimated from where the target falls between the
//! window's end values instead of the window midpoint. On near-uniformly
//! spaced data (CALIPSO profiles are ~1/3 s apart) this converges in
//! O(log log n) probes on average. Highly non-uniform spacing degrades toward
//! O(n); that is the expected worst case of the method.
//!
//! The series must be monotonic non-decreasing. Non-monotonic input does not
//! panic but the returned index is not guaranteed to be the nearest one.

use crate::types::{LidarError, LidarResult};
use num_traits::Float;
use serde::{Deserialize, Serialize};

/// How close a probed value must be to the target to stop early
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Tolerance<T> {
    /// Accept the first probe within this distance of the target
    Within(T),
    /// Keep narrowing until the nearest index is known
    Nearest,
}

impl<T: Float> Tolerance<T> {
    /// Validated tolerance; negative or non-finite widths are rejected
    pub fn within(width: T) -> LidarResult<Self> {
        if !width.is_finite() || width < T::zero() {
            return Err(LidarError::InvalidInput(
                "search tolerance must be finite and non-negative".to_string(),
            ));
        }
        Ok(Tolerance::Within(width))
    }

    fn accepts(&self, distance: T) -> bool {
        match *self {
            Tolerance::Within(width) => distance <= width,
            Tolerance::Nearest => distance == T::zero(),
        }
    }
}

/// Index found by a search and the number of probes it took
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOutcome {
    pub index: usize,
    pub probes: usize,
}

/// Nearest-index search with a tolerance
#[derive(Debug, Clone, Copy)]
pub struct BoundedSearch<T> {
    tolerance: Tolerance<T>,
}

impl<T: Float> BoundedSearch<T> {
    pub fn new(tolerance: Tolerance<T>) -> Self {
        Self { tolerance }
    }

    /// Search that always resolves to the nearest index
    pub fn nearest() -> Self {
        Self::new(Tolerance::Nearest)
    }

    pub fn tolerance(&self) -> Tolerance<T> {
        self.tolerance
    }

    /// Index of the value closest to `target`
    pub fn search(&self, series: &[T], target: T) -> LidarResult<usize> {
        self.search_with_stats(series, target).map(|outcome| outcome.index)
    }

    /// Same as [`search`](Self::search), also reporting the probe count
    pub fn search_with_stats(&self, series: &[T], target: T) -> LidarResult<SearchOutcome> {
        let n = series.len();
        if n == 0 {
            return Err(LidarError::InvalidInput(
                "cannot search an empty series".to_string(),
            ));
        }

        if target.is_nan() {
            log::warn!("NaN search target, resolving to index 0");
            return Ok(SearchOutcome { index: 0, probes: 0 });
        }

        // Out-of-range targets resolve to the nearest end
        if target <= series[0] {
            return Ok(SearchOutcome { index: 0, probes: 0 });
        }
        if target >= series[n - 1] {
            return Ok(SearchOutcome { index: n - 1, probes: 0 });
        }

        let mut lo = 0usize;
        let mut hi = n - 1;
        let mut best = 0usize;
        let mut probes = 0usize;

        // Invariant: series[lo] <= target <= series[hi]
        while lo <= hi && series[lo] <= target && target <= series[hi] {
            let probe = probe_position(series, lo, hi, target);
            probes += 1;

            let value = series[probe];
            if closer(series, target, probe, best) {
                best = probe;
            }
            if self.tolerance.accepts((value - target).abs()) {
                return Ok(SearchOutcome { index: probe, probes });
            }

            if value < target {
                lo = probe + 1;
            } else {
                match probe.checked_sub(1) {
                    Some(next) => hi = next,
                    None => break,
                }
            }
        }

        // The nearest value sits next to where the window collapsed
        let neighborhood = [
            lo.saturating_sub(1),
            lo.min(n - 1),
            hi.min(n - 1),
            (hi + 1).min(n - 1),
        ];
        for candidate in neighborhood {
            if closer(series, target, candidate, best) {
                best = candidate;
            }
        }

        Ok(SearchOutcome { index: best, probes })
    }
}

/// Nearest-index interpolation search
///
/// Convenience wrapper around [`BoundedSearch`].
pub fn interpolation_search<T: Float>(
    series: &[T],
    target: T,
    tolerance: Tolerance<T>,
) -> LidarResult<usize> {
    BoundedSearch::new(tolerance).search(series, target)
}

/// Whether `series` satisfies the ordering the search relies on
pub fn is_non_decreasing<T: PartialOrd>(series: &[T]) -> bool {
    series.windows(2).all(|pair| pair[0] <= pair[1])
}

/// Value-proportional probe inside `[lo, hi]`.
///
/// A flat window (or any offset that is not a finite non-negative number)
/// falls back to the midpoint.
fn probe_position<T: Float>(series: &[T], lo: usize, hi: usize, target: T) -> usize {
    let width = hi - lo;
    let span = series[hi] - series[lo];

    if span > T::zero() {
        let width_f = T::from(width).unwrap_or_else(T::max_value);
        let offset = ((target - series[lo]) / span * width_f).floor();
        if let Some(offset) = offset.to_usize() {
            return lo + offset.min(width);
        }
    }

    lo + width / 2
}

/// True when `candidate` is strictly closer to `target` than `current`;
/// ties keep the lower index
fn closer<T: Float>(series: &[T], target: T, candidate: usize, current: usize) -> bool {
    let d_candidate = (series[candidate] - target).abs();
    let d_current = (series[current] - target).abs();
    d_candidate < d_current || (d_candidate == d_current && candidate < current)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniform(n: usize) -> Vec<f64> {
        (0..n).map(|i| i as f64).collect()
    }

    #[test]
    fn test_exact_match_within_tolerance() {
        let series = uniform(10);
        let tolerance = Tolerance::within(0.5).unwrap();
        assert_eq!(interpolation_search(&series, 4.0, tolerance).unwrap(), 4);
    }

    #[test]
    fn test_empty_series_is_invalid_input() {
        let series: Vec<f64> = Vec::new();
        let result = interpolation_search(&series, 1.0, Tolerance::Nearest);
        assert!(matches!(result, Err(LidarError::InvalidInput(_))));
    }

    #[test]
    fn test_single_element() {
        let series = [42.0f32];
        for target in [-1.0, 42.0, 100.0] {
            assert_eq!(interpolation_search(&series, target, Tolerance::Nearest).unwrap(), 0);
        }
    }

    #[test]
    fn test_two_element_window() {
        let series = [0.0f64, 10.0];
        for target in [-5.0, 0.0, 2.0, 4.0, 5.0, 6.0, 10.0, 15.0] {
            let tolerance = Tolerance::within(0.5).unwrap();
            let index = interpolation_search(&series, target, tolerance).unwrap();
            assert!(index < 2);
            let expected = if target > 5.0 { 1 } else { 0 };
            assert_eq!(index, expected, "target {}", target);
        }
    }

    #[test]
    fn test_flat_window_uses_midpoint() {
        let series = [1.0f64, 3.0, 3.0, 3.0, 3.0, 3.0, 7.0];
        let index = interpolation_search(&series, 3.0, Tolerance::Nearest).unwrap();
        assert!((1..=5).contains(&index));

        let flat = [2.0f32; 16];
        let index = interpolation_search(&flat, 2.0, Tolerance::Nearest).unwrap();
        assert!(index < flat.len());
    }

    #[test]
    fn test_probe_position_flat_span() {
        let series = [5.0f64, 5.0, 5.0, 5.0, 5.0];
        assert_eq!(probe_position(&series, 0, 4, 5.0), 2);
    }

    #[test]
    fn test_between_samples_resolves_to_nearest() {
        let series = [0.0f64, 1.0, 2.0, 4.0, 8.0, 16.0, 32.0];
        assert_eq!(interpolation_search(&series, 5.5, Tolerance::Nearest).unwrap(), 3);
        assert_eq!(interpolation_search(&series, 25.0, Tolerance::Nearest).unwrap(), 6);
        assert_eq!(interpolation_search(&series, 2.9, Tolerance::Nearest).unwrap(), 2);
    }

    #[test]
    fn test_out_of_range_targets_clamp() {
        let series = uniform(100);
        assert_eq!(interpolation_search(&series, -3.0, Tolerance::Nearest).unwrap(), 0);
        assert_eq!(interpolation_search(&series, 1e9, Tolerance::Nearest).unwrap(), 99);
    }

    #[test]
    fn test_nan_target_resolves_to_first_index() {
        let series = uniform(5);
        assert_eq!(interpolation_search(&series, f64::NAN, Tolerance::Nearest).unwrap(), 0);
    }

    #[test]
    fn test_invalid_tolerance_rejected() {
        assert!(Tolerance::within(-1.0f64).is_err());
        assert!(Tolerance::within(f64::NAN).is_err());
        assert!(Tolerance::within(f64::INFINITY).is_err());
        assert!(Tolerance::within(0.0f64).is_ok());
    }

    #[test]
    fn test_non_monotonic_does_not_panic() {
        let series = [5.0f64, 1.0, 9.0, 0.0, 3.0, 3.0, 2.0, 10.0];
        for target in [-1.0, 0.5, 2.5, 4.0, 9.5, 11.0] {
            let index = interpolation_search(&series, target, Tolerance::Nearest).unwrap();
            assert!(index < series.len());
        }
    }

    #[test]
    fn test_monotonic_check() {
        assert!(is_non_decreasing(&[1.0, 1.0, 2.0, 5.0]));
        assert!(!is_non_decreasing(&[1.0, 3.0, 2.0]));
        assert!(is_non_decreasing::<f64>(&[]));
    }

    #[test]
    fn test_uniform_series_probe_count() {
        let search = BoundedSearch::<f64>::nearest();
        let series = uniform(10_000);
        let outcome = search.search_with_stats(&series, 6_543.0).unwrap();
        assert_eq!(outcome.index, 6_543);
        assert!(outcome.probes <= 2, "took {} probes", outcome.probes);
    }
}
