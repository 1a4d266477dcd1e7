use calipso_subplot::core::search::{BoundedSearch, Tolerance};
use calipso_subplot::{interpolation_search, LidarError};

/// Deterministic pseudo-random sequence in [0, 1)
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> f64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        (self.0 >> 11) as f64 / (1u64 << 53) as f64
    }
}

fn brute_force_distance(series: &[f64], target: f64) -> f64 {
    series
        .iter()
        .map(|v| (v - target).abs())
        .fold(f64::INFINITY, f64::min)
}

fn log_log_bound(n: usize) -> usize {
    (n as f64).log2().log2().ceil() as usize + 2
}

#[test]
fn test_nearest_match_property() {
    let mut rng = Lcg(7);

    for trial in 0..200 {
        let n = 2 + (rng.next() * 300.0) as usize;
        let mut value = rng.next() * 100.0;
        let series: Vec<f64> = (0..n)
            .map(|_| {
                // Mix of regular steps, large gaps and duplicates
                let roll = rng.next();
                value += if roll < 0.1 {
                    0.0
                } else if roll < 0.2 {
                    rng.next() * 50.0
                } else {
                    rng.next()
                };
                value
            })
            .collect();

        let tolerance = if trial % 2 == 0 { 0.0 } else { 0.25 };
        let first = series[0];
        let last = series[n - 1];

        for _ in 0..20 {
            let target = first + rng.next() * (last - first);
            let within = Tolerance::within(tolerance).unwrap();
            let index = interpolation_search(&series, target, within).unwrap();
            assert!(index < n);

            let found = (series[index] - target).abs();
            let best = brute_force_distance(&series, target);
            assert!(
                found <= best + tolerance + 1e-12,
                "trial {}: index {} is {} away, best is {}",
                trial,
                index,
                found,
                best
            );
        }
    }
}

#[test]
fn test_probe_count_on_uniform_series() {
    for n in [10usize, 100, 10_000] {
        let series: Vec<f64> = (0..n).map(|i| i as f64 * 0.25).collect();
        let search = BoundedSearch::<f64>::nearest();
        let bound = log_log_bound(n);

        for step in 0..50 {
            let target = (step as f64 / 50.0) * (n - 1) as f64 * 0.25 + 0.03;
            let outcome = search.search_with_stats(&series, target).unwrap();
            assert!(
                outcome.probes <= bound,
                "n = {}: {} probes for target {} (bound {})",
                n,
                outcome.probes,
                target,
                bound
            );
        }
    }
}

#[test]
fn test_probe_count_on_near_uniform_series() {
    let mut rng = Lcg(42);
    let n = 10_000;
    let mut time = 0.0;
    let series: Vec<f64> = (0..n)
        .map(|_| {
            time += 1.0 + 0.2 * (rng.next() - 0.5);
            time
        })
        .collect();

    let search = BoundedSearch::<f64>::nearest();
    let mut total = 0;
    let trials = 500;
    for _ in 0..trials {
        let target = series[0] + rng.next() * (series[n - 1] - series[0]);
        total += search.search_with_stats(&series, target).unwrap().probes;
    }

    let average = total as f64 / trials as f64;
    assert!(average <= 8.0, "average of {} probes", average);
}

#[test]
fn test_zero_slope_windows() {
    let plateau = [3.0f64; 64];
    for target in [2.0, 3.0, 4.0] {
        let index = interpolation_search(&plateau, target, Tolerance::Nearest).unwrap();
        assert!(index < plateau.len());
    }

    let mut steps = vec![0.0f64; 40];
    steps.extend(vec![5.0; 40]);
    steps.extend(vec![10.0; 40]);
    for target in [0.0, 1.0, 2.5, 4.9, 5.0, 7.4, 7.6, 10.0] {
        let index = interpolation_search(&steps, target, Tolerance::Nearest).unwrap();
        let expected = if target < 2.5 {
            0.0
        } else if target <= 7.5 {
            if target == 2.5 { 0.0 } else { 5.0 }
        } else {
            10.0
        };
        assert_eq!(steps[index], expected, "target {}", target);
    }
}

#[test]
fn test_two_point_series_any_target() {
    let series = [0.0f64, 10.0];
    let mut rng = Lcg(3);
    for _ in 0..100 {
        let target = rng.next() * 40.0 - 15.0;
        let index = interpolation_search(&series, target, Tolerance::within(0.5).unwrap()).unwrap();
        assert!(index < 2);
    }
}

#[test]
fn test_empty_series() {
    let empty: [f32; 0] = [];
    let result = BoundedSearch::new(Tolerance::within(0.1f32).unwrap()).search(&empty, 1.0);
    assert!(matches!(result, Err(LidarError::InvalidInput(_))));
}
