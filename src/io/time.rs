//! CALIPSO profile time decoding and plot-time conversion
//!
//! `Profile_UTC_Time` is stored as `yymmdd.ffffffff`: the integer part is the
//! date (year 2000 + yy) and the fraction is the elapsed fraction of that day.
//! Plot time is fractional days since 1970-01-01T00:00:00Z.

use crate::types::{LidarError, LidarResult};
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};

const SECONDS_PER_DAY: f64 = 86_400.0;
const MICROS_PER_DAY: f64 = 86_400_000_000.0;

/// Converts an external timestamp into a plot-time number
pub trait PlotTimeConverter: Sync {
    fn to_plot_time(&self, raw: f64) -> LidarResult<f64>;
}

/// Converter for CALIPSO `Profile_UTC_Time` values
#[derive(Debug, Clone, Copy, Default)]
pub struct CalipsoTimeConverter;

impl PlotTimeConverter for CalipsoTimeConverter {
    fn to_plot_time(&self, raw: f64) -> LidarResult<f64> {
        calipso_time_to_plot_time(raw)
    }
}

impl<F> PlotTimeConverter for F
where
    F: Fn(f64) -> LidarResult<f64> + Sync,
{
    fn to_plot_time(&self, raw: f64) -> LidarResult<f64> {
        self(raw)
    }
}

/// Decode a CALIPSO `yymmdd.ffffffff` timestamp
pub fn calipso_time_to_datetime(raw: f64) -> LidarResult<DateTime<Utc>> {
    if !raw.is_finite() || raw < 0.0 {
        return Err(LidarError::InvalidTime(format!("{} is not a CALIPSO UTC time", raw)));
    }

    let whole = raw.trunc();
    let day_fraction = raw - whole;
    let whole = whole as u64;

    let year = 2000 + (whole / 10_000) as i32;
    let month = ((whole / 100) % 100) as u32;
    let day = (whole % 100) as u32;

    let midnight = NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .ok_or_else(|| {
            LidarError::InvalidTime(format!("{} does not encode a calendar date", raw))
        })?;

    let micros = (day_fraction * MICROS_PER_DAY).round() as i64;
    Ok(Utc.from_utc_datetime(&midnight) + Duration::microseconds(micros))
}

/// Fractional days since the Unix epoch
pub fn datetime_to_plot_time(time: DateTime<Utc>) -> f64 {
    time.timestamp() as f64 / SECONDS_PER_DAY
        + f64::from(time.timestamp_subsec_micros()) / MICROS_PER_DAY
}

/// Inverse of [`datetime_to_plot_time`], to microsecond precision
pub fn plot_time_to_datetime(plot_time: f64) -> LidarResult<DateTime<Utc>> {
    let micros = (plot_time * MICROS_PER_DAY).round();
    if !micros.is_finite() || micros.abs() > i64::MAX as f64 {
        return Err(LidarError::InvalidTime(format!(
            "plot time {} is out of range",
            plot_time
        )));
    }

    let micros = micros as i64;
    let seconds = micros.div_euclid(1_000_000);
    let nanos = (micros.rem_euclid(1_000_000) * 1_000) as u32;
    Utc.timestamp_opt(seconds, nanos).single().ok_or_else(|| {
        LidarError::InvalidTime(format!("plot time {} is out of range", plot_time))
    })
}

pub fn calipso_time_to_plot_time(raw: f64) -> LidarResult<f64> {
    calipso_time_to_datetime(raw).map(datetime_to_plot_time)
}

/// Convert a whole series of external timestamps
pub fn convert_series<C: PlotTimeConverter + ?Sized>(
    converter: &C,
    raw: &[f64],
) -> LidarResult<Vec<f64>> {
    raw.iter().map(|&value| converter.to_plot_time(value)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_decode_calipso_time() {
        // 2006-06-13 at 0.5 of the day
        let time = calipso_time_to_datetime(60613.5).unwrap();
        assert_eq!((time.year(), time.month(), time.day()), (2006, 6, 13));
        assert_eq!((time.hour(), time.minute(), time.second()), (12, 0, 0));

        let time = calipso_time_to_datetime(150101.25).unwrap();
        assert_eq!((time.year(), time.month(), time.day()), (2015, 1, 1));
        assert_eq!(time.hour(), 6);
    }

    #[test]
    fn test_invalid_calipso_time() {
        assert!(matches!(calipso_time_to_datetime(61313.0), Err(LidarError::InvalidTime(_))));
        assert!(calipso_time_to_datetime(-1.0).is_err());
        assert!(calipso_time_to_datetime(f64::NAN).is_err());
    }

    #[test]
    fn test_plot_time_epoch() {
        let epoch = Utc.with_ymd_and_hms(1970, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(datetime_to_plot_time(epoch), 0.0);

        let later = Utc.with_ymd_and_hms(1970, 1, 3, 12, 0, 0).unwrap();
        assert_abs_diff_eq!(datetime_to_plot_time(later), 2.5);
    }

    #[test]
    fn test_plot_time_round_trip() {
        let time = calipso_time_to_datetime(100415.123456).unwrap();
        let back = plot_time_to_datetime(datetime_to_plot_time(time)).unwrap();
        let drift = (back - time).num_milliseconds().abs();
        assert!(drift <= 1, "drift of {} ms", drift);
    }

    #[test]
    fn test_closure_converter() {
        let shift = |raw: f64| -> LidarResult<f64> { Ok(raw + 1.0) };
        assert_eq!(convert_series(&shift, &[1.0, 2.0]).unwrap(), vec![2.0, 3.0]);

        let plot = convert_series(&CalipsoTimeConverter, &[60613.0, 60613.5]).unwrap();
        assert_abs_diff_eq!(plot[1] - plot[0], 0.5, epsilon = 1e-9);
    }
}
