//! Python bindings used by the plotting application

use crate::core::{
    BoundedSearch, ExtractionParams, GridRemapper, MaskedGrid, RemapMethod, RemapParams,
    SubplotExtractor, Tolerance,
};
use crate::io::InMemoryProduct;
use crate::types::{LidarError, SelectionRegion, DEFAULT_ALTITUDE_BINS, SENTINEL};
use numpy::{IntoPyArray, PyArray2, PyReadonlyArray1, PyReadonlyArray2};
use pyo3::create_exception;
use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;

create_exception!(_core, DegenerateSelectionError, PyValueError);

fn to_py_err(err: LidarError) -> PyErr {
    match err {
        LidarError::DegenerateSelection { .. } => {
            DegenerateSelectionError::new_err(err.to_string())
        }
        LidarError::InvalidInput(_)
        | LidarError::InvalidRange { .. }
        | LidarError::InvalidAltitudeRange { .. }
        | LidarError::InvalidDimensions(_)
        | LidarError::ShapeMismatch(_)
        | LidarError::InvalidTime(_) => PyValueError::new_err(err.to_string()),
        LidarError::Cancelled | LidarError::DataSource(_) => {
            PyRuntimeError::new_err(err.to_string())
        }
    }
}

fn parse_method(method: &str) -> PyResult<RemapMethod> {
    match method.to_lowercase().as_str() {
        "bilinear" => Ok(RemapMethod::Bilinear),
        "bin_average" | "binaverage" => Ok(RemapMethod::BinAverage),
        _ => Err(PyValueError::new_err(format!("Invalid remap method: {}", method))),
    }
}

/// Nearest index of `target` in a monotonic series
#[pyfunction]
#[pyo3(signature = (series, target, tolerance=None))]
fn interpolation_search<'py>(
    series: PyReadonlyArray1<'py, f64>,
    target: f64,
    tolerance: Option<f64>,
) -> PyResult<usize> {
    let tolerance = match tolerance {
        Some(width) => Tolerance::within(width).map_err(to_py_err)?,
        None => Tolerance::Nearest,
    };
    let series = series.as_slice()?;
    BoundedSearch::new(tolerance)
        .search(series, target)
        .map_err(to_py_err)
}

/// Remap backscatter rows `lo..hi` onto a uniform raster
#[pyfunction]
#[pyo3(signature = (data, levels, lo, hi, bottom, top, time_bins, altitude_bins=DEFAULT_ALTITUDE_BINS, method="bilinear"))]
#[allow(clippy::too_many_arguments)]
fn remap<'py>(
    py: Python<'py>,
    data: PyReadonlyArray2<'py, f32>,
    levels: PyReadonlyArray1<'py, f32>,
    lo: usize,
    hi: usize,
    bottom: f32,
    top: f32,
    time_bins: usize,
    altitude_bins: usize,
    method: &str,
) -> PyResult<&'py PyArray2<f32>> {
    let params = RemapParams {
        method: parse_method(method)?,
        ..RemapParams::default()
    };
    let grid = MaskedGrid::from_sentinel(data.as_array().to_owned(), SENTINEL);
    let raster = GridRemapper::new(params)
        .remap(&grid, levels.as_array(), (lo, hi), (bottom, top), time_bins, altitude_bins)
        .map_err(to_py_err)?;
    Ok(raster.into_pyarray(py))
}

/// Extract the subplot bounded by `vertices` from decoded product arrays
///
/// Returns `(raster, (start_time, end_time, min_altitude, max_altitude), (lo, hi))`.
#[pyfunction]
#[pyo3(signature = (utc_times, altitudes, backscatter, vertices, window_start, window_end, altitude_bins=DEFAULT_ALTITUDE_BINS))]
#[allow(clippy::too_many_arguments, clippy::type_complexity)]
fn extract_subplot<'py>(
    py: Python<'py>,
    utc_times: PyReadonlyArray1<'py, f64>,
    altitudes: PyReadonlyArray1<'py, f32>,
    backscatter: PyReadonlyArray2<'py, f32>,
    vertices: Vec<(f64, f32)>,
    window_start: usize,
    window_end: usize,
    altitude_bins: usize,
) -> PyResult<(&'py PyArray2<f32>, (f64, f64, f32, f32), (usize, usize))> {
    let product = InMemoryProduct::new(
        utc_times.as_array().to_vec(),
        altitudes.as_array().to_owned(),
        backscatter.as_array().to_owned(),
    )
    .map_err(to_py_err)?;

    let params = ExtractionParams {
        altitude_bins,
        ..ExtractionParams::default()
    };
    let region = SelectionRegion::from_coordinates("selection", &vertices);
    let subplot = SubplotExtractor::new(params, crate::io::CalipsoTimeConverter)
        .extract(&product, &region, window_start..window_end)
        .map_err(to_py_err)?;

    let extent = subplot.extent;
    Ok((
        subplot.raster.into_pyarray(py),
        (extent.start_time, extent.end_time, extent.min_altitude, extent.max_altitude),
        subplot.profile_range,
    ))
}

/// Python module definition
#[pymodule]
fn _core(py: Python, m: &PyModule) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(interpolation_search, m)?)?;
    m.add_function(wrap_pyfunction!(remap, m)?)?;
    m.add_function(wrap_pyfunction!(extract_subplot, m)?)?;
    m.add("DegenerateSelectionError", py.get_type::<DegenerateSelectionError>())?;
    Ok(())
}
