//! calipso-subplot: region extraction for CALIPSO LIDAR backscatter
//!
//! Given a region drawn on a time/altitude backscatter plot, this library
//! resolves the region's time bounds to profile indices with an interpolation
//! search and remaps the bounded, irregular altitude grid onto a uniform
//! raster ready for image display. Decoding the product, colormaps and
//! rendering are left to the host application.

pub mod types;
pub mod io;
pub mod core;

#[cfg(feature = "python")]
mod python;

// Re-export main types and functions for easier access
pub use crate::types::{
    BackscatterGrid, AltitudeLevels, OutputRaster, Extent, Subplot, SelectionRegion,
    RegionBounds, RegionVertex, LidarError, LidarResult, SENTINEL, DEFAULT_ALTITUDE_BINS,
};

pub use crate::core::{
    BoundedSearch, Tolerance, interpolation_search, MaskedGrid, GridRemapper, RemapMethod,
    RemapParams, remap, ExtractionParams, SubplotExtractor, RasterHistogram,
};

pub use crate::io::{ProfileSource, InMemoryProduct, CalipsoTimeConverter, PlotTimeConverter};
