//! Core extraction modules

pub mod search;
pub mod mask;
pub mod axes;
pub mod remap;
pub mod extract;
pub mod histogram;

// Re-export main types
pub use search::{BoundedSearch, SearchOutcome, Tolerance, interpolation_search};
pub use mask::MaskedGrid;
pub use axes::{AltitudeOrder, SourceAxes, TargetGrid, UniformAxis};
pub use remap::{GridRemapper, RemapMethod, RemapParams, remap};
pub use extract::{ExtractionParams, SubplotExtractor};
pub use histogram::{Histogram, HistogramParams, RasterHistogram};
