//! Data-source seams: product access and time conversion

pub mod product;
pub mod time;

pub use product::{InMemoryProduct, ProfileSource};
pub use time::{CalipsoTimeConverter, PlotTimeConverter};
