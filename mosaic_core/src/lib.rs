//! Contains the raster data model shared by the mosaic crates: extents, geotransforms, pixel types,
//! sample buffers, the raster-store capability surface and the error taxonomy.

pub mod error;
pub use error::*;

pub mod progress;

pub mod store;
pub use store::*;

pub mod types;
pub use types::*;
