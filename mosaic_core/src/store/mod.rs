//! The raster-store capability surface.
//!
//! The merge engine never touches files itself. Everything it needs from the outside world
//! (opening, creating, reading and writing pixel windows, band metadata) goes through a
//! [`RasterStore`] the caller constructs and passes in explicitly.
//!
//! [`MemoryRasterStore`] keeps rasters in memory, keyed by path. It is the reference
//! implementation and the backend of the test suites.

mod memory;
mod traits;

pub use memory::*;
pub use traits::*;
