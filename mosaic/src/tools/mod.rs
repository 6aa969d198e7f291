//! Subcommands of the `mosaic` command line tool.
//!
//! The subcommands are generic over the raster store, so the binary runs them on GDAL while the
//! tests use the in-memory store.

pub mod merge;
pub mod probe;
