//! Mosaics georeferenced rasters into one output raster, in the manner of `gdal_merge`.
//!
//! The [`merge`] module holds the engine: it reconciles the pixel grid of all inputs, reuses or
//! creates the output raster and copies every source band into it, honouring no-data values and
//! masks. Rasters are accessed through a [`RasterStore`](mosaic_core::RasterStore): either the
//! in-memory store of `mosaic_core`, or GDAL with the `gdal` feature.
//!
//! # Examples
//!
//! ```
//! use mosaic::{config::MergeConfig, merge::merge_files};
//! use mosaic_core::*;
//!
//! let mut store = MemoryRasterStore::new();
//! for (path, ulx, value) in [("a.tif", 0.0, 5.0), ("b.tif", 1.0, 7.0)] {
//! 	let extent = GeoExtent::new(ulx, 1.0, ulx + 1.0, 0.0).unwrap();
//! 	let raster = MemoryRaster::new(2, 2, 1, PixelType::Byte)
//! 		.with_extent(&extent)
//! 		.with_fill(1, value)
//! 		.unwrap();
//! 	store.insert(path, raster);
//! }
//!
//! let config = MergeConfig::new("out.tif");
//! let plan = merge_files(&mut store, &config, &["a.tif", "b.tif"]).unwrap();
//! assert_eq!((plan.width, plan.height), (4, 2));
//! store.close(plan.handle).unwrap();
//! ```

pub mod config;
#[cfg(feature = "gdal")]
pub mod gdal;
pub mod merge;
#[cfg(feature = "cli")]
pub mod tools;
