//! [`RasterStore`](mosaic_core::RasterStore) backed by GDAL.

mod store;

pub use store::GdalRasterStore;
