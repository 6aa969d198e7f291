//! Contains raster types like extents, geotransforms, pixel types, windows, sample buffers and more.

mod color_table;
pub use color_table::*;

mod driver_info;
pub use driver_info::*;

mod geo_extent;
pub use geo_extent::*;

mod geo_transform;
pub use geo_transform::*;

mod mask_flags;
pub use mask_flags::*;

mod pixel_size;
pub use pixel_size::*;

mod pixel_type;
pub use pixel_type::*;

mod pixel_window;
pub use pixel_window::*;

mod raster_buffer;
pub use raster_buffer::*;

mod source_descriptor;
pub use source_descriptor::*;
