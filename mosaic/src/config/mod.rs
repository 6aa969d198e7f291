//! Merge configuration.
//!
//! [`MergeConfig`] carries every option of a merge run. It is usually built in code or by the
//! command line tool, but can also be loaded from YAML:
//!
//! ```yaml
//! output_path: mosaic.tif
//! create_options: [COMPRESS=DEFLATE, TILED=YES]
//! pixel_size: [10.0, 10.0]
//! target_aligned_pixels: true
//! pre_init: [0]
//! src_nodata: 0
//! ```

mod merge_config;

pub use merge_config::MergeConfig;
