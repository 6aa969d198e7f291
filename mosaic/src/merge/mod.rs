//! The merge engine and its parts.
//!
//! A run goes through [`MosaicEngine`]: the sources are described, their grids reconciled by
//! [`GridReconciler`], the output reused or created by [`TargetResolver`], pre-initialised, and
//! finally every source band is copied by a [`PixelCompositor`].

mod compositor;
mod engine;
pub mod format;
mod grid;
mod target;
mod window;

pub use compositor::{BandCopy, CopyStrategy, MaskSource, PixelCompositor};
pub use engine::{MergeStage, MosaicEngine, merge_files, merge_rasters};
pub use grid::{GridReconciler, TargetGrid};
pub use target::{TargetPlan, TargetResolver, assign_bands};
pub use window::{CopyWindows, copy_windows};
