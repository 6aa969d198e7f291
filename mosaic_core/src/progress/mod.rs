//! Progress reporting for long-running merges.
//!
//! [`get_progress`] returns either a [`ProgressTicks`] printing GDAL-style
//! `0...10...20...` ticks to stderr, or a silent [`ProgressDrain`] when `quiet` is set.
//!
//! # Examples
//!
//! ```rust
//! use mosaic_core::progress::*;
//!
//! let mut progress = get_progress("Merging", 4, true);
//! progress.inc(1);
//! progress.set_position(4);
//! progress.finish();
//! ```

mod progress_drain;
mod progress_ticks;
mod traits;

pub use progress_drain::ProgressDrain;
pub use progress_ticks::ProgressTicks;
pub use traits::ProgressTrait;

/// Creates a progress indicator for `max_value` steps.
#[must_use]
pub fn get_progress(message: &str, max_value: u64, quiet: bool) -> Box<dyn ProgressTrait> {
	let mut progress: Box<dyn ProgressTrait> = if quiet || cfg!(test) {
		Box::new(ProgressDrain::new())
	} else {
		Box::new(ProgressTicks::new(Box::new(std::io::stderr())))
	};
	progress.init(message, max_value);
	progress
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn progress_can_overrun() {
		let mut progress = get_progress("Overrun", 5, false);
		progress.set_position(10);
		progress.inc(3);
		progress.finish();
	}
}
