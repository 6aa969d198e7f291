//! The error taxonomy of a merge run.
//!
//! All fallible functions in the mosaic crates return [`anyhow::Result`]. A [`MergeError`] is
//! attached to the error chain, either as the root error or as a context layer, so a caller can
//! classify any failure with [`MergeError::of`] while the underlying store message stays
//! available in the chain.
//!
//! ```
//! use anyhow::{Context, Result};
//! use mosaic_core::MergeError;
//!
//! fn read() -> Result<()> {
//! 	Err(anyhow::anyhow!("window out of range")).context(MergeError::Io("reading band 1".into()))
//! }
//!
//! let err = read().unwrap_err();
//! assert!(matches!(MergeError::of(&err), Some(MergeError::Io(_))));
//! ```

use thiserror::Error;

/// Classifies why a merge run failed. None of these are retried.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum MergeError {
	/// Missing output path, empty input list, unknown format, or a format that cannot create rasters.
	#[error("configuration error: {0}")]
	Configuration(String),

	/// An existing output raster cannot hold the requested band layout.
	#[error("existing output has fewer bands than required ({available} < {required})")]
	Layout { required: usize, available: usize },

	/// The raster store did not return a handle for a new raster.
	#[error("creation failed: {0}")]
	Creation(String),

	/// Reading or writing a pixel window failed.
	#[error("I/O error: {0}")]
	Io(String),

	/// No usable source raster.
	#[error("input error: {0}")]
	Input(String),
}

impl MergeError {
	/// Finds the `MergeError` attached anywhere in the chain of `err`.
	pub fn of(err: &anyhow::Error) -> Option<&MergeError> {
		err.downcast_ref::<MergeError>()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use anyhow::{Context, Result, bail};

	fn failing_root() -> Result<()> {
		bail!(MergeError::Layout {
			required: 8,
			available: 3
		})
	}

	#[test]
	fn root_error_is_classified() {
		let err = failing_root().unwrap_err();
		assert_eq!(
			MergeError::of(&err),
			Some(&MergeError::Layout {
				required: 8,
				available: 3
			})
		);
		assert_eq!(
			err.to_string(),
			"existing output has fewer bands than required (3 < 8)"
		);
	}

	#[test]
	fn context_layer_is_classified_through_outer_context() {
		let err = Err::<(), _>(anyhow::anyhow!("access window out of range"))
			.context(MergeError::Io("reading band 2".to_string()))
			.context("Failed to merge file a.tif")
			.unwrap_err();

		assert_eq!(MergeError::of(&err), Some(&MergeError::Io("reading band 2".to_string())));
		let chain = err.chain().map(|e| e.to_string()).collect::<Vec<_>>();
		assert_eq!(
			chain,
			[
				"Failed to merge file a.tif",
				"I/O error: reading band 2",
				"access window out of range"
			]
		);
	}

	#[test]
	fn unrelated_error_is_not_classified() {
		let err = anyhow::anyhow!("something else");
		assert_eq!(MergeError::of(&err), None);
	}
}
