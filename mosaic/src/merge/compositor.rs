//! Copies pixel windows from a source band into a target band.
//!
//! One of three strategies is chosen per source band:
//!
//! * [`CopyStrategy::Direct`]: the source window overwrites the target window.
//! * [`CopyStrategy::NoData`]: source samples equal to the no-data value leave the target as is.
//! * [`CopyStrategy::Mask`]: source samples whose mask is `0` leave the target as is. The mask is
//!   the band's mask, or the band itself if it is an alpha band.
//!
//! Source windows are resampled (nearest neighbour) to the size of the target window.

use anyhow::{Context, Result};
use mosaic_core::{MergeError, PixelType, PixelWindow, RasterBuffer, RasterHandle, RasterStore, has_mask};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MaskSource {
	/// The mask band the store provides for the source band.
	MaskBand,
	/// The source band is an alpha band and masks itself.
	AlphaBand,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CopyStrategy {
	Direct,
	NoData(f64),
	Mask(MaskSource),
}

/// Source and target of a single band copy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BandCopy {
	pub source: RasterHandle,
	pub source_band: usize,
	pub source_window: PixelWindow,
	pub target: RasterHandle,
	pub target_band: usize,
	pub target_window: PixelWindow,
}

/// Copies windows of one source band with the strategy chosen for that band.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PixelCompositor {
	strategy: CopyStrategy,
}

impl PixelCompositor {
	/// Chooses the strategy for `band` of `source`. A configured `src_nodata` always wins,
	/// then a non-trivial mask, then an alpha band.
	pub fn for_band<S: RasterStore + ?Sized>(
		store: &S,
		source: RasterHandle,
		band: usize,
		src_nodata: Option<f64>,
	) -> Result<PixelCompositor> {
		let strategy = if let Some(no_data) = src_nodata {
			CopyStrategy::NoData(no_data)
		} else if has_mask(store.mask_flags(source, band).context(io_error("mask flags", source, band))?) {
			CopyStrategy::Mask(MaskSource::MaskBand)
		} else if store
			.is_alpha_band(source, band)
			.context(io_error("color interpretation", source, band))?
		{
			CopyStrategy::Mask(MaskSource::AlphaBand)
		} else {
			CopyStrategy::Direct
		};
		Ok(PixelCompositor { strategy })
	}

	pub fn with_strategy(strategy: CopyStrategy) -> PixelCompositor {
		PixelCompositor { strategy }
	}

	pub fn strategy(&self) -> CopyStrategy {
		self.strategy
	}

	pub fn copy<S: RasterStore + ?Sized>(&self, store: &mut S, job: &BandCopy) -> Result<()> {
		log::trace!(
			"Copy {} to {} (band {} to {}, {:?})",
			job.source_window,
			job.target_window,
			job.source_band,
			job.target_band,
			self.strategy
		);

		let BandCopy {
			source,
			source_band,
			source_window,
			target,
			target_band,
			target_window,
		} = *job;
		let (width, height) = (target_window.width, target_window.height);

		let buffer = match self.strategy {
			CopyStrategy::Direct => {
				let target_type = store
					.band_pixel_type(target, target_band)
					.context(io_error("pixel type", target, target_band))?;
				store
					.read_window(source, source_band, &source_window, width, height, target_type)
					.context(io_error("read", source, source_band))?
			}
			CopyStrategy::NoData(no_data) => {
				let data = read_source(store, job)?;
				let current = read_target(store, job)?;
				let source_type = data.pixel_type();
				composite(&data, &current, |i| !source_type.is_no_data(data.data()[i], no_data))?
			}
			CopyStrategy::Mask(mask_source) => {
				let data = read_source(store, job)?;
				let mask = match mask_source {
					MaskSource::MaskBand => store.read_mask_window(source, source_band, &source_window, width, height),
					MaskSource::AlphaBand => {
						store.read_window(source, source_band, &source_window, width, height, PixelType::Byte)
					}
				}
				.context(io_error("mask read", source, source_band))?;
				let current = read_target(store, job)?;
				composite(&data, &current, |i| mask.data()[i] != 0.0)?
			}
		};

		store
			.write_window(target, target_band, &target_window, &buffer)
			.context(io_error("write", target, target_band))
	}
}

fn io_error(operation: &str, handle: RasterHandle, band: usize) -> MergeError {
	MergeError::Io(format!("{operation} failed on band {band} of raster {handle}"))
}

/// Source window at the source's own pixel type, resampled to the target window size.
fn read_source<S: RasterStore + ?Sized>(store: &S, job: &BandCopy) -> Result<RasterBuffer> {
	let read = || -> Result<RasterBuffer> {
		let pixel_type = store.band_pixel_type(job.source, job.source_band)?;
		store.read_window(
			job.source,
			job.source_band,
			&job.source_window,
			job.target_window.width,
			job.target_window.height,
			pixel_type,
		)
	};
	read().context(io_error("read", job.source, job.source_band))
}

fn read_target<S: RasterStore + ?Sized>(store: &S, job: &BandCopy) -> Result<RasterBuffer> {
	let read = || -> Result<RasterBuffer> {
		let pixel_type = store.band_pixel_type(job.target, job.target_band)?;
		let window = &job.target_window;
		store.read_window(job.target, job.target_band, window, window.width, window.height, pixel_type)
	};
	read().context(io_error("read", job.target, job.target_band))
}

/// Takes the source sample wherever `use_source` holds, the current target sample elsewhere.
fn composite(source: &RasterBuffer, current: &RasterBuffer, use_source: impl Fn(usize) -> bool) -> Result<RasterBuffer> {
	let data = source
		.data()
		.iter()
		.zip(current.data())
		.enumerate()
		.map(|(i, (s, c))| if use_source(i) { *s } else { *c })
		.collect();
	RasterBuffer::new(source.width(), source.height(), PixelType::Float64, data)
}
