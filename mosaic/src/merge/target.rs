//! Reuse or creation of the output raster and the layout of its bands.

use super::{format::resolve_format, grid::TargetGrid};
use crate::config::MergeConfig;
use anyhow::{Context, Result};
use mosaic_core::{
	CreateParameters, GeoTransform, MergeError, PixelType, RasterHandle, RasterStore, SourceDescriptor,
};

/// The resolved output of a merge run.
#[derive(Clone, Debug, PartialEq)]
pub struct TargetPlan {
	pub handle: RasterHandle,
	/// `true` if the output was created by this run, `false` if an existing raster is reused.
	pub created: bool,
	pub geo_transform: GeoTransform,
	pub width: usize,
	pub height: usize,
	/// Number of bands the sources are copied into. A reused output may have more.
	pub band_count: usize,
	/// Number of bands of the output raster.
	pub raster_band_count: usize,
	pub pixel_type: PixelType,
	/// For each source, the target band of each of its bands. Source bands without a target band
	/// are not copied.
	pub band_assignments: Vec<Vec<usize>>,
}

impl TargetPlan {
	/// Target band that band `band` (1-based) of source `source` (0-based) is written into.
	pub fn target_band(&self, source: usize, band: usize) -> Option<usize> {
		self.band_assignments.get(source)?.get(band.checked_sub(1)?).copied()
	}
}

/// Band of the target each source band is copied into.
///
/// In separate mode the sources are stacked, each getting its own range of bands. Otherwise all
/// sources share the bands `1..=band_count`.
pub fn assign_bands(sources: &[SourceDescriptor], band_count: usize, separate_bands: bool) -> Vec<Vec<usize>> {
	let mut offset = 0;
	sources
		.iter()
		.map(|source| {
			if separate_bands {
				let bands = (offset + 1..=offset + source.band_count).collect();
				offset += source.band_count;
				bands
			} else {
				(1..=source.band_count.min(band_count)).collect()
			}
		})
		.collect()
}

/// Decides whether the output is reused or created.
pub struct TargetResolver<'a> {
	config: &'a MergeConfig,
}

impl<'a> TargetResolver<'a> {
	pub fn new(config: &'a MergeConfig) -> Self {
		TargetResolver { config }
	}

	pub fn resolve<S: RasterStore + ?Sized>(
		&self,
		store: &mut S,
		sources: &[SourceDescriptor],
		grid: &TargetGrid,
	) -> Result<TargetPlan> {
		let Some(first) = sources.first() else {
			return Err(MergeError::Input("no source rasters".to_string()).into());
		};
		let output_path = self.config.output_path()?;
		let format = resolve_format(store, self.config.format.as_deref(), output_path)?;

		let plan = match store.open_for_update(output_path) {
			Some(handle) => self.reuse(store, handle, sources, first)?,
			None => self.create(store, &format, output_path, sources, first, grid)?,
		};
		log::debug!(
			"{} {output_path:?}: {}x{} pixels, {} of {} bands, {}",
			if plan.created { "created" } else { "reusing" },
			plan.width,
			plan.height,
			plan.band_count,
			plan.raster_band_count,
			plan.pixel_type
		);
		Ok(plan)
	}

	fn reuse<S: RasterStore + ?Sized>(
		&self,
		store: &mut S,
		handle: RasterHandle,
		sources: &[SourceDescriptor],
		first: &SourceDescriptor,
	) -> Result<TargetPlan> {
		let result = (|| -> Result<TargetPlan> {
			let describe = |e: anyhow::Error| e.context(MergeError::Io("cannot read existing output".to_string()));
			let raster_band_count = store.band_count(handle).map_err(describe)?;
			let (width, height) = store.raster_size(handle).map_err(describe)?;
			let geo_transform = store.geo_transform(handle).map_err(describe)?;
			let pixel_type = store.band_pixel_type(handle, 1).map_err(describe)?;

			let band_count = if self.config.separate_bands {
				let required: usize = sources.iter().map(|s| s.band_count).sum();
				if raster_band_count < required {
					return Err(MergeError::Layout {
						required,
						available: raster_band_count,
					}
					.into());
				}
				required
			} else {
				raster_band_count.min(first.band_count)
			};

			Ok(TargetPlan {
				handle,
				created: false,
				geo_transform,
				width,
				height,
				band_count,
				raster_band_count,
				pixel_type,
				band_assignments: assign_bands(sources, band_count, self.config.separate_bands),
			})
		})();

		if result.is_err() {
			close_after_failure(store, handle);
		}
		result
	}

	fn create<S: RasterStore + ?Sized>(
		&self,
		store: &mut S,
		format: &str,
		output_path: &str,
		sources: &[SourceDescriptor],
		first: &SourceDescriptor,
		grid: &TargetGrid,
	) -> Result<TargetPlan> {
		let (width, height) = grid.dimensions()?;
		let band_count = if self.config.separate_bands {
			sources.iter().map(|s| s.band_count).sum()
		} else {
			first.band_count
		};

		let parameters = CreateParameters {
			width,
			height,
			band_count,
			pixel_type: grid.pixel_type,
			create_options: self.config.create_options.clone(),
		};
		let creation_failed = || MergeError::Creation(format!("cannot create {output_path:?} with driver {format}"));
		let handle = store
			.create(format, output_path, &parameters)
			.with_context(creation_failed)?;

		let geo_transform = grid.geo_transform();
		let result = (|| -> Result<()> {
			store.set_geo_transform(handle, &geo_transform)?;
			store.set_projection(handle, &first.projection)?;
			if self.config.copy_color_table {
				match &first.color_table {
					Some(color_table) => store.set_color_table(handle, 1, color_table)?,
					None => log::warn!("{:?} has no color table to copy", first.name),
				}
			}
			Ok(())
		})()
		.with_context(creation_failed);
		if let Err(err) = result {
			close_after_failure(store, handle);
			return Err(err);
		}

		Ok(TargetPlan {
			handle,
			created: true,
			geo_transform,
			width,
			height,
			band_count,
			raster_band_count: band_count,
			pixel_type: grid.pixel_type,
			band_assignments: assign_bands(sources, band_count, self.config.separate_bands),
		})
	}
}

/// Closes an output that is abandoned because of an earlier error, which is returned instead.
pub(super) fn close_after_failure<S: RasterStore + ?Sized>(store: &mut S, handle: RasterHandle) {
	if let Err(err) = store.close(handle) {
		log::warn!("failed to close output {handle}: {err:#}");
	}
}
