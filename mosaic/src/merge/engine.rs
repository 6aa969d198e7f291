use super::{
	BandCopy, GridReconciler, PixelCompositor, TargetPlan, TargetResolver, copy_windows, target::close_after_failure,
};
use crate::config::MergeConfig;
use anyhow::{Context, Result};
use mosaic_core::{MergeError, RasterHandle, RasterStore, SourceDescriptor, progress::get_progress};

/// Stages of a merge run, in the order they are passed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum MergeStage {
	Init,
	DescriptorsBuilt,
	GridReconciled,
	TargetResolved,
	PreInitialized,
	Compositing,
	Done,
}

/// Drives one merge run against a raster store.
///
/// Sources are processed strictly in input order and their bands in ascending order. Any failure
/// aborts the run; bands written so far stay written.
pub struct MosaicEngine<'a, S: RasterStore + ?Sized> {
	store: &'a mut S,
	config: &'a MergeConfig,
	stage: MergeStage,
}

impl<'a, S: RasterStore + ?Sized> MosaicEngine<'a, S> {
	pub fn new(store: &'a mut S, config: &'a MergeConfig) -> Self {
		MosaicEngine {
			store,
			config,
			stage: MergeStage::Init,
		}
	}

	pub fn stage(&self) -> MergeStage {
		self.stage
	}

	fn advance(&mut self, stage: MergeStage) {
		log::debug!("merge stage {:?} -> {stage:?}", self.stage);
		self.stage = stage;
	}

	/// Opens and merges the rasters at `paths`. Inputs that cannot be opened are skipped with a
	/// warning. The sources are closed again before returning; the output is left open.
	pub fn merge_files<P: AsRef<str>>(&mut self, paths: &[P]) -> Result<TargetPlan> {
		if paths.is_empty() {
			return Err(MergeError::Input("no input files provided".to_string()).into());
		}

		let mut opened = Vec::new();
		let mut sources = Vec::new();
		for path in paths.iter().map(AsRef::as_ref) {
			let handle = match self.store.open(path) {
				Ok(handle) => handle,
				Err(err) => {
					log::warn!("skipping {path:?}: {err:#}");
					continue;
				}
			};
			opened.push(handle);
			match SourceDescriptor::read(&*self.store, handle, path) {
				Ok(descriptor) => sources.push(descriptor),
				Err(err) => log::warn!("skipping {path:?}: {err:#}"),
			}
		}

		let result = self.run(&sources);

		for handle in opened {
			if let Err(err) = self.store.close(handle) {
				log::warn!("failed to close source {handle}: {err:#}");
			}
		}
		result
	}

	/// Merges rasters that are already open in the store. The sources stay open.
	pub fn merge_rasters(&mut self, handles: &[RasterHandle]) -> Result<TargetPlan> {
		let sources = handles
			.iter()
			.map(|handle| SourceDescriptor::read(&*self.store, *handle, &handle.to_string()))
			.collect::<Result<Vec<_>>>()
			.context(MergeError::Input("cannot describe input raster".to_string()))?;
		self.run(&sources)
	}

	fn run(&mut self, sources: &[SourceDescriptor]) -> Result<TargetPlan> {
		if sources.is_empty() {
			return Err(MergeError::Input("no usable input rasters".to_string()).into());
		}
		self.advance(MergeStage::DescriptorsBuilt);

		let grid = GridReconciler::new(self.config).reconcile(sources)?;
		self.advance(MergeStage::GridReconciled);

		let plan = TargetResolver::new(self.config).resolve(self.store, sources, &grid)?;
		self.advance(MergeStage::TargetResolved);

		let result = self.pre_initialize(&plan).and_then(|()| {
			if self.config.create_only {
				log::debug!("create only, skipping pixel copy");
				Ok(())
			} else {
				self.composite(sources, &plan)
			}
		});
		if let Err(err) = result {
			close_after_failure(self.store, plan.handle);
			return Err(err);
		}

		self.advance(MergeStage::Done);
		Ok(plan)
	}

	fn pre_initialize(&mut self, plan: &TargetPlan) -> Result<()> {
		let bands = 1..=plan.raster_band_count;
		if let Some(no_data) = self.config.dst_nodata {
			for band in bands.clone() {
				self.store
					.set_no_data(plan.handle, band, no_data)
					.with_context(|| MergeError::Io(format!("cannot set no-data value of band {band}")))?;
			}
		}
		if let Some(values) = self.config.pre_init_values(plan.raster_band_count) {
			for (band, value) in bands.zip(values) {
				self.store
					.fill_band(plan.handle, band, value)
					.with_context(|| MergeError::Io(format!("cannot fill band {band} with {value}")))?;
			}
		}
		self.advance(MergeStage::PreInitialized);
		Ok(())
	}

	fn composite(&mut self, sources: &[SourceDescriptor], plan: &TargetPlan) -> Result<()> {
		self.advance(MergeStage::Compositing);
		let mut progress = get_progress("Merging", sources.len() as u64, self.config.quiet);

		for (index, source) in sources.iter().enumerate() {
			let windows = copy_windows(
				&source.geo_transform,
				(source.width, source.height),
				&plan.geo_transform,
				(plan.width, plan.height),
			)
			.with_context(|| MergeError::Input(format!("cannot place {:?} in the output grid", source.name)))?;

			let Some(windows) = windows else {
				log::debug!("{:?} does not overlap the output, skipping", source.name);
				progress.inc(1);
				continue;
			};

			for band in 1..=source.band_count {
				let Some(target_band) = plan.target_band(index, band) else {
					continue;
				};
				let job = BandCopy {
					source: source.handle,
					source_band: band,
					source_window: windows.source,
					target: plan.handle,
					target_band,
					target_window: windows.target,
				};
				PixelCompositor::for_band(&*self.store, source.handle, band, self.config.src_nodata)
					.and_then(|compositor| compositor.copy(self.store, &job))
					.with_context(|| format!("Failed to copy band {band} of {:?} to band {target_band}", source.name))?;
			}
			progress.inc(1);
		}

		progress.finish();
		Ok(())
	}
}

/// Merges the rasters at `paths` into the output described by `config`.
pub fn merge_files<S: RasterStore + ?Sized, P: AsRef<str>>(
	store: &mut S,
	config: &MergeConfig,
	paths: &[P],
) -> Result<TargetPlan> {
	MosaicEngine::new(store, config).merge_files(paths)
}

/// Merges rasters already open in `store` into the output described by `config`.
pub fn merge_rasters<S: RasterStore + ?Sized>(
	store: &mut S,
	config: &MergeConfig,
	handles: &[RasterHandle],
) -> Result<TargetPlan> {
	MosaicEngine::new(store, config).merge_rasters(handles)
}

#[cfg(test)]
mod tests {
	use super::*;
	use mosaic_core::{GeoExtent, MemoryRaster, MemoryRasterStore, PixelType};
	use pretty_assertions::assert_eq;

	fn store_with_sources() -> MemoryRasterStore {
		let mut store = MemoryRasterStore::new();
		for (path, ulx, value) in [("a.tif", 0.0, 5.0), ("b.tif", 1.0, 7.0)] {
			let extent = GeoExtent::new(ulx, 1.0, ulx + 1.0, 0.0).unwrap();
			let raster = MemoryRaster::new(2, 2, 1, PixelType::Byte)
				.with_extent(&extent)
				.with_fill(1, value)
				.unwrap();
			store.insert(path, raster);
		}
		store
	}

	#[test]
	fn stages_are_passed_in_order() {
		let mut store = store_with_sources();
		let config = MergeConfig::new("out.tif");
		let mut engine = MosaicEngine::new(&mut store, &config);
		assert_eq!(engine.stage(), MergeStage::Init);
		engine.merge_files(&["a.tif", "b.tif"]).unwrap();
		assert_eq!(engine.stage(), MergeStage::Done);
	}

	#[test]
	fn failure_stops_at_stage() {
		let mut store = store_with_sources();
		store.insert("out.tif", MemoryRaster::new(4, 2, 1, PixelType::Byte));
		let config = MergeConfig {
			separate_bands: true,
			..MergeConfig::new("out.tif")
		};
		let mut engine = MosaicEngine::new(&mut store, &config);
		assert!(engine.merge_files(&["a.tif", "b.tif"]).is_err());
		assert_eq!(engine.stage(), MergeStage::GridReconciled);
	}

	#[test]
	fn empty_input() {
		let mut store = store_with_sources();
		let config = MergeConfig::new("out.tif");
		let err = merge_files::<_, &str>(&mut store, &config, &[]).unwrap_err();
		assert_eq!(err.to_string(), "input error: no input files provided");

		let err = merge_files(&mut store, &config, &["missing.tif"]).unwrap_err();
		assert_eq!(err.to_string(), "input error: no usable input rasters");
		assert!(store.raster("out.tif").is_none());
	}

	#[test]
	fn unopenable_inputs_are_skipped() {
		let mut store = store_with_sources();
		let config = MergeConfig::new("out.tif");
		let plan = merge_files(&mut store, &config, &["missing.tif", "b.tif"]).unwrap();
		assert_eq!((plan.width, plan.height), (2, 2));
		assert_eq!(store.raster("out.tif").unwrap().band_data(1).unwrap(), &[7.0; 4]);
		assert_eq!(store.open_handle_count(), 1);
	}

	#[test]
	fn create_only_allocates_and_stamps() {
		let mut store = store_with_sources();
		let config = MergeConfig {
			create_only: true,
			dst_nodata: Some(255.0),
			pre_init: vec![3.0],
			..MergeConfig::new("out.tif")
		};
		let mut engine = MosaicEngine::new(&mut store, &config);
		engine.merge_files(&["a.tif", "b.tif"]).unwrap();
		assert_eq!(engine.stage(), MergeStage::Done);

		let band = &store.raster("out.tif").unwrap().bands[0];
		assert_eq!(band.no_data, Some(255.0));
		assert_eq!(band.data, vec![3.0; 8]);
	}

	#[test]
	fn merge_open_rasters() {
		let mut store = store_with_sources();
		let a = store.open("a.tif").unwrap();
		let b = store.open("b.tif").unwrap();
		let plan = merge_rasters(&mut store, &MergeConfig::new("out.tif"), &[b, a]).unwrap();

		assert_eq!(
			store.raster("out.tif").unwrap().band_data(1).unwrap(),
			&[5.0, 5.0, 7.0, 7.0, 5.0, 5.0, 7.0, 7.0]
		);
		assert_eq!(store.open_handle_count(), 3);
		store.close(plan.handle).unwrap();
		assert_eq!(store.band_count(a).unwrap(), 1);
	}

	#[test]
	fn source_outside_output_is_skipped() {
		let mut store = store_with_sources();
		let config = MergeConfig {
			target_extent: Some(GeoExtent::new(0.0, 1.0, 1.0, 0.0).unwrap()),
			..MergeConfig::new("out.tif")
		};
		merge_files(&mut store, &config, &["a.tif", "b.tif"]).unwrap();
		assert_eq!(store.raster("out.tif").unwrap().band_data(1).unwrap(), &[5.0; 4]);
	}

	#[test]
	fn closed_input_handle() {
		let mut store = store_with_sources();
		let config = MergeConfig::new("out.tif");
		let a = store.open("a.tif").unwrap();
		store.close(a).unwrap();
		let err = merge_rasters(&mut store, &config, &[a]).unwrap_err();
		assert!(matches!(MergeError::of(&err), Some(MergeError::Input(_))));
		assert_eq!(store.open_handle_count(), 0);
	}
}
