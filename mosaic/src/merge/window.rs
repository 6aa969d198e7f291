//! Pixel windows for copying one source into the target.
//!
//! The overlap of source and target is computed in ground coordinates and then converted into a
//! pixel window of each raster. Offsets are truncated, sizes rounded, and target offsets get a
//! bias of a tenth of a pixel so that sources sitting exactly on the target grid are not shifted
//! by floating-point noise.

use anyhow::Result;
use mosaic_core::{GeoExtent, GeoTransform, PixelWindow};

/// Matching windows in source and target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CopyWindows {
	pub source: PixelWindow,
	pub target: PixelWindow,
}

/// Computes where a source of `source_size` pixels lands in a target of `target_size` pixels.
///
/// Returns `None` if the two rasters do not overlap or the overlap is smaller than a pixel.
pub fn copy_windows(
	source_gt: &GeoTransform,
	source_size: (usize, usize),
	target_gt: &GeoTransform,
	target_size: (usize, usize),
) -> Result<Option<CopyWindows>> {
	let source_extent = source_gt.extent(source_size.0, source_size.1)?;
	let target_extent = target_gt.extent(target_size.0, target_size.1)?;

	let Some(overlap) = source_extent.intersection(&target_extent) else {
		return Ok(None);
	};
	let Some(target) = window_of(&overlap, target_gt, target_size, 0.1) else {
		return Ok(None);
	};
	let Some(source) = window_of(&overlap, source_gt, source_size, 0.0) else {
		return Ok(None);
	};
	Ok(Some(CopyWindows { source, target }))
}

fn window_of(area: &GeoExtent, gt: &GeoTransform, size: (usize, usize), offset_bias: f64) -> Option<PixelWindow> {
	let (top, bottom) = if gt.pixel_height < 0.0 {
		(area.uly, area.lry)
	} else {
		(area.lry, area.uly)
	};

	let x_off = (((area.ulx - gt.origin_x) / gt.pixel_width + offset_bias) as i64).max(0);
	let y_off = (((top - gt.origin_y) / gt.pixel_height + offset_bias) as i64).max(0);
	let x_end = (((area.lrx - gt.origin_x) / gt.pixel_width + 0.5) as i64).min(size.0 as i64);
	let y_end = (((bottom - gt.origin_y) / gt.pixel_height + 0.5) as i64).min(size.1 as i64);

	if x_end - x_off < 1 || y_end - y_off < 1 {
		return None;
	}
	Some(PixelWindow::new(
		x_off as usize,
		y_off as usize,
		(x_end - x_off) as usize,
		(y_end - y_off) as usize,
	))
}

#[cfg(test)]
mod tests {
	use super::*;
	use pretty_assertions::assert_eq;
	use rstest::rstest;

	fn gt(ulx: f64, uly: f64, pixel: f64) -> GeoTransform {
		GeoTransform::from_array([ulx, pixel, 0.0, uly, 0.0, -pixel])
	}

	fn windows(source: PixelWindow, target: PixelWindow) -> Option<CopyWindows> {
		Some(CopyWindows { source, target })
	}

	#[rstest]
	#[case::left_half(gt(0.0, 1.0, 0.5), windows(PixelWindow::new(0, 0, 2, 2), PixelWindow::new(0, 0, 2, 2)))]
	#[case::right_half(gt(1.0, 1.0, 0.5), windows(PixelWindow::new(0, 0, 2, 2), PixelWindow::new(2, 0, 2, 2)))]
	#[case::clipped_left(gt(-0.5, 1.0, 0.5), windows(PixelWindow::new(1, 0, 1, 2), PixelWindow::new(0, 0, 1, 2)))]
	#[case::clipped_below(gt(0.5, 0.5, 0.5), windows(PixelWindow::new(0, 0, 2, 1), PixelWindow::new(1, 1, 2, 1)))]
	#[case::disjoint(gt(5.0, 1.0, 0.5), None)]
	#[case::touching(gt(2.0, 1.0, 0.5), None)]
	fn source_in_target(#[case] source_gt: GeoTransform, #[case] expected: Option<CopyWindows>) {
		let target_gt = gt(0.0, 1.0, 0.5);
		assert_eq!(
			copy_windows(&source_gt, (2, 2), &target_gt, (4, 2)).unwrap(),
			expected
		);
	}

	#[test]
	fn coarser_source_is_stretched() {
		// one source pixel covers 2x2 target pixels
		let windows = copy_windows(&gt(0.0, 2.0, 1.0), (2, 2), &gt(0.0, 2.0, 0.5), (4, 4))
			.unwrap()
			.unwrap();
		assert_eq!(windows.source, PixelWindow::new(0, 0, 2, 2));
		assert_eq!(windows.target, PixelWindow::new(0, 0, 4, 4));
	}

	#[test]
	fn near_grid_offsets_are_not_shifted() {
		let source_gt = gt(1.0 - 1e-9, 1.0, 0.5);
		let windows = copy_windows(&source_gt, (2, 2), &gt(0.0, 1.0, 0.5), (4, 2))
			.unwrap()
			.unwrap();
		assert_eq!(windows.target, PixelWindow::new(2, 0, 2, 2));
	}

	#[test]
	fn rotated_target_is_rejected() {
		let rotated = GeoTransform::from_array([0.0, 1.0, 0.1, 0.0, 0.0, -1.0]);
		assert!(copy_windows(&gt(0.0, 1.0, 0.5), (2, 2), &rotated, (4, 2)).is_err());
	}
}
