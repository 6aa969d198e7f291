use enumset::{EnumSet, EnumSetType};

/// Describes where the validity mask of a band comes from. Mirrors GDAL's `GMF_*` flags.
///
/// * **`AllValid`** – every pixel is valid; there is no mask.
/// * **`PerDataset`** – one mask is shared by all bands of the raster.
/// * **`Alpha`** – the mask is derived from an alpha band.
/// * **`NoData`** – the mask is derived from the band's no-data value.
#[derive(EnumSetType, Debug, Hash)]
pub enum MaskFlag {
	AllValid,
	PerDataset,
	Alpha,
	NoData,
}

pub type MaskFlags = EnumSet<MaskFlag>;

/// Returns `true` if the flags describe a real mask, i.e. anything other than exactly `AllValid`.
pub fn has_mask(flags: MaskFlags) -> bool {
	flags != EnumSet::only(MaskFlag::AllValid)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn all_valid_has_no_mask() {
		assert!(!has_mask(EnumSet::only(MaskFlag::AllValid)));
		assert!(has_mask(EnumSet::only(MaskFlag::NoData)));
		assert!(has_mask(MaskFlag::PerDataset | MaskFlag::Alpha));
		assert!(has_mask(EnumSet::empty()));
	}
}
