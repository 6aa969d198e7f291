/// One RGBA palette entry, stored the way GDAL does (`i16` components, usually `0..=255`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColorEntry {
	pub r: i16,
	pub g: i16,
	pub b: i16,
	pub a: i16,
}

impl ColorEntry {
	pub fn rgba(r: i16, g: i16, b: i16, a: i16) -> ColorEntry {
		ColorEntry { r, g, b, a }
	}
}

/// A palette attached to a band. It is copied verbatim and never remapped.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ColorTable {
	pub entries: Vec<ColorEntry>,
}

impl ColorTable {
	pub fn new(entries: Vec<ColorEntry>) -> ColorTable {
		ColorTable { entries }
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}
