use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use image::{ImageBuffer, ImageError, Rgba};
use tracing::{debug, error};

/// Decoded RGBA8 pixels, rows top to bottom.
pub struct ShallowTexture {
	pixels: Vec<u8>,
	width: u32,
	height: u32,
}

impl ShallowTexture {
	/// Panics if `pixels` is not `width * height * 4` bytes.
	pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> Self {
		assert_eq!(pixels.len(), (width * height * 4) as usize, "pixel buffer size mismatch");
		Self { pixels, width, height }
	}

	pub fn pixels(&self) -> &[u8] {
		&self.pixels
	}

	pub fn width(&self) -> u32 {
		self.width
	}

	pub fn height(&self) -> u32 {
		self.height
	}

	/// Alpha of the texel at `(x, y)`, `y` counted from the top row.
	pub fn alpha(&self, x: i64, y: i64) -> Option<u8> {
		if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
			return None;
		}
		let i = ((x + y * self.width as i64) * 4 + 3) as usize;
		self.pixels.get(i).copied()
	}
}

impl From<ImageBuffer<Rgba<u8>, Vec<u8>>> for ShallowTexture {
	fn from(value: ImageBuffer<Rgba<u8>, Vec<u8>>) -> Self {
		Self {
			width: value.width(),
			height: value.height(),
			pixels: value.into_raw(),
		}
	}
}

#[derive(Debug, thiserror::Error)]
#[error("Could not decode texture {path:?}")]
pub struct DecodeTextureError {
	path: PathBuf,
	#[source]
	source: ImageError,
}

fn decode_texture(path: &Path) -> Result<ShallowTexture, DecodeTextureError> {
	let img = image::open(path).map_err(|source| DecodeTextureError {
		path: path.to_owned(),
		source,
	})?;
	Ok(ShallowTexture::from(img.into_rgba8()))
}

/// Texture cache keyed by file name, relative to a base directory.
pub struct TextureLib {
	base: PathBuf,
	cache: HashMap<String, Rc<ShallowTexture>>,
}

impl TextureLib {
	pub fn new(base: impl Into<PathBuf>) -> Self {
		Self {
			base: base.into(),
			cache: HashMap::new(),
		}
	}

	pub fn insert(&mut self, name: impl Into<String>, texture: ShallowTexture) {
		self.cache.insert(name.into(), Rc::new(texture));
	}

	/// Cached texture, decoding it from disk on first use. Failures are logged and yield `None`.
	pub fn query(&mut self, name: &str) -> Option<Rc<ShallowTexture>> {
		if let Some(texture) = self.cache.get(name) {
			return Some(Rc::clone(texture));
		}
		match decode_texture(&self.base.join(name)) {
			Ok(texture) => {
				debug!("Loaded texture {name:?} ({}x{})", texture.width(), texture.height());
				let texture = Rc::new(texture);
				self.cache.insert(name.to_owned(), Rc::clone(&texture));
				Some(texture)
			}
			Err(e) => {
				error!("{}", e);
				None
			}
		}
	}

	/// Drops textures no node holds anymore.
	pub fn flush(&mut self) {
		self.cache.retain(|_, texture| Rc::strong_count(texture) > 1);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn alpha_lookup() {
		// 2x1: opaque, transparent
		let texture = ShallowTexture::from_rgba(2, 1, vec![0, 0, 0, 255, 0, 0, 0, 0]);
		assert_eq!(texture.alpha(0, 0), Some(255));
		assert_eq!(texture.alpha(1, 0), Some(0));
		assert_eq!(texture.alpha(2, 0), None);
		assert_eq!(texture.alpha(0, -1), None);
	}

	#[test]
	fn missing_file_is_none() {
		let mut lib = TextureLib::new("/nonexistent");
		assert!(lib.query("nope.png").is_none());
	}

	#[test]
	fn flush_keeps_used() {
		let mut lib = TextureLib::new(".");
		lib.insert("a", ShallowTexture::from_rgba(1, 1, vec![0; 4]));
		lib.insert("b", ShallowTexture::from_rgba(1, 1, vec![0; 4]));
		let held = lib.query("a");
		lib.flush();
		assert!(held.is_some());
		assert!(lib.cache.contains_key("a"));
		assert!(!lib.cache.contains_key("b"));
	}
}
