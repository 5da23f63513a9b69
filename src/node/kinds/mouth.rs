use std::collections::BTreeMap;
use std::rc::Rc;

use glam::{Vec2, Vec4};

use super::Sprite;
use crate::formats::{DecodeError, IStrm, OStrm};
use crate::inputs::{Viseme, VisemeSource};
use crate::node::{NodeClass, NodeKind};

/// Sprite whose frame follows the viseme currently detected in the voice input.
pub struct Mouth {
	sprite: Sprite,
	/// Viseme to sprite frame. Unmapped visemes keep the current frame.
	pub visemes: BTreeMap<Viseme, i32>,
	source: Rc<dyn VisemeSource>,
}

impl Mouth {
	pub fn new(sprite: Sprite, source: Rc<dyn VisemeSource>) -> Self {
		Self {
			sprite,
			visemes: BTreeMap::new(),
			source,
		}
	}

	pub fn bind(&mut self, viseme: Viseme, frame: i32) {
		self.visemes.insert(viseme, frame);
	}

	pub fn sprite(&self) -> &Sprite {
		&self.sprite
	}

	pub fn sprite_mut(&mut self) -> &mut Sprite {
		&mut self.sprite
	}
}

impl NodeClass for Mouth {
	const CLASS_NAME: &'static str = "Mouth";
}

impl NodeKind for Mouth {
	fn class_name(&self) -> &'static str {
		Self::CLASS_NAME
	}

	fn save(&self, strm: &mut OStrm) {
		self.sprite.save_fields(strm);
		strm.write(&self.visemes);
	}

	fn load(&mut self, strm: &mut IStrm, _version: u16) -> Result<(), DecodeError> {
		self.sprite.load_fields(strm)?;
		self.visemes = strm.read()?;
		Ok(())
	}

	fn size(&self) -> Option<Vec2> {
		self.sprite.size()
	}

	fn is_transparent(&self, local: Vec2) -> bool {
		self.sprite.is_transparent(local)
	}

	fn frame_uv(&self) -> Vec4 {
		self.sprite.frame_uv()
	}

	fn update(&mut self, _dt: f32) {
		if let Some(&frame) = self.visemes.get(&self.source.viseme()) {
			self.sprite.frame = frame;
		}
	}

	any_kind!();
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::inputs::Reading;

	#[test]
	fn frame_follows_viseme() {
		let reading = Reading::new(Viseme::Sil);
		let mut mouth = Mouth::new(Sprite::default(), Rc::new(reading.clone()));
		mouth.bind(Viseme::Sil, 0);
		mouth.bind(Viseme::Aa, 3);

		reading.set(Viseme::Aa);
		mouth.update(0.016);
		assert_eq!(mouth.sprite().frame, 3);

		reading.set(Viseme::Ou);
		mouth.update(0.016);
		assert_eq!(mouth.sprite().frame, 3);

		reading.set(Viseme::Sil);
		mouth.update(0.016);
		assert_eq!(mouth.sprite().frame, 0);
	}
}
