use std::rc::Rc;

use glam::{Vec2, Vec4};

use super::Sprite;
use crate::formats::{DecodeError, IStrm, OStrm};
use crate::inputs::PointerSource;
use crate::node::{NodeClass, NodeKind};

/// Pupil sprite that shifts towards where the tracked pointer is looking.
pub struct Eye {
	sprite: Sprite,
	/// Maximum pupil travel in local units.
	pub radius: f32,
	source: Rc<dyn PointerSource>,
	pupil: Vec2,
}

impl Eye {
	pub fn new(sprite: Sprite, source: Rc<dyn PointerSource>) -> Self {
		Self {
			sprite,
			radius: 10.,
			source,
			pupil: Vec2::ZERO,
		}
	}

	pub fn pupil(&self) -> Vec2 {
		self.pupil
	}

	pub fn sprite(&self) -> &Sprite {
		&self.sprite
	}
}

impl NodeClass for Eye {
	const CLASS_NAME: &'static str = "Eye";
}

impl NodeKind for Eye {
	fn class_name(&self) -> &'static str {
		Self::CLASS_NAME
	}

	fn save(&self, strm: &mut OStrm) {
		self.sprite.save_fields(strm);
		strm.write(&self.radius);
	}

	fn load(&mut self, strm: &mut IStrm, _version: u16) -> Result<(), DecodeError> {
		self.sprite.load_fields(strm)?;
		self.radius = strm.read()?;
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

	fn local_offset(&self) -> Vec2 {
		self.pupil
	}

	fn update(&mut self, _dt: f32) {
		self.pupil = self.source.look().clamp_length_max(1.) * self.radius;
	}

	any_kind!();
}

#[cfg(test)]
mod tests {
	use glam::vec2;

	use super::*;
	use crate::inputs::Reading;

	#[test]
	fn pupil_is_clamped_to_radius() {
		let reading = Reading::new(vec2(0.5, 0.));
		let mut eye = Eye::new(Sprite::default(), Rc::new(reading.clone()));
		eye.radius = 4.;
		eye.update(0.016);
		assert_eq!(eye.local_offset(), vec2(2., 0.));

		reading.set(vec2(3., 4.));
		eye.update(0.016);
		assert!((eye.pupil() - vec2(2.4, 3.2)).length() < 1e-5);
	}
}
