use glam::{vec3, Mat4, Vec2};

use crate::formats::{DecodeError, Deser, IStrm, OStrm, Ser};

/// Transform of a node relative to its parent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformOffset {
	/// X Y
	pub translation: Vec2,
	/// Radians, counter-clockwise
	pub rotation: f32,
	/// X Y zoom
	pub scale: Vec2,
}

impl Default for TransformOffset {
	fn default() -> Self {
		Self {
			translation: Vec2::ZERO,
			rotation: 0.,
			scale: Vec2::ONE,
		}
	}
}

impl TransformOffset {
	pub fn to_matrix(&self) -> Mat4 {
		Mat4::from_translation(self.translation.extend(0.))
			* Mat4::from_rotation_z(self.rotation)
			* Mat4::from_scale(vec3(self.scale.x, self.scale.y, 1.))
	}
}

impl Ser for TransformOffset {
	fn ser(&self, strm: &mut OStrm) {
		strm.write(&self.translation);
		strm.write(&self.rotation);
		strm.write(&self.scale);
	}
}

impl Deser for TransformOffset {
	fn deser(strm: &mut IStrm) -> Result<Self, DecodeError> {
		Ok(Self {
			translation: strm.read()?,
			rotation: strm.read()?,
			scale: strm.read()?,
		})
	}
}
