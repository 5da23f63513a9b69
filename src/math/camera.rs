use glam::{Mat4, Vec2};

/// Pan/zoom/roll over the stage. Produces the projection handed to hit-testing and rendering.
pub struct Camera {
	pub position: Vec2,
	pub rotation: f32,
	pub scale: Vec2,
}

impl Default for Camera {
	fn default() -> Self {
		Self {
			position: Vec2::ZERO,
			rotation: 0.0,
			scale: Vec2::ONE,
		}
	}
}

impl Camera {
	/// Gets the real size of the viewport
	pub fn real_size(&self, viewport: Vec2) -> Vec2 {
		viewport / self.scale
	}

	/// Orthographic matrix with the origin at the bottom-left corner and y pointing up
	pub fn matrix(&self, viewport: Vec2) -> Mat4 {
		let real_size = self.real_size(viewport);

		Mat4::orthographic_rh_gl(0.0, real_size.x, 0.0, real_size.y, -1024.0, 1024.0)
			* Mat4::from_rotation_z(self.rotation)
			* Mat4::from_translation((-self.position).extend(0.0))
	}
}
