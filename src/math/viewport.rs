use glam::{vec2, vec3, Mat3, Mat4, Vec2};

use super::camera::Camera;

/// Projection plus window size: everything needed to map a pointer position onto a node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
	pub proj: Mat4,
	/// Window size in pixels
	pub size: Vec2,
}

impl Viewport {
	pub fn new(proj: Mat4, size: Vec2) -> Self {
		Self { proj, size }
	}

	pub fn from_camera(camera: &Camera, size: Vec2) -> Self {
		Self::new(camera.matrix(size), size)
	}

	/// Window pixels (y down) to normalized device coordinates (y up).
	pub fn to_ndc(&self, screen: Vec2) -> Vec2 {
		vec2(2. * screen.x / self.size.x - 1., 1. - 2. * screen.y / self.size.y)
	}

	/// Maps a window position onto the z = 0 plane of the space described by `world`.
	///
	/// `None` when the plane is seen edge-on.
	pub fn unproject(&self, world: Mat4, screen: Vec2) -> Option<Vec2> {
		let m = self.proj * world;
		// x, y and w rows of the projective map restricted to the z = 0 plane
		let plane = Mat3::from_cols(
			vec3(m.x_axis.x, m.x_axis.y, m.x_axis.w),
			vec3(m.y_axis.x, m.y_axis.y, m.y_axis.w),
			vec3(m.w_axis.x, m.w_axis.y, m.w_axis.w),
		);
		if plane.determinant().abs() <= f32::EPSILON * f32::EPSILON {
			return None;
		}
		let p = plane.inverse() * self.to_ndc(screen).extend(1.);
		if p.z.abs() <= f32::EPSILON {
			return None;
		}
		Some(p.truncate() / p.z)
	}
}
