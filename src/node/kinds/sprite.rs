use std::rc::Rc;

use glam::{vec2, Vec2, Vec4};

use crate::formats::{DecodeError, IStrm, OStrm};
use crate::node::{NodeClass, NodeKind};
use crate::texture::{ShallowTexture, TextureLib};

/// Texels with alpha below this let the pointer through.
const ALPHA_THRESHOLD: u8 = 127;

/// Sprite sheet of `cols * rows` equally sized frames; shows one frame at a time.
pub struct Sprite {
	texture: Option<Rc<ShallowTexture>>,
	pub cols: i32,
	pub rows: i32,
	pub num_frames: i32,
	pub frame: i32,
}

impl Default for Sprite {
	fn default() -> Self {
		Self {
			texture: None,
			cols: 1,
			rows: 1,
			num_frames: 1,
			frame: 0,
		}
	}
}

impl Sprite {
	/// The node name doubles as the texture file name.
	pub fn new(textures: &mut TextureLib, name: &str) -> Self {
		Self {
			texture: textures.query(name),
			..Default::default()
		}
	}

	pub fn with_texture(texture: Rc<ShallowTexture>) -> Self {
		Self {
			texture: Some(texture),
			..Default::default()
		}
	}

	pub fn texture(&self) -> Option<&Rc<ShallowTexture>> {
		self.texture.as_ref()
	}

	/// Frame actually shown, wrapped into `[0, num_frames)`.
	pub fn current_frame(&self) -> i32 {
		self.frame.rem_euclid(self.num_frames.max(1))
	}

	/// Frame size in texels.
	fn frame_texels(&self) -> Option<(i64, i64)> {
		let texture = self.texture.as_ref()?;
		Some((
			texture.width() as i64 / self.cols.max(1) as i64,
			texture.height() as i64 / self.rows.max(1) as i64,
		))
	}

	pub(super) fn save_fields(&self, strm: &mut OStrm) {
		strm.write(&self.cols);
		strm.write(&self.rows);
		strm.write(&self.num_frames);
		strm.write(&self.frame);
	}

	pub(super) fn load_fields(&mut self, strm: &mut IStrm) -> Result<(), DecodeError> {
		self.cols = strm.read::<i32>()?.max(1);
		self.rows = strm.read::<i32>()?.max(1);
		self.num_frames = strm.read::<i32>()?.max(1);
		self.frame = strm.read()?;
		Ok(())
	}
}

impl NodeClass for Sprite {
	const CLASS_NAME: &'static str = "Sprite";
}

impl NodeKind for Sprite {
	fn class_name(&self) -> &'static str {
		Self::CLASS_NAME
	}

	fn save(&self, strm: &mut OStrm) {
		self.save_fields(strm);
	}

	fn load(&mut self, strm: &mut IStrm, _version: u16) -> Result<(), DecodeError> {
		self.load_fields(strm)
	}

	/// Whole texels only, so the box never covers a partial column the alpha test can't see.
	fn size(&self) -> Option<Vec2> {
		let (w, h) = self.frame_texels()?;
		Some(vec2(w as f32, h as f32))
	}

	fn is_transparent(&self, local: Vec2) -> bool {
		let (Some(texture), Some((w, h))) = (self.texture.as_ref(), self.frame_texels()) else {
			return true;
		};
		let frame = self.current_frame() as i64;
		let cols = self.cols.max(1) as i64;
		let (col, row) = (frame % cols, frame / cols);
		// local y points up, texture rows go down
		let x = col * w + local.x.floor() as i64;
		let y = row * h + (h - 1 - local.y.floor() as i64);
		texture.alpha(x, y).map_or(true, |a| a < ALPHA_THRESHOLD)
	}

	fn frame_uv(&self) -> Vec4 {
		let (cols, rows) = (self.cols.max(1) as f32, self.rows.max(1) as f32);
		let frame = self.current_frame();
		let u = (frame % self.cols.max(1)) as f32 / cols;
		let v = (rows - 1. - (frame / self.cols.max(1)) as f32) / rows;
		Vec4::new(u, v, u + 1. / cols, v + 1. / rows)
	}

	any_kind!();
}

/// Sprite cycling through its frames at a fixed rate.
pub struct AnimSprite {
	sprite: Sprite,
	pub fps: f32,
	elapsed: f32,
}

impl AnimSprite {
	pub fn new(sprite: Sprite) -> Self {
		Self {
			sprite,
			fps: 10.,
			elapsed: 0.,
		}
	}

	pub fn sprite(&self) -> &Sprite {
		&self.sprite
	}

	pub fn sprite_mut(&mut self) -> &mut Sprite {
		&mut self.sprite
	}
}

impl NodeClass for AnimSprite {
	const CLASS_NAME: &'static str = "AnimSprite";
}

impl NodeKind for AnimSprite {
	fn class_name(&self) -> &'static str {
		Self::CLASS_NAME
	}

	fn save(&self, strm: &mut OStrm) {
		self.sprite.save_fields(strm);
		strm.write(&self.fps);
	}

	fn load(&mut self, strm: &mut IStrm, _version: u16) -> Result<(), DecodeError> {
		self.sprite.load_fields(strm)?;
		self.fps = strm.read()?;
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

	fn update(&mut self, dt: f32) {
		self.elapsed += dt;
		let frames = self.sprite.num_frames.max(1);
		self.sprite.frame = ((self.elapsed * self.fps) as i64 % frames as i64) as i32;
	}

	any_kind!();
}
