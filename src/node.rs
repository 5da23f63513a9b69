pub mod kinds;

use std::any::Any;
use std::fmt;

use glam::{Mat4, Vec2, Vec4};

use crate::formats::{DecodeError, IStrm, OStrm};
use crate::math::transform::TransformOffset;
use crate::math::viewport::Viewport;

/// Stable identity of a node in a [`NodeTree`](crate::tree::NodeTree).
///
/// Never reused within a tree, so a stale id simply fails to resolve.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct NodeUuid(pub(crate) u32);

impl NodeUuid {
	pub fn raw(&self) -> u32 {
		self.0
	}
}

impl fmt::Display for NodeUuid {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "#{}", self.0)
	}
}

/// Variant-specific part of a node.
pub trait NodeKind: Any {
	/// Factory key. Constant for a given type.
	fn class_name(&self) -> &'static str;

	/// Version of the field layout written by `save`, passed back to `load`.
	fn schema_version(&self) -> u16 {
		1
	}

	fn save(&self, strm: &mut OStrm);

	fn load(&mut self, strm: &mut IStrm, version: u16) -> Result<(), DecodeError>;

	/// Extent in local units, `None` for nodes that can't be hit or drawn.
	fn size(&self) -> Option<Vec2> {
		None
	}

	/// Whether a local position inside `size` should let the pointer through.
	fn is_transparent(&self, _local: Vec2) -> bool {
		false
	}

	/// Texture sub-rectangle to draw, as `(u0, v0, u1, v1)`.
	fn frame_uv(&self) -> Vec4 {
		Vec4::new(0., 0., 1., 1.)
	}

	/// Animated displacement applied on top of the edited transform. Affects children.
	fn local_offset(&self) -> Vec2 {
		Vec2::ZERO
	}

	fn update(&mut self, _dt: f32) {}

	fn as_any(&self) -> &dyn Any;

	fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Compile-time class name, used to register a kind without repeating its name.
pub trait NodeClass {
	const CLASS_NAME: &'static str;
}

/// State captured when an edit session begins.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EditSession {
	/// Pointer position in window pixels
	pub start: Vec2,
	pub initial: TransformOffset,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum EditMode {
	#[default]
	Select,
	Translate(EditSession),
	Scale(EditSession),
	Rotate(EditSession),
}

impl EditMode {
	pub fn session(&self) -> Option<&EditSession> {
		match self {
			EditMode::Select => None,
			EditMode::Translate(s) | EditMode::Scale(s) | EditMode::Rotate(s) => Some(s),
		}
	}
}

/// Result of a committed edit session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EditCommit {
	pub before: TransformOffset,
	pub after: TransformOffset,
}

pub struct Node {
	pub(crate) uuid: NodeUuid,
	pub name: String,
	pub z_order: i32,
	pub trans_offset: TransformOffset,
	edit: EditMode,
	kind: Box<dyn NodeKind>,
}

impl Node {
	pub fn new(name: impl Into<String>, kind: Box<dyn NodeKind>) -> Self {
		Self {
			uuid: NodeUuid::default(),
			name: name.into(),
			z_order: 0,
			trans_offset: TransformOffset::default(),
			edit: EditMode::Select,
			kind,
		}
	}

	/// Assigned when the node is inserted into a tree.
	pub fn uuid(&self) -> NodeUuid {
		self.uuid
	}

	pub fn class_name(&self) -> &'static str {
		self.kind.class_name()
	}

	pub fn kind<K: NodeKind>(&self) -> Option<&K> {
		self.kind.as_any().downcast_ref()
	}

	pub fn kind_mut<K: NodeKind>(&mut self) -> Option<&mut K> {
		self.kind.as_any_mut().downcast_mut()
	}

	pub fn kind_dyn(&self) -> &dyn NodeKind {
		self.kind.as_ref()
	}

	pub fn kind_dyn_mut(&mut self) -> &mut dyn NodeKind {
		self.kind.as_mut()
	}

	/// Transform relative to the parent, animation offset included.
	pub fn local_matrix(&self) -> Mat4 {
		self.trans_offset.to_matrix() * Mat4::from_translation(self.kind.local_offset().extend(0.))
	}

	/// Bounds plus variant alpha test, in local units.
	pub fn hit(&self, local: Vec2) -> bool {
		let Some(size) = self.kind.size() else {
			return false;
		};
		local.x >= 0. && local.y >= 0. && local.x < size.x && local.y < size.y && !self.kind.is_transparent(local)
	}

	// edit sessions

	pub fn edit_mode(&self) -> &EditMode {
		&self.edit
	}

	pub fn is_editing(&self) -> bool {
		self.edit != EditMode::Select
	}

	fn session(&self, start: Vec2) -> Option<EditSession> {
		(!self.is_editing()).then_some(EditSession {
			start,
			initial: self.trans_offset,
		})
	}

	/// Ignored unless the node is in `Select`. Same for `scale_start` and `rot_start`.
	pub fn translate_start(&mut self, screen: Vec2) -> bool {
		self.session(screen)
			.map(|s| self.edit = EditMode::Translate(s))
			.is_some()
	}

	pub fn scale_start(&mut self, screen: Vec2) -> bool {
		self.session(screen).map(|s| self.edit = EditMode::Scale(s)).is_some()
	}

	pub fn rot_start(&mut self, screen: Vec2) -> bool {
		self.session(screen).map(|s| self.edit = EditMode::Rotate(s)).is_some()
	}

	/// Applies the live pointer delta. Deltas are measured in the parent's space.
	pub fn update_edit(&mut self, viewport: &Viewport, parent_world: Mat4, screen: Vec2) {
		let Some(session) = self.edit.session().copied() else {
			return;
		};
		let (Some(start), Some(cur)) = (
			viewport.unproject(parent_world, session.start),
			viewport.unproject(parent_world, screen),
		) else {
			return;
		};

		let initial = session.initial;
		let pivot = initial.translation;
		let mut trans = initial;
		match self.edit {
			EditMode::Select => {}
			EditMode::Translate(_) => trans.translation = initial.translation + (cur - start),
			EditMode::Scale(_) => {
				let from = (start - pivot).length();
				if from > f32::EPSILON {
					trans.scale = initial.scale * ((cur - pivot).length() / from);
				}
			}
			EditMode::Rotate(_) => {
				let (from, to) = (start - pivot, cur - pivot);
				trans.rotation = initial.rotation + to.y.atan2(to.x) - from.y.atan2(from.x);
			}
		}
		self.trans_offset = trans;
	}

	/// Ends the session keeping the live transform.
	///
	/// `None` if nothing was being edited or the transform ended up unchanged.
	pub fn commit(&mut self) -> Option<EditCommit> {
		let session = *std::mem::take(&mut self.edit).session()?;
		(session.initial != self.trans_offset).then_some(EditCommit {
			before: session.initial,
			after: self.trans_offset,
		})
	}

	/// Ends the session restoring the transform it started from.
	pub fn cancel(&mut self) {
		if let Some(session) = std::mem::take(&mut self.edit).session() {
			self.trans_offset = session.initial;
		}
	}

	// serialization

	/// Writes base fields followed by the variant's own fields.
	pub fn save(&self, strm: &mut OStrm) {
		strm.write(&self.trans_offset);
		strm.write(&self.z_order);
		strm.write(&self.kind.schema_version());
		self.kind.save(strm);
	}

	pub fn load(&mut self, strm: &mut IStrm) -> Result<(), DecodeError> {
		self.edit = EditMode::Select;
		self.trans_offset = strm.read()?;
		self.z_order = strm.read()?;
		let version = strm.read::<u16>()?;
		self.kind.load(strm, version)
	}
}

impl fmt::Debug for Node {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Node")
			.field("uuid", &self.uuid)
			.field("class_name", &self.class_name())
			.field("name", &self.name)
			.field("z_order", &self.z_order)
			.field("trans_offset", &self.trans_offset)
			.field("edit", &self.edit)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use glam::vec2;

	use super::kinds::Root;
	use super::*;
	use crate::math::camera::Camera;

	fn viewport() -> Viewport {
		Viewport::from_camera(&Camera::default(), vec2(100., 100.))
	}

	fn node() -> Node {
		let mut node = Node::new("n", Box::new(Root));
		node.trans_offset.translation = vec2(10., 10.);
		node
	}

	#[test]
	fn translate_then_commit() {
		let mut node = node();
		assert!(node.translate_start(vec2(50., 50.)));
		assert!(!node.scale_start(vec2(50., 50.)));

		node.update_edit(&viewport(), Mat4::IDENTITY, vec2(55., 45.));
		assert!((node.trans_offset.translation - vec2(15., 15.)).length() < 1e-4);

		let commit = node.commit().unwrap();
		assert_eq!(commit.before.translation, vec2(10., 10.));
		assert_eq!(commit.after, node.trans_offset);
		assert_eq!(*node.edit_mode(), EditMode::Select);
	}

	#[test]
	fn cancel_reverts_live_delta() {
		let mut node = node();
		node.scale_start(vec2(30., 70.));
		node.update_edit(&viewport(), Mat4::IDENTITY, vec2(50., 50.));
		assert_ne!(node.trans_offset.scale, Vec2::ONE);

		node.cancel();
		assert_eq!(node.trans_offset.scale, Vec2::ONE);
		assert!(!node.is_editing());
		assert!(node.commit().is_none());
	}

	#[test]
	fn scale_and_rotate_around_origin() {
		// origin is at window (10, 90)
		let mut node = node();
		node.scale_start(vec2(20., 90.));
		node.update_edit(&viewport(), Mat4::IDENTITY, vec2(30., 90.));
		assert!((node.trans_offset.scale - vec2(2., 2.)).length() < 1e-4);
		node.commit();

		node.rot_start(vec2(20., 90.));
		node.update_edit(&viewport(), Mat4::IDENTITY, vec2(10., 80.));
		assert!((node.trans_offset.rotation - std::f32::consts::FRAC_PI_2).abs() < 1e-4);
	}

	#[test]
	fn unchanged_commit_is_empty() {
		let mut node = node();
		node.rot_start(vec2(1., 1.));
		assert!(node.commit().is_none());
		assert!(!node.is_editing());
	}
}
