use std::collections::HashMap;
use std::fmt::{self, Display};
use std::rc::{Rc, Weak};

use glam::{Mat4, Vec2, Vec4};
use indextree::{Arena, NodeId};
use tracing::debug;

use crate::formats::{IStrm, LoadError, OStrm};
use crate::math::viewport::Viewport;
use crate::node::kinds::Root;
use crate::node::{Node, NodeUuid};
use crate::registry::Registry;

/// Deepest nesting accepted when loading.
const MAX_DEPTH: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
	#[error("Unknown node {0}")]
	UnknownNode(NodeUuid),
	#[error("Node {0} is the scene root")]
	IsRoot(NodeUuid),
	#[error("Node {child} is an ancestor of {parent}")]
	Cycle { parent: NodeUuid, child: NodeUuid },
	#[error(transparent)]
	Structure(#[from] indextree::NodeError),
}

/// Keeps a detached subtree from being freed by [`NodeTree::sweep`] while any clone is alive.
#[derive(Debug, Clone)]
pub struct Retain {
	uuid: NodeUuid,
	_pin: Rc<()>,
}

impl Retain {
	pub fn uuid(&self) -> NodeUuid {
		self.uuid
	}
}

/// One node as the renderer should draw it.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawItem {
	pub uuid: NodeUuid,
	pub world: Mat4,
	pub size: Vec2,
	pub uv: Vec4,
	pub z_order: i32,
	pub hovered: bool,
	pub selected: bool,
}

/// Arena-backed scene tree.
///
/// The arena owns every node. Nodes reachable from the root form the scene;
/// detached nodes stay in the arena until [`sweep`](Self::sweep) frees the
/// ones no [`Retain`] keeps alive.
#[derive(Debug)]
pub struct NodeTree {
	root: NodeId,
	arena: Arena<Node>,
	uuids: HashMap<NodeUuid, NodeId>,
	next_uuid: u32,
	retains: HashMap<NodeUuid, Weak<()>>,
}

impl NodeTree {
	pub fn new_with_root(mut root: Node) -> Self {
		root.uuid = NodeUuid(0);
		let mut arena = Arena::new();
		let root_id = arena.new_node(root);
		Self {
			root: root_id,
			arena,
			uuids: HashMap::from([(NodeUuid(0), root_id)]),
			next_uuid: 1,
			retains: HashMap::new(),
		}
	}

	/// Empty scene with a plain `Root`.
	pub fn fresh() -> Self {
		Self::new_with_root(Node::new("root", Box::new(Root)))
	}

	pub fn root(&self) -> NodeUuid {
		self.arena[self.root].get().uuid
	}

	fn id(&self, uuid: NodeUuid) -> Result<NodeId, TreeError> {
		self.uuids.get(&uuid).copied().ok_or(TreeError::UnknownNode(uuid))
	}

	fn uuid_of(&self, id: NodeId) -> NodeUuid {
		self.arena[id].get().uuid
	}

	/// Adds a detached node and gives it a fresh uuid.
	pub fn insert(&mut self, mut node: Node) -> NodeUuid {
		let uuid = NodeUuid(self.next_uuid);
		self.next_uuid += 1;
		node.uuid = uuid;
		let id = self.arena.new_node(node);
		self.uuids.insert(uuid, id);
		uuid
	}

	pub fn get(&self, uuid: NodeUuid) -> Option<&Node> {
		Some(self.arena.get(*self.uuids.get(&uuid)?)?.get())
	}

	pub fn get_mut(&mut self, uuid: NodeUuid) -> Option<&mut Node> {
		Some(self.arena.get_mut(*self.uuids.get(&uuid)?)?.get_mut())
	}

	pub fn contains(&self, uuid: NodeUuid) -> bool {
		self.uuids.contains_key(&uuid)
	}

	/// Number of live nodes, detached ones included.
	pub fn len(&self) -> usize {
		self.uuids.len()
	}

	pub fn is_empty(&self) -> bool {
		self.uuids.is_empty()
	}

	pub fn parent(&self, uuid: NodeUuid) -> Option<NodeUuid> {
		let node = self.arena.get(*self.uuids.get(&uuid)?)?;
		Some(self.uuid_of(node.parent()?))
	}

	pub fn children(&self, uuid: NodeUuid) -> impl Iterator<Item = NodeUuid> + '_ {
		(self.uuids.get(&uuid).copied().into_iter())
			.flat_map(move |id| id.children(&self.arena))
			.map(move |id| self.uuid_of(id))
	}

	pub fn children_uuids(&self, uuid: NodeUuid) -> Vec<NodeUuid> {
		self.children(uuid).collect()
	}

	/// Scene nodes in pre-order, root first.
	pub fn iter(&self) -> impl Iterator<Item = &Node> + '_ {
		self.root.descendants(&self.arena).map(move |id| self.arena[id].get())
	}

	/// Whether the node is part of the scene, as opposed to detached.
	pub fn is_attached(&self, uuid: NodeUuid) -> bool {
		self.uuids
			.get(&uuid)
			.map_or(false, |id| id.ancestors(&self.arena).any(|a| a == self.root))
	}

	/// Parent and index among its siblings.
	pub fn position(&self, uuid: NodeUuid) -> Option<(NodeUuid, usize)> {
		let id = *self.uuids.get(&uuid)?;
		let parent = self.arena.get(id)?.parent()?;
		Some((self.uuid_of(parent), id.preceding_siblings(&self.arena).count() - 1))
	}

	/// Resolves `child` for a move under `parent`, rejecting the root and cycles.
	fn movable(&self, parent: NodeUuid, child: NodeUuid) -> Result<(NodeId, NodeId), TreeError> {
		let (parent_id, child_id) = (self.id(parent)?, self.id(child)?);
		if child_id == self.root {
			return Err(TreeError::IsRoot(child));
		}
		if parent_id.ancestors(&self.arena).any(|a| a == child_id) {
			return Err(TreeError::Cycle { parent, child });
		}
		Ok((parent_id, child_id))
	}

	// structure

	/// Appends `child` as the last child of `parent`, detaching it from wherever it was.
	pub fn add_child(&mut self, parent: NodeUuid, child: NodeUuid) -> Result<(), TreeError> {
		let (parent_id, child_id) = self.movable(parent, child)?;
		child_id.detach(&mut self.arena);
		parent_id.checked_append(child_id, &mut self.arena)?;
		Ok(())
	}

	/// Puts `child` at `index` among `parent`'s children, or last if `index` is past the end.
	pub fn insert_at(&mut self, parent: NodeUuid, index: usize, child: NodeUuid) -> Result<(), TreeError> {
		let (parent_id, child_id) = self.movable(parent, child)?;
		child_id.detach(&mut self.arena);
		match parent_id.children(&self.arena).nth(index) {
			Some(next) => next.checked_insert_before(child_id, &mut self.arena)?,
			None => parent_id.checked_append(child_id, &mut self.arena)?,
		}
		Ok(())
	}

	/// Puts `node` right after `sibling`, under the same parent.
	pub fn insert_after(&mut self, sibling: NodeUuid, node: NodeUuid) -> Result<(), TreeError> {
		let parent = self.parent(sibling).ok_or(TreeError::IsRoot(sibling))?;
		let (_, node_id) = self.movable(parent, node)?;
		let sibling_id = self.id(sibling)?;
		node_id.detach(&mut self.arena);
		sibling_id.checked_insert_after(node_id, &mut self.arena)?;
		Ok(())
	}

	/// Detaches the node from its parent. `false` if it had none.
	pub fn unparent(&mut self, uuid: NodeUuid) -> Result<bool, TreeError> {
		let id = self.id(uuid)?;
		if self.arena[id].parent().is_none() {
			return Ok(false);
		}
		id.detach(&mut self.arena);
		debug!("Detached {uuid}");
		Ok(true)
	}

	/// Swaps with the previous sibling. `false` if already first.
	pub fn move_up(&mut self, uuid: NodeUuid) -> Result<bool, TreeError> {
		let id = self.id(uuid)?;
		let Some(prev) = self.arena[id].previous_sibling() else {
			return Ok(false);
		};
		id.detach(&mut self.arena);
		prev.checked_insert_before(id, &mut self.arena)?;
		Ok(true)
	}

	/// Swaps with the next sibling. `false` if already last.
	pub fn move_down(&mut self, uuid: NodeUuid) -> Result<bool, TreeError> {
		let id = self.id(uuid)?;
		let Some(next) = self.arena[id].next_sibling() else {
			return Ok(false);
		};
		id.detach(&mut self.arena);
		next.checked_insert_after(id, &mut self.arena)?;
		Ok(true)
	}

	/// Moves the next sibling under this node, as its last child. Returns the moved node.
	pub fn parent_with_below(&mut self, uuid: NodeUuid) -> Result<Option<NodeUuid>, TreeError> {
		let id = self.id(uuid)?;
		let Some(next) = self.arena[id].next_sibling() else {
			return Ok(None);
		};
		next.detach(&mut self.arena);
		id.checked_append(next, &mut self.arena)?;
		Ok(Some(self.uuid_of(next)))
	}

	// lifetime of detached nodes

	pub fn retain(&mut self, uuid: NodeUuid) -> Retain {
		if let Some(pin) = self.retains.get(&uuid).and_then(Weak::upgrade) {
			return Retain { uuid, _pin: pin };
		}
		let pin = Rc::new(());
		self.retains.insert(uuid, Rc::downgrade(&pin));
		Retain { uuid, _pin: pin }
	}

	pub fn is_retained(&self, uuid: NodeUuid) -> bool {
		self.retains.get(&uuid).map_or(false, |pin| pin.strong_count() > 0)
	}

	/// Frees detached subtrees that nothing retains. Returns how many nodes were freed.
	pub fn sweep(&mut self) -> usize {
		self.retains.retain(|_, pin| pin.strong_count() > 0);

		let orphans: Vec<NodeId> = (self.uuids.iter())
			.filter(|(uuid, id)| {
				**id != self.root && self.arena[**id].parent().is_none() && !self.is_retained(**uuid)
			})
			.map(|(_, id)| *id)
			.collect();

		let mut freed = 0;
		for orphan in orphans {
			let doomed: Vec<NodeUuid> = orphan.descendants(&self.arena).map(|id| self.uuid_of(id)).collect();
			// something inside is still wanted, keep the whole subtree around
			if doomed.iter().any(|uuid| self.is_retained(*uuid)) {
				continue;
			}
			for uuid in &doomed {
				self.uuids.remove(uuid);
			}
			orphan.remove_subtree(&mut self.arena);
			freed += doomed.len();
		}
		if freed > 0 {
			debug!("Swept {freed} detached nodes");
		}
		freed
	}

	// spatial queries

	/// Product of local transforms from the root down to the node.
	pub fn world_matrix(&self, uuid: NodeUuid) -> Option<Mat4> {
		let id = *self.uuids.get(&uuid)?;
		Some(
			id.ancestors(&self.arena)
				.fold(Mat4::IDENTITY, |m, a| self.arena[a].get().local_matrix() * m),
		)
	}

	pub fn parent_world_matrix(&self, uuid: NodeUuid) -> Option<Mat4> {
		match self.parent(uuid) {
			Some(parent) => self.world_matrix(parent),
			None => self.contains(uuid).then_some(Mat4::IDENTITY),
		}
	}

	/// Topmost scene node under a window position.
	///
	/// Highest `z_order` wins; among equals, the one visited last in pre-order.
	pub fn node_under(&self, viewport: &Viewport, screen: Vec2) -> Option<NodeUuid> {
		let mut best = None;
		self.rec_node_under(self.root, Mat4::IDENTITY, viewport, screen, &mut best);
		best.map(|(_, uuid)| uuid)
	}

	fn rec_node_under(
		&self,
		id: NodeId,
		parent_world: Mat4,
		viewport: &Viewport,
		screen: Vec2,
		best: &mut Option<(i32, NodeUuid)>,
	) {
		let node = self.arena[id].get();
		let world = parent_world * node.local_matrix();
		if node.kind_dyn().size().is_some() && best.map_or(true, |(z, _)| node.z_order >= z) {
			if let Some(local) = viewport.unproject(world, screen) {
				if node.hit(local) {
					*best = Some((node.z_order, node.uuid));
				}
			}
		}
		for child in id.children(&self.arena) {
			self.rec_node_under(child, world, viewport, screen, best);
		}
	}

	/// Drawable scene nodes back to front.
	pub fn draw_list(&self, hovered: Option<NodeUuid>, selected: Option<NodeUuid>) -> Vec<DrawItem> {
		let mut items = Vec::new();
		self.rec_draw_list(self.root, Mat4::IDENTITY, hovered, selected, &mut items);
		items.sort_by_key(|item| item.z_order);
		items
	}

	fn rec_draw_list(
		&self,
		id: NodeId,
		parent_world: Mat4,
		hovered: Option<NodeUuid>,
		selected: Option<NodeUuid>,
		items: &mut Vec<DrawItem>,
	) {
		let node = self.arena[id].get();
		let world = parent_world * node.local_matrix();
		if let Some(size) = node.kind_dyn().size() {
			items.push(DrawItem {
				uuid: node.uuid,
				world,
				size,
				uv: node.kind_dyn().frame_uv(),
				z_order: node.z_order,
				hovered: hovered == Some(node.uuid),
				selected: selected == Some(node.uuid),
			});
		}
		for child in id.children(&self.arena) {
			self.rec_draw_list(child, world, hovered, selected, items);
		}
	}

	// per frame

	/// Advances every scene node's own animation.
	pub fn update(&mut self, dt: f32) {
		let ids: Vec<NodeId> = self.root.descendants(&self.arena).collect();
		for id in ids {
			self.arena[id].get_mut().kind_dyn_mut().update(dt);
		}
	}

	/// Feeds the pointer to the node's edit session, if it has one.
	pub fn update_edit(&mut self, uuid: NodeUuid, viewport: &Viewport, screen: Vec2) {
		let Some(parent_world) = self.parent_world_matrix(uuid) else {
			return;
		};
		if let Some(node) = self.get_mut(uuid) {
			node.update_edit(viewport, parent_world, screen);
		}
	}

	// serialization

	/// Pre-order: class name, name, fields, child count, children.
	pub fn save_subtree(&self, uuid: NodeUuid, strm: &mut OStrm) -> Result<(), TreeError> {
		self.rec_save(self.id(uuid)?, strm);
		Ok(())
	}

	pub fn save_all(&self, strm: &mut OStrm) {
		self.rec_save(self.root, strm);
	}

	fn rec_save(&self, id: NodeId, strm: &mut OStrm) {
		let node = self.arena[id].get();
		strm.write(node.class_name());
		strm.write(&node.name);
		node.save(strm);
		strm.write(&(id.children(&self.arena).count() as u32));
		for child in id.children(&self.arena) {
			self.rec_save(child, strm);
		}
	}

	/// Rebuilds a whole tree; the first node read becomes the root.
	pub fn load_all(registry: &Registry, strm: &mut IStrm) -> Result<Self, LoadError> {
		let class_name = strm.read::<String>()?;
		let name = strm.read::<String>()?;
		let mut tree = Self::new_with_root(registry.construct(&class_name, &name)?);
		let root = tree.root;
		tree.load_body(registry, strm, root, 0)?;
		Ok(tree)
	}

	/// Reads one subtree into this tree, detached. Partial results on error are left for `sweep`.
	pub fn load_subtree(&mut self, registry: &Registry, strm: &mut IStrm) -> Result<NodeUuid, LoadError> {
		self.rec_load(registry, strm, 0)
	}

	fn rec_load(&mut self, registry: &Registry, strm: &mut IStrm, depth: usize) -> Result<NodeUuid, LoadError> {
		if depth > MAX_DEPTH {
			return Err(LoadError::TooDeep(MAX_DEPTH));
		}
		let class_name = strm.read::<String>()?;
		let name = strm.read::<String>()?;
		let uuid = self.insert(registry.construct(&class_name, &name)?);
		let id = self.uuids[&uuid];
		self.load_body(registry, strm, id, depth)?;
		Ok(uuid)
	}

	fn load_body(&mut self, registry: &Registry, strm: &mut IStrm, id: NodeId, depth: usize) -> Result<(), LoadError> {
		self.arena[id].get_mut().load(strm)?;
		let count = strm.read::<u32>()?;
		for _ in 0..count {
			let child = self.rec_load(registry, strm, depth + 1)?;
			id.append(self.uuids[&child], &mut self.arena);
		}
		Ok(())
	}
}

fn rec_fmt(indent: usize, f: &mut fmt::Formatter<'_>, node_id: NodeId, arena: &Arena<Node>) -> fmt::Result {
	let Some(node) = arena.get(node_id) else {
		return Ok(());
	};

	let node = node.get();

	let type_name = node.class_name();
	#[cfg(feature = "owo")]
	let type_name = {
		use owo_colors::OwoColorize;
		type_name.magenta()
	};

	writeln!(f, "{}- [{}] {}", "  ".repeat(indent), type_name, node.name)?;
	for child in node_id.children(arena) {
		rec_fmt(indent + 1, f, child, arena)?;
	}

	Ok(())
}

impl Display for NodeTree {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		rec_fmt(0, f, self.root, &self.arena)
	}
}
