//! Scene orchestration: the tree plus its observers, edited through the undo log.

use std::fmt;
use std::mem;
use std::path::PathBuf;

use glam::Vec2;
use tracing::{debug, warn};

use crate::formats::project::{self, ProjectError};
use crate::formats::{IStrm, OStrm};
use crate::math::transform::TransformOffset;
use crate::math::viewport::Viewport;
use crate::node::{Node, NodeUuid};
use crate::registry::Registry;
use crate::tree::{DrawItem, NodeTree, TreeError};
use crate::undo::UndoLog;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageConfig {
	pub project_path: PathBuf,
	/// Maximum number of undo levels (0 = unlimited)
	pub undo_limit: usize,
}

impl Default for StageConfig {
	fn default() -> Self {
		Self {
			project_path: PathBuf::from("prj.tpp"),
			undo_limit: 0,
		}
	}
}

/// What undo entries edit: the tree and the ids observing it.
///
/// `selected` and `hovered` are plain ids. They never keep a node alive and
/// are cleared once they stop resolving to a node in the scene.
#[derive(Debug)]
pub struct Scene {
	pub tree: NodeTree,
	pub selected: Option<NodeUuid>,
	pub hovered: Option<NodeUuid>,
}

impl Scene {
	fn forget_detached(&mut self) {
		let tree = &self.tree;
		self.selected = self.selected.filter(|&uuid| tree.is_attached(uuid));
		self.hovered = self.hovered.filter(|&uuid| tree.is_attached(uuid));
	}
}

/// Structural steps replayed by undo entries were valid when recorded; a failure means broken history.
fn log_err<T>(op: &str, res: Result<T, TreeError>) {
	if let Err(e) = res {
		warn!("{op} failed: {e}");
	}
}

fn set_transform(scene: &mut Scene, uuid: NodeUuid, trans: TransformOffset) {
	if let Some(node) = scene.tree.get_mut(uuid) {
		node.trans_offset = trans;
	}
}

pub type Postponed = Box<dyn FnOnce(&mut Stage)>;

pub struct Stage {
	config: StageConfig,
	registry: Registry,
	scene: Scene,
	undo: UndoLog<Scene>,
	notices: Vec<String>,
	postponed: Vec<Postponed>,
}

impl Stage {
	/// Empty scene.
	pub fn new(config: StageConfig, registry: Registry) -> Self {
		Self::with_tree(config, registry, NodeTree::fresh())
	}

	/// Scene from `config.project_path`, or an empty one if it can't be loaded.
	///
	/// A project that exists but can't be read queues a notice, so an empty
	/// stage is never mistaken for the saved one.
	pub fn load(config: StageConfig, registry: Registry) -> Self {
		let (tree, failure) = project::load_or_fresh(&registry, &config.project_path);
		let mut stage = Self::with_tree(config, registry, tree);
		if let Some(e) = failure {
			stage.notify(format!("{e}, starting fresh"));
		}
		stage
	}

	fn with_tree(config: StageConfig, registry: Registry, tree: NodeTree) -> Self {
		Self {
			undo: UndoLog::with_max_levels(config.undo_limit),
			config,
			registry,
			scene: Scene {
				tree,
				selected: None,
				hovered: None,
			},
			notices: Vec::new(),
			postponed: Vec::new(),
		}
	}

	pub fn save(&self) -> Result<(), ProjectError> {
		project::save_project(&self.scene.tree, &self.config.project_path)
	}

	pub fn config(&self) -> &StageConfig {
		&self.config
	}

	pub fn registry(&self) -> &Registry {
		&self.registry
	}

	pub fn scene(&self) -> &Scene {
		&self.scene
	}

	pub fn tree(&self) -> &NodeTree {
		&self.scene.tree
	}

	pub fn selected(&self) -> Option<NodeUuid> {
		self.scene.selected
	}

	pub fn hovered(&self) -> Option<NodeUuid> {
		self.scene.hovered
	}

	pub fn draw_list(&self) -> Vec<DrawItem> {
		self.scene.tree.draw_list(self.scene.hovered, self.scene.selected)
	}

	// history

	/// Drops any uncommitted edit, then reverts the latest entry.
	pub fn undo(&mut self) -> bool {
		self.cancel();
		self.undo.undo(&mut self.scene)
	}

	pub fn redo(&mut self) -> bool {
		self.cancel();
		self.undo.redo(&mut self.scene)
	}

	pub fn has_undo(&self) -> bool {
		self.undo.has_undo()
	}

	pub fn has_redo(&self) -> bool {
		self.undo.has_redo()
	}

	// selection and pointer

	fn attached_selection(&self) -> Option<NodeUuid> {
		self.scene.selected.filter(|&uuid| self.scene.tree.is_attached(uuid))
	}

	/// Selected node, if it is in an edit session.
	fn editing(&self) -> Option<NodeUuid> {
		let uuid = self.scene.selected?;
		self.scene.tree.get(uuid)?.is_editing().then_some(uuid)
	}

	/// Undoable selection change. Ignored mid-edit, for detached nodes, or when nothing changes.
	pub fn select(&mut self, uuid: Option<NodeUuid>) {
		let prev = self.scene.selected;
		if prev == uuid || self.editing().is_some() {
			return;
		}
		if uuid.map_or(false, |uuid| !self.scene.tree.is_attached(uuid)) {
			return;
		}
		self.undo.record(
			&mut self.scene,
			move |scene: &mut Scene| scene.selected = uuid,
			move |scene: &mut Scene| scene.selected = prev,
		);
	}

	/// Drives the live edit session, or updates the hovered node when there is none.
	pub fn pointer_moved(&mut self, viewport: &Viewport, screen: Vec2) {
		match self.editing() {
			Some(uuid) => self.scene.tree.update_edit(uuid, viewport, screen),
			None => self.scene.hovered = self.scene.tree.node_under(viewport, screen),
		}
	}

	/// Commits the live edit session, otherwise selects whatever is under the pointer.
	pub fn click(&mut self, viewport: &Viewport, screen: Vec2) {
		if self.editing().is_some() {
			self.commit();
		} else {
			let hit = self.scene.tree.node_under(viewport, screen);
			self.select(hit);
		}
	}

	// edit sessions

	fn with_selected(&mut self, f: impl FnOnce(&mut Node) -> bool) -> bool {
		let Some(uuid) = self.attached_selection() else {
			return false;
		};
		self.scene.tree.get_mut(uuid).map_or(false, f)
	}

	pub fn translate_start(&mut self, screen: Vec2) -> bool {
		self.with_selected(|node| node.translate_start(screen))
	}

	pub fn scale_start(&mut self, screen: Vec2) -> bool {
		self.with_selected(|node| node.scale_start(screen))
	}

	pub fn rot_start(&mut self, screen: Vec2) -> bool {
		self.with_selected(|node| node.rot_start(screen))
	}

	/// Ends the live session and records its result. `false` if there was nothing to record.
	pub fn commit(&mut self) -> bool {
		let Some(uuid) = self.scene.selected else {
			return false;
		};
		let Some(commit) = self.scene.tree.get_mut(uuid).and_then(Node::commit) else {
			return false;
		};
		self.undo.record(
			&mut self.scene,
			move |scene: &mut Scene| set_transform(scene, uuid, commit.after),
			move |scene: &mut Scene| set_transform(scene, uuid, commit.before),
		);
		debug!("Committed transform of {uuid}");
		true
	}

	pub fn cancel(&mut self) {
		if let Some(node) = self.scene.selected.and_then(|uuid| self.scene.tree.get_mut(uuid)) {
			node.cancel();
		}
	}

	/// Advances animations of every node in the scene.
	pub fn tick(&mut self, dt: f32) {
		self.scene.tree.update(dt);
	}

	// structure

	/// Builds a node through the registry and adds it under the selection, or the root.
	///
	/// An unknown class leaves the scene untouched and queues a notice.
	pub fn add_node(&mut self, class_name: &str, name: &str) -> Option<NodeUuid> {
		self.cancel();
		let node = match self.registry.construct(class_name, name) {
			Ok(node) => node,
			Err(e) => {
				self.notify(e.to_string());
				return None;
			}
		};
		let parent = self.attached_selection().unwrap_or_else(|| self.scene.tree.root());
		let uuid = self.scene.tree.insert(node);
		let keep = self.scene.tree.retain(uuid);
		let prev = self.scene.selected;
		self.undo.record(
			&mut self.scene,
			move |scene: &mut Scene| {
				log_err("add", scene.tree.add_child(parent, uuid));
				scene.selected = Some(uuid);
			},
			move |scene: &mut Scene| {
				let _pin = &keep;
				log_err("add", scene.tree.unparent(uuid));
				scene.selected = prev;
				scene.forget_detached();
			},
		);
		debug!("Added {class_name} {name:?} as {uuid}");
		Some(uuid)
	}

	pub fn delete_selected(&mut self) -> bool {
		match self.scene.selected {
			Some(uuid) => self.delete(uuid),
			None => false,
		}
	}

	/// Detaches the subtree. It stays alive, same ids and all, for as long as the entry is in the history.
	pub fn delete(&mut self, uuid: NodeUuid) -> bool {
		self.cancel();
		let tree = &mut self.scene.tree;
		if !tree.is_attached(uuid) {
			return false;
		}
		// only the root has no position
		let Some((parent, index)) = tree.position(uuid) else {
			return false;
		};
		let keep = tree.retain(uuid);
		let prev = self.scene.selected;
		self.undo.record(
			&mut self.scene,
			move |scene: &mut Scene| {
				log_err("delete", scene.tree.unparent(uuid));
				scene.forget_detached();
			},
			move |scene: &mut Scene| {
				let _pin = &keep;
				log_err("delete", scene.tree.insert_at(parent, index, uuid));
				scene.selected = prev;
			},
		);
		debug!("Deleted {uuid}");
		true
	}

	/// Copies the selected subtree next to it, selects the copy and starts moving it.
	pub fn duplicate(&mut self, screen: Vec2) -> Option<NodeUuid> {
		self.cancel();
		let orig = self.attached_selection().filter(|&uuid| uuid != self.scene.tree.root())?;

		let mut strm = OStrm::new();
		self.scene.tree.save_subtree(orig, &mut strm).ok()?;
		let bytes = strm.into_bytes();
		let copy = match self.scene.tree.load_subtree(&self.registry, &mut IStrm::new(&bytes)) {
			Ok(copy) => copy,
			Err(e) => {
				self.notify(format!("Could not duplicate: {e}"));
				return None;
			}
		};

		let keep = self.scene.tree.retain(copy);
		self.undo.record(
			&mut self.scene,
			move |scene: &mut Scene| {
				log_err("duplicate", scene.tree.insert_after(orig, copy));
				scene.selected = Some(copy);
			},
			move |scene: &mut Scene| {
				let _pin = &keep;
				log_err("duplicate", scene.tree.unparent(copy));
				scene.selected = Some(orig);
				scene.forget_detached();
			},
		);
		debug!("Duplicated {orig} as {copy}");
		self.translate_start(screen);
		Some(copy)
	}

	/// Moves the selection out of its parent, right after it. `false` at the top level.
	pub fn unparent_selected(&mut self) -> bool {
		self.cancel();
		let Some(uuid) = self.attached_selection() else {
			return false;
		};
		let tree = &self.scene.tree;
		let Some((parent, index)) = tree.position(uuid) else {
			return false;
		};
		if tree.parent(parent).is_none() {
			return false;
		}
		self.undo.record(
			&mut self.scene,
			move |scene: &mut Scene| log_err("unparent", scene.tree.insert_after(parent, uuid)),
			move |scene: &mut Scene| log_err("unparent", scene.tree.insert_at(parent, index, uuid)),
		);
		debug!("Unparented {uuid} from {parent}");
		true
	}

	pub fn move_up_selected(&mut self) -> bool {
		self.swap_selected(true)
	}

	pub fn move_down_selected(&mut self) -> bool {
		self.swap_selected(false)
	}

	fn swap_selected(&mut self, up: bool) -> bool {
		self.cancel();
		let Some(uuid) = self.attached_selection() else {
			return false;
		};
		let Some((parent, index)) = self.scene.tree.position(uuid) else {
			return false;
		};
		let last = self.scene.tree.children(parent).count() - 1;
		if (up && index == 0) || (!up && index == last) {
			return false;
		}
		let swap = move |scene: &mut Scene, up: bool| {
			let res = if up { scene.tree.move_up(uuid) } else { scene.tree.move_down(uuid) };
			log_err("reorder", res);
		};
		self.undo.record(
			&mut self.scene,
			move |scene: &mut Scene| swap(scene, up),
			move |scene: &mut Scene| swap(scene, !up),
		);
		true
	}

	/// Moves the selection's next sibling into it, as its last child.
	pub fn parent_with_below_selected(&mut self) -> bool {
		self.cancel();
		let Some(uuid) = self.attached_selection() else {
			return false;
		};
		let tree = &self.scene.tree;
		let Some((parent, index)) = tree.position(uuid) else {
			return false;
		};
		let Some(below) = tree.children(parent).nth(index + 1) else {
			return false;
		};
		self.undo.record(
			&mut self.scene,
			move |scene: &mut Scene| log_err("group", scene.tree.add_child(uuid, below)),
			move |scene: &mut Scene| log_err("group", scene.tree.insert_after(uuid, below)),
		);
		debug!("Grouped {below} under {uuid}");
		true
	}

	/// Undoable change to one node's own state. `apply` runs right away.
	pub fn edit_node<A, R>(&mut self, uuid: NodeUuid, mut apply: A, mut revert: R) -> bool
	where
		A: FnMut(&mut Node) + 'static,
		R: FnMut(&mut Node) + 'static,
	{
		if !self.scene.tree.contains(uuid) {
			return false;
		}
		self.undo.record(
			&mut self.scene,
			move |scene: &mut Scene| {
				if let Some(node) = scene.tree.get_mut(uuid) {
					apply(node);
				}
			},
			move |scene: &mut Scene| {
				if let Some(node) = scene.tree.get_mut(uuid) {
					revert(node);
				}
			},
		);
		true
	}

	// frame boundary

	/// Runs `action` at the next [`end_frame`](Self::end_frame), outside any traversal.
	pub fn postpone(&mut self, action: impl FnOnce(&mut Stage) + 'static) {
		self.postponed.push(Box::new(action));
	}

	/// Runs postponed actions, frees unreferenced detached nodes and drops stale observers.
	pub fn end_frame(&mut self) {
		for action in mem::take(&mut self.postponed) {
			action(&mut *self);
		}
		self.scene.tree.sweep();
		self.scene.forget_detached();
	}

	fn notify(&mut self, msg: String) {
		warn!("{msg}");
		self.notices.push(msg);
	}

	/// Messages for the user queued since the last call.
	pub fn take_notices(&mut self) -> Vec<String> {
		mem::take(&mut self.notices)
	}
}

impl fmt::Debug for Stage {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Stage")
			.field("config", &self.config)
			.field("registry", &self.registry)
			.field("scene", &self.scene)
			.field("undo", &self.undo)
			.field("notices", &self.notices)
			.field("postponed", &self.postponed.len())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use std::rc::Rc;

	use glam::{vec2, Vec3};

	use super::*;
	use crate::math::camera::Camera;
	use crate::node::kinds::{Chat, ChatHub, ChatMsg, Root, Sprite};
	use crate::texture::ShallowTexture;

	fn registry(hub: &ChatHub) -> Registry {
		let mut registry = Registry::new();
		registry.register_kind(|_| Root);
		let texture = Rc::new(ShallowTexture::from_rgba(10, 10, vec![255; 400]));
		registry.register_kind(move |_| Sprite::with_texture(Rc::clone(&texture)));
		let hub = hub.clone();
		registry.register_kind(move |name| Chat::new(Some(hub.subscribe(name))));
		registry
	}

	fn stage() -> Stage {
		Stage::new(StageConfig::default(), registry(&ChatHub::default()))
	}

	fn viewport() -> Viewport {
		Viewport::from_camera(&Camera::default(), vec2(100., 100.))
	}

	/// Adds a sprite directly under the root.
	fn add_top(stage: &mut Stage, name: &str) -> NodeUuid {
		stage.select(Some(stage.tree().root()));
		stage.add_node("Sprite", name).unwrap()
	}

	fn names(stage: &Stage, parent: NodeUuid) -> Vec<String> {
		let tree = stage.tree();
		tree.children(parent).map(|c| tree.get(c).unwrap().name.clone()).collect()
	}

	#[test]
	fn add_node_nests_under_selection() {
		let mut stage = stage();
		let root = stage.tree().root();
		let a = stage.add_node("Sprite", "a").unwrap();
		assert_eq!(stage.selected(), Some(a));
		let b = stage.add_node("Sprite", "b").unwrap();
		assert_eq!(stage.tree().parent(b), Some(a));

		assert!(stage.undo());
		assert_eq!(stage.selected(), Some(a));
		assert!(!stage.tree().is_attached(b));

		assert!(stage.redo());
		assert_eq!(stage.tree().parent(b), Some(a));
		assert_eq!(stage.selected(), Some(b));
		assert_eq!(names(&stage, root), ["a"]);
	}

	#[test]
	fn unknown_class_is_a_notice() {
		let mut stage = stage();
		assert_eq!(stage.add_node("Hologram", "x"), None);
		assert!(!stage.has_undo());

		let notices = stage.take_notices();
		assert_eq!(notices.len(), 1);
		assert!(notices[0].contains("Hologram"));
		assert!(stage.take_notices().is_empty());
	}

	#[test]
	fn delete_restores_same_node() {
		let mut stage = stage();
		let root = stage.tree().root();
		let a = add_top(&mut stage, "a");
		add_top(&mut stage, "b");
		stage.select(Some(a));

		assert!(stage.delete_selected());
		assert_eq!(names(&stage, root), ["b"]);
		assert_eq!(stage.selected(), None);
		stage.end_frame();
		assert!(stage.tree().contains(a));

		assert!(stage.undo());
		assert_eq!(stage.tree().children_uuids(root)[0], a);
		assert_eq!(stage.selected(), Some(a));

		assert!(stage.redo());
		assert_eq!(names(&stage, root), ["b"]);
		assert!(!stage.delete(root));
	}

	#[test]
	fn superseded_entries_release_nodes() {
		let mut stage = stage();
		add_top(&mut stage, "b");
		let c = stage.add_node("Sprite", "c").unwrap();
		stage.undo();
		stage.end_frame();
		assert!(stage.tree().contains(c));

		stage.select(None);
		assert!(!stage.has_redo());
		stage.end_frame();
		assert!(!stage.tree().contains(c));
	}

	#[test]
	fn undo_limit_releases_oldest_delete() {
		let config = StageConfig {
			undo_limit: 1,
			..Default::default()
		};
		let mut stage = Stage::new(config, registry(&ChatHub::default()));
		let a = stage.add_node("Sprite", "a").unwrap();
		stage.delete_selected();
		stage.add_node("Sprite", "b").unwrap();
		stage.end_frame();
		assert!(!stage.tree().contains(a));

		assert!(stage.undo());
		assert!(!stage.undo());
	}

	#[test]
	fn deleted_chat_keeps_its_subscription() {
		let hub = ChatHub::default();
		let mut stage = Stage::new(StageConfig::default(), registry(&hub));
		let chat = stage.add_node("Chat", "mika").unwrap();
		stage.delete_selected();
		stage.end_frame();

		let msg = ChatMsg {
			display_name: "viewer".to_owned(),
			msg: "hi".to_owned(),
			color: Vec3::ONE,
		};
		assert_eq!(hub.publish("mika", msg), 1);
		stage.tick(0.1);
		let count = |stage: &Stage| stage.tree().get(chat).unwrap().kind::<Chat>().unwrap().msgs().count();
		assert_eq!(count(&stage), 0);

		stage.undo();
		stage.tick(0.1);
		assert_eq!(count(&stage), 1);
	}

	#[test]
	fn reorder_and_group_are_undoable() {
		let mut stage = stage();
		let root = stage.tree().root();
		let a = add_top(&mut stage, "a");
		let b = add_top(&mut stage, "b");
		add_top(&mut stage, "c");
		stage.select(Some(a));

		assert!(!stage.move_up_selected());
		assert!(stage.move_down_selected());
		assert_eq!(names(&stage, root), ["b", "a", "c"]);
		stage.undo();
		assert_eq!(names(&stage, root), ["a", "b", "c"]);

		assert!(stage.parent_with_below_selected());
		assert_eq!(names(&stage, root), ["a", "c"]);
		assert_eq!(names(&stage, a), ["b"]);
		assert!(!stage.unparent_selected());

		stage.select(Some(b));
		assert!(stage.unparent_selected());
		assert_eq!(names(&stage, root), ["a", "b", "c"]);
		assert!(names(&stage, a).is_empty());

		stage.undo();
		assert_eq!(names(&stage, a), ["b"]);
		stage.undo();
		stage.undo();
		assert_eq!(names(&stage, root), ["a", "b", "c"]);
	}

	#[test]
	fn click_select_drag_commit() {
		let mut stage = stage();
		let a = add_top(&mut stage, "a");
		stage.select(None);
		let vp = viewport();

		stage.pointer_moved(&vp, vec2(5., 95.));
		assert_eq!(stage.hovered(), Some(a));
		stage.click(&vp, vec2(5., 95.));
		assert_eq!(stage.selected(), Some(a));

		assert!(stage.translate_start(vec2(5., 95.)));
		stage.pointer_moved(&vp, vec2(25., 85.));
		let translation = |stage: &Stage| stage.tree().get(a).unwrap().trans_offset.translation;
		assert!((translation(&stage) - vec2(20., 10.)).length() < 1e-3);

		stage.click(&vp, vec2(25., 85.));
		assert!(!stage.tree().get(a).unwrap().is_editing());
		assert_eq!(stage.selected(), Some(a));

		assert!(stage.undo());
		assert_eq!(translation(&stage), Vec2::ZERO);
		assert!(stage.redo());
		assert!((translation(&stage) - vec2(20., 10.)).length() < 1e-3);

		stage.click(&vp, vec2(90., 10.));
		assert_eq!(stage.selected(), None);
	}

	#[test]
	fn cancel_leaves_no_history() {
		let mut stage = stage();
		let a = stage.add_node("Sprite", "a").unwrap();
		let vp = viewport();
		assert!(stage.rot_start(vec2(20., 90.)));
		assert!(!stage.scale_start(vec2(20., 90.)));
		stage.pointer_moved(&vp, vec2(0., 80.));
		assert_ne!(stage.tree().get(a).unwrap().trans_offset.rotation, 0.);

		stage.cancel();
		assert_eq!(stage.tree().get(a).unwrap().trans_offset.rotation, 0.);
		assert!(!stage.commit());
		stage.undo();
		assert!(!stage.tree().is_attached(a));
	}

	#[test]
	fn duplicate_copies_fields_and_moves_copy() {
		let mut stage = stage();
		let root = stage.tree().root();
		let a = add_top(&mut stage, "a");
		assert!(stage.edit_node(
			a,
			|node| node.kind_mut::<Sprite>().unwrap().cols = 2,
			|node| node.kind_mut::<Sprite>().unwrap().cols = 1,
		));

		let copy = stage.duplicate(vec2(5., 95.)).unwrap();
		assert_ne!(copy, a);
		assert_eq!(stage.tree().children_uuids(root), [a, copy]);
		assert_eq!(stage.selected(), Some(copy));
		let node = stage.tree().get(copy).unwrap();
		assert!(node.is_editing());
		assert_eq!(node.name, "a");
		assert_eq!(node.kind::<Sprite>().unwrap().cols, 2);

		stage.undo();
		assert_eq!(stage.tree().children_uuids(root), [a]);
		assert_eq!(stage.selected(), Some(a));
		stage.undo();
		assert_eq!(stage.tree().get(a).unwrap().kind::<Sprite>().unwrap().cols, 1);
	}

	#[test]
	fn postponed_actions_run_at_frame_end() {
		let mut stage = stage();
		let root = stage.tree().root();
		stage.postpone(|stage| {
			stage.add_node("Sprite", "late");
		});
		assert!(names(&stage, root).is_empty());
		stage.end_frame();
		assert_eq!(names(&stage, root), ["late"]);
	}

	#[test]
	fn save_and_reload() {
		let dir = tempfile::tempdir().unwrap();
		let config = StageConfig {
			project_path: dir.path().join("prj.tpp"),
			..Default::default()
		};
		let hub = ChatHub::default();

		let mut stage = Stage::new(config.clone(), registry(&hub));
		add_top(&mut stage, "a");
		stage.save().unwrap();

		let loaded = Stage::load(config, registry(&hub));
		assert_eq!(names(&loaded, loaded.tree().root()), ["a"]);
		assert!(!loaded.has_undo());
	}

	#[test]
	fn unreadable_project_is_a_notice() {
		let dir = tempfile::tempdir().unwrap();
		let config = StageConfig {
			project_path: dir.path().join("prj.tpp"),
			..Default::default()
		};
		let missing = Stage::load(config.clone(), registry(&ChatHub::default()));
		assert!(missing.notices.is_empty());

		let mut stage = Stage::new(config.clone(), registry(&ChatHub::default()));
		add_top(&mut stage, "cat");
		stage.save().unwrap();

		let mut roots_only = Registry::new();
		roots_only.register_kind(|_| Root);
		let mut loaded = Stage::load(config, roots_only);
		assert!(names(&loaded, loaded.tree().root()).is_empty());
		let notices = loaded.take_notices();
		assert_eq!(notices.len(), 1);
		assert!(notices[0].contains("Sprite"), "{notices:?}");
	}

	#[test]
	fn undo_of_add_or_duplicate_clears_hover() {
		let mut stage = stage();
		let vp = viewport();
		let a = stage.add_node("Sprite", "a").unwrap();
		stage.pointer_moved(&vp, vec2(5., 95.));
		assert_eq!(stage.hovered(), Some(a));
		stage.undo();
		assert_eq!(stage.hovered(), None);

		stage.redo();
		let copy = stage.duplicate(vec2(5., 95.)).unwrap();
		stage.cancel();
		stage.pointer_moved(&vp, vec2(5., 95.));
		assert_eq!(stage.hovered(), Some(copy));
		stage.undo();
		assert_eq!(stage.hovered(), None);
		assert_eq!(stage.selected(), Some(a));
	}
}
