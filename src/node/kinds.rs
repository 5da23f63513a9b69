//! Concrete node variants and their factory wiring.

macro_rules! any_kind {
	() => {
		fn as_any(&self) -> &dyn std::any::Any {
			self
		}

		fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
			self
		}
	};
}

mod bouncer;
mod chat;
mod eye;
mod mouth;
mod root;
mod sprite;

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use glam::Vec2;

use crate::inputs::{Reading, Viseme};
use crate::registry::Registry;
use crate::texture::TextureLib;

pub use bouncer::{Bouncer, Bouncer2};
pub use chat::{dedup, dialog_line, escape_name, Chat, ChatHub, ChatMsg, Utterance};
pub use eye::Eye;
pub use mouth::Mouth;
pub use root::Root;
pub use sprite::{AnimSprite, Sprite};

/// Everything outside the tree that built-in variants read from.
#[derive(Clone)]
pub struct Services {
	pub textures: Rc<RefCell<TextureLib>>,
	pub visemes: Reading<Viseme>,
	pub pointer: Reading<Vec2>,
	pub level: Reading<f32>,
	pub chat: ChatHub,
}

impl Services {
	pub fn new(texture_dir: impl Into<PathBuf>) -> Self {
		Self {
			textures: Rc::new(RefCell::new(TextureLib::new(texture_dir))),
			visemes: Reading::default(),
			pointer: Reading::default(),
			level: Reading::default(),
			chat: ChatHub::default(),
		}
	}
}

/// Registers every built-in variant, each constructor capturing what it needs from `services`.
pub fn register_builtin(registry: &mut Registry, services: &Services) {
	registry.register_kind(|_| Root);

	let textures = Rc::clone(&services.textures);
	registry.register_kind(move |name| Sprite::new(&mut textures.borrow_mut(), name));

	let textures = Rc::clone(&services.textures);
	registry.register_kind(move |name| AnimSprite::new(Sprite::new(&mut textures.borrow_mut(), name)));

	let (textures, visemes) = (Rc::clone(&services.textures), services.visemes.clone());
	registry.register_kind(move |name| {
		Mouth::new(
			Sprite::new(&mut textures.borrow_mut(), name),
			Rc::new(visemes.clone()),
		)
	});

	let (textures, pointer) = (Rc::clone(&services.textures), services.pointer.clone());
	registry.register_kind(move |name| {
		Eye::new(
			Sprite::new(&mut textures.borrow_mut(), name),
			Rc::new(pointer.clone()),
		)
	});

	let chat = services.chat.clone();
	registry.register_kind(move |name| Chat::new(Some(chat.subscribe(name))));

	let level = services.level.clone();
	registry.register_kind(move |_| Bouncer::new(Rc::new(level.clone())));

	let level = services.level.clone();
	registry.register_kind(move |_| Bouncer2::new(Rc::new(level.clone())));
}

#[cfg(test)]
mod tests {
	use std::collections::BTreeMap;

	use glam::vec2;

	use super::*;
	use crate::formats::{IStrm, OStrm};
	use crate::node::{Node, NodeUuid};
	use crate::tree::NodeTree;

	fn child(tree: &mut NodeTree, registry: &Registry, parent: NodeUuid, class: &str, name: &str) -> NodeUuid {
		let uuid = tree.insert(registry.construct(class, name).unwrap());
		tree.add_child(parent, uuid).unwrap();
		uuid
	}

	fn only_child(tree: &NodeTree, parent: NodeUuid) -> &Node {
		let children = tree.children_uuids(parent);
		assert_eq!(children.len(), 1);
		tree.get(children[0]).unwrap()
	}

	#[test]
	fn every_builtin_class_round_trips() {
		let services = Services::new("/nonexistent");
		let mut registry = Registry::new();
		register_builtin(&mut registry, &services);

		// root -> bouncer -> bouncer2 -> anim -> mouth -> eye -> chat -> sprite
		let mut tree = NodeTree::fresh();
		let mut parent = tree.root();
		let mut chain = Vec::new();
		for (class, name) in [
			("Bouncer", "hop"),
			("Bouncer2", "spring"),
			("AnimSprite", "tail"),
			("Mouth", "mouth"),
			("Eye", "eye"),
			("Chat", "mika"),
			("Sprite", "cat"),
		] {
			parent = child(&mut tree, &registry, parent, class, name);
			chain.push(parent);
		}

		let [hop, spring, tail, mouth, eye, chat, cat] = chain[..] else {
			unreachable!();
		};
		{
			let node = tree.get_mut(hop).unwrap();
			node.z_order = -3;
			node.trans_offset.translation = vec2(4., 5.);
			let bouncer = node.kind_mut::<Bouncer>().unwrap();
			bouncer.strength = 120.;
			bouncer.threshold = 0.25;
		}
		{
			let bouncer2 = tree.get_mut(spring).unwrap().kind_mut::<Bouncer2>().unwrap();
			bouncer2.amplitude = 7.;
			bouncer2.props.stiffness = 50.;
			bouncer2.props.damping = 2.5;
		}
		{
			let anim = tree.get_mut(tail).unwrap().kind_mut::<AnimSprite>().unwrap();
			anim.fps = 24.;
			anim.sprite_mut().cols = 4;
			anim.sprite_mut().num_frames = 8;
		}
		{
			let node = tree.get_mut(mouth).unwrap();
			node.trans_offset.scale = vec2(2., 0.5);
			let mouth = node.kind_mut::<Mouth>().unwrap();
			mouth.bind(Viseme::Aa, 3);
			mouth.bind(Viseme::Ou, 1);
			mouth.sprite_mut().rows = 2;
		}
		tree.get_mut(eye).unwrap().kind_mut::<Eye>().unwrap().radius = 3.5;
		{
			let chat = tree.get_mut(chat).unwrap().kind_mut::<Chat>().unwrap();
			chat.size = vec2(320., 200.);
			chat.pt_size = 30;
			chat.tts = true;
			chat.voices_map.insert("bob".to_owned(), "en-GB".to_owned());
		}
		{
			let node = tree.get_mut(cat).unwrap();
			node.trans_offset.rotation = 1.25;
			let sprite = node.kind_mut::<Sprite>().unwrap();
			sprite.cols = 3;
			sprite.num_frames = 3;
			sprite.frame = 2;
		}

		let mut os = OStrm::new();
		tree.save_all(&mut os);
		let bytes = os.into_bytes();
		let mut is = IStrm::new(&bytes);
		let loaded = NodeTree::load_all(&registry, &mut is).unwrap();
		assert!(is.is_empty());
		assert_eq!(loaded.to_string(), tree.to_string());

		let node = only_child(&loaded, loaded.root());
		assert_eq!((node.z_order, node.trans_offset.translation), (-3, vec2(4., 5.)));
		let bouncer = node.kind::<Bouncer>().unwrap();
		assert_eq!((bouncer.strength, bouncer.threshold), (120., 0.25));

		let node = only_child(&loaded, node.uuid());
		let bouncer2 = node.kind::<Bouncer2>().unwrap();
		assert_eq!(bouncer2.amplitude, 7.);
		assert_eq!((bouncer2.props.stiffness, bouncer2.props.damping), (50., 2.5));

		let node = only_child(&loaded, node.uuid());
		let anim = node.kind::<AnimSprite>().unwrap();
		assert_eq!(anim.fps, 24.);
		assert_eq!((anim.sprite().cols, anim.sprite().num_frames), (4, 8));

		let node = only_child(&loaded, node.uuid());
		assert_eq!(node.trans_offset.scale, vec2(2., 0.5));
		let mouth = node.kind::<Mouth>().unwrap();
		assert_eq!(mouth.visemes, BTreeMap::from([(Viseme::Aa, 3), (Viseme::Ou, 1)]));
		assert_eq!(mouth.sprite().rows, 2);

		let node = only_child(&loaded, node.uuid());
		assert_eq!(node.kind::<Eye>().unwrap().radius, 3.5);

		let node = only_child(&loaded, node.uuid());
		let chat = node.kind::<Chat>().unwrap();
		assert_eq!((chat.size, chat.pt_size, chat.tts), (vec2(320., 200.), 30, true));
		assert_eq!(chat.voices_map.get("bob").map(String::as_str), Some("en-GB"));

		let node = only_child(&loaded, node.uuid());
		assert_eq!(node.trans_offset.rotation, 1.25);
		let sprite = node.kind::<Sprite>().unwrap();
		assert_eq!((sprite.cols, sprite.num_frames, sprite.frame), (3, 3, 2));
	}
}
