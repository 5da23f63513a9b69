use std::collections::HashMap;
use std::fmt;

use crate::node::{Node, NodeClass, NodeKind};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown node class {0:?}")]
pub struct UnknownClassError(pub String);

type Ctor = Box<dyn Fn(&str) -> Box<dyn NodeKind>>;

/// Class name to constructor map used to rebuild nodes from a stream.
///
/// Constructors receive the instance name only. Anything else a variant needs
/// (textures, audio, chat feeds) is captured by the closure at registration.
#[derive(Default)]
pub struct Registry {
	ctors: HashMap<String, Ctor>,
}

impl Registry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Panics if `class_name` is already registered.
	pub fn register<F>(&mut self, class_name: &str, ctor: F)
	where
		F: Fn(&str) -> Box<dyn NodeKind> + 'static,
	{
		if self.ctors.contains_key(class_name) {
			panic!("node class {class_name:?} registered twice");
		}
		self.ctors.insert(class_name.to_owned(), Box::new(ctor));
	}

	pub fn register_kind<K, F>(&mut self, ctor: F)
	where
		K: NodeKind + NodeClass,
		F: Fn(&str) -> K + 'static,
	{
		self.register(K::CLASS_NAME, move |name| -> Box<dyn NodeKind> { Box::new(ctor(name)) });
	}

	pub fn contains(&self, class_name: &str) -> bool {
		self.ctors.contains_key(class_name)
	}

	pub fn class_names(&self) -> impl Iterator<Item = &str> {
		self.ctors.keys().map(String::as_str)
	}

	/// Builds a detached node. Never loads fields or children.
	pub fn construct(&self, class_name: &str, name: &str) -> Result<Node, UnknownClassError> {
		let ctor = self
			.ctors
			.get(class_name)
			.ok_or_else(|| UnknownClassError(class_name.to_owned()))?;
		let kind = ctor(name);
		debug_assert_eq!(kind.class_name(), class_name, "constructor built the wrong class");
		Ok(Node::new(name, kind))
	}
}

impl fmt::Debug for Registry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut names: Vec<_> = self.class_names().collect();
		names.sort_unstable();
		f.debug_struct("Registry").field("classes", &names).finish()
	}
}
