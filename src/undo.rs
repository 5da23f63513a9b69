//! Linear undo/redo history of paired closures.
//!
//! The log never looks at the state it edits. Each entry is an `apply` and a
//! `revert` closure that must be exact inverses of each other; both receive
//! the edited context explicitly so entries hold no borrows. Whatever an entry
//! needs to stay alive (a deleted subtree, say) is captured by value and
//! released when the entry is discarded.

use std::fmt;

use tracing::debug;

pub type Action<C> = Box<dyn FnMut(&mut C)>;

struct Entry<C> {
	apply: Action<C>,
	revert: Action<C>,
}

pub struct UndoLog<C> {
	undo_stack: Vec<Entry<C>>,
	redo_stack: Vec<Entry<C>>,
	/// Maximum number of undo levels (0 = unlimited)
	max_levels: usize,
}

impl<C> Default for UndoLog<C> {
	fn default() -> Self {
		Self::new()
	}
}

impl<C> UndoLog<C> {
	/// Unlimited history.
	pub fn new() -> Self {
		Self::with_max_levels(0)
	}

	pub fn with_max_levels(max_levels: usize) -> Self {
		Self {
			undo_stack: Vec::new(),
			redo_stack: Vec::new(),
			max_levels,
		}
	}

	/// Runs `apply` now and pushes the pair. Abandons everything that could be redone.
	pub fn record<A, R>(&mut self, ctx: &mut C, mut apply: A, revert: R)
	where
		A: FnMut(&mut C) + 'static,
		R: FnMut(&mut C) + 'static,
	{
		apply(ctx);
		self.redo_stack.clear();
		self.undo_stack.push(Entry {
			apply: Box::new(apply),
			revert: Box::new(revert),
		});
		if self.max_levels > 0 && self.undo_stack.len() > self.max_levels {
			let excess = self.undo_stack.len() - self.max_levels;
			self.undo_stack.drain(..excess);
		}
	}

	/// Reverts the latest entry. `false` if there was nothing to undo.
	pub fn undo(&mut self, ctx: &mut C) -> bool {
		let Some(mut entry) = self.undo_stack.pop() else {
			return false;
		};
		(entry.revert)(ctx);
		self.redo_stack.push(entry);
		debug!("Undo, {} left", self.undo_stack.len());
		true
	}

	/// Re-applies the latest undone entry. `false` if there was nothing to redo.
	pub fn redo(&mut self, ctx: &mut C) -> bool {
		let Some(mut entry) = self.redo_stack.pop() else {
			return false;
		};
		(entry.apply)(ctx);
		self.undo_stack.push(entry);
		debug!("Redo, {} left", self.redo_stack.len());
		true
	}

	pub fn has_undo(&self) -> bool {
		!self.undo_stack.is_empty()
	}

	pub fn has_redo(&self) -> bool {
		!self.redo_stack.is_empty()
	}

	/// Drops all history, releasing whatever the entries kept alive.
	pub fn clear(&mut self) {
		self.undo_stack.clear();
		self.redo_stack.clear();
	}
}

impl<C> fmt::Debug for UndoLog<C> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("UndoLog")
			.field("undo", &self.undo_stack.len())
			.field("redo", &self.redo_stack.len())
			.field("max_levels", &self.max_levels)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use std::rc::Rc;

	use super::*;

	#[derive(Debug, Clone, Copy, PartialEq, Eq)]
	enum Sel {
		A,
		B,
	}

	#[test]
	fn selection_round_trip() {
		let mut log = UndoLog::new();
		let mut selected = Sel::B;

		log.record(&mut selected, |s| *s = Sel::A, |s| *s = Sel::B);
		assert_eq!(selected, Sel::A);
		assert!(log.has_undo() && !log.has_redo());

		assert!(log.undo(&mut selected));
		assert_eq!(selected, Sel::B);
		assert!(log.has_redo());

		assert!(log.redo(&mut selected));
		assert_eq!(selected, Sel::A);
	}

	#[test]
	fn empty_stacks_are_no_ops() {
		let mut log = UndoLog::<i32>::new();
		let mut n = 3;
		assert!(!log.undo(&mut n));
		assert!(!log.redo(&mut n));
		assert_eq!(n, 3);
	}

	#[test]
	fn lifo_and_new_edit_drops_redo() {
		let mut log = UndoLog::new();
		let mut v = Vec::new();
		for i in 0..3 {
			log.record(&mut v, move |v: &mut Vec<i32>| v.push(i), |v: &mut Vec<i32>| {
				v.pop();
			});
		}
		log.undo(&mut v);
		log.undo(&mut v);
		assert_eq!(v, [0]);

		log.record(&mut v, |v: &mut Vec<i32>| v.push(9), |v: &mut Vec<i32>| {
			v.pop();
		});
		assert!(!log.has_redo());
		assert!(!log.redo(&mut v));
		assert_eq!(v, [0, 9]);
	}

	#[test]
	fn capped_history_releases_oldest() {
		let mut log = UndoLog::with_max_levels(2);
		let pin = Rc::new(());
		let mut n = 0;
		for _ in 0..3 {
			let held = Rc::clone(&pin);
			log.record(&mut n, |n: &mut i32| *n += 1, move |n: &mut i32| {
				let _ = &held;
				*n -= 1;
			});
		}
		assert_eq!(n, 3);
		assert_eq!(Rc::strong_count(&pin), 3);

		assert!(log.undo(&mut n));
		assert!(log.undo(&mut n));
		assert!(!log.undo(&mut n));
		assert_eq!(n, 1);

		log.clear();
		assert_eq!(Rc::strong_count(&pin), 1);
	}
}
