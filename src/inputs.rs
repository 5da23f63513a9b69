//! Values produced outside the node tree (audio analysis, pointer tracking)
//! and read by node variants once per frame.
//!
//! Producers on other threads hand results to the frame thread, which stores
//! them into a [`Reading`]. Node variants only ever read.

use std::cell::Cell;
use std::rc::Rc;

use glam::Vec2;

use crate::formats::{DecodeError, Deser, IStrm, OStrm, Ser};

/// Mouth shape classes produced by audio analysis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Viseme {
	#[default]
	Sil,
	Pp,
	Ff,
	Th,
	Dd,
	Kk,
	Ch,
	Ss,
	Nn,
	Rr,
	Aa,
	E,
	Ih,
	Oh,
	Ou,
}

impl Viseme {
	pub const ALL: [Viseme; 15] = [
		Viseme::Sil,
		Viseme::Pp,
		Viseme::Ff,
		Viseme::Th,
		Viseme::Dd,
		Viseme::Kk,
		Viseme::Ch,
		Viseme::Ss,
		Viseme::Nn,
		Viseme::Rr,
		Viseme::Aa,
		Viseme::E,
		Viseme::Ih,
		Viseme::Oh,
		Viseme::Ou,
	];
}

impl Ser for Viseme {
	fn ser(&self, strm: &mut OStrm) {
		strm.write(&(*self as u8));
	}
}

impl Deser for Viseme {
	fn deser(strm: &mut IStrm) -> Result<Self, DecodeError> {
		// unknown shapes from newer files degrade to silence
		let raw = strm.read::<u8>()?;
		Ok(Viseme::ALL.get(raw as usize).copied().unwrap_or_default())
	}
}

pub trait VisemeSource {
	fn viseme(&self) -> Viseme;
}

/// Normalized look direction, each axis in `[-1, 1]`.
pub trait PointerSource {
	fn look(&self) -> Vec2;
}

/// Input loudness in `[0, 1]`.
pub trait LevelSource {
	fn level(&self) -> f32;
}

/// Shared single-value slot written by the frame loop, read by nodes.
#[derive(Debug, Default)]
pub struct Reading<T: Copy>(Rc<Cell<T>>);

impl<T: Copy> Clone for Reading<T> {
	fn clone(&self) -> Self {
		Self(Rc::clone(&self.0))
	}
}

impl<T: Copy> Reading<T> {
	pub fn new(value: T) -> Self {
		Self(Rc::new(Cell::new(value)))
	}

	pub fn set(&self, value: T) {
		self.0.set(value);
	}

	pub fn get(&self) -> T {
		self.0.get()
	}
}

impl VisemeSource for Reading<Viseme> {
	fn viseme(&self) -> Viseme {
		self.get()
	}
}

impl PointerSource for Reading<Vec2> {
	fn look(&self) -> Vec2 {
		self.get()
	}
}

impl LevelSource for Reading<f32> {
	fn level(&self) -> f32 {
		self.get()
	}
}
