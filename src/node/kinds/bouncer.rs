use std::rc::Rc;

use glam::{vec2, Vec2};

use crate::formats::{DecodeError, IStrm, OStrm};
use crate::inputs::LevelSource;
use crate::node::{NodeClass, NodeKind};
use crate::physics::{SpringProps, SpringSystem};

/// Downward acceleration of a hop, local units per second squared.
const GRAVITY: f32 = 2000.;

/// Hops its children up whenever the input gets loud, then falls back down.
pub struct Bouncer {
	/// Take-off speed at full level.
	pub strength: f32,
	/// Level needed to take off.
	pub threshold: f32,
	source: Rc<dyn LevelSource>,
	height: f32,
	velocity: f32,
}

impl Bouncer {
	pub fn new(source: Rc<dyn LevelSource>) -> Self {
		Self {
			strength: 400.,
			threshold: 0.1,
			source,
			height: 0.,
			velocity: 0.,
		}
	}

	pub fn height(&self) -> f32 {
		self.height
	}
}

impl NodeClass for Bouncer {
	const CLASS_NAME: &'static str = "Bouncer";
}

impl NodeKind for Bouncer {
	fn class_name(&self) -> &'static str {
		Self::CLASS_NAME
	}

	fn save(&self, strm: &mut OStrm) {
		strm.write(&self.strength);
		strm.write(&self.threshold);
	}

	fn load(&mut self, strm: &mut IStrm, _version: u16) -> Result<(), DecodeError> {
		self.strength = strm.read()?;
		self.threshold = strm.read()?;
		Ok(())
	}

	fn local_offset(&self) -> Vec2 {
		vec2(0., self.height)
	}

	fn update(&mut self, dt: f32) {
		let level = self.source.level();
		if self.height <= 0. && level > self.threshold {
			self.velocity = self.strength * level;
		}
		self.velocity -= GRAVITY * dt;
		self.height += self.velocity * dt;
		if self.height <= 0. {
			self.height = 0.;
			self.velocity = 0.;
		}
	}

	any_kind!();
}

/// Springs its children towards a height proportional to the input level.
pub struct Bouncer2 {
	/// Target height at full level.
	pub amplitude: f32,
	pub props: SpringProps,
	source: Rc<dyn LevelSource>,
	spring: SpringSystem,
}

impl Bouncer2 {
	pub fn new(source: Rc<dyn LevelSource>) -> Self {
		Self {
			amplitude: 50.,
			props: SpringProps::default(),
			source,
			spring: SpringSystem::default(),
		}
	}

	pub fn height(&self) -> f32 {
		self.spring.position()
	}
}

impl NodeClass for Bouncer2 {
	const CLASS_NAME: &'static str = "Bouncer2";
}

impl NodeKind for Bouncer2 {
	fn class_name(&self) -> &'static str {
		Self::CLASS_NAME
	}

	fn save(&self, strm: &mut OStrm) {
		strm.write(&self.amplitude);
		strm.write(&self.props.stiffness);
		strm.write(&self.props.damping);
	}

	fn load(&mut self, strm: &mut IStrm, _version: u16) -> Result<(), DecodeError> {
		self.amplitude = strm.read()?;
		self.props.stiffness = strm.read()?;
		self.props.damping = strm.read()?;
		Ok(())
	}

	fn local_offset(&self) -> Vec2 {
		vec2(0., self.spring.position())
	}

	fn update(&mut self, dt: f32) {
		let target = self.source.level().clamp(0., 1.) * self.amplitude;
		self.spring.update(&self.props, target, dt);
	}

	any_kind!();
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::inputs::Reading;

	#[test]
	fn bouncer_hops_and_lands() {
		let level = Reading::new(1_f32);
		let mut bouncer = Bouncer::new(Rc::new(level.clone()));
		bouncer.update(0.01);
		assert!(bouncer.height() > 0.);

		level.set(0.);
		for _ in 0..100 {
			bouncer.update(0.01);
		}
		assert_eq!(bouncer.height(), 0.);
		assert_eq!(bouncer.local_offset(), Vec2::ZERO);
	}

	#[test]
	fn quiet_bouncer_stays_put() {
		let mut bouncer = Bouncer::new(Rc::new(Reading::new(0.05_f32)));
		bouncer.update(0.1);
		assert_eq!(bouncer.height(), 0.);
	}

	#[test]
	fn bouncer2_follows_level() {
		let level = Reading::new(0.5_f32);
		let mut bouncer = Bouncer2::new(Rc::new(level.clone()));
		for _ in 0..600 {
			bouncer.update(1. / 60.);
		}
		assert!((bouncer.height() - 25.).abs() < 0.5, "{}", bouncer.height());
	}
}
