pub(crate) mod runge_kutta;

use runge_kutta::PhysicsState;

/// Largest single integration step; longer frames are split.
const MAX_STEP: f32 = 0.01;

/// Parameters of a damped spring.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpringProps {
	pub stiffness: f32,
	pub damping: f32,
}

impl Default for SpringProps {
	fn default() -> Self {
		Self {
			stiffness: 200.,
			damping: 8.,
		}
	}
}

/// Marker type for a spring physics state
#[derive(Debug)]
struct Spring;

type SpringState = PhysicsState<2, Spring>;

fn eval(state: &mut SpringState, props: &SpringProps, target: f32, _t: f32) {
	let (x, v) = (state.vars[0], state.vars[1]);
	// x' = v
	state.derivatives[0] = v;
	// v' = -k (x - target) - c v
	state.derivatives[1] = -props.stiffness * (x - target) - props.damping * v;
}

/// One-dimensional spring-damper chasing a moving target.
#[derive(Debug, Clone, Default)]
pub struct SpringSystem {
	state: SpringState,
}

impl SpringSystem {
	pub fn position(&self) -> f32 {
		self.state.vars[0]
	}

	pub fn velocity(&self) -> f32 {
		self.state.vars[1]
	}

	/// Advances by `dt` seconds and returns the new position.
	pub fn update(&mut self, props: &SpringProps, target: f32, dt: f32) -> f32 {
		// Timestep is limited to 10 seconds.
		let mut dt = dt.min(10.);
		while dt > 0. {
			runge_kutta::tick(&eval, &mut self.state, props, target, dt.min(MAX_STEP));
			dt -= MAX_STEP;
		}
		self.position()
	}
}
