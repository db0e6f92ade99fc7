use super::config::EngineConfig;

/// Something the frame loop advances toward a target once per frame.
pub trait Simulation {
	type Target: ?Sized;

	/// Installs a new target and restarts convergence tracking.
	fn set_target(&mut self, target: &Self::Target);

	/// Advances one frame. Returns `true` on the frame the simulation settles.
	fn step(&mut self) -> bool;

	fn is_settled(&self) -> bool;
}

/// Current and target position buffers, `2 × N` coordinates each.
#[derive(Clone, Debug)]
pub struct PositionAnimator {
	current: Vec<f64>,
	target: Vec<f64>,
	active: bool,
	notified: bool,
	ease: f64,
	snap_epsilon: f64,
	settle_threshold: f64,
}

impl PositionAnimator {
	pub fn new(config: &EngineConfig) -> Self {
		Self {
			current: Vec::new(),
			target: Vec::new(),
			active: false,
			notified: true,
			ease: config.ease,
			snap_epsilon: config.snap_epsilon,
			settle_threshold: config.settle_threshold,
		}
	}

	pub fn current(&self) -> &[f64] {
		&self.current
	}

	pub fn target(&self) -> &[f64] {
		&self.target
	}

	pub fn node_count(&self) -> usize {
		self.current.len() / 2
	}

	pub fn position(&self, idx: usize) -> Option<(f64, f64)> {
		Some((*self.current.get(idx * 2)?, *self.current.get(idx * 2 + 1)?))
	}

	/// Replaces both buffers after a node list change. Targets start at the
	/// carried-over positions until the next layout is installed.
	pub fn reset(&mut self, current: Vec<f64>) {
		self.target = current.clone();
		self.current = current;
		self.active = false;
	}

	/// Moves `current` onto `target` without animating.
	pub fn snap(&mut self) {
		self.current.copy_from_slice(&self.target);
		self.active = false;
	}

	pub fn is_animating(&self) -> bool {
		self.active
	}
}

impl Simulation for PositionAnimator {
	type Target = [f64];

	fn set_target(&mut self, target: &[f64]) {
		if target.len() == self.target.len() {
			self.target.copy_from_slice(target);
		} else {
			self.target = target.to_vec();
			self.current.resize(target.len(), 0.0);
		}
		self.active = true;
		self.notified = false;
	}

	fn step(&mut self) -> bool {
		if self.active {
			let mut max_delta: f64 = 0.0;
			for (cur, &tgt) in self.current.iter_mut().zip(&self.target) {
				let diff = tgt - *cur;
				if diff.abs() > self.snap_epsilon {
					*cur += diff * self.ease;
					max_delta = max_delta.max(diff.abs());
				} else {
					*cur = tgt;
				}
			}
			if max_delta < self.settle_threshold {
				self.active = false;
			}
		}
		if !self.active && !self.notified {
			self.notified = true;
			return true;
		}
		false
	}

	fn is_settled(&self) -> bool {
		!self.active
	}
}
