//! Iterative force simulation cooled by a decaying temperature (alpha).

/// A 2D point.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[allow(missing_docs)]
pub struct Point {
	pub x: f64,
	pub y: f64,
}

impl Point {
	/// Create a point.
	pub fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}

	/// Euclidean distance to `other`.
	pub fn distance(&self, other: Point) -> f64 {
		(self.x - other.x).hypot(self.y - other.y)
	}
}

/// A simulated body. `fx`/`fy` pin the body on that axis.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[allow(missing_docs)]
pub struct Particle {
	pub x: f64,
	pub y: f64,
	pub vx: f64,
	pub vy: f64,
	pub fx: Option<f64>,
	pub fy: Option<f64>,
}

impl Particle {
	/// A resting particle at `(x, y)`.
	pub fn at(x: f64, y: f64) -> Self {
		Self {
			x,
			y,
			..Self::default()
		}
	}

	/// Current position.
	pub fn position(&self) -> Point {
		Point::new(self.x, self.y)
	}

	/// Whether either axis is pinned.
	pub fn is_pinned(&self) -> bool {
		self.fx.is_some() || self.fy.is_some()
	}
}

/// A force contributor. Forces adjust velocities (or, for centering,
/// positions) and never integrate.
pub trait Force {
	/// Apply one step of this force at temperature `alpha`.
	fn apply(&mut self, particles: &mut [Particle], alpha: f64);
}

/// Particles plus the named forces acting on them.
pub struct Simulation {
	particles: Vec<Particle>,
	forces: Vec<(&'static str, Box<dyn Force>)>,
	alpha: f64,
	alpha_min: f64,
	alpha_decay: f64,
	alpha_target: f64,
	velocity_decay: f64,
}

/// Temperature below which a simulation counts as settled.
pub const DEFAULT_ALPHA_MIN: f64 = 0.001;

impl Simulation {
	/// A hot simulation (`alpha = 1`) that cools to `alpha_min` in about 300
	/// ticks.
	pub fn new(particles: Vec<Particle>, velocity_decay: f64) -> Self {
		Self {
			particles,
			forces: Vec::new(),
			alpha: 1.0,
			alpha_min: DEFAULT_ALPHA_MIN,
			alpha_decay: 1.0 - DEFAULT_ALPHA_MIN.powf(1.0 / 300.0),
			alpha_target: 0.0,
			velocity_decay: velocity_decay.clamp(0.0, 1.0),
		}
	}

	/// Append a force. Forces run in insertion order.
	pub fn with_force(mut self, name: &'static str, force: impl Force + 'static) -> Self {
		self.forces.push((name, Box::new(force)));
		self
	}

	/// Swap the force registered under `name`, or append it.
	pub fn replace_force(&mut self, name: &'static str, force: impl Force + 'static) {
		match self.forces.iter_mut().find(|(n, _)| *n == name) {
			Some(slot) => slot.1 = Box::new(force),
			None => self.forces.push((name, Box::new(force))),
		}
	}

	#[allow(missing_docs)]
	pub fn force_names(&self) -> impl Iterator<Item = &'static str> + '_ {
		self.forces.iter().map(|(n, _)| *n)
	}

	#[allow(missing_docs)]
	pub fn particles(&self) -> &[Particle] {
		&self.particles
	}

	#[allow(missing_docs)]
	pub fn particles_mut(&mut self) -> &mut [Particle] {
		&mut self.particles
	}

	#[allow(missing_docs)]
	pub fn alpha(&self) -> f64 {
		self.alpha
	}

	#[allow(missing_docs)]
	pub fn alpha_min(&self) -> f64 {
		self.alpha_min
	}

	#[allow(missing_docs)]
	pub fn alpha_target(&self) -> f64 {
		self.alpha_target
	}

	/// Temperature the simulation relaxes toward instead of zero.
	pub fn set_alpha_target(&mut self, target: f64) {
		self.alpha_target = target.clamp(0.0, 1.0);
	}

	/// Raise the temperature to at least `alpha`.
	pub fn reheat(&mut self, alpha: f64) {
		self.alpha = self.alpha.max(alpha.clamp(0.0, 1.0));
	}

	/// Cooled below `alpha_min` with nothing holding it warm.
	pub fn is_settled(&self) -> bool {
		self.alpha < self.alpha_min && self.alpha_target < self.alpha_min
	}

	/// Number of default-decay ticks from `alpha = 1` to `alpha_min`.
	pub fn ticks_to_settle(&self) -> usize {
		(self.alpha_min.ln() / (1.0 - self.alpha_decay).ln()).ceil() as usize
	}

	/// One tick with the configured decay.
	pub fn tick(&mut self) {
		self.step(self.alpha_decay);
	}

	/// Move alpha `delta_alpha` of the way to its target, apply every force,
	/// then integrate.
	pub fn step(&mut self, delta_alpha: f64) {
		self.alpha += (self.alpha_target - self.alpha) * delta_alpha;
		let alpha = self.alpha;
		for (_, force) in &mut self.forces {
			force.apply(&mut self.particles, alpha);
		}

		let keep = 1.0 - self.velocity_decay;
		for p in &mut self.particles {
			match p.fx {
				Some(fx) => {
					p.x = fx;
					p.vx = 0.0;
				}
				None => {
					p.vx *= keep;
					p.x += p.vx;
				}
			}
			match p.fy {
				Some(fy) => {
					p.y = fy;
					p.vy = 0.0;
				}
				None => {
					p.vy *= keep;
					p.y += p.vy;
				}
			}
		}
	}
}
