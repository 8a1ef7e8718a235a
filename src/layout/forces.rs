//! Node forces: link, many-body, center, collide.

use super::simulation::{Force, Particle};

/// Deterministic LCG used to separate coincident particles.
#[derive(Clone, Debug)]
pub struct Jiggle {
	state: u32,
}

impl Default for Jiggle {
	fn default() -> Self {
		Self { state: 1 }
	}
}

impl Jiggle {
	/// A tiny nonzero offset in `(-5e-7, 5e-7)`.
	pub fn next(&mut self) -> f64 {
		self.state = self.state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
		let mut v = (self.state as f64 / 4_294_967_296.0 - 0.5) * 1e-6;
		if v == 0.0 {
			v = 1e-7;
		}
		v
	}
}

/// One link with its endpoints already resolved to particle indices.
#[derive(Clone, Copy, Debug, PartialEq)]
#[allow(missing_docs)]
pub struct ResolvedLink {
	pub source: usize,
	pub target: usize,
	/// Relative strength in `0..=1`.
	pub strength: f64,
}

/// Pulls linked particles toward a rest distance. The correction is split
/// between the endpoints so the better-connected end moves less.
pub struct LinkForce {
	links: Vec<ResolvedLink>,
	bias: Vec<f64>,
	distance: f64,
	strength: f64,
	jiggle: Jiggle,
}

impl LinkForce {
	#[allow(missing_docs)]
	pub fn new(links: Vec<ResolvedLink>, particle_count: usize, distance: f64, strength: f64) -> Self {
		let mut degree = vec![0usize; particle_count];
		for link in &links {
			degree[link.source] += 1;
			degree[link.target] += 1;
		}
		let bias = links
			.iter()
			.map(|l| degree[l.source] as f64 / (degree[l.source] + degree[l.target]) as f64)
			.collect();
		Self {
			links,
			bias,
			distance,
			strength,
			jiggle: Jiggle::default(),
		}
	}
}

impl Force for LinkForce {
	fn apply(&mut self, particles: &mut [Particle], alpha: f64) {
		for (link, &bias) in self.links.iter().zip(&self.bias) {
			if link.source == link.target {
				continue;
			}
			let (s, t) = (particles[link.source], particles[link.target]);
			let mut x = t.x + t.vx - s.x - s.vx;
			let mut y = t.y + t.vy - s.y - s.vy;
			if x == 0.0 {
				x = self.jiggle.next();
			}
			if y == 0.0 {
				y = self.jiggle.next();
			}
			let len = x.hypot(y);
			let k = (len - self.distance) / len * alpha * self.strength * link.strength;
			let (x, y) = (x * k, y * k);

			let target = &mut particles[link.target];
			target.vx -= x * bias;
			target.vy -= y * bias;
			let source = &mut particles[link.source];
			source.vx += x * (1.0 - bias);
			source.vy += y * (1.0 - bias);
		}
	}
}

/// Exact pairwise charge. Each particle is pushed along the line to every
/// other by `strength * alpha / distance`, with distances below 1 softened.
pub struct ManyBodyForce {
	strength: f64,
	jiggle: Jiggle,
	positions: Vec<(f64, f64)>,
}

impl ManyBodyForce {
	#[allow(missing_docs)]
	pub fn new(strength: f64) -> Self {
		Self {
			strength,
			jiggle: Jiggle::default(),
			positions: Vec::new(),
		}
	}
}

impl Force for ManyBodyForce {
	fn apply(&mut self, particles: &mut [Particle], alpha: f64) {
		self.positions.clear();
		self.positions.extend(particles.iter().map(|p| (p.x, p.y)));
		for (i, p) in particles.iter_mut().enumerate() {
			for (j, &(ox, oy)) in self.positions.iter().enumerate() {
				if i == j {
					continue;
				}
				let mut x = ox - p.x;
				let mut y = oy - p.y;
				let mut l = x * x + y * y;
				if x == 0.0 {
					x = self.jiggle.next();
					l += x * x;
				}
				if y == 0.0 {
					y = self.jiggle.next();
					l += y * y;
				}
				if l < 1.0 {
					l = l.sqrt();
				}
				let w = self.strength * alpha / l;
				p.vx += x * w;
				p.vy += y * w;
			}
		}
	}
}

/// Translates every particle so the mean position sits on `(x, y)`.
pub struct CenterForce {
	x: f64,
	y: f64,
}

impl CenterForce {
	#[allow(missing_docs)]
	pub fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}
}

impl Force for CenterForce {
	fn apply(&mut self, particles: &mut [Particle], _alpha: f64) {
		if particles.is_empty() {
			return;
		}
		let n = particles.len() as f64;
		let (sx, sy) = particles
			.iter()
			.fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
		let (dx, dy) = (self.x - sx / n, self.y - sy / n);
		for p in particles {
			p.x += dx;
			p.y += dy;
		}
	}
}

/// Keeps particles at least `r_i + r_j` apart, resolving each overlapping
/// pair in one step with the smaller particle moving more.
pub struct CollideForce {
	radii: Vec<f64>,
	strength: f64,
	jiggle: Jiggle,
}

impl CollideForce {
	/// Per-particle radii, indexed like the particles.
	pub fn new(radii: Vec<f64>) -> Self {
		Self {
			radii,
			strength: 1.0,
			jiggle: Jiggle::default(),
		}
	}

	/// Same radius for `count` particles.
	pub fn uniform(radius: f64, count: usize) -> Self {
		Self::new(vec![radius; count])
	}
}

impl Force for CollideForce {
	fn apply(&mut self, particles: &mut [Particle], _alpha: f64) {
		let n = particles.len().min(self.radii.len());
		for i in 0..n {
			let ri = self.radii[i];
			let (xi, yi) = (particles[i].x + particles[i].vx, particles[i].y + particles[i].vy);
			for j in (i + 1)..n {
				let rj = self.radii[j];
				let other = particles[j];
				let mut x = xi - other.x - other.vx;
				let mut y = yi - other.y - other.vy;
				let mut l = x * x + y * y;
				let r = ri + rj;
				if l >= r * r {
					continue;
				}
				if x == 0.0 {
					x = self.jiggle.next();
					l += x * x;
				}
				if y == 0.0 {
					y = self.jiggle.next();
					l += y * y;
				}
				let len = l.sqrt();
				let k = (r - len) / len * self.strength;
				let (x, y) = (x * k, y * k);
				let w = rj * rj / (ri * ri + rj * rj);
				particles[i].vx += x * w;
				particles[i].vy += y * w;
				particles[j].vx -= x * (1.0 - w);
				particles[j].vy -= y * (1.0 - w);
			}
		}
	}
}
