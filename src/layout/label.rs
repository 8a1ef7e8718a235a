//! Label bodies, measurement, and the tether that keeps them near their
//! node.

use std::cell::RefCell;
use std::f64::consts::PI;
use std::rc::Rc;

use super::simulation::{Force, Particle, Point};
use crate::error::Result;

/// Approximate advance of one character of the 11px label font.
pub const ESTIMATED_CHAR_WIDTH: f64 = 6.5;
/// Line height used when the text cannot be measured.
pub const ESTIMATED_HEIGHT: f64 = 16.0;

/// Rendered extent of a label.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[allow(missing_docs)]
pub struct LabelSize {
	pub width: f64,
	pub height: f64,
}

impl LabelSize {
	/// Extent guessed from the character count.
	pub fn estimate(text: &str) -> Self {
		Self {
			width: text.chars().count() as f64 * ESTIMATED_CHAR_WIDTH,
			height: ESTIMATED_HEIGHT,
		}
	}
}

/// Measures label text. Failures are recovered by the caller with
/// [`LabelSize::estimate`].
pub trait LabelMetrics {
	/// Extent of `text` in the label font.
	fn measure(&self, text: &str) -> Result<LabelSize>;
}

/// Metrics that never touch a rendering context.
#[derive(Clone, Copy, Debug, Default)]
pub struct EstimatedMetrics;

impl LabelMetrics for EstimatedMetrics {
	fn measure(&self, text: &str) -> Result<LabelSize> {
		Ok(LabelSize::estimate(text))
	}
}

/// Shadow body for one node's label.
#[derive(Clone, Debug, PartialEq)]
#[allow(missing_docs)]
pub struct LabelNode {
	/// Index of the node this label belongs to.
	pub parent: usize,
	pub width: f64,
	pub height: f64,
	/// Exclusion radius for label-label collision.
	pub collision_radius: f64,
}

impl LabelNode {
	#[allow(missing_docs)]
	pub fn new(parent: usize, size: LabelSize, padding: f64) -> Self {
		Self {
			parent,
			width: size.width,
			height: size.height,
			collision_radius: size.width / 2.0 + padding,
		}
	}
}

/// Start positions for `count` labels, evenly spaced on a circle of
/// radius `min(width, height) / 2.5` around the canvas center.
pub fn circle_positions(count: usize, width: f64, height: f64) -> Vec<Particle> {
	let radius = width.min(height) / 2.5;
	let (cx, cy) = (width / 2.0, height / 2.0);
	(0..count)
		.map(|i| {
			let angle = 2.0 * PI * i as f64 / count as f64;
			Particle::at(cx + angle.cos() * radius, cy + angle.sin() * radius)
		})
		.collect()
}

/// Node positions as of the start of the current node tick, shared
/// between the engine (writer) and the tether (reader).
pub type AnchorSnapshot = Rc<RefCell<Vec<Point>>>;

/// Soft distance band around each label's parent node.
///
/// Beyond the outer radius the label is nudged inward, inside
/// `inner_ratio` of it the label is nudged outward, and in between it is
/// left alone. The nudge is a fixed velocity change, not scaled by alpha.
pub struct TetherForce {
	anchors: AnchorSnapshot,
	parents: Vec<usize>,
	outer: Vec<f64>,
	inner_ratio: f64,
	strength: f64,
}

impl TetherForce {
	#[allow(missing_docs)]
	pub fn new(
		anchors: AnchorSnapshot,
		labels: &[LabelNode],
		desired_distance: fn(f64) -> f64,
		inner_ratio: f64,
		strength: f64,
	) -> Self {
		Self {
			anchors,
			parents: labels.iter().map(|l| l.parent).collect(),
			outer: labels.iter().map(|l| desired_distance(l.width)).collect(),
			inner_ratio,
			strength,
		}
	}
}

impl Force for TetherForce {
	fn apply(&mut self, particles: &mut [Particle], _alpha: f64) {
		let anchors = self.anchors.borrow();
		for (label, (&parent, &outer)) in particles.iter_mut().zip(self.parents.iter().zip(&self.outer)) {
			let Some(anchor) = anchors.get(parent) else {
				continue;
			};
			let (dx, dy) = (label.x - anchor.x, label.y - anchor.y);
			let distance = dx.hypot(dy);
			let angle = dy.atan2(dx);
			let (ux, uy) = (angle.cos() * self.strength, angle.sin() * self.strength);
			if distance > outer {
				label.vx -= ux;
				label.vy -= uy;
			} else if distance < outer * self.inner_ratio {
				label.vx += ux;
				label.vy += uy;
			}
		}
	}
}
