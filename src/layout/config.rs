/// Default tether shell radius: `max(60, width / 2 + 40)`.
pub fn default_tether_distance(label_width: f64) -> f64 {
	(label_width / 2.0 + 40.0).max(60.0)
}

/// Settings for the brute-force overlap resolver.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolverConfig {
	/// Upper bound on full passes over all label pairs.
	pub max_iterations: usize,
	/// Distance each label of an overlapping pair moves per push.
	pub push_step: f64,
	/// Margin added around every box before testing intersection.
	pub padding: f64,
}

impl Default for ResolverConfig {
	fn default() -> Self {
		Self {
			max_iterations: 200,
			push_step: 2.0,
			padding: 8.0,
		}
	}
}

/// Tuning for both simulations.
///
/// Strengths are in the units of the forces that consume them; negative
/// charge strengths repel.
#[derive(Clone, Debug)]
pub struct LayoutConfig {
	/// Rest length of a link.
	pub link_distance: f64,
	/// Link stiffness, multiplied by each link's own strength.
	pub link_strength: f64,
	/// Node many-body strength.
	pub charge_strength: f64,
	/// Node collision radius.
	pub collision_radius: f64,
	/// Fraction of node velocity removed per tick.
	pub velocity_decay: f64,
	/// Alpha the node simulation is held at while a node is pinned.
	pub drag_alpha_target: f64,
	/// Label many-body strength.
	pub label_charge_strength: f64,
	/// Added to a label's half-width to form its collision radius.
	pub label_padding: f64,
	/// Fraction of label velocity removed per tick.
	pub label_velocity_decay: f64,
	/// Outer radius of the tether shell for a label of the given width.
	pub tether_distance: fn(f64) -> f64,
	/// Inner radius of the tether shell, as a fraction of the outer.
	pub tether_inner_ratio: f64,
	/// Velocity nudge applied by the tether.
	pub tether_strength: f64,
	/// Label ticks run before the first paint.
	pub label_warmup_ticks: usize,
	/// Label ticks run per node tick.
	pub label_ticks_per_tick: usize,
	/// Pointer hit radius for nodes smaller than this.
	pub hit_radius: f64,
	/// Static snapshot overlap resolver.
	pub resolver: ResolverConfig,
}

impl Default for LayoutConfig {
	fn default() -> Self {
		Self {
			link_distance: 180.0,
			link_strength: 0.4,
			charge_strength: -400.0,
			collision_radius: 65.0,
			velocity_decay: 0.4,
			drag_alpha_target: 0.3,
			label_charge_strength: -600.0,
			label_padding: 35.0,
			label_velocity_decay: 0.25,
			tether_distance: default_tether_distance,
			tether_inner_ratio: 0.6,
			tether_strength: 0.25,
			label_warmup_ticks: 500,
			label_ticks_per_tick: 20,
			hit_radius: 12.0,
			resolver: ResolverConfig::default(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn tether_distance_has_a_floor() {
		assert_eq!(default_tether_distance(0.0), 60.0);
		assert_eq!(default_tether_distance(30.0), 60.0);
		assert_eq!(default_tether_distance(100.0), 90.0);
	}
}
