use std::cell::RefCell;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::f64::consts::PI;
use std::rc::Rc;

use log::{debug, info, warn};

use super::config::LayoutConfig;
use super::forces::{CenterForce, CollideForce, LinkForce, ManyBodyForce, ResolvedLink};
use super::label::{AnchorSnapshot, LabelMetrics, LabelNode, LabelSize, TetherForce, circle_positions};
use super::resolver::{LabelBox, ResolveReport, resolve_overlaps};
use super::simulation::{Particle, Point, Simulation};
use crate::data::GraphData;
use crate::error::{Error, Result};

/// Marker radius when the snapshot gives none.
pub const DEFAULT_NODE_SIZE: f64 = 6.0;
/// Marker color when the snapshot gives none.
pub const DEFAULT_NODE_COLOR: &str = "#ffffff";

/// Display data of a node. Position lives in the node simulation.
#[derive(Clone, Debug, PartialEq)]
#[allow(missing_docs)]
pub struct NodeInfo {
	pub id: String,
	pub label: String,
	pub kind: String,
	/// Marker radius.
	pub size: f64,
	pub color: String,
	pub url: Option<String>,
}

/// Node and label layout for one graph.
///
/// Node `i` and label `i` belong together. The label simulation is stepped
/// only from [`LayoutEngine::tick`], after the node step, against a
/// snapshot of node positions taken once per node tick.
pub struct LayoutEngine {
	config: LayoutConfig,
	nodes: Vec<NodeInfo>,
	links: Vec<ResolvedLink>,
	index: HashMap<String, usize>,
	adjacency: Vec<Vec<usize>>,
	labels: Vec<LabelNode>,
	node_sim: Simulation,
	label_sim: Simulation,
	anchors: AnchorSnapshot,
	pinned: usize,
	width: f64,
	height: f64,
}

impl LayoutEngine {
	/// Build both simulations for `data` on a `width` x `height` canvas.
	///
	/// Fails if a link names a node id that is not in `data.nodes`.
	pub fn new(
		data: &GraphData,
		width: f64,
		height: f64,
		config: LayoutConfig,
		metrics: &dyn LabelMetrics,
	) -> Result<Self> {
		let mut index = HashMap::with_capacity(data.nodes.len());
		for (i, node) in data.nodes.iter().enumerate() {
			match index.entry(node.id.clone()) {
				Entry::Vacant(slot) => {
					slot.insert(i);
				}
				Entry::Occupied(_) => warn!("duplicate node id {:?}; links resolve to the first", node.id),
			}
		}

		let lookup = |id: &str, from: &str, to: &str| {
			index.get(id).copied().ok_or_else(|| Error::DanglingLinkReference {
				from: from.to_string(),
				to: to.to_string(),
				missing: id.to_string(),
			})
		};
		let mut links = Vec::with_capacity(data.links.len());
		let mut adjacency = vec![Vec::new(); data.nodes.len()];
		for link in &data.links {
			let source = lookup(&link.source, &link.source, &link.target)?;
			let target = lookup(&link.target, &link.source, &link.target)?;
			links.push(ResolvedLink {
				source,
				target,
				strength: link.strength.unwrap_or(1.0).clamp(0.0, 1.0),
			});
			if source != target {
				adjacency[source].push(target);
				adjacency[target].push(source);
			}
		}

		let nodes: Vec<NodeInfo> = data
			.nodes
			.iter()
			.map(|n| NodeInfo {
				id: n.id.clone(),
				label: n.label.clone(),
				kind: n.kind.clone(),
				size: n.size.filter(|s| s.is_finite() && *s > 0.0).unwrap_or(DEFAULT_NODE_SIZE),
				color: n.color.clone().unwrap_or_else(|| DEFAULT_NODE_COLOR.into()),
				url: n.url.clone(),
			})
			.collect();

		let labels: Vec<LabelNode> = nodes
			.iter()
			.enumerate()
			.map(|(i, n)| LabelNode::new(i, measure_label(metrics, &n.label), config.label_padding))
			.collect();

		let (cx, cy) = (width / 2.0, height / 2.0);
		let particles = phyllotaxis(nodes.len(), cx, cy);
		let count = particles.len();
		let node_sim = Simulation::new(particles, config.velocity_decay)
			.with_force(
				"link",
				LinkForce::new(links.clone(), count, config.link_distance, config.link_strength),
			)
			.with_force("charge", ManyBodyForce::new(config.charge_strength))
			.with_force("center", CenterForce::new(cx, cy))
			.with_force("collide", CollideForce::uniform(config.collision_radius, count));

		let anchors: AnchorSnapshot = Rc::new(RefCell::new(
			node_sim.particles().iter().map(Particle::position).collect(),
		));
		let label_sim = Simulation::new(circle_positions(count, width, height), config.label_velocity_decay)
			.with_force("label-charge", ManyBodyForce::new(config.label_charge_strength))
			.with_force(
				"label-collide",
				CollideForce::new(labels.iter().map(|l| l.collision_radius).collect()),
			)
			.with_force(
				"tether",
				TetherForce::new(
					anchors.clone(),
					&labels,
					config.tether_distance,
					config.tether_inner_ratio,
					config.tether_strength,
				),
			);

		info!("layout initialized: {} nodes, {} links", nodes.len(), links.len());

		Ok(Self {
			config,
			nodes,
			links,
			index,
			adjacency,
			labels,
			node_sim,
			label_sim,
			anchors,
			pinned: 0,
			width,
			height,
		})
	}

	/// Run the label warm-up ticks against the current node positions.
	pub fn warm_up(&mut self) {
		self.refresh_anchors();
		for _ in 0..self.config.label_warmup_ticks {
			self.label_sim.tick();
		}
		debug!("label warm-up: {} ticks", self.config.label_warmup_ticks);
	}

	/// Advance the node simulation one tick and the label simulation
	/// `label_ticks_per_tick` ticks. Returns `false` without moving
	/// anything once the node simulation has settled.
	pub fn tick(&mut self) -> bool {
		if self.node_sim.is_settled() {
			return false;
		}
		self.node_sim.tick();
		self.refresh_anchors();
		for _ in 0..self.config.label_ticks_per_tick {
			self.label_sim.tick();
		}
		true
	}

	/// Settle everything synchronously for a non-animated view, then run the
	/// overlap resolver on the labels.
	pub fn settle_static(&mut self) -> ResolveReport {
		self.warm_up();
		// Bounded so a pinned node cannot keep this running.
		let max_ticks = self.node_sim.ticks_to_settle() * 2;
		for _ in 0..max_ticks {
			if !self.tick() {
				break;
			}
		}

		let mut boxes = self.label_boxes();
		let report = resolve_overlaps(&mut boxes, &self.config.resolver);
		for (p, b) in self.label_sim.particles_mut().iter_mut().zip(&boxes) {
			p.x = b.x;
			p.y = b.y;
			p.vx = 0.0;
			p.vy = 0.0;
		}
		if report.resolved {
			info!("static layout: labels clear after {} passes ({} pushes)", report.passes, report.pushes);
		} else {
			warn!(
				"static layout: labels still overlap after {} passes ({} pushes)",
				report.passes, report.pushes
			);
		}
		report
	}

	/// Pin a node at `(x, y)` and keep the simulation warm while any node is
	/// pinned.
	pub fn pin(&mut self, id: &str, x: f64, y: f64) -> Result<()> {
		let idx = self.node_index(id)?;
		let particle = &mut self.node_sim.particles_mut()[idx];
		let newly_pinned = !particle.is_pinned();
		particle.fx = Some(x);
		particle.fy = Some(y);
		particle.x = x;
		particle.y = y;
		if newly_pinned {
			self.pinned += 1;
		}
		self.node_sim.set_alpha_target(self.config.drag_alpha_target);
		Ok(())
	}

	/// Move a pin. Pins the node if it was free.
	pub fn update_pin(&mut self, id: &str, x: f64, y: f64) -> Result<()> {
		self.pin(id, x, y)
	}

	/// Release a pin. The simulation cools again once no node is pinned.
	pub fn unpin(&mut self, id: &str) -> Result<()> {
		let idx = self.node_index(id)?;
		let particle = &mut self.node_sim.particles_mut()[idx];
		if !particle.is_pinned() {
			return Ok(());
		}
		particle.fx = None;
		particle.fy = None;
		self.pinned -= 1;
		if self.pinned == 0 {
			self.node_sim.set_alpha_target(0.0);
		}
		Ok(())
	}

	/// Whether the node with `id` is currently pinned.
	pub fn is_pinned(&self, id: &str) -> bool {
		self.index_of(id)
			.is_some_and(|i| self.node_sim.particles()[i].is_pinned())
	}

	/// Move the centering target to the middle of the new canvas.
	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
		self.node_sim
			.replace_force("center", CenterForce::new(width / 2.0, height / 2.0));
	}

	fn node_index(&self, id: &str) -> Result<usize> {
		self.index
			.get(id)
			.copied()
			.ok_or_else(|| Error::UnknownNode { id: id.to_string() })
	}

	fn refresh_anchors(&self) {
		let mut anchors = self.anchors.borrow_mut();
		anchors.clear();
		anchors.extend(self.node_sim.particles().iter().map(Particle::position));
	}

	/// Index of the node with `id`.
	pub fn index_of(&self, id: &str) -> Option<usize> {
		self.index.get(id).copied()
	}

	/// Position of the node with `id`.
	pub fn node_position(&self, id: &str) -> Option<Point> {
		self.index_of(id).map(|i| self.position(i))
	}

	/// Position of node `i`.
	///
	/// # Panics
	///
	/// If `i` is not a node index. Use [`Self::node_position`] for ids
	/// that may be unknown.
	pub fn position(&self, i: usize) -> Point {
		self.node_sim.particles()[i].position()
	}

	/// Every node id with its position.
	pub fn positions(&self) -> impl Iterator<Item = (&str, Point)> + '_ {
		self.nodes
			.iter()
			.zip(self.node_sim.particles())
			.map(|(n, p)| (n.id.as_str(), p.position()))
	}

	/// Absolute position of label `i`. Panics like [`Self::position`].
	pub fn label_position(&self, i: usize) -> Point {
		self.label_sim.particles()[i].position()
	}

	/// Label `i` relative to its node. Panics like [`Self::position`].
	pub fn label_offset(&self, i: usize) -> Point {
		let (label, node) = (self.label_position(i), self.position(self.labels[i].parent));
		Point::new(label.x - node.x, label.y - node.y)
	}

	/// All label offsets, indexed like the nodes.
	pub fn label_offsets(&self) -> Vec<Point> {
		(0..self.labels.len()).map(|i| self.label_offset(i)).collect()
	}

	/// Current label boxes, indexed like the nodes.
	pub fn label_boxes(&self) -> Vec<LabelBox> {
		self.labels
			.iter()
			.zip(self.label_sim.particles())
			.map(|(l, p)| LabelBox::new(p.x, p.y, l.width, l.height))
			.collect()
	}

	/// Nearest node whose marker (or hit radius, if larger) contains
	/// `(x, y)`, in layout coordinates.
	pub fn node_at(&self, x: f64, y: f64) -> Option<usize> {
		let target = Point::new(x, y);
		self.node_sim
			.particles()
			.iter()
			.zip(&self.nodes)
			.enumerate()
			.map(|(i, (p, n))| (i, p.position().distance(target), n.size.max(self.config.hit_radius)))
			.filter(|(_, d, reach)| d < reach)
			.min_by(|a, b| a.1.total_cmp(&b.1))
			.map(|(i, _, _)| i)
	}

	/// Nodes linked to node `i`.
	pub fn neighbors(&self, i: usize) -> &[usize] {
		&self.adjacency[i]
	}

	#[allow(missing_docs)]
	pub fn nodes(&self) -> &[NodeInfo] {
		&self.nodes
	}

	#[allow(missing_docs)]
	pub fn links(&self) -> &[ResolvedLink] {
		&self.links
	}

	#[allow(missing_docs)]
	pub fn labels(&self) -> &[LabelNode] {
		&self.labels
	}

	#[allow(missing_docs)]
	pub fn config(&self) -> &LayoutConfig {
		&self.config
	}

	/// Node simulation temperature.
	pub fn alpha(&self) -> f64 {
		self.node_sim.alpha()
	}

	/// Whether the node simulation has cooled and nothing is pinned.
	pub fn is_settled(&self) -> bool {
		self.node_sim.is_settled()
	}

	#[allow(missing_docs)]
	pub fn size(&self) -> (f64, f64) {
		(self.width, self.height)
	}
}

fn measure_label(metrics: &dyn LabelMetrics, text: &str) -> LabelSize {
	if text.is_empty() {
		return LabelSize::estimate(text);
	}
	match metrics.measure(text) {
		Ok(size) if size.width.is_finite() && size.width > 0.0 && size.height.is_finite() => size,
		Ok(size) => {
			warn!("unusable extent {size:?} for label {text:?}; estimating");
			LabelSize::estimate(text)
		}
		Err(e) => {
			warn!("{e}; estimating");
			LabelSize::estimate(text)
		}
	}
}

/// Deterministic, non-overlapping start positions spiralling out from
/// `(cx, cy)`.
fn phyllotaxis(count: usize, cx: f64, cy: f64) -> Vec<Particle> {
	let step = PI * (3.0 - 5f64.sqrt());
	(0..count)
		.map(|i| {
			let radius = 10.0 * (0.5 + i as f64).sqrt();
			let angle = i as f64 * step;
			Particle::at(cx + radius * angle.cos(), cy + radius * angle.sin())
		})
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::data::{GraphLink, GraphNode};
	use crate::error::ErrorKind;
	use crate::layout::config::default_tether_distance;
	use crate::layout::label::EstimatedMetrics;
	use crate::layout::resolver::count_overlaps;
	use crate::layout::simulation::DEFAULT_ALPHA_MIN;

	fn node(id: &str) -> GraphNode {
		GraphNode {
			id: id.into(),
			label: format!("Post {id}"),
			kind: "post".into(),
			..GraphNode::default()
		}
	}

	fn link(source: &str, target: &str, strength: f64) -> GraphLink {
		GraphLink {
			source: source.into(),
			target: target.into(),
			strength: Some(strength),
		}
	}

	fn engine(data: &GraphData) -> LayoutEngine {
		LayoutEngine::new(data, 800.0, 600.0, LayoutConfig::default(), &EstimatedMetrics).unwrap()
	}

	fn abc() -> GraphData {
		GraphData {
			nodes: vec![node("a"), node("b"), node("c")],
			links: vec![link("a", "b", 1.0)],
			..GraphData::default()
		}
	}

	struct BrokenMetrics;

	impl LabelMetrics for BrokenMetrics {
		fn measure(&self, text: &str) -> Result<LabelSize> {
			Err(Error::MeasurementFailure {
				label: text.into(),
				reason: "no context".into(),
			})
		}
	}

	#[test]
	fn linked_nodes_settle_near_link_distance() {
		let mut engine = engine(&abc());
		engine.warm_up();
		for _ in 0..500 {
			engine.tick();
		}
		let config = LayoutConfig::default();
		let (a, b, c) = (
			engine.node_position("a").unwrap(),
			engine.node_position("b").unwrap(),
			engine.node_position("c").unwrap(),
		);
		let ab = a.distance(b);
		assert!(
			(ab - config.link_distance).abs() <= config.link_distance * 0.1,
			"distance(a, b) = {ab}"
		);
		assert!(c.distance(a) > config.collision_radius);
		assert!(c.distance(b) > config.collision_radius);
		assert!(engine.is_settled());
	}

	#[test]
	fn linked_pair_approaches_link_distance_steadily() {
		let mut engine = engine(&abc());
		engine.warm_up();
		let rest = engine.config().link_distance;
		let gap = |e: &LayoutEngine| {
			let (a, b) = (e.node_position("a").unwrap(), e.node_position("b").unwrap());
			(a.distance(b) - rest).abs()
		};
		let mut trace = vec![gap(&engine)];
		for _ in 0..500 {
			engine.tick();
			trace.push(gap(&engine));
		}
		// The first few ticks are dominated by the initial charge burst.
		for (i, w) in trace.windows(2).enumerate().skip(5) {
			assert!(w[1] <= w[0] + 0.1, "gap rose at tick {}: {} -> {}", i + 1, w[0], w[1]);
		}
		let last = trace[trace.len() - 1];
		assert!(last <= rest * 0.1, "final gap {last}");
	}

	#[test]
	fn label_simulation_runs_warm_up_and_per_tick_steps() {
		let mut engine = engine(&abc());
		let config = LayoutConfig::default();
		assert!(config.label_warmup_ticks >= 500);
		assert!(config.label_ticks_per_tick >= 20);

		engine.warm_up();
		assert!(engine.label_sim.alpha() < engine.label_sim.alpha_min());

		// Reheat to a known temperature and count the decay steps of one tick.
		engine.label_sim.reheat(1.0);
		let decay = 1.0 - DEFAULT_ALPHA_MIN.powf(1.0 / 300.0);
		let mut expected = 1.0;
		for _ in 0..config.label_ticks_per_tick {
			expected += (0.0 - expected) * decay;
		}
		assert!(engine.tick());
		assert!((engine.label_sim.alpha() - expected).abs() < 1e-12);
	}

	#[test]
	#[should_panic]
	fn position_panics_past_the_last_node() {
		engine(&abc()).position(3);
	}

	#[test]
	fn unknown_ids_have_no_position() {
		assert_eq!(engine(&abc()).node_position("ghost"), None);
	}

	#[test]
	fn dangling_link_fails_fast() {
		let data = GraphData {
			nodes: vec![node("a")],
			links: vec![link("a", "ghost", 1.0)],
			..GraphData::default()
		};
		let err = LayoutEngine::new(&data, 800.0, 600.0, LayoutConfig::default(), &EstimatedMetrics)
			.err()
			.unwrap();
		assert_eq!(err.kind(), ErrorKind::DanglingLinkReference);
		assert_eq!(
			err,
			Error::DanglingLinkReference {
				from: "a".into(),
				to: "ghost".into(),
				missing: "ghost".into(),
			}
		);
	}

	#[test]
	fn empty_graph_ticks() {
		let mut engine = engine(&GraphData::default());
		engine.warm_up();
		for _ in 0..10 {
			engine.tick();
		}
		assert_eq!(engine.positions().count(), 0);
		assert!(engine.label_offsets().is_empty());
		assert_eq!(engine.settle_static().pushes, 0);
	}

	#[test]
	fn single_node_stays_centered() {
		let data = GraphData {
			nodes: vec![node("solo")],
			..GraphData::default()
		};
		let mut engine = engine(&data);
		for _ in 0..100 {
			engine.tick();
		}
		let p = engine.node_position("solo").unwrap();
		assert!(p.distance(Point::new(400.0, 300.0)) < 1e-6);
	}

	#[test]
	fn pinned_node_reports_pin_until_released() {
		let mut engine = engine(&abc());
		for _ in 0..50 {
			engine.tick();
		}
		engine.pin("a", 10.0, 20.0).unwrap();
		for _ in 0..30 {
			engine.tick();
			assert_eq!(engine.node_position("a"), Some(Point::new(10.0, 20.0)));
		}
		engine.update_pin("a", 50.0, 60.0).unwrap();
		engine.tick();
		assert_eq!(engine.node_position("a"), Some(Point::new(50.0, 60.0)));

		engine.unpin("a").unwrap();
		for _ in 0..30 {
			engine.tick();
		}
		assert_ne!(engine.node_position("a"), Some(Point::new(50.0, 60.0)));
	}

	#[test]
	fn pinning_rewarms_a_settled_layout() {
		let mut engine = engine(&abc());
		while engine.tick() {}
		assert!(!engine.tick());
		engine.pin("c", 0.0, 0.0).unwrap();
		assert!(engine.tick());
		engine.pin("b", 5.0, 5.0).unwrap();
		engine.unpin("c").unwrap();
		assert!(!engine.is_settled());
		engine.unpin("b").unwrap();
		engine.unpin("b").unwrap();
		while engine.tick() {}
		assert!(engine.is_settled());
	}

	#[test]
	fn pin_unknown_node_is_an_error() {
		let mut engine = engine(&abc());
		assert_eq!(engine.pin("zz", 0.0, 0.0).unwrap_err().kind(), ErrorKind::UnknownNode);
		assert_eq!(engine.unpin("zz").unwrap_err().kind(), ErrorKind::UnknownNode);
	}

	#[test]
	fn labels_start_on_a_circle_and_stay_tethered() {
		let mut engine = engine(&abc());
		let center = Point::new(400.0, 300.0);
		for i in 0..3 {
			assert!((engine.label_position(i).distance(center) - 240.0).abs() < 1e-9);
		}
		engine.warm_up();
		for _ in 0..300 {
			engine.tick();
		}
		for (i, label) in engine.labels().iter().enumerate() {
			let offset = engine.label_offset(i);
			let d = offset.x.hypot(offset.y);
			assert!(d.is_finite());
			assert!(d < 2.0 * default_tether_distance(label.width), "label {i} at {d}");
		}
	}

	#[test]
	fn label_offset_is_relative_to_parent() {
		let engine = engine(&abc());
		let offset = engine.label_offset(1);
		let (label, node) = (engine.label_position(1), engine.position(1));
		assert_eq!(offset, Point::new(label.x - node.x, label.y - node.y));
	}

	#[test]
	fn measurement_failure_falls_back_to_estimate() {
		let engine = LayoutEngine::new(&abc(), 800.0, 600.0, LayoutConfig::default(), &BrokenMetrics).unwrap();
		let label = &engine.labels()[0];
		assert_eq!(label.width, LabelSize::estimate("Post a").width);
		assert_eq!(label.collision_radius, label.width / 2.0 + 35.0);
	}

	#[test]
	fn node_defaults_apply() {
		let engine = engine(&abc());
		let info = &engine.nodes()[0];
		assert_eq!(info.size, DEFAULT_NODE_SIZE);
		assert_eq!(info.color, DEFAULT_NODE_COLOR);
		assert_eq!(engine.neighbors(0), &[1]);
		assert!(engine.neighbors(2).is_empty());
	}

	#[test]
	fn link_strength_is_clamped() {
		let data = GraphData {
			nodes: vec![node("a"), node("b")],
			links: vec![link("a", "b", 7.0)],
			..GraphData::default()
		};
		assert_eq!(engine(&data).links()[0].strength, 1.0);
	}

	#[test]
	fn hit_test_finds_nearest_node() {
		let engine = engine(&abc());
		let p = engine.position(2);
		assert_eq!(engine.node_at(p.x + 1.0, p.y), Some(2));
		assert_eq!(engine.node_at(-1000.0, -1000.0), None);
	}

	#[test]
	fn resize_moves_the_center() {
		let mut engine = engine(&abc());
		engine.resize(2000.0, 1000.0);
		for _ in 0..50 {
			engine.tick();
		}
		let n = engine.positions().count() as f64;
		let (sx, sy) = engine
			.positions()
			.fold((0.0, 0.0), |(sx, sy), (_, p)| (sx + p.x, sy + p.y));
		assert!((sx / n - 1000.0).abs() < 1.0);
		assert!((sy / n - 500.0).abs() < 1.0);
		assert_eq!(engine.size(), (2000.0, 1000.0));
	}

	#[test]
	fn static_layout_leaves_no_overlapping_labels() {
		let data = GraphData {
			nodes: (0..8).map(|i| node(&format!("n{i}"))).collect(),
			links: (1..8)
				.map(|i| link(&format!("n{}", i / 2), &format!("n{i}"), 0.5))
				.collect(),
			..GraphData::default()
		};
		let mut engine = engine(&data);
		let report = engine.settle_static();
		assert!(report.resolved, "{report:?}");
		let padding = engine.config().resolver.padding;
		assert_eq!(count_overlaps(&engine.label_boxes(), padding), 0);
		assert!(!engine.tick());
	}
}
