use std::collections::HashSet;

use log::debug;

use crate::data::GraphData;
use crate::error::Result;
use crate::layout::{LabelMetrics, LayoutConfig, LayoutEngine, Point};

pub const MIN_ZOOM: f64 = 0.5;
pub const MAX_ZOOM: f64 = 5.0;
/// Pointer travel, in screen pixels, below which a press counts as a click.
const CLICK_SLOP: f64 = 3.0;

#[derive(Clone, Debug)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

impl Default for ViewTransform {
	fn default() -> Self {
		Self { x: 0.0, y: 0.0, k: 1.0 }
	}
}

#[derive(Clone, Debug, Default)]
pub struct DragState {
	pub active: bool,
	pub node_idx: Option<usize>,
	pub start_x: f64,
	pub start_y: f64,
	pub node_start: Point,
	pub moved: bool,
}

#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start_x: f64,
	pub transform_start_y: f64,
}

#[derive(Clone, Debug, Default)]
pub struct HoverState {
	pub node: Option<usize>,
	pub neighbors: HashSet<usize>,
	pub highlight_t: f64,
	pub prev_node: Option<usize>,
	pub prev_neighbors: HashSet<usize>,
	delay_t: f64,
}

pub struct GraphViewState {
	pub engine: LayoutEngine,
	pub transform: ViewTransform,
	pub drag: DragState,
	pub pan: PanState,
	pub hover: HoverState,
	pub width: f64,
	pub height: f64,
	/// Whether the layout keeps simulating after the first paint.
	pub animate: bool,
}

impl GraphViewState {
	/// Lay out `data`. Animated views warm the labels up and keep ticking;
	/// static views settle everything now and resolve label overlaps.
	pub fn new(
		data: &GraphData,
		width: f64,
		height: f64,
		animate: bool,
		metrics: &dyn LabelMetrics,
	) -> Result<Self> {
		let mut engine = LayoutEngine::new(data, width, height, LayoutConfig::default(), metrics)?;
		if animate {
			engine.warm_up();
		} else {
			engine.settle_static();
		}

		Ok(Self {
			engine,
			transform: ViewTransform::default(),
			drag: DragState::default(),
			pan: PanState::default(),
			hover: HoverState::default(),
			width,
			height,
			animate,
		})
	}

	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
		(
			(sx - self.transform.x) / self.transform.k,
			(sy - self.transform.y) / self.transform.k,
		)
	}

	pub fn node_at_position(&self, sx: f64, sy: f64) -> Option<usize> {
		let (gx, gy) = self.screen_to_graph(sx, sy);
		self.engine.node_at(gx, gy)
	}

	/// Press at screen `(x, y)`: grab a node, or start panning. A grabbed
	/// node is only pinned once the pointer moves past the click slop.
	pub fn press(&mut self, x: f64, y: f64) {
		if let Some(idx) = self.node_at_position(x, y) {
			let node_start = self.engine.position(idx);
			self.drag = DragState {
				active: true,
				node_idx: Some(idx),
				start_x: x,
				start_y: y,
				node_start,
				moved: false,
			};
		} else {
			self.pan = PanState {
				active: true,
				start_x: x,
				start_y: y,
				transform_start_x: self.transform.x,
				transform_start_y: self.transform.y,
			};
		}
	}

	/// Pointer moved to screen `(x, y)`.
	pub fn move_to(&mut self, x: f64, y: f64) -> Result<()> {
		if !self.drag.active {
			let hovered = self.node_at_position(x, y);
			self.set_hover(hovered);
		}

		if self.drag.active {
			let Some(idx) = self.drag.node_idx else {
				return Ok(());
			};
			let (sdx, sdy) = (x - self.drag.start_x, y - self.drag.start_y);
			if !self.drag.moved && sdx.hypot(sdy) < CLICK_SLOP {
				return Ok(());
			}
			// Static layouts are not re-simulated, so nodes stay put.
			if !self.animate {
				self.drag.moved = true;
				return Ok(());
			}
			let id = self.engine.nodes()[idx].id.clone();
			let (nx, ny) = (
				self.drag.node_start.x + sdx / self.transform.k,
				self.drag.node_start.y + sdy / self.transform.k,
			);
			if self.drag.moved {
				self.engine.update_pin(&id, nx, ny)?;
			} else {
				self.drag.moved = true;
				self.engine.pin(&id, nx, ny)?;
			}
		} else if self.pan.active {
			self.transform.x = self.pan.transform_start_x + (x - self.pan.start_x);
			self.transform.y = self.pan.transform_start_y + (y - self.pan.start_y);
		}
		Ok(())
	}

	/// Release the pointer. Returns the url of a node that was clicked
	/// rather than dragged.
	pub fn release(&mut self) -> Result<Option<String>> {
		let mut clicked = None;
		if let (true, Some(idx)) = (self.drag.active, self.drag.node_idx) {
			let node = &self.engine.nodes()[idx];
			if self.drag.moved {
				let id = node.id.clone();
				self.engine.unpin(&id)?;
			} else {
				clicked = node.url.clone();
			}
		}
		self.drag = DragState::default();
		self.pan.active = false;
		Ok(clicked)
	}

	/// Pointer left the canvas: drop any drag without treating it as a click.
	pub fn leave(&mut self) -> Result<()> {
		if let (true, true, Some(idx)) = (self.drag.active, self.drag.moved, self.drag.node_idx) {
			let id = self.engine.nodes()[idx].id.clone();
			self.engine.unpin(&id)?;
		}
		self.drag = DragState::default();
		self.pan.active = false;
		self.set_hover(None);
		Ok(())
	}

	/// Zoom by `factor` around screen `(x, y)`.
	pub fn zoom_at(&mut self, x: f64, y: f64, factor: f64) {
		let new_k = (self.transform.k * factor).clamp(MIN_ZOOM, MAX_ZOOM);
		let ratio = new_k / self.transform.k;
		self.transform.x = x - (x - self.transform.x) * ratio;
		self.transform.y = y - (y - self.transform.y) * ratio;
		self.transform.k = new_k;
	}

	pub fn set_hover(&mut self, node: Option<usize>) {
		if self.hover.node == node {
			return;
		}
		let was_hovering = self.hover.node.is_some();

		// Save previous state for fade-out
		if was_hovering && node.is_none() {
			self.hover.prev_node = self.hover.node.take();
			self.hover.prev_neighbors = std::mem::take(&mut self.hover.neighbors);
		} else {
			self.hover.prev_node = None;
			self.hover.prev_neighbors.clear();
		}

		self.hover.node = node;
		self.hover.neighbors.clear();

		if let Some(idx) = node {
			if !was_hovering {
				self.hover.delay_t = 0.0;
			}
			self.hover
				.neighbors
				.extend(self.engine.neighbors(idx).iter().copied());
			debug!("hover {}", self.engine.nodes()[idx].id);
		}
	}

	pub fn is_highlighted(&self, idx: usize) -> bool {
		self.hover.node == Some(idx)
			|| self.hover.neighbors.contains(&idx)
			|| self.hover.prev_node == Some(idx)
			|| self.hover.prev_neighbors.contains(&idx)
	}

	pub fn is_hovered(&self, idx: usize) -> bool {
		self.hover.node == Some(idx) || self.hover.prev_node == Some(idx)
	}

	pub fn has_active_highlight(&self) -> bool {
		self.hover.node.is_some() || self.hover.prev_node.is_some()
	}

	pub fn tick(&mut self, dt: f64) {
		if self.animate {
			self.engine.tick();
		}

		let (target, delay, speed) = if self.hover.node.is_some() {
			(1.0, 0.08, 6.0)
		} else {
			(0.0, 0.0, 6.0)
		};

		if self.hover.node.is_some() {
			self.hover.delay_t = (self.hover.delay_t + dt).min(delay);
			if self.hover.delay_t >= delay {
				self.hover.highlight_t += (target - self.hover.highlight_t) * (speed * dt).min(1.0);
			}
		} else {
			self.hover.highlight_t += (target - self.hover.highlight_t) * (speed * dt).min(1.0);
			if self.hover.highlight_t < 0.01 {
				self.hover.highlight_t = 0.0;
				self.hover.prev_node = None;
				self.hover.prev_neighbors.clear();
			}
		}
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
		self.engine.resize(width, height);
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::data::{GraphLink, GraphNode};
	use crate::layout::EstimatedMetrics;

	fn data() -> GraphData {
		let node = |id: &str, url: Option<&str>| GraphNode {
			id: id.into(),
			label: id.into(),
			kind: "post".into(),
			url: url.map(Into::into),
			..GraphNode::default()
		};
		GraphData {
			nodes: vec![node("a", Some("/a/")), node("b", None), node("c", None)],
			links: vec![GraphLink {
				source: "a".into(),
				target: "b".into(),
				strength: None,
			}],
			..GraphData::default()
		}
	}

	fn screen_pos(state: &GraphViewState, idx: usize) -> (f64, f64) {
		let p = state.engine.position(idx);
		(
			p.x * state.transform.k + state.transform.x,
			p.y * state.transform.k + state.transform.y,
		)
	}

	#[test]
	fn click_without_movement_yields_url() {
		let mut state = GraphViewState::new(&data(), 800.0, 600.0, true, &EstimatedMetrics).unwrap();
		let (x, y) = screen_pos(&state, 0);
		state.press(x, y);
		state.move_to(x + 1.0, y).unwrap();
		assert_eq!(state.release().unwrap().as_deref(), Some("/a/"));
	}

	#[test]
	fn drag_pins_then_releases() {
		let mut state = GraphViewState::new(&data(), 800.0, 600.0, true, &EstimatedMetrics).unwrap();
		state.zoom_at(0.0, 0.0, 2.0);
		let (x, y) = screen_pos(&state, 1);
		let start = state.engine.position(1);
		state.press(x, y);
		state.move_to(x + 40.0, y).unwrap();
		state.tick(0.016);
		let p = state.engine.position(1);
		assert!((p.x - (start.x + 20.0)).abs() < 1e-9);
		assert!((p.y - start.y).abs() < 1e-9);
		assert_eq!(state.release().unwrap(), None);
		assert!(!state.drag.active);
	}

	#[test]
	fn press_defers_the_pin_until_the_pointer_moves() {
		let mut state = GraphViewState::new(&data(), 800.0, 600.0, true, &EstimatedMetrics).unwrap();
		let (x, y) = screen_pos(&state, 1);
		state.press(x, y);
		assert!(!state.engine.is_pinned("b"));
		state.move_to(x + 1.0, y + 1.0).unwrap();
		assert!(!state.engine.is_pinned("b"));
		state.move_to(x + 10.0, y).unwrap();
		assert!(state.engine.is_pinned("b"));
		state.release().unwrap();
		assert!(!state.engine.is_pinned("b"));
	}

	#[test]
	fn hover_highlights_neighbors() {
		let mut state = GraphViewState::new(&data(), 800.0, 600.0, true, &EstimatedMetrics).unwrap();
		state.set_hover(Some(0));
		assert!(state.is_highlighted(1));
		assert!(!state.is_highlighted(2));
		state.set_hover(None);
		assert!(state.is_hovered(0));
		for _ in 0..200 {
			state.tick(0.016);
		}
		assert!(!state.has_active_highlight());
	}

	#[test]
	fn zoom_is_clamped() {
		let mut state = GraphViewState::new(&data(), 800.0, 600.0, false, &EstimatedMetrics).unwrap();
		for _ in 0..50 {
			state.zoom_at(100.0, 100.0, 1.1);
		}
		assert_eq!(state.transform.k, MAX_ZOOM);
		for _ in 0..100 {
			state.zoom_at(100.0, 100.0, 0.9);
		}
		assert_eq!(state.transform.k, MIN_ZOOM);
	}
}
