use std::f64::consts::PI;

use web_sys::CanvasRenderingContext2d;

use super::measure::{LABEL_FONT, LABEL_FONT_HOVER};
use super::state::GraphViewState;

const BACKGROUND: &str = "#1a1a1a";
const LINK_BASE: (f64, f64, f64) = (51.0, 51.0, 51.0);
const ARROW_SIZE: f64 = 8.0;
const LABEL_BG_PAD_X: f64 = 8.0;
const LABEL_BG_HEIGHT: f64 = 24.0;

fn ease_out_cubic(t: f64) -> f64 {
	1.0 - (1.0 - t).powi(3)
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
	a + (b - a) * t
}

pub fn render(state: &GraphViewState, ctx: &CanvasRenderingContext2d) {
	ctx.set_fill_style_str(BACKGROUND);
	ctx.fill_rect(0.0, 0.0, state.width, state.height);
	ctx.save();
	let _ = ctx.translate(state.transform.x, state.transform.y);
	let _ = ctx.scale(state.transform.k, state.transform.k);
	draw_links(state, ctx);
	draw_nodes(state, ctx);
	draw_labels(state, ctx);
	ctx.restore();
}

fn draw_links(state: &GraphViewState, ctx: &CanvasRenderingContext2d) {
	let engine = &state.engine;
	let t = ease_out_cubic(state.hover.highlight_t);
	let focus = state.hover.node.or(state.hover.prev_node);
	ctx.set_line_width(1.5);

	for link in engine.links() {
		let (s, d) = (engine.position(link.source), engine.position(link.target));
		let (dx, dy) = (d.x - s.x, d.y - s.y);
		let dist = (dx * dx + dy * dy).sqrt();
		if dist < 0.001 {
			continue;
		}

		// Incident links brighten to white, the rest fade out.
		let incident = focus.is_some_and(|f| f == link.source || f == link.target);
		let (channel, alpha) = if incident {
			(lerp(LINK_BASE.0, 255.0, t), lerp(0.6, 0.9, t))
		} else {
			(LINK_BASE.0, lerp(0.6, 0.2, t))
		};
		let color = format!("rgba({channel}, {channel}, {channel}, {alpha})");
		let target_radius = engine.nodes()[link.target].size;

		let (ux, uy) = (dx / dist, dy / dist);
		ctx.set_stroke_style_str(&color);
		ctx.begin_path();
		ctx.move_to(s.x, s.y);
		ctx.line_to(
			d.x - ux * (target_radius + ARROW_SIZE),
			d.y - uy * (target_radius + ARROW_SIZE),
		);
		ctx.stroke();

		let (tip_x, tip_y) = (d.x - ux * target_radius, d.y - uy * target_radius);
		let (back_x, back_y) = (tip_x - ux * ARROW_SIZE, tip_y - uy * ARROW_SIZE);
		let (px, py) = (-uy * ARROW_SIZE * 0.3, ux * ARROW_SIZE * 0.3);
		ctx.set_fill_style_str(&color);
		ctx.begin_path();
		ctx.move_to(tip_x, tip_y);
		ctx.line_to(back_x + px, back_y + py);
		ctx.line_to(back_x - px, back_y - py);
		ctx.close_path();
		ctx.fill();
	}
}

/// Opacity of node `idx`, shared by its marker and label.
fn node_alpha(state: &GraphViewState, idx: usize, t: f64) -> f64 {
	if state.has_active_highlight() && !state.is_highlighted(idx) {
		lerp(0.8, 0.2, t)
	} else if state.is_hovered(idx) {
		lerp(0.8, 1.0, t)
	} else {
		0.8
	}
}

fn draw_nodes(state: &GraphViewState, ctx: &CanvasRenderingContext2d) {
	let t = ease_out_cubic(state.hover.highlight_t);
	for (idx, node) in state.engine.nodes().iter().enumerate() {
		let p = state.engine.position(idx);
		let radius = if state.is_hovered(idx) {
			node.size * lerp(1.0, 1.5, t)
		} else {
			node.size
		};

		ctx.set_global_alpha(node_alpha(state, idx, t));
		ctx.begin_path();
		let _ = ctx.arc(p.x, p.y, radius, 0.0, 2.0 * PI);
		ctx.set_fill_style_str(&node.color);
		ctx.fill();
	}
	ctx.set_global_alpha(1.0);
}

fn draw_labels(state: &GraphViewState, ctx: &CanvasRenderingContext2d) {
	let t = ease_out_cubic(state.hover.highlight_t);
	let engine = &state.engine;
	ctx.set_text_align("center");
	ctx.set_text_baseline("middle");

	for (idx, (node, label)) in engine.nodes().iter().zip(engine.labels()).enumerate() {
		if node.label.is_empty() {
			continue;
		}
		let (p, offset) = (engine.position(idx), engine.label_offset(idx));
		let (lx, ly) = (p.x + offset.x, p.y + offset.y);
		let hovered = state.is_hovered(idx) && t > 0.01;
		let opacity = if state.has_active_highlight() && !state.is_highlighted(idx) {
			lerp(1.0, 0.2, t)
		} else {
			1.0
		};

		let bg_alpha = if hovered { lerp(0.6, 0.8, t) } else { 0.6 };
		let bg_width = label.width + 2.0 * LABEL_BG_PAD_X;
		ctx.set_global_alpha(opacity);
		ctx.set_fill_style_str(&format!("rgba(0, 0, 0, {bg_alpha})"));
		ctx.fill_rect(
			lx - bg_width / 2.0,
			ly - LABEL_BG_HEIGHT / 2.0,
			bg_width,
			LABEL_BG_HEIGHT,
		);

		ctx.set_font(if hovered { LABEL_FONT_HOVER } else { LABEL_FONT });
		ctx.set_fill_style_str("#ffffff");
		let _ = ctx.fill_text(&node.label, lx, ly);
	}
	ctx.set_global_alpha(1.0);
}
