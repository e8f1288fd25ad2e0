use std::f64::consts::PI;

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use super::state::MindMapState;
use crate::mindmap::{Connector, NODE_RADIUS};

const BACKGROUND: &str = "white";
const NODE_FILL: &str = "lightblue";
const ACTIVE_FILL: &str = "#ffd966";
const OUTLINE: &str = "black";
const CONNECTOR: &str = "#444444";

pub fn render(state: &MindMapState, ctx: &CanvasRenderingContext2d) {
	ctx.set_fill_style_str(BACKGROUND);
	ctx.fill_rect(0.0, 0.0, state.width, state.height);
	ctx.save();
	let _ = ctx.translate(state.transform.x, state.transform.y);
	let _ = ctx.scale(state.transform.k, state.transform.k);
	draw_connectors(state, ctx);
	draw_nodes(state, ctx);
	ctx.restore();
}

fn draw_connectors(state: &MindMapState, ctx: &CanvasRenderingContext2d) {
	let k = state.transform.k;
	let selected = state.selected();
	ctx.set_stroke_style_str(CONNECTOR);
	ctx.set_line_width(1.5 / k);

	for connector in state.store.connectors() {
		let Connector {
			parent,
			child,
			from,
			to,
		} = *connector;
		let (dx, dy) = (to.x - from.x, to.y - from.y);
		let dist = (dx * dx + dy * dy).sqrt();
		// Overlapping circles, nothing visible to connect.
		if dist <= 2.0 * NODE_RADIUS {
			continue;
		}

		// Connectors of the node being dragged are dashed until it is dropped.
		let dragging = selected.is_some_and(|s| s == parent || s == child);
		if dragging {
			let _ = ctx.set_line_dash(&js_sys::Array::of2(
				&JsValue::from_f64(6.0 / k),
				&JsValue::from_f64(4.0 / k),
			));
		}

		let (ux, uy) = (dx / dist, dy / dist);
		ctx.begin_path();
		ctx.move_to(from.x + ux * NODE_RADIUS, from.y + uy * NODE_RADIUS);
		ctx.line_to(to.x - ux * NODE_RADIUS, to.y - uy * NODE_RADIUS);
		ctx.stroke();

		if dragging {
			let _ = ctx.set_line_dash(&js_sys::Array::new());
		}
	}
}

fn draw_nodes(state: &MindMapState, ctx: &CanvasRenderingContext2d) {
	let (active, selected, k) = (state.store.active(), state.selected(), state.transform.k);
	ctx.set_text_align("center");
	ctx.set_text_baseline("middle");
	ctx.set_font("12px Arial");

	for node in state.store.nodes() {
		let (x, y) = (node.position.x, node.position.y);
		let is_active = active == Some(node.id);

		ctx.begin_path();
		let _ = ctx.arc(x, y, NODE_RADIUS, 0.0, 2.0 * PI);
		ctx.set_fill_style_str(if is_active { ACTIVE_FILL } else { NODE_FILL });
		ctx.fill();
		ctx.set_stroke_style_str(OUTLINE);
		ctx.set_line_width(if is_active { 2.5 / k } else { 1.0 / k });
		ctx.stroke();

		if selected == Some(node.id) {
			let _ = ctx.set_line_dash(&js_sys::Array::of2(
				&JsValue::from_f64(4.0 / k),
				&JsValue::from_f64(3.0 / k),
			));
			ctx.begin_path();
			let _ = ctx.arc(x, y, NODE_RADIUS + 4.0 / k, 0.0, 2.0 * PI);
			ctx.stroke();
			let _ = ctx.set_line_dash(&js_sys::Array::new());
		}

		ctx.set_fill_style_str(OUTLINE);
		let _ = ctx.fill_text(&node.label, x, y);
	}
}
