use std::collections::BTreeMap;
use std::f64::consts::TAU;

use web_sys::CanvasRenderingContext2d;

use super::camera::{CameraState, Viewport};
use super::colors::{BACKGROUND, RING, SECONDARY, category_color};
use super::config::EngineConfig;
use super::state::GraphState;

// Screen-space sizes, divided by the camera scale when drawn.
const DIM_RADIUS: f64 = 0.8;
const BRIGHT_RADIUS: f64 = 1.5;
const HIGHLIGHT_RADIUS: f64 = 3.5;
const SELECTED_HALO: f64 = 14.0;
const SELECTED_RING: f64 = 8.0;
const SELECTED_CORE: f64 = 4.0;
const RING_WIDTH: f64 = 2.5;
const LINK_WIDTH: f64 = 0.5;

const DIM_ALPHA: f64 = 0.15;
const HALO_ALPHA: f64 = 0.2;
const LINK_ALPHA: f64 = 0.07;
const SELECTED_LINK_ALPHA: f64 = 0.8;

/// Nodes sharing one fill colour, drawn as a single path.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeBatch {
	pub color: &'static str,
	pub points: Vec<(f64, f64)>,
}

/// Links sharing one stroke colour, drawn as a single path.
#[derive(Clone, Debug, PartialEq)]
pub struct LinkBatch {
	pub color: &'static str,
	pub segments: Vec<((f64, f64), (f64, f64))>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeStyle {
	pub radius_px: f64,
	pub alpha: f64,
}

/// Everything one frame draws, in world coordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct FramePlan {
	pub camera: CameraState,
	pub low_quality: bool,
	pub link_alpha: f64,
	pub links: Vec<LinkBatch>,
	pub dim: Vec<NodeBatch>,
	pub dim_style: NodeStyle,
	pub bright: Vec<NodeBatch>,
	pub bright_style: NodeStyle,
	pub selected: Option<((f64, f64), &'static str)>,
}

/// Edge stride bounding link draw cost on very large graphs.
pub fn link_stride(edges: usize, config: &EngineConfig) -> usize {
	if edges > config.link_sparse_threshold {
		4
	} else if edges > config.link_thin_threshold {
		2
	} else {
		1
	}
}

/// Backing-store scale for a device pixel ratio, capped at `max_ratio`.
/// Non-finite or non-positive inputs fall back to 1.
pub fn pixel_ratio(device: f64, max_ratio: f64) -> f64 {
	let ratio = if device.is_finite() && device > 0.0 { device } else { 1.0 };
	if max_ratio.is_finite() && max_ratio > 0.0 {
		ratio.min(max_ratio)
	} else {
		ratio
	}
}

pub fn plan_frame(state: &GraphState) -> FramePlan {
	let camera = state.camera.current;
	let config = &state.config;
	let nodes = state.nodes();
	let pos = state.positions().current();
	let at = |i: usize| (pos[i * 2], pos[i * 2 + 1]);
	let color_of = |i: usize| category_color(nodes[i].category.as_deref());
	let visible = state
		.camera
		.visible_bounds(state.viewport(), config.cull_padding_px);
	let low_quality = state.is_low_quality();
	let selected = state.selected_index();
	let highlight = state.highlight();

	let mut links: Vec<LinkBatch> = Vec::new();
	let mut link_alpha = LINK_ALPHA;
	if let Some(sel) = selected {
		link_alpha = SELECTED_LINK_ALPHA;
		let segments = highlight.iter().skip(1).map(|&n| (at(sel), at(n))).collect();
		links.push(LinkBatch {
			color: color_of(sel),
			segments,
		});
	} else if !low_quality {
		let flat = state.links();
		let stride = link_stride(flat.len() / 2, config);
		let mut by_color: BTreeMap<&'static str, Vec<_>> = BTreeMap::new();
		for pair in flat.chunks_exact(2).step_by(stride) {
			let (s, t) = (pair[0] as usize, pair[1] as usize);
			let (a, b) = (at(s), at(t));
			if visible.rejects_segment(a, b) {
				continue;
			}
			by_color.entry(color_of(s)).or_default().push((a, b));
		}
		links = by_color
			.into_iter()
			.map(|(color, segments)| LinkBatch { color, segments })
			.collect();
	}

	let mut dim: BTreeMap<&'static str, Vec<(f64, f64)>> = BTreeMap::new();
	let mut bright: BTreeMap<&'static str, Vec<(f64, f64)>> = BTreeMap::new();
	for &i in state.active().indices() {
		let (x, y) = at(i);
		if !visible.contains(x, y) {
			continue;
		}
		if selected.is_none() || highlight.contains(&i) {
			bright.entry(color_of(i)).or_default().push((x, y));
		} else {
			dim.entry(SECONDARY).or_default().push((x, y));
		}
	}
	let to_nodes = |map: BTreeMap<&'static str, Vec<(f64, f64)>>| -> Vec<NodeBatch> {
		map.into_iter()
			.map(|(color, points)| NodeBatch { color, points })
			.collect()
	};

	FramePlan {
		camera,
		low_quality,
		link_alpha,
		links,
		dim: to_nodes(dim),
		dim_style: NodeStyle {
			radius_px: DIM_RADIUS,
			alpha: DIM_ALPHA,
		},
		bright: to_nodes(bright),
		bright_style: NodeStyle {
			radius_px: if selected.is_some() {
				HIGHLIGHT_RADIUS
			} else {
				BRIGHT_RADIUS
			},
			alpha: 1.0,
		},
		selected: selected.map(|sel| (at(sel), color_of(sel))),
	}
}

/// Paints `plan` onto a canvas backing store of `viewport × pixel_ratio`.
pub fn paint(plan: &FramePlan, ctx: &CanvasRenderingContext2d, viewport: Viewport, pixel_ratio: f64) {
	let _ = ctx.set_transform(pixel_ratio, 0.0, 0.0, pixel_ratio, 0.0, 0.0);
	ctx.set_global_alpha(1.0);
	ctx.set_fill_style_str(BACKGROUND);
	ctx.fill_rect(0.0, 0.0, viewport.width, viewport.height);

	let cam = plan.camera;
	let _ = ctx.translate(viewport.width / 2.0, viewport.height / 2.0);
	let _ = ctx.scale(cam.scale, cam.scale);
	let _ = ctx.translate(-cam.x, -cam.y);

	draw_links(plan, ctx);
	draw_nodes(plan, ctx);
	draw_selected(plan, ctx);
	ctx.set_global_alpha(1.0);
}

fn draw_links(plan: &FramePlan, ctx: &CanvasRenderingContext2d) {
	if plan.links.is_empty() {
		return;
	}
	let _ = ctx.set_line_dash(&js_sys::Array::new());
	ctx.set_line_width(LINK_WIDTH / plan.camera.scale);
	ctx.set_global_alpha(plan.link_alpha);
	for batch in &plan.links {
		ctx.set_stroke_style_str(batch.color);
		ctx.begin_path();
		for &((x1, y1), (x2, y2)) in &batch.segments {
			ctx.move_to(x1, y1);
			ctx.line_to(x2, y2);
		}
		ctx.stroke();
	}
}

fn fill_batches(ctx: &CanvasRenderingContext2d, batches: &[NodeBatch], style: NodeStyle, scale: f64) {
	let r = style.radius_px / scale;
	ctx.set_global_alpha(style.alpha);
	for batch in batches {
		ctx.set_fill_style_str(batch.color);
		ctx.begin_path();
		for &(x, y) in &batch.points {
			ctx.move_to(x + r, y);
			let _ = ctx.arc(x, y, r, 0.0, TAU);
		}
		ctx.fill();
	}
}

fn draw_nodes(plan: &FramePlan, ctx: &CanvasRenderingContext2d) {
	let scale = plan.camera.scale;
	fill_batches(ctx, &plan.dim, plan.dim_style, scale);
	fill_batches(ctx, &plan.bright, plan.bright_style, scale);
}

fn draw_selected(plan: &FramePlan, ctx: &CanvasRenderingContext2d) {
	let Some(((x, y), color)) = plan.selected else {
		return;
	};
	let k = plan.camera.scale;

	ctx.set_global_alpha(HALO_ALPHA);
	ctx.set_fill_style_str(color);
	ctx.begin_path();
	let _ = ctx.arc(x, y, SELECTED_HALO / k, 0.0, TAU);
	ctx.fill();

	ctx.set_global_alpha(1.0);
	ctx.set_stroke_style_str(RING);
	ctx.set_line_width(RING_WIDTH / k);
	ctx.begin_path();
	let _ = ctx.arc(x, y, SELECTED_RING / k, 0.0, TAU);
	ctx.stroke();

	ctx.begin_path();
	let _ = ctx.arc(x, y, SELECTED_CORE / k, 0.0, TAU);
	ctx.fill();
}
