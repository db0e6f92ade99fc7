use std::collections::HashMap;

use log::{debug, info, warn};

use super::animator::{PositionAnimator, Simulation};
use super::camera::{Bounds, Camera, CameraState, Viewport, fit_camera};
use super::config::EngineConfig;
use super::interaction::Interaction;
use super::layout::LayoutEngine;
use super::links::{build_links, highlight_set};
use super::spatial::SpatialGrid;
use super::types::{ActiveSet, GraphNode, LayoutMode};

/// Whether the first layout has been installed. The only transition is
/// `Uninitialized -> Ready`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Readiness {
	#[default]
	Uninitialized,
	Ready,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PendingFit {
	Snap,
	Ease,
}

/// Outcome of one frame tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameEvents {
	/// Positions and camera converged after a layout or selection change.
	pub stabilized: bool,
}

// Camera scale drift, as a ratio, that triggers a grid rebuild.
const GRID_SCALE_DRIFT: f64 = 2.0;
pub const MOTION_THRESHOLD_PX: f64 = 0.5;

/// The whole engine: node store, layout, animation, camera, spatial index,
/// selection and interaction state. Owned by a single component instance.
pub struct GraphState {
	pub config: EngineConfig,
	pub camera: Camera,
	pub interaction: Interaction,
	nodes: Vec<GraphNode>,
	index_by_id: HashMap<String, usize>,
	filter: Option<Vec<usize>>,
	active: ActiveSet,
	mode: LayoutMode,
	links: Vec<u32>,
	layout: LayoutEngine,
	positions: PositionAnimator,
	grid: SpatialGrid,
	selected_id: Option<String>,
	selected: Option<usize>,
	highlight: Vec<usize>,
	readiness: Readiness,
	viewport: Viewport,
	panel_width: f64,
	pending_fit: Option<PendingFit>,
	stable_pending: bool,
}

impl GraphState {
	pub fn new(config: EngineConfig) -> Self {
		Self {
			camera: Camera::new(&config),
			positions: PositionAnimator::new(&config),
			interaction: Interaction::default(),
			nodes: Vec::new(),
			index_by_id: HashMap::new(),
			filter: None,
			active: ActiveSet::default(),
			mode: LayoutMode::default(),
			links: Vec::new(),
			layout: LayoutEngine::default(),
			grid: SpatialGrid::default(),
			selected_id: None,
			selected: None,
			highlight: Vec::new(),
			readiness: Readiness::Uninitialized,
			viewport: Viewport::default(),
			panel_width: 0.0,
			pending_fit: None,
			stable_pending: false,
			config,
		}
	}

	pub fn nodes(&self) -> &[GraphNode] {
		&self.nodes
	}

	pub fn node(&self, idx: usize) -> Option<&GraphNode> {
		self.nodes.get(idx)
	}

	pub fn active(&self) -> &ActiveSet {
		&self.active
	}

	pub fn mode(&self) -> LayoutMode {
		self.mode
	}

	/// Interleaved link pairs for the current layout.
	pub fn links(&self) -> &[u32] {
		&self.links
	}

	pub fn positions(&self) -> &PositionAnimator {
		&self.positions
	}

	pub fn readiness(&self) -> Readiness {
		self.readiness
	}

	pub fn viewport(&self) -> Viewport {
		self.viewport
	}

	pub fn selected_index(&self) -> Option<usize> {
		self.selected
	}

	/// Selected node followed by its capped neighbors; empty without a selection.
	pub fn highlight(&self) -> &[usize] {
		&self.highlight
	}

	pub fn set_viewport(&mut self, viewport: Viewport) {
		self.viewport = viewport;
	}

	/// Width of a side panel covering the right edge while a node is selected.
	pub fn set_panel_width(&mut self, width: f64) {
		self.panel_width = width.max(0.0);
	}

	/// Replaces the node store. Surviving ids keep their current position;
	/// new nodes start at their precomputed coordinates.
	pub fn set_nodes(&mut self, nodes: Vec<GraphNode>, filter: Option<Vec<usize>>) {
		let carried = {
			let old = self.positions.current();
			let mut buf = Vec::with_capacity(nodes.len() * 2);
			for node in &nodes {
				let previous = self
					.index_by_id
					.get(&node.id)
					.and_then(|&i| Some((*old.get(i * 2)?, *old.get(i * 2 + 1)?)));
				let (x, y) = previous.unwrap_or_else(|| node.home());
				buf.push(x);
				buf.push(y);
			}
			buf
		};
		debug!(
			"node store replaced: {} -> {} node(s)",
			self.nodes.len(),
			nodes.len()
		);
		self.index_by_id = nodes
			.iter()
			.enumerate()
			.map(|(i, n)| (n.id.clone(), i))
			.collect();
		self.nodes = nodes;
		self.positions.reset(carried);
		self.layout.invalidate();
		self.filter = filter;
		self.active = ActiveSet::from_filter(self.filter.as_deref(), self.nodes.len());
		self.resolve_selection();
		self.relayout();
	}

	/// Restricts layout, rendering and interaction to `filter`.
	pub fn set_filter(&mut self, filter: Option<Vec<usize>>) {
		let active = ActiveSet::from_filter(filter.as_deref(), self.nodes.len());
		self.filter = filter;
		if active.fingerprint() == self.active.fingerprint() {
			return;
		}
		self.active = active;
		self.relayout();
	}

	pub fn set_layout_mode(&mut self, mode: LayoutMode) {
		if mode == self.mode {
			return;
		}
		self.mode = mode;
		self.relayout();
	}

	/// Selects the node `id`, or clears the selection. Selecting frames the
	/// node and its neighbors.
	pub fn select(&mut self, id: Option<&str>) {
		if self.selected_id.as_deref() == id {
			return;
		}
		self.selected_id = id.map(str::to_string);
		self.resolve_selection();
		if self.selected.is_some() && self.readiness == Readiness::Ready {
			self.pending_fit = Some(PendingFit::Ease);
		}
		self.stable_pending = true;
	}

	fn resolve_selection(&mut self) {
		self.selected = match self.selected_id.as_deref() {
			None => None,
			Some(id) => match self.index_by_id.get(id) {
				Some(&idx) => Some(idx),
				None => {
					// Kept so the node is picked up once the host supplies it.
					warn!("selected node {id} is not in the node store");
					None
				}
			},
		};
		self.highlight = self
			.selected
			.map(|idx| highlight_set(&self.nodes, idx, self.config.neighbor_limit))
			.unwrap_or_default();
	}

	fn relayout(&mut self) {
		if self.nodes.is_empty() {
			self.links.clear();
			self.grid.clear();
			return;
		}
		self.links = build_links(
			&self.nodes,
			&self.active,
			self.mode,
			self.config.neighbor_limit,
		);
		let targets = self
			.layout
			.targets(&self.nodes, &self.active, self.mode, &self.config);
		self.positions.set_target(targets);

		match self.readiness {
			Readiness::Uninitialized => {
				self.positions.snap();
				self.readiness = Readiness::Ready;
				self.pending_fit = Some(PendingFit::Snap);
				info!("graph ready with {} node(s)", self.nodes.len());
			}
			Readiness::Ready => self.pending_fit = Some(PendingFit::Ease),
		}
		self.rebuild_grid();
		self.stable_pending = true;
	}

	fn rebuild_grid(&mut self) {
		self.grid.rebuild(
			self.positions.current(),
			self.active.indices(),
			self.camera.current.scale,
			self.config.grid_cell_px,
			self.config.min_cell_size,
		);
	}

	/// Camera framing the highlight set when a node is selected, otherwise the
	/// active set, measured on target positions.
	pub fn fit_target(&self) -> Option<CameraState> {
		if self.viewport.is_empty() {
			return None;
		}
		let targets = self.positions.target();
		let (bounds, occluded) = match self.selected {
			Some(_) => (
				Bounds::of(targets, self.highlight.iter().copied()),
				self.panel_width,
			),
			None => (Bounds::of(targets, self.active.indices().iter().copied()), 0.0),
		};
		Some(fit_camera(bounds?, self.viewport, occluded, &self.config))
	}

	pub fn zoom_to_fit(&mut self) {
		if let Some(target) = self.fit_target() {
			self.camera.set_target(&target);
		}
	}

	/// Advances camera and positions by one frame and keeps the spatial index
	/// in step with them.
	pub fn tick(&mut self) -> FrameEvents {
		if let Some(fit) = self.pending_fit {
			if !self.viewport.is_empty() {
				self.pending_fit = None;
				self.zoom_to_fit();
				if fit == PendingFit::Snap {
					self.camera.snap();
				}
			}
		}

		self.camera.step();
		if self.positions.step() {
			debug!("positions settled, rebuilding spatial index");
			self.rebuild_grid();
		} else if self.camera.is_settled() && !self.nodes.is_empty() {
			let ratio = self.camera.current.scale / self.grid.built_scale();
			if !(1.0 / GRID_SCALE_DRIFT..=GRID_SCALE_DRIFT).contains(&ratio) {
				self.rebuild_grid();
			}
		}

		let mut events = FrameEvents::default();
		if self.stable_pending
			&& self.pending_fit.is_none()
			&& self.positions.is_settled()
			&& self.camera.is_settled()
		{
			self.stable_pending = false;
			events.stabilized = true;
			info!("graph stabilized");
		}
		events
	}

	/// Reduced detail while anything on screen is in motion.
	pub fn is_low_quality(&self) -> bool {
		self.interaction.is_dragging()
			|| self.positions.is_animating()
			|| self.camera.is_moving(MOTION_THRESHOLD_PX)
	}

	/// Nodes that respond to the pointer: the highlight set while a node is
	/// selected, otherwise the active set.
	pub fn is_interactive(&self, idx: usize) -> bool {
		match self.selected {
			Some(_) => self.highlight.contains(&idx),
			None => self.active.contains(idx),
		}
	}

	/// Node under the screen point `(sx, sy)`.
	pub fn hit_test(&self, sx: f64, sy: f64) -> Option<usize> {
		let (wx, wy) = self.camera.screen_to_world(sx, sy, self.viewport);
		let radius = self.config.hit_radius_px / self.camera.current.scale;
		self.grid.nearest(self.positions.current(), wx, wy, radius, |i| {
			self.is_interactive(i)
		})
	}
}

#[cfg(test)]
pub(super) mod tests {
	use super::*;

	pub fn node(id: &str, x: f64, y: f64, neighbors: &[i64]) -> GraphNode {
		GraphNode {
			id: id.into(),
			name: id.to_uppercase(),
			x: Some(x),
			y: Some(y),
			neighbors: neighbors.to_vec(),
			..Default::default()
		}
	}

	pub fn ready_state(nodes: Vec<GraphNode>) -> GraphState {
		let mut state = GraphState::new(EngineConfig::default());
		state.set_viewport(Viewport::new(800.0, 600.0));
		state.set_nodes(nodes, None);
		state.tick();
		state
	}

	fn run_until_stable(state: &mut GraphState, frames: usize) -> usize {
		(0..frames).filter(|_| state.tick().stabilized).count()
	}

	fn max_delta(state: &GraphState) -> f64 {
		let p = state.positions();
		p.current()
			.iter()
			.zip(p.target())
			.map(|(c, t)| (t - c).abs())
			.fold(0.0, f64::max)
	}

	fn sample() -> Vec<GraphNode> {
		vec![
			node("a", 0.0, 0.0, &[1, 2]),
			node("b", 1.0, 0.0, &[0]),
			node("c", 0.0, 1.0, &[0, 3]),
			node("d", 1.0, 1.0, &[2]),
		]
	}

	#[test]
	fn first_layout_snaps_and_becomes_ready() {
		let mut state = GraphState::new(EngineConfig::default());
		assert_eq!(state.readiness(), Readiness::Uninitialized);
		state.set_viewport(Viewport::new(800.0, 600.0));
		state.set_nodes(sample(), None);
		assert_eq!(state.readiness(), Readiness::Ready);
		assert!(!state.positions().is_animating());
		assert_eq!(state.positions().position(3), Some((1.0, 1.0)));
		assert!(state.tick().stabilized);
		// The initial fit snaps rather than glides.
		assert!(state.camera.is_settled());
		assert_eq!(state.camera.current.scale, 450.0);
	}

	#[test]
	fn empty_store_stays_uninitialized() {
		let mut state = GraphState::new(EngineConfig::default());
		state.set_nodes(Vec::new(), None);
		assert_eq!(state.readiness(), Readiness::Uninitialized);
		assert!(state.links().is_empty());
	}

	#[test]
	fn mode_switch_converges_and_stabilizes_once() {
		let mut state = ready_state(sample());
		for mode in [LayoutMode::Category, LayoutMode::Lod, LayoutMode::Similarity] {
			state.set_layout_mode(mode);
			assert!(state.positions().is_animating());
			assert_eq!(run_until_stable(&mut state, 600), 1, "{mode}");
			assert!(max_delta(&state) < 0.0005);
		}
	}

	#[test]
	fn links_only_in_similarity_mode() {
		let mut state = ready_state(sample());
		assert_eq!(state.links(), &[0, 1, 0, 2, 1, 0, 2, 0, 2, 3, 3, 2]);
		state.set_layout_mode(LayoutMode::Provider);
		assert!(state.links().is_empty());
	}

	#[test]
	fn replacement_carries_positions_by_identity() {
		let mut state = ready_state(sample());
		state.set_layout_mode(LayoutMode::Category);
		for _ in 0..3 {
			state.tick();
		}
		let before: HashMap<String, (f64, f64)> = state
			.nodes()
			.iter()
			.enumerate()
			.map(|(i, n)| (n.id.clone(), state.positions().position(i).unwrap()))
			.collect();

		let next = super::super::ops::remove_node(state.nodes(), "b");
		state.set_nodes(next, None);
		for (i, n) in state.nodes().iter().enumerate() {
			assert_eq!(state.positions().position(i), Some(before[&n.id]), "{}", n.id);
		}
		assert_eq!(state.nodes()[0].neighbors, vec![1]);
	}

	#[test]
	fn new_nodes_start_at_home() {
		let mut state = ready_state(sample());
		let mut nodes = state.nodes().to_vec();
		nodes.insert(0, node("z", 7.0, -3.0, &[]));
		state.set_nodes(nodes, None);
		assert_eq!(state.positions().position(0), Some((7.0, -3.0)));
		assert_eq!(state.positions().position(1), Some((0.0, 0.0)));
	}

	#[test]
	fn stale_filter_entries_are_dropped() {
		let mut state = ready_state(sample());
		state.set_nodes(sample()[..2].to_vec(), Some(vec![0, 1, 3]));
		assert_eq!(state.active().indices(), &[0, 1]);
	}

	#[test]
	fn filter_restricts_links_and_hits() {
		let mut state = ready_state(sample());
		state.set_filter(Some(vec![0, 2]));
		assert_eq!(state.links(), &[0, 2, 2, 0]);
		assert!(!state.is_interactive(1));
		assert!(state.is_interactive(2));
	}

	#[test]
	fn zoom_to_fit_is_idempotent() {
		let mut state = ready_state(sample());
		state.zoom_to_fit();
		let first = state.camera.target;
		state.zoom_to_fit();
		assert_eq!(state.camera.target, first);

		state.set_panel_width(440.0);
		state.select(Some("c"));
		state.zoom_to_fit();
		let framed = state.camera.target;
		state.zoom_to_fit();
		assert_eq!(state.camera.target, framed);
		assert!(framed.x > 0.5);
	}

	#[test]
	fn selection_restricts_interaction_to_highlight() {
		let mut state = ready_state(sample());
		state.select(Some("b"));
		assert_eq!(state.selected_index(), Some(1));
		assert_eq!(state.highlight(), &[1, 0]);
		assert!(state.is_interactive(0));
		assert!(!state.is_interactive(3));
		state.select(None);
		assert!(state.is_interactive(3));
		assert!(state.highlight().is_empty());
	}

	#[test]
	fn selection_change_stabilizes_once() {
		let mut state = ready_state(sample());
		state.select(Some("a"));
		assert_eq!(run_until_stable(&mut state, 600), 1);
		assert!(state.camera.is_settled());
	}

	#[test]
	fn missing_selection_is_not_highlighted() {
		let mut state = ready_state(sample());
		state.select(Some("nope"));
		assert_eq!(state.selected_index(), None);
		assert!(state.highlight().is_empty());
		assert!(state.is_interactive(3));

		state.select(Some("d"));
		let next = super::super::ops::remove_node(state.nodes(), "d");
		state.set_nodes(next, None);
		assert_eq!(state.selected_index(), None);
		assert!(state.highlight().is_empty());
	}

	#[test]
	fn selection_resolves_when_node_arrives() {
		let mut state = GraphState::new(EngineConfig::default());
		state.set_viewport(Viewport::new(800.0, 600.0));
		state.select(Some("b"));
		assert_eq!(state.selected_index(), None);
		state.set_nodes(vec![node("a", 0.0, 0.0, &[1]), node("b", 1.0, 0.0, &[0])], None);
		assert_eq!(state.selected_index(), Some(1));
		assert_eq!(state.highlight(), &[1, 0]);
	}

	#[test]
	fn selection_survives_node_removal_and_return() {
		let mut state = ready_state(sample());
		state.select(Some("d"));
		let without = super::super::ops::remove_node(state.nodes(), "d");
		state.set_nodes(without, None);
		assert_eq!(state.selected_index(), None);
		state.set_nodes(sample(), None);
		assert_eq!(state.selected_index(), Some(3));
		assert_eq!(state.highlight(), &[3, 2]);
	}

	#[test]
	fn settled_zoom_past_drift_rebuilds_grid() {
		let mut state = ready_state(sample());
		let built = state.grid.cell_size();
		assert_eq!(state.grid.built_scale(), 450.0);

		// 1.002^100 is about 1.22x: inside the drift band.
		state.wheel(400.0, 300.0, -100.0);
		state.tick();
		assert_eq!(state.grid.cell_size(), built);
		assert_eq!(state.grid.built_scale(), 450.0);

		// Another 1.002^300 brings the total to about 2.2x.
		state.wheel(400.0, 300.0, -300.0);
		state.tick();
		let scale = state.camera.current.scale;
		assert!(scale > 900.0);
		assert_eq!(state.grid.built_scale(), scale);
		assert!((state.grid.cell_size() - 60.0 / scale).abs() < 1e-12);
		assert!(state.grid.cell_size() < built);
	}

	#[test]
	fn hit_test_finds_node_under_pointer() {
		let state = ready_state(sample());
		let vp = state.viewport();
		let (sx, sy) = state.camera.world_to_screen(1.0, 1.0, vp);
		assert_eq!(state.hit_test(sx + 3.0, sy - 2.0), Some(3));
		assert_eq!(state.hit_test(sx + 40.0, sy + 40.0), None);
	}

	#[test]
	fn motion_lowers_quality() {
		let mut state = ready_state(sample());
		assert!(!state.is_low_quality());
		state.set_layout_mode(LayoutMode::Category);
		assert!(state.is_low_quality());
	}
}
