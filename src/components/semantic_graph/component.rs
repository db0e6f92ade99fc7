use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use log::error;
use wasm_bindgen::prelude::*;
use web_sys::{
	CanvasRenderingContext2d, HtmlCanvasElement, KeyboardEvent, MouseEvent, PointerEvent, WheelEvent,
	Window,
};

use super::camera::Viewport;
use super::config::EngineConfig;
use super::error::{EngineError, describe};
use super::interaction::{ContextMenu, PointerButton, PointerOutcome};
use super::listeners::{FrameLoop, ListenerGuard};
use super::render;
use super::state::GraphState;
use super::types::{GraphNode, HoverInfo, LayoutMode};

const TOOLTIP_OFFSET: f64 = 12.0;

/// Browser registrations owned by a mounted canvas; dropping them tears the
/// engine down.
struct EngineHandles {
	_frame: FrameLoop,
	_listeners: Vec<ListenerGuard>,
}

/// Interactive canvas rendering a semantic graph.
///
/// The host owns the node list, the filter, the layout mode and the
/// selection; the canvas reports clicks through `on_select` and never
/// changes the selection itself.
#[component]
pub fn SemanticGraphCanvas(
	/// Node store, replaced wholesale on change.
	#[prop(into)]
	nodes: Signal<Vec<GraphNode>>,
	/// Optional subset of node indices to show.
	#[prop(into, default = Signal::stored(None))]
	filter: Signal<Option<Vec<usize>>>,
	/// Requested layout.
	#[prop(into)]
	layout: Signal<LayoutMode>,
	/// Id of the selected node.
	#[prop(into)]
	selected: Signal<Option<String>>,
	/// Width of a side panel covering the right edge while a node is selected.
	#[prop(into, default = Signal::stored(0.0))]
	panel_width: Signal<f64>,
	/// Called with the clicked node, or `None` for a click on empty space.
	#[prop(into)]
	on_select: Callback<Option<GraphNode>>,
	/// Called once positions and camera settle after a layout or selection change.
	#[prop(optional, into)]
	on_stabilized: Option<Callback<()>>,
	/// Called on every pointer move with the hovered node.
	#[prop(optional, into)]
	on_hover: Option<Callback<Option<HoverInfo>>>,
	/// Engine tunables.
	#[prop(optional)]
	config: Option<EngineConfig>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let tooltip_ref = NodeRef::<leptos::html::Div>::new();
	let max_ratio = config.as_ref().map_or(2.0, |c| c.max_pixel_ratio);
	let state = Rc::new(RefCell::new(GraphState::new(config.unwrap_or_default())));
	let handles = StoredValue::new_local(None::<EngineHandles>);
	let (menu, set_menu) = signal(ContextMenu::default());
	let (hovered, set_hovered) = signal(None::<GraphNode>);
	let (dragging, set_dragging) = signal(false);

	let state_nodes = state.clone();
	Effect::new(move |_| {
		let data = nodes.get();
		let mut s = state_nodes.borrow_mut();
		// Applied before the data so the first layout is the requested one.
		s.set_layout_mode(layout.get_untracked());
		s.set_nodes(data, filter.get_untracked());
	});

	let state_filter = state.clone();
	Effect::new(move |_| {
		let f = filter.get();
		state_filter.borrow_mut().set_filter(f);
	});

	let state_layout = state.clone();
	Effect::new(move |_| {
		let mode = layout.get();
		state_layout.borrow_mut().set_layout_mode(mode);
	});

	let state_selected = state.clone();
	Effect::new(move |_| {
		let id = selected.get();
		state_selected.borrow_mut().select(id.as_deref());
	});

	let state_panel = state.clone();
	Effect::new(move |_| {
		let width = panel_width.get();
		state_panel.borrow_mut().set_panel_width(width);
	});

	let state_init = state.clone();
	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		match start_engine(&canvas, state_init.clone(), max_ratio, on_stabilized, set_menu) {
			Ok(started) => handles.set_value(Some(started)),
			Err(err) => error!("semantic graph disabled: {err}"),
		}
	});
	on_cleanup(move || handles.dispose());

	let state_pd = state.clone();
	let on_pointerdown = move |ev: PointerEvent| {
		let Some(canvas) = canvas_ref.get_untracked() else {
			return;
		};
		let (x, y) = local_point(&canvas, &ev);
		let button = PointerButton::from_code(ev.button());
		if button == PointerButton::Middle {
			ev.prevent_default();
		}
		let mut s = state_pd.borrow_mut();
		s.pointer_down(x, y, button);
		if s.interaction.is_dragging() {
			let _ = canvas.set_pointer_capture(ev.pointer_id());
			set_dragging.set(true);
		}
		sync_menu(&s, menu, set_menu);
	};

	let state_pm = state.clone();
	let on_pointermove = move |ev: PointerEvent| {
		let Some(canvas) = canvas_ref.get_untracked() else {
			return;
		};
		let (x, y) = local_point(&canvas, &ev);
		let (hover, node) = {
			let mut s = state_pm.borrow_mut();
			let hover = s.pointer_move(x, y);
			let node = hover.and_then(|h| h.node).and_then(|i| s.node(i).cloned());
			(hover, node)
		};
		let Some(hover) = hover else {
			return;
		};
		if let Some(tip) = tooltip_ref.get_untracked() {
			let style = web_sys::HtmlElement::style(&tip);
			let _ = style.set_property(
				"transform",
				&format!(
					"translate({}px, {}px)",
					x + TOOLTIP_OFFSET,
					y + TOOLTIP_OFFSET
				),
			);
			let _ = style.set_property("opacity", if node.is_some() { "1" } else { "0" });
		}
		if hover.changed {
			set_hovered.set(node.clone());
		}
		if let Some(cb) = on_hover {
			if hover.changed || node.is_some() {
				cb.run(node.map(|node| HoverInfo { node, x, y }));
			}
		}
	};

	let state_pu = state.clone();
	let on_pointerup = move |ev: PointerEvent| {
		let Some(canvas) = canvas_ref.get_untracked() else {
			return;
		};
		let (x, y) = local_point(&canvas, &ev);
		let selection = {
			let mut s = state_pu.borrow_mut();
			match s.pointer_up(x, y, PointerButton::from_code(ev.button())) {
				PointerOutcome::Select(idx) => Some(idx.and_then(|i| s.node(i).cloned())),
				PointerOutcome::ZoomToFit | PointerOutcome::None => None,
			}
		};
		set_dragging.set(false);
		if let Some(node) = selection {
			on_select.run(node);
		}
	};

	let state_pl = state.clone();
	let on_pointerleave = move |_: PointerEvent| {
		state_pl.borrow_mut().pointer_leave();
		set_dragging.set(false);
		set_hovered.set(None);
		if let Some(tip) = tooltip_ref.get_untracked() {
			let _ = web_sys::HtmlElement::style(&tip).set_property("opacity", "0");
		}
		if let Some(cb) = on_hover {
			cb.run(None);
		}
	};

	let state_cm = state.clone();
	let on_contextmenu = move |ev: MouseEvent| {
		ev.prevent_default();
		let Some(canvas) = canvas_ref.get_untracked() else {
			return;
		};
		let (x, y) = local_point(&canvas, &ev);
		let mut s = state_cm.borrow_mut();
		s.open_context_menu(x, y);
		set_dragging.set(false);
		sync_menu(&s, menu, set_menu);
	};

	let state_fit = state.clone();
	let on_fit_click = move |ev: MouseEvent| {
		ev.stop_propagation();
		let mut s = state_fit.borrow_mut();
		s.menu_zoom_to_fit();
		sync_menu(&s, menu, set_menu);
	};

	view! {
		<div class="semantic-graph" style="position: relative; width: 100%; height: 100%;">
			<canvas
				node_ref=canvas_ref
				class="semantic-graph-canvas"
				on:pointerdown=on_pointerdown
				on:pointermove=on_pointermove
				on:pointerup=on_pointerup
				on:pointerleave=on_pointerleave
				on:contextmenu=on_contextmenu
				style="display: block; width: 100%; height: 100%; touch-action: none;"
				style:cursor=move || {
					if dragging.get() {
						"grabbing"
					} else if hovered.with(Option::is_some) {
						"pointer"
					} else {
						"crosshair"
					}
				}
			/>
			<div
				class="graph-context-menu"
				style="position: absolute;"
				style:display=move || if menu.get().visible { "block" } else { "none" }
				style:left=move || format!("{}px", menu.get().x)
				style:top=move || format!("{}px", menu.get().y)
			>
				<button on:click=on_fit_click>"Zoom to Fit"</button>
			</div>
			<div
				node_ref=tooltip_ref
				class="graph-tooltip"
				style="position: absolute; top: 0; left: 0; pointer-events: none; opacity: 0; will-change: transform;"
			>
				{move || {
					hovered
						.get()
						.map(|node| {
							let color = super::colors::category_color(node.category.as_deref());
							view! {
								<div class="graph-tooltip-name">{node.name}</div>
								<div class="graph-tooltip-category" style:color=color>
									{node.category.unwrap_or_default()}
								</div>
							}
						})
				}}
			</div>
		</div>
	}
}

fn local_point(canvas: &HtmlCanvasElement, ev: &MouseEvent) -> (f64, f64) {
	let rect = canvas.get_bounding_client_rect();
	(
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	)
}

fn sync_menu(state: &GraphState, menu: ReadSignal<ContextMenu>, set_menu: WriteSignal<ContextMenu>) {
	let current = state.interaction.menu;
	if menu.get_untracked() != current {
		set_menu.set(current);
	}
}

fn start_engine(
	canvas: &HtmlCanvasElement,
	state: Rc<RefCell<GraphState>>,
	max_ratio: f64,
	on_stabilized: Option<Callback<()>>,
	set_menu: WriteSignal<ContextMenu>,
) -> Result<EngineHandles, EngineError> {
	let window: Window = web_sys::window().ok_or(EngineError::NoWindow)?;
	let ctx: CanvasRenderingContext2d = canvas
		.get_context("2d")
		.map_err(|err| EngineError::Context(describe(err)))?
		.ok_or_else(|| EngineError::Context("getContext(\"2d\") returned null".into()))?
		.dyn_into()
		.map_err(|_| EngineError::Context("not a CanvasRenderingContext2d".into()))?;

	let mut listeners = Vec::new();

	let state_wheel = state.clone();
	let canvas_wheel = canvas.clone();
	listeners.push(ListenerGuard::non_passive(canvas, "wheel", move |ev| {
		let Ok(ev) = ev.dyn_into::<WheelEvent>() else {
			return;
		};
		ev.prevent_default();
		let (x, y) = local_point(&canvas_wheel, &ev);
		state_wheel.borrow_mut().wheel(x, y, ev.delta_y());
	})?);

	let state_click = state.clone();
	listeners.push(ListenerGuard::new(&window, "click", move |_| {
		state_click.borrow_mut().close_context_menu();
		set_menu.set(ContextMenu::default());
	})?);

	let state_key = state.clone();
	listeners.push(ListenerGuard::new(&window, "keydown", move |ev| {
		let Ok(ev) = ev.dyn_into::<KeyboardEvent>() else {
			return;
		};
		if state_key.borrow_mut().key_down(&ev.key()) {
			set_menu.set(ContextMenu::default());
		}
	})?);

	let canvas_frame = canvas.clone();
	let window_frame = window.clone();
	let frame = FrameLoop::start(&window, move || {
		let rect = canvas_frame.get_bounding_client_rect();
		let (w, h) = (rect.width(), rect.height());
		let ratio = render::pixel_ratio(window_frame.device_pixel_ratio(), max_ratio);
		let (bw, bh) = ((w * ratio).floor() as u32, (h * ratio).floor() as u32);
		if canvas_frame.width() != bw || canvas_frame.height() != bh {
			canvas_frame.set_width(bw);
			canvas_frame.set_height(bh);
		}

		let events = {
			let mut s = state.borrow_mut();
			s.set_viewport(Viewport::new(w, h));
			let events = s.tick();
			let plan = render::plan_frame(&s);
			render::paint(&plan, &ctx, s.viewport(), ratio);
			events
		};
		if events.stabilized {
			if let Some(cb) = on_stabilized {
				cb.run(());
			}
		}
	})?;

	Ok(EngineHandles {
		_frame: frame,
		_listeners: listeners,
	})
}
