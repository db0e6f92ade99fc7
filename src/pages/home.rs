use std::collections::HashSet;
use std::f64::consts::TAU;

use leptos::ev;
use leptos::prelude::*;
use log::{debug, info};
use wasm_bindgen::JsCast;

use crate::components::semantic_graph::{GraphNode, LayoutMode, SemanticGraphCanvas, ops};

const CATEGORIES: &[&str] = &[
	"Furniture",
	"Lighting",
	"Vehicles",
	"Plants",
	"Architecture",
	"Characters",
	"Props",
	"Food",
];
const LODS: &[&str] = &["low", "medium", "high", "low-medium", "medium-high", "complex", ""];
const PROVIDERS: &[&str] = &["Sketchfab", "Poly Haven", "Objaverse"];

/// Width of the detail panel covering the right edge of the canvas.
const PANEL_WIDTH: f64 = 440.0;

/// Generate sample nodes clustered by category around a ring.
fn generate_sample_nodes(n: usize) -> Vec<GraphNode> {
	(0..n)
		.map(|i| {
			let group = i % CATEGORIES.len();
			let category = CATEGORIES[group];
			let angle = group as f64 / CATEGORIES.len() as f64 * TAU;
			let spread = rand_simple(i * 3) * 0.35;
			let theta = rand_simple(i * 3 + 1) * TAU;
			let lod = LODS[i % LODS.len()];

			// Neighbours mostly within the same category.
			let neighbors = (1..=3)
				.map(|k| {
					let hops = (rand_simple(i * 7 + k) * 20.0) as usize + 1;
					(i + hops * CATEGORIES.len()) % n
				})
				.filter(|&j| j != i)
				.map(|j| j as i64)
				.collect();

			GraphNode {
				id: format!("asset-{i}"),
				name: format!("{category} #{i}"),
				category: Some(category.to_string()),
				lod: (!lod.is_empty()).then(|| lod.to_string()),
				provider: Some(PROVIDERS[(i / 3) % PROVIDERS.len()].to_string()),
				x: Some(angle.cos() * 0.7 + spread * theta.cos()),
				y: Some(angle.sin() * 0.7 + spread * theta.sin()),
				neighbors,
			}
		})
		.collect()
}

/// Simple pseudo-random number generator (deterministic for consistency).
fn rand_simple(seed: usize) -> f64 {
	let x = ((seed + 1) * 9301 + 49297) % 233280;
	(x as f64) / 233280.0
}

/// Page-level keyboard shortcuts acting on the selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Shortcut {
	Deselect,
	Delete,
}

impl Shortcut {
	/// Delete is ignored while typing so it keeps editing the text field.
	fn from_key(key: &str, typing: bool) -> Option<Self> {
		match key {
			"Escape" => Some(Shortcut::Deselect),
			"Delete" if !typing => Some(Shortcut::Delete),
			_ => None,
		}
	}
}

fn is_text_entry(tag_name: &str) -> bool {
	matches!(tag_name.to_ascii_uppercase().as_str(), "INPUT" | "TEXTAREA" | "SELECT")
}

/// Default Home Page
#[component]
pub fn Home() -> impl IntoView {
	let (nodes, set_nodes) = signal(ops::dedupe_nodes(generate_sample_nodes(2_000)));
	let (layout, set_layout) = signal(LayoutMode::default());
	let (selected, set_selected) = signal(None::<String>);
	let (query, set_query) = signal(String::new());

	// Stand-in for a search backend returning matching ids.
	let filter = Signal::derive(move || {
		let q = query.get().trim().to_lowercase();
		if q.is_empty() {
			return None;
		}
		nodes.with(|all| {
			let ids: HashSet<String> = all
				.iter()
				.filter(|n| n.name.to_lowercase().contains(&q))
				.map(|n| n.id.clone())
				.collect();
			Some(ops::filter_by_ids(all, &ids))
		})
	});

	let selected_node = Signal::derive(move || {
		let id = selected.get()?;
		nodes.with(|all| all.iter().find(|n| n.id == id).cloned())
	});
	let panel_width =
		Signal::derive(move || if selected.with(Option::is_some) { PANEL_WIDTH } else { 0.0 });

	// Escape deselects and Delete removes the selected node; the canvas keeps
	// every other node in place.
	let key_handle = window_event_listener(ev::keydown, move |ev| {
		let typing = ev
			.target()
			.and_then(|t| t.dyn_into::<web_sys::Element>().ok())
			.is_some_and(|el| is_text_entry(&el.tag_name()));
		let Some(shortcut) = Shortcut::from_key(&ev.key(), typing) else {
			return;
		};
		let Some(id) = selected.get_untracked() else {
			return;
		};
		if shortcut == Shortcut::Delete {
			set_nodes.update(|all| *all = ops::remove_node(all, &id));
			info!("Removed node {id}");
		}
		set_selected.set(None);
	});
	on_cleanup(move || key_handle.remove());

	view! {
		<ErrorBoundary fallback=|errors| {
			view! {
				<h1>"Uh oh! Something went wrong!"</h1>

				<p>"Errors: "</p>
				<ul>
					{move || {
						errors
							.get()
							.into_iter()
							.map(|(_, e)| view! { <li>{e.to_string()}</li> })
							.collect_view()
					}}
				</ul>
			}
		}>

			<div class="fullscreen-graph">
				<SemanticGraphCanvas
					nodes=nodes
					filter=filter
					layout=layout
					selected=selected
					panel_width=panel_width
					on_select={move |node: Option<GraphNode>| set_selected.set(node.map(|n| n.id))}
					on_stabilized=move |()| debug!("Graph stabilized")
				/>
				<div class="graph-overlay">
					<h1>"Semantic Graph"</h1>
					<p class="subtitle">
						"Click a node to inspect it. Scroll to zoom. Drag to pan. Right-click or middle-click to fit."
					</p>
					<div class="layout-tabs">
						{LayoutMode::ALL
							.into_iter()
							.map(|mode| {
								view! {
									<button
										class:active=move || layout.get() == mode
										on:click=move |_| set_layout.set(mode)
									>
										{mode.label()}
									</button>
								}
							})
							.collect_view()}
					</div>
					<input
						type="search"
						placeholder="Filter by name"
						prop:value=query
						on:input=move |ev| set_query.set(event_target_value(&ev))
					/>
				</div>
				{move || {
					selected_node
						.get()
						.map(|node| {
							view! {
								<aside
									class="detail-panel"
									style=format!("width: {PANEL_WIDTH}px;")
								>
									<h2>{node.name}</h2>
									<p>{node.category.unwrap_or_default()}</p>
									<p>{node.provider.unwrap_or_default()}</p>
									<p class="hint">"Press Delete to remove this node, Escape to close."</p>
									<button on:click=move |_| set_selected.set(None)>"Close"</button>
								</aside>
							}
						})
				}}
			</div>
		</ErrorBoundary>
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn escape_deselects_even_while_typing() {
		assert_eq!(Shortcut::from_key("Escape", false), Some(Shortcut::Deselect));
		assert_eq!(Shortcut::from_key("Escape", true), Some(Shortcut::Deselect));
	}

	#[test]
	fn delete_is_ignored_in_text_fields() {
		assert_eq!(Shortcut::from_key("Delete", false), Some(Shortcut::Delete));
		assert_eq!(Shortcut::from_key("Delete", true), None);
		assert_eq!(Shortcut::from_key("Backspace", false), None);
		assert!(is_text_entry("INPUT"));
		assert!(is_text_entry("textarea"));
		assert!(!is_text_entry("CANVAS"));
	}

	#[test]
	fn sample_nodes_are_unique_and_reference_valid_indices() {
		let nodes = generate_sample_nodes(200);
		assert_eq!(ops::dedupe_nodes(nodes.clone()).len(), 200);
		for (i, n) in nodes.iter().enumerate() {
			assert!(n.neighbors.iter().all(|&j| (0..200).contains(&j) && j != i as i64));
		}
	}
}
