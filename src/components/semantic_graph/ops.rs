//! Whole-list operations a host performs between engine updates.

use std::collections::{HashMap, HashSet};

use super::links::is_valid_index;
use super::types::GraphNode;

/// Keeps one node per id: the first position, the last value.
pub fn dedupe_nodes(nodes: Vec<GraphNode>) -> Vec<GraphNode> {
	let mut slot_by_id: HashMap<String, usize> = HashMap::new();
	let mut out: Vec<GraphNode> = Vec::with_capacity(nodes.len());
	for node in nodes {
		match slot_by_id.get(&node.id) {
			Some(&slot) => out[slot] = node,
			None => {
				slot_by_id.insert(node.id.clone(), out.len());
				out.push(node);
			}
		}
	}
	out
}

/// Removes the node `id` and rewrites every neighbor list against the new
/// indices, resolving entries by identity. Dangling, self-referencing and
/// duplicate entries are dropped.
pub fn remove_node(prev: &[GraphNode], id: &str) -> Vec<GraphNode> {
	let kept: Vec<&GraphNode> = prev.iter().filter(|n| n.id != id).collect();
	let new_index: HashMap<&str, usize> = kept
		.iter()
		.enumerate()
		.map(|(i, n)| (n.id.as_str(), i))
		.collect();

	kept.iter()
		.map(|node| {
			let mut neighbors: Vec<i64> = Vec::new();
			for &old in &node.neighbors {
				if !is_valid_index(old, prev.len()) {
					continue;
				}
				let target = &prev[old as usize];
				if target.id == node.id {
					continue;
				}
				let Some(&idx) = new_index.get(target.id.as_str()) else {
					continue;
				};
				let idx = idx as i64;
				if !neighbors.contains(&idx) {
					neighbors.push(idx);
				}
			}
			GraphNode {
				neighbors,
				..(*node).clone()
			}
		})
		.collect()
}

/// Active-index filter selecting the nodes whose id is in `ids`.
pub fn filter_by_ids(nodes: &[GraphNode], ids: &HashSet<String>) -> Vec<usize> {
	nodes.iter()
		.enumerate()
		.filter(|(_, n)| ids.contains(&n.id))
		.map(|(i, _)| i)
		.collect()
}
