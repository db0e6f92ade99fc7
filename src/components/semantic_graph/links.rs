use super::types::{ActiveSet, GraphNode, LayoutMode};

pub fn is_valid_index(idx: i64, total: usize) -> bool {
	idx >= 0 && (idx as u64) < total as u64
}

/// The first `limit` neighbor entries of `node` that are valid indices into a
/// list of `total` nodes.
pub fn safe_neighbors(node: &GraphNode, total: usize, limit: usize) -> impl Iterator<Item = usize> + '_ {
	node.neighbors
		.iter()
		.copied()
		.filter(move |&idx| is_valid_index(idx, total))
		.map(|idx| idx as usize)
		.take(limit)
}

/// Selected node followed by its capped neighbor list, without duplicates.
pub fn highlight_set(nodes: &[GraphNode], selected: usize, limit: usize) -> Vec<usize> {
	let Some(node) = nodes.get(selected) else {
		return Vec::new();
	};
	let mut set = vec![selected];
	for n in safe_neighbors(node, nodes.len(), limit) {
		if !set.contains(&n) {
			set.push(n);
		}
	}
	set
}

/// Interleaved `(source, target)` pairs between active nodes. Empty for the
/// grouping layouts.
pub fn build_links(nodes: &[GraphNode], active: &ActiveSet, mode: LayoutMode, limit: usize) -> Vec<u32> {
	if !mode.draws_links() {
		return Vec::new();
	}
	let mut links = Vec::new();
	for &i in active.indices() {
		let Some(node) = nodes.get(i) else {
			continue;
		};
		for target in safe_neighbors(node, nodes.len(), limit) {
			if active.contains(target) {
				links.push(i as u32);
				links.push(target as u32);
			}
		}
	}
	links
}
