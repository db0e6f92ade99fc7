use std::collections::{BTreeMap, HashMap};

use log::{debug, warn};

use super::config::{EngineConfig, GroupKey, LodBuckets};
use super::types::{ActiveSet, GraphNode, LayoutMode};

/// One group of a grouping layout and the grid cell it occupies.
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutGroup {
	pub key: String,
	pub members: Vec<usize>,
	/// Top-left corner of the group's cell.
	pub origin: (f64, f64),
	/// Edge of the square cell.
	pub cell: f64,
	/// Columns of the inner member grid.
	pub columns: usize,
}

/// Grouping key of `node` for a grouping `mode`.
pub fn grouping_key(mode: LayoutMode, node: &GraphNode, buckets: &LodBuckets) -> GroupKey {
	match mode {
		LayoutMode::Lod => buckets.normalize(node.lod.as_deref()),
		LayoutMode::Category => GroupKey::Bucket(node.category.clone().unwrap_or_default()),
		LayoutMode::Provider | LayoutMode::Similarity => GroupKey::Bucket(
			node.provider
				.clone()
				.filter(|p| !p.is_empty())
				.unwrap_or_else(|| "Unknown".to_string()),
		),
	}
}

/// Groups the active nodes by key, sorted by key, and assigns each group a
/// cell of a square grid spanning `config.group_extent`.
pub fn plan_groups(
	nodes: &[GraphNode],
	active: &ActiveSet,
	mode: LayoutMode,
	config: &EngineConfig,
) -> Vec<LayoutGroup> {
	let mut groups: BTreeMap<String, Vec<usize>> = BTreeMap::new();
	let mut unmapped = 0usize;
	for &i in active.indices() {
		let Some(node) = nodes.get(i) else {
			continue;
		};
		let key = grouping_key(mode, node, &config.lod_buckets);
		if matches!(key, GroupKey::Unmapped(_)) {
			unmapped += 1;
		}
		groups.entry(key.group_key().to_string()).or_default().push(i);
	}
	if unmapped > 0 {
		warn!("{unmapped} node(s) carry a level-of-detail label outside the bucket table");
	}

	let cols = (groups.len() as f64).sqrt().ceil().max(1.0) as usize;
	let cell = config.group_extent / cols as f64;
	groups
		.into_iter()
		.enumerate()
		.map(|(gi, (key, members))| {
			let columns = (members.len() as f64).sqrt().ceil().max(1.0) as usize;
			LayoutGroup {
				key,
				origin: ((gi % cols) as f64 * cell, (gi / cols) as f64 * cell),
				cell,
				columns,
				members,
			}
		})
		.collect()
}

/// Target buffer of length `2 × nodes.len()` for `mode`.
pub fn compute_layout(
	nodes: &[GraphNode],
	active: &ActiveSet,
	mode: LayoutMode,
	config: &EngineConfig,
) -> Vec<f64> {
	let mut targets = vec![0.0; nodes.len() * 2];
	if mode == LayoutMode::Similarity {
		for (i, node) in nodes.iter().enumerate() {
			let (x, y) = node.home();
			targets[i * 2] = x;
			targets[i * 2 + 1] = y;
		}
		return targets;
	}

	for group in plan_groups(nodes, active, mode, config) {
		let spacing = group.cell * config.group_fill / group.columns as f64;
		for (m, &idx) in group.members.iter().enumerate() {
			targets[idx * 2] = group.origin.0 + (m % group.columns) as f64 * spacing;
			targets[idx * 2 + 1] = group.origin.1 + (m / group.columns) as f64 * spacing;
		}
	}
	targets
}

/// Memoizes layouts per mode and active-set fingerprint.
#[derive(Debug, Default)]
pub struct LayoutEngine {
	cache: HashMap<String, Vec<f64>>,
}

impl LayoutEngine {
	pub fn cache_key(mode: LayoutMode, active: &ActiveSet) -> String {
		match mode {
			LayoutMode::Similarity => mode.as_str().to_string(),
			_ => format!("{}:{}", mode, active.fingerprint()),
		}
	}

	/// Cached or freshly computed targets. Entries whose length no longer
	/// matches the node list are evicted and recomputed.
	pub fn targets(
		&mut self,
		nodes: &[GraphNode],
		active: &ActiveSet,
		mode: LayoutMode,
		config: &EngineConfig,
	) -> &[f64] {
		let key = Self::cache_key(mode, active);
		let expected = nodes.len() * 2;
		let stale = self.cache.get(&key).is_some_and(|c| c.len() != expected);
		if stale {
			debug!("evicting stale layout {key}");
			self.cache.remove(&key);
		}
		if self.cache.contains_key(&key) {
			debug!("layout cache hit {key}");
		} else {
			debug!("computing {mode} layout for {} active node(s)", active.len());
			let targets = compute_layout(nodes, active, mode, config);
			self.cache.insert(key.clone(), targets);
		}
		self.cache.get(&key).map(Vec::as_slice).unwrap_or_default()
	}

	pub fn invalidate(&mut self) {
		self.cache.clear();
	}

	pub fn len(&self) -> usize {
		self.cache.len()
	}

	pub fn is_empty(&self) -> bool {
		self.cache.is_empty()
	}

	#[cfg(test)]
	fn insert_raw(&mut self, key: String, value: Vec<f64>) {
		self.cache.insert(key, value);
	}
}
