use std::fmt;

use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};

/// One node of the semantic graph as supplied by the host.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
	/// Unique identity, stable across node list replacements.
	pub id: String,
	/// Display name shown in the hover tooltip.
	#[serde(default)]
	pub name: String,
	/// Category used for colouring and the category layout.
	#[serde(default, alias = "final_category")]
	pub category: Option<String>,
	/// Level-of-detail label, normalized into buckets by the lod layout.
	#[serde(default, alias = "lod_label")]
	pub lod: Option<String>,
	/// Provider used by the provider layout.
	#[serde(default)]
	pub provider: Option<String>,
	/// Precomputed similarity-space coordinates.
	#[serde(default)]
	pub x: Option<f64>,
	/// Precomputed similarity-space coordinates.
	#[serde(default)]
	pub y: Option<f64>,
	/// Indices into the current node list. Never trusted without bounds checks.
	#[serde(default, deserialize_with = "lenient_indices")]
	pub neighbors: Vec<i64>,
}

impl GraphNode {
	/// Creates a node with only an id and name set.
	pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			name: name.into(),
			..Default::default()
		}
	}

	/// Precomputed position, defaulting to the origin.
	pub fn home(&self) -> (f64, f64) {
		(self.x.unwrap_or(0.0), self.y.unwrap_or(0.0))
	}
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawIndex {
	Index(i64),
	Float(f64),
	Other(IgnoredAny),
}

// Non-integer entries are dropped one by one rather than failing the node.
fn lenient_indices<'de, D>(deserializer: D) -> Result<Vec<i64>, D::Error>
where
	D: Deserializer<'de>,
{
	let raw = Option::<Vec<RawIndex>>::deserialize(deserializer)?.unwrap_or_default();
	Ok(raw
		.into_iter()
		.filter_map(|entry| match entry {
			RawIndex::Index(idx) => Some(idx),
			// Integral floats such as `1.0` count as indices.
			RawIndex::Float(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Some(f as i64),
			RawIndex::Float(_) => None,
			RawIndex::Other(_) => None,
		})
		.collect())
}

/// Strategy used to compute target positions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutMode {
	/// Precomputed embedding coordinates, with links.
	#[default]
	Similarity,
	/// Grid of groups keyed by category.
	Category,
	/// Grid of groups keyed by normalized level of detail.
	Lod,
	/// Grid of groups keyed by provider.
	Provider,
}

impl LayoutMode {
	/// Every mode, in toolbar order.
	pub const ALL: [LayoutMode; 4] = [
		LayoutMode::Similarity,
		LayoutMode::Category,
		LayoutMode::Lod,
		LayoutMode::Provider,
	];

	/// Stable identifier, also used in layout cache keys.
	pub fn as_str(self) -> &'static str {
		match self {
			LayoutMode::Similarity => "similarity",
			LayoutMode::Category => "category",
			LayoutMode::Lod => "lod",
			LayoutMode::Provider => "provider",
		}
	}

	/// Human readable tab label.
	pub fn label(self) -> &'static str {
		match self {
			LayoutMode::Similarity => "Similarity",
			LayoutMode::Category => "Category",
			LayoutMode::Lod => "Detail",
			LayoutMode::Provider => "Provider",
		}
	}

	/// Only the similarity layout is connectivity driven.
	pub fn draws_links(self) -> bool {
		self == LayoutMode::Similarity
	}
}

impl fmt::Display for LayoutMode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Node indices eligible for layout, rendering and interaction.
///
/// Indices are kept sorted and unique so the fingerprint is independent of the
/// order the host supplied them in.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ActiveSet {
	indices: Vec<usize>,
	members: Vec<bool>,
	fingerprint: String,
}

impl ActiveSet {
	/// Every node of a list of `total` nodes.
	pub fn all(total: usize) -> Self {
		Self::from_sorted((0..total).collect(), total)
	}

	/// Applies an optional filter, dropping entries outside `0..total`.
	pub fn from_filter(filter: Option<&[usize]>, total: usize) -> Self {
		let Some(filter) = filter else {
			return Self::all(total);
		};
		let mut indices: Vec<usize> = filter.iter().copied().filter(|&i| i < total).collect();
		indices.sort_unstable();
		indices.dedup();
		Self::from_sorted(indices, total)
	}

	fn from_sorted(indices: Vec<usize>, total: usize) -> Self {
		let mut members = vec![false; total];
		for &i in &indices {
			members[i] = true;
		}
		let fingerprint = fingerprint(&indices);
		Self {
			indices,
			members,
			fingerprint,
		}
	}

	pub fn indices(&self) -> &[usize] {
		&self.indices
	}

	pub fn contains(&self, idx: usize) -> bool {
		self.members.get(idx).copied().unwrap_or(false)
	}

	pub fn len(&self) -> usize {
		self.indices.len()
	}

	pub fn is_empty(&self) -> bool {
		self.indices.is_empty()
	}

	/// Length of the node list this set was validated against.
	pub fn total(&self) -> usize {
		self.members.len()
	}

	pub fn fingerprint(&self) -> &str {
		&self.fingerprint
	}
}

// FNV-1a flavoured mix over the sorted indices.
fn fingerprint(sorted: &[usize]) -> String {
	let mut hash: u32 = 2_166_136_261;
	for &idx in sorted {
		hash ^= (idx as u32).wrapping_add(1);
		hash = hash.wrapping_mul(16_777_619);
	}
	format!("{}-{}", sorted.len(), hash)
}

/// Payload of the hover side channel.
#[derive(Clone, Debug, PartialEq)]
pub struct HoverInfo {
	/// The hovered node.
	pub node: GraphNode,
	/// Pointer position relative to the canvas, in CSS pixels.
	pub x: f64,
	/// Pointer position relative to the canvas, in CSS pixels.
	pub y: f64,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn deserializes_aliased_field_names() {
		let node: GraphNode = serde_json::from_str(
			r#"{"id":"n1","name":"Chair","final_category":"Furniture","lod_label":"low","x":1.5,"y":-2}"#,
		)
		.unwrap();
		assert_eq!(node.category.as_deref(), Some("Furniture"));
		assert_eq!(node.lod.as_deref(), Some("low"));
		assert_eq!(node.home(), (1.5, -2.0));
		assert!(node.neighbors.is_empty());
	}

	#[test]
	fn drops_non_integer_neighbors_per_entry() {
		let node: GraphNode =
			serde_json::from_str(r#"{"id":"n","neighbors":[1,"two",2.5,null,-3,4]}"#).unwrap();
		assert_eq!(node.neighbors, vec![1, -3, 4]);
	}

	#[test]
	fn integral_float_neighbors_are_kept() {
		let node: GraphNode =
			serde_json::from_str(r#"{"id":"n","neighbors":[1.0,2.5,-0.0,3e0,1e300]}"#).unwrap();
		assert_eq!(node.neighbors, vec![1, 0, 3]);
	}

	#[test]
	fn null_neighbors_are_empty() {
		let node: GraphNode = serde_json::from_str(r#"{"id":"n","neighbors":null}"#).unwrap();
		assert!(node.neighbors.is_empty());
	}

	#[test]
	fn layout_mode_round_trips_lowercase() {
		let mode: LayoutMode = serde_json::from_str(r#""provider""#).unwrap();
		assert_eq!(mode, LayoutMode::Provider);
		assert_eq!(mode.to_string(), "provider");
		assert!(LayoutMode::Similarity.draws_links());
		assert!(!LayoutMode::Lod.draws_links());
	}

	#[test]
	fn active_set_filter_is_validated_and_order_independent() {
		let a = ActiveSet::from_filter(Some(&[4, 1, 9, 1, 2]), 5);
		let b = ActiveSet::from_filter(Some(&[2, 4, 1]), 5);
		assert_eq!(a.indices(), &[1, 2, 4]);
		assert_eq!(a.fingerprint(), b.fingerprint());
		assert!(a.contains(4));
		assert!(!a.contains(9));
		assert!(!a.contains(0));
	}

	#[test]
	fn fingerprint_distinguishes_sets() {
		let all = ActiveSet::all(3);
		let some = ActiveSet::from_filter(Some(&[0, 1]), 3);
		assert_ne!(all.fingerprint(), some.fingerprint());
		assert_eq!(ActiveSet::from_filter(None, 3), all);
	}
}
