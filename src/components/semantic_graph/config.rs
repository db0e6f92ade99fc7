use serde::Deserialize;

/// Tunables for the engine. `Default` carries the production values; hosts
/// may deserialize partial overrides.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
	/// Fraction of the remaining distance covered per frame.
	pub ease: f64,
	/// Coordinates closer than this to their target snap onto it.
	pub snap_epsilon: f64,
	/// Largest per-coordinate delta still considered converged.
	pub settle_threshold: f64,
	/// Lower zoom bound.
	pub min_scale: f64,
	/// Upper zoom bound.
	pub max_scale: f64,
	/// Breathing room left around a zoom-to-fit.
	pub fit_margin: f64,
	/// Floor for a zero-width or zero-height focus span.
	pub min_extent: f64,
	/// Scale factor base applied per wheel delta unit.
	pub wheel_zoom_base: f64,
	/// Spatial grid cell edge, in screen pixels.
	pub grid_cell_px: f64,
	/// Spatial grid cell edge floor, in world units.
	pub min_cell_size: f64,
	/// Hit-test radius, in screen pixels.
	pub hit_radius_px: f64,
	/// Pointer travel below which a press/release pair is a click.
	pub click_slop_px: f64,
	/// Neighbors considered per node for links and highlighting.
	pub neighbor_limit: usize,
	/// Viewport padding used for culling, in screen pixels.
	pub cull_padding_px: f64,
	/// Device pixel ratio cap.
	pub max_pixel_ratio: f64,
	/// Edge count above which every 2nd edge is drawn.
	pub link_thin_threshold: usize,
	/// Edge count above which every 4th edge is drawn.
	pub link_sparse_threshold: usize,
	/// World extent covered by the grouping layouts.
	pub group_extent: f64,
	/// Share of a group cell occupied by its members.
	pub group_fill: f64,
	/// Level-of-detail normalization table.
	pub lod_buckets: LodBuckets,
}

impl Default for EngineConfig {
	fn default() -> Self {
		Self {
			ease: 0.2,
			snap_epsilon: 0.001,
			settle_threshold: 0.0005,
			min_scale: 10.0,
			max_scale: 500_000.0,
			fit_margin: 0.75,
			min_extent: 0.01,
			wheel_zoom_base: 1.002,
			grid_cell_px: 60.0,
			min_cell_size: 0.01,
			hit_radius_px: 15.0,
			click_slop_px: 5.0,
			neighbor_limit: 10,
			cull_padding_px: 50.0,
			max_pixel_ratio: 2.0,
			link_thin_threshold: 10_000,
			link_sparse_threshold: 25_000,
			group_extent: 4.0,
			group_fill: 0.8,
			lod_buckets: LodBuckets::default(),
		}
	}
}

/// How a rule compares its terms with the lowercased label.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LodMatch {
	/// The label equals the single term.
	Exact,
	/// The label contains every term.
	ContainsAll,
}

/// Maps matching labels onto a bucket.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct LodRule {
	/// Comparison applied to the terms.
	pub matcher: LodMatch,
	/// Lowercase terms.
	pub terms: Vec<String>,
	/// Bucket assigned on a match.
	pub bucket: String,
}

impl LodRule {
	fn new(matcher: LodMatch, terms: &[&str], bucket: &str) -> Self {
		Self {
			matcher,
			terms: terms.iter().map(|t| t.to_string()).collect(),
			bucket: bucket.to_string(),
		}
	}

	fn matches(&self, lower: &str) -> bool {
		match self.matcher {
			LodMatch::Exact => self.terms.iter().any(|t| t == lower),
			LodMatch::ContainsAll => self.terms.iter().all(|t| lower.contains(t.as_str())),
		}
	}
}

/// Grouping key of a node. Only level-of-detail labels can be missing or
/// unmapped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GroupKey {
	/// No label on the node.
	Missing,
	/// A rule (or a numeric label) produced this bucket.
	Bucket(String),
	/// Nothing matched; carries the raw label.
	Unmapped(String),
}

impl GroupKey {
	/// Grouping key used by the layout.
	pub fn group_key(&self) -> &str {
		match self {
			GroupKey::Missing => "",
			GroupKey::Bucket(b) => b,
			GroupKey::Unmapped(raw) => raw,
		}
	}
}

/// Ordered rule table. The first matching rule wins.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct LodBuckets {
	/// Rules in match order.
	pub rules: Vec<LodRule>,
}

/// Default buckets: low 100, low-medium 200, medium 250, medium-high 300,
/// high and complex 400. A plain "medium" and a numeric "200" label land in
/// different buckets.
impl Default for LodBuckets {
	fn default() -> Self {
		use LodMatch::*;
		Self {
			rules: vec![
				LodRule::new(ContainsAll, &["low", "medium"], "200"),
				LodRule::new(ContainsAll, &["medium", "high"], "300"),
				LodRule::new(Exact, &["low"], "100"),
				LodRule::new(Exact, &["medium"], "250"),
				LodRule::new(ContainsAll, &["high"], "400"),
				LodRule::new(ContainsAll, &["complex"], "400"),
			],
		}
	}
}

impl LodBuckets {
	/// Maps a raw label onto its grouping key.
	pub fn normalize(&self, label: Option<&str>) -> GroupKey {
		let Some(label) = label.map(str::trim).filter(|l| !l.is_empty()) else {
			return GroupKey::Missing;
		};
		let lower = label.to_lowercase();
		if let Some(rule) = self.rules.iter().find(|r| r.matches(&lower)) {
			return GroupKey::Bucket(rule.bucket.clone());
		}
		if label.chars().all(|c| c.is_ascii_digit()) {
			return GroupKey::Bucket(label.to_string());
		}
		GroupKey::Unmapped(label.to_string())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn default_table_buckets() {
		let b = LodBuckets::default();
		let key = |s| b.normalize(Some(s));
		assert_eq!(key("Low"), GroupKey::Bucket("100".into()));
		assert_eq!(key("medium"), GroupKey::Bucket("250".into()));
		assert_eq!(key("High"), GroupKey::Bucket("400".into()));
		assert_eq!(key("very complex"), GroupKey::Bucket("400".into()));
		assert_eq!(key("low-medium"), GroupKey::Bucket("200".into()));
		assert_eq!(key("Medium+High"), GroupKey::Bucket("300".into()));
		assert_eq!(key("200"), GroupKey::Bucket("200".into()));
	}

	#[test]
	fn unmapped_and_missing_are_flagged() {
		let b = LodBuckets::default();
		assert_eq!(b.normalize(None), GroupKey::Missing);
		assert_eq!(b.normalize(Some("  ")), GroupKey::Missing);
		let key = b.normalize(Some("lowish"));
		assert_eq!(key, GroupKey::Unmapped("lowish".into()));
		assert_eq!(key.group_key(), "lowish");
	}

	#[test]
	fn partial_config_overrides() {
		let cfg: EngineConfig = serde_json::from_str(
			r#"{"fit_margin":0.9,"lod_buckets":[{"matcher":"exact","terms":["draft"],"bucket":"1"}]}"#,
		)
		.unwrap();
		assert_eq!(cfg.fit_margin, 0.9);
		assert_eq!(cfg.ease, 0.2);
		assert_eq!(
			cfg.lod_buckets.normalize(Some("Draft")),
			GroupKey::Bucket("1".into())
		);
		assert_eq!(
			cfg.lod_buckets.normalize(Some("low")),
			GroupKey::Unmapped("low".into())
		);
	}
}
