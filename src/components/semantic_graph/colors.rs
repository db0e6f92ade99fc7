const COLORS: &[&str] = &[
	"#E63946", "#F4A261", "#2A9D8F", "#264653", "#A8DADC", "#D62828", "#F77F00", "#FCBF49",
	"#003049", "#FF9F1C", "#2EC4B6", "#FFBF69", "#FF99C8", "#9B5DE5", "#F15BB5", "#FEE440",
	"#00BBF9", "#00F5D4", "#4361EE", "#3A0CA3", "#7209B7", "#560BAD", "#480CA8", "#B5179E",
	"#F72585", "#4CC9F0", "#8338EC", "#FF006E", "#FB5607", "#3D5A40",
];

pub const BACKGROUND: &str = "#F8F7F4";
pub const SECONDARY: &str = "#E9E7E2";
pub const RING: &str = "#222222";

/// Deterministic colour for a category; uncategorized nodes are grey.
pub fn category_color(category: Option<&str>) -> &'static str {
	let Some(category) = category.filter(|c| !c.is_empty()) else {
		return SECONDARY;
	};
	let mut hash: i32 = 0;
	for unit in category.encode_utf16() {
		hash = (unit as i32).wrapping_add(hash.wrapping_shl(5).wrapping_sub(hash));
	}
	COLORS[hash.unsigned_abs() as usize % COLORS.len()]
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn same_category_same_color() {
		assert_eq!(category_color(Some("Chair")), category_color(Some("Chair")));
		assert!(COLORS.contains(&category_color(Some("Lamp"))));
	}

	#[test]
	fn missing_category_is_secondary() {
		assert_eq!(category_color(None), SECONDARY);
		assert_eq!(category_color(Some("")), SECONDARY);
	}

	#[test]
	fn hash_matches_known_value() {
		// "A" hashes to 65.
		assert_eq!(category_color(Some("A")), COLORS[65 % COLORS.len()]);
	}
}
