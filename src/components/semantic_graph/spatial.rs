use std::collections::HashMap;

/// Uniform grid over node positions for pointer hit-testing.
#[derive(Clone, Debug, Default)]
pub struct SpatialGrid {
	cell_size: f64,
	cells: HashMap<(i64, i64), Vec<usize>>,
	/// Camera scale the grid was sized for.
	built_scale: f64,
}

impl SpatialGrid {
	/// Rebuilds over `indices`, with cells of `cell_px` screen pixels at `scale`.
	pub fn rebuild(
		&mut self,
		positions: &[f64],
		indices: &[usize],
		scale: f64,
		cell_px: f64,
		min_cell: f64,
	) {
		self.cells.clear();
		self.cell_size = (cell_px / scale).max(min_cell);
		self.built_scale = scale;
		for &i in indices {
			let (Some(&x), Some(&y)) = (positions.get(i * 2), positions.get(i * 2 + 1)) else {
				continue;
			};
			self.cells.entry(self.cell_of(x, y)).or_default().push(i);
		}
	}

	pub fn clear(&mut self) {
		self.cells.clear();
	}

	fn cell_of(&self, x: f64, y: f64) -> (i64, i64) {
		((x / self.cell_size).floor() as i64, (y / self.cell_size).floor() as i64)
	}

	pub fn is_empty(&self) -> bool {
		self.cells.is_empty()
	}

	pub fn cell_size(&self) -> f64 {
		self.cell_size
	}

	pub fn built_scale(&self) -> f64 {
		self.built_scale
	}

	/// Nearest eligible node strictly within `radius` of `(wx, wy)`, scanning
	/// the 5×5 block of cells around the point. Ties keep the first found.
	pub fn nearest(
		&self,
		positions: &[f64],
		wx: f64,
		wy: f64,
		radius: f64,
		eligible: impl Fn(usize) -> bool,
	) -> Option<usize> {
		if self.cells.is_empty() {
			return None;
		}
		let (gx, gy) = self.cell_of(wx, wy);
		let mut best = None;
		let mut best_dist = radius;
		for ox in -2..=2 {
			for oy in -2..=2 {
				let Some(cell) = self.cells.get(&(gx + ox, gy + oy)) else {
					continue;
				};
				for &idx in cell {
					if !eligible(idx) {
						continue;
					}
					let dist = (positions[idx * 2] - wx).hypot(positions[idx * 2 + 1] - wy);
					if dist < best_dist {
						best_dist = dist;
						best = Some(idx);
					}
				}
			}
		}
		best
	}
}
