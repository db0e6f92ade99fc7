use super::animator::Simulation;
use super::config::EngineConfig;

/// World coordinates at the screen center and the world-to-screen scale.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraState {
	pub x: f64,
	pub y: f64,
	pub scale: f64,
}

impl Default for CameraState {
	fn default() -> Self {
		Self {
			x: 0.0,
			y: 0.0,
			scale: 1.0,
		}
	}
}

/// Canvas size in CSS pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Viewport {
	pub width: f64,
	pub height: f64,
}

impl Viewport {
	pub fn new(width: f64, height: f64) -> Self {
		Self { width, height }
	}

	pub fn is_empty(&self) -> bool {
		self.width <= 0.0 || self.height <= 0.0
	}
}

/// Axis-aligned world rectangle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
	pub min_x: f64,
	pub min_y: f64,
	pub max_x: f64,
	pub max_y: f64,
}

impl Bounds {
	/// Bounds of the `(x, y)` pairs of `positions` at `indices`; `None` when
	/// no index resolves.
	pub fn of(positions: &[f64], indices: impl IntoIterator<Item = usize>) -> Option<Self> {
		let mut bounds: Option<Bounds> = None;
		for i in indices {
			let (Some(&x), Some(&y)) = (positions.get(i * 2), positions.get(i * 2 + 1)) else {
				continue;
			};
			let b = bounds.get_or_insert(Bounds {
				min_x: x,
				min_y: y,
				max_x: x,
				max_y: y,
			});
			b.min_x = b.min_x.min(x);
			b.min_y = b.min_y.min(y);
			b.max_x = b.max_x.max(x);
			b.max_y = b.max_y.max(y);
		}
		bounds
	}

	pub fn contains(&self, x: f64, y: f64) -> bool {
		x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
	}

	/// Whether a segment is certainly outside: both ends beyond the same edge.
	pub fn rejects_segment(&self, a: (f64, f64), b: (f64, f64)) -> bool {
		(a.0 < self.min_x && b.0 < self.min_x)
			|| (a.0 > self.max_x && b.0 > self.max_x)
			|| (a.1 < self.min_y && b.1 < self.min_y)
			|| (a.1 > self.max_y && b.1 > self.max_y)
	}
}

/// Computes a camera framing `bounds` inside `viewport`, leaving
/// `occluded_width` pixels on the right for a side panel.
pub fn fit_camera(bounds: Bounds, viewport: Viewport, occluded_width: f64, config: &EngineConfig) -> CameraState {
	let floor = |span: f64| if span > 0.0 { span } else { config.min_extent };
	let data_w = floor(bounds.max_x - bounds.min_x);
	let data_h = floor(bounds.max_y - bounds.min_y);
	let avail_w = (viewport.width - occluded_width).max(1.0);
	let avail_h = viewport.height.max(1.0);
	let scale = ((avail_w / data_w).min(avail_h / data_h) * config.fit_margin)
		.clamp(config.min_scale, config.max_scale);
	CameraState {
		x: (bounds.min_x + bounds.max_x) / 2.0 + (occluded_width / 2.0) / scale,
		y: (bounds.min_y + bounds.max_y) / 2.0,
		scale,
	}
}

/// Rendered and desired camera; `current` chases `target` every frame.
#[derive(Clone, Debug)]
pub struct Camera {
	pub current: CameraState,
	pub target: CameraState,
	ease: f64,
	min_scale: f64,
	max_scale: f64,
}

// Residual below which the camera snaps onto its target.
const SNAP_PX: f64 = 0.05;
const SNAP_SCALE_RATIO: f64 = 1e-4;

impl Camera {
	pub fn new(config: &EngineConfig) -> Self {
		Self {
			current: CameraState::default(),
			target: CameraState::default(),
			ease: config.ease,
			min_scale: config.min_scale,
			max_scale: config.max_scale,
		}
	}

	pub fn screen_to_world(&self, sx: f64, sy: f64, viewport: Viewport) -> (f64, f64) {
		let c = self.current;
		(
			c.x + (sx - viewport.width / 2.0) / c.scale,
			c.y + (sy - viewport.height / 2.0) / c.scale,
		)
	}

	pub fn world_to_screen(&self, wx: f64, wy: f64, viewport: Viewport) -> (f64, f64) {
		let c = self.current;
		(
			(wx - c.x) * c.scale + viewport.width / 2.0,
			(wy - c.y) * c.scale + viewport.height / 2.0,
		)
	}

	/// World rectangle visible through `viewport`, grown by `pad_px` pixels.
	pub fn visible_bounds(&self, viewport: Viewport, pad_px: f64) -> Bounds {
		let c = self.current;
		let half_w = viewport.width / 2.0 / c.scale + pad_px / c.scale;
		let half_h = viewport.height / 2.0 / c.scale + pad_px / c.scale;
		Bounds {
			min_x: c.x - half_w,
			min_y: c.y - half_h,
			max_x: c.x + half_w,
			max_y: c.y + half_h,
		}
	}

	/// Drag pan by a screen-space delta. Applied to both states so the ease
	/// does not pull back against the drag.
	pub fn pan_by(&mut self, dx: f64, dy: f64) {
		let (wx, wy) = (dx / self.current.scale, dy / self.current.scale);
		self.current.x -= wx;
		self.current.y -= wy;
		self.target.x -= wx;
		self.target.y -= wy;
	}

	/// Zooms by `base^(-delta_y)` keeping the world point under the cursor
	/// fixed on screen.
	pub fn zoom_at(&mut self, sx: f64, sy: f64, delta_y: f64, base: f64, viewport: Viewport) {
		let (wx, wy) = self.screen_to_world(sx, sy, viewport);
		let scale = (self.current.scale * base.powf(-delta_y)).clamp(self.min_scale, self.max_scale);
		self.current = CameraState {
			x: wx - (sx - viewport.width / 2.0) / scale,
			y: wy - (sy - viewport.height / 2.0) / scale,
			scale,
		};
		self.target = self.current;
	}

	/// Jumps straight to the target.
	pub fn snap(&mut self) {
		self.current = self.target;
	}

	/// Whether the camera is still visibly gliding.
	pub fn is_moving(&self, threshold_px: f64) -> bool {
		let (c, t) = (self.current, self.target);
		let center_px = (t.x - c.x).abs().max((t.y - c.y).abs()) * c.scale;
		center_px > threshold_px || (t.scale / c.scale - 1.0).abs() > 0.005
	}
}

impl Simulation for Camera {
	type Target = CameraState;

	fn set_target(&mut self, target: &CameraState) {
		self.target = CameraState {
			scale: target.scale.clamp(self.min_scale, self.max_scale),
			..*target
		};
	}

	fn step(&mut self) -> bool {
		if self.is_settled() {
			return false;
		}
		let (c, t) = (&mut self.current, self.target);
		c.x += (t.x - c.x) * self.ease;
		c.y += (t.y - c.y) * self.ease;
		c.scale += (t.scale - c.scale) * self.ease;

		let center_px = (t.x - c.x).abs().max((t.y - c.y).abs()) * c.scale;
		if center_px < SNAP_PX && (t.scale / c.scale - 1.0).abs() < SNAP_SCALE_RATIO {
			*c = t;
			return true;
		}
		false
	}

	fn is_settled(&self) -> bool {
		self.current == self.target
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn camera_at(x: f64, y: f64, scale: f64) -> Camera {
		let mut cam = Camera::new(&EngineConfig::default());
		cam.current = CameraState { x, y, scale };
		cam.target = cam.current;
		cam
	}

	#[test]
	fn screen_world_round_trip() {
		let cam = camera_at(1.0, 2.0, 100.0);
		let vp = Viewport::new(800.0, 600.0);
		let (wx, wy) = cam.screen_to_world(500.0, 250.0, vp);
		assert_eq!((wx, wy), (2.0, 1.5));
		assert_eq!(cam.world_to_screen(wx, wy, vp), (500.0, 250.0));
	}

	#[test]
	fn pan_moves_both_states() {
		let mut cam = camera_at(0.0, 0.0, 100.0);
		cam.target.scale = 200.0;
		cam.pan_by(50.0, -20.0);
		assert_eq!((cam.current.x, cam.current.y), (-0.5, 0.2));
		assert_eq!((cam.target.x, cam.target.y), (-0.5, 0.2));
	}

	#[test]
	fn wheel_zoom_keeps_cursor_point() {
		let mut cam = camera_at(3.0, -1.0, 200.0);
		let vp = Viewport::new(1000.0, 800.0);
		let before = cam.screen_to_world(120.0, 700.0, vp);
		cam.zoom_at(120.0, 700.0, -300.0, 1.002, vp);
		assert!(cam.current.scale > 200.0);
		let after = cam.screen_to_world(120.0, 700.0, vp);
		assert!((before.0 - after.0).abs() < 1e-9);
		assert!((before.1 - after.1).abs() < 1e-9);
		assert_eq!(cam.current, cam.target);
	}

	#[test]
	fn wheel_zoom_is_clamped() {
		let mut cam = camera_at(0.0, 0.0, 20.0);
		cam.zoom_at(0.0, 0.0, 100_000.0, 1.002, Viewport::new(100.0, 100.0));
		assert_eq!(cam.current.scale, 10.0);
	}

	#[test]
	fn eases_and_settles() {
		let mut cam = camera_at(0.0, 0.0, 100.0);
		cam.set_target(&CameraState {
			x: 5.0,
			y: -5.0,
			scale: 300.0,
		});
		cam.step();
		assert_eq!(cam.current.x, 1.0);
		assert!(cam.is_moving(0.5));
		let settled = (0..500).filter(|_| cam.step()).count();
		assert_eq!(settled, 1);
		assert!(cam.is_settled());
		assert!(!cam.is_moving(0.5));
	}

	#[test]
	fn fit_frames_bounds_with_margin() {
		let cfg = EngineConfig::default();
		let bounds = Bounds {
			min_x: 0.0,
			min_y: 0.0,
			max_x: 4.0,
			max_y: 2.0,
		};
		let fit = fit_camera(bounds, Viewport::new(800.0, 600.0), 0.0, &cfg);
		assert_eq!(fit.scale, 150.0);
		assert_eq!((fit.x, fit.y), (2.0, 1.0));
	}

	#[test]
	fn fit_offsets_for_side_panel() {
		let cfg = EngineConfig::default();
		let bounds = Bounds {
			min_x: 0.0,
			min_y: 0.0,
			max_x: 4.0,
			max_y: 4.0,
		};
		let fit = fit_camera(bounds, Viewport::new(1240.0, 800.0), 440.0, &cfg);
		assert_eq!(fit.scale, 150.0);
		assert!((fit.x - (2.0 + 220.0 / 150.0)).abs() < 1e-12);
	}

	#[test]
	fn degenerate_bounds_stay_finite() {
		let cfg = EngineConfig::default();
		let point = Bounds::of(&[1.0, 1.0], [0]).unwrap();
		let fit = fit_camera(point, Viewport::new(800.0, 600.0), 0.0, &cfg);
		assert!(fit.scale.is_finite());
		assert!((fit.scale - 45_000.0).abs() < 1e-6);
		assert_eq!((fit.x, fit.y), (1.0, 1.0));
	}

	#[test]
	fn bounds_skip_out_of_range_indices() {
		assert_eq!(Bounds::of(&[1.0, 2.0], [3, 7]), None);
		let b = Bounds::of(&[1.0, 2.0, -1.0, 5.0], [0, 1, 9]).unwrap();
		assert_eq!((b.min_x, b.max_x, b.min_y, b.max_y), (-1.0, 1.0, 2.0, 5.0));
		assert!(b.rejects_segment((-3.0, 0.0), (-2.0, 9.0)));
		assert!(!b.rejects_segment((-3.0, 3.0), (3.0, 3.0)));
	}
}
