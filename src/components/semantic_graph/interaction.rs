use super::state::GraphState;

/// Mouse button as reported by `MouseEvent.button`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerButton {
	Primary,
	Middle,
	Secondary,
	Other,
}

impl PointerButton {
	pub fn from_code(code: i16) -> Self {
		match code {
			0 => PointerButton::Primary,
			1 => PointerButton::Middle,
			2 => PointerButton::Secondary,
			_ => PointerButton::Other,
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Press {
	button: PointerButton,
	start: (f64, f64),
	last: (f64, f64),
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ContextMenu {
	pub visible: bool,
	pub x: f64,
	pub y: f64,
}

/// Pointer, hover and context-menu state between events.
#[derive(Clone, Debug, Default)]
pub struct Interaction {
	press: Option<Press>,
	hovered: Option<usize>,
	pub menu: ContextMenu,
}

impl Interaction {
	pub fn is_dragging(&self) -> bool {
		self.press.is_some()
	}

	pub fn hovered(&self) -> Option<usize> {
		self.hovered
	}
}

/// Hover result of a pointer move, reported on every move for tooltip
/// placement.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hover {
	pub node: Option<usize>,
	pub x: f64,
	pub y: f64,
	/// The hovered node differs from the previous move.
	pub changed: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerOutcome {
	None,
	/// A click landed; carries the node under it, if any.
	Select(Option<usize>),
	ZoomToFit,
}

impl GraphState {
	/// Pointer coordinates are canvas-relative CSS pixels throughout.
	pub fn pointer_down(&mut self, x: f64, y: f64, button: PointerButton) {
		self.interaction.menu.visible = false;
		if matches!(button, PointerButton::Primary | PointerButton::Middle) {
			self.interaction.press = Some(Press {
				button,
				start: (x, y),
				last: (x, y),
			});
		}
	}

	/// Pans while a button is held, otherwise hit-tests for hover.
	pub fn pointer_move(&mut self, x: f64, y: f64) -> Option<Hover> {
		if let Some(press) = self.interaction.press.as_mut() {
			let (dx, dy) = (x - press.last.0, y - press.last.1);
			press.last = (x, y);
			self.camera.pan_by(dx, dy);
			return None;
		}
		let node = self.hit_test(x, y);
		let changed = node != self.interaction.hovered;
		self.interaction.hovered = node;
		Some(Hover { node, x, y, changed })
	}

	/// A release within the click slop of its press is a click: primary
	/// selects, middle zooms to fit.
	pub fn pointer_up(&mut self, x: f64, y: f64, button: PointerButton) -> PointerOutcome {
		let Some(press) = self.interaction.press.take_if(|p| p.button == button) else {
			return PointerOutcome::None;
		};
		let travel = (x - press.start.0).hypot(y - press.start.1);
		if travel >= self.config.click_slop_px {
			return PointerOutcome::None;
		}
		match button {
			PointerButton::Primary => PointerOutcome::Select(self.hit_test(x, y)),
			PointerButton::Middle => {
				self.zoom_to_fit();
				PointerOutcome::ZoomToFit
			}
			_ => PointerOutcome::None,
		}
	}

	pub fn pointer_leave(&mut self) {
		self.interaction.press = None;
		self.interaction.hovered = None;
	}

	pub fn wheel(&mut self, x: f64, y: f64, delta_y: f64) {
		let viewport = self.viewport();
		self.camera
			.zoom_at(x, y, delta_y, self.config.wheel_zoom_base, viewport);
	}

	pub fn open_context_menu(&mut self, x: f64, y: f64) {
		self.interaction.press = None;
		self.interaction.menu = ContextMenu {
			visible: true,
			x,
			y,
		};
	}

	pub fn close_context_menu(&mut self) {
		self.interaction.menu.visible = false;
	}

	/// The context menu's "Zoom to fit" entry.
	pub fn menu_zoom_to_fit(&mut self) {
		self.zoom_to_fit();
		self.close_context_menu();
	}

	/// Returns whether the key was consumed.
	pub fn key_down(&mut self, key: &str) -> bool {
		if key == "Escape" && self.interaction.menu.visible {
			self.close_context_menu();
			return true;
		}
		false
	}
}

#[cfg(test)]
mod tests {
	use super::super::state::tests::{node, ready_state};
	use super::*;

	fn state() -> GraphState {
		ready_state(vec![
			node("a", 0.0, 0.0, &[1]),
			node("b", 1.0, 0.0, &[0]),
			node("c", 0.0, 1.0, &[]),
		])
	}

	fn screen_of(state: &GraphState, idx: usize) -> (f64, f64) {
		let (x, y) = state.positions().position(idx).unwrap();
		state.camera.world_to_screen(x, y, state.viewport())
	}

	#[test]
	fn click_selects_node_under_pointer() {
		let mut s = state();
		let (x, y) = screen_of(&s, 1);
		s.pointer_down(x, y, PointerButton::Primary);
		assert!(s.interaction.is_dragging());
		let out = s.pointer_up(x + 2.0, y + 2.0, PointerButton::Primary);
		assert_eq!(out, PointerOutcome::Select(Some(1)));
		assert!(!s.interaction.is_dragging());
	}

	#[test]
	fn click_on_empty_space_clears() {
		let mut s = state();
		s.pointer_down(5.0, 5.0, PointerButton::Primary);
		assert_eq!(
			s.pointer_up(5.0, 5.0, PointerButton::Primary),
			PointerOutcome::Select(None)
		);
	}

	#[test]
	fn drag_pans_instead_of_clicking() {
		let mut s = state();
		let before = s.camera.current;
		s.pointer_down(100.0, 100.0, PointerButton::Primary);
		assert_eq!(s.pointer_move(130.0, 100.0), None);
		assert_eq!(s.pointer_up(130.0, 100.0, PointerButton::Primary), PointerOutcome::None);
		assert!((s.camera.current.x - (before.x - 30.0 / before.scale)).abs() < 1e-12);
		assert_eq!(s.camera.current, s.camera.target);
	}

	#[test]
	fn hover_reports_changes() {
		let mut s = state();
		let (x, y) = screen_of(&s, 2);
		let first = s.pointer_move(x, y).unwrap();
		assert_eq!((first.node, first.changed), (Some(2), true));
		let second = s.pointer_move(x + 1.0, y).unwrap();
		assert_eq!((second.node, second.changed), (Some(2), false));
		s.pointer_leave();
		assert_eq!(s.interaction.hovered(), None);
	}

	#[test]
	fn middle_click_zooms_to_fit() {
		let mut s = state();
		s.wheel(10.0, 10.0, 400.0);
		let fit = s.fit_target().unwrap();
		assert_ne!(s.camera.target, fit);
		s.pointer_down(50.0, 50.0, PointerButton::Middle);
		assert_eq!(s.pointer_up(51.0, 50.0, PointerButton::Middle), PointerOutcome::ZoomToFit);
		assert_eq!(s.camera.target, fit);
	}

	#[test]
	fn mismatched_release_keeps_press() {
		let mut s = state();
		s.pointer_down(0.0, 0.0, PointerButton::Primary);
		assert_eq!(s.pointer_up(0.0, 0.0, PointerButton::Middle), PointerOutcome::None);
		assert!(s.interaction.is_dragging());
	}

	#[test]
	fn context_menu_lifecycle() {
		let mut s = state();
		s.wheel(10.0, 10.0, 400.0);
		s.open_context_menu(40.0, 60.0);
		assert_eq!(
			s.interaction.menu,
			ContextMenu {
				visible: true,
				x: 40.0,
				y: 60.0
			}
		);
		assert!(!s.key_down("Enter"));
		assert!(s.key_down("Escape"));
		assert!(!s.interaction.menu.visible);

		s.open_context_menu(1.0, 1.0);
		s.menu_zoom_to_fit();
		assert!(!s.interaction.menu.visible);
		assert_eq!(Some(s.camera.target), s.fit_target());

		s.open_context_menu(1.0, 1.0);
		s.pointer_down(3.0, 3.0, PointerButton::Secondary);
		assert!(!s.interaction.menu.visible);
	}

	#[test]
	fn selection_hides_other_nodes_from_hover() {
		let mut s = state();
		s.select(Some("c"));
		let (x, y) = screen_of(&s, 1);
		assert_eq!(s.pointer_move(x, y).unwrap().node, None);
	}

	#[test]
	fn button_codes() {
		assert_eq!(PointerButton::from_code(0), PointerButton::Primary);
		assert_eq!(PointerButton::from_code(1), PointerButton::Middle);
		assert_eq!(PointerButton::from_code(2), PointerButton::Secondary);
		assert_eq!(PointerButton::from_code(4), PointerButton::Other);
	}
}
