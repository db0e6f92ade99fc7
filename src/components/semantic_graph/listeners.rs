//! Browser registrations that must be released symmetrically: event
//! listeners and the animation frame chain.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use log::error;
use wasm_bindgen::prelude::*;
use web_sys::{AddEventListenerOptions, Event, EventTarget, Window};

use super::error::{EngineError, describe};

/// An event listener that unregisters itself on drop.
pub struct ListenerGuard {
	target: EventTarget,
	event: &'static str,
	callback: Closure<dyn FnMut(Event)>,
}

impl ListenerGuard {
	pub fn new(
		target: &EventTarget,
		event: &'static str,
		handler: impl FnMut(Event) + 'static,
	) -> Result<Self, EngineError> {
		let callback = Closure::<dyn FnMut(Event)>::new(handler);
		target
			.add_event_listener_with_callback(event, callback.as_ref().unchecked_ref())
			.map_err(|err| EngineError::Listener {
				event,
				reason: describe(err),
			})?;
		Ok(Self {
			target: target.clone(),
			event,
			callback,
		})
	}

	/// Registers with `passive: false` so the handler may call
	/// `prevent_default` (wheel zoom must not scroll the page).
	pub fn non_passive(
		target: &EventTarget,
		event: &'static str,
		handler: impl FnMut(Event) + 'static,
	) -> Result<Self, EngineError> {
		let callback = Closure::<dyn FnMut(Event)>::new(handler);
		let options = AddEventListenerOptions::new();
		options.set_passive(false);
		target
			.add_event_listener_with_callback_and_add_event_listener_options(
				event,
				callback.as_ref().unchecked_ref(),
				&options,
			)
			.map_err(|err| EngineError::Listener {
				event,
				reason: describe(err),
			})?;
		Ok(Self {
			target: target.clone(),
			event,
			callback,
		})
	}
}

impl Drop for ListenerGuard {
	fn drop(&mut self) {
		let _ = self
			.target
			.remove_event_listener_with_callback(self.event, self.callback.as_ref().unchecked_ref());
	}
}

type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut()>>>>;

/// A self-rescheduling `requestAnimationFrame` loop, cancelled on drop.
pub struct FrameLoop {
	window: Window,
	pending: Rc<Cell<Option<i32>>>,
	callback: FrameCallback,
}

impl FrameLoop {
	pub fn start(window: &Window, mut tick: impl FnMut() + 'static) -> Result<Self, EngineError> {
		let pending: Rc<Cell<Option<i32>>> = Rc::new(Cell::new(None));
		let callback: FrameCallback = Rc::new(RefCell::new(None));

		let (pending_inner, callback_inner, window_inner) =
			(pending.clone(), callback.clone(), window.clone());
		let frame = Closure::<dyn FnMut()>::new(move || {
			pending_inner.set(None);
			tick();
			if let Some(ref cb) = *callback_inner.borrow() {
				match window_inner.request_animation_frame(cb.as_ref().unchecked_ref()) {
					Ok(id) => pending_inner.set(Some(id)),
					Err(err) => error!("frame loop stopped: {}", describe(err)),
				}
			}
		});

		let id = window
			.request_animation_frame(frame.as_ref().unchecked_ref())
			.map_err(|err| EngineError::Frame(describe(err)))?;
		pending.set(Some(id));
		*callback.borrow_mut() = Some(frame);

		Ok(Self {
			window: window.clone(),
			pending,
			callback,
		})
	}
}

impl Drop for FrameLoop {
	fn drop(&mut self) {
		if let Some(id) = self.pending.take() {
			let _ = self.window.cancel_animation_frame(id);
		}
		// Releases the closure and with it the reference cycle it holds.
		self.callback.borrow_mut().take();
	}
}
