use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use log::{debug, error, info};
use wasm_bindgen::prelude::*;
use web_sys::{
	CanvasRenderingContext2d, FocusEvent, HtmlCanvasElement, KeyboardEvent, MouseEvent,
	WheelEvent, Window,
};

use super::render;
use super::state::{DEFAULT_HEIGHT, DEFAULT_WIDTH, MindMapState, PointerDown};
use crate::mindmap::{self, DEFAULT_SNAPSHOT_NAME, LocalStorageSnapshot};

const EDITOR_WIDTH: f64 = 160.0;
const EDITOR_HEIGHT: f64 = 24.0;

/// Screen placement and seed text of the inline label editor.
#[derive(Clone, Debug, PartialEq)]
struct EditorOverlay {
	left: f64,
	top: f64,
	text: String,
}

fn local_position(canvas_ref: NodeRef<leptos::html::Canvas>, ev: &MouseEvent) -> Option<(f64, f64)> {
	let canvas: HtmlCanvasElement = canvas_ref.get_untracked()?;
	let rect = canvas.get_bounding_client_rect();
	Some((
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	))
}

fn save_snapshot(state: &MindMapState, backend: &LocalStorageSnapshot) {
	if let Err(e) = mindmap::save(&state.store, backend) {
		error!("failed to save mind map: {e}");
	}
}

/// Interactive mind-map canvas. Loads the snapshot stored under
/// `snapshot_key` on mount and saves it back on page unload or from the menu.
#[component]
pub fn MindMapCanvas(
	#[prop(into, default = DEFAULT_SNAPSHOT_NAME.to_string())] snapshot_key: String,
	#[prop(default = false)] fullscreen: bool,
	#[prop(default = None)] width: Option<f64>,
	#[prop(default = None)] height: Option<f64>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let input_ref = NodeRef::<leptos::html::Input>::new();
	let editing = RwSignal::new(None::<EditorOverlay>);
	let backend = LocalStorageSnapshot::new(snapshot_key);

	let state: Rc<RefCell<Option<MindMapState>>> = Rc::new(RefCell::new(None));
	let animate: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let resize_cb: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let unload_cb: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let (state_init, animate_init, resize_cb_init, unload_cb_init, backend_init) = (
		state.clone(),
		animate.clone(),
		resize_cb.clone(),
		unload_cb.clone(),
		backend.clone(),
	);

	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		if state_init.borrow().is_some() {
			return;
		}
		let canvas: HtmlCanvasElement = canvas.into();
		let window: Window = web_sys::window().unwrap();

		let (w, h) = if fullscreen {
			(
				window.inner_width().unwrap().as_f64().unwrap(),
				window.inner_height().unwrap().as_f64().unwrap(),
			)
		} else {
			(
				width.unwrap_or_else(|| {
					canvas
						.parent_element()
						.map(|p| p.client_width() as f64)
						.filter(|w| *w > 0.0)
						.unwrap_or(DEFAULT_WIDTH)
				}),
				height.unwrap_or_else(|| {
					canvas
						.parent_element()
						.map(|p| p.client_height() as f64)
						.filter(|h| *h > 0.0)
						.unwrap_or(DEFAULT_HEIGHT)
				}),
			)
		};
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);

		let ctx: CanvasRenderingContext2d = canvas
			.get_context("2d")
			.unwrap()
			.unwrap()
			.dyn_into()
			.unwrap();

		let loaded = mindmap::load(&backend_init);
		info!("mind map ready ({:?}, {} node(s))", loaded.state, loaded.store.len());
		*state_init.borrow_mut() = Some(MindMapState::new(loaded.store, w, h));

		if fullscreen {
			let (state_resize, canvas_resize) = (state_init.clone(), canvas.clone());
			*resize_cb_init.borrow_mut() = Some(Closure::new(move || {
				let win: Window = web_sys::window().unwrap();
				let (nw, nh) = (
					win.inner_width().unwrap().as_f64().unwrap(),
					win.inner_height().unwrap().as_f64().unwrap(),
				);
				canvas_resize.set_width(nw as u32);
				canvas_resize.set_height(nh as u32);
				if let Some(ref mut s) = *state_resize.borrow_mut() {
					s.resize(nw, nh);
				}
			}));
			if let Some(ref cb) = *resize_cb_init.borrow() {
				let _ =
					window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
			}
		}

		let (state_unload, backend_unload) = (state_init.clone(), backend_init.clone());
		*unload_cb_init.borrow_mut() = Some(Closure::new(move || {
			if let Some(ref s) = *state_unload.borrow() {
				save_snapshot(s, &backend_unload);
			}
		}));
		if let Some(ref cb) = *unload_cb_init.borrow() {
			let _ =
				window.add_event_listener_with_callback("beforeunload", cb.as_ref().unchecked_ref());
		}

		let (state_anim, animate_inner) = (state_init.clone(), animate_init.clone());
		*animate_init.borrow_mut() = Some(Closure::new(move || {
			if let Some(ref s) = *state_anim.borrow() {
				render::render(s, &ctx);
			}
			if let Some(ref cb) = *animate_inner.borrow() {
				let _ = web_sys::window()
					.unwrap()
					.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}));
		if let Some(ref cb) = *animate_init.borrow() {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	});

	Effect::new(move |_| {
		if editing.with(Option::is_some) {
			if let Some(input) = input_ref.get() {
				let _ = input.focus();
				input.select();
			}
		}
	});

	let state_md = state.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let Some((x, y)) = local_position(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut s) = *state_md.borrow_mut() {
			// Shift-drag pans; a plain click is reserved for creating nodes.
			if ev.shift_key() {
				s.begin_pan(x, y);
				return;
			}
			match s.pointer_down(x, y) {
				Ok(PointerDown::Created(id)) => debug!("click created node {id}"),
				Ok(PointerDown::Selected(_)) => {}
				Err(e) => error!("pointer down rejected: {e}"),
			}
		}
	};

	let state_mm = state.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some((x, y)) = local_position(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut s) = *state_mm.borrow_mut() {
			if let Err(e) = s.pointer_move(x, y) {
				error!("drag rejected: {e}");
				s.pointer_up();
			}
		}
	};

	let state_mu = state.clone();
	let on_mouseup = move |_: MouseEvent| {
		if let Some(ref mut s) = *state_mu.borrow_mut() {
			s.pointer_up();
		}
	};

	let state_ml = state.clone();
	let on_mouseleave = move |_: MouseEvent| {
		if let Some(ref mut s) = *state_ml.borrow_mut() {
			s.pointer_up();
		}
	};

	let state_dc = state.clone();
	let on_dblclick = move |ev: MouseEvent| {
		let Some((x, y)) = local_position(canvas_ref, &ev) else {
			return;
		};
		let overlay = {
			let mut guard = state_dc.borrow_mut();
			let Some(s) = guard.as_mut() else {
				return;
			};
			s.pointer_up();
			let Some(edit) = s.begin_label_edit(x, y) else {
				return;
			};
			let (node, text) = (edit.node, edit.draft.clone());
			let Some((left, top)) = s.node_screen_position(node) else {
				return;
			};
			EditorOverlay { left, top, text }
		};
		editing.set(Some(overlay));
	};

	let state_wh = state.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some((x, y)) = local_position(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut s) = *state_wh.borrow_mut() {
			s.zoom(x, y, ev.delta_y());
		}
	};

	let state_kd = state.clone();
	let on_keydown = move |ev: KeyboardEvent| {
		match ev.key().as_str() {
			"Enter" => {
				let text = event_target_value(&ev);
				if let Some(ref mut s) = *state_kd.borrow_mut() {
					match s.commit_label_edit(text) {
						Ok(Some(id)) => debug!("relabeled node {id}"),
						Ok(None) => {}
						Err(e) => error!("label edit rejected: {e}"),
					}
				}
			}
			"Escape" => {
				if let Some(ref mut s) = *state_kd.borrow_mut() {
					s.abandon_label_edit();
				}
			}
			_ => return,
		}
		editing.set(None);
	};

	// Losing focus without Enter discards the draft.
	let state_bl = state.clone();
	let on_blur = move |_: FocusEvent| {
		if let Some(ref mut s) = *state_bl.borrow_mut() {
			s.abandon_label_edit();
		}
		editing.set(None);
	};

	let state_add = state.clone();
	let on_add = move |_: MouseEvent| {
		if let Some(ref mut s) = *state_add.borrow_mut() {
			match s.add_node_from_menu() {
				Ok(id) => debug!("menu created node {id}"),
				Err(e) => error!("add node rejected: {e}"),
			}
		}
	};

	let state_rm = state.clone();
	let on_remove = move |_: MouseEvent| {
		if let Some(ref mut s) = *state_rm.borrow_mut() {
			if let Err(e) = s.remove_active() {
				error!("delete rejected: {e}");
			}
		}
	};

	let state_dt = state.clone();
	let on_detach = move |_: MouseEvent| {
		if let Some(ref mut s) = *state_dt.borrow_mut() {
			if let Err(e) = s.detach_active() {
				error!("detach rejected: {e}");
			}
		}
	};

	let state_sv = state.clone();
	let on_save = move |_: MouseEvent| {
		if let Some(ref s) = *state_sv.borrow() {
			save_snapshot(s, &backend);
		}
	};

	view! {
		<div class="mind-map" style="position: relative;">
			<canvas
				node_ref=canvas_ref
				class="mind-map-canvas"
				on:mousedown=on_mousedown
				on:mousemove=on_mousemove
				on:mouseup=on_mouseup
				on:mouseleave=on_mouseleave
				on:dblclick=on_dblclick
				on:wheel=on_wheel
				style="display: block; cursor: pointer;"
			/>
			<nav class="mind-map-menu" style="position: absolute; top: 8px; left: 8px;">
				<button on:click=on_add>"Add node"</button>
				<button on:click=on_detach>"Detach"</button>
				<button on:click=on_remove>"Delete"</button>
				<button on:click=on_save>"Save"</button>
			</nav>
			<input
				node_ref=input_ref
				type="text"
				class="mind-map-label-editor"
				style:position="absolute"
				style:width=format!("{EDITOR_WIDTH}px")
				style:height=format!("{EDITOR_HEIGHT}px")
				style:display=move || {
					if editing.with(Option::is_some) { "block" } else { "none" }
				}
				style:left=move || {
					editing
						.with(|e| e.as_ref().map(|o| format!("{}px", o.left - EDITOR_WIDTH / 2.0)))
						.unwrap_or_default()
				}
				style:top=move || {
					editing
						.with(|e| e.as_ref().map(|o| format!("{}px", o.top - EDITOR_HEIGHT / 2.0)))
						.unwrap_or_default()
				}
				prop:value=move || {
					editing.with(|e| e.as_ref().map(|o| o.text.clone()).unwrap_or_default())
				}
				on:keydown=on_keydown
				on:blur=on_blur
			/>
		</div>
	}
}
