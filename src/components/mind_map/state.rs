use log::debug;

use crate::mindmap::{GraphError, GraphStore, NodeId, Point};

/// Canvas width used when the parent element reports none.
pub const DEFAULT_WIDTH: f64 = 800.0;
/// Canvas height used when the parent element reports none.
pub const DEFAULT_HEIGHT: f64 = 600.0;
const MIN_ZOOM: f64 = 0.25;
const MAX_ZOOM: f64 = 4.0;

/// Pan offset and zoom factor mapping canvas space onto the screen.
#[derive(Clone, Debug)]
pub struct ViewTransform {
	/// Horizontal screen offset of the canvas origin.
	pub x: f64,
	/// Vertical screen offset of the canvas origin.
	pub y: f64,
	/// Zoom factor.
	pub k: f64,
}

impl Default for ViewTransform {
	fn default() -> Self {
		Self {
			x: 0.0,
			y: 0.0,
			k: 1.0,
		}
	}
}

/// The selected node and where the drag started, in screen and canvas space.
#[derive(Clone, Debug, Default)]
pub struct DragState {
	/// Node being dragged, if any.
	pub node: Option<NodeId>,
	/// Screen position of the pointer at pointer-down.
	pub start_x: f64,
	/// Screen position of the pointer at pointer-down.
	pub start_y: f64,
	/// Canvas position of the node at pointer-down.
	pub node_start: Point,
}

/// A background drag moving the view, started with shift held.
#[derive(Clone, Debug, Default)]
pub struct PanState {
	/// Whether a pan is in progress.
	pub active: bool,
	/// Screen position of the pointer when the pan started.
	pub start_x: f64,
	/// Screen position of the pointer when the pan started.
	pub start_y: f64,
	/// Transform offset when the pan started.
	pub transform_start_x: f64,
	/// Transform offset when the pan started.
	pub transform_start_y: f64,
}

/// An open inline label editor. Dropped without effect unless committed.
#[derive(Clone, Debug, PartialEq)]
pub struct LabelEdit {
	/// Node being relabeled.
	pub node: NodeId,
	/// Label the editor was seeded with.
	pub draft: String,
}

/// What a pointer-down on the canvas did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerDown {
	/// An existing node was hit; it is now active and being dragged.
	Selected(NodeId),
	/// Empty canvas was hit and a node was created there.
	Created(NodeId),
}

/// Editor state behind the canvas: the graph plus everything the pointer and
/// the inline label editor need. Coordinates passed in are canvas-element
/// pixels; the store only ever sees canvas space.
pub struct MindMapState {
	/// The mind map being edited.
	pub store: GraphStore,
	/// Current pan and zoom.
	pub transform: ViewTransform,
	/// Node drag in progress.
	pub drag: DragState,
	/// View pan in progress.
	pub pan: PanState,
	/// Open label editor, if any.
	pub edit: Option<LabelEdit>,
	/// Canvas width in screen pixels.
	pub width: f64,
	/// Canvas height in screen pixels.
	pub height: f64,
}

impl MindMapState {
	/// Editor state over `store` for a canvas of the given size.
	pub fn new(store: GraphStore, width: f64, height: f64) -> Self {
		Self {
			store,
			transform: ViewTransform::default(),
			drag: DragState::default(),
			pan: PanState::default(),
			edit: None,
			width,
			height,
		}
	}

	/// Maps canvas-element pixels to canvas space.
	pub fn screen_to_canvas(&self, sx: f64, sy: f64) -> Point {
		Point::new(
			(sx - self.transform.x) / self.transform.k,
			(sy - self.transform.y) / self.transform.k,
		)
	}

	/// Maps canvas space to canvas-element pixels.
	pub fn canvas_to_screen(&self, p: Point) -> (f64, f64) {
		(
			p.x * self.transform.k + self.transform.x,
			p.y * self.transform.k + self.transform.y,
		)
	}

	/// Screen position of a node's center.
	pub fn node_screen_position(&self, id: NodeId) -> Option<(f64, f64)> {
		self.store.node(id).map(|n| self.canvas_to_screen(n.position))
	}

	/// Hit-tests the pointer: a hit activates and selects the node, a miss
	/// creates a node there as a child of the active node.
	pub fn pointer_down(&mut self, sx: f64, sy: f64) -> Result<PointerDown, GraphError> {
		let point = self.screen_to_canvas(sx, sy);
		if let Some(id) = self.store.find_node_at(point) {
			self.store.set_active(id)?;
			let node_start = self.store.node(id).map(|n| n.position).unwrap_or(point);
			self.drag = DragState {
				node: Some(id),
				start_x: sx,
				start_y: sy,
				node_start,
			};
			debug!("selected node {id}");
			return Ok(PointerDown::Selected(id));
		}
		let id = self.store.create_node(point, self.store.active())?;
		Ok(PointerDown::Created(id))
	}

	/// Starts moving the view instead of touching any node.
	pub fn begin_pan(&mut self, sx: f64, sy: f64) {
		self.pan = PanState {
			active: true,
			start_x: sx,
			start_y: sy,
			transform_start_x: self.transform.x,
			transform_start_y: self.transform.y,
		};
	}

	/// Drags the selected node, keeping the offset at which it was grabbed,
	/// or pans the view. Returns whether a node moved.
	pub fn pointer_move(&mut self, sx: f64, sy: f64) -> Result<bool, GraphError> {
		if self.pan.active {
			self.transform.x = self.pan.transform_start_x + (sx - self.pan.start_x);
			self.transform.y = self.pan.transform_start_y + (sy - self.pan.start_y);
			return Ok(false);
		}
		let Some(id) = self.drag.node else {
			return Ok(false);
		};
		let (dx, dy) = (
			(sx - self.drag.start_x) / self.transform.k,
			(sy - self.drag.start_y) / self.transform.k,
		);
		let target = Point::new(self.drag.node_start.x + dx, self.drag.node_start.y + dy);
		self.store.move_node(id, target)?;
		Ok(true)
	}

	/// Ends any drag or pan.
	pub fn pointer_up(&mut self) {
		self.drag = DragState::default();
		self.pan = PanState::default();
	}

	/// Node currently being dragged.
	pub fn selected(&self) -> Option<NodeId> {
		self.drag.node
	}

	/// Opens the label editor on the node under the pointer, seeded with its
	/// current label.
	pub fn begin_label_edit(&mut self, sx: f64, sy: f64) -> Option<&LabelEdit> {
		let id = self.store.find_node_at(self.screen_to_canvas(sx, sy))?;
		let draft = self.store.node(id)?.label.clone();
		self.edit = Some(LabelEdit { node: id, draft });
		self.edit.as_ref()
	}

	/// Writes the edited label. Blank text keeps the old label.
	pub fn commit_label_edit(
		&mut self,
		text: impl Into<String>,
	) -> Result<Option<NodeId>, GraphError> {
		let Some(edit) = self.edit.take() else {
			return Ok(None);
		};
		let text = text.into();
		if text.trim().is_empty() {
			return Ok(None);
		}
		self.store.set_label(edit.node, text)?;
		Ok(Some(edit.node))
	}

	/// Closes the label editor without writing anything.
	pub fn abandon_label_edit(&mut self) -> Option<LabelEdit> {
		self.edit.take()
	}

	/// The "add node" menu command: same as clicking empty canvas at the
	/// center of the view.
	pub fn add_node_from_menu(&mut self) -> Result<NodeId, GraphError> {
		let center = self.screen_to_canvas(self.width / 2.0, self.height / 2.0);
		self.store.create_node(center, self.store.active())
	}

	/// Deletes the active node and its subtree. Nothing happens without an
	/// active node.
	pub fn remove_active(&mut self) -> Result<Vec<NodeId>, GraphError> {
		let Some(id) = self.store.active() else {
			return Ok(Vec::new());
		};
		let removed = self.store.remove_node(id)?;
		if self.drag.node.is_some_and(|n| removed.contains(&n)) {
			self.pointer_up();
		}
		if self.edit.as_ref().is_some_and(|e| removed.contains(&e.node)) {
			self.edit = None;
		}
		Ok(removed)
	}

	/// Turns the active node into a root.
	pub fn detach_active(&mut self) -> Result<(), GraphError> {
		match self.store.active() {
			Some(id) => self.store.reparent(id, None),
			None => Ok(()),
		}
	}

	/// Zooms in (`delta_y < 0`) or out around the pointer.
	pub fn zoom(&mut self, sx: f64, sy: f64, delta_y: f64) {
		let factor = if delta_y > 0.0 { 0.9 } else { 1.1 };
		let new_k = (self.transform.k * factor).clamp(MIN_ZOOM, MAX_ZOOM);
		let ratio = new_k / self.transform.k;
		self.transform.x = sx - (sx - self.transform.x) * ratio;
		self.transform.y = sy - (sy - self.transform.y) * ratio;
		self.transform.k = new_k;
	}

	/// Records a new canvas size.
	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::mindmap::PLACEHOLDER_LABEL;

	fn state() -> MindMapState {
		MindMapState::new(GraphStore::new(), DEFAULT_WIDTH, DEFAULT_HEIGHT)
	}

	#[test]
	fn clicking_empty_canvas_creates_children_of_active() {
		let mut s = state();
		let PointerDown::Created(a) = s.pointer_down(100.0, 100.0).unwrap() else {
			panic!("expected a new node");
		};
		s.pointer_up();
		assert_eq!(s.store.node(a).unwrap().level, 1);

		assert_eq!(s.pointer_down(100.0, 100.0).unwrap(), PointerDown::Selected(a));
		s.pointer_up();
		assert_eq!(s.store.active(), Some(a));

		let PointerDown::Created(b) = s.pointer_down(200.0, 200.0).unwrap() else {
			panic!("expected a new node");
		};
		let PointerDown::Created(c) = s.pointer_down(300.0, 100.0).unwrap() else {
			panic!("expected a new node");
		};
		assert_eq!(s.store.parent_of(b), Some(a));
		assert_eq!(s.store.parent_of(c), Some(a));
		assert_eq!(s.store.node(b).unwrap().level, 2);
		assert_eq!(s.store.active(), Some(a));
	}

	#[test]
	fn drag_keeps_grab_offset_and_release_clears_selection() {
		let mut s = state();
		let a = s.store.create_node(Point::new(100.0, 100.0), None).unwrap();

		assert_eq!(s.pointer_down(110.0, 95.0).unwrap(), PointerDown::Selected(a));
		assert_eq!(s.selected(), Some(a));
		assert!(s.pointer_move(160.0, 145.0).unwrap());
		assert_eq!(s.store.node(a).unwrap().position, Point::new(150.0, 150.0));

		s.pointer_up();
		assert_eq!(s.selected(), None);
		assert!(!s.pointer_move(0.0, 0.0).unwrap());
		assert_eq!(s.store.node(a).unwrap().position, Point::new(150.0, 150.0));
	}

	#[test]
	fn dragging_a_parent_redraws_child_connectors() {
		let mut s = state();
		let a = s.store.create_node(Point::new(100.0, 100.0), None).unwrap();
		let b = s.store.create_node(Point::new(200.0, 100.0), Some(a)).unwrap();

		s.pointer_down(100.0, 100.0).unwrap();
		s.pointer_move(100.0, 50.0).unwrap();

		assert_eq!(s.store.connector(b).unwrap().from, Point::new(100.0, 50.0));
		assert_eq!(s.store.node(b).unwrap().position, Point::new(200.0, 100.0));
	}

	#[test]
	fn label_edit_commits_or_abandons() {
		let mut s = state();
		let a = s.store.create_node(Point::new(100.0, 100.0), None).unwrap();

		let edit = s.begin_label_edit(100.0, 100.0).unwrap();
		assert_eq!(edit.draft, PLACEHOLDER_LABEL);
		assert!(s.abandon_label_edit().is_some());
		assert_eq!(s.store.node(a).unwrap().label, PLACEHOLDER_LABEL);

		s.begin_label_edit(100.0, 100.0).unwrap();
		assert_eq!(s.commit_label_edit("Root").unwrap(), Some(a));
		assert_eq!(s.store.node(a).unwrap().label, "Root");
		assert_eq!(s.commit_label_edit("Again").unwrap(), None);

		s.begin_label_edit(100.0, 100.0).unwrap();
		assert_eq!(s.commit_label_edit("   ").unwrap(), None);
		assert_eq!(s.store.node(a).unwrap().label, "Root");

		assert!(s.begin_label_edit(500.0, 500.0).is_none());
	}

	#[test]
	fn menu_add_uses_view_center() {
		let mut s = state();
		let a = s.add_node_from_menu().unwrap();
		assert_eq!(s.store.node(a).unwrap().position, Point::new(400.0, 300.0));

		s.store.set_active(a).unwrap();
		s.transform = ViewTransform {
			x: 100.0,
			y: 0.0,
			k: 2.0,
		};
		let b = s.add_node_from_menu().unwrap();
		assert_eq!(s.store.node(b).unwrap().position, Point::new(150.0, 150.0));
		assert_eq!(s.store.parent_of(b), Some(a));
	}

	#[test]
	fn shift_drag_pans_without_touching_nodes() {
		let mut s = state();
		let a = s.store.create_node(Point::new(100.0, 100.0), None).unwrap();

		s.begin_pan(100.0, 100.0);
		assert!(!s.pointer_move(160.0, 70.0).unwrap());
		assert_eq!((s.transform.x, s.transform.y), (60.0, -30.0));
		assert_eq!(s.store.node(a).unwrap().position, Point::new(100.0, 100.0));
		assert_eq!(s.node_screen_position(a), Some((160.0, 70.0)));

		s.pointer_up();
		assert!(!s.pan.active);
		assert!(!s.pointer_move(0.0, 0.0).unwrap());
		assert_eq!((s.transform.x, s.transform.y), (60.0, -30.0));

		assert_eq!(s.pointer_down(160.0, 70.0).unwrap(), PointerDown::Selected(a));
		assert_eq!(s.store.len(), 1);
	}

	#[test]
	fn zoom_keeps_pointer_anchor() {
		let mut s = state();
		let before = s.screen_to_canvas(200.0, 150.0);
		s.zoom(200.0, 150.0, -1.0);
		let after = s.screen_to_canvas(200.0, 150.0);
		assert!((before.x - after.x).abs() < 1e-9);
		assert!((before.y - after.y).abs() < 1e-9);
		assert!(s.transform.k > 1.0);
	}

	#[test]
	fn remove_and_detach_active() {
		let mut s = state();
		let a = s.store.create_node(Point::new(100.0, 100.0), None).unwrap();
		let b = s.store.create_node(Point::new(200.0, 100.0), Some(a)).unwrap();
		let c = s.store.create_node(Point::new(300.0, 100.0), Some(b)).unwrap();

		assert!(s.remove_active().unwrap().is_empty());

		s.store.set_active(b).unwrap();
		s.detach_active().unwrap();
		assert_eq!(s.store.parent_of(b), None);
		assert_eq!(s.store.node(c).unwrap().level, 2);

		s.pointer_down(200.0, 100.0).unwrap();
		assert_eq!(s.remove_active().unwrap(), vec![b, c]);
		assert_eq!(s.selected(), None);
		assert_eq!(s.store.len(), 1);
	}
}
