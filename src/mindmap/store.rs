use std::collections::BTreeMap;

use log::debug;

use super::error::GraphError;
use super::types::{Connector, Node, NodeId, Point};

/// Radius of a node's circle, used both for drawing and hit-testing.
pub const NODE_RADIUS: f64 = 30.0;

/// Label given to freshly created nodes until the user edits it.
pub const PLACEHOLDER_LABEL: &str = "Double-click to edit";

/// In-memory mind map: nodes, the child -> parent forest and the connector
/// line of every edge.
///
/// Invariants kept by every operation:
/// - each child has at most one parent and no node is its own ancestor,
/// - every edge endpoint exists and every edge owns exactly one connector
///   whose endpoints match the current node positions,
/// - a root has level 1 and every other node has its parent's level + 1.
#[derive(Clone, Debug)]
pub struct GraphStore {
	nodes: BTreeMap<NodeId, Node>,
	hierarchy: BTreeMap<NodeId, NodeId>,
	connectors: BTreeMap<NodeId, Connector>,
	active: Option<NodeId>,
	next_id: u64,
}

impl Default for GraphStore {
	fn default() -> Self {
		Self {
			nodes: BTreeMap::new(),
			hierarchy: BTreeMap::new(),
			connectors: BTreeMap::new(),
			active: None,
			next_id: 1,
		}
	}
}

impl GraphStore {
	/// An empty store whose first node gets id 1.
	pub fn new() -> Self {
		Self::default()
	}

	/// Inserts a node labeled [`PLACEHOLDER_LABEL`] at `position`, attached to
	/// `parent` when one is given.
	///
	/// A dangling parent is rejected before any id is allocated. Fails with
	/// [`GraphError::IdsExhausted`] once the id space is used up.
	pub fn create_node(
		&mut self,
		position: Point,
		parent: Option<NodeId>,
	) -> Result<NodeId, GraphError> {
		let level = match parent {
			Some(p) => self.nodes.get(&p).ok_or(GraphError::UnknownParent(p))?.level + 1,
			None => 1,
		};
		let id = self.allocate_id()?;
		self.nodes.insert(
			id,
			Node {
				id,
				label: PLACEHOLDER_LABEL.to_string(),
				position,
				level,
			},
		);
		if let Some(p) = parent {
			self.link(id, p);
		}
		debug!("created node {id} at ({}, {}) level {level}", position.x, position.y);
		Ok(id)
	}

	/// Overwrites the label of `id`.
	pub fn set_label(&mut self, id: NodeId, label: impl Into<String>) -> Result<(), GraphError> {
		let node = self.nodes.get_mut(&id).ok_or(GraphError::UnknownNode(id))?;
		node.label = label.into();
		Ok(())
	}

	/// Moves a node and re-targets the connectors touching it. The stored
	/// positions of its children stay where they are.
	pub fn move_node(&mut self, id: NodeId, position: Point) -> Result<(), GraphError> {
		let node = self.nodes.get_mut(&id).ok_or(GraphError::UnknownNode(id))?;
		node.position = position;
		for connector in self.connectors.values_mut() {
			if connector.parent == id {
				connector.from = position;
			}
			if connector.child == id {
				connector.to = position;
			}
		}
		Ok(())
	}

	/// Makes `id` the node new children attach to, replacing any previous one.
	pub fn set_active(&mut self, id: NodeId) -> Result<(), GraphError> {
		if !self.nodes.contains_key(&id) {
			return Err(GraphError::UnknownNode(id));
		}
		self.active = Some(id);
		Ok(())
	}

	/// Leaves the store without an active node.
	pub fn clear_active(&mut self) {
		self.active = None;
	}

	/// The node new children attach to, if any.
	pub fn active(&self) -> Option<NodeId> {
		self.active
	}

	/// First node in creation order whose circle contains `point`.
	pub fn find_node_at(&self, point: Point) -> Option<NodeId> {
		self.nodes
			.values()
			.find(|node| node.position.distance_to(point) <= NODE_RADIUS)
			.map(|node| node.id)
	}

	/// Moves `id` and its subtree under `new_parent`, or makes it a root when
	/// `new_parent` is `None`.
	pub fn reparent(&mut self, id: NodeId, new_parent: Option<NodeId>) -> Result<(), GraphError> {
		if !self.nodes.contains_key(&id) {
			return Err(GraphError::UnknownNode(id));
		}
		if let Some(p) = new_parent {
			if !self.nodes.contains_key(&p) {
				return Err(GraphError::UnknownParent(p));
			}
			if self.is_descendant_or_self(p, id) {
				return Err(GraphError::WouldCycle { node: id, parent: p });
			}
		}
		self.unlink(id);
		if let Some(p) = new_parent {
			self.link(id, p);
		}
		self.relevel_from(id);
		debug!("reparented node {id} under {new_parent:?}");
		Ok(())
	}

	/// Deletes a node together with its whole subtree and returns the removed
	/// ids in ascending order.
	pub fn remove_node(&mut self, id: NodeId) -> Result<Vec<NodeId>, GraphError> {
		if !self.nodes.contains_key(&id) {
			return Err(GraphError::UnknownNode(id));
		}
		let mut removed = self.subtree(id);
		removed.sort_unstable();
		for node in &removed {
			self.nodes.remove(node);
			self.unlink(*node);
		}
		if self.active.is_some_and(|a| removed.contains(&a)) {
			self.active = None;
		}
		debug!("removed {} node(s) rooted at {id}", removed.len());
		Ok(removed)
	}

	/// Discards every node and edge. Identifiers keep increasing afterwards.
	pub fn clear(&mut self) {
		self.nodes.clear();
		self.hierarchy.clear();
		self.connectors.clear();
		self.active = None;
	}

	/// Looks up a node by id.
	pub fn node(&self, id: NodeId) -> Option<&Node> {
		self.nodes.get(&id)
	}

	/// Whether a node with this id exists.
	pub fn contains(&self, id: NodeId) -> bool {
		self.nodes.contains_key(&id)
	}

	/// Nodes in creation order.
	pub fn nodes(&self) -> impl Iterator<Item = &Node> {
		self.nodes.values()
	}

	/// Number of nodes.
	pub fn len(&self) -> usize {
		self.nodes.len()
	}

	/// Whether the store holds no nodes.
	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	/// Parent of `id`, or `None` for a root or an unknown id.
	pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
		self.hierarchy.get(&id).copied()
	}

	/// Direct children of `id` in creation order.
	pub fn children_of(&self, id: NodeId) -> Vec<NodeId> {
		self.hierarchy
			.iter()
			.filter(|&(_, parent)| *parent == id)
			.map(|(child, _)| *child)
			.collect()
	}

	/// `(child, parent)` pairs ordered by child id.
	pub fn hierarchy(&self) -> impl Iterator<Item = (NodeId, NodeId)> + '_ {
		self.hierarchy.iter().map(|(c, p)| (*c, *p))
	}

	/// Connector of every edge, ordered by child id.
	pub fn connectors(&self) -> impl Iterator<Item = &Connector> {
		self.connectors.values()
	}

	/// Connector of the edge whose child is `child`.
	pub fn connector(&self, child: NodeId) -> Option<&Connector> {
		self.connectors.get(&child)
	}

	/// Inserts a node read back from a snapshot. Its level is fixed up by
	/// [`GraphStore::relevel_all`] once the edges are in place.
	///
	/// Callers reject `u64::MAX` first; no id past it could ever be allocated.
	pub(crate) fn restore_node(&mut self, id: NodeId, label: String, position: Point) {
		self.next_id = self.next_id.max(id.0.saturating_add(1));
		self.nodes.insert(
			id,
			Node {
				id,
				label,
				position,
				level: 1,
			},
		);
	}

	/// Re-attaches an edge read back from a snapshot.
	pub(crate) fn restore_edge(&mut self, child: NodeId, parent: NodeId) -> Result<(), GraphError> {
		if !self.nodes.contains_key(&child) {
			return Err(GraphError::UnknownNode(child));
		}
		if !self.nodes.contains_key(&parent) {
			return Err(GraphError::UnknownParent(parent));
		}
		if self.is_descendant_or_self(parent, child) {
			return Err(GraphError::WouldCycle {
				node: child,
				parent,
			});
		}
		self.unlink(child);
		self.link(child, parent);
		Ok(())
	}

	pub(crate) fn relevel_all(&mut self) {
		let roots: Vec<NodeId> = self
			.nodes
			.keys()
			.filter(|id| !self.hierarchy.contains_key(id))
			.copied()
			.collect();
		for root in roots {
			self.relevel_from(root);
		}
	}

	fn allocate_id(&mut self) -> Result<NodeId, GraphError> {
		let id = NodeId(self.next_id);
		self.next_id = self.next_id.checked_add(1).ok_or(GraphError::IdsExhausted)?;
		Ok(id)
	}

	fn link(&mut self, child: NodeId, parent: NodeId) {
		let (Some(c), Some(p)) = (self.nodes.get(&child), self.nodes.get(&parent)) else {
			return;
		};
		let connector = Connector {
			parent,
			child,
			from: p.position,
			to: c.position,
		};
		self.hierarchy.insert(child, parent);
		self.connectors.insert(child, connector);
	}

	fn unlink(&mut self, child: NodeId) {
		self.hierarchy.remove(&child);
		self.connectors.remove(&child);
	}

	/// Whether `candidate` is `root` or lies below it.
	fn is_descendant_or_self(&self, candidate: NodeId, root: NodeId) -> bool {
		let mut current = Some(candidate);
		while let Some(id) = current {
			if id == root {
				return true;
			}
			current = self.hierarchy.get(&id).copied();
		}
		false
	}

	fn subtree(&self, root: NodeId) -> Vec<NodeId> {
		let mut out = Vec::new();
		let mut stack = vec![root];
		while let Some(id) = stack.pop() {
			out.push(id);
			stack.extend(self.children_of(id));
		}
		out
	}

	fn relevel_from(&mut self, root: NodeId) {
		let base = self
			.hierarchy
			.get(&root)
			.and_then(|p| self.nodes.get(p))
			.map_or(1, |p| p.level + 1);
		let mut stack = vec![(root, base)];
		while let Some((id, level)) = stack.pop() {
			if let Some(node) = self.nodes.get_mut(&id) {
				node.level = level;
			}
			stack.extend(self.children_of(id).into_iter().map(|c| (c, level + 1)));
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn at(x: f64, y: f64) -> Point {
		Point::new(x, y)
	}

	#[test]
	fn root_node_has_level_one_and_no_edge() {
		let mut store = GraphStore::new();
		let id = store.create_node(at(10.0, 20.0), None).unwrap();

		let node = store.node(id).unwrap();
		assert_eq!(node.level, 1);
		assert_eq!(node.label, PLACEHOLDER_LABEL);
		assert_eq!(node.position, at(10.0, 20.0));
		assert_eq!(store.parent_of(id), None);
		assert_eq!(store.hierarchy().count(), 0);
	}

	#[test]
	fn child_level_follows_parent() {
		let mut store = GraphStore::new();
		let a = store.create_node(at(0.0, 0.0), None).unwrap();
		let b = store.create_node(at(100.0, 0.0), Some(a)).unwrap();
		let c = store.create_node(at(200.0, 0.0), Some(b)).unwrap();

		assert_eq!(store.node(b).unwrap().level, 2);
		assert_eq!(store.node(c).unwrap().level, 3);
		assert_eq!(store.parent_of(c), Some(b));
		assert_eq!(store.children_of(a), vec![b]);
	}

	#[test]
	fn unknown_parent_is_rejected_without_consuming_an_id() {
		let mut store = GraphStore::new();
		let err = store.create_node(at(0.0, 0.0), Some(NodeId(42))).unwrap_err();
		assert_eq!(err, GraphError::UnknownParent(NodeId(42)));
		assert!(store.is_empty());

		let id = store.create_node(at(0.0, 0.0), None).unwrap();
		assert_eq!(id, NodeId(1));
	}

	#[test]
	fn unknown_node_errors() {
		let mut store = GraphStore::new();
		let missing = NodeId(7);
		assert_eq!(store.set_label(missing, "x"), Err(GraphError::UnknownNode(missing)));
		assert_eq!(
			store.move_node(missing, at(1.0, 1.0)),
			Err(GraphError::UnknownNode(missing))
		);
		assert_eq!(store.set_active(missing), Err(GraphError::UnknownNode(missing)));
		assert_eq!(store.active(), None);
	}

	#[test]
	fn set_active_replaces_previous() {
		let mut store = GraphStore::new();
		let a = store.create_node(at(0.0, 0.0), None).unwrap();
		let b = store.create_node(at(100.0, 0.0), None).unwrap();
		store.set_active(a).unwrap();
		store.set_active(b).unwrap();
		assert_eq!(store.active(), Some(b));
		store.clear_active();
		assert_eq!(store.active(), None);
	}

	#[test]
	fn hit_test_prefers_creation_order() {
		let mut store = GraphStore::new();
		let first = store.create_node(at(100.0, 100.0), None).unwrap();
		let _second = store.create_node(at(120.0, 100.0), None).unwrap();

		assert_eq!(store.find_node_at(at(110.0, 100.0)), Some(first));
		assert_eq!(store.find_node_at(at(100.0 + NODE_RADIUS, 100.0)), Some(first));
		assert_eq!(store.find_node_at(at(400.0, 400.0)), None);
	}

	#[test]
	fn moving_a_parent_updates_connectors_only() {
		let mut store = GraphStore::new();
		let parent = store.create_node(at(0.0, 0.0), None).unwrap();
		let left = store.create_node(at(-50.0, 80.0), Some(parent)).unwrap();
		let right = store.create_node(at(50.0, 80.0), Some(parent)).unwrap();

		store.move_node(parent, at(10.0, -10.0)).unwrap();

		for child in [left, right] {
			let connector = store.connector(child).unwrap();
			assert_eq!(connector.from, at(10.0, -10.0));
			assert_eq!(connector.to, store.node(child).unwrap().position);
		}
		assert_eq!(store.node(left).unwrap().position, at(-50.0, 80.0));
		assert_eq!(store.node(right).unwrap().position, at(50.0, 80.0));
	}

	#[test]
	fn moving_a_child_updates_its_connector_end() {
		let mut store = GraphStore::new();
		let parent = store.create_node(at(0.0, 0.0), None).unwrap();
		let child = store.create_node(at(0.0, 100.0), Some(parent)).unwrap();

		store.move_node(child, at(30.0, 130.0)).unwrap();

		let connector = store.connector(child).unwrap();
		assert_eq!(connector.from, at(0.0, 0.0));
		assert_eq!(connector.to, at(30.0, 130.0));
	}

	#[test]
	fn reparent_relevels_subtree() {
		let mut store = GraphStore::new();
		let a = store.create_node(at(0.0, 0.0), None).unwrap();
		let b = store.create_node(at(0.0, 100.0), None).unwrap();
		let c = store.create_node(at(0.0, 200.0), Some(b)).unwrap();

		store.reparent(b, Some(a)).unwrap();
		assert_eq!(store.node(b).unwrap().level, 2);
		assert_eq!(store.node(c).unwrap().level, 3);
		assert_eq!(store.connector(b).unwrap().from, at(0.0, 0.0));

		store.reparent(b, None).unwrap();
		assert_eq!(store.node(b).unwrap().level, 1);
		assert_eq!(store.node(c).unwrap().level, 2);
		assert!(store.connector(b).is_none());
	}

	#[test]
	fn reparent_rejects_cycles() {
		let mut store = GraphStore::new();
		let a = store.create_node(at(0.0, 0.0), None).unwrap();
		let b = store.create_node(at(0.0, 100.0), Some(a)).unwrap();

		assert_eq!(
			store.reparent(a, Some(b)),
			Err(GraphError::WouldCycle { node: a, parent: b })
		);
		assert_eq!(
			store.reparent(a, Some(a)),
			Err(GraphError::WouldCycle { node: a, parent: a })
		);
		assert_eq!(store.parent_of(a), None);
	}

	#[test]
	fn remove_node_drops_subtree_and_active() {
		let mut store = GraphStore::new();
		let a = store.create_node(at(0.0, 0.0), None).unwrap();
		let b = store.create_node(at(0.0, 100.0), Some(a)).unwrap();
		let c = store.create_node(at(0.0, 200.0), Some(b)).unwrap();
		let d = store.create_node(at(100.0, 100.0), Some(a)).unwrap();
		store.set_active(c).unwrap();

		let removed = store.remove_node(b).unwrap();
		assert_eq!(removed, vec![b, c]);
		assert_eq!(store.active(), None);
		assert_eq!(store.len(), 2);
		assert!(store.connector(b).is_none());
		assert!(store.connector(c).is_none());
		assert_eq!(store.children_of(a), vec![d]);
	}

	#[test]
	fn exhausted_ids_are_an_error_not_a_reuse() {
		let mut store = GraphStore::new();
		let last = NodeId(u64::MAX - 1);
		store.restore_node(last, "last".to_string(), at(0.0, 0.0));

		assert_eq!(
			store.create_node(at(100.0, 0.0), None),
			Err(GraphError::IdsExhausted)
		);
		assert_eq!(store.len(), 1);
		assert_eq!(store.node(last).unwrap().label, "last");
	}

	#[test]
	fn clear_keeps_ids_monotonic() {
		let mut store = GraphStore::new();
		store.create_node(at(0.0, 0.0), None).unwrap();
		store.clear();
		assert!(store.is_empty());
		assert_eq!(store.create_node(at(0.0, 0.0), None).unwrap(), NodeId(2));
	}
}
