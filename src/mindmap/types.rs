use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a node, allocated by [`GraphStore`](super::GraphStore).
///
/// Identifiers increase monotonically, so ordering by id is creation order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "#{}", self.0)
	}
}

/// A position in canvas space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
	/// Horizontal coordinate, growing to the right.
	pub x: f64,
	/// Vertical coordinate, growing downwards.
	pub y: f64,
}

impl Point {
	/// A point at `(x, y)`.
	pub const fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}

	/// Euclidean distance between two points.
	pub fn distance_to(self, other: Point) -> f64 {
		let (dx, dy) = (self.x - other.x, self.y - other.y);
		(dx * dx + dy * dy).sqrt()
	}
}

/// One mind-map entry.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
	/// Identifier assigned at creation.
	pub id: NodeId,
	/// Text drawn inside the node.
	pub label: String,
	/// Center of the node in canvas space.
	pub position: Point,
	/// Depth in the hierarchy, roots are level 1.
	pub level: u32,
}

/// The drawn line of one hierarchy edge, running from the parent to the child.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Connector {
	/// Upper end of the edge.
	pub parent: NodeId,
	/// Lower end of the edge, also the connector's key.
	pub child: NodeId,
	/// Current position of the parent.
	pub from: Point,
	/// Current position of the child.
	pub to: Point,
}
