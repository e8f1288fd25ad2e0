use thiserror::Error;

use super::types::NodeId;

/// Rejected graph store operation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GraphError {
	/// The operation named a node that does not exist.
	#[error("unknown node {0}")]
	UnknownNode(NodeId),
	/// A new or moved node named a parent that does not exist.
	#[error("unknown parent {0}")]
	UnknownParent(NodeId),
	/// `parent` lies inside the subtree of `node`.
	#[error("attaching {node} under {parent} would create a cycle")]
	WouldCycle {
		/// Node being attached.
		node: NodeId,
		/// Requested parent.
		parent: NodeId,
	},
	/// No identifier is left to hand out.
	#[error("node identifiers exhausted")]
	IdsExhausted,
}

/// Failure to read, write or encode a snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
	/// Reading or writing the snapshot file failed.
	#[error("snapshot i/o error: {0}")]
	Io(#[from] std::io::Error),
	/// The store could not be encoded.
	#[error("snapshot encoding error: {0}")]
	Encode(#[from] serde_json::Error),
	/// The browser storage refused the request.
	#[error("snapshot storage error: {0}")]
	Storage(String),
}

impl SnapshotError {
	/// A [`SnapshotError::Storage`] with the given message.
	pub fn storage<T: Into<String>>(msg: T) -> Self {
		SnapshotError::Storage(msg.into())
	}
}

/// Recoverable problem found while loading a snapshot.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LoadWarning {
	/// The snapshot exists but reading it failed.
	#[error("snapshot could not be read: {0}")]
	SnapshotUnreadable(String),
	/// The snapshot text did not decode.
	#[error("snapshot is corrupt: {0}")]
	SnapshotCorrupt(String),
	/// An edge named a node absent from the snapshot.
	#[error("dropped edge {child} -> {parent}: endpoint missing")]
	DanglingEdge {
		/// Child end of the dropped edge.
		child: NodeId,
		/// Parent end of the dropped edge.
		parent: NodeId,
	},
	/// An edge would have closed a cycle.
	#[error("dropped edge {child} -> {parent}: would create a cycle")]
	CyclicEdge {
		/// Child end of the dropped edge.
		child: NodeId,
		/// Parent end of the dropped edge.
		parent: NodeId,
	},
}
