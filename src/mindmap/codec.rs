use std::collections::BTreeMap;
use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};

use super::error::{GraphError, LoadWarning, SnapshotError};
use super::store::GraphStore;
use super::types::{NodeId, Point};

/// On-disk shape: `{ "nodes": { "<id>": {...} }, "hierarchy": { "<child>": <parent> } }`.
///
/// Unknown fields are ignored so older builds can read newer snapshots.
#[derive(Serialize, Deserialize)]
struct Snapshot {
	nodes: BTreeMap<NodeId, NodeRecord>,
	#[serde(default)]
	hierarchy: BTreeMap<NodeId, NodeId>,
}

#[derive(Serialize, Deserialize)]
struct NodeRecord {
	label: String,
	x: f64,
	y: f64,
	level: NonZeroU32,
}

/// How much of a snapshot survived loading.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadState {
	/// No snapshot, or nothing usable in it.
	Empty,
	/// Nodes restored but some edges were dropped.
	Partial,
	/// Everything restored.
	Full,
}

/// Result of reading a snapshot back. Loading never fails outright; problems
/// are reported through `warnings`.
#[derive(Debug)]
pub struct Loaded {
	/// Everything that could be restored.
	pub store: GraphStore,
	/// Problems met along the way, in the order found.
	pub warnings: Vec<LoadWarning>,
	/// Summary of how much survived.
	pub state: LoadState,
}

impl Loaded {
	/// The first-run case: an empty store and nothing to report.
	pub fn empty() -> Self {
		Self {
			store: GraphStore::new(),
			warnings: Vec::new(),
			state: LoadState::Empty,
		}
	}

	pub(crate) fn empty_with(warning: LoadWarning) -> Self {
		Self {
			warnings: vec![warning],
			..Self::empty()
		}
	}
}

/// Encodes the whole store as pretty-printed JSON. Keys come out in ascending
/// id order, so equal stores always produce identical text.
pub fn serialize(store: &GraphStore) -> Result<String, SnapshotError> {
	let nodes = store
		.nodes()
		.map(|node| {
			let record = NodeRecord {
				label: node.label.clone(),
				x: node.position.x,
				y: node.position.y,
				level: NonZeroU32::new(node.level).unwrap_or(NonZeroU32::MIN),
			};
			(node.id, record)
		})
		.collect();
	let snapshot = Snapshot {
		nodes,
		hierarchy: store.hierarchy().collect(),
	};
	Ok(serde_json::to_string_pretty(&snapshot)?)
}

/// Rebuilds a store from snapshot text: nodes first, then edges.
///
/// Edges with a missing endpoint or that would close a cycle are dropped with
/// a warning. Levels are recomputed from the surviving hierarchy. Text that
/// does not parse yields an empty store and a single warning.
pub fn deserialize(text: &str) -> Loaded {
	let snapshot: Snapshot = match serde_json::from_str(text) {
		Ok(snapshot) => snapshot,
		Err(e) => return Loaded::empty_with(LoadWarning::SnapshotCorrupt(e.to_string())),
	};

	// The store allocates ids past the largest one it holds, so the top id is unusable.
	if snapshot.nodes.contains_key(&NodeId(u64::MAX)) {
		return Loaded::empty_with(LoadWarning::SnapshotCorrupt(format!(
			"node id {} is out of range",
			u64::MAX
		)));
	}

	let mut store = GraphStore::new();
	for (id, record) in snapshot.nodes {
		store.restore_node(id, record.label, Point::new(record.x, record.y));
	}

	let mut warnings = Vec::new();
	for (child, parent) in snapshot.hierarchy {
		match store.restore_edge(child, parent) {
			Ok(()) => {}
			Err(GraphError::WouldCycle { .. }) => {
				warnings.push(LoadWarning::CyclicEdge { child, parent });
			}
			Err(_) => warnings.push(LoadWarning::DanglingEdge { child, parent }),
		}
	}
	store.relevel_all();

	let state = if warnings.is_empty() {
		LoadState::Full
	} else {
		LoadState::Partial
	};
	Loaded {
		store,
		warnings,
		state,
	}
}
