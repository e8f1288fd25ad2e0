//! Mind-map core: the graph store, its JSON snapshot codec and snapshot backends.
//!
//! Nothing in here touches the DOM except [`LocalStorageSnapshot`], so the
//! whole module is exercised by native tests.

mod codec;
mod error;
mod persist;
mod store;
mod types;

pub use codec::{LoadState, Loaded, deserialize, serialize};
pub use error::{GraphError, LoadWarning, SnapshotError};
pub use persist::{
	DEFAULT_SNAPSHOT_NAME, FileSnapshot, LocalStorageSnapshot, SnapshotStore, load, save,
};
pub use store::{GraphStore, NODE_RADIUS, PLACEHOLDER_LABEL};
pub use types::{Connector, Node, NodeId, Point};
