use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use log::{info, warn};

use super::codec::{self, LoadState, Loaded};
use super::error::{LoadWarning, SnapshotError};
use super::store::GraphStore;

/// File name (or storage key) a snapshot lives under unless told otherwise.
pub const DEFAULT_SNAPSHOT_NAME: &str = "mindmap.json";

/// Somewhere a snapshot can be read from and overwritten.
pub trait SnapshotStore {
	/// Returns `Ok(None)` when no snapshot has been written yet.
	fn read(&self) -> Result<Option<String>, SnapshotError>;

	/// Replaces the stored snapshot wholesale.
	fn write(&self, contents: &str) -> Result<(), SnapshotError>;
}

/// Snapshot kept in a single file.
#[derive(Clone, Debug)]
pub struct FileSnapshot {
	path: PathBuf,
}

impl FileSnapshot {
	/// A snapshot stored at `path`.
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	/// Location of the snapshot file.
	pub fn path(&self) -> &Path {
		&self.path
	}
}

impl Default for FileSnapshot {
	/// `mindmap.json` in the working directory.
	fn default() -> Self {
		Self::new(DEFAULT_SNAPSHOT_NAME)
	}
}

impl SnapshotStore for FileSnapshot {
	fn read(&self) -> Result<Option<String>, SnapshotError> {
		match fs::read_to_string(&self.path) {
			Ok(text) => Ok(Some(text)),
			Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
			Err(e) => Err(e.into()),
		}
	}

	fn write(&self, contents: &str) -> Result<(), SnapshotError> {
		let mut file = fs::File::create(&self.path)?;
		file.write_all(contents.as_bytes())?;
		file.sync_all()?;
		Ok(())
	}
}

/// Snapshot kept under a key in the browser's `localStorage`.
#[derive(Clone, Debug)]
pub struct LocalStorageSnapshot {
	key: String,
}

impl LocalStorageSnapshot {
	/// A snapshot stored under `key`.
	pub fn new(key: impl Into<String>) -> Self {
		Self { key: key.into() }
	}

	fn storage() -> Result<web_sys::Storage, SnapshotError> {
		web_sys::window()
			.ok_or_else(|| SnapshotError::storage("no window"))?
			.local_storage()
			.map_err(|e| SnapshotError::storage(format!("{e:?}")))?
			.ok_or_else(|| SnapshotError::storage("localStorage unavailable"))
	}
}

impl Default for LocalStorageSnapshot {
	fn default() -> Self {
		Self::new(DEFAULT_SNAPSHOT_NAME)
	}
}

impl SnapshotStore for LocalStorageSnapshot {
	fn read(&self) -> Result<Option<String>, SnapshotError> {
		Self::storage()?
			.get_item(&self.key)
			.map_err(|e| SnapshotError::storage(format!("{e:?}")))
	}

	fn write(&self, contents: &str) -> Result<(), SnapshotError> {
		Self::storage()?
			.set_item(&self.key, contents)
			.map_err(|e| SnapshotError::storage(format!("{e:?}")))
	}
}

/// Reads and decodes the snapshot held by `backend`.
///
/// Never fails: a missing snapshot is the first-run case and yields an empty
/// store silently, an unreadable or corrupt one yields an empty store plus a
/// warning. Every warning is logged.
pub fn load(backend: &impl SnapshotStore) -> Loaded {
	let loaded = match backend.read() {
		Ok(Some(text)) => codec::deserialize(&text),
		Ok(None) => {
			info!("no snapshot found, starting with an empty map");
			return Loaded::empty();
		}
		Err(e) => Loaded::empty_with(LoadWarning::SnapshotUnreadable(e.to_string())),
	};
	for warning in &loaded.warnings {
		warn!("{warning}");
	}
	match loaded.state {
		LoadState::Full => info!("loaded {} node(s)", loaded.store.len()),
		LoadState::Partial => info!(
			"loaded {} node(s), dropped {} edge(s)",
			loaded.store.len(),
			loaded.warnings.len()
		),
		LoadState::Empty => info!("snapshot unusable, starting with an empty map"),
	}
	loaded
}

/// Encodes `store` and overwrites the snapshot held by `backend`.
pub fn save(store: &GraphStore, backend: &impl SnapshotStore) -> Result<(), SnapshotError> {
	let text = codec::serialize(store)?;
	backend.write(&text)?;
	info!("saved {} node(s)", store.len());
	Ok(())
}
