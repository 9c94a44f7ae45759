//! Document backend contract.
//!
//! A backend stores JSON documents by `DocumentPath` and pushes change
//! notifications to watchers. `ScheduleStoreClient` is the only caller in
//! core; tests substitute their own implementations.

use super::{DocumentPath, StoreError, StoreResult};
use serde_json::Value;

/// Identifies one registered watcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatchId(pub u64);

/// Document content at a given revision.
///
/// Revisions grow with every committed write of a backend instance, so a
/// consumer can discard notifications older than content it already has.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentSnapshot {
    pub body: Option<Value>,
    pub revision: u64,
}

/// Event pushed to a watcher.
#[derive(Debug)]
pub enum WatchEvent {
    Changed(DocumentSnapshot),
    /// The live channel broke; no further events should be expected.
    Failed(StoreError),
}

pub type WatchCallback = Box<dyn Fn(WatchEvent) + Send + Sync>;

/// Storage/transport seam for the remote document store.
pub trait DocumentBackend: Send + Sync {
    fn read(&self, path: &DocumentPath) -> StoreResult<DocumentSnapshot>;

    /// Replaces the document body and notifies watchers of `path`.
    fn write(&self, path: &DocumentPath, body: &Value) -> StoreResult<()>;

    /// Registers `callback` for changes of `path`.
    ///
    /// Callbacks may run on the writer's thread and must not block.
    fn watch(&self, path: &DocumentPath, callback: WatchCallback) -> StoreResult<WatchId>;

    /// Removes a watcher. Unknown ids are ignored.
    fn unwatch(&self, id: WatchId);
}
