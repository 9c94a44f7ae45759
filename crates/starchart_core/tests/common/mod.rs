#![allow(dead_code)]

use serde_json::Value;
use starchart_core::{
    BounceSpeed, CosmeticTags, DocumentBackend, DocumentPath, DocumentSnapshot,
    ScheduleStoreClient, SqliteDocumentBackend, StarColor, StoreError, StoreResult, TagSource,
    WatchCallback, WatchId,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

pub const TEAL_SLOW: CosmeticTags = CosmeticTags {
    color: StarColor::Teal,
    bounce_speed: BounceSpeed::Slow,
};

pub fn document_path() -> DocumentPath {
    DocumentPath::new("test-project", "starCharts", "cormacWeeklySchedule")
}

/// Always returns the same tags.
pub struct FixedTags(pub CosmeticTags);

impl TagSource for FixedTags {
    fn pick_color(&mut self) -> StarColor {
        self.0.color
    }

    fn pick_bounce_speed(&mut self) -> BounceSpeed {
        self.0.bounce_speed
    }
}

/// In-memory SQLite backend with switchable failures and a write counter.
pub struct FlakyBackend {
    inner: SqliteDocumentBackend,
    pub fail_reads: AtomicBool,
    pub fail_writes: AtomicBool,
    pub fail_watch: AtomicBool,
    writes: AtomicUsize,
}

impl FlakyBackend {
    pub fn new() -> Self {
        Self {
            inner: SqliteDocumentBackend::open_in_memory().unwrap(),
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
            fail_watch: AtomicBool::new(false),
            writes: AtomicUsize::new(0),
        }
    }

    pub fn successful_writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn watcher_count(&self) -> usize {
        self.inner.watcher_count()
    }
}

impl DocumentBackend for FlakyBackend {
    fn read(&self, path: &DocumentPath) -> StoreResult<DocumentSnapshot> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("read refused".to_string()));
        }
        self.inner.read(path)
    }

    fn write(&self, path: &DocumentPath, body: &Value) -> StoreResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("write refused".to_string()));
        }
        self.inner.write(path, body)?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn watch(&self, path: &DocumentPath, callback: WatchCallback) -> StoreResult<WatchId> {
        if self.fail_watch.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("watch refused".to_string()));
        }
        self.inner.watch(path, callback)
    }

    fn unwatch(&self, id: WatchId) {
        self.inner.unwatch(id);
    }
}

pub fn client_over(backend: &Arc<FlakyBackend>) -> Arc<ScheduleStoreClient> {
    let backend: Arc<dyn DocumentBackend> = backend.clone();
    Arc::new(ScheduleStoreClient::new(backend, document_path()))
}
