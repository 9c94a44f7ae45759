//! SQLite-backed document backend.
//!
//! # Responsibility
//! - Persist one JSON body per `DocumentPath` in the `documents` table.
//! - Fan out change notifications to in-process watchers after commit.
//!
//! # Invariants
//! - Writes are upserts; the stored body is always the last written value.
//! - Watcher callbacks run after every internal lock has been released.
//! - Revisions are process-local and only compared within one instance.

use super::backend::{DocumentBackend, DocumentSnapshot, WatchCallback, WatchEvent, WatchId};
use super::{DocumentPath, StoreError, StoreResult};
use crate::db::{open_db, open_db_in_memory};
use log::{debug, warn};
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

struct Inner {
    conn: Connection,
    revision: u64,
}

struct Watcher {
    id: WatchId,
    path: DocumentPath,
    callback: Arc<dyn Fn(WatchEvent) + Send + Sync>,
}

/// Document backend over a migrated SQLite connection.
pub struct SqliteDocumentBackend {
    inner: Mutex<Inner>,
    watchers: Mutex<Vec<Watcher>>,
    next_watch_id: AtomicU64,
}

impl SqliteDocumentBackend {
    /// Wraps a connection returned by `open_db`/`open_db_in_memory`.
    pub fn new(conn: Connection) -> Self {
        Self {
            inner: Mutex::new(Inner { conn, revision: 0 }),
            watchers: Mutex::new(Vec::new()),
            next_watch_id: AtomicU64::new(1),
        }
    }

    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Ok(Self::new(open_db(path)?))
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        Ok(Self::new(open_db_in_memory()?))
    }

    /// Number of currently registered watchers.
    pub fn watcher_count(&self) -> usize {
        self.watchers.lock().map_or(0, |watchers| watchers.len())
    }

    fn lock_inner(&self) -> StoreResult<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| StoreError::LockPoisoned("connection"))
    }

    fn lock_watchers(&self) -> StoreResult<MutexGuard<'_, Vec<Watcher>>> {
        self.watchers
            .lock()
            .map_err(|_| StoreError::LockPoisoned("watchers"))
    }

    fn notify(&self, path: &DocumentPath, snapshot: DocumentSnapshot) {
        let callbacks = match self.lock_watchers() {
            Ok(watchers) => watchers
                .iter()
                .filter(|watcher| &watcher.path == path)
                .map(|watcher| Arc::clone(&watcher.callback))
                .collect::<Vec<_>>(),
            Err(err) => {
                warn!("event=doc_notify module=store status=error error={err}");
                return;
            }
        };

        debug!(
            "event=doc_notify module=store status=ok path={path} revision={} watchers={}",
            snapshot.revision,
            callbacks.len()
        );
        for callback in callbacks {
            callback(WatchEvent::Changed(snapshot.clone()));
        }
    }
}

impl DocumentBackend for SqliteDocumentBackend {
    fn read(&self, path: &DocumentPath) -> StoreResult<DocumentSnapshot> {
        let inner = self.lock_inner()?;
        let body_text = inner
            .conn
            .query_row(
                "SELECT body FROM documents
                 WHERE project_id = ?1 AND collection = ?2 AND document_id = ?3;",
                params![path.project_id, path.collection, path.document_id],
                |row| row.get::<_, String>(0),
            )
            .optional()?;

        let body = body_text
            .map(|text| serde_json::from_str::<Value>(&text))
            .transpose()?;
        Ok(DocumentSnapshot {
            body,
            revision: inner.revision,
        })
    }

    fn write(&self, path: &DocumentPath, body: &Value) -> StoreResult<()> {
        let body_text = serde_json::to_string(body)?;
        let revision = {
            let mut inner = self.lock_inner()?;
            inner.conn.execute(
                "INSERT INTO documents (project_id, collection, document_id, body)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT (project_id, collection, document_id) DO UPDATE SET
                    body = excluded.body,
                    updated_at = (strftime('%s', 'now') * 1000);",
                params![path.project_id, path.collection, path.document_id, body_text],
            )?;
            inner.revision += 1;
            inner.revision
        };

        self.notify(
            path,
            DocumentSnapshot {
                body: Some(body.clone()),
                revision,
            },
        );
        Ok(())
    }

    fn watch(&self, path: &DocumentPath, callback: WatchCallback) -> StoreResult<WatchId> {
        let id = WatchId(self.next_watch_id.fetch_add(1, Ordering::Relaxed));
        self.lock_watchers()?.push(Watcher {
            id,
            path: path.clone(),
            callback: Arc::from(callback),
        });
        debug!("event=doc_watch module=store status=ok path={path} watch_id={}", id.0);
        Ok(id)
    }

    fn unwatch(&self, id: WatchId) {
        match self.lock_watchers() {
            Ok(mut watchers) => watchers.retain(|watcher| watcher.id != id),
            Err(err) => warn!("event=doc_unwatch module=store status=error error={err}"),
        }
    }
}
