//! Schedule store client.
//!
//! # Responsibility
//! - Bind one `DocumentPath` to a `DocumentBackend`.
//! - Translate backend snapshots into `Option<Schedule>` for subscribers.
//! - Apply the write failure policy: log and swallow for fire-and-forget
//!   writes, report for callers that must answer (HTTP surface).
//!
//! # Invariants
//! - A subscriber never sees a revision older than one already delivered.
//! - Dropping a `Subscription` terminates its channel.

use super::backend::{DocumentBackend, DocumentSnapshot, WatchEvent, WatchId};
use super::config::StoreConfig;
use super::payload::{decode_document, encode_document, DocumentState};
use super::sqlite_backend::SqliteDocumentBackend;
use super::{DocumentPath, StoreError, StoreResult};
use crate::model::schedule::Schedule;
use log::{debug, error, info, warn};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

type DataHandler = Box<dyn Fn(Option<Schedule>) + Send + Sync>;
type ErrorHandler = Box<dyn Fn(StoreError) + Send + Sync>;

/// Client for the single schedule document.
pub struct ScheduleStoreClient {
    backend: Arc<dyn DocumentBackend>,
    path: DocumentPath,
}

impl ScheduleStoreClient {
    /// Creates a client over an existing backend.
    pub fn new(backend: Arc<dyn DocumentBackend>, path: DocumentPath) -> Self {
        Self { backend, path }
    }

    /// Opens the SQLite document store described by `config`.
    ///
    /// # Errors
    /// - Returns `StoreError::Db` when the database cannot be opened or
    ///   migrated.
    pub fn connect(config: &StoreConfig) -> StoreResult<Self> {
        let started_at = Instant::now();
        let path = config.document_path();
        match SqliteDocumentBackend::open(&config.database_path) {
            Ok(backend) => {
                info!(
                    "event=store_connect module=store status=ok path={path} client={} duration_ms={}",
                    config.client_email,
                    started_at.elapsed().as_millis()
                );
                Ok(Self::new(Arc::new(backend), path))
            }
            Err(err) => {
                error!(
                    "event=store_connect module=store status=error path={path} duration_ms={} error={err}",
                    started_at.elapsed().as_millis()
                );
                Err(err)
            }
        }
    }

    pub fn path(&self) -> &DocumentPath {
        &self.path
    }

    /// Reads and classifies the current document.
    pub fn fetch(&self) -> StoreResult<DocumentState> {
        let snapshot = self.backend.read(&self.path)?;
        Ok(decode_document(snapshot.body.as_ref()))
    }

    /// Persists `schedule` as the whole document, reporting failures.
    pub fn try_write(&self, schedule: &Schedule) -> StoreResult<()> {
        let started_at = Instant::now();
        let result = encode_document(schedule)
            .and_then(|body| self.backend.write(&self.path, &body));
        match &result {
            Ok(()) => debug!(
                "event=schedule_write module=store status=ok path={} stars={} duration_ms={}",
                self.path,
                schedule.total_stars(),
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event=schedule_write module=store status=error path={} duration_ms={} error={err}",
                self.path,
                started_at.elapsed().as_millis()
            ),
        }
        result
    }

    /// Persists `schedule`; failures are logged and dropped.
    ///
    /// There is no retry. The next successful snapshot re-establishes
    /// consistency.
    pub fn write(&self, schedule: &Schedule) {
        let _ = self.try_write(schedule);
    }

    /// Opens a live channel to the document.
    ///
    /// `on_data` receives the current state right away and after every
    /// change: `Some` for a usable schedule, `None` when the document is
    /// absent, empty or malformed. `on_error` receives channel failures,
    /// including failure to read the initial state.
    ///
    /// Handlers run without any client lock held and may write through the
    /// same client; the resulting snapshot is delivered after the handler
    /// returns. Handlers should not block, since they run on the writer's
    /// thread.
    pub fn subscribe(
        &self,
        on_data: impl Fn(Option<Schedule>) + Send + Sync + 'static,
        on_error: impl Fn(StoreError) + Send + Sync + 'static,
    ) -> Subscription {
        let gate = Arc::new(SnapshotGate::new(
            self.path.clone(),
            Box::new(on_data),
            Box::new(on_error),
        ));

        let watcher_gate = Arc::clone(&gate);
        let watch_id = match self.backend.watch(
            &self.path,
            Box::new(move |event| watcher_gate.deliver(event)),
        ) {
            Ok(id) => id,
            Err(err) => {
                error!(
                    "event=schedule_subscribe module=store status=error path={} error={err}",
                    self.path
                );
                (gate.on_error)(err);
                return Subscription {
                    backend: Arc::clone(&self.backend),
                    watch_id: None,
                };
            }
        };

        // Registered before the initial read so no write can fall between
        // the two; the revision gate drops whichever copy arrives second.
        match self.backend.read(&self.path) {
            Ok(snapshot) => gate.deliver(WatchEvent::Changed(snapshot)),
            Err(err) => gate.deliver(WatchEvent::Failed(err)),
        }
        info!(
            "event=schedule_subscribe module=store status=ok path={} watch_id={}",
            self.path, watch_id.0
        );

        Subscription {
            backend: Arc::clone(&self.backend),
            watch_id: Some(watch_id),
        }
    }
}

struct SnapshotGate {
    path: DocumentPath,
    state: Mutex<GateState>,
    on_data: DataHandler,
    on_error: ErrorHandler,
}

#[derive(Default)]
struct GateState {
    last_revision: Option<u64>,
    queue: VecDeque<Delivery>,
    draining: bool,
}

enum Delivery {
    Data(Option<Schedule>),
    Failure(StoreError),
}

impl SnapshotGate {
    fn new(path: DocumentPath, on_data: DataHandler, on_error: ErrorHandler) -> Self {
        Self {
            path,
            state: Mutex::new(GateState::default()),
            on_data,
            on_error,
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, GateState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Filters `event` by revision and queues it for the handlers.
    ///
    /// Handlers run with no lock held. A delivery arriving while another one
    /// is being handed out (including from inside a handler) is queued and
    /// handed out by that same loop, so order is kept without re-entering.
    fn deliver(&self, event: WatchEvent) {
        let (revision, delivery) = match event {
            WatchEvent::Changed(DocumentSnapshot { body, revision }) => (
                Some(revision),
                Delivery::Data(self.classify(body.as_ref(), revision)),
            ),
            WatchEvent::Failed(err) => {
                warn!(
                    "event=schedule_snapshot module=store status=error path={} error={err}",
                    self.path
                );
                (None, Delivery::Failure(err))
            }
        };

        {
            let mut state = self.lock_state();
            if let Some(revision) = revision {
                if state.last_revision.is_some_and(|last| revision <= last) {
                    debug!(
                        "event=schedule_snapshot module=store status=skipped path={} revision={revision}",
                        self.path
                    );
                    return;
                }
                state.last_revision = Some(revision);
            }
            state.queue.push_back(delivery);
            if state.draining {
                return;
            }
            state.draining = true;
        }

        loop {
            let next = {
                let mut state = self.lock_state();
                let next = state.queue.pop_front();
                if next.is_none() {
                    state.draining = false;
                }
                next
            };
            match next {
                Some(Delivery::Data(schedule)) => (self.on_data)(schedule),
                Some(Delivery::Failure(err)) => (self.on_error)(err),
                None => break,
            }
        }
    }

    fn classify(&self, body: Option<&Value>, revision: u64) -> Option<Schedule> {
        let state = decode_document(body);
        match &state {
            DocumentState::Malformed(reason) => warn!(
                "event=schedule_snapshot module=store status=malformed path={} revision={revision} reason={reason}",
                self.path
            ),
            other => debug!(
                "event=schedule_snapshot module=store status={} path={} revision={revision}",
                other.label(),
                self.path
            ),
        }
        state.into_schedule()
    }
}

/// Handle of a live document channel.
pub struct Subscription {
    backend: Arc<dyn DocumentBackend>,
    watch_id: Option<WatchId>,
}

impl Subscription {
    pub fn is_active(&self) -> bool {
        self.watch_id.is_some()
    }

    /// Terminates the channel. Also performed on drop.
    pub fn unsubscribe(mut self) {
        self.cancel();
    }

    fn cancel(&mut self) {
        if let Some(id) = self.watch_id.take() {
            self.backend.unwatch(id);
            debug!("event=schedule_unsubscribe module=store status=ok watch_id={}", id.0);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}
