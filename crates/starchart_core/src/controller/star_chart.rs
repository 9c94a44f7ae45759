//! Star chart state controller.
//!
//! # Responsibility
//! - Hold the schedule rendered by the chart and its `Loading -> Ready` phase.
//! - Apply local mutations optimistically and queue them for the store.
//! - Reconcile snapshots pushed by the store subscription.
//!
//! # Invariants
//! - Mutations run synchronously against memory; store I/O only happens in
//!   `process_events` (or `shutdown`).
//! - The last applied snapshot wins; there is no merge or versioning between
//!   local writes and remote echoes.
//! - Subscription callbacks only enqueue events, so they may fire on any
//!   thread without touching controller state.

use super::celebration::{Celebration, CELEBRATION_DURATION};
use super::clock::{Clock, SystemClock};
use super::tags::{RandomTagSource, TagSource};
use crate::model::progress::{StarProgress, PRIZE_TARGET};
use crate::model::schedule::{Day, Schedule, ScheduleError};
use crate::store::client::{ScheduleStoreClient, Subscription};
use crate::store::StoreError;
use log::{debug, info, warn};
use std::collections::VecDeque;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;

/// Controller lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Waiting for the first snapshot; the chart shows a placeholder.
    Loading,
    Ready,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerError {
    /// Mutation attempted before the first snapshot was processed.
    NotReady,
    Schedule(ScheduleError),
}

impl Display for ControllerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotReady => write!(f, "schedule is still loading"),
            Self::Schedule(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ControllerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::NotReady => None,
            Self::Schedule(err) => Some(err),
        }
    }
}

impl From<ScheduleError> for ControllerError {
    fn from(value: ScheduleError) -> Self {
        Self::Schedule(value)
    }
}

enum SyncEvent {
    Snapshot(Option<Schedule>),
    Failed(StoreError),
}

/// Owns chart state and keeps it in step with the schedule store.
pub struct StarChartController {
    phase: Phase,
    schedule: Schedule,
    hide_weekends: bool,
    celebration: Celebration,
    store: Option<Arc<ScheduleStoreClient>>,
    subscription: Option<Subscription>,
    events: Receiver<SyncEvent>,
    pending_writes: VecDeque<Schedule>,
    tags: Box<dyn TagSource>,
    clock: Arc<dyn Clock>,
}

impl StarChartController {
    /// Starts the controller and subscribes to `store`.
    ///
    /// An absent store (initialization failed earlier) is handled like a
    /// subscription error: the default schedule is adopted, not written, and
    /// the controller is ready immediately.
    pub fn start(
        store: Option<Arc<ScheduleStoreClient>>,
        tags: Box<dyn TagSource>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let (sender, events) = mpsc::channel();
        let mut controller = Self {
            phase: Phase::Loading,
            schedule: Schedule::default_week(),
            hide_weekends: true,
            celebration: Celebration::new(PRIZE_TARGET, CELEBRATION_DURATION),
            store,
            subscription: None,
            events,
            pending_writes: VecDeque::new(),
            tags,
            clock,
        };

        match controller.store.clone() {
            Some(store) => {
                let data_sender = sender.clone();
                let subscription = store.subscribe(
                    move |snapshot| {
                        let _ = data_sender.send(SyncEvent::Snapshot(snapshot));
                    },
                    move |err| {
                        let _ = sender.send(SyncEvent::Failed(err));
                    },
                );
                controller.subscription = Some(subscription);
            }
            None => {
                warn!("event=chart_start module=controller status=degraded reason=store_unavailable");
                controller.phase = Phase::Ready;
            }
        }

        controller
    }

    /// Starts with entropy-seeded tags and wall-clock time.
    pub fn with_defaults(store: Option<Arc<ScheduleStoreClient>>) -> Self {
        Self::start(
            store,
            Box::new(RandomTagSource::from_entropy()),
            Arc::new(SystemClock),
        )
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_ready(&self) -> bool {
        self.phase == Phase::Ready
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    pub fn total_stars(&self) -> u32 {
        self.schedule.total_stars()
    }

    pub fn progress(&self) -> StarProgress {
        StarProgress::toward_prize(self.total_stars())
    }

    pub fn show_celebration(&self) -> bool {
        self.celebration.is_visible()
    }

    pub fn hide_weekends(&self) -> bool {
        self.hide_weekends
    }

    pub fn set_hide_weekends(&mut self, hide: bool) {
        self.hide_weekends = hide;
    }

    /// Days currently rendered: weekdays only while weekends are hidden.
    pub fn displayed_schedule(&self) -> Vec<&Day> {
        if self.hide_weekends {
            self.schedule.weekdays()
        } else {
            self.schedule.days().iter().collect()
        }
    }

    /// Writes queued by local mutations and not yet handed to the store.
    pub fn pending_writes(&self) -> usize {
        self.pending_writes.len()
    }

    /// Flips one task and queues the new schedule for the store.
    ///
    /// # Errors
    /// - `ControllerError::NotReady` while loading.
    /// - `ControllerError::Schedule` when the day or task is unknown.
    pub fn toggle_task(&mut self, day_id: &str, task_id: &str) -> Result<(), ControllerError> {
        self.require_ready()?;

        let tags = &mut self.tags;
        let next = self.schedule.toggle_task(day_id, task_id, || tags.pick())?;
        let completed = next
            .task(day_id, task_id)
            .is_some_and(|task| task.completed);

        self.adopt(next.clone());
        self.pending_writes.push_back(next);
        info!(
            "event=task_toggle module=controller status=ok day_id={day_id} task_id={task_id} completed={completed} stars={}",
            self.total_stars()
        );
        Ok(())
    }

    /// Clears every task and queues the reset schedule for the store.
    pub fn reset_week(&mut self) -> Result<(), ControllerError> {
        self.require_ready()?;

        let next = self.schedule.reset();
        self.adopt(next.clone());
        self.celebration.dismiss();
        self.pending_writes.push_back(next);
        info!("event=week_reset module=controller status=ok");
        Ok(())
    }

    /// Closes the celebration overlay before its timer runs out.
    pub fn dismiss_celebration(&mut self) {
        self.celebration.dismiss();
    }

    /// Runs one turn of the event loop.
    ///
    /// Flushes queued writes, drains the subscription channel, applies the
    /// newest snapshot of the batch, flushes writes produced by re-seeding,
    /// then advances the celebration timer. Returns the number of
    /// subscription events received.
    pub fn process_events(&mut self) -> usize {
        self.flush_writes();

        let mut received = 0;
        let mut latest = None;
        while let Ok(event) = self.events.try_recv() {
            received += 1;
            match event {
                SyncEvent::Snapshot(snapshot) => latest = Some(snapshot),
                SyncEvent::Failed(err) => self.apply_failure(err),
            }
        }
        if let Some(snapshot) = latest {
            self.apply_snapshot(snapshot);
        }

        self.flush_writes();
        self.tick();
        received
    }

    /// Advances the celebration timer only.
    pub fn tick(&mut self) {
        if self.celebration.poll(self.clock.now()) {
            debug!("event=celebration_hide module=controller status=ok reason=timeout");
        }
    }

    /// Flushes queued writes, ends the subscription and cancels the timer.
    pub fn shutdown(&mut self) {
        self.flush_writes();
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
            info!("event=chart_shutdown module=controller status=ok");
        }
        self.celebration.dismiss();
    }

    fn require_ready(&self) -> Result<(), ControllerError> {
        match self.phase {
            Phase::Ready => Ok(()),
            Phase::Loading => Err(ControllerError::NotReady),
        }
    }

    fn adopt(&mut self, schedule: Schedule) {
        self.schedule = schedule;
        let now = self.clock.now();
        self.celebration
            .observe_total(self.schedule.total_stars(), now);
    }

    fn apply_snapshot(&mut self, snapshot: Option<Schedule>) {
        match snapshot {
            Some(schedule) => {
                self.adopt(schedule);
                self.mark_ready("snapshot");
            }
            None => {
                let seeded = Schedule::default_week();
                self.adopt(seeded.clone());
                self.pending_writes.push_back(seeded);
                self.mark_ready("seeded");
            }
        }
    }

    /// Falls back to the default week only while loading; a ready chart
    /// keeps what it shows.
    fn apply_failure(&mut self, err: StoreError) {
        warn!("event=chart_sync module=controller status=error error={err}");
        if self.phase == Phase::Loading {
            self.adopt(Schedule::default_week());
            self.mark_ready("fallback");
        }
    }

    fn mark_ready(&mut self, source: &'static str) {
        if self.phase == Phase::Loading {
            self.phase = Phase::Ready;
            info!(
                "event=chart_ready module=controller status=ok source={source} stars={}",
                self.total_stars()
            );
        } else {
            debug!(
                "event=chart_sync module=controller status=ok source={source} stars={}",
                self.total_stars()
            );
        }
    }

    fn flush_writes(&mut self) {
        while let Some(schedule) = self.pending_writes.pop_front() {
            match &self.store {
                Some(store) => store.write(&schedule),
                None => debug!("event=schedule_write module=controller status=skipped reason=store_unavailable"),
            }
        }
    }
}

impl Drop for StarChartController {
    fn drop(&mut self) {
        self.shutdown();
    }
}
