//! Core logic for the weekly star chart.
//! This crate owns the schedule invariants and the store synchronization
//! rules; presentation layers only render what the controller exposes.

pub mod controller;
pub mod db;
pub mod logging;
pub mod model;
pub mod store;

pub use controller::celebration::{Celebration, CELEBRATION_DURATION};
pub use controller::clock::{Clock, ManualClock, SystemClock};
pub use controller::star_chart::{ControllerError, Phase, StarChartController};
pub use controller::tags::{RandomTagSource, TagSource};
pub use logging::{default_log_level, init_logging, LogSettings, LoggingError};
pub use model::progress::{StarProgress, PRIZE_TARGET};
pub use model::schedule::{
    BounceSpeed, CosmeticTags, Day, Schedule, ScheduleError, ScheduleValidationError, StarColor,
    Task, MAX_STARS,
};
pub use store::backend::{DocumentBackend, DocumentSnapshot, WatchCallback, WatchEvent, WatchId};
pub use store::client::{ScheduleStoreClient, Subscription};
pub use store::config::{ConfigError, StoreConfig};
pub use store::payload::DocumentState;
pub use store::sqlite_backend::SqliteDocumentBackend;
pub use store::{DocumentPath, StoreError, StoreResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
