//! HTTP surface for the star chart schedule.
//!
//! # Responsibility
//! - Serve `GET`/`POST /api/schedule` over the shared schedule store.
//! - Keep answering (with 500s) when the store failed to initialize.

pub mod config;
pub mod routes;
pub mod server;

pub use config::ServerConfig;
pub use routes::{router, AppState};
pub use server::{ScheduleServer, ServerError};
