//! Domain model for the weekly star chart.
//!
//! # Responsibility
//! - Define canonical schedule structures shared by store and controller.
//! - Derive aggregate values (star totals, prize progress).
//!
//! # Invariants
//! - Every task is identified by a stable `"{day_id}-{index}"` id.
//! - Schedules are replaced wholesale, never patched in place.

pub mod progress;
pub mod schedule;
