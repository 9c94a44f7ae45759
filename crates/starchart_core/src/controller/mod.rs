//! UI state controller and its collaborators.
//!
//! # Responsibility
//! - Own the in-memory schedule shown by the chart.
//! - Reconcile remote snapshots with optimistic local mutations.
//! - Derive totals, prize progress and celebration visibility.
//!
//! # Invariants
//! - The controller always holds a structurally valid schedule.
//! - Mutations are rejected until the first snapshot (or failure) arrives.

pub mod celebration;
pub mod clock;
pub mod star_chart;
pub mod tags;
