//! Prize progress projection.

use serde::Serialize;

/// Stars needed to earn the prize.
pub const PRIZE_TARGET: u32 = 20;

/// Progress toward the prize, as rendered by the progress bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StarProgress {
    pub current: u32,
    pub target: u32,
    /// Filled share of the bar in `0.0..=100.0`.
    pub percentage: f64,
    pub prize_reached: bool,
}

impl StarProgress {
    pub fn new(current: u32, target: u32) -> Self {
        let percentage = if target == 0 {
            100.0
        } else {
            (f64::from(current) / f64::from(target) * 100.0).min(100.0)
        };
        Self {
            current,
            target,
            percentage,
            prize_reached: current >= target,
        }
    }

    /// Progress against `PRIZE_TARGET`.
    pub fn toward_prize(current: u32) -> Self {
        Self::new(current, PRIZE_TARGET)
    }
}
