//! Schedule document encoding and classification.
//!
//! # Invariants
//! - The schedule lives under the single `scheduleData` field.
//! - Decoding never fails: every body maps to one `DocumentState`.

use super::StoreResult;
use crate::model::schedule::{Day, Schedule, ScheduleValidationError};
use serde_json::{Map, Value};

/// Document field holding the serialized day array.
pub const SCHEDULE_FIELD: &str = "scheduleData";

/// Classified content of the schedule document.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentState {
    Present(Schedule),
    /// The document does not exist or has no schedule field.
    Absent,
    /// The schedule field is an empty array.
    Empty,
    Malformed(String),
}

impl DocumentState {
    /// Returns the schedule only when it is usable as-is.
    pub fn into_schedule(self) -> Option<Schedule> {
        match self {
            Self::Present(schedule) => Some(schedule),
            Self::Absent | Self::Empty | Self::Malformed(_) => None,
        }
    }

    /// Stable label for log lines.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Present(_) => "present",
            Self::Absent => "absent",
            Self::Empty => "empty",
            Self::Malformed(_) => "malformed",
        }
    }
}

/// Builds the document body `{"scheduleData": [...]}` for `schedule`.
pub fn encode_document(schedule: &Schedule) -> StoreResult<Value> {
    let mut body = Map::new();
    body.insert(SCHEDULE_FIELD.to_string(), serde_json::to_value(schedule)?);
    Ok(Value::Object(body))
}

/// Classifies a raw document body.
pub fn decode_document(body: Option<&Value>) -> DocumentState {
    let Some(body) = body else {
        return DocumentState::Absent;
    };
    let Some(field) = body.get(SCHEDULE_FIELD) else {
        return DocumentState::Absent;
    };
    let Some(items) = field.as_array() else {
        return DocumentState::Malformed(format!("`{SCHEDULE_FIELD}` is not an array"));
    };
    if items.is_empty() {
        return DocumentState::Empty;
    }

    match serde_json::from_value::<Vec<Day>>(field.clone()) {
        Ok(days) => match schedule_from_days(days) {
            Ok(schedule) => DocumentState::Present(schedule),
            Err(err) => DocumentState::Malformed(err.to_string()),
        },
        Err(err) => DocumentState::Malformed(err.to_string()),
    }
}

/// Validates days written by any client, repairing cosmetic tags first.
pub fn schedule_from_days(mut days: Vec<Day>) -> Result<Schedule, ScheduleValidationError> {
    for day in &mut days {
        day.repair_cosmetics();
    }
    Schedule::from_days(days)
}
