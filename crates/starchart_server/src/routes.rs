//! Schedule HTTP routes.
//!
//! # Invariants
//! - `GET` answers `{"schedule": [...]}`, with `[]` for an absent, empty or
//!   malformed document.
//! - Error bodies carry `message` and, when a cause exists, `error`.
//! - SQLite work runs on the blocking pool, never on async workers.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use log::{error, info, warn};
use serde::Deserialize;
use serde_json::{json, Value};
use starchart_core::store::payload::schedule_from_days;
use starchart_core::{Day, Schedule, ScheduleStoreClient};
use std::sync::Arc;

pub const SCHEDULE_ROUTE: &str = "/api/schedule";

type ApiResponse = (StatusCode, Json<Value>);

/// Shared handler state; `store` is `None` when initialization failed.
#[derive(Clone)]
pub struct AppState {
    pub store: Option<Arc<ScheduleStoreClient>>,
}

#[derive(Debug, Deserialize)]
struct SaveScheduleRequest {
    #[serde(default)]
    schedule: Option<Vec<Day>>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(SCHEDULE_ROUTE, get(get_schedule).post(save_schedule))
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    let store = if state.store.is_some() {
        "ready"
    } else {
        "unavailable"
    };
    Json(json!({ "status": "ok", "store": store }))
}

async fn get_schedule(State(state): State<AppState>) -> ApiResponse {
    const FAILURE: &str = "Error fetching schedule";

    let Some(store) = state.store else {
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, FAILURE, "store unavailable");
    };

    match tokio::task::spawn_blocking(move || store.fetch()).await {
        Ok(Ok(document)) => {
            let label = document.label();
            let days = document
                .into_schedule()
                .map(Schedule::into_days)
                .unwrap_or_default();
            info!("event=api_get_schedule module=server status=ok document={label}");
            (StatusCode::OK, Json(json!({ "schedule": days })))
        }
        Ok(Err(err)) => {
            error!("event=api_get_schedule module=server status=error error={err}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, FAILURE, err)
        }
        Err(err) => {
            error!("event=api_get_schedule module=server status=error error={err}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, FAILURE, err)
        }
    }
}

async fn save_schedule(
    State(state): State<AppState>,
    payload: Result<Json<SaveScheduleRequest>, JsonRejection>,
) -> ApiResponse {
    const FAILURE: &str = "Error saving schedule";
    const INVALID: &str = "Invalid schedule data";

    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            warn!("event=api_save_schedule module=server status=rejected reason=body");
            return error_response(StatusCode::BAD_REQUEST, INVALID, rejection.body_text());
        }
    };
    let Some(days) = request.schedule else {
        warn!("event=api_save_schedule module=server status=rejected reason=missing_schedule");
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "message": "Schedule data is required" })),
        );
    };
    let schedule = match schedule_from_days(days) {
        Ok(schedule) => schedule,
        Err(err) => {
            warn!("event=api_save_schedule module=server status=rejected reason=shape error={err}");
            return error_response(StatusCode::BAD_REQUEST, INVALID, err);
        }
    };

    let Some(store) = state.store else {
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, FAILURE, "store unavailable");
    };

    match tokio::task::spawn_blocking(move || store.try_write(&schedule)).await {
        Ok(Ok(())) => {
            info!("event=api_save_schedule module=server status=ok");
            (
                StatusCode::OK,
                Json(json!({ "message": "Schedule saved successfully" })),
            )
        }
        Ok(Err(err)) => error_response(StatusCode::INTERNAL_SERVER_ERROR, FAILURE, err),
        Err(err) => {
            error!("event=api_save_schedule module=server status=error error={err}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, FAILURE, err)
        }
    }
}

fn error_response(status: StatusCode, message: &str, error: impl ToString) -> ApiResponse {
    (
        status,
        Json(json!({ "message": message, "error": error.to_string() })),
    )
}
