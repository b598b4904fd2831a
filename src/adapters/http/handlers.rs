//! Route handlers. Parse the request, call one port or use case, serialize the result.

use super::AppState;
use super::error::{ApiError, ApiResult};
use crate::domain::{
    AcademicItem, CalendarEvent, CalendarEventCreate, CalendarEventPatch, DailyOverview, Instant,
    Task, TaskCreate, TaskPatch,
};
use crate::ports::{AssignmentQuery, EventQuery, TaskQuery, TimetableQuery};
use crate::shared::datetime::{TimeWindow, parse_query_instant};
use crate::usecases::ReminderOutcome;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;

fn instant_param(raw: Option<&str>) -> ApiResult<Option<Instant>> {
    raw.filter(|v| !v.is_empty())
        .map(parse_query_instant)
        .transpose()
        .map_err(ApiError::from)
}

pub async fn health() -> &'static str {
    "ok"
}

// ─────────────────────────────────────────────────────────────────────────────
// Calendar
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarListParams {
    time_min: Option<String>,
    time_max: Option<String>,
    max_results: Option<u32>,
}

pub async fn list_events(
    State(state): State<AppState>,
    Query(params): Query<CalendarListParams>,
) -> ApiResult<Json<Vec<CalendarEvent>>> {
    let query = EventQuery {
        window: TimeWindow::new(
            instant_param(params.time_min.as_deref())?,
            instant_param(params.time_max.as_deref())?,
        ),
        max_results: params
            .max_results
            .unwrap_or(EventQuery::default().max_results),
    };
    Ok(Json(state.calendar.list_items(query).await?))
}

pub async fn create_event(
    State(state): State<AppState>,
    Json(body): Json<CalendarEventCreate>,
) -> ApiResult<(StatusCode, Json<CalendarEvent>)> {
    let event = state.calendar.create(body).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

pub async fn patch_event(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
    Json(body): Json<CalendarEventPatch>,
) -> ApiResult<Json<CalendarEvent>> {
    Ok(Json(state.calendar.patch(&event_id, body).await?))
}

pub async fn delete_event(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
) -> ApiResult<StatusCode> {
    state.calendar.delete(&event_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ─────────────────────────────────────────────────────────────────────────────
// Task board
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskListParams {
    status: Option<String>,
    due_before: Option<String>,
    due_after: Option<String>,
    limit: Option<usize>,
}

pub async fn list_tasks(
    State(state): State<AppState>,
    Query(params): Query<TaskListParams>,
) -> ApiResult<Json<Vec<Task>>> {
    let query = TaskQuery {
        status: params.status.filter(|s| !s.is_empty()),
        due_before: instant_param(params.due_before.as_deref())?,
        due_after: instant_param(params.due_after.as_deref())?,
        limit: params.limit.unwrap_or(TaskQuery::default().limit),
    };
    Ok(Json(state.tasks.list_items(query).await?))
}

pub async fn create_task(
    State(state): State<AppState>,
    Json(body): Json<TaskCreate>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    let task = state.tasks.create(body).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn patch_task(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
    Json(body): Json<TaskPatch>,
) -> ApiResult<Json<Task>> {
    Ok(Json(state.tasks.patch(&task_id, body).await?))
}

// ─────────────────────────────────────────────────────────────────────────────
// Academic providers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentParams {
    due_before: Option<String>,
    due_after: Option<String>,
    limit: Option<usize>,
}

pub async fn list_assignments(
    State(state): State<AppState>,
    Query(params): Query<AssignmentParams>,
) -> ApiResult<Json<Vec<AcademicItem>>> {
    let query = AssignmentQuery {
        window: TimeWindow::new(
            instant_param(params.due_after.as_deref())?,
            instant_param(params.due_before.as_deref())?,
        ),
        limit: params.limit.unwrap_or(AssignmentQuery::default().limit),
    };
    Ok(Json(state.assignments.list_items(query).await?))
}

#[derive(Debug, Deserialize)]
pub struct TimetableParams {
    #[serde(alias = "from_")]
    from: Option<String>,
    to: Option<String>,
}

pub async fn list_timetable(
    State(state): State<AppState>,
    Query(params): Query<TimetableParams>,
) -> ApiResult<Json<Vec<AcademicItem>>> {
    let query = TimetableQuery {
        window: TimeWindow::new(
            instant_param(params.from.as_deref())?,
            instant_param(params.to.as_deref())?,
        ),
    };
    Ok(Json(state.timetable.list_items(query).await?))
}

// ─────────────────────────────────────────────────────────────────────────────
// Overview and webhook
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverviewParams {
    date_str: Option<String>,
}

pub async fn daily_overview(
    State(state): State<AppState>,
    Query(params): Query<OverviewParams>,
) -> ApiResult<Json<DailyOverview>> {
    let raw = params
        .date_str
        .ok_or_else(|| ApiError::bad_request("dateStr is required"))?;
    let date = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|e| ApiError::bad_request(format!("invalid dateStr {raw:?}: {e}")))?;
    Ok(Json(state.overview.daily_overview(date).await))
}

pub async fn reminder_webhook(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> ApiResult<Json<ReminderOutcome>> {
    Ok(Json(state.reminders.accept(&payload).await?))
}
