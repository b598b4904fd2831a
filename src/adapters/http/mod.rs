//! HTTP surface (axum). Inbound adapter over the provider ports and use cases.

pub mod auth;
pub mod error;
pub mod handlers;

use crate::ports::{AssignmentsPort, CalendarPort, TaskBoardPort, TimetablePort};
use crate::usecases::{OverviewService, ReminderIntake};
use axum::{
    Router, middleware,
    routing::{get, patch, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Shared handler state. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub calendar: Arc<dyn CalendarPort>,
    pub tasks: Arc<dyn TaskBoardPort>,
    pub assignments: Arc<dyn AssignmentsPort>,
    pub timetable: Arc<dyn TimetablePort>,
    pub overview: Arc<OverviewService>,
    pub reminders: Arc<ReminderIntake>,
    pub api_key: Option<Arc<str>>,
}

impl AppState {
    pub fn new(
        calendar: Arc<dyn CalendarPort>,
        tasks: Arc<dyn TaskBoardPort>,
        assignments: Arc<dyn AssignmentsPort>,
        timetable: Arc<dyn TimetablePort>,
        api_key: Option<String>,
        webhooks_enabled: bool,
    ) -> Self {
        let overview = Arc::new(OverviewService::new(
            Arc::clone(&calendar),
            Arc::clone(&tasks),
            Arc::clone(&assignments),
            Arc::clone(&timetable),
        ));
        let reminders = Arc::new(ReminderIntake::new(Arc::clone(&tasks), webhooks_enabled));
        Self {
            calendar,
            tasks,
            assignments,
            timetable,
            overview,
            reminders,
            api_key: api_key.map(Arc::from),
        }
    }
}

pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route(
            "/calendar/events",
            get(handlers::list_events).post(handlers::create_event),
        )
        .route(
            "/calendar/events/{eventId}",
            patch(handlers::patch_event).delete(handlers::delete_event),
        )
        .route(
            "/notion/tasks",
            get(handlers::list_tasks).post(handlers::create_task),
        )
        .route("/notion/tasks/{taskId}", patch(handlers::patch_task))
        .route(
            "/wu/canvas/academic-items",
            get(handlers::list_assignments),
        )
        .route("/wu/vvz/academic-items", get(handlers::list_timetable))
        .route("/overview/daily", get(handlers::daily_overview))
        .route(
            "/webhooks/samsung/reminders",
            post(handlers::reminder_webhook),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_api_key,
        ));

    Router::new()
        .route("/health", get(handlers::health))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
