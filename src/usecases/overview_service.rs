//! Daily overview use case: one calendar day across all four providers.
//!
//! Providers are queried concurrently. A failing provider contributes nothing and
//! never fails the overview.

use crate::domain::{DailyOverview, DomainError};
use crate::ports::{
    AssignmentQuery, AssignmentsPort, CalendarPort, EventQuery, TaskBoardPort, TaskQuery,
    TimetablePort, TimetableQuery,
};
use crate::shared::datetime::{TimeWindow, utc_day_bounds};
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{info, warn};

const OVERVIEW_MAX_EVENTS: u32 = 50;
const OVERVIEW_LIMIT: usize = 100;

pub struct OverviewService {
    calendar: Arc<dyn CalendarPort>,
    tasks: Arc<dyn TaskBoardPort>,
    assignments: Arc<dyn AssignmentsPort>,
    timetable: Arc<dyn TimetablePort>,
}

/// Empty on failure; the error is logged with the provider name.
fn or_empty<T>(provider: &str, result: Result<Vec<T>, DomainError>) -> Vec<T> {
    match result {
        Ok(items) => items,
        Err(e) => {
            warn!(provider, error = %e, "provider failed; omitted from overview");
            Vec::new()
        }
    }
}

impl OverviewService {
    pub fn new(
        calendar: Arc<dyn CalendarPort>,
        tasks: Arc<dyn TaskBoardPort>,
        assignments: Arc<dyn AssignmentsPort>,
        timetable: Arc<dyn TimetablePort>,
    ) -> Self {
        Self {
            calendar,
            tasks,
            assignments,
            timetable,
        }
    }

    /// Everything in `[date 00:00Z, date+1 00:00Z]`. Academic items list assignments
    /// first, then timetable entries.
    pub async fn daily_overview(&self, date: NaiveDate) -> DailyOverview {
        let (start, end) = utc_day_bounds(date);
        let window = TimeWindow::new(Some(start), Some(end));

        let (events, tasks, assignments, timetable) = tokio::join!(
            self.calendar.list_items(EventQuery {
                window,
                max_results: OVERVIEW_MAX_EVENTS,
            }),
            self.tasks.list_items(TaskQuery {
                status: None,
                due_before: Some(end),
                due_after: Some(start),
                limit: OVERVIEW_LIMIT,
            }),
            self.assignments.list_items(AssignmentQuery {
                window,
                limit: OVERVIEW_LIMIT,
            }),
            self.timetable.list_items(TimetableQuery { window }),
        );

        let events = or_empty("calendar", events);
        let tasks = or_empty("tasks", tasks);
        let mut academic = or_empty("assignments", assignments);
        academic.extend(or_empty("timetable", timetable));

        let overview = DailyOverview::new(date, events, tasks, academic);
        info!(%date, summary = %overview.summary_text, "daily overview built");
        overview
    }
}
