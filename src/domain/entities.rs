//! Domain entities. Normalized records every adapter produces or consumes.
//!
//! No upstream types here: adapters map provider JSON into these shapes.
//! Field names follow the public JSON contract (camelCase).

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::errors::DomainError;

/// Timezone-aware instant. Always carries an explicit UTC offset.
pub type Instant = DateTime<FixedOffset>;

/// Free-form provider metadata attached to normalized items.
pub type Metadata = Map<String, Value>;

/// Provenance tag of calendar events.
pub const CALENDAR_SOURCE: &str = "google";
/// Provenance tag of task-board tasks.
pub const TASK_SOURCE: &str = "notion";
/// Provenance tag of assignments from the learning-management API.
pub const ASSIGNMENT_SOURCE: &str = "wu_canvas";
/// Provenance tag of timetable entries from calendar feeds.
pub const TIMETABLE_SOURCE: &str = "wu_vvz";

/// Status given to tasks created without one.
pub const DEFAULT_TASK_STATUS: &str = "Todo";
/// Title used when an upstream record has none.
pub const UNTITLED: &str = "(no title)";

/// An event from the personal calendar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: String,
    pub summary: String,
    pub description: Option<String>,
    pub start: Instant,
    pub end: Instant,
    pub location: Option<String>,
    pub source: String,
    #[serde(default)]
    pub metadata: Metadata,
}

/// Write-side shape for creating a calendar event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEventCreate {
    pub summary: String,
    #[serde(default)]
    pub description: Option<String>,
    pub start: Instant,
    pub end: Instant,
    #[serde(default)]
    pub location: Option<String>,
}

/// Partial update. `None` leaves the upstream field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CalendarEventPatch {
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub start: Option<Instant>,
    #[serde(default)]
    pub end: Option<Instant>,
    #[serde(default)]
    pub location: Option<String>,
}

fn check_range(start: &Instant, end: &Instant) -> Result<(), DomainError> {
    if end < start {
        return Err(DomainError::Validation(
            "event end must not precede its start".to_string(),
        ));
    }
    Ok(())
}

impl CalendarEventCreate {
    pub fn validate(&self) -> Result<(), DomainError> {
        check_range(&self.start, &self.end)
    }
}

impl CalendarEventPatch {
    /// Only checks the range when both bounds are supplied.
    pub fn validate(&self) -> Result<(), DomainError> {
        match (&self.start, &self.end) {
            (Some(start), Some(end)) => check_range(start, end),
            _ => Ok(()),
        }
    }

    /// Range check of the event as it will be after the patch is applied.
    pub fn validate_over(&self, start: &Instant, end: &Instant) -> Result<(), DomainError> {
        check_range(
            self.start.as_ref().unwrap_or(start),
            self.end.as_ref().unwrap_or(end),
        )
    }
}

/// A task on the task board. `status` is whatever the board defines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    pub status: String,
    pub due_date: Option<Instant>,
    pub est_minutes: Option<i64>,
    pub course_code: Option<String>,
    pub source: String,
    #[serde(default)]
    pub metadata: Metadata,
}

fn default_task_status() -> String {
    DEFAULT_TASK_STATUS.to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskCreate {
    pub title: String,
    #[serde(default = "default_task_status")]
    pub status: String,
    #[serde(default)]
    pub due_date: Option<Instant>,
    #[serde(default)]
    pub est_minutes: Option<i64>,
    #[serde(default)]
    pub course_code: Option<String>,
}

impl TaskCreate {
    /// Task with only a title; status falls back to [`DEFAULT_TASK_STATUS`].
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            status: default_task_status(),
            due_date: None,
            est_minutes: None,
            course_code: None,
        }
    }
}

/// Partial update. Only the fields that are `Some` are written upstream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub due_date: Option<Instant>,
    #[serde(default)]
    pub est_minutes: Option<i64>,
    #[serde(default)]
    pub course_code: Option<String>,
}

/// Assignment or timetable entry from an academic provider.
///
/// Assignments populate `due_date`; timetable entries populate `start`/`end`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcademicItem {
    /// `"<provider>:<native id>"`, unique across providers.
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub course_code: Option<String>,
    pub due_date: Option<Instant>,
    pub start: Option<Instant>,
    pub end: Option<Instant>,
    pub source: String,
    pub url: Option<String>,
    pub status: Option<String>,
    #[serde(default)]
    pub metadata: Metadata,
}

/// Everything due or scheduled on one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyOverview {
    pub date: NaiveDate,
    pub calendar_events: Vec<CalendarEvent>,
    pub notion_tasks: Vec<Task>,
    pub academic_items: Vec<AcademicItem>,
    pub summary_text: String,
}

impl DailyOverview {
    /// Build the overview and derive the one-line summary from the sequence lengths.
    pub fn new(
        date: NaiveDate,
        calendar_events: Vec<CalendarEvent>,
        notion_tasks: Vec<Task>,
        academic_items: Vec<AcademicItem>,
    ) -> Self {
        let summary_text = format!(
            "{} calendar events, {} Notion tasks, {} academic items.",
            calendar_events.len(),
            notion_tasks.len(),
            academic_items.len()
        );
        Self {
            date,
            calendar_events,
            notion_tasks,
            academic_items,
            summary_text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_create_defaults_status() {
        let body: TaskCreate = serde_json::from_str(r#"{"title": "Read Ch.4"}"#).unwrap();
        assert_eq!(body.status, "Todo");
        assert!(body.due_date.is_none());
        assert_eq!(body, TaskCreate::titled("Read Ch.4"));
    }

    #[test]
    fn test_academic_item_serializes_type_field() {
        let item = AcademicItem {
            id: "wu_ical:1".into(),
            title: "Lecture".into(),
            kind: "timetable".into(),
            course_code: None,
            due_date: None,
            start: None,
            end: None,
            source: TIMETABLE_SOURCE.into(),
            url: None,
            status: None,
            metadata: Metadata::new(),
        };
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["type"], "timetable");
        assert!(json.get("courseCode").is_some());
    }

    #[test]
    fn test_event_range_validation() {
        let at = |s: &str| DateTime::parse_from_rfc3339(s).unwrap();
        let create = CalendarEventCreate {
            summary: "Exam".into(),
            description: None,
            start: at("2024-03-01T10:00:00Z"),
            end: at("2024-03-01T10:00:00Z"),
            location: None,
        };
        assert!(create.validate().is_ok());

        let inverted = CalendarEventPatch {
            start: Some(at("2024-03-01T11:00:00+01:00")),
            end: Some(at("2024-03-01T09:59:00Z")),
            ..Default::default()
        };
        assert!(matches!(inverted.validate(), Err(DomainError::Validation(_))));
        assert!(CalendarEventPatch::default().validate().is_ok());

        let (stored_start, stored_end) = (at("2024-03-01T10:00:00Z"), at("2024-03-01T11:00:00Z"));
        let end_only = CalendarEventPatch {
            end: Some(at("2024-03-01T09:00:00Z")),
            ..Default::default()
        };
        assert!(end_only.validate().is_ok());
        assert!(matches!(
            end_only.validate_over(&stored_start, &stored_end),
            Err(DomainError::Validation(_))
        ));
        let start_only = CalendarEventPatch {
            start: Some(at("2024-03-01T10:30:00Z")),
            ..Default::default()
        };
        assert!(start_only.validate_over(&stored_start, &stored_end).is_ok());
    }

    #[test]
    fn test_daily_overview_summary() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let overview = DailyOverview::new(date, vec![], vec![], vec![]);
        assert_eq!(
            overview.summary_text,
            "0 calendar events, 0 Notion tasks, 0 academic items."
        );
    }
}
