//! Phone reminder intake: turns an inbound reminder payload into a task-board task.
//!
//! Once the payload has a title the caller always gets a success outcome; where the
//! task ended up is reported in `createdIn`.

use crate::domain::{DomainError, Instant, TaskCreate};
use crate::ports::TaskBoardPort;
use crate::shared::datetime::parse_query_instant;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderOutcome {
    pub ok: bool,
    pub created_in: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
}

impl ReminderOutcome {
    fn created(task_id: String) -> Self {
        Self {
            ok: true,
            created_in: "notion".to_string(),
            task_id: Some(task_id),
        }
    }

    fn dropped() -> Self {
        Self {
            ok: true,
            created_in: "none".to_string(),
            task_id: None,
        }
    }
}

pub struct ReminderIntake {
    tasks: Arc<dyn TaskBoardPort>,
    enabled: bool,
}

impl ReminderIntake {
    pub fn new(tasks: Arc<dyn TaskBoardPort>, enabled: bool) -> Self {
        Self { tasks, enabled }
    }

    pub async fn accept(&self, payload: &Value) -> Result<ReminderOutcome, DomainError> {
        if !self.enabled {
            return Err(DomainError::Forbidden("Webhooks disabled".to_string()));
        }
        let title = match payload.get("title") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) if s.is_empty() => None,
            Some(other) => Some(other),
        }
        .ok_or_else(|| DomainError::Validation("Missing title".to_string()))?;

        let body = match task_from_payload(title, payload) {
            Ok(body) => body,
            Err(e) => {
                warn!(error = %e, "reminder payload rejected; nothing created");
                return Ok(ReminderOutcome::dropped());
            }
        };

        match self.tasks.create(body).await {
            Ok(task) => {
                info!(task_id = %task.id, "reminder stored as task");
                Ok(ReminderOutcome::created(task.id))
            }
            Err(e) => {
                warn!(error = %e, "reminder could not be stored");
                Ok(ReminderOutcome::dropped())
            }
        }
    }
}

fn optional_str<'a>(payload: &'a Value, key: &str) -> Result<Option<&'a str>, DomainError> {
    match payload.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(other) => Err(DomainError::Validation(format!(
            "{key} must be a string, got {other}"
        ))),
    }
}

fn task_from_payload(title: &Value, payload: &Value) -> Result<TaskCreate, DomainError> {
    let title = title
        .as_str()
        .ok_or_else(|| DomainError::Validation("title must be a string".to_string()))?;

    let due_date: Option<Instant> = optional_str(payload, "dueDate")?
        .map(parse_query_instant)
        .transpose()?;

    // Whole numbers only; 30.0 is accepted, 30.5 is not.
    let est_minutes = match payload.get("estMinutes") {
        None | Some(Value::Null) => None,
        Some(Value::Number(n)) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => Some(i),
            (None, Some(f)) if f.fract() == 0.0 => Some(f as i64),
            _ => {
                return Err(DomainError::Validation(format!(
                    "estMinutes must be a whole number, got {n}"
                )));
            }
        },
        Some(Value::String(s)) => Some(s.trim().parse::<i64>().map_err(|e| {
            DomainError::Validation(format!("estMinutes {s:?} is not a number: {e}"))
        })?),
        Some(other) => {
            return Err(DomainError::Validation(format!(
                "estMinutes must be a number, got {other}"
            )));
        }
    };

    Ok(TaskCreate {
        due_date,
        est_minutes,
        course_code: optional_str(payload, "courseCode")?.map(String::from),
        ..TaskCreate::titled(title)
    })
}
