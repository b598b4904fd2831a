//! Task-board property codec: query filters, property reads and property writes.
//!
//! Column names come from [`TaskBoardProperties`]; nothing here hard-codes them.

use crate::domain::entities::{DEFAULT_TASK_STATUS, TASK_SOURCE, UNTITLED};
use crate::domain::{Instant, Metadata, Task, TaskCreate, TaskPatch};
use crate::ports::TaskQuery;
use crate::shared::config::TaskBoardProperties;
use crate::shared::datetime::{parse_date_or_instant, to_rfc3339};
use serde_json::{Map, Value, json};
use tracing::warn;

/// Upstream rejects page sizes outside this range.
pub const MAX_PAGE_SIZE: usize = 100;

pub fn page_size(limit: usize) -> usize {
    limit.clamp(1, MAX_PAGE_SIZE)
}

/// No predicates gives `None`, one is sent bare, several are wrapped in `and`.
pub fn build_filter(props: &TaskBoardProperties, query: &TaskQuery) -> Option<Value> {
    let mut predicates = Vec::new();
    if let Some(status) = &query.status {
        predicates.push(json!({
            "property": props.status,
            "select": { "equals": status }
        }));
    }
    if let Some(before) = &query.due_before {
        predicates.push(json!({
            "property": props.due,
            "date": { "before": to_rfc3339(before) }
        }));
    }
    if let Some(after) = &query.due_after {
        predicates.push(json!({
            "property": props.due,
            "date": { "after": to_rfc3339(after) }
        }));
    }

    match predicates.len() {
        0 => None,
        1 => predicates.pop(),
        _ => Some(json!({ "and": predicates })),
    }
}

fn joined_plain_text(fragments: Option<&Value>) -> String {
    fragments
        .and_then(Value::as_array)
        .map(|parts| {
            parts
                .iter()
                .filter_map(|p| {
                    p.get("plain_text")
                        .or_else(|| p.pointer("/text/content"))
                        .and_then(Value::as_str)
                })
                .collect()
        })
        .unwrap_or_default()
}

fn rich_text(content: &str) -> Value {
    json!([{ "type": "text", "text": { "content": content } }])
}

/// Reads a page's properties through the configured column names.
pub struct PageReader<'a> {
    props: &'a TaskBoardProperties,
    properties: &'a Map<String, Value>,
}

impl<'a> PageReader<'a> {
    pub fn new(props: &'a TaskBoardProperties, properties: &'a Map<String, Value>) -> Self {
        Self { props, properties }
    }

    fn prop(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    pub fn title(&self) -> String {
        let title = joined_plain_text(self.prop(&self.props.title).and_then(|p| p.get("title")));
        if title.is_empty() {
            UNTITLED.to_string()
        } else {
            title
        }
    }

    /// `select` columns and native `status` columns read the same way.
    pub fn status(&self) -> String {
        self.prop(&self.props.status)
            .and_then(|p| p.get("select").or_else(|| p.get("status")))
            .and_then(|s| s.get("name"))
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_TASK_STATUS)
            .to_string()
    }

    pub fn due_date(&self) -> Option<Instant> {
        let raw = self
            .prop(&self.props.due)?
            .pointer("/date/start")?
            .as_str()?;
        match parse_date_or_instant(raw) {
            Ok(at) => Some(at),
            Err(e) => {
                warn!(value = raw, error = %e, "unparseable due date ignored");
                None
            }
        }
    }

    /// Fractional minutes are truncated toward zero.
    pub fn est_minutes(&self) -> Option<i64> {
        self.prop(&self.props.est_minutes)?
            .get("number")?
            .as_f64()
            .map(|n| n.trunc() as i64)
    }

    pub fn course_code(&self) -> Option<String> {
        let text = joined_plain_text(
            self.prop(&self.props.course)
                .and_then(|p| p.get("rich_text")),
        );
        (!text.is_empty()).then_some(text)
    }
}

/// Map an upstream page object into a [`Task`].
pub fn page_to_task(props: &TaskBoardProperties, page: &Value) -> Task {
    let empty = Map::new();
    let properties = page
        .get("properties")
        .and_then(Value::as_object)
        .unwrap_or(&empty);
    let reader = PageReader::new(props, properties);

    Task {
        id: page
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        title: reader.title(),
        status: reader.status(),
        due_date: reader.due_date(),
        est_minutes: reader.est_minutes(),
        course_code: reader.course_code(),
        source: TASK_SOURCE.to_string(),
        metadata: page_metadata(page),
    }
}

pub fn page_metadata(page: &Value) -> Metadata {
    let mut metadata = Metadata::new();
    if let Some(url) = page.get("url").filter(|u| !u.is_null()) {
        metadata.insert("url".to_string(), url.clone());
    }
    metadata
}

/// Accumulates property writes for a create or patch request.
pub struct PropertyWriter<'a> {
    props: &'a TaskBoardProperties,
    out: Map<String, Value>,
}

impl<'a> PropertyWriter<'a> {
    pub fn new(props: &'a TaskBoardProperties) -> Self {
        Self {
            props,
            out: Map::new(),
        }
    }

    pub fn title(mut self, title: &str) -> Self {
        self.out
            .insert(self.props.title.clone(), json!({ "title": rich_text(title) }));
        self
    }

    pub fn status(mut self, status: &str) -> Self {
        self.out.insert(
            self.props.status.clone(),
            json!({ "select": { "name": status } }),
        );
        self
    }

    pub fn due_date(mut self, due: &Instant) -> Self {
        self.out.insert(
            self.props.due.clone(),
            json!({ "date": { "start": to_rfc3339(due) } }),
        );
        self
    }

    pub fn est_minutes(mut self, minutes: i64) -> Self {
        self.out
            .insert(self.props.est_minutes.clone(), json!({ "number": minutes }));
        self
    }

    pub fn course_code(mut self, course: &str) -> Self {
        self.out.insert(
            self.props.course.clone(),
            json!({ "rich_text": rich_text(course) }),
        );
        self
    }

    pub fn finish(self) -> Map<String, Value> {
        self.out
    }
}

/// Title and status are always written; the rest only when supplied.
pub fn create_properties(props: &TaskBoardProperties, body: &TaskCreate) -> Map<String, Value> {
    let mut writer = PropertyWriter::new(props)
        .title(&body.title)
        .status(&body.status);
    if let Some(due) = &body.due_date {
        writer = writer.due_date(due);
    }
    if let Some(minutes) = body.est_minutes {
        writer = writer.est_minutes(minutes);
    }
    if let Some(course) = &body.course_code {
        writer = writer.course_code(course);
    }
    writer.finish()
}

pub fn patch_properties(props: &TaskBoardProperties, patch: &TaskPatch) -> Map<String, Value> {
    let mut writer = PropertyWriter::new(props);
    if let Some(title) = &patch.title {
        writer = writer.title(title);
    }
    if let Some(status) = &patch.status {
        writer = writer.status(status);
    }
    if let Some(due) = &patch.due_date {
        writer = writer.due_date(due);
    }
    if let Some(minutes) = patch.est_minutes {
        writer = writer.est_minutes(minutes);
    }
    if let Some(course) = &patch.course_code {
        writer = writer.course_code(course);
    }
    writer.finish()
}
