//! Canvas adapter. Implements AssignmentsPort via the Canvas LMS REST API.
//!
//! Lists active courses, then each course's upcoming assignments, in that order.

use crate::adapters::upstream;
use crate::domain::entities::{ASSIGNMENT_SOURCE, UNTITLED};
use crate::domain::{AcademicItem, DomainError, Metadata};
use crate::ports::{AssignmentQuery, ItemSource};
use crate::shared::config::CanvasConfig;
use crate::shared::datetime::parse_instant;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

const PROVIDER: &str = "canvas";

#[derive(Debug, Deserialize)]
struct CanvasCourse {
    id: Option<Value>,
    course_code: Option<String>,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CanvasAssignment {
    id: Option<Value>,
    name: Option<String>,
    due_at: Option<String>,
    html_url: Option<String>,
    points_possible: Option<Value>,
}

/// Canvas API adapter for upcoming assignments.
pub struct CanvasAdapter {
    client: Client,
    config: CanvasConfig,
}

impl CanvasAdapter {
    pub fn new(config: CanvasConfig) -> Result<Self, DomainError> {
        Ok(Self {
            client: upstream::build_client(PROVIDER, config.timeout)?,
            config,
        })
    }

    fn base(&self) -> Result<&str, DomainError> {
        self.config
            .base_url
            .as_deref()
            .ok_or_else(|| DomainError::Config("CANVAS_BASE_URL missing".to_string()))
    }

    fn token(&self) -> Result<&str, DomainError> {
        self.config
            .token
            .as_deref()
            .ok_or_else(|| DomainError::Config("CANVAS_TOKEN missing".to_string()))
    }

    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        segments: &[&str],
        params: &[(&str, &str)],
    ) -> Result<T, DomainError> {
        let url = upstream::endpoint(PROVIDER, self.base()?, segments)?;
        debug!(url = %url, "canvas GET");
        let request = self.client.get(url).bearer_auth(self.token()?).query(params);
        upstream::send_json(PROVIDER, request).await
    }

    fn to_item(
        id: &Value,
        assignment: CanvasAssignment,
        course_code: Option<&str>,
    ) -> Result<AcademicItem, DomainError> {
        let due_date = assignment
            .due_at
            .as_deref()
            .map(parse_instant)
            .transpose()
            .map_err(|e| DomainError::upstream(PROVIDER, e))?;

        let mut metadata = Metadata::new();
        if let Some(points) = assignment.points_possible.filter(|p| !p.is_null()) {
            metadata.insert("points_possible".to_string(), points);
        }

        Ok(AcademicItem {
            id: format!("canvas_assignment:{}", id_string(id)),
            title: assignment.name.unwrap_or_else(|| UNTITLED.to_string()),
            kind: "assignment".to_string(),
            course_code: course_code.map(String::from),
            due_date,
            start: None,
            end: None,
            source: ASSIGNMENT_SOURCE.to_string(),
            url: assignment.html_url,
            status: Some("open".to_string()),
            metadata,
        })
    }
}

/// Canvas ids are numbers; keep strings as they are.
fn id_string(id: &Value) -> String {
    match id {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[async_trait::async_trait]
impl ItemSource for CanvasAdapter {
    type Query = AssignmentQuery;
    type Item = AcademicItem;

    async fn list_items(&self, query: AssignmentQuery) -> Result<Vec<AcademicItem>, DomainError> {
        let courses: Vec<CanvasCourse> = self
            .get(
                &["api", "v1", "courses"],
                &[("enrollment_state", "active"), ("per_page", "100")],
            )
            .await?;

        let mut items = Vec::new();
        for course in courses {
            let Some(course_id) = course.id.as_ref().filter(|id| !id.is_null()) else {
                continue;
            };
            let course_code = course.course_code.or(course.name);

            let course_id = id_string(course_id);
            let assignments: Vec<CanvasAssignment> = self
                .get(
                    &["api", "v1", "courses", &course_id, "assignments"],
                    &[("bucket", "upcoming"), ("per_page", "50")],
                )
                .await?;

            for mut assignment in assignments {
                let Some(id) = assignment.id.take().filter(|id| !id.is_null()) else {
                    debug!(course = %course_id, name = ?assignment.name, "assignment without id skipped");
                    continue;
                };
                let item = Self::to_item(&id, assignment, course_code.as_deref())?;
                if let Some(due) = &item.due_date {
                    if !query.window.contains(due) {
                        continue;
                    }
                }
                items.push(item);
            }
        }

        items.truncate(query.limit.max(1));
        info!(count = items.len(), "canvas assignments fetched");
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::datetime::{TimeWindow, parse_instant};
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{header, method, path, path_regex, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn adapter(server: &MockServer) -> CanvasAdapter {
        CanvasAdapter::new(CanvasConfig {
            base_url: Some(server.uri()),
            token: Some("canvas-token".into()),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    async fn mount_two_courses(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/api/v1/courses"))
            .and(query_param("enrollment_state", "active"))
            .and(header("authorization", "Bearer canvas-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": 1, "course_code": "FIN-101", "name": "Finance"},
                {"id": null, "name": "Orphan"},
                {"id": 2, "name": "Statistics"}
            ])))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/courses/1/assignments"))
            .and(query_param("bucket", "upcoming"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": 11, "name": "Essay", "due_at": "2024-03-05T23:59:00Z",
                 "html_url": "https://canvas/a/11", "points_possible": 10.0},
                {"id": 12, "name": "Quiz", "due_at": "2024-03-01T12:00:00Z"}
            ])))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/courses/2/assignments"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": 21, "name": "Reading", "due_at": null},
                {"id": 22, "due_at": "2024-02-20T08:00:00Z"}
            ])))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_maps_in_fetch_order() {
        let server = MockServer::start().await;
        mount_two_courses(&server).await;

        let items = adapter(&server)
            .list_items(AssignmentQuery::default())
            .await
            .unwrap();

        let ids: Vec<_> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "canvas_assignment:11",
                "canvas_assignment:12",
                "canvas_assignment:21",
                "canvas_assignment:22"
            ]
        );
        let essay = &items[0];
        assert_eq!(essay.kind, "assignment");
        assert_eq!(essay.source, "wu_canvas");
        assert_eq!(essay.course_code.as_deref(), Some("FIN-101"));
        assert_eq!(essay.metadata["points_possible"], json!(10.0));
        assert_eq!(essay.status.as_deref(), Some("open"));
        assert_eq!(items[2].course_code.as_deref(), Some("Statistics"));
        assert!(items[2].due_date.is_none());
        assert_eq!(items[3].title, "(no title)");
        assert!(!items[1].metadata.contains_key("points_possible"));
    }

    #[tokio::test]
    async fn test_window_filters_due_dates_only() {
        let server = MockServer::start().await;
        mount_two_courses(&server).await;
        let after = parse_instant("2024-03-01T00:00:00Z").unwrap();
        let before = parse_instant("2024-03-02T00:00:00Z").unwrap();

        let items = adapter(&server)
            .list_items(AssignmentQuery {
                window: TimeWindow::new(Some(after), Some(before)),
                limit: 50,
            })
            .await
            .unwrap();

        let ids: Vec<_> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["canvas_assignment:12", "canvas_assignment:21"]);
        for item in &items {
            if let Some(due) = &item.due_date {
                assert!(after <= *due && *due <= before);
            }
        }
    }

    #[tokio::test]
    async fn test_limit_zero_returns_one() {
        let server = MockServer::start().await;
        mount_two_courses(&server).await;

        let items = adapter(&server)
            .list_items(AssignmentQuery {
                window: TimeWindow::default(),
                limit: 0,
            })
            .await
            .unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, "canvas_assignment:11");
    }

    #[tokio::test]
    async fn test_upstream_error_propagates() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/courses"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad token"))
            .mount(&server)
            .await;

        let err = adapter(&server)
            .list_items(AssignmentQuery::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DomainError::UpstreamStatus { status: 401, .. }
        ));
    }

    #[tokio::test]
    async fn test_missing_config_is_config_error() {
        let adapter = CanvasAdapter::new(CanvasConfig::default()).unwrap();
        let err = adapter
            .list_items(AssignmentQuery::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Config(_)));
    }

    #[tokio::test]
    async fn test_assignment_without_id_is_skipped() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/courses"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": 7, "course_code": "ACC-200"}
            ])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/courses/7/assignments"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"name": "Draft", "due_at": "2024-03-03T10:00:00Z"},
                {"id": null, "name": "Ghost"},
                {"id": 71, "name": "Case study", "due_at": "2024-03-04T10:00:00Z"}
            ])))
            .mount(&server)
            .await;

        let items = adapter(&server)
            .list_items(AssignmentQuery::default())
            .await
            .unwrap();
        let ids: Vec<_> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["canvas_assignment:71"]);
    }

    #[tokio::test]
    async fn test_slow_upstream_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path_regex("^/api/v1/courses"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([]))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let adapter = CanvasAdapter::new(CanvasConfig {
            base_url: Some(server.uri()),
            token: Some("canvas-token".into()),
            timeout: Duration::from_millis(300),
        })
        .unwrap();
        let err = adapter
            .list_items(AssignmentQuery::default())
            .await
            .unwrap_err();
        match err {
            DomainError::Upstream { provider, message } => {
                assert_eq!(provider, "canvas");
                assert_eq!(message, "request timed out");
            }
            other => panic!("expected timeout, got {other:?}"),
        }
    }
}
