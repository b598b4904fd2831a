//! Task board adapter. Implements TaskBoardPort over the Notion REST API.

pub mod properties;

use crate::adapters::upstream;
use crate::domain::entities::TASK_SOURCE;
use crate::domain::{DomainError, Task, TaskCreate, TaskPatch};
use crate::ports::{ItemSource, ItemWriter, TaskQuery};
use crate::shared::config::NotionConfig;
use properties::{
    build_filter, create_properties, page_metadata, page_size, page_to_task, patch_properties,
};
use reqwest::{Client, Method, RequestBuilder};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, info};

const PROVIDER: &str = "notion";
const NOTION_VERSION: &str = "2022-06-28";

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    results: Vec<Value>,
}

pub struct NotionTaskAdapter {
    client: Client,
    config: NotionConfig,
}

impl NotionTaskAdapter {
    pub fn new(config: NotionConfig) -> Result<Self, DomainError> {
        Ok(Self {
            client: upstream::build_client(PROVIDER, config.timeout)?,
            config,
        })
    }

    fn token(&self) -> Result<&str, DomainError> {
        self.config
            .token
            .as_deref()
            .ok_or_else(|| DomainError::Config("NOTION_TOKEN missing".to_string()))
    }

    fn database_id(&self) -> Result<&str, DomainError> {
        self.config
            .database_id
            .as_deref()
            .ok_or_else(|| DomainError::Config("NOTION_DATABASE_ID missing".to_string()))
    }

    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder, DomainError> {
        let url = upstream::endpoint(PROVIDER, &self.config.api_base, segments)?;
        debug!(method = %method, url = %url, "notion request");
        Ok(self
            .client
            .request(method, url)
            .bearer_auth(self.token()?)
            .header("Notion-Version", NOTION_VERSION))
    }
}

#[async_trait::async_trait]
impl ItemSource for NotionTaskAdapter {
    type Query = TaskQuery;
    type Item = Task;

    async fn list_items(&self, query: TaskQuery) -> Result<Vec<Task>, DomainError> {
        let mut payload = json!({ "page_size": page_size(query.limit) });
        if let Some(filter) = build_filter(&self.config.properties, &query) {
            payload["filter"] = filter;
        }

        let request = self
            .request(Method::POST, &["v1", "databases", self.database_id()?, "query"])?
            .json(&payload);
        let response: QueryResponse = upstream::send_json(PROVIDER, request).await?;

        let tasks: Vec<Task> = response
            .results
            .iter()
            .map(|page| page_to_task(&self.config.properties, page))
            .collect();
        info!(count = tasks.len(), "notion tasks fetched");
        Ok(tasks)
    }
}

#[async_trait::async_trait]
impl ItemWriter for NotionTaskAdapter {
    type Create = TaskCreate;
    type Patch = TaskPatch;

    /// The returned task echoes the input; only the id and url come from upstream.
    async fn create(&self, body: TaskCreate) -> Result<Task, DomainError> {
        let payload = json!({
            "parent": { "database_id": self.database_id()? },
            "properties": create_properties(&self.config.properties, &body),
        });
        let request = self.request(Method::POST, &["v1", "pages"])?.json(&payload);
        let page: Value = upstream::send_json(PROVIDER, request).await?;

        let id = page
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| DomainError::upstream(PROVIDER, "created page has no id"))?
            .to_string();
        info!(task_id = %id, "notion task created");

        Ok(Task {
            id,
            title: body.title,
            status: body.status,
            due_date: body.due_date,
            est_minutes: body.est_minutes,
            course_code: body.course_code,
            source: TASK_SOURCE.to_string(),
            metadata: page_metadata(&page),
        })
    }

    async fn patch(&self, id: &str, patch: TaskPatch) -> Result<Task, DomainError> {
        let payload = json!({
            "properties": patch_properties(&self.config.properties, &patch),
        });
        let request = self
            .request(Method::PATCH, &["v1", "pages", id])?
            .json(&payload);
        let page: Value = upstream::send_json(PROVIDER, request).await?;
        info!(task_id = %id, "notion task updated");
        Ok(page_to_task(&self.config.properties, &page))
    }
}
