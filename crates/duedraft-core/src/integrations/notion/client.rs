//! NotionClient: database scans and task page creation over the Notion REST API.

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use super::properties::{self, Properties};
use crate::error::{Result, WorkspaceError};
use crate::integrations::keyring_store;
use crate::integrations::traits::{NewTask, TaskSink, WorkspaceSource};
use crate::proposal::TaskRef;
use crate::storage::{Config, NotionConfig, SyncConfig, TaskProperties};
use crate::workspace::{ChecklistItem, Project};

#[derive(Debug, Deserialize)]
struct Page {
    id: String,
    #[serde(default)]
    properties: Properties,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    results: Vec<Page>,
    #[serde(default)]
    has_more: bool,
    #[serde(default)]
    next_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PropertySchema {
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Deserialize)]
struct DatabaseSchema {
    #[serde(default)]
    properties: HashMap<String, PropertySchema>,
}

#[derive(Debug, Deserialize)]
struct CreatedPage {
    id: String,
    #[serde(default)]
    url: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

/// Client for the project, checklist and task databases.
pub struct NotionClient {
    http_client: Client,
    token: String,
    notion: NotionConfig,
    sync: SyncConfig,
}

impl NotionClient {
    pub fn new(token: impl Into<String>, notion: NotionConfig, sync: SyncConfig) -> Self {
        Self {
            http_client: Client::new(),
            token: token.into(),
            notion,
            sync,
        }
    }

    /// Build a client from loaded configuration, resolving the token from
    /// `NOTION_TOKEN` or the OS keyring.
    ///
    /// # Errors
    /// Fails when the databases are not configured or no token is available.
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        let (token, source) = keyring_store::resolve_notion_token()?;
        debug!(?source, "resolved notion token");
        Ok(Self::new(token, config.notion.clone(), config.sync.clone()))
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.notion.api_base_url.trim_end_matches('/'), path)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, WorkspaceError> {
        let resp = request
            .bearer_auth(&self.token)
            .header("Notion-Version", &self.notion.notion_version)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;

        if status == StatusCode::UNAUTHORIZED {
            return Err(WorkspaceError::Unauthorized);
        }
        if !status.is_success() {
            let parsed: ApiErrorBody = serde_json::from_str(&body).unwrap_or(ApiErrorBody {
                code: "unknown".into(),
                message: body.chars().take(200).collect(),
            });
            return Err(WorkspaceError::Api {
                status: status.as_u16(),
                code: parsed.code,
                message: parsed.message,
            });
        }

        serde_json::from_str(&body).map_err(|e| WorkspaceError::MalformedResponse(e.to_string()))
    }

    /// Every page of a database, following `next_cursor` until exhausted.
    async fn query_all(&self, database_id: &str) -> Result<Vec<Page>, WorkspaceError> {
        let url = self.endpoint(&format!("databases/{database_id}/query"));
        let mut pages = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let mut body = json!({ "page_size": self.notion.page_size });
            if let Some(cursor) = &cursor {
                body["start_cursor"] = json!(cursor);
            }

            let resp: QueryResponse = self.send(self.http_client.post(&url).json(&body)).await?;
            pages.extend(resp.results);

            match resp.next_cursor {
                Some(next) if resp.has_more => cursor = Some(next),
                _ => break,
            }
        }

        debug!(database_id, pages = pages.len(), "queried notion database");
        Ok(pages)
    }

    /// Property name -> property type for a database.
    async fn property_types(&self, database_id: &str) -> Result<HashMap<String, String>, WorkspaceError> {
        let url = self.endpoint(&format!("databases/{database_id}"));
        let schema: DatabaseSchema = self.send(self.http_client.get(&url)).await?;
        Ok(schema
            .properties
            .into_iter()
            .map(|(name, prop)| (name, prop.kind))
            .collect())
    }

    fn page_to_project(&self, page: Page) -> Project {
        let names = &self.notion.project_properties;
        let props = &page.properties;
        let mut name = properties::title_text(props, &names.name);
        if name.is_empty() {
            name = self.sync.untitled_project_name.clone();
        }
        Project {
            name,
            event_date: properties::date_start(props, &names.event_date),
            categories: properties::categories(props, &names.event_category),
            id: page.id,
        }
    }

    fn page_to_checklist_item(&self, page: Page) -> ChecklistItem {
        let names = &self.notion.checklist_properties;
        let props = &page.properties;
        let mut product_name = properties::title_text(props, &names.product_name);
        if product_name.is_empty() {
            product_name = self.sync.untitled_item_name.clone();
        }
        ChecklistItem {
            product_name,
            work_category: properties::plain_text(props, &names.work_category),
            final_due_text: properties::plain_text(props, &names.final_due_text),
            event_categories: properties::categories(props, &names.event_category),
            id: page.id,
        }
    }
}

/// Properties for a new task page, limited to what the task database accepts.
///
/// Properties missing from `schema` or of an unexpected type are skipped.
pub fn task_page_properties(
    schema: &HashMap<String, String>,
    names: &TaskProperties,
    task: &NewTask,
    fallback_work_type: &str,
) -> Map<String, Value> {
    let mut out = Map::new();
    let kind = |name: &str| schema.get(name).map(String::as_str);

    if kind(&names.task_name) == Some("title") {
        out.insert(
            names.task_name.clone(),
            json!({ "title": [{ "text": { "content": task.task_name } }] }),
        );
    }

    match kind(&names.work_type) {
        Some("select") => {
            let label = if task.work_category.is_empty() {
                fallback_work_type
            } else {
                task.work_category.as_str()
            };
            out.insert(names.work_type.clone(), json!({ "select": { "name": label } }));
        }
        Some("rich_text") => {
            out.insert(
                names.work_type.clone(),
                json!({ "rich_text": [{ "text": { "content": task.work_category } }] }),
            );
        }
        _ => {}
    }

    if kind(&names.project_relation) == Some("relation") {
        out.insert(
            names.project_relation.clone(),
            json!({ "relation": [{ "id": task.project_ref }] }),
        );
    }

    if let Some(due) = &task.due_date {
        if kind(&names.due_date) == Some("date") {
            out.insert(names.due_date.clone(), json!({ "date": { "start": due } }));
        }
    }

    match kind(&names.status) {
        Some("status") => {
            out.insert(names.status.clone(), json!({ "status": { "name": task.status_label } }));
        }
        Some("select") => {
            out.insert(names.status.clone(), json!({ "select": { "name": task.status_label } }));
        }
        _ => {}
    }

    out
}

#[async_trait]
impl WorkspaceSource for NotionClient {
    async fn list_projects(&self) -> Result<Vec<Project>> {
        let pages = self.query_all(&self.notion.project_db_id).await?;
        Ok(pages.into_iter().map(|p| self.page_to_project(p)).collect())
    }

    async fn list_checklist_items(&self) -> Result<Vec<ChecklistItem>> {
        let pages = self.query_all(&self.notion.checklist_db_id).await?;
        Ok(pages
            .into_iter()
            .map(|p| self.page_to_checklist_item(p))
            .collect())
    }
}

#[async_trait]
impl TaskSink for NotionClient {
    async fn create_task(&self, task: &NewTask) -> Result<TaskRef> {
        let task_db_id = &self.notion.task_db_id;
        let schema = self.property_types(task_db_id).await?;
        let properties = task_page_properties(
            &schema,
            &self.notion.task_properties,
            task,
            &self.sync.fallback_work_type,
        );
        if !properties.contains_key(&self.notion.task_properties.task_name) {
            warn!(
                property = %self.notion.task_properties.task_name,
                "task database has no matching title property; page will be untitled"
            );
        }

        let body = json!({
            "parent": { "database_id": task_db_id },
            "properties": properties,
        });
        let created: CreatedPage = self
            .send(self.http_client.post(self.endpoint("pages")).json(&body))
            .await?;
        debug!(page_id = %created.id, "created notion task page");

        Ok(TaskRef {
            id: created.id,
            url: created.url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn task(work_category: &str, due_date: Option<&str>) -> NewTask {
        NewTask {
            task_name: "메인 포스터".into(),
            work_category: work_category.into(),
            project_ref: "proj-1".into(),
            due_date: due_date.map(String::from),
            status_label: "진행 전".into(),
        }
    }

    #[test]
    fn writes_only_properties_with_matching_types() {
        let schema = schema(&[
            ("업무", "title"),
            ("업무구분", "select"),
            ("귀속 프로젝트", "relation"),
            ("마감일", "date"),
            ("상태", "status"),
        ]);
        let props = task_page_properties(
            &schema,
            &TaskProperties::default(),
            &task("디자인", Some("2024-02-18")),
            "기타",
        );
        assert_eq!(props["업무"]["title"][0]["text"]["content"], "메인 포스터");
        assert_eq!(props["업무구분"]["select"]["name"], "디자인");
        assert_eq!(props["귀속 프로젝트"]["relation"][0]["id"], "proj-1");
        assert_eq!(props["마감일"]["date"]["start"], "2024-02-18");
        assert_eq!(props["상태"]["status"]["name"], "진행 전");
    }

    #[test]
    fn falls_back_and_skips_by_schema() {
        let schema = schema(&[
            ("업무", "title"),
            ("업무구분", "select"),
            ("마감일", "rich_text"),
            ("상태", "select"),
        ]);
        let props =
            task_page_properties(&schema, &TaskProperties::default(), &task("", None), "기타");
        assert_eq!(props["업무구분"]["select"]["name"], "기타");
        assert_eq!(props["상태"]["select"]["name"], "진행 전");
        assert!(!props.contains_key("마감일"));
        assert!(!props.contains_key("귀속 프로젝트"));
    }

    #[test]
    fn rich_text_work_type_keeps_empty_category() {
        let schema = schema(&[("업무구분", "rich_text")]);
        let props =
            task_page_properties(&schema, &TaskProperties::default(), &task("", None), "기타");
        assert_eq!(props["업무구분"]["rich_text"][0]["text"]["content"], "");
        assert!(!props.contains_key("업무"));
    }
}
