//! Notion API client used by the notes proxy.

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use super::properties::{is_truthy, simplify_properties, to_notion_properties};
use crate::config::Config;
use crate::error::{Result, WorkerError};
use crate::models::{AddResponse, NotionAddRequest, NotionQueryRequest, QueryResponse, SimplifiedPage};

const NOTION_VERSION_HEADER: &str = "Notion-Version";

/// Forwards notes requests to the Notion API with the server credential.
#[derive(Clone)]
pub struct NotionClient {
    http: reqwest::Client,
    token: Option<String>,
    api_base: String,
    version: String,
}

impl NotionClient {
    pub fn new(
        token: Option<String>,
        api_base: impl Into<String>,
        version: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| WorkerError::Internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            token,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            version: version.into(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            config.notion_token.clone(),
            config.notion_api_base.clone(),
            config.notion_version.clone(),
            config.fetch_timeout(),
        )
    }

    /// Queries a database and returns the simplified projection of its pages.
    pub async fn query_database(&self, request: &NotionQueryRequest) -> Result<QueryResponse> {
        if let Some(error_msg) = request.validate() {
            return Err(WorkerError::InvalidRequest(error_msg));
        }
        let token = self.token()?;
        let database_id = request.database_id.as_deref().unwrap_or_default();

        let mut body = Map::new();
        for (field, value) in [("filter", &request.filter), ("sorts", &request.sorts)] {
            if let Some(value) = value.as_ref().filter(|v| is_truthy(v)) {
                body.insert(field.to_string(), value.clone());
            }
        }
        if let Some(page_size) = request.page_size.filter(|n| *n > 0) {
            body.insert("page_size".to_string(), json!(page_size));
        }

        let data = self
            .post(token, &format!("databases/{database_id}/query"), Value::Object(body))
            .await?;

        let results: Vec<SimplifiedPage> = data
            .get("results")
            .and_then(Value::as_array)
            .ok_or_else(|| {
                WorkerError::Internal("query response has no results list".to_string())
            })?
            .iter()
            .map(simplify_page)
            .collect();
        debug!(database = database_id, total = results.len(), "notion query complete");

        Ok(QueryResponse {
            total: results.len(),
            results,
            has_more: field(&data, "has_more"),
            next_cursor: field(&data, "next_cursor"),
        })
    }

    /// Creates a page in a database from flat client properties.
    pub async fn add_page(&self, request: &NotionAddRequest) -> Result<AddResponse> {
        if let Some(error_msg) = request.validate() {
            return Err(WorkerError::InvalidRequest(error_msg));
        }
        let token = self.token()?;
        let properties = request
            .properties
            .as_ref()
            .map(to_notion_properties)
            .unwrap_or_default();

        let body = json!({
            "parent": { "database_id": request.database_id },
            "properties": properties,
        });
        let page = self.post(token, "pages", body).await?;

        Ok(AddResponse {
            success: true,
            id: field(&page, "id"),
            url: field(&page, "url"),
            created_time: field(&page, "created_time"),
        })
    }

    fn token(&self) -> Result<&str> {
        self.token
            .as_deref()
            .ok_or_else(|| WorkerError::NotConfigured("NOTION_TOKEN".to_string()))
    }

    async fn post(&self, token: &str, path: &str, body: Value) -> Result<Value> {
        let url = format!("{}/{path}", self.api_base);
        let response = self
            .http
            .post(&url)
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .header(NOTION_VERSION_HEADER, &self.version)
            .header(CONTENT_TYPE, "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| WorkerError::Internal(e.to_string()))?;

        let status = response.status();
        let data: Value = response
            .json()
            .await
            .map_err(|e| WorkerError::Internal(e.to_string()))?;

        if !status.is_success() {
            warn!(%status, path, "notion API error");
            return Err(WorkerError::Upstream {
                status,
                details: data,
            });
        }
        Ok(data)
    }
}

fn simplify_page(page: &Value) -> SimplifiedPage {
    let properties = page
        .get("properties")
        .and_then(Value::as_object)
        .map(simplify_properties)
        .unwrap_or_default();

    SimplifiedPage {
        id: field(page, "id"),
        url: field(page, "url"),
        created_time: field(page, "created_time"),
        last_edited_time: field(page, "last_edited_time"),
        properties,
    }
}

fn field(value: &Value, name: &str) -> Value {
    value.get(name).cloned().unwrap_or(Value::Null)
}
