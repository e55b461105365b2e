pub mod model;

use anyhow::Context as _;
use url::Url;

use crate::book::Book;
use crate::config::{NotionConfig, Secret, endpoint};
use crate::error::UpstreamError;
use crate::mapping::{PageDraft, build_page};

pub use model::{
    CreatePageRequest, CreatedPage, Database, FileObject, PropertyType, PropertyValue, Schema,
    SchemaProperty,
};

pub const NOTION_VERSION: &str = "2022-06-28";

/// Client for the two database operations the service needs.
#[derive(Debug, Clone)]
pub struct NotionClient {
    client: reqwest::Client,
    base_url: Url,
    token: Secret,
    database_id: String,
}

impl NotionClient {
    pub fn new(client: reqwest::Client, config: &NotionConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.clone(),
            token: config.token.clone(),
            database_id: config.database_id.clone(),
        }
    }

    fn request(&self, method: reqwest::Method, url: Url) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .bearer_auth(self.token.expose())
            .header("Notion-Version", NOTION_VERSION)
    }

    /// Reads the target database's title and property schema.
    pub async fn fetch_database(&self) -> anyhow::Result<Database> {
        let url = endpoint(&self.base_url, &format!("/v1/databases/{}", self.database_id))?;
        let response = self
            .request(reqwest::Method::GET, url.clone())
            .send()
            .await
            .with_context(|| format!("GET {url}"))?;

        if !response.status().is_success() {
            let err = UpstreamError::from_response(response, Some("notion database lookup failed"))
                .await;
            tracing::warn!(status = %err.status, "notion database lookup rejected");
            return Err(err.into());
        }

        let raw: serde_json::Value = response
            .json()
            .await
            .context("parse notion database response")?;
        parse_database(&raw)
    }

    pub async fn create_page(&self, request: &CreatePageRequest) -> anyhow::Result<CreatedPage> {
        let url = endpoint(&self.base_url, "/v1/pages")?;
        let response = self
            .request(reqwest::Method::POST, url.clone())
            .json(request)
            .send()
            .await
            .with_context(|| format!("POST {url}"))?;

        if !response.status().is_success() {
            let err = UpstreamError::from_response(response, Some("notion page creation failed"))
                .await;
            tracing::warn!(status = %err.status, "notion page creation rejected");
            return Err(err.into());
        }

        let page: CreatedPage = response
            .json()
            .await
            .context("parse notion page response")?;
        tracing::info!(page_id = %page.id, "notion page created");
        Ok(page)
    }

    /// Reads the current schema and maps `book` onto it without writing anything.
    pub async fn draft_page(&self, book: &Book) -> anyhow::Result<PageDraft> {
        anyhow::ensure!(book.has_title(), "book title is required");

        let database = self.fetch_database().await?;
        let draft = build_page(book, &database.schema, &self.database_id);
        tracing::debug!(
            mapped = draft.request.properties.len(),
            schema = database.schema.properties.len(),
            "mapped book onto database schema"
        );
        Ok(draft)
    }

    /// Schema fetch, mapping and page creation, in that order.
    pub async fn add_book(&self, book: &Book) -> anyhow::Result<CreatedPage> {
        let draft = self.draft_page(book).await?;
        self.create_page(&draft.request).await
    }
}

fn parse_database(raw: &serde_json::Value) -> anyhow::Result<Database> {
    let properties = raw
        .get("properties")
        .and_then(|v| v.as_object())
        .ok_or_else(|| anyhow::anyhow!("missing `properties` object in database response"))?;

    let schema = Schema::new(properties.iter().map(|(name, prop)| {
        let tag = prop.get("type").and_then(|v| v.as_str()).unwrap_or_default();
        (name.clone(), PropertyType::from(tag))
    }));

    let title = raw
        .get("title")
        .and_then(|v| v.as_array())
        .and_then(|parts| parts.first())
        .and_then(|part| part.get("plain_text"))
        .and_then(|v| v.as_str())
        .map(str::to_owned);

    Ok(Database { title, schema })
}
