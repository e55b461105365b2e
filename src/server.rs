use std::path::Path;
use std::sync::Arc;

use axum::Router;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Json, Response};
use axum::routing::{get, post};
use serde::{Deserialize, Serialize};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::book::Book;
use crate::error::find_upstream;
use crate::notion::{Database, NotionClient};
use crate::search::{BookSearch, SearchResults};

#[derive(Clone)]
pub struct AppState {
    pub search: Arc<dyn BookSearch>,
    pub notion: Arc<NotionClient>,
}

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Upstream { status: StatusCode, message: String },
    Internal(&'static str),
}

impl ApiError {
    /// Forwards an upstream failure as-is; anything else is logged and hidden behind `fallback`.
    fn from_anyhow(err: anyhow::Error, fallback: &'static str) -> Self {
        if let Some(upstream) = find_upstream(&err) {
            return ApiError::Upstream {
                status: upstream.status,
                message: upstream.message.clone(),
            };
        }
        tracing::error!(error = %format!("{err:#}"), "{fallback}");
        ApiError::Internal(fallback)
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::Upstream { status, message } => (status, message),
            ApiError::Internal(message) => {
                (StatusCode::INTERNAL_SERVER_ERROR, message.to_owned())
            }
        };
        (status, Json(ErrorBody { error })).into_response()
    }
}

pub fn router(state: AppState, public_dir: &Path) -> Router {
    let mut app = Router::new()
        .route("/healthz", get(|| async { "ok\n" }))
        .route("/api/search", get(search_handler))
        .route("/api/add-to-notion", post(add_to_notion_handler))
        .route("/api/notion-schema", get(notion_schema_handler))
        .with_state(state);

    let index = public_dir.join("index.html");
    if index.exists() {
        app = app.fallback_service(ServeDir::new(public_dir).not_found_service(ServeFile::new(index)));
    } else {
        app = app.fallback(|| async {
            Html(
                r#"<!doctype html>
<html>
  <head><meta charset="utf-8"><title>book2notion</title></head>
  <body>
    <h1>book2notion</h1>
    <p>web assets not found. Put the front-end into <code>public/</code> or pass <code>--public-dir</code>.</p>
  </body>
</html>
"#,
            )
        });
    }
    app.layer(TraceLayer::new_for_http())
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    query: Option<String>,
    page: Option<u32>,
}

async fn search_handler(
    State(state): State<AppState>,
    q: Result<Query<SearchQuery>, QueryRejection>,
) -> Result<Json<SearchResults>, ApiError> {
    let Query(q) = q.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    let Some(query) = q.query.as_deref().map(str::trim).filter(|q| !q.is_empty()) else {
        return Err(ApiError::BadRequest("query parameter is required".to_owned()));
    };
    let page = q.page.unwrap_or(1).max(1);

    let results = state
        .search
        .search(query, page)
        .await
        .map_err(|err| ApiError::from_anyhow(err, "book search failed"))?;
    Ok(Json(results))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AddToNotionResponse {
    success: bool,
    page_id: String,
    url: String,
}

async fn add_to_notion_handler(
    State(state): State<AppState>,
    body: Result<Json<Book>, JsonRejection>,
) -> Result<Json<AddToNotionResponse>, ApiError> {
    let Json(book) = body.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    if !book.has_title() {
        return Err(ApiError::BadRequest("title is required".to_owned()));
    }
    tracing::info!(title = %book.title, "adding book to notion");

    let page = state
        .notion
        .add_book(&book)
        .await
        .map_err(|err| ApiError::from_anyhow(err, "failed to add book to notion"))?;

    Ok(Json(AddToNotionResponse {
        success: true,
        page_id: page.id,
        url: page.url,
    }))
}

async fn notion_schema_handler(State(state): State<AppState>) -> Result<Json<Database>, ApiError> {
    let database = state
        .notion
        .fetch_database()
        .await
        .map_err(|err| ApiError::from_anyhow(err, "failed to read notion schema"))?;
    Ok(Json(database))
}
