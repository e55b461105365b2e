use anyhow::Context as _;
use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

use crate::book::{Book, non_empty};
use crate::config::{Secret, endpoint};
use crate::error::UpstreamError;
use crate::search::{BookSearch, SearchResults};

const PAGE_SIZE: u32 = 10;

#[derive(Debug, Clone)]
pub struct KakaoSearch {
    client: reqwest::Client,
    base_url: Url,
    api_key: Secret,
}

#[derive(Debug, Deserialize)]
struct KakaoResponse {
    #[serde(default)]
    documents: Vec<KakaoDocument>,
    #[serde(default)]
    meta: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct KakaoDocument {
    #[serde(default)]
    title: String,
    #[serde(default)]
    authors: Vec<String>,
    #[serde(default)]
    publisher: Option<String>,
    #[serde(default)]
    thumbnail: Option<String>,
    #[serde(default)]
    isbn: Option<String>,
    #[serde(default)]
    datetime: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    contents: Option<String>,
    #[serde(default)]
    price: Option<i64>,
    #[serde(default)]
    sale_price: Option<i64>,
}

impl From<KakaoDocument> for Book {
    fn from(doc: KakaoDocument) -> Self {
        Book {
            title: doc.title,
            authors: doc.authors,
            publisher: non_empty(doc.publisher),
            published_date: non_empty(doc.datetime),
            isbn: non_empty(doc.isbn),
            thumbnail: non_empty(doc.thumbnail),
            url: non_empty(doc.url),
            description: non_empty(doc.contents),
            rating: None,
            price: doc.price,
            sale_price: doc.sale_price,
        }
    }
}

impl KakaoSearch {
    pub fn new(client: reqwest::Client, base_url: Url, api_key: Secret) -> Self {
        Self {
            client,
            base_url,
            api_key,
        }
    }

    fn search_url(&self, query: &str, page: u32) -> anyhow::Result<Url> {
        let mut url = endpoint(&self.base_url, "/v3/search/book")?;
        url.query_pairs_mut()
            .append_pair("query", query)
            .append_pair("size", &PAGE_SIZE.to_string())
            .append_pair("page", &page.max(1).to_string());
        Ok(url)
    }
}

#[async_trait]
impl BookSearch for KakaoSearch {
    async fn search(&self, query: &str, page: u32) -> anyhow::Result<SearchResults> {
        let url = self.search_url(query, page)?;
        tracing::debug!(%query, page, "kakao book search");

        let response = self
            .client
            .get(url.clone())
            .header(
                reqwest::header::AUTHORIZATION,
                format!("KakaoAK {}", self.api_key.expose()),
            )
            .send()
            .await
            .with_context(|| format!("GET {url}"))?;

        if !response.status().is_success() {
            let err = UpstreamError::from_response(response, None).await;
            tracing::warn!(status = %err.status, "kakao search rejected");
            return Err(err.into());
        }

        let body: KakaoResponse = response
            .json()
            .await
            .context("parse kakao search response")?;

        let books = body
            .documents
            .into_iter()
            .map(Book::from)
            .filter(Book::has_title)
            .collect::<Vec<_>>();
        tracing::info!(%query, page, results = books.len(), "kakao search done");

        Ok(SearchResults {
            books,
            meta: body.meta,
        })
    }
}
