pub mod kakao;
pub mod yes24;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::book::Book;
use crate::config::SearchConfig;

pub use kakao::KakaoSearch;
pub use yes24::Yes24Search;

/// Results of one search call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResults {
    pub books: Vec<Book>,
    /// Pagination metadata, passed through untouched when the provider has any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<serde_json::Value>,
}

#[async_trait]
pub trait BookSearch: Send + Sync {
    /// Runs a search. `page` is 1-based.
    async fn search(&self, query: &str, page: u32) -> anyhow::Result<SearchResults>;
}

pub fn from_config(config: &SearchConfig, client: reqwest::Client) -> Arc<dyn BookSearch> {
    match config {
        SearchConfig::Kakao { base_url, api_key } => Arc::new(KakaoSearch::new(
            client,
            base_url.clone(),
            api_key.clone(),
        )),
        SearchConfig::Yes24 {
            base_url,
            image_base_url,
        } => Arc::new(Yes24Search::new(
            client,
            base_url.clone(),
            image_base_url.clone(),
        )),
    }
}
