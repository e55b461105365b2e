use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use anyhow::Context as _;
use clap::{Args, ValueEnum};
use url::Url;

pub const DEFAULT_KAKAO_BASE_URL: &str = "https://dapi.kakao.com";
pub const DEFAULT_YES24_BASE_URL: &str = "https://www.yes24.com";
pub const DEFAULT_YES24_IMAGE_BASE_URL: &str = "https://image.yes24.com";
pub const DEFAULT_NOTION_BASE_URL: &str = "https://api.notion.com";

const USER_AGENT: &str = concat!(
    "Mozilla/5.0 (compatible; book2notion/",
    env!("CARGO_PKG_VERSION"),
    ")"
);

/// A credential that never shows up in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

impl FromStr for Secret {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.trim().to_owned()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SearchBackend {
    /// Kakao book search REST API.
    Kakao,
    /// Scrape yes24.com search and product pages.
    Yes24,
}

#[derive(Debug, Clone, Args)]
pub struct SearchArgs {
    /// Which provider answers book searches.
    #[arg(long, env = "BOOK2NOTION_SEARCH_BACKEND", value_enum, default_value_t = SearchBackend::Kakao)]
    pub search_backend: SearchBackend,

    /// Kakao REST API key (required for the kakao backend).
    #[arg(long, env = "KAKAO_REST_API_KEY", hide_env_values = true)]
    pub kakao_api_key: Option<Secret>,

    #[arg(long, env = "KAKAO_BASE_URL", default_value = DEFAULT_KAKAO_BASE_URL)]
    pub kakao_base_url: String,

    #[arg(long, env = "YES24_BASE_URL", default_value = DEFAULT_YES24_BASE_URL)]
    pub yes24_base_url: String,

    /// Base of the cover image template `{base}/goods/{id}/XL`.
    #[arg(long, env = "YES24_IMAGE_BASE_URL", default_value = DEFAULT_YES24_IMAGE_BASE_URL)]
    pub yes24_image_base_url: String,
}

#[derive(Debug, Clone, Args)]
pub struct HttpArgs {
    /// Timeout applied to every outbound request.
    #[arg(long, env = "BOOK2NOTION_HTTP_TIMEOUT_SECS", default_value_t = 15)]
    pub http_timeout_secs: u64,
}

impl HttpArgs {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs.max(1))
    }

    pub fn build_client(&self) -> anyhow::Result<reqwest::Client> {
        build_http_client(self.timeout())
    }
}

#[derive(Debug, Clone, Args)]
pub struct NotionArgs {
    /// Notion integration token.
    #[arg(long, env = "NOTION_TOKEN", hide_env_values = true)]
    pub notion_token: Option<Secret>,

    /// Target Notion database id.
    #[arg(long, env = "NOTION_DATABASE_ID")]
    pub notion_database_id: Option<String>,

    #[arg(long, env = "NOTION_BASE_URL", default_value = DEFAULT_NOTION_BASE_URL)]
    pub notion_base_url: String,
}

#[derive(Debug, Clone)]
pub enum SearchConfig {
    Kakao {
        base_url: Url,
        api_key: Secret,
    },
    Yes24 {
        base_url: Url,
        image_base_url: Url,
    },
}

#[derive(Debug, Clone)]
pub struct NotionConfig {
    pub base_url: Url,
    pub token: Secret,
    pub database_id: String,
}

impl SearchArgs {
    pub fn to_config(&self) -> anyhow::Result<SearchConfig> {
        match self.search_backend {
            SearchBackend::Kakao => {
                let api_key = self
                    .kakao_api_key
                    .clone()
                    .filter(|key| !key.expose().is_empty())
                    .ok_or_else(|| {
                        anyhow::anyhow!("KAKAO_REST_API_KEY is required for the kakao backend")
                    })?;
                Ok(SearchConfig::Kakao {
                    base_url: parse_base_url(&self.kakao_base_url).context("--kakao-base-url")?,
                    api_key,
                })
            }
            SearchBackend::Yes24 => Ok(SearchConfig::Yes24 {
                base_url: parse_base_url(&self.yes24_base_url).context("--yes24-base-url")?,
                image_base_url: parse_base_url(&self.yes24_image_base_url)
                    .context("--yes24-image-base-url")?,
            }),
        }
    }
}

impl NotionArgs {
    pub fn to_config(&self) -> anyhow::Result<NotionConfig> {
        let token = self
            .notion_token
            .clone()
            .filter(|token| !token.expose().is_empty())
            .ok_or_else(|| anyhow::anyhow!("NOTION_TOKEN is required"))?;
        let database_id = self
            .notion_database_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| anyhow::anyhow!("NOTION_DATABASE_ID is required"))?
            .to_owned();

        Ok(NotionConfig {
            base_url: parse_base_url(&self.notion_base_url).context("--notion-base-url")?,
            token,
            database_id,
        })
    }
}

fn parse_base_url(raw: &str) -> anyhow::Result<Url> {
    let url = Url::parse(raw.trim()).with_context(|| format!("parse base url: {raw}"))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        anyhow::bail!("base url must be http/https: {url}");
    }
    Ok(url)
}

/// Joins `path` onto a base URL, keeping any path prefix the base already has.
pub fn endpoint(base: &Url, path: &str) -> anyhow::Result<Url> {
    let base = base.as_str().trim_end_matches('/');
    let path = path.trim_start_matches('/');
    Url::parse(&format!("{base}/{path}")).with_context(|| format!("build endpoint: {base}/{path}"))
}

pub fn build_http_client(timeout: Duration) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
        .context("build http client")
}
