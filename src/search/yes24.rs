use std::collections::HashSet;
use std::sync::LazyLock;

use anyhow::Context as _;
use async_trait::async_trait;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::book::{Book, MAX_RATING};
use crate::config::endpoint;
use crate::error::UpstreamError;
use crate::search::{BookSearch, SearchResults};

const ISBN13_HEADER: &str = "ISBN13";

static GOODS_ITEM: LazyLock<Selector> = LazyLock::new(|| selector("li[data-goods-no]"));
static TITLE: LazyLock<Selector> = LazyLock::new(|| selector(".gd_name"));
static AUTHOR_BLOCK: LazyLock<Selector> = LazyLock::new(|| selector(".gd_auth"));
static MORE_AUTHORS: LazyLock<Selector> = LazyLock::new(|| selector(".moreAuthLi a"));
static PUBLISHER: LazyLock<Selector> = LazyLock::new(|| selector(".gd_pub"));
static PUBLISHED: LazyLock<Selector> = LazyLock::new(|| selector(".gd_date"));
static RATING: LazyLock<Selector> = LazyLock::new(|| selector(".gd_rating .yes_b"));
static DESCRIPTION: LazyLock<Selector> = LazyLock::new(|| selector(".infoWrap_txt"));
static TABLE_ROW: LazyLock<Selector> = LazyLock::new(|| selector("table tr"));
static TH: LazyLock<Selector> = LazyLock::new(|| selector("th"));
static TD: LazyLock<Selector> = LazyLock::new(|| selector("td"));

static KOREAN_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4})년\s*(\d{1,2})월\s*(\d{1,2})일").expect("korean date regex")
});

fn selector(css: &str) -> Selector {
    Selector::parse(css).unwrap_or_else(|err| panic!("invalid selector {css:?}: {err:?}"))
}

/// Book search backed by scraping yes24.com.
#[derive(Debug, Clone)]
pub struct Yes24Search {
    client: reqwest::Client,
    base_url: Url,
    image_base_url: Url,
}

impl Yes24Search {
    pub fn new(client: reqwest::Client, base_url: Url, image_base_url: Url) -> Self {
        Self {
            client,
            base_url,
            image_base_url,
        }
    }

    fn search_url(&self, query: &str, page: u32) -> anyhow::Result<Url> {
        let mut url = endpoint(&self.base_url, "/Product/Search")?;
        url.query_pairs_mut()
            .append_pair("domain", "BOOK")
            .append_pair("query", query)
            .append_pair("page", &page.max(1).to_string());
        Ok(url)
    }

    fn product_url(&self, goods_no: &str) -> anyhow::Result<Url> {
        endpoint(&self.base_url, &format!("/Product/Goods/{goods_no}"))
    }

    fn thumbnail_url(&self, goods_no: &str) -> anyhow::Result<Url> {
        endpoint(&self.image_base_url, &format!("/goods/{goods_no}/XL"))
    }

    async fn fetch_html(&self, url: &Url) -> anyhow::Result<String> {
        let response = self
            .client
            .get(url.clone())
            .header(
                reqwest::header::ACCEPT,
                "text/html,application/xhtml+xml;q=0.9,*/*;q=0.8",
            )
            .send()
            .await
            .with_context(|| format!("GET {url}"))?;

        if !response.status().is_success() {
            return Err(UpstreamError::from_response(response, None).await.into());
        }

        response
            .text()
            .await
            .with_context(|| format!("read body of {url}"))
    }

    /// Fetches one product page. `Ok(None)` means the page had no title.
    async fn fetch_product(&self, goods_no: &str) -> anyhow::Result<Option<Book>> {
        let url = self.product_url(goods_no)?;
        let thumbnail = self.thumbnail_url(goods_no)?;
        let html = self.fetch_html(&url).await?;

        Ok(parse_product_page(&html).map(|mut book| {
            book.thumbnail = Some(thumbnail.to_string());
            book.url = Some(url.to_string());
            book
        }))
    }
}

#[async_trait]
impl BookSearch for Yes24Search {
    async fn search(&self, query: &str, page: u32) -> anyhow::Result<SearchResults> {
        let url = self.search_url(query, page)?;
        let html = self.fetch_html(&url).await?;
        let goods_nos = parse_goods_numbers(&html);
        if goods_nos.is_empty() {
            tracing::info!(%query, page, "yes24 search returned no products");
            return Ok(SearchResults::default());
        }
        tracing::debug!(%query, products = goods_nos.len(), "fetching yes24 product pages");

        let mut join_set = tokio::task::JoinSet::new();
        for (index, goods_no) in goods_nos.into_iter().enumerate() {
            let fetcher = self.clone();
            join_set.spawn(async move {
                match fetcher.fetch_product(&goods_no).await {
                    Ok(Some(book)) => Some((index, book)),
                    Ok(None) => {
                        tracing::debug!(%goods_no, "product page has no title; skipping");
                        None
                    }
                    Err(err) => {
                        tracing::warn!(%goods_no, error = %format!("{err:#}"), "product fetch failed; skipping");
                        None
                    }
                }
            });
        }

        let mut found = Vec::new();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok(Some(item)) => found.push(item),
                Ok(None) => {}
                Err(err) => tracing::warn!(?err, "product task did not complete"),
            }
        }
        found.sort_by_key(|(index, _)| *index);

        let books = found.into_iter().map(|(_, book)| book).collect::<Vec<_>>();
        tracing::info!(%query, page, results = books.len(), "yes24 search done");
        Ok(SearchResults { books, meta: None })
    }
}

/// Product identifiers on a search-results page, in page order, without duplicates.
pub fn parse_goods_numbers(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let mut seen = HashSet::new();
    let mut ids = Vec::new();
    for item in document.select(&GOODS_ITEM) {
        let Some(id) = item.value().attr("data-goods-no").map(str::trim) else {
            continue;
        };
        if !id.is_empty() && seen.insert(id.to_owned()) {
            ids.push(id.to_owned());
        }
    }
    ids
}

/// Extracts the book fields a product page carries. Returns `None` without a title.
///
/// `thumbnail` and `url` are left empty; they derive from the product id, not the page.
pub fn parse_product_page(html: &str) -> Option<Book> {
    let document = Html::parse_document(html);

    let title = document
        .select(&TITLE)
        .next()
        .map(element_text)
        .filter(|t| !t.is_empty())?;

    let publisher = document
        .select(&PUBLISHER)
        .next()
        .map(element_text)
        .filter(|p| !p.is_empty());
    let published_date = document
        .select(&PUBLISHED)
        .next()
        .map(element_text)
        .filter(|d| !d.is_empty())
        .map(|d| normalize_date(&d));
    let rating = document
        .select(&RATING)
        .next()
        .map(element_text)
        .and_then(|r| r.parse::<f64>().ok())
        .map(normalize_rating);
    let description = document
        .select(&DESCRIPTION)
        .next()
        .map(element_text)
        .filter(|d| !d.is_empty());

    Some(Book {
        title,
        authors: extract_authors(&document),
        publisher,
        published_date,
        isbn: extract_isbn13(&document),
        description,
        rating,
        ..Book::default()
    })
}

fn extract_authors(document: &Html) -> Vec<String> {
    let Some(block) = document.select(&AUTHOR_BLOCK).next() else {
        return Vec::new();
    };

    let mut authors = block.select(&MORE_AUTHORS).map(element_text).collect::<Vec<_>>();
    if authors.is_empty() {
        authors = block
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|child| child.value().name() == "a")
            .map(element_text)
            .collect();
    }
    if authors.is_empty() {
        authors = element_text(block)
            .split(',')
            .map(|a| a.trim().to_owned())
            .collect();
    }

    authors.retain(|a| !a.is_empty());
    authors
}

fn extract_isbn13(document: &Html) -> Option<String> {
    document.select(&TABLE_ROW).find_map(|row| {
        let header = row.select(&TH).next().map(element_text)?;
        if header != ISBN13_HEADER {
            return None;
        }
        row.select(&TD)
            .next()
            .map(element_text)
            .filter(|v| !v.is_empty())
    })
}

/// Text content with runs of whitespace collapsed to single spaces.
fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// `2023년 05월 01일` → `2023-05-01`. Anything else comes back unchanged.
pub fn normalize_date(raw: &str) -> String {
    let raw = raw.trim();
    let Some(caps) = KOREAN_DATE.captures(raw) else {
        return raw.to_owned();
    };

    let parsed = (|| {
        let year = caps[1].parse::<i32>().ok()?;
        let month = caps[2].parse::<u32>().ok()?;
        let day = caps[3].parse::<u32>().ok()?;
        chrono::NaiveDate::from_ymd_opt(year, month, day)
    })();

    match parsed {
        Some(date) => date.format("%Y-%m-%d").to_string(),
        None => raw.to_owned(),
    }
}

/// Maps a 0–10 score onto 0–5 by halving, rounding and clamping.
pub fn normalize_rating(score: f64) -> u8 {
    if !score.is_finite() {
        return 0;
    }
    (score / 2.0).round().clamp(0.0, f64::from(MAX_RATING)) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRODUCT_WITH_MORE_AUTHORS: &str = r#"<!doctype html>
<html>
  <body>
    <div class="gd_titArea">
      <h2 class="gd_name">  작별하지 않는다 </h2>
    </div>
    <span class="gd_pubArea">
      <span class="gd_auth">
        <a href="/author/1">한강</a>
        <span class="moreAuthLi">
          <a href="/author/1">한강</a>
          <a href="/author/2">김영하</a>
        </span>
      </span>
      <span class="gd_pub"><a href="/pub">문학동네</a></span>
      <span class="gd_date">2021년 09월 09일</span>
    </span>
    <span class="gd_rating"><em class="yes_b">9.6</em></span>
    <div class="infoWrap_txt">
      <p>눈이 내리는
         제주.</p>
    </div>
    <table>
      <tr><th>쪽수, 무게, 크기</th><td>332쪽</td></tr>
      <tr><th>ISBN13</th><td> 9788954682152 </td></tr>
      <tr><th>ISBN10</th><td>8954682154</td></tr>
    </table>
  </body>
</html>"#;

    const PRODUCT_WITH_FLAT_AUTHORS: &str = r#"<html><body>
      <h2 class="gd_name">데미안</h2>
      <span class="gd_auth"><a>헤르만 헤세</a> 저/<a>전영애</a> 역</span>
      <span class="gd_date">2000/12/20</span>
      <span class="gd_rating"><em class="yes_b">n/a</em></span>
    </body></html>"#;

    #[test]
    fn parses_product_page_with_expandable_author_list() {
        let book = parse_product_page(PRODUCT_WITH_MORE_AUTHORS).expect("book");

        assert_eq!(book.title, "작별하지 않는다");
        assert_eq!(book.authors, vec!["한강", "김영하"]);
        assert_eq!(book.publisher.as_deref(), Some("문학동네"));
        assert_eq!(book.published_date.as_deref(), Some("2021-09-09"));
        assert_eq!(book.isbn.as_deref(), Some("9788954682152"));
        assert_eq!(book.rating, Some(5));
        assert_eq!(book.description.as_deref(), Some("눈이 내리는 제주."));
        assert_eq!(book.thumbnail, None);
    }

    #[test]
    fn parses_flat_author_anchors_and_keeps_unknown_dates() {
        let book = parse_product_page(PRODUCT_WITH_FLAT_AUTHORS).expect("book");

        assert_eq!(book.authors, vec!["헤르만 헤세", "전영애"]);
        assert_eq!(book.published_date.as_deref(), Some("2000/12/20"));
        assert_eq!(book.rating, None);
        assert_eq!(book.isbn, None);
        assert_eq!(book.publisher, None);
    }

    #[test]
    fn falls_back_to_author_text_without_anchors() {
        let html = r#"<h2 class="gd_name">T</h2><span class="gd_auth">A, B</span>"#;
        let book = parse_product_page(html).expect("book");
        assert_eq!(book.authors, vec!["A", "B"]);
    }

    #[test]
    fn product_page_without_title_is_discarded() {
        assert!(parse_product_page("<html><body><p>품절</p></body></html>").is_none());
        assert!(parse_product_page(r#"<h2 class="gd_name">   </h2>"#).is_none());
    }

    #[test]
    fn isbn_header_must_match_literally() {
        let html = r#"<h2 class="gd_name">T</h2>
            <table><tr><th>ISBN13 (세트)</th><td>1</td></tr></table>"#;
        let book = parse_product_page(html).expect("book");
        assert_eq!(book.isbn, None);
    }

    #[test]
    fn goods_numbers_keep_order_and_drop_duplicates() {
        let html = r#"<ul id="yesSchList">
            <li data-goods-no="111"><a>one</a></li>
            <li data-goods-no=" 222 "><a>two</a></li>
            <li data-goods-no="111"><a>again</a></li>
            <li data-goods-no=""><a>blank</a></li>
            <li><a>ad</a></li>
          </ul>"#;
        assert_eq!(parse_goods_numbers(html), vec!["111", "222"]);
        assert!(parse_goods_numbers("<ul></ul>").is_empty());
    }

    #[test]
    fn korean_dates_are_reformatted() {
        assert_eq!(normalize_date("2023년 05월 01일"), "2023-05-01");
        assert_eq!(normalize_date("2023년 5월 1일"), "2023-05-01");
        assert_eq!(normalize_date("2023년 13월 01일"), "2023년 13월 01일");
        assert_eq!(normalize_date("May 1, 2023"), "May 1, 2023");
        assert_eq!(normalize_date("  2023-05-01 "), "2023-05-01");
    }

    #[test]
    fn ratings_are_halved_rounded_and_clamped() {
        assert_eq!(normalize_rating(8.0), 4);
        assert_eq!(normalize_rating(9.0), 5);
        assert_eq!(normalize_rating(7.4), 4);
        assert_eq!(normalize_rating(11.0), 5);
        assert_eq!(normalize_rating(-1.0), 0);
        assert_eq!(normalize_rating(f64::NAN), 0);
    }

    #[test]
    fn urls_follow_fixed_templates() -> anyhow::Result<()> {
        let search = Yes24Search::new(
            reqwest::Client::new(),
            Url::parse("https://www.yes24.com")?,
            Url::parse("https://image.yes24.com")?,
        );
        assert_eq!(
            search.thumbnail_url("104581243")?.as_str(),
            "https://image.yes24.com/goods/104581243/XL"
        );
        assert_eq!(
            search.product_url("104581243")?.as_str(),
            "https://www.yes24.com/Product/Goods/104581243"
        );
        let url = search.search_url("채식주의자", 2)?;
        assert_eq!(url.path(), "/Product/Search");
        assert!(url.query_pairs().any(|(k, v)| k == "page" && v == "2"));
        Ok(())
    }
}
