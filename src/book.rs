use serde::{Deserialize, Deserializer, Serialize};

/// One search result, independent of the backend that produced it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    #[serde(default, alias = "datetime", skip_serializing_if = "Option::is_none")]
    pub published_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub isbn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, alias = "contents", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_rating",
        skip_serializing_if = "Option::is_none"
    )]
    pub rating: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<i64>,
    #[serde(default, alias = "sale_price", skip_serializing_if = "Option::is_none")]
    pub sale_price: Option<i64>,
}

impl Book {
    /// True when the record carries a usable title.
    pub fn has_title(&self) -> bool {
        !self.title.trim().is_empty()
    }
}

/// Highest star rating a book can carry.
pub const MAX_RATING: u8 = 5;

/// Accepts any JSON number for `rating`: fractions are rounded and values above
/// [`MAX_RATING`] are capped. Negative, non-numeric or null values become `None`.
fn lenient_rating<'de, D>(deserializer: D) -> Result<Option<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    let rating = value
        .as_ref()
        .and_then(serde_json::Value::as_f64)
        .filter(|r| r.is_finite() && *r >= 0.0)
        .map(|r| r.round().min(f64::from(MAX_RATING)) as u8);
    Ok(rating)
}

/// Optional string fields arrive as `""` from some providers; treat that as absent.
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_legacy_field_names() -> anyhow::Result<()> {
        let book: Book = serde_json::from_str(
            r#"{
                "title": "채식주의자",
                "authors": ["한강"],
                "datetime": "2007-10-30T00:00:00.000+09:00",
                "contents": "intro",
                "sale_price": 12600
            }"#,
        )?;

        assert_eq!(book.published_date.as_deref(), Some("2007-10-30T00:00:00.000+09:00"));
        assert_eq!(book.description.as_deref(), Some("intro"));
        assert_eq!(book.sale_price, Some(12600));
        Ok(())
    }

    #[test]
    fn missing_title_deserializes_as_empty() -> anyhow::Result<()> {
        let book: Book = serde_json::from_str(r#"{"authors": []}"#)?;
        assert!(!book.has_title());

        let book: Book = serde_json::from_str(r#"{"title": "   "}"#)?;
        assert!(!book.has_title());
        Ok(())
    }

    #[test]
    fn out_of_range_ratings_do_not_reject_the_record() -> anyhow::Result<()> {
        let cases = [
            (r#"{"title": "T", "rating": 11}"#, Some(5)),
            (r#"{"title": "T", "rating": 4.5}"#, Some(5)),
            (r#"{"title": "T", "rating": 3}"#, Some(3)),
            (r#"{"title": "T", "rating": -1}"#, None),
            (r#"{"title": "T", "rating": "four"}"#, None),
            (r#"{"title": "T", "rating": null}"#, None),
            (r#"{"title": "T"}"#, None),
        ];
        for (json, expected) in cases {
            let book: Book = serde_json::from_str(json)?;
            assert_eq!(book.rating, expected, "{json}");
        }
        Ok(())
    }

    #[test]
    fn serializes_camel_case_and_skips_absent_fields() -> anyhow::Result<()> {
        let book = Book {
            title: "T".to_owned(),
            published_date: Some("2023-05-01".to_owned()),
            ..Book::default()
        };
        let value = serde_json::to_value(&book)?;
        assert_eq!(
            value,
            serde_json::json!({"title": "T", "authors": [], "publishedDate": "2023-05-01"})
        );
        Ok(())
    }
}
